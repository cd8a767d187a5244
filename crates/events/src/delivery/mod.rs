//! Pluggable side effects for published alerts.
//!
//! The hub calls every registered [`AlertNotifier`] once per alert. A
//! failing notifier is logged and never affects subscribers or the other
//! notifiers.

pub mod email;
pub mod sms;

use std::str::FromStr;
use std::sync::Arc;

use cardio_core::alert::AlertEvent;
use cardio_core::error::CoreError;

pub use email::EmailNotifier;
pub use sms::SmsNotifier;

pub trait AlertNotifier: Send + Sync {
    /// Short channel name used in logs.
    fn channel(&self) -> &'static str;

    fn notify(&self, alert: &AlertEvent) -> Result<(), CoreError>;
}

/// Notifier kinds selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyChannel {
    Email,
    Sms,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("Unknown notification channel {0:?}")]
pub struct UnknownChannel(pub String);

impl FromStr for NotifyChannel {
    type Err = UnknownChannel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "email" => Ok(NotifyChannel::Email),
            "sms" => Ok(NotifyChannel::Sms),
            other => Err(UnknownChannel(other.to_string())),
        }
    }
}

impl NotifyChannel {
    /// Parse a comma-separated list; blank entries are skipped.
    pub fn parse_list(list: &str) -> Result<Vec<NotifyChannel>, UnknownChannel> {
        list.split(',')
            .filter(|s| !s.trim().is_empty())
            .map(str::parse)
            .collect()
    }

    pub fn build(self) -> Arc<dyn AlertNotifier> {
        match self {
            NotifyChannel::Email => Arc::new(EmailNotifier::default()),
            NotifyChannel::Sms => Arc::new(SmsNotifier::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn channel_list_parses_and_ignores_blanks() {
        assert_eq!(
            NotifyChannel::parse_list("email, SMS,,"),
            Ok(vec![NotifyChannel::Email, NotifyChannel::Sms])
        );
        assert_eq!(NotifyChannel::parse_list(""), Ok(vec![]));
    }

    #[test]
    fn unknown_channel_is_rejected() {
        assert_matches!(NotifyChannel::parse_list("email,pager"), Err(UnknownChannel(c)) if c == "pager");
    }

    #[test]
    fn built_notifiers_report_their_channel() {
        assert_eq!(NotifyChannel::Email.build().channel(), "email");
        assert_eq!(NotifyChannel::Sms.build().channel(), "sms");
    }
}
