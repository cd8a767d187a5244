use cardio_core::alert::AlertEvent;
use cardio_core::reading::Reading;
use cardio_core::wire;
use serde::Serialize;

/// Something published through the hub.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum HubMessage {
    Reading(Reading),
    Alert(AlertEvent),
}

impl HubMessage {
    /// Rendering used by the WebSocket stream: labeled reading lines and
    /// the human-readable alert block.
    pub fn to_labeled(&self) -> String {
        match self {
            HubMessage::Reading(reading) => wire::format_labeled(reading),
            HubMessage::Alert(alert) => wire::render_alert(alert),
        }
    }

    /// Rendering used by the TCP stream.
    pub fn to_csv(&self) -> String {
        match self {
            HubMessage::Reading(reading) => wire::format_csv(reading),
            HubMessage::Alert(alert) => wire::render_alert(alert),
        }
    }

    pub fn is_alert(&self) -> bool {
        matches!(self, HubMessage::Alert(_))
    }
}

impl From<Reading> for HubMessage {
    fn from(reading: Reading) -> Self {
        HubMessage::Reading(reading)
    }
}

impl From<AlertEvent> for HubMessage {
    fn from(alert: AlertEvent) -> Self {
        HubMessage::Alert(alert)
    }
}

#[cfg(test)]
mod tests {
    use cardio_core::reading::VitalType;

    use super::*;

    #[test]
    fn reading_renders_per_transport() {
        let message = HubMessage::from(Reading::new(2, VitalType::Saturation, 97.0, 1_000));
        assert_eq!(
            message.to_labeled(),
            "Patient ID: 2, Timestamp: 1000, Label: Saturation, Data: 97.0"
        );
        assert_eq!(message.to_csv(), "2,1000,Saturation,97.0");
        assert!(!message.is_alert());
    }

    #[test]
    fn alert_renders_the_same_block_everywhere() {
        let message = HubMessage::from(AlertEvent::new(2, "Low blood saturation", 1_000));
        assert_eq!(message.to_labeled(), message.to_csv());
        assert!(message.to_labeled().starts_with("Alert Triggered:\n"));
        assert!(message.is_alert());
    }

    #[test]
    fn json_is_tagged_by_kind() {
        let message = HubMessage::from(AlertEvent::new(4, "Heart Rate Alert", 10));
        let json = serde_json::to_value(&message).expect("serializable");
        assert_eq!(json["kind"], "alert");
        assert_eq!(json["data"]["patient_id"], 4);
    }
}
