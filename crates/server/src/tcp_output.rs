//! TCP broadcast of readings in the CSV serialization.

use std::sync::Arc;

use cardio_events::BroadcastHub;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

/// Accept clients until cancelled. Each client gets its own hub subscription.
pub async fn serve_tcp_output(
    listener: TcpListener,
    hub: Arc<BroadcastHub>,
    cancel: CancellationToken,
) {
    loop {
        let (stream, peer) = tokio::select! {
            _ = cancel.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::warn!(error = %e, "TCP output accept failed");
                    continue;
                }
            },
        };

        tracing::debug!(%peer, "TCP output client connected");
        let hub = Arc::clone(&hub);
        let cancel = cancel.clone();
        tokio::spawn(async move {
            stream_to_client(stream, &hub, cancel).await;
            tracing::debug!(%peer, "TCP output client disconnected");
        });
    }
    tracing::info!("TCP output listener stopped");
}

async fn stream_to_client(mut stream: TcpStream, hub: &BroadcastHub, cancel: CancellationToken) {
    let mut subscription = hub.subscribe().await;
    loop {
        let message = tokio::select! {
            _ = cancel.cancelled() => break,
            message = subscription.recv() => match message {
                Some(message) => message,
                None => break,
            },
        };

        let mut line = message.to_csv();
        line.push('\n');
        if let Err(e) = stream.write_all(line.as_bytes()).await {
            tracing::warn!(error = %e, "TCP output write failed, dropping client");
            break;
        }
    }
    hub.unsubscribe(subscription.id).await;
}
