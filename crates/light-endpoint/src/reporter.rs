//! Event reporter
//!
//! Logs every state change the endpoints publish, standing in for the
//! actuator side that would drive the lamp or report attributes.

use crate::endpoint::LightEvent;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Consume light events until the channel closes
///
/// Returns how many events were skipped because the receiver lagged.
pub async fn report_events(mut rx: broadcast::Receiver<LightEvent>) -> u64 {
    let mut missed = 0;
    loop {
        match rx.recv().await {
            Ok(event) => match event {
                LightEvent::LevelChanged { endpoint, level } => {
                    tracing::debug!("EP{}: level {}", endpoint, level);
                }
                LightEvent::OnOffChanged { endpoint, on } => {
                    tracing::info!("EP{}: light {}", endpoint, if on { "on" } else { "off" });
                }
                LightEvent::AttributesReset { endpoint, state } => {
                    tracing::info!(
                        "EP{}: attributes reset (level {}, on={})",
                        endpoint,
                        state.current_level,
                        state.on
                    );
                }
            },
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!("Light event reporter lagged by {} events", n);
                missed += n;
            }
            Err(broadcast::error::RecvError::Closed) => {
                tracing::info!("Light event channel closed");
                break;
            }
        }
    }
    missed
}

/// Start the reporter on its own task
pub fn spawn_reporter(rx: broadcast::Receiver<LightEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let missed = report_events(rx).await;
        if missed > 0 {
            tracing::warn!("Light event reporter missed {} events in total", missed);
        }
    })
}
