//! Light endpoint task
//!
//! Each endpoint runs as one tokio task that owns its engine. Commands and
//! ticks are handled in the same `select!` loop, so a command can never
//! interleave with a tick in progress.

use crate::config::EndpointConfig;
use crate::error::EndpointError;
use crate::ticker::{self, TimerTickSource};
use level_control::{
    ClusterCommand, LevelAttributes, LevelControlHandler, LevelTransitionEngine, LightObserver,
    LightState,
};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

/// Pending requests an endpoint buffers before senders wait
const REQUEST_QUEUE: usize = 32;

/// Engine type hosted by an endpoint task
pub type EndpointEngine = LevelTransitionEngine<TimerTickSource, BroadcastObserver>;

/// State changes published by light endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LightEvent {
    /// Current level changed
    LevelChanged { endpoint: u8, level: u8 },
    /// On/off state changed
    OnOffChanged { endpoint: u8, on: bool },
    /// Attributes were reset to factory defaults
    AttributesReset { endpoint: u8, state: LightState },
}

impl LightEvent {
    /// Endpoint the event came from
    #[must_use]
    pub fn endpoint(&self) -> u8 {
        match self {
            Self::LevelChanged { endpoint, .. }
            | Self::OnOffChanged { endpoint, .. }
            | Self::AttributesReset { endpoint, .. } => *endpoint,
        }
    }
}

/// Observer forwarding engine notifications to a broadcast channel
#[derive(Debug, Clone)]
pub struct BroadcastObserver {
    endpoint: u8,
    event_tx: broadcast::Sender<LightEvent>,
}

impl BroadcastObserver {
    #[must_use]
    pub fn new(endpoint: u8, event_tx: broadcast::Sender<LightEvent>) -> Self {
        Self { endpoint, event_tx }
    }
}

impl LightObserver for BroadcastObserver {
    fn level_changed(&mut self, level: u8) {
        let _ = self.event_tx.send(LightEvent::LevelChanged {
            endpoint: self.endpoint,
            level,
        });
    }

    fn on_off_changed(&mut self, on: bool) {
        let _ = self.event_tx.send(LightEvent::OnOffChanged {
            endpoint: self.endpoint,
            on,
        });
    }

    fn attributes_reset(&mut self, state: LightState) {
        let _ = self.event_tx.send(LightEvent::AttributesReset {
            endpoint: self.endpoint,
            state,
        });
    }
}

/// Requests served by the endpoint task
#[derive(Debug)]
enum Request {
    Command(ClusterCommand),
    State(oneshot::Sender<LightState>),
    ReadAttributes(oneshot::Sender<LevelAttributes>),
    WriteAttributes(LevelAttributes),
    FactoryReset,
}

/// Handle to a running light endpoint
#[derive(Debug)]
pub struct EndpointHandle {
    id: u8,
    request_tx: mpsc::Sender<Request>,
    task: JoinHandle<()>,
}

impl EndpointHandle {
    /// Spawn the endpoint task; must be called within a tokio runtime
    #[must_use]
    pub fn spawn(config: &EndpointConfig, event_tx: broadcast::Sender<LightEvent>) -> Self {
        let engine = LevelTransitionEngine::new(
            config.id,
            config.current_level,
            config.on,
            config.attributes,
            TimerTickSource::new(),
            BroadcastObserver::new(config.id, event_tx),
        );

        let (request_tx, request_rx) = mpsc::channel(REQUEST_QUEUE);
        let task = tokio::spawn(run(engine, request_rx));

        Self {
            id: config.id,
            request_tx,
            task,
        }
    }

    #[must_use]
    pub fn id(&self) -> u8 {
        self.id
    }

    /// Deliver a decoded cluster command
    pub async fn send(&self, command: ClusterCommand) -> Result<(), EndpointError> {
        self.request(Request::Command(command)).await
    }

    /// Snapshot of the light state
    pub async fn state(&self) -> Result<LightState, EndpointError> {
        let (tx, rx) = oneshot::channel();
        self.request(Request::State(tx)).await?;
        rx.await.map_err(|_| EndpointError::Closed(self.id))
    }

    /// Current Level Control attributes
    pub async fn attributes(&self) -> Result<LevelAttributes, EndpointError> {
        let (tx, rx) = oneshot::channel();
        self.request(Request::ReadAttributes(tx)).await?;
        rx.await.map_err(|_| EndpointError::Closed(self.id))
    }

    /// Replace the Level Control attributes
    pub async fn write_attributes(&self, attributes: LevelAttributes) -> Result<(), EndpointError> {
        self.request(Request::WriteAttributes(attributes)).await
    }

    /// Restore factory default attributes
    pub async fn factory_reset(&self) -> Result<(), EndpointError> {
        self.request(Request::FactoryReset).await
    }

    /// Stop the endpoint task
    pub fn abort(&self) {
        self.task.abort();
    }

    async fn request(&self, request: Request) -> Result<(), EndpointError> {
        self.request_tx
            .send(request)
            .await
            .map_err(|_| EndpointError::Closed(self.id))
    }
}

async fn run(mut engine: EndpointEngine, mut request_rx: mpsc::Receiver<Request>) {
    tracing::info!(
        "Light endpoint {} started at level {} ({})",
        engine.endpoint(),
        engine.current_level(),
        if engine.is_on() { "on" } else { "off" }
    );

    loop {
        let deadline = engine.tick_source().deadline();

        tokio::select! {
            request = request_rx.recv() => {
                let Some(request) = request else {
                    break;
                };
                handle_request(&mut engine, request);
            }
            () = ticker::sleep_until(deadline) => {
                if engine.tick_source_mut().fire() {
                    engine.advance();
                }
            }
        }
    }

    tracing::info!("Light endpoint {} stopped", engine.endpoint());
}

fn handle_request(engine: &mut EndpointEngine, request: Request) {
    match request {
        Request::Command(command) => {
            tracing::debug!(
                "EP{}: cluster 0x{:04X} command 0x{:02X} {:?}",
                engine.endpoint(),
                command.cluster_id(),
                command.command_id(),
                command
            );
            engine.handle(command);
        }
        Request::State(reply) => {
            if reply.send(engine.state()).is_err() {
                tracing::warn!("EP{}: state requester went away", engine.endpoint());
            }
        }
        Request::ReadAttributes(reply) => {
            if reply.send(*engine.attributes()).is_err() {
                tracing::warn!("EP{}: attribute requester went away", engine.endpoint());
            }
        }
        Request::WriteAttributes(attributes) => engine.write_attributes(attributes),
        Request::FactoryReset => engine.reset_attributes(),
    }
}
