//! Light device hosting one engine per endpoint

use crate::config::LightConfig;
use crate::endpoint::{EndpointHandle, LightEvent};
use crate::error::EndpointError;
use crate::reporter;
use dashmap::DashMap;
use level_control::{ClusterCommand, LevelAttributes, LevelCommand, LightState, OnOffCommand};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Capacity of the event channel; a tick produces at most two events
const EVENT_CAPACITY: usize = 256;

/// A dimmable light with one or more independent endpoints
pub struct LightDevice {
    /// Running endpoints (keyed by endpoint id)
    endpoints: DashMap<u8, Arc<EndpointHandle>>,
    /// Event broadcaster shared by all endpoints
    event_tx: broadcast::Sender<LightEvent>,
    /// Task logging published events
    reporter: JoinHandle<()>,
}

impl LightDevice {
    /// Load the configuration named by the environment and spawn its endpoints
    pub async fn from_env() -> Result<Self, EndpointError> {
        let path = LightConfig::path_from_env();
        let config = LightConfig::load(&path).await?;
        Self::from_config(&config)
    }

    /// Spawn every configured endpoint; must be called within a tokio runtime
    pub fn from_config(config: &LightConfig) -> Result<Self, EndpointError> {
        let config = config.clone().validated()?;
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);

        let endpoints = DashMap::new();
        for endpoint in &config.endpoints {
            endpoints.insert(
                endpoint.id,
                Arc::new(EndpointHandle::spawn(endpoint, event_tx.clone())),
            );
        }

        let reporter = reporter::spawn_reporter(event_tx.subscribe());

        tracing::info!("Light device started with {} endpoint(s)", endpoints.len());
        Ok(Self {
            endpoints,
            event_tx,
            reporter,
        })
    }

    /// Subscribe to level and on/off changes of all endpoints
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LightEvent> {
        self.event_tx.subscribe()
    }

    /// Hosted endpoint ids, ascending
    #[must_use]
    pub fn endpoint_ids(&self) -> Vec<u8> {
        let mut ids: Vec<u8> = self.endpoints.iter().map(|e| *e.key()).collect();
        ids.sort_unstable();
        ids
    }

    /// Deliver a decoded cluster command to an endpoint
    pub async fn send(&self, endpoint: u8, command: ClusterCommand) -> Result<(), EndpointError> {
        let handle = self.handle(endpoint)?;
        handle.send(command).await
    }

    /// Turn on a light endpoint
    pub async fn turn_on(&self, endpoint: u8) -> Result<(), EndpointError> {
        self.send(endpoint, OnOffCommand::On.into()).await
    }

    /// Turn off a light endpoint
    pub async fn turn_off(&self, endpoint: u8) -> Result<(), EndpointError> {
        self.send(endpoint, OnOffCommand::Off.into()).await
    }

    /// Toggle a light endpoint
    pub async fn toggle(&self, endpoint: u8) -> Result<(), EndpointError> {
        self.send(endpoint, OnOffCommand::Toggle.into()).await
    }

    /// Ramp an endpoint to `level` over `transition_time` tenths of a second
    pub async fn move_to_level(
        &self,
        endpoint: u8,
        level: u8,
        transition_time: u16,
        with_on_off: bool,
    ) -> Result<(), EndpointError> {
        let command = LevelCommand::MoveToLevel {
            level,
            transition_time,
            with_on_off,
        };
        self.send(endpoint, command.into()).await
    }

    /// Stop any ramp in progress on an endpoint
    pub async fn stop(&self, endpoint: u8) -> Result<(), EndpointError> {
        self.send(endpoint, LevelCommand::Stop.into()).await
    }

    /// Current state of an endpoint
    pub async fn state(&self, endpoint: u8) -> Result<LightState, EndpointError> {
        let handle = self.handle(endpoint)?;
        handle.state().await
    }

    /// Current Level Control attributes of an endpoint
    pub async fn attributes(&self, endpoint: u8) -> Result<LevelAttributes, EndpointError> {
        let handle = self.handle(endpoint)?;
        handle.attributes().await
    }

    /// Replace the Level Control attributes of an endpoint
    pub async fn write_attributes(
        &self,
        endpoint: u8,
        attributes: LevelAttributes,
    ) -> Result<(), EndpointError> {
        let handle = self.handle(endpoint)?;
        handle.write_attributes(attributes).await
    }

    /// Reset every endpoint's attributes to factory defaults
    pub async fn factory_reset(&self) -> Result<(), EndpointError> {
        for id in self.endpoint_ids() {
            let handle = self.handle(id)?;
            handle.factory_reset().await?;
        }
        tracing::info!("Factory reset applied to all endpoints");
        Ok(())
    }

    fn handle(&self, endpoint: u8) -> Result<Arc<EndpointHandle>, EndpointError> {
        self.endpoints
            .get(&endpoint)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(EndpointError::NotFound(endpoint))
    }
}

impl Drop for LightDevice {
    fn drop(&mut self) {
        // Abort all endpoint tasks
        for entry in self.endpoints.iter() {
            entry.value().abort();
        }
        self.reporter.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EndpointConfig, DEFAULT_ENDPOINTS};
    use level_control::{MoveMode, MAX_LEVEL, MIN_LEVEL};
    use std::time::Duration;

    fn two_lights() -> LightDevice {
        let mut first = EndpointConfig::new(8);
        first.current_level = 200;
        first.on = true;
        first.attributes.off_transition_time = Some(10);

        let mut second = EndpointConfig::new(9);
        second.current_level = 40;

        LightDevice::from_config(&LightConfig {
            endpoints: vec![first, second],
        })
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_config_hosts_two_endpoints() {
        let device = LightDevice::from_config(&LightConfig::default()).unwrap();
        assert_eq!(device.endpoint_ids(), DEFAULT_ENDPOINTS.to_vec());

        let state = device.state(8).await.unwrap();
        assert_eq!(state.current_level, MAX_LEVEL);
        assert!(!state.on);
    }

    // Only test that touches LIGHT_CONFIG and DATA_DIR
    #[tokio::test]
    async fn test_from_env_resolves_config_path() {
        let dir = std::env::temp_dir().join(format!("light-env-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let file = dir.join("custom.json");
        tokio::fs::write(&file, r#"{"endpoints": [{"id": 12}]}"#)
            .await
            .unwrap();

        std::env::set_var("LIGHT_CONFIG", &file);
        std::env::set_var("DATA_DIR", &dir);
        assert_eq!(LightConfig::path_from_env(), file);
        let device = LightDevice::from_env().await.unwrap();
        assert_eq!(device.endpoint_ids(), vec![12]);

        // Without LIGHT_CONFIG the data directory is used; light.json is absent there
        std::env::remove_var("LIGHT_CONFIG");
        assert_eq!(LightConfig::path_from_env(), dir.join("light.json"));
        let device = LightDevice::from_env().await.unwrap();
        assert_eq!(device.endpoint_ids(), DEFAULT_ENDPOINTS.to_vec());

        std::env::remove_var("DATA_DIR");
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_endpoint() {
        let device = two_lights();
        let result = device.turn_on(42).await;
        assert!(matches!(result, Err(EndpointError::NotFound(42))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_config_rejected() {
        let config = LightConfig {
            endpoints: vec![EndpointConfig::new(8), EndpointConfig::new(8)],
        };
        assert!(matches!(
            LightDevice::from_config(&config),
            Err(EndpointError::InvalidConfig(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_endpoints_are_independent() {
        let device = two_lights();
        let mut events = device.subscribe();

        device.turn_off(8).await.unwrap();
        device.turn_on(9).await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;

        let first = device.state(8).await.unwrap();
        assert!(!first.on);
        assert_eq!(first.current_level, 200);

        let second = device.state(9).await.unwrap();
        assert!(second.on);
        assert_eq!(second.current_level, 40);

        let mut saw_first_off = false;
        let mut saw_second_on = false;
        while let Ok(event) = events.try_recv() {
            match event {
                LightEvent::OnOffChanged { endpoint: 8, on } => saw_first_off = !on,
                LightEvent::OnOffChanged { endpoint: 9, on } => saw_second_on = on,
                _ => {}
            }
        }
        assert!(saw_first_off);
        assert!(saw_second_on);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_mid_off_ramp_reverses() {
        let device = two_lights();

        device.turn_off(8).await.unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;
        let dimming = device.state(8).await.unwrap();
        assert!(dimming.ramping);
        assert!(dimming.on);
        assert!(dimming.current_level < 200);

        device.toggle(8).await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;

        let state = device.state(8).await.unwrap();
        assert!(state.on);
        assert_eq!(state.current_level, 200);
        assert!(!state.ramping);
    }

    #[tokio::test(start_paused = true)]
    async fn test_move_and_stop() {
        let device = two_lights();

        device
            .send(
                9,
                LevelCommand::Move {
                    mode: MoveMode::Down,
                    rate: 10,
                    with_on_off: false,
                }
                .into(),
            )
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(1_050)).await;
        device.stop(9).await.unwrap();

        let stopped = device.state(9).await.unwrap();
        assert_eq!(stopped.current_level, 30);
        assert!(!stopped.ramping);

        device.move_to_level(9, MIN_LEVEL, 0, true).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        let state = device.state(9).await.unwrap();
        assert_eq!(state.current_level, MIN_LEVEL);
        assert!(!state.on);
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_attributes_and_factory_reset() {
        let device = two_lights();
        let mut events = device.subscribe();

        let attributes = LevelAttributes::from_raw(150, 5, 5, 5);
        device.write_attributes(9, attributes).await.unwrap();
        assert_eq!(device.attributes(9).await.unwrap(), attributes);

        device.turn_on(9).await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(device.state(9).await.unwrap().current_level, 150);

        device.factory_reset().await.unwrap();
        assert_eq!(device.attributes(9).await.unwrap(), LevelAttributes::default());
        assert_eq!(device.attributes(8).await.unwrap(), LevelAttributes::default());

        let mut resets = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let LightEvent::AttributesReset { endpoint, .. } = event {
                resets.push(endpoint);
            }
        }
        resets.sort_unstable();
        assert_eq!(resets, vec![8, 9]);
    }
}
