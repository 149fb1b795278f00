//! Level Control attribute store

use crate::cluster::{ON_LEVEL_NO_EFFECT, TRANSITION_TIME_DEFAULT};
use serde::{Deserialize, Serialize};

/// Default transition time for the on/off family of attributes (2 seconds)
pub const DEFAULT_TRANSITION_TIME: u16 = 20;

/// Configurable Level Control attributes of one endpoint
///
/// `None` stands for the wire sentinels: OnLevel 0xFF ("no effect") and
/// transition time 0xFFFF ("unset").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelAttributes {
    /// Level to move to on an ON command
    #[serde(default)]
    pub on_level: Option<u8>,
    /// Tenths of a second to ramp up on an ON command
    #[serde(default = "default_transition")]
    pub on_transition_time: Option<u16>,
    /// Tenths of a second to ramp down on an OFF command
    #[serde(default = "default_transition")]
    pub off_transition_time: Option<u16>,
    /// Fallback for both directions
    #[serde(default = "default_transition")]
    pub on_off_transition_time: Option<u16>,
}

#[allow(clippy::unnecessary_wraps)]
fn default_transition() -> Option<u16> {
    Some(DEFAULT_TRANSITION_TIME)
}

impl Default for LevelAttributes {
    fn default() -> Self {
        Self {
            on_level: None,
            on_transition_time: default_transition(),
            off_transition_time: default_transition(),
            on_off_transition_time: default_transition(),
        }
    }
}

impl LevelAttributes {
    /// Build from raw attribute values as they appear on the wire
    #[must_use]
    pub fn from_raw(
        on_level: u8,
        on_transition_time: u16,
        off_transition_time: u16,
        on_off_transition_time: u16,
    ) -> Self {
        Self {
            on_level: (on_level != ON_LEVEL_NO_EFFECT).then_some(on_level),
            on_transition_time: transition_from_raw(on_transition_time),
            off_transition_time: transition_from_raw(off_transition_time),
            on_off_transition_time: transition_from_raw(on_off_transition_time),
        }
    }

    /// Raw OnLevel attribute value
    #[must_use]
    pub fn raw_on_level(&self) -> u8 {
        self.on_level.unwrap_or(ON_LEVEL_NO_EFFECT)
    }

    /// Map values that smuggle a wire sentinel inside `Some` back to `None`
    #[must_use]
    pub fn normalized(self) -> Self {
        Self::from_raw(
            self.raw_on_level(),
            self.on_transition_time.unwrap_or(TRANSITION_TIME_DEFAULT),
            self.off_transition_time.unwrap_or(TRANSITION_TIME_DEFAULT),
            self.on_off_transition_time.unwrap_or(TRANSITION_TIME_DEFAULT),
        )
    }

    /// Whether ON commands return to the remembered level instead of `on_level`
    #[must_use]
    pub fn on_level_has_no_effect(&self) -> bool {
        self.on_level.is_none()
    }

    /// Resolve a command's transition time into a tick count (always >= 1)
    ///
    /// An explicit time is used as-is. The default sentinel falls through
    /// the direction-specific time, then the on/off time, then one tick.
    #[must_use]
    pub fn resolve_transition_time(&self, current_level: u8, target_level: u8, requested: u16) -> u16 {
        if requested != TRANSITION_TIME_DEFAULT {
            return requested.max(1);
        }

        let directional = if current_level > target_level {
            self.off_transition_time
        } else {
            self.on_transition_time
        };
        self.fallback_transition_time(directional)
    }

    /// Apply the on/off fallback tiers to an optional transition time
    #[must_use]
    pub fn fallback_transition_time(&self, preferred: Option<u16>) -> u16 {
        preferred
            .or(self.on_off_transition_time)
            .unwrap_or(1)
            .max(1)
    }
}

fn transition_from_raw(raw: u16) -> Option<u16> {
    (raw != TRANSITION_TIME_DEFAULT).then_some(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_defaults() {
        let attrs = LevelAttributes::default();
        assert!(attrs.on_level_has_no_effect());
        assert_eq!(attrs.raw_on_level(), ON_LEVEL_NO_EFFECT);
        assert_eq!(attrs.on_off_transition_time, Some(DEFAULT_TRANSITION_TIME));
    }

    #[test]
    fn test_explicit_time_wins() {
        let attrs = LevelAttributes::default();
        assert_eq!(attrs.resolve_transition_time(10, 200, 35), 35);
        assert_eq!(attrs.resolve_transition_time(10, 200, 0), 1);
    }

    #[test]
    fn test_fallback_tiers() {
        let mut attrs = LevelAttributes::from_raw(0xFF, 30, 40, 50);

        // Moving down uses the off time, moving up the on time
        assert_eq!(attrs.resolve_transition_time(200, 10, TRANSITION_TIME_DEFAULT), 40);
        assert_eq!(attrs.resolve_transition_time(10, 200, TRANSITION_TIME_DEFAULT), 30);

        attrs.off_transition_time = None;
        assert_eq!(attrs.resolve_transition_time(200, 10, TRANSITION_TIME_DEFAULT), 50);

        attrs.on_off_transition_time = None;
        assert_eq!(attrs.resolve_transition_time(200, 10, TRANSITION_TIME_DEFAULT), 1);
    }

    #[test]
    fn test_zero_configured_time_is_fastest() {
        let attrs = LevelAttributes::from_raw(0xFF, 0, 0, 0);
        assert_eq!(attrs.fallback_transition_time(attrs.on_transition_time), 1);
    }

    #[test]
    fn test_normalized_strips_sentinels() {
        let attrs = LevelAttributes {
            on_level: Some(ON_LEVEL_NO_EFFECT),
            on_transition_time: Some(TRANSITION_TIME_DEFAULT),
            off_transition_time: Some(7),
            on_off_transition_time: None,
        }
        .normalized();
        assert_eq!(attrs.on_level, None);
        assert_eq!(attrs.on_transition_time, None);
        assert_eq!(attrs.off_transition_time, Some(7));
    }

    #[test]
    fn test_deserialize_partial() {
        let attrs: LevelAttributes = serde_json::from_str(r#"{"on_level": 120}"#).unwrap();
        assert_eq!(attrs.on_level, Some(120));
        assert_eq!(attrs.on_transition_time, Some(DEFAULT_TRANSITION_TIME));
    }
}
