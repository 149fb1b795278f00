//! ZCL (Zigbee Cluster Library) definitions for a dimmable light

/// Cluster IDs handled by the engine
pub mod id {
    pub const ON_OFF: u16 = 0x0006;
    pub const LEVEL_CONTROL: u16 = 0x0008;
}

/// Lowest level a lit light can show
pub const MIN_LEVEL: u8 = 0x01;
/// Highest valid level
pub const MAX_LEVEL: u8 = 0xFE;

/// Raw OnLevel value meaning "return to the level held before switching off"
pub const ON_LEVEL_NO_EFFECT: u8 = 0xFF;
/// Raw transition time meaning "unset" in the attribute store, or
/// "use the configured default" in a command
pub const TRANSITION_TIME_DEFAULT: u16 = 0xFFFF;

/// Clamp a raw level into `MIN_LEVEL..=MAX_LEVEL`
#[must_use]
pub fn clamp_level(level: u8) -> u8 {
    level.clamp(MIN_LEVEL, MAX_LEVEL)
}

/// On/Off cluster commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OnOffCommand {
    Off = 0x00,
    On = 0x01,
    Toggle = 0x02,
}

/// Move/step direction carried by Level Control commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MoveMode {
    Up = 0x00,
    Down = 0x01,
}

/// Level Control cluster commands, already decoded
///
/// The `*WithOnOff` wire variants map onto the same command with
/// `with_on_off` set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelCommand {
    MoveToLevel {
        level: u8,
        /// Tenths of a second, or [`TRANSITION_TIME_DEFAULT`]
        transition_time: u16,
        with_on_off: bool,
    },
    Move {
        mode: MoveMode,
        /// Levels per second
        rate: u8,
        with_on_off: bool,
    },
    Step {
        mode: MoveMode,
        step_size: u8,
        transition_time: u16,
        with_on_off: bool,
    },
    Stop,
}

impl LevelCommand {
    /// ZCL command ID of this command on the wire
    #[must_use]
    pub fn command_id(&self) -> u8 {
        match *self {
            Self::MoveToLevel { with_on_off: false, .. } => 0x00,
            Self::Move { with_on_off: false, .. } => 0x01,
            Self::Step { with_on_off: false, .. } => 0x02,
            Self::Stop => 0x03,
            Self::MoveToLevel { with_on_off: true, .. } => 0x04,
            Self::Move { with_on_off: true, .. } => 0x05,
            Self::Step { with_on_off: true, .. } => 0x06,
        }
    }
}

/// Any command the light accepts from the command decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterCommand {
    OnOff(OnOffCommand),
    Level(LevelCommand),
}

impl ClusterCommand {
    /// Cluster this command belongs to
    #[must_use]
    pub fn cluster_id(&self) -> u16 {
        match self {
            Self::OnOff(_) => id::ON_OFF,
            Self::Level(_) => id::LEVEL_CONTROL,
        }
    }

    /// ZCL command ID within [`Self::cluster_id`]
    #[must_use]
    pub fn command_id(&self) -> u8 {
        match self {
            Self::OnOff(cmd) => *cmd as u8,
            Self::Level(cmd) => cmd.command_id(),
        }
    }
}

impl From<OnOffCommand> for ClusterCommand {
    fn from(cmd: OnOffCommand) -> Self {
        Self::OnOff(cmd)
    }
}

impl From<LevelCommand> for ClusterCommand {
    fn from(cmd: LevelCommand) -> Self {
        Self::Level(cmd)
    }
}
