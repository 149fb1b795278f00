//! Command-handler capability invoked by the command decoder

use crate::cluster::{ClusterCommand, LevelCommand, MoveMode, OnOffCommand};

/// The five cluster entry points of a dimmable light
///
/// Implemented by [`crate::LevelTransitionEngine`]. None of them fail: out of
/// range arguments saturate and a new command simply replaces the ramp in
/// flight.
pub trait LevelControlHandler {
    /// Ramp to `level` over `transition_time` tenths of a second
    fn move_to_level(&mut self, level: u8, transition_time: u16, with_on_off: bool);

    /// Ramp towards the top or bottom of the range at `rate` levels per second
    fn move_level(&mut self, mode: MoveMode, rate: u8, with_on_off: bool);

    /// Ramp `step_size` levels up or down over `transition_time`
    fn step(&mut self, mode: MoveMode, step_size: u8, transition_time: u16, with_on_off: bool);

    /// Freeze the light at its current level
    fn stop(&mut self);

    /// Handle an On/Off cluster command
    fn on_off(&mut self, cmd: OnOffCommand);

    /// Route a decoded command to its entry point
    fn handle(&mut self, command: ClusterCommand) {
        match command {
            ClusterCommand::OnOff(cmd) => self.on_off(cmd),
            ClusterCommand::Level(LevelCommand::MoveToLevel {
                level,
                transition_time,
                with_on_off,
            }) => self.move_to_level(level, transition_time, with_on_off),
            ClusterCommand::Level(LevelCommand::Move {
                mode,
                rate,
                with_on_off,
            }) => self.move_level(mode, rate, with_on_off),
            ClusterCommand::Level(LevelCommand::Step {
                mode,
                step_size,
                transition_time,
                with_on_off,
            }) => self.step(mode, step_size, transition_time, with_on_off),
            ClusterCommand::Level(LevelCommand::Stop) => self.stop(),
        }
    }
}
