//! Level transition engine
//!
//! Owns one endpoint's level and on/off state, ramps the level across ticks
//! and couples the ramp to the on/off state the way the On/Off and Level
//! Control clusters interact:
//!
//! - OFF on a lit light dims down to [`MIN_LEVEL`], switches off only once
//!   the floor is reached, then restores the previous level as the target
//!   for the next ON while staying off.
//! - ON on a dark light starts at [`MIN_LEVEL`], switches on at once and
//!   climbs back to the on level.
//! - Level commands move the level directly and touch on/off only when sent
//!   as their `WithOnOff` variants.

use crate::attributes::LevelAttributes;
use crate::cluster::{clamp_level, MoveMode, OnOffCommand, MAX_LEVEL, MIN_LEVEL};
use crate::handler::LevelControlHandler;
use crate::ramp::{Direction, Ramp, FULL_RANGE, RATE_PER_SECOND_TO_TICK, TICK_PERIOD};
use serde::Serialize;
use std::time::Duration;

/// One-shot timer that drives [`LevelTransitionEngine::advance`]
///
/// The engine re-arms it after every tick that leaves work outstanding.
pub trait TickSource {
    /// Fire once after `period`, replacing any pending tick
    fn arm(&mut self, period: Duration);
    /// Drop any pending tick
    fn cancel(&mut self);
}

/// Receives state changes, e.g. an LED/dimmer driver or a reporting layer
pub trait LightObserver {
    fn level_changed(&mut self, level: u8);
    fn on_off_changed(&mut self, on: bool);
    /// Attributes were restored to factory defaults
    fn attributes_reset(&mut self, _state: LightState) {}
}

impl LightObserver for () {
    fn level_changed(&mut self, _level: u8) {}
    fn on_off_changed(&mut self, _on: bool) {}
}

/// What caused the ramp that is currently running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    LevelCommand,
    OnCommand,
    OffCommand,
}

/// Observable state of a light endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LightState {
    /// Level shown; while off this is the level the next ON returns to
    pub current_level: u8,
    pub on: bool,
    pub last_level: u8,
    pub ramping: bool,
}

/// Per-endpoint level/on-off state machine
#[derive(Debug)]
pub struct LevelTransitionEngine<T, O> {
    endpoint: u8,
    attributes: LevelAttributes,
    current_level: u8,
    last_level: u8,
    on: bool,
    ramp: Ramp,
    coupled_to_on_off: bool,
    trigger: TriggerKind,
    tick_source: T,
    observer: O,
}

impl<T: TickSource, O: LightObserver> LevelTransitionEngine<T, O> {
    /// Create an idle engine; the remembered level starts at `current_level`
    pub fn new(
        endpoint: u8,
        current_level: u8,
        on: bool,
        attributes: LevelAttributes,
        tick_source: T,
        observer: O,
    ) -> Self {
        let current_level = clamp_level(current_level);
        Self {
            endpoint,
            attributes,
            current_level,
            last_level: current_level,
            on,
            ramp: Ramp::idle(current_level),
            coupled_to_on_off: false,
            trigger: TriggerKind::LevelCommand,
            tick_source,
            observer,
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> u8 {
        self.endpoint
    }

    #[must_use]
    pub fn current_level(&self) -> u8 {
        self.current_level
    }

    #[must_use]
    pub fn is_on(&self) -> bool {
        self.on
    }

    #[must_use]
    pub fn last_level(&self) -> u8 {
        self.last_level
    }

    #[must_use]
    pub fn is_ramping(&self) -> bool {
        self.ramp.is_active()
    }

    #[must_use]
    pub fn ramp(&self) -> &Ramp {
        &self.ramp
    }

    #[must_use]
    pub fn trigger(&self) -> TriggerKind {
        self.trigger
    }

    #[must_use]
    pub fn state(&self) -> LightState {
        LightState {
            current_level: self.current_level,
            on: self.on,
            last_level: self.last_level,
            ramping: self.ramp.is_active(),
        }
    }

    #[must_use]
    pub fn attributes(&self) -> &LevelAttributes {
        &self.attributes
    }

    /// Replace the attribute store
    pub fn write_attributes(&mut self, attributes: LevelAttributes) {
        self.attributes = attributes.normalized();
        tracing::debug!("EP{}: attributes updated: {:?}", self.endpoint, self.attributes);
    }

    /// Restore factory default attributes; the light state is untouched
    pub fn reset_attributes(&mut self) {
        self.attributes = LevelAttributes::default();
        tracing::info!("EP{}: attributes reset to factory defaults", self.endpoint);
        let state = self.state();
        self.observer.attributes_reset(state);
    }

    #[must_use]
    pub fn tick_source(&self) -> &T {
        &self.tick_source
    }

    pub fn tick_source_mut(&mut self) -> &mut T {
        &mut self.tick_source
    }

    #[must_use]
    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Run one tick of the active ramp
    ///
    /// Does nothing when idle, so a tick that slipped past a `stop` cannot
    /// move the light.
    pub fn advance(&mut self) {
        if !self.ramp.is_active() {
            tracing::trace!("EP{}: tick while idle ignored", self.endpoint);
            return;
        }

        let before = (self.current_level, self.on);
        self.current_level = self.ramp.tick();

        let no_effect = self.attributes.on_level_has_no_effect();
        if self.trigger == TriggerKind::LevelCommand && no_effect {
            self.last_level = self.current_level;
        }

        if self.coupled_to_on_off {
            if self.current_level > MIN_LEVEL {
                self.on = true;
            } else {
                // An ON ramp passing the floor must not read as off
                self.on = self.trigger == TriggerKind::OnCommand;

                if self.trigger != TriggerKind::LevelCommand && no_effect {
                    self.current_level = self.last_level;
                    if !self.ramp.is_active() {
                        self.ramp = Ramp::idle(self.current_level);
                    }
                }
            }
        }

        tracing::trace!(
            "EP{}: tick level={} on={} remaining={}",
            self.endpoint,
            self.current_level,
            self.on,
            self.ramp.remaining_ticks
        );

        self.notify(before);

        if self.ramp.is_active() {
            self.tick_source.arm(TICK_PERIOD);
        } else {
            tracing::debug!(
                "EP{}: transition complete at level {} ({})",
                self.endpoint,
                self.current_level,
                if self.on { "on" } else { "off" }
            );
        }
    }

    fn start(&mut self, ramp: Ramp) {
        self.ramp = ramp;
        tracing::debug!(
            "EP{}: ramp {} -> {} over {} ticks (rate {}, {:?}, with_on_off={})",
            self.endpoint,
            self.current_level,
            ramp.target_level,
            ramp.remaining_ticks,
            ramp.rate,
            self.trigger,
            self.coupled_to_on_off
        );
        self.tick_source.arm(TICK_PERIOD);
    }

    fn start_timed(&mut self, target: u8, transition_time: u16) {
        let ticks = self
            .attributes
            .resolve_transition_time(self.current_level, target, transition_time);
        self.start(Ramp::from_ticks(self.current_level, target, ticks));
    }

    fn notify(&mut self, (level, on): (u8, bool)) {
        if self.current_level != level {
            self.observer.level_changed(self.current_level);
        }
        if self.on != on {
            self.observer.on_off_changed(self.on);
        }
    }
}

impl<T: TickSource, O: LightObserver> LevelControlHandler for LevelTransitionEngine<T, O> {
    fn move_to_level(&mut self, level: u8, transition_time: u16, with_on_off: bool) {
        self.trigger = TriggerKind::LevelCommand;
        self.coupled_to_on_off = with_on_off;
        self.start_timed(clamp_level(level), transition_time);
    }

    fn move_level(&mut self, mode: MoveMode, rate: u8, with_on_off: bool) {
        let target = match mode {
            MoveMode::Up => MAX_LEVEL,
            MoveMode::Down => MIN_LEVEL,
        };

        self.trigger = TriggerKind::LevelCommand;
        self.coupled_to_on_off = with_on_off;
        let rate = u32::from(rate) * RATE_PER_SECOND_TO_TICK;
        self.start(Ramp::from_rate(self.current_level, target, rate));
    }

    fn step(&mut self, mode: MoveMode, step_size: u8, transition_time: u16, with_on_off: bool) {
        let target = match mode {
            MoveMode::Up => self.current_level.saturating_add(step_size),
            MoveMode::Down => self.current_level.saturating_sub(step_size),
        };

        self.trigger = TriggerKind::LevelCommand;
        self.coupled_to_on_off = with_on_off;
        self.start_timed(clamp_level(target), transition_time);
    }

    fn stop(&mut self) {
        self.tick_source.cancel();
        if self.ramp.is_active() {
            tracing::debug!("EP{}: stopped at level {}", self.endpoint, self.current_level);
        }
        self.ramp = Ramp::idle(self.current_level);
    }

    fn on_off(&mut self, cmd: OnOffCommand) {
        let turn_on = match cmd {
            OnOffCommand::On => true,
            OnOffCommand::Off => false,
            // Mid-ramp, toggle reverses where the light is heading
            OnOffCommand::Toggle if self.ramp.is_active() => self.ramp.direction == Direction::Down,
            OnOffCommand::Toggle => !self.on,
        };

        tracing::debug!(
            "EP{}: {:?} -> turning {}",
            self.endpoint,
            cmd,
            if turn_on { "on" } else { "off" }
        );

        let before = (self.current_level, self.on);
        self.trigger = if turn_on {
            TriggerKind::OnCommand
        } else {
            TriggerKind::OffCommand
        };
        self.coupled_to_on_off = true;

        let (target, preferred_time) = if turn_on {
            if !self.on {
                self.current_level = MIN_LEVEL;
            }
            let target = self.attributes.on_level.map_or(self.last_level, clamp_level);
            (target, self.attributes.on_transition_time)
        } else {
            (MIN_LEVEL, self.attributes.off_transition_time)
        };

        let ticks = self.attributes.fallback_transition_time(preferred_time);
        let rate = FULL_RANGE / u32::from(ticks);
        self.start(Ramp::from_rate(self.current_level, target, rate));

        self.notify(before);
    }
}
