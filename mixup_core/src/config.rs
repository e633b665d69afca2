// Copyright 2026 the Mixup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-update options and configuration errors.
//!
//! [`Options`] are passed to every
//! [`StageMachine::update`](crate::machine::StageMachine::update) call and
//! are re-validated each time, together with the key list. Invalid
//! configuration is reported as a [`ConfigError`] before any stage work
//! happens; there is no partial application.

use alloc::collections::BTreeSet;
use core::str::FromStr;

use thiserror::Error;

use crate::key::Key;
use crate::time::Duration;

/// Which container dimension is animated while cells move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DynamicDirection {
    /// The container's width follows the frames.
    Horizontal,
    /// The container's height follows the frames.
    Vertical,
    /// The container is never sized by the animation, and the commit stage
    /// is skipped.
    Off,
}

impl FromStr for DynamicDirection {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "horizontal" => Ok(Self::Horizontal),
            "vertical" => Ok(Self::Vertical),
            "off" => Ok(Self::Off),
            _ => Err(ConfigError::InvalidDynamicDirection),
        }
    }
}

/// Options for one animated list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Options {
    /// Which container dimension is animated, if any.
    pub dynamic_direction: DynamicDirection,
    /// Length of the host transition.
    ///
    /// A zero duration behaves like [`disable_transition`](Self::disable_transition).
    pub transition_duration: Duration,
    /// Always render at rest; key changes apply immediately.
    pub disable_transition: bool,
    /// Extra delay between a completed measurement and the commit, leaving
    /// the measurement layer visible for inspection.
    pub debug_measure: Option<Duration>,
    /// Re-measure every retained frame on each key change instead of only
    /// unmeasured frames plus the newest [`measure_window`](Self::measure_window).
    pub remeasure_all_frames: bool,
    /// How many of the newest frames are always re-measured.
    pub measure_window: usize,
}

impl Options {
    /// Number of newest frames re-measured by default.
    pub const DEFAULT_MEASURE_WINDOW: usize = 2;

    /// Creates options with the required fields and defaults for the rest.
    #[must_use]
    pub const fn new(dynamic_direction: DynamicDirection, transition_duration: Duration) -> Self {
        Self {
            dynamic_direction,
            transition_duration,
            disable_transition: false,
            debug_measure: None,
            remeasure_all_frames: false,
            measure_window: Self::DEFAULT_MEASURE_WINDOW,
        }
    }

    /// Sets [`disable_transition`](Self::disable_transition).
    #[must_use]
    pub const fn with_disable_transition(mut self, disable: bool) -> Self {
        self.disable_transition = disable;
        self
    }

    /// Sets [`debug_measure`](Self::debug_measure).
    #[must_use]
    pub const fn with_debug_measure(mut self, delay: Option<Duration>) -> Self {
        self.debug_measure = delay;
        self
    }

    /// Sets [`remeasure_all_frames`](Self::remeasure_all_frames).
    #[must_use]
    pub const fn with_remeasure_all_frames(mut self, remeasure: bool) -> Self {
        self.remeasure_all_frames = remeasure;
        self
    }

    /// Sets [`measure_window`](Self::measure_window).
    #[must_use]
    pub const fn with_measure_window(mut self, window: usize) -> Self {
        self.measure_window = window;
        self
    }

    /// Returns `true` if key changes go through the animation pipeline.
    #[must_use]
    pub const fn transitions_enabled(&self) -> bool {
        !self.disable_transition && !self.transition_duration.is_zero()
    }

    /// Checks the invariants the type system cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.measure_window == 0 {
            return Err(ConfigError::InvalidMeasureWindow);
        }
        Ok(())
    }
}

/// Checks that every key in an ordering is unique.
pub fn validate_keys(keys: &[Key]) -> Result<(), ConfigError> {
    let mut seen = BTreeSet::new();
    for key in keys {
        if !seen.insert(key) {
            return Err(ConfigError::DuplicateKey(key.clone()));
        }
    }
    Ok(())
}

/// Converts a host transition duration in milliseconds.
pub fn transition_duration_from_millis(ms: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_millis(ms).ok_or(ConfigError::NegativeTransitionDuration)
}

/// Converts a host debug-measure delay in milliseconds.
pub fn debug_measure_from_millis(ms: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_millis(ms).ok_or(ConfigError::InvalidDebugMeasure)
}

/// Invalid configuration.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// No key list was supplied.
    #[error("Invalid keys: keys must be provided")]
    MissingKeys,

    /// A key appears more than once in one ordering.
    #[error("Invalid keys: every key must be unique")]
    DuplicateKey(Key),

    /// A key is neither a string nor an integer.
    #[error("Invalid keys: every key must be a string or an integer")]
    InvalidKey,

    /// The transition duration is negative or not a number.
    #[error("Invalid transitionDuration: transition duration must be a number >= 0")]
    NegativeTransitionDuration,

    /// A render callback is not callable.
    #[error("Invalid {0}: must be a function")]
    NotCallable(&'static str),

    /// The debug-measure delay is not a non-negative number.
    #[error("Invalid debugMeasure: must be a number")]
    InvalidDebugMeasure,

    /// The growth axis is not one of the known values.
    #[error("Invalid dynamicDirection: expected \"horizontal\", \"vertical\" or \"off\"")]
    InvalidDynamicDirection,

    /// The measure window is zero.
    #[error("Invalid measureWindow: must be at least 1")]
    InvalidMeasureWindow,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec;
    use alloc::vec::Vec;

    fn keys(ns: &[i64]) -> Vec<Key> {
        ns.iter().copied().map(Key::from).collect()
    }

    #[test]
    fn unique_keys_pass() {
        assert_eq!(validate_keys(&keys(&[1, 2, 3])), Ok(()));
        assert_eq!(validate_keys(&[]), Ok(()));
        assert_eq!(validate_keys(&[Key::from(1), Key::from("1")]), Ok(()));
    }

    #[test]
    fn duplicate_keys_fail() {
        assert_eq!(
            validate_keys(&keys(&[1, 2, 1])),
            Err(ConfigError::DuplicateKey(Key::from(1)))
        );
        let strings = vec![Key::from("a"), Key::from("a")];
        assert!(validate_keys(&strings).is_err());
    }

    #[test]
    fn messages() {
        assert_eq!(
            ConfigError::DuplicateKey(Key::from(1)).to_string(),
            "Invalid keys: every key must be unique"
        );
        assert_eq!(
            ConfigError::MissingKeys.to_string(),
            "Invalid keys: keys must be provided"
        );
        assert_eq!(
            ConfigError::NotCallable("renderCell").to_string(),
            "Invalid renderCell: must be a function"
        );
        assert_eq!(
            ConfigError::InvalidDebugMeasure.to_string(),
            "Invalid debugMeasure: must be a number"
        );
    }

    #[test]
    fn direction_parsing() {
        assert_eq!("horizontal".parse(), Ok(DynamicDirection::Horizontal));
        assert_eq!("vertical".parse(), Ok(DynamicDirection::Vertical));
        assert_eq!("off".parse(), Ok(DynamicDirection::Off));
        assert_eq!(
            "diagonal".parse::<DynamicDirection>(),
            Err(ConfigError::InvalidDynamicDirection)
        );
    }

    #[test]
    fn zero_duration_disables_transitions() {
        let on = Options::new(DynamicDirection::Vertical, Duration(500));
        assert!(on.transitions_enabled());
        assert!(!on.with_disable_transition(true).transitions_enabled());
        let zero = Options::new(DynamicDirection::Vertical, Duration::ZERO);
        assert!(!zero.transitions_enabled());
    }

    #[test]
    fn measure_window_must_be_positive() {
        let opts = Options::new(DynamicDirection::Off, Duration(100));
        assert_eq!(opts.validate(), Ok(()));
        assert_eq!(
            opts.with_measure_window(0).validate(),
            Err(ConfigError::InvalidMeasureWindow)
        );
    }

    #[test]
    fn host_millis() {
        assert_eq!(transition_duration_from_millis(250.0), Ok(Duration(250)));
        assert_eq!(
            transition_duration_from_millis(-1.0),
            Err(ConfigError::NegativeTransitionDuration)
        );
        assert_eq!(
            debug_measure_from_millis(f64::NAN),
            Err(ConfigError::InvalidDebugMeasure)
        );
    }
}
