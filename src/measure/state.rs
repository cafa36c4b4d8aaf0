//! Phase tracking for the distance characteristic.
//!
//! Pressing the button on the laser produces one notification (the echo) and the measure command
//! that follows produces a second one carrying the distance. Both arrive on the same
//! characteristic, so the only way to tell them apart is to remember which one is due next.

use std::fmt;

use crate::error::PayloadError;

/// What to do in response to one notification.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Turn the laser on, wait for the operator to aim, then measure.
    Arm,
    /// A second trigger arrived before any reading; switch the laser off and start over.
    Disarm,
    /// A distance to type.
    Emit(Reading),
    /// The payload was not a distance and has been dropped.
    Discard(PayloadError),
}

/// One distance as reported by the laser.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub meters: f32,
}

impl Reading {
    pub fn decode(payload: &[u8]) -> Result<Reading, PayloadError> {
        let bytes: [u8; 4] = payload
            .try_into()
            .map_err(|_| PayloadError::Malformed { len: payload.len() })?;

        let meters = f32::from_le_bytes(bytes);
        if !meters.is_finite() {
            return Err(PayloadError::NotFinite);
        }

        Ok(Reading { meters })
    }

    pub fn millimeters(&self) -> f64 {
        f64::from(self.meters) * 1000.0
    }

    /// The text that gets typed: millimeters with one decimal.
    pub fn keystrokes(&self) -> String {
        format!("{:.1}", self.millimeters())
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} mm", self.millimeters())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ArbiterState {
    awaiting_measurement: bool,
    miss_count: u32,
}

impl ArbiterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn awaiting_measurement(&self) -> bool {
        self.awaiting_measurement
    }

    pub fn miss_count(&self) -> u32 {
        self.miss_count
    }

    /// Advances the state for one notification and returns what the caller has to do.
    ///
    /// While idle every notification is a trigger. While awaiting, an empty payload is another
    /// echo (and counts as a miss), anything else is the reading for the pending measurement.
    pub fn on_notification(&mut self, payload: &[u8]) -> Action {
        if !self.awaiting_measurement || payload.is_empty() {
            return self.on_trigger();
        }

        self.miss_count = 0;
        self.awaiting_measurement = false;

        match Reading::decode(payload) {
            Ok(reading) => Action::Emit(reading),
            Err(err) => Action::Discard(err),
        }
    }

    fn on_trigger(&mut self) -> Action {
        self.awaiting_measurement = true;
        self.miss_count += 1;

        if self.miss_count > 1 {
            // the laser went through more than one trigger without a reading
            self.awaiting_measurement = false;
            self.miss_count = 0;
            return Action::Disarm;
        }

        Action::Arm
    }
}
