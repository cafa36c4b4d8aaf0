use futures::StreamExt;
use futures::channel::mpsc::Receiver;
use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use crate::device::types::DeviceEvent;
use crate::error::DeviceError;
use crate::measure::state::{Action, ArbiterState};
use crate::sim::KeystrokeEmitter;

/// The laser commands the arbiter needs from a connected device.
#[allow(async_fn_in_trait)]
pub trait LaserControl {
    /// Laser on, aim delay, measure.
    async fn arm(&mut self) -> Result<(), DeviceError>;

    /// Laser off.
    async fn disarm(&mut self) -> Result<(), DeviceError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArbiterExit {
    Cancelled,
    ConnectionLost,
}

/// Turns distance notifications into laser commands and typed readings.
pub struct Arbiter<'a, L, K> {
    state: ArbiterState,
    laser: &'a mut L,
    keys: &'a mut K,
}

impl<'a, L: LaserControl, K: KeystrokeEmitter> Arbiter<'a, L, K> {
    pub fn new(laser: &'a mut L, keys: &'a mut K) -> Self {
        Arbiter {
            state: ArbiterState::new(),
            laser,
            keys,
        }
    }

    pub fn state(&self) -> ArbiterState {
        self.state
    }

    pub async fn handle_notification(&mut self, payload: &[u8]) {
        debug!("Received notification {:02X?}", payload);

        match self.state.on_notification(payload) {
            Action::Arm => {
                if let Err(err) = self.laser.arm().await {
                    warn!("Failed to start measurement: {}", err);
                }
            },
            Action::Disarm => {
                warn!("bad state: triggered twice without a measurement, resetting the laser");
                if let Err(err) = self.laser.disarm().await {
                    warn!("Failed to reset laser: {}", err);
                }
            },
            Action::Emit(reading) => {
                info!("Distance: {}", reading);
                self.keys.type_text(&reading.keystrokes()).await;
                self.keys.press_enter().await;
            },
            Action::Discard(err) => {
                warn!("Discarding notification {:02X?}: {}", payload, err);
            },
        }
    }

    /// Handles events one at a time until `cancel` fires or the connection goes away. An
    /// in-flight `arm` (including its aim delay) always completes before cancellation is noticed;
    /// notifications arriving meanwhile wait in `events`.
    pub async fn run(&mut self, cancel: CancellationToken, mut events: Receiver<DeviceEvent>) -> ArbiterExit {
        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => return ArbiterExit::Cancelled,
                event = events.next() => event,
            };

            match event {
                Some(DeviceEvent::Notification(payload)) => self.handle_notification(&payload).await,
                Some(DeviceEvent::ConnectionLost) | None => return ArbiterExit::ConnectionLost,
            }
        }
    }
}
