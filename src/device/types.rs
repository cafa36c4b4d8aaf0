use std::time::Duration;
use uuid::Uuid;

use crate::device::constants::{
    AIM_DELAY, CONNECT_TIMEOUT, DISTO_COMMAND_CHARACTERISTIC, DISTO_DISTANCE_CHARACTERISTIC, DISTO_SERVICE,
    SCAN_TIMEOUT, WRITE_DEADLINE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    Disconnected,
    Connected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    Notification(Vec<u8>), // raw value of the distance characteristic
    ConnectionLost,
}

/// Everything needed to find, connect to and drive one laser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSettings {
    pub service: Uuid,
    pub distance_characteristic: Uuid,
    pub command_characteristic: Uuid,
    pub aim_delay: Duration,
    pub scan_timeout: Duration,
    pub connect_timeout: Duration,
    pub write_deadline: Duration,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        DeviceSettings {
            service: DISTO_SERVICE,
            distance_characteristic: DISTO_DISTANCE_CHARACTERISTIC,
            command_characteristic: DISTO_COMMAND_CHARACTERISTIC,
            aim_delay: Duration::from_millis(AIM_DELAY),
            scan_timeout: Duration::from_millis(SCAN_TIMEOUT),
            connect_timeout: Duration::from_millis(CONNECT_TIMEOUT),
            write_deadline: Duration::from_millis(WRITE_DEADLINE),
        }
    }
}
