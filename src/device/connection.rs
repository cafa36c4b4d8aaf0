use std::future::Future;
use std::time::Duration;
use futures::{future, SinkExt, StreamExt};
use futures::channel::mpsc::Sender;
use btleplug::api::{Central, CharPropFlags, Characteristic, Manager as _, Peripheral as _, ScanFilter, Service, WriteType};
use btleplug::platform::{Adapter, Manager, Peripheral};
use log::{debug, info, warn};
use tokio::spawn;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, timeout, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::device::constants::{COMMAND_LASER_OFF, COMMAND_LASER_ON, COMMAND_MEASURE, POLL_DELAY};
use crate::device::{LaserLink, NotificationStream};
use crate::device::types::{DeviceEvent, DeviceSettings, DeviceState};
use crate::error::DeviceError;
use crate::measure::arbiter::LaserControl;

/**
 * How often (milliseconds) to check whether the peripheral is still connected.
 */
const CONNECTION_CHECK_INTERVAL: u64 = 2000;

fn timeout_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

async fn deadline<T, F>(operation: &'static str, after: Duration, fut: F) -> Result<T, DeviceError>
where
    F: Future<Output = T>,
{
    timeout(after, fut)
        .await
        .map_err(|_| DeviceError::Timeout { operation, timeout_ms: timeout_ms(after) })
}

async fn start_scanning(manager: &Manager, service: Uuid) -> Result<Vec<Adapter>, DeviceError> {
    let adapters = manager.adapters().await?;
    if adapters.is_empty() {
        return Err(DeviceError::NoAdapter);
    }

    let filter = ScanFilter {
        services: vec![service],
    };

    for adapter in &adapters {
        info!("Scanning using adapter {}...", adapter.adapter_info().await.unwrap_or("UNKNOWN".to_string()));
        adapter.start_scan(filter.clone()).await?;
    }

    Ok(adapters)
}

async fn stop_scanning(adapters: &[Adapter]) {
    for adapter in adapters {
        if let Err(err) = adapter.stop_scan().await {
            warn!("Failed to stop scanning: {}", err);
        }
    }
}

/// `Uuid` equality is byte based, so differently cased advertisements compare equal.
pub fn advertises_service<'a>(services: impl IntoIterator<Item = &'a Uuid>, service: &Uuid) -> bool {
    services.into_iter().any(|advertised| advertised == service)
}

async fn find_peripheral(adapters: &[Adapter], service: Uuid) -> Option<Peripheral> {
    for adapter in adapters {
        let peripherals = match adapter.peripherals().await {
            Ok(v) => v,
            Err(err) => {
                warn!("Failed to query BLE adapter for peripherals: {}", err);
                continue;
            },
        };

        for peripheral in peripherals {
            match peripheral.properties().await {
                Err(err) => {
                    warn!("Could not query peripheral for properties: {:?}", err);
                },
                Ok(None) => {
                    debug!("Peripheral has no properties");
                },
                Ok(Some(properties)) => {
                    debug!("Found device: {} - {:?}", properties.address, properties.local_name);

                    // Some environments ignore the filter, so make sure to check the service uuid again
                    if advertises_service(&properties.services, &service) {
                        info!(
                            "Using peripheral {} {}",
                            properties.address,
                            properties.local_name.unwrap_or(String::from("NONE")),
                        );
                        return Some(peripheral);
                    }
                },
            }
        }
    }

    None
}

/// How a bounded, cancellable poll ended.
#[derive(Debug, PartialEq, Eq)]
pub enum PollOutcome<T> {
    Found(T),
    TimedOut,
    Cancelled,
}

// Calls `attempt` every POLL_DELAY until it yields something, `give_up_after` elapsed or
// `cancel` fired.
async fn poll_until<T, F, Fut>(cancel: &CancellationToken, give_up_after: Duration, mut attempt: F) -> PollOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let give_up_at = Instant::now() + give_up_after;

    loop {
        if let Some(found) = attempt().await {
            return PollOutcome::Found(found);
        }
        if Instant::now() >= give_up_at {
            return PollOutcome::TimedOut;
        }

        tokio::select! {
            _ = cancel.cancelled() => return PollOutcome::Cancelled,
            _ = sleep(Duration::from_millis(POLL_DELAY)) => {},
        }
    }
}

// Ok(None) when cancelled. The adapters stop scanning however the scan ends.
async fn scan(manager: &Manager, settings: &DeviceSettings, cancel: &CancellationToken) -> Result<Option<Peripheral>, DeviceError> {
    info!("Scanning for devices with service UUID: {}", settings.service);
    let adapters = start_scanning(manager, settings.service).await?;

    let adapter_list = &adapters[..];
    let service = settings.service;
    let outcome = poll_until(cancel, settings.scan_timeout, move || find_peripheral(adapter_list, service)).await;

    stop_scanning(&adapters).await;
    match outcome {
        PollOutcome::Found(peripheral) => Ok(Some(peripheral)),
        PollOutcome::Cancelled => Ok(None),
        PollOutcome::TimedOut => Err(DeviceError::DeviceNotFound { service: settings.service }),
    }
}

pub fn find_characteristic<'a>(
    services: impl IntoIterator<Item = &'a Service>,
    service_uuid: Uuid,
    characteristic_uuid: Uuid,
) -> Result<Characteristic, DeviceError> {
    services
        .into_iter()
        .filter(|service| service.uuid == service_uuid)
        .flat_map(|service| service.characteristics.iter())
        .find(|characteristic| characteristic.uuid == characteristic_uuid)
        .cloned()
        .ok_or(DeviceError::MissingCharacteristic { uuid: characteristic_uuid })
}

/// Prefer acknowledged writes, fall back for characteristics that only accept unacknowledged ones.
pub fn write_type_for(characteristic: &Characteristic) -> WriteType {
    if characteristic.properties.contains(CharPropFlags::WRITE) {
        WriteType::WithResponse
    } else {
        WriteType::WithoutResponse
    }
}

async fn connect_peripheral(peripheral: &Peripheral, settings: &DeviceSettings) -> Result<BleLink, DeviceError> {
    info!("Connecting to peripheral...");
    deadline("connect", settings.connect_timeout, peripheral.connect())
        .await?
        .map_err(|source| DeviceError::Connection { source })?;

    info!("Connected; Discovering services...");
    deadline("connect", settings.connect_timeout, peripheral.discover_services()).await??;

    let services = peripheral.services();
    Ok(BleLink {
        peripheral: peripheral.clone(),
        distance_char: find_characteristic(&services, settings.service, settings.distance_characteristic)?,
        command_char: find_characteristic(&services, settings.service, settings.command_characteristic)?,
    })
}

async fn disconnect_if_connected(peripheral: &Peripheral) {
    if peripheral.is_connected().await.unwrap_or(false) {
        if let Err(err) = peripheral.disconnect().await {
            warn!("Failed to disconnect after failed setup: {}", err);
        }
    }
}

/// A connected DISTO with both characteristics resolved.
#[derive(Clone)]
pub struct BleLink {
    peripheral: Peripheral,
    distance_char: Characteristic,
    command_char: Characteristic,
}

impl LaserLink for BleLink {
    async fn write_command(&self, command: &[u8]) -> Result<(), DeviceError> {
        self.peripheral.write(&self.command_char, command, write_type_for(&self.command_char)).await?;
        Ok(())
    }

    async fn notifications(&self) -> Result<NotificationStream, DeviceError> {
        let distance_uuid = self.distance_char.uuid;
        let stream = self.peripheral.notifications().await?;

        Ok(stream
            .filter_map(move |data| future::ready((data.uuid == distance_uuid).then_some(data.value)))
            .boxed())
    }

    async fn subscribe(&self) -> Result<(), DeviceError> {
        info!("Subscribing to characteristic {:?} {:?}", self.distance_char.service_uuid, self.distance_char.uuid);
        self.peripheral.subscribe(&self.distance_char).await?;
        Ok(())
    }

    async fn is_connected(&self) -> Result<bool, DeviceError> {
        Ok(self.peripheral.is_connected().await?)
    }

    async fn disconnect(&self) -> Result<(), DeviceError> {
        self.peripheral.disconnect().await?;
        Ok(())
    }
}

/// One connection to the laser, from a successful connect until `disconnect`.
pub struct DeviceSession<L> {
    link: L,
    aim_delay: Duration,
    write_deadline: Duration,
}

impl DeviceSession<BleLink> {
    /// Scans for the first peripheral advertising `settings.service` and connects to it.
    ///
    /// Both characteristics are resolved here, so a connected session can always write commands
    /// and receive distances. If anything fails after the transport connected, the peripheral is
    /// disconnected again before the error is returned. Returns `Ok(None)` when `cancel` fires
    /// first.
    pub async fn discover_and_connect(
        manager: &Manager,
        settings: &DeviceSettings,
        cancel: &CancellationToken,
    ) -> Result<Option<Self>, DeviceError> {
        let Some(peripheral) = scan(manager, settings, cancel).await? else {
            return Ok(None);
        };

        let connected = tokio::select! {
            _ = cancel.cancelled() => None,
            result = connect_peripheral(&peripheral, settings) => Some(result),
        };

        match connected {
            Some(Ok(link)) => {
                info!("Connected!");
                Ok(Some(DeviceSession::new(link, settings)))
            },
            Some(Err(err)) => {
                disconnect_if_connected(&peripheral).await;
                Err(err)
            },
            None => {
                disconnect_if_connected(&peripheral).await;
                Ok(None)
            },
        }
    }
}

impl<L: LaserLink> DeviceSession<L> {
    pub fn new(link: L, settings: &DeviceSettings) -> Self {
        DeviceSession {
            link,
            aim_delay: settings.aim_delay,
            write_deadline: settings.write_deadline,
        }
    }

    async fn write_command(&self, command: &[u8], name: &str) -> Result<(), DeviceError> {
        debug!("Sending {} command {:02X?}", name, command);
        deadline("write", self.write_deadline, self.link.write_command(command)).await?
    }

    pub async fn notifications(&self) -> Result<NotificationStream, DeviceError> {
        self.link.notifications().await
    }

    pub async fn subscribe(&self) -> Result<(), DeviceError> {
        self.link.subscribe().await
    }

    pub async fn state(&self) -> DeviceState {
        match self.link.is_connected().await {
            Ok(true) => DeviceState::Connected,
            Ok(false) => DeviceState::Disconnected,
            Err(err) => {
                warn!("Error checking for connection state: {:?}", err);
                DeviceState::Disconnected
            },
        }
    }

    /// Forwards `notifications` to `sender` until `cancel` fires. Sends
    /// `DeviceEvent::ConnectionLost` once the laser stops being connected.
    pub fn read_notifications_task(
        &self,
        mut notifications: NotificationStream,
        cancel: CancellationToken,
        mut sender: Sender<DeviceEvent>,
    ) -> JoinHandle<()> {
        let link = self.link.clone();

        spawn(async move {
            let mut connection_check = interval(Duration::from_millis(CONNECTION_CHECK_INTERVAL));
            connection_check.set_missed_tick_behavior(MissedTickBehavior::Delay);

            let lost = 'mainloop: loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        break 'mainloop false;
                    },
                    data = notifications.next() => {
                        let Some(data) = data else {
                            break 'mainloop true;
                        };

                        if sender.send(DeviceEvent::Notification(data)).await.is_err() {
                            // nobody is listening anymore
                            break 'mainloop false;
                        }
                    },
                    _ = connection_check.tick() => {
                        if !link.is_connected().await.unwrap_or(false) {
                            break 'mainloop true;
                        }
                    },
                }
            };

            if lost {
                warn!("Connection lost");
                let _ = sender.send(DeviceEvent::ConnectionLost).await;
            }
        })
    }

    pub async fn disconnect(&self) -> Result<(), DeviceError> {
        self.link.disconnect().await
    }
}

impl<L: LaserLink> LaserControl for DeviceSession<L> {
    async fn arm(&mut self) -> Result<(), DeviceError> {
        self.write_command(&COMMAND_LASER_ON, "laser on").await?;
        sleep(self.aim_delay).await;
        self.write_command(&COMMAND_MEASURE, "measure").await
    }

    async fn disarm(&mut self) -> Result<(), DeviceError> {
        self.write_command(&COMMAND_LASER_OFF, "laser off").await
    }
}
