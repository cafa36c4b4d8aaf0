use futures::channel::mpsc::channel;
use btleplug::api::Manager as _;
use btleplug::platform::Manager;
use log::{error, info, warn};
use tokio::spawn;
use tokio_util::sync::CancellationToken;

use crate::cli::Args;
use crate::config::io::ConfigIO;
use crate::config::types::Config;
use crate::device::LaserLink;
use crate::device::connection::DeviceSession;
use crate::device::types::DeviceEvent;
use crate::error::{AppRunError, DeviceError};
use crate::measure::arbiter::{Arbiter, ArbiterExit, LaserControl};
use crate::sim::KeystrokeEmitter;
use crate::sim::input_sim::input_sim_task;

async fn watch_interrupt(cancel: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("Keyboard interrupt detected. Disconnecting...");
            cancel.cancel();
        },
        Err(err) => warn!("Failed to listen for keyboard interrupts: {}", err),
    }
}

// Everything between connect and disconnect.
async fn measure_until_stopped<L, K>(session: &mut DeviceSession<L>, keys: &mut K, cancel: &CancellationToken) -> Result<(), DeviceError>
where
    L: LaserLink,
    K: KeystrokeEmitter,
{
    // open the stream first, so nothing sent right after subscribing is missed
    let notifications = session.notifications().await?;

    // clear whatever the laser was doing before we connected
    if let Err(err) = session.disarm().await {
        warn!("Failed to reset laser: {}", err);
    }

    session.subscribe().await?;

    let reader_cancel = CancellationToken::new();
    let (event_sender, event_receiver) = channel::<DeviceEvent>(64);
    let reader_handle = session.read_notifications_task(notifications, reader_cancel.clone(), event_sender);

    info!("Ready; press the measure button on the laser");
    let exit = Arbiter::new(session, keys).run(cancel.clone(), event_receiver).await;
    match exit {
        ArbiterExit::Cancelled => info!("Stopping"),
        ArbiterExit::ConnectionLost => warn!("Stopping, the laser is no longer connected"),
    }

    reader_cancel.cancel();
    if let Err(err) = reader_handle.await {
        warn!("Notification task failed: {}", err);
    }

    Ok(())
}

/// Types measurements from a connected laser until `cancel` fires or the connection is lost,
/// then disconnects. Disconnect is attempted exactly once, whatever happened in between.
pub async fn drive_session<L, K>(mut session: DeviceSession<L>, keys: &mut K, cancel: CancellationToken) -> Result<(), DeviceError>
where
    L: LaserLink,
    K: KeystrokeEmitter,
{
    let result = measure_until_stopped(&mut session, keys, &cancel).await;
    if let Err(err) = &result {
        error!("Error: {}", err);
    }

    info!("Disconnecting from laser ({:?})", session.state().await);
    if let Err(err) = session.disconnect().await {
        warn!("Failed to disconnect: {}", err);
    }

    result
}

/// Finds and connects to the laser, then drives the session. An interrupt before the laser
/// is connected ends the run without error.
pub async fn run_session(config: &Config, cancel: CancellationToken) -> Result<(), AppRunError> {
    let settings = config.device_settings()?;
    let manager = Manager::new().await.map_err(DeviceError::from)?;

    let Some(session) = DeviceSession::discover_and_connect(&manager, &settings, &cancel).await? else {
        info!("Interrupted before a laser was connected");
        return Ok(());
    };

    let (mut keys, input_sim_handle) = input_sim_task(config.keystroke_backend, config.key_delay());
    let result = drive_session(session, &mut keys, cancel).await;

    // queued keystrokes are still typed
    drop(keys);
    if let Err(err) = input_sim_handle.await {
        warn!("Input sim task failed: {}", err);
    }

    result.map_err(AppRunError::from)
}

pub async fn run_async(args: Args) -> Result<(), AppRunError> {
    let config_io = ConfigIO::new(args.config.clone())?;
    let mut locker = config_io.locker()?;
    let _guard = locker.lock()?;

    let mut config = config_io.read_or_default().await?;
    config.apply_args(&args);

    let cancel = CancellationToken::new();
    spawn(watch_interrupt(cancel.clone()));

    run_session(&config, cancel).await
}
