use std::future::Future;
use std::time::Duration;
use tokio::spawn;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use futures::{SinkExt, StreamExt};
use futures::channel::mpsc::{channel, Sender};
use log::{debug, warn};
use rdev::{EventType, Key, simulate};

use crate::error::KeystrokeError;
use crate::sim::KeystrokeEmitter;
use crate::sim::types::{InputSimCommand, KeystrokeBackend, rdev_key};
use crate::sim::xdotool;

async fn send(event_type: EventType, delay: Duration) -> Result<(), KeystrokeError> {
    simulate(&event_type).map_err(|_| KeystrokeError::Simulate { event: format!("{:?}", event_type) })?;
    // give the OS time to pick up the event before the next one
    sleep(delay).await;
    Ok(())
}

async fn tap(key: Key, delay: Duration) -> Result<(), KeystrokeError> {
    send(EventType::KeyPress(key), delay).await?;
    send(EventType::KeyRelease(key), delay).await
}

// Types as much of the text as possible; the first failure is reported afterwards.
async fn rdev_type_text(text: &str, delay: Duration) -> Result<(), KeystrokeError> {
    let mut first_error = None;

    for ch in text.chars() {
        let result = match rdev_key(ch) {
            Some(key) => tap(key, delay).await,
            None => Err(KeystrokeError::UnsupportedCharacter { ch }),
        };

        if let Err(err) = result {
            first_error.get_or_insert(err);
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

async fn execute(backend: KeystrokeBackend, command: &InputSimCommand, delay: Duration) -> Result<(), KeystrokeError> {
    match (backend, command) {
        (KeystrokeBackend::Rdev, InputSimCommand::TypeText(text)) => rdev_type_text(text, delay).await,
        (KeystrokeBackend::Rdev, InputSimCommand::PressEnter) => tap(Key::Return, delay).await,
        (KeystrokeBackend::Xdotool, InputSimCommand::TypeText(text)) => xdotool::type_text(text).await,
        (KeystrokeBackend::Xdotool, InputSimCommand::PressEnter) => xdotool::press_enter().await,
    }
}

/// Queues keystrokes for the input sim task.
#[derive(Clone)]
pub struct InputSim {
    tx: Sender<InputSimCommand>,
}

impl InputSim {
    async fn queue(&mut self, command: InputSimCommand) {
        if let Err(err) = self.tx.send(command).await {
            warn!("Failed to queue keystrokes: {}", err);
        }
    }
}

impl KeystrokeEmitter for InputSim {
    async fn type_text(&mut self, text: &str) {
        self.queue(InputSimCommand::TypeText(text.to_string())).await
    }

    async fn press_enter(&mut self) {
        self.queue(InputSimCommand::PressEnter).await
    }
}

// Runs queued commands one at a time until every `InputSim` is dropped and the queue is empty.
pub(crate) fn spawn_input_sim<F, Fut>(mut perform: F) -> (InputSim, JoinHandle<()>)
where
    F: FnMut(InputSimCommand) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), KeystrokeError>> + Send,
{
    let (tx, mut rx) = channel::<InputSimCommand>(128);

    let handle = spawn(async move {
        while let Some(command) = rx.next().await {
            if let Err(err) = perform(command).await {
                warn!("Failed to type: {}", err);
            }
        }
        debug!("Input sim task stopped");
    });

    (InputSim { tx }, handle)
}

/// Spawns the task that performs keystrokes with `backend`. There is no cancellation: the task
/// stops after every `InputSim` has been dropped and the commands already queued are typed, so
/// an interrupt never leaves a reading half typed.
pub fn input_sim_task(backend: KeystrokeBackend, key_delay: Duration) -> (InputSim, JoinHandle<()>) {
    spawn_input_sim(move |command| async move {
        debug!("Simulating {:?} using {:?}", command, backend);
        execute(backend, &command, key_delay).await
    })
}
