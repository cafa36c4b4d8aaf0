use std::sync::{Arc, Mutex};
use futures::StreamExt;
use futures::channel::mpsc::{channel, Receiver, Sender};
use futures::stream;
use tokio::time::Instant;

use crate::device::{LaserLink, NotificationStream};
use crate::error::DeviceError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkCall {
    Write(Vec<u8>),
    Notifications,
    Subscribe,
    Disconnect,
}

#[derive(Default)]
struct FakeLinkState {
    calls: Vec<(Instant, LinkCall)>,
    notifications: Option<Receiver<Vec<u8>>>,
    disconnected: bool,
    stall_writes: bool,
    fail_subscribe: bool,
}

/// In-memory laser that records every GATT operation.
#[derive(Clone, Default)]
pub struct FakeLink {
    state: Arc<Mutex<FakeLinkState>>,
}

impl FakeLink {
    /// A link whose notifications are fed through the returned sender. Dropping the sender ends
    /// the stream, like a lost connection does.
    pub fn with_notifications() -> (FakeLink, Sender<Vec<u8>>) {
        let (tx, rx) = channel(16);
        let link = FakeLink::default();
        link.state.lock().unwrap().notifications = Some(rx);
        (link, tx)
    }

    pub fn stall_writes(self) -> Self {
        self.state.lock().unwrap().stall_writes = true;
        self
    }

    pub fn fail_subscribe(self) -> Self {
        self.state.lock().unwrap().fail_subscribe = true;
        self
    }

    pub fn calls(&self) -> Vec<LinkCall> {
        self.state.lock().unwrap().calls.iter().map(|(_, call)| call.clone()).collect()
    }

    pub fn writes(&self) -> Vec<(Instant, Vec<u8>)> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter_map(|(at, call)| match call {
                LinkCall::Write(command) => Some((*at, command.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn disconnects(&self) -> usize {
        self.calls().iter().filter(|call| **call == LinkCall::Disconnect).count()
    }

    fn record(&self, call: LinkCall) {
        self.state.lock().unwrap().calls.push((Instant::now(), call));
    }
}

impl LaserLink for FakeLink {
    async fn write_command(&self, command: &[u8]) -> Result<(), DeviceError> {
        self.record(LinkCall::Write(command.to_vec()));
        let stall = self.state.lock().unwrap().stall_writes;
        if stall {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn notifications(&self) -> Result<NotificationStream, DeviceError> {
        self.record(LinkCall::Notifications);
        let receiver = self.state.lock().unwrap().notifications.take();
        Ok(match receiver {
            Some(receiver) => receiver.boxed(),
            None => stream::pending::<Vec<u8>>().boxed(),
        })
    }

    async fn subscribe(&self) -> Result<(), DeviceError> {
        self.record(LinkCall::Subscribe);
        let fail = self.state.lock().unwrap().fail_subscribe;
        if fail {
            return Err(DeviceError::MissingCharacteristic { uuid: uuid::Uuid::nil() });
        }
        Ok(())
    }

    async fn is_connected(&self) -> Result<bool, DeviceError> {
        Ok(!self.state.lock().unwrap().disconnected)
    }

    async fn disconnect(&self) -> Result<(), DeviceError> {
        self.record(LinkCall::Disconnect);
        self.state.lock().unwrap().disconnected = true;
        Ok(())
    }
}
