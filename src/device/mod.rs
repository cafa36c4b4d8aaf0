use std::future::Future;
use futures::stream::BoxStream;

use crate::error::DeviceError;

pub mod connection;
pub mod constants;
pub mod types;

#[cfg(test)]
pub mod fake;

/// Raw distance notification values, in arrival order.
pub type NotificationStream = BoxStream<'static, Vec<u8>>;

/// The GATT operations a session needs from a connected laser.
pub trait LaserLink: Clone + Send + Sync + 'static {
    /// Writes one command to the command characteristic.
    fn write_command(&self, command: &[u8]) -> impl Future<Output = Result<(), DeviceError>> + Send;

    /// Opens the stream of distance notifications. Open it before `subscribe` so that no
    /// notification can arrive without a reader.
    fn notifications(&self) -> impl Future<Output = Result<NotificationStream, DeviceError>> + Send;

    fn subscribe(&self) -> impl Future<Output = Result<(), DeviceError>> + Send;

    fn is_connected(&self) -> impl Future<Output = Result<bool, DeviceError>> + Send;

    fn disconnect(&self) -> impl Future<Output = Result<(), DeviceError>> + Send;
}
