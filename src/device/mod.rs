//! Digital-input device abstraction.
//!
//! This module is the boundary to the vendor driver for the 4-channel
//! digital-input trigger box. The [`DigitalInput`] trait mirrors the vendor
//! API surface (open/close/identify, per-channel mode and scan time, grouped
//! reads); everything above it is hardware-agnostic. Only the scripted
//! [`mock::MockDigitalInput`] implementation ships in this crate — real
//! serial bindings live with the host.
//!
//! Trait methods return `anyhow::Result` at this boundary; the poller maps
//! failures into [`ScanError`](crate::error::ScanError) variants or
//! [`IoStatus`] codes.

pub mod mock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of digital input channels on the device. Fixed by the hardware.
pub const CHANNEL_COUNT: usize = 4;

/// Vendor status code set returned by device operations.
///
/// Any code other than [`IoStatus::Ok`] is treated as a failure requiring a
/// close/reopen cycle. Driver exceptions are folded into
/// [`IoStatus::ExecError`] by the polling loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IoStatus {
    /// Operation completed.
    #[default]
    Ok,
    /// Command not supported by the device.
    NotSupported,
    /// Invalid frame length.
    InvalidLength,
    /// Invalid first command parameter.
    InvalidP1,
    /// Invalid second command parameter.
    InvalidP2,
    /// Invalid I/O channel.
    InvalidChannel,
    /// Invalid value in payload.
    InvalidValue,
    /// Invalid parameter identifier.
    InvalidParam,
    /// Invalid payload data.
    InvalidData,
    /// Command execution failed. Also stands in for transient I/O faults
    /// (driver exceptions) during polling.
    ExecError,
    /// Internal device error.
    InternalError,
}

impl fmt::Display for IoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IoStatus::Ok => "OK",
            IoStatus::NotSupported => "NSUP",
            IoStatus::InvalidLength => "INV_LENGTH",
            IoStatus::InvalidP1 => "INV_P1",
            IoStatus::InvalidP2 => "INV_P2",
            IoStatus::InvalidChannel => "INV_IOCH",
            IoStatus::InvalidValue => "INV_VALUE",
            IoStatus::InvalidParam => "INV_PARAM",
            IoStatus::InvalidData => "INV_DATA",
            IoStatus::ExecError => "ERR_EXEC",
            IoStatus::InternalError => "ERR_INTERNAL",
        };
        f.write_str(name)
    }
}

/// Per-channel operating mode, configured once at open time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelMode {
    /// Continuously report the line's current logic level.
    Reflect,
    /// Channel disabled; its sampled value is undefined.
    Inactive,
}

/// Which of the four channels are active and should be sampled.
///
/// Compared by equality for change detection (order-sensitive, fixed
/// length). The default activates all four channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig([bool; CHANNEL_COUNT]);

impl Default for ChannelConfig {
    fn default() -> Self {
        Self([true; CHANNEL_COUNT])
    }
}

impl ChannelConfig {
    /// Builds a config from exactly [`CHANNEL_COUNT`] flags.
    pub fn new(flags: [bool; CHANNEL_COUNT]) -> Self {
        Self(flags)
    }

    /// Builds a config from a slice, or `None` when the length is wrong.
    /// A wrong-length slice is never a pollable configuration.
    pub fn from_slice(flags: &[bool]) -> Option<Self> {
        <[bool; CHANNEL_COUNT]>::try_from(flags).ok().map(Self)
    }

    /// Whether channel `index` is active.
    pub fn active(&self, index: usize) -> bool {
        self.0[index]
    }

    /// The mode channel `index` should be configured with.
    pub fn mode(&self, index: usize) -> ChannelMode {
        if self.0[index] {
            ChannelMode::Reflect
        } else {
            ChannelMode::Inactive
        }
    }

    /// The raw flags.
    pub fn flags(&self) -> [bool; CHANNEL_COUNT] {
        self.0
    }
}

/// Last-read logic levels of the four channels. Values for inactive
/// channels are undefined and should be ignored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Logic level per channel.
    pub values: [bool; CHANNEL_COUNT],
}

impl Sample {
    /// Builds a sample from per-channel levels.
    pub fn new(values: [bool; CHANNEL_COUNT]) -> Self {
        Self { values }
    }
}

/// Static device metadata gathered by `identify`, one-shot at open time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device class name.
    pub class_name: String,
    /// Device type name.
    pub type_name: String,
    /// Firmware revision string.
    pub firmware_revision: String,
    /// Hardware revision string.
    pub hardware_revision: String,
    /// Serial number.
    pub serial_number: String,
}

impl DeviceInfo {
    /// Human-readable lines, one per field, for host display.
    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("Class name: {}", self.class_name),
            format!("Type name: {}", self.type_name),
            format!("Firmware revision: {}", self.firmware_revision),
            format!("Hardware revision: {}", self.hardware_revision),
            format!("Serial number: {}", self.serial_number),
        ]
    }
}

/// Vendor driver surface for the 4-channel digital-input device.
///
/// Implementations wrap one bound port. `open` returning `Ok(false)` means
/// the port is already held elsewhere; `Err` covers every other open
/// failure. Configuration calls report a vendor [`IoStatus`] instead of
/// failing through `Result`, matching the wire protocol. `read_group`
/// blocks for roughly one scan interval and samples all four channels in a
/// single transaction.
#[async_trait]
pub trait DigitalInput: Send + Sync {
    /// Opens the port. `Ok(false)` means the port is already in use.
    async fn open(&mut self) -> anyhow::Result<bool>;

    /// Closes the port. Safe to call on a device that never opened.
    async fn close(&mut self);

    /// Whether the port is currently open.
    fn is_open(&self) -> bool;

    /// Requests the identify block `id` from the device, populating the
    /// metadata returned by [`DigitalInput::info`].
    async fn identify(&mut self, id: u8) -> anyhow::Result<()>;

    /// Metadata captured by the last successful `identify`.
    fn info(&self) -> DeviceInfo;

    /// Sets the operating mode of one channel.
    async fn set_channel_mode(&mut self, channel: usize, mode: ChannelMode) -> IoStatus;

    /// Sets the sampling interval of one channel, in microseconds.
    async fn set_channel_scan_time(&mut self, channel: usize, micros: u32) -> IoStatus;

    /// Reads all four channel values in one call. An `Err` models a driver
    /// exception; a non-OK status models a device-reported failure.
    async fn read_group(&mut self, channels: &ChannelConfig) -> anyhow::Result<(Sample, IoStatus)>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_config_from_slice() {
        assert!(ChannelConfig::from_slice(&[true, false, true, false]).is_some());
        assert!(ChannelConfig::from_slice(&[true; 3]).is_none());
        assert!(ChannelConfig::from_slice(&[true; 5]).is_none());
    }

    #[test]
    fn test_channel_config_modes() {
        let config = ChannelConfig::new([true, false, true, true]);
        assert_eq!(config.mode(0), ChannelMode::Reflect);
        assert_eq!(config.mode(1), ChannelMode::Inactive);
        assert!(config.active(2));
    }

    #[test]
    fn test_default_config_all_active() {
        let config = ChannelConfig::default();
        assert!((0..CHANNEL_COUNT).all(|i| config.active(i)));
    }

    #[test]
    fn test_device_info_lines() {
        let info = DeviceInfo {
            class_name: "Digital Input".into(),
            type_name: "DI4".into(),
            firmware_revision: "1.08".into(),
            hardware_revision: "2".into(),
            serial_number: "0123".into(),
        };
        let lines = info.lines();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "Class name: Digital Input");
        assert_eq!(lines[4], "Serial number: 0123");
    }
}
