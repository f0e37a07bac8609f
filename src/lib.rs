//! Scanner-rig support library: point-cloud file I/O and digital-input
//! trigger polling.
//!
//! Two subsystems, usable independently:
//!
//! - [`ply`] — reader and writer for a strict ASCII point-cloud format with
//!   a gamma 2.2 color transform ([`color`]).
//! - [`poller`] + [`controller`] — a cancellable background poller for a
//!   4-channel digital-input device ([`device`]), with declarative
//!   close/reopen reconciliation driven by the host's evaluation loop.
//!
//! The hardware boundary is the [`device::DigitalInput`] trait; this crate
//! ships only the scripted mock used in tests. Hosts bind the real vendor
//! driver and hand the poller a factory for it.

pub mod color;
pub mod controller;
pub mod device;
pub mod error;
pub mod ply;
pub mod poller;

pub use controller::{plan, Evaluation, Plan, PollerController};
pub use device::{
    ChannelConfig, ChannelMode, DeviceInfo, DigitalInput, IoStatus, Sample, CHANNEL_COUNT,
};
pub use error::{Result, ScanError};
pub use ply::reader::read_ply;
pub use ply::writer::{PlyWriter, WriteReport};
pub use ply::{PointCloud, Rgb, Vertex};
pub use poller::{
    DeviceFactory, DevicePoller, PollResult, PollerState, SampleSlot, SCAN_TIME_MICROS,
};
