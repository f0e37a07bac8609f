//! Scripted mock digital-input device for tests.
//!
//! The mock shares its state behind an `Arc` so a test can keep a handle
//! while the poller owns the boxed device, script sample sequences, inject
//! open/config/read failures, and assert on the recorded call order.

use super::{ChannelConfig, ChannelMode, DeviceInfo, DigitalInput, IoStatus, Sample};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// One recorded driver call, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MockEvent {
    /// `open` was called.
    Open,
    /// `close` was called while the port was open.
    Close,
    /// `identify` was called.
    Identify,
    /// `set_channel_mode(channel, mode)` was called.
    SetMode(usize, ChannelMode),
    /// `set_channel_scan_time(channel, micros)` was called.
    SetScanTime(usize, u32),
    /// `read_group` was called.
    Read,
}

/// How the next `open` call behaves.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OpenBehavior {
    /// Open succeeds.
    #[default]
    Succeed,
    /// Open reports the port already in use (`Ok(false)`).
    Busy,
    /// Open fails with a driver error carrying this message.
    Fail(String),
}

/// Shared scripting state of a [`MockDigitalInput`].
#[derive(Debug, Default)]
pub struct MockState {
    /// Behavior of the next `open` call.
    pub open_behavior: OpenBehavior,
    /// Status returned by every `set_channel_mode` call.
    pub mode_status: IoStatus,
    /// Status returned by every `set_channel_scan_time` call.
    pub scan_time_status: IoStatus,
    /// Samples handed out by successive `read_group` calls. When the
    /// script runs dry the last scripted sample repeats, so the polling
    /// loop settles without publishing duplicates.
    pub script: VecDeque<Sample>,
    /// `read_group` fails with a driver error once this many reads have
    /// completed.
    pub fail_after_reads: Option<usize>,
    /// Identify metadata reported by the device.
    pub info: DeviceInfo,
    /// Recorded call sequence.
    pub events: Vec<MockEvent>,
    /// Total `read_group` calls across all sessions.
    pub reads: usize,
    open: bool,
    last_sample: Sample,
}

impl MockState {
    /// Appends a sample to the read script.
    pub fn push_sample(&mut self, sample: Sample) {
        self.script.push_back(sample);
    }

    /// Whether the port is currently open.
    pub fn is_open(&self) -> bool {
        self.open
    }
}

/// Handle to shared mock state, kept by tests.
pub type SharedMockState = Arc<Mutex<MockState>>;

/// Creates a fresh shared state with default behavior and an empty script.
pub fn shared_state() -> SharedMockState {
    Arc::new(Mutex::new(MockState::default()))
}

/// Mock implementation of [`DigitalInput`] driven by a [`MockState`].
pub struct MockDigitalInput {
    state: SharedMockState,
}

impl MockDigitalInput {
    /// Creates a mock bound to `state`. Several instances may share one
    /// state, modelling reopen cycles on the same physical port.
    pub fn new(state: SharedMockState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl DigitalInput for MockDigitalInput {
    async fn open(&mut self) -> anyhow::Result<bool> {
        let mut state = self.state.lock();
        state.events.push(MockEvent::Open);
        match state.open_behavior.clone() {
            OpenBehavior::Succeed => {
                state.open = true;
                Ok(true)
            }
            OpenBehavior::Busy => Ok(false),
            OpenBehavior::Fail(message) => Err(anyhow::anyhow!(message)),
        }
    }

    async fn close(&mut self) {
        let mut state = self.state.lock();
        if state.open {
            state.events.push(MockEvent::Close);
            state.open = false;
        }
    }

    fn is_open(&self) -> bool {
        self.state.lock().open
    }

    async fn identify(&mut self, _id: u8) -> anyhow::Result<()> {
        self.state.lock().events.push(MockEvent::Identify);
        Ok(())
    }

    fn info(&self) -> DeviceInfo {
        self.state.lock().info.clone()
    }

    async fn set_channel_mode(&mut self, channel: usize, mode: ChannelMode) -> IoStatus {
        let mut state = self.state.lock();
        state.events.push(MockEvent::SetMode(channel, mode));
        state.mode_status
    }

    async fn set_channel_scan_time(&mut self, channel: usize, micros: u32) -> IoStatus {
        let mut state = self.state.lock();
        state.events.push(MockEvent::SetScanTime(channel, micros));
        state.scan_time_status
    }

    async fn read_group(&mut self, _channels: &ChannelConfig) -> anyhow::Result<(Sample, IoStatus)> {
        // Stand in for the blocking scan interval; also yields so the
        // foreground can run between iterations.
        tokio::time::sleep(Duration::from_millis(1)).await;

        let mut state = self.state.lock();
        state.events.push(MockEvent::Read);
        if let Some(limit) = state.fail_after_reads {
            if state.reads >= limit {
                return Err(anyhow::anyhow!("simulated read failure"));
            }
        }
        state.reads += 1;
        if let Some(next) = state.script.pop_front() {
            state.last_sample = next;
        }
        Ok((state.last_sample, IoStatus::Ok))
    }
}
