//! Background device poller.
//!
//! [`DevicePoller`] owns one device session and a cancellable sampling task
//! running the open→configure→poll→close state machine. The task is the only
//! writer of the shared [`SampleSlot`]; the foreground is the only reader.
//! Results are overwritten in place, never queued — live telemetry is lossy
//! by design and the consumer only ever wants the most recent value.
//!
//! ## Concurrency model
//!
//! One sampling task per open session, spawned by [`DevicePoller::configure`]
//! and torn down by [`DevicePoller::request_close`]. Cancellation is a
//! oneshot signal observed at the top of each loop iteration, so a hung
//! device read delays shutdown until that read returns or errors;
//! `request_close` awaits the task's join handle before closing the device
//! handle. The slot lock is held only for the duration of the slot swap,
//! never across device I/O, and change notification happens outside the
//! lock.

use crate::device::{ChannelConfig, DeviceInfo, DigitalInput, IoStatus, Sample, CHANNEL_COUNT};
use crate::error::{Result, ScanError};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{oneshot, watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;

/// Per-channel sampling interval applied to every channel at open time, in
/// microseconds.
pub const SCAN_TIME_MICROS: u32 = 50_000;

/// Creates device handles bound to a port name. Injected so tests can hand
/// the poller scripted mock devices.
pub type DeviceFactory = Box<dyn Fn(&str) -> Box<dyn DigitalInput> + Send + Sync>;

/// The most recent sampling outcome: channel values plus the device status
/// they were read with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollResult {
    /// Last-read channel values. Stale when `status` is not OK.
    pub sample: Sample,
    /// Status of the read that produced (or failed to produce) the sample.
    pub status: IoStatus,
    /// When the result was recorded.
    pub timestamp: DateTime<Utc>,
}

impl Default for PollResult {
    fn default() -> Self {
        Self {
            sample: Sample::default(),
            status: IoStatus::Ok,
            timestamp: Utc::now(),
        }
    }
}

/// Poller lifecycle state. Exactly one holds at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollerState {
    /// No device handle held. Initial and terminal state.
    Closed,
    /// Handle open and configured, sampling task not yet running.
    Open,
    /// Sampling task actively reading the device.
    Polling,
}

struct SlotState {
    result: PollResult,
    publishes: u64,
}

/// Single-slot mailbox holding the latest [`PollResult`].
///
/// Cloning yields another handle to the same slot. The sampling task
/// publishes, the foreground reads; subscribers are notified through a
/// `watch` channel carrying the publish count, with no ordering guarantee
/// relative to the next foreground evaluation.
#[derive(Clone)]
pub struct SampleSlot {
    state: Arc<Mutex<SlotState>>,
    notify: watch::Sender<u64>,
}

impl Default for SampleSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleSlot {
    /// Creates an empty slot holding the default OK result.
    pub fn new() -> Self {
        let (notify, _) = watch::channel(0);
        Self {
            state: Arc::new(Mutex::new(SlotState {
                result: PollResult::default(),
                publishes: 0,
            })),
            notify,
        }
    }

    /// Overwrites the slot and notifies subscribers.
    pub fn publish(&self, result: PollResult) {
        let count = {
            let mut state = self.state.lock();
            state.result = result;
            state.publishes += 1;
            state.publishes
        };
        self.notify.send_replace(count);
    }

    /// The current result. Earlier results are gone for good.
    pub fn latest(&self) -> PollResult {
        self.state.lock().result
    }

    /// Total number of publishes since creation. Duplicate samples are
    /// filtered before publication, so this counts observed changes.
    pub fn publishes(&self) -> u64 {
        self.state.lock().publishes
    }

    /// Subscribes to change notifications. The value is the publish count
    /// at notification time.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.notify.subscribe()
    }

    /// Quietly restores the default OK result, e.g. when a new session
    /// opens and stale errors from the previous one must not linger.
    fn reset(&self) {
        self.state.lock().result = PollResult::default();
    }
}

/// Owns the device handle and the background sampling task.
pub struct DevicePoller {
    factory: DeviceFactory,
    slot: SampleSlot,
    state: PollerState,
    device: Option<Arc<AsyncMutex<Box<dyn DigitalInput>>>>,
    task: Option<JoinHandle<()>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    info: Option<DeviceInfo>,
}

impl DevicePoller {
    /// Creates a closed poller that builds device handles with `factory`.
    pub fn new(factory: DeviceFactory) -> Self {
        Self {
            factory,
            slot: SampleSlot::new(),
            state: PollerState::Closed,
            device: None,
            task: None,
            shutdown_tx: None,
            info: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PollerState {
        self.state
    }

    /// Whether a session is live (state is Open or Polling).
    pub fn is_running(&self) -> bool {
        self.state != PollerState::Closed
    }

    /// The shared sample slot written by the background task.
    pub fn slot(&self) -> &SampleSlot {
        &self.slot
    }

    /// Identify metadata from the current or most recent session.
    pub fn device_info(&self) -> Option<&DeviceInfo> {
        self.info.as_ref()
    }

    /// Opens a device on `port`, configures all four channels, and starts
    /// the sampling task.
    ///
    /// Any live session is closed first — a new session never overlaps the
    /// old one. Every active channel is put in reflect mode, inactive
    /// channels are disabled, and all channels get the fixed
    /// [`SCAN_TIME_MICROS`] scan time. Any per-channel failure aborts the
    /// whole call, closes the handle, and surfaces the device status; the
    /// poller is back in `Closed` and nothing is polled.
    pub async fn configure(&mut self, port: &str, config: ChannelConfig) -> Result<()> {
        self.request_close().await;

        let mut device = (self.factory)(port);
        match device.open().await {
            Ok(true) => {}
            Ok(false) => {
                device.close().await;
                return Err(ScanError::PortAlreadyOpen(port.to_string()));
            }
            Err(err) => {
                device.close().await;
                return Err(ScanError::OpenFailed(err.to_string()));
            }
        }

        for channel in 0..CHANNEL_COUNT {
            let status = device.set_channel_mode(channel, config.mode(channel)).await;
            if status != IoStatus::Ok {
                device.close().await;
                return Err(ScanError::Device(status));
            }
        }
        for channel in 0..CHANNEL_COUNT {
            let status = device.set_channel_scan_time(channel, SCAN_TIME_MICROS).await;
            if status != IoStatus::Ok {
                device.close().await;
                return Err(ScanError::Device(status));
            }
        }

        // One-shot descriptive read; a failure here is not fatal to the
        // session, the metadata just stays generic.
        if let Err(err) = device.identify(1).await {
            warn!("device identify failed: {err}");
        }
        self.info = Some(device.info());
        self.state = PollerState::Open;
        info!("device on port {:?} open, starting sampler", port);

        // Stale errors from the previous session must not trigger another
        // reopen on the next evaluation.
        self.slot.reset();

        let device = Arc::new(AsyncMutex::new(device));
        self.device = Some(Arc::clone(&device));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        self.shutdown_tx = Some(shutdown_tx);
        self.task = Some(tokio::spawn(poll_loop(
            device,
            config,
            self.slot.clone(),
            shutdown_rx,
        )));
        self.state = PollerState::Polling;
        Ok(())
    }

    /// Signals the sampling task to stop, waits for it to exit, then closes
    /// the device handle. Idempotent: closing a closed poller is a no-op.
    pub async fn request_close(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        if let Some(device) = self.device.take() {
            device.lock().await.close().await;
            debug!("device session closed");
        }
        self.state = PollerState::Closed;
    }
}

/// The sampling loop. Runs until cancellation is signalled or a read fails.
///
/// Each iteration checks for cancellation, performs one grouped read, and
/// publishes only when the sample differs from the previous one — identical
/// consecutive samples cause no wake-ups. A driver error records an
/// `ExecError` result and terminates the loop; the session stays formally
/// open until the foreground reconciles it.
async fn poll_loop(
    device: Arc<AsyncMutex<Box<dyn DigitalInput>>>,
    config: ChannelConfig,
    slot: SampleSlot,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let mut last: Option<Sample> = None;
    debug!("sampling loop started");
    loop {
        match shutdown_rx.try_recv() {
            Err(oneshot::error::TryRecvError::Empty) => {}
            _ => break,
        }

        let outcome = {
            let mut device = device.lock().await;
            device.read_group(&config).await
        };
        let (sample, status) = match outcome {
            Ok(pair) => pair,
            Err(err) => {
                warn!("device read failed, stopping sampler: {err}");
                slot.publish(PollResult {
                    sample: last.unwrap_or_default(),
                    status: IoStatus::ExecError,
                    timestamp: Utc::now(),
                });
                return;
            }
        };

        if last == Some(sample) {
            continue;
        }
        last = Some(sample);
        slot.publish(PollResult {
            sample,
            status,
            timestamp: Utc::now(),
        });
    }
    debug!("sampling loop stopped");
}
