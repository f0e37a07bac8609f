//! Poller reconciliation.
//!
//! Each foreground evaluation hands the controller the requested port,
//! channel flags, and enabled flag. Instead of handling every input change
//! imperatively, [`plan`] collapses "what changed" into declarative close
//! and open intents:
//!
//! 1. A channel list that is not exactly four entries long is never polled:
//!    any live session is closed and the evaluation fails.
//! 2. A changed port or channel configuration forces close-then-reopen with
//!    the new configuration, if still enabled.
//! 3. A non-OK status on the latest poll result forces close-then-reopen
//!    (self-healing on transient I/O faults), if still enabled.
//! 4. Enabled with no live session requests open.
//! 5. Disabled with a live session requests close.
//! 6. Close always takes effect before open — a new session never overlaps
//!    the old one.
//!
//! The same four rules fully determine behavior regardless of which input
//! changed. Evaluations are assumed serialized: no two run concurrently.

use crate::device::{ChannelConfig, DeviceInfo, IoStatus};
use crate::error::{Result, ScanError};
use crate::poller::{DeviceFactory, DevicePoller, PollResult, SampleSlot};
use log::debug;

/// Declarative close/open intents for one evaluation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Plan {
    /// Close the live session before anything else.
    pub close: bool,
    /// Open a session with the requested configuration.
    pub open: bool,
}

/// Computes the close/open intents for one evaluation.
///
/// `config_changed` covers both the port name and the channel flags;
/// `last_status` is the status of the most recent [`PollResult`];
/// `running` is whether the poller currently holds a session.
pub fn plan(config_changed: bool, enabled: bool, last_status: IoStatus, running: bool) -> Plan {
    let mut close = !enabled;
    let mut open = false;

    if config_changed {
        close = true;
        open = enabled;
    }
    if last_status != IoStatus::Ok {
        close = true;
        open = enabled;
    }

    // Open whenever enabled without a live session; never close what is
    // not running.
    open |= enabled && !running;
    close &= running;

    Plan { close, open }
}

/// Outcome of one evaluation, for the host to display.
#[derive(Clone, Debug)]
pub struct Evaluation {
    /// The latest poll result after the plan was applied.
    pub result: PollResult,
    /// Device metadata from the current or most recent session.
    pub info: Option<DeviceInfo>,
}

/// Applies [`plan`] to a [`DevicePoller`], tracking the previously applied
/// configuration for change detection.
pub struct PollerController {
    poller: DevicePoller,
    applied: Option<(String, ChannelConfig)>,
}

impl PollerController {
    /// Creates a controller around a closed poller.
    pub fn new(factory: DeviceFactory) -> Self {
        Self {
            poller: DevicePoller::new(factory),
            applied: None,
        }
    }

    /// The underlying poller.
    pub fn poller(&self) -> &DevicePoller {
        &self.poller
    }

    /// The shared sample slot, for subscribing to change notifications.
    pub fn slot(&self) -> &SampleSlot {
        self.poller.slot()
    }

    /// Runs one reconciliation pass.
    ///
    /// Closes and/or (re)opens the poller per the rules above, then returns
    /// the latest result. Open failures propagate; they are not retried
    /// within the evaluation, but rule 4 will request another open on the
    /// next one while still enabled.
    pub async fn evaluate(
        &mut self,
        port: &str,
        channels: &[bool],
        enabled: bool,
    ) -> Result<Evaluation> {
        let config = match ChannelConfig::from_slice(channels) {
            Some(config) => config,
            None => {
                self.poller.request_close().await;
                self.applied = None;
                return Err(ScanError::InvalidChannelCount(channels.len()));
            }
        };

        let changed = self
            .applied
            .as_ref()
            .map_or(true, |(p, c)| p != port || *c != config);
        if changed {
            self.applied = Some((port.to_string(), config));
        }

        let last_status = self.poller.slot().latest().status;
        let plan = plan(changed, enabled, last_status, self.poller.is_running());
        debug!(
            "evaluation: changed={} enabled={} status={} -> {:?}",
            changed, enabled, last_status, plan
        );

        if plan.close {
            self.poller.request_close().await;
        }
        if plan.open {
            self.poller.configure(port, config).await?;
        }

        Ok(Evaluation {
            result: self.poller.slot().latest(),
            info: self.poller.device_info().cloned(),
        })
    }

    /// Closes any live session, e.g. on host shutdown.
    pub async fn shutdown(&mut self) {
        self.poller.request_close().await;
    }
}
