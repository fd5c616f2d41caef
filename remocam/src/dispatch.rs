//! Callback plumbing for unsolicited device traffic.
//!
//! Every device owns one [Dispatcher] task. All callbacks for that device
//! run on it, in the order the triggering frames arrived; there is no
//! ordering guarantee across devices. Callbacks must not block for long,
//! or they delay later notifications for the same device.
use crate::Result;
use remocam_protocol::{
    command::FileType, CameraStatus, DeviceEvent, EventSeverity,
};
use std::sync::Arc;
use tokio::{sync::mpsc, task::JoinHandle};

/// Invoked with every refreshed status snapshot.
pub type DevStatusCallback = Arc<dyn Fn(&CameraStatus) + Send + Sync>;

/// Invoked for every event notification pushed by the device.
pub type DevEventNotifyCallback = Arc<dyn Fn(&EventNotice) + Send + Sync>;

/// Terminal result of a file download: the assembled bytes, or the error
/// that ended the transfer.
pub type FileDownloadCallback = Arc<dyn Fn(FileType, Result<Vec<u8>>) + Send + Sync>;

/// Upload progress: `0..=100` percent done, negative on failure.
pub type FileUploadCallback = Arc<dyn Fn(FileType, i32) + Send + Sync>;

/// A decoded event notification.
#[derive(Debug, Clone)]
pub struct EventNotice {
    /// Raw event identifier as sent by the device.
    pub raw: i32,
    /// Resolved identifier; `None` for identifiers this library has no
    /// name for (newer firmware).
    pub event: Option<DeviceEvent>,
    pub severity: EventSeverity,
    /// Event-specific payload, undecoded.
    pub data: Vec<u8>,
}

impl EventNotice {
    pub(crate) fn from_payload(payload: &[u8]) -> Option<Self> {
        let id_bytes = payload.get(..4)?;
        let raw = i32::from_be_bytes(id_bytes.try_into().ok()?);
        Some(Self {
            raw,
            event: DeviceEvent::from_raw(raw),
            severity: EventSeverity::from_raw(raw),
            data: payload[4..].to_vec(),
        })
    }
}

type Job = Box<dyn FnOnce() + Send>;

/// Runs closures sequentially on a dedicated task.
pub(crate) struct Dispatcher {
    tx: mpsc::UnboundedSender<Job>,
    task: JoinHandle<()>,
}

impl Dispatcher {
    pub(crate) fn new() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        let task = tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                job();
            }
        });
        Self { tx, task }
    }

    /// Queues `job` behind everything already dispatched for this device.
    pub(crate) fn dispatch(&self, job: impl FnOnce() + Send + 'static) {
        // Failure means the task is gone, which only happens at shutdown.
        let _ = self.tx.send(Box::new(job));
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}
