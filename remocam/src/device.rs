//! Per-device façade: identity, typed operations, cached status and
//! callback registration.
use crate::{
    channel::CommandChannel,
    dispatch::{
        DevEventNotifyCallback, DevStatusCallback, Dispatcher, EventNotice, FileDownloadCallback,
        FileUploadCallback,
    },
    transport::Transport,
    Error, Result,
};
use concread::cowcell::asynch::CowCell;
use remocam_protocol::{
    command::{
        AiSetEnabled, AiSetGestureCtrl, AiSetTargetSelect, AiSetTrackingMode, AiSetWorkMode,
        AiStatus, AiStatusRequest, AiVerticalTrack, AiWorkMode, AddPreset,
        BootPositionRequest, CameraSetAntiFlicker, CameraSetAutoSleepTime, CameraSetBgMode,
        CameraSetFaceAe, CameraSetFaceFocus, CameraSetHdr, CameraSetMediaMode, CameraSetRecord,
        CameraSetRunState, CameraSetZoomAbsolute, CameraTakePhoto, CameraZoomRangeRequest,
        CameraZoomRequest, DeletePreset, DeviceInfo, DeviceInfoRequest, FileChunkRequest,
        FileChunkSend, FileTransferFinish, FileTransferStart, FileType, GestureKind,
        GimbalAttitude, GimbalAttitudeRequest, GimbalMotorAngle, GimbalResetHome, GimbalSpeedCtrl,
        GimbalSpeedPosition, GimbalStop, HeartbeatRequest, MediaBgMode, MediaMode, ParamRange,
        PowerLineFreq, PresetPosition, Reboot, ResetBootPosition, RunState, SetBootPosition,
        StatusRequest, TriggerBootPosition, TriggerPreset, WifiInfo, WifiInfoRequest,
        FILE_CHUNK_SIZE,
    },
    CameraStatus, Command, Dialect, Frame, ProductType, TransportKind,
};
use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, AtomicI32, Ordering},
        Arc, Mutex, MutexGuard, Weak,
    },
};
use tokio::sync::mpsc;

/// Recovers the guard from a poisoned lock; the data is plain-old-data
/// here, so a panicked holder cannot leave it inconsistent.
fn locked<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Cached device identity, read once during initialization.
#[derive(Debug, Clone)]
pub struct DeviceIdentity {
    pub product: ProductType,
    /// Serial number; unique per device and stable across reconnects.
    pub sn: String,
    /// User-settable device name.
    pub name: String,
    pub model: String,
    /// Firmware version.
    pub version: String,
}

impl TryFrom<&DeviceInfo> for DeviceIdentity {
    type Error = Error;

    fn try_from(info: &DeviceInfo) -> Result<Self> {
        Ok(Self {
            product: ProductType::from_wire(info.product)?,
            sn: info.sn.to_string(),
            name: info.name.to_string(),
            model: info.model.to_string(),
            version: info.version.to_string(),
        })
    }
}

struct DeviceInner {
    identity: DeviceIdentity,
    kind: TransportKind,
    channel: CommandChannel,
    status: CowCell<Option<CameraStatus>>,

    /// Inbound-frame countdown until the next automatic status fetch.
    countdown: AtomicI32,
    refresh_period: AtomicI32,
    status_events: AtomicBool,

    local_resource_path: Mutex<Option<PathBuf>>,

    status_cb: Mutex<Option<DevStatusCallback>>,
    event_cb: Mutex<Option<DevEventNotifyCallback>>,
    file_download_cb: Mutex<Option<FileDownloadCallback>>,
    file_upload_cb: Mutex<Option<FileUploadCallback>>,

    dispatcher: Dispatcher,
}

/// A connected device. Cheap to clone; all clones share the session.
#[derive(Clone)]
pub struct Device {
    inner: Arc<DeviceInner>,
}

impl Device {
    /// Default inbound-frame count between automatic status fetches.
    pub const STATUS_REFRESH_PERIOD: i32 = 100;

    /// Opens a session on `transport` and reads the identity block.
    ///
    /// A device which does not answer the identity request within the
    /// default deadline fails with [`Error::Timeout`] and is never
    /// surfaced further up.
    pub async fn connect(transport: Arc<dyn Transport>) -> Result<Device> {
        let kind = transport.kind();
        let (channel, unsolicited_rx) = CommandChannel::new(transport);

        let info = channel.request(&DeviceInfoRequest).await?;
        let identity = DeviceIdentity::try_from(&info)?;
        info!(
            "connected to {} \"{}\" (sn {}, fw {})",
            identity.product, identity.name, identity.sn, identity.version
        );

        let inner = Arc::new(DeviceInner {
            identity,
            kind,
            channel,
            status: CowCell::new(None),
            countdown: AtomicI32::new(Self::STATUS_REFRESH_PERIOD),
            refresh_period: AtomicI32::new(Self::STATUS_REFRESH_PERIOD),
            status_events: AtomicBool::new(false),
            local_resource_path: Mutex::new(None),
            status_cb: Mutex::new(None),
            event_cb: Mutex::new(None),
            file_download_cb: Mutex::new(None),
            file_upload_cb: Mutex::new(None),
            dispatcher: Dispatcher::new(),
        });

        tokio::spawn(DeviceInner::unsolicited_task(
            Arc::downgrade(&inner),
            unsolicited_rx,
        ));

        Ok(Device { inner })
    }

    // Identity getters are O(1) reads of the cached block.

    pub fn product(&self) -> ProductType {
        self.inner.identity.product
    }

    pub fn sn(&self) -> &str {
        &self.inner.identity.sn
    }

    pub fn name(&self) -> &str {
        &self.inner.identity.name
    }

    pub fn model(&self) -> &str {
        &self.inner.identity.model
    }

    pub fn version(&self) -> &str {
        &self.inner.identity.version
    }

    pub fn transport_kind(&self) -> TransportKind {
        self.inner.kind
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.inner.identity
    }

    /// `true` while the underlying transport is usable.
    pub fn is_connected(&self) -> bool {
        !self.inner.channel.is_down()
    }

    /// Last cached status snapshot, if one was fetched yet.
    pub async fn camera_status(&self) -> Option<CameraStatus> {
        *self.inner.status.read().await
    }

    /// Fetches a fresh status snapshot, updating the cache and firing the
    /// status callback.
    pub async fn refresh_status(&self) -> Result<CameraStatus> {
        DeviceInner::fetch_status(&self.inner).await
    }

    /// Arms or disarms delivery of status snapshots to the registered
    /// [`DevStatusCallback`].
    pub fn enable_status_events(&self, enabled: bool) {
        self.inner.status_events.store(enabled, Ordering::Release);
    }

    /// Sets the inbound-frame count after which the next automatic status
    /// fetch is issued. The counter restarts at `period` every time it
    /// runs out.
    pub fn set_status_refresh(&self, period: i32) {
        self.inner.refresh_period.store(period, Ordering::Release);
        self.inner.countdown.store(period, Ordering::Release);
    }

    /// Inbound frames left until the next automatic status fetch.
    pub fn status_countdown(&self) -> i32 {
        self.inner.countdown.load(Ordering::Acquire)
    }

    pub fn set_status_callback(&self, cb: Option<DevStatusCallback>) {
        *locked(&self.inner.status_cb) = cb;
    }

    pub fn set_event_callback(&self, cb: Option<DevEventNotifyCallback>) {
        *locked(&self.inner.event_cb) = cb;
    }

    pub fn set_file_download_callback(&self, cb: Option<FileDownloadCallback>) {
        *locked(&self.inner.file_download_cb) = cb;
    }

    pub fn set_file_upload_callback(&self, cb: Option<FileUploadCallback>) {
        *locked(&self.inner.file_upload_cb) = cb;
    }

    /// Directory used to stage file transfers.
    pub fn set_local_resource_path(&self, path: PathBuf) {
        *locked(&self.inner.local_resource_path) = Some(path);
    }

    /// Sends one command and counts the exchange towards the automatic
    /// status refresh.
    async fn send<C: Command>(&self, cmd: &C) -> Result<C::Response> {
        let response = self.inner.channel.request(cmd).await?;
        DeviceInner::tick(&self.inner);
        Ok(response)
    }

    // ---- gimbal ----

    /// Rotation speeds in degrees per second; all zero stops the gimbal.
    pub async fn gimbal_set_speed(&self, pitch: f32, pan: f32, roll: f32) -> Result {
        self.send(&GimbalSpeedCtrl { pitch, pan, roll }).await?;
        Ok(())
    }

    pub async fn gimbal_stop(&self) -> Result {
        self.send(&GimbalStop).await?;
        Ok(())
    }

    /// Absolute motor angles in degrees (pitch -90..=90, yaw -180..=180).
    pub async fn gimbal_set_motor_angle(&self, pitch: f32, yaw: f32, roll: f32) -> Result {
        self.send(&GimbalMotorAngle { pitch, yaw, roll }).await?;
        Ok(())
    }

    pub async fn gimbal_attitude(&self) -> Result<GimbalAttitude> {
        self.send(&GimbalAttitudeRequest).await
    }

    pub async fn gimbal_reset_home(&self) -> Result {
        self.send(&GimbalResetHome).await?;
        Ok(())
    }

    /// Moves to a target attitude at the given reference speeds.
    pub async fn gimbal_move_to(
        &self,
        (roll, pitch, yaw): (f32, f32, f32),
        (speed_roll, speed_pitch, speed_yaw): (f32, f32, f32),
    ) -> Result {
        self.send(&GimbalSpeedPosition {
            roll,
            pitch,
            yaw,
            speed_roll,
            speed_pitch,
            speed_yaw,
        })
        .await?;
        Ok(())
    }

    pub async fn set_boot_position(&self, position: PresetPosition) -> Result {
        self.send(&SetBootPosition(position)).await?;
        Ok(())
    }

    pub async fn boot_position(&self) -> Result<PresetPosition> {
        self.send(&BootPositionRequest).await
    }

    pub async fn trigger_boot_position(&self, zone_tracking: bool) -> Result {
        self.send(&TriggerBootPosition {
            reset_mode: u8::from(zone_tracking),
        })
        .await?;
        Ok(())
    }

    pub async fn reset_boot_position(&self) -> Result {
        self.send(&ResetBootPosition).await?;
        Ok(())
    }

    pub async fn add_preset(&self, preset: PresetPosition) -> Result {
        self.send(&AddPreset(preset)).await?;
        Ok(())
    }

    pub async fn delete_preset(&self, id: i32) -> Result {
        self.send(&DeletePreset { id }).await?;
        Ok(())
    }

    pub async fn trigger_preset(&self, id: i32) -> Result {
        self.send(&TriggerPreset { id }).await?;
        Ok(())
    }

    // ---- AI ----

    pub async fn ai_set_enabled(&self, enabled: bool) -> Result {
        self.send(&AiSetEnabled { enabled }).await?;
        Ok(())
    }

    pub async fn ai_set_work_mode(&self, mode: AiWorkMode) -> Result {
        self.send(&AiSetWorkMode { mode }).await?;
        Ok(())
    }

    pub async fn ai_set_tracking_mode(&self, mode: AiVerticalTrack) -> Result {
        self.send(&AiSetTrackingMode { mode }).await?;
        Ok(())
    }

    pub async fn ai_select_target(&self, select: bool) -> Result {
        self.send(&AiSetTargetSelect { select }).await?;
        Ok(())
    }

    pub async fn ai_set_gesture(&self, gesture: GestureKind, enabled: bool) -> Result {
        self.send(&AiSetGestureCtrl { gesture, enabled }).await?;
        Ok(())
    }

    pub async fn ai_status(&self) -> Result<AiStatus> {
        self.send(&AiStatusRequest).await
    }

    // ---- camera ----

    /// Sets the absolute zoom as a normalized factor,
    /// `1.0..=`[`ProductType::max_zoom`].
    pub async fn camera_set_zoom_absolute(&self, zoom: f32) -> Result {
        let ratio = self.zoom_to_ratio(zoom)?;
        self.send(&CameraSetZoomAbsolute { ratio }).await?;
        Ok(())
    }

    /// Current zoom as a normalized factor, `1.0..=max_zoom`.
    pub async fn camera_zoom(&self) -> Result<f32> {
        let value = self.send(&CameraZoomRequest).await?;
        let max = self.product().max_zoom();
        Ok(1.0 + f32::from(value.ratio) / 100.0 * (max - 1.0))
    }

    pub async fn camera_zoom_range(&self) -> Result<ParamRange> {
        self.send(&CameraZoomRangeRequest).await
    }

    pub async fn camera_set_face_focus(&self, enabled: bool) -> Result {
        self.send(&CameraSetFaceFocus { enabled }).await?;
        Ok(())
    }

    pub async fn camera_set_face_ae(&self, enabled: bool) -> Result {
        self.send(&CameraSetFaceAe { enabled }).await?;
        Ok(())
    }

    pub async fn camera_set_hdr(&self, enabled: bool) -> Result {
        self.send(&CameraSetHdr { enabled }).await?;
        Ok(())
    }

    pub async fn camera_set_anti_flicker(&self, freq: PowerLineFreq) -> Result {
        self.send(&CameraSetAntiFlicker { freq }).await?;
        Ok(())
    }

    /// Meet dialect only.
    pub async fn camera_set_media_mode(&self, mode: MediaMode) -> Result {
        self.require_dialect(Dialect::Meet)?;
        self.send(&CameraSetMediaMode { mode }).await?;
        Ok(())
    }

    /// Meet dialect only.
    pub async fn camera_set_bg_mode(&self, mode: MediaBgMode, blur_level: u8) -> Result {
        self.require_dialect(Dialect::Meet)?;
        self.send(&CameraSetBgMode { mode, blur_level }).await?;
        Ok(())
    }

    /// `0` disables auto sleep.
    pub async fn camera_set_auto_sleep_time(&self, seconds: i16) -> Result {
        self.send(&CameraSetAutoSleepTime { seconds }).await?;
        Ok(())
    }

    pub async fn camera_set_run_state(&self, state: RunState) -> Result {
        self.send(&CameraSetRunState { state }).await?;
        Ok(())
    }

    /// Tail Air dialect only.
    pub async fn camera_take_photo(&self) -> Result {
        self.require_dialect(Dialect::TailAir)?;
        self.send(&CameraTakePhoto).await?;
        Ok(())
    }

    /// Tail Air dialect only.
    pub async fn camera_set_record(&self, start: bool) -> Result {
        self.require_dialect(Dialect::TailAir)?;
        self.send(&CameraSetRecord { start }).await?;
        Ok(())
    }

    // ---- system ----

    pub async fn wifi_info(&self) -> Result<WifiInfo> {
        self.send(&WifiInfoRequest).await
    }

    /// The transport will drop shortly after the device acknowledges.
    pub async fn reboot(&self) -> Result {
        self.send(&Reboot).await?;
        Ok(())
    }

    pub(crate) async fn heartbeat(&self) -> Result {
        self.inner.channel.request(&HeartbeatRequest).await?;
        Ok(())
    }

    /// Shuts the session down. Idempotent; in-flight requests fail with
    /// [`Error::Disconnected`].
    pub async fn close(&self) {
        self.inner.channel.close().await;
    }

    // ---- file transfer ----

    /// Starts a background download of `file_type` and returns
    /// immediately; the terminal result arrives at the registered
    /// [`FileDownloadCallback`].
    ///
    /// Fails up front when `file_type` names an upload resource, no local
    /// resource path is configured, or the resource does not exist on the
    /// device.
    pub async fn start_file_download(&self, file_type: FileType) -> Result {
        if file_type.is_upload() {
            return Err(Error::ParameterOutOfRange);
        }
        if locked(&self.inner.local_resource_path).is_none() {
            return Err(Error::NotInitialized);
        }

        let info = self
            .inner
            .channel
            .request(&FileTransferStart {
                file_type,
                local_crc: 0,
            })
            .await?;
        if !info.exists {
            return Err(Error::NotFound);
        }

        let inner = self.inner.clone();
        tokio::spawn(async move {
            let result = DeviceInner::run_download(&inner, file_type, info.size as usize).await;
            let cb = locked(&inner.file_download_cb).clone();
            if let Some(cb) = cb {
                inner
                    .dispatcher
                    .dispatch(move || cb(file_type, result));
            }
        });
        Ok(())
    }

    /// Starts a background upload of `data` as `file_type` and returns
    /// immediately; progress (0..=100, negative on failure) arrives at the
    /// registered [`FileUploadCallback`].
    pub async fn start_file_upload(&self, file_type: FileType, data: Vec<u8>) -> Result {
        if !file_type.is_upload() {
            return Err(Error::ParameterOutOfRange);
        }
        if locked(&self.inner.local_resource_path).is_none() {
            return Err(Error::NotInitialized);
        }

        self.inner
            .channel
            .request(&FileTransferStart {
                file_type,
                local_crc: 0,
            })
            .await?;

        let inner = self.inner.clone();
        tokio::spawn(async move {
            DeviceInner::run_upload(&inner, file_type, data).await;
        });
        Ok(())
    }

    fn zoom_to_ratio(&self, zoom: f32) -> Result<u16> {
        let max = self.product().max_zoom();
        if !(1.0..=max).contains(&zoom) {
            return Err(Error::ParameterOutOfRange);
        }
        Ok(((zoom - 1.0) / (max - 1.0) * 100.0).round() as u16)
    }

    fn require_dialect(&self, dialect: Dialect) -> Result {
        if self.product().dialect() == dialect {
            Ok(())
        } else {
            Err(Error::Mode)
        }
    }
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("identity", &self.inner.identity)
            .field("kind", &self.inner.kind)
            .finish_non_exhaustive()
    }
}

impl DeviceInner {
    /// Counts one inbound frame towards the automatic status refresh, and
    /// kicks a fetch off when the counter runs out.
    fn tick(inner: &Arc<Self>) {
        let previous = inner.countdown.fetch_sub(1, Ordering::AcqRel);
        if previous > 1 {
            return;
        }
        inner
            .countdown
            .store(inner.refresh_period.load(Ordering::Acquire), Ordering::Release);

        let inner = inner.clone();
        tokio::spawn(async move {
            // Busy just means the slot is in use; the next period retries.
            if let Err(e) = Self::fetch_status(&inner).await {
                debug!("automatic status refresh failed: {e}");
            }
        });
    }

    async fn fetch_status(inner: &Arc<Self>) -> Result<CameraStatus> {
        let raw = inner.channel.request(&StatusRequest).await?;
        let status = CameraStatus::parse(inner.identity.product, &raw.0)?;
        Self::store_status(inner, status).await;
        Ok(status)
    }

    async fn store_status(inner: &Arc<Self>, status: CameraStatus) {
        let mut txn = inner.status.write().await;
        *txn = Some(status);
        txn.commit().await;

        if inner.status_events.load(Ordering::Acquire) {
            if let Some(cb) = locked(&inner.status_cb).clone() {
                inner.dispatcher.dispatch(move || cb(&status));
            }
        }
    }

    async fn unsolicited_task(inner: Weak<Self>, mut rx: mpsc::Receiver<Frame>) {
        while let Some(frame) = rx.recv().await {
            let Some(inner) = inner.upgrade() else {
                return;
            };
            Self::tick(&inner);

            if frame.flags.status() {
                match CameraStatus::parse(inner.identity.product, &frame.payload) {
                    Ok(status) => Self::store_status(&inner, status).await,
                    Err(e) => debug!("undecodable status push: {e}"),
                }
            } else if frame.flags.event() {
                match EventNotice::from_payload(&frame.payload) {
                    Some(notice) => {
                        if let Some(cb) = locked(&inner.event_cb).clone() {
                            inner.dispatcher.dispatch(move || cb(&notice));
                        }
                    }
                    None => debug!("undecodable event frame ({} bytes)", frame.payload.len()),
                }
            }
        }
    }

    async fn run_download(inner: &Arc<Self>, file_type: FileType, size: usize) -> Result<Vec<u8>> {
        let mut data = Vec::with_capacity(size);
        loop {
            let chunk = inner
                .channel
                .request(&FileChunkRequest {
                    file_type,
                    offset: data.len() as u32,
                })
                .await?;
            if chunk.offset as usize != data.len() {
                inner
                    .channel
                    .request(&FileTransferFinish {
                        file_type,
                        complete: false,
                    })
                    .await?;
                return Err(Error::Internal);
            }
            let done = chunk.data.len() < FILE_CHUNK_SIZE;
            data.extend_from_slice(&chunk.data);
            if done {
                break;
            }
        }

        inner
            .channel
            .request(&FileTransferFinish {
                file_type,
                complete: true,
            })
            .await?;
        Ok(data)
    }

    async fn run_upload(inner: &Arc<Self>, file_type: FileType, data: Vec<u8>) {
        let report = |progress: i32| {
            if let Some(cb) = locked(&inner.file_upload_cb).clone() {
                inner.dispatcher.dispatch(move || cb(file_type, progress));
            }
        };

        let total = data.len().max(1);
        let mut offset = 0usize;
        // An empty upload still needs one (empty) chunk to round-trip.
        loop {
            let end = (offset + FILE_CHUNK_SIZE).min(data.len());
            let send = inner
                .channel
                .request(&FileChunkSend {
                    file_type,
                    offset: offset as u32,
                    data: data[offset..end].to_vec(),
                })
                .await;
            if let Err(e) = send {
                warn!("upload of {file_type:?} failed at offset {offset}: {e}");
                let _ = inner
                    .channel
                    .request(&FileTransferFinish {
                        file_type,
                        complete: false,
                    })
                    .await;
                report(-1);
                return;
            }
            offset = end;
            if offset >= data.len() {
                break;
            }
            report((offset * 100 / total) as i32);
        }

        match inner
            .channel
            .request(&FileTransferFinish {
                file_type,
                complete: true,
            })
            .await
        {
            Ok(_) => report(100),
            Err(e) => {
                warn!("upload finish for {file_type:?} failed: {e}");
                report(-1);
            }
        }
    }
}
