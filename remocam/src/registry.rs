//! The device registry: discovery, lifecycle and lookup.
//!
//! A device moves through `Discovered -> Initializing -> Connected ->
//! Disconnected`. It only becomes visible (and the changed-callback only
//! fires) once initialization has fully completed; a device which never
//! answers its identity request is never announced. Sleep and privacy
//! modes are not lifecycle states; they surface through
//! [`RunState`][remocam_protocol::command::RunState] in the status
//! snapshot while the device stays connected.
use crate::{
    device::Device,
    transport::{Transport, UdpTransport, UDP_CONTROL_PORT},
    Error, Result,
};
use remocam_protocol::TransportKind;
use std::{
    collections::HashMap,
    net::IpAddr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, Weak,
    },
    time::Duration,
};
use tokio::{sync::mpsc, task::JoinHandle, time::sleep};

fn locked<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Fired on connectivity transitions: `(serial, connected)`. Exactly one
/// call per transition into Connected, one per transition into
/// Disconnected.
pub type DevChangedCallback = Arc<dyn Fn(&str, bool) + Send + Sync>;

/// Registry-wide configuration. The initial values are given to
/// [`Registry::new`]; every field can be changed later through the
/// registry's setters, taking effect on the next heartbeat probe or scan
/// pass.
#[derive(Clone)]
pub struct RegistryConfig {
    /// Liveness probe period for network devices.
    pub heartbeat_interval: Duration,
    /// Consecutive missed heartbeats before a network device is declared
    /// gone.
    pub heartbeat_loss_limit: u32,
    /// Whether network scans also query mDNS (`_remo._udp`).
    pub enable_mdns_scan: bool,
    /// Addresses probed by [`Registry::start_network_scan`].
    pub network_white_list: Vec<IpAddr>,
    /// Bluetooth addresses the BLE backend is allowed to attach.
    pub bluetooth_white_list: Vec<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_millis(3000),
            heartbeat_loss_limit: 3,
            enable_mdns_scan: true,
            network_white_list: Vec::new(),
            bluetooth_white_list: Vec::new(),
        }
    }
}

/// Transport arrival and departure notices, fed by transport backends
/// (USB hotplug, mDNS, BLE) through a [DiscoverySource].
pub enum DiscoveryEvent {
    /// A new link came up; the registry will initialize it.
    Attached(Arc<dyn Transport>),
    /// The backend knows the device with this serial is gone (eg. USB
    /// unplug). Network devices also leave via heartbeat loss.
    Detached(String),
}

/// Write half of the discovery feed; hand one to each transport backend.
#[derive(Clone)]
pub struct DiscoverySource {
    tx: mpsc::Sender<DiscoveryEvent>,
    inner: Weak<RegistryInner>,
}

impl DiscoverySource {
    pub async fn attached(&self, transport: Arc<dyn Transport>) {
        let _ = self.tx.send(DiscoveryEvent::Attached(transport)).await;
    }

    pub async fn detached(&self, sn: &str) {
        let _ = self
            .tx
            .send(DiscoveryEvent::Detached(sn.to_string()))
            .await;
    }

    /// Whether the BLE backend may attach this peer address. An empty
    /// white list allows every address; a closed registry allows none.
    pub fn bluetooth_allowed(&self, address: &str) -> bool {
        let Some(inner) = self.inner.upgrade() else {
            return false;
        };
        let config = locked(&inner.config);
        config.bluetooth_white_list.is_empty()
            || config.bluetooth_white_list.iter().any(|a| a == address)
    }
}

struct DeviceEntry {
    device: Device,
    heartbeat: Option<JoinHandle<()>>,
}

struct RegistryInner {
    config: Mutex<RegistryConfig>,
    devices: Mutex<HashMap<String, DeviceEntry>>,
    changed_cb: Mutex<Option<DevChangedCallback>>,
    scanning: AtomicBool,
    closed: AtomicBool,
    discovery_tx: mpsc::Sender<DiscoveryEvent>,
    discovery_task: Mutex<Option<JoinHandle<()>>>,
}

lazy_static! {
    static ref GLOBAL: Registry = Registry::new(RegistryConfig::default());
}

/// Tracks every connected device, keyed by serial number.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

impl Registry {
    /// The process-wide registry, created with default configuration on
    /// first use. Library embedders with special needs use
    /// [`Registry::new`] instead.
    pub fn global() -> &'static Registry {
        &GLOBAL
    }

    pub fn new(config: RegistryConfig) -> Registry {
        let (discovery_tx, discovery_rx) = mpsc::channel(16);
        let inner = Arc::new(RegistryInner {
            config: Mutex::new(config),
            devices: Mutex::new(HashMap::new()),
            changed_cb: Mutex::new(None),
            scanning: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            discovery_tx,
            discovery_task: Mutex::new(None),
        });

        let task = tokio::spawn(RegistryInner::discovery_task(
            Arc::downgrade(&inner),
            discovery_rx,
        ));
        *locked(&inner.discovery_task) = Some(task);

        Registry { inner }
    }

    /// A handle for transport backends to announce links through.
    pub fn discovery_source(&self) -> DiscoverySource {
        DiscoverySource {
            tx: self.inner.discovery_tx.clone(),
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// A snapshot of the current configuration.
    pub fn config(&self) -> RegistryConfig {
        locked(&self.inner.config).clone()
    }

    /// Changes the liveness probe period. Running heartbeat tasks pick it
    /// up on their next probe.
    pub fn set_heartbeat_interval(&self, interval: Duration) {
        locked(&self.inner.config).heartbeat_interval = interval;
    }

    /// Changes the consecutive-miss limit for heartbeat loss.
    pub fn set_heartbeat_loss_limit(&self, limit: u32) {
        locked(&self.inner.config).heartbeat_loss_limit = limit;
    }

    /// Replaces the set of addresses probed by the next scan pass.
    pub fn set_network_white_list(&self, list: Vec<IpAddr>) {
        locked(&self.inner.config).network_white_list = list;
    }

    /// Replaces the set of peers [`DiscoverySource::bluetooth_allowed`]
    /// admits.
    pub fn set_bluetooth_white_list(&self, list: Vec<String>) {
        locked(&self.inner.config).bluetooth_white_list = list;
    }

    /// Enables or disables mDNS querying on the next scan pass.
    pub fn set_mdns_scan(&self, enabled: bool) {
        locked(&self.inner.config).enable_mdns_scan = enabled;
    }

    /// Initializes a device on `transport` and registers it. Returns the
    /// existing handle when the serial is already registered.
    pub async fn attach(&self, transport: Arc<dyn Transport>) -> Result<Device> {
        RegistryInner::attach(&self.inner, transport).await
    }

    /// Disconnects and removes the device with this serial, if present.
    pub async fn detach(&self, sn: &str) {
        self.inner.detach(sn).await;
    }

    /// One registration slot; setting replaces the previous callback.
    pub fn set_changed_callback(&self, cb: Option<DevChangedCallback>) {
        *locked(&self.inner.changed_cb) = cb;
    }

    pub fn dev_count(&self) -> usize {
        locked(&self.inner.devices).len()
    }

    pub fn contains(&self, sn: &str) -> bool {
        locked(&self.inner.devices).contains_key(sn)
    }

    pub fn get_by_sn(&self, sn: &str) -> Option<Device> {
        locked(&self.inner.devices).get(sn).map(|e| e.device.clone())
    }

    /// First device whose user-visible name matches. Names are not
    /// unique; prefer [`get_by_sn`][Self::get_by_sn].
    pub fn get_by_name(&self, name: &str) -> Option<Device> {
        locked(&self.inner.devices)
            .values()
            .find(|e| e.device.name() == name)
            .map(|e| e.device.clone())
    }

    pub fn device_list(&self) -> Vec<Device> {
        locked(&self.inner.devices)
            .values()
            .map(|e| e.device.clone())
            .collect()
    }

    /// Probes the configured network white list (and mDNS, when enabled)
    /// in the background. Fails fast with [`Error::Busy`] while a scan
    /// pass is still running.
    pub fn start_network_scan(&self) -> Result {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(Error::Disconnected);
        }
        if self.inner.scanning.swap(true, Ordering::AcqRel) {
            return Err(Error::Busy);
        }

        let inner = self.inner.clone();
        tokio::spawn(async move {
            // Configuration is sampled once per pass.
            let (white_list, mdns) = {
                let config = locked(&inner.config);
                (config.network_white_list.clone(), config.enable_mdns_scan)
            };
            for addr in white_list {
                match UdpTransport::connect((addr, UDP_CONTROL_PORT)).await {
                    Ok(transport) => {
                        if let Err(e) = RegistryInner::attach(&inner, Arc::new(transport)).await {
                            debug!("no device at {addr}: {e}");
                        }
                    }
                    Err(e) => debug!("cannot probe {addr}: {e}"),
                }
            }
            if mdns {
                // mDNS browsing is delegated to the embedder's backend via
                // [DiscoverySource]; the flag only gates it centrally.
                trace!("mDNS scan delegated to discovery backends");
            }
            inner.scanning.store(false, Ordering::Release);
        });
        Ok(())
    }

    /// Disconnects every device and stops discovery. Idempotent; the
    /// changed-callback fires once per still-connected device.
    pub async fn close(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(task) = locked(&self.inner.discovery_task).take() {
            task.abort();
        }

        let entries: Vec<(String, DeviceEntry)> =
            locked(&self.inner.devices).drain().collect();
        for (sn, entry) in entries {
            if let Some(h) = entry.heartbeat {
                h.abort();
            }
            entry.device.close().await;
            self.inner.notify(&sn, false);
        }
    }
}

impl RegistryInner {
    async fn attach(inner: &Arc<Self>, transport: Arc<dyn Transport>) -> Result<Device> {
        if inner.closed.load(Ordering::Acquire) {
            return Err(Error::Disconnected);
        }

        // Initializing: nothing is announced until this succeeds.
        let device = Device::connect(transport).await?;
        let sn = device.sn().to_string();

        if device.transport_kind() == TransportKind::Network
            && !device.product().is_network_capable()
        {
            warn!(
                "device {sn} reports product {}, which has no network control",
                device.product()
            );
            device.close().await;
            return Err(Error::FeatureUnavailable);
        }

        // The initialization above may have raced a concurrent attach of
        // the same serial, or a close(); decide and insert under one
        // acquisition of the devices lock.
        enum Verdict {
            Inserted,
            Duplicate(Device),
            Closed,
        }
        let verdict = {
            let mut devices = locked(&inner.devices);
            if inner.closed.load(Ordering::Acquire) {
                Verdict::Closed
            } else if let Some(existing) = devices.get(&sn) {
                Verdict::Duplicate(existing.device.clone())
            } else {
                let heartbeat = (device.transport_kind() == TransportKind::Network).then(|| {
                    tokio::spawn(Self::heartbeat_task(
                        Arc::downgrade(inner),
                        device.clone(),
                    ))
                });
                devices.insert(
                    sn.clone(),
                    DeviceEntry {
                        device: device.clone(),
                        heartbeat,
                    },
                );
                Verdict::Inserted
            }
        };

        match verdict {
            Verdict::Inserted => {
                inner.notify(&sn, true);
                Ok(device)
            }
            Verdict::Duplicate(existing) => {
                debug!("device {sn} already registered, dropping duplicate link");
                device.close().await;
                Ok(existing)
            }
            Verdict::Closed => {
                device.close().await;
                Err(Error::Disconnected)
            }
        }
    }

    async fn detach(&self, sn: &str) {
        // The map removal is the exactly-once gate for the callback.
        let Some(entry) = locked(&self.devices).remove(sn) else {
            return;
        };
        if let Some(h) = entry.heartbeat {
            h.abort();
        }
        entry.device.close().await;
        self.notify(sn, false);
    }

    fn notify(&self, sn: &str, connected: bool) {
        info!(
            "device {sn} {}",
            if connected { "connected" } else { "disconnected" }
        );
        if let Some(cb) = locked(&self.changed_cb).clone() {
            cb(sn, connected);
        }
    }

    async fn discovery_task(inner: Weak<Self>, mut rx: mpsc::Receiver<DiscoveryEvent>) {
        while let Some(event) = rx.recv().await {
            let Some(inner) = inner.upgrade() else {
                return;
            };
            match event {
                DiscoveryEvent::Attached(transport) => {
                    if let Err(e) = Self::attach(&inner, transport).await {
                        debug!("attach failed: {e}");
                    }
                }
                DiscoveryEvent::Detached(sn) => inner.detach(&sn).await,
            }
        }
    }

    /// Probes one network device until it misses too many heartbeats in a
    /// row, then detaches it.
    async fn heartbeat_task(inner: Weak<Self>, device: Device) {
        let mut misses = 0;
        loop {
            // Period and loss limit are re-read every cycle, so setter
            // changes apply on the next probe.
            let (period, loss_limit) = match inner.upgrade() {
                Some(inner) => {
                    let config = locked(&inner.config);
                    (config.heartbeat_interval, config.heartbeat_loss_limit)
                }
                None => return,
            };
            sleep(period).await;
            match device.heartbeat().await {
                Ok(()) => misses = 0,
                // An occupied slot means traffic is flowing; that is proof
                // of life too.
                Err(Error::Busy) => misses = 0,
                Err(e) => {
                    misses += 1;
                    warn!(
                        "device {} missed heartbeat ({misses}/{loss_limit}): {e}",
                        device.sn()
                    );
                    if misses >= loss_limit {
                        let Some(inner) = inner.upgrade() else {
                            return;
                        };
                        inner.detach(device.sn()).await;
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{device::test::identity_payload, transport::mock::MockTransport};
    use remocam_protocol::{
        command::{DeviceInfoRequest, HeartbeatRequest},
        Command, Frame,
    };

    fn scripted_transport(
        sn: &str,
        kind: TransportKind,
        alive: Arc<AtomicBool>,
    ) -> Arc<dyn Transport> {
        // TailAir, the network-capable product.
        scripted_product(4, sn, kind, alive)
    }

    fn scripted_product(
        product: u8,
        sn: &str,
        kind: TransportKind,
        alive: Arc<AtomicBool>,
    ) -> Arc<dyn Transport> {
        let sn = sn.to_string();
        let (transport, remote) = MockTransport::pair_kind(kind);
        remote.autorespond(move |frame| {
            if frame.opcode == HeartbeatRequest::OPCODE && !alive.load(Ordering::Acquire) {
                return None;
            }
            let payload = if frame.opcode == DeviceInfoRequest::OPCODE {
                identity_payload(product, &sn, "studio")
            } else {
                vec![]
            };
            Some(Frame::response(frame.opcode, frame.sequence, 0, payload))
        });
        Arc::new(transport)
    }

    /// Records `(serial, connected)` transitions.
    fn recording_callback() -> (DevChangedCallback, Arc<Mutex<Vec<(String, bool)>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let log2 = log.clone();
        (
            Arc::new(move |sn: &str, connected| {
                locked(&log2).push((sn.to_string(), connected));
            }),
            log,
        )
    }

    #[tokio::test]
    async fn attach_announces_once() -> Result {
        let registry = Registry::new(RegistryConfig::default());
        let (cb, log) = recording_callback();
        registry.set_changed_callback(Some(cb));

        let alive = Arc::new(AtomicBool::new(true));
        let device = registry
            .attach(scripted_transport("SN1000", TransportKind::Usb, alive))
            .await?;

        assert_eq!(registry.dev_count(), 1);
        assert!(registry.contains("SN1000"));
        assert_eq!(
            registry.get_by_sn("SN1000").map(|d| d.name().to_string()),
            Some("studio".to_string())
        );
        assert!(registry.get_by_name("studio").is_some());
        assert_eq!(*locked(&log), vec![("SN1000".to_string(), true)]);

        // A duplicate link resolves to the existing handle, silently.
        let alive = Arc::new(AtomicBool::new(true));
        let dup = registry
            .attach(scripted_transport("SN1000", TransportKind::Usb, alive))
            .await?;
        assert_eq!(dup.sn(), device.sn());
        assert_eq!(registry.dev_count(), 1);
        assert_eq!(locked(&log).len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn unresponsive_transport_never_announced() {
        let registry = Registry::new(RegistryConfig::default());
        let (cb, log) = recording_callback();
        registry.set_changed_callback(Some(cb));

        let (transport, _remote) = MockTransport::pair();
        let result = registry.attach(Arc::new(transport)).await;
        assert!(result.is_err());
        assert_eq!(registry.dev_count(), 0);
        assert!(locked(&log).is_empty());
    }

    #[tokio::test]
    async fn flapping_fires_exactly_once_per_transition() -> Result {
        let registry = Registry::new(RegistryConfig::default());
        let (cb, log) = recording_callback();
        registry.set_changed_callback(Some(cb));

        for _ in 0..3 {
            let alive = Arc::new(AtomicBool::new(true));
            registry
                .attach(scripted_transport("SN2000", TransportKind::Usb, alive))
                .await?;
            registry.detach("SN2000").await;
            // A detach for an already-absent serial is a no-op.
            registry.detach("SN2000").await;
        }

        let log = locked(&log).clone();
        assert_eq!(log.len(), 6);
        for pair in log.chunks(2) {
            assert_eq!(pair[0], ("SN2000".to_string(), true));
            assert_eq!(pair[1], ("SN2000".to_string(), false));
        }
        Ok(())
    }

    #[tokio::test]
    async fn discovery_source_feeds_registry() -> Result {
        let registry = Registry::new(RegistryConfig::default());
        let source = registry.discovery_source();

        let alive = Arc::new(AtomicBool::new(true));
        source
            .attached(scripted_transport("SN3000", TransportKind::Usb, alive))
            .await;
        while !registry.contains("SN3000") {
            tokio::task::yield_now().await;
        }

        source.detached("SN3000").await;
        while registry.contains("SN3000") {
            tokio::task::yield_now().await;
        }
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn heartbeat_loss_disconnects_network_device() -> Result {
        let registry = Registry::new(RegistryConfig::default());
        let (cb, log) = recording_callback();
        registry.set_changed_callback(Some(cb));

        let alive = Arc::new(AtomicBool::new(true));
        registry
            .attach(scripted_transport(
                "SN4000",
                TransportKind::Network,
                alive.clone(),
            ))
            .await?;

        // Several healthy probe periods first.
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(registry.contains("SN4000"));

        alive.store(false, Ordering::Release);
        // Three missed probes at 3 s apart plus their 500 ms timeouts.
        tokio::time::sleep(Duration::from_secs(15)).await;
        assert!(!registry.contains("SN4000"));
        assert_eq!(
            locked(&log).last(),
            Some(&("SN4000".to_string(), false))
        );
        Ok(())
    }

    #[tokio::test]
    async fn usb_devices_get_no_heartbeat() -> Result {
        let registry = Registry::new(RegistryConfig::default());
        let alive = Arc::new(AtomicBool::new(false));
        // Never answers heartbeats, but USB links are not probed.
        registry
            .attach(scripted_transport("SN5000", TransportKind::Usb, alive))
            .await?;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(registry.contains("SN5000"));
        Ok(())
    }

    #[tokio::test]
    async fn scan_is_busy_while_running() -> Result {
        let registry = Registry::new(RegistryConfig::default());
        registry.start_network_scan()?;
        // The pass spawned above has not run yet on this runtime.
        assert!(matches!(registry.start_network_scan(), Err(Error::Busy)));

        // Let the (empty) pass finish; the flag clears.
        tokio::task::yield_now().await;
        registry.start_network_scan()?;
        Ok(())
    }

    #[tokio::test]
    async fn close_is_idempotent() -> Result {
        let registry = Registry::new(RegistryConfig::default());
        let (cb, log) = recording_callback();
        registry.set_changed_callback(Some(cb));

        let alive = Arc::new(AtomicBool::new(true));
        let device = registry
            .attach(scripted_transport("SN6000", TransportKind::Usb, alive))
            .await?;

        registry.close().await;
        registry.close().await;

        assert_eq!(registry.dev_count(), 0);
        assert!(!device.is_connected());
        assert_eq!(
            *locked(&log),
            vec![
                ("SN6000".to_string(), true),
                ("SN6000".to_string(), false)
            ]
        );
        assert!(matches!(
            registry.start_network_scan(),
            Err(Error::Disconnected)
        ));

        let alive = Arc::new(AtomicBool::new(true));
        assert!(registry
            .attach(scripted_transport("SN7000", TransportKind::Usb, alive))
            .await
            .is_err());
        Ok(())
    }

    #[tokio::test]
    async fn attach_racing_close_is_rejected() -> Result {
        let registry = Registry::new(RegistryConfig::default());
        let (cb, log) = recording_callback();
        registry.set_changed_callback(Some(cb));

        let (transport, mut remote) = MockTransport::pair();
        let attach = {
            let registry = registry.clone();
            tokio::spawn(async move { registry.attach(Arc::new(transport)).await })
        };

        // The identity answer only arrives after the registry has shut
        // down; the late device must not surface anywhere.
        let sent = remote.next_frame().await;
        registry.close().await;
        remote
            .inject_frame(&Frame::response(
                sent.opcode,
                sent.sequence,
                0,
                identity_payload(4, "SN8000", "studio"),
            ))
            .await;

        let result = attach.await.expect("attach task");
        assert!(matches!(result, Err(Error::Disconnected)));
        assert_eq!(registry.dev_count(), 0);
        assert!(locked(&log).is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn network_link_requires_network_product() {
        let registry = Registry::new(RegistryConfig::default());
        let (cb, log) = recording_callback();
        registry.set_changed_callback(Some(cb));

        // A Tiny (product 0) has no network control; a network link
        // claiming one is refused.
        let alive = Arc::new(AtomicBool::new(true));
        let result = registry
            .attach(scripted_product(0, "SN9000", TransportKind::Network, alive))
            .await;
        assert!(matches!(result, Err(Error::FeatureUnavailable)));
        assert_eq!(registry.dev_count(), 0);
        assert!(locked(&log).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn heartbeat_interval_setter_applies_next_probe() -> Result {
        let registry = Registry::new(RegistryConfig::default());

        let alive = Arc::new(AtomicBool::new(true));
        registry
            .attach(scripted_transport(
                "SNA000",
                TransportKind::Network,
                alive.clone(),
            ))
            .await?;
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(registry.contains("SNA000"));

        // Stretching the period slows miss accumulation from the next
        // probe on; under the default 3 s cadence the device would be
        // gone within about 11 s of going silent.
        registry.set_heartbeat_interval(Duration::from_secs(100));
        alive.store(false, Ordering::Release);
        tokio::time::sleep(Duration::from_secs(25)).await;
        assert!(registry.contains("SNA000"));

        // The loss limit still applies at the new cadence.
        tokio::time::sleep(Duration::from_secs(215)).await;
        assert!(!registry.contains("SNA000"));
        Ok(())
    }

    #[tokio::test]
    async fn bluetooth_white_list_gates_discovery() {
        let registry = Registry::new(RegistryConfig {
            bluetooth_white_list: vec!["AA:BB:CC:DD:EE:FF".to_string()],
            ..RegistryConfig::default()
        });
        let source = registry.discovery_source();

        assert!(source.bluetooth_allowed("AA:BB:CC:DD:EE:FF"));
        assert!(!source.bluetooth_allowed("11:22:33:44:55:66"));

        // An empty white list admits everything.
        registry.set_bluetooth_white_list(Vec::new());
        assert!(source.bluetooth_allowed("11:22:33:44:55:66"));
    }

    #[tokio::test]
    async fn setters_update_config_snapshot() {
        let registry = Registry::new(RegistryConfig::default());
        assert!(registry.config().enable_mdns_scan);
        assert!(registry.config().network_white_list.is_empty());

        registry.set_mdns_scan(false);
        registry.set_network_white_list(vec![IpAddr::from([10, 0, 0, 7])]);
        registry.set_heartbeat_loss_limit(5);

        let config = registry.config();
        assert!(!config.enable_mdns_scan);
        assert_eq!(config.network_white_list, vec![IpAddr::from([10, 0, 0, 7])]);
        assert_eq!(config.heartbeat_loss_limit, 5);
    }

    #[tokio::test]
    async fn global_registry_is_shared() {
        let a = Registry::global();
        let b = Registry::global();
        assert!(Arc::ptr_eq(&a.inner, &b.inner));
    }
}
