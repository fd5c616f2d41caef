use clap::Parser;
use remocam::{Registry, Result, UdpTransport};
use std::{net::SocketAddrV4, sync::Arc, time::Duration};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

/// Camera status and event watcher.
#[derive(Debug, Parser)]
#[clap(verbatim_doc_comment)]
struct CliParser {
    /// IP address of the camera.
    #[clap(short, long)]
    pub ip: String,

    /// Seconds between forced status refreshes.
    #[clap(short, long, default_value = "2")]
    pub period: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .compact()
        .init();
    let opts = CliParser::parse();

    let registry = Registry::global();
    registry.set_changed_callback(Some(Arc::new(|sn, connected| {
        info!(
            "{sn} {}",
            if connected { "connected" } else { "disconnected" }
        );
    })));

    let addr = SocketAddrV4::new(opts.ip.parse().unwrap(), remocam::UDP_CONTROL_PORT);
    let transport = UdpTransport::connect(addr).await?;
    let device = registry.attach(Arc::new(transport)).await?;
    info!(
        "Connected {} ({}), SN {}, FW v{}",
        device.name(),
        device.product(),
        device.sn(),
        device.version()
    );

    device.set_status_callback(Some(Arc::new(|status| {
        info!(
            "status: zoom ratio {}, run state {:?}, AI mode {:?}",
            status.zoom_ratio(),
            status.run_state(),
            status.ai_mode()
        );
    })));
    device.set_event_callback(Some(Arc::new(|notice| {
        info!(
            "[{:?}] event {}: {:?} {:02x?}",
            notice.severity, notice.raw, notice.event, notice.data
        );
    })));
    device.enable_status_events(true);

    let mut ticker = tokio::time::interval(Duration::from_secs(opts.period));
    loop {
        ticker.tick().await;
        device.refresh_status().await?;
    }
}
