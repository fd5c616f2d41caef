#![doc = include_str!("../README.md")]

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate tracing;

mod channel;
mod device;
mod dispatch;
mod error;
mod registry;
mod transport;

pub use {
    crate::{
        channel::CommandChannel,
        device::{Device, DeviceIdentity},
        dispatch::{
            DevEventNotifyCallback, DevStatusCallback, EventNotice, FileDownloadCallback,
            FileUploadCallback,
        },
        error::Error,
        registry::{
            DevChangedCallback, DiscoveryEvent, DiscoverySource, Registry, RegistryConfig,
        },
        transport::{Transport, UdpTransport, UDP_CONTROL_PORT},
    },
    remocam_protocol as protocol,
};
pub type Result<T = ()> = std::result::Result<T, Error>;
