#![doc = include_str!("../README.md")]

#[macro_use]
extern crate bitflags;

#[macro_use]
extern crate num_derive;

#[macro_use]
extern crate tracing;

pub mod command;
mod error;
pub mod event;
pub mod frame;
pub mod product;
pub mod status;
mod util;

pub use crate::{
    command::Command,
    error::Error,
    event::{DeviceEvent, EventSeverity},
    frame::{Frame, FrameDecoder, FrameFlags, OpCode},
    product::{Dialect, ProductType, TransportKind},
    status::CameraStatus,
};

/// Result type.
pub type Result<T = ()> = std::result::Result<T, Error>;
