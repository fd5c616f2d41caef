//! Product identification and capability dialects.
use crate::{Error, Result};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Product model, as reported in the identity block.
#[derive(Debug, FromPrimitive, ToPrimitive, PartialEq, Eq, Clone, Copy, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ProductType {
    Tiny = 0,
    Tiny4k = 1,
    Tiny2 = 2,
    Tiny2Lite = 3,
    TailAir = 4,
    Meet = 5,
    Meet4k = 6,
    Me = 7,
    /// UVC to HDMI converter box.
    HdmiBox = 8,
}

/// Status-snapshot layout family shared by several products.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Dialect {
    Tiny,
    Meet,
    TailAir,
}

impl ProductType {
    /// Resolves a wire product byte, rejecting values this library does
    /// not know rather than misparsing their status payloads.
    pub fn from_wire(product: u8) -> Result<Self> {
        num_traits::FromPrimitive::from_u8(product).ok_or(Error::UnknownProduct(product))
    }

    pub const fn dialect(&self) -> Dialect {
        use ProductType::*;
        match self {
            Tiny | Tiny4k | Tiny2 | Tiny2Lite | Me | HdmiBox => Dialect::Tiny,
            Meet | Meet4k => Dialect::Meet,
            TailAir => Dialect::TailAir,
        }
    }

    /// Maximum normalized zoom factor. 4k-class sensors crop further.
    pub const fn max_zoom(&self) -> f32 {
        use ProductType::*;
        match self {
            Tiny4k | Meet4k | Tiny2 | Tiny2Lite | TailAir => 4.0,
            _ => 2.0,
        }
    }

    /// Whether the product exposes the control protocol over the network.
    /// A network link claiming any other product is refused.
    pub const fn is_network_capable(&self) -> bool {
        matches!(self, ProductType::TailAir)
    }
}

impl std::fmt::Display for ProductType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ProductType::Tiny => "Tiny",
            ProductType::Tiny4k => "Tiny 4K",
            ProductType::Tiny2 => "Tiny 2",
            ProductType::Tiny2Lite => "Tiny 2 Lite",
            ProductType::TailAir => "Tail Air",
            ProductType::Meet => "Meet",
            ProductType::Meet4k => "Meet 4K",
            ProductType::Me => "Me",
            ProductType::HdmiBox => "HDMI Box",
        };
        f.write_str(name)
    }
}

/// How a device is attached to the host.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TransportKind {
    Usb,
    Network,
    Bluetooth,
}
