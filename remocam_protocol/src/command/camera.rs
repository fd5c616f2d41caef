//! Camera / image parameter and media capture commands.
use super::{Ack, Command};
use crate::frame::OpCode;
use binrw::binrw;
#[cfg(feature = "clap")]
use clap::ValueEnum;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Anti-flicker (power line frequency) setting.
#[binrw]
#[brw(big, repr = u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(ValueEnum))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PowerLineFreq {
    Off = 0,
    Freq50 = 1,
    Freq60 = 2,
    #[default]
    Auto = 3,
}

/// Media pipeline mode. Meet dialect only.
#[binrw]
#[brw(big, repr = u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(ValueEnum))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MediaMode {
    #[default]
    Normal = 0,
    VirtualBackground = 1,
    AutoFraming = 2,
}

/// Virtual background mode. Meet dialect only.
#[binrw]
#[brw(big, repr = u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum MediaBgMode {
    #[default]
    Disable = 0,
    Color = 1,
    Replace = 17,
    Blur = 18,
}

/// Device running state.
#[binrw]
#[brw(big, repr = u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(ValueEnum))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RunState {
    #[default]
    Run = 1,
    Sleep = 3,
    /// No stream is produced while in privacy mode.
    Privacy = 4,
}

/// Settable parameter range: bounds, step and default.
#[binrw]
#[brw(big)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParamRange {
    pub min: i32,
    pub max: i32,
    pub step: i32,
    pub default: i32,
}

/// Sets the absolute zoom level.
///
/// The wire value is a ratio `0..=100` over the device's zoom range; the
/// device façade converts from the normalized `1.0..=2.0` form.
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraSetZoomAbsolute {
    pub ratio: u16,
}

impl Command for CameraSetZoomAbsolute {
    const OPCODE: OpCode = OpCode(0x0301);
    type Response = Ack;
}

/// Requests the current zoom ratio.
#[binrw]
#[brw(big)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CameraZoomRequest;

impl Command for CameraZoomRequest {
    const OPCODE: OpCode = OpCode(0x0302);
    type Response = ZoomValue;
}

/// Current zoom ratio, `0..=100`.
#[binrw]
#[brw(big)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ZoomValue {
    pub ratio: u16,
}

/// Requests the absolute zoom parameter range.
#[binrw]
#[brw(big)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CameraZoomRangeRequest;

impl Command for CameraZoomRangeRequest {
    const OPCODE: OpCode = OpCode(0x0303);
    type Response = ParamRange;
}

/// Enables or disables face auto focus.
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraSetFaceFocus {
    #[br(map = |v: u8| v != 0)]
    #[bw(map = |v: &bool| u8::from(*v))]
    pub enabled: bool,
}

impl Command for CameraSetFaceFocus {
    const OPCODE: OpCode = OpCode(0x0304);
    type Response = Ack;
}

/// Enables or disables face auto exposure.
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraSetFaceAe {
    #[br(map = |v: u8| v != 0)]
    #[bw(map = |v: &bool| u8::from(*v))]
    pub enabled: bool,
}

impl Command for CameraSetFaceAe {
    const OPCODE: OpCode = OpCode(0x0305);
    type Response = Ack;
}

/// Enables or disables HDR.
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraSetHdr {
    #[br(map = |v: u8| v != 0)]
    #[bw(map = |v: &bool| u8::from(*v))]
    pub enabled: bool,
}

impl Command for CameraSetHdr {
    const OPCODE: OpCode = OpCode(0x0306);
    type Response = Ack;
}

/// Sets the anti-flicker frequency.
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraSetAntiFlicker {
    pub freq: PowerLineFreq,
}

impl Command for CameraSetAntiFlicker {
    const OPCODE: OpCode = OpCode(0x0307);
    type Response = Ack;
}

/// Selects the media pipeline mode. Meet dialect only.
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraSetMediaMode {
    pub mode: MediaMode,
}

impl Command for CameraSetMediaMode {
    const OPCODE: OpCode = OpCode(0x0308);
    type Response = Ack;
}

/// Selects the virtual background mode. Meet dialect only.
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraSetBgMode {
    pub mode: MediaBgMode,
    /// Blur level `0..=100`; only meaningful for [`MediaBgMode::Blur`].
    pub blur_level: u8,
}

impl Command for CameraSetBgMode {
    const OPCODE: OpCode = OpCode(0x0309);
    type Response = Ack;
}

/// Sets the auto sleep timeout in seconds; `0` disables auto sleep.
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraSetAutoSleepTime {
    pub seconds: i16,
}

impl Command for CameraSetAutoSleepTime {
    const OPCODE: OpCode = OpCode(0x030a);
    type Response = Ack;
}

/// Moves the device between run, sleep and privacy states.
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraSetRunState {
    pub state: RunState,
}

impl Command for CameraSetRunState {
    const OPCODE: OpCode = OpCode(0x030b);
    type Response = Ack;
}

/// Captures a photo to device storage. Tail Air dialect only.
#[binrw]
#[brw(big)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CameraTakePhoto;

impl Command for CameraTakePhoto {
    const OPCODE: OpCode = OpCode(0x030c);
    type Response = Ack;
}

/// Starts or stops recording to device storage. Tail Air dialect only.
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraSetRecord {
    #[br(map = |v: u8| v != 0)]
    #[bw(map = |v: &bool| u8::from(*v))]
    pub start: bool,
}

impl Command for CameraSetRecord {
    const OPCODE: OpCode = OpCode(0x030d);
    type Response = Ack;
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Result;

    #[test]
    fn zoom_wire_layout() -> Result {
        assert_eq!(
            CameraSetZoomAbsolute { ratio: 50 }.encode()?,
            vec![0x00, 0x32]
        );
        Ok(())
    }

    #[test]
    fn param_range_decodes() -> Result {
        let mut bytes = Vec::new();
        for v in [0i32, 100, 1, 0] {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        let range = CameraZoomRangeRequest::decode_response(&bytes)?;
        assert_eq!(range.max, 100);
        assert_eq!(range.step, 1);
        Ok(())
    }

    #[test]
    fn bg_mode_uses_vendor_discriminants() -> Result {
        let encoded = CameraSetBgMode {
            mode: MediaBgMode::Blur,
            blur_level: 40,
        }
        .encode()?;
        assert_eq!(encoded, vec![18, 40]);
        Ok(())
    }
}
