//! # Typed commands
//!
//! Every device operation is a request payload bound to an [OpCode] and a
//! typed response shape through the [Command] trait. Commands are grouped
//! into modules by functional area, and re-exported here.
//!
//! The wire payloads mirror the vendor's Remo protocol: fixed-layout
//! big-endian structs, with strings as NUL-terminated fields padded to a
//! fixed size. Devices with older firmware ignore trailing fields they do
//! not understand, so payloads only ever grow at the end.

mod ai;
mod camera;
mod file;
mod gimbal;
mod system;

use crate::{frame::OpCode, Result};
use binrw::{binrw, helpers::until_eof, BinRead, BinWrite};
use std::io::Cursor;

pub use self::{
    ai::{
        AiHandTrack, AiSetEnabled, AiSetGestureCtrl, AiSetTargetSelect, AiSetTrackingMode,
        AiSetWorkMode, AiStatus, AiStatusRequest, AiTrackSpeed, AiVerticalTrack, AiWorkMode,
        GestureKind,
    },
    camera::{
        CameraSetAntiFlicker, CameraSetAutoSleepTime, CameraSetBgMode, CameraSetFaceAe,
        CameraSetFaceFocus, CameraSetHdr, CameraSetMediaMode, CameraSetRecord, CameraSetRunState,
        CameraSetZoomAbsolute, CameraTakePhoto, CameraZoomRangeRequest, CameraZoomRequest,
        MediaBgMode, MediaMode, ParamRange, PowerLineFreq, RunState, ZoomValue,
    },
    file::{
        FileChunkData, FileChunkRequest, FileChunkSend, FileTransferFinish, FileTransferInfo,
        FileTransferStart, FileType, FILE_CHUNK_SIZE,
    },
    gimbal::{
        AddPreset, BootPositionRequest, DeletePreset, GimbalAttitude, GimbalAttitudeRequest,
        GimbalMotorAngle, GimbalResetHome, GimbalSpeedCtrl, GimbalSpeedPosition, GimbalStop,
        PresetPosition, ResetBootPosition, SetBootPosition, TriggerBootPosition, TriggerPreset,
    },
    system::{
        DeviceInfo, DeviceInfoRequest, HeartbeatRequest, Reboot, StatusRequest, SysType, WifiInfo,
        WifiInfoRequest,
    },
};

/// Binds a request payload to its opcode and typed response.
///
/// The request/response correlator works on raw frames; this trait is the
/// seam where the device façade gets its typing back.
pub trait Command: for<'a> BinWrite<Args<'a> = ()> {
    const OPCODE: OpCode;
    type Response: for<'a> BinRead<Args<'a> = ()>;

    /// Serializes the request payload.
    fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Cursor::new(Vec::new());
        self.write_be(&mut out)?;
        Ok(out.into_inner())
    }

    /// Decodes the payload of a matched response frame.
    fn decode_response(data: &[u8]) -> Result<Self::Response> {
        Ok(Self::Response::read_be(&mut Cursor::new(data))?)
    }
}

/// Empty response payload: the device acknowledged the command and has
/// nothing further to say.
#[binrw]
#[brw(big)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Ack;

/// Response payload handed through undecoded.
///
/// Used where the payload layout depends on the product dialect (status
/// snapshots), which is resolved by the caller via
/// [`CameraStatus::parse`][crate::status::CameraStatus::parse].
#[binrw]
#[brw(big)]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RawResponse(#[br(parse_with = until_eof)] pub Vec<u8>);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ack_is_empty() -> Result {
        let mut out = Cursor::new(Vec::new());
        Ack.write_be(&mut out)?;
        assert!(out.into_inner().is_empty());
        Ok(())
    }

    #[test]
    fn raw_response_consumes_everything() -> Result {
        let data = [1u8, 2, 3, 4, 5];
        let raw = RawResponse::read_be(&mut Cursor::new(&data))?;
        assert_eq!(raw.0, data);
        Ok(())
    }
}
