//! System commands: identity, status snapshots, Wi-Fi info, liveness.
use super::{Ack, Command, RawResponse};
use crate::frame::OpCode;
use binrw::{binrw, NullString};

/// Device system type.
#[binrw]
#[brw(big, repr = u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SysType {
    /// Old firmware which cannot report system info.
    #[default]
    Unknown = 0,
    /// Normal running system.
    Main = 1,
    /// Upgrade system; internal use only.
    Upgrade = 2,
}

/// Requests the device's identity block.
///
/// This is the first command issued after a transport opens; a device
/// which does not answer it is never announced to callers.
#[binrw]
#[brw(big)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfoRequest;

impl Command for DeviceInfoRequest {
    const OPCODE: OpCode = OpCode(0x0401);
    type Response = DeviceInfo;
}

/// Device identity block.
#[binrw]
#[brw(big)]
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DeviceInfo {
    /// Raw product type byte; resolve with
    /// [`ProductType::from_wire`][crate::product::ProductType::from_wire].
    pub product: u8,
    pub sys_type: SysType,
    /// 14-character serial number.
    #[brw(pad_size_to = 16)]
    pub sn: NullString,
    /// Device name, settable by the user.
    #[brw(pad_size_to = 32)]
    pub name: NullString,
    /// Model code, e.g. `"OWB-2004"`.
    #[brw(pad_size_to = 16)]
    pub model: NullString,
    /// Firmware version, e.g. `"1.2.3.4"`.
    #[brw(pad_size_to = 16)]
    pub version: NullString,
}

/// Requests the camera status snapshot.
///
/// The payload layout depends on the product dialect, so the response is
/// raw bytes; decode with
/// [`CameraStatus::parse`][crate::status::CameraStatus::parse].
#[binrw]
#[brw(big)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatusRequest;

impl Command for StatusRequest {
    const OPCODE: OpCode = OpCode(0x0402);
    type Response = RawResponse;
}

/// Liveness probe for network devices. No payload either way.
#[binrw]
#[brw(big)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatRequest;

impl Command for HeartbeatRequest {
    const OPCODE: OpCode = OpCode(0x0403);
    type Response = Ack;
}

/// Requests the device's Wi-Fi configuration.
#[binrw]
#[brw(big)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WifiInfoRequest;

impl Command for WifiInfoRequest {
    const OPCODE: OpCode = OpCode(0x0404);
    type Response = WifiInfo;
}

/// Wi-Fi configuration record.
///
/// Field meaning differs between AP and station mode, mirroring the
/// device firmware.
#[binrw]
#[brw(big)]
#[derive(Debug, Default, Clone, PartialEq)]
pub struct WifiInfo {
    /// AP: `0` auto, `1` 2.4 GHz, `2` 5 GHz. Station: unused.
    pub band_mode: i32,
    #[brw(pad_size_to = 16)]
    pub if_name: NullString,
    pub ipv4: u32,
    pub netmask: u32,
    /// AP: channel. Station: unused.
    pub channel: u32,
    #[brw(pad_size_to = 32)]
    pub ssid: NullString,
    /// AP only.
    #[brw(pad_size_to = 32)]
    pub password: NullString,
    /// Station only: `0..=100`, higher is better.
    pub signal_score: u8,
}

/// Reboots the device. The transport will drop shortly afterwards.
#[binrw]
#[brw(big)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Reboot;

impl Command for Reboot {
    const OPCODE: OpCode = OpCode(0x0405);
    type Response = Ack;
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Result;
    use binrw::BinWrite;
    use std::io::Cursor;

    #[test]
    fn device_info_round_trip() -> Result {
        let info = DeviceInfo {
            product: 4,
            sys_type: SysType::Main,
            sn: NullString::from("T2210512AB34CD"),
            name: NullString::from("Tail Air 4F2C"),
            model: NullString::from("OWB-2110"),
            version: NullString::from("2.1.0.77"),
        };
        let mut out = Cursor::new(Vec::new());
        info.write_be(&mut out)?;
        let bytes = out.into_inner();
        assert_eq!(bytes.len(), 2 + 16 + 32 + 16 + 16);

        let decoded = DeviceInfoRequest::decode_response(&bytes)?;
        assert_eq!(decoded, info);
        assert_eq!(decoded.sn.to_string().len(), 14);
        Ok(())
    }

    #[test]
    fn heartbeat_has_no_payload() -> Result {
        assert!(HeartbeatRequest.encode()?.is_empty());
        Ok(())
    }
}
