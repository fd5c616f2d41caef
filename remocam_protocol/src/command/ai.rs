//! AI tracking commands.
use super::{Ack, Command};
use crate::frame::OpCode;
use binrw::binrw;
#[cfg(feature = "clap")]
use clap::ValueEnum;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// AI smart tracking work mode.
#[binrw]
#[brw(big, repr = u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(ValueEnum))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AiWorkMode {
    /// Normal mode, AI smart tracking off.
    #[default]
    None = 0,
    /// Multi-person tracking.
    Group = 1,
    /// Single-person tracking.
    Human = 2,
    /// Hand tracking.
    Hand = 3,
    Whiteboard = 4,
    Desk = 5,
    /// Mode switching is in progress; read-only.
    Switching = 6,
}

/// Vertical framing behaviour while tracking.
#[binrw]
#[brw(big, repr = u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(ValueEnum))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AiVerticalTrack {
    #[default]
    Standard = 0,
    Headroom = 1,
    Motion = 2,
}

/// Gimbal follow speed while tracking.
#[binrw]
#[brw(big, repr = u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(ValueEnum))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AiTrackSpeed {
    Lazy = 0,
    Slow = 1,
    #[default]
    Standard = 2,
    Fast = 3,
    Crazy = 4,
    Auto = 5,
}

/// Which hand to follow in hand tracking mode.
#[binrw]
#[brw(big, repr = u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum AiHandTrack {
    #[default]
    Right = 0,
    Left = 1,
}

/// Gesture functions which can be toggled individually.
#[binrw]
#[brw(big, repr = u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    TargetSelect = 0,
    Zoom = 1,
    DynamicZoom = 2,
    DynamicZoomDirection = 3,
    Record = 4,
}

/// Turns the AI function on or off.
///
/// Manual gimbal control ([`GimbalSpeedCtrl`][super::GimbalSpeedCtrl])
/// requires AI off; re-enable afterwards.
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiSetEnabled {
    #[br(map = |v: u8| v != 0)]
    #[bw(map = |v: &bool| u8::from(*v))]
    pub enabled: bool,
}

impl Command for AiSetEnabled {
    const OPCODE: OpCode = OpCode(0x0201);
    type Response = Ack;
}

/// Selects the AI work mode.
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiSetWorkMode {
    pub mode: AiWorkMode,
}

impl Command for AiSetWorkMode {
    const OPCODE: OpCode = OpCode(0x0202);
    type Response = Ack;
}

/// Selects the vertical tracking mode.
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiSetTrackingMode {
    pub mode: AiVerticalTrack,
}

impl Command for AiSetTrackingMode {
    const OPCODE: OpCode = OpCode(0x0203);
    type Response = Ack;
}

/// Selects or deselects a tracking target.
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiSetTargetSelect {
    #[br(map = |v: u8| v != 0)]
    #[bw(map = |v: &bool| u8::from(*v))]
    pub select: bool,
}

impl Command for AiSetTargetSelect {
    const OPCODE: OpCode = OpCode(0x0204);
    type Response = Ack;
}

/// Toggles one gesture function.
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiSetGestureCtrl {
    pub gesture: GestureKind,
    #[br(map = |v: u8| v != 0)]
    #[bw(map = |v: &bool| u8::from(*v))]
    pub enabled: bool,
}

impl Command for AiSetGestureCtrl {
    const OPCODE: OpCode = OpCode(0x0205);
    type Response = Ack;
}

/// Requests the current AI state.
#[binrw]
#[brw(big)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AiStatusRequest;

impl Command for AiStatusRequest {
    const OPCODE: OpCode = OpCode(0x0206);
    type Response = AiStatus;
}

/// Full AI state snapshot.
#[binrw]
#[brw(big)]
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct AiStatus {
    #[br(map = |v: u8| v != 0)]
    #[bw(map = |v: &bool| u8::from(*v))]
    pub gesture_target: bool,
    #[br(map = |v: u8| v != 0)]
    #[bw(map = |v: &bool| u8::from(*v))]
    pub gesture_zoom: bool,
    #[br(map = |v: u8| v != 0)]
    #[bw(map = |v: &bool| u8::from(*v))]
    pub gesture_dynamic_zoom: bool,
    #[br(map = |v: u8| v != 0)]
    #[bw(map = |v: &bool| u8::from(*v))]
    pub gesture_record: bool,
    #[br(map = |v: u8| v != 0)]
    #[bw(map = |v: &bool| u8::from(*v))]
    pub gesture_mirror: bool,
    /// Zoom factor applied by the zoom gesture, `1.0..=2.0`
    /// (`1.0..=4.0` on 4k-class devices).
    pub gesture_zoom_factor: f32,
    /// Gimbal yaw direction mirror: `-1` reversed, `1` normal.
    pub yaw_reverse: i8,
    pub v_track_landscape: AiVerticalTrack,
    pub v_track_portrait: AiVerticalTrack,
    pub work_mode: AiWorkMode,
    pub hand_track: AiHandTrack,
    /// `0` standard, `1` region tracking.
    pub zone_track: u8,
    pub speed_mode: AiTrackSpeed,
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Result;

    #[test]
    fn ai_status_round_trip() -> Result {
        let status = AiStatus {
            gesture_target: true,
            gesture_zoom_factor: 2.0,
            yaw_reverse: -1,
            v_track_portrait: AiVerticalTrack::Headroom,
            work_mode: AiWorkMode::Human,
            speed_mode: AiTrackSpeed::Fast,
            ..Default::default()
        };
        let mut out = std::io::Cursor::new(Vec::new());
        binrw::BinWrite::write_be(&status, &mut out)?;
        let bytes = out.into_inner();
        assert_eq!(bytes.len(), 16);

        let decoded = AiStatusRequest::decode_response(&bytes)?;
        assert_eq!(decoded, status);
        Ok(())
    }

    #[test]
    fn bool_maps_to_single_byte() -> Result {
        assert_eq!(AiSetEnabled { enabled: true }.encode()?, vec![1]);
        assert_eq!(AiSetEnabled { enabled: false }.encode()?, vec![0]);
        Ok(())
    }
}
