//! Gimbal motion and preset position commands.
//!
//! Angles are degrees; speeds are degrees per second. Valid ranges follow
//! the device firmware: pitch -90..=90, pan/yaw -180..=180. Out-of-range
//! values are clamped by the firmware, not rejected.
use super::{Ack, Command};
use crate::frame::OpCode;
use binrw::{binrw, NullString};

/// Sets the rotation speed of the gimbal. All-zero speeds stop it.
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GimbalSpeedCtrl {
    pub pitch: f32,
    pub pan: f32,
    pub roll: f32,
}

impl Command for GimbalSpeedCtrl {
    const OPCODE: OpCode = OpCode(0x0101);
    type Response = Ack;
}

/// Stops all gimbal motion immediately.
#[binrw]
#[brw(big)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GimbalStop;

impl Command for GimbalStop {
    const OPCODE: OpCode = OpCode(0x0102);
    type Response = Ack;
}

/// Moves the gimbal to an absolute motor angle.
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GimbalMotorAngle {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Command for GimbalMotorAngle {
    const OPCODE: OpCode = OpCode(0x0103);
    type Response = Ack;
}

/// Requests the current gimbal attitude.
#[binrw]
#[brw(big)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GimbalAttitudeRequest;

impl Command for GimbalAttitudeRequest {
    const OPCODE: OpCode = OpCode(0x0104);
    type Response = GimbalAttitude;
}

/// Gimbal attitude: euler and motor angles plus angular velocities.
#[binrw]
#[brw(big)]
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct GimbalAttitude {
    pub roll_euler: f32,
    pub pitch_euler: f32,
    pub yaw_euler: f32,
    pub roll_motor: f32,
    pub pitch_motor: f32,
    pub yaw_motor: f32,
    pub roll_velocity: f32,
    pub pitch_velocity: f32,
    pub yaw_velocity: f32,
}

/// Resets the gimbal to its zero position.
///
/// If AI tracking is enabled the gimbal is controlled by AI; disable
/// tracking first ([`AiSetTargetSelect`][super::AiSetTargetSelect] or
/// [`AiSetWorkMode`][super::AiSetWorkMode]).
#[binrw]
#[brw(big)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GimbalResetHome;

impl Command for GimbalResetHome {
    const OPCODE: OpCode = OpCode(0x0105);
    type Response = Ack;
}

/// Moves the gimbal to a target position at the given reference speeds.
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GimbalSpeedPosition {
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub speed_roll: f32,
    pub speed_pitch: f32,
    pub speed_yaw: f32,
}

impl Command for GimbalSpeedPosition {
    const OPCODE: OpCode = OpCode(0x0106);
    type Response = Ack;
}

/// A stored gimbal position with zoom, sent and received atomically.
///
/// The `roi_*` fields are only meaningful for the Tail Air dialect; other
/// products carry zeroes.
#[binrw]
#[brw(big)]
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PresetPosition {
    pub id: i32,
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
    /// Normalized zoom, `1.0..=2.0` (or `1.0..=4.0` on 4k-class devices).
    pub zoom: f32,
    #[brw(pad_size_to = 64)]
    pub name: NullString,
    pub roi_cx: f32,
    pub roi_cy: f32,
    pub roi_alpha: f32,
}

/// Sets the boot initial position and zoom ratio.
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, PartialEq)]
pub struct SetBootPosition(pub PresetPosition);

impl Command for SetBootPosition {
    const OPCODE: OpCode = OpCode(0x0110);
    type Response = Ack;
}

/// Requests the boot initial position.
#[binrw]
#[brw(big)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BootPositionRequest;

impl Command for BootPositionRequest {
    const OPCODE: OpCode = OpCode(0x0111);
    type Response = PresetPosition;
}

/// Moves the gimbal to the boot initial position.
#[binrw]
#[brw(big)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TriggerBootPosition {
    /// Must be `1` in zone tracking mode, `0` otherwise.
    pub reset_mode: u8,
}

impl Command for TriggerBootPosition {
    const OPCODE: OpCode = OpCode(0x0112);
    type Response = Ack;
}

/// Restores the boot initial position to its factory default.
#[binrw]
#[brw(big)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResetBootPosition;

impl Command for ResetBootPosition {
    const OPCODE: OpCode = OpCode(0x0113);
    type Response = Ack;
}

/// Stores (or updates) a preset position slot.
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, PartialEq)]
pub struct AddPreset(pub PresetPosition);

impl Command for AddPreset {
    const OPCODE: OpCode = OpCode(0x0120);
    type Response = Ack;
}

/// Deletes a preset position slot.
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletePreset {
    pub id: i32,
}

impl Command for DeletePreset {
    const OPCODE: OpCode = OpCode(0x0121);
    type Response = Ack;
}

/// Moves the gimbal to a stored preset position.
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerPreset {
    pub id: i32,
}

impl Command for TriggerPreset {
    const OPCODE: OpCode = OpCode(0x0122);
    type Response = Ack;
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Result;

    #[test]
    fn preset_name_padded() -> Result {
        let preset = PresetPosition {
            id: 2,
            zoom: 1.5,
            name: NullString::from("desk"),
            ..Default::default()
        };
        let encoded = AddPreset(preset).encode()?;
        // 5 * f32 + i32 + 64-byte name + 3 * f32
        assert_eq!(encoded.len(), 4 * 5 + 64 + 4 * 3);
        assert_eq!(&encoded[20..24], b"desk");
        assert_eq!(encoded[24], 0);
        Ok(())
    }

    #[test]
    fn speed_ctrl_layout() -> Result {
        let encoded = GimbalSpeedCtrl {
            pitch: 1.0,
            pan: -1.0,
            roll: 0.0,
        }
        .encode()?;
        assert_eq!(encoded.len(), 12);
        assert_eq!(&encoded[..4], &1.0f32.to_be_bytes());
        Ok(())
    }
}
