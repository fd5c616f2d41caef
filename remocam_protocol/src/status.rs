//! Camera status snapshots.
//!
//! The status payload layout depends on the product's dialect, and the
//! frame itself does not say which; callers resolve the layout from the
//! identity block ([`ProductType::dialect`]) and decode with
//! [`CameraStatus::parse`].
//!
//! Devices with old firmware send shorter payloads. Structs here only
//! cover the leading fields every supported firmware provides; trailing
//! reserved bytes are ignored on read.
use crate::{
    command::{AiWorkMode, PowerLineFreq, RunState},
    product::{Dialect, ProductType},
    Error, Result,
};
use binrw::{binrw, BinRead, BinWrite};
use modular_bitfield::{
    bitfield,
    specifiers::{B12, B2, B4, B6, B7},
};
use std::io::Cursor;

/// Audio options byte in the Tiny dialect snapshot.
#[bitfield(bits = 8)]
#[repr(u8)]
#[derive(BinRead, BinWrite, Debug, Default, PartialEq, Eq, Clone, Copy)]
#[br(map = From::<u8>::from)]
#[bw(map = |&x| Into::<u8>::into(x))]
pub struct AudioOptions {
    /// Audio reception distance: 0 near, 1 standard, 2 far.
    pub distance: B4,
    pub uac_enabled: bool,
    #[skip]
    __: modular_bitfield::specifiers::B3,
}

/// Status snapshot for Tiny-series, Me and HDMI Box devices.
#[binrw]
#[brw(big)]
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct TinyStatus {
    /// Non-zero when an AI target is selected.
    pub ai_target: u8,
    #[brw(pad_before = 2)]
    pub anti_flicker: PowerLineFreq,
    /// Zoom ratio, `0..=100`.
    pub zoom_ratio: u16,
    #[br(map = |v: u8| v != 0)]
    #[bw(map = |v: &bool| u8::from(*v))]
    pub hdr: bool,
    #[br(map = |v: u8| v != 0)]
    #[bw(map = |v: &bool| u8::from(*v))]
    pub face_ae: bool,
    #[br(map = |v: u8| v != 0)]
    #[bw(map = |v: &bool| u8::from(*v))]
    pub noise_cancellation: bool,
    /// Raw running state; resolve with [`CameraStatus::run_state`].
    pub dev_status: u8,
    /// Auto sleep timeout in seconds, `0` disabled.
    pub auto_sleep_time: i16,
    #[br(map = |v: u8| v != 0)]
    #[bw(map = |v: &bool| u8::from(*v))]
    pub portrait: bool,
    #[br(map = |v: u8| v != 0)]
    #[bw(map = |v: &bool| u8::from(*v))]
    pub face_auto_focus: bool,
    #[br(map = |v: u8| v != 0)]
    #[bw(map = |v: &bool| u8::from(*v))]
    pub auto_focus: bool,
    /// Manual focus value, `0..=100`.
    pub manual_focus_value: u8,
    #[br(map = |v: u8| v != 0)]
    #[bw(map = |v: &bool| u8::from(*v))]
    pub sleep_micro: bool,
    pub fov: u8,
    #[brw(pad_before = 1)]
    #[br(map = |v: u8| v != 0)]
    #[bw(map = |v: &bool| u8::from(*v))]
    pub image_flip_hor: bool,
    /// Voice control language: 0 Chinese, 1 English.
    pub voice_ctrl_language: u8,
    /// Voice control switches, one bit per spoken command.
    pub voice_ctrl: u8,
    /// Zoom ratio applied by the voice zoom command, `0..=100`.
    pub voice_ctrl_zoom: u16,
    /// Raw AI work mode; resolve with [`CameraStatus::ai_mode`].
    pub ai_mode: u8,
    #[br(map = |v: u8| v != 0)]
    #[bw(map = |v: &bool| u8::from(*v))]
    pub audio_auto_gain: bool,
    /// Sleep background: bits 0-3 image slots, bits 4-7 video slots.
    pub sleep_bg_type: u8,
    pub bg_img_idx: u8,
    pub ai_sub_mode: u8,
    #[br(map = |v: u8| v != 0)]
    #[bw(map = |v: &bool| u8::from(*v))]
    pub bg_img_mirror: bool,
    #[br(map = |v: u8| v != 0)]
    #[bw(map = |v: &bool| u8::from(*v))]
    pub hdr_support: bool,
    pub fps: u8,
    /// Bits 0-4 AI sub-mode, bits 5-8 AI mode.
    pub boot_mode: u8,
    /// 0 off, 1-3 brightness level.
    pub led_brightness_level: u8,
    pub audio_opt: AudioOptions,
}

/// Status snapshot for Meet-series devices.
#[binrw]
#[brw(big)]
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct MeetStatus {
    /// Raw media pipeline mode, see
    /// [`MediaMode`][crate::command::MediaMode].
    pub media_mode: u8,
    #[br(map = |v: u8| v != 0)]
    #[bw(map = |v: &bool| u8::from(*v))]
    pub hdr: bool,
    /// Raw running state; resolve with [`CameraStatus::run_state`].
    pub dev_status: u8,
    #[br(map = |v: u8| v != 0)]
    #[bw(map = |v: &bool| u8::from(*v))]
    pub face_ae: bool,
    pub fov: u8,
    /// Raw virtual background mode, see
    /// [`MediaBgMode`][crate::command::MediaBgMode].
    pub bg_mode: u8,
    /// Background blur level, `0..=100`.
    pub blur_level: u8,
    pub anti_flicker: PowerLineFreq,
    /// Zoom ratio, `0..=100`.
    pub zoom_ratio: u16,
    /// 0 normal mode, 1 rotation mode.
    pub key_mode: u8,
    #[brw(pad_before = 3)]
    #[br(map = |v: u8| v != 0)]
    #[bw(map = |v: &bool| u8::from(*v))]
    pub noise_cancellation: bool,
    #[br(map = |v: u8| v != 0)]
    #[bw(map = |v: &bool| u8::from(*v))]
    pub portrait: bool,
    pub group_single: u8,
    pub close_upper: u8,
    /// Auto sleep timeout in seconds, `0` disabled.
    pub auto_sleep_time: i16,
    /// Active background image slot in replacement mode.
    pub img_idx: u8,
    #[brw(pad_before = 1)]
    pub bg_color: u8,
    #[br(map = |v: u8| v != 0)]
    #[bw(map = |v: &bool| u8::from(*v))]
    pub face_auto_focus: bool,
    #[br(map = |v: u8| v != 0)]
    #[bw(map = |v: &bool| u8::from(*v))]
    pub auto_focus: bool,
    /// Manual focus value, `0..=100`.
    pub manual_focus_value: u8,
    #[br(map = |v: u8| v != 0)]
    #[bw(map = |v: &bool| u8::from(*v))]
    pub mask_disable: bool,
    #[br(map = |v: u8| v != 0)]
    #[bw(map = |v: &bool| u8::from(*v))]
    pub sleep_micro: bool,
    #[br(map = |v: u8| v != 0)]
    #[bw(map = |v: &bool| u8::from(*v))]
    pub image_flip_hor: bool,
}

/// Boot-time media settings in the Tail Air snapshot.
#[bitfield(bits = 8)]
#[repr(u8)]
#[derive(BinRead, BinWrite, Debug, Default, PartialEq, Eq, Clone, Copy)]
#[br(map = From::<u8>::from)]
#[bw(map = |&x| Into::<u8>::into(x))]
pub struct BootMediaSetting {
    pub start_record: bool,
    pub ndi_boot_enable: bool,
    #[skip]
    __: B6,
}

/// Image and focus flags in the Tail Air snapshot.
#[bitfield(bits = 32)]
#[repr(u32)]
#[derive(BinRead, BinWrite, Debug, Default, PartialEq, Eq, Clone, Copy)]
#[br(map = From::<u32>::from)]
#[bw(map = |&x| Into::<u32>::into(x))]
pub struct MediaFlags {
    pub hdr: bool,
    pub mirror: bool,
    pub flip: bool,
    pub portrait: bool,
    /// See [`PowerLineFreq`][crate::command::PowerLineFreq].
    pub anti_flick: B2,
    pub face_ae: bool,
    pub face_af: bool,
    pub ae_lock: bool,
    pub exp_fix_rate: bool,
    /// 1 AFC, 2 AFS, 3 MF.
    pub af_mode: B2,
    #[skip]
    __: B4,
    /// 0 last success, 1 last failed, 2 focusing, 3 cancelled.
    pub af_status: u16,
}

/// Capture and connection state in the Tail Air snapshot.
#[bitfield(bits = 8)]
#[repr(u8)]
#[derive(BinRead, BinWrite, Debug, Default, PartialEq, Eq, Clone, Copy)]
#[br(map = From::<u8>::from)]
#[bw(map = |&x| Into::<u8>::into(x))]
pub struct MediaRunning {
    pub media_switching: bool,
    pub hdmi_plugin: bool,
    pub hdmi_osd_enable: bool,
    /// 0 idle, 1 starting, 2 running, 3 stopping.
    pub capture_status: B2,
    /// 0 idle, 1 starting, 2 running, 3 stopping.
    pub record_status: B2,
    pub has_exception: bool,
}

/// Digital zoom state in the Tail Air snapshot.
#[bitfield(bits = 16)]
#[repr(u16)]
#[derive(BinRead, BinWrite, Debug, Default, PartialEq, Eq, Clone, Copy)]
#[br(map = From::<u16>::from)]
#[bw(map = |&x| Into::<u16>::into(x))]
pub struct DigiZoom {
    pub ratio: B12,
    pub speed: B4,
}

/// Battery state in the Tail Air snapshot.
#[bitfield(bits = 8)]
#[repr(u8)]
#[derive(BinRead, BinWrite, Debug, Default, PartialEq, Eq, Clone, Copy)]
#[br(map = From::<u8>::from)]
#[bw(map = |&x| Into::<u8>::into(x))]
pub struct BatteryState {
    /// Capacity percentage, `0..=100`.
    pub capacity: B7,
    pub charging: bool,
}

/// Internal module connectivity in the Tail Air snapshot.
#[bitfield(bits = 16)]
#[repr(u16)]
#[derive(BinRead, BinWrite, Debug, Default, PartialEq, Eq, Clone, Copy)]
#[br(map = From::<u16>::from)]
#[bw(map = |&x| Into::<u16>::into(x))]
pub struct ModulesOnline {
    pub ai: bool,
    pub gimbal: bool,
    pub battery: bool,
    pub lens: bool,
    pub tof: bool,
    pub bluetooth: bool,
    pub usb_wifi: bool,
    pub poe_attached: bool,
    #[skip]
    __: modular_bitfield::specifiers::B8,
}

/// Status snapshot for the Tail Air.
#[binrw]
#[brw(big)]
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct TailAirStatus {
    /// Length of the snapshot as the firmware sees it.
    pub length: u8,
    /// 0 normal mode, 1 playback mode.
    pub work_mode: u8,
    /// Current countdown in a timelapse.
    pub delay_runtime: u8,
    /// Configured timelapse time.
    pub delay_setting: u8,
    pub boot_media_setting: BootMediaSetting,
    pub media_flags: MediaFlags,
    pub media_running: MediaRunning,
    pub digi_zoom: DigiZoom,
    pub hdmi_res_runtime: u8,
    pub sd_card_speed: u8,
    /// Video size: 0 1280x720, 1 1920x1080, 2 2704x1520, 3 3840x2160.
    pub hdmi_size: u8,
    pub recording_size: u8,
    pub ndi_rtsp_size: u8,
    pub rtmp_size: u8,
    pub sensor_fps: u8,
    pub mf_code: u8,
    #[brw(pad_before = 1)]
    pub sd_status: u8,
    pub brightness: u8,
    pub contrast: u8,
    pub hue: u8,
    pub saturation: u8,
    pub sharpness: u8,
    /// 0 standard, 1 text, 2 landscape, 3 portrait, 4 nightscape, 5 film.
    pub style: u8,
    /// 0 idle, 1 UVC+UAC, 2 UVC+RNDIS, 3 RNDIS, 4 MTP, 5 MSC, 6 host.
    pub usb_status: u8,
    pub battery: BatteryState,
    pub modules: ModulesOnline,
}

/// A decoded status snapshot, tagged by dialect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraStatus {
    Tiny(TinyStatus),
    Meet(MeetStatus),
    TailAir(TailAirStatus),
}

impl CameraStatus {
    /// Decodes a raw status payload using the product's dialect.
    ///
    /// Payloads from devices with very old firmware can be shorter than
    /// the layout; those fail with [`Error::StatusTruncated`]. Trailing
    /// bytes beyond the known layout are ignored.
    pub fn parse(product: ProductType, payload: &[u8]) -> Result<CameraStatus> {
        let mut cur = Cursor::new(payload);
        let parsed = match product.dialect() {
            Dialect::Tiny => TinyStatus::read(&mut cur).map(CameraStatus::Tiny),
            Dialect::Meet => MeetStatus::read(&mut cur).map(CameraStatus::Meet),
            Dialect::TailAir => TailAirStatus::read(&mut cur).map(CameraStatus::TailAir),
        };
        parsed.map_err(|e| {
            // binrw wraps field-level I/O failures in a backtrace, so
            // classify on the root cause.
            let mut root = &e;
            while let binrw::Error::Backtrace(bt) = root {
                root = bt.error.as_ref();
            }
            if matches!(root, binrw::Error::Io(_)) {
                Error::StatusTruncated
            } else {
                e.into()
            }
        })
    }

    /// Zoom ratio over the device's zoom range, `0..=100` where known.
    pub fn zoom_ratio(&self) -> u16 {
        match self {
            CameraStatus::Tiny(s) => s.zoom_ratio,
            CameraStatus::Meet(s) => s.zoom_ratio,
            CameraStatus::TailAir(s) => s.digi_zoom.ratio(),
        }
    }

    /// Run / sleep / privacy state, where the snapshot carries one.
    pub fn run_state(&self) -> Option<RunState> {
        let raw = match self {
            CameraStatus::Tiny(s) => s.dev_status,
            CameraStatus::Meet(s) => s.dev_status,
            CameraStatus::TailAir(_) => return None,
        };
        RunState::read_be(&mut Cursor::new([raw])).ok()
    }

    /// AI work mode; `None` for dialects which report it elsewhere.
    pub fn ai_mode(&self) -> Option<AiWorkMode> {
        match self {
            CameraStatus::Tiny(s) => AiWorkMode::read_be(&mut Cursor::new([s.ai_mode])).ok(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn tiny_bytes(status: &TinyStatus) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        status.write_be(&mut out).unwrap();
        out.into_inner()
    }

    #[test]
    fn tiny_snapshot_round_trip() -> Result {
        let status = TinyStatus {
            ai_target: 1,
            anti_flicker: PowerLineFreq::Freq50,
            zoom_ratio: 42,
            hdr: true,
            dev_status: 1,
            auto_sleep_time: 300,
            ai_mode: 2,
            fps: 30,
            ..Default::default()
        };
        let bytes = tiny_bytes(&status);
        let parsed = CameraStatus::parse(ProductType::Tiny2, &bytes)?;
        assert_eq!(parsed, CameraStatus::Tiny(status));
        assert_eq!(parsed.zoom_ratio(), 42);
        assert_eq!(parsed.run_state(), Some(RunState::Run));
        assert_eq!(parsed.ai_mode(), Some(AiWorkMode::Human));
        Ok(())
    }

    #[test]
    fn trailing_reserved_bytes_ignored() -> Result {
        let mut bytes = tiny_bytes(&TinyStatus {
            zoom_ratio: 10,
            ..Default::default()
        });
        bytes.extend_from_slice(&[0u8; 26]);
        let parsed = CameraStatus::parse(ProductType::Tiny, &bytes)?;
        assert_eq!(parsed.zoom_ratio(), 10);
        Ok(())
    }

    #[test]
    fn truncated_snapshot_rejected() {
        let bytes = tiny_bytes(&TinyStatus::default());
        assert!(matches!(
            CameraStatus::parse(ProductType::Tiny, &bytes[..8]),
            Err(Error::StatusTruncated)
        ));
    }

    #[test]
    fn meet_snapshot_decodes() -> Result {
        let status = MeetStatus {
            media_mode: 1,
            dev_status: 3,
            bg_mode: 18,
            blur_level: 55,
            zoom_ratio: 80,
            ..Default::default()
        };
        let mut out = Cursor::new(Vec::new());
        status.write_be(&mut out)?;
        let parsed = CameraStatus::parse(ProductType::Meet4k, &out.into_inner())?;
        assert_eq!(parsed.zoom_ratio(), 80);
        assert_eq!(parsed.run_state(), Some(RunState::Sleep));
        assert_eq!(parsed.ai_mode(), None);
        Ok(())
    }

    #[test]
    fn tail_air_bitfields() -> Result {
        let status = TailAirStatus {
            digi_zoom: DigiZoom::new().with_ratio(250).with_speed(3),
            battery: BatteryState::new().with_capacity(76).with_charging(true),
            modules: ModulesOnline::new().with_gimbal(true).with_battery(true),
            ..Default::default()
        };
        let mut out = Cursor::new(Vec::new());
        status.write_be(&mut out)?;
        let parsed = CameraStatus::parse(ProductType::TailAir, &out.into_inner())?;
        let CameraStatus::TailAir(s) = parsed else {
            panic!("wrong dialect");
        };
        assert_eq!(s.digi_zoom.ratio(), 250);
        assert_eq!(s.battery.capacity(), 76);
        assert!(s.battery.charging());
        assert!(s.modules.gimbal());
        assert!(!s.modules.tof());
        assert_eq!(parsed.run_state(), None);
        Ok(())
    }
}
