//! Unsolicited device event notifications.
//!
//! Devices push these without a matching request. Numeric identifiers are
//! banded by severity: errors from 0, warnings from 1000, informational
//! events from 2000 and transient tips from 3000.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Event notification identifier.
#[derive(Debug, FromPrimitive, ToPrimitive, PartialEq, Eq, Clone, Copy, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DeviceEvent {
    ErrGimbalComm = 0,
    ErrAiComm = 1,
    ErrBatComm = 2,
    ErrLensComm = 3,
    ErrSensor = 4,
    ErrMedia = 5,
    ErrTof = 6,
    ErrBluetooth = 7,
    ErrDevTempHigh = 8,
    /// Battery capacity below 3%.
    ErrBatLowCapacity = 9,
    ErrSdFormatting = 10,
    ErrSdFileSystem = 11,
    ErrSdMount = 12,
    ErrSdNotSupport = 13,
    ErrSdInitializing = 14,
    ErrSdWriteProtect = 15,

    WarnSdWriteSlow = 1000,
    WarnFileFixFailed = 1001,
    WarnSdLowSpeed = 1002,
    WarnSdCardNotExist = 1003,
    WarnSdCardFull = 1004,
    /// Battery capacity below 10%.
    WarnBatLowCapacity10 = 1005,
    /// Battery capacity below 5%.
    WarnBatLowCapacity5 = 1006,
    WarnStreamConn = 1007,
    WarnNetException = 1008,
    WarnStreamAppExit = 1009,
    WarnSdCardFormatFail = 1010,

    InfoMicPlugin = 2000,
    InfoMicUnplug = 2001,
    InfoSwivelConn = 2002,
    InfoRemoteConn = 2003,
    InfoMonitorConn = 2004,
    InfoTargetLoss = 2005,
    /// A new video or photo file was written to device storage.
    InfoNewMediaFile = 2006,
    InfoApStatus = 2007,
    InfoSdCardFormatSuccess = 2008,
    InfoBatCharging = 2009,
    InfoSdReady = 2010,
    InfoDevTemp = 2011,
    InfoGimbalComm = 2012,
    InfoAiComm = 2013,
    InfoBatComm = 2014,
    InfoLensComm = 2015,
    InfoSensor = 2016,
    InfoMedia = 2017,
    InfoTof = 2018,
    InfoBluetooth = 2019,

    TipsBatState = 3000,
    TipsNetStrength = 3001,
    TipsMicIntensity = 3002,
    TipsNameChanged = 3003,
}

/// Severity band an event identifier falls in.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EventSeverity {
    Tip,
    Info,
    Warning,
    Error,
}

impl EventSeverity {
    /// Classifies a raw event identifier, including ones this library has
    /// no name for yet.
    pub const fn from_raw(id: i32) -> EventSeverity {
        match id {
            i32::MIN..=999 => EventSeverity::Error,
            1000..=1999 => EventSeverity::Warning,
            2000..=2999 => EventSeverity::Info,
            3000..=i32::MAX => EventSeverity::Tip,
        }
    }
}

impl DeviceEvent {
    pub fn from_raw(id: i32) -> Option<DeviceEvent> {
        num_traits::FromPrimitive::from_i32(id)
    }

    pub fn severity(&self) -> EventSeverity {
        match num_traits::ToPrimitive::to_i32(self) {
            Some(id) => EventSeverity::from_raw(id),
            None => EventSeverity::Info,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn events_resolve_from_raw() {
        assert_eq!(DeviceEvent::from_raw(0), Some(DeviceEvent::ErrGimbalComm));
        assert_eq!(
            DeviceEvent::from_raw(2006),
            Some(DeviceEvent::InfoNewMediaFile)
        );
        assert_eq!(DeviceEvent::from_raw(4242), None);
    }

    #[test]
    fn severity_bands() {
        assert_eq!(DeviceEvent::ErrSensor.severity(), EventSeverity::Error);
        assert_eq!(
            DeviceEvent::WarnSdCardFull.severity(),
            EventSeverity::Warning
        );
        assert_eq!(DeviceEvent::InfoSdReady.severity(), EventSeverity::Info);
        assert_eq!(DeviceEvent::TipsBatState.severity(), EventSeverity::Tip);
        // unnamed identifiers still classify by band
        assert_eq!(EventSeverity::from_raw(1999), EventSeverity::Warning);
        assert_eq!(EventSeverity::from_raw(-1), EventSeverity::Error);
    }

    #[test]
    fn severity_orders_by_urgency() {
        assert!(EventSeverity::Error > EventSeverity::Warning);
        assert!(EventSeverity::Warning > EventSeverity::Info);
        assert!(EventSeverity::Info > EventSeverity::Tip);
    }
}
