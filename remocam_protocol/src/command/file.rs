//! File transfer commands.
//!
//! Transfers (background images, sleep videos, logs) run on a logically
//! separate channel from normal commands: their opcodes live in the
//! `0x05--` group, which the correlator routes to a dedicated pending
//! slot so a long transfer never blocks ordinary control traffic.
use super::{Ack, Command};
use crate::frame::OpCode;
use binrw::{binrw, helpers::until_eof};

/// Maximum chunk payload carried per frame.
pub const FILE_CHUNK_SIZE: usize = 960;

bitflags! {
    /// Transferable resource selector.
    ///
    /// Meet-series and Tiny 2 devices store up to four background images
    /// (with thumbnails) and four sleep-mode videos.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FileType: u32 {
        const DOWNLOAD_IMAGE_MINI_0 = 1 << 0;
        const DOWNLOAD_IMAGE_MINI_1 = 1 << 1;
        const DOWNLOAD_IMAGE_MINI_2 = 1 << 2;
        const DOWNLOAD_IMAGE_MINI_3 = 1 << 3;
        const DOWNLOAD_IMAGE_0 = 1 << 4;
        const DOWNLOAD_IMAGE_1 = 1 << 5;
        const DOWNLOAD_IMAGE_2 = 1 << 6;
        const DOWNLOAD_IMAGE_3 = 1 << 7;
        const UPLOAD_IMAGE_0 = 1 << 8;
        const UPLOAD_IMAGE_1 = 1 << 9;
        const UPLOAD_IMAGE_2 = 1 << 10;
        const UPLOAD_IMAGE_3 = 1 << 11;
        const DOWNLOAD_VIDEO_0 = 1 << 12;
        const DOWNLOAD_VIDEO_1 = 1 << 13;
        const DOWNLOAD_VIDEO_2 = 1 << 14;
        const DOWNLOAD_VIDEO_3 = 1 << 15;
        const UPLOAD_VIDEO_0 = 1 << 16;
        const UPLOAD_VIDEO_1 = 1 << 17;
        const UPLOAD_VIDEO_2 = 1 << 18;
        const UPLOAD_VIDEO_3 = 1 << 19;
        const DOWNLOAD_LOG = 1 << 20;
    }
}

impl FileType {
    const UPLOADS: FileType = FileType::UPLOAD_IMAGE_0
        .union(FileType::UPLOAD_IMAGE_1)
        .union(FileType::UPLOAD_IMAGE_2)
        .union(FileType::UPLOAD_IMAGE_3)
        .union(FileType::UPLOAD_VIDEO_0)
        .union(FileType::UPLOAD_VIDEO_1)
        .union(FileType::UPLOAD_VIDEO_2)
        .union(FileType::UPLOAD_VIDEO_3);

    /// `true` when the selector names an upload resource.
    pub const fn is_upload(&self) -> bool {
        self.intersects(Self::UPLOADS)
    }

    /// Resource slot index (`0..=3`) for image/video selectors.
    pub fn slot(&self) -> u32 {
        (self.bits().trailing_zeros()) % 4
    }
}

/// Opens a transfer session for one resource.
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileTransferStart {
    #[br(map = FileType::from_bits_truncate)]
    #[bw(map = |v: &FileType| v.bits())]
    pub file_type: FileType,
    /// CRC of the local copy, used by the device to answer "same as
    /// local" without moving any data. `0` when no local copy exists.
    pub local_crc: u32,
}

impl Command for FileTransferStart {
    const OPCODE: OpCode = OpCode(0x0501);
    type Response = FileTransferInfo;
}

/// Transfer session parameters.
#[binrw]
#[brw(big)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FileTransferInfo {
    /// `0`: resource does not exist on the device.
    #[br(map = |v: u8| v != 0)]
    #[bw(map = |v: &bool| u8::from(*v))]
    pub exists: bool,
    /// `1`: device copy matches `local_crc`; no transfer needed.
    #[br(map = |v: u8| v != 0)]
    #[bw(map = |v: &bool| u8::from(*v))]
    pub same_as_local: bool,
    /// Total resource size in bytes (downloads).
    pub size: u32,
}

/// Requests one download chunk.
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileChunkRequest {
    #[br(map = FileType::from_bits_truncate)]
    #[bw(map = |v: &FileType| v.bits())]
    pub file_type: FileType,
    pub offset: u32,
}

impl Command for FileChunkRequest {
    const OPCODE: OpCode = OpCode(0x0502);
    type Response = FileChunkData;
}

/// One download chunk. A short (or empty) `data` marks end of file.
#[binrw]
#[brw(big)]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FileChunkData {
    pub offset: u32,
    #[br(parse_with = until_eof)]
    pub data: Vec<u8>,
}

/// Sends one upload chunk.
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChunkSend {
    #[br(map = FileType::from_bits_truncate)]
    #[bw(map = |v: &FileType| v.bits())]
    pub file_type: FileType,
    pub offset: u32,
    #[br(parse_with = until_eof)]
    pub data: Vec<u8>,
}

impl Command for FileChunkSend {
    const OPCODE: OpCode = OpCode(0x0503);
    type Response = Ack;
}

/// Closes a transfer session.
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileTransferFinish {
    #[br(map = FileType::from_bits_truncate)]
    #[bw(map = |v: &FileType| v.bits())]
    pub file_type: FileType,
    /// `1` when every chunk moved successfully; the device discards
    /// partial uploads otherwise.
    #[br(map = |v: u8| v != 0)]
    #[bw(map = |v: &bool| u8::from(*v))]
    pub complete: bool,
}

impl Command for FileTransferFinish {
    const OPCODE: OpCode = OpCode(0x0504);
    type Response = Ack;
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Result;

    #[test]
    fn file_opcodes_route_to_transfer_channel() {
        assert!(FileTransferStart::OPCODE.is_file_transfer());
        assert!(FileChunkRequest::OPCODE.is_file_transfer());
        assert!(FileChunkSend::OPCODE.is_file_transfer());
        assert!(FileTransferFinish::OPCODE.is_file_transfer());
        assert!(!crate::command::StatusRequest::OPCODE.is_file_transfer());
    }

    #[test]
    fn upload_selector_detection() {
        assert!(FileType::UPLOAD_IMAGE_2.is_upload());
        assert!(!FileType::DOWNLOAD_IMAGE_2.is_upload());
        assert!(!FileType::DOWNLOAD_LOG.is_upload());
        assert_eq!(FileType::UPLOAD_IMAGE_2.slot(), 2);
        assert_eq!(FileType::DOWNLOAD_VIDEO_1.slot(), 1);
    }

    #[test]
    fn chunk_request_layout() -> Result {
        let encoded = FileChunkRequest {
            file_type: FileType::DOWNLOAD_IMAGE_0,
            offset: 0x1234,
        }
        .encode()?;
        assert_eq!(encoded, vec![0, 0, 0, 0x10, 0, 0, 0x12, 0x34]);
        Ok(())
    }
}
