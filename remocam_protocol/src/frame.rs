//! # Wire frames
//!
//! [Frame] is the basic unit of communication with the device, on every
//! transport (USB control transfers, UDP/TCP sockets, BLE GATT). Everything
//! else is built on top of it.
//!
//! ## Frame format
//!
//! All fields are big-endian:
//!
//! * `u16`: magic (`0x524d`, `"RM"`)
//! * `u16`: payload length in bytes
//! * `u16`: [opcode][OpCode]
//! * `u8`: sequence tag
//! * `u8`: [flags][FrameFlags]
//! * `i8`: result code (`0` on success, negative = device error)
//! * payload (`length` bytes)
//! * `u8`: additive checksum over all preceding bytes
//!
//! Transports deliver arbitrary byte runs; [FrameDecoder] reassembles them,
//! drops corrupt frames and resynchronizes on the next magic.
use crate::{
    util::{additive_checksum, ChecksumWriter},
    Error, Result,
};
use binrw::{binrw, BinRead, BinWrite};
use modular_bitfield::{bitfield, specifiers::B5};
use std::io::Cursor;

/// Numeric operation selector.
///
/// Opcodes are grouped by functional area in the high byte:
///
/// * `0x01--`: gimbal motion and presets
/// * `0x02--`: AI tracking
/// * `0x03--`: camera / image parameters
/// * `0x04--`: system (identity, status, liveness)
/// * `0x05--`: file transfer
#[binrw]
#[brw(big)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpCode(pub u16);

impl OpCode {
    /// File transfer opcodes run on their own logical channel, separate
    /// from the single-slot command channel.
    pub const fn is_file_transfer(&self) -> bool {
        self.0 & 0xff00 == 0x0500
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

/// Frame flags.
///
/// This is a `u8` bitfield. Fields from LSB to MSB:
///
/// * `bit 0x01`: response to a request
/// * `bit 0x02`: unsolicited event notification
/// * `bit 0x04`: unsolicited periodic status push
#[bitfield(bits = 8)]
#[repr(u8)]
#[derive(BinRead, BinWrite, Debug, Default, PartialEq, Eq, Clone, Copy)]
#[br(map = From::<u8>::from)]
#[bw(map = |&x| Into::<u8>::into(x))]
pub struct FrameFlags {
    /// The frame answers a previously-sent request with the same opcode
    /// (and, for dialects which echo it, the same sequence tag).
    pub response: bool,

    /// Device-originated discrete event, never matched to a request.
    pub event: bool,

    /// Device-originated periodic status snapshot, never matched to a
    /// request.
    pub status: bool,

    #[skip]
    __: B5,
}

/// One complete protocol message unit.
#[binrw]
#[derive(Debug, Clone, PartialEq, Eq)]
#[brw(big, magic = 0x524du16)]
#[bw(stream = s, map_stream = checksummed)]
pub struct Frame {
    // Length for the read path; recomputed from the payload on write.
    #[br(temp, assert(length <= Frame::MAX_PAYLOAD_LENGTH))]
    #[bw(try_calc(u16::try_from(payload.len()).map_err(|_| Error::InvalidLength)))]
    length: u16,

    pub opcode: OpCode,

    /// Rolling per-channel tag used to pair responses with requests.
    /// Devices with older firmware echo `0` here; matching then falls back
    /// to opcode only.
    pub sequence: u8,

    pub flags: FrameFlags,

    /// Result code carried by response frames: `0` for success, a negative
    /// device error otherwise. Always `0` on requests.
    pub code: i8,

    #[br(count = length)]
    pub payload: Vec<u8>,

    // The checksum was verified by [FrameDecoder] before parsing; on write
    // it is the accumulated sum of everything above.
    #[br(temp)]
    #[bw(calc(s.sum()))]
    checksum: u8,
}

impl Frame {
    /// Length of all header fields, including the magic.
    pub const HEADER_LENGTH: usize = 9;
    /// Maximum payload size in bytes.
    pub const MAX_PAYLOAD_LENGTH: u16 = 1024;

    /// Creates a request frame.
    pub fn request(opcode: OpCode, sequence: u8, payload: Vec<u8>) -> Self {
        Self {
            opcode,
            sequence,
            flags: FrameFlags::new(),
            code: 0,
            payload,
        }
    }

    /// Creates a response frame; mostly useful for simulated devices.
    pub fn response(opcode: OpCode, sequence: u8, code: i8, payload: Vec<u8>) -> Self {
        Self {
            opcode,
            sequence,
            flags: FrameFlags::new().with_response(true),
            code,
            payload,
        }
    }

    /// Creates an unsolicited event frame.
    pub fn event(opcode: OpCode, payload: Vec<u8>) -> Self {
        Self {
            opcode,
            sequence: 0,
            flags: FrameFlags::new().with_event(true),
            code: 0,
            payload,
        }
    }

    /// Creates an unsolicited status push frame.
    pub fn status_push(opcode: OpCode, payload: Vec<u8>) -> Self {
        Self {
            opcode,
            sequence: 0,
            flags: FrameFlags::new().with_status(true),
            code: 0,
            payload,
        }
    }

    /// Serializes the frame, including the trailing checksum.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Cursor::new(Vec::with_capacity(
            Self::HEADER_LENGTH + self.payload.len() + 1,
        ));
        self.write(&mut out)?;
        Ok(out.into_inner())
    }

    /// `true` for any frame not matched against a pending request:
    /// events and periodic status pushes.
    pub fn is_unsolicited(&self) -> bool {
        self.flags.event() || self.flags.status()
    }
}

/// Streaming reassembly buffer for inbound transport bytes.
///
/// Feed arbitrary byte runs with [`push`][Self::push], then drain complete
/// frames with [`next_frame`][Self::next_frame]. Garbled data is dropped
/// and parsing resynchronizes at the next magic; corruption is recovered
/// locally and never surfaced to callers.
#[derive(Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
}

const MAGIC: [u8; 2] = [0x52, 0x4d];

// binrw emits the magic before the stream is wrapped, so the writer's sum
// has to be seeded with it for the trailing checksum to cover the whole
// frame.
fn checksummed<W>(inner: W) -> ChecksumWriter<W> {
    ChecksumWriter::seeded(additive_checksum(&MAGIC), inner)
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends raw transport bytes to the reassembly buffer.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Extracts the next complete, checksum-valid frame, or `None` if more
    /// bytes are needed.
    pub fn next_frame(&mut self) -> Option<Frame> {
        loop {
            let Some(start) = self.find_magic() else {
                // No magic anywhere; keep a trailing first-magic-byte in
                // case the pair was split across reads.
                let keep = usize::from(self.buf.last() == Some(&MAGIC[0]));
                self.buf.drain(..self.buf.len() - keep);
                return None;
            };

            if start > 0 {
                trace!("dropping {start} byte(s) before next frame header");
                self.buf.drain(..start);
            }

            if self.buf.len() < Frame::HEADER_LENGTH {
                return None;
            }

            let length = usize::from(u16::from_be_bytes([self.buf[2], self.buf[3]]));
            if length > usize::from(Frame::MAX_PAYLOAD_LENGTH) {
                warn!("frame length {length} out of range, resynchronizing");
                self.buf.drain(..MAGIC.len());
                continue;
            }

            let total = Frame::HEADER_LENGTH + length + 1;
            if self.buf.len() < total {
                return None;
            }

            let expected = additive_checksum(&self.buf[..total - 1]);
            if expected != self.buf[total - 1] {
                warn!(
                    "frame checksum mismatch ({expected:#04x} != {:#04x}), resynchronizing",
                    self.buf[total - 1]
                );
                self.buf.drain(..MAGIC.len());
                continue;
            }

            match Frame::read(&mut Cursor::new(&self.buf[..total])) {
                Ok(frame) => {
                    self.buf.drain(..total);
                    return Some(frame);
                }
                Err(e) => {
                    warn!("unparseable frame dropped: {e}");
                    self.buf.drain(..MAGIC.len());
                }
            }
        }
    }

    fn find_magic(&self) -> Option<usize> {
        self.buf.windows(MAGIC.len()).position(|w| w == MAGIC)
    }
}
