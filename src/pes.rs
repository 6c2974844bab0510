//! PES header reader and the packet type moved between scanner and tracks

use std::fmt;

use bitstream_io::{BitRead, BitReader, BigEndian};
use bytes::BytesMut;

use crate::constants::{PADDING_STREAM, PES_PREFIX_LEN, PRIVATE_STREAM_2};
use crate::pool::BufferPool;

/// Fields decoded from the start of a marker-delimited segment.
///
/// A header that does not follow PES syntax comes back with `length == 0`
/// and no timestamps, so the caller keeps reading up to the next marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PesHeader {
    pub stream_id: u8,
    /// Declared PES_packet_length; 0 means unbounded
    pub length: u16,
    pub pts: Option<i64>,
    pub dts: Option<i64>,
    /// Bytes from the marker up to the first payload byte
    pub header_len: usize,
}

/// Parses a segment that begins exactly at a `00 00 01 xx` marker
pub fn read_pes_header(data: &[u8]) -> PesHeader {
    let malformed = PesHeader {
        stream_id: data.get(3).copied().unwrap_or(0),
        length: 0,
        pts: None,
        dts: None,
        header_len: data.len().min(PES_PREFIX_LEN),
    };
    if data.len() < PES_PREFIX_LEN {
        return malformed;
    }
    let length = u16::from_be_bytes([data[4], data[5]]);

    let extension = match malformed.stream_id {
        PRIVATE_STREAM_2 | PADDING_STREAM => Some((None, None, PES_PREFIX_LEN)),
        _ => match data.get(PES_PREFIX_LEN) {
            Some(b0) if b0 & 0xC0 == 0x80 => mpeg2_extension(data),
            Some(_) => mpeg1_extension(data),
            None => None,
        },
    };

    match extension {
        Some((pts, dts, header_len)) if header_len <= data.len() => PesHeader {
            length,
            pts,
            dts,
            header_len,
            ..malformed
        },
        _ => malformed,
    }
}

type Extension = (Option<i64>, Option<i64>, usize);

/// MPEG-2 optional header: flags, header_data_length, PTS/DTS
fn mpeg2_extension(data: &[u8]) -> Option<Extension> {
    let flags = *data.get(7)?;
    let header_data_len = *data.get(8)? as usize;
    let (pts, dts, ts_len) = match flags & 0xC0 {
        0x80 => (Some(read_timestamp(data.get(9..14)?)?), None, 5),
        0xC0 => (
            Some(read_timestamp(data.get(9..14)?)?),
            Some(read_timestamp(data.get(14..19)?)?),
            10,
        ),
        _ => (None, None, 0),
    };
    if header_data_len < ts_len {
        return None;
    }
    Some((pts, dts, 9 + header_data_len))
}

/// MPEG-1 header: stuffing, optional STD buffer field, then the timestamp flags byte
fn mpeg1_extension(data: &[u8]) -> Option<Extension> {
    let mut idx = PES_PREFIX_LEN;
    while *data.get(idx)? == 0xFF {
        idx += 1;
    }
    if data[idx] & 0xC0 == 0x40 {
        idx += 2; // STD_buffer_scale + size
    }
    let c = *data.get(idx)?;
    match c & 0xF0 {
        0x20 => Some((Some(read_timestamp(data.get(idx..idx + 5)?)?), None, idx + 5)),
        0x30 => Some((
            Some(read_timestamp(data.get(idx..idx + 5)?)?),
            Some(read_timestamp(data.get(idx + 5..idx + 10)?)?),
            idx + 10,
        )),
        _ if c == 0x0F => Some((None, None, idx + 1)),
        _ => None,
    }
}

/// 33-bit timestamp split 3/15/15 with marker bits
fn read_timestamp(bytes: &[u8]) -> Option<i64> {
    let mut br = BitReader::endian(bytes, BigEndian);
    br.skip(4).ok()?;
    let high = br.read::<3, u64>().ok()?;
    br.skip(1).ok()?;
    let mid = br.read::<15, u64>().ok()?;
    br.skip(1).ok()?;
    let low = br.read::<15, u64>().ok()?;
    Some(((high << 30) | (mid << 15) | low) as i64)
}

/// One captured PES packet.
///
/// The bytes live in a buffer checked out of the demuxer's [`BufferPool`];
/// the buffer goes back to the pool on [`release`](Self::release) or drop.
pub struct PesPacket {
    buf: Option<BytesMut>,
    pool: BufferPool,
    header_len: usize,
    pub stream_id: u8,
    pub pts: Option<i64>,
    pub dts: Option<i64>,
    /// Declared length, 0 when the packet was delimited by the next marker
    pub length: u16,
    /// File offset of the packet's marker
    pub pos: u64,
    /// Set when the segment did not fit the pool buffer and its tail was dropped
    pub truncated: bool,
}

impl PesPacket {
    pub(crate) fn new(buf: BytesMut, header: PesHeader, pos: u64, pool: BufferPool) -> Self {
        Self {
            header_len: header.header_len.min(buf.len()),
            buf: Some(buf),
            pool,
            stream_id: header.stream_id,
            pts: header.pts,
            dts: header.dts,
            length: header.length,
            pos,
            truncated: false,
        }
    }

    /// Elementary-stream bytes following the PES header
    pub fn payload(&self) -> &[u8] {
        &self.segment()[self.header_len..]
    }

    /// Every byte captured for this packet, starting at its marker
    pub fn segment(&self) -> &[u8] {
        self.buf.as_deref().unwrap_or(&[])
    }

    pub fn header_len(&self) -> usize {
        self.header_len
    }

    /// Checks the buffer back into the pool
    pub fn release(mut self) {
        if let Some(buf) = self.buf.take() {
            self.pool.release(buf);
        }
    }
}

impl Drop for PesPacket {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            self.pool.release(buf);
        }
    }
}

impl fmt::Debug for PesPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PesPacket")
            .field("stream_id", &format_args!("0x{:02X}", self.stream_id))
            .field("pts", &self.pts)
            .field("dts", &self.dts)
            .field("length", &self.length)
            .field("pos", &self.pos)
            .field("truncated", &self.truncated)
            .field("payload_len", &self.payload().len())
            .finish()
    }
}
