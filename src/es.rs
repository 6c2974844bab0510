//! Elementary-stream frame parsing.
//!
//! A track of kind [`TrackKind::Elementary`](crate::types::TrackKind) hands its
//! PES payloads to a [`FrameParser`] through a [`ByteSupply`]. The default
//! parser, [`MpegVideoParser`], cuts MPEG-1/2 video into access units.

use std::collections::VecDeque;

use bytes::{Buf, BytesMut};

use crate::constants::{GROUP_START, PICTURE_START, PTS_CLOCK_HZ, SEQUENCE_END, SEQUENCE_HEADER};
use crate::error::Result;
use crate::parsers::{parse_picture_header, PictureCodingType};
use crate::pes::PesPacket;
use crate::types::Frame;

/// Source of PES packets for one stream, in stream order
pub trait ByteSupply {
    /// Next packet for the stream, `None` at end of stream
    fn pull(&mut self) -> Result<Option<PesPacket>>;

    /// Last defined PTS seen on a pulled packet
    fn current_pts(&self) -> Option<i64>;
}

pub trait FrameParser: Send {
    fn next_frame(&mut self, supply: &mut dyn ByteSupply, scratch: &mut BytesMut) -> Result<Option<Frame>>;

    /// Drops buffered bytes, called when the demuxer seeks
    fn reset(&mut self);
}

/// Bytes still buffered from one pulled packet
struct Chunk {
    pos: u64,
    /// The packet's PTS, or the running PTS when it carried none
    pts: Option<i64>,
    len: usize,
}

/// Access-unit splitter for MPEG-1/2 video.
///
/// A unit starts at a sequence header, GOP or picture start code and ends at
/// the next one of those that follows a picture. A sequence end code stays
/// with the unit it closes.
pub struct MpegVideoParser {
    stream_id: u8,
    buf: BytesMut,
    chunks: VecDeque<Chunk>,
    scan_from: usize,
    unit_start: Option<usize>,
    picture_at: Option<usize>,
    eos: bool,
    frame_no: u64,
}

impl MpegVideoParser {
    pub fn new(stream_id: u8) -> Self {
        Self {
            stream_id,
            buf: BytesMut::new(),
            chunks: VecDeque::new(),
            scan_from: 0,
            unit_start: None,
            picture_at: None,
            eos: false,
            frame_no: 0,
        }
    }

    /// Walks start codes from `scan_from`, returning the end of the current unit
    fn find_unit_end(&mut self) -> Option<usize> {
        let data = &self.buf[..];
        let mut i = self.scan_from;
        while i + 4 <= data.len() {
            if data[i] != 0 || data[i + 1] != 0 || data[i + 2] != 1 {
                i += 1;
                continue;
            }
            let code = data[i + 3];
            match (self.unit_start, self.picture_at) {
                (None, _) => {
                    if matches!(code, SEQUENCE_HEADER | GROUP_START | PICTURE_START) {
                        self.unit_start = Some(i);
                        if code == PICTURE_START {
                            self.picture_at = Some(i);
                        }
                    }
                }
                (Some(_), None) => {
                    if code == PICTURE_START {
                        self.picture_at = Some(i);
                    }
                }
                (Some(_), Some(_)) => match code {
                    PICTURE_START | SEQUENCE_HEADER | GROUP_START => {
                        self.scan_from = i;
                        return Some(i);
                    }
                    SEQUENCE_END => {
                        self.scan_from = i + 4;
                        return Some(i + 4);
                    }
                    _ => {}
                },
            }
            i += 3;
        }
        self.scan_from = i;
        None
    }

    fn consume(&mut self, n: usize) {
        self.buf.advance(n);
        self.scan_from = self.scan_from.saturating_sub(n);
        let mut left = n;
        while left > 0 {
            let Some(front) = self.chunks.front_mut() else { break };
            if front.len <= left {
                left -= front.len;
                self.chunks.pop_front();
            } else {
                front.len -= left;
                left = 0;
            }
        }
    }

    /// Cuts `start..end` out as a frame stamped with the PTS of the packet holding its first byte
    fn emit(&mut self, end: usize, scratch: &mut BytesMut) -> Frame {
        let start = self.unit_start.unwrap_or(0);
        let key_frame = self
            .picture_at
            .and_then(|p| self.buf.get(p + 4..))
            .and_then(parse_picture_header)
            .is_some_and(|h| h.coding_type == PictureCodingType::Intra);

        self.consume(start);
        let (pos, pts) = self.chunks.front().map_or((0, None), |c| (c.pos, c.pts));
        scratch.clear();
        scratch.extend_from_slice(&self.buf[..end - start]);
        self.consume(end - start);
        self.unit_start = None;
        self.picture_at = None;

        let frame_no = self.frame_no;
        self.frame_no += 1;
        Frame {
            data: scratch.split().freeze(),
            pts,
            dts: None,
            timescale: PTS_CLOCK_HZ,
            duration: 0,
            frame_no,
            key_frame,
            stream_id: self.stream_id,
            pos,
        }
    }
}

impl FrameParser for MpegVideoParser {
    fn next_frame(&mut self, supply: &mut dyn ByteSupply, scratch: &mut BytesMut) -> Result<Option<Frame>> {
        loop {
            if let Some(end) = self.find_unit_end() {
                return Ok(Some(self.emit(end, scratch)));
            }
            if self.unit_start.is_none() && self.scan_from > 0 {
                // nothing before a unit start is ever emitted
                let skip = self.scan_from;
                self.consume(skip);
            }
            if self.eos {
                if self.picture_at.is_some() {
                    let end = self.buf.len();
                    return Ok(Some(self.emit(end, scratch)));
                }
                self.reset_buffer();
                return Ok(None);
            }
            match supply.pull()? {
                Some(pkt) => {
                    let payload = pkt.payload();
                    if !payload.is_empty() {
                        self.chunks.push_back(Chunk {
                            pos: pkt.pos,
                            pts: pkt.pts.or_else(|| supply.current_pts()),
                            len: payload.len(),
                        });
                        self.buf.extend_from_slice(payload);
                    }
                }
                None => self.eos = true,
            }
        }
    }

    fn reset(&mut self) {
        self.reset_buffer();
        self.eos = false;
        self.frame_no = 0;
    }
}

impl MpegVideoParser {
    fn reset_buffer(&mut self) {
        self.buf.clear();
        self.chunks.clear();
        self.scan_from = 0;
        self.unit_start = None;
        self.picture_at = None;
    }
}
