//! Per-stream state and the borrowed handle callers read frames through

use std::collections::VecDeque;
use std::io::{Read, Seek};

use bytes::BytesMut;

use crate::constants::PTS_CLOCK_HZ;
use crate::demuxer::{PacketScan, ParserFactory, PsDemuxer, Tracks};
use crate::error::{DemuxError, Result};
use crate::es::{ByteSupply, FrameParser};
use crate::pes::PesPacket;
use crate::types::{Frame, MediaType, TrackInfo, TrackKind};

enum TrackState {
    Elementary {
        /// Taken out while the parser runs so it can pull through the demuxer
        parser: Option<Box<dyn FrameParser>>,
        current_pts: Option<i64>,
    },
    Raw {
        frame_no: u64,
    },
}

/// One elementary stream of the program stream
pub(crate) struct Track {
    stream_id: u8,
    /// `None` once ignored: later packets are released instead of queued
    pending: Option<VecDeque<PesPacket>>,
    state: TrackState,
}

impl Track {
    pub(crate) fn elementary(first: PesPacket, parser: Box<dyn FrameParser>) -> Self {
        Self::with_state(
            first,
            TrackState::Elementary {
                parser: Some(parser),
                current_pts: None,
            },
        )
    }

    pub(crate) fn raw(first: PesPacket) -> Self {
        Self::with_state(first, TrackState::Raw { frame_no: 0 })
    }

    fn with_state(first: PesPacket, state: TrackState) -> Self {
        Self {
            stream_id: first.stream_id,
            pending: Some(VecDeque::from([first])),
            state,
        }
    }

    pub(crate) fn kind(&self) -> TrackKind {
        match self.state {
            TrackState::Elementary { .. } => TrackKind::Elementary,
            TrackState::Raw { .. } => TrackKind::Raw,
        }
    }

    pub(crate) fn info(&self) -> TrackInfo {
        TrackInfo {
            stream_id: self.stream_id,
            kind: self.kind(),
            media_type: MediaType::from_stream_id(self.stream_id),
            pending: self.pending_len(),
            ignored: self.is_ignored(),
        }
    }

    pub(crate) fn is_ignored(&self) -> bool {
        self.pending.is_none()
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.pending.as_ref().map_or(0, VecDeque::len)
    }

    pub(crate) fn push_pending(&mut self, pkt: PesPacket) {
        match &mut self.pending {
            Some(queue) => queue.push_back(pkt),
            None => pkt.release(),
        }
    }

    pub(crate) fn pop_pending(&mut self) -> Option<PesPacket> {
        self.pending.as_mut()?.pop_front()
    }

    /// Releases every pending buffer and turns the track into a sink
    pub(crate) fn ignore(&mut self) {
        if let Some(queue) = self.pending.take() {
            queue.into_iter().for_each(PesPacket::release);
        }
    }

    /// Drops pending packets and parser state, keeping id, kind and ignore status
    pub(crate) fn reset(&mut self) {
        if let Some(queue) = self.pending.as_mut() {
            queue.drain(..).for_each(PesPacket::release);
        }
        match &mut self.state {
            TrackState::Elementary { parser, current_pts } => {
                if let Some(parser) = parser {
                    parser.reset();
                }
                *current_pts = None;
            }
            TrackState::Raw { frame_no } => *frame_no = 0,
        }
    }

    fn advance_frame_no(&mut self) -> u64 {
        match &mut self.state {
            TrackState::Raw { frame_no } => {
                let current = *frame_no;
                *frame_no += 1;
                current
            }
            TrackState::Elementary { .. } => 0,
        }
    }

    fn take_parser(&mut self) -> Option<Box<dyn FrameParser>> {
        match &mut self.state {
            TrackState::Elementary { parser, .. } => parser.take(),
            TrackState::Raw { .. } => None,
        }
    }

    fn restore_parser(&mut self, restored: Box<dyn FrameParser>) {
        if let TrackState::Elementary { parser, .. } = &mut self.state {
            *parser = Some(restored);
        }
    }

    fn current_pts(&self) -> Option<i64> {
        match self.state {
            TrackState::Elementary { current_pts, .. } => current_pts,
            TrackState::Raw { .. } => None,
        }
    }

    fn set_current_pts(&mut self, pts: i64) {
        if let TrackState::Elementary { current_pts, .. } = &mut self.state {
            *current_pts = Some(pts);
        }
    }
}

/// Byte supply for an elementary track: its pending queue first, then the shared scan
struct TrackSupply<'a, R> {
    scan: &'a mut PacketScan<R>,
    tracks: &'a mut Tracks,
    stream_id: u8,
    factory: ParserFactory,
}

impl<R: Read + Seek> ByteSupply for TrackSupply<'_, R> {
    fn pull(&mut self) -> Result<Option<PesPacket>> {
        let pkt = self.tracks.pull(self.scan, self.stream_id, self.factory)?;
        if let Some(pts) = pkt.as_ref().and_then(|p| p.pts) {
            if let Some(track) = self.tracks.get_mut(self.stream_id) {
                track.set_current_pts(pts);
            }
        }
        Ok(pkt)
    }

    fn current_pts(&self) -> Option<i64> {
        self.tracks.get(self.stream_id).and_then(Track::current_pts)
    }
}

/// A track borrowed from its [`PsDemuxer`] for reading
pub struct TrackHandle<'a, R> {
    demuxer: &'a mut PsDemuxer<R>,
    stream_id: u8,
    kind: TrackKind,
}

impl<'a, R: Read + Seek> TrackHandle<'a, R> {
    pub(crate) fn new(demuxer: &'a mut PsDemuxer<R>, stream_id: u8) -> Self {
        let kind = demuxer.tracks.get(stream_id).map_or(TrackKind::Raw, Track::kind);
        Self {
            demuxer,
            stream_id,
            kind,
        }
    }

    pub fn stream_id(&self) -> u8 {
        self.stream_id
    }

    /// Media type from the stream id range, independent of the classifier
    pub fn meta(&self) -> MediaType {
        MediaType::from_stream_id(self.stream_id)
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn pending_len(&self) -> usize {
        self.demuxer.tracks.get(self.stream_id).map_or(0, Track::pending_len)
    }

    pub fn is_ignored(&self) -> bool {
        self.demuxer.tracks.get(self.stream_id).is_some_and(Track::is_ignored)
    }

    /// Releases pending packets; packets scanned later for this stream are dropped
    pub fn ignore(&mut self) {
        if let Some(track) = self.demuxer.tracks.get_mut(self.stream_id) {
            track.ignore();
        }
    }

    /// Next frame of this track, `None` at end of stream or once ignored
    pub fn next_frame(&mut self, scratch: &mut BytesMut) -> Result<Option<Frame>> {
        let PsDemuxer {
            scan,
            tracks,
            parser_factory,
            ..
        } = &mut *self.demuxer;
        let factory = *parser_factory;
        let stream_id = self.stream_id;
        if tracks.get(stream_id).is_none_or(Track::is_ignored) {
            return Ok(None);
        }

        match self.kind {
            TrackKind::Raw => {
                let Some(pkt) = tracks.pull(scan, stream_id, factory)? else {
                    return Ok(None);
                };
                let frame_no = tracks.get_mut(stream_id).map_or(0, Track::advance_frame_no);
                scratch.clear();
                scratch.extend_from_slice(pkt.payload());
                Ok(Some(Frame {
                    data: scratch.split().freeze(),
                    pts: pkt.pts,
                    dts: pkt.dts,
                    timescale: PTS_CLOCK_HZ,
                    duration: 0,
                    frame_no,
                    key_frame: true,
                    stream_id,
                    pos: pkt.pos,
                }))
            }
            TrackKind::Elementary => {
                let Some(mut parser) = tracks.get_mut(stream_id).and_then(Track::take_parser) else {
                    return Err(DemuxError::Parser(format!("frame parser for stream 0x{stream_id:02X} is busy")));
                };
                let result = {
                    let mut supply = TrackSupply {
                        scan,
                        tracks: &mut *tracks,
                        stream_id,
                        factory,
                    };
                    parser.next_frame(&mut supply, scratch)
                };
                if let Some(track) = tracks.get_mut(stream_id) {
                    track.restore_parser(parser);
                }
                result
            }
        }
    }
}
