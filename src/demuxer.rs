//! Program stream demuxer: shared scan step, lazy stream discovery and routing.

use std::collections::HashMap;
use std::io::{Read, Seek};

use tracing::{debug, trace, warn};

use crate::constants::{is_pes_marker, ELEMENTARY_SCORE_THRESHOLD, PADDING_STREAM, PES_PREFIX_LEN};
use crate::error::{DemuxError, Result};
use crate::es::{FrameParser, MpegVideoParser};
use crate::pes::{read_pes_header, PesPacket};
use crate::pool::BufferPool;
use crate::probe::elementary_score;
use crate::scanner::MarkerScanner;
use crate::track::{Track, TrackHandle};
use crate::types::{DemuxerConfig, MediaType, TrackInfo, TrackKind};

/// Builds the frame parser for a stream classified as elementary video
pub type ParserFactory = fn(stream_id: u8) -> Box<dyn FrameParser>;

fn default_parser(stream_id: u8) -> Box<dyn FrameParser> {
    Box::new(MpegVideoParser::new(stream_id))
}

/// Marker scanner plus the pool its segments are captured into
pub(crate) struct PacketScan<R> {
    scanner: MarkerScanner<R>,
    pool: BufferPool,
    limit: usize,
}

impl<R: Read + Seek> PacketScan<R> {
    /// One scan step: skip to the next PES marker and capture its packet
    pub(crate) fn next_packet(&mut self) -> Result<Option<PesPacket>> {
        while !is_pes_marker(self.scanner.marker()) {
            if !self.scanner.skip_to_marker()? {
                return Ok(None);
            }
        }

        let pos = self.scanner.pos();
        let mut buf = self.pool.acquire();
        self.scanner.read_to_next_marker(&mut buf, self.limit)?;
        let header = read_pes_header(&buf);
        let complete = if header.length == 0 {
            while !is_pes_marker(self.scanner.marker())
                && self.scanner.read_to_next_marker(&mut buf, self.limit)?
            {}
            self.scanner.is_done() || is_pes_marker(self.scanner.marker())
        } else {
            let total = usize::from(header.length) + PES_PREFIX_LEN;
            let want = total.saturating_sub(buf.len());
            self.scanner.read(&mut buf, want, self.limit)?;
            buf.len() >= total || self.scanner.is_done()
        };
        if !complete {
            warn!(pos, stream_id = header.stream_id, limit = self.limit, "PES segment truncated to buffer size");
        }

        trace!(pos, stream_id = header.stream_id, len = buf.len(), pts = ?header.pts, "scanned packet");
        let mut pkt = PesPacket::new(buf, header, pos, self.pool.clone());
        pkt.truncated = !complete;
        Ok(Some(pkt))
    }
}

/// Stream id → track map, remembering discovery order
#[derive(Default)]
pub(crate) struct Tracks {
    map: HashMap<u8, Track>,
    order: Vec<u8>,
}

impl Tracks {
    pub(crate) fn get(&self, stream_id: u8) -> Option<&Track> {
        self.map.get(&stream_id)
    }

    pub(crate) fn get_mut(&mut self, stream_id: u8) -> Option<&mut Track> {
        self.map.get_mut(&stream_id)
    }

    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }

    fn iter(&self) -> impl Iterator<Item = &Track> + '_ {
        self.order.iter().filter_map(|id| self.map.get(id))
    }

    /// Queues `pkt` on its track, creating and classifying the track on first sight
    pub(crate) fn route(&mut self, pkt: PesPacket, factory: ParserFactory) {
        if pkt.stream_id == PADDING_STREAM {
            return;
        }
        if let Some(track) = self.map.get_mut(&pkt.stream_id) {
            track.push_pending(pkt);
            return;
        }

        let stream_id = pkt.stream_id;
        let score = elementary_score(pkt.payload());
        let kind = if score > ELEMENTARY_SCORE_THRESHOLD {
            TrackKind::Elementary
        } else {
            TrackKind::Raw
        };
        debug!(stream_id, ?kind, score, pos = pkt.pos, "discovered stream");

        let track = match kind {
            TrackKind::Elementary => Track::elementary(pkt, factory(stream_id)),
            TrackKind::Raw => Track::raw(pkt),
        };
        self.map.insert(stream_id, track);
        self.order.push(stream_id);
    }

    /// Pops a pending packet for `stream_id`, or scans forward routing every
    /// other packet until one for `stream_id` turns up
    pub(crate) fn pull<R: Read + Seek>(
        &mut self,
        scan: &mut PacketScan<R>,
        stream_id: u8,
        factory: ParserFactory,
    ) -> Result<Option<PesPacket>> {
        if let Some(pkt) = self.map.get_mut(&stream_id).and_then(Track::pop_pending) {
            return Ok(Some(pkt));
        }
        while let Some(pkt) = scan.next_packet()? {
            if pkt.stream_id == stream_id {
                return Ok(Some(pkt));
            }
            self.route(pkt, factory);
        }
        Ok(None)
    }
}

pub struct PsDemuxer<R> {
    pub(crate) scan: PacketScan<R>,
    pub(crate) tracks: Tracks,
    pub(crate) parser_factory: ParserFactory,
    config: DemuxerConfig,
}

impl<R: Read + Seek> PsDemuxer<R> {
    pub fn new(inner: R) -> Result<Self> {
        Self::with_config(inner, DemuxerConfig::default())
    }

    pub fn with_config(inner: R, config: DemuxerConfig) -> Result<Self> {
        Self::with_parser_factory(inner, config, default_parser)
    }

    /// Opens the demuxer with a custom elementary-stream frame parser
    pub fn with_parser_factory(inner: R, config: DemuxerConfig, parser_factory: ParserFactory) -> Result<Self> {
        let scanner = MarkerScanner::new(inner, config.fetch_size)?;
        let mut demuxer = Self {
            scan: PacketScan {
                scanner,
                pool: BufferPool::new(config.buffer_size),
                limit: config.buffer_size,
            },
            tracks: Tracks::default(),
            parser_factory,
            config,
        };
        demuxer.find_streams()?;
        Ok(demuxer)
    }

    /// Bounded discovery: stops at `discovery_min_streams` streams or after
    /// `discovery_packets_per_stream` stream packets per known stream
    fn find_streams(&mut self) -> Result<()> {
        let mut scanned = 0usize;
        while scanned == 0
            || (scanned < self.config.discovery_packets_per_stream * self.tracks.len()
                && self.tracks.len() < self.config.discovery_min_streams)
        {
            let Some(pkt) = self.scan.next_packet()? else {
                break;
            };
            // padding never becomes a track, so it does not count
            if pkt.stream_id != PADDING_STREAM {
                scanned += 1;
            }
            self.tracks.route(pkt, self.parser_factory);
        }
        debug!(scanned, streams = self.tracks.len(), "stream discovery finished");
        Ok(())
    }

    /// Shared scan step, `None` at end of stream
    pub fn next_packet(&mut self) -> Result<Option<PesPacket>> {
        self.scan.next_packet()
    }

    /// Hands a scanned packet to its track; unseen stream ids create a track,
    /// packets for ignored tracks go straight back to the pool
    pub fn route_packet(&mut self, pkt: PesPacket) {
        self.tracks.route(pkt, self.parser_factory);
    }

    /// Repositions the channel and drops every track's pending packets and parser state
    pub fn seek(&mut self, offset: u64) -> Result<()> {
        debug!(offset, "seek");
        self.scan.scanner.seek(offset)?;
        self.reset();
        Ok(())
    }

    pub fn reset(&mut self) {
        for track in self.tracks.map.values_mut() {
            track.reset();
        }
    }

    /// Current scan position in the channel
    pub fn position(&self) -> u64 {
        self.scan.scanner.pos()
    }

    pub fn pool(&self) -> &BufferPool {
        &self.scan.pool
    }

    pub fn config(&self) -> &DemuxerConfig {
        &self.config
    }

    /// Tracks discovered so far, in discovery order
    pub fn tracks(&self) -> Vec<TrackInfo> {
        self.tracks.iter().map(Track::info).collect()
    }

    pub fn video_tracks(&self) -> Vec<TrackInfo> {
        self.tracks_of(MediaType::Video)
    }

    pub fn audio_tracks(&self) -> Vec<TrackInfo> {
        self.tracks_of(MediaType::Audio)
    }

    fn tracks_of(&self, media_type: MediaType) -> Vec<TrackInfo> {
        self.tracks
            .iter()
            .map(Track::info)
            .filter(|t| t.media_type == media_type)
            .collect()
    }

    /// Borrows one track for reading
    pub fn track(&mut self, stream_id: u8) -> Result<TrackHandle<'_, R>> {
        if self.tracks.get(stream_id).is_none() {
            return Err(DemuxError::UnknownTrack(stream_id));
        }
        Ok(TrackHandle::new(self, stream_id))
    }
}
