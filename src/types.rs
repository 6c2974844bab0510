use std::path::PathBuf;

use bytes::Bytes;
use serde::Serialize;

use crate::constants::*;

/// Demuxer tunables
#[derive(Debug, Clone)]
pub struct DemuxerConfig {
    /// Capacity of every pooled scan buffer; segments longer than this are truncated
    pub buffer_size: usize,
    /// Bytes requested from the channel per read
    pub fetch_size: usize,
    /// Discovery stops once this many streams are known...
    pub discovery_min_streams: usize,
    /// ...or after this many packets per known stream have been scanned
    pub discovery_packets_per_stream: usize,
}

impl Default for DemuxerConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            fetch_size: DEFAULT_FETCH_SIZE,
            discovery_min_streams: DISCOVERY_MIN_STREAMS,
            discovery_packets_per_stream: DISCOVERY_PACKETS_PER_STREAM,
        }
    }
}

/// How a track turns PES payloads into frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    /// Payload bytes feed an elementary-stream frame parser
    Elementary,
    /// Each PES payload is emitted as one frame
    Raw,
}

/// Media type inferred from the stream id range alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Video,
    Audio,
    Other,
}

impl MediaType {
    pub fn from_stream_id(stream_id: u8) -> Self {
        if is_video_stream(stream_id) {
            Self::Video
        } else if is_audio_stream(stream_id) {
            Self::Audio
        } else {
            Self::Other
        }
    }
}

/// Snapshot of one discovered track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrackInfo {
    pub stream_id: u8,
    pub kind: TrackKind,
    pub media_type: MediaType,
    pub pending: usize,
    pub ignored: bool,
}

/// A timestamped unit handed out by a track
#[derive(Debug, Clone)]
pub struct Frame {
    pub data: Bytes,
    pub pts: Option<i64>,
    pub dts: Option<i64>,
    pub timescale: u32,
    pub duration: u64,
    pub frame_no: u64,
    pub key_frame: bool,
    pub stream_id: u8,
    /// File offset of the PES packet that carried the first byte of `data`
    pub pos: u64,
}

/// Video codec information
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoInfo {
    pub codec: String,
    pub width: u16,
    pub height: u16,
    pub fps: f32,
    pub aspect: String,
}

/// Audio codec information
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioInfo {
    pub codec: String,
    pub sample_rate: Option<u32>,
    pub channels: Option<u8>,
}

/// Codec information for different stream types
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CodecInfo {
    Video(VideoInfo),
    Audio(AudioInfo),
}

/// Per-track inspection results (public API)
#[derive(Debug, Clone, Serialize)]
pub struct StreamInfo {
    pub stream_id: u8,
    pub kind: TrackKind,
    pub media_type: MediaType,
    pub frames: u64,
    pub key_frames: u64,
    pub bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_pts: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_pts: Option<i64>,
    pub duration_secs: f64,
    pub bitrate_kbps: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec: Option<CodecInfo>,
}

/// Complete inspection report
#[derive(Debug, Clone, Serialize)]
pub struct InspectorReport {
    pub timestamp: String,
    pub source: String,
    pub probe_score: u32,
    pub tracks: Vec<StreamInfo>,
}

/// Configuration options for the inspector
#[derive(Debug, Clone)]
pub struct Options {
    pub path: PathBuf,
    /// Frames to read per track, `None` drains the file
    pub max_frames: Option<u64>,
    /// Leading bytes fed to the format probe
    pub probe_bytes: u64,
    pub seek: Option<u64>,
    pub ignore: Vec<u8>,
}
