//! Statistics gathered per stream while draining frames

use std::collections::HashMap;

use crate::constants::PTS_CLOCK_HZ;
use crate::types::{CodecInfo, Frame};

/// Internal per-stream statistics
#[derive(Debug, Default)]
pub struct TrackStats {
    pub frames: u64,
    pub key_frames: u64,
    pub bytes: u64,
    pub first_pts: Option<i64>,
    pub last_pts: Option<i64>,
    pub codec: Option<CodecInfo>,
}

impl TrackStats {
    /// Span between the first and last PTS, in seconds
    pub fn duration_secs(&self) -> f64 {
        match (self.first_pts, self.last_pts) {
            (Some(first), Some(last)) if last > first => (last - first) as f64 / f64::from(PTS_CLOCK_HZ),
            _ => 0.0,
        }
    }

    pub fn bitrate_kbps(&self) -> f64 {
        let secs = self.duration_secs();
        if secs > 0.0 {
            (self.bytes as f64 * 8.0 / 1000.0) / secs
        } else {
            0.0
        }
    }
}

/// Manages per-stream statistics keyed by stream id
#[derive(Debug, Default)]
pub struct StatsManager {
    stats: HashMap<u8, TrackStats>,
}

impl StatsManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a stream; existing stats are kept
    pub fn add_stream(&mut self, stream_id: u8) {
        self.stats.entry(stream_id).or_default();
    }

    pub fn record_frame(&mut self, frame: &Frame) {
        let stats = self.stats.entry(frame.stream_id).or_default();
        stats.frames += 1;
        stats.bytes += frame.data.len() as u64;
        if frame.key_frame {
            stats.key_frames += 1;
        }
        if let Some(pts) = frame.pts {
            stats.first_pts = Some(stats.first_pts.map_or(pts, |p| p.min(pts)));
            stats.last_pts = Some(stats.last_pts.map_or(pts, |p| p.max(pts)));
        }
    }

    pub fn set_codec(&mut self, stream_id: u8, codec: CodecInfo) {
        if let Some(stats) = self.stats.get_mut(&stream_id) {
            stats.codec = Some(codec);
        }
    }

    pub fn has_codec(&self, stream_id: u8) -> bool {
        self.stats.get(&stream_id).is_some_and(|s| s.codec.is_some())
    }

    pub fn get(&self, stream_id: u8) -> Option<&TrackStats> {
        self.stats.get(&stream_id)
    }

    pub fn contains(&self, stream_id: u8) -> bool {
        self.stats.contains_key(&stream_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn frame(stream_id: u8, len: usize, pts: Option<i64>, key_frame: bool) -> Frame {
        Frame {
            data: Bytes::from(vec![0u8; len]),
            pts,
            dts: None,
            timescale: PTS_CLOCK_HZ,
            duration: 0,
            frame_no: 0,
            key_frame,
            stream_id,
            pos: 0,
        }
    }

    #[test]
    fn test_duration_and_bitrate_from_pts() {
        let mut mgr = StatsManager::new();
        mgr.add_stream(0xC0);
        mgr.record_frame(&frame(0xC0, 500, Some(90_000), true));
        mgr.record_frame(&frame(0xC0, 500, Some(180_000), true));
        mgr.record_frame(&frame(0xC0, 250, None, false));

        let stats = mgr.get(0xC0).unwrap();
        assert_eq!(stats.frames, 3);
        assert_eq!(stats.key_frames, 2);
        assert_eq!(stats.bytes, 1250);
        assert_eq!(stats.duration_secs(), 1.0);
        assert_eq!(stats.bitrate_kbps(), 10.0);
    }

    #[test]
    fn test_no_pts_means_zero_duration() {
        let mut mgr = StatsManager::new();
        mgr.record_frame(&frame(0xE0, 100, None, true));
        let stats = mgr.get(0xE0).unwrap();
        assert_eq!(stats.duration_secs(), 0.0);
        assert_eq!(stats.bitrate_kbps(), 0.0);
        assert!(mgr.contains(0xE0));
        assert!(!mgr.has_codec(0xE0));
    }
}
