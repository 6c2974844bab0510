//! Report generation for program stream inspection results

use crate::stats::StatsManager;
use crate::types::{InspectorReport, StreamInfo, TrackInfo};

/// Report generator for program stream inspection results
pub struct Reporter;

impl Reporter {
    /// Generate a structured InspectorReport for API consumers
    pub fn create_report(source: &str, probe_score: u32, tracks: &[TrackInfo], stats: &StatsManager) -> InspectorReport {
        let tracks = tracks
            .iter()
            .map(|t| {
                let s = stats.get(t.stream_id);
                StreamInfo {
                    stream_id: t.stream_id,
                    kind: t.kind,
                    media_type: t.media_type,
                    frames: s.map_or(0, |s| s.frames),
                    key_frames: s.map_or(0, |s| s.key_frames),
                    bytes: s.map_or(0, |s| s.bytes),
                    first_pts: s.and_then(|s| s.first_pts),
                    last_pts: s.and_then(|s| s.last_pts),
                    duration_secs: s.map_or(0.0, |s| s.duration_secs()),
                    bitrate_kbps: s.map_or(0.0, |s| s.bitrate_kbps()),
                    codec: s.and_then(|s| s.codec.clone()),
                }
            })
            .collect();

        InspectorReport {
            timestamp: chrono::Utc::now().to_rfc3339(),
            source: source.to_string(),
            probe_score,
            tracks,
        }
    }

    /// Generate pretty-printed JSON string for CLI output
    pub fn generate_json_report(report: &InspectorReport) -> String {
        serde_json::to_string_pretty(report).unwrap_or_else(|_| "{\"error\": \"JSON serialization failed\"}".to_string())
    }
}
