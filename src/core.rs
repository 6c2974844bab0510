use std::collections::HashSet;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

use anyhow::Context;
use bytes::BytesMut;
use tracing::{debug, info, warn};

use crate::demuxer::PsDemuxer;
use crate::error::DemuxError;
use crate::parsers::{parse_audio_codec, parse_video_codec};
use crate::probe::probe;
use crate::report::Reporter;
use crate::stats::StatsManager;
use crate::types::{CodecInfo, Frame, InspectorReport, MediaType, Options};

pub fn run(opts: Options) -> anyhow::Result<InspectorReport> {
    let source = opts.path.display().to_string();
    let mut file = File::open(&opts.path).with_context(|| format!("opening {source}"))?;

    let mut head = Vec::new();
    (&mut file).take(opts.probe_bytes).read_to_end(&mut head)?;
    let probe_score = probe(&head);
    info!(source = %source, probe_score, "probed input");
    file.seek(SeekFrom::Start(0))?;

    let mut demuxer = PsDemuxer::new(file)?;
    if let Some(offset) = opts.seek {
        demuxer.seek(offset)?;
    }

    let stats = drain(&mut demuxer, &opts)?;
    let report = Reporter::create_report(&source, probe_score, &demuxer.tracks(), &stats);
    info!(tracks = report.tracks.len(), "inspection finished");
    Ok(report)
}

/// Reads every track round-robin until each one is exhausted or hits the frame limit
fn drain<R: Read + Seek>(demuxer: &mut PsDemuxer<R>, opts: &Options) -> anyhow::Result<StatsManager> {
    let ignore: HashSet<u8> = opts.ignore.iter().copied().collect();
    let mut stats = StatsManager::new();
    let mut finished = HashSet::new();
    let mut scratch = BytesMut::new();

    loop {
        // tracks can appear while other tracks are being read
        let mut active = Vec::new();
        for info in demuxer.tracks() {
            if !stats.contains(info.stream_id) {
                stats.add_stream(info.stream_id);
                if ignore.contains(&info.stream_id) {
                    debug!(stream_id = info.stream_id, "ignoring track");
                    demuxer.track(info.stream_id)?.ignore();
                    continue;
                }
            }
            if !info.ignored && !finished.contains(&info.stream_id) {
                active.push(info.stream_id);
            }
        }
        if active.is_empty() {
            break;
        }

        for stream_id in active {
            let mut track = demuxer.track(stream_id)?;
            let frames = stats.get(stream_id).map_or(0, |s| s.frames);
            if opts.max_frames.is_some_and(|max| frames >= max) {
                debug!(stream_id, frames, "frame limit reached");
                track.ignore();
                finished.insert(stream_id);
                continue;
            }

            match track.next_frame(&mut scratch) {
                Ok(Some(frame)) => record(&mut stats, &frame),
                Ok(None) => {
                    finished.insert(stream_id);
                }
                Err(DemuxError::Parser(msg)) => {
                    warn!(stream_id, %msg, "frame parser failed, dropping track");
                    track.ignore();
                    finished.insert(stream_id);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    Ok(stats)
}

fn record(stats: &mut StatsManager, frame: &Frame) {
    stats.record_frame(frame);
    if stats.has_codec(frame.stream_id) {
        return;
    }
    let codec = match MediaType::from_stream_id(frame.stream_id) {
        MediaType::Video => parse_video_codec(&frame.data).map(CodecInfo::Video),
        MediaType::Audio => parse_audio_codec(frame.stream_id, &frame.data).map(CodecInfo::Audio),
        MediaType::Other => None,
    };
    if let Some(codec) = codec {
        debug!(stream_id = frame.stream_id, ?codec, "codec detected");
        stats.set_codec(frame.stream_id, codec);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};
    use std::path::PathBuf;

    /// Serves `data` until `fail_at`, then fails every read
    struct FailingReader {
        inner: Cursor<Vec<u8>>,
        fail_at: u64,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let left = self.fail_at.saturating_sub(self.inner.position());
            if left == 0 {
                return Err(io::Error::other("device removed"));
            }
            let n = buf.len().min(left as usize);
            self.inner.read(&mut buf[..n])
        }
    }

    impl Seek for FailingReader {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            self.inner.seek(pos)
        }
    }

    fn pes(stream_id: u8, payload: u8) -> Vec<u8> {
        vec![0x00, 0x00, 0x01, stream_id, 0x00, 0x04, 0x80, 0x00, 0x00, payload]
    }

    fn interleaved(packets: usize) -> Vec<u8> {
        (0..packets).flat_map(|i| [pes(0xC0, i as u8 | 0x80), pes(0xC1, i as u8 | 0x80)]).flatten().collect()
    }

    fn options(max_frames: Option<u64>) -> Options {
        Options {
            path: PathBuf::from("in.mpg"),
            max_frames,
            probe_bytes: 0,
            seek: None,
            ignore: Vec::new(),
        }
    }

    #[test]
    fn test_channel_failure_is_fatal() {
        let reader = FailingReader {
            inner: Cursor::new(interleaved(20)),
            fail_at: 144,
        };
        let mut demuxer = PsDemuxer::new(reader).unwrap();

        let err = drain(&mut demuxer, &options(None)).unwrap_err();
        match err.downcast_ref::<DemuxError>() {
            Some(DemuxError::Io(e)) => assert_eq!(e.to_string(), "device removed"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_zero_frame_limit_reads_nothing() {
        let mut demuxer = PsDemuxer::new(Cursor::new(interleaved(4))).unwrap();
        let stats = drain(&mut demuxer, &options(Some(0))).unwrap();
        assert_eq!(stats.get(0xC0).map(|s| s.frames), Some(0));
        assert_eq!(stats.get(0xC1).map(|s| s.frames), Some(0));
        assert!(demuxer.tracks().iter().all(|t| t.ignored));
    }

    #[test]
    fn test_frame_limit_per_track() {
        let mut demuxer = PsDemuxer::new(Cursor::new(interleaved(6))).unwrap();
        let stats = drain(&mut demuxer, &options(Some(2))).unwrap();
        assert_eq!(stats.get(0xC0).map(|s| s.frames), Some(2));
        assert_eq!(stats.get(0xC1).map(|s| s.frames), Some(2));
    }
}
