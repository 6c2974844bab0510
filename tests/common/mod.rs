//! Program stream builders shared by the integration tests
#![allow(dead_code)]

use std::io::Cursor;

use mpegps_inspector::{DemuxerConfig, PsDemuxer};

/// MPEG-2 pack header with a zero SCR and no stuffing
pub fn pack_header() -> Vec<u8> {
    vec![0x00, 0x00, 0x01, 0xBA, 0x44, 0x00, 0x04, 0x00, 0x04, 0x01, 0x01, 0x89, 0xC3, 0xF8]
}

/// 5-byte PTS field with the '0010' prefix
pub fn pts_field(pts: i64) -> [u8; 5] {
    let pts = pts as u64;
    [
        0x21 | ((pts >> 29) & 0x0E) as u8,
        (pts >> 22) as u8,
        ((pts >> 14) as u8 & 0xFE) | 0x01,
        (pts >> 7) as u8,
        ((pts << 1) as u8 & 0xFE) | 0x01,
    ]
}

fn pes_with_length(stream_id: u8, pts: Option<i64>, payload: &[u8], unbounded: bool) -> Vec<u8> {
    let mut ext = vec![0x80];
    match pts {
        Some(pts) => {
            ext.extend_from_slice(&[0x80, 0x05]);
            ext.extend_from_slice(&pts_field(pts));
        }
        None => ext.extend_from_slice(&[0x00, 0x00]),
    }
    let length = if unbounded { 0 } else { (ext.len() + payload.len()) as u16 };

    let mut out = vec![0x00, 0x00, 0x01, stream_id];
    out.extend_from_slice(&length.to_be_bytes());
    out.extend_from_slice(&ext);
    out.extend_from_slice(payload);
    out
}

/// MPEG-2 PES packet with a declared length
pub fn pes(stream_id: u8, pts: Option<i64>, payload: &[u8]) -> Vec<u8> {
    pes_with_length(stream_id, pts, payload, false)
}

/// MPEG-2 PES packet with a zero length field
pub fn pes_unbounded(stream_id: u8, pts: Option<i64>, payload: &[u8]) -> Vec<u8> {
    pes_with_length(stream_id, pts, payload, true)
}

/// Sequence header, I picture and two slices
pub fn intra_picture() -> Vec<u8> {
    vec![
        0x00, 0x00, 0x01, 0xB3, 0x16, 0x00, 0xF0, 0x13, // 352x240, 25 fps
        0x00, 0x00, 0x01, 0x00, 0x00, 0x0F, 0xFF, 0xF8, // I picture
        0x00, 0x00, 0x01, 0x01, 0x12, 0x34,
        0x00, 0x00, 0x01, 0x02, 0x56, 0x78,
    ]
}

/// P picture and one slice
pub fn predicted_picture() -> Vec<u8> {
    vec![
        0x00, 0x00, 0x01, 0x00, 0x00, 0x50, 0x00, 0x00, // P picture
        0x00, 0x00, 0x01, 0x01, 0x9A,
    ]
}

pub fn demuxer(data: Vec<u8>) -> PsDemuxer<Cursor<Vec<u8>>> {
    PsDemuxer::new(Cursor::new(data)).unwrap()
}

pub fn demuxer_with(data: Vec<u8>, config: DemuxerConfig) -> PsDemuxer<Cursor<Vec<u8>>> {
    PsDemuxer::with_config(Cursor::new(data), config).unwrap()
}

pub fn concat(parts: &[Vec<u8>]) -> Vec<u8> {
    parts.concat()
}
