//! Codec header parsers for the elementary streams carried in a program stream

mod audio;
mod video;

pub use audio::{parse_ac3, parse_mpeg_audio};
pub use video::{parse_picture_header, parse_sequence_header, PictureCodingType, PictureHeader};

use crate::constants::{AUDIO_STREAM_MAX, AUDIO_STREAM_MIN, PRIVATE_STREAM_1};
use crate::types::{AudioInfo, VideoInfo};

/// Parse video codec parameters from an access unit
pub fn parse_video_codec(data: &[u8]) -> Option<VideoInfo> {
    parse_sequence_header(data)
}

/// Parse audio codec parameters, picking the syntax from the stream id
pub fn parse_audio_codec(stream_id: u8, data: &[u8]) -> Option<AudioInfo> {
    match stream_id {
        AUDIO_STREAM_MIN..=AUDIO_STREAM_MAX => parse_mpeg_audio(data),
        PRIVATE_STREAM_1 => parse_ac3(data),
        _ => None,
    }
}
