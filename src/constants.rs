//! Constants for MPEG-PS demultiplexing

/// Start code prefix shared by every marker
pub const START_CODE_PREFIX: u32 = 0x00_0001;

/// Pack header start code, skipped by the scanner
pub const PACK_HEADER_CODE: u32 = 0x0000_01BA;

/// Stream ids carried in the marker's discriminant byte
pub const SYSTEM_HEADER_STREAM: u8 = 0xBB;
pub const PROGRAM_STREAM_MAP: u8 = 0xBC;
pub const PRIVATE_STREAM_1: u8 = 0xBD;
pub const PADDING_STREAM: u8 = 0xBE;
pub const PRIVATE_STREAM_2: u8 = 0xBF;
pub const AUDIO_STREAM_MIN: u8 = 0xC0;
pub const AUDIO_STREAM_MAX: u8 = 0xDF;
pub const VIDEO_STREAM_MIN: u8 = 0xE0;
pub const VIDEO_STREAM_MAX: u8 = 0xEF;

/// Fixed part of a PES header: prefix, stream id, 16-bit length
pub const PES_PREFIX_LEN: usize = 6;

/// PTS/DTS clock
pub const PTS_CLOCK_HZ: u32 = 90_000;

/// MPEG-1/2 video start codes (discriminant byte)
pub const PICTURE_START: u8 = 0x00;
pub const SLICE_MIN: u8 = 0x01;
pub const SLICE_MAX: u8 = 0xAF;
pub const USER_DATA: u8 = 0xB2;
pub const SEQUENCE_HEADER: u8 = 0xB3;
pub const EXTENSION_START: u8 = 0xB5;
pub const SEQUENCE_END: u8 = 0xB7;
pub const GROUP_START: u8 = 0xB8;

/// Classifier scoring. Empirical values, only meaningful for MPEG-1/2 video syntax.
pub const SEQUENCE_CODE_SCORE: u32 = 5;
pub const FIRST_SLICE_SCORE: u32 = 50;
pub const SLICE_SCORE: u32 = 1;
pub const ELEMENTARY_SCORE_THRESHOLD: u32 = 50;

/// Demuxer defaults
pub const DEFAULT_BUFFER_SIZE: usize = 0x10_0000; // 1 MiB, one scan unit
pub const DEFAULT_FETCH_SIZE: usize = 0x1_0000;
pub const DISCOVERY_MIN_STREAMS: usize = 2;
pub const DISCOVERY_PACKETS_PER_STREAM: usize = 5;

/// True for any `0x000001xx` window
pub fn is_start_code(marker: u32) -> bool {
    marker >> 8 == START_CODE_PREFIX
}

/// Markers that open a PES packet the demuxer captures (private 1 .. video max)
pub fn is_pes_marker(marker: u32) -> bool {
    is_start_code(marker) && (PRIVATE_STREAM_1..=VIDEO_STREAM_MAX).contains(&(marker as u8))
}

pub fn is_video_stream(stream_id: u8) -> bool {
    (VIDEO_STREAM_MIN..=VIDEO_STREAM_MAX).contains(&stream_id)
}

/// MPEG audio range plus both private streams
pub fn is_audio_stream(stream_id: u8) -> bool {
    (AUDIO_STREAM_MIN..=AUDIO_STREAM_MAX).contains(&stream_id)
        || stream_id == PRIVATE_STREAM_1
        || stream_id == PRIVATE_STREAM_2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_ranges() {
        assert!(is_start_code(PACK_HEADER_CODE));
        assert!(!is_pes_marker(PACK_HEADER_CODE));
        assert!(!is_pes_marker(0x0000_01B3));
        assert!(!is_pes_marker(START_CODE_PREFIX << 8 | u32::from(SYSTEM_HEADER_STREAM)));
        assert!(!is_pes_marker(START_CODE_PREFIX << 8 | u32::from(PROGRAM_STREAM_MAP)));
        assert!(is_pes_marker(0x0000_01BD));
        assert!(is_pes_marker(0x0000_01EF));
        assert!(!is_pes_marker(0x0001_01E0));
        assert!(is_audio_stream(PRIVATE_STREAM_2));
        assert!(!is_audio_stream(PADDING_STREAM));
    }
}
