//! MPEG-1/2 video header parsers

use bitstream_io::{BitRead, BitReader, BigEndian};

use crate::constants::{EXTENSION_START, SEQUENCE_HEADER};
use crate::types::VideoInfo;

/// picture_coding_type from the picture header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PictureCodingType {
    Intra,
    Predicted,
    Bidirectional,
    DcIntra,
    Reserved(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PictureHeader {
    pub temporal_reference: u16,
    pub coding_type: PictureCodingType,
}

/// Parses the bytes following a picture start code (0x00000100)
pub fn parse_picture_header(data: &[u8]) -> Option<PictureHeader> {
    let mut br = BitReader::endian(data, BigEndian);
    let temporal_reference = br.read::<10, u16>().ok()?;
    let coding_type = match br.read::<3, u8>().ok()? {
        1 => PictureCodingType::Intra,
        2 => PictureCodingType::Predicted,
        3 => PictureCodingType::Bidirectional,
        4 => PictureCodingType::DcIntra,
        other => PictureCodingType::Reserved(other),
    };
    Some(PictureHeader {
        temporal_reference,
        coding_type,
    })
}

/// Finds the first sequence header (0x000001B3) and returns the video parameters
pub fn parse_sequence_header(data: &[u8]) -> Option<VideoInfo> {
    for i in 0..data.len().saturating_sub(8) {
        if data[i] == 0x00 && data[i + 1] == 0x00 && data[i + 2] == 0x01 && data[i + 3] == SEQUENCE_HEADER {
            let seq_hdr = &data[i + 4..];
            let mut br = BitReader::endian(seq_hdr, BigEndian);
            let width = br.read::<12, u16>().ok()?;
            let height = br.read::<12, u16>().ok()?;
            let aspect_ratio_info = br.read::<4, u8>().ok()?;
            let frame_rate_code = br.read::<4, u8>().ok()?;

            let fps = match frame_rate_code {
                1 => 23.976,
                2 => 24.0,
                3 => 25.0,
                4 => 29.97,
                5 => 30.0,
                6 => 50.0,
                7 => 59.94,
                8 => 60.0,
                _ => 0.0,
            };

            let aspect = match aspect_ratio_info {
                1 => "1:1",
                2 => "4:3",
                3 => "16:9",
                4 => "2.21:1",
                _ => "?",
            };

            // MPEG-2 carries a sequence extension (extension id 1) right after the header
            let codec = if has_sequence_extension(&seq_hdr[4..]) { "MPEG-2" } else { "MPEG-1" };

            return Some(VideoInfo {
                codec: codec.to_string(),
                width,
                height,
                fps,
                aspect: aspect.to_string(),
            });
        }
    }
    None
}

fn has_sequence_extension(data: &[u8]) -> bool {
    data.windows(5)
        .find(|w| w[0] == 0x00 && w[1] == 0x00 && w[2] == 0x01)
        .is_some_and(|w| w[3] == EXTENSION_START && w[4] >> 4 == 1)
}
