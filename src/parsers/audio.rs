//! Audio codec parsers

use bitstream_io::{BitRead, BitReader, BigEndian};

use crate::types::AudioInfo;

/// Parse the first MPEG audio (Layer I/II/III) frame header in the payload
pub fn parse_mpeg_audio(data: &[u8]) -> Option<AudioInfo> {
    for i in 0..data.len().saturating_sub(3) {
        if data[i] != 0xFF || (data[i + 1] & 0xE0) != 0xE0 {
            continue;
        }
        let header = &data[i..i + 4];
        let version = (header[1] >> 3) & 0x03;
        let layer = (header[1] >> 1) & 0x03;
        let sample_rate_index = (header[2] >> 2) & 0x03;
        let channel_mode = (header[3] >> 6) & 0x03;

        let codec = match layer {
            0x03 => "MP1",
            0x02 => "MP2",
            0x01 => "MP3",
            _ => continue,
        };

        let sample_rate = match (version, sample_rate_index) {
            (0x03, 0x00) => 44100,
            (0x03, 0x01) => 48000,
            (0x03, 0x02) => 32000,
            (0x02, 0x00) => 22050,
            (0x02, 0x01) => 24000,
            (0x02, 0x02) => 16000,
            (0x00, 0x00) => 11025,
            (0x00, 0x01) => 12000,
            (0x00, 0x02) => 8000,
            _ => continue,
        };

        let channels = if channel_mode == 0x03 { 1 } else { 2 };

        return Some(AudioInfo {
            codec: codec.to_string(),
            sample_rate: Some(sample_rate),
            channels: Some(channels),
        });
    }
    None
}

/// Parse the first AC-3 sync frame header (private stream 1 audio)
pub fn parse_ac3(data: &[u8]) -> Option<AudioInfo> {
    for i in 0..data.len().saturating_sub(6) {
        if data[i] != 0x0B || data[i + 1] != 0x77 {
            continue;
        }
        let fscod = (data[i + 4] >> 6) & 0x03;
        let sample_rate = match fscod {
            0x00 => 48000,
            0x01 => 44100,
            0x02 => 32000,
            _ => continue,
        };

        // bsi after bsid/bsmod: acmod, optional mix levels, lfeon
        let mut br = BitReader::endian(&data[i + 6..], BigEndian);
        let acmod = br.read::<3, u8>().ok()?;
        if acmod & 0x01 != 0 && acmod != 0x01 {
            br.skip(2).ok()?; // cmixlev
        }
        if acmod & 0x04 != 0 {
            br.skip(2).ok()?; // surmixlev
        }
        if acmod == 0x02 {
            br.skip(2).ok()?; // dsurmod
        }
        let lfe = br.read::<1, u8>().ok()? == 1;

        let channels: u8 = match acmod {
            0x00 => 2, // 1+1
            0x01 => 1,
            0x02 => 2,
            0x03 | 0x04 => 3,
            0x05 | 0x06 => 4,
            _ => 5,
        };

        return Some(AudioInfo {
            codec: "AC-3".to_string(),
            sample_rate: Some(sample_rate),
            channels: Some(channels + u8::from(lfe)),
        });
    }
    None
}
