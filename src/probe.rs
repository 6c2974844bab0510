//! Start-code statistics used to recognise MPEG-1/2 video without any
//! out-of-band metadata. Both heuristics stop scoring at the first syntax
//! violation and never fail on garbage input.

use crate::constants::*;

#[derive(Default)]
struct VideoSyntaxScore {
    score: u32,
    has_header: bool,
    slices_started: bool,
}

impl VideoSyntaxScore {
    /// Feeds one start-code discriminant; false once the syntax is broken
    fn feed(&mut self, code: u8) -> bool {
        match code {
            0xB0..=GROUP_START => {
                if (self.has_header && code != EXTENSION_START && code != USER_DATA) || self.slices_started {
                    return false;
                }
                self.score += SEQUENCE_CODE_SCORE;
            }
            PICTURE_START => {
                if self.slices_started {
                    return false;
                }
                self.has_header = true;
            }
            SLICE_MIN..=SLICE_MAX => {
                if !self.has_header {
                    return false;
                }
                if !self.slices_started {
                    self.score += FIRST_SLICE_SCORE;
                    self.slices_started = true;
                }
                self.score += SLICE_SCORE;
            }
            _ => {}
        }
        true
    }
}

/// Discriminant bytes of every `00 00 01 xx` start code in `data`
fn start_codes(data: &[u8]) -> impl Iterator<Item = u8> + '_ {
    data.windows(4)
        .filter(|w| w[0] == 0x00 && w[1] == 0x00 && w[2] == 0x01)
        .map(|w| w[3])
}

/// Scores a PES payload for MPEG elementary video syntax
pub fn elementary_score(payload: &[u8]) -> u32 {
    let mut scorer = VideoSyntaxScore::default();
    for code in start_codes(payload) {
        if !scorer.feed(code) {
            break;
        }
    }
    scorer.score
}

/// Track-kind decision for a newly discovered stream
pub fn is_elementary_video(payload: &[u8]) -> bool {
    elementary_score(payload) > ELEMENTARY_SCORE_THRESHOLD
}

/// Scores a raw buffer as an MPEG program stream.
///
/// Scoring only starts inside the first video PES; a second video PES marker
/// ends the probe. The raw score is returned so callers can rank it against
/// other format probes.
pub fn probe(data: &[u8]) -> u32 {
    let mut scorer = VideoSyntaxScore::default();
    let mut in_video_pes = false;
    for code in start_codes(data) {
        if is_video_stream(code) {
            if in_video_pes {
                break;
            }
            in_video_pes = true;
            continue;
        }
        if !in_video_pes && !(SLICE_MIN..=SLICE_MAX).contains(&code) {
            continue;
        }
        if !scorer.feed(code) {
            break;
        }
    }
    scorer.score
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(list: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        for &c in list {
            out.extend_from_slice(&[0x00, 0x00, 0x01, c, 0x5A, 0x5A]);
        }
        out
    }

    #[test]
    fn test_sequence_picture_and_slices_classify_as_video() {
        let data = codes(&[SEQUENCE_HEADER, PICTURE_START, 0x01, 0x02, 0x03]);
        let score = elementary_score(&data);
        assert_eq!(score, SEQUENCE_CODE_SCORE + FIRST_SLICE_SCORE + 3 * SLICE_SCORE);
        assert!(score >= 53);
        assert!(is_elementary_video(&data));
    }

    #[test]
    fn test_without_slices_scores_below_threshold() {
        let data = codes(&[SEQUENCE_HEADER, PICTURE_START]);
        assert!(elementary_score(&data) < 50);
        assert!(!is_elementary_video(&data));
    }

    #[test]
    fn test_slice_before_header_breaks() {
        let data = codes(&[0x01, SEQUENCE_HEADER, PICTURE_START, 0x01]);
        assert_eq!(elementary_score(&data), 0);
    }

    #[test]
    fn test_sequence_code_after_slices_breaks() {
        let data = codes(&[SEQUENCE_HEADER, PICTURE_START, 0x01, SEQUENCE_HEADER, 0x02]);
        assert_eq!(elementary_score(&data), 5 + 50 + 1);
    }

    #[test]
    fn test_extension_and_user_data_after_picture_are_allowed() {
        let data = codes(&[SEQUENCE_HEADER, PICTURE_START, EXTENSION_START, USER_DATA, 0x01]);
        assert_eq!(elementary_score(&data), 5 + 5 + 5 + 50 + 1);
    }

    #[test]
    fn test_garbage_scores_zero() {
        let data: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        assert_eq!(elementary_score(&data), 0);
        assert_eq!(probe(&data), 0);
        assert_eq!(elementary_score(&[]), 0);
    }

    #[test]
    fn test_probe_gated_on_video_pes() {
        let mut data = codes(&[0xBA, SEQUENCE_HEADER, PICTURE_START]);
        data.extend(codes(&[0xE0, SEQUENCE_HEADER, PICTURE_START, 0x01, 0x02]));
        assert_eq!(probe(&data), 5 + 50 + 2);
    }

    #[test]
    fn test_probe_stops_at_second_video_pes() {
        let data = codes(&[0xE0, SEQUENCE_HEADER, 0xE0, PICTURE_START, 0x01]);
        assert_eq!(probe(&data), 5);
    }
}
