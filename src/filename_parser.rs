//! Turns a recording's file name into [`RecordingMetadata`].
//!
//! Two naming generations are understood:
//!
//! - `yyyy-MM-dd_HH-mm-ss_<number>.ext` (flat storage, number in the name)
//! - `call_yyyy-MM-dd_HH-mm-ss.ext` inside a folder named after the number
//!
//! Parsing never fails. Anything that cannot be read keeps the fallback
//! timestamp, an empty number and the outgoing direction.

use crate::models::{Direction, RecordingMetadata};
use chrono::{NaiveDateTime, Timelike};
use std::path::Path;

const SEPARATOR: char = '_';
const LEGACY_PREFIX: &str = "call";
const INCOMING_MARKER: &str = "_in_";
const DATE_TIME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";
const MIN_TOKENS: usize = 3;

pub fn parse_recording_name<P: AsRef<Path>>(path: P, fallback: NaiveDateTime) -> RecordingMetadata {
    let path = path.as_ref();
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return RecordingMetadata::fallback(fallback);
    };

    let tokens: Vec<&str> = stem.split(SEPARATOR).collect();
    let mut metadata = RecordingMetadata::fallback(fallback);

    if tokens.len() >= MIN_TOKENS {
        if tokens[0].eq_ignore_ascii_case(LEGACY_PREFIX) {
            if let Some(ts) = parse_timestamp(tokens[1], tokens[2]) {
                metadata.timestamp = ts;
            }
            // Legacy recordings are grouped in one folder per number
            metadata.phone_number = parent_folder_name(path).unwrap_or_default();
        } else {
            if let Some(ts) = parse_timestamp(tokens[0], tokens[1]) {
                metadata.timestamp = ts;
            }
            metadata.phone_number = tokens[2..].join("_");
        }
    }

    if stem.contains(INCOMING_MARKER) {
        metadata.direction = Direction::Incoming;
    }

    metadata
}

/// Strict `yyyy-MM-dd` + `HH-mm-ss`. Out-of-range values yield `None`.
fn parse_timestamp(date: &str, time: &str) -> Option<NaiveDateTime> {
    if !has_shape(date, "dddd-dd-dd") || !has_shape(time, "dd-dd-dd") {
        return None;
    }
    NaiveDateTime::parse_from_str(&format!("{}_{}", date, time), DATE_TIME_FORMAT)
        .ok()
        // chrono reads second 60 as a leap second; wall-clock names never carry one
        .filter(|ts| ts.nanosecond() < 1_000_000_000)
}

/// `d` in `pattern` matches an ASCII digit, anything else matches itself.
fn has_shape(value: &str, pattern: &str) -> bool {
    value.len() == pattern.len()
        && value.bytes().zip(pattern.bytes()).all(|(v, p)| match p {
            b'd' => v.is_ascii_digit(),
            _ => v == p,
        })
}

fn parent_folder_name(path: &Path) -> Option<String> {
    path.parent()?
        .file_name()?
        .to_str()
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn fallback() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap()
    }

    fn march_15() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap()
    }

    #[test]
    fn new_form_outgoing() {
        let m = parse_recording_name("/rec/2024-03-15_14-30-00_+33612345678.mp3", fallback());
        assert_eq!(m.timestamp, march_15());
        assert_eq!(m.phone_number, "+33612345678");
        assert_eq!(m.direction, Direction::Outgoing);
    }

    #[test]
    fn legacy_form_takes_number_from_folder() {
        let m = parse_recording_name("/rec/+33612345678/call_2024-03-15_14-30-00.wav", fallback());
        assert_eq!(m.timestamp, march_15());
        assert_eq!(m.phone_number, "+33612345678");
        assert_eq!(m.direction, Direction::Outgoing);
    }

    #[test]
    fn legacy_prefix_is_case_insensitive() {
        let m = parse_recording_name("/rec/0612/CALL_2024-03-15_14-30-00.wav", fallback());
        assert_eq!(m.timestamp, march_15());
        assert_eq!(m.phone_number, "0612");
    }

    #[test]
    fn incoming_marker_sets_direction() {
        let m = parse_recording_name("/rec/2024-03-15_14-30-00_in_+33612345678.mp3", fallback());
        assert_eq!(m.direction, Direction::Incoming);
        assert_eq!(m.timestamp, march_15());
        // Everything after the time token is the number, marker included
        assert_eq!(m.phone_number, "in_+33612345678");
    }

    #[test]
    fn incoming_marker_is_case_sensitive() {
        let m = parse_recording_name("/rec/2024-03-15_14-30-00_IN_0612.mp3", fallback());
        assert_eq!(m.direction, Direction::Outgoing);
    }

    #[test]
    fn too_few_tokens_falls_back_entirely() {
        let m = parse_recording_name("/rec/recording.mp3", fallback());
        assert_eq!(m, RecordingMetadata::fallback(fallback()));

        let m = parse_recording_name("/rec/2024-03-15_14-30-00.mp3", fallback());
        assert_eq!(m, RecordingMetadata::fallback(fallback()));
    }

    #[test]
    fn invalid_date_still_extracts_number() {
        let m = parse_recording_name("/rec/2024-99-99_14-30-00_+33612345678.mp3", fallback());
        assert_eq!(m.timestamp, fallback());
        assert_eq!(m.phone_number, "+33612345678");

        let m = parse_recording_name("/rec/2024-13-40_99-99-99_0612.mp3", fallback());
        assert_eq!(m.timestamp, fallback());
        assert_eq!(m.phone_number, "0612");
    }

    #[test]
    fn second_sixty_is_rejected() {
        let m = parse_recording_name("/rec/2024-03-15_14-30-60_0612.mp3", fallback());
        assert_eq!(m.timestamp, fallback());
        assert_eq!(m.phone_number, "0612");

        let m = parse_recording_name("/rec/2024-03-15_14-30-59_0612.mp3", fallback());
        assert_eq!(m.timestamp, march_15() + chrono::TimeDelta::seconds(59));
    }

    #[test]
    fn non_padded_fields_are_rejected() {
        let m = parse_recording_name("/rec/2024-3-15_14-30-00_0612.mp3", fallback());
        assert_eq!(m.timestamp, fallback());
        let m = parse_recording_name("/rec/2024-03-15_14:30:00_0612.mp3", fallback());
        assert_eq!(m.timestamp, fallback());
    }

    #[test]
    fn number_keeps_inner_separators() {
        let m = parse_recording_name("/rec/2024-03-15_14-30-00_0612_ext_42.mp3", fallback());
        assert_eq!(m.phone_number, "0612_ext_42");
    }

    #[test]
    fn empty_number_token_is_preserved() {
        let m = parse_recording_name("/rec/2024-03-15_14-30-00_.mp3", fallback());
        assert_eq!(m.timestamp, march_15());
        assert_eq!(m.phone_number, "");
    }

    #[test]
    fn legacy_without_parent_has_empty_number() {
        let m = parse_recording_name("call_2024-03-15_14-30-00.wav", fallback());
        assert_eq!(m.timestamp, march_15());
        assert_eq!(m.phone_number, "");
    }

    #[test]
    fn only_last_extension_is_stripped() {
        let m = parse_recording_name("/rec/2024-03-15_14-30-00_0612.part.mp3", fallback());
        assert_eq!(m.phone_number, "0612.part");
    }
}
