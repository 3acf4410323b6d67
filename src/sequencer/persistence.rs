// Melody persistence - JSON text format for recorded sequences
//
// A melody file is a bare JSON array, no header and no version field:
//
//   [
//     { "note": "C4", "time": 0 },
//     { "note": "E4", "time": 412.5 }
//   ]
//
// `time` is milliseconds since the start of the recording. Unknown fields are
// ignored on load. Loading is all-or-nothing.

use log::{debug, info};
use serde_json::Value;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::sequencer::recorder::RecordedNoteEvent;

/// File name offered when saving a melody
pub const DEFAULT_FILE_NAME: &str = "santoor-melody.json";

#[derive(Debug, Error)]
pub enum SequenceError {
    #[error("Failed to parse melody: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid melody format: {0}")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SequenceError {
    /// True for content problems (bad JSON or bad shape), false for I/O
    pub fn is_invalid_format(&self) -> bool {
        matches!(self, SequenceError::Parse(_) | SequenceError::InvalidFormat(_))
    }
}

/// Pretty-printed JSON (2-space indent), events in order
pub fn serialize(sequence: &[RecordedNoteEvent]) -> Result<String, SequenceError> {
    Ok(serde_json::to_string_pretty(sequence)?)
}

pub fn deserialize(text: &str) -> Result<Vec<RecordedNoteEvent>, SequenceError> {
    let document: Value = serde_json::from_str(text)?;

    let Value::Array(items) = document else {
        return Err(SequenceError::InvalidFormat(
            "expected an array of notes".to_string(),
        ));
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| event_from_value(index, item))
        .collect()
}

fn event_from_value(index: usize, item: &Value) -> Result<RecordedNoteEvent, SequenceError> {
    let invalid = |reason: &str| SequenceError::InvalidFormat(format!("entry {}: {}", index, reason));

    let fields = item.as_object().ok_or_else(|| invalid("not an object"))?;
    let note = fields
        .get("note")
        .ok_or_else(|| invalid("missing \"note\""))?
        .as_str()
        .ok_or_else(|| invalid("\"note\" is not a string"))?;
    let time = fields
        .get("time")
        .ok_or_else(|| invalid("missing \"time\""))?
        .as_f64()
        .ok_or_else(|| invalid("\"time\" is not a number"))?;

    Ok(RecordedNoteEvent::new(note, time))
}

/// Write `sequence` to `path`. Returns `Ok(false)` without touching the file
/// when there is nothing to save.
pub fn save_to_file(path: &Path, sequence: &[RecordedNoteEvent]) -> Result<bool, SequenceError> {
    if sequence.is_empty() {
        debug!("Nothing recorded, skipping save to {}", path.display());
        return Ok(false);
    }
    fs::write(path, serialize(sequence)?)?;
    info!("Saved {} notes to {}", sequence.len(), path.display());
    Ok(true)
}

pub fn load_from_file(path: &Path) -> Result<Vec<RecordedNoteEvent>, SequenceError> {
    let text = fs::read_to_string(path)?;
    let sequence = deserialize(&text)?;
    info!("Loaded {} notes from {}", sequence.len(), path.display());
    Ok(sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn melody() -> Vec<RecordedNoteEvent> {
        vec![
            RecordedNoteEvent::new("C4", 0.0),
            RecordedNoteEvent::new("E4", 412.5),
            RecordedNoteEvent::new("G4", 1000.0 / 3.0),
        ]
    }

    #[test]
    fn test_roundtrip_keeps_order_and_exact_times() {
        let text = serialize(&melody()).unwrap();
        assert_eq!(deserialize(&text).unwrap(), melody());

        let empty = serialize(&[]).unwrap();
        assert_eq!(empty, "[]");
        assert!(deserialize(&empty).unwrap().is_empty());
    }

    #[test]
    fn test_wire_shape() {
        let text = serialize(&[RecordedNoteEvent::new("A4", 250.0)]).unwrap();
        assert_eq!(text, "[\n  {\n    \"note\": \"A4\",\n    \"time\": 250.0\n  }\n]");
    }

    #[test]
    fn test_integer_times_and_extra_fields_are_accepted() {
        let loaded = deserialize(r#"[{"note": "D4", "time": 120, "velocity": 3}]"#).unwrap();
        assert_eq!(loaded, vec![RecordedNoteEvent::new("D4", 120.0)]);
    }

    #[test]
    fn test_malformed_text_is_a_parse_error() {
        let err = deserialize("[{\"note\": \"C4\",").unwrap_err();
        assert!(matches!(err, SequenceError::Parse(_)));
        assert!(err.is_invalid_format());
    }

    #[test]
    fn test_wrong_shape_is_invalid_format() {
        for text in [
            r#"{"note": "C4", "time": 0}"#,
            r#"["C4"]"#,
            r#"[{"time": 0}]"#,
            r#"[{"note": "C4"}]"#,
            r#"[{"note": 4, "time": 0}]"#,
            r#"[{"note": "C4", "time": "0"}]"#,
            r#"[{"note": "C4", "time": 0}, null]"#,
        ] {
            let err = deserialize(text).unwrap_err();
            assert!(
                matches!(err, SequenceError::InvalidFormat(_)),
                "{} gave {:?}",
                text,
                err
            );
            assert!(err.is_invalid_format());
        }
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DEFAULT_FILE_NAME);

        assert!(save_to_file(&path, &melody()).unwrap());
        assert_eq!(load_from_file(&path).unwrap(), melody());
    }

    #[test]
    fn test_empty_save_writes_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.json");
        assert!(!save_to_file(&path, &[]).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = load_from_file(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, SequenceError::Io(_)));
        assert!(!err.is_invalid_format());
    }
}
