// Key bindings - Three keyboard rows, one octave each
//
//   q w e r t y u   →  C5 … B5
//   a s d f g h j   →  C4 … B4
//   z x c v b n m   →  C3 … B3

/// Key character to note, lowest string first
pub const KEY_BINDINGS: [(char, &str); 21] = [
    ('z', "C3"),
    ('x', "D3"),
    ('c', "E3"),
    ('v', "F3"),
    ('b', "G3"),
    ('n', "A3"),
    ('m', "B3"),
    ('a', "C4"),
    ('s', "D4"),
    ('d', "E4"),
    ('f', "F4"),
    ('g', "G4"),
    ('h', "A4"),
    ('j', "B4"),
    ('q', "C5"),
    ('w', "D5"),
    ('e', "E5"),
    ('r', "F5"),
    ('t', "G5"),
    ('y', "A5"),
    ('u', "B5"),
];

/// Normalize a raw key identifier to its binding character.
///
/// Only single-character keys can be bound; case is ignored.
pub fn key_char(key: &str) -> Option<char> {
    let mut chars = key.chars();
    let c = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    c.to_lowercase().next()
}

/// Note bound to `key`, if any
pub fn note_for_key(key: &str) -> Option<&'static str> {
    let c = key_char(key)?;
    KEY_BINDINGS
        .iter()
        .find(|(bound, _)| *bound == c)
        .map(|(_, note)| *note)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::notes::base_frequency;

    #[test]
    fn test_rows() {
        assert_eq!(note_for_key("z"), Some("C3"));
        assert_eq!(note_for_key("a"), Some("C4"));
        assert_eq!(note_for_key("q"), Some("C5"));
        assert_eq!(note_for_key("u"), Some("B5"));
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(note_for_key("H"), Some("A4"));
        assert_eq!(note_for_key("h"), Some("A4"));
    }

    #[test]
    fn test_unbound_keys() {
        assert_eq!(note_for_key("p"), None);
        assert_eq!(note_for_key("1"), None);
        assert_eq!(note_for_key(""), None);
        assert_eq!(note_for_key("Shift"), None);
    }

    #[test]
    fn test_every_binding_is_a_known_note() {
        for (key, note) in KEY_BINDINGS {
            assert!(base_frequency(note).is_some(), "{} -> {}", key, note);
        }
    }
}
