//! Note alphabet and the physical key table.
//!
//! One octave of natural notes, C4 through C5, laid out on the home row so the
//! player's fingers rest on the whole keyboard at once.

/// One playable pitch. Bound to exactly one key in [`KEYS`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Note {
    C4,
    D4,
    E4,
    F4,
    G4,
    A4,
    B4,
    C5,
}

impl Note {
    /// Alphabet the sequence generator draws from.
    pub const ALL: [Note; 8] = [
        Note::C4,
        Note::D4,
        Note::E4,
        Note::F4,
        Note::G4,
        Note::A4,
        Note::B4,
        Note::C5,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Note::C4 => "C4",
            Note::D4 => "D4",
            Note::E4 => "E4",
            Note::F4 => "F4",
            Note::G4 => "G4",
            Note::A4 => "A4",
            Note::B4 => "B4",
            Note::C5 => "C5",
        }
    }

    /// MIDI note number (middle C = 60).
    pub fn midi(self) -> u8 {
        match self {
            Note::C4 => 60,
            Note::D4 => 62,
            Note::E4 => 64,
            Note::F4 => 65,
            Note::G4 => 67,
            Note::A4 => 69,
            Note::B4 => 71,
            Note::C5 => 72,
        }
    }

    /// Frequency in Hz (A4 = 440 Hz, equal temperament).
    pub fn frequency(self) -> f64 {
        440.0 * 2.0_f64.powf((self.midi() as f64 - 69.0) / 12.0)
    }

    /// Key letter that plays this note.
    pub fn key(self) -> &'static str {
        KEYS.iter()
            .find(|(_, n)| *n == self)
            .map(|(k, _)| *k)
            .unwrap_or("")
    }
}

/// Physical key -> note. Keys are lowercase `KeyboardEvent.key` values.
pub const KEYS: &[(&str, Note)] = &[
    ("a", Note::C4),
    ("s", Note::D4),
    ("d", Note::E4),
    ("f", Note::F4),
    ("g", Note::G4),
    ("h", Note::A4),
    ("j", Note::B4),
    ("k", Note::C5),
];

/// Case-insensitive lookup of a key value. `None` for keys outside the table.
pub fn note_for_key(key: &str) -> Option<Note> {
    KEYS.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, n)| *n)
}
