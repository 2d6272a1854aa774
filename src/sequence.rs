//! Random note sequences.

use crate::notes::Note;

/// Source of notes for new sequences. Production draws at random; tests script it.
pub trait NoteSource {
    fn next_note(&mut self) -> Note;
}

/// Uniform draw over [`Note::ALL`] using OS / browser entropy.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomNotes;

impl NoteSource for RandomNotes {
    fn next_note(&mut self) -> Note {
        Note::ALL[rand_index(Note::ALL.len())]
    }
}

/// `length` independent draws from `source`. Repeats are allowed.
pub fn generate(length: usize, source: &mut impl NoteSource) -> Vec<Note> {
    (0..length).map(|_| source.next_note()).collect()
}

fn rand_index(len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let mut buf = [0u8; 4];
    if let Err(err) = getrandom::getrandom(&mut buf) {
        log::error!("entropy unavailable, using first note: {err}");
        return 0;
    }
    // len is tiny relative to u32::MAX, bias is negligible
    u32::from_le_bytes(buf) as usize % len
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generated_notes_come_from_alphabet() {
        let seq = generate(200, &mut RandomNotes);
        assert_eq!(seq.len(), 200);
        for n in &seq {
            assert!(Note::ALL.contains(n));
        }
        // 200 draws over 8 notes should never collapse to a single value
        let distinct: HashSet<Note> = seq.into_iter().collect();
        assert!(distinct.len() > 1);
    }

    #[test]
    fn zero_length_is_empty() {
        assert!(generate(0, &mut RandomNotes).is_empty());
    }

    #[test]
    fn rand_index_stays_in_range() {
        for _ in 0..100 {
            assert!(rand_index(3) < 3);
        }
        assert_eq!(rand_index(0), 0);
    }
}
