//! A bounded, recency-ordered collection of the notes currently held on the controller
//! (note-on received, no matching note-off yet).
//!
//! The tail of the stack is always the most recently pressed-and-held note, so peeking the
//! top `n` entries yields exactly the notes that should be sounding under an `n`-voice
//! polyphony limit, without consuming them. Peeking has no side effects; repeated peeks
//! within one processing tick return the same answer.

use tinyvec::{ArrayVec, array_vec};
use wmidi::{Note, U7, Velocity};

/// A note the performer is currently holding down.
///
/// Internally this stores [`U7`] because [`tinyvec`] requires that items implement
/// [`Default`]; public interfaces deal with the friendlier [`Note`] type instead.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HeldNote {
    note: U7,
    velocity: U7,
}

impl HeldNote {
    /// Pair a [`Note`] with the velocity it was struck at.
    pub fn new(note: Note, velocity: Velocity) -> Self {
        Self {
            note: U7::from_u8_lossy(note as u8),
            velocity,
        }
    }

    /// The held note.
    pub fn note(&self) -> Note {
        Note::from(self.note)
    }

    /// The velocity the note was struck at, updated if a repeated note-on arrives while
    /// the note is still held.
    pub fn velocity(&self) -> Velocity {
        self.velocity
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for HeldNote {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "{} ({}) at velocity {}",
            Note::from(self.note).to_str(),
            u8::from(self.note),
            u8::from(self.velocity)
        );
    }
}

/// Fixed-capacity stack of held notes, ordered oldest first.
///
/// No two entries ever share a note number. When a push would overflow, the oldest entry is
/// evicted to make room; held notes beyond capacity are forgotten rather than blocking
/// input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoteStack<const N: usize = 8> {
    data: ArrayVec<[HeldNote; N]>,
}

impl<const N: usize> NoteStack<N> {
    /// Construct an empty stack.
    pub fn new() -> Self {
        Self { data: array_vec!() }
    }

    /// Forget every held note, e.g. when the listening channel changes.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Number of notes currently held.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether no notes are held.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Record a note-on.
    ///
    /// If the note number is already held, only its velocity is refreshed and its position
    /// is left alone. Otherwise the note is appended as the new most-recent entry, evicting
    /// the oldest entry first if the stack is at capacity.
    pub fn push(&mut self, note: HeldNote) {
        if let Some(held) = self.data.iter_mut().find(|held| held.note == note.note) {
            held.velocity = note.velocity;
            return;
        }
        if self.data.len() == self.data.capacity() {
            self.data.remove(0);
        }
        self.data.push(note);
    }

    /// Record a note-off, closing the gap the note leaves behind.
    ///
    /// Returns `false` when the note was not held (it may have been evicted earlier, or the
    /// note-off may simply be stray); the caller treats that as a no-op.
    pub fn remove(&mut self, note: Note) -> bool {
        let target = U7::from_u8_lossy(note as u8);
        match self.data.iter().position(|held| held.note == target) {
            Some(index) => {
                self.data.remove(index);
                true
            }
            None => false,
        }
    }

    /// Non-destructively view the `n` most recently held notes, oldest first.
    ///
    /// Asking for more notes than are held returns the whole stack; asking for zero returns
    /// an empty slice. The stack itself is never altered by peeking.
    pub fn peek_n(&self, n: usize) -> &[HeldNote] {
        let count = self.data.len().min(n);
        &self.data[self.data.len() - count..]
    }
}

impl<const N: usize> Default for NoteStack<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "defmt")]
impl<const N: usize> defmt::Format for NoteStack<N> {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "NoteStack [");
        for (i, held) in self.data.iter().enumerate() {
            if i > 0 {
                defmt::write!(fmt, ", ");
            }
            defmt::write!(fmt, "{}", held);
        }
        defmt::write!(fmt, "]");
    }
}
