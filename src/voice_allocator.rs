//! Maps the most recently held notes onto a fixed bank of analog voices.
//!
//! The trick behind stable polyphony is that nothing here consumes the note stack: each
//! allocation pass just peeks at the notes that *should* be sounding. When a new note pushes
//! an older one out of the peek window, the older note silently stops being requested and
//! its voice frees up for the newcomer; if a sounding note is released while overflow notes
//! are still held, the next one slides back into the window and starts sounding again
//! (possibly on a different voice). Notes that stay inside the window keep their voice from
//! one pass to the next, so sustained notes are never audibly reassigned.

use crate::note_stack::{HeldNote, NoteStack};
use wmidi::Note;

mod lru_order;
pub use lru_order::*;

mod polyphonic;
pub use polyphonic::*;

mod unison;
pub use unison::*;

/// Number of analog voices the adapter drives, one CV/gate pair each.
pub const NUM_VOICES: usize = 4;

/// One output slot of the synthesizer's polyphony: either silent or sounding a single note.
///
/// The hardware-output stage translates each slot into a DAC code and a gate level once per
/// update; trigger and retrigger timing bookkeeping lives over there, not here.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Voice {
    held: Option<HeldNote>,
}

impl Voice {
    /// The note this voice is sounding, with its velocity, if any.
    pub fn held(&self) -> Option<HeldNote> {
        self.held
    }

    /// The note number this voice is sounding, if any.
    pub fn note(&self) -> Option<Note> {
        self.held.map(|held| held.note())
    }

    /// Whether this voice is currently silent.
    pub fn is_free(&self) -> bool {
        self.held.is_none()
    }

    fn assign(&mut self, note: HeldNote) {
        self.held = Some(note);
    }

    fn clear(&mut self) {
        self.held = None;
    }
}

/// The two interchangeable allocation strategies.
///
/// The panel's mode switch selects between them at runtime; dispatching through a single
/// `match` keeps the set trivially extensible (a chord memory or arpeggiator mode would slot
/// in as a third variant).
#[derive(Clone, Debug)]
pub enum PlayMode {
    /// Up to [`NUM_VOICES`] simultaneous notes, least-recently-used slot recycling.
    Polyphonic(Polyphonic),
    /// All voices sound the single most recent note.
    Unison(Unison),
}

impl PlayMode {
    /// Read the currently desired notes from `notes` and update `voices` in place.
    ///
    /// Returns whether every voice must be retriggered (a unison note change); in
    /// polyphonic mode per-voice triggering is derived downstream from slot changes, so
    /// this is always `false` there.
    pub fn allocate<const N: usize>(
        &mut self,
        notes: &NoteStack<N>,
        voices: &mut [Voice; NUM_VOICES],
    ) -> bool {
        match self {
            Self::Polyphonic(mode) => mode.allocate(notes, voices),
            Self::Unison(mode) => mode.allocate(notes, voices),
        }
    }
}

impl Default for PlayMode {
    fn default() -> Self {
        Self::Polyphonic(Polyphonic::default())
    }
}
