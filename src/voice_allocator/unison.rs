//! The unison allocation strategy.

use super::{NUM_VOICES, Voice};
use crate::note_stack::NoteStack;
use wmidi::Note;

/// Broadcasts the single most recent held note to every voice.
///
/// All voices carry identical note and velocity, stacked for one thick monophonic sound.
/// Because every slot changes together, the allocator itself reports when the note number
/// changes so the output stage can retrigger all envelopes at once; a velocity-only update
/// is not a retrigger.
#[derive(Clone, Debug, Default)]
pub struct Unison {
    sounding: Option<Note>,
}

impl Unison {
    /// Update `voices` to all sound the most recent note, or fall silent together.
    ///
    /// Returns whether the sounding note number changed.
    pub fn allocate<const N: usize>(
        &mut self,
        notes: &NoteStack<N>,
        voices: &mut [Voice; NUM_VOICES],
    ) -> bool {
        let Some(&want) = notes.peek_n(1).first() else {
            for voice in voices.iter_mut() {
                voice.clear();
            }
            self.sounding = None;
            return false;
        };
        let retrigger = self.sounding != Some(want.note());
        for voice in voices.iter_mut() {
            voice.assign(want);
        }
        self.sounding = Some(want.note());
        retrigger
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note_stack::HeldNote;
    use wmidi::{U7, Velocity};

    const FORTE: Velocity = U7::from_u8_lossy(100);

    #[test]
    fn broadcasts_the_most_recent_note_to_every_voice() {
        let mut mode = Unison::default();
        let mut stack: NoteStack<8> = NoteStack::new();
        let mut voices = [Voice::default(); NUM_VOICES];

        stack.push(HeldNote::new(Note::C4, FORTE));
        assert!(mode.allocate(&stack, &mut voices), "First note must retrigger");

        for voice in &voices {
            assert_eq!(Some(Note::C4), voice.note(), "Expected left but got right");
            assert_eq!(Some(FORTE), voice.held().map(|held| held.velocity()));
        }
    }

    #[test]
    fn a_newer_note_switches_all_voices_together() {
        let mut mode = Unison::default();
        let mut stack: NoteStack<8> = NoteStack::new();
        let mut voices = [Voice::default(); NUM_VOICES];

        stack.push(HeldNote::new(Note::C4, FORTE));
        mode.allocate(&stack, &mut voices);
        stack.push(HeldNote::new(Note::G4, FORTE));
        assert!(mode.allocate(&stack, &mut voices), "Note change must retrigger");

        for voice in &voices {
            assert_eq!(Some(Note::G4), voice.note());
        }
    }

    #[test]
    fn a_velocity_update_is_not_a_retrigger() {
        let mut mode = Unison::default();
        let mut stack: NoteStack<8> = NoteStack::new();
        let mut voices = [Voice::default(); NUM_VOICES];

        stack.push(HeldNote::new(Note::C4, FORTE));
        mode.allocate(&stack, &mut voices);

        stack.push(HeldNote::new(Note::C4, U7::from_u8_lossy(20)));
        assert!(!mode.allocate(&stack, &mut voices));
        assert_eq!(
            Some(U7::from_u8_lossy(20)),
            voices[0].held().map(|held| held.velocity()),
            "Velocity must still be refreshed"
        );
    }

    #[test]
    fn releasing_the_last_note_clears_every_voice() {
        let mut mode = Unison::default();
        let mut stack: NoteStack<8> = NoteStack::new();
        let mut voices = [Voice::default(); NUM_VOICES];

        stack.push(HeldNote::new(Note::C4, FORTE));
        mode.allocate(&stack, &mut voices);
        stack.remove(Note::C4);
        assert!(!mode.allocate(&stack, &mut voices));

        for voice in &voices {
            assert!(voice.is_free(), "Every voice must fall silent");
        }
    }

    #[test]
    fn falls_back_to_the_previous_note_on_release() {
        let mut mode = Unison::default();
        let mut stack: NoteStack<8> = NoteStack::new();
        let mut voices = [Voice::default(); NUM_VOICES];

        stack.push(HeldNote::new(Note::C4, FORTE));
        mode.allocate(&stack, &mut voices);
        stack.push(HeldNote::new(Note::G4, FORTE));
        mode.allocate(&stack, &mut voices);

        stack.remove(Note::G4);
        assert!(
            mode.allocate(&stack, &mut voices),
            "Falling back to an older note is a note change"
        );
        assert_eq!(Some(Note::C4), voices[0].note());
    }
}
