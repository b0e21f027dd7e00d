//! The polyphonic allocation strategy.

use super::{LruOrder, NUM_VOICES, Voice};
use crate::note_stack::NoteStack;

/// Allocates the [`NUM_VOICES`] most recently held notes onto the voice bank, recycling
/// freed slots in least-recently-used order.
///
/// Sustained notes are sacred: a note that was already sounding keeps its slot and its LRU
/// position untouched, so nothing a performer is holding ever jumps between voices or
/// retriggers. Only notes that stopped being desired give their slot away.
#[derive(Clone, Debug, Default)]
pub struct Polyphonic {
    lru: LruOrder<NUM_VOICES>,
}

impl Polyphonic {
    /// Update `voices` to sound exactly the notes currently desired by `notes`.
    pub fn allocate<const N: usize>(
        &mut self,
        notes: &NoteStack<N>,
        voices: &mut [Voice; NUM_VOICES],
    ) -> bool {
        let desired = notes.peek_n(NUM_VOICES);

        // silence voices whose note is no longer desired
        for voice in voices.iter_mut() {
            if let Some(held) = voice.held() {
                if !desired.iter().any(|want| want.note() == held.note()) {
                    voice.clear();
                }
            }
        }

        for want in desired {
            if let Some(voice) = voices
                .iter_mut()
                .find(|voice| voice.note() == Some(want.note()))
            {
                // sustaining note: refresh the velocity snapshot, leave slot and LRU alone
                voice.assign(*want);
                continue;
            }
            let free_slot = self.lru.iter().find(|&slot| voices[slot].is_free());
            if let Some(slot) = free_slot {
                voices[slot].assign(*want);
                self.lru.touch(slot);
            }
        }
        false
    }
}
