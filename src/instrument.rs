//! Ties the receive path together: one owned context the firmware's main loop ticks.
//!
//! The receive interrupt stays outside this module; it only ever touches the
//! [`RingBuffer`], which the main loop passes in by reference on every tick. Everything
//! else — parsing, held-note tracking, voice allocation, clock division — runs strictly in
//! cooperative context and needs no synchronization.

use crate::clock::ClockDivider;
use crate::configuration::{ClockTriggerRate, InstrumentConfig, PlayModeSelect};
use crate::message_parser::MessageParser;
use crate::note_stack::{HeldNote, NoteStack};
use crate::ring_buffer::RingBuffer;
use crate::voice_allocator::{NUM_VOICES, PlayMode, Voice};
use log::{debug, trace};
use wmidi::{Channel, ControlFunction, MidiMessage};

/// What a single processing tick produced, for the hardware-output stage to act on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickEvents {
    /// Whether a complete message was dispatched and acted upon this tick.
    pub message_handled: bool,
    /// Whether every voice must be retriggered at once (a unison note change).
    pub retrigger: bool,
    /// Whether the divided MIDI clock fired this tick.
    pub clock_trigger: bool,
}

/// The four-voice instrument the adapter drives.
///
/// Owns all cooperative-context state and exposes the voice bank the hardware-output stage
/// translates into DAC codes and gate levels.
#[derive(Clone, Debug)]
pub struct FourVoice {
    config: InstrumentConfig,
    parser: MessageParser,
    notes: NoteStack,
    mode: PlayMode,
    voices: [Voice; NUM_VOICES],
    clock: ClockDivider,
}

impl FourVoice {
    /// Construct an instrument with the given configuration and no notes sounding.
    pub fn new(config: InstrumentConfig) -> Self {
        Self {
            parser: MessageParser::new(),
            notes: NoteStack::new(),
            mode: config.play_mode.into(),
            voices: [Voice::default(); NUM_VOICES],
            clock: ClockDivider::new(config.clock_trigger_rate),
            config,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &InstrumentConfig {
        &self.config
    }

    /// The voice bank as of the last tick.
    pub fn voices(&self) -> &[Voice; NUM_VOICES] {
        &self.voices
    }

    /// Listen on a different MIDI channel.
    ///
    /// Held notes, voices and parser state all belong to the old channel's stream, so they
    /// are reinitialized.
    pub fn set_channel(&mut self, channel: Channel) {
        self.config.channel = channel;
        self.notes.clear();
        self.parser.reset();
        self.voices = [Voice::default(); NUM_VOICES];
    }

    /// Switch between polyphonic and unison allocation, starting from a clean voice bank.
    pub fn set_play_mode(&mut self, select: PlayModeSelect) {
        self.config.play_mode = select;
        self.mode = select.into();
        self.voices = [Voice::default(); NUM_VOICES];
    }

    /// Change the division of the clock trigger output.
    pub fn set_clock_trigger_rate(&mut self, rate: ClockTriggerRate) {
        self.config.clock_trigger_rate = rate;
        self.clock.set_rate(rate);
    }

    /// Run one processing tick: dispatch at most one buffered message, then refresh the
    /// voice bank from the held notes.
    ///
    /// Handling at most one message per tick keeps a dense stream from starving the rest of
    /// the main loop; allocation is cheap and runs unconditionally because peeking the note
    /// stack is free of side effects.
    pub fn tick<const N: usize>(&mut self, buffer: &mut RingBuffer<N>) -> TickEvents {
        let mut events = TickEvents::default();
        if let Some(message) = self.parser.get_message(buffer) {
            events.clock_trigger = self.clock.handle_message(&message);
            if matches!(message, MidiMessage::Reset) {
                self.parser.reset();
            }
            events.message_handled = self.handle_message(&message);
        }
        events.retrigger = self.mode.allocate(&self.notes, &mut self.voices);
        events
    }

    /// Fold one parsed message into the held-note state. Returns whether the message was
    /// acted upon.
    fn handle_message(&mut self, message: &MidiMessage) -> bool {
        match message {
            MidiMessage::NoteOn(channel, note, velocity) if *channel == self.config.channel => {
                if u8::from(*velocity) == 0 {
                    // note-on at velocity zero is an implicit note-off
                    self.notes.remove(*note);
                } else {
                    self.notes.push(HeldNote::new(*note, *velocity));
                }
                debug!(
                    "note on: {} at velocity {}",
                    note.to_str(),
                    u8::from(*velocity)
                );
                true
            }
            MidiMessage::NoteOff(channel, note, _) if *channel == self.config.channel => {
                // a stray note-off (or one for a note evicted earlier) is a no-op
                self.notes.remove(*note);
                debug!("note off: {}", note.to_str());
                true
            }
            MidiMessage::ControlChange(channel, function, _) if *channel == self.config.channel => {
                match *function {
                    ControlFunction::ALL_SOUND_OFF | ControlFunction::ALL_NOTES_OFF => {
                        self.notes.clear();
                        true
                    }
                    _ => {
                        debug!(
                            "unsupported control change {} on channel {}",
                            u8::from(*function),
                            channel.number()
                        );
                        false
                    }
                }
            }
            // already counted by the clock divider
            MidiMessage::TimingClock
            | MidiMessage::Start
            | MidiMessage::Continue
            | MidiMessage::Stop => true,
            MidiMessage::Reset => {
                self.notes.clear();
                true
            }
            _ => {
                trace!("unsupported MIDI message ignored");
                false
            }
        }
    }
}

impl Default for FourVoice {
    fn default() -> Self {
        Self::new(InstrumentConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wmidi::Note;

    fn feed(buffer: &mut RingBuffer<64>, bytes: &[u8]) {
        for &byte in bytes {
            assert!(buffer.put(byte), "Test stream must fit the buffer");
        }
    }

    #[test]
    fn note_on_reaches_a_voice() {
        let mut instrument = FourVoice::default();
        let mut buffer = RingBuffer::new();
        feed(&mut buffer, &[0x90, 60, 100]);

        let events = instrument.tick(&mut buffer);
        assert!(events.message_handled);
        assert_eq!(Some(Note::C4), instrument.voices()[0].note());
    }

    #[test]
    fn velocity_zero_note_on_releases_the_note() {
        let mut instrument = FourVoice::default();
        let mut buffer = RingBuffer::new();
        feed(&mut buffer, &[0x90, 60, 100]);
        instrument.tick(&mut buffer);

        feed(&mut buffer, &[0x90, 60, 0]);
        let events = instrument.tick(&mut buffer);
        assert!(events.message_handled);
        assert!(
            instrument.voices().iter().all(Voice::is_free),
            "All voices should be silent again"
        );
    }

    #[test]
    fn messages_for_other_channels_are_ignored() {
        let mut instrument = FourVoice::default();
        let mut buffer = RingBuffer::new();
        // note on, channel 2
        feed(&mut buffer, &[0x91, 60, 100]);

        let events = instrument.tick(&mut buffer);
        assert!(!events.message_handled);
        assert!(instrument.voices().iter().all(Voice::is_free));
    }

    #[test]
    fn running_status_spans_ticks() {
        let mut instrument = FourVoice::default();
        let mut buffer = RingBuffer::new();
        feed(&mut buffer, &[0x90, 60, 100]);
        instrument.tick(&mut buffer);

        // data-only pair continues the last note-on status
        feed(&mut buffer, &[64, 90]);
        let events = instrument.tick(&mut buffer);
        assert!(events.message_handled);
        assert_eq!(Some(Note::E4), instrument.voices()[1].note());
    }

    #[test]
    fn all_notes_off_silences_everything() {
        let mut instrument = FourVoice::default();
        let mut buffer = RingBuffer::new();
        feed(&mut buffer, &[0x90, 60, 100, 64, 90]);
        instrument.tick(&mut buffer);
        instrument.tick(&mut buffer);

        feed(&mut buffer, &[0xB0, 123, 0]);
        let events = instrument.tick(&mut buffer);
        assert!(events.message_handled);
        assert!(instrument.voices().iter().all(Voice::is_free));
    }

    #[test]
    fn reset_clears_notes_and_running_status() {
        let mut instrument = FourVoice::default();
        let mut buffer = RingBuffer::new();
        feed(&mut buffer, &[0x90, 60, 100]);
        instrument.tick(&mut buffer);

        feed(&mut buffer, &[0xFF]);
        let events = instrument.tick(&mut buffer);
        assert!(events.message_handled);
        assert!(instrument.voices().iter().all(Voice::is_free));

        // the old running status must not resurrect these data bytes as a note-on
        feed(&mut buffer, &[64, 90]);
        let events = instrument.tick(&mut buffer);
        assert!(!events.message_handled);
        assert!(instrument.voices().iter().all(Voice::is_free));
    }

    #[test]
    fn unison_mode_reports_retriggers() {
        let mut instrument = FourVoice::default();
        instrument.set_play_mode(PlayModeSelect::Unison);
        let mut buffer = RingBuffer::new();

        feed(&mut buffer, &[0x90, 60, 100]);
        let events = instrument.tick(&mut buffer);
        assert!(events.retrigger, "First note is a note change");
        assert!(
            instrument
                .voices()
                .iter()
                .all(|voice| voice.note() == Some(Note::C4))
        );

        feed(&mut buffer, &[64, 90]);
        let events = instrument.tick(&mut buffer);
        assert!(events.retrigger, "Overtaking note is a note change");
        assert!(
            instrument
                .voices()
                .iter()
                .all(|voice| voice.note() == Some(Note::E4))
        );

        let events = instrument.tick(&mut buffer);
        assert!(!events.retrigger, "An idle tick must not retrigger");
    }

    #[test]
    fn clock_trigger_fires_through_the_tick() {
        let mut instrument = FourVoice::default();
        instrument.set_clock_trigger_rate(ClockTriggerRate::ThirtySecondNote);
        let mut buffer = RingBuffer::new();
        feed(&mut buffer, &[0xF8, 0xF8, 0xF8]);

        assert!(!instrument.tick(&mut buffer).clock_trigger);
        assert!(!instrument.tick(&mut buffer).clock_trigger);
        assert!(instrument.tick(&mut buffer).clock_trigger);
    }

    #[test]
    fn changing_channel_reinitializes_state() {
        let mut instrument = FourVoice::default();
        let mut buffer = RingBuffer::new();
        feed(&mut buffer, &[0x90, 60, 100]);
        instrument.tick(&mut buffer);

        instrument.set_channel(Channel::Ch5);
        assert!(instrument.voices().iter().all(Voice::is_free));

        // note on, channel 5
        feed(&mut buffer, &[0x94, 62, 80]);
        let events = instrument.tick(&mut buffer);
        assert!(events.message_handled);
        assert_eq!(Some(Note::D4), instrument.voices()[0].note());
    }
}
