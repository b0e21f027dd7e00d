//! Quattrocento is the architecture-agnostic core of a MIDI adapter that gives a four-voice
//! analog synthesizer (one control-voltage/gate pair per voice) a modern
//! [MIDI](https://midi.org/midi-1-0) input.
//!
//! The hard part of that job is all here: a byte-level protocol state machine that survives
//! running status, interleaved realtime bytes and System Exclusive noise without ever
//! blocking or allocating, feeding a recency-ordered stack of held notes whose contents are
//! turned into a *stable* voice assignment every processing tick — sustained notes never
//! hop between voices, so nothing a performer is holding ever audibly retriggers.
//!
//! Hardware I/O (the UART receive interrupt, DAC and gate outputs, panel scanning) lives in
//! the embedded binary that consumes this crate. The contract between the two is small: the
//! interrupt feeds bytes into a [`ring_buffer::RingBuffer`], the main loop calls
//! [`instrument::FourVoice::tick`], and the output stage renders
//! [`instrument::FourVoice::voices`] to the synthesizer.

#![deny(missing_docs)]
#![no_std]

pub mod clock;
pub mod configuration;
pub mod instrument;
pub mod message_parser;
pub mod note_stack;
pub mod ring_buffer;
pub mod voice_allocator;
