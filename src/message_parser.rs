//! Reassembles complete MIDI messages from the raw byte stream in the receive buffer.
//!
//! Serial MIDI is noisy in ways USB-MIDI is not: status bytes may be omitted under running
//! status, System Exclusive payloads of arbitrary length must be skipped, and single-byte
//! realtime messages may legally interleave with any other message, including mid-sysex.
//! The parser is a per-byte state machine that tolerates all of this without blocking or
//! allocating. Whatever it cannot attach to a known message is dropped, which is also the
//! standard MIDI resynchronization strategy after joining a stream mid-message.

use crate::ring_buffer::RingBuffer;
use wmidi::MidiMessage;

const SYSEX_BEGIN: u8 = 0xF0;
const SYSEX_END: u8 = 0xF7;

/// Total byte count of the message introduced by `status`, data bytes included.
fn expected_length(status: u8) -> Option<usize> {
    match status {
        // note off/on, polyphonic pressure, control change, pitch bend, song position
        0x80..=0xBF | 0xE0..=0xEF | 0xF2 => Some(3),
        // program change, channel pressure, MTC quarter frame, song select
        0xC0..=0xDF | 0xF1 | 0xF3 => Some(2),
        _ => None,
    }
}

/// Stateful decoder turning buffered bytes into [`MidiMessage`]s.
///
/// All state needed to resume a half-received message lives here, so the parser can stop at
/// buffer exhaustion mid-message and pick up exactly where it left off once the receive
/// interrupt delivers more bytes.
#[derive(Clone, Debug, Default)]
pub struct MessageParser {
    /// Last channel status byte seen, remembered for running status. `None` until the first
    /// status byte arrives, and again after a system-common message completes.
    last_status: Option<u8>,
    /// Whether we are inside a sysex payload that is being discarded.
    in_sysex: bool,
    /// The message being accumulated.
    message: [u8; 3],
    /// How many bytes of [`Self::message`] are filled.
    filled: usize,
}

impl MessageParser {
    /// Construct a parser with no knowledge of the stream yet.
    pub const fn new() -> Self {
        Self {
            last_status: None,
            in_sysex: false,
            message: [0; 3],
            filled: 0,
        }
    }

    /// Forget running status, sysex state and any half-accumulated message, e.g. when the
    /// listening channel changes and the stream is reinterpreted from scratch.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Drain bytes from `buffer` until one complete message is assembled.
    ///
    /// Never blocks: the moment the buffer is exhausted this returns `None`, and the next
    /// call resumes from exactly the same internal state. Messages are returned in the
    /// order their final byte was received, except that realtime messages surface
    /// immediately, even from inside a sysex payload or another message's data bytes.
    pub fn get_message<const N: usize>(
        &mut self,
        buffer: &mut RingBuffer<N>,
    ) -> Option<MidiMessage<'static>> {
        while let Some(byte) = buffer.get() {
            if let Some(message) = self.accept(byte) {
                return Some(message);
            }
        }
        None
    }

    /// Fetch at most one message and hand it to `handler`.
    ///
    /// Returns whatever the handler reported, or `false` when no complete message was
    /// available. One message per call keeps a busy stream from starving the rest of the
    /// main loop.
    pub fn tick<const N: usize, F>(&mut self, buffer: &mut RingBuffer<N>, mut handler: F) -> bool
    where
        F: FnMut(MidiMessage<'static>) -> bool,
    {
        match self.get_message(buffer) {
            Some(message) => handler(message),
            None => false,
        }
    }

    /// Advance the state machine by one byte, yielding a message when one completes.
    fn accept(&mut self, byte: u8) -> Option<MidiMessage<'static>> {
        match byte {
            // Realtime class: surfaced as a standalone message without disturbing running
            // status, sysex skipping or the accumulation buffer. The two undefined codes in
            // the range (0xF9, 0xFD) fail the wmidi conversion and fall away silently.
            0xF8..=0xFF => {
                let bytes = [byte];
                return MidiMessage::try_from(&bytes[..])
                    .ok()
                    .and_then(MidiMessage::drop_unowned_sysex);
            }
            SYSEX_BEGIN => {
                self.in_sysex = true;
                return None;
            }
            SYSEX_END => {
                self.in_sysex = false;
                return None;
            }
            _ => {}
        }
        if self.in_sysex {
            // payload byte of a sysex we are not interested in
            return None;
        }
        match byte {
            // tune request and the undefined system-common codes: one byte, dropped
            0xF4..=0xF6 => None,
            // a status byte restarts accumulation, clobbering any half-received message
            0x80..=0xF3 => {
                self.last_status = Some(byte);
                self.message[0] = byte;
                self.filled = 1;
                None
            }
            _ => self.accept_data(byte),
        }
    }

    fn accept_data(&mut self, byte: u8) -> Option<MidiMessage<'static>> {
        // A data byte with no status to attach to means we joined the stream mid-message;
        // drop it and wait for the next status byte.
        let status = self.last_status?;
        let expected = expected_length(status)?;
        self.message[self.filled] = byte;
        self.filled += 1;
        if self.filled < expected {
            return None;
        }
        let message = MidiMessage::try_from(&self.message[..expected]).ok();
        if matches!(status, 0x80..=0xEF) {
            // running status: the status byte carries over, only the data portion resets
            self.filled = 1;
        } else {
            // no running status across system-common messages
            self.last_status = None;
            self.filled = 0;
        }
        message.and_then(MidiMessage::drop_unowned_sysex)
    }
}
