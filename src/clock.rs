//! Divides the incoming MIDI timing clock down to a trigger rate usable by analog gear.
//!
//! The wire carries 24 timing-clock pulses per quarter note. Sequencers and drum machines
//! hanging off the adapter's clock output usually want something slower, so pulses are
//! counted and a trigger fires once every [`ClockTriggerRate::clocks`] pulses. Start and
//! Stop realign the count to the top of the bar; Continue deliberately does not, so a
//! resumed transport stays in phase.

use crate::configuration::ClockTriggerRate;
use wmidi::MidiMessage;

/// Counts timing-clock pulses and reports when a divided trigger is due.
#[derive(Clone, Copy, Debug)]
pub struct ClockDivider {
    rate: ClockTriggerRate,
    counter: u8,
}

impl ClockDivider {
    /// Construct a divider that fires at the given rate.
    pub fn new(rate: ClockTriggerRate) -> Self {
        Self { rate, counter: 0 }
    }

    /// Change the division without disturbing the running count.
    pub fn set_rate(&mut self, rate: ClockTriggerRate) {
        self.rate = rate;
    }

    /// Restart the count, as if a Start byte had arrived.
    pub fn reset(&mut self) {
        self.counter = 0;
    }

    /// Feed one parsed message through the divider.
    ///
    /// Returns `true` exactly when a timing-clock pulse completes the configured division;
    /// every non-realtime message passes through without effect.
    pub fn handle_message(&mut self, message: &MidiMessage) -> bool {
        match message {
            MidiMessage::TimingClock => {
                self.counter += 1;
                if self.counter >= self.rate.clocks() {
                    self.counter = 0;
                    return true;
                }
                false
            }
            MidiMessage::Start | MidiMessage::Stop => {
                self.counter = 0;
                false
            }
            _ => false,
        }
    }
}

impl Default for ClockDivider {
    fn default() -> Self {
        Self::new(ClockTriggerRate::QuarterNote)
    }
}
