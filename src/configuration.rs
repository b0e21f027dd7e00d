//! User-configurable settings, implemented as enums the way the hardware's panel controls
//! expose them, plus a trait to make them easier to work with in code.

use crate::voice_allocator::{PlayMode, Polyphonic, Unison};
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::{FromPrimitive, ToPrimitive};
use wmidi::Channel;

/// A trait which allows infinite cycling of an enum's variants.
///
/// Useful for pushbutton user interfaces, allowing presses to advance from the current to
/// the next variant, cycling back to the beginning when all variants have been exhausted.
pub trait CycleConfig {
    /// Return the next variant, cycling back to the beginning as needed.
    fn cycle(self) -> Self
    where
        Self: FromPrimitive + ToPrimitive + Sized,
    {
        let index = self
            .to_u8()
            .expect("enum variants should be castable to u8");
        match <Self as FromPrimitive>::from_u8(index + 1) {
            Some(new_selection) => new_selection,
            None => FromPrimitive::from_u8(0).expect("enum should not be empty"),
        }
    }
}

/// Selects the voice-allocation strategy.
#[derive(Clone, Copy, Debug, FromPrimitive, PartialEq, ToPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlayModeSelect {
    /// Up to four simultaneous notes, one per voice.
    Polyphonic,
    /// All four voices stacked on the single most recent note.
    Unison,
}
impl CycleConfig for PlayModeSelect {}

impl From<PlayModeSelect> for PlayMode {
    /// Build a fresh allocator for the selection; switching modes starts from a clean slate.
    fn from(select: PlayModeSelect) -> Self {
        match select {
            PlayModeSelect::Polyphonic => PlayMode::Polyphonic(Polyphonic::default()),
            PlayModeSelect::Unison => PlayMode::Unison(Unison::default()),
        }
    }
}

/// How often the clock trigger output fires, expressed as divisions of a note.
///
/// MIDI carries 24 timing-clock pulses per quarter note, so each variant maps to a pulse
/// count between 96 (a whole note) and 3 (a thirty-second note).
#[derive(Clone, Copy, Debug, FromPrimitive, PartialEq, ToPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockTriggerRate {
    /// One trigger per whole note (96 pulses).
    WholeNote,
    /// One trigger per half note (48 pulses).
    HalfNote,
    /// One trigger per quarter note (24 pulses).
    QuarterNote,
    /// One trigger per dotted eighth note (18 pulses).
    DottedEighthNote,
    /// One trigger per eighth note (12 pulses).
    EighthNote,
    /// One trigger per dotted sixteenth note (9 pulses).
    DottedSixteenthNote,
    /// One trigger per sixteenth note (6 pulses).
    SixteenthNote,
    /// One trigger per thirty-second note (3 pulses).
    ThirtySecondNote,
}
impl CycleConfig for ClockTriggerRate {}

impl ClockTriggerRate {
    /// Number of MIDI timing-clock pulses between triggers.
    pub fn clocks(&self) -> u8 {
        match self {
            Self::WholeNote => 96,
            Self::HalfNote => 48,
            Self::QuarterNote => 24,
            Self::DottedEighthNote => 18,
            Self::EighthNote => 12,
            Self::DottedSixteenthNote => 9,
            Self::SixteenthNote => 6,
            Self::ThirtySecondNote => 3,
        }
    }
}

/// Everything about the adapter's behavior the user can change at runtime.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InstrumentConfig {
    /// The MIDI channel the instrument listens on; messages for other channels are ignored.
    pub channel: Channel,
    /// The selected voice-allocation strategy.
    pub play_mode: PlayModeSelect,
    /// The division of the incoming MIDI clock fed to the clock trigger output.
    pub clock_trigger_rate: ClockTriggerRate,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            channel: Channel::Ch1,
            play_mode: PlayModeSelect::Polyphonic,
            clock_trigger_rate: ClockTriggerRate::QuarterNote,
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for InstrumentConfig {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "InstrumentConfig {{ channel: {}, play_mode: {}, clock_trigger_rate: {} }}",
            self.channel.number(),
            self.play_mode,
            self.clock_trigger_rate
        );
    }
}
