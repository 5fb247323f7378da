//! This crate contains architecture-agnostic logic for Source Voice, the control firmware of a MIDI-controlled analog
//! synthesizer voice. It scans a panel of potentiometers and buttons into synthesis parameters and runs the performance
//! features (an arpeggiator and a two-track step sequencer) that generate timed note/gate events for the
//! [CV/gate](https://en.wikipedia.org/wiki/CV/gate) output stage.
//!
//! Everything here is driven by a single cooperative loop: the caller reads the [`time_base`], scans one slice of the
//! [`control_surface`], and ticks the engines in [`performance`]. Nothing blocks and nothing allocates; hardware is
//! reached only through the collaborator traits ([`control_surface::ControlInputs`], [`output::OutputStage`],
//! [`parameters::ParameterStore`] and [`configuration::Persistence`]).

#![deny(missing_docs)]
#![no_std]

#[cfg(test)]
extern crate std;

// must come first so the other modules see its macros
mod fmt;

pub mod configuration;
pub mod control_surface;
pub mod midi;
pub mod output;
pub mod parameters;
pub mod performance;
pub mod time_base;

#[cfg(test)]
mod test_support;
