//! Step and gate timing shared by the arpeggiator and the sequencer tracks.

use crate::{
    control_surface::AnalogControl,
    output::OutputStage,
    parameters::{PARAM_MAX, ParamId, ParameterStore},
    time_base::Micros,
};
use wmidi::Note;

/// Shortest step the rate knob can select (knob fully clockwise).
pub const FASTEST_STEP_MICROS: u32 = 50_000;

/// How much longer a step gets for each unit the rate knob turns counter-clockwise.
const MICROS_PER_RATE_UNIT: u32 = 1_000;

/// Converts a rate parameter to the length of one step. Higher values step faster: 0 gives 1.073s and [`PARAM_MAX`]
/// gives [`FASTEST_STEP_MICROS`].
pub fn step_micros_for_rate(rate: u16) -> u32 {
    FASTEST_STEP_MICROS + u32::from(PARAM_MAX - rate.min(PARAM_MAX)) * MICROS_PER_RATE_UNIT
}

/// Where an engine takes its tempo from, and how much of each step the gate stays high.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineTiming {
    /// The parameter read as the step rate on every tick.
    pub rate: ParamId,
    /// Share of the step the gate is held high, in percent. Clamped to `1..=99` so every step has a gate-low interval
    /// for the envelopes to retrigger on.
    pub gate_percent: u8,
}

impl Default for EngineTiming {
    fn default() -> Self {
        Self {
            rate: ParamId::Knob(AnalogControl::LfoRate),
            gate_percent: 80,
        }
    }
}

impl EngineTiming {
    /// Reads the rate from `params` and derives the step and gate durations.
    pub fn resolve(&self, params: &impl ParameterStore) -> StepTiming {
        StepTiming::new(step_micros_for_rate(params.get(self.rate)), self.gate_percent)
    }
}

/// Durations of one step and of the gate-high part of it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepTiming {
    /// Microseconds from one step to the next.
    pub step_micros: u32,
    /// Microseconds the gate stays high within a step.
    pub gate_micros: u32,
}

impl StepTiming {
    /// Derives the gate duration as `gate_percent` of `step_micros`.
    pub fn new(step_micros: u32, gate_percent: u8) -> Self {
        let gate_percent = u64::from(gate_percent.clamp(1, 99));
        Self {
            step_micros,
            gate_micros: (u64::from(step_micros) * gate_percent / 100) as u32,
        }
    }

    fn rest_micros(&self) -> u32 {
        self.step_micros - self.gate_micros
    }
}

/// The two halves of a step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GatePhase {
    /// The gate-low part at the end of a step (also the phase of an engine that hasn't started).
    GateOff,
    /// The gate-high part at the start of a step.
    GateOn,
}

/// A phase boundary crossed by [`GateCycle::advance`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GateEdge {
    /// The first step after a (re)start. The cursor stays where it is.
    Start,
    /// The start of every later step. The cursor moves on.
    Rise,
    /// The end of a step's gate-high part.
    Fall,
}

/// Two-phase step clock.
///
/// Each boundary is scheduled from the previous one rather than from the tick that noticed it, so loop jitter doesn't
/// accumulate into tempo drift. If the loop falls more than a whole step behind, the schedule restarts from `now`
/// instead of firing a burst of catch-up steps.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GateCycle {
    phase: GatePhase,
    /// When the current phase began; `None` until the first tick after a restart.
    since: Option<Micros>,
}

impl Default for GateCycle {
    fn default() -> Self {
        Self::new()
    }
}

impl GateCycle {
    /// Constructs a stopped [`GateCycle`].
    pub const fn new() -> Self {
        Self {
            phase: GatePhase::GateOff,
            since: None,
        }
    }

    /// Forgets the schedule; the next [`advance`](Self::advance) returns [`GateEdge::Start`].
    pub fn restart(&mut self) {
        *self = Self::new();
    }

    /// The current phase.
    pub fn phase(&self) -> GatePhase {
        self.phase
    }

    /// Returns `true` once the first step after a restart has begun.
    pub fn is_running(&self) -> bool {
        self.since.is_some()
    }

    /// Moves the clock towards `now`, returning the next boundary crossed, if any.
    ///
    /// Each call crosses at most one boundary, so a tick that arrives after several of them has to keep calling until
    /// this returns `None`.
    pub fn advance(&mut self, now: Micros, timing: StepTiming) -> Option<GateEdge> {
        let Some(since) = self.since else {
            self.since = Some(now);
            self.phase = GatePhase::GateOn;
            return Some(GateEdge::Start);
        };

        let duration = match self.phase {
            GatePhase::GateOn => timing.gate_micros,
            GatePhase::GateOff => timing.rest_micros(),
        }
        .max(1);
        let elapsed = now.elapsed_since(since);
        if elapsed < duration {
            return None;
        }

        self.since = Some(if elapsed - duration > timing.step_micros {
            now
        } else {
            since + duration
        });
        match self.phase {
            GatePhase::GateOn => {
                self.phase = GatePhase::GateOff;
                Some(GateEdge::Fall)
            }
            GatePhase::GateOff => {
                self.phase = GatePhase::GateOn;
                Some(GateEdge::Rise)
            }
        }
    }
}

/// Tracks whether an engine currently holds the gate high, so that a gate-off is emitted exactly once for every gate-on.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Gate {
    high: bool,
}

impl Gate {
    /// Sounds `note`: selects it, raises the gate and fires the trigger. A gate that is somehow still high is dropped
    /// first so the envelopes see a fresh edge.
    pub fn open(&mut self, note: Note, out: &mut impl OutputStage) {
        if self.high {
            out.gate(false);
        }
        out.note_select(note);
        out.gate(true);
        out.trigger();
        self.high = true;
    }

    /// Lowers the gate if this engine raised it.
    pub fn close(&mut self, out: &mut impl OutputStage) {
        if self.high {
            out.gate(false);
            self.high = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RATE_250_MS;

    const TIMING: StepTiming = StepTiming {
        step_micros: 250_000,
        gate_micros: 200_000,
    };

    #[test]
    fn rate_mapping() {
        assert_eq!(1_073_000, step_micros_for_rate(0));
        assert_eq!(250_000, step_micros_for_rate(RATE_250_MS));
        assert_eq!(FASTEST_STEP_MICROS, step_micros_for_rate(PARAM_MAX));
        assert_eq!(FASTEST_STEP_MICROS, step_micros_for_rate(u16::MAX));
    }

    #[test]
    fn gate_is_eighty_percent_by_default() {
        let mut params = crate::parameters::PanelParameters::default();
        params.set(ParamId::Knob(AnalogControl::LfoRate), RATE_250_MS);
        assert_eq!(TIMING, EngineTiming::default().resolve(&params));
    }

    #[test]
    fn gate_percent_is_clamped() {
        assert_eq!(247_500, StepTiming::new(250_000, 100).gate_micros);
        assert_eq!(2_500, StepTiming::new(250_000, 0).gate_micros);
    }

    #[test]
    fn cycle_edges() {
        let mut cycle = GateCycle::new();
        assert!(!cycle.is_running());
        assert_eq!(Some(GateEdge::Start), cycle.advance(Micros(1_000), TIMING));
        assert_eq!(GatePhase::GateOn, cycle.phase());
        assert_eq!(None, cycle.advance(Micros(1_000), TIMING));
        assert_eq!(None, cycle.advance(Micros(200_999), TIMING));
        assert_eq!(Some(GateEdge::Fall), cycle.advance(Micros(201_000), TIMING));
        assert_eq!(None, cycle.advance(Micros(250_999), TIMING));
        assert_eq!(Some(GateEdge::Rise), cycle.advance(Micros(251_000), TIMING));
    }

    #[test]
    fn late_ticks_do_not_drift() {
        let mut cycle = GateCycle::new();
        cycle.advance(Micros(0), TIMING);
        assert_eq!(Some(GateEdge::Fall), cycle.advance(Micros(203_000), TIMING));
        // the rest phase is measured from 200_000, not from the late tick
        assert_eq!(Some(GateEdge::Rise), cycle.advance(Micros(250_000), TIMING));
        assert_eq!(Some(GateEdge::Fall), cycle.advance(Micros(450_000), TIMING));
    }

    fn crossed(cycle: &mut GateCycle, now: u32) -> std::vec::Vec<GateEdge> {
        std::iter::from_fn(|| cycle.advance(Micros(now), TIMING)).collect()
    }

    #[test]
    fn one_tick_can_cross_fall_and_rise() {
        let mut cycle = GateCycle::new();
        cycle.advance(Micros(0), TIMING);
        assert_eq!(std::vec![GateEdge::Fall, GateEdge::Rise], crossed(&mut cycle, 250_000));
        assert_eq!(GatePhase::GateOn, cycle.phase());
        // the next step is still scheduled from 250_000
        assert_eq!(None, cycle.advance(Micros(449_999), TIMING));
        assert_eq!(Some(GateEdge::Fall), cycle.advance(Micros(450_000), TIMING));
    }

    #[test]
    fn edges_stop_after_a_resync() {
        let mut cycle = GateCycle::new();
        cycle.advance(Micros(0), TIMING);
        assert_eq!(
            std::vec![GateEdge::Fall],
            crossed(&mut cycle, 1_000_000),
            "No burst of catch-up steps"
        );
    }

    #[test]
    fn very_late_ticks_resync() {
        let mut cycle = GateCycle::new();
        cycle.advance(Micros(0), TIMING);
        assert_eq!(Some(GateEdge::Fall), cycle.advance(Micros(1_000_000), TIMING));
        assert_eq!(None, cycle.advance(Micros(1_049_999), TIMING));
        assert_eq!(Some(GateEdge::Rise), cycle.advance(Micros(1_050_000), TIMING));
    }

    #[test]
    fn cycle_spans_counter_wraparound() {
        let start = Micros(u32::MAX - 100_000);
        let mut cycle = GateCycle::new();
        cycle.advance(start, TIMING);
        assert_eq!(Some(GateEdge::Fall), cycle.advance(start + 200_000, TIMING));
        assert_eq!(Some(GateEdge::Rise), cycle.advance(start + 250_000, TIMING));
    }

    #[test]
    fn restart_starts_over() {
        let mut cycle = GateCycle::new();
        cycle.advance(Micros(0), TIMING);
        cycle.restart();
        assert_eq!(GatePhase::GateOff, cycle.phase());
        assert_eq!(Some(GateEdge::Start), cycle.advance(Micros(10), TIMING));
    }
}
