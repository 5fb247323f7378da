//! The two-track step sequencer. Each track records a run of notes and rests, then loops it at the panel's step rate.

use super::gate_cycle::{EngineTiming, Gate, GateCycle, GateEdge, GatePhase, StepTiming};
use crate::{output::OutputStage, parameters::ParameterStore, time_base::Micros};
use tinyvec::ArrayVec;
use wmidi::Note;

/// Most steps a track records. Further captures are ignored.
pub const SEQ_CAPACITY: usize = 64;

/// Byte stored for a rest. Distinct from every MIDI note number.
pub const REST: u8 = 255;

/// One step of a sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Sound this note for the step.
    Note(Note),
    /// Keep the gate low for the step.
    Rest,
}

impl Step {
    fn to_byte(self) -> u8 {
        match self {
            Step::Note(note) => note as u8,
            Step::Rest => REST,
        }
    }

    fn from_byte(byte: u8) -> Self {
        match byte {
            REST => Step::Rest,
            n => Step::Note(Note::from_u8_lossy(n)),
        }
    }
}

impl From<Note> for Step {
    fn from(note: Note) -> Self {
        Step::Note(note)
    }
}

/// Selects one of the two tracks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TrackId {
    /// The first track.
    One,
    /// The second track.
    Two,
}

impl TrackId {
    /// Both tracks, in order.
    pub const ALL: [TrackId; 2] = [TrackId::One, TrackId::Two];

    fn index(self) -> usize {
        match self {
            TrackId::One => 0,
            TrackId::Two => 1,
        }
    }

    fn other(self) -> Self {
        match self {
            TrackId::One => TrackId::Two,
            TrackId::Two => TrackId::One,
        }
    }
}

/// Run state of a track.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TrackState {
    /// Empty and silent.
    #[default]
    Idle,
    /// Capturing steps.
    Recording,
    /// Looping its steps.
    Playing,
    /// Holding its steps, silent.
    Stopped,
}

#[derive(Clone, Debug, Default, PartialEq)]
struct Track {
    state: TrackState,
    /// Steps as bytes; see [`Step::to_byte`].
    steps: ArrayVec<[u8; SEQ_CAPACITY]>,
    cursor: usize,
    cycle: GateCycle,
    gate: Gate,
}

impl Track {
    fn tick(&mut self, now: Micros, timing: StepTiming, out: &mut impl OutputStage) {
        if self.state != TrackState::Playing || self.steps.is_empty() {
            self.gate.close(out);
            return;
        }

        while let Some(edge) = self.cycle.advance(now, timing) {
            match edge {
                GateEdge::Start => {
                    self.cursor = 0;
                    self.sound(out);
                }
                GateEdge::Rise => {
                    self.cursor = (self.cursor + 1) % self.steps.len();
                    self.sound(out);
                }
                GateEdge::Fall => self.gate.close(out),
            }
        }
    }

    fn sound(&mut self, out: &mut impl OutputStage) {
        match Step::from_byte(self.steps[self.cursor]) {
            Step::Note(note) => {
                trace!("Sequencer step {}: note {}", self.cursor, note as u8);
                self.gate.open(note, out);
            }
            // lowers a gate left high by a restart
            Step::Rest => self.gate.close(out),
        }
    }
}

/// Two independent sequencer tracks sharing one step rate.
///
/// Only one track records at a time; both may play at once, each with its own cursor and gate cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct StepSequencerEngine {
    tracks: [Track; 2],
    timing: EngineTiming,
}

impl Default for StepSequencerEngine {
    fn default() -> Self {
        Self::new(EngineTiming::default())
    }
}

impl StepSequencerEngine {
    /// Constructs a sequencer with two empty tracks.
    pub fn new(timing: EngineTiming) -> Self {
        Self {
            tracks: Default::default(),
            timing,
        }
    }

    fn track(&self, id: TrackId) -> &Track {
        &self.tracks[id.index()]
    }

    fn track_mut(&mut self, id: TrackId) -> &mut Track {
        &mut self.tracks[id.index()]
    }

    /// Run state of `track`.
    pub fn state(&self, track: TrackId) -> TrackState {
        self.track(track).state
    }

    /// The steps recorded on `track`, in order.
    pub fn steps(&self, track: TrackId) -> impl Iterator<Item = Step> + '_ {
        self.track(track).steps.iter().map(|&b| Step::from_byte(b))
    }

    /// Index of the step `track` is playing (or last played).
    pub fn cursor(&self, track: TrackId) -> usize {
        self.track(track).cursor
    }

    /// Gate phase of `track`.
    pub fn phase(&self, track: TrackId) -> GatePhase {
        self.track(track).cycle.phase()
    }

    /// The track currently recording, if any.
    pub fn record_target(&self) -> Option<TrackId> {
        TrackId::ALL
            .into_iter()
            .find(|&id| self.state(id) == TrackState::Recording)
    }

    /// Empties `track` and starts capturing into it. Ends any recording on the other track first; a playing `track`
    /// stops, and its gate is lowered on the next tick.
    pub fn start_recording(&mut self, track: TrackId) {
        self.stop_recording(track.other());
        info!("Track {} recording", track);
        let t = self.track_mut(track);
        t.steps.clear();
        t.cursor = 0;
        t.cycle.restart();
        t.state = TrackState::Recording;
    }

    /// Appends `step` to `track`. Ignored unless the track is recording, or once it holds [`SEQ_CAPACITY`] steps.
    pub fn capture_step(&mut self, track: TrackId, step: Step) {
        let t = self.track_mut(track);
        if t.state != TrackState::Recording {
            return;
        }
        if t.steps.len() < SEQ_CAPACITY {
            t.steps.push(step.to_byte());
            debug!("Track {} captured step {}", track, t.steps.len() - 1);
        } else {
            warn!("Track {} full; ignoring step", track);
        }
    }

    /// Ends recording on `track`, which keeps what it captured. Does nothing if the track isn't recording.
    pub fn stop_recording(&mut self, track: TrackId) {
        let t = self.track_mut(track);
        if t.state == TrackState::Recording {
            t.state = TrackState::Stopped;
            info!("Track {} recorded {} steps", track, t.steps.len());
        }
    }

    /// Plays `track` from its first step, ending its recording first if needed. An empty track plays silently.
    pub fn start_playing(&mut self, track: TrackId) {
        self.stop_recording(track);
        info!("Track {} playing", track);
        let t = self.track_mut(track);
        t.cursor = 0;
        t.cycle.restart();
        t.state = TrackState::Playing;
    }

    /// Silences `track` while keeping its steps. A recording track ends its recording instead. A gate left high is
    /// lowered on the next tick.
    pub fn stop(&mut self, track: TrackId) {
        match self.state(track) {
            TrackState::Recording => self.stop_recording(track),
            TrackState::Playing => {
                info!("Track {} stopped", track);
                let t = self.track_mut(track);
                t.cycle.restart();
                t.state = TrackState::Stopped;
            }
            TrackState::Idle | TrackState::Stopped => {}
        }
    }

    /// Forgets the steps of `track` and returns it to [`TrackState::Idle`].
    pub fn clear(&mut self, track: TrackId) {
        info!("Track {} cleared", track);
        let t = self.track_mut(track);
        t.steps.clear();
        t.cursor = 0;
        t.cycle.restart();
        t.state = TrackState::Idle;
    }

    /// Advances every playing track to `now`, reading the step rate from `params`. A rest step moves the cursor on
    /// schedule without selecting a note, raising the gate or firing the trigger.
    pub fn tick(&mut self, now: Micros, params: &impl ParameterStore, out: &mut impl OutputStage) {
        let timing = self.timing.resolve(params);
        for track in self.tracks.iter_mut() {
            track.tick(now, timing, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        OutputEvent, RATE_250_MS, RecordingOutput, note_events, params_with_rate, tick_at,
    };
    use std::{vec, vec::Vec};

    fn recorded(track: TrackId, steps: &[Step]) -> StepSequencerEngine {
        let mut seq = StepSequencerEngine::default();
        seq.start_recording(track);
        for &step in steps {
            seq.capture_step(track, step);
        }
        seq.stop_recording(track);
        seq
    }

    const PATTERN: [Step; 4] = [
        Step::Note(Note::C4),
        Step::Rest,
        Step::Note(Note::E4),
        Step::Rest,
    ];

    #[test]
    fn state_machine() {
        let mut seq = StepSequencerEngine::default();
        assert_eq!(TrackState::Idle, seq.state(TrackId::One));
        seq.start_recording(TrackId::One);
        assert_eq!(TrackState::Recording, seq.state(TrackId::One));
        assert_eq!(Some(TrackId::One), seq.record_target());
        seq.stop_recording(TrackId::One);
        assert_eq!(TrackState::Stopped, seq.state(TrackId::One));
        assert_eq!(None, seq.record_target());
        seq.start_playing(TrackId::One);
        assert_eq!(TrackState::Playing, seq.state(TrackId::One));
        seq.stop(TrackId::One);
        assert_eq!(TrackState::Stopped, seq.state(TrackId::One));
        seq.clear(TrackId::One);
        assert_eq!(TrackState::Idle, seq.state(TrackId::One));
        assert_eq!(0, seq.steps(TrackId::One).count());
    }

    #[test]
    fn stop_recording_when_not_recording_is_a_no_op() {
        let mut seq = StepSequencerEngine::default();
        seq.stop_recording(TrackId::Two);
        assert_eq!(TrackState::Idle, seq.state(TrackId::Two));
    }

    #[test]
    fn one_record_target_at_a_time() {
        let mut seq = StepSequencerEngine::default();
        seq.start_recording(TrackId::One);
        seq.capture_step(TrackId::One, Step::Note(Note::C4));
        seq.start_recording(TrackId::Two);
        assert_eq!(TrackState::Stopped, seq.state(TrackId::One));
        assert_eq!(1, seq.steps(TrackId::One).count(), "The ended recording keeps its steps");
        assert_eq!(Some(TrackId::Two), seq.record_target());
    }

    #[test]
    fn captures_are_ignored_unless_recording() {
        let mut seq = recorded(TrackId::One, &[Step::Rest]);
        seq.capture_step(TrackId::One, Step::Note(Note::C4));
        seq.capture_step(TrackId::Two, Step::Note(Note::C4));
        assert_eq!(vec![Step::Rest], seq.steps(TrackId::One).collect::<Vec<_>>());
        assert_eq!(0, seq.steps(TrackId::Two).count());
    }

    #[test]
    fn rerecording_replaces_steps() {
        let mut seq = recorded(TrackId::One, &PATTERN);
        seq.start_recording(TrackId::One);
        assert_eq!(0, seq.steps(TrackId::One).count());
    }

    #[test]
    fn track_is_bounded() {
        let mut seq = StepSequencerEngine::default();
        seq.start_recording(TrackId::Two);
        for n in 0..SEQ_CAPACITY as u8 + 10 {
            seq.capture_step(TrackId::Two, Step::Note(Note::from_u8_lossy(n)));
        }
        assert_eq!(SEQ_CAPACITY, seq.steps(TrackId::Two).count());
        assert_eq!(
            Some(Step::Note(Note::from_u8_lossy(SEQ_CAPACITY as u8 - 1))),
            seq.steps(TrackId::Two).last()
        );
    }

    #[test]
    fn plays_notes_and_rests_on_schedule() {
        let mut seq = recorded(TrackId::One, &PATTERN);
        seq.start_playing(TrackId::One);
        let params = params_with_rate(RATE_250_MS);
        let ticks = tick_at(
            &[0, 200_000, 250_000, 450_000, 500_000, 700_000, 750_000, 1_000_000],
            |now, out| seq.tick(now, &params, out),
        );

        let expected: Vec<(u32, Vec<OutputEvent>)> = vec![
            (0, note_events(Note::C4)),
            (200_000, vec![OutputEvent::Gate(false)]),
            (250_000, vec![]),
            (450_000, vec![]),
            (500_000, note_events(Note::E4)),
            (700_000, vec![OutputEvent::Gate(false)]),
            (750_000, vec![]),
            (1_000_000, note_events(Note::C4)),
        ];
        assert_eq!(expected, ticks);
    }

    #[test]
    fn rest_still_advances_cursor() {
        let mut seq = recorded(TrackId::One, &PATTERN);
        seq.start_playing(TrackId::One);
        let params = params_with_rate(RATE_250_MS);
        let mut out = RecordingOutput::default();
        for t in [0, 200_000, 250_000] {
            seq.tick(Micros(t), &params, &mut out);
        }
        assert_eq!(1, seq.cursor(TrackId::One));
        assert_eq!(GatePhase::GateOn, seq.phase(TrackId::One));
    }

    #[test]
    fn round_trip_repeats_identically() {
        let steps: Vec<Step> = (0..SEQ_CAPACITY as u8)
            .map(|n| {
                if n % 5 == 0 {
                    Step::Rest
                } else {
                    Step::Note(Note::from_u8_lossy(30 + n))
                }
            })
            .collect();
        let mut seq = recorded(TrackId::Two, &steps);
        seq.start_playing(TrackId::Two);
        let params = params_with_rate(RATE_250_MS);

        let times: Vec<u32> = (0..2 * SEQ_CAPACITY as u32)
            .flat_map(|i| [i * 250_000, i * 250_000 + 200_000])
            .collect();
        let selected: Vec<Option<Note>> = tick_at(&times, |now, out| seq.tick(now, &params, out))
            .into_iter()
            .step_by(2)
            .map(|(_, events)| {
                events.into_iter().find_map(|e| match e {
                    OutputEvent::NoteSelect(n) => Some(n),
                    _ => None,
                })
            })
            .collect();

        let expected: Vec<Option<Note>> = steps
            .iter()
            .chain(steps.iter())
            .map(|s| match s {
                Step::Note(n) => Some(*n),
                Step::Rest => None,
            })
            .collect();
        assert_eq!(expected, selected);
    }

    #[test]
    fn empty_track_plays_silently() {
        let mut seq = recorded(TrackId::One, &[]);
        seq.start_playing(TrackId::One);
        assert_eq!(TrackState::Playing, seq.state(TrackId::One));
        let params = params_with_rate(RATE_250_MS);
        let ticks = tick_at(&[0, 250_000, 500_000], |now, out| seq.tick(now, &params, out));
        assert!(ticks.iter().all(|(_, events)| events.is_empty()));
    }

    #[test]
    fn tracks_are_independent() {
        let mut seq = recorded(TrackId::One, &[Step::Note(Note::C4), Step::Note(Note::D4)]);
        seq.start_recording(TrackId::Two);
        seq.capture_step(TrackId::Two, Step::Note(Note::G4));
        seq.start_playing(TrackId::Two);
        let params = params_with_rate(RATE_250_MS);
        let mut out = RecordingOutput::default();

        seq.start_playing(TrackId::One);
        seq.tick(Micros(0), &params, &mut out);
        assert_eq!(
            [note_events(Note::C4), note_events(Note::G4)].concat(),
            out.take()
        );

        seq.stop(TrackId::Two);
        seq.tick(Micros(200_000), &params, &mut out);
        assert_eq!(
            vec![OutputEvent::Gate(false), OutputEvent::Gate(false)],
            out.take(),
            "Track 1 falls on schedule, stopped track 2 lowers its gate once"
        );
        seq.tick(Micros(250_000), &params, &mut out);
        assert_eq!(note_events(Note::D4), out.take());
        assert_eq!(TrackState::Stopped, seq.state(TrackId::Two));
    }

    #[test]
    fn recording_a_playing_track_lowers_its_gate() {
        let mut seq = recorded(TrackId::One, &[Step::Note(Note::C4)]);
        seq.start_playing(TrackId::One);
        let params = params_with_rate(RATE_250_MS);
        let mut out = RecordingOutput::default();
        seq.tick(Micros(0), &params, &mut out);
        out.take();
        seq.start_recording(TrackId::One);
        seq.tick(Micros(1), &params, &mut out);
        assert_eq!(vec![OutputEvent::Gate(false)], out.take());
        seq.tick(Micros(300_000), &params, &mut out);
        assert!(out.take().is_empty());
    }

    #[test]
    fn idempotent_ticks() {
        let mut seq = recorded(TrackId::One, &PATTERN);
        seq.start_playing(TrackId::One);
        let params = params_with_rate(RATE_250_MS);
        let mut out = RecordingOutput::default();
        seq.tick(Micros(0), &params, &mut out);
        out.take();
        for _ in 0..5 {
            seq.tick(Micros(150_000), &params, &mut out);
        }
        assert!(out.take().is_empty());
    }
}
