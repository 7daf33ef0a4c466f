//! Conversion orchestrator: frames a decoded buffer, runs the selected
//! mode's detector, and segments the per-frame estimates into notes.
//!
//! The scan is synchronous and strictly time-ordered. Framing goes through
//! the lazy [`Frames`](crate::buffer::Frames) iterator, so the loop yields
//! at frame boundaries and a host can drive the same plumbing
//! incrementally. Progress is reported through an optional callback with a
//! stage label and a monotonically non-decreasing percentage; the final
//! call is always `("Complete", 100)`.

use crate::buffer::SampleBuffer;
use crate::error::{Error, Result};
use crate::note::{ConversionResult, MidiNote};
use crate::segment;
use spartito_analysis::{
    pitch, spectrum, transient, HarmonyDetector, PeakOrder, PitchDetector, TransientDetector,
};
use tracing::debug;

/// Capture mode. Selects the detector, the frame/hop configuration, and the
/// segmentation routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum Mode {
    /// Monophonic pitch tracking (default).
    #[default]
    Melody,
    /// Multi-pitch capture, up to four simultaneous notes.
    Harmony,
    /// Percussive onset capture mapped to drum notes.
    Drums,
}

impl Mode {
    /// `(frame, hop)` in samples.
    fn frame_config(self) -> (usize, usize) {
        match self {
            Mode::Melody => (pitch::DEFAULT_FRAME_SIZE, pitch::DEFAULT_FRAME_SIZE / 2),
            Mode::Harmony => (spectrum::DEFAULT_FRAME_SIZE, spectrum::DEFAULT_HOP_SIZE),
            Mode::Drums => (transient::DEFAULT_FRAME_SIZE, transient::DEFAULT_HOP_SIZE),
        }
    }

    fn analyzing_stage(self) -> Stage {
        match self {
            Mode::Melody => Stage::AnalyzingMelody,
            Mode::Harmony => Stage::AnalyzingHarmony,
            Mode::Drums => Stage::AnalyzingDrums,
        }
    }
}

/// Orchestrator stages; their labels feed the progress callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Loading,
    AnalyzingMelody,
    AnalyzingHarmony,
    AnalyzingDrums,
    BuildingNotes,
    Complete,
}

impl Stage {
    fn label(self) -> &'static str {
        match self {
            Stage::Loading => "Loading",
            Stage::AnalyzingMelody => "Analyzing melody",
            Stage::AnalyzingHarmony => "Analyzing harmony",
            Stage::AnalyzingDrums => "Analyzing drums",
            Stage::BuildingNotes => "Building notes",
            Stage::Complete => "Complete",
        }
    }
}

/// Progress callback: `(stage label, percentage in 0..=100)`.
pub type ProgressCallback = Box<dyn FnMut(&str, f32)>;

/// Melody estimates below this confidence are treated as unvoiced frames.
const MELODY_CONFIDENCE: f32 = 0.8;
/// Frames between progress-callback invocations during analysis.
const PROGRESS_INTERVAL: usize = 50;
/// Analysis occupies the progress range up to here; the rest belongs to
/// note building and the final Complete call.
const ANALYSIS_PROGRESS_SPAN: f32 = 95.0;

/// The historical seconds→beats factor was a hard-coded ×4, i.e. a fixed
/// 240-BPM quarter-note grid independent of the host project's tempo. It is
/// kept as the default but exposed through [`ConverterBuilder::tempo`].
pub const DEFAULT_TEMPO_BPM: f64 = 240.0;

/// Configures and constructs a [`Converter`].
pub struct ConverterBuilder {
    mode: Mode,
    tempo_bpm: f64,
    peak_order: PeakOrder,
    progress: Option<ProgressCallback>,
}

impl Default for ConverterBuilder {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            tempo_bpm: DEFAULT_TEMPO_BPM,
            peak_order: PeakOrder::default(),
            progress: None,
        }
    }
}

impl ConverterBuilder {
    /// Default: [`Mode::Melody`].
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Tempo used for the seconds→beats mapping.
    /// Default: [`DEFAULT_TEMPO_BPM`].
    pub fn tempo(mut self, bpm: f64) -> Self {
        self.tempo_bpm = bpm;
        self
    }

    /// Tie-break applied before a frame's peak list is truncated to four
    /// pitches (harmony mode only). Default: [`PeakOrder::BinOrder`].
    pub fn peak_order(mut self, order: PeakOrder) -> Self {
        self.peak_order = order;
        self
    }

    /// Register a progress callback.
    pub fn on_progress(mut self, callback: impl FnMut(&str, f32) + 'static) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    pub fn build(self) -> Result<Converter> {
        if !(self.tempo_bpm.is_finite() && self.tempo_bpm > 0.0) {
            return Err(Error::InvalidTempo(self.tempo_bpm));
        }
        Ok(Converter {
            mode: self.mode,
            beats_per_sec: self.tempo_bpm / 60.0,
            peak_order: self.peak_order,
            progress: self.progress,
            last_progress: 0.0,
        })
    }
}

/// Top-level conversion entry point.
///
/// Accepts an already-decoded [`SampleBuffer`] and turns it into editable
/// notes. One converter can run any number of conversions; each run is
/// independent and uses fresh detector state.
pub struct Converter {
    mode: Mode,
    beats_per_sec: f64,
    peak_order: PeakOrder,
    progress: Option<ProgressCallback>,
    last_progress: f32,
}

impl Converter {
    pub fn builder() -> ConverterBuilder {
        ConverterBuilder::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Analyze the buffer and return the extracted notes.
    ///
    /// Runs to completion; there is no cancellation. A buffer in which
    /// nothing is detected yields an empty note list, not an error. The
    /// progress callback, if any, fires with non-decreasing percentages and
    /// ends with `("Complete", 100)` before this returns.
    pub fn convert(&mut self, buffer: &SampleBuffer) -> Result<ConversionResult> {
        self.last_progress = 0.0;
        self.report(Stage::Loading, 0.0);
        debug!(
            mode = ?self.mode,
            samples = buffer.len(),
            sample_rate = buffer.sample_rate(),
            "starting conversion"
        );

        let notes = match self.mode {
            Mode::Melody => self.scan_melody(buffer),
            Mode::Harmony => self.scan_harmony(buffer),
            Mode::Drums => self.scan_drums(buffer),
        };

        self.report(Stage::BuildingNotes, ANALYSIS_PROGRESS_SPAN);
        debug!(notes = notes.len(), "conversion finished");

        let result = ConversionResult {
            notes,
            tempo: None,
            key: None,
        };
        self.report(Stage::Complete, 100.0);
        Ok(result)
    }

    fn scan_melody(&mut self, buffer: &SampleBuffer) -> Vec<MidiNote> {
        let (frame_size, hop_size) = self.mode.frame_config();
        let sample_rate = buffer.sample_rate() as f64;
        let mut detector = PitchDetector::new(sample_rate);

        let frames = buffer.frames(frame_size, hop_size);
        let total = frames.len();
        let mut estimates = Vec::with_capacity(total);
        for (index, frame) in frames.enumerate() {
            let estimate = detector
                .detect(frame.samples, frame.time)
                .filter(|e| e.confidence > MELODY_CONFIDENCE);
            estimates.push(estimate);
            self.frame_progress(Stage::AnalyzingMelody, index, total);
        }

        segment::segment_melody(&estimates, hop_size as f64 / sample_rate, self.beats_per_sec)
    }

    fn scan_harmony(&mut self, buffer: &SampleBuffer) -> Vec<MidiNote> {
        let (frame_size, hop_size) = self.mode.frame_config();
        let sample_rate = buffer.sample_rate() as f64;
        let mut detector = HarmonyDetector::new(sample_rate);
        detector.set_peak_order(self.peak_order);

        let frames = buffer.frames(frame_size, hop_size);
        let total = frames.len();
        let mut chords = Vec::with_capacity(total);
        for (index, frame) in frames.enumerate() {
            chords.push(detector.detect(frame.samples, frame.time));
            self.frame_progress(Stage::AnalyzingHarmony, index, total);
        }

        segment::segment_harmony(&chords, hop_size as f64 / sample_rate, self.beats_per_sec)
    }

    fn scan_drums(&mut self, buffer: &SampleBuffer) -> Vec<MidiNote> {
        let (frame_size, hop_size) = self.mode.frame_config();
        let sample_rate = buffer.sample_rate() as f64;
        let mut detector = TransientDetector::new(sample_rate);

        let frames = buffer.frames(frame_size, hop_size);
        let total = frames.len();
        let mut events = Vec::new();
        for (index, frame) in frames.enumerate() {
            if let Some(event) = detector.detect(frame.samples, frame.time) {
                events.push(event);
            }
            self.frame_progress(Stage::AnalyzingDrums, index, total);
        }

        segment::segment_drums(&events, self.beats_per_sec)
    }

    fn frame_progress(&mut self, stage: Stage, index: usize, total: usize) {
        if total > 0 && (index + 1) % PROGRESS_INTERVAL == 0 {
            let pct = (index + 1) as f32 / total as f32 * ANALYSIS_PROGRESS_SPAN;
            self.report(stage, pct);
        }
    }

    /// Invoke the progress callback, clamped so reported percentages never
    /// decrease.
    fn report(&mut self, stage: Stage, pct: f32) {
        let pct = pct.max(self.last_progress).min(100.0);
        self.last_progress = pct;
        debug!(stage = stage.label(), progress = pct as f64, "stage progress");
        if let Some(callback) = self.progress.as_mut() {
            callback(stage.label(), pct);
        }
    }
}
