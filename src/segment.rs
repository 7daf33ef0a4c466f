//! Note segmentation: merging per-frame estimates into discrete notes.
//!
//! Each capture mode has its own routine. Segmentation uses hard frame
//! cuts; there is no cross-fade or legato re-linking beyond the melody
//! mode's ±1-semitone tolerance. Every merged frame contributes one hop of
//! duration, and seconds are mapped to beats with the caller's
//! beats-per-second factor.

use crate::note::MidiNote;
use spartito_analysis::{ChordEstimate, DrumClass, PitchEstimate, TransientEvent};

/// Notes shorter than this are discarded as noise (melody mode).
pub const MIN_NOTE_SECS: f64 = 0.05;
/// Chord intervals shorter than this (in beats) are discarded.
pub const MIN_CHORD_BEATS: f64 = 0.5;
/// Length of every emitted drum note in beats.
pub const DRUM_NOTE_BEATS: f64 = 0.25;

/// Pitch estimates carry no amplitude, so melodic and harmonic notes all
/// get this velocity.
const MELODIC_VELOCITY: f32 = 0.8;

/// General MIDI drum pitches.
const KICK_PITCH: u8 = 36;
const SNARE_PITCH: u8 = 38;
const HAT_PITCH: u8 = 42;

/// Sequential note ids, unique within one conversion.
struct NoteIds(usize);

impl NoteIds {
    fn new() -> Self {
        Self(0)
    }

    fn next(&mut self) -> String {
        self.0 += 1;
        format!("note-{}", self.0)
    }
}

/// Merge per-frame pitch estimates into notes.
///
/// `estimates` holds one entry per analysis frame in time order (`None` =
/// unvoiced frame). Consecutive estimates merge into the open note while
/// they stay within ±1 semitone of its pitch; a pitch change, an unvoiced
/// frame, or the end of the stream closes it. Notes accumulating less than
/// [`MIN_NOTE_SECS`] are dropped.
pub fn segment_melody(
    estimates: &[Option<PitchEstimate>],
    hop_secs: f64,
    beats_per_sec: f64,
) -> Vec<MidiNote> {
    let mut notes = Vec::new();
    let mut ids = NoteIds::new();
    let mut pending: Option<PendingPitch> = None;

    for estimate in estimates {
        match estimate {
            Some(e) => {
                let merged = match &mut pending {
                    Some(open) if (e.midi_note as i16 - open.pitch as i16).abs() <= 1 => {
                        open.duration_secs += hop_secs;
                        true
                    }
                    _ => false,
                };
                if !merged {
                    flush_pitch(pending.take(), &mut ids, beats_per_sec, &mut notes);
                    pending = Some(PendingPitch {
                        pitch: e.midi_note,
                        start_secs: e.time,
                        duration_secs: hop_secs,
                    });
                }
            }
            None => flush_pitch(pending.take(), &mut ids, beats_per_sec, &mut notes),
        }
    }
    flush_pitch(pending.take(), &mut ids, beats_per_sec, &mut notes);

    notes
}

struct PendingPitch {
    pitch: u8,
    start_secs: f64,
    duration_secs: f64,
}

fn flush_pitch(
    pending: Option<PendingPitch>,
    ids: &mut NoteIds,
    beats_per_sec: f64,
    notes: &mut Vec<MidiNote>,
) {
    let Some(open) = pending else { return };
    if open.duration_secs + 1e-9 >= MIN_NOTE_SECS {
        notes.push(MidiNote {
            id: ids.next(),
            pitch: open.pitch,
            start: open.start_secs * beats_per_sec,
            duration: open.duration_secs * beats_per_sec,
            velocity: MELODIC_VELOCITY,
        });
    }
}

/// Merge per-frame chords into sustained intervals.
///
/// Consecutive frames sharing a pitch fingerprint merge into one interval;
/// on close, one note per pitch is emitted with a shared start and
/// duration, provided the interval lasted at least [`MIN_CHORD_BEATS`].
pub fn segment_harmony(
    chords: &[Option<ChordEstimate>],
    hop_secs: f64,
    beats_per_sec: f64,
) -> Vec<MidiNote> {
    let mut notes = Vec::new();
    let mut ids = NoteIds::new();
    let mut pending: Option<PendingChord> = None;

    for chord in chords {
        match chord {
            Some(c) => {
                let fingerprint = chord_fingerprint(&c.midi_pitches);
                let merged = match &mut pending {
                    Some(open) if open.fingerprint == fingerprint => {
                        open.duration_secs += hop_secs;
                        true
                    }
                    _ => false,
                };
                if !merged {
                    flush_chord(pending.take(), &mut ids, beats_per_sec, &mut notes);
                    let mut pitches = c.midi_pitches.clone();
                    pitches.sort_unstable();
                    pending = Some(PendingChord {
                        fingerprint,
                        pitches,
                        start_secs: c.time,
                        duration_secs: hop_secs,
                    });
                }
            }
            None => flush_chord(pending.take(), &mut ids, beats_per_sec, &mut notes),
        }
    }
    flush_chord(pending.take(), &mut ids, beats_per_sec, &mut notes);

    notes
}

struct PendingChord {
    fingerprint: String,
    pitches: Vec<u8>,
    start_secs: f64,
    duration_secs: f64,
}

fn flush_chord(
    pending: Option<PendingChord>,
    ids: &mut NoteIds,
    beats_per_sec: f64,
    notes: &mut Vec<MidiNote>,
) {
    let Some(open) = pending else { return };
    let duration_beats = open.duration_secs * beats_per_sec;
    if duration_beats + 1e-9 >= MIN_CHORD_BEATS {
        for pitch in open.pitches {
            notes.push(MidiNote {
                id: ids.next(),
                pitch,
                start: open.start_secs * beats_per_sec,
                duration: duration_beats,
                velocity: MELODIC_VELOCITY,
            });
        }
    }
}

/// Map accepted transients straight to drum notes; no merging.
pub fn segment_drums(events: &[TransientEvent], beats_per_sec: f64) -> Vec<MidiNote> {
    let mut ids = NoteIds::new();
    events
        .iter()
        .map(|event| MidiNote {
            id: ids.next(),
            pitch: drum_pitch(event.class),
            start: event.time * beats_per_sec,
            duration: DRUM_NOTE_BEATS,
            velocity: event.velocity,
        })
        .collect()
}

/// Fixed General-MIDI-style pitch for each drum class.
pub fn drum_pitch(class: DrumClass) -> u8 {
    match class {
        DrumClass::Kick => KICK_PITCH,
        DrumClass::Snare => SNARE_PITCH,
        DrumClass::Hat => HAT_PITCH,
    }
}

/// Order-insensitive identity of a chord: sorted pitches, comma-joined.
fn chord_fingerprint(pitches: &[u8]) -> String {
    let mut sorted = pitches.to_vec();
    sorted.sort_unstable();
    sorted
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
