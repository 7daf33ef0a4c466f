//! Symbolic note output types.

/// One editable note event, ready to be placed on a timeline.
///
/// Owned by the caller after conversion returns. Timing is expressed in
/// beats (see the tempo parameter on the converter builder for the
/// seconds-to-beats mapping).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct MidiNote {
    /// Identifier unique within one conversion (`"note-1"`, `"note-2"`, …).
    pub id: String,
    /// MIDI pitch, 0..=127.
    pub pitch: u8,
    /// Start position in beats, ≥ 0.
    pub start: f64,
    /// Length in beats, > 0.
    pub duration: f64,
    /// Normalized velocity in (0, 1].
    pub velocity: f32,
}

/// Everything a conversion produced.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct ConversionResult {
    /// Notes ordered by start time.
    pub notes: Vec<MidiNote>,
    /// Reserved: tempo estimation is not implemented.
    pub tempo: Option<f32>,
    /// Reserved: key estimation is not implemented.
    pub key: Option<String>,
}
