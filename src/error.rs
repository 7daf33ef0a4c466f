//! Centralized error type for the spartito umbrella crate.
//!
//! Wraps the analysis subsystem error so `?` propagates naturally across
//! the crate boundary. Per-frame no-detection outcomes never surface here;
//! a conversion that finds nothing returns an empty note list.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Analysis: {0}")]
    Analysis(#[from] spartito_analysis::Error),

    #[error("empty sample buffer")]
    EmptyBuffer,

    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(u32),

    #[error("channel length mismatch: channel {channel} has {got} samples, expected {expected}")]
    ChannelMismatch {
        channel: usize,
        got: usize,
        expected: usize,
    },

    #[error("invalid tempo: {0} BPM. Must be positive and finite")]
    InvalidTempo(f64),
}

pub type Result<T> = std::result::Result<T, Error>;
