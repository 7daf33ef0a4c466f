//! Error types for spartito-analysis.

use thiserror::Error;

/// Error type for detector configuration.
///
/// Per-frame "nothing detected" outcomes are not errors; detectors return
/// `None` for those and the scan continues.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid frequency band: {min} Hz .. {max} Hz")]
    InvalidBand { min: f32, max: f32 },
}

pub type Result<T> = std::result::Result<T, Error>;
