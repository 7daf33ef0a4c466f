//! Decoded sample buffers and lazy analysis framing.

use crate::error::{Error, Result};

/// An immutable, fully decoded audio buffer.
///
/// Holds one or more channels of float samples in `[-1, 1]` plus a sample
/// rate. Analysis reads channel 0 only; extra channels are carried for the
/// caller's benefit. Container/codec decoding happens upstream; a buffer
/// that fails validation here is surfaced once as a decode-class error and
/// never retried.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl SampleBuffer {
    /// Wrap decoded channels. All channels must share one length.
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(Error::InvalidSampleRate(sample_rate));
        }
        let expected = channels.first().map(Vec::len).unwrap_or(0);
        if expected == 0 {
            return Err(Error::EmptyBuffer);
        }
        for (channel, samples) in channels.iter().enumerate() {
            if samples.len() != expected {
                return Err(Error::ChannelMismatch {
                    channel,
                    got: samples.len(),
                    expected,
                });
            }
        }
        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Wrap a single decoded channel.
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        Self::new(vec![samples], sample_rate)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    /// The analyzed channel (channel 0).
    pub fn primary(&self) -> &[f32] {
        &self.channels[0]
    }

    pub fn duration_secs(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }

    /// Lazy iterator over fixed-size analysis windows of channel 0.
    ///
    /// Frames are produced on demand and strictly in time order, so a host
    /// can drive the scan incrementally (one frame per tick) instead of
    /// blocking on the whole buffer.
    pub fn frames(&self, frame_size: usize, hop_size: usize) -> Frames<'_> {
        Frames {
            samples: self.primary(),
            sample_rate: self.sample_rate as f64,
            frame_size,
            hop_size,
            position: 0,
        }
    }
}

/// A fixed-length window of a [`SampleBuffer`] plus its time offset.
///
/// Borrowed, produced on demand, never retained.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisFrame<'a> {
    pub samples: &'a [f32],
    /// Window start offset in seconds.
    pub time: f64,
}

/// Lazy, resumable iterator over analysis frames. See
/// [`SampleBuffer::frames`].
#[derive(Debug, Clone)]
pub struct Frames<'a> {
    samples: &'a [f32],
    sample_rate: f64,
    frame_size: usize,
    hop_size: usize,
    position: usize,
}

impl<'a> Iterator for Frames<'a> {
    type Item = AnalysisFrame<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let end = self.position.checked_add(self.frame_size)?;
        if end > self.samples.len() {
            return None;
        }
        let frame = AnalysisFrame {
            samples: &self.samples[self.position..end],
            time: self.position as f64 / self.sample_rate,
        };
        self.position += self.hop_size;
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.len();
        (len, Some(len))
    }
}

impl ExactSizeIterator for Frames<'_> {
    fn len(&self) -> usize {
        let remaining = self.samples.len().saturating_sub(self.position);
        if remaining < self.frame_size {
            0
        } else {
            (remaining - self.frame_size) / self.hop_size + 1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_buffer() {
        assert!(matches!(
            SampleBuffer::mono(vec![], 44100),
            Err(Error::EmptyBuffer)
        ));
        assert!(matches!(
            SampleBuffer::new(vec![], 44100),
            Err(Error::EmptyBuffer)
        ));
    }

    #[test]
    fn rejects_zero_sample_rate() {
        assert!(matches!(
            SampleBuffer::mono(vec![0.0; 16], 0),
            Err(Error::InvalidSampleRate(0))
        ));
    }

    #[test]
    fn rejects_mismatched_channel_lengths() {
        let err = SampleBuffer::new(vec![vec![0.0; 16], vec![0.0; 8]], 44100).unwrap_err();
        assert!(matches!(
            err,
            Error::ChannelMismatch {
                channel: 1,
                got: 8,
                expected: 16
            }
        ));
    }

    #[test]
    fn frames_cover_the_buffer_in_time_order() {
        let buffer = SampleBuffer::mono(vec![0.0; 1000], 1000).unwrap();
        let frames: Vec<_> = buffer.frames(256, 128).collect();

        // Positions 0, 128, 256, 384, 512, 640 fit; 768 + 256 > 1000.
        assert_eq!(frames.len(), 6);
        assert_eq!(buffer.frames(256, 128).len(), 6);
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(frame.samples.len(), 256);
            assert_eq!(frame.time, (i * 128) as f64 / 1000.0);
        }
    }

    #[test]
    fn short_buffer_yields_no_frames() {
        let buffer = SampleBuffer::mono(vec![0.0; 100], 44100).unwrap();
        assert_eq!(buffer.frames(256, 128).count(), 0);
        assert_eq!(buffer.frames(256, 128).len(), 0);
    }

    #[test]
    fn only_channel_zero_is_framed() {
        let left: Vec<f32> = vec![0.5; 512];
        let right: Vec<f32> = vec![-0.5; 512];
        let buffer = SampleBuffer::new(vec![left, right], 44100).unwrap();

        let frame = buffer.frames(256, 256).next().unwrap();
        assert!(frame.samples.iter().all(|&s| s == 0.5));
    }
}
