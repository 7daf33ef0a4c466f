//! Forward/inverse FFT engine with per-size cached plans and scratch buffers.
//!
//! Every detector in this crate routes its spectral math through [`FftEngine`].
//! The engine works on split real/imaginary buffer pairs and keeps one
//! [`FftContext`] per transform size, so repeated transforms over same-sized
//! frames reuse the plan, the complex staging buffer, and the in-place
//! scratch instead of reallocating them per call.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::collections::HashMap;
use std::sync::Arc;

/// Cached state for one transform size.
///
/// Created lazily on first use of a size and kept for the lifetime of the
/// engine; the cache never shrinks.
struct FftContext {
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    /// Complex staging buffer the split real/imag pair is packed into.
    buffer: Vec<Complex<f32>>,
    /// In-place scratch required by the plans.
    scratch: Vec<Complex<f32>>,
}

/// In-place FFT over split real/imaginary buffers.
///
/// The inverse transform is scaled by `1/N`, so `inverse(forward(x))`
/// reproduces `x`.
///
/// The size-keyed context cache is mutable state: an engine is not meant to
/// be shared between threads. Use one engine per worker instead.
pub struct FftEngine {
    planner: FftPlanner<f32>,
    contexts: HashMap<usize, FftContext>,
}

impl FftEngine {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
            contexts: HashMap::new(),
        }
    }

    /// Zero-filled `(real, imag)` pair of length `n`.
    pub fn create_complex_array(&self, n: usize) -> (Vec<f32>, Vec<f32>) {
        (vec![0.0; n], vec![0.0; n])
    }

    /// In-place forward DFT.
    ///
    /// # Panics
    ///
    /// Panics if the length is not a power of two or the buffers differ in
    /// length. Both are caller bugs, not recoverable runtime faults.
    pub fn forward(&mut self, real: &mut [f32], imag: &mut [f32]) {
        self.process(real, imag, false);
    }

    /// In-place inverse DFT, scaled by `1/N`.
    ///
    /// # Panics
    ///
    /// Same preconditions as [`forward`](Self::forward).
    pub fn inverse(&mut self, real: &mut [f32], imag: &mut [f32]) {
        self.process(real, imag, true);
    }

    fn process(&mut self, real: &mut [f32], imag: &mut [f32], inverse: bool) {
        let n = real.len();
        assert!(
            n.is_power_of_two(),
            "FFT length must be a power of two, got {n}"
        );
        assert_eq!(
            n,
            imag.len(),
            "real/imag buffers must have equal length ({n} vs {})",
            imag.len()
        );

        let ctx = self.context(n);
        for (slot, (&re, &im)) in ctx.buffer.iter_mut().zip(real.iter().zip(imag.iter())) {
            *slot = Complex::new(re, im);
        }

        let plan = if inverse { &ctx.inverse } else { &ctx.forward };
        plan.process_with_scratch(&mut ctx.buffer, &mut ctx.scratch);

        let scale = if inverse { 1.0 / n as f32 } else { 1.0 };
        for (i, c) in ctx.buffer.iter().enumerate() {
            real[i] = c.re * scale;
            imag[i] = c.im * scale;
        }
    }

    fn context(&mut self, n: usize) -> &mut FftContext {
        let Self { planner, contexts } = self;
        contexts.entry(n).or_insert_with(|| {
            let forward = planner.plan_fft_forward(n);
            let inverse = planner.plan_fft_inverse(n);
            let scratch_len = forward
                .get_inplace_scratch_len()
                .max(inverse.get_inplace_scratch_len());
            FftContext {
                forward,
                inverse,
                buffer: vec![Complex::new(0.0, 0.0); n],
                scratch: vec![Complex::new(0.0, 0.0); scratch_len],
            }
        })
    }
}

impl Default for FftEngine {
    fn default() -> Self {
        Self::new()
    }
}
