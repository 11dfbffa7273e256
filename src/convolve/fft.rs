use anyhow::Result;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use rustfft::num_complex::Complex;
use std::sync::Arc;

/// Forward and inverse real FFT plans bound to a single transform length.
///
/// The inverse is unnormalised: a forward/inverse round trip scales by
/// `len()`, and callers divide when reading results back out.
pub struct FftPair {
    len: usize,
    r2c: Arc<dyn RealToComplex<f32>>,
    c2r: Arc<dyn ComplexToReal<f32>>,
    r2c_scratch: Vec<Complex<f32>>,
    c2r_scratch: Vec<Complex<f32>>,
}

impl FftPair {
    pub fn new(len: usize) -> Self {
        let mut planner = RealFftPlanner::<f32>::new();
        let r2c = planner.plan_fft_forward(len);
        let c2r = planner.plan_fft_inverse(len);
        let r2c_scratch = r2c.make_scratch_vec();
        let c2r_scratch = c2r.make_scratch_vec();

        Self {
            len,
            r2c,
            c2r,
            r2c_scratch,
            c2r_scratch,
        }
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    /// Number of frequency bins: `len / 2 + 1`.
    pub const fn num_bins(&self) -> usize {
        self.len / 2 + 1
    }

    pub fn make_time_vec(&self) -> Vec<f32> {
        self.r2c.make_input_vec()
    }

    pub fn make_freq_vec(&self) -> Vec<Complex<f32>> {
        self.r2c.make_output_vec()
    }

    /// Real-to-complex transform. `time` is used as working storage.
    pub fn forward(&mut self, time: &mut [f32], freq: &mut [Complex<f32>]) -> Result<()> {
        self.r2c
            .process_with_scratch(time, freq, &mut self.r2c_scratch)
            .map_err(|e| anyhow::anyhow!("forward FFT failed: {e}"))
    }

    /// Complex-to-real transform. `freq` is used as working storage.
    pub fn inverse(&mut self, freq: &mut [Complex<f32>], time: &mut [f32]) -> Result<()> {
        // The product of two real-signal spectra picks up rounding dust in
        // the DC and Nyquist imaginary parts; the inverse requires them real.
        freq[0].im = 0.0;
        if let Some(last) = freq.last_mut() {
            last.im = 0.0;
        }

        self.c2r
            .process_with_scratch(freq, time, &mut self.c2r_scratch)
            .map_err(|e| anyhow::anyhow!("inverse FFT failed: {e}"))
    }
}
