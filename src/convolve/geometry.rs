/// Block geometry for one overlap-add pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockGeometry {
    /// Transform length for the pass.
    pub fft_len: usize,
    /// Fresh input samples consumed (and output samples finalised) per block.
    pub step: usize,
    /// Number of blocks needed to cover the input.
    pub steps: usize,
}

impl BlockGeometry {
    /// Picks the transform size for convolving `input_len` samples with an
    /// IR chunk of `ir_len` samples, and derives the step count from it.
    pub fn new(ir_len: usize, input_len: usize) -> Self {
        let target = ir_len * 3 / 2 + 10_000;
        // smallest power of two strictly greater than target
        let mut fft_len = (target + 1).next_power_of_two();

        // A large transform is wasted overlap when the input itself is
        // short; cap it at one block covering everything.
        let cap = input_len + ir_len + 10;
        if fft_len > cap {
            fft_len = cap;
        }

        // The capped size can be odd or leave no room for fresh input. The
        // real-input transforms need an even length, and the block loop
        // needs step >= 1.
        fft_len = fft_len.max(ir_len + 12);
        fft_len += fft_len % 2;

        let step = fft_len - ir_len - 10;
        let steps = input_len.div_ceil(step);

        Self {
            fft_len,
            step,
            steps,
        }
    }
}
