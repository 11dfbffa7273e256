use anyhow::{Result, bail};
use log::debug;
use std::path::Path;

use crate::convolve::clip::ClipStats;
use crate::convolve::fft::FftPair;
use crate::convolve::geometry::BlockGeometry;
use crate::io::sound::{SoundReader, SoundWriter};
use crate::ir::read_chunk;

/// Convolves `input_path` with one chunk of the impulse response and writes
/// the result to `output_path`, summed with `add_path` when given.
///
/// The chunk covers IR samples `[ir_offset, ir_offset + chunk_max)`. The
/// engine first copies `ir_offset` samples of the additive stream through
/// unchanged, so the chunk's contribution lands in the output delayed by the
/// offset it was taken from. Emitted samples are clipped to full scale; the
/// returned statistics cover every sample that entered the accumulator,
/// whether or not it was emitted.
pub fn run_pass(
    input_path: &Path,
    ir_path: &Path,
    add_path: Option<&Path>,
    output_path: &Path,
    amp: f32,
    ir_offset: usize,
    chunk_max: usize,
) -> Result<ClipStats> {
    let mut input = SoundReader::open(input_path)?;
    let input_len = input.len();

    let chunk = read_chunk(ir_path, ir_offset, chunk_max)?;
    if chunk.sample_rate != input.sample_rate() {
        bail!(
            "sample rates of input ({} Hz) and impulse response ({} Hz) are different",
            input.sample_rate(),
            chunk.sample_rate
        );
    }
    let ir_len = chunk.len();

    let geo = BlockGeometry::new(ir_len, input_len);
    debug!(
        "fft size {}: {} steps of {} samples",
        geo.fft_len, geo.steps, geo.step
    );

    let mut fft = FftPair::new(geo.fft_len);

    let mut add = match add_path {
        Some(path) => Some(SoundReader::open(path)?),
        None => None,
    };
    let mut out = SoundWriter::create(output_path, input.sample_rate())?;

    let mut accum = fft.make_time_vec();
    let mut scratch = fft.make_time_vec();
    let mut spectrum = fft.make_freq_vec();
    let mut ir_spectrum = fft.make_freq_vec();

    // Later chunks sit deeper in the IR, so their contribution is delayed:
    // pass the first `ir_offset` samples of the accumulated signal through
    // before any convolution output.
    let mut to_copy = ir_offset;
    while to_copy > 0 {
        let n = to_copy.min(geo.fft_len);
        read_additive(add.as_mut(), &mut scratch[..n])?;
        out.write(&scratch[..n])?;
        to_copy -= n;
    }

    // Spectrum of the zero-padded IR chunk.
    scratch[..ir_len].copy_from_slice(&chunk.samples);
    scratch[ir_len..].fill(0.0);
    fft.forward(&mut scratch, &mut ir_spectrum)?;

    // The accumulator starts out holding the additive signal covering the
    // first block and its overlap tail.
    read_additive(add.as_mut(), &mut accum)?;

    let mut stats = ClipStats::default();
    let scale = amp / geo.fft_len as f32;

    for st in 0..geo.steps {
        eprint!("convoluting... {st}/{}\x1b[K\r", geo.steps);

        let start = st * geo.step;
        let read_len = geo.step.min(input_len - start);
        let got = input.read(&mut scratch[..read_len])?;
        scratch[got..].fill(0.0);

        fft.forward(&mut scratch, &mut spectrum)?;
        for (bin, h) in spectrum.iter_mut().zip(&ir_spectrum) {
            *bin *= *h;
        }
        fft.inverse(&mut spectrum, &mut scratch)?;

        for (acc, &s) in accum.iter_mut().zip(scratch.iter()) {
            *acc += s * scale;
        }

        stats.scan(&mut accum[..geo.step]);

        if st < geo.steps - 1 {
            out.write(&accum[..geo.step])?;
        } else {
            // the leftover input samples plus the IR tail
            let last_len = input_len - geo.step * (geo.steps - 1) + ir_len;
            out.write(&accum[..last_len])?;
        }

        accum.copy_within(geo.step.., 0);
        let tail_start = geo.fft_len - geo.step;
        read_additive(add.as_mut(), &mut accum[tail_start..])?;
    }

    eprint!("\r\x1b[K");

    // Whatever is left in the accumulator was never emitted but still seeds
    // the reported peak.
    stats.scan(&mut accum);

    out.finalize()?;
    stats.report(amp);

    Ok(stats)
}

/// Fills `buf` from the additive stream, zero-padding past end-of-file, or
/// with silence when there is no additive stream.
fn read_additive(add: Option<&mut SoundReader>, buf: &mut [f32]) -> Result<()> {
    match add {
        Some(reader) => {
            reader.read_padded(buf)?;
        }
        None => buf.fill(0.0),
    }
    Ok(())
}
