use anyhow::Result;
use std::path::Path;

use crate::io::sound::SoundReader;

/// One contiguous slice of an impulse response file.
pub struct IrChunk {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl IrChunk {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Reads at most `max_len` samples of the impulse response starting at
/// `start`. The returned chunk is shorter than requested when the request
/// runs past end-of-file.
pub fn read_chunk(path: &Path, start: usize, max_len: usize) -> Result<IrChunk> {
    let mut reader = SoundReader::open(path)?;
    let avail = reader.len().saturating_sub(start).min(max_len);

    reader.seek(start.min(reader.len()))?;
    let mut samples = vec![0.0f32; avail];
    let got = reader.read(&mut samples)?;
    samples.truncate(got);

    Ok(IrChunk {
        samples,
        sample_rate: reader.sample_rate(),
    })
}
