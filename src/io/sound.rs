use anyhow::{Context, Result, bail};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Full scale of a 24-bit signed PCM sample.
const PCM24_SCALE: f32 = 8_388_607.0;

/// Streaming reader over a mono sound file, decoding to f32 in [-1, 1].
pub struct SoundReader {
    reader: WavReader<BufReader<File>>,
    float: bool,
    norm: f32,
    len: usize,
    sample_rate: u32,
}

impl SoundReader {
    pub fn open(path: &Path) -> Result<Self> {
        let reader = WavReader::open(path)
            .with_context(|| format!("couldn't open sound file {} for reading", path.display()))?;
        let spec = reader.spec();
        if spec.channels != 1 {
            bail!(
                "sound file {} has more than one channel",
                path.display()
            );
        }

        Ok(Self {
            float: spec.sample_format == SampleFormat::Float,
            norm: 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32,
            len: reader.duration() as usize,
            sample_rate: spec.sample_rate,
            reader,
        })
    }

    /// Number of frames a mono sound file holds.
    pub fn frames(path: &Path) -> Result<usize> {
        Ok(Self::open(path)?.len())
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn seek(&mut self, frame: usize) -> Result<()> {
        self.reader
            .seek(frame as u32)
            .context("couldn't seek in sound file")
    }

    /// Reads up to `buf.len()` samples from the current position. Returns the
    /// number actually read, which is short at end-of-file.
    pub fn read(&mut self, buf: &mut [f32]) -> Result<usize> {
        let mut n = 0;
        if self.float {
            let mut samples = self.reader.samples::<f32>();
            while n < buf.len() {
                match samples.next() {
                    Some(s) => {
                        buf[n] = s.context("couldn't read from sound file")?;
                        n += 1;
                    }
                    None => break,
                }
            }
        } else {
            let norm = self.norm;
            let mut samples = self.reader.samples::<i32>();
            while n < buf.len() {
                match samples.next() {
                    Some(s) => {
                        buf[n] = s.context("couldn't read from sound file")? as f32 * norm;
                        n += 1;
                    }
                    None => break,
                }
            }
        }
        Ok(n)
    }

    /// Fills `buf`, zero-padding everything past end-of-file. Returns the
    /// number of real samples read.
    pub fn read_padded(&mut self, buf: &mut [f32]) -> Result<usize> {
        let got = self.read(buf)?;
        buf[got..].fill(0.0);
        Ok(got)
    }
}

/// Append-only writer producing a mono 24-bit signed PCM WAV file.
pub struct SoundWriter {
    writer: WavWriter<BufWriter<File>>,
}

impl SoundWriter {
    pub fn create(path: &Path, sample_rate: u32) -> Result<Self> {
        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 24,
            sample_format: SampleFormat::Int,
        };
        let writer = WavWriter::create(path, spec)
            .with_context(|| format!("couldn't open output file {} for writing", path.display()))?;
        Ok(Self { writer })
    }

    /// Appends `samples`. Values beyond full scale clamp at the PCM
    /// conversion.
    pub fn write(&mut self, samples: &[f32]) -> Result<()> {
        for &s in samples {
            let v = (s.clamp(-1.0, 1.0) * PCM24_SCALE) as i32;
            self.writer
                .write_sample(v)
                .context("couldn't write to output sound file")?;
        }
        Ok(())
    }

    /// Flushes the header and closes the file.
    pub fn finalize(self) -> Result<()> {
        self.writer
            .finalize()
            .context("couldn't close output sound file")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_float_wav(path: &Path, samples: &[f32], sample_rate: u32) {
        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_read_float_file() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = tmp.path().join("a.wav");
        write_float_wav(&path, &[0.0, 0.25, -0.5, 1.0], 44100);

        let mut reader = SoundReader::open(&path)?;
        assert_eq!(reader.len(), 4);
        assert_eq!(reader.sample_rate(), 44100);

        let mut buf = [0.0f32; 4];
        assert_eq!(reader.read(&mut buf)?, 4);
        assert_eq!(buf, [0.0, 0.25, -0.5, 1.0]);

        Ok(())
    }

    #[test]
    fn test_read_int_file_normalises() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = tmp.path().join("a.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 48000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec)?;
        writer.write_sample(16384i16)?;
        writer.write_sample(-16384i16)?;
        writer.finalize()?;

        let mut reader = SoundReader::open(&path)?;
        let mut buf = [0.0f32; 2];
        reader.read(&mut buf)?;
        assert!((buf[0] - 0.5).abs() < 1e-6);
        assert!((buf[1] + 0.5).abs() < 1e-6);

        Ok(())
    }

    #[test]
    fn test_rejects_stereo() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = tmp.path().join("stereo.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec)?;
        writer.write_sample(0i16)?;
        writer.write_sample(0i16)?;
        writer.finalize()?;

        assert!(SoundReader::open(&path).is_err());

        Ok(())
    }

    #[test]
    fn test_short_read_and_padding() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = tmp.path().join("a.wav");
        write_float_wav(&path, &[0.5, 0.5], 44100);

        let mut reader = SoundReader::open(&path)?;
        let mut buf = [9.0f32; 5];
        assert_eq!(reader.read_padded(&mut buf)?, 2);
        assert_eq!(buf, [0.5, 0.5, 0.0, 0.0, 0.0]);

        Ok(())
    }

    #[test]
    fn test_seek() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = tmp.path().join("a.wav");
        write_float_wav(&path, &[0.1, 0.2, 0.3, 0.4], 44100);

        let mut reader = SoundReader::open(&path)?;
        reader.seek(2)?;
        let mut buf = [0.0f32; 2];
        assert_eq!(reader.read(&mut buf)?, 2);
        assert!((buf[0] - 0.3).abs() < 1e-6);
        assert!((buf[1] - 0.4).abs() < 1e-6);

        Ok(())
    }

    #[test]
    fn test_writer_round_trip_and_clamp() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = tmp.path().join("out.wav");

        let mut writer = SoundWriter::create(&path, 44100)?;
        writer.write(&[0.5, -0.25, 1.5, -2.0])?;
        writer.finalize()?;

        let mut reader = SoundReader::open(&path)?;
        assert_eq!(reader.len(), 4);
        let mut buf = [0.0f32; 4];
        reader.read(&mut buf)?;

        // 24-bit quantisation is well under 1e-6
        assert!((buf[0] - 0.5).abs() < 1e-6);
        assert!((buf[1] + 0.25).abs() < 1e-6);
        assert!((buf[2] - 1.0).abs() < 1e-6);
        assert!((buf[3] + 1.0).abs() < 1e-6);

        Ok(())
    }
}
