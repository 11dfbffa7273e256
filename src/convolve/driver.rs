use anyhow::{Context, Result, bail, ensure};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use crate::convolve::pass::run_pass;
use crate::io::sound::SoundReader;

/// Maximum IR samples convolved per pass. Directly proportional to peak
/// memory use, inversely proportional to running time and pass count.
pub const CHUNK_MAX: usize = 1_638_400;

const TEMP_SUFFIX: &str = ".convolute-temp";

/// Convolves the input with the impulse response, scaled by `amp`, into
/// `output_path`.
pub fn convolve(input_path: &Path, ir_path: &Path, output_path: &Path, amp: f32) -> Result<()> {
    convolve_with_chunk(input_path, ir_path, output_path, amp, CHUNK_MAX)
}

/// As [`convolve`], with an explicit per-pass IR chunk bound. The result is
/// independent of `chunk_max`; only memory use and pass count change.
///
/// Each pass convolves the input with one IR chunk, sums the accumulated
/// output of the previous passes back in, and writes to a temporary path
/// that is renamed over `output_path` once the pass completes. A crash
/// mid-pass therefore never corrupts the last good accumulated file.
pub fn convolve_with_chunk(
    input_path: &Path,
    ir_path: &Path,
    output_path: &Path,
    amp: f32,
    chunk_max: usize,
) -> Result<()> {
    ensure!(chunk_max > 0, "chunk size must be positive");

    let temp_path = temp_path_for(output_path);
    remove_existing(output_path)?;
    remove_existing(&temp_path)?;

    let input_len = SoundReader::frames(input_path)?;
    let ir_len = SoundReader::frames(ir_path)?;

    if ir_len == 0 {
        bail!("impulse response {} is empty", ir_path.display());
    }

    // Convolution commutes, and a short input against a long IR takes far
    // fewer passes with the roles reversed.
    if ir_len > input_len && input_len > 0 {
        return convolve_with_chunk(ir_path, input_path, output_path, amp, chunk_max);
    }

    let passes = ir_len.div_ceil(chunk_max);
    for i in 0..passes {
        if passes > 1 {
            info!("pass {}/{passes}", i + 1);
        }

        let add_path = if i == 0 { None } else { Some(output_path) };
        run_pass(
            input_path,
            ir_path,
            add_path,
            &temp_path,
            amp,
            i * chunk_max,
            chunk_max,
        )?;

        fs::rename(&temp_path, output_path).with_context(|| {
            format!(
                "couldn't rename {} over {}",
                temp_path.display(),
                output_path.display()
            )
        })?;
    }

    Ok(())
}

fn temp_path_for(output_path: &Path) -> PathBuf {
    let mut os = output_path.as_os_str().to_os_string();
    os.push(TEMP_SUFFIX);
    PathBuf::from(os)
}

fn remove_existing(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)
            .with_context(|| format!("couldn't unlink existing file {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_path_keeps_full_name() {
        let temp = temp_path_for(Path::new("/tmp/mix.wav"));
        assert_eq!(temp, PathBuf::from("/tmp/mix.wav.convolute-temp"));
    }

    #[test]
    fn test_remove_existing_ignores_missing() -> Result<()> {
        remove_existing(Path::new("/tmp/definitely-not-here.wav"))
    }
}
