use anyhow::{Context, Result, ensure};
use clap::Parser;
use convolute::convolve::convolve;
use log::info;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "convolute")]
#[command(version)]
#[command(about = "Applies an impulse response to a mono recording by partitioned FFT convolution.")]
struct Args {
    #[arg(help = "Input sound file (mono)")]
    input: PathBuf,
    #[arg(help = "Impulse response sound file (mono, same sample rate as the input)")]
    impulse: PathBuf,
    #[arg(help = "Output WAV file (mono, 24-bit PCM)")]
    output: PathBuf,
    #[arg(help = "Amplitude multiplier applied to the convolution")]
    amp: f32,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    info!("convolute v{}", env!("CARGO_PKG_VERSION"));

    ensure!(
        args.amp.is_finite() && args.amp > 0.0,
        "amplitude multiplier must be a positive number, got {}",
        args.amp
    );

    convolve(&args.input, &args.impulse, &args.output, args.amp).with_context(|| {
        format!(
            "couldn't convolute {} with {}",
            args.input.display(),
            args.impulse.display()
        )
    })?;

    Ok(())
}
