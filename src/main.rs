//! Audiodump - stream stereo PCM to WAV/AIFF dump files
//!
//! Run `audiodump dump <input>` to capture a raw sample stream into
//! container files, or `audiodump config` to inspect the configuration.

use anyhow::Context;
use audiodump::cli::{Cli, Commands, FormatArg, ModeArg};
use audiodump::config::{load_config, Config};
use audiodump::dumper::AudioDumper;
use audiodump::fsutil::{InteractiveOverwrite, OverwritePolicy, SilentOverwrite};
use audiodump::rate::sample_rate_hz;
use audiodump::writer::{ContainerFormat, DumpMode, BUFFER_FRAMES};
use clap::Parser;
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Config => show_config(&config),
        Commands::Dump {
            input,
            out_dir,
            basename,
            format,
            mode,
            divisor,
            byte_swapped,
            volume_left,
            volume_right,
            batch_frames,
            silent,
            skip_silence,
        } => {
            let opts = DumpOptions {
                input,
                out_dir,
                basename,
                format,
                mode,
                divisor,
                byte_swapped,
                volume_left,
                volume_right,
                batch_frames,
                silent,
                skip_silence,
            };
            run_dump(&config, opts)
        }
    }
}

struct DumpOptions {
    input: PathBuf,
    out_dir: Option<PathBuf>,
    basename: Option<String>,
    format: Option<FormatArg>,
    mode: Option<ModeArg>,
    divisor: u32,
    byte_swapped: bool,
    volume_left: i32,
    volume_right: i32,
    batch_frames: usize,
    silent: bool,
    skip_silence: bool,
}

fn show_config(config: &Config) -> anyhow::Result<()> {
    let rendered = toml::to_string_pretty(config).context("Failed to render config")?;
    print!("{}", rendered);
    println!("\n# resolved dump directory: {:?}", config.resolve_dump_dir());
    Ok(())
}

fn run_dump(config: &Config, opts: DumpOptions) -> anyhow::Result<()> {
    anyhow::ensure!(opts.divisor > 0, "divisor must be non-zero");
    anyhow::ensure!(
        opts.batch_frames > 0 && opts.batch_frames <= BUFFER_FRAMES,
        "batch size must be between 1 and {} frames",
        BUFFER_FRAMES
    );
    anyhow::ensure!(
        (0..=256).contains(&opts.volume_left) && (0..=256).contains(&opts.volume_right),
        "volume must be in 0..=256"
    );

    let dir = opts
        .out_dir
        .clone()
        .unwrap_or_else(|| config.resolve_dump_dir());
    let basename = opts
        .basename
        .clone()
        .unwrap_or_else(|| config.dump.basename.clone());
    let format = match opts.format {
        Some(FormatArg::Wav) => ContainerFormat::Wav,
        Some(FormatArg::Aiff) => ContainerFormat::Aiff,
        None => config.dump.format,
    };
    let mode = match opts.mode {
        Some(ModeArg::Raw) => DumpMode::Raw,
        Some(ModeArg::Resample) => DumpMode::Resample,
        None => config.dump.mode,
    };
    let policy: Box<dyn OverwritePolicy> = if opts.silent || config.dump.silent {
        Box::new(SilentOverwrite)
    } else {
        Box::new(InteractiveOverwrite)
    };
    let skip_silence = opts.skip_silence || config.dump.skip_silence;

    let mut reader: Box<dyn Read> = if opts.input.as_os_str() == "-" {
        Box::new(std::io::stdin().lock())
    } else {
        Box::new(
            std::fs::File::open(&opts.input)
                .with_context(|| format!("Failed to open input {:?}", opts.input))?,
        )
    };

    tracing::info!(
        "Dumping {:?} at {} Hz into {:?} ({:?}, {:?})",
        opts.input,
        sample_rate_hz(opts.divisor),
        dir,
        format,
        mode
    );

    let mut dumper = AudioDumper::new(dir, basename, format, mode, skip_silence, policy);
    let mut byte_batch = vec![0u8; opts.batch_frames * 4];
    let mut total_frames = 0u64;

    loop {
        let filled = read_up_to(&mut reader, &mut byte_batch)?;
        if filled < 4 {
            break;
        }

        // Whole frames only; a trailing partial frame is dropped like any
        // other truncated input.
        let samples: Vec<i16> = byte_batch[..filled - filled % 4]
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        total_frames += (samples.len() / 2) as u64;

        if opts.byte_swapped {
            dumper.dump_samples_be(&samples, opts.divisor, opts.volume_left, opts.volume_right)?;
        } else {
            dumper.dump_samples(&samples, opts.divisor, opts.volume_left, opts.volume_right)?;
        }

        if filled < byte_batch.len() {
            break;
        }
    }

    let segments = dumper.writer().segment_index() + 1;
    let last_segment_bytes = dumper.writer().audio_size();
    dumper.stop()?;

    tracing::info!(
        "Dumped {} frames across {} segment(s), {} payload bytes in the last",
        total_frames,
        segments,
        last_segment_bytes
    );
    Ok(())
}

/// Read until the buffer is full or the stream ends.
fn read_up_to(reader: &mut dyn Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
