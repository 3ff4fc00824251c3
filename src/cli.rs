// Command-line interface definitions for audiodump
//
// This module is separate so it can be used by both the binary (main.rs)
// and build.rs for generating man pages. It must stay self-contained:
// build.rs pulls it in with include!, so nothing here may reference the
// rest of the crate.

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "audiodump")]
#[command(author, version, about = "Stream stereo PCM to WAV/AIFF dump files")]
#[command(long_about = "
Audiodump captures a stream of interleaved stereo 16-bit samples and
writes it to self-describing WAV or AIFF-C files. Headers are streamed
with oversized placeholder sizes and patched on close, so a killed
process still leaves behind a playable file.

The source sample rate is described as a divisor of a fixed 108 MHz
dividend (divisor 2250 = 48000 Hz, 3375 = 32000 Hz). In raw mode a
mid-stream rate change rotates to a new numbered segment file; in
resample mode everything is converted to 44100 Hz instead.
")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<std::path::PathBuf>,

    /// Increase verbosity (-v = debug, -vv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Container format choice on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Wav,
    Aiff,
}

/// Dump mode choice on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Store samples at the declared source rate, rotating on rate change
    Raw,
    /// Resample everything to 44100 Hz
    Resample,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Dump a raw PCM stream (interleaved stereo s16) to container files
    Dump {
        /// Input file of raw samples, or "-" for stdin
        input: std::path::PathBuf,

        /// Output directory (overrides config)
        #[arg(short, long, value_name = "DIR")]
        out_dir: Option<std::path::PathBuf>,

        /// Basename for dump files (overrides config)
        #[arg(long, value_name = "NAME")]
        basename: Option<String>,

        /// Container format (overrides config)
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// Dump mode (overrides config)
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// Source rate divisor (sample rate = 108000000 / divisor)
        #[arg(long, default_value_t = 2250)]
        divisor: u32,

        /// Treat input as byte-swapped, high-channel-first samples
        #[arg(long)]
        byte_swapped: bool,

        /// Left channel volume, 0-256 (256 = 100%)
        #[arg(long, default_value_t = 256, value_name = "VOL")]
        volume_left: i32,

        /// Right channel volume, 0-256 (256 = 100%)
        #[arg(long, default_value_t = 256, value_name = "VOL")]
        volume_right: i32,

        /// Frames per batch fed to the writer
        #[arg(long, default_value_t = 2048, value_name = "FRAMES")]
        batch_frames: usize,

        /// Overwrite existing files without asking
        #[arg(long)]
        silent: bool,

        /// Skip batches that are entirely zero samples
        #[arg(long)]
        skip_silence: bool,
    },

    /// Show current configuration
    Config,
}
