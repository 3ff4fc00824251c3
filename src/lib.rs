//! Audiodump: stream stereo PCM to WAV/AIFF dump files
//!
//! This library captures a continuous stream of interleaved stereo 16-bit
//! samples produced at a divisor-described source rate and writes it to
//! self-describing container files:
//!
//! - [`resample`] converts batches with a 16.16 fixed-point linear
//!   interpolator whose fractional phase survives batch boundaries.
//! - [`writer`] owns the open file: it streams a provisional WAV or AIFF-C
//!   header with oversized placeholder sizes, appends payload, patches the
//!   real sizes on stop, and rotates numbered segment files when the source
//!   rate changes mid-stream.
//! - [`extended`] encodes the AIFF sample-rate field as an 80-bit
//!   IEEE-754 extended-precision float.
//! - [`dumper`] is the session front end: lazy open on the first batch,
//!   size-cap rollover, finalization on drop.
//!
//! Everything runs synchronously on the caller's stack; instances are not
//! internally thread-safe and expect a single producer.

pub mod cli;
pub mod config;
pub mod dumper;
pub mod error;
pub mod extended;
pub mod fsutil;
pub mod rate;
pub mod resample;
pub mod writer;

pub use config::Config;
pub use dumper::AudioDumper;
pub use error::{AudiodumpError, Result, WriterError};
pub use resample::{ByteOrder, StereoResampler, OUT_SAMPLE_RATE};
pub use writer::{AudioFileWriter, ContainerFormat, DumpMode};
