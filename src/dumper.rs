//! Recording session front end
//!
//! Owns one container writer plus the output directory and basename from
//! configuration. The first batch lazily opens segment 0; segments roll
//! over when the payload would outgrow what 32-bit size fields can hold
//! comfortably, and the writer itself rotates on source-rate changes.

use crate::error::WriterError;
use crate::fsutil::OverwritePolicy;
use crate::resample::ByteOrder;
use crate::writer::{AudioFileWriter, ContainerFormat, DumpMode};
use std::path::PathBuf;

/// Segment rollover threshold, comfortably under the u32 size fields.
pub const MAX_SEGMENT_BYTES: u32 = 2_000_000_000;

/// One live recording: lazily opened, finalized on [`stop`](Self::stop) or drop.
pub struct AudioDumper {
    writer: AudioFileWriter,
    dir: PathBuf,
    basename: String,
    policy: Box<dyn OverwritePolicy>,
    segment_byte_limit: u32,
}

impl AudioDumper {
    pub fn new(
        dir: PathBuf,
        basename: impl Into<String>,
        format: ContainerFormat,
        mode: DumpMode,
        skip_silence: bool,
        policy: Box<dyn OverwritePolicy>,
    ) -> Self {
        AudioDumper {
            writer: AudioFileWriter::new(format, mode, skip_silence),
            dir,
            basename: basename.into(),
            policy,
            segment_byte_limit: MAX_SEGMENT_BYTES,
        }
    }

    /// Lower the segment rollover threshold (mainly for tests and tooling).
    pub fn with_segment_byte_limit(mut self, limit: u32) -> Self {
        self.segment_byte_limit = limit;
        self
    }

    pub fn writer(&self) -> &AudioFileWriter {
        &self.writer
    }

    /// Dump one batch of host-order (left, right) samples.
    pub fn dump_samples(
        &mut self,
        samples: &[i16],
        divisor: u32,
        l_volume: i32,
        r_volume: i32,
    ) -> Result<(), WriterError> {
        self.dump(samples, divisor, l_volume, r_volume, ByteOrder::Native)
    }

    /// Dump one batch of byte-swapped, high-channel-first samples.
    pub fn dump_samples_be(
        &mut self,
        samples: &[i16],
        divisor: u32,
        l_volume: i32,
        r_volume: i32,
    ) -> Result<(), WriterError> {
        self.dump(samples, divisor, l_volume, r_volume, ByteOrder::BigEndian)
    }

    fn dump(
        &mut self,
        samples: &[i16],
        divisor: u32,
        l_volume: i32,
        r_volume: i32,
        order: ByteOrder,
    ) -> Result<(), WriterError> {
        if !self.writer.is_open() {
            let path = self.dir.join(format!(
                "{}.{}",
                self.basename,
                self.writer.format().extension()
            ));
            self.writer.start(&path, divisor, self.policy.as_ref())?;
        } else if self.writer.audio_size() > self.segment_byte_limit {
            self.writer.rotate(divisor)?;
        }

        self.writer.feed(samples, divisor, l_volume, r_volume, order)
    }

    /// Finalize the current segment. Safe to call when nothing is open.
    pub fn stop(&mut self) -> Result<(), WriterError> {
        self.writer.stop()
    }
}
