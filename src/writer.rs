//! Container writer for WAV and AIFF/AIFC dump files
//!
//! The writer streams a provisional header with deliberately oversized size
//! fields, appends converted payload bytes, and patches the true sizes back
//! into the header on stop. If the process dies before a clean stop, most
//! players still parse the truncated file because the declared sizes are
//! merely too large, not zero.
//!
//! Wire-format quirk carried over from the hardware this serves: AIFF header
//! fields are big-endian, but the sample payload stays little-endian and is
//! tagged `sowt` in the COMM chunk. WAV is little-endian throughout.

use crate::error::WriterError;
use crate::extended;
use crate::fsutil::{self, OverwritePolicy, SilentOverwrite};
use crate::rate::{sample_rate_hz, FIXED_SAMPLE_RATE_DIVIDEND};
use crate::resample::{convert_raw_into, is_silent, ByteOrder, StereoResampler};
use std::fs::File;
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Largest batch the conversion buffer accepts, in frames.
pub const BUFFER_FRAMES: usize = 32 * 1024;

/// Oversized placeholder written into header size fields at open time.
const SIZE_SENTINEL: u32 = 100_000_000;

/// Output container variant. Immutable for the life of one writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    Wav,
    Aiff,
}

impl ContainerFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ContainerFormat::Wav => "wav",
            ContainerFormat::Aiff => "aiff",
        }
    }

    /// Byte offset where payload starts; also the full header length.
    pub fn payload_offset(self) -> u64 {
        match self {
            ContainerFormat::Wav => 44,
            ContainerFormat::Aiff => 72,
        }
    }
}

/// Resampling policy of the writer.
///
/// `Raw` stores samples at the declared source rate and rotates to a new
/// segment file when that rate changes mid-stream. `Resample` converts
/// everything to the fixed 44100 Hz output rate, so a rate change only
/// retunes the interpolation ratio and the file keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DumpMode {
    #[default]
    Raw,
    Resample,
}

/// Write the 44-byte provisional WAV header.
fn write_wav_header<W: Write>(w: &mut W, sample_rate: u32) -> io::Result<()> {
    w.write_all(b"RIFF")?;
    w.write_all(&SIZE_SENTINEL.to_le_bytes())?;
    w.write_all(b"WAVE")?;
    w.write_all(b"fmt ")?;
    w.write_all(&16u32.to_le_bytes())?;
    w.write_all(&0x0002_0001u32.to_le_bytes())?; // PCM, two channels
    w.write_all(&sample_rate.to_le_bytes())?;
    w.write_all(&(sample_rate * 4).to_le_bytes())?; // byte rate, 2ch 16-bit
    w.write_all(&0x0010_0004u32.to_le_bytes())?; // 16 bits, block align 4
    w.write_all(b"data")?;
    w.write_all(&(SIZE_SENTINEL - 32).to_le_bytes())?;
    Ok(())
}

/// Write the 72-byte provisional AIFF-C header.
fn write_aiff_header<W: Write>(w: &mut W, divisor: u32) -> io::Result<()> {
    w.write_all(b"FORM")?;
    w.write_all(&SIZE_SENTINEL.to_be_bytes())?;
    w.write_all(b"AIFC")?;

    w.write_all(b"FVER")?;
    w.write_all(&4u32.to_be_bytes())?;
    w.write_all(&0xA280_5140u32.to_be_bytes())?; // AIFCVersion1

    w.write_all(b"COMM")?;
    w.write_all(&0x18u32.to_be_bytes())?;
    w.write_all(&2u16.to_be_bytes())?; // channels
    w.write_all(&(SIZE_SENTINEL / 2).to_be_bytes())?; // frame count placeholder
    w.write_all(&16u16.to_be_bytes())?; // bit depth

    let rate = extended::encode(FIXED_SAMPLE_RATE_DIVIDEND, divisor);
    w.write_all(&rate.exponent.to_be_bytes())?;
    w.write_all(&rate.significand.to_be_bytes())?;

    w.write_all(b"sowt")?; // little-endian payload
    w.write_all(&0u16.to_be_bytes())?; // empty compression name

    w.write_all(b"SSND")?;
    w.write_all(&SIZE_SENTINEL.to_be_bytes())?;
    w.write_all(&0u32.to_be_bytes())?; // offset
    w.write_all(&0u32.to_be_bytes())?; // block size
    Ok(())
}

/// Patch the true sizes into a WAV header by absolute offset.
fn patch_wav_sizes<W: Write + Seek>(w: &mut W, audio_size: u32) -> io::Result<()> {
    w.seek(SeekFrom::Start(4))?;
    w.write_all(&(audio_size + 36).to_le_bytes())?;
    w.seek(SeekFrom::Start(40))?;
    w.write_all(&audio_size.to_le_bytes())?;
    Ok(())
}

/// Patch the true sizes into an AIFF header by absolute offset.
fn patch_aiff_sizes<W: Write + Seek>(w: &mut W, audio_size: u32) -> io::Result<()> {
    w.seek(SeekFrom::Start(4))?;
    w.write_all(&(audio_size + 72 - 8).to_be_bytes())?;
    w.seek(SeekFrom::Start(34))?;
    w.write_all(&(audio_size / 4).to_be_bytes())?;
    w.seek(SeekFrom::Start(60))?;
    w.write_all(&(audio_size.wrapping_sub(8)).to_be_bytes())?;
    Ok(())
}

/// Streamed container writer with rewindable header.
///
/// Not internally thread-safe; one producer drives one writer. Dropping the
/// writer finalizes the header so abrupt teardown never leaks a file with
/// unpatched placeholder sizes.
pub struct AudioFileWriter {
    file: Option<File>,
    format: ContainerFormat,
    mode: DumpMode,
    skip_silence: bool,
    /// Payload bytes appended since the last open.
    audio_size: u32,
    dir: PathBuf,
    basename: String,
    segment_index: u32,
    current_divisor: u32,
    resampler: StereoResampler,
    /// Interleaved conversion buffer; sized for 2x expansion so moderate
    /// upsampling in resample mode does not truncate.
    conv_buffer: Vec<i16>,
    byte_buffer: Vec<u8>,
}

impl AudioFileWriter {
    pub fn new(format: ContainerFormat, mode: DumpMode, skip_silence: bool) -> Self {
        AudioFileWriter {
            file: None,
            format,
            mode,
            skip_silence,
            audio_size: 0,
            dir: PathBuf::new(),
            basename: String::new(),
            segment_index: 0,
            current_divisor: 0,
            resampler: StereoResampler::new(sample_rate_hz(crate::rate::DIVISOR_48KHZ)),
            conv_buffer: vec![0; BUFFER_FRAMES * 4],
            byte_buffer: Vec::new(),
        }
    }

    pub fn format(&self) -> ContainerFormat {
        self.format
    }

    pub fn mode(&self) -> DumpMode {
        self.mode
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Payload bytes accepted since the current segment was opened.
    pub fn audio_size(&self) -> u32 {
        self.audio_size
    }

    /// Index of the current segment file, starting at 0.
    pub fn segment_index(&self) -> u32 {
        self.segment_index
    }

    /// Create the dump file and write the provisional header.
    ///
    /// Fails without touching writer state when a file is already open, the
    /// overwrite policy declines an existing file, or the file cannot be
    /// created. The first path opened fixes the basename used for segment
    /// rotation.
    pub fn start(
        &mut self,
        path: &Path,
        divisor: u32,
        policy: &dyn OverwritePolicy,
    ) -> Result<(), WriterError> {
        if self.file.is_some() {
            return Err(WriterError::AlreadyOpen {
                path: path.to_path_buf(),
            });
        }

        fsutil::prepare_path(path, policy)?;
        let mut file = File::create(path).map_err(|source| WriterError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;

        if self.basename.is_empty() {
            self.dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
            self.basename = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "audiodump".to_string());
        }

        self.audio_size = 0;
        self.current_divisor = divisor;
        self.resampler = StereoResampler::new(sample_rate_hz(divisor));

        match self.format {
            ContainerFormat::Wav => write_wav_header(&mut file, sample_rate_hz(divisor))?,
            ContainerFormat::Aiff => write_aiff_header(&mut file, divisor)?,
        }

        // Sizes are patched by absolute offset later, so a mismatch here is
        // a defect to report, not a reason to abandon the stream.
        let pos = file.stream_position()?;
        let expected = self.format.payload_offset();
        if pos != expected {
            tracing::error!(
                "Header offset mismatch in {:?}: at {}, expected {}",
                path,
                pos,
                expected
            );
        }

        tracing::info!(
            "Dumping audio to {:?} ({} Hz, {:?})",
            path,
            sample_rate_hz(divisor),
            self.format
        );
        self.file = Some(file);
        Ok(())
    }

    /// Patch the header size fields and close the stream.
    ///
    /// A no-op when nothing is open, which makes the `Drop` path safe to run
    /// after an explicit stop.
    pub fn stop(&mut self) -> Result<(), WriterError> {
        let Some(mut file) = self.file.take() else {
            return Ok(());
        };

        match self.format {
            ContainerFormat::Wav => patch_wav_sizes(&mut file, self.audio_size)?,
            ContainerFormat::Aiff => patch_aiff_sizes(&mut file, self.audio_size)?,
        }

        tracing::info!(
            "Closed dump segment {} ({} payload bytes)",
            self.segment_index,
            self.audio_size
        );
        Ok(())
    }

    /// Finalize the current segment and open the next numbered one.
    pub fn rotate(&mut self, divisor: u32) -> Result<(), WriterError> {
        self.stop()?;
        self.segment_index += 1;
        let path = self.segment_path(self.segment_index);
        tracing::info!("Rotating dump to {:?}", path);
        // Segment files carry fresh numbered names; never block on a prompt
        // mid-stream.
        self.start(&path, divisor, &SilentOverwrite)
    }

    fn segment_path(&self, index: u32) -> PathBuf {
        self.dir.join(format!(
            "{}{}.{}",
            self.basename,
            index,
            self.format.extension()
        ))
    }

    /// Convert one batch of interleaved stereo s16 samples and append it.
    ///
    /// Rejected batches (writer closed, batch larger than the conversion
    /// buffer) leave `audio_size` and the resampler phase untouched. All-zero
    /// batches are elided when silence skipping is on.
    pub fn feed(
        &mut self,
        samples: &[i16],
        divisor: u32,
        l_volume: i32,
        r_volume: i32,
        order: ByteOrder,
    ) -> Result<(), WriterError> {
        if self.file.is_none() {
            return Err(WriterError::NotOpen);
        }

        let frames = samples.len() / 2;
        if frames > BUFFER_FRAMES {
            return Err(WriterError::BufferTooSmall {
                frames,
                capacity: BUFFER_FRAMES,
            });
        }

        if self.skip_silence && is_silent(samples) {
            return Ok(());
        }

        if divisor != self.current_divisor {
            match self.mode {
                DumpMode::Raw => self.rotate(divisor)?,
                DumpMode::Resample => {
                    tracing::debug!(
                        "Source rate changed to {} Hz, retuning resampler",
                        sample_rate_hz(divisor)
                    );
                    self.resampler.set_source_rate(sample_rate_hz(divisor));
                }
            }
            self.current_divisor = divisor;
        }

        let out_frames = match self.mode {
            DumpMode::Raw => convert_raw_into(
                &mut self.conv_buffer[..frames * 2],
                samples,
                order,
                l_volume,
                r_volume,
            ),
            DumpMode::Resample => {
                self.conv_buffer.fill(0);
                self.resampler
                    .resample_into(&mut self.conv_buffer, samples, order, l_volume, r_volume)
            }
        };

        self.byte_buffer.clear();
        for &sample in &self.conv_buffer[..out_frames * 2] {
            self.byte_buffer.extend_from_slice(&sample.to_le_bytes());
        }

        if let Some(file) = self.file.as_mut() {
            file.write_all(&self.byte_buffer)?;
            self.audio_size += self.byte_buffer.len() as u32;
        }
        Ok(())
    }
}

impl Drop for AudioFileWriter {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::error!("Failed to finalize dump file: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate::{DIVISOR_32KHZ, DIVISOR_48KHZ};
    use std::io::Cursor;

    fn le32(buf: &[u8], at: usize) -> u32 {
        u32::from_le_bytes(buf[at..at + 4].try_into().unwrap())
    }

    fn be32(buf: &[u8], at: usize) -> u32 {
        u32::from_be_bytes(buf[at..at + 4].try_into().unwrap())
    }

    fn be16(buf: &[u8], at: usize) -> u16 {
        u16::from_be_bytes(buf[at..at + 2].try_into().unwrap())
    }

    #[test]
    fn wav_header_layout() {
        let mut buf = Vec::new();
        write_wav_header(&mut buf, 48_000).unwrap();

        assert_eq!(buf.len(), 44);
        assert_eq!(&buf[0..4], b"RIFF");
        assert_eq!(le32(&buf, 4), 100_000_000);
        assert_eq!(&buf[8..12], b"WAVE");
        assert_eq!(&buf[12..16], b"fmt ");
        assert_eq!(le32(&buf, 16), 16);
        assert_eq!(le32(&buf, 20), 0x0002_0001);
        assert_eq!(le32(&buf, 24), 48_000);
        assert_eq!(le32(&buf, 28), 192_000);
        assert_eq!(le32(&buf, 32), 0x0010_0004);
        assert_eq!(&buf[36..40], b"data");
        assert_eq!(le32(&buf, 40), 100_000_000 - 32);
    }

    #[test]
    fn aiff_header_layout() {
        let mut buf = Vec::new();
        write_aiff_header(&mut buf, DIVISOR_48KHZ).unwrap();

        assert_eq!(buf.len(), 72);
        assert_eq!(&buf[0..4], b"FORM");
        assert_eq!(be32(&buf, 4), 100_000_000);
        assert_eq!(&buf[8..12], b"AIFC");
        assert_eq!(&buf[12..16], b"FVER");
        assert_eq!(be32(&buf, 16), 4);
        assert_eq!(be32(&buf, 20), 0xA280_5140);
        assert_eq!(&buf[24..28], b"COMM");
        assert_eq!(be32(&buf, 28), 0x18);
        assert_eq!(be16(&buf, 32), 2);
        assert_eq!(be32(&buf, 34), 50_000_000);
        assert_eq!(be16(&buf, 38), 16);
        // 48000 Hz as an 80-bit extended float
        assert_eq!(be16(&buf, 40), 0x400E);
        assert_eq!(
            u64::from_be_bytes(buf[42..50].try_into().unwrap()),
            0xBB80_0000_0000_0000
        );
        assert_eq!(&buf[50..54], b"sowt");
        assert_eq!(be16(&buf, 54), 0);
        assert_eq!(&buf[56..60], b"SSND");
        assert_eq!(be32(&buf, 60), 100_000_000);
        assert_eq!(be32(&buf, 64), 0);
        assert_eq!(be32(&buf, 68), 0);
    }

    #[test]
    fn wav_size_patch_targets_absolute_offsets() {
        let mut cursor = Cursor::new(Vec::new());
        write_wav_header(&mut cursor, 32_000).unwrap();
        patch_wav_sizes(&mut cursor, 400).unwrap();

        let buf = cursor.into_inner();
        assert_eq!(le32(&buf, 4), 436);
        assert_eq!(le32(&buf, 40), 400);
    }

    #[test]
    fn aiff_size_patch_targets_absolute_offsets() {
        let mut cursor = Cursor::new(Vec::new());
        write_aiff_header(&mut cursor, DIVISOR_32KHZ).unwrap();
        patch_aiff_sizes(&mut cursor, 400).unwrap();

        let buf = cursor.into_inner();
        assert_eq!(be32(&buf, 4), 400 + 64);
        assert_eq!(be32(&buf, 34), 100);
        assert_eq!(be32(&buf, 60), 392);
    }

    #[test]
    fn start_twice_is_rejected_without_side_effects() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = AudioFileWriter::new(ContainerFormat::Wav, DumpMode::Raw, false);
        writer
            .start(&dir.path().join("a.wav"), DIVISOR_48KHZ, &SilentOverwrite)
            .unwrap();

        let err = writer
            .start(&dir.path().join("b.wav"), DIVISOR_48KHZ, &SilentOverwrite)
            .unwrap_err();
        assert!(matches!(err, WriterError::AlreadyOpen { .. }));
        assert!(!dir.path().join("b.wav").exists());
        writer.stop().unwrap();
    }

    #[test]
    fn feed_requires_open_stream() {
        let mut writer = AudioFileWriter::new(ContainerFormat::Wav, DumpMode::Raw, false);
        let err = writer
            .feed(&[1, 2, 3, 4], DIVISOR_48KHZ, 256, 256, ByteOrder::Native)
            .unwrap_err();
        assert!(matches!(err, WriterError::NotOpen));
        assert_eq!(writer.audio_size(), 0);
    }

    #[test]
    fn oversized_batch_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = AudioFileWriter::new(ContainerFormat::Wav, DumpMode::Raw, false);
        writer
            .start(&dir.path().join("a.wav"), DIVISOR_48KHZ, &SilentOverwrite)
            .unwrap();

        let batch = vec![1i16; (BUFFER_FRAMES + 1) * 2];
        let err = writer
            .feed(&batch, DIVISOR_48KHZ, 256, 256, ByteOrder::Native)
            .unwrap_err();
        assert!(matches!(err, WriterError::BufferTooSmall { .. }));
        assert_eq!(writer.audio_size(), 0);

        // the writer keeps accepting well-sized batches afterwards
        writer
            .feed(&[5, 6, 7, 8], DIVISOR_48KHZ, 256, 256, ByteOrder::Native)
            .unwrap();
        assert_eq!(writer.audio_size(), 8);
        writer.stop().unwrap();
    }

    #[test]
    fn silence_elision_does_not_touch_bookkeeping() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = AudioFileWriter::new(ContainerFormat::Wav, DumpMode::Raw, true);
        writer
            .start(&dir.path().join("a.wav"), DIVISOR_48KHZ, &SilentOverwrite)
            .unwrap();

        writer
            .feed(&vec![0i16; 200], DIVISOR_48KHZ, 256, 256, ByteOrder::Native)
            .unwrap();
        assert_eq!(writer.audio_size(), 0);

        writer
            .feed(&vec![100i16; 200], DIVISOR_48KHZ, 256, 256, ByteOrder::Native)
            .unwrap();
        assert_eq!(writer.audio_size(), 400);
        writer.stop().unwrap();
    }

    #[test]
    fn rate_change_rotates_raw_segments() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = AudioFileWriter::new(ContainerFormat::Wav, DumpMode::Raw, false);
        writer
            .start(&dir.path().join("dump.wav"), DIVISOR_48KHZ, &SilentOverwrite)
            .unwrap();

        writer
            .feed(&[1i16; 100], DIVISOR_48KHZ, 256, 256, ByteOrder::Native)
            .unwrap();
        writer
            .feed(&[2i16; 100], DIVISOR_32KHZ, 256, 256, ByteOrder::Native)
            .unwrap();
        assert_eq!(writer.segment_index(), 1);
        writer.stop().unwrap();

        assert!(dir.path().join("dump.wav").exists());
        assert!(dir.path().join("dump1.wav").exists());
    }

    #[test]
    fn rate_change_in_resample_mode_keeps_one_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = AudioFileWriter::new(ContainerFormat::Wav, DumpMode::Resample, false);
        writer
            .start(&dir.path().join("dump.wav"), DIVISOR_48KHZ, &SilentOverwrite)
            .unwrap();

        writer
            .feed(&[1i16; 100], DIVISOR_48KHZ, 256, 256, ByteOrder::Native)
            .unwrap();
        writer
            .feed(&[2i16; 100], DIVISOR_32KHZ, 256, 256, ByteOrder::Native)
            .unwrap();
        assert_eq!(writer.segment_index(), 0);
        writer.stop().unwrap();
        assert!(!dir.path().join("dump1.wav").exists());
    }
}
