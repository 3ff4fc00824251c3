//! Fixed-point stereo resampling and raw sample conversion
//!
//! Converts interleaved stereo s16 batches from a divisor-described source
//! rate to the fixed 44100 Hz output rate using 16.16 fixed-point linear
//! interpolation. The fractional phase is carried across batches so that
//! batch boundaries never introduce a discontinuity; whatever partial frame
//! is left at the end of a batch is dropped, not buffered.
//!
//! Output writes are *additive*: the interpolated, volume-scaled sample is
//! added to whatever the target slot already holds, so two independent
//! streams can be mixed into one shared buffer. Callers that want plain
//! output zero the buffer first.

/// Fixed output rate of the resampling path.
pub const OUT_SAMPLE_RATE: u32 = 44_100;

/// Unity in 16.16 fixed point.
const FRAC_ONE: u32 = 65_536;

/// Byte/channel order of an incoming sample batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Host-order samples, interleaved (left, right).
    Native,
    /// Byte-swapped samples, interleaved high-channel-first (right, left).
    BigEndian,
}

/// Read one frame as (left, right) in host order, un-swapping as needed.
#[inline]
fn frame_at(input: &[i16], index: usize, order: ByteOrder) -> (i16, i16) {
    match order {
        ByteOrder::Native => (input[index], input[index + 1]),
        ByteOrder::BigEndian => (input[index + 1].swap_bytes(), input[index].swap_bytes()),
    }
}

/// True if every sample in the batch is zero.
pub fn is_silent(samples: &[i16]) -> bool {
    samples.iter().all(|&s| s == 0)
}

/// Scale by an integer volume (0..=256) and clamp to the s16 range.
#[inline]
fn scale_raw(sample: i16, volume: i32) -> i16 {
    (i32::from(sample) * volume / 256).clamp(-32_768, 32_767) as i16
}

/// Convert a batch without rate conversion: reorder/un-swap to (left, right)
/// and apply per-channel volume. Returns the number of frames written.
pub fn convert_raw_into(
    out: &mut [i16],
    input: &[i16],
    order: ByteOrder,
    l_volume: i32,
    r_volume: i32,
) -> usize {
    let frames = (input.len() / 2).min(out.len() / 2);
    for i in 0..frames {
        let (left, right) = frame_at(input, 2 * i, order);
        out[2 * i] = scale_raw(left, l_volume);
        out[2 * i + 1] = scale_raw(right, r_volume);
    }
    frames
}

/// Stereo linear-interpolation resampler with persistent fractional phase.
#[derive(Debug, Clone)]
pub struct StereoResampler {
    /// 16.16 phase accumulator; only the low 16 bits survive a batch.
    frac: u32,
    /// 16.16 ratio of source rate to [`OUT_SAMPLE_RATE`].
    ratio: u32,
    source_rate: u32,
    /// Previous interpolated, volume-scaled output pair.
    last_left: i16,
    last_right: i16,
}

impl StereoResampler {
    pub fn new(source_rate: u32) -> Self {
        StereoResampler {
            frac: 0,
            ratio: ratio_for(source_rate),
            source_rate,
            last_left: 0,
            last_right: 0,
        }
    }

    pub fn source_rate(&self) -> u32 {
        self.source_rate
    }

    /// Retune for a new source rate. The phase accumulator is kept so a
    /// mid-stream rate switch stays glitch-free.
    pub fn set_source_rate(&mut self, source_rate: u32) {
        if source_rate != self.source_rate {
            self.source_rate = source_rate;
            self.ratio = ratio_for(source_rate);
        }
    }

    /// Current fractional phase, always in [0, 65535] between batches.
    pub fn phase(&self) -> u16 {
        (self.frac & 0xFFFF) as u16
    }

    /// Previous (left, right) output pair.
    pub fn last_output(&self) -> (i16, i16) {
        (self.last_left, self.last_right)
    }

    /// Resample `input` into `out`, adding into the slots already there.
    ///
    /// Walks the input one interpolation pair (current, next) at a time and
    /// stops once either buffer runs out of room for a full frame; leftover
    /// input is dropped. Returns the number of output frames produced.
    pub fn resample_into(
        &mut self,
        out: &mut [i16],
        input: &[i16],
        order: ByteOrder,
        l_volume: i32,
        r_volume: i32,
    ) -> usize {
        let total = input.len();
        let mut in_index = 0usize;
        let mut out_pos = 0usize;

        // A step needs the current frame plus the next one.
        while out_pos + 2 <= out.len() && total >= in_index + 4 {
            let (l1, r1) = frame_at(input, in_index, order);
            let (l2, r2) = frame_at(input, in_index + 2, order);
            // The interpolation product needs i64: diff * frac can exceed
            // 2^31 at full scale. The result is back between the two
            // samples, so everything after the shift fits i32.
            let frac = i64::from(self.frac & 0xFFFF);

            let interp_l =
                (((i64::from(l1) << 16) + (i64::from(l2) - i64::from(l1)) * frac) >> 16) as i32;
            let mut sample_l = (interp_l * l_volume) >> 8;
            sample_l += i32::from(out[out_pos]);
            let sample_l = sample_l.clamp(-32_768, 32_767) as i16;
            out[out_pos] = sample_l;

            let interp_r =
                (((i64::from(r1) << 16) + (i64::from(r2) - i64::from(r1)) * frac) >> 16) as i32;
            let mut sample_r = (interp_r * r_volume) >> 8;
            sample_r += i32::from(out[out_pos + 1]);
            let sample_r = sample_r.clamp(-32_768, 32_767) as i16;
            out[out_pos + 1] = sample_r;

            self.last_left = sample_l;
            self.last_right = sample_r;

            self.frac += self.ratio;
            in_index += 2 * (self.frac >> 16) as usize;
            self.frac &= 0xFFFF;
            out_pos += 2;
        }

        out_pos / 2
    }
}

fn ratio_for(source_rate: u32) -> u32 {
    (FRAC_ONE as f64 * f64::from(source_rate) / f64::from(OUT_SAMPLE_RATE)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interleave(frames: &[(i16, i16)]) -> Vec<i16> {
        frames.iter().flat_map(|&(l, r)| [l, r]).collect()
    }

    /// Encode frames the way the byte-swapped producer delivers them:
    /// (right, left) pairs with swapped bytes.
    fn interleave_be(frames: &[(i16, i16)]) -> Vec<i16> {
        frames
            .iter()
            .flat_map(|&(l, r)| [r.swap_bytes(), l.swap_bytes()])
            .collect()
    }

    #[test]
    fn unity_ratio_is_identity() {
        let input = interleave(&[(100, -100), (200, -200), (300, -300), (400, -400)]);
        let mut out = vec![0i16; input.len()];
        let mut rs = StereoResampler::new(OUT_SAMPLE_RATE);
        assert_eq!(rs.ratio, FRAC_ONE);

        let frames = rs.resample_into(&mut out, &input, ByteOrder::Native, 256, 256);
        // The last input frame has no successor to interpolate toward.
        assert_eq!(frames, 3);
        assert_eq!(&out[..6], &input[..6]);
        assert_eq!(rs.phase(), 0, "unity ratio must not accumulate phase");
    }

    #[test]
    fn unity_ratio_steady_state_across_batches() {
        let batch = interleave(&[(1000, 2000); 8]);
        let mut rs = StereoResampler::new(OUT_SAMPLE_RATE);
        for _ in 0..4 {
            let mut out = vec![0i16; batch.len()];
            let frames = rs.resample_into(&mut out, &batch, ByteOrder::Native, 256, 256);
            assert_eq!(frames, 7);
            for i in 0..frames {
                assert_eq!(out[2 * i], 1000);
                assert_eq!(out[2 * i + 1], 2000);
            }
        }
        assert_eq!(rs.last_output(), (1000, 2000));
    }

    #[test]
    fn half_rate_interpolates_midpoints() {
        // 22050 -> 44100 doubles the frame count and fills in midpoints.
        let input = interleave(&[(0, 0), (1000, -1000), (2000, -2000)]);
        let mut out = vec![0i16; 16];
        let mut rs = StereoResampler::new(22_050);
        assert_eq!(rs.ratio, FRAC_ONE / 2);

        let frames = rs.resample_into(&mut out, &input, ByteOrder::Native, 256, 256);
        assert_eq!(frames, 4);
        let left: Vec<i16> = (0..frames).map(|i| out[2 * i]).collect();
        let right: Vec<i16> = (0..frames).map(|i| out[2 * i + 1]).collect();
        assert_eq!(left, vec![0, 500, 1000, 1500]);
        assert_eq!(right, vec![0, -500, -1000, -1500]);
    }

    #[test]
    fn phase_carries_across_batches() {
        // ratio 0.75: after N outputs the phase is (N * ratio) mod 65536.
        let mut rs = StereoResampler::new(33_075);
        assert_eq!(rs.ratio, 49_152);

        let batch = interleave(&[(500, 500); 6]);
        let mut produced = 0u32;
        for _ in 0..3 {
            let mut out = vec![0i16; 32];
            produced += rs.resample_into(&mut out, &batch, ByteOrder::Native, 256, 256) as u32;
            assert_eq!(u32::from(rs.phase()), (produced * 49_152) & 0xFFFF);
        }
    }

    #[test]
    fn volume_scaling_and_clamping() {
        let input = interleave(&[(1000, -1000); 4]);
        let mut rs = StereoResampler::new(OUT_SAMPLE_RATE);

        // volume 0 produces silence
        let mut out = vec![0i16; 8];
        rs.resample_into(&mut out, &input, ByteOrder::Native, 0, 0);
        assert!(out.iter().all(|&s| s == 0));

        // volume 128 halves
        let mut out = vec![0i16; 8];
        rs.resample_into(&mut out, &input, ByteOrder::Native, 128, 128);
        assert_eq!(out[0], 500);
        assert_eq!(out[1], -500);

        // accumulation near the rails clamps instead of wrapping
        let loud = interleave(&[(20_000, -20_000); 4]);
        let mut out = interleave(&[(30_000, -30_000); 4]);
        rs.resample_into(&mut out, &loud, ByteOrder::Native, 256, 256);
        assert_eq!(out[0], 32_767);
        assert_eq!(out[1], -32_768);
    }

    #[test]
    fn additive_mixing_of_two_streams() {
        let a = interleave(&[(100, 10); 4]);
        let b = interleave(&[(200, 20); 4]);
        let mut out = vec![0i16; 8];
        let mut rs_a = StereoResampler::new(OUT_SAMPLE_RATE);
        let mut rs_b = StereoResampler::new(OUT_SAMPLE_RATE);
        rs_a.resample_into(&mut out, &a, ByteOrder::Native, 256, 256);
        rs_b.resample_into(&mut out, &b, ByteOrder::Native, 256, 256);
        assert_eq!(out[0], 300);
        assert_eq!(out[1], 30);
    }

    #[test]
    fn big_endian_input_is_unswapped_and_reordered() {
        let frames = [(1000, -2000), (1200, -1800), (1400, -1600)];
        let native = interleave(&frames);
        let swapped = interleave_be(&frames);

        let mut out_native = vec![0i16; 8];
        let mut out_swapped = vec![0i16; 8];
        StereoResampler::new(OUT_SAMPLE_RATE).resample_into(
            &mut out_native,
            &native,
            ByteOrder::Native,
            256,
            256,
        );
        StereoResampler::new(OUT_SAMPLE_RATE).resample_into(
            &mut out_swapped,
            &swapped,
            ByteOrder::BigEndian,
            256,
            256,
        );
        assert_eq!(out_native, out_swapped);
    }

    #[test]
    fn raw_conversion_swaps_and_scales() {
        let frames = [(1000, -2000), (-32_768, 32_767)];
        let swapped = interleave_be(&frames);
        let mut out = vec![0i16; 4];
        let n = convert_raw_into(&mut out, &swapped, ByteOrder::BigEndian, 256, 256);
        assert_eq!(n, 2);
        assert_eq!(out, interleave(&frames));

        let mut out = vec![0i16; 4];
        convert_raw_into(&mut out, &swapped, ByteOrder::BigEndian, 128, 0);
        assert_eq!(out[0], 500);
        assert_eq!(out[1], 0);
    }

    #[test]
    fn silence_detection() {
        assert!(is_silent(&[0, 0, 0, 0]));
        assert!(!is_silent(&[0, 0, 1, 0]));
        assert!(is_silent(&[]));
    }
}
