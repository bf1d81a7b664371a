//! Audio source boundary
//!
//! Audio is pulled, not pushed: once per heartbeat tick while connected, the
//! worker asks the application for up to [`AUDIO_PULL_LEN`] bytes of PCM and
//! forwards whatever it gets to the media transport. The source may deliver
//! less than requested (underrun); the short frame is forwarded as-is and
//! the pull is not retried within the same tick.

/// Bytes of PCM requested from the source on each heartbeat tick
///
/// The stream format expected by A2DP sinks is 44.1 kHz two-channel 16-bit
/// PCM, so this is roughly 23 ms of audio per tick at full rate.
pub const AUDIO_PULL_LEN: usize = 4096;

/// Application-supplied audio producer
pub trait AudioSource {
    /// Fill `buf` with PCM data, returning the number of bytes written
    ///
    /// Returning less than `buf.len()` signals a temporary underrun.
    /// Implementations must not block indefinitely; a pull is expected to
    /// complete well within one heartbeat interval.
    fn pull(&mut self, buf: &mut [u8]) -> usize;
}

/// One interleaved 16-bit stereo sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, defmt::Format)]
pub struct StereoSample {
    /// Left channel
    pub left: i16,
    /// Right channel
    pub right: i16,
}

impl StereoSample {
    /// Split a packed 32-bit sample into its two 16-bit channels
    ///
    /// The low half is the left channel, matching the little-endian frame
    /// layout the transport expects.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub const fn from_packed(sample: u32) -> Self {
        Self {
            left: (sample & 0xFFFF) as i16,
            right: (sample >> 16) as i16,
        }
    }

    /// Pack the two channels back into a single 32-bit sample
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn to_packed(self) -> u32 {
        ((self.right as u16 as u32) << 16) | self.left as u16 as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stereo_sample_split() {
        let sample = StereoSample::from_packed(0x8000_7FFF);
        assert_eq!(sample.left, i16::MAX);
        assert_eq!(sample.right, i16::MIN);
    }

    #[test]
    fn test_stereo_sample_round_trip() {
        let original = StereoSample {
            left: -12345,
            right: 23456,
        };
        assert_eq!(StereoSample::from_packed(original.to_packed()), original);
    }

    #[test]
    fn test_silence_is_zero() {
        assert_eq!(StereoSample::default().to_packed(), 0);
    }
}
