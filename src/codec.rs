//! Codec seam and the MP3 (LAME) implementation
//!
//! The batch pipeline treats the encoder as an opaque collaborator: PCM
//! samples, channel count, and sample rate go in, a finished byte buffer
//! comes out. [`Mp3Codec`] backs the seam with `mp3lame-encoder`.

use log::debug;
use mp3lame_encoder::{Builder, FlushGap, InterleavedPcm, MonoPcm, Quality};
use thiserror::Error;

use crate::wave::WaveFormat;

/// Errors produced by an encoder
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The sample buffer has a channel layout the codec cannot encode
    #[error("cannot encode {channels} channel audio (mono or stereo only)")]
    UnsupportedChannels { channels: u16 },

    /// The encoder reported an internal failure
    #[error("encoder failure: {reason}")]
    Failure { reason: String },
}

/// An audio encoder taking a fully decoded interleaved sample buffer
pub trait Codec {
    /// File extension written by this codec, without the leading dot
    fn target_extension(&self) -> &'static str;

    /// Encode the interleaved samples into a complete output byte buffer
    ///
    /// The returned buffer includes the encoder's flushed tail; callers can
    /// write it to disk as-is.
    fn encode(&self, samples: &[i16], format: &WaveFormat) -> Result<Vec<u8>, CodecError>;
}

/// MP3 encoder backed by LAME
///
/// A fresh LAME instance is configured per invocation from the file's sample
/// rate and channel count, at quality 2 ("near best"). Mono input uses the
/// single-channel entry point; stereo input is fed interleaved.
#[derive(Debug, Default)]
pub struct Mp3Codec;

fn lame_error(err: impl std::fmt::Debug) -> CodecError {
    CodecError::Failure {
        reason: format!("{err:?}"),
    }
}

impl Codec for Mp3Codec {
    fn target_extension(&self) -> &'static str {
        "mp3"
    }

    fn encode(&self, samples: &[i16], format: &WaveFormat) -> Result<Vec<u8>, CodecError> {
        if !format.is_mono() && !format.is_stereo() {
            return Err(CodecError::UnsupportedChannels {
                channels: format.channels,
            });
        }

        let mut builder = Builder::new().ok_or_else(|| CodecError::Failure {
            reason: "failed to initialize LAME".to_string(),
        })?;
        builder
            .set_sample_rate(format.sample_rate)
            .map_err(lame_error)?;
        builder
            .set_num_channels(format.channels as u8)
            .map_err(lame_error)?;
        builder.set_quality(Quality::NearBest).map_err(lame_error)?;
        let mut encoder = builder.build().map_err(lame_error)?;

        let mut output =
            Vec::with_capacity(mp3lame_encoder::max_required_buffer_size(samples.len()));
        let written = if format.is_mono() {
            encoder
                .encode_to_vec(MonoPcm(samples), &mut output)
                .map_err(lame_error)?
        } else {
            encoder
                .encode_to_vec(InterleavedPcm(samples), &mut output)
                .map_err(lame_error)?
        };
        // LAME buffers trailing frames internally; the flushed tail is
        // appended onto the encoded buffer before the result is complete.
        let tail = encoder
            .flush_to_vec::<FlushGap>(&mut output)
            .map_err(lame_error)?;
        debug!(
            "encoded {} samples into {} + {} bytes",
            samples.len(),
            written,
            tail
        );

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format_for(channels: u16, sample_rate: u32) -> WaveFormat {
        WaveFormat {
            sample_rate,
            channels,
            bit_depth: 16,
            byte_rate: channels as u32 * sample_rate * 2,
            block_align: channels * 2,
        }
    }

    #[test]
    fn mono_encode_produces_mp3_frames() {
        let samples: Vec<i16> = (0..4410).map(|i| ((i % 100) * 300 - 15000) as i16).collect();
        let encoded = Mp3Codec.encode(&samples, &format_for(1, 44100)).unwrap();

        assert!(!encoded.is_empty());
        // MP3 frame sync: 11 set bits at the start of the first frame
        assert_eq!(encoded[0], 0xFF);
        assert_eq!(encoded[1] & 0xE0, 0xE0);
    }

    #[test]
    fn stereo_encode_accepts_interleaved_input() {
        let samples: Vec<i16> = (0..8820).map(|i| ((i % 64) * 500 - 16000) as i16).collect();
        let encoded = Mp3Codec.encode(&samples, &format_for(2, 44100)).unwrap();
        assert!(!encoded.is_empty());
    }

    #[test]
    fn more_than_two_channels_is_rejected() {
        let result = Mp3Codec.encode(&[0i16; 24], &format_for(6, 48000));
        assert_eq!(
            result,
            Err(CodecError::UnsupportedChannels { channels: 6 })
        );
    }

    #[test]
    fn target_extension_is_mp3() {
        assert_eq!(Mp3Codec.target_extension(), "mp3");
    }
}
