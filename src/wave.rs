//! RIFF/WAVE container parser
//!
//! Decodes a byte buffer holding a complete WAV file into typed format
//! metadata and an interleaved 16-bit sample buffer. Supports:
//! - 16-bit PCM only
//! - 1 to 128 channels (interleaved)
//! - Any sample rate
//!
//! Every multi-byte read is bounds-checked; a read that would pass the end of
//! the buffer is reported as [`WaveError::TruncatedFile`] instead of
//! panicking. Parsing is a pure function of the input bytes.

use thiserror::Error;

/// Chunk identifier tags (4-byte ASCII)
const RIFF_TAG: &[u8; 4] = b"RIFF";
const WAVE_TAG: &[u8; 4] = b"WAVE";
const FMT_TAG: &[u8; 4] = b"fmt ";
const DATA_TAG: &[u8; 4] = b"data";
const IXML_TAG: &[u8; 4] = b"iXML";

/// Audio format tag for uncompressed linear PCM
const WAVE_FORMAT_PCM: u16 = 1;

/// Offset of the first chunk after the RIFF header
const FIRST_CHUNK_OFFSET: usize = 12;

/// Byte order for multi-byte field decoding
///
/// Every field in a WAV file is little-endian; big-endian decoding is
/// supported by the read helpers as part of their contract but unused by
/// [`parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

/// Errors produced while decoding a WAV container
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WaveError {
    /// The buffer does not start with a RIFF header carrying the WAVE tag
    #[error("not a RIFF/WAVE container")]
    InvalidContainer,

    /// A required chunk was not found during the chunk walk
    #[error("required '{tag}' chunk not found")]
    MissingChunk { tag: &'static str },

    /// The format chunk declares a non-PCM sample encoding
    #[error("unsupported audio format tag {found} (only PCM = 1 is supported)")]
    UnsupportedFormat { found: u16 },

    /// The declared channel count is outside the valid range [1, 128]
    #[error("invalid channel count {found} (expected 1-128)")]
    InvalidChannelCount { found: u16 },

    /// The declared byte rate or block alignment contradicts the other
    /// format fields
    #[error(
        "inconsistent header: byte rate {byte_rate} (expected {expected_byte_rate}), \
         block align {block_align} (expected {expected_block_align})"
    )]
    InconsistentHeader {
        byte_rate: u32,
        expected_byte_rate: u64,
        block_align: u16,
        expected_block_align: u32,
    },

    /// The declared bit depth is not 16; wider depths are a documented
    /// non-goal of this parser, not a defect of the file
    #[error("unsupported bit depth {found} (only 16-bit PCM is supported)")]
    UnsupportedBitDepth { found: u16 },

    /// A read of `need` bytes at `offset` would pass the end of the buffer
    #[error("truncated file: {need} byte read at offset {offset} passes end of {len} byte buffer")]
    TruncatedFile {
        offset: usize,
        need: usize,
        len: usize,
    },
}

/// Result type for WAV parsing
pub type WaveResult<T> = Result<T, WaveError>;

/// Format metadata decoded from the `fmt ` chunk
///
/// Immutable once parsed. The declared byte rate and block alignment are kept
/// alongside the derived fields so diagnostics can show both sides of a
/// consistency failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveFormat {
    /// Samples per second
    pub sample_rate: u32,
    /// Number of interleaved channels (1 = mono, 2 = stereo)
    pub channels: u16,
    /// Bits per sample; only 16 passes validation
    pub bit_depth: u16,
    /// Declared bytes per second
    pub byte_rate: u32,
    /// Declared bytes per sample frame
    pub block_align: u16,
}

impl WaveFormat {
    /// Returns true if the audio has exactly one channel
    pub fn is_mono(&self) -> bool {
        self.channels == 1
    }

    /// Returns true if the audio has exactly two channels
    pub fn is_stereo(&self) -> bool {
        self.channels == 2
    }

    /// Returns the number of bytes per single-channel sample
    pub fn bytes_per_sample(&self) -> u16 {
        self.bit_depth / 8
    }
}

/// A successfully parsed WAV file
#[derive(Debug, Clone, PartialEq)]
pub struct WaveAudio {
    /// Format metadata from the `fmt ` chunk
    pub format: WaveFormat,
    /// Channel-interleaved samples; frame `i` occupies `channels`
    /// consecutive slots
    pub samples: Vec<i16>,
    /// Payload of the optional `iXML` metadata chunk, when present
    pub ixml: Option<String>,
}

impl WaveAudio {
    /// Total length in seconds
    pub fn duration_secs(&self) -> f32 {
        let frames = self.samples.len() / self.format.channels as usize;
        frames as f32 / self.format.sample_rate as f32
    }
}

/// Borrow `need` bytes at `offset`, or report the out-of-bounds read
fn take(data: &[u8], offset: usize, need: usize) -> WaveResult<&[u8]> {
    match offset.checked_add(need) {
        Some(end) if end <= data.len() => Ok(&data[offset..end]),
        _ => Err(WaveError::TruncatedFile {
            offset,
            need,
            len: data.len(),
        }),
    }
}

/// Decode a 16-bit integer at `offset`
pub fn read_u16(data: &[u8], offset: usize, endianness: Endianness) -> WaveResult<u16> {
    let bytes = take(data, offset, 2)?;
    Ok(match endianness {
        Endianness::Little => u16::from_le_bytes([bytes[0], bytes[1]]),
        Endianness::Big => u16::from_be_bytes([bytes[0], bytes[1]]),
    })
}

/// Decode a 32-bit integer at `offset`
pub fn read_u32(data: &[u8], offset: usize, endianness: Endianness) -> WaveResult<u32> {
    let bytes = take(data, offset, 4)?;
    Ok(match endianness {
        Endianness::Little => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        Endianness::Big => u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
    })
}

/// Walk the chunk list looking for `tag`, starting at `start`
///
/// At each position the 4-byte ID is compared against `tag`; on a mismatch
/// the cursor advances by `8 + declared_size`. Chunk sizes are decoded with
/// the given endianness. Odd-sized chunks are NOT padded to a 2-byte
/// boundary; a writer that aligns chunks will throw the walk off, which then
/// reports the sought tag as missing.
///
/// Returns `None` when the walk runs off the end of the buffer without
/// finding the tag.
pub fn find_chunk(
    data: &[u8],
    tag: &[u8; 4],
    start: usize,
    endianness: Endianness,
) -> Option<usize> {
    let mut cursor = start;
    while cursor + 4 < data.len() {
        if &data[cursor..cursor + 4] == tag {
            return Some(cursor);
        }
        // The size field read, or any jump past the buffer end, terminates
        // the walk as "not found" rather than erroring.
        let size = read_u32(data, cursor + 4, endianness).ok()?;
        cursor = cursor.checked_add(8)?.checked_add(size as usize)?;
    }
    None
}

/// Parse a complete WAV file held in `data`
///
/// Validates the RIFF/WAVE header, locates the `fmt ` and `data` chunks
/// (plus the optional `iXML` chunk), cross-validates the format fields, and
/// extracts the interleaved sample buffer. A zero-size data chunk parses to
/// an empty sample buffer.
pub fn parse(data: &[u8]) -> WaveResult<WaveAudio> {
    let endianness = Endianness::Little;

    if data.len() < FIRST_CHUNK_OFFSET {
        return Err(WaveError::TruncatedFile {
            offset: 0,
            need: FIRST_CHUNK_OFFSET,
            len: data.len(),
        });
    }
    if &data[0..4] != RIFF_TAG || &data[8..12] != WAVE_TAG {
        return Err(WaveError::InvalidContainer);
    }

    let fmt_offset = find_chunk(data, FMT_TAG, FIRST_CHUNK_OFFSET, endianness)
        .ok_or(WaveError::MissingChunk { tag: "fmt " })?;
    let data_offset = find_chunk(data, DATA_TAG, FIRST_CHUNK_OFFSET, endianness)
        .ok_or(WaveError::MissingChunk { tag: "data" })?;
    let ixml_offset = find_chunk(data, IXML_TAG, FIRST_CHUNK_OFFSET, endianness);

    // fmt chunk: fixed field offsets relative to the chunk start.
    let f = fmt_offset;
    let audio_format = read_u16(data, f + 8, endianness)?;
    let channels = read_u16(data, f + 10, endianness)?;
    let sample_rate = read_u32(data, f + 12, endianness)?;
    let byte_rate = read_u32(data, f + 16, endianness)?;
    let block_align = read_u16(data, f + 20, endianness)?;
    let bit_depth = read_u16(data, f + 22, endianness)?;

    if audio_format != WAVE_FORMAT_PCM {
        return Err(WaveError::UnsupportedFormat {
            found: audio_format,
        });
    }
    if channels < 1 || channels > 128 {
        return Err(WaveError::InvalidChannelCount { found: channels });
    }

    // The consistency check runs against the declared bit depth, before the
    // depth itself is validated, so both expected values are computed in a
    // wider type than the fields; an absurd declared depth must surface as
    // an inconsistency, not an overflow.
    let expected_byte_rate =
        channels as u64 * sample_rate as u64 * bit_depth as u64 / 8;
    let expected_block_align = channels as u32 * (bit_depth as u32 / 8);
    if byte_rate as u64 != expected_byte_rate || block_align as u32 != expected_block_align {
        return Err(WaveError::InconsistentHeader {
            byte_rate,
            expected_byte_rate,
            block_align,
            expected_block_align,
        });
    }
    if bit_depth != 16 {
        return Err(WaveError::UnsupportedBitDepth { found: bit_depth });
    }

    // data chunk: raw little-endian samples, no per-sample conversion.
    let d = data_offset;
    let data_size = read_u32(data, d + 4, endianness)? as usize;
    let payload = take(data, d + 8, data_size)?;
    let samples: Vec<i16> = payload
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect();

    let ixml = match ixml_offset {
        Some(x) => {
            let size = read_u32(data, x + 4, endianness)? as usize;
            let chunk = take(data, x + 8, size)?;
            Some(String::from_utf8_lossy(chunk).into_owned())
        }
        None => None,
    };

    Ok(WaveAudio {
        format: WaveFormat {
            sample_rate,
            channels,
            bit_depth,
            byte_rate,
            block_align,
        },
        samples,
        ixml,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    /// Build a well-formed 16-bit PCM WAV file in memory
    fn build_wav(channels: u16, sample_rate: u32, samples: &[i16]) -> Vec<u8> {
        let data_size = (samples.len() * 2) as u32;
        let byte_rate = channels as u32 * sample_rate * 2;
        let block_align = channels * 2;

        let mut out = Vec::with_capacity(44 + data_size as usize);
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_size).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes()); // PCM
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out.extend_from_slice(&byte_rate.to_le_bytes());
        out.extend_from_slice(&block_align.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_size.to_le_bytes());
        for sample in samples {
            out.extend_from_slice(&sample.to_le_bytes());
        }
        out
    }

    #[test]
    fn parse_mono_roundtrip() {
        let samples = [0i16, 100, -100, i16::MAX, i16::MIN];
        let audio = parse(&build_wav(1, 22050, &samples)).unwrap();

        assert_eq!(audio.format.channels, 1);
        assert!(audio.format.is_mono());
        assert_eq!(audio.format.sample_rate, 22050);
        assert_eq!(audio.format.bit_depth, 16);
        assert_eq!(audio.format.bytes_per_sample(), 2);
        assert_eq!(audio.samples, samples);
        assert!(audio.ixml.is_none());
    }

    #[test]
    fn parse_stereo_roundtrip() {
        // Interleaved L/R frames
        let samples = [10i16, -10, 20, -20, 30, -30];
        let audio = parse(&build_wav(2, 44100, &samples)).unwrap();

        assert!(audio.format.is_stereo());
        assert_eq!(audio.format.sample_rate, 44100);
        assert_eq!(audio.samples, samples);
    }

    #[test]
    fn minimal_header_parses_to_empty_buffer() {
        // 44-byte file: full header, data chunk of size 0
        let wav = build_wav(1, 44100, &[]);
        assert_eq!(wav.len(), 44);

        let audio = parse(&wav).unwrap();
        assert!(audio.samples.is_empty());
        assert_eq!(audio.format.sample_rate, 44100);
    }

    #[test]
    fn bad_riff_tag_fails_before_chunk_walk() {
        let mut wav = build_wav(1, 44100, &[1, 2, 3]);
        wav[0..4].copy_from_slice(b"RIFX");
        assert_eq!(parse(&wav), Err(WaveError::InvalidContainer));
    }

    #[test]
    fn bad_wave_tag_is_invalid_container() {
        let mut wav = build_wav(1, 44100, &[1, 2, 3]);
        wav[8..12].copy_from_slice(b"AVI ");
        assert_eq!(parse(&wav), Err(WaveError::InvalidContainer));
    }

    #[test]
    fn short_buffer_is_truncated() {
        assert!(matches!(
            parse(b"RIFF"),
            Err(WaveError::TruncatedFile { .. })
        ));
    }

    #[test]
    fn missing_fmt_chunk_is_reported() {
        let mut wav = build_wav(1, 44100, &[1]);
        wav[12..16].copy_from_slice(b"junk");
        assert_eq!(parse(&wav), Err(WaveError::MissingChunk { tag: "fmt " }));
    }

    #[test]
    fn missing_data_chunk_is_reported() {
        let mut wav = build_wav(1, 44100, &[]);
        wav[36..40].copy_from_slice(b"fact");
        assert_eq!(parse(&wav), Err(WaveError::MissingChunk { tag: "data" }));
    }

    #[test]
    fn non_pcm_format_is_rejected() {
        let mut wav = build_wav(1, 44100, &[1]);
        wav[20..22].copy_from_slice(&3u16.to_le_bytes()); // IEEE float
        assert_eq!(parse(&wav), Err(WaveError::UnsupportedFormat { found: 3 }));
    }

    #[rstest]
    #[case(0)]
    #[case(129)]
    #[case(u16::MAX)]
    fn out_of_range_channel_count_is_rejected(#[case] channels: u16) {
        let mut wav = build_wav(1, 44100, &[1]);
        wav[22..24].copy_from_slice(&channels.to_le_bytes());
        assert_eq!(
            parse(&wav),
            Err(WaveError::InvalidChannelCount { found: channels })
        );
    }

    #[test]
    fn wrong_byte_rate_is_inconsistent() {
        let mut wav = build_wav(2, 44100, &[1, 2]);
        wav[28..32].copy_from_slice(&12345u32.to_le_bytes());

        match parse(&wav) {
            Err(WaveError::InconsistentHeader {
                byte_rate,
                expected_byte_rate,
                ..
            }) => {
                assert_eq!(byte_rate, 12345);
                assert_eq!(expected_byte_rate, 2 * 44100 * 2);
            }
            other => panic!("expected InconsistentHeader, got {:?}", other),
        }
    }

    #[test]
    fn oversized_declared_bit_depth_is_an_error_not_a_panic() {
        // 128 channels at a declared 8192-bit depth would overflow a u16
        // block-align product; the header must be reported as inconsistent.
        let mut wav = build_wav(1, 44100, &[1]);
        wav[22..24].copy_from_slice(&128u16.to_le_bytes());
        wav[34..36].copy_from_slice(&8192u16.to_le_bytes());
        assert!(matches!(
            parse(&wav),
            Err(WaveError::InconsistentHeader { .. })
        ));
    }

    #[test]
    fn wrong_block_align_is_inconsistent() {
        let mut wav = build_wav(2, 44100, &[1, 2]);
        wav[32..34].copy_from_slice(&7u16.to_le_bytes());
        assert!(matches!(
            parse(&wav),
            Err(WaveError::InconsistentHeader { .. })
        ));
    }

    #[rstest]
    #[case(8)]
    #[case(24)]
    #[case(32)]
    fn non_16_bit_depth_is_rejected(#[case] depth: u16) {
        let mut wav = build_wav(1, 44100, &[1]);
        // Keep byte rate and block align consistent with the new depth so
        // the bit-depth check is what fires.
        wav[28..32].copy_from_slice(&(44100 * depth as u32 / 8).to_le_bytes());
        wav[32..34].copy_from_slice(&(depth / 8).to_le_bytes());
        wav[34..36].copy_from_slice(&depth.to_le_bytes());
        assert_eq!(
            parse(&wav),
            Err(WaveError::UnsupportedBitDepth { found: depth })
        );
    }

    #[test]
    fn declared_data_size_past_end_is_truncated() {
        let mut wav = build_wav(1, 44100, &[1, 2, 3]);
        wav[40..44].copy_from_slice(&1000u32.to_le_bytes());
        assert!(matches!(
            parse(&wav),
            Err(WaveError::TruncatedFile { .. })
        ));
    }

    #[test]
    fn unknown_chunks_are_skipped() {
        // Insert a chunk between the header and the fmt chunk.
        let tail = &build_wav(1, 8000, &[7, 8])[12..];
        let mut wav = Vec::new();
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&0u32.to_le_bytes());
        wav.extend_from_slice(b"WAVE");
        wav.extend_from_slice(b"LIST");
        wav.extend_from_slice(&5u32.to_le_bytes());
        wav.extend_from_slice(&[0xAA; 5]); // odd size, no pad byte
        wav.extend_from_slice(tail);

        let audio = parse(&wav).unwrap();
        assert_eq!(audio.samples, [7, 8]);
    }

    #[test]
    fn ixml_chunk_payload_is_captured() {
        let xml = b"<BWFXML><IXML_VERSION>1.5</IXML_VERSION></BWFXML>";
        let mut wav = build_wav(1, 44100, &[1]);
        wav.extend_from_slice(b"iXML");
        wav.extend_from_slice(&(xml.len() as u32).to_le_bytes());
        wav.extend_from_slice(xml);

        let audio = parse(&wav).unwrap();
        assert_eq!(audio.ixml.as_deref(), Some(std::str::from_utf8(xml).unwrap()));
    }

    #[test]
    fn find_chunk_returns_none_past_end() {
        let wav = build_wav(1, 44100, &[1]);
        assert_eq!(find_chunk(&wav, b"zzzz", 12, Endianness::Little), None);
    }

    #[test]
    fn read_helpers_support_both_byte_orders() {
        let bytes = [0x01, 0x02, 0x03, 0x04];
        assert_eq!(read_u16(&bytes, 0, Endianness::Little).unwrap(), 0x0201);
        assert_eq!(read_u16(&bytes, 0, Endianness::Big).unwrap(), 0x0102);
        assert_eq!(read_u32(&bytes, 0, Endianness::Little).unwrap(), 0x0403_0201);
        assert_eq!(read_u32(&bytes, 0, Endianness::Big).unwrap(), 0x0102_0304);
        assert!(matches!(
            read_u32(&bytes, 1, Endianness::Little),
            Err(WaveError::TruncatedFile {
                offset: 1,
                need: 4,
                len: 4
            })
        ));
    }

    #[test]
    fn duration_accounts_for_channels() {
        let samples = vec![0i16; 44100 * 2];
        let audio = parse(&build_wav(2, 44100, &samples)).unwrap();
        assert!((audio.duration_secs() - 1.0).abs() < f32::EPSILON);
    }
}
