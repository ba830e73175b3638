//! `snd ` resource decoding and WAV synthesis (§3, §4.8).
//!
//! Format-1 and format-2 sound list headers are both parsed down to their
//! command stream and sampled-sound header. Uncompressed PCM payloads
//! (`stdSH`/`extSH`, 8- or 16-bit) are turned into WAV bytes directly.
//! A `cmpSH`-compressed sound's closed-form codecs (`ulaw`/`alaw`, and the
//! `twos`/`sowt` pass-through tags) are expanded too; MACE 3:1/6:1 and
//! IMA4, which need a stateful predictor table rather than a per-sample
//! formula, are treated as an opaque sub-library this crate doesn't vendor
//! (§1 Non-goals), so those two remain unsupported.

use rsrc_errors::Error;
use rsrc_io::Reader;

fn oor(error: rsrc_io::OutOfRange) -> Error {
    Error::OutOfRange(error.offset, error.needed, error.len)
}

/// One Sound Manager command (`cmd`, `param1`, `param2`), 8 bytes on the
/// wire.
#[derive(Debug, Clone, Copy)]
pub struct SoundCommand {
    /// Command selector. `0x8051` = `bufferCmd`, `0x8050` = `soundCmd`.
    pub command: u16,
    /// First (16-bit) parameter.
    pub param1: i16,
    /// Second (32-bit) parameter; for `bufferCmd`/`soundCmd` this is the
    /// byte offset (from the start of the resource) of the sample header.
    pub param2: i32,
}

const CMD_SOUND: u16 = 0x8050;
const CMD_BUFFER: u16 = 0x8051;

/// The encoding byte stored in a sampled-sound header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleEncoding {
    /// `stdSH`, 0x00: standard header, implicit 8-bit mono PCM.
    Standard,
    /// `extSH`, 0xFF: extended header, explicit channel count/sample size.
    Extended,
    /// `cmpSH`, 0xFE: compressed header, needs a codec this crate doesn't
    /// implement.
    Compressed,
}

/// A parsed sampled-sound header, standard or extended (§3).
#[derive(Debug, Clone)]
pub struct SampleHeader {
    /// Encoding variant.
    pub encoding: SampleEncoding,
    /// Channel count (1 for `stdSH`, explicit for `extSH`/`cmpSH`).
    pub channels: u32,
    /// Sample rate, as a 16.16 fixed-point value converted to Hz.
    pub sample_rate: f64,
    /// Loop start sample index (0 if unused).
    pub loop_start: u32,
    /// Loop end sample index (0 if unused).
    pub loop_end: u32,
    /// MIDI base note (propagated so `INST`/instrument decoders can
    /// reference a sound's native pitch).
    pub base_frequency: u8,
    /// Bits per sample (8 or 16 for PCM; meaningless for `cmpSH`).
    pub sample_size: u16,
    /// `cmpSH`'s compression id (3/4 = MACE 3:1/6:1, 0xFFFF = "format
    /// fourCC names the codec", 0xFFFE = variable-ratio/unsupported).
    /// Zero for `stdSH`/`extSH`.
    pub compression_id: u16,
    /// `cmpSH`'s four-character codec tag (`ulaw`, `alaw`, `ima4`, `MAC3`,
    /// `MAC6`, `twos`, `sowt`), valid only when `compression_id == 0xFFFF`.
    pub format: [u8; 4],
    /// Raw sample payload bytes (still codec-encoded for `cmpSH`).
    pub data: Vec<u8>,
}

fn fixed_to_hz(raw: u32) -> f64 {
    raw as f64 / 65536.0
}

/// Parse a standard (`stdSH`) sampled-sound header. `stereo` comes from the
/// format-1 data-format descriptor's flag bit 6 (§4.8); format-2 sounds are
/// always mono here.
fn parse_standard_header(reader: &mut Reader, stereo: bool) -> Result<SampleHeader, Error> {
    let _sample_ptr = reader.get_u32be().map_err(oor)?;
    let length = reader.get_u32be().map_err(oor)?;
    let sample_rate = reader.get_u32be().map_err(oor)?;
    let loop_start = reader.get_u32be().map_err(oor)?;
    let loop_end = reader.get_u32be().map_err(oor)?;
    let _encode = reader.get_u8().map_err(oor)?;
    let base_frequency = reader.get_u8().map_err(oor)?;
    let data = reader.get_bytes(length as usize).map_err(oor)?.to_vec();

    Ok(SampleHeader {
        encoding: SampleEncoding::Standard,
        channels: if stereo { 2 } else { 1 },
        sample_rate: fixed_to_hz(sample_rate),
        loop_start,
        loop_end,
        base_frequency,
        sample_size: 8,
        compression_id: 0,
        format: [0; 4],
        data,
    })
}

fn parse_extended_header(reader: &mut Reader) -> Result<SampleHeader, Error> {
    let _sample_ptr = reader.get_u32be().map_err(oor)?;
    let channels = reader.get_u32be().map_err(oor)?;
    let sample_rate = reader.get_u32be().map_err(oor)?;
    let loop_start = reader.get_u32be().map_err(oor)?;
    let loop_end = reader.get_u32be().map_err(oor)?;
    let _encode = reader.get_u8().map_err(oor)?;
    let base_frequency = reader.get_u8().map_err(oor)?;
    let num_frames = reader.get_u32be().map_err(oor)?;
    let _aiff_sample_rate = reader.get_bytes(10).map_err(oor)?;
    let _marker_chunk = reader.get_u32be().map_err(oor)?;
    let _instrument_chunks = reader.get_u32be().map_err(oor)?;
    let _aes_recording = reader.get_u32be().map_err(oor)?;
    let sample_size = reader.get_u16be().map_err(oor)?;
    let _future = reader.get_bytes(14).map_err(oor)?;

    let byte_length = num_frames as usize * channels.max(1) as usize * (sample_size.max(8) as usize / 8);
    let data = reader.get_bytes(byte_length).map_err(oor)?.to_vec();

    Ok(SampleHeader {
        encoding: SampleEncoding::Extended,
        channels: channels.max(1),
        sample_rate: fixed_to_hz(sample_rate),
        loop_start,
        loop_end,
        base_frequency,
        sample_size,
        compression_id: 0,
        format: [0; 4],
        data,
    })
}

fn parse_compressed_header(reader: &mut Reader) -> Result<SampleHeader, Error> {
    let _sample_ptr = reader.get_u32be().map_err(oor)?;
    let channels = reader.get_u32be().map_err(oor)?;
    let sample_rate = reader.get_u32be().map_err(oor)?;
    let loop_start = reader.get_u32be().map_err(oor)?;
    let loop_end = reader.get_u32be().map_err(oor)?;
    let _encode = reader.get_u8().map_err(oor)?;
    let base_frequency = reader.get_u8().map_err(oor)?;
    let num_frames = reader.get_u32be().map_err(oor)?;
    let _aiff_sample_rate = reader.get_bytes(10).map_err(oor)?;
    let _marker_chunk = reader.get_u32be().map_err(oor)?;
    let format_bytes = reader.get_bytes(4).map_err(oor)?;
    let format = [format_bytes[0], format_bytes[1], format_bytes[2], format_bytes[3]];
    let _future2 = reader.get_u32be().map_err(oor)?;
    let _state_vars = reader.get_u32be().map_err(oor)?;
    let _left_over = reader.get_u32be().map_err(oor)?;
    let compression_id = reader.get_u16be().map_err(oor)?;
    let packet_size = reader.get_u16be().map_err(oor)?;
    let _snth_id = reader.get_u16be().map_err(oor)?;
    let sample_size = reader.get_u16be().map_err(oor)?;

    let packet_size = if packet_size == 0 { 1 } else { packet_size };
    let byte_length = (num_frames as usize).div_ceil(packet_size as usize) * packet_size as usize;
    let data = reader.get_bytes(byte_length).map_err(oor)?.to_vec();

    Ok(SampleHeader {
        encoding: SampleEncoding::Compressed,
        channels: channels.max(1),
        sample_rate: fixed_to_hz(sample_rate),
        loop_start,
        loop_end,
        base_frequency,
        sample_size,
        compression_id,
        format,
        data,
    })
}

fn parse_sample_header_at(resource: &[u8], offset: usize, stereo: bool) -> Result<SampleHeader, Error> {
    let tail = resource.get(offset..).ok_or(Error::OutOfRange(offset, 0, resource.len()))?;
    let encode_byte = *tail.get(20).ok_or(Error::OutOfRange(offset + 20, 1, resource.len()))?;

    let mut reader = Reader::new(tail);
    match encode_byte {
        0xFF => parse_extended_header(&mut reader),
        0xFE => parse_compressed_header(&mut reader),
        _ => parse_standard_header(&mut reader, stereo),
    }
}

/// A fully parsed `snd ` resource: its command stream plus, if a
/// `bufferCmd`/`soundCmd` referenced one, the sampled-sound header it
/// points to.
#[derive(Debug, Clone)]
pub struct Sound {
    /// `1` or `2`, the sound list format.
    pub format: u16,
    /// The command stream, in wire order.
    pub commands: Vec<SoundCommand>,
    /// The sample header a `bufferCmd`/`soundCmd` referenced, if any.
    pub sample: Option<SampleHeader>,
}

const STEREO_FLAG: u16 = 1 << 6;

/// Parse a `snd ` resource (§3, §4.8: format 1 or format 2).
pub fn parse(bytes: &[u8]) -> Result<Sound, Error> {
    let mut reader = Reader::new(bytes);
    let format = reader.get_u16be().map_err(oor)?;

    match format {
        1 => {
            let num_data_formats = reader.get_u16be().map_err(oor)?;
            let mut stereo = false;
            for _ in 0..num_data_formats {
                let _data_format_id = reader.get_u16be().map_err(oor)?;
                let flags = reader.get_u16be().map_err(oor)?;
                stereo |= flags & STEREO_FLAG != 0;
            }
            parse_commands(bytes, &mut reader, format, stereo)
        }
        2 => {
            let _ref_count = reader.get_u16be().map_err(oor)?;
            parse_commands(bytes, &mut reader, format, false)
        }
        other => Err(Error::UnsupportedFormat(format!("snd list format {other}"))),
    }
}

/// `true` if the given command opcode is a buffer command (`soundCmd` or
/// `bufferCmd`, with or without the "is resource" high bit set).
fn is_buffer_command(command: u16) -> bool {
    matches!(command & 0x7FFF, c if c == (CMD_SOUND & 0x7FFF) || c == (CMD_BUFFER & 0x7FFF))
}

fn parse_commands(bytes: &[u8], reader: &mut Reader, format: u16, stereo: bool) -> Result<Sound, Error> {
    let num_commands = reader.get_u16be().map_err(oor)?;
    let mut commands = Vec::with_capacity(num_commands as usize);
    let mut has_buffer_command = false;

    for _ in 0..num_commands {
        let command = reader.get_u16be().map_err(oor)?;
        let param1 = reader.get_i16be().map_err(oor)?;
        let param2 = reader.get_i32be().map_err(oor)?;

        commands.push(SoundCommand { command, param1, param2 });
        has_buffer_command |= is_buffer_command(command);
    }

    // `param2` is advisory only (§4.8): the sample buffer in practice
    // immediately follows the command stream, so that's the position used
    // regardless of what any buffer command claims.
    let sample = if has_buffer_command { parse_sample_header_at(bytes, reader.position(), stereo).ok() } else { None };

    Ok(Sound { format, commands, sample })
}

/// Downgrade an interleaved stereo PCM buffer to mono by averaging channel
/// pairs. Preserves whatever precision loss this entails rather than
/// dithering — a forensic decoder should not invent samples that weren't
/// on disk.
fn downgrade_stereo_to_mono(data: &[u8], sample_size: u16) -> Vec<u8> {
    log::debug!("downgrading stereo sound to mono by averaging channel pairs");

    match sample_size {
        16 => data
            .chunks_exact(4)
            .flat_map(|frame| {
                let left = i16::from_le_bytes([frame[0], frame[1]]) as i32;
                let right = i16::from_le_bytes([frame[2], frame[3]]) as i32;
                (((left + right) / 2) as i16).to_le_bytes()
            })
            .collect(),
        _ => data.chunks_exact(2).map(|frame| ((frame[0] as u16 + frame[1] as u16) / 2) as u8).collect(),
    }
}

/// Expand one G.711 µ-law byte to a 16-bit linear PCM sample.
fn ulaw_to_linear(byte: u8) -> i16 {
    let inverted = !byte;
    let sign = inverted & 0x80;
    let exponent = (inverted >> 4) & 0x07;
    let mantissa = inverted & 0x0F;
    let magnitude = (((mantissa as i32) << 3) + 0x84) << exponent;
    let magnitude = magnitude - 0x84;
    (if sign != 0 { -magnitude } else { magnitude }) as i16
}

/// Expand one G.711 A-law byte to a 16-bit linear PCM sample.
fn alaw_to_linear(byte: u8) -> i16 {
    let toggled = byte ^ 0x55;
    let sign = toggled & 0x80;
    let exponent = (toggled >> 4) & 0x07;
    let mantissa = (toggled & 0x0F) as i32;
    let magnitude = if exponent == 0 { (mantissa << 4) + 8 } else { ((mantissa << 4) + 0x108) << (exponent - 1) };
    (if sign == 0 { -magnitude } else { magnitude }) as i16
}

/// Expand a `cmpSH` buffer whose codec is a closed-form per-sample formula
/// (µ-law, A-law) or a pure re-tagging (`twos`/`sowt`, big/little-endian
/// 16-bit PCM) into interleaved little-endian 16-bit PCM. Returns `None`
/// for codecs that need a stateful predictor (MACE, IMA4) rather than a
/// formula.
fn expand_compressed(header: &SampleHeader) -> Option<Vec<u8>> {
    match &header.format {
        b"ulaw" => Some(header.data.iter().flat_map(|&b| ulaw_to_linear(b).to_le_bytes()).collect()),
        b"alaw" => Some(header.data.iter().flat_map(|&b| alaw_to_linear(b).to_le_bytes()).collect()),
        b"sowt" => Some(header.data.clone()),
        b"twos" => Some(header.data.chunks_exact(2).flat_map(|frame| [frame[1], frame[0]]).collect()),
        _ => None,
    }
}

/// Render a sound's sample data to a WAV (RIFF/WAVE) byte stream.
///
/// Multi-channel sounds whose channel count doesn't match their declared
/// data length are folded down to mono by averaging channel pairs rather
/// than rejected outright, a heuristic kept from the system this format
/// comes from.
pub fn to_wav(sound: &Sound) -> Result<Vec<u8>, Error> {
    let header = sound.sample.as_ref().ok_or_else(|| Error::NotFound("snd resource has no sample header".into()))?;

    let (bits_per_sample, pcm) = if header.encoding == SampleEncoding::Compressed {
        match expand_compressed(header) {
            Some(pcm) => (16u16, pcm),
            None => {
                return Err(Error::UnsupportedFormat(format!(
                    "compressed (cmpSH) codec {:?} needs a codec this library doesn't vendor",
                    String::from_utf8_lossy(&header.format)
                )))
            }
        }
    } else {
        (header.sample_size, header.data.clone())
    };

    let bytes_per_sample = (bits_per_sample.max(8) / 8) as usize;
    let frame_size = bytes_per_sample * header.channels as usize;

    let (channels, pcm) = if frame_size != 0 && pcm.len() % frame_size != 0 && header.channels == 2 {
        (1u16, downgrade_stereo_to_mono(&pcm, bits_per_sample))
    } else {
        (header.channels as u16, pcm)
    };

    Ok(build_wav(channels, header.sample_rate.round() as u32, bits_per_sample, &pcm, header.loop_start, header.loop_end, header.base_frequency))
}

/// Write a complete WAV (RIFF/WAVE) byte stream around already-decoded PCM,
/// with an optional `smpl` loop-point chunk.
pub(crate) fn build_wav(channels: u16, sample_rate: u32, bits_per_sample: u16, pcm: &[u8], loop_start: u32, loop_end: u32, base_frequency: u8) -> Vec<u8> {
    let byte_rate = sample_rate * channels as u32 * bits_per_sample as u32 / 8;
    let block_align = channels * bits_per_sample / 8;
    let has_loop = loop_start != 0 || loop_end != 0;

    let mut out = Vec::new();
    out.extend_from_slice(b"RIFF");
    let riff_size_index = out.len();
    out.extend_from_slice(&[0u8; 4]);
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&bits_per_sample.to_le_bytes());

    out.extend_from_slice(b"data");
    out.extend_from_slice(&(pcm.len() as u32).to_le_bytes());
    out.extend_from_slice(pcm);

    if has_loop {
        out.extend_from_slice(b"smpl");
        let smpl_len = 36 + 24; // fixed fields + one loop record
        out.extend_from_slice(&(smpl_len as u32).to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes()); // manufacturer
        out.extend_from_slice(&0u32.to_le_bytes()); // product
        out.extend_from_slice(&(1_000_000_000u32 / sample_rate.max(1)).to_le_bytes()); // sample period (ns)
        out.extend_from_slice(&(base_frequency as u32).to_le_bytes()); // MIDI unity note
        out.extend_from_slice(&0u32.to_le_bytes()); // MIDI pitch fraction
        out.extend_from_slice(&0u32.to_le_bytes()); // SMPTE format
        out.extend_from_slice(&0u32.to_le_bytes()); // SMPTE offset
        out.extend_from_slice(&1u32.to_le_bytes()); // num sample loops
        out.extend_from_slice(&0u32.to_le_bytes()); // sampler data
        out.extend_from_slice(&0u32.to_le_bytes()); // loop id
        out.extend_from_slice(&0u32.to_le_bytes()); // loop type (forward)
        out.extend_from_slice(&loop_start.to_le_bytes());
        out.extend_from_slice(&loop_end.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes()); // fraction
        out.extend_from_slice(&0u32.to_le_bytes()); // play count (infinite)
    }

    let riff_size = (out.len() - 8) as u32;
    out[riff_size_index..riff_size_index + 4].copy_from_slice(&riff_size.to_le_bytes());

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_format1_stdsh(sample_bytes: &[u8]) -> Vec<u8> {
        let mut sample_header = Vec::new();
        sample_header.extend_from_slice(&0u32.to_be_bytes()); // samplePtr
        sample_header.extend_from_slice(&(sample_bytes.len() as u32).to_be_bytes());
        sample_header.extend_from_slice(&(22050u32 << 16).to_be_bytes()); // rate fixed-point
        sample_header.extend_from_slice(&0u32.to_be_bytes()); // loopStart
        sample_header.extend_from_slice(&0u32.to_be_bytes()); // loopEnd
        sample_header.push(0x00); // stdSH
        sample_header.push(60); // base frequency
        sample_header.extend_from_slice(sample_bytes);

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1u16.to_be_bytes()); // format 1
        bytes.extend_from_slice(&1u16.to_be_bytes()); // numDataFormats
        bytes.extend_from_slice(&5u16.to_be_bytes()); // dataFormatID sampledSynth
        bytes.extend_from_slice(&0u16.to_be_bytes()); // numModifiers

        bytes.extend_from_slice(&1u16.to_be_bytes()); // numCommands
        let sample_offset = bytes.len() as i32 + 8;
        bytes.extend_from_slice(&CMD_BUFFER.to_be_bytes());
        bytes.extend_from_slice(&0i16.to_be_bytes());
        bytes.extend_from_slice(&sample_offset.to_be_bytes());

        bytes.extend_from_slice(&sample_header);
        bytes
    }

    #[test]
    fn test_parse_format1_stdsh() {
        let bytes = build_format1_stdsh(&[1, 2, 3, 4]);
        let sound = parse(&bytes).unwrap();

        assert_eq!(sound.format, 1);
        assert_eq!(sound.commands.len(), 1);
        let sample = sound.sample.as_ref().unwrap();
        assert_eq!(sample.data, vec![1, 2, 3, 4]);
        assert_eq!(sample.base_frequency, 60);
        assert!((sample.sample_rate - 22050.0).abs() < 0.01);
    }

    #[test]
    fn test_to_wav_header_fields() {
        let bytes = build_format1_stdsh(&[10, 20, 30, 40]);
        let sound = parse(&bytes).unwrap();
        let wav = to_wav(&sound).unwrap();

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(&wav[36..40], b"data");
    }

    #[test]
    fn test_compressed_header_is_unsupported() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1u16.to_be_bytes());
        bytes.extend_from_slice(&1u16.to_be_bytes());
        bytes.extend_from_slice(&5u16.to_be_bytes());
        bytes.extend_from_slice(&0u16.to_be_bytes());
        bytes.extend_from_slice(&1u16.to_be_bytes());

        let sample_offset = bytes.len() as i32 + 8;
        bytes.extend_from_slice(&CMD_BUFFER.to_be_bytes());
        bytes.extend_from_slice(&0i16.to_be_bytes());
        bytes.extend_from_slice(&sample_offset.to_be_bytes());

        bytes.extend_from_slice(&1u32.to_be_bytes()); // channels
        bytes.extend_from_slice(&(22050u32 << 16).to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.push(0xFE); // cmpSH
        bytes.push(60);
        bytes.extend_from_slice(&10u32.to_be_bytes()); // numFrames
        bytes.extend_from_slice(&[0u8; 10]); // AIFF rate
        bytes.extend_from_slice(&0u32.to_be_bytes()); // marker
        bytes.extend_from_slice(b"MAC3");
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&0u16.to_be_bytes());
        bytes.extend_from_slice(&2u16.to_be_bytes()); // packetSize
        bytes.extend_from_slice(&0u16.to_be_bytes());
        bytes.extend_from_slice(&8u16.to_be_bytes()); // sampleSize
        bytes.extend_from_slice(&[0u8; 5]);

        let sound = parse(&bytes).unwrap();
        assert_eq!(sound.sample.as_ref().unwrap().encoding, SampleEncoding::Compressed);
        assert!(to_wav(&sound).is_err());
    }

    fn build_format1_cmpsh(format: &[u8; 4], sample_bytes: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1u16.to_be_bytes());
        bytes.extend_from_slice(&1u16.to_be_bytes());
        bytes.extend_from_slice(&5u16.to_be_bytes());
        bytes.extend_from_slice(&0u16.to_be_bytes());
        bytes.extend_from_slice(&1u16.to_be_bytes());

        let sample_offset = bytes.len() as i32 + 8;
        bytes.extend_from_slice(&CMD_BUFFER.to_be_bytes());
        bytes.extend_from_slice(&0i16.to_be_bytes());
        bytes.extend_from_slice(&sample_offset.to_be_bytes());

        bytes.extend_from_slice(&1u32.to_be_bytes()); // channels
        bytes.extend_from_slice(&(22050u32 << 16).to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.push(0xFE); // cmpSH
        bytes.push(60);
        bytes.extend_from_slice(&(sample_bytes.len() as u32).to_be_bytes()); // numFrames
        bytes.extend_from_slice(&[0u8; 10]); // AIFF rate
        bytes.extend_from_slice(&0u32.to_be_bytes()); // marker
        bytes.extend_from_slice(format);
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&0xFFFFu16.to_be_bytes()); // compression_id
        bytes.extend_from_slice(&1u16.to_be_bytes()); // packetSize
        bytes.extend_from_slice(&0u16.to_be_bytes());
        bytes.extend_from_slice(&8u16.to_be_bytes()); // sampleSize (irrelevant for these codecs)
        bytes.extend_from_slice(sample_bytes);

        bytes
    }

    #[test]
    fn test_ulaw_silence_byte_expands_to_zero() {
        let bytes = build_format1_cmpsh(b"ulaw", &[0xFF, 0xFF]);
        let sound = parse(&bytes).unwrap();
        let wav = to_wav(&sound).unwrap();

        let data = &wav[44..];
        assert_eq!(data, &[0, 0, 0, 0]);
    }

    #[test]
    fn test_alaw_expands_to_sixteen_bit_pcm() {
        let bytes = build_format1_cmpsh(b"alaw", &[0xD5]);
        let sound = parse(&bytes).unwrap();
        let wav = to_wav(&sound).unwrap();

        // one A-law byte becomes one 16-bit little-endian sample
        assert_eq!(wav.len(), 44 + 2);
        let sample = i16::from_le_bytes([wav[44], wav[45]]);
        assert_eq!(sample, 8);
    }
}
