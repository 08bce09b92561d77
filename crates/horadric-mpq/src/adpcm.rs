//! IMA ADPCM decoding for compressed WAVE sectors
//!
//! A sector starts with a padding byte, the shift applied to every step,
//! and one initial 16-bit sample per channel. Each following byte is either
//! a 6-bit delta with a sign bit, or a control code (high bit set) that
//! repeats the last sample or moves the step index. Channels alternate
//! byte by byte in stereo data.

use crate::error::{MpqError, MpqResult};

const STEP_SIZES: [i32; 89] = [
    0x0007, 0x0008, 0x0009, 0x000A, 0x000B, 0x000C, 0x000D, 0x000E, 0x0010, 0x0011, 0x0013,
    0x0015, 0x0017, 0x0019, 0x001C, 0x001F, 0x0022, 0x0025, 0x0029, 0x002D, 0x0032, 0x0037,
    0x003C, 0x0042, 0x0049, 0x0050, 0x0058, 0x0061, 0x006B, 0x0076, 0x0082, 0x008F, 0x009D,
    0x00AD, 0x00BE, 0x00D1, 0x00E6, 0x00FD, 0x0117, 0x0133, 0x0151, 0x0173, 0x0198, 0x01C1,
    0x01EE, 0x0220, 0x0256, 0x0292, 0x02D4, 0x031C, 0x036C, 0x03C3, 0x0424, 0x048E, 0x0502,
    0x0583, 0x0610, 0x06AB, 0x0756, 0x0812, 0x08E0, 0x09C3, 0x0ABD, 0x0BD0, 0x0CFF, 0x0E4C,
    0x0FBA, 0x114C, 0x1307, 0x14EE, 0x1706, 0x1954, 0x1BDC, 0x1EA5, 0x21B6, 0x2515, 0x28CA,
    0x2CDF, 0x315B, 0x364B, 0x3BB9, 0x41B2, 0x4844, 0x4F7E, 0x5771, 0x602F, 0x69CE, 0x7462,
    0x7FFF,
];

const INDEX_ADJUST: [i32; 32] = [
    -1, 0, -1, 4, -1, 2, -1, 6, -1, 1, -1, 5, -1, 3, -1, 7, -1, 1, -1, 5, -1, 3, -1, 7, -1, 2,
    -1, 4, -1, 6, -1, 8,
];

const INITIAL_STEP_INDEX: i32 = 0x2C;
const MAX_STEP_INDEX: i32 = 0x58;

/// Decode an ADPCM sector with `channels` interleaved channels (1 or 2)
pub fn decompress(data: &[u8], channels: usize) -> MpqResult<Vec<u8>> {
    let header_len = 2 + 2 * channels;
    if channels == 0 || channels > 2 || data.len() < header_len {
        return Err(MpqError::CorruptData(format!(
            "ADPCM sector of {} bytes too short for {channels} channel(s)",
            data.len()
        )));
    }

    let shift = u32::from(data[1]);
    let mut step_index = [INITIAL_STEP_INDEX; 2];
    let mut predicted = [0i32; 2];
    let mut output = Vec::with_capacity(data.len() * 4);

    for (channel, sample) in data[2..header_len].chunks_exact(2).enumerate() {
        let sample = i16::from_le_bytes([sample[0], sample[1]]);
        predicted[channel] = i32::from(sample);
        output.extend_from_slice(&sample.to_le_bytes());
    }

    let stereo = channels == 2;
    let mut channel = channels - 1;

    for &value in &data[header_len..] {
        if stereo {
            channel = 1 - channel;
        }

        if value & 0x80 != 0 {
            match value & 0x7F {
                0 => {
                    if step_index[channel] != 0 {
                        step_index[channel] -= 1;
                    }
                    push_sample(&mut output, predicted[channel]);
                }
                1 => {
                    step_index[channel] = (step_index[channel] + 8).min(MAX_STEP_INDEX);
                    if stereo {
                        channel = 1 - channel;
                    }
                }
                2 => {}
                _ => {
                    step_index[channel] = (step_index[channel] - 8).max(0);
                    if stereo {
                        channel = 1 - channel;
                    }
                }
            }
            continue;
        }

        let step = STEP_SIZES[step_index[channel] as usize];
        let mut delta = step.checked_shr(shift).unwrap_or(0);
        for bit in 0..6 {
            if value & (1 << bit) != 0 {
                delta += step >> bit;
            }
        }

        predicted[channel] = if value & 0x40 != 0 {
            (predicted[channel] - delta).max(i32::from(i16::MIN))
        } else {
            (predicted[channel] + delta).min(i32::from(i16::MAX))
        };
        push_sample(&mut output, predicted[channel]);

        step_index[channel] =
            (step_index[channel] + INDEX_ADJUST[usize::from(value & 0x1F)]).clamp(0, MAX_STEP_INDEX);
    }

    Ok(output)
}

fn push_sample(output: &mut Vec<u8>, sample: i32) {
    let sample = sample.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;
    output.extend_from_slice(&sample.to_le_bytes());
}
