//! Audio Data Block and short audio descriptor decoding

use serde::Serialize;

use crate::bits::{bit_is_set, extract_bits};
use crate::constants::{CTA_MAX_AUDIO_BLOCK_ENTRIES, SAD_SIZE};
use crate::cta::CtaCtx;

/// Audio formats, codes 0xF disambiguated by the extension code byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AudioFormat {
    Lpcm,
    Ac3,
    Mpeg1,
    Mp3,
    Mpeg2,
    AacLc,
    Dts,
    Atrac,
    OneBitAudio,
    EnhancedAc3,
    DtsHd,
    Mat,
    Dst,
    WmaPro,
    Mpeg4HeAac,
    Mpeg4HeAacV2,
    Mpeg4AacLc,
    Dra,
    Mpeg4HeAacMpegSurround,
    Mpeg4AacLcMpegSurround,
    Mpegh3d,
    Ac4,
    Lpcm3d,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SadSampleRates {
    pub has_192_khz: bool,
    pub has_176_4_khz: bool,
    pub has_96_khz: bool,
    pub has_88_2_khz: bool,
    pub has_48_khz: bool,
    pub has_44_1_khz: bool,
    pub has_32_khz: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SadLpcm {
    pub has_sample_size_24_bits: bool,
    pub has_sample_size_20_bits: bool,
    pub has_sample_size_16_bits: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SadMpegAac {
    pub has_frame_length_1024: bool,
    pub has_frame_length_960: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mpegh3dLevel {
    Unspecified,
    Level1,
    Level2,
    Level3,
    Level4,
    Level5,
}

/// Format-specific payload of a short audio descriptor. Exactly one variant
/// applies per format; formats whose third byte is undocumented carry `None`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum SadDetails {
    Lpcm(SadLpcm),
    MaxBitrateKbs(u32),
    MpegAac(SadMpegAac),
    MpegAacLe {
        frame_lengths: SadMpegAac,
        supports_multichannel_sound: bool,
    },
    MpegSurround {
        frame_lengths: SadMpegAac,
        signaling: bool,
    },
    Mpegh3d {
        low_complexity_profile: bool,
        baseline_profile: bool,
        level: Mpegh3dLevel,
    },
    EnhancedAc3 {
        supports_joint_object_coding: bool,
        supports_joint_object_coding_acmod28: bool,
    },
    Mat {
        supports_object_audio_and_channel_based: bool,
        requires_hash_calculation: bool,
    },
    WmaPro {
        profile: u8,
    },
    None,
}

/// One short audio descriptor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sad {
    pub format: AudioFormat,
    /// Unset for formats whose descriptor does not carry a channel count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_channels: Option<u8>,
    pub sample_rates: SadSampleRates,
    pub details: SadDetails,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct AudioBlock {
    pub sads: Vec<Sad>,
}

pub(super) fn parse_sad_format(
    ctx: &mut CtaCtx,
    code: u8,
    code_ext: u8,
    prefix: &str,
) -> Option<AudioFormat> {
    use AudioFormat::*;

    Some(match code {
        0x0 => {
            ctx.fail_until(3, format!("{prefix}: Audio Format Code 0x00 is reserved."));
            return None;
        }
        0x1 => Lpcm,
        0x2 => Ac3,
        0x3 => Mpeg1,
        0x4 => Mp3,
        0x5 => Mpeg2,
        0x6 => AacLc,
        0x7 => Dts,
        0x8 => Atrac,
        0x9 => OneBitAudio,
        0xA => EnhancedAc3,
        0xB => DtsHd,
        0xC => Mat,
        0xD => Dst,
        0xE => WmaPro,
        0xF => match code_ext {
            0x04 => Mpeg4HeAac,
            0x05 => Mpeg4HeAacV2,
            0x06 => Mpeg4AacLc,
            0x07 => Dra,
            0x08 => Mpeg4HeAacMpegSurround,
            0x0A => Mpeg4AacLcMpegSurround,
            0x0B => Mpegh3d,
            0x0C => Ac4,
            0x0D => Lpcm3d,
            _ => {
                ctx.fail_until(
                    3,
                    format!("{prefix}: Unknown Audio Ext Format 0x{code_ext:02x}."),
                );
                return None;
            }
        },
        _ => {
            ctx.fail_until(3, format!("{prefix}: Unknown Audio Format 0x{code:02x}."));
            return None;
        }
    })
}

fn parse_sad(ctx: &mut CtaCtx, data: &[u8; SAD_SIZE]) -> Option<Sad> {
    use AudioFormat::*;

    let code = extract_bits(data[0], 6, 3);
    let code_ext = extract_bits(data[2], 7, 3);
    let format = parse_sad_format(ctx, code, code_ext, "Audio Data Block")?;

    let max_channels = match format {
        Lpcm3d => Some(
            (extract_bits(data[0], 2, 0)
                | extract_bits(data[0], 7, 7) << 3
                | extract_bits(data[1], 7, 7) << 4)
                + 1,
        ),
        Mpegh3d | Ac4 => None,
        _ => Some(extract_bits(data[0], 2, 0) + 1),
    };

    let mut sample_rates = SadSampleRates::default();
    match format {
        Ac4 => {
            sample_rates.has_192_khz = bit_is_set(data[1], 6);
            sample_rates.has_96_khz = bit_is_set(data[1], 4);
            sample_rates.has_48_khz = bit_is_set(data[1], 2);
            sample_rates.has_44_1_khz = bit_is_set(data[1], 1);
        }
        _ => {
            // The MPEG-4 AAC family has no 192/176.4 kHz bits.
            if !matches!(
                format,
                Mpeg4HeAac | Mpeg4HeAacV2 | Mpeg4AacLc | Mpeg4HeAacMpegSurround
                    | Mpeg4AacLcMpegSurround
            ) {
                sample_rates.has_192_khz = bit_is_set(data[1], 6);
                sample_rates.has_176_4_khz = bit_is_set(data[1], 5);
            }
            sample_rates.has_96_khz = bit_is_set(data[1], 4);
            sample_rates.has_88_2_khz = bit_is_set(data[1], 3);
            sample_rates.has_48_khz = bit_is_set(data[1], 2);
            sample_rates.has_44_1_khz = bit_is_set(data[1], 1);
            sample_rates.has_32_khz = bit_is_set(data[1], 0);
        }
    }

    let details = match format {
        Lpcm | Lpcm3d => SadDetails::Lpcm(SadLpcm {
            has_sample_size_24_bits: bit_is_set(data[2], 2),
            has_sample_size_20_bits: bit_is_set(data[2], 1),
            has_sample_size_16_bits: bit_is_set(data[2], 0),
        }),
        Ac3 | Mpeg1 | Mp3 | Mpeg2 | AacLc | Dts | Atrac => {
            SadDetails::MaxBitrateKbs(data[2] as u32 * 8)
        }
        Mpeg4HeAac | Mpeg4HeAacV2 => SadDetails::MpegAac(SadMpegAac {
            has_frame_length_1024: bit_is_set(data[2], 2),
            has_frame_length_960: bit_is_set(data[2], 1),
        }),
        Mpeg4AacLc => SadDetails::MpegAacLe {
            frame_lengths: SadMpegAac {
                has_frame_length_1024: bit_is_set(data[2], 2),
                has_frame_length_960: bit_is_set(data[2], 1),
            },
            supports_multichannel_sound: bit_is_set(data[2], 0),
        },
        Mpeg4HeAacMpegSurround | Mpeg4AacLcMpegSurround => SadDetails::MpegSurround {
            frame_lengths: SadMpegAac {
                has_frame_length_1024: bit_is_set(data[2], 2),
                has_frame_length_960: bit_is_set(data[2], 1),
            },
            signaling: bit_is_set(data[2], 0),
        },
        Mpegh3d => {
            let raw_level = extract_bits(data[0], 2, 0);
            let level = match raw_level {
                0 => Mpegh3dLevel::Unspecified,
                1 => Mpegh3dLevel::Level1,
                2 => Mpegh3dLevel::Level2,
                3 => Mpegh3dLevel::Level3,
                4 => Mpegh3dLevel::Level4,
                5 => Mpegh3dLevel::Level5,
                _ => {
                    ctx.fail_until(
                        3,
                        format!("Unknown MPEG-H 3D Audio Level 0x{raw_level:02x}."),
                    );
                    Mpegh3dLevel::Unspecified
                }
            };
            SadDetails::Mpegh3d {
                low_complexity_profile: bit_is_set(data[2], 0),
                baseline_profile: bit_is_set(data[2], 1),
                level,
            }
        }
        EnhancedAc3 => SadDetails::EnhancedAc3 {
            supports_joint_object_coding: bit_is_set(data[2], 0),
            supports_joint_object_coding_acmod28: bit_is_set(data[2], 1),
        },
        Mat => {
            let supports_object_audio_and_channel_based = bit_is_set(data[2], 0);
            SadDetails::Mat {
                supports_object_audio_and_channel_based,
                requires_hash_calculation: supports_object_audio_and_channel_based
                    && !bit_is_set(data[2], 0),
            }
        }
        WmaPro => SadDetails::WmaPro {
            profile: extract_bits(data[2], 2, 0),
        },
        // The third byte of these formats carries an undocumented
        // format-dependent value.
        OneBitAudio | DtsHd | Dst | Ac4 | Dra => SadDetails::None,
    };

    // Reserved-bit checks, with the exact bit sets per format family.
    match format {
        Lpcm | WmaPro => {
            if bit_is_set(data[0], 7) || bit_is_set(data[1], 7) || extract_bits(data[2], 7, 3) != 0
            {
                ctx.fail_until(3, "Bits F17, F27, F37:F33 must be 0.");
            }
        }
        Ac3 | Mpeg1 | Mp3 | Mpeg2 | AacLc | Dts | Atrac | OneBitAudio | EnhancedAc3 | DtsHd
        | Mat | Dst => {
            if bit_is_set(data[0], 7) || bit_is_set(data[1], 7) {
                ctx.fail_until(3, "Bits F17, F27 must be 0.");
            }
        }
        Mpeg4HeAac | Mpeg4HeAacV2 | Mpeg4AacLc | Mpeg4HeAacMpegSurround
        | Mpeg4AacLcMpegSurround => {
            if bit_is_set(data[0], 7) || extract_bits(data[2], 7, 5) != 0 {
                ctx.fail_until(3, "Bits F17, F27:F25 must be 0.");
            }
        }
        Mpegh3d => {
            if bit_is_set(data[0], 7) || bit_is_set(data[1], 7) || bit_is_set(data[2], 2) {
                ctx.fail_until(3, "Bits F17, F27, F32 must be 0.");
            }
        }
        Ac4 => {
            if data[0] & 0x87 != 0 || data[1] & 0xA9 != 0 {
                ctx.fail_until(3, "Bits F17, F12:F10, F27, F25, F23, F20 must be 0.");
            }
        }
        // DRA documentation missing
        Dra | Lpcm3d => {}
    }

    Some(Sad {
        format,
        max_channels,
        sample_rates,
        details,
    })
}

pub(super) fn parse_audio_block(ctx: &mut CtaCtx, data: &[u8]) -> AudioBlock {
    if data.len() % SAD_SIZE != 0 {
        ctx.fail(format!("Broken CTA-861 audio block length {}.", data.len()));
    }

    let mut sads = Vec::new();
    for chunk in data.chunks_exact(SAD_SIZE) {
        let bytes: &[u8; SAD_SIZE] = chunk.try_into().unwrap();
        if let Some(sad) = parse_sad(ctx, bytes) {
            debug_assert!(sads.len() < CTA_MAX_AUDIO_BLOCK_ENTRIES);
            sads.push(sad);
        }
    }
    AudioBlock { sads }
}
