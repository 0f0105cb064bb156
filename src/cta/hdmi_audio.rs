//! HDMI Audio Data Block decoding
//!
//! Carries multi-stream audio capabilities plus a chain of 4-byte 3D Audio
//! Descriptors. When any 3D descriptors are present, one trailing 3D
//! Speaker Allocation Descriptor closes the chain.

use serde::Serialize;

use crate::bits::{bit_is_set, extract_bits};
use crate::constants::{CTA_MAX_HDMI_AUDIO_ENTRIES, HDMI_AUDIO_3D_DESCRIPTOR_SIZE};
use crate::cta::audio::{parse_sad_format, AudioFormat, Sad, SadDetails, SadLpcm, SadSampleRates};
use crate::cta::speaker::{parse_speaker_alloc, SpeakerAllocation};
use crate::cta::CtaCtx;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HdmiAudioMultiStream {
    pub max_streams: u8,
    pub supports_non_mixed: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HdmiAudio3dChannels {
    #[default]
    Unknown,
    Ch10_2,
    Ch22_2,
    Ch30_2,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HdmiAudio3d {
    pub sads: Vec<Sad>,
    pub channels: HdmiAudio3dChannels,
    pub speakers: SpeakerAllocation,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct HdmiAudioBlock {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multi_stream: Option<HdmiAudioMultiStream>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_3d: Option<HdmiAudio3d>,
}

/// Same data as a Short Audio Descriptor, packed differently.
fn parse_3d_descriptor(ctx: &mut CtaCtx, data: &[u8]) -> Option<Sad> {
    debug_assert!(data.len() >= HDMI_AUDIO_3D_DESCRIPTOR_SIZE);

    let code = extract_bits(data[0], 3, 0);
    let format = parse_sad_format(ctx, code, 0, "HDMI Audio Data Block")?;

    if format != AudioFormat::Lpcm && format != AudioFormat::OneBitAudio {
        ctx.fail(format!(
            "HDMI Audio Data Block: Unsupported 3D Audio Format 0x{code:04x}.",
        ));
        return None;
    }

    let details = if format == AudioFormat::Lpcm {
        SadDetails::Lpcm(SadLpcm {
            has_sample_size_24_bits: bit_is_set(data[3], 2),
            has_sample_size_20_bits: bit_is_set(data[3], 1),
            has_sample_size_16_bits: bit_is_set(data[3], 0),
        })
    } else {
        SadDetails::None
    };

    Some(Sad {
        format,
        max_channels: Some(extract_bits(data[1], 4, 0) + 1),
        sample_rates: SadSampleRates {
            has_192_khz: bit_is_set(data[2], 6),
            has_176_4_khz: bit_is_set(data[2], 5),
            has_96_khz: bit_is_set(data[2], 4),
            has_88_2_khz: bit_is_set(data[2], 3),
            has_48_khz: bit_is_set(data[2], 2),
            has_44_1_khz: bit_is_set(data[2], 1),
            has_32_khz: bit_is_set(data[2], 0),
        },
        details,
    })
}

pub(super) fn parse_hdmi_audio_block(ctx: &mut CtaCtx, data: &[u8]) -> Option<HdmiAudioBlock> {
    if data.is_empty() {
        ctx.fail("HDMI Audio Data Block: Empty Data Block with length 0.");
        return None;
    }

    let mut block = HdmiAudioBlock::default();

    let multi_stream = extract_bits(data[0], 1, 0);
    let ms_non_mixed = bit_is_set(data[0], 2);

    if multi_stream > 0 {
        block.multi_stream = Some(HdmiAudioMultiStream {
            max_streams: multi_stream + 1,
            supports_non_mixed: ms_non_mixed,
        });
    } else if ms_non_mixed {
        ctx.fail(
            "HDMI Audio Data Block: MS NonMixed support indicated but Max Stream Count == 0.",
        );
    }

    if data.len() < 2 {
        return Some(block);
    }

    let num_3d_audio_descs = extract_bits(data[1], 2, 0) as usize;
    if num_3d_audio_descs == 0 {
        return Some(block);
    }

    // The last descriptor of the chain is a 3D Speaker Allocation Descriptor.
    let num_descs = num_3d_audio_descs + 1;

    let mut data = &data[2..];

    if num_descs > data.len() / HDMI_AUDIO_3D_DESCRIPTOR_SIZE {
        ctx.fail("HDMI Audio Data Block: More descriptors indicated than block size allows.");
        return Some(block);
    }

    let mut sads = Vec::new();
    for _ in 0..num_descs - 1 {
        if let Some(sad) = parse_3d_descriptor(ctx, data) {
            debug_assert!(sads.len() < CTA_MAX_HDMI_AUDIO_ENTRIES);
            sads.push(sad);
        }
        data = &data[HDMI_AUDIO_3D_DESCRIPTOR_SIZE..];
    }

    let channels = match extract_bits(data[3], 7, 4) {
        1 => HdmiAudio3dChannels::Ch10_2,
        2 => HdmiAudio3dChannels::Ch22_2,
        3 => HdmiAudio3dChannels::Ch30_2,
        _ => HdmiAudio3dChannels::Unknown,
    };

    let speakers = parse_speaker_alloc(ctx, data, "Room Configuration Data Block");

    block.audio_3d = Some(HdmiAudio3d {
        sads,
        channels,
        speakers,
    });

    Some(block)
}
