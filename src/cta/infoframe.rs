//! InfoFrame Data Block decoding

use serde::Serialize;

use crate::bits::extract_bits;
use crate::constants::CTA_MAX_INFOFRAME_ENTRIES;
use crate::cta::CtaCtx;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InfoframeType {
    AuxiliaryVideoInformation,
    SourceProductDescription,
    Audio,
    MpegSource,
    NtscVbi,
    DynamicRangeAndMastering,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct InfoframeBlock {
    pub num_simultaneous_vsifs: u8,
    pub infoframes: Vec<InfoframeType>,
}

fn parse_infoframe(ctx: &mut CtaCtx, type_code: u8) -> Option<InfoframeType> {
    if (8..=0x1F).contains(&type_code) {
        ctx.fail(format!(
            "InfoFrame Data Block: Type code {type_code} is reserved.",
        ));
        return None;
    }
    if type_code >= 0x20 {
        ctx.fail(format!(
            "InfoFrame Data Block: Type code {type_code} is forbidden.",
        ));
        return None;
    }

    match type_code {
        // No known vendor-specific InfoFrames, yet.
        1 => None,
        0x02 => Some(InfoframeType::AuxiliaryVideoInformation),
        0x03 => Some(InfoframeType::SourceProductDescription),
        0x04 => Some(InfoframeType::Audio),
        0x05 => Some(InfoframeType::MpegSource),
        0x06 => Some(InfoframeType::NtscVbi),
        0x07 => Some(InfoframeType::DynamicRangeAndMastering),
        _ => unreachable!(),
    }
}

pub(super) fn parse_infoframe_block(ctx: &mut CtaCtx, data: &[u8]) -> Option<InfoframeBlock> {
    if data.len() < 2 {
        ctx.fail(format!(
            "InfoFrame Data Block: Empty Data Block with length {}.",
            data.len()
        ));
        return None;
    }

    let mut block = InfoframeBlock {
        num_simultaneous_vsifs: data[1] + 1,
        infoframes: Vec::new(),
    };

    let mut index = extract_bits(data[0], 7, 5) as usize + 2;
    if extract_bits(data[0], 4, 0) != 0 {
        ctx.fail(
            "InfoFrame Data Block: InfoFrame Processing Descriptor Header bits F14-F10 shall be 0.",
        );
    }

    loop {
        if index == data.len() {
            break;
        }
        if index > data.len() {
            ctx.fail("InfoFrame Data Block: Payload length exceeds block size.");
            return None;
        }

        let mut length = extract_bits(data[index], 7, 5) as usize;
        let type_code = extract_bits(data[index], 4, 0);

        if type_code == 0 {
            ctx.fail(
                "InfoFrame Data Block: Short InfoFrame Descriptor with type 0 is forbidden.",
            );
            return None;
        } else if type_code == 1 {
            // Vendor-specific descriptors carry a 3-byte OUI.
            length += 4;
        } else {
            length += 1;
        }

        if index + length > data.len() {
            ctx.fail("InfoFrame Data Block: Payload length exceeds block size.");
            return None;
        }

        if let Some(infoframe) = parse_infoframe(ctx, type_code) {
            debug_assert!(block.infoframes.len() < CTA_MAX_INFOFRAME_ENTRIES);
            block.infoframes.push(infoframe);
        }

        index += length;
    }

    Some(block)
}
