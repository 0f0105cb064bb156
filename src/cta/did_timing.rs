//! DisplayID video timing data blocks carried inside a CTA section
//!
//! Only the Type VII descriptor is decoded in full. Type VIII and Type X
//! blocks are recognized and carried as raw payload.

use serde::Serialize;

use crate::bits::{bit_is_set, extract_bits};
use crate::cta::CtaCtx;

const BLOCK_NAME: &str = "DisplayID Type VII Video Timing Data Block";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimingStereo3d {
    Never,
    Always,
    UserDefined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimingAspectRatio {
    Ratio1_1,
    Ratio5_4,
    Ratio4_3,
    Ratio15_9,
    Ratio16_9,
    Ratio16_10,
    Ratio64_27,
    Ratio256_135,
    Undefined,
}

/// One DisplayID Type VII timing descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TypeViiTiming {
    pub pixel_clock_hz: u64,
    pub preferred: bool,
    pub stereo_3d: TimingStereo3d,
    pub interlaced: bool,
    pub aspect_ratio: TimingAspectRatio,
    pub horiz_active: u32,
    pub horiz_blank: u32,
    pub horiz_offset: u32,
    pub horiz_sync_width: u32,
    pub horiz_sync_polarity: bool,
    pub vert_active: u32,
    pub vert_blank: u32,
    pub vert_offset: u32,
    pub vert_sync_width: u32,
    pub vert_sync_polarity: bool,
}

/// Decode a 20-byte Type VII timing descriptor. All dimension fields are
/// stored off by one; the pixel clock is stored off by one in 10 kHz units.
fn parse_type_vii_descriptor(ctx: &mut CtaCtx, data: &[u8]) -> TypeViiTiming {
    let raw_pixel_clock =
        data[0] as u64 | (data[1] as u64) << 8 | (data[2] as u64) << 16;

    let stereo_3d = match extract_bits(data[3], 6, 5) {
        0 => TimingStereo3d::Never,
        1 => TimingStereo3d::Always,
        2 => TimingStereo3d::UserDefined,
        raw => {
            ctx.fail(format!("{BLOCK_NAME}: Reserved stereo 3D support 0x{raw:02x}."));
            TimingStereo3d::Never
        }
    };

    let aspect_ratio = match extract_bits(data[3], 3, 0) {
        0 => TimingAspectRatio::Ratio1_1,
        1 => TimingAspectRatio::Ratio5_4,
        2 => TimingAspectRatio::Ratio4_3,
        3 => TimingAspectRatio::Ratio15_9,
        4 => TimingAspectRatio::Ratio16_9,
        5 => TimingAspectRatio::Ratio16_10,
        6 => TimingAspectRatio::Ratio64_27,
        7 => TimingAspectRatio::Ratio256_135,
        8 => TimingAspectRatio::Undefined,
        raw => {
            ctx.fail(format!("{BLOCK_NAME}: Reserved aspect ratio 0x{raw:02x}."));
            TimingAspectRatio::Undefined
        }
    };

    TypeViiTiming {
        pixel_clock_hz: (raw_pixel_clock + 1) * 10_000,
        preferred: bit_is_set(data[3], 7),
        stereo_3d,
        interlaced: bit_is_set(data[3], 4),
        aspect_ratio,
        horiz_active: 1 + (data[4] as u32 | (data[5] as u32) << 8),
        horiz_blank: 1 + (data[6] as u32 | (data[7] as u32) << 8),
        horiz_offset: 1 + (data[8] as u32 | (extract_bits(data[9], 6, 0) as u32) << 8),
        horiz_sync_polarity: bit_is_set(data[9], 7),
        horiz_sync_width: 1 + (data[10] as u32 | (data[11] as u32) << 8),
        vert_active: 1 + (data[12] as u32 | (data[13] as u32) << 8),
        vert_blank: 1 + (data[14] as u32 | (data[15] as u32) << 8),
        vert_offset: 1 + (data[16] as u32 | (extract_bits(data[17], 6, 0) as u32) << 8),
        vert_sync_polarity: bit_is_set(data[17], 7),
        vert_sync_width: 1 + (data[18] as u32 | (data[19] as u32) << 8),
    }
}

pub(super) fn parse_did_type_vii_block(ctx: &mut CtaCtx, data: &[u8]) -> Option<TypeViiTiming> {
    if data.len() != 21 {
        ctx.fail(format!(
            "{BLOCK_NAME}: Empty Data Block with length {}.",
            data.len()
        ));
        return None;
    }

    // Descriptor size field 0 selects the 20-byte layout.
    if extract_bits(data[0], 6, 4) != 0 {
        ctx.fail(format!("{BLOCK_NAME}: T7_M shall be 000b."));
        return None;
    }

    let revision = extract_bits(data[0], 2, 0);
    if revision != 2 {
        ctx.fail(format!("{BLOCK_NAME}: Unexpected revision ({revision} != 2).",));
        return None;
    }

    if bit_is_set(data[0], 3) {
        ctx.fail(format!("{BLOCK_NAME}: DSC_PT shall be 0."));
    }
    if bit_is_set(data[0], 7) {
        ctx.fail(format!(
            "{BLOCK_NAME}: Block Revision and Other Data Bit 7 must be 0.",
        ));
    }

    Some(parse_type_vii_descriptor(ctx, &data[1..]))
}
