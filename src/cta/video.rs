//! Video Data Block, YCbCr 4:2:0 Video Data Block, Video Format Preference
//! and Native Video Resolution decoding

use serde::Serialize;

use crate::bits::extract_bits;
use crate::constants::{CTA_MAX_VIDEO_BLOCK_ENTRIES, CTA_MAX_VIDEO_FORMAT_PREF_ENTRIES};
use crate::cta::CtaCtx;

/// One short video descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Svd {
    pub vic: u8,
    pub native: bool,
    /// 0-based position inside the containing data block. The YCbCr 4:2:0
    /// capability map refers to SVDs by this index, accumulated across all
    /// Video Data Blocks of the section.
    pub original_index: u8,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct VideoBlock {
    pub svds: Vec<Svd>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Ycbcr420VideoBlock {
    pub svds: Vec<Svd>,
}

pub(super) fn parse_svd(
    ctx: &mut CtaCtx,
    raw: u8,
    original_index: u8,
    prefix: &str,
) -> Option<Svd> {
    if raw == 0 || raw == 128 || raw >= 254 {
        // Reserved
        ctx.fail_until(3, format!("{prefix}: Unknown VIC {raw}."));
        None
    } else if raw <= 127 || raw >= 193 {
        Some(Svd {
            vic: raw,
            native: false,
            original_index,
        })
    } else {
        Some(Svd {
            vic: extract_bits(raw, 6, 0),
            native: true,
            original_index,
        })
    }
}

fn parse_svd_list(ctx: &mut CtaCtx, data: &[u8], prefix: &str) -> Vec<Svd> {
    if data.is_empty() {
        ctx.fail(format!("{prefix}: Empty Data Block"));
    }

    let mut svds = Vec::new();
    for (i, &raw) in data.iter().enumerate() {
        if let Some(svd) = parse_svd(ctx, raw, i as u8, prefix) {
            debug_assert!(svds.len() < CTA_MAX_VIDEO_BLOCK_ENTRIES);
            svds.push(svd);
        }
    }
    svds
}

pub(super) fn parse_video_block(ctx: &mut CtaCtx, data: &[u8]) -> VideoBlock {
    VideoBlock {
        svds: parse_svd_list(ctx, data, "Video Data Block"),
    }
}

pub(super) fn parse_ycbcr420_block(ctx: &mut CtaCtx, data: &[u8]) -> Ycbcr420VideoBlock {
    Ycbcr420VideoBlock {
        svds: parse_svd_list(ctx, data, "YCbCr 4:2:0 Video Data Block"),
    }
}

/// One short video reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Svr {
    /// Reference to a VIC.
    Vic(u8),
    /// Reference to the n-th detailed timing definition (0-based).
    DtdIndex(u8),
    /// Reference to the n-th Type VII or Type X timing block (0-based).
    T7T10Index(u8),
    /// Reference to the first code of the first Type VIII timing block.
    FirstT8Vtdb,
}

fn parse_svr(ctx: &mut CtaCtx, code: u8, prefix: &str) -> Option<Svr> {
    if code == 0 || code == 128 || (161..=192).contains(&code) || code == 255 {
        ctx.fail(format!(
            "{prefix}: using reserved Short Video Reference value {code}."
        ));
        return None;
    }

    Some(match code {
        1..=127 | 193..=253 => Svr::Vic(code),
        129..=144 => Svr::DtdIndex(code - 129),
        145..=160 => Svr::T7T10Index(code - 145),
        254 => Svr::FirstT8Vtdb,
        // All other ranges are rejected above.
        _ => unreachable!(),
    })
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct VideoFormatPrefBlock {
    /// Video formats in order of preference, most preferred first.
    pub svrs: Vec<Svr>,
}

pub(super) fn parse_video_format_pref_block(ctx: &mut CtaCtx, data: &[u8]) -> VideoFormatPrefBlock {
    let mut svrs = Vec::new();
    for &code in data {
        if let Some(svr) = parse_svr(ctx, code, "Video Format Preference Data Block") {
            debug_assert!(svrs.len() < CTA_MAX_VIDEO_FORMAT_PREF_ENTRIES);
            svrs.push(svr);
        }
    }
    VideoFormatPrefBlock { svrs }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NativeVideoResolutionBlock {
    pub resolution: Svr,
    /// Second payload byte, carried raw; its image-size semantics are not
    /// decoded further.
    pub image_size_raw: Option<u8>,
}

pub(super) fn parse_native_video_resolution_block(
    ctx: &mut CtaCtx,
    data: &[u8],
) -> Option<NativeVideoResolutionBlock> {
    if data.is_empty() {
        ctx.fail(format!(
            "Native Video Resolution Data Block: Empty Data Block with length {}.",
            data.len()
        ));
        return None;
    }

    let resolution = parse_svr(ctx, data[0], "Native Video Resolution Data Block")?;
    Some(NativeVideoResolutionBlock {
        resolution,
        image_size_raw: data.get(1).copied(),
    })
}
