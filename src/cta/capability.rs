//! Video Capability, Colorimetry and YCbCr 4:2:0 Capability Map decoding

use serde::Serialize;

use crate::bits::{bit_is_set, extract_bits};
use crate::constants::CTA_MAX_YCBCR420_CAP_MAP_ENTRIES;
use crate::cta::CtaCtx;

/// Over- and underscan behavior advertised for a format category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OverUnderscan {
    Unknown,
    AlwaysOverscan,
    AlwaysUnderscan,
    Both,
}

impl OverUnderscan {
    fn from_bits(raw: u8) -> Self {
        match raw {
            0 => Self::Unknown,
            1 => Self::AlwaysOverscan,
            2 => Self::AlwaysUnderscan,
            3 => Self::Both,
            _ => unreachable!(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VideoCapBlock {
    pub selectable_ycc_quantization_range: bool,
    pub selectable_rgb_quantization_range: bool,
    pub pt_over_underscan: OverUnderscan,
    pub it_over_underscan: OverUnderscan,
    pub ce_over_underscan: OverUnderscan,
}

pub(super) fn parse_video_cap_block(ctx: &mut CtaCtx, data: &[u8]) -> Option<VideoCapBlock> {
    if data.is_empty() {
        ctx.fail(format!(
            "Video Capability Data Block: Empty Data Block with length {}.",
            data.len()
        ));
        return None;
    }

    let video_cap = VideoCapBlock {
        selectable_ycc_quantization_range: bit_is_set(data[0], 7),
        selectable_rgb_quantization_range: bit_is_set(data[0], 6),
        pt_over_underscan: OverUnderscan::from_bits(extract_bits(data[0], 5, 4)),
        it_over_underscan: OverUnderscan::from_bits(extract_bits(data[0], 3, 2)),
        ce_over_underscan: OverUnderscan::from_bits(extract_bits(data[0], 1, 0)),
    };

    if !video_cap.selectable_rgb_quantization_range && ctx.revision >= 3 {
        ctx.fail(
            "Video Capability Data Block: Set Selectable RGB Quantization to avoid interop issues.",
        );
    }

    // Cross-check against bit 7 of the extension header flags byte.
    match video_cap.it_over_underscan {
        OverUnderscan::AlwaysOverscan if ctx.it_underscan => {
            ctx.fail(
                "Video Capability Data Block: IT video formats are always overscanned, but bit 7 of Byte 3 of the CTA-861 Extension header is set to underscanned.",
            );
        }
        OverUnderscan::AlwaysUnderscan if !ctx.it_underscan => {
            ctx.fail(
                "Video Capability Data Block: IT video formats are always underscanned, but bit 7 of Byte 3 of the CTA-861 Extension header is set to overscanned.",
            );
        }
        _ => {}
    }

    Some(video_cap)
}

/// Supported colorimetry standards and metadata profiles.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColorimetryBlock {
    pub bt2020_rgb: bool,
    pub bt2020_ycc: bool,
    pub bt2020_cycc: bool,
    pub oprgb: bool,
    pub opycc_601: bool,
    pub sycc_601: bool,
    pub xvycc_709: bool,
    pub xvycc_601: bool,
    pub st2113_rgb: bool,
    pub ictcp: bool,
}

pub(super) fn parse_colorimetry_block(ctx: &mut CtaCtx, data: &[u8]) -> Option<ColorimetryBlock> {
    if data.len() < 2 {
        ctx.fail(format!(
            "Colorimetry Data Block: Empty Data Block with length {}.",
            data.len()
        ));
        return None;
    }

    let colorimetry = ColorimetryBlock {
        bt2020_rgb: bit_is_set(data[0], 7),
        bt2020_ycc: bit_is_set(data[0], 6),
        bt2020_cycc: bit_is_set(data[0], 5),
        oprgb: bit_is_set(data[0], 4),
        opycc_601: bit_is_set(data[0], 3),
        sycc_601: bit_is_set(data[0], 2),
        xvycc_709: bit_is_set(data[0], 1),
        xvycc_601: bit_is_set(data[0], 0),
        st2113_rgb: bit_is_set(data[1], 7),
        ictcp: bit_is_set(data[1], 6),
    };

    if extract_bits(data[1], 5, 0) != 0 {
        ctx.fail_until(3, "Colorimetry Data Block: Reserved bits MD0-MD3 must be 0.");
    }

    Some(colorimetry)
}

/// Bitmap of SVD indices the sink can drive in YCbCr 4:2:0 in addition to
/// the formats listed in the SVD itself. An empty payload means all SVDs.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Ycbcr420CapMapBlock {
    pub all: bool,
    pub svd_bitmap: Vec<u8>,
}

impl Ycbcr420CapMapBlock {
    /// Whether the SVD at the given section-wide 0-based index is covered.
    pub fn supported(&self, svd_index: usize) -> bool {
        if self.all {
            return true;
        }
        match self.svd_bitmap.get(svd_index / 8) {
            Some(&byte) => byte & (1 << (svd_index % 8)) != 0,
            None => false,
        }
    }
}

pub(super) fn parse_ycbcr420_cap_map(_ctx: &mut CtaCtx, data: &[u8]) -> Ycbcr420CapMapBlock {
    debug_assert!(data.len() <= CTA_MAX_YCBCR420_CAP_MAP_ENTRIES);
    Ycbcr420CapMapBlock {
        all: data.is_empty(),
        svd_bitmap: data.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::FailureLog;

    fn ctx_with<'a>(log: &'a mut FailureLog, revision: u8, it_underscan: bool) -> CtaCtx<'a> {
        CtaCtx {
            revision,
            it_underscan,
            log,
        }
    }

    #[test]
    fn video_cap_underscan_cross_check() {
        let mut log = FailureLog::new();
        let mut ctx = ctx_with(&mut log, 3, false);
        // IT bits = 10 (always underscan) while the header says overscan.
        let block = parse_video_cap_block(&mut ctx, &[0x48]).unwrap();
        assert_eq!(block.it_over_underscan, OverUnderscan::AlwaysUnderscan);
        assert_eq!(
            log.messages(),
            [
                "Video Capability Data Block: IT video formats are always underscanned, but bit 7 of Byte 3 of the CTA-861 Extension header is set to overscanned."
            ]
        );
    }

    #[test]
    fn video_cap_rgb_quantization_advice() {
        let mut log = FailureLog::new();
        let mut ctx = ctx_with(&mut log, 3, true);
        let block = parse_video_cap_block(&mut ctx, &[0x08]).unwrap();
        assert!(!block.selectable_rgb_quantization_range);
        assert_eq!(
            log.messages(),
            ["Video Capability Data Block: Set Selectable RGB Quantization to avoid interop issues."]
        );
    }

    #[test]
    fn colorimetry_reserved_bits() {
        let mut log = FailureLog::new();
        let mut ctx = ctx_with(&mut log, 3, false);
        let block = parse_colorimetry_block(&mut ctx, &[0xE0, 0xC1]).unwrap();
        assert!(block.bt2020_rgb && block.bt2020_ycc && block.bt2020_cycc);
        assert!(block.st2113_rgb && block.ictcp);
        assert_eq!(
            log.messages(),
            ["Colorimetry Data Block: Reserved bits MD0-MD3 must be 0."]
        );
    }

    #[test]
    fn cap_map_empty_means_all() {
        let mut log = FailureLog::new();
        let mut ctx = ctx_with(&mut log, 3, false);
        let map = parse_ycbcr420_cap_map(&mut ctx, &[]);
        assert!(map.all);
        assert!(map.supported(0));
        assert!(map.supported(500));
    }

    #[test]
    fn cap_map_bitmap_lookup() {
        let mut log = FailureLog::new();
        let mut ctx = ctx_with(&mut log, 3, false);
        let map = parse_ycbcr420_cap_map(&mut ctx, &[0b0000_0101, 0b1000_0000]);
        assert!(!map.all);
        assert!(map.supported(0));
        assert!(!map.supported(1));
        assert!(map.supported(2));
        assert!(map.supported(15));
        assert!(!map.supported(16));
    }
}
