//! Dolby Vision vendor-specific video data block decoding, OUI 00-D0-46
//!
//! Three incompatible layouts exist, selected by the version field in the
//! top bits of the first payload byte. Chromaticities use different
//! quantization schemes per version, including the packed "unique
//! primaries" encoding of the short version 1 form.

use serde::Serialize;

use crate::bits::{bit_is_set, extract_bits};
use crate::cta::CtaCtx;

const BLOCK_NAME: &str = "Vendor-Specific Video Data Block (Dolby), OUI 00-D0-46";

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct DolbyVideoV0 {
    pub global_dimming: bool,
    pub supports_2160p60: bool,
    pub yuv422_12bit: bool,
    pub dynamic_metadata_version_major: u8,
    pub dynamic_metadata_version_minor: u8,
    pub target_pq_12b_level_min: u16,
    pub target_pq_12b_level_max: u16,
    pub red_x: f64,
    pub red_y: f64,
    pub green_x: f64,
    pub green_y: f64,
    pub blue_x: f64,
    pub blue_y: f64,
    pub white_x: f64,
    pub white_y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DolbyColorimetry {
    Bt709,
    P3D65,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DolbyVideoV1 {
    pub dynamic_metadata_version: u8,
    pub supports_2160p60: bool,
    pub yuv422_12bit: bool,
    pub global_dimming: bool,
    pub colorimetry: DolbyColorimetry,
    pub mode_low_latency: bool,
    pub target_luminance_min: f64,
    pub target_luminance_max: f64,
    pub unique_primaries: bool,
    pub red_x: f64,
    pub red_y: f64,
    pub green_x: f64,
    pub green_y: f64,
    pub blue_x: f64,
    pub blue_y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DolbyYuv444Depth {
    None,
    TenBits,
    TwelveBits,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DolbyVideoV2 {
    pub dynamic_metadata_version: u8,
    pub backlight_control: bool,
    pub yuv422_12bit: bool,
    pub global_dimming: bool,
    pub backlight_luminance_min: u16,
    pub mode_low_latency_hdmi: bool,
    pub mode_standard: bool,
    pub yuv444: DolbyYuv444Depth,
    pub target_pq_12b_level_min: u16,
    pub target_pq_12b_level_max: u16,
    pub red_x: f64,
    pub red_y: f64,
    pub green_x: f64,
    pub green_y: f64,
    pub blue_x: f64,
    pub blue_y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DolbyVideoBlock {
    V0(DolbyVideoV0),
    V1(DolbyVideoV1),
    V2(DolbyVideoV2),
}

/// Payload starts after the OUI bytes.
pub(super) fn parse_dolby_video_block(ctx: &mut CtaCtx, data: &[u8]) -> Option<DolbyVideoBlock> {
    if data.is_empty() {
        ctx.fail(format!(
            "{BLOCK_NAME}: Empty Data Block with length {}.",
            data.len()
        ));
        return None;
    }

    match extract_bits(data[0], 7, 5) {
        0 => parse_v0(ctx, data).map(DolbyVideoBlock::V0),
        1 => parse_v1(ctx, data).map(DolbyVideoBlock::V1),
        2 => parse_v2(ctx, data).map(DolbyVideoBlock::V2),
        version => {
            ctx.fail(format!("{BLOCK_NAME}: Unknown version {version}."));
            None
        }
    }
}

fn chromaticity_12bit(high: u8, low_nibble: u8) -> f64 {
    ((high as u16) << 4 | low_nibble as u16) as f64 / 4096.0
}

fn parse_v0(ctx: &mut CtaCtx, data: &[u8]) -> Option<DolbyVideoV0> {
    if data.len() < 17 {
        ctx.fail(format!(
            "{BLOCK_NAME}: Expected length of 17 for Version 0, but got length {}.",
            data.len()
        ));
        return None;
    }

    Some(DolbyVideoV0 {
        global_dimming: bit_is_set(data[0], 2),
        supports_2160p60: bit_is_set(data[0], 1),
        yuv422_12bit: bit_is_set(data[0], 0),
        dynamic_metadata_version_major: extract_bits(data[16], 7, 4),
        dynamic_metadata_version_minor: extract_bits(data[16], 3, 0),
        target_pq_12b_level_min: (data[14] as u16) << 4 | extract_bits(data[13], 7, 4) as u16,
        target_pq_12b_level_max: (data[15] as u16) << 4 | extract_bits(data[13], 3, 0) as u16,
        red_x: chromaticity_12bit(data[2], extract_bits(data[1], 7, 4)),
        red_y: chromaticity_12bit(data[3], extract_bits(data[1], 3, 0)),
        green_x: chromaticity_12bit(data[5], extract_bits(data[4], 7, 4)),
        green_y: chromaticity_12bit(data[6], extract_bits(data[4], 3, 0)),
        blue_x: chromaticity_12bit(data[8], extract_bits(data[7], 7, 4)),
        blue_y: chromaticity_12bit(data[9], extract_bits(data[7], 3, 0)),
        white_x: chromaticity_12bit(data[11], extract_bits(data[10], 7, 4)),
        white_y: chromaticity_12bit(data[12], extract_bits(data[10], 3, 0)),
    })
}

fn parse_v1(ctx: &mut CtaCtx, data: &[u8]) -> Option<DolbyVideoV1> {
    if data.len() < 7 {
        ctx.fail(format!(
            "{BLOCK_NAME}: Expected length of at least 7 for Version 1, but got length {}.",
            data.len()
        ));
        return None;
    }

    let lm = extract_bits(data[2], 7, 1) as f64 / 127.0;
    let target_luminance_min = lm * lm;
    let target_luminance_max = extract_bits(data[1], 7, 1) as f64 * 50.0 + 100.0;

    let mut v1 = DolbyVideoV1 {
        dynamic_metadata_version: extract_bits(data[0], 4, 2) + 2,
        supports_2160p60: bit_is_set(data[0], 1),
        yuv422_12bit: bit_is_set(data[0], 0),
        global_dimming: bit_is_set(data[1], 0),
        colorimetry: if bit_is_set(data[2], 0) {
            DolbyColorimetry::P3D65
        } else {
            DolbyColorimetry::Bt709
        },
        mode_low_latency: bit_is_set(data[3], 0),
        target_luminance_min,
        target_luminance_max,
        unique_primaries: false,
        red_x: 0.0,
        red_y: 0.0,
        green_x: 0.0,
        green_y: 0.0,
        blue_x: 0.0,
        blue_y: 0.0,
    };

    if data.len() >= 10 {
        v1.red_x = data[4] as f64 / 256.0;
        v1.red_y = data[5] as f64 / 256.0;
        v1.green_x = data[6] as f64 / 256.0;
        v1.green_y = data[7] as f64 / 256.0;
        v1.blue_x = data[8] as f64 / 256.0;
        v1.blue_y = data[9] as f64 / 256.0;
    } else {
        // Short form: primaries quantized to per-channel ranges.
        v1.unique_primaries = true;

        let xmin = 0.625;
        let xstep = (0.74609375 - xmin) / 31.0;
        v1.red_x = xmin + xstep * (data[6] >> 3) as f64;

        let ymin = 0.25;
        let ystep = (0.37109375 - ymin) / 31.0;
        let steps = (extract_bits(data[6], 2, 0) << 2)
            | (extract_bits(data[5], 0, 0) << 1)
            | extract_bits(data[4], 0, 0);
        v1.red_y = ymin + ystep * steps as f64;

        let xstep = 0.49609375 / 127.0;
        v1.green_x = xstep * extract_bits(data[4], 7, 1) as f64;

        let ymin = 0.5;
        let ystep = (0.99609375 - ymin) / 127.0;
        v1.green_y = ymin + ystep * extract_bits(data[5], 7, 1) as f64;

        let xmin = 0.125;
        let xstep = (0.15234375 - xmin) / 7.0;
        v1.blue_x = xmin + xstep * extract_bits(data[3], 7, 5) as f64;

        let ymin = 0.03125;
        let ystep = (0.05859375 - ymin) / 7.0;
        v1.blue_y = ymin + ystep * extract_bits(data[3], 4, 2) as f64;
    }

    Some(v1)
}

fn parse_v2(ctx: &mut CtaCtx, data: &[u8]) -> Option<DolbyVideoV2> {
    if data.len() < 7 {
        ctx.fail(format!(
            "{BLOCK_NAME}: Expected length of at least 7 for Version 2, but got length {}.",
            data.len()
        ));
        return None;
    }

    let (mode_standard, mode_low_latency_hdmi) = match extract_bits(data[2], 1, 0) {
        0 => (false, false),
        1 => (false, true),
        2 => (true, false),
        _ => (true, true),
    };

    let yuv444_raw = extract_bits(data[3], 0, 0) << 1 | extract_bits(data[4], 0, 0);
    let yuv444 = match yuv444_raw {
        0 => DolbyYuv444Depth::None,
        1 => DolbyYuv444Depth::TenBits,
        2 => DolbyYuv444Depth::TwelveBits,
        _ => {
            ctx.fail(format!(
                "{BLOCK_NAME}: Reserved YUV444 mode 0x{yuv444_raw:02x}.",
            ));
            return None;
        }
    };

    Some(DolbyVideoV2 {
        dynamic_metadata_version: extract_bits(data[0], 4, 2) + 2,
        backlight_control: bit_is_set(data[0], 1),
        yuv422_12bit: bit_is_set(data[0], 0),
        global_dimming: bit_is_set(data[1], 2),
        backlight_luminance_min: 25 + extract_bits(data[1], 1, 0) as u16 * 25,
        mode_low_latency_hdmi,
        mode_standard,
        yuv444,
        target_pq_12b_level_min: 20 * extract_bits(data[1], 7, 3) as u16,
        target_pq_12b_level_max: 2055 + 65 * extract_bits(data[2], 7, 3) as u16,
        red_x: 0.625 + extract_bits(data[5], 7, 3) as f64 / 256.0,
        red_y: 0.25 + extract_bits(data[6], 7, 3) as f64 / 256.0,
        green_x: extract_bits(data[3], 7, 1) as f64 / 256.0,
        green_y: 0.5 + extract_bits(data[4], 7, 1) as f64 / 256.0,
        blue_x: 0.125 + extract_bits(data[5], 2, 0) as f64 / 256.0,
        blue_y: 0.03125 + extract_bits(data[6], 2, 0) as f64 / 256.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::FailureLog;

    fn ctx(log: &mut FailureLog) -> CtaCtx<'_> {
        CtaCtx {
            revision: 3,
            it_underscan: false,
            log,
        }
    }

    #[test]
    fn v0_full_layout() {
        let mut log = FailureLog::new();
        let mut ctx = ctx(&mut log);
        let mut data = [0u8; 17];
        data[0] = 0x07; // version 0, all three flags
        data[1] = 0x21; // red x low 2, red y low 1
        data[2] = 0xA8; // red x high
        data[3] = 0x54; // red y high
        data[13] = 0x54; // min low 5, max low 4
        data[14] = 0x01;
        data[15] = 0xFF;
        data[16] = 0x42; // metadata version 4.2
        let block = parse_dolby_video_block(&mut ctx, &data).unwrap();
        assert!(log.is_empty());
        let DolbyVideoBlock::V0(v0) = block else {
            panic!("expected version 0");
        };
        assert!(v0.global_dimming && v0.supports_2160p60 && v0.yuv422_12bit);
        assert_eq!(v0.dynamic_metadata_version_major, 4);
        assert_eq!(v0.dynamic_metadata_version_minor, 2);
        assert_eq!(v0.target_pq_12b_level_min, 0x015);
        assert_eq!(v0.target_pq_12b_level_max, 0xFF4);
        assert!((v0.red_x - 0xA82 as f64 / 4096.0).abs() < 1e-9);
        assert!((v0.red_y - 0x541 as f64 / 4096.0).abs() < 1e-9);
    }

    #[test]
    fn v1_long_form_primaries() {
        let mut log = FailureLog::new();
        let mut ctx = ctx(&mut log);
        let data = [
            0x2B, // version 1, metadata version 2+2, 2160p60, 4:2:2
            0x29, // max luminance steps 20, global dimming
            0xFF, // min luminance steps 127, P3-D65
            0x00, 0xA8, 0x54, 0x44, 0x9C, 0x26, 0x0C,
        ];
        let block = parse_dolby_video_block(&mut ctx, &data).unwrap();
        assert!(log.is_empty());
        let DolbyVideoBlock::V1(v1) = block else {
            panic!("expected version 1");
        };
        assert_eq!(v1.dynamic_metadata_version, 4);
        assert!(v1.supports_2160p60 && v1.yuv422_12bit && v1.global_dimming);
        assert_eq!(v1.colorimetry, DolbyColorimetry::P3D65);
        assert!(!v1.unique_primaries);
        assert_eq!(v1.target_luminance_max, 20.0 * 50.0 + 100.0);
        assert!((v1.target_luminance_min - 1.0).abs() < 1e-9);
        assert!((v1.red_x - 0xA8 as f64 / 256.0).abs() < 1e-9);
        assert!((v1.blue_y - 0x0C as f64 / 256.0).abs() < 1e-9);
    }

    #[test]
    fn v1_short_form_unique_primaries() {
        let mut log = FailureLog::new();
        let mut ctx = ctx(&mut log);
        let data = [
            0x21, // version 1
            0x00, 0x00, //
            0xE9, // blue x steps 7, blue y steps 2, low latency
            0x01, 0x01, 0xFF, // red/green packed fields
        ];
        let block = parse_dolby_video_block(&mut ctx, &data).unwrap();
        assert!(log.is_empty());
        let DolbyVideoBlock::V1(v1) = block else {
            panic!("expected version 1");
        };
        assert!(v1.unique_primaries);
        assert!(v1.mode_low_latency);
        // red x uses the full 5-bit range.
        assert!((v1.red_x - 0.74609375).abs() < 1e-9);
        // red y steps: (data[6] bits 2:0 = 7) << 2 | 1 << 1 | 1 = 31.
        assert!((v1.red_y - 0.37109375).abs() < 1e-9);
        // blue x at max steps.
        assert!((v1.blue_x - 0.15234375).abs() < 1e-9);
    }

    #[test]
    fn v2_layout() {
        let mut log = FailureLog::new();
        let mut ctx = ctx(&mut log);
        let data = [
            0x47, // version 2, metadata version 2+1, backlight control, 4:2:2
            0x0E, // min level 20*1, global dimming, backlight min 75
            0x0A, // max level 2055+65, standard mode
            0x01, // yuv444 high bit
            0x00, //
            0xF8, // red x max steps
            0x00,
        ];
        let block = parse_dolby_video_block(&mut ctx, &data).unwrap();
        assert!(log.is_empty());
        let DolbyVideoBlock::V2(v2) = block else {
            panic!("expected version 2");
        };
        assert_eq!(v2.dynamic_metadata_version, 3);
        assert!(v2.backlight_control && v2.yuv422_12bit && v2.global_dimming);
        assert_eq!(v2.backlight_luminance_min, 75);
        assert!(v2.mode_standard && !v2.mode_low_latency_hdmi);
        assert_eq!(v2.yuv444, DolbyYuv444Depth::TwelveBits);
        assert_eq!(v2.target_pq_12b_level_min, 20);
        assert_eq!(v2.target_pq_12b_level_max, 2120);
        assert!((v2.red_x - (0.625 + 31.0 / 256.0)).abs() < 1e-9);
    }

    #[test]
    fn v2_reserved_yuv444_mode() {
        let mut log = FailureLog::new();
        let mut ctx = ctx(&mut log);
        let data = [0x40, 0x00, 0x00, 0x01, 0x01, 0x00, 0x00];
        assert!(parse_dolby_video_block(&mut ctx, &data).is_none());
        assert_eq!(
            log.messages(),
            ["Vendor-Specific Video Data Block (Dolby), OUI 00-D0-46: Reserved YUV444 mode 0x03."]
        );
    }
}
