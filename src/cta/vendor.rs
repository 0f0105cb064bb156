//! HDMI and HDMI Forum vendor-specific data block decoding
//!
//! The HDMI Forum block and the HDMI Forum Sink Capability block share the
//! same SCDS layout, so a single decoder serves both with different
//! diagnostic prefixes. Byte indices follow the HDMI spec convention of
//! counting from the data block header, with the payload starting at byte 1.

use serde::Serialize;

use crate::bits::{bit_is_set, extract_bits};
use crate::cta::CtaCtx;

/// Decoded HDMI vendor-specific data block, OUI 00-0C-03.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct VendorHdmiBlock {
    pub source_phys_addr: u16,
    pub supports_ai: bool,
    pub supports_dc_48bit: bool,
    pub supports_dc_36bit: bool,
    pub supports_dc_30bit: bool,
    pub supports_dc_y444: bool,
    pub supports_dvi_dual: bool,
    pub max_tmds_clock: u16,
    pub supports_content_game: bool,
    pub supports_content_cinema: bool,
    pub supports_content_photo: bool,
    pub supports_content_graphics: bool,
    pub has_latency: bool,
    pub has_interlaced_latency: bool,
    pub supports_progressive_video: bool,
    pub progressive_video_latency_ms: u16,
    pub supports_progressive_audio: bool,
    pub progressive_audio_latency_ms: u16,
    pub supports_interlaced_video: bool,
    pub interlaced_video_latency_ms: u16,
    pub supports_interlaced_audio: bool,
    pub interlaced_audio_latency_ms: u16,
    pub hdmi_vics: Vec<u8>,
}

fn latency_from_raw(ctx: &mut CtaCtx, block_name: &str, kind: &str, raw: u8) -> u16 {
    // 0 means unknown, 255 means unsupported; otherwise latency in units
    // of 2 ms, offset by one.
    if raw == 0 || raw == 255 {
        return 0;
    }
    if raw > 251 {
        ctx.fail(format!(
            "{block_name}: {kind} latency byte is {raw}, but the ceil supported by spec is 251.",
        ));
        return 0;
    }
    2 * (raw as u16 - 1)
}

pub(super) fn parse_vendor_hdmi_block(ctx: &mut CtaCtx, data: &[u8]) -> Option<VendorHdmiBlock> {
    let block_name = "Vendor-Specific Data Block (HDMI), OUI 00-0C-03";

    if data.len() < 5 {
        ctx.fail(format!("{block_name}: Empty Data Block"));
        return None;
    }

    let mut block = VendorHdmiBlock {
        source_phys_addr: (data[3] as u16) << 8 | data[4] as u16,
        ..Default::default()
    };

    if data.len() < 6 {
        return Some(block);
    }

    block.supports_ai = bit_is_set(data[5], 7);
    block.supports_dc_48bit = bit_is_set(data[5], 6);
    block.supports_dc_36bit = bit_is_set(data[5], 5);
    block.supports_dc_30bit = bit_is_set(data[5], 4);
    block.supports_dc_y444 = bit_is_set(data[5], 3);
    if extract_bits(data[5], 2, 1) != 0 {
        ctx.fail(format!("{block_name}: Bits 2 and 1 of byte 6 are reserved."));
    }
    block.supports_dvi_dual = bit_is_set(data[5], 0);

    if data.len() < 7 {
        return Some(block);
    }

    block.max_tmds_clock = data[6] as u16 * 5;

    if data.len() < 8 {
        return Some(block);
    }

    block.supports_content_game = bit_is_set(data[7], 3);
    block.supports_content_cinema = bit_is_set(data[7], 2);
    block.supports_content_photo = bit_is_set(data[7], 1);
    block.supports_content_graphics = bit_is_set(data[7], 0);

    block.has_latency = bit_is_set(data[7], 7);
    block.has_interlaced_latency = bit_is_set(data[7], 6);
    // Bit 5 is reserved on older HDMI spec versions but appears as the
    // HDMI_Video_present flag on newer ones. The blob size already tells
    // us whether extended video details follow, so ignore bit 5.
    if bit_is_set(data[7], 4) {
        ctx.fail(format!("{block_name}: Bit 4 of byte 8 is reserved."));
    }

    if block.has_interlaced_latency && !block.has_latency {
        ctx.fail(format!(
            "{block_name}: Interlaced Latency support flag set, but Latency support flag is not",
        ));
        return None;
    }

    // The remaining features have no fixed position.
    let mut index = 8;

    if block.has_latency {
        if data.len() <= index + 1 {
            ctx.fail(format!(
                "{block_name}: Latency support flag set, but bytes are missing",
            ));
            return None;
        }

        let val = data[index];
        index += 1;
        block.supports_progressive_video = val != 255;
        block.progressive_video_latency_ms = latency_from_raw(ctx, block_name, "Video", val);

        let val = data[index];
        index += 1;
        block.supports_progressive_audio = val != 255;
        block.progressive_audio_latency_ms = latency_from_raw(ctx, block_name, "Audio", val);
    }

    if block.has_interlaced_latency {
        if data.len() <= index + 1 {
            ctx.fail(format!(
                "{block_name}: Interlaced Latency support flag set, but bytes are missing",
            ));
            return None;
        }

        let val = data[index];
        index += 1;
        block.supports_interlaced_video = val != 255;
        block.interlaced_video_latency_ms =
            latency_from_raw(ctx, block_name, "Interlaced Video", val);

        let val = data[index];
        index += 1;
        block.supports_interlaced_audio = val != 255;
        block.interlaced_audio_latency_ms =
            latency_from_raw(ctx, block_name, "Interlaced Audio", val);
    }

    if data.len() <= index {
        return Some(block);
    }

    // Skip a byte, it is only meaningful for HDMI 3D VIC decoding.
    index += 1;

    if data.len() <= index {
        return Some(block);
    }

    let mut len_vic = extract_bits(data[index], 7, 5) as usize;
    index += 1;
    if len_vic == 0 {
        ctx.fail(format!(
            "{block_name}: Extended Video Details flag but HDMI VIC list size 0",
        ));
        return None;
    }

    if data.len() <= index + len_vic - 1 {
        ctx.fail(format!(
            "{block_name}: HDMI VIC list size {len_vic} does not fit block of size {}",
            data.len()
        ));
        len_vic = data.len() - index;
    }

    for _ in 0..len_vic {
        let val = data[index];
        index += 1;
        if !(1..=4).contains(&val) {
            ctx.fail(format!("{block_name}: HDMI VIC {val} is invalid"));
            continue;
        }
        block.hdmi_vics.push(val);
    }

    Some(block)
}

/// Fixed Rate Link throughput classes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum MaxFrlRate {
    #[default]
    Unsupported,
    Rate3Gbps3Lanes,
    Rate6Gbps3Lanes,
    Rate6Gbps4Lanes,
    Rate8Gbps4Lanes,
    Rate10Gbps4Lanes,
    Rate12Gbps4Lanes,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DscMaxSlices {
    #[default]
    Unsupported,
    Slices1At340Mhz,
    Slices2At340Mhz,
    Slices4At340Mhz,
    Slices8At340Mhz,
    Slices8At400Mhz,
    Slices12At400Mhz,
    Slices16At400Mhz,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HdmiDsc {
    pub supports_10bpc: bool,
    pub supports_12bpc: bool,
    pub supports_all_bpc: bool,
    pub supports_native_420: bool,
    pub max_slices: DscMaxSlices,
    pub max_frl_rate: MaxFrlRate,
    pub max_total_chunk_bytes: u32,
}

/// Sink Capability Data Structure, shared by the HDMI Forum vendor block
/// and the HDMI Forum Sink Capability extended block.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct HdmiScds {
    pub version: u8,
    pub max_tmds_char_rate_mhz: u16,
    pub supports_3d_osd_disparity: bool,
    pub supports_3d_dual_view: bool,
    pub supports_3d_independent_view: bool,
    pub supports_lte_340mcsc_scramble: bool,
    pub supports_ccbpci: bool,
    pub supports_cable_status: bool,
    pub supports_scdc_read_request: bool,
    pub supports_scdc: bool,
    pub supports_dc_30bit_420: bool,
    pub supports_dc_36bit_420: bool,
    pub supports_dc_48bit_420: bool,
    pub supports_uhd_vic: bool,
    pub max_frl_rate: MaxFrlRate,
    pub supports_fapa_start_location: bool,
    pub supports_allm: bool,
    pub supports_fva: bool,
    pub supports_neg_mvrr: bool,
    pub supports_cinema_vrr: bool,
    pub m_delta: bool,
    pub supports_qms: bool,
    pub supports_fapa_end_extended: bool,
    pub vrr_min_hz: u8,
    pub vrr_max_hz: u16,
    pub qms_tfr_min: bool,
    pub qms_tfr_max: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dsc: Option<HdmiDsc>,
}

fn parse_frl_rate(ctx: &mut CtaCtx, block_name: &str, raw: u8) -> MaxFrlRate {
    match raw {
        0 => MaxFrlRate::Unsupported,
        1 => MaxFrlRate::Rate3Gbps3Lanes,
        2 => MaxFrlRate::Rate6Gbps3Lanes,
        3 => MaxFrlRate::Rate6Gbps4Lanes,
        4 => MaxFrlRate::Rate8Gbps4Lanes,
        5 => MaxFrlRate::Rate10Gbps4Lanes,
        6 => MaxFrlRate::Rate12Gbps4Lanes,
        _ => {
            ctx.fail(format!(
                "{block_name}: Unknown Max Fixed Rate Link (0x{raw:02x}).",
            ));
            MaxFrlRate::Unsupported
        }
    }
}

pub(super) fn parse_hdmi_scds(
    ctx: &mut CtaCtx,
    data: &[u8],
    block_name: &str,
) -> Option<HdmiScds> {
    if data.len() < 7 {
        ctx.fail(format!("{block_name}: Empty Data Block"));
        return None;
    }

    let mut scds = HdmiScds {
        version: data[3],
        ..Default::default()
    };
    if scds.version != 1 {
        ctx.fail(format!(
            "{block_name}: Unsupported version {}.",
            scds.version
        ));
        return None;
    }

    scds.max_tmds_char_rate_mhz = 5 * data[4] as u16;
    if scds.max_tmds_char_rate_mhz != 0 && scds.max_tmds_char_rate_mhz <= 340 {
        ctx.fail(format!("{block_name}: Max TMDS rate is != 0 and <= 340."));
    }

    scds.supports_3d_osd_disparity = bit_is_set(data[5], 0);
    scds.supports_3d_dual_view = bit_is_set(data[5], 1);
    scds.supports_3d_independent_view = bit_is_set(data[5], 2);
    scds.supports_lte_340mcsc_scramble = bit_is_set(data[5], 3);
    scds.supports_ccbpci = bit_is_set(data[5], 4);
    scds.supports_cable_status = bit_is_set(data[5], 5);
    scds.supports_scdc_read_request = bit_is_set(data[5], 6);
    scds.supports_scdc = bit_is_set(data[5], 7);
    scds.supports_dc_30bit_420 = bit_is_set(data[6], 0);
    scds.supports_dc_36bit_420 = bit_is_set(data[6], 1);
    scds.supports_dc_48bit_420 = bit_is_set(data[6], 2);
    scds.supports_uhd_vic = bit_is_set(data[6], 3);

    let raw_frl = extract_bits(data[6], 7, 4);
    scds.max_frl_rate = parse_frl_rate(ctx, block_name, raw_frl);

    if raw_frl == 1 && scds.max_tmds_char_rate_mhz < 300 {
        ctx.fail(format!(
            "{block_name}: Max Fixed Rate Link is 1, but Max TMDS rate < 300.",
        ));
    }
    if (2..=6).contains(&raw_frl) && scds.max_tmds_char_rate_mhz != 600 {
        ctx.fail(format!(
            "{block_name}: Max Fixed Rate Link is >= 2, but Max TMDS rate != 600.",
        ));
    }

    if data.len() < 8 {
        return Some(scds);
    }

    scds.supports_fapa_start_location = bit_is_set(data[7], 0);
    scds.supports_allm = bit_is_set(data[7], 1);
    scds.supports_fva = bit_is_set(data[7], 2);
    scds.supports_neg_mvrr = bit_is_set(data[7], 3);
    scds.supports_cinema_vrr = bit_is_set(data[7], 4);
    if scds.supports_cinema_vrr {
        ctx.fail(format!(
            "{block_name}: CinemaVRR is deprecated and must be cleared.",
        ));
    }
    scds.m_delta = bit_is_set(data[7], 5);
    scds.supports_qms = bit_is_set(data[7], 6);
    scds.supports_fapa_end_extended = bit_is_set(data[7], 7);

    if data.len() < 10 {
        return Some(scds);
    }

    scds.vrr_min_hz = extract_bits(data[8], 5, 0);
    scds.vrr_max_hz = (extract_bits(data[8], 7, 6) as u16) << 8 | data[9] as u16;

    if scds.vrr_min_hz > 48 {
        ctx.fail(format!("{block_name}: VRRmin > 48."));
    }
    if scds.vrr_min_hz == 0 && scds.vrr_max_hz != 0 {
        ctx.fail(format!("{block_name}: VRRmin == 0, but VRRmax isn't."));
    }
    if scds.vrr_max_hz < 100 {
        ctx.fail(format!("{block_name}: VRRmax < 100."));
    }

    if data.len() < 13 {
        return Some(scds);
    }

    let mut dsc = HdmiDsc {
        supports_10bpc: bit_is_set(data[10], 0),
        supports_12bpc: bit_is_set(data[10], 1),
        supports_all_bpc: bit_is_set(data[10], 3),
        supports_native_420: bit_is_set(data[10], 6),
        ..Default::default()
    };

    scds.qms_tfr_min = bit_is_set(data[10], 4);
    scds.qms_tfr_max = bit_is_set(data[10], 5);

    if scds.qms_tfr_min && !scds.supports_qms {
        ctx.fail(format!("{block_name}: QMS_TFR_min is set but QMS is not."));
    }
    if scds.qms_tfr_max && !scds.supports_qms {
        ctx.fail(format!("{block_name}: QMS_TFR_max is set but QMS is not."));
    }

    if bit_is_set(data[10], 2) {
        ctx.fail(format!("{block_name}: DSC_16bpc bit is reserved."));
    }
    if extract_bits(data[10], 5, 4) != 0 {
        ctx.fail(format!(
            "{block_name}: Bits 4 and 5 of byte 11 are reserved.",
        ));
    }

    dsc.max_slices = match extract_bits(data[11], 3, 0) {
        0 => DscMaxSlices::Unsupported,
        1 => DscMaxSlices::Slices1At340Mhz,
        2 => DscMaxSlices::Slices2At340Mhz,
        3 => DscMaxSlices::Slices4At340Mhz,
        4 => DscMaxSlices::Slices8At340Mhz,
        5 => DscMaxSlices::Slices8At400Mhz,
        6 => DscMaxSlices::Slices12At400Mhz,
        7 => DscMaxSlices::Slices16At400Mhz,
        other => {
            ctx.fail(format!(
                "{block_name}: Unknown DSC Max Slices (0x{other:02x}).",
            ));
            DscMaxSlices::Unsupported
        }
    };

    dsc.max_frl_rate = parse_frl_rate(ctx, block_name, extract_bits(data[11], 7, 4));

    dsc.max_total_chunk_bytes = 1024 * (1 + extract_bits(data[12], 5, 0) as u32);
    if extract_bits(data[12], 7, 6) != 0 {
        ctx.fail(format!(
            "{block_name}: Bits 6 and 7 of byte 13 are reserved.",
        ));
    }

    if bit_is_set(data[10], 7) {
        scds.dsc = Some(dsc);
    } else if data[10] != 0 || data[11] != 0 || data[12] != 0 {
        ctx.fail(format!(
            "{block_name}: DSC_1p2 is unset but DSC bits are not zero.",
        ));
    }

    for (i, &byte) in data.iter().enumerate().skip(13) {
        if byte != 0 {
            ctx.fail(format!("{block_name}: Byte {} is reserved.", i + 1));
        }
    }

    Some(scds)
}

pub(super) fn parse_vendor_hdmi_forum_block(ctx: &mut CtaCtx, data: &[u8]) -> Option<HdmiScds> {
    parse_hdmi_scds(
        ctx,
        data,
        "Vendor-Specific Data Block (HDMI Forum), OUI C4-5D-D8",
    )
}

pub(super) fn parse_hdmi_forum_sink_cap(ctx: &mut CtaCtx, data: &[u8]) -> Option<HdmiScds> {
    parse_hdmi_scds(ctx, data, "HDMI Forum Sink Capability Data Block")
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
    fn hdmi_minimal_block() {
        let mut log = FailureLog::new();
        let mut ctx = ctx(&mut log);
        // OUI bytes + physical address 1.0.0.0.
        let block = parse_vendor_hdmi_block(&mut ctx, &[0x03, 0x0C, 0x00, 0x10, 0x00]).unwrap();
        assert!(log.is_empty());
        assert_eq!(block.source_phys_addr, 0x1000);
        assert!(!block.supports_ai);
        assert!(block.hdmi_vics.is_empty());
    }

    #[test]
    fn hdmi_latency_and_vic_list() {
        let mut log = FailureLog::new();
        let mut ctx = ctx(&mut log);
        let data = [
            0x03, 0x0C, 0x00, // OUI
            0x10, 0x00, // physical address
            0x80, // Supports_AI
            60,   // 300 MHz TMDS
            0x80, // latency fields present
            11, 6, // video 20 ms, audio 10 ms
            0x00, // 3D byte, skipped
            0x40, // HDMI VIC list of 2
            1, 4,
        ];
        let block = parse_vendor_hdmi_block(&mut ctx, &data).unwrap();
        assert!(log.is_empty());
        assert!(block.supports_ai);
        assert_eq!(block.max_tmds_clock, 300);
        assert!(block.has_latency);
        assert!(block.supports_progressive_video);
        assert_eq!(block.progressive_video_latency_ms, 20);
        assert_eq!(block.progressive_audio_latency_ms, 10);
        assert_eq!(block.hdmi_vics, vec![1, 4]);
    }

    #[test]
    fn hdmi_latency_sentinel_255() {
        let mut log = FailureLog::new();
        let mut ctx = ctx(&mut log);
        let data = [0x03, 0x0C, 0x00, 0x10, 0x00, 0x00, 0, 0x80, 255, 255];
        let block = parse_vendor_hdmi_block(&mut ctx, &data).unwrap();
        assert!(!block.supports_progressive_video);
        assert!(!block.supports_progressive_audio);
        assert_eq!(block.progressive_video_latency_ms, 0);
    }

    #[test]
    fn scds_basic() {
        let mut log = FailureLog::new();
        let mut ctx = ctx(&mut log);
        let data = [
            0xD8, 0x5D, 0xC4, // OUI
            1,    // version
            120,  // 600 MHz
            0x80, // SCDC
            0x31, // FRL rate 3, DC 30-bit 4:2:0
            0x02, // ALLM
        ];
        let scds = parse_vendor_hdmi_forum_block(&mut ctx, &data).unwrap();
        assert!(log.is_empty());
        assert_eq!(scds.version, 1);
        assert_eq!(scds.max_tmds_char_rate_mhz, 600);
        assert!(scds.supports_scdc);
        assert!(scds.supports_dc_30bit_420);
        assert_eq!(scds.max_frl_rate, MaxFrlRate::Rate6Gbps4Lanes);
        assert!(scds.supports_allm);
        assert!(scds.dsc.is_none());
    }

    #[test]
    fn scds_rejects_unknown_version() {
        let mut log = FailureLog::new();
        let mut ctx = ctx(&mut log);
        let data = [0xD8, 0x5D, 0xC4, 2, 120, 0, 0];
        assert!(parse_vendor_hdmi_forum_block(&mut ctx, &data).is_none());
        assert_eq!(
            log.messages(),
            ["Vendor-Specific Data Block (HDMI Forum), OUI C4-5D-D8: Unsupported version 2."]
        );
    }

    #[test]
    fn scds_vrr_and_dsc() {
        let mut log = FailureLog::new();
        let mut ctx = ctx(&mut log);
        let data = [
            0xD8, 0x5D, 0xC4, // OUI
            1, 120, 0x80, 0x30, // version, 600 MHz, SCDC, FRL 3
            0x42, // ALLM + QMS
            40,   // VRRmin 40
            120,  // VRRmax 120
            0x83, // DSC_1p2, 10 and 12 bpc
            0x24, // FRL 2, 8 slices at 340 MHz
            0x3F, // 64 KiB chunks
        ];
        let scds = parse_hdmi_forum_sink_cap(&mut ctx, &data).unwrap();
        assert!(log.is_empty());
        assert_eq!(scds.vrr_min_hz, 40);
        assert_eq!(scds.vrr_max_hz, 120);
        let dsc = scds.dsc.unwrap();
        assert!(dsc.supports_10bpc && dsc.supports_12bpc);
        assert_eq!(dsc.max_slices, DscMaxSlices::Slices8At340Mhz);
        assert_eq!(dsc.max_frl_rate, MaxFrlRate::Rate6Gbps3Lanes);
        assert_eq!(dsc.max_total_chunk_bytes, 64 * 1024);
    }
}
