//! CTA-861 extension block parsing
//!
//! The section parser validates the 128-byte extension header, walks the
//! data-block region, then the detailed timing definitions. Header
//! geometry that cannot be interpreted is a hard error; everything else
//! degrades to a logged failure, with malformed blocks skipped
//! individually.

use anyhow::{bail, ensure, Result};
use serde::Serialize;

use crate::bits::{bit_is_set, extract_bits};
use crate::constants::{
    CTA_BLOCK_SIZE, CTA_DTD_END, CTA_HEADER_SIZE, CTA_MAX_DATA_BLOCKS,
    CTA_MAX_DETAILED_TIMING_DEFS, CTA_TAG, DTD_SIZE, IEEE_OUI_DOLBY, IEEE_OUI_HDMI,
    IEEE_OUI_HDMI_FORUM, IEEE_OUI_HDR10PLUS,
};
use crate::diag::FailureLog;
use crate::dtd::{parse_dtd, DetailedTimingDef};

pub mod audio;
pub mod capability;
pub mod did_timing;
pub mod dolby;
pub mod hdr;
pub mod hdr10plus;
pub mod hdmi_audio;
pub mod infoframe;
pub mod speaker;
pub mod vendor;
pub mod vesa;
pub mod video;

use audio::{parse_audio_block, AudioBlock};
use capability::{
    parse_colorimetry_block, parse_video_cap_block, parse_ycbcr420_cap_map, ColorimetryBlock,
    VideoCapBlock, Ycbcr420CapMapBlock,
};
use did_timing::{parse_did_type_vii_block, TypeViiTiming};
use dolby::{parse_dolby_video_block, DolbyVideoBlock};
use hdr::{
    parse_hdr_dynamic_metadata_block, parse_hdr_static_metadata_block, HdrDynamicMetadataBlock,
    HdrStaticMetadataBlock,
};
use hdr10plus::{parse_hdr10plus_block, Hdr10PlusBlock};
use hdmi_audio::{parse_hdmi_audio_block, HdmiAudioBlock};
use infoframe::{parse_infoframe_block, InfoframeBlock};
use speaker::{
    parse_room_config_block, parse_speaker_alloc_block, parse_speaker_location_block,
    RoomConfigBlock, SpeakerAllocBlock, SpeakerLocationBlock,
};
use vendor::{
    parse_hdmi_forum_sink_cap, parse_vendor_hdmi_block, parse_vendor_hdmi_forum_block, HdmiScds,
    VendorHdmiBlock,
};
use vesa::{
    parse_vesa_display_device, parse_vesa_transfer_characteristics, VesaDisplayDeviceBlock,
    VesaTransferCharacteristicsBlock,
};
use video::{
    parse_native_video_resolution_block, parse_video_block, parse_video_format_pref_block,
    parse_ycbcr420_block, NativeVideoResolutionBlock, VideoBlock, VideoFormatPrefBlock,
    Ycbcr420VideoBlock,
};

/// Shared state handed to every sub-block decoder.
pub(crate) struct CtaCtx<'a> {
    pub revision: u8,
    pub it_underscan: bool,
    pub log: &'a mut FailureLog,
}

impl CtaCtx<'_> {
    pub(crate) fn fail(&mut self, msg: impl Into<String>) {
        self.log.add(msg);
    }

    /// Record a failure only when the section revision is at or below
    /// `cap`; later revisions may legalize the value.
    pub(crate) fn fail_until(&mut self, cap: u8, msg: impl Into<String>) {
        self.log.add_until(cap, self.revision, msg);
    }
}

/// Byte 3 of the extension header, meaningful for revision 2 and later.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CtaFlags {
    pub it_underscan: bool,
    pub basic_audio: bool,
    pub ycc444: bool,
    pub ycc422: bool,
    pub native_dtds: u8,
}

/// One parsed CTA-861 data block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DataBlock {
    Audio(AudioBlock),
    Video(VideoBlock),
    VendorHdmi(VendorHdmiBlock),
    VendorHdmiForum(HdmiScds),
    SpeakerAlloc(SpeakerAllocBlock),
    VesaTransferCharacteristics(VesaTransferCharacteristicsBlock),
    /// Legacy Video Format block, tag only.
    VideoFormat,
    VideoCap(VideoCapBlock),
    DolbyVideo(DolbyVideoBlock),
    Hdr10Plus(Hdr10PlusBlock),
    VesaDisplayDevice(VesaDisplayDeviceBlock),
    Colorimetry(ColorimetryBlock),
    HdrStaticMetadata(HdrStaticMetadataBlock),
    HdrDynamicMetadata(HdrDynamicMetadataBlock),
    NativeVideoResolution(NativeVideoResolutionBlock),
    VideoFormatPref(VideoFormatPrefBlock),
    Ycbcr420Video(Ycbcr420VideoBlock),
    Ycbcr420CapMap(Ycbcr420CapMapBlock),
    HdmiAudio(HdmiAudioBlock),
    RoomConfig(RoomConfigBlock),
    SpeakerLocation(SpeakerLocationBlock),
    Infoframe(InfoframeBlock),
    DidTypeVii(TypeViiTiming),
    /// DisplayID Type VIII timing block, raw payload.
    DidTypeViii { raw: Vec<u8> },
    /// DisplayID Type X timing block, raw payload.
    DidTypeX { raw: Vec<u8> },
    /// HDMI Forum EDID extension override, raw payload.
    HdmiEdidExtOverride { raw: Vec<u8> },
    HdmiForumSinkCap(HdmiScds),
}

macro_rules! accessor {
    ($name:ident, $variant:ident, $ty:ty) => {
        pub fn $name(&self) -> Option<&$ty> {
            match self {
                DataBlock::$variant(inner) => Some(inner),
                _ => None,
            }
        }
    };
}

impl DataBlock {
    accessor!(as_audio, Audio, AudioBlock);
    accessor!(as_video, Video, VideoBlock);
    accessor!(as_vendor_hdmi, VendorHdmi, VendorHdmiBlock);
    accessor!(as_vendor_hdmi_forum, VendorHdmiForum, HdmiScds);
    accessor!(as_speaker_alloc, SpeakerAlloc, SpeakerAllocBlock);
    accessor!(
        as_vesa_transfer_characteristics,
        VesaTransferCharacteristics,
        VesaTransferCharacteristicsBlock
    );
    accessor!(as_video_cap, VideoCap, VideoCapBlock);
    accessor!(as_dolby_video, DolbyVideo, DolbyVideoBlock);
    accessor!(as_hdr10plus, Hdr10Plus, Hdr10PlusBlock);
    accessor!(as_vesa_display_device, VesaDisplayDevice, VesaDisplayDeviceBlock);
    accessor!(as_colorimetry, Colorimetry, ColorimetryBlock);
    accessor!(as_hdr_static_metadata, HdrStaticMetadata, HdrStaticMetadataBlock);
    accessor!(as_hdr_dynamic_metadata, HdrDynamicMetadata, HdrDynamicMetadataBlock);
    accessor!(
        as_native_video_resolution,
        NativeVideoResolution,
        NativeVideoResolutionBlock
    );
    accessor!(as_video_format_pref, VideoFormatPref, VideoFormatPrefBlock);
    accessor!(as_ycbcr420, Ycbcr420Video, Ycbcr420VideoBlock);
    accessor!(as_ycbcr420_cap_map, Ycbcr420CapMap, Ycbcr420CapMapBlock);
    accessor!(as_hdmi_audio, HdmiAudio, HdmiAudioBlock);
    accessor!(as_room_config, RoomConfig, RoomConfigBlock);
    accessor!(as_speaker_locations, SpeakerLocation, SpeakerLocationBlock);
    accessor!(as_infoframe, Infoframe, InfoframeBlock);
    accessor!(as_did_type_vii, DidTypeVii, TypeViiTiming);
    accessor!(as_hdmi_forum_sink_cap, HdmiForumSinkCap, HdmiScds);

    /// Human-readable block name, as printed in summaries.
    pub fn name(&self) -> &'static str {
        match self {
            DataBlock::Audio(_) => "Audio Data Block",
            DataBlock::Video(_) => "Video Data Block",
            DataBlock::VendorHdmi(_) => "Vendor-Specific Data Block (HDMI)",
            DataBlock::VendorHdmiForum(_) => "Vendor-Specific Data Block (HDMI Forum)",
            DataBlock::SpeakerAlloc(_) => "Speaker Allocation Data Block",
            DataBlock::VesaTransferCharacteristics(_) => {
                "VESA Display Transfer Characteristics Data Block"
            }
            DataBlock::VideoFormat => "Video Format Data Block",
            DataBlock::VideoCap(_) => "Video Capability Data Block",
            DataBlock::DolbyVideo(_) => "Vendor-Specific Video Data Block (Dolby)",
            DataBlock::Hdr10Plus(_) => "Vendor-Specific Video Data Block (HDR10+)",
            DataBlock::VesaDisplayDevice(_) => "VESA Video Display Device Data Block",
            DataBlock::Colorimetry(_) => "Colorimetry Data Block",
            DataBlock::HdrStaticMetadata(_) => "HDR Static Metadata Data Block",
            DataBlock::HdrDynamicMetadata(_) => "HDR Dynamic Metadata Data Block",
            DataBlock::NativeVideoResolution(_) => "Native Video Resolution Data Block",
            DataBlock::VideoFormatPref(_) => "Video Format Preference Data Block",
            DataBlock::Ycbcr420Video(_) => "YCbCr 4:2:0 Video Data Block",
            DataBlock::Ycbcr420CapMap(_) => "YCbCr 4:2:0 Capability Map Data Block",
            DataBlock::HdmiAudio(_) => "HDMI Audio Data Block",
            DataBlock::RoomConfig(_) => "Room Configuration Data Block",
            DataBlock::SpeakerLocation(_) => "Speaker Location Data Block",
            DataBlock::Infoframe(_) => "InfoFrame Data Block",
            DataBlock::DidTypeVii(_) => "DisplayID Type VII Video Timing Data Block",
            DataBlock::DidTypeViii { .. } => "DisplayID Type VIII Video Timing Data Block",
            DataBlock::DidTypeX { .. } => "DisplayID Type X Video Timing Data Block",
            DataBlock::HdmiEdidExtOverride { .. } => "HDMI Forum EDID Extension Override Data Block",
            DataBlock::HdmiForumSinkCap(_) => "HDMI Forum Sink Capability Data Block",
        }
    }
}

/// One fully parsed CTA-861 extension block.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct CtaSection {
    pub revision: u8,
    pub flags: CtaFlags,
    pub data_blocks: Vec<DataBlock>,
    pub detailed_timing_defs: Vec<DetailedTimingDef>,
}

fn oui(data: &[u8]) -> u32 {
    (data[2] as u32) << 16 | (data[1] as u32) << 8 | data[0] as u32
}

fn parse_vendor_specific_block(ctx: &mut CtaCtx, data: &[u8]) -> Option<DataBlock> {
    if data.len() < 3 {
        ctx.fail(format!(
            "Vendor-Specific Data Block: Empty Data Block with length ({}).",
            data.len()
        ));
        return None;
    }

    // The HDMI decoders expect the payload to include the OUI bytes.
    match oui(data) {
        IEEE_OUI_HDMI => parse_vendor_hdmi_block(ctx, data).map(DataBlock::VendorHdmi),
        IEEE_OUI_HDMI_FORUM => {
            parse_vendor_hdmi_forum_block(ctx, data).map(DataBlock::VendorHdmiForum)
        }
        _ => None,
    }
}

fn parse_vendor_specific_video_block(ctx: &mut CtaCtx, data: &[u8]) -> Option<DataBlock> {
    if data.len() < 3 {
        ctx.fail(format!(
            "Vendor-Specific Video Data Block: Empty Data Block with length {}.",
            data.len()
        ));
        return None;
    }

    let payload = &data[3..];
    match oui(data) {
        IEEE_OUI_DOLBY => parse_dolby_video_block(ctx, payload).map(DataBlock::DolbyVideo),
        IEEE_OUI_HDR10PLUS => parse_hdr10plus_block(ctx, payload).map(DataBlock::Hdr10Plus),
        _ => None,
    }
}

fn parse_extended_block(ctx: &mut CtaCtx, data: &[u8]) -> Option<DataBlock> {
    if data.is_empty() {
        ctx.fail("Empty block with extended tag.");
        return None;
    }

    let extended_tag = data[0];
    let payload = &data[1..];

    match extended_tag {
        0 => parse_video_cap_block(ctx, payload).map(DataBlock::VideoCap),
        1 => parse_vendor_specific_video_block(ctx, payload),
        2 => parse_vesa_display_device(ctx, payload).map(DataBlock::VesaDisplayDevice),
        5 => parse_colorimetry_block(ctx, payload).map(DataBlock::Colorimetry),
        6 => parse_hdr_static_metadata_block(ctx, payload).map(DataBlock::HdrStaticMetadata),
        7 => parse_hdr_dynamic_metadata_block(ctx, payload).map(DataBlock::HdrDynamicMetadata),
        8 => {
            parse_native_video_resolution_block(ctx, payload).map(DataBlock::NativeVideoResolution)
        }
        13 => Some(DataBlock::VideoFormatPref(parse_video_format_pref_block(
            ctx, payload,
        ))),
        14 => Some(DataBlock::Ycbcr420Video(parse_ycbcr420_block(ctx, payload))),
        15 => Some(DataBlock::Ycbcr420CapMap(parse_ycbcr420_cap_map(
            ctx, payload,
        ))),
        // Vendor-Specific Audio Data Block
        17 => None,
        18 => parse_hdmi_audio_block(ctx, payload).map(DataBlock::HdmiAudio),
        19 => parse_room_config_block(ctx, payload).map(DataBlock::RoomConfig),
        20 => parse_speaker_location_block(ctx, payload).map(DataBlock::SpeakerLocation),
        32 => parse_infoframe_block(ctx, payload).map(DataBlock::Infoframe),
        34 => parse_did_type_vii_block(ctx, payload).map(DataBlock::DidTypeVii),
        35 => Some(DataBlock::DidTypeViii {
            raw: payload.to_vec(),
        }),
        42 => Some(DataBlock::DidTypeX {
            raw: payload.to_vec(),
        }),
        120 => Some(DataBlock::HdmiEdidExtOverride {
            raw: payload.to_vec(),
        }),
        // The sink capability layout matches the SCDS with the extended
        // tag byte standing in for the OUI region, so hand over the
        // un-stripped slice.
        121 => parse_hdmi_forum_sink_cap(ctx, data).map(DataBlock::HdmiForumSinkCap),
        _ => {
            ctx.fail_until(
                3,
                format!(
                    "Unknown CTA-861 Data Block (extended tag 0x{extended_tag:x}, length {}).",
                    payload.len()
                ),
            );
            None
        }
    }
}

fn parse_data_block(ctx: &mut CtaCtx, raw_tag: u8, data: &[u8]) -> Option<DataBlock> {
    match raw_tag {
        1 => Some(DataBlock::Audio(parse_audio_block(ctx, data))),
        2 => Some(DataBlock::Video(parse_video_block(ctx, data))),
        3 => parse_vendor_specific_block(ctx, data),
        4 => parse_speaker_alloc_block(ctx, data).map(DataBlock::SpeakerAlloc),
        5 => parse_vesa_transfer_characteristics(ctx, data)
            .map(DataBlock::VesaTransferCharacteristics),
        6 => Some(DataBlock::VideoFormat),
        7 => parse_extended_block(ctx, data),
        _ => {
            ctx.fail_until(
                3,
                format!(
                    "Unknown CTA-861 Data Block (tag 0x{raw_tag:x}, length {}).",
                    data.len()
                ),
            );
            None
        }
    }
}

/// Parse one 128-byte CTA-861 extension block. Spec violations are
/// recorded in `log`; only uninterpretable header geometry fails.
pub fn parse_cta_section(data: &[u8], log: &mut FailureLog) -> Result<CtaSection> {
    ensure!(
        data.len() == CTA_BLOCK_SIZE,
        "CTA extension block must be {CTA_BLOCK_SIZE} bytes, got {}",
        data.len()
    );
    ensure!(
        data[0] == CTA_TAG,
        "not a CTA extension block (tag 0x{:02x})",
        data[0]
    );

    let mut section = CtaSection {
        revision: data[1],
        ..Default::default()
    };
    let dtd_start = data[2] as usize;

    let flags = data[3];
    if section.revision >= 2 {
        section.flags = CtaFlags {
            it_underscan: bit_is_set(flags, 7),
            basic_audio: bit_is_set(flags, 6),
            ycc444: bit_is_set(flags, 5),
            ycc422: bit_is_set(flags, 4),
            native_dtds: extract_bits(flags, 3, 0),
        };
    } else if flags != 0 {
        // Reserved
        log.add("Non-zero byte 3.");
    }

    let mut ctx = CtaCtx {
        revision: section.revision,
        it_underscan: section.flags.it_underscan,
        log,
    };

    if dtd_start == 0 {
        return Ok(section);
    } else if dtd_start < CTA_HEADER_SIZE || dtd_start >= CTA_BLOCK_SIZE {
        bail!("invalid detailed timing definition offset {dtd_start}");
    }

    let mut i = CTA_HEADER_SIZE;
    while i < dtd_start {
        let header = data[i];
        let tag = extract_bits(header, 7, 5);
        let mut size = extract_bits(header, 4, 0) as usize;

        if i + 1 + size > dtd_start {
            size = dtd_start - i - 1;
            if size == 0 {
                ctx.fail(format!(
                    "Data Block at offset {i} overlaps Detailed Timing Definitions. \
                     No room for other blocks, skipping all further Data Blocks.",
                ));
                break;
            }
            ctx.fail(format!(
                "Data Block at offset {i} overlaps Detailed Timing Definitions. \
                 Adjusted its size to attempt parsing.",
            ));
        }

        if let Some(block) = parse_data_block(&mut ctx, tag, &data[i + 1..i + 1 + size]) {
            debug_assert!(section.data_blocks.len() < CTA_MAX_DATA_BLOCKS);
            section.data_blocks.push(block);
        }

        i += 1 + size;
    }

    if i != dtd_start {
        ctx.fail(format!("Offset is {dtd_start}, but should be {i}."));
    }

    let mut i = dtd_start;
    while i + DTD_SIZE <= CTA_DTD_END {
        // First two bytes both zero marks the end of the timing list.
        if data[i] == 0 && data[i + 1] == 0 {
            break;
        }

        let bytes: &[u8; 18] = data[i..i + DTD_SIZE].try_into().unwrap();
        debug_assert!(section.detailed_timing_defs.len() < CTA_MAX_DETAILED_TIMING_DEFS);
        section.detailed_timing_defs.push(parse_dtd(bytes));
        i += DTD_SIZE;
    }

    // All padding bytes after the last timing definition must be zero.
    while i < CTA_DTD_END {
        if data[i] != 0 {
            ctx.fail("Padding: Contains non-zero bytes.");
            break;
        }
        i += 1;
    }

    Ok(section)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_section() -> [u8; 128] {
        let mut buf = [0u8; 128];
        buf[0] = 0x02;
        buf[1] = 3;
        buf
    }

    #[test]
    fn zero_dtd_start_yields_empty_section() {
        let mut log = FailureLog::new();
        let section = parse_cta_section(&empty_section(), &mut log).unwrap();
        assert!(log.is_empty());
        assert!(section.data_blocks.is_empty());
        assert!(section.detailed_timing_defs.is_empty());
    }

    #[test]
    fn invalid_dtd_start_is_fatal() {
        let mut buf = empty_section();
        buf[2] = 2;
        let mut log = FailureLog::new();
        assert!(parse_cta_section(&buf, &mut log).is_err());
    }

    #[test]
    fn wrong_size_is_fatal() {
        let mut log = FailureLog::new();
        assert!(parse_cta_section(&[0x02, 3, 0, 0], &mut log).is_err());
    }

    #[test]
    fn flags_decoded_for_revision_2_and_later() {
        let mut buf = empty_section();
        buf[3] = 0xF2;
        let mut log = FailureLog::new();
        let section = parse_cta_section(&buf, &mut log).unwrap();
        assert!(log.is_empty());
        assert!(section.flags.it_underscan);
        assert!(section.flags.basic_audio);
        assert!(section.flags.ycc444);
        assert!(section.flags.ycc422);
        assert_eq!(section.flags.native_dtds, 2);
    }

    #[test]
    fn nonzero_flags_logged_below_revision_2() {
        let mut buf = empty_section();
        buf[1] = 1;
        buf[3] = 0x80;
        let mut log = FailureLog::new();
        let section = parse_cta_section(&buf, &mut log).unwrap();
        assert_eq!(section.flags, CtaFlags::default());
        assert_eq!(log.messages(), ["Non-zero byte 3."]);
    }

    #[test]
    fn unknown_tag_logged_until_revision_3() {
        let mut buf = empty_section();
        buf[2] = 7;
        buf[4] = 0x02; // tag 0, length 2
        let mut log = FailureLog::new();
        let section = parse_cta_section(&buf, &mut log).unwrap();
        assert!(section.data_blocks.is_empty());
        assert_eq!(
            log.messages(),
            ["Unknown CTA-861 Data Block (tag 0x0, length 2)."]
        );
    }
}
