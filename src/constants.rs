//! Constants for CTA-861 extension blocks and DisplayID v2 sections

/// CTA extension block constants
pub const CTA_BLOCK_SIZE: usize = 128;
pub const CTA_TAG: u8 = 0x02;
/// Tag + revision + DTD offset + flags
pub const CTA_HEADER_SIZE: usize = 4;
/// Exclusive upper bound for detailed timing definitions in the block
pub const CTA_DTD_END: usize = 127;
/// 18-byte detailed timing definition
pub const DTD_SIZE: usize = 18;
/// 3-byte short audio descriptor
pub const SAD_SIZE: usize = 3;
/// 4-byte HDMI 3D audio descriptor
pub const HDMI_AUDIO_3D_DESCRIPTOR_SIZE: usize = 4;

/// Collection ceilings derived from the 128-byte container.
/// Exceeding any of these is a programming defect, not a data error.
pub const CTA_MAX_DATA_BLOCKS: usize = 123;
pub const CTA_MAX_DETAILED_TIMING_DEFS: usize = 6;
pub const CTA_MAX_VIDEO_BLOCK_ENTRIES: usize = 63;
pub const CTA_MAX_AUDIO_BLOCK_ENTRIES: usize = 21;
pub const CTA_MAX_YCBCR420_CAP_MAP_ENTRIES: usize = 63;
pub const CTA_MAX_SPEAKER_LOCATION_ENTRIES: usize = 31;
pub const CTA_MAX_VIDEO_FORMAT_PREF_ENTRIES: usize = 63;
pub const CTA_MAX_HDMI_AUDIO_ENTRIES: usize = 15;
pub const CTA_MAX_INFOFRAME_ENTRIES: usize = 61;

/// IEEE Organizationally Unique Identifiers
pub const IEEE_OUI_DOLBY: u32 = 0x00D046;
pub const IEEE_OUI_HDR10PLUS: u32 = 0x90848B;
pub const IEEE_OUI_HDMI: u32 = 0x000C03;
pub const IEEE_OUI_HDMI_FORUM: u32 = 0xC45DD8;

/// DisplayID v2 section constants
pub const DISPLAYID2_HEADER_SIZE: usize = 4;
/// Header + checksum
pub const DISPLAYID2_MIN_SIZE: usize = DISPLAYID2_HEADER_SIZE + 1;
pub const DISPLAYID2_MAX_SIZE: usize = 256;
/// Tag + revision + size
pub const DISPLAYID2_DATA_BLOCK_HEADER_SIZE: usize = 3;
