//! VESA Video Display Device and VESA Display Transfer Characteristic
//! data block decoding

use serde::Serialize;

use crate::bits::{bit_is_set, extract_bits};
use crate::cta::CtaCtx;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DisplayDeviceInterface {
    Vga,
    NaviV,
    NaviD,
    Lvds,
    Rsds,
    DviD,
    DviIAnalog,
    DviIDigital,
    HdmiA,
    HdmiB,
    Mddi,
    DisplayPort,
    Ieee1394,
    M1Analog,
    M1Digital,
}

impl DisplayDeviceInterface {
    fn valid_num_channels(self, num_channels: u8) -> bool {
        use DisplayDeviceInterface::*;
        match self {
            Vga | NaviV | NaviD | DviIAnalog | Ieee1394 | M1Analog => num_channels == 0,
            Lvds | Rsds => true,
            DviD | DviIDigital | Mddi | M1Digital => num_channels == 1 || num_channels == 2,
            HdmiA => num_channels == 1,
            HdmiB => num_channels == 2,
            DisplayPort => num_channels == 1 || num_channels == 2 || num_channels == 4,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContentProtection {
    #[default]
    None,
    Hdcp,
    Dtcp,
    Dpcp,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DefaultOrientation {
    #[default]
    Landscape,
    Portrait,
    Unfixed,
    Undefined,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RotationCap {
    #[default]
    None,
    Clockwise90,
    Counterclockwise90,
    Either90,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ZeroPixelLocation {
    #[default]
    UpperLeft,
    UpperRight,
    LowerLeft,
    LowerRight,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScanDirection {
    #[default]
    Undefined,
    FastLongSlowShort,
    FastShortSlowLong,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SubpixelLayout {
    #[default]
    Undefined,
    RgbVertical,
    RgbHorizontal,
    EdidChromaticityVertical,
    EdidChromaticityHorizontal,
    QuadRggb,
    QuadGbrg,
    DeltaRgb,
    Mosaic,
    QuadAny,
    FiveSubpixels,
    SixSubpixels,
    ClairvoyantePentile,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DitheringType {
    #[default]
    None,
    Spatial,
    Temporal,
    SpatialAndTemporal,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FrameRateConversion {
    #[default]
    None,
    SingleBuffering,
    DoubleBuffering,
    Advanced,
}

/// CIE 1931 xy coordinates of an additional primary.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct Chromaticity {
    pub x: f32,
    pub y: f32,
}

/// Fully decoded VESA Video Display Device Data Block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VesaDisplayDeviceBlock {
    pub interface_type: DisplayDeviceInterface,
    pub num_channels: u8,
    pub interface_version: u8,
    pub interface_release: u8,
    pub content_protection: ContentProtection,
    pub min_clock_freq_mhz: u16,
    pub max_clock_freq_mhz: u16,
    pub native_horiz_pixels: u16,
    pub native_vert_pixels: u16,
    pub aspect_ratio: f32,
    pub default_orientation: DefaultOrientation,
    pub rotation_cap: RotationCap,
    pub zero_pixel_location: ZeroPixelLocation,
    pub scan_direction: ScanDirection,
    pub subpixel_layout: SubpixelLayout,
    pub horiz_pitch_mm: f32,
    pub vert_pitch_mm: f32,
    pub dithering_type: DitheringType,
    pub direct_drive: bool,
    pub overdrive_not_recommended: bool,
    pub deinterlacing: bool,
    pub audio_support: bool,
    pub separate_audio_inputs: bool,
    pub audio_input_override: bool,
    pub audio_delay_provided: bool,
    pub audio_delay_ms: i16,
    pub frame_rate_conversion: FrameRateConversion,
    pub frame_rate_range_hz: u8,
    pub frame_rate_native_hz: u8,
    pub bit_depth_interface: u8,
    pub bit_depth_display: u8,
    pub additional_primary_chromaticities: Vec<Chromaticity>,
    pub resp_time_transition: bool,
    pub resp_time_ms: u8,
    pub overscan_horiz_pct: u8,
    pub overscan_vert_pct: u8,
}

fn parse_additional_primary_chromaticity(low: u8, high: &[u8]) -> Chromaticity {
    // 10-bit coordinates: 8 high bits per axis plus 2 low bits packed
    // into a shared nibble.
    let raw_x = (high[0] as u16) << 2 | extract_bits(low, 3, 2) as u16;
    let raw_y = (high[1] as u16) << 2 | extract_bits(low, 1, 0) as u16;
    Chromaticity {
        x: raw_x as f32 / 1024.0,
        y: raw_y as f32 / 1024.0,
    }
}

pub(super) fn parse_vesa_display_device(
    ctx: &mut CtaCtx,
    data: &[u8],
) -> Option<VesaDisplayDeviceBlock> {
    // Byte positions below are offsets in the full 32-byte block; the
    // payload starts after the 2-byte CTA block header.
    const OFFSET: usize = 2;

    if data.len() + OFFSET != 32 {
        ctx.fail(format!(
            "VESA Video Display Device Data Block: Invalid length {}.",
            data.len()
        ));
        return None;
    }

    use DisplayDeviceInterface::*;
    let interface_bits = extract_bits(data[0x02 - OFFSET], 7, 4);
    let mut num_channels = extract_bits(data[0x02 - OFFSET], 3, 0);
    let interface_type = match interface_bits {
        0x0 => {
            // Analog: the channel field carries the detailed interface type.
            let detailed = match num_channels {
                0x0 => Vga,
                0x1 => NaviV,
                0x2 => NaviD,
                _ => {
                    ctx.fail(format!(
                        "VESA Video Display Device Data Block: Unknown analog interface type 0x{num_channels:x}.",
                    ));
                    return None;
                }
            };
            num_channels = 0;
            detailed
        }
        0x1 => Lvds,
        0x2 => Rsds,
        0x3 => DviD,
        0x4 => DviIAnalog,
        0x5 => DviIDigital,
        0x6 => HdmiA,
        0x7 => HdmiB,
        0x8 => Mddi,
        0x9 => DisplayPort,
        0xA => Ieee1394,
        0xB => M1Analog,
        0xC => M1Digital,
        _ => {
            ctx.fail(format!(
                "VESA Video Display Device Data Block: Unknown interface type 0x{interface_bits:x}.",
            ));
            return None;
        }
    };

    if !interface_type.valid_num_channels(num_channels) {
        ctx.fail(format!(
            "VESA Video Display Device Data Block: Invalid number of lanes/channels {num_channels}.",
        ));
        num_channels = 0;
    }

    let content_protection = match data[0x04 - OFFSET] {
        0 => ContentProtection::None,
        1 => ContentProtection::Hdcp,
        2 => ContentProtection::Dtcp,
        3 => ContentProtection::Dpcp,
        other => {
            ctx.fail(format!(
                "VESA Video Display Device Data Block: Invalid content protection 0x{other:x}.",
            ));
            ContentProtection::None
        }
    };

    let mut min_clock_freq_mhz = extract_bits(data[0x05 - OFFSET], 7, 2) as u16;
    let mut max_clock_freq_mhz =
        (extract_bits(data[0x05 - OFFSET], 1, 0) as u16) << 8 | data[0x06 - OFFSET] as u16;
    if min_clock_freq_mhz > max_clock_freq_mhz {
        ctx.fail(format!(
            "VESA Video Display Device Data Block: Minimum clock frequency ({min_clock_freq_mhz} MHz) greater than maximum ({max_clock_freq_mhz} MHz).",
        ));
        min_clock_freq_mhz = 0;
        max_clock_freq_mhz = 0;
    }

    let scan_direction = match extract_bits(data[0x0C - OFFSET], 1, 0) {
        0 => ScanDirection::Undefined,
        1 => ScanDirection::FastLongSlowShort,
        2 => ScanDirection::FastShortSlowLong,
        other => {
            ctx.fail(format!(
                "VESA Video Display Device Data Block: Invalid scan direction 0x{other:x}.",
            ));
            ScanDirection::Undefined
        }
    };

    let subpixel_layout = match data[0x0D - OFFSET] {
        0x0 => SubpixelLayout::Undefined,
        0x1 => SubpixelLayout::RgbVertical,
        0x2 => SubpixelLayout::RgbHorizontal,
        0x3 => SubpixelLayout::EdidChromaticityVertical,
        0x4 => SubpixelLayout::EdidChromaticityHorizontal,
        0x5 => SubpixelLayout::QuadRggb,
        0x6 => SubpixelLayout::QuadGbrg,
        0x7 => SubpixelLayout::DeltaRgb,
        0x8 => SubpixelLayout::Mosaic,
        0x9 => SubpixelLayout::QuadAny,
        0xA => SubpixelLayout::FiveSubpixels,
        0xB => SubpixelLayout::SixSubpixels,
        0xC => SubpixelLayout::ClairvoyantePentile,
        other => {
            ctx.fail(format!(
                "VESA Video Display Device Data Block: Invalid subpixel layout 0x{other:x}.",
            ));
            SubpixelLayout::Undefined
        }
    };

    if extract_bits(data[0x10 - OFFSET], 2, 0) != 0 {
        ctx.fail(
            "VESA Video Display Device Data Block: Reserved miscellaneous display capabilities bits 2-0 must be 0.",
        );
    }
    if extract_bits(data[0x11 - OFFSET], 4, 0) != 0 {
        ctx.fail("VESA Video Display Device Data Block: Reserved audio bits 4-0 must be 0.");
    }

    let mut audio_delay_ms = 2 * extract_bits(data[0x12 - OFFSET], 6, 0) as i16;
    if !bit_is_set(data[0x12 - OFFSET], 7) {
        audio_delay_ms = -audio_delay_ms;
    }

    let chromaticities_len = extract_bits(data[0x17 - OFFSET], 1, 0) as usize;
    let chromaticities = [
        parse_additional_primary_chromaticity(
            extract_bits(data[0x16 - OFFSET], 7, 4),
            &data[0x18 - OFFSET..],
        ),
        parse_additional_primary_chromaticity(
            extract_bits(data[0x16 - OFFSET], 3, 0),
            &data[0x1A - OFFSET..],
        ),
        parse_additional_primary_chromaticity(
            extract_bits(data[0x17 - OFFSET], 7, 4),
            &data[0x1C - OFFSET..],
        ),
    ];
    if extract_bits(data[0x17 - OFFSET], 3, 2) != 0 {
        ctx.fail(
            "VESA Video Display Device Data Block: Reserved additional primary chromaticities bits 3-2 of byte 0x17 must be 0.",
        );
    }

    Some(VesaDisplayDeviceBlock {
        interface_type,
        num_channels,
        interface_version: extract_bits(data[0x03 - OFFSET], 7, 4),
        interface_release: extract_bits(data[0x03 - OFFSET], 3, 0),
        content_protection,
        min_clock_freq_mhz,
        max_clock_freq_mhz,
        native_horiz_pixels: data[0x07 - OFFSET] as u16 | (data[0x08 - OFFSET] as u16) << 8,
        native_vert_pixels: data[0x09 - OFFSET] as u16 | (data[0x0A - OFFSET] as u16) << 8,
        aspect_ratio: data[0x0B - OFFSET] as f32 / 100.0 + 1.0,
        default_orientation: match extract_bits(data[0x0C - OFFSET], 7, 6) {
            0 => DefaultOrientation::Landscape,
            1 => DefaultOrientation::Portrait,
            2 => DefaultOrientation::Unfixed,
            _ => DefaultOrientation::Undefined,
        },
        rotation_cap: match extract_bits(data[0x0C - OFFSET], 5, 4) {
            0 => RotationCap::None,
            1 => RotationCap::Clockwise90,
            2 => RotationCap::Counterclockwise90,
            _ => RotationCap::Either90,
        },
        zero_pixel_location: match extract_bits(data[0x0C - OFFSET], 3, 2) {
            0 => ZeroPixelLocation::UpperLeft,
            1 => ZeroPixelLocation::UpperRight,
            2 => ZeroPixelLocation::LowerLeft,
            _ => ZeroPixelLocation::LowerRight,
        },
        scan_direction,
        subpixel_layout,
        horiz_pitch_mm: data[0x0E - OFFSET] as f32 * 0.01,
        vert_pitch_mm: data[0x0F - OFFSET] as f32 * 0.01,
        dithering_type: match extract_bits(data[0x10 - OFFSET], 7, 6) {
            0 => DitheringType::None,
            1 => DitheringType::Spatial,
            2 => DitheringType::Temporal,
            _ => DitheringType::SpatialAndTemporal,
        },
        direct_drive: bit_is_set(data[0x10 - OFFSET], 5),
        overdrive_not_recommended: bit_is_set(data[0x10 - OFFSET], 4),
        deinterlacing: bit_is_set(data[0x10 - OFFSET], 3),
        audio_support: bit_is_set(data[0x11 - OFFSET], 7),
        separate_audio_inputs: bit_is_set(data[0x11 - OFFSET], 6),
        audio_input_override: bit_is_set(data[0x11 - OFFSET], 5),
        audio_delay_provided: data[0x12 - OFFSET] != 0,
        audio_delay_ms,
        frame_rate_conversion: match extract_bits(data[0x13 - OFFSET], 7, 6) {
            0 => FrameRateConversion::None,
            1 => FrameRateConversion::SingleBuffering,
            2 => FrameRateConversion::DoubleBuffering,
            _ => FrameRateConversion::Advanced,
        },
        frame_rate_range_hz: extract_bits(data[0x13 - OFFSET], 5, 0),
        frame_rate_native_hz: data[0x14 - OFFSET],
        bit_depth_interface: extract_bits(data[0x15 - OFFSET], 7, 4) + 1,
        bit_depth_display: extract_bits(data[0x15 - OFFSET], 3, 0) + 1,
        additional_primary_chromaticities: chromaticities[..chromaticities_len].to_vec(),
        resp_time_transition: bit_is_set(data[0x1E - OFFSET], 7),
        resp_time_ms: extract_bits(data[0x1E - OFFSET], 6, 0),
        overscan_horiz_pct: extract_bits(data[0x1F - OFFSET], 7, 4),
        overscan_vert_pct: extract_bits(data[0x1F - OFFSET], 3, 0),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransferCharacteristicsUsage {
    White,
    Red,
    Green,
    Blue,
}

/// VESA Display Transfer Characteristic Data Block: a sampled gamma curve
/// of 8, 16 or 32 points, normalized to [0, 1] with an implicit final 1.0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VesaTransferCharacteristicsBlock {
    pub usage: TransferCharacteristicsUsage,
    pub points: Vec<f32>,
}

pub(super) fn parse_vesa_transfer_characteristics(
    ctx: &mut CtaCtx,
    data: &[u8],
) -> Option<VesaTransferCharacteristicsBlock> {
    if data.len() != 7 && data.len() != 15 && data.len() != 31 {
        ctx.fail(format!("Invalid length {}.", data.len()));
        return None;
    }

    let usage = match extract_bits(data[0], 7, 6) {
        0 => TransferCharacteristicsUsage::White,
        1 => TransferCharacteristicsUsage::Red,
        2 => TransferCharacteristicsUsage::Green,
        _ => TransferCharacteristicsUsage::Blue,
    };

    let mut points = Vec::with_capacity(data.len() + 1);
    points.push(extract_bits(data[0], 5, 0) as f32 / 1023.0);
    for &delta in &data[1..] {
        let prev = *points.last().unwrap();
        points.push(prev + delta as f32 / 1023.0);
    }
    points.push(1.0);

    Some(VesaTransferCharacteristicsBlock { usage, points })
}
