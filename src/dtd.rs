//! 18-byte EDID detailed timing definition decoding

use serde::Serialize;

use crate::bits::{bit_is_set, extract_bits};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StereoMode {
    None,
    FieldSequentialRight,
    FieldSequentialLeft,
    TwoWayInterleavedRight,
    TwoWayInterleavedLeft,
    FourWayInterleaved,
    SideBySideInterleaved,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum SyncSignal {
    Analog {
        bipolar: bool,
        serrations: bool,
        sync_on_rgb: bool,
    },
    DigitalComposite {
        serrations: bool,
        hsync_positive: bool,
    },
    DigitalSeparate {
        vsync_positive: bool,
        hsync_positive: bool,
    },
}

/// One decoded detailed timing definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailedTimingDef {
    pub pixel_clock_hz: u32,
    pub h_active: u16,
    pub h_blank: u16,
    pub h_front_porch: u16,
    pub h_sync_pulse: u16,
    pub v_active: u16,
    pub v_blank: u16,
    pub v_front_porch: u16,
    pub v_sync_pulse: u16,
    pub h_image_mm: u16,
    pub v_image_mm: u16,
    pub h_border: u8,
    pub v_border: u8,
    pub interlaced: bool,
    pub stereo: StereoMode,
    pub sync: SyncSignal,
}

/// Decode one 18-byte detailed timing definition.
///
/// The caller is responsible for the terminator convention: a descriptor
/// whose first two bytes are both zero is not a timing at all.
pub fn parse_dtd(data: &[u8; 18]) -> DetailedTimingDef {
    let features = data[17];

    // Stereo bits 6:5 select the mode, bit 0 picks the variant; 00x is none.
    let stereo = match (extract_bits(features, 6, 5), bit_is_set(features, 0)) {
        (0, _) => StereoMode::None,
        (1, false) => StereoMode::FieldSequentialRight,
        (2, false) => StereoMode::FieldSequentialLeft,
        (1, true) => StereoMode::TwoWayInterleavedRight,
        (2, true) => StereoMode::TwoWayInterleavedLeft,
        (3, false) => StereoMode::FourWayInterleaved,
        (3, true) => StereoMode::SideBySideInterleaved,
        _ => unreachable!(),
    };

    let sync = if bit_is_set(features, 4) {
        if bit_is_set(features, 3) {
            SyncSignal::DigitalSeparate {
                vsync_positive: bit_is_set(features, 2),
                hsync_positive: bit_is_set(features, 1),
            }
        } else {
            SyncSignal::DigitalComposite {
                serrations: bit_is_set(features, 2),
                hsync_positive: bit_is_set(features, 1),
            }
        }
    } else {
        SyncSignal::Analog {
            bipolar: bit_is_set(features, 3),
            serrations: bit_is_set(features, 2),
            sync_on_rgb: bit_is_set(features, 1),
        }
    };

    DetailedTimingDef {
        pixel_clock_hz: u16::from_le_bytes([data[0], data[1]]) as u32 * 10_000,
        h_active: data[2] as u16 | (extract_bits(data[4], 7, 4) as u16) << 8,
        h_blank: data[3] as u16 | (extract_bits(data[4], 3, 0) as u16) << 8,
        v_active: data[5] as u16 | (extract_bits(data[7], 7, 4) as u16) << 8,
        v_blank: data[6] as u16 | (extract_bits(data[7], 3, 0) as u16) << 8,
        h_front_porch: data[8] as u16 | (extract_bits(data[11], 7, 6) as u16) << 8,
        h_sync_pulse: data[9] as u16 | (extract_bits(data[11], 5, 4) as u16) << 8,
        v_front_porch: extract_bits(data[10], 7, 4) as u16
            | (extract_bits(data[11], 3, 2) as u16) << 4,
        v_sync_pulse: extract_bits(data[10], 3, 0) as u16
            | (extract_bits(data[11], 1, 0) as u16) << 4,
        h_image_mm: data[12] as u16 | (extract_bits(data[14], 7, 4) as u16) << 8,
        v_image_mm: data[13] as u16 | (extract_bits(data[14], 3, 0) as u16) << 8,
        h_border: data[15],
        v_border: data[16],
        interlaced: bit_is_set(features, 7),
        stereo,
        sync,
    }
}
