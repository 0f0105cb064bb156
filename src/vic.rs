//! VIC and HDMI-VIC timing tables

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PictureAspectRatio {
    Ratio4x3,
    Ratio16x9,
}

/// One CTA-861 video format, keyed by VIC.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct VicTiming {
    pub vic: u8,
    pub h_active: u16,
    pub v_active: u16,
    pub h_blank: u16,
    pub v_blank: u16,
    pub pixel_clock_hz: u32,
    pub interlaced: bool,
    pub aspect_ratio: PictureAspectRatio,
}

/// One HDMI video format, keyed by HDMI-VIC. 8.2.3.1 section of the 1.4b HDMI spec.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HdmiVicTiming {
    pub vic: u8,
    pub h_active: u16,
    pub v_active: u16,
    pub pixel_clock_hz: u32,
    pub h_front: u16,
    pub h_sync: u16,
    pub h_back: u16,
    pub v_front: u16,
    pub v_sync: u16,
    pub v_back: u16,
}

use PictureAspectRatio::{Ratio4x3 as R43, Ratio16x9 as R169};

/// CEA-861 classic range (VIC 1-64). Higher VICs decode fine in SVDs, they
/// simply have no timing entry here.
const VIC_TIMINGS: [VicTiming; 64] = [
    VicTiming { vic: 1, h_active: 640, v_active: 480, h_blank: 160, v_blank: 45, pixel_clock_hz: 25_175_000, interlaced: false, aspect_ratio: R43 },
    VicTiming { vic: 2, h_active: 720, v_active: 480, h_blank: 138, v_blank: 45, pixel_clock_hz: 27_000_000, interlaced: false, aspect_ratio: R43 },
    VicTiming { vic: 3, h_active: 720, v_active: 480, h_blank: 138, v_blank: 45, pixel_clock_hz: 27_000_000, interlaced: false, aspect_ratio: R169 },
    VicTiming { vic: 4, h_active: 1280, v_active: 720, h_blank: 370, v_blank: 30, pixel_clock_hz: 74_250_000, interlaced: false, aspect_ratio: R169 },
    VicTiming { vic: 5, h_active: 1920, v_active: 540, h_blank: 280, v_blank: 22, pixel_clock_hz: 74_250_000, interlaced: true, aspect_ratio: R169 },
    VicTiming { vic: 6, h_active: 1440, v_active: 240, h_blank: 276, v_blank: 22, pixel_clock_hz: 27_000_000, interlaced: true, aspect_ratio: R43 },
    VicTiming { vic: 7, h_active: 1440, v_active: 240, h_blank: 276, v_blank: 22, pixel_clock_hz: 27_000_000, interlaced: true, aspect_ratio: R169 },
    VicTiming { vic: 8, h_active: 1440, v_active: 240, h_blank: 276, v_blank: 22, pixel_clock_hz: 27_000_000, interlaced: false, aspect_ratio: R43 },
    VicTiming { vic: 9, h_active: 1440, v_active: 240, h_blank: 276, v_blank: 22, pixel_clock_hz: 27_000_000, interlaced: false, aspect_ratio: R169 },
    VicTiming { vic: 10, h_active: 2880, v_active: 240, h_blank: 552, v_blank: 22, pixel_clock_hz: 54_000_000, interlaced: true, aspect_ratio: R43 },
    VicTiming { vic: 11, h_active: 2880, v_active: 240, h_blank: 552, v_blank: 22, pixel_clock_hz: 54_000_000, interlaced: true, aspect_ratio: R169 },
    VicTiming { vic: 12, h_active: 2880, v_active: 240, h_blank: 552, v_blank: 22, pixel_clock_hz: 54_000_000, interlaced: false, aspect_ratio: R43 },
    VicTiming { vic: 13, h_active: 2880, v_active: 240, h_blank: 552, v_blank: 22, pixel_clock_hz: 54_000_000, interlaced: false, aspect_ratio: R169 },
    VicTiming { vic: 14, h_active: 1440, v_active: 480, h_blank: 276, v_blank: 45, pixel_clock_hz: 54_000_000, interlaced: false, aspect_ratio: R43 },
    VicTiming { vic: 15, h_active: 1440, v_active: 480, h_blank: 276, v_blank: 45, pixel_clock_hz: 54_000_000, interlaced: false, aspect_ratio: R169 },
    VicTiming { vic: 16, h_active: 1920, v_active: 1080, h_blank: 280, v_blank: 45, pixel_clock_hz: 148_500_000, interlaced: false, aspect_ratio: R169 },
    VicTiming { vic: 17, h_active: 720, v_active: 576, h_blank: 144, v_blank: 49, pixel_clock_hz: 27_000_000, interlaced: false, aspect_ratio: R43 },
    VicTiming { vic: 18, h_active: 720, v_active: 576, h_blank: 144, v_blank: 49, pixel_clock_hz: 27_000_000, interlaced: false, aspect_ratio: R169 },
    VicTiming { vic: 19, h_active: 1280, v_active: 720, h_blank: 700, v_blank: 30, pixel_clock_hz: 74_250_000, interlaced: false, aspect_ratio: R169 },
    VicTiming { vic: 20, h_active: 1920, v_active: 540, h_blank: 720, v_blank: 22, pixel_clock_hz: 74_250_000, interlaced: true, aspect_ratio: R169 },
    VicTiming { vic: 21, h_active: 1440, v_active: 288, h_blank: 288, v_blank: 24, pixel_clock_hz: 27_000_000, interlaced: true, aspect_ratio: R43 },
    VicTiming { vic: 22, h_active: 1440, v_active: 288, h_blank: 288, v_blank: 24, pixel_clock_hz: 27_000_000, interlaced: true, aspect_ratio: R169 },
    VicTiming { vic: 23, h_active: 1440, v_active: 288, h_blank: 288, v_blank: 24, pixel_clock_hz: 27_000_000, interlaced: false, aspect_ratio: R43 },
    VicTiming { vic: 24, h_active: 1440, v_active: 288, h_blank: 288, v_blank: 24, pixel_clock_hz: 27_000_000, interlaced: false, aspect_ratio: R169 },
    VicTiming { vic: 25, h_active: 2880, v_active: 288, h_blank: 576, v_blank: 24, pixel_clock_hz: 54_000_000, interlaced: true, aspect_ratio: R43 },
    VicTiming { vic: 26, h_active: 2880, v_active: 288, h_blank: 576, v_blank: 24, pixel_clock_hz: 54_000_000, interlaced: true, aspect_ratio: R169 },
    VicTiming { vic: 27, h_active: 2880, v_active: 288, h_blank: 576, v_blank: 24, pixel_clock_hz: 54_000_000, interlaced: false, aspect_ratio: R43 },
    VicTiming { vic: 28, h_active: 2880, v_active: 288, h_blank: 576, v_blank: 24, pixel_clock_hz: 54_000_000, interlaced: false, aspect_ratio: R169 },
    VicTiming { vic: 29, h_active: 1440, v_active: 576, h_blank: 288, v_blank: 49, pixel_clock_hz: 54_000_000, interlaced: false, aspect_ratio: R43 },
    VicTiming { vic: 30, h_active: 1440, v_active: 576, h_blank: 288, v_blank: 49, pixel_clock_hz: 54_000_000, interlaced: false, aspect_ratio: R169 },
    VicTiming { vic: 31, h_active: 1920, v_active: 1080, h_blank: 720, v_blank: 45, pixel_clock_hz: 148_500_000, interlaced: false, aspect_ratio: R169 },
    VicTiming { vic: 32, h_active: 1920, v_active: 1080, h_blank: 830, v_blank: 45, pixel_clock_hz: 74_250_000, interlaced: false, aspect_ratio: R169 },
    VicTiming { vic: 33, h_active: 1920, v_active: 1080, h_blank: 720, v_blank: 45, pixel_clock_hz: 74_250_000, interlaced: false, aspect_ratio: R169 },
    VicTiming { vic: 34, h_active: 1920, v_active: 1080, h_blank: 280, v_blank: 45, pixel_clock_hz: 74_250_000, interlaced: false, aspect_ratio: R169 },
    VicTiming { vic: 35, h_active: 2880, v_active: 480, h_blank: 552, v_blank: 45, pixel_clock_hz: 108_000_000, interlaced: false, aspect_ratio: R43 },
    VicTiming { vic: 36, h_active: 2880, v_active: 480, h_blank: 552, v_blank: 45, pixel_clock_hz: 108_000_000, interlaced: false, aspect_ratio: R169 },
    VicTiming { vic: 37, h_active: 2880, v_active: 576, h_blank: 576, v_blank: 49, pixel_clock_hz: 108_000_000, interlaced: false, aspect_ratio: R43 },
    VicTiming { vic: 38, h_active: 2880, v_active: 576, h_blank: 576, v_blank: 49, pixel_clock_hz: 108_000_000, interlaced: false, aspect_ratio: R169 },
    VicTiming { vic: 39, h_active: 1920, v_active: 540, h_blank: 384, v_blank: 85, pixel_clock_hz: 72_000_000, interlaced: true, aspect_ratio: R169 },
    VicTiming { vic: 40, h_active: 1920, v_active: 540, h_blank: 720, v_blank: 22, pixel_clock_hz: 148_500_000, interlaced: true, aspect_ratio: R169 },
    VicTiming { vic: 41, h_active: 1280, v_active: 720, h_blank: 700, v_blank: 30, pixel_clock_hz: 148_500_000, interlaced: false, aspect_ratio: R169 },
    VicTiming { vic: 42, h_active: 720, v_active: 576, h_blank: 144, v_blank: 49, pixel_clock_hz: 54_000_000, interlaced: false, aspect_ratio: R43 },
    VicTiming { vic: 43, h_active: 720, v_active: 576, h_blank: 144, v_blank: 49, pixel_clock_hz: 54_000_000, interlaced: false, aspect_ratio: R169 },
    VicTiming { vic: 44, h_active: 1440, v_active: 288, h_blank: 288, v_blank: 24, pixel_clock_hz: 54_000_000, interlaced: true, aspect_ratio: R43 },
    VicTiming { vic: 45, h_active: 1440, v_active: 288, h_blank: 288, v_blank: 24, pixel_clock_hz: 54_000_000, interlaced: true, aspect_ratio: R169 },
    VicTiming { vic: 46, h_active: 1920, v_active: 540, h_blank: 280, v_blank: 22, pixel_clock_hz: 148_500_000, interlaced: true, aspect_ratio: R169 },
    VicTiming { vic: 47, h_active: 1280, v_active: 720, h_blank: 370, v_blank: 30, pixel_clock_hz: 148_500_000, interlaced: false, aspect_ratio: R169 },
    VicTiming { vic: 48, h_active: 720, v_active: 480, h_blank: 138, v_blank: 45, pixel_clock_hz: 54_000_000, interlaced: false, aspect_ratio: R43 },
    VicTiming { vic: 49, h_active: 720, v_active: 480, h_blank: 138, v_blank: 45, pixel_clock_hz: 54_000_000, interlaced: false, aspect_ratio: R169 },
    VicTiming { vic: 50, h_active: 1440, v_active: 240, h_blank: 276, v_blank: 22, pixel_clock_hz: 54_000_000, interlaced: true, aspect_ratio: R43 },
    VicTiming { vic: 51, h_active: 1440, v_active: 240, h_blank: 276, v_blank: 22, pixel_clock_hz: 54_000_000, interlaced: true, aspect_ratio: R169 },
    VicTiming { vic: 52, h_active: 720, v_active: 576, h_blank: 144, v_blank: 49, pixel_clock_hz: 108_000_000, interlaced: false, aspect_ratio: R43 },
    VicTiming { vic: 53, h_active: 720, v_active: 576, h_blank: 144, v_blank: 49, pixel_clock_hz: 108_000_000, interlaced: false, aspect_ratio: R169 },
    VicTiming { vic: 54, h_active: 1440, v_active: 288, h_blank: 288, v_blank: 24, pixel_clock_hz: 108_000_000, interlaced: true, aspect_ratio: R43 },
    VicTiming { vic: 55, h_active: 1440, v_active: 288, h_blank: 288, v_blank: 24, pixel_clock_hz: 108_000_000, interlaced: true, aspect_ratio: R169 },
    VicTiming { vic: 56, h_active: 720, v_active: 480, h_blank: 138, v_blank: 45, pixel_clock_hz: 108_000_000, interlaced: false, aspect_ratio: R43 },
    VicTiming { vic: 57, h_active: 720, v_active: 480, h_blank: 138, v_blank: 45, pixel_clock_hz: 108_000_000, interlaced: false, aspect_ratio: R169 },
    VicTiming { vic: 58, h_active: 1440, v_active: 240, h_blank: 276, v_blank: 22, pixel_clock_hz: 108_000_000, interlaced: true, aspect_ratio: R43 },
    VicTiming { vic: 59, h_active: 1440, v_active: 240, h_blank: 276, v_blank: 22, pixel_clock_hz: 108_000_000, interlaced: true, aspect_ratio: R169 },
    VicTiming { vic: 60, h_active: 1280, v_active: 720, h_blank: 2020, v_blank: 30, pixel_clock_hz: 59_400_000, interlaced: false, aspect_ratio: R169 },
    VicTiming { vic: 61, h_active: 1280, v_active: 720, h_blank: 2680, v_blank: 30, pixel_clock_hz: 74_250_000, interlaced: false, aspect_ratio: R169 },
    VicTiming { vic: 62, h_active: 1280, v_active: 720, h_blank: 2020, v_blank: 30, pixel_clock_hz: 74_250_000, interlaced: false, aspect_ratio: R169 },
    VicTiming { vic: 63, h_active: 1920, v_active: 1080, h_blank: 280, v_blank: 45, pixel_clock_hz: 297_000_000, interlaced: false, aspect_ratio: R169 },
    VicTiming { vic: 64, h_active: 1920, v_active: 1080, h_blank: 720, v_blank: 45, pixel_clock_hz: 297_000_000, interlaced: false, aspect_ratio: R169 },
];

const HDMI_VIC_TIMINGS: [HdmiVicTiming; 4] = [
    HdmiVicTiming {
        vic: 1,
        h_active: 3840,
        v_active: 2160,
        pixel_clock_hz: 297_000_000,
        h_front: 176,
        h_sync: 88,
        h_back: 296,
        v_front: 8,
        v_sync: 10,
        v_back: 72,
    },
    HdmiVicTiming {
        vic: 2,
        h_active: 3840,
        v_active: 2160,
        pixel_clock_hz: 297_000_000,
        h_front: 1056,
        h_sync: 88,
        h_back: 296,
        v_front: 8,
        v_sync: 10,
        v_back: 72,
    },
    HdmiVicTiming {
        vic: 3,
        h_active: 3840,
        v_active: 2160,
        pixel_clock_hz: 297_000_000,
        h_front: 1276,
        h_sync: 88,
        h_back: 296,
        v_front: 8,
        v_sync: 10,
        v_back: 72,
    },
    HdmiVicTiming {
        vic: 4,
        h_active: 4096,
        v_active: 2160,
        pixel_clock_hz: 297_000_000,
        h_front: 1020,
        h_sync: 88,
        h_back: 296,
        v_front: 8,
        v_sync: 10,
        v_back: 72,
    },
];

/// Look up the timing parameters for a VIC. Un-tabulated codes return `None`.
pub fn vic_timing(vic: u8) -> Option<&'static VicTiming> {
    if vic == 0 || vic as usize > VIC_TIMINGS.len() {
        return None;
    }
    Some(&VIC_TIMINGS[vic as usize - 1])
}

/// Look up the timing parameters for an HDMI-VIC.
pub fn hdmi_vic_timing(hdmi_vic: u8) -> Option<&'static HdmiVicTiming> {
    HDMI_VIC_TIMINGS.iter().find(|t| t.vic == hdmi_vic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vic_table_bounds() {
        assert!(vic_timing(0).is_none());
        assert!(vic_timing(65).is_none());
        assert!(vic_timing(255).is_none());
    }

    #[test]
    fn vic_entries_keyed_correctly() {
        for vic in 1..=64u8 {
            assert_eq!(vic_timing(vic).unwrap().vic, vic);
        }
    }

    #[test]
    fn vic_16_is_1080p60() {
        let t = vic_timing(16).unwrap();
        assert_eq!((t.h_active, t.v_active), (1920, 1080));
        assert_eq!(t.pixel_clock_hz, 148_500_000);
        assert!(!t.interlaced);
    }

    #[test]
    fn hdmi_vic_4_is_4096_wide() {
        let t = hdmi_vic_timing(4).unwrap();
        assert_eq!(t.h_active, 4096);
        assert_eq!(t.h_front, 1020);
        assert!(hdmi_vic_timing(5).is_none());
        assert!(hdmi_vic_timing(0).is_none());
    }
}
