//! HDR10+ vendor-specific video data block decoding, OUI 90-84-8B

use serde::Serialize;

use crate::bits::extract_bits;
use crate::cta::CtaCtx;

const BLOCK_NAME: &str = "Vendor-Specific Video Data Block (HDR10+), OUI 90-84-8B";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Hdr10PlusBlock {
    pub version: u8,
    /// Peak luminance in cd/m², 0 when the index was reserved.
    pub peak_lum: u16,
    /// Full-frame peak luminance in cd/m², a fraction of `peak_lum`.
    pub ff_peak_lum: u16,
}

fn peak_lum_index_to_nits(index: u8) -> u16 {
    match index {
        1 => 200,
        2 => 300,
        3 => 400,
        4 => 500,
        5 => 600,
        6 => 800,
        7 => 1000,
        8 => 1200,
        9 => 1500,
        10 => 2000,
        11 => 2500,
        12 => 3000,
        13 => 4000,
        14 => 6000,
        15 => 8000,
        _ => 0,
    }
}

fn ff_peak_lum_index_to_nits(index: u8, peak_lum: u16) -> u16 {
    if peak_lum == 0 {
        return 0;
    }
    let mult = match index {
        0 => 0.1,
        1 => 0.2,
        2 => 0.4,
        3 => 0.8,
        _ => 0.0,
    };
    (peak_lum as f32 * mult).round() as u16
}

/// Payload starts after the OUI bytes.
pub(super) fn parse_hdr10plus_block(ctx: &mut CtaCtx, data: &[u8]) -> Option<Hdr10PlusBlock> {
    if data.is_empty() {
        ctx.fail(format!(
            "{BLOCK_NAME}: Empty Data Block with length {}.",
            data.len()
        ));
        return None;
    }

    let version = extract_bits(data[0], 1, 0);
    if version != 1 {
        ctx.fail(format!(
            "{BLOCK_NAME}: We were expecting application version 1, but got {version}.",
        ));
        return None;
    }

    // Index 0 is reserved; the 4-bit field cannot exceed 15.
    let peak_lum_index = extract_bits(data[0], 7, 4);
    if peak_lum_index == 0 {
        ctx.fail(format!("{BLOCK_NAME}: Peak luminance index 0 is reserved."));
    }
    let peak_lum = peak_lum_index_to_nits(peak_lum_index);

    let ff_peak_lum_index = extract_bits(data[0], 3, 2);
    let ff_peak_lum = ff_peak_lum_index_to_nits(ff_peak_lum_index, peak_lum);

    Some(Hdr10PlusBlock {
        version,
        peak_lum,
        ff_peak_lum,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::FailureLog;

    fn parse(data: &[u8]) -> (Option<Hdr10PlusBlock>, FailureLog) {
        let mut log = FailureLog::new();
        let mut ctx = CtaCtx {
            revision: 3,
            it_underscan: false,
            log: &mut log,
        };
        let block = parse_hdr10plus_block(&mut ctx, data);
        (block, log)
    }

    #[test]
    fn luminance_index_mapping() {
        // Index 7 (1000 nits), full frame index 3 (80%).
        let (block, log) = parse(&[0x7D]);
        assert!(log.is_empty());
        let block = block.unwrap();
        assert_eq!(block.version, 1);
        assert_eq!(block.peak_lum, 1000);
        assert_eq!(block.ff_peak_lum, 800);
    }

    #[test]
    fn reserved_peak_index() {
        let (block, log) = parse(&[0x01]);
        let block = block.unwrap();
        assert_eq!(block.peak_lum, 0);
        assert_eq!(block.ff_peak_lum, 0);
        assert_eq!(
            log.messages(),
            ["Vendor-Specific Video Data Block (HDR10+), OUI 90-84-8B: Peak luminance index 0 is reserved."]
        );
    }

    #[test]
    fn unknown_version_skipped() {
        let (block, log) = parse(&[0x72]);
        assert!(block.is_none());
        assert_eq!(log.messages().len(), 1);
    }
}
