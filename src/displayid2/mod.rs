//! DisplayID v2 section parsing
//!
//! A DisplayID v2 section is self-describing: a 4-byte header (version
//! nibble, payload length, primary use case, extension count), a stream of
//! (tag, revision, size) data blocks, zero filler and a byte-sum checksum.
//! Unlike the CTA side, a bad checksum makes the whole section
//! uninterpretable and is a hard error.

use anyhow::{ensure, Result};
use serde::Serialize;

use crate::bits::extract_bits;
use crate::constants::{
    DISPLAYID2_DATA_BLOCK_HEADER_SIZE, DISPLAYID2_HEADER_SIZE, DISPLAYID2_MAX_SIZE,
    DISPLAYID2_MIN_SIZE,
};
use crate::diag::FailureLog;

/// Intended primary use of the display, from byte 2 of the section header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PrimaryUseCase {
    /// Section is an extension of another section; never a use case itself.
    Extension,
    Test,
    Generic,
    Television,
    DesktopProductivity,
    DesktopGaming,
    Presentation,
    HeadMountedVr,
    HeadMountedAr,
    /// Reserved value, carried through as-is.
    Unknown(u8),
}

impl PrimaryUseCase {
    fn from_byte(raw: u8) -> Option<Self> {
        match raw {
            0x00 => Some(Self::Extension),
            0x01 => Some(Self::Test),
            0x02 => Some(Self::Generic),
            0x03 => Some(Self::Television),
            0x04 => Some(Self::DesktopProductivity),
            0x05 => Some(Self::DesktopGaming),
            0x06 => Some(Self::Presentation),
            0x07 => Some(Self::HeadMountedVr),
            0x08 => Some(Self::HeadMountedAr),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DisplayId2BlockTag {
    ProductId,
    DisplayParams,
    TypeViiTiming,
    TypeViiiTiming,
    TypeIxTiming,
    DynamicTimingRangeLimits,
    DisplayInterfaceFeatures,
    StereoDisplayInterface,
    TiledDisplayTopology,
    ContainerId,
    TypeXTiming,
    AdaptiveSync,
    ArVrHmd,
    ArVrLayer,
    Cta861,
}

impl DisplayId2BlockTag {
    fn from_byte(raw: u8) -> Option<Self> {
        match raw {
            0x20 => Some(Self::ProductId),
            0x21 => Some(Self::DisplayParams),
            0x22 => Some(Self::TypeViiTiming),
            0x23 => Some(Self::TypeViiiTiming),
            0x24 => Some(Self::TypeIxTiming),
            0x25 => Some(Self::DynamicTimingRangeLimits),
            0x26 => Some(Self::DisplayInterfaceFeatures),
            0x27 => Some(Self::StereoDisplayInterface),
            0x28 => Some(Self::TiledDisplayTopology),
            0x29 => Some(Self::ContainerId),
            0x2A => Some(Self::TypeXTiming),
            0x2B => Some(Self::AdaptiveSync),
            0x2C => Some(Self::ArVrHmd),
            0x2D => Some(Self::ArVrLayer),
            0x81 => Some(Self::Cta861),
            _ => None,
        }
    }
}

/// One recognized DisplayID v2 data block, payload carried raw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayId2DataBlock {
    pub tag: DisplayId2BlockTag,
    pub revision: u8,
    pub payload: Vec<u8>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct DisplayId2Section {
    pub revision: u8,
    pub primary_use_case: Option<PrimaryUseCase>,
    pub data_blocks: Vec<DisplayId2DataBlock>,
}

fn is_all_zeroes(data: &[u8]) -> bool {
    data.iter().all(|&b| b == 0)
}

fn is_data_block_end(data: &[u8]) -> bool {
    if data.len() < DISPLAYID2_DATA_BLOCK_HEADER_SIZE {
        return true;
    }
    is_all_zeroes(&data[..DISPLAYID2_DATA_BLOCK_HEADER_SIZE])
}

/// Decode one data block header, returning the number of bytes consumed.
fn parse_data_block(
    section: &mut DisplayId2Section,
    log: &mut FailureLog,
    data: &[u8],
) -> usize {
    debug_assert!(data.len() >= DISPLAYID2_DATA_BLOCK_HEADER_SIZE);

    let tag = data[0];
    let block_size = data[2] as usize + DISPLAYID2_DATA_BLOCK_HEADER_SIZE;
    if block_size > data.len() {
        log.add(format!(
            "The length of this DisplayID data block ({block_size}) exceeds \
             the number of bytes remaining ({})",
            data.len()
        ));
        return block_size;
    }

    match DisplayId2BlockTag::from_byte(tag) {
        Some(tag) => {
            section.data_blocks.push(DisplayId2DataBlock {
                tag,
                revision: extract_bits(data[1], 2, 0),
                payload: data[DISPLAYID2_DATA_BLOCK_HEADER_SIZE..block_size].to_vec(),
            });
        }
        // Vendor-specific blocks are skipped without a diagnostic.
        None if tag == 0x7E => {}
        None => {
            log.add(format!(
                "Unknown DisplayID v2 Data Block (0x{tag:x}, length {})",
                block_size - DISPLAYID2_DATA_BLOCK_HEADER_SIZE
            ));
        }
    }

    block_size
}

/// Parse one DisplayID v2 section. Spec violations inside the data-block
/// area are recorded in `log`; bad header geometry or checksum fails.
pub fn parse_displayid2_section(data: &[u8], log: &mut FailureLog) -> Result<DisplayId2Section> {
    ensure!(
        data.len() >= DISPLAYID2_MIN_SIZE,
        "DisplayID section must be at least {DISPLAYID2_MIN_SIZE} bytes, got {}",
        data.len()
    );

    let version = extract_bits(data[0], 7, 4);
    ensure!(version == 2, "unsupported DisplayID version {version}");

    let mut section = DisplayId2Section {
        revision: extract_bits(data[0], 3, 0),
        ..Default::default()
    };

    let section_size = data[1] as usize + DISPLAYID2_MIN_SIZE;
    ensure!(
        section_size <= DISPLAYID2_MAX_SIZE && section_size <= data.len(),
        "invalid DisplayID section size {section_size}"
    );

    let sum = data[..section_size]
        .iter()
        .fold(0u8, |sum, &b| sum.wrapping_add(b));
    ensure!(sum == 0, "invalid DisplayID section checksum");

    let use_case = data[2];
    section.primary_use_case = PrimaryUseCase::from_byte(use_case);
    if section.primary_use_case.is_none() {
        log.add(format!(
            "Unknown DisplayID primary use case 0x{use_case:02x}."
        ));
        section.primary_use_case = Some(PrimaryUseCase::Unknown(use_case));
    }

    // The last byte of the section is the checksum; blocks never reach it.
    let mut i = DISPLAYID2_HEADER_SIZE;
    let mut remaining = 0;
    while i < section_size - 1 {
        remaining = section_size - 1 - i;
        if is_data_block_end(&data[i..section_size - 1]) {
            break;
        }
        i += parse_data_block(&mut section, log, &data[i..section_size - 1]);
    }

    let filler = &data[i.min(section_size - 1)..section_size - 1];
    if !is_all_zeroes(filler) {
        if remaining < DISPLAYID2_DATA_BLOCK_HEADER_SIZE {
            log.add(format!(
                "Not enough bytes remain ({remaining}) for a DisplayID data \
                 block and the DisplayID filler is non-0."
            ));
        } else {
            log.add("Padding: Contains non-zero bytes.");
        }
    }

    Ok(section)
}
