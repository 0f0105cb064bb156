//! Decoder for EDID extension blocks and DisplayID v2 sections.
//!
//! Input is either a full EDID blob (base block plus 128-byte extension
//! blocks) or a standalone DisplayID v2 section. Each section decodes to a
//! typed structure plus a [`diag::FailureLog`] of conformance failures;
//! only uninterpretable geometry (bad sizes, offsets, checksums) is a hard
//! error.

use anyhow::{bail, Result};

pub mod bits;
pub mod constants;
pub mod cta;
pub mod diag;
pub mod displayid2;
pub mod dtd;
pub mod report;
pub mod vic;

pub use cta::{parse_cta_section, CtaSection, DataBlock};
pub use diag::FailureLog;
pub use displayid2::{parse_displayid2_section, DisplayId2Section};
pub use report::{DecodedSection, Reporter, SectionData};

const EDID_BLOCK_SIZE: usize = 128;
const EDID_MAGIC: [u8; 8] = [0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00];

/// EDID extension tag carrying an embedded DisplayID section.
const EDID_EXT_TAG_DISPLAYID: u8 = 0x70;

fn decode_extension(index: usize, chunk: &[u8]) -> Result<DecodedSection> {
    let mut log = FailureLog::new();
    match chunk[0] {
        constants::CTA_TAG => Ok(DecodedSection {
            label: format!("Block {index} (CTA-861 Extension Block)"),
            data: SectionData::Cta861(parse_cta_section(chunk, &mut log)?),
            failures: log,
        }),
        // The embedded section starts right after the extension tag; its
        // own length byte bounds it within the 127 remaining bytes.
        EDID_EXT_TAG_DISPLAYID => Ok(DecodedSection {
            label: format!("Block {index} (DisplayID Extension Block)"),
            data: SectionData::DisplayIdV2(parse_displayid2_section(&chunk[1..], &mut log)?),
            failures: log,
        }),
        tag => Ok(DecodedSection {
            label: format!("Block {index} (Unknown Extension Block)"),
            data: SectionData::Unsupported { tag },
            failures: log,
        }),
    }
}

/// Decode an EDID blob or a standalone DisplayID v2 section into its
/// sections. The EDID base block is identified by its magic and skipped;
/// base-block fields are out of scope here.
pub fn decode_blob(data: &[u8]) -> Result<Vec<DecodedSection>> {
    if data.len() >= EDID_BLOCK_SIZE && data[..8] == EDID_MAGIC {
        if data.len() % EDID_BLOCK_SIZE != 0 {
            bail!(
                "EDID blob size {} is not a multiple of {EDID_BLOCK_SIZE}",
                data.len()
            );
        }
        return data
            .chunks_exact(EDID_BLOCK_SIZE)
            .enumerate()
            .skip(1)
            .map(|(index, chunk)| decode_extension(index, chunk))
            .collect();
    }

    if data.len() == EDID_BLOCK_SIZE && data[0] == constants::CTA_TAG {
        return Ok(vec![decode_extension(1, data)?]);
    }

    if data.len() >= constants::DISPLAYID2_MIN_SIZE
        && bits::extract_bits(data[0], 7, 4) == 2
    {
        let mut log = FailureLog::new();
        let section = parse_displayid2_section(data, &mut log)?;
        return Ok(vec![DecodedSection {
            label: "DisplayID Section".to_string(),
            data: SectionData::DisplayIdV2(section),
            failures: log,
        }]);
    }

    bail!("unrecognized input: neither an EDID blob nor a DisplayID v2 section");
}
