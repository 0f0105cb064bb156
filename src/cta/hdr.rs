//! HDR Static Metadata and HDR Dynamic Metadata decoding

use serde::Serialize;

use crate::bits::{bit_is_set, extract_bits};
use crate::cta::CtaCtx;

/// Supported electro-optical transfer functions.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HdrStaticEotfs {
    pub traditional_sdr: bool,
    pub traditional_hdr: bool,
    pub pq: bool,
    pub hlg: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HdrStaticDescriptors {
    pub type1: bool,
}

/// HDR Static Metadata Data Block. Luminance values are in cd/m²; zero
/// means the sink did not provide the value.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct HdrStaticMetadataBlock {
    pub eotfs: HdrStaticEotfs,
    pub descriptors: HdrStaticDescriptors,
    pub desired_content_max_luminance: f32,
    pub desired_content_max_frame_avg_luminance: f32,
    pub desired_content_min_luminance: f32,
}

fn parse_max_luminance(raw: u8) -> f32 {
    if raw == 0 {
        return 0.0;
    }
    50.0 * (raw as f32 / 32.0).exp2()
}

fn parse_min_luminance(raw: u8, max: f32) -> f32 {
    if raw == 0 {
        return 0.0;
    }
    max * (raw as f32 / 255.0).powi(2) / 100.0
}

pub(super) fn parse_hdr_static_metadata_block(
    ctx: &mut CtaCtx,
    data: &[u8],
) -> Option<HdrStaticMetadataBlock> {
    if data.len() < 2 {
        ctx.fail(format!(
            "HDR Static Metadata Data Block: Empty Data Block with length {}.",
            data.len()
        ));
        return None;
    }

    let mut metadata = HdrStaticMetadataBlock {
        eotfs: HdrStaticEotfs {
            traditional_sdr: bit_is_set(data[0], 0),
            traditional_hdr: bit_is_set(data[0], 1),
            pq: bit_is_set(data[0], 2),
            hlg: bit_is_set(data[0], 3),
        },
        descriptors: HdrStaticDescriptors {
            type1: bit_is_set(data[1], 0),
        },
        ..Default::default()
    };

    if extract_bits(data[0], 7, 4) != 0 {
        ctx.fail_until(3, "HDR Static Metadata Data Block: Unknown EOTF.");
    }
    if extract_bits(data[1], 7, 1) != 0 {
        ctx.fail_until(3, "HDR Static Metadata Data Block: Unknown descriptor type.");
    }

    if data.len() > 2 {
        metadata.desired_content_max_luminance = parse_max_luminance(data[2]);
    }
    if data.len() > 3 {
        metadata.desired_content_max_frame_avg_luminance = parse_max_luminance(data[3]);
    }
    if data.len() > 4 {
        if metadata.desired_content_max_luminance == 0.0 {
            ctx.fail(
                "HDR Static Metadata Data Block: Desired content min luminance is set, but max luminance is unset.",
            );
        } else {
            metadata.desired_content_min_luminance =
                parse_min_luminance(data[4], metadata.desired_content_max_luminance);
        }
    }

    Some(metadata)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HdrDynamicMetadataType1 {
    pub type_1_hdr_metadata_version: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HdrDynamicMetadataType2 {
    pub ts_103_433_spec_version: u8,
    pub ts_103_433_1_capable: bool,
    pub ts_103_433_2_capable: bool,
    pub ts_103_433_3_capable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HdrDynamicMetadataType4 {
    pub type_4_hdr_metadata_version: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HdrDynamicMetadataType256 {
    pub graphics_overlay_flag_version: u8,
}

/// HDR Dynamic Metadata Data Block, one optional record per metadata type.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HdrDynamicMetadataBlock {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type1: Option<HdrDynamicMetadataType1>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type2: Option<HdrDynamicMetadataType2>,
    pub type3: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type4: Option<HdrDynamicMetadataType4>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type256: Option<HdrDynamicMetadataType256>,
}

pub(super) fn parse_hdr_dynamic_metadata_block(
    ctx: &mut CtaCtx,
    data: &[u8],
) -> Option<HdrDynamicMetadataBlock> {
    if data.len() < 3 {
        ctx.fail(format!(
            "HDR Dynamic Metadata Data Block: Empty Data Block with length {}.",
            data.len()
        ));
        return None;
    }

    let mut block = HdrDynamicMetadataBlock::default();

    let mut data = data;
    while data.len() >= 3 {
        let length = data[0] as usize;

        // A malformed record poisons the whole block, not just the rest
        // of the record chain.
        if data.len() < length + 1 {
            ctx.fail("HDR Dynamic Metadata Data Block: Length of type bigger than block size.");
            return None;
        }
        if length < 2 {
            ctx.fail("HDR Dynamic Metadata Data Block: Type has wrong length.");
            return None;
        }

        let metadata_type = (data[2] as u16) << 8 | data[1] as u16;
        match metadata_type {
            0x0001 => {
                if length < 3 {
                    ctx.fail("HDR Dynamic Metadata Data Block: Type 1 missing Support Flags.");
                } else {
                    if length != 3 {
                        ctx.fail("HDR Dynamic Metadata Data Block: Type 1 length must be 3.");
                    }
                    block.type1 = Some(HdrDynamicMetadataType1 {
                        type_1_hdr_metadata_version: extract_bits(data[3], 3, 0),
                    });
                    if extract_bits(data[3], 7, 4) != 0 {
                        ctx.fail(
                            "HDR Dynamic Metadata Data Block: Type 1 support flags bits 7-4 must be 0.",
                        );
                    }
                }
            }
            0x0002 => {
                if length < 3 {
                    ctx.fail("HDR Dynamic Metadata Data Block: Type 2 missing Support Flags.");
                } else {
                    if length != 3 {
                        ctx.fail("HDR Dynamic Metadata Data Block: Type 2 length must be 3.");
                    }
                    let spec_version = extract_bits(data[3], 3, 0);
                    if spec_version == 0 {
                        ctx.fail(
                            "HDR Dynamic Metadata Data Block: Type 2 spec version of 0 is not allowed.",
                        );
                    } else {
                        block.type2 = Some(HdrDynamicMetadataType2 {
                            ts_103_433_spec_version: spec_version,
                            ts_103_433_1_capable: bit_is_set(data[3], 4),
                            ts_103_433_2_capable: bit_is_set(data[3], 5),
                            ts_103_433_3_capable: bit_is_set(data[3], 6),
                        });
                        if bit_is_set(data[3], 7) {
                            ctx.fail(
                                "HDR Dynamic Metadata Data Block: Type 1 support flags bit 7 must be 0.",
                            );
                        }
                    }
                }
            }
            0x0003 => {
                if length != 2 {
                    ctx.fail("HDR Dynamic Metadata Data Block: Type 3 length must be 2.");
                }
                block.type3 = true;
            }
            0x0004 => {
                if length < 3 {
                    ctx.fail("HDR Dynamic Metadata Data Block: Type 4 missing Support Flags.");
                } else {
                    if length != 3 {
                        ctx.fail("HDR Dynamic Metadata Data Block: Type 4 length must be 3.");
                    }
                    block.type4 = Some(HdrDynamicMetadataType4 {
                        type_4_hdr_metadata_version: extract_bits(data[3], 3, 0),
                    });
                    if extract_bits(data[3], 7, 4) != 0 {
                        ctx.fail(
                            "HDR Dynamic Metadata Data Block: Type 4 support flags bits 7-4 must be 0.",
                        );
                    }
                }
            }
            0x0100 => {
                if length < 3 {
                    ctx.fail("HDR Dynamic Metadata Data Block: Type 256 missing Support Flags.");
                } else {
                    if length != 3 {
                        ctx.fail("HDR Dynamic Metadata Data Block: Type 256 length must be 3.");
                    }
                    block.type256 = Some(HdrDynamicMetadataType256 {
                        graphics_overlay_flag_version: extract_bits(data[3], 3, 0),
                    });
                    if extract_bits(data[3], 7, 4) != 0 {
                        ctx.fail(
                            "HDR Dynamic Metadata Data Block: Type 256 support flags bits 7-4 must be 0.",
                        );
                    }
                }
            }
            _ => {
                ctx.fail(format!(
                    "HDR Dynamic Metadata Data Block: Unknown Type 0x{metadata_type:04x}."
                ));
            }
        }

        data = &data[length + 1..];
    }

    Some(block)
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
    fn static_metadata_luminance_curves() {
        let mut log = FailureLog::new();
        let mut ctx = ctx(&mut log);
        // PQ + traditional SDR, type 1 descriptor, max 0x80, avg 0x40, min 0xFF.
        let block = parse_hdr_static_metadata_block(&mut ctx, &[0x05, 0x01, 0x80, 0x40, 0xFF])
            .unwrap();
        assert!(log.is_empty());
        assert!(block.eotfs.pq && block.eotfs.traditional_sdr);
        assert!(!block.eotfs.hlg);
        assert!(block.descriptors.type1);
        assert!((block.desired_content_max_luminance - 800.0).abs() < 0.5);
        assert!((block.desired_content_max_frame_avg_luminance - 200.0).abs() < 0.5);
        assert!((block.desired_content_min_luminance - 8.0).abs() < 0.05);
    }

    #[test]
    fn static_metadata_zero_raw_is_unset() {
        let mut log = FailureLog::new();
        let mut ctx = ctx(&mut log);
        let block = parse_hdr_static_metadata_block(&mut ctx, &[0x04, 0x01, 0x00, 0x00]).unwrap();
        assert!(log.is_empty());
        assert_eq!(block.desired_content_max_luminance, 0.0);
        assert_eq!(block.desired_content_max_frame_avg_luminance, 0.0);
    }

    #[test]
    fn static_metadata_min_without_max() {
        let mut log = FailureLog::new();
        let mut ctx = ctx(&mut log);
        let block = parse_hdr_static_metadata_block(&mut ctx, &[0x04, 0x01, 0x00, 0x00, 0x10])
            .unwrap();
        assert_eq!(block.desired_content_min_luminance, 0.0);
        assert_eq!(
            log.messages(),
            ["HDR Static Metadata Data Block: Desired content min luminance is set, but max luminance is unset."]
        );
    }

    #[test]
    fn dynamic_metadata_records() {
        let mut log = FailureLog::new();
        let mut ctx = ctx(&mut log);
        let data = [
            3, 0x01, 0x00, 0x02, // type 0x0001, version 2
            2, 0x03, 0x00, // type 0x0003
            3, 0x00, 0x01, 0x04, // type 0x0100, version 4
        ];
        let block = parse_hdr_dynamic_metadata_block(&mut ctx, &data).unwrap();
        assert!(log.is_empty());
        assert_eq!(
            block.type1,
            Some(HdrDynamicMetadataType1 {
                type_1_hdr_metadata_version: 2
            })
        );
        assert!(block.type3);
        assert_eq!(
            block.type256,
            Some(HdrDynamicMetadataType256 {
                graphics_overlay_flag_version: 4
            })
        );
        assert!(block.type2.is_none());
        assert!(block.type4.is_none());
    }

    #[test]
    fn dynamic_metadata_truncated_record_drops_block() {
        let mut log = FailureLog::new();
        let mut ctx = ctx(&mut log);
        let block = parse_hdr_dynamic_metadata_block(&mut ctx, &[9, 0x01, 0x00]);
        assert!(block.is_none());
        assert_eq!(
            log.messages(),
            ["HDR Dynamic Metadata Data Block: Length of type bigger than block size."]
        );
    }

    #[test]
    fn dynamic_metadata_short_record_drops_block() {
        let mut log = FailureLog::new();
        let mut ctx = ctx(&mut log);
        // Valid type 1 record first; the length-1 record still poisons
        // the whole block.
        let block =
            parse_hdr_dynamic_metadata_block(&mut ctx, &[3, 0x01, 0x00, 0x02, 1, 0x03, 0x00]);
        assert!(block.is_none());
        assert_eq!(
            log.messages(),
            ["HDR Dynamic Metadata Data Block: Type has wrong length."]
        );
    }
}
