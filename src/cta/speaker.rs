//! Speaker Allocation, Speaker Location and Room Configuration decoding

use serde::Serialize;

use crate::bits::{bit_is_set, extract_bits};
use crate::constants::CTA_MAX_SPEAKER_LOCATION_ENTRIES;
use crate::cta::CtaCtx;

/// Speaker presence flags, one per CTA-861 speaker pair/position.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpeakerAllocation {
    pub flw_frw: bool,
    pub flc_frc: bool,
    pub bc: bool,
    pub bl_br: bool,
    pub fc: bool,
    pub lfe1: bool,
    pub fl_fr: bool,
    pub tpsil_tpsir: bool,
    pub sil_sir: bool,
    pub tpbc: bool,
    pub lfe2: bool,
    pub ls_rs: bool,
    pub tpfc: bool,
    pub tpc: bool,
    pub tpfl_tpfr: bool,
    pub btfl_btfr: bool,
    pub btfc: bool,
    pub tpbl_tpbr: bool,
}

pub(super) fn parse_speaker_alloc(
    ctx: &mut CtaCtx,
    data: &[u8],
    prefix: &str,
) -> SpeakerAllocation {
    let mut speakers = SpeakerAllocation {
        flw_frw: bit_is_set(data[0], 7),
        flc_frc: bit_is_set(data[0], 5),
        bc: bit_is_set(data[0], 4),
        bl_br: bit_is_set(data[0], 3),
        fc: bit_is_set(data[0], 2),
        lfe1: bit_is_set(data[0], 1),
        fl_fr: bit_is_set(data[0], 0),
        tpsil_tpsir: bit_is_set(data[1], 7),
        sil_sir: bit_is_set(data[1], 6),
        tpbc: bit_is_set(data[1], 5),
        lfe2: bit_is_set(data[1], 4),
        ls_rs: bit_is_set(data[1], 3),
        tpfc: bit_is_set(data[1], 2),
        tpc: bit_is_set(data[1], 1),
        tpfl_tpfr: bit_is_set(data[1], 0),
        btfl_btfr: bit_is_set(data[2], 2),
        btfc: bit_is_set(data[2], 1),
        tpbl_tpbr: bit_is_set(data[2], 0),
    };

    // Bit F16 used to mean RLC/RRC. Pre-revision-3 sources still set it, so
    // it is folded into BL/BR there; revision 3+ forbids it outright.
    if bit_is_set(data[0], 6) {
        if ctx.revision >= 3 {
            ctx.fail(format!("{prefix}: Deprecated bit F16 must be 0."));
        } else {
            speakers.bl_br = true;
        }
    }

    if extract_bits(data[2], 7, 4) != 0 {
        ctx.fail(format!("{prefix}: Bits F37, F36, F34 must be 0."));
    }
    if ctx.revision >= 3 && bit_is_set(data[2], 3) {
        ctx.fail(format!("{prefix}: Deprecated bit F33 must be 0."));
    }

    speakers
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpeakerAllocBlock {
    pub speakers: SpeakerAllocation,
}

pub(super) fn parse_speaker_alloc_block(ctx: &mut CtaCtx, data: &[u8]) -> Option<SpeakerAllocBlock> {
    if data.len() < 3 {
        ctx.fail(format!(
            "Speaker Allocation Data Block: Empty Data Block with length {}.",
            data.len()
        ));
        return None;
    }

    Some(SpeakerAllocBlock {
        speakers: parse_speaker_alloc(ctx, data, "Speaker Allocation Data Block"),
    })
}

/// Signed 2.6 fixed-point coordinate, in fractions of the room maximum.
pub(super) fn decode_coord(raw: u8) -> f64 {
    (raw as i8) as f64 / 64.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpeakerLocation {
    pub is_active: bool,
    pub channel_index: u8,
    pub speaker_id: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coords: Option<(f64, f64, f64)>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct SpeakerLocationBlock {
    pub locations: Vec<SpeakerLocation>,
}

pub(super) fn parse_speaker_location_block(
    ctx: &mut CtaCtx,
    data: &[u8],
) -> Option<SpeakerLocationBlock> {
    if data.len() < 2 {
        ctx.fail(format!(
            "Speaker Location Data Block: Empty Data Block with length {}.",
            data.len()
        ));
        return None;
    }

    let mut locations = Vec::new();
    let mut data = data;
    while data.len() >= 2 {
        let has_coords = bit_is_set(data[0], 6);
        let is_active = bit_is_set(data[0], 5);
        let channel_index = extract_bits(data[0], 4, 0);
        let speaker_id = extract_bits(data[1], 4, 0);

        if bit_is_set(data[0], 7) || extract_bits(data[1], 7, 5) != 0 {
            ctx.fail("Speaker Location Data Block: Bits F27-F25, F17 must be 0.");
        }

        let coords = if has_coords && data.len() >= 5 {
            let coords = (
                decode_coord(data[2]),
                decode_coord(data[3]),
                decode_coord(data[4]),
            );
            data = &data[5..];
            Some(coords)
        } else if has_coords {
            ctx.fail("Speaker Location Data Block: COORD bit set but contains no Coordinates.");
            return None;
        } else {
            data = &data[2..];
            None
        };

        debug_assert!(locations.len() < CTA_MAX_SPEAKER_LOCATION_ENTRIES);
        locations.push(SpeakerLocation {
            is_active,
            channel_index,
            speaker_id,
            coords,
        });
    }

    Some(SpeakerLocationBlock { locations })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RoomConfigBlock {
    pub has_speaker_location_descriptors: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker_count: Option<u8>,
    pub speakers: SpeakerAllocation,
    pub max_x: u8,
    pub max_y: u8,
    pub max_z: u8,
    pub display_x: f64,
    pub display_y: f64,
    pub display_z: f64,
}

pub(super) fn parse_room_config_block(ctx: &mut CtaCtx, data: &[u8]) -> Option<RoomConfigBlock> {
    if data.len() < 4 {
        ctx.fail(format!(
            "Room Configuration Data Block: Empty Data Block with length {}.",
            data.len()
        ));
        return None;
    }

    let has_display_coords = bit_is_set(data[0], 7);
    let has_speaker_count = bit_is_set(data[0], 6);
    let has_speaker_location_descriptors = bit_is_set(data[0], 5);

    let speaker_count = if has_speaker_count {
        Some(extract_bits(data[0], 4, 0) + 1)
    } else {
        if extract_bits(data[0], 4, 0) != 0 {
            ctx.fail(
                "Room Configuration Data Block: 'Speaker' flag is 0, but the Speaker Count is not 0.",
            );
        }
        if has_speaker_location_descriptors {
            ctx.fail(
                "Room Configuration Data Block: 'Speaker' flag is 0, but there are Speaker Location Descriptors.",
            );
        }
        None
    };

    let speakers = parse_speaker_alloc(ctx, &data[1..], "Room Configuration Data Block");

    let mut rc = RoomConfigBlock {
        has_speaker_location_descriptors,
        speaker_count,
        speakers,
        max_x: 16,
        max_y: 16,
        max_z: 8,
        display_x: 0.0,
        display_y: 1.0,
        display_z: 0.0,
    };

    if data.len() < 7 {
        if has_display_coords {
            ctx.fail(
                "Room Configuration Data Block: 'Display' flag is 1, but the Display and Maximum coordinates are not present.",
            );
        }
        return Some(rc);
    }

    rc.max_x = data[4];
    rc.max_y = data[5];
    rc.max_z = data[6];

    if data.len() < 10 {
        if has_display_coords {
            ctx.fail(
                "Room Configuration Data Block: 'Display' flag is 1, but the Display coordinates are not present.",
            );
        }
        return Some(rc);
    }

    rc.display_x = decode_coord(data[7]);
    rc.display_y = decode_coord(data[8]);
    rc.display_z = decode_coord(data[9]);

    Some(rc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::FailureLog;

    fn parse_alloc(data: &[u8], revision: u8) -> (Option<SpeakerAllocBlock>, FailureLog) {
        let mut log = FailureLog::new();
        let mut ctx = CtaCtx {
            revision,
            it_underscan: false,
            log: &mut log,
        };
        let block = parse_speaker_alloc_block(&mut ctx, data);
        (block, log)
    }

    #[test]
    fn deprecated_rlc_rrc_remapped_below_revision_3() {
        let (block, log) = parse_alloc(&[0x40, 0x00, 0x00], 2);
        assert!(log.is_empty());
        assert!(block.unwrap().speakers.bl_br);
    }

    #[test]
    fn deprecated_rlc_rrc_rejected_at_revision_3() {
        let (block, log) = parse_alloc(&[0x40, 0x00, 0x00], 3);
        assert!(!block.unwrap().speakers.bl_br);
        assert_eq!(
            log.messages(),
            ["Speaker Allocation Data Block: Deprecated bit F16 must be 0."]
        );
    }

    #[test]
    fn short_block_dropped() {
        let (block, log) = parse_alloc(&[0x01], 3);
        assert!(block.is_none());
        assert_eq!(log.messages().len(), 1);
    }

    #[test]
    fn coord_decoding() {
        assert_eq!(decode_coord(0), 0.0);
        assert_eq!(decode_coord(64), 1.0);
        assert_eq!(decode_coord(0xC0), -1.0);
        assert_eq!(decode_coord(32), 0.5);
    }

    #[test]
    fn speaker_locations_with_and_without_coords() {
        let mut log = FailureLog::new();
        let mut ctx = CtaCtx {
            revision: 3,
            it_underscan: false,
            log: &mut log,
        };
        // One descriptor with coordinates, one without.
        let data = [0x61, 0x02, 64, 0, 0xC0, 0x22, 0x05];
        let block = parse_speaker_location_block(&mut ctx, &data).unwrap();
        assert!(log.is_empty());
        assert_eq!(block.locations.len(), 2);
        assert_eq!(block.locations[0].channel_index, 1);
        assert_eq!(block.locations[0].coords, Some((1.0, 0.0, -1.0)));
        assert!(block.locations[0].is_active);
        assert_eq!(block.locations[1].channel_index, 2);
        assert_eq!(block.locations[1].speaker_id, 5);
        assert_eq!(block.locations[1].coords, None);
    }

    #[test]
    fn room_config_defaults_without_coords() {
        let mut log = FailureLog::new();
        let mut ctx = CtaCtx {
            revision: 3,
            it_underscan: false,
            log: &mut log,
        };
        let rc = parse_room_config_block(&mut ctx, &[0x41, 0x01, 0x00, 0x00]).unwrap();
        assert!(log.is_empty());
        assert_eq!(rc.speaker_count, Some(2));
        assert!(rc.speakers.fl_fr);
        assert_eq!((rc.max_x, rc.max_y, rc.max_z), (16, 16, 8));
        assert_eq!((rc.display_x, rc.display_y, rc.display_z), (0.0, 1.0, 0.0));
    }
}
