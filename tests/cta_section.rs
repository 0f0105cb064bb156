//! End-to-end tests over constructed 128-byte CTA-861 extension blocks.

use edid_inspector::cta::dolby::{DolbyColorimetry, DolbyVideoBlock};
use edid_inspector::cta::parse_cta_section;
use edid_inspector::diag::FailureLog;

/// Build a 128-byte revision-3 extension block from raw data blocks and
/// detailed timing definitions.
fn section_with(blocks: &[Vec<u8>], dtds: &[[u8; 18]]) -> [u8; 128] {
    let mut buf = [0u8; 128];
    buf[0] = 0x02;
    buf[1] = 0x03;

    let mut i = 4;
    for block in blocks {
        buf[i..i + block.len()].copy_from_slice(block);
        i += block.len();
    }
    buf[2] = i as u8;
    for dtd in dtds {
        buf[i..i + 18].copy_from_slice(dtd);
        i += 18;
    }
    buf
}

fn block(tag: u8, payload: &[u8]) -> Vec<u8> {
    assert!(payload.len() < 32);
    let mut out = vec![tag << 5 | payload.len() as u8];
    out.extend_from_slice(payload);
    out
}

fn extended(ext_tag: u8, payload: &[u8]) -> Vec<u8> {
    let mut body = vec![ext_tag];
    body.extend_from_slice(payload);
    block(7, &body)
}

/// 1920x1080p at 148.5 MHz.
const DTD_1080P: [u8; 18] = [
    0x02, 0x3A, 0x80, 0x18, 0x71, 0x38, 0x2D, 0x40, 0x58, 0x2C, 0x45, 0x00, 0xE0, 0x0E, 0x11,
    0x00, 0x00, 0x1E,
];

fn parse(buf: &[u8; 128]) -> (edid_inspector::CtaSection, FailureLog) {
    let mut log = FailureLog::new();
    let section = parse_cta_section(buf, &mut log).unwrap();
    (section, log)
}

#[test]
fn zero_dtd_offset_is_an_empty_success() {
    let mut buf = section_with(&[], &[]);
    buf[2] = 0;
    let (section, log) = parse(&buf);
    assert!(log.is_empty());
    assert!(section.data_blocks.is_empty());
    assert!(section.detailed_timing_defs.is_empty());
}

#[test]
fn svd_vic_and_native_flag_decoding() {
    let buf = section_with(&[block(2, &[1, 129, 16])], &[]);
    let (section, log) = parse(&buf);
    assert!(log.is_empty());
    assert_eq!(section.data_blocks.len(), 1);

    let video = section.data_blocks[0].as_video().unwrap();
    assert_eq!(video.svds.len(), 3);
    assert_eq!((video.svds[0].vic, video.svds[0].native), (1, false));
    assert_eq!((video.svds[1].vic, video.svds[1].native), (1, true));
    assert_eq!((video.svds[2].vic, video.svds[2].native), (16, false));
}

#[test]
fn reserved_vic_bytes_are_dropped_with_one_diagnostic_each() {
    let buf = section_with(&[block(2, &[0, 128, 254, 255, 16])], &[]);
    let (section, log) = parse(&buf);

    let video = section.data_blocks[0].as_video().unwrap();
    assert_eq!(video.svds.len(), 1);
    assert_eq!(video.svds[0].vic, 16);
    assert_eq!(
        log.messages(),
        [
            "Video Data Block: Unknown VIC 0.",
            "Video Data Block: Unknown VIC 128.",
            "Video Data Block: Unknown VIC 254.",
            "Video Data Block: Unknown VIC 255.",
        ]
    );
}

#[test]
fn overlapping_block_is_clamped_and_parsing_continues() {
    // Video block declaring 10 payload bytes with only 3 before dtd_start.
    let mut buf = [0u8; 128];
    buf[0] = 0x02;
    buf[1] = 0x03;
    buf[2] = 8;
    buf[4] = 2 << 5 | 10;
    buf[5..8].copy_from_slice(&[1, 2, 3]);
    buf[8..26].copy_from_slice(&DTD_1080P);

    let (section, log) = parse(&buf);
    assert_eq!(
        log.messages(),
        [
            "Data Block at offset 4 overlaps Detailed Timing Definitions. \
             Adjusted its size to attempt parsing."
        ]
    );
    let video = section.data_blocks[0].as_video().unwrap();
    assert_eq!(video.svds.len(), 3);
    assert_eq!(section.detailed_timing_defs.len(), 1);
}

#[test]
fn data_block_area_must_end_at_dtd_offset() {
    // Header at offset 4 declares 2 payload bytes but dtd_start leaves no
    // room at all, so the walk stops short of the declared offset.
    let mut buf = section_with(&[block(2, &[0, 0])], &[]);
    buf[2] = 5;
    let (section, log) = parse(&buf);
    assert!(section.data_blocks.is_empty());
    assert!(section.detailed_timing_defs.is_empty());
    assert_eq!(
        log.messages(),
        [
            "Data Block at offset 4 overlaps Detailed Timing Definitions. \
             No room for other blocks, skipping all further Data Blocks.",
            "Offset is 5, but should be 4.",
        ]
    );
}

#[test]
fn hdr10plus_peak_luminance_tables() {
    // Application version 1, peak index 7 (1000 cd/m²), full-frame
    // fraction index 3 (0.8).
    let buf = section_with(&[extended(1, &[0x8B, 0x84, 0x90, 0x7D])], &[]);
    let (section, log) = parse(&buf);
    assert!(log.is_empty());

    let hdr10plus = section.data_blocks[0].as_hdr10plus().unwrap();
    assert_eq!(hdr10plus.version, 1);
    assert_eq!(hdr10plus.peak_lum, 1000);
    assert_eq!(hdr10plus.ff_peak_lum, 800);
}

#[test]
fn dolby_v1_explicit_primaries() {
    let payload = [0x20, 0x02, 0xFF, 0x01, 160, 82, 76, 141, 38, 11];
    let mut body = vec![0x46, 0xD0, 0x00];
    body.extend_from_slice(&payload);
    let buf = section_with(&[extended(1, &body)], &[]);
    let (section, log) = parse(&buf);
    assert!(log.is_empty());

    let DolbyVideoBlock::V1(v1) = section.data_blocks[0].as_dolby_video().unwrap() else {
        panic!("expected a version 1 block");
    };
    assert!(!v1.unique_primaries);
    assert_eq!(v1.dynamic_metadata_version, 2);
    assert_eq!(v1.colorimetry, DolbyColorimetry::P3D65);
    assert!(v1.mode_low_latency);
    assert_eq!(v1.target_luminance_max, 150.0);
    assert_eq!(v1.target_luminance_min, 1.0);
    assert_eq!(v1.red_x, 160.0 / 256.0);
    assert_eq!(v1.red_y, 82.0 / 256.0);
    assert_eq!(v1.blue_y, 11.0 / 256.0);
}

#[test]
fn dolby_v1_unique_primaries_quantization() {
    // 7-byte form with every primary field at its maximum step count.
    let payload = [0x20, 0x02, 0xFF, 0xE9, 0xFF, 0xFF, 0xFF];
    let mut body = vec![0x46, 0xD0, 0x00];
    body.extend_from_slice(&payload);
    let buf = section_with(&[extended(1, &body)], &[]);
    let (section, log) = parse(&buf);
    assert!(log.is_empty());

    let DolbyVideoBlock::V1(v1) = section.data_blocks[0].as_dolby_video().unwrap() else {
        panic!("expected a version 1 block");
    };
    assert!(v1.unique_primaries);
    assert!((v1.red_x - 0.74609375).abs() < 1e-9);
    assert!((v1.red_y - 0.37109375).abs() < 1e-9);
    assert!((v1.green_x - 0.49609375).abs() < 1e-9);
    assert!((v1.green_y - 0.99609375).abs() < 1e-9);
    assert!((v1.blue_x - 0.15234375).abs() < 1e-9);
    // Two of seven steps above the 0.03125 floor.
    assert!((v1.blue_y - 0.0390625).abs() < 1e-9);
}

#[test]
fn hdr_static_zero_luminance_is_a_sentinel() {
    let buf = section_with(&[extended(6, &[0x0D, 0x01, 0x00, 0x00])], &[]);
    let (section, log) = parse(&buf);
    assert!(log.is_empty());

    let hdr = section.data_blocks[0].as_hdr_static_metadata().unwrap();
    assert!(hdr.eotfs.traditional_sdr && hdr.eotfs.pq && hdr.eotfs.hlg);
    assert_eq!(hdr.desired_content_max_luminance, 0.0);
    assert_eq!(hdr.desired_content_max_frame_avg_luminance, 0.0);
    assert_eq!(hdr.desired_content_min_luminance, 0.0);
}

#[test]
fn malformed_hdr_dynamic_metadata_block_is_dropped() {
    // First record claims 5 payload bytes with only 2 remaining; the
    // diagnostic is logged and the whole block stays out of the section.
    let buf = section_with(&[extended(7, &[5, 0x01, 0x00])], &[]);
    let (section, log) = parse(&buf);
    assert!(section.data_blocks.is_empty());
    assert_eq!(
        log.messages(),
        ["HDR Dynamic Metadata Data Block: Length of type bigger than block size."]
    );

    // A record shorter than its type field is dropped the same way.
    let buf = section_with(&[extended(7, &[1, 0x03, 0x00])], &[]);
    let (section, log) = parse(&buf);
    assert!(section.data_blocks.is_empty());
    assert_eq!(
        log.messages(),
        ["HDR Dynamic Metadata Data Block: Type has wrong length."]
    );
}

#[test]
fn multi_block_section_walk() {
    let blocks = [
        block(1, &[0x09, 0x07, 0x07]),                  // LPCM, 2 channels
        block(2, &[1, 2, 3]),                           // three SVDs
        block(4, &[0x01, 0x00, 0x00]),                  // FL/FR speakers
        block(3, &[0x03, 0x0C, 0x00, 0x10, 0x00]),      // HDMI VSDB
    ];
    let buf = section_with(&blocks, &[DTD_1080P]);
    let (section, log) = parse(&buf);
    assert!(log.is_empty(), "unexpected failures: {:?}", log.messages());
    assert_eq!(section.revision, 3);
    assert_eq!(section.data_blocks.len(), 4);

    let audio = section.data_blocks[0].as_audio().unwrap();
    assert_eq!(audio.sads.len(), 1);
    assert_eq!(audio.sads[0].max_channels, Some(2));

    assert_eq!(section.data_blocks[1].as_video().unwrap().svds.len(), 3);
    assert!(section.data_blocks[2].as_speaker_alloc().unwrap().speakers.fl_fr);

    let hdmi = section.data_blocks[3].as_vendor_hdmi().unwrap();
    assert_eq!(hdmi.source_phys_addr, 0x1000);

    assert_eq!(section.detailed_timing_defs.len(), 1);
    let dtd = &section.detailed_timing_defs[0];
    assert_eq!(dtd.pixel_clock_hz, 148_500_000);
    assert_eq!(dtd.h_active, 1920);
    assert_eq!(dtd.v_active, 1080);
    assert!(!dtd.interlaced);
}

#[test]
fn parsing_is_idempotent() {
    let buf = section_with(
        &[block(2, &[1, 0, 16]), extended(1, &[0x8B, 0x84, 0x90, 0x7D])],
        &[DTD_1080P],
    );
    let (first, first_log) = parse(&buf);
    let (second, second_log) = parse(&buf);
    assert_eq!(first, second);
    assert_eq!(first_log.messages(), second_log.messages());
}

#[test]
fn nonzero_padding_reported_once() {
    let mut buf = section_with(&[], &[]);
    buf[100] = 1;
    buf[120] = 1;
    let (_, log) = parse(&buf);
    assert_eq!(log.messages(), ["Padding: Contains non-zero bytes."]);
}

#[test]
fn bad_geometry_is_a_hard_error() {
    let mut log = FailureLog::new();

    let buf = [0u8; 127];
    assert!(parse_cta_section(&buf, &mut log).is_err());

    let mut buf = [0u8; 128];
    buf[0] = 0x71; // not a CTA tag
    assert!(parse_cta_section(&buf, &mut log).is_err());

    buf[0] = 0x02;
    buf[2] = 3; // inside the header
    assert!(parse_cta_section(&buf, &mut log).is_err());

    buf[2] = 128; // past the block
    assert!(parse_cta_section(&buf, &mut log).is_err());
}
