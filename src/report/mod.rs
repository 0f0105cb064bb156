//! Report generation for decoded EDID extension data

use serde::Serialize;

use crate::cta::CtaSection;
use crate::diag::FailureLog;
use crate::displayid2::{DisplayId2Section, PrimaryUseCase};

/// Decoded payload of one input section.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SectionData {
    Cta861(CtaSection),
    DisplayIdV2(DisplayId2Section),
    /// Extension tag the decoder does not understand; carried for the record.
    Unsupported { tag: u8 },
}

/// One decoded section plus the conformance failures found while parsing it.
#[derive(Debug, Clone, Serialize)]
pub struct DecodedSection {
    pub label: String,
    pub data: SectionData,
    pub failures: FailureLog,
}

/// JSON structure for the complete report (internal serialization)
#[derive(Serialize)]
struct ReportJson<'a> {
    timestamp: String,
    source: &'a str,
    sections: &'a [DecodedSection],
}

/// Report generator for decoded EDID extension data
pub struct Reporter;

impl Reporter {
    /// Generate a pretty-printed JSON report for CLI output.
    pub fn generate_json_report(source: &str, sections: &[DecodedSection]) -> String {
        let rep = ReportJson {
            timestamp: chrono::Utc::now().to_rfc3339(),
            source,
            sections,
        };
        serde_json::to_string_pretty(&rep)
            .unwrap_or_else(|_| "{\"error\": \"JSON serialization failed\"}".to_string())
    }

    /// Render a human-readable summary of one decoded section.
    pub fn render_summary(section: &DecodedSection) -> String {
        let mut out = format!("{}:\n", section.label);
        match &section.data {
            SectionData::Cta861(cta) => summarize_cta(&mut out, cta),
            SectionData::DisplayIdV2(did) => summarize_displayid2(&mut out, did),
            SectionData::Unsupported { tag } => {
                out.push_str(&format!("  Unsupported extension tag 0x{tag:02x}\n"));
            }
        }
        out
    }
}

fn summarize_cta(out: &mut String, cta: &CtaSection) {
    out.push_str(&format!("  Revision: {}\n", cta.revision));
    if cta.revision >= 2 {
        let f = &cta.flags;
        if f.it_underscan {
            out.push_str("  Underscans IT video formats by default\n");
        }
        if f.basic_audio {
            out.push_str("  Basic audio support\n");
        }
        if f.ycc444 {
            out.push_str("  Supports YCbCr 4:4:4\n");
        }
        if f.ycc422 {
            out.push_str("  Supports YCbCr 4:2:2\n");
        }
        out.push_str(&format!("  Native detailed modes: {}\n", f.native_dtds));
    }
    for block in &cta.data_blocks {
        out.push_str(&format!("  {}\n", block.name()));
    }
    for dtd in &cta.detailed_timing_defs {
        out.push_str(&format!(
            "  Detailed mode: {}x{}{}, {:.3} MHz\n",
            dtd.h_active,
            dtd.v_active,
            if dtd.interlaced { "i" } else { "" },
            dtd.pixel_clock_hz as f64 / 1_000_000.0
        ));
    }
}

fn summarize_displayid2(out: &mut String, did: &DisplayId2Section) {
    out.push_str(&format!("  Version: 2.{}\n", did.revision));
    let use_case = match did.primary_use_case {
        Some(PrimaryUseCase::Extension) => "Extension section".to_string(),
        Some(PrimaryUseCase::Test) => "Test structure".to_string(),
        Some(PrimaryUseCase::Generic) => "Generic display".to_string(),
        Some(PrimaryUseCase::Television) => "Television display".to_string(),
        Some(PrimaryUseCase::DesktopProductivity) => "Desktop productivity display".to_string(),
        Some(PrimaryUseCase::DesktopGaming) => "Desktop gaming display".to_string(),
        Some(PrimaryUseCase::Presentation) => "Presentation display".to_string(),
        Some(PrimaryUseCase::HeadMountedVr) => "Head-mounted VR display".to_string(),
        Some(PrimaryUseCase::HeadMountedAr) => "Head-mounted AR display".to_string(),
        Some(PrimaryUseCase::Unknown(raw)) => format!("Unknown use case 0x{raw:02x}"),
        None => "Unknown".to_string(),
    };
    out.push_str(&format!("  Primary use case: {use_case}\n"));
    for block in &did.data_blocks {
        out.push_str(&format!(
            "  Data block {:?}, {} bytes\n",
            block.tag,
            block.payload.len()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_lists_flags_and_blocks() {
        let mut log = FailureLog::new();
        let mut data = [0u8; 128];
        data[0] = 0x02;
        data[1] = 0x03;
        data[2] = 0x00;
        data[3] = 0xC1; // underscan + basic audio, 1 native DTD
        let cta = crate::cta::parse_cta_section(&data, &mut log).unwrap();
        let section = DecodedSection {
            label: "Block 1 (CTA-861 Extension Block)".into(),
            data: SectionData::Cta861(cta),
            failures: log,
        };
        let summary = Reporter::render_summary(&section);
        assert!(summary.starts_with("Block 1 (CTA-861 Extension Block):\n"));
        assert!(summary.contains("  Revision: 3\n"));
        assert!(summary.contains("  Underscans IT video formats by default\n"));
        assert!(summary.contains("  Basic audio support\n"));
        assert!(summary.contains("  Native detailed modes: 1\n"));
    }

    #[test]
    fn json_report_shape() {
        let section = DecodedSection {
            label: "Block 1 (CTA-861 Extension Block)".into(),
            data: SectionData::Unsupported { tag: 0x40 },
            failures: FailureLog::new(),
        };
        let json = Reporter::generate_json_report("edid.bin", &[section]);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["source"], "edid.bin");
        assert_eq!(value["sections"][0]["data"]["kind"], "unsupported");
        assert_eq!(value["sections"][0]["data"]["tag"], 0x40);
        assert!(value["timestamp"].is_string());
    }
}
