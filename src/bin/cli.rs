use std::fs;
use std::path::PathBuf;

use clap::Parser;
use edid_inspector::{decode_blob, Reporter};

#[derive(Parser)]
struct Opt {
    /// EDID blob (base + extensions) or a standalone DisplayID v2 section
    input: PathBuf,

    /// Write a JSON report to this path instead of printing the summary
    #[clap(long)]
    json: Option<PathBuf>,

    /// Print conformance failures only, no per-section summary
    #[clap(long, default_value_t = false)]
    diagnostics_only: bool,
}

fn main() -> anyhow::Result<()> {
    let opt = Opt::parse();

    let blob = fs::read(&opt.input)?;
    let sections = decode_blob(&blob)?;

    if let Some(path) = &opt.json {
        let source = opt.input.display().to_string();
        fs::write(path, Reporter::generate_json_report(&source, &sections))?;
        return Ok(());
    }

    if !opt.diagnostics_only {
        for section in &sections {
            print!("{}", Reporter::render_summary(section));
        }
        if sections.iter().any(|s| !s.failures.is_empty()) {
            println!("\nFailures:\n");
        }
    }
    for section in &sections {
        print!("{}", section.failures.render(&section.label));
    }

    Ok(())
}
