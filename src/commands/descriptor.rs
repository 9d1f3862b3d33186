//! Descriptor validation and layout regeneration.

use super::CommandResult;
use anyhow::{bail, Context};
use hidpp_harness::descriptor::{regenerate, FeatureDescriptor, SizeValidator};
use std::path::Path;

fn load(file: &Path) -> anyhow::Result<FeatureDescriptor> {
    FeatureDescriptor::load(file).with_context(|| format!("loading {}", file.display()))
}

/// Validate frame sizes for every declared version and print a summary
pub fn validate(file: &Path) -> CommandResult {
    let descriptor = load(file)?;
    println!(
        "{} (0x{:04X}): {} function(s), {} event(s), {} test case(s)",
        descriptor.name,
        descriptor.feature_id,
        descriptor.functions.len(),
        descriptor.events.len(),
        descriptor.test_cases.len()
    );

    let reports = SizeValidator::new(&descriptor).reports()?;
    let mut oversized = 0;
    for report in &reports {
        print!("{report}");
        oversized += report.oversized().count();
    }
    if oversized > 0 {
        bail!("{oversized} frame(s) exceed their payload");
    }
    println!("All frames fit.");
    Ok(())
}

/// Print the regenerated message classes of `version`
pub fn layout(file: &Path, version: u8) -> CommandResult {
    let descriptor = load(file)?;
    let layout = regenerate(&descriptor, version)?;
    print!("{layout}");
    Ok(())
}
