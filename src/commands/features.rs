//! Builtin feature listing and description.

use super::{resolve_feature, CommandResult};
use hidpp_features::feature_registry;

/// List every builtin feature with its versions
pub fn list() -> CommandResult {
    let registry = feature_registry()?;
    println!("{:<8} {:<28} Versions", "ID", "Name");
    for model in registry.iter() {
        let versions: Vec<String> = model.versions().map(|v| v.to_string()).collect();
        println!(
            "0x{:04X}   {:<28} {}",
            model.feature_id(),
            model.name(),
            versions.join(", ")
        );
    }
    Ok(())
}

/// Print interface attributes and the classes bound at `version`
pub fn describe(feature: &str, version: u8) -> CommandResult {
    let registry = feature_registry()?;
    let feature_id = resolve_feature(registry, feature)?;
    let feature = registry.create(feature_id, version)?;
    print!("{feature}");

    println!();
    println!("Classes:");
    for class in feature.attributes().filter_map(|(_, class)| class) {
        println!("  {class}");
        for field in class.payload().fields() {
            println!("    {:>3} bits  {}", field.length(), field.summary());
        }
    }
    Ok(())
}
