//! Install, activate, deactivate, remove and theme sync commands

use std::path::Path;

use colored::Colorize;
use modkit_core::{Error, Orchestrator, PackageSpec};

use crate::error::Result;

/// Run the install command
pub fn run_install(orchestrator: &Orchestrator, archive: &Path) -> Result<()> {
    let modules = orchestrator.install(archive)?;
    let name = archive
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let version = modules
        .iter()
        .find(|m| m.name == name)
        .map(|m| m.version.as_str())
        .unwrap_or_default();
    println!(
        "{} Module {} {} installed.",
        "OK".green().bold(),
        name.cyan(),
        version
    );
    Ok(())
}

/// Run the activate command
pub fn run_activate(orchestrator: &Orchestrator, key: &str, resolutions: &[String]) -> Result<()> {
    let module = orchestrator.lookup(key)?;
    let resolutions = parse_resolutions(resolutions)?;

    if let Err(e) = orchestrator.activate(module.id, &resolutions) {
        report_conflicts(&e.error);
        return Err(e.into());
    }
    println!("{} Module {} activated.", "OK".green().bold(), module.name.cyan());
    Ok(())
}

/// Run the deactivate command
pub fn run_deactivate(
    orchestrator: &Orchestrator,
    key: &str,
    resolutions: &[String],
) -> Result<()> {
    let module = orchestrator.lookup(key)?;
    let resolutions = parse_resolutions(resolutions)?;

    if let Err(e) = orchestrator.deactivate(module.id, &resolutions) {
        report_conflicts(&e.error);
        return Err(e.into());
    }
    println!("{} Module {} deactivated.", "OK".green().bold(), module.name.cyan());
    Ok(())
}

/// Run the remove command
pub fn run_remove(orchestrator: &Orchestrator, key: &str) -> Result<()> {
    let module = orchestrator.lookup(key)?;
    let (removed, remaining) = orchestrator.remove(module.id)?;
    println!(
        "{} Module {} removed ({} left).",
        "OK".green().bold(),
        removed.name.cyan(),
        remaining.len()
    );
    Ok(())
}

/// Run the sync-theme command
pub fn run_sync_theme(orchestrator: &Orchestrator, theme: Option<&str>) -> Result<()> {
    let theme = theme.unwrap_or(&orchestrator.config().current_theme).to_string();
    orchestrator.sync_theme(Some(&theme))?;
    let manifest = orchestrator.injector().manifest(&theme)?;
    println!(
        "{} Theme {} synchronized ({} components).",
        "OK".green().bold(),
        theme.cyan(),
        manifest.components.len()
    );
    Ok(())
}

fn parse_resolutions(raw: &[String]) -> Result<Vec<PackageSpec>> {
    raw.iter()
        .map(|r| PackageSpec::parse(r).map_err(Into::into))
        .collect()
}

fn report_conflicts(error: &Error) {
    let Error::DependencyConflict { plan } = error else {
        return;
    };
    eprintln!("{}", "Conflicting package ranges:".yellow().bold());
    for conflict in plan.conflicts() {
        eprintln!("  {conflict}");
    }
    eprintln!(
        "Retry with {} for each package.",
        "--resolve <name@range>".cyan()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resolutions() {
        let specs = parse_resolutions(&["lodash@^4.0.0".into(), "@scope/pkg@1.x".into()]).unwrap();
        assert_eq!(specs[0].name(), "lodash");
        assert_eq!(specs[1].name(), "@scope/pkg");
        assert_eq!(specs[1].range(), "1.x");
    }
}
