//! Read-only commands: list, plan, bundles, readme

use colored::Colorize;
use modkit_core::{AdminBundle, ModuleQuery, Orchestrator, Plan};
use modkit_deps::Scope;

use crate::error::Result;

/// Run the list command
pub fn run_list(orchestrator: &Orchestrator, active_only: bool, json: bool) -> Result<()> {
    let query = if active_only {
        ModuleQuery::active()
    } else {
        ModuleQuery::all()
    };
    let modules = orchestrator.list(&query)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&modules)?);
        return Ok(());
    }

    if modules.is_empty() {
        println!("No modules installed.");
        return Ok(());
    }
    for module in &modules {
        let state = if module.active {
            "active".green()
        } else {
            "inactive".dimmed()
        };
        println!("  {:<24} {:<10} {}", module.name.cyan(), module.version, state);
    }
    Ok(())
}

/// Run the plan command
pub fn run_plan(orchestrator: &Orchestrator, key: &str, deactivate: bool, json: bool) -> Result<()> {
    let module = orchestrator.lookup(key)?;
    let plan = if deactivate {
        orchestrator.plan_deactivation(module.id)?
    } else {
        orchestrator.plan_activation(module.id)?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print_plan(&plan);
    }
    Ok(())
}

fn print_plan(plan: &Plan) {
    let verb = match plan.direction {
        modkit_deps::Direction::Activate => "Activating",
        modkit_deps::Direction::Deactivate => "Deactivating",
    };
    println!("{} {}", verb.bold(), plan.candidate.cyan());

    for scope in Scope::ALL {
        let scope_plan = plan.scope(scope);
        if scope_plan.is_noop() && scope_plan.already_satisfied.is_empty() {
            continue;
        }
        println!("{}:", scope.to_string().bold());
        for (name, requested) in &scope_plan.to_install_or_change {
            let line = format!("  + {name} {}", requested.join(", "));
            if requested.len() > 1 {
                println!("{} {}", line.red(), "(conflict)".red().bold());
            } else {
                println!("{}", line.green());
            }
        }
        for name in scope_plan.to_remove.keys() {
            println!("{}", format!("  - {name}").yellow());
        }
        for (name, version) in &scope_plan.already_satisfied {
            println!("  {} {name} {version}", "=".dimmed());
        }
    }

    if plan.has_conflicts() {
        println!(
            "{} resolve conflicts with {}",
            "note:".yellow().bold(),
            "--resolve <name@range>".cyan()
        );
    } else if !plan.need_upgrade && Scope::ALL.iter().all(|s| plan.scope(*s).is_noop()) {
        println!("Nothing to change.");
    }
}

/// Run the bundles command
pub fn run_bundles(orchestrator: &Orchestrator, json: bool) -> Result<()> {
    let bundles = orchestrator.admin_bundles()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&bundles)?);
        return Ok(());
    }
    for bundle in &bundles {
        match bundle {
            AdminBundle::Loaded { module, scripts } => {
                println!("  {:<24} {}", module.cyan(), scripts.join(" "));
            }
            AdminBundle::Missing { module, path } => {
                println!(
                    "  {:<24} {} {}",
                    module.cyan(),
                    "missing".red(),
                    path.display().to_string().dimmed()
                );
            }
        }
    }
    Ok(())
}

/// Run the readme command
pub fn run_readme(orchestrator: &Orchestrator, key: &str) -> Result<()> {
    let module = orchestrator.lookup(key)?;
    let readme = orchestrator.readme(&module.name)?;
    if readme.is_empty() {
        println!("{}", format!("{} ships no README.", module.name).dimmed());
    } else {
        print!("{readme}");
    }
    Ok(())
}
