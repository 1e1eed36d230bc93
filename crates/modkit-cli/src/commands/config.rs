//! Module configuration command

use colored::Colorize;
use modkit_core::Orchestrator;
use serde_json::Value;

use crate::error::{CliError, Result};

/// Run the config command: print, or set one field first.
pub fn run_config(orchestrator: &Orchestrator, key: &str, set: Option<&str>) -> Result<()> {
    let module = orchestrator.lookup(key)?;

    let config = match set {
        Some(assignment) => {
            let (field, value) = parse_assignment(assignment)?;
            let updated = orchestrator.set_partial_config(&module.name, field, value)?;
            eprintln!(
                "{} Set {} on {}.",
                "OK".green().bold(),
                field.cyan(),
                module.name.cyan()
            );
            updated.config
        }
        None => orchestrator.module_config(&module.name)?,
    };

    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// `field=json`; a value that is not JSON is taken as a string.
fn parse_assignment(assignment: &str) -> Result<(&str, Value)> {
    let (field, raw) = assignment
        .split_once('=')
        .ok_or_else(|| CliError::user(format!("Expected field=value, got '{assignment}'")))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(CliError::user("Field name must not be empty"));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((field, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_assignment() {
        let (field, value) = parse_assignment("payment.enabled=true").unwrap();
        assert_eq!(field, "payment.enabled");
        assert_eq!(value, json!(true));

        let (_, value) = parse_assignment("currency=EUR").unwrap();
        assert_eq!(value, json!("EUR"));

        let (_, value) = parse_assignment("limits={\"max\": 3}").unwrap();
        assert_eq!(value, json!({"max": 3}));
    }

    #[test]
    fn test_parse_assignment_rejects_missing_equals() {
        assert!(parse_assignment("currency").is_err());
        assert!(parse_assignment("=1").is_err());
    }
}
