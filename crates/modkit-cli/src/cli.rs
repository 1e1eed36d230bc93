//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// modkit - Install and manage host modules
#[derive(Parser, Debug)]
#[command(name = "modkit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Host configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "MODKIT_CONFIG",
        default_value = "modkit.toml"
    )]
    pub config: PathBuf,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Validate and install a module archive
    ///
    /// The archive must be named after the module (`<name>.zip`) and contain
    /// `<name>/info.json`. Installing an existing module replaces its files
    /// and keeps its state.
    Install {
        /// Path to the module archive
        archive: PathBuf,
    },

    /// Activate a module
    ///
    /// Examples:
    ///   modkit activate shop
    ///   modkit activate shop --resolve lodash@^4.0.0
    Activate {
        /// Module name or id
        module: String,

        /// Range to use for a conflicting package (name@range)
        #[arg(short, long = "resolve")]
        resolutions: Vec<String>,
    },

    /// Deactivate a module
    Deactivate {
        /// Module name or id
        module: String,

        /// Range to use for a conflicting package (name@range)
        #[arg(short, long = "resolve")]
        resolutions: Vec<String>,
    },

    /// Remove an inactive module
    Remove {
        /// Module name or id
        module: String,
    },

    /// List installed modules
    List {
        /// Only active modules
        #[arg(long)]
        active: bool,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show the package changes activation or deactivation would make
    Plan {
        /// Module name or id
        module: String,

        /// Plan deactivation instead of activation
        #[arg(long)]
        deactivate: bool,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Re-inject the components of every active module into a theme
    SyncTheme {
        /// Theme name (defaults to the current theme)
        theme: Option<String>,
    },

    /// Show or change a module's configuration
    ///
    /// Examples:
    ///   modkit config shop
    ///   modkit config shop --set payment.currency='"EUR"'
    Config {
        /// Module name or id
        module: String,

        /// Set one field (field=json, dots for nesting)
        #[arg(long)]
        set: Option<String>,
    },

    /// List back-office bundles of active modules
    Bundles {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Print a module's README
    Readme {
        /// Module name or id
        module: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_activate_with_resolutions() {
        let cli = Cli::try_parse_from([
            "modkit",
            "activate",
            "shop",
            "--resolve",
            "lodash@^4.0.0",
            "-r",
            "moment@^2.29.0",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Activate {
                module: "shop".into(),
                resolutions: vec!["lodash@^4.0.0".into(), "moment@^2.29.0".into()],
            })
        );
        assert_eq!(cli.config, PathBuf::from("modkit.toml"));
    }

    #[test]
    fn test_global_flags_after_command() {
        let cli =
            Cli::try_parse_from(["modkit", "list", "--json", "-v", "--config", "host.json"])
                .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, PathBuf::from("host.json"));
        assert_eq!(
            cli.command,
            Some(Commands::List {
                active: false,
                json: true
            })
        );
    }

    #[test]
    fn test_install_requires_archive() {
        assert!(Cli::try_parse_from(["modkit", "install"]).is_err());
    }
}
