//! CLI argument definitions
//!
//! All Clap derive structs for `conftree` command-line parsing.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::template::SampleFormat;

// ============================================================================
// Root CLI
// ============================================================================

/// Inspect, convert and validate hierarchical configuration files.
#[derive(Parser, Debug)]
#[command(name = "conftree", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "CONFTREE_COLOR")]
    pub color: ColorChoice,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,
}

// ============================================================================
// Top-Level Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the outline of a configuration.
    Ls(LsArgs),

    /// Print the value at a path as JSON.
    Get(GetArgs),

    /// Copy a configuration to a file, converting its format.
    Cp(CpArgs),

    /// Remove a configuration file.
    Rm(RmArgs),

    /// Validate a configuration against a schema document.
    Validate(ValidateArgs),

    /// Print a sample configuration for a schema document.
    Sample(SampleArgs),

    /// Generate shell completion scripts.
    Completions(CompletionsArgs),

    /// Display version information.
    Version(VersionArgs),
}

// ============================================================================
// Configuration Commands
// ============================================================================

/// Arguments shared by commands that load a configuration.
#[derive(Args, Debug, Clone)]
pub struct LoadArgs {
    /// Configuration source (file path; format follows the extension).
    #[arg(env = "CONFTREE_SOURCE")]
    pub source: String,

    /// Schema document to validate against after loading.
    #[arg(long, env = "CONFTREE_SCHEMA")]
    pub schema: Option<PathBuf>,
}

/// Arguments for `conftree ls`.
#[derive(Args, Debug)]
pub struct LsArgs {
    #[command(flatten)]
    pub load: LoadArgs,

    /// Print node paths (or attribute paths with `--attributes`) instead of
    /// the outline.
    #[arg(long)]
    pub paths: bool,

    /// With `--paths`, list attributes instead of nodes.
    #[arg(long, requires = "paths")]
    pub attributes: bool,

    /// Node whose children are listed with `--paths`.
    #[arg(long, default_value = "/")]
    pub under: String,
}

/// Arguments for `conftree get`.
#[derive(Args, Debug)]
pub struct GetArgs {
    #[command(flatten)]
    pub load: LoadArgs,

    /// Path inside the configuration; the whole tree when omitted.
    #[arg(default_value = "/")]
    pub path: String,
}

/// Arguments for `conftree cp`.
#[derive(Args, Debug)]
pub struct CpArgs {
    #[command(flatten)]
    pub load: LoadArgs,

    /// Destination file; its extension selects the output format.
    pub destination: String,

    /// Overwrite the destination if it exists.
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for `conftree rm`.
#[derive(Args, Debug)]
pub struct RmArgs {
    /// Configuration file to remove.
    pub source: String,
}

/// Arguments for `conftree validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Configuration source to validate.
    #[arg(env = "CONFTREE_SOURCE")]
    pub source: String,

    /// Schema document.
    #[arg(long, env = "CONFTREE_SCHEMA")]
    pub schema: PathBuf,
}

/// Arguments for `conftree sample`.
#[derive(Args, Debug)]
pub struct SampleArgs {
    /// Schema document.
    #[arg(long, env = "CONFTREE_SCHEMA")]
    pub schema: PathBuf,

    /// Sample format.
    #[arg(long, default_value = "json")]
    pub format: SampleFormatArg,
}

// ============================================================================
// Utility Commands
// ============================================================================

/// Arguments for `conftree completions`.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell.
    pub shell: Shell,
}

/// Arguments for `conftree version`.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Sample configuration format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SampleFormatArg {
    /// JSON document.
    #[default]
    Json,
    /// `[section]` / `key = value` text.
    Text,
}

impl From<SampleFormatArg> for SampleFormat {
    fn from(arg: SampleFormatArg) -> Self {
        match arg {
            SampleFormatArg::Json => Self::Json,
            SampleFormatArg::Text => Self::Text,
        }
    }
}

/// Output format for structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

/// Shell type for completion generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell.
    Bash,
    /// Zsh shell.
    Zsh,
    /// Fish shell.
    Fish,
    /// `PowerShell`.
    #[value(name = "powershell")]
    PowerShell,
    /// Elvish shell.
    Elvish,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ls_with_schema() {
        let cli = Cli::try_parse_from(["conftree", "ls", "a.conf", "--schema", "s.yaml"]).unwrap();
        let Commands::Ls(args) = cli.command else {
            panic!("Expected LsArgs");
        };
        assert_eq!(args.load.source, "a.conf");
        assert_eq!(args.load.schema, Some(PathBuf::from("s.yaml")));
        assert!(!args.paths);
    }

    #[test]
    fn test_attributes_requires_paths() {
        let result = Cli::try_parse_from(["conftree", "ls", "a.conf", "--attributes"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_get_default_path() {
        let cli = Cli::try_parse_from(["conftree", "get", "a.json"]).unwrap();
        let Commands::Get(args) = cli.command else {
            panic!("Expected GetArgs");
        };
        assert_eq!(args.path, "/");
    }

    #[test]
    fn test_cp_force() {
        let cli = Cli::try_parse_from(["conftree", "cp", "a.conf", "b.json", "--force"]).unwrap();
        let Commands::Cp(args) = cli.command else {
            panic!("Expected CpArgs");
        };
        assert_eq!(args.destination, "b.json");
        assert!(args.force);
    }

    #[test]
    fn test_validate_requires_schema() {
        let result = Cli::try_parse_from(["conftree", "validate", "a.conf"]);
        if std::env::var_os("CONFTREE_SCHEMA").is_none() {
            assert!(result.is_err(), "Expected error for missing schema");
        }
    }

    #[test]
    fn test_sample_formats_parse() {
        for format in ["json", "text"] {
            let cli = Cli::try_parse_from([
                "conftree", "sample", "--schema", "s.yaml", "--format", format,
            ]);
            assert!(cli.is_ok(), "Failed to parse format={format}");
        }
    }

    #[test]
    fn test_help_output() {
        let err = Cli::try_parse_from(["conftree", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_version_output() {
        let err = Cli::try_parse_from(["conftree", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_color_choices_parse() {
        for variant in ["auto", "always", "never"] {
            let cli = Cli::try_parse_from(["conftree", "--color", variant, "rm", "x.conf"]);
            assert!(cli.is_ok(), "Failed to parse color={variant}");
        }
    }

    #[test]
    fn test_completions_shells_parse() {
        for shell in ["bash", "zsh", "fish", "powershell", "elvish"] {
            let cli = Cli::try_parse_from(["conftree", "completions", shell]);
            assert!(cli.is_ok(), "Failed to parse shell={shell}");
        }
    }

    #[test]
    fn test_verbose_count_and_quiet() {
        let cli = Cli::try_parse_from(["conftree", "-vvv", "rm", "x.conf"]).unwrap();
        assert_eq!(cli.verbose, 3);
        let cli = Cli::try_parse_from(["conftree", "rm", "x.conf", "--quiet"]).unwrap();
        assert!(cli.quiet);
    }
}
