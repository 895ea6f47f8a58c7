use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::config::Overrides;

#[derive(Parser)]
#[command(name = "caixa")]
#[command(version)]
#[command(about = "Declarative bucket reconciliation", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: ./caixa.toml if present)
    #[arg(long, global = true, env = "CAIXA_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub paths: PathArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Location overrides, each also settable from the environment
#[derive(Args, Debug, Clone, Default)]
pub struct PathArgs {
    /// Root directory of the local bucket backend
    #[arg(long, global = true, env = "CAIXA_DATA_ROOT")]
    pub data_root: Option<PathBuf>,

    /// Directory for plan/apply/drift evidence
    #[arg(long, global = true, env = "CAIXA_EVIDENCE_DIR")]
    pub evidence_dir: Option<PathBuf>,

    /// State document location
    #[arg(long, global = true, env = "CAIXA_STATE_FILE")]
    pub state_file: Option<PathBuf>,

    /// Desired configuration (.yaml, .yml, .toml or .json)
    #[arg(long = "desired", global = true, env = "CAIXA_DESIRED_FILE")]
    pub desired_file: Option<PathBuf>,
}

impl PathArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            data_root: self.data_root.clone(),
            evidence_dir: self.evidence_dir.clone(),
            state_file: self.state_file.clone(),
            desired_file: self.desired_file.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Compute what apply would change and save it as plan evidence
    Plan(PlanArgs),

    /// Apply the saved plan and record the new state
    Apply(ApplyArgs),

    /// Compare recorded state with the backend (exit 2 on drift)
    Drift,

    /// Show the recorded state
    Status,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct PlanArgs {
    /// Only plan buckets whose name contains this text
    #[arg(short, long)]
    pub target: Option<String>,
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Plan file to apply (default: the plan evidence)
    #[arg(long)]
    pub plan: Option<PathBuf>,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Show what would be applied without applying
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_apply_flags() {
        let cli = Cli::parse_from(["caixa", "apply", "--yes", "--plan", "p.json", "-n"]);
        let Command::Apply(args) = cli.command else {
            panic!("expected apply");
        };
        assert!(args.yes);
        assert!(args.dry_run);
        assert_eq!(args.plan, Some(PathBuf::from("p.json")));
    }

    #[test]
    fn test_global_paths_after_subcommand() {
        let cli = Cli::parse_from(["caixa", "drift", "--data-root", "/srv/data", "-vv"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.paths.data_root, Some(PathBuf::from("/srv/data")));
        assert!(matches!(cli.command, Command::Drift));
    }

    #[test]
    fn test_desired_flag_maps_to_overrides() {
        let cli = Cli::parse_from(["caixa", "plan", "--desired", "buckets.toml", "-t", "logs"]);
        let overrides = cli.paths.overrides();
        assert_eq!(overrides.desired_file, Some(PathBuf::from("buckets.toml")));
        let Command::Plan(args) = cli.command else {
            panic!("expected plan");
        };
        assert_eq!(args.target.as_deref(), Some("logs"));
    }
}
