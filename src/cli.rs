use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::paths::ENV_CONFIG;

#[derive(Parser)]
#[command(name = "berks-deploy")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Install and configure Berkshelf API servers", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Settings file (defaults to the user, then the system settings)
    #[arg(short, long, global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Install and configure declared servers
    Install(ConvergeArgs),

    /// Remove the service account and group of declared servers
    Uninstall(ConvergeArgs),

    /// Preview what install would change
    Diff(ServerArgs),

    /// Print the assembled config.json
    Render(ServerArgs),

    /// Validate the settings file and show resolved servers
    Check,

    /// Check that required system tools are available
    Doctor,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct ServerArgs {
    /// Only the server declared at this path
    #[arg(short, long)]
    pub server: Option<PathBuf>,
}

#[derive(Args)]
pub struct ConvergeArgs {
    #[command(flatten)]
    pub target: ServerArgs,

    /// Show what would change without changing it
    #[arg(long)]
    pub dry_run: bool,

    /// Don't ask for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_install_flags() {
        let cli = Cli::parse_from([
            "berks-deploy",
            "install",
            "--server",
            "/srv/berks",
            "--dry-run",
            "-y",
        ]);
        let Command::Install(args) = cli.command else {
            panic!("expected install");
        };
        assert_eq!(args.target.server, Some(PathBuf::from("/srv/berks")));
        assert!(args.dry_run);
        assert!(args.yes);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["berks-deploy", "render", "-vv", "--config", "/tmp/s.toml"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/s.toml")));
    }
}
