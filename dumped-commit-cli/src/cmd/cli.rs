// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use clap::{Args, Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use log::{set_boxed_logger, set_max_level};
use simplelog::{ColorChoice, Config as LogConfig, TermLogger, TerminalMode};
use std::{path::PathBuf, process::ExitCode};

use super::find_dumped_commit;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    common: CommonOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
pub struct CommonOptions {
    #[command(flatten)]
    verbose: Verbosity<WarnLevel>,

    /// Object storage bucket holding one snapshot prefix per commit
    #[arg(long, global = true, env = "DUMPED_COMMIT_BUCKET")]
    pub bucket: Option<String>,

    /// Path prefix within the bucket under which snapshots are stored
    #[arg(long, global = true, env = "DUMPED_COMMIT_PREFIX")]
    pub prefix: Option<String>,

    /// Bearer token for the object storage API; not required for public buckets
    #[arg(long, global = true, env = "DUMPED_COMMIT_STORAGE_TOKEN", hide_env_values = true)]
    pub storage_token: Option<String>,

    /// Override the in-repo .config/dumped-commit.toml with a different config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the commit history of the current local checkout
    Local,

    /// Search the commit history of a branch through the GitHub API
    Remote(RemoteOptions),
}

#[derive(Args, Debug)]
pub struct RemoteOptions {
    /// GitHub token used to query the repository's history
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: String,

    /// Branch whose history is searched
    #[arg(long, env = "DUMPED_COMMIT_BRANCH")]
    pub branch: String,

    /// Repository in owner/name form; defaults to the repository a GitHub Actions workflow is running in
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repository: Option<String>,
}

#[allow(clippy::print_stderr)]
pub async fn run_cli() -> ExitCode {
    let cli = Cli::parse();
    let logger = TermLogger::new(
        cli.common.verbose.log_level_filter(),
        LogConfig::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
    if let Err(e) = set_boxed_logger(logger) {
        eprintln!("unable to install logger: {e}");
    }
    set_max_level(cli.common.verbose.log_level_filter());

    match &cli.command {
        Commands::Local => find_dumped_commit::local_cli(&cli.common).await,
        Commands::Remote(options) => find_dumped_commit::remote_cli(&cli.common, options).await,
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory as _, Parser as _};

    use super::{Cli, Commands};

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_local() {
        let cli = Cli::try_parse_from(["dumped-commit", "local", "--bucket", "b", "-vv"]).unwrap();
        assert!(matches!(cli.command, Commands::Local));
        assert_eq!(cli.common.bucket.as_deref(), Some("b"));
    }

    #[test]
    fn local_takes_no_branch() {
        assert!(Cli::try_parse_from(["dumped-commit", "local", "--branch", "main"]).is_err());
    }

    #[test]
    fn parse_remote() {
        let cli = Cli::try_parse_from([
            "dumped-commit",
            "--bucket",
            "b",
            "remote",
            "--github-token",
            "ghp_x",
            "--branch",
            "main",
            "--repository",
            "org/repo",
        ])
        .unwrap();
        let Commands::Remote(options) = cli.command else {
            panic!("expected remote command");
        };
        assert_eq!(options.github_token, "ghp_x");
        assert_eq!(options.branch, "main");
        assert_eq!(options.repository.as_deref(), Some("org/repo"));
        assert_eq!(cli.common.bucket.as_deref(), Some("b"));
    }
}
