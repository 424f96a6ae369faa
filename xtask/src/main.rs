use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(author, version, about = "Project automation commands", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run cargo nextest for the gistctx crate
    Nextest {
        #[arg(long)]
        profile: Option<String>,
    },
    /// Check formatting and run clippy with warnings denied
    Lint,
    /// Lint, then test
    Ci,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Nextest { profile } => run_nextest(profile)?,
        Commands::Lint => run_lint()?,
        Commands::Ci => {
            run_lint()?;
            run_nextest(None)?;
        }
    }
    Ok(())
}

fn run_nextest(profile: Option<String>) -> Result<()> {
    let mut args = vec!["nextest", "run", "-p", "gistctx"];
    if let Some(profile) = profile.as_deref() {
        args.extend(["--profile", profile]);
    }
    cargo(&args)
}

fn run_lint() -> Result<()> {
    cargo(&["fmt", "--all", "--", "--check"])?;
    cargo(&["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"])
}

fn cargo(args: &[&str]) -> Result<()> {
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("cargo {} failed", args.join(" "));
    }
    Ok(())
}
