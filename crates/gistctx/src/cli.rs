//! Command line front end.

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgGroup, Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use crate::app::collect::ContentCollector;
use crate::app::editor::LineRange;
use crate::app::upload::{UploadOrchestrator, UploadOutcome, UploadRequest};
use crate::domain::model::{EditorSnapshot, NamedBlob, SelectionSource};
use crate::infra::auth;
use crate::infra::clipboard::SystemClipboard;
use crate::infra::config::Config;
use crate::infra::fs::LocalFileSystem;
use crate::infra::github::GithubClient;
use crate::infra::logging;
use crate::infra::notify::{Notifier, TerminalNotifier};

#[derive(Debug, Parser)]
#[command(
    name = "gistctx",
    author,
    version,
    about = "Share files, directories or editor selections as GitHub gists"
)]
pub struct Cli {
    /// Log debug output to stderr (overridden by GISTCTX_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Collect the selection and post it as a new gist
    Create(CreateArgs),
    /// Show which files would be uploaded, without contacting GitHub
    Collect(CollectArgs),
    /// Print shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Args)]
#[command(group(
    ArgGroup::new("source")
        .required(true)
        .args(["paths", "editor", "stdin"])
))]
struct SourceArgs {
    /// Files or directories to upload; directories are walked recursively
    paths: Vec<PathBuf>,

    /// Treat FILE as an open editor document
    #[arg(long, value_name = "FILE")]
    editor: Option<PathBuf>,

    /// Selected lines of the editor document, e.g. 10:24
    #[arg(long, requires = "editor", value_name = "START:END")]
    lines: Option<LineRange>,

    /// Read the document from stdin
    #[arg(long)]
    stdin: bool,

    /// File name for stdin content
    #[arg(long, requires = "stdin")]
    name: Option<String>,
}

impl SourceArgs {
    fn selection_source(&self) -> Result<SelectionSource> {
        if let Some(path) = &self.editor {
            let snapshot = EditorSnapshot::from_file(&LocalFileSystem, path, self.lines)?;
            return Ok(SelectionSource::Editor(snapshot));
        }
        if self.stdin {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            return Ok(SelectionSource::Editor(EditorSnapshot::from_text(
                text,
                self.name.clone(),
            )));
        }
        Ok(SelectionSource::from_paths(self.paths.clone())?)
    }
}

#[derive(Debug, Args)]
struct CreateArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Gist description
    #[arg(short, long)]
    description: Option<String>,

    /// Create a public gist
    #[arg(long, conflicts_with = "private")]
    public: bool,

    /// Create a secret gist
    #[arg(long)]
    private: bool,

    /// Do not send an access token
    #[arg(long)]
    anonymous: bool,

    /// Print the request body instead of posting it
    #[arg(long)]
    dry_run: bool,

    /// Copy the gist URL to the clipboard
    #[arg(long)]
    copy_url: bool,
}

#[derive(Debug, Args)]
struct CollectArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Print blobs as JSON
    #[arg(long)]
    json: bool,
}

/// Parse the command line and run the selected command.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Create(args) => create(args),
        Commands::Collect(args) => collect(args),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "gistctx", &mut io::stdout());
            Ok(())
        }
    }
}

fn create(args: CreateArgs) -> Result<()> {
    let config = Config::load()?;
    let source = args.source.selection_source()?;
    let collector = build_collector(&config)?;

    let public = if args.public {
        true
    } else if args.private {
        false
    } else {
        config.defaults.public()
    };
    let request = UploadRequest {
        description: args
            .description
            .unwrap_or_else(|| config.defaults.description().to_owned()),
        public,
        anonymous: args.anonymous,
        auth: if args.anonymous {
            None
        } else {
            auth::token_from_env(&config.github.token_env())
        },
        dry_run: args.dry_run,
        copy_url: args.copy_url || config.defaults.copy_url(),
    };

    let transport = GithubClient::new(config.github.api_url())?;
    let clipboard = SystemClipboard;
    let orchestrator =
        UploadOrchestrator::new(&collector, &transport, &TerminalNotifier).with_clipboard(&clipboard);

    let mut stdout = io::stdout().lock();
    match orchestrator.run(&source, &request)? {
        UploadOutcome::DryRun(payload) => writeln!(stdout, "{}", payload.to_json_pretty()?)?,
        UploadOutcome::Created { url, .. } => writeln!(stdout, "{url}")?,
    }
    Ok(())
}

fn collect(args: CollectArgs) -> Result<()> {
    let config = Config::load()?;
    let source = args.source.selection_source()?;
    let blobs = build_collector(&config)?.collect(&source);
    if blobs.is_empty() {
        TerminalNotifier.warning("Nothing to upload", "the selection produced no non-blank files");
    }

    let mut stdout = io::stdout().lock();
    if args.json {
        writeln!(stdout, "{}", serde_json::to_string_pretty(&blobs)?)?;
    } else {
        write_listing(&mut stdout, &blobs)?;
    }
    Ok(())
}

fn build_collector(config: &Config) -> Result<ContentCollector> {
    let workspace = std::env::current_dir().context("unable to determine working directory")?;
    let collector = ContentCollector::from_config(config, &workspace)?;
    Ok(collector.with_sink(|path: &Path, cause: &io::Error| {
        TerminalNotifier.warning(
            "Can't create Gist",
            &format!("Couldn't read the contents of the file {}: {cause}", path.display()),
        );
    }))
}

fn write_listing(out: &mut impl Write, blobs: &[NamedBlob]) -> io::Result<()> {
    for blob in blobs {
        let name = if blob.name.is_empty() {
            "<unnamed>"
        } else {
            blob.name.as_str()
        };
        writeln!(out, "{name}\t{} bytes", blob.text.len())?;
    }
    Ok(())
}
