mod commands;
mod diagnostics;
mod watch;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use wikiref::Error;

use crate::commands::EditArgs;

#[derive(Parser)]
#[command(name = "wikiref", about = "Find, inspect, and edit <ref> citations in wikitext")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the byte range of a reference or one of its citations
    Highlight {
        /// Citation number within the reference
        #[arg(long)]
        citation: Option<usize>,
        /// Wikitext file
        file: PathBuf,
        /// Reference number as shown by `list`
        index: usize,
    },
    /// Insert a new template reference
    Insert {
        /// Byte offset to insert at (default: end of file)
        #[arg(long)]
        at: Option<usize>,
        #[command(flatten)]
        edits: EditFlags,
        /// Wikitext file
        file: PathBuf,
    },
    /// List every reference in a file
    List {
        /// Wikitext file
        file: PathBuf,
    },
    /// Show the edit form of a template reference
    Show {
        /// Include empty optional parameters
        #[arg(long)]
        all: bool,
        /// Wikitext file
        file: PathBuf,
        /// Reference number as shown by `list`
        index: usize,
        /// Print the form as JSON
        #[arg(long)]
        json: bool,
    },
    /// List catalog templates and their parameters
    Templates,
    /// Rewrite a template reference in place
    Update {
        #[command(flatten)]
        edits: EditFlags,
        /// Wikitext file
        file: PathBuf,
        /// Reference number as shown by `list`
        index: usize,
    },
    /// List references, then re-list on every change to the file
    Watch {
        /// Wikitext file
        file: PathBuf,
    },
}

/// Field edits shared by `insert` and `update`.
#[derive(clap::Args)]
struct EditFlags {
    /// Reference name
    #[arg(long)]
    name: Option<String>,
    /// Set a parameter (repeatable)
    #[arg(long = "set", value_name = "PARAM=VALUE")]
    set: Vec<String>,
    /// Switch to another template
    #[arg(long)]
    template: Option<String>,
}

impl From<EditFlags> for EditArgs {
    fn from(flags: EditFlags) -> Self {
        return Self { name: flags.name, set: flags.set, template: flags.template };
    }
}

/// Exit status for a failed command: 1 when the request itself was wrong,
/// 3 when the environment (files, catalog, config) was.
fn exit_code_for(e: &Error) -> ExitCode {
    return match e {
        Error::CitationOutOfRange { .. }
        | Error::InvalidAssignment { .. }
        | Error::NoReferences { .. }
        | Error::NotATemplateReference { .. }
        | Error::ReferenceOutOfRange { .. }
        | Error::UnknownTemplate { .. } => ExitCode::from(1_u8),
        _ => ExitCode::from(3_u8),
    };
}

/// Send logs to stderr, filtered by `RUST_LOG` (default: warnings only).
fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| return "wikiref=warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    return;
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Highlight { citation, file, index } => commands::highlight(&file, index, citation),
        Commands::Insert { at, edits, file } => commands::insert(&file, at, &edits.into()),
        Commands::List { file } => commands::list(&file),
        Commands::Show { all, file, index, json } => commands::show(&file, index, all, json),
        Commands::Templates => commands::templates(),
        Commands::Update { edits, file, index } => commands::update(&file, index, &edits.into()),
        Commands::Watch { file } => watch::run(&file),
    };

    return match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            diagnostics::print_error(&e);
            exit_code_for(&e)
        },
    };
}
