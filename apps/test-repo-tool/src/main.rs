//! CLI tool for inspecting and editing writing-test documents.
//!
//! Provides commands for:
//! - Listing and looking up tests
//! - Appending, replacing and removing tests
//! - Validating a document without modifying it

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::Value;
use test_repo_core::{
    DeletePolicy, IdAllocation, RepoError, StoreConfig, TestRecord, TestRepository, TestStore,
};

/// Command-line arguments for the repository tool.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Document to operate on
    #[arg(short, long, default_value = "./data/writing-tests.json")]
    file: PathBuf,

    /// Id allocation for appends without an id (max-plus-one, monotonic)
    #[arg(long, default_value_t = IdAllocation::MaxPlusOne)]
    id_allocation: IdAllocation,

    /// Treat a missing document as empty
    #[arg(long)]
    create_if_missing: bool,

    /// Log store operations to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the whole document
    List,
    /// Print one test
    Get { test_id: u64 },
    /// Append a test given as a JSON object
    Append { record: String },
    /// Replace a test given as a JSON object carrying its test_id
    Replace { record: String },
    /// Remove a test
    Remove {
        test_id: u64,
        /// Fail if the test does not exist
        #[arg(long)]
        strict: bool,
    },
    /// Validate the document and print a summary
    Check,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();

    let delete_policy = match &args.command {
        Command::Remove { strict: true, .. } => DeletePolicy::Strict,
        _ => DeletePolicy::Lenient,
    };
    let store = TestStore::new(StoreConfig {
        id_allocation: args.id_allocation,
        delete_policy,
        create_if_missing: args.create_if_missing,
        ..Default::default()
    });
    let repo = store.open(&args.file);

    run(&repo, args.command)
}

fn run(repo: &TestRepository, command: Command) -> anyhow::Result<()> {
    match command {
        Command::List => print_json(&repo.list_all()?),
        Command::Get { test_id } => print_json(&repo.get(test_id)?),
        Command::Append { record } => print_json(&repo.append(parse_record(&record)?)?),
        Command::Replace { record } => print_json(&repo.replace(parse_record(&record)?)?),
        Command::Remove { test_id, .. } => {
            repo.remove(test_id)?;
            println!("removed {}", test_id);
            Ok(())
        }
        Command::Check => check(repo),
    }
}

fn check(repo: &TestRepository) -> anyhow::Result<()> {
    match repo.list_all() {
        Ok(doc) => {
            println!(
                "{}: ok, {} tests, max test_id {}, {} metadata fields",
                repo.path().display(),
                doc.len(),
                doc.max_test_id().unwrap_or(0),
                doc.metadata.len()
            );
            Ok(())
        }
        Err(RepoError::CorruptDocument { reason, .. }) => {
            bail!("{}: corrupt: {}", repo.path().display(), reason)
        }
        Err(e) => Err(e.into()),
    }
}

fn parse_record(raw: &str) -> anyhow::Result<TestRecord> {
    let value: Value = serde_json::from_str(raw).context("Record is not valid JSON")?;
    TestRecord::from_value(value).context("Record must be a JSON object with an integer test_id")
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
