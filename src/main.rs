use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use trellis::config::Config;
use trellis::operation::{CopyOperation, DeleteOperation, MoveOperation, StructuralEdit};
use trellis::ordering::InsertPosition;
use trellis::proposal::ProposalCatalog;
use trellis::symbols::TypeIndex;
use trellis::workspace::Workspace;
use trellis::MemberPath;

/// Trellis - ordered member insertion for Go form structs
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug)]
struct Target {
    /// Go file to edit
    file: PathBuf,

    /// Directory indexed for types (defaults to the file's directory)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Write the result back instead of printing it
    #[arg(long)]
    write: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List proposals applicable at an offset
    Proposals {
        #[command(flatten)]
        target: Target,

        #[arg(long)]
        offset: usize,

        /// Characters already typed
        #[arg(long)]
        prefix: Option<String>,

        /// Print proposals as JSON
        #[arg(long)]
        json: bool,
    },
    /// Insert a member from a proposal
    Insert {
        #[command(flatten)]
        target: Target,

        #[arg(long)]
        offset: usize,

        /// Proposal id, e.g. string-field
        #[arg(long)]
        proposal: String,

        #[arg(long)]
        name: Option<String>,

        /// first, last, before:NAME or after:NAME; defaults to the sibling at the offset
        #[arg(long)]
        position: Option<InsertPosition>,
    },
    /// Delete a member with its accessors and unused imports
    Delete {
        #[command(flatten)]
        target: Target,

        /// Member path, e.g. PersonForm/MainBox/NameField
        #[arg(long)]
        member: MemberPath,
    },
    /// Move a member into another container
    Move {
        #[command(flatten)]
        target: Target,

        #[arg(long)]
        member: MemberPath,

        #[arg(long)]
        into: MemberPath,

        /// first, last, before:NAME or after:NAME
        #[arg(long, default_value = "last")]
        position: InsertPosition,
    },
    /// Copy a member under a new name
    Copy {
        #[command(flatten)]
        target: Target,

        #[arg(long)]
        member: MemberPath,

        #[arg(long)]
        into: MemberPath,

        #[arg(long)]
        name: String,

        #[arg(long, default_value = "last")]
        position: InsertPosition,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Default to "warn" if RUST_LOG is not set
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Commands::Proposals {
            target,
            offset,
            prefix,
            json,
        } => {
            let (workspace, uri) = open_workspace(&target)?;
            let proposals = workspace.proposals_at(&uri, offset, prefix.as_deref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&proposals)?);
                return Ok(());
            }
            for proposal in proposals {
                println!(
                    "{}\t{}\t{}",
                    proposal.id.unwrap_or_default(),
                    proposal.replacement,
                    proposal.detail.unwrap_or_default()
                );
            }
            Ok(())
        }
        Commands::Insert {
            target,
            offset,
            proposal,
            name,
            position,
        } => {
            let (mut workspace, uri) = open_workspace(&target)?;
            let outcome =
                workspace.apply_proposal_at(&uri, offset, &proposal, None, name, position)?;
            if let Some(member) = &outcome.member {
                info!("Inserted {}", member);
            }
            finish(&workspace, &uri, &target)
        }
        Commands::Delete { target, member } => {
            run_operation(&target, &DeleteOperation::new(member))
        }
        Commands::Move {
            target,
            member,
            into,
            position,
        } => run_operation(&target, &MoveOperation::new(member, into, position)),
        Commands::Copy {
            target,
            member,
            into,
            name,
            position,
        } => run_operation(&target, &CopyOperation::new(member, into, name, position)),
    }
}

fn open_workspace(target: &Target) -> Result<(Workspace, String)> {
    let config = Config::load_or_default(&target.file)?;
    let root = match &target.root {
        Some(root) => root.clone(),
        None => parent_dir(&target.file)?,
    };

    info!("Indexing types under {}", root.display());
    let index = TypeIndex::scan(&root)?;
    let package = index.package_for(&absolute(&target.file)?);

    let mut workspace = Workspace::new(
        Arc::new(ProposalCatalog::with_defaults()),
        Arc::new(index),
        config,
    );
    let uri = workspace.open_file(&target.file, package)?;
    Ok((workspace, uri))
}

fn run_operation(target: &Target, operation: &dyn StructuralEdit) -> Result<()> {
    let (mut workspace, uri) = open_workspace(target)?;
    workspace.run(&uri, operation)?;
    finish(&workspace, &uri, target)
}

fn finish(workspace: &Workspace, uri: &str, target: &Target) -> Result<()> {
    let text = workspace.text(uri)?;
    if target.write {
        std::fs::write(&target.file, text)
            .with_context(|| format!("Failed to write {}", target.file.display()))?;
    } else {
        print!("{}", text);
    }
    Ok(())
}

fn parent_dir(file: &Path) -> Result<PathBuf> {
    let absolute = absolute(file)?;
    absolute
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| anyhow::anyhow!("Invalid file path"))
}

fn absolute(file: &Path) -> Result<PathBuf> {
    if file.is_absolute() {
        Ok(file.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(file))
    }
}
