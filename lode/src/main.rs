mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lode_core::{Algorithm, EntryType, Hash, Store};
use output::{DatasetInfo, DatasetsOutput, LsOutput, OutputWriter, RefInfo, RefsListOutput, TreeEntryInfo};
use std::io;
use std::path::{Path, PathBuf};

/// Lode - dataset discovery over a content-addressed tree store
#[derive(Parser)]
#[command(name = "lode")]
#[command(about = "Dataset discovery over a content-addressed tree store", long_about = None)]
#[command(version)]
struct Cli {
    /// Store root directory (defaults to LODE_ROOT env var or ./lode-store)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Emit JSON instead of text where supported
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new store
    Init {
        /// Hash algorithm to use
        #[arg(long, default_value = "blake3")]
        algo: String,
    },

    /// Import a file or directory as a snapshot
    Import {
        /// Path to import
        path: PathBuf,

        /// Create a reference to the imported root
        #[arg(long)]
        ref_name: Option<String>,
    },

    /// Discover datasets in a snapshot
    Datasets {
        /// Snapshot root: a reference name or a hex hash
        treeish: String,
    },

    /// List tree contents (lists refs if no hash given)
    Ls {
        /// Hash of the tree (lists all refs if omitted)
        hash: Option<String>,

        /// Show detailed information
        #[arg(short, long)]
        long: bool,
    },

    /// Output blob content to stdout
    Cat {
        /// Hash of the blob
        hash: String,
    },

    /// Manage references
    #[command(subcommand)]
    Refs(RefsCommands),
}

#[derive(Subcommand)]
enum RefsCommands {
    /// Add a reference
    Add {
        /// Reference name
        name: String,

        /// Hash to reference
        hash: String,
    },

    /// List all references
    List,

    /// Remove a reference
    Rm {
        /// Reference name
        name: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Store root: CLI arg > LODE_ROOT env var > ./lode-store default
    let root = cli
        .root
        .or_else(|| std::env::var("LODE_ROOT").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("./lode-store"));

    let out = OutputWriter::new(cli.json);

    match cli.command {
        Commands::Init { algo } => cmd_init(&root, &algo),
        Commands::Import { path, ref_name } => cmd_import(&root, &path, ref_name),
        Commands::Datasets { treeish } => cmd_datasets(&root, &treeish, &out),
        Commands::Ls { hash, long } => cmd_ls(&root, &hash, long, &out),
        Commands::Cat { hash } => cmd_cat(&root, &hash),
        Commands::Refs(refs_cmd) => match refs_cmd {
            RefsCommands::Add { name, hash } => cmd_refs_add(&root, &name, &hash),
            RefsCommands::List => cmd_refs_list(&root, &out),
            RefsCommands::Rm { name } => cmd_refs_rm(&root, &name),
        },
    }
}

fn open_store(root: &Path) -> Result<Store> {
    Store::open(root).with_context(|| format!("Failed to open store at {}", root.display()))
}

/// Resolve a ref name or hex hash to a snapshot root.
fn resolve_treeish(store: &Store, treeish: &str) -> Result<Hash> {
    if let Some(hash) = store.refs().get(treeish)? {
        return Ok(hash);
    }
    Hash::from_hex(treeish)
        .with_context(|| format!("Not a reference or valid hash: {}", treeish))
}

fn cmd_init(root: &Path, algo: &str) -> Result<()> {
    let algorithm = match algo {
        "blake3" => Algorithm::Blake3,
        _ => anyhow::bail!("Unsupported algorithm: {}", algo),
    };

    Store::init(root, algorithm)
        .with_context(|| format!("Failed to initialize store at {}", root.display()))?;

    println!("Initialized lode store at {}", root.display());
    println!("Algorithm: {}", algorithm.as_str());

    Ok(())
}

fn cmd_import(root: &Path, path: &Path, ref_name: Option<String>) -> Result<()> {
    let store = open_store(root)?;

    let hash = store
        .import_path(path)
        .with_context(|| format!("Failed to import path: {}", path.display()))?;

    println!("{} {}", hash, path.display());

    if let Some(name) = ref_name {
        store
            .refs()
            .add(&name, &hash)
            .with_context(|| format!("Failed to create reference: {}", name))?;
        println!("Created reference: {} -> {}", name, hash);
    }

    Ok(())
}

fn cmd_datasets(root: &Path, treeish: &str, out: &OutputWriter) -> Result<()> {
    let store = open_store(root)?;
    let snapshot_root = resolve_treeish(&store, treeish)?;

    let datasets = store
        .snapshot(snapshot_root)
        .datasets()
        .with_context(|| format!("Dataset discovery failed for {}", treeish))?;

    let infos: Vec<DatasetInfo> = datasets
        .iter()
        .map(|d| DatasetInfo {
            path: d.path().to_string(),
            root: d.root(),
        })
        .collect();

    let data = DatasetsOutput {
        success: true,
        snapshot: snapshot_root,
        datasets: infos,
    };

    out.write(&data, || {
        if data.datasets.is_empty() {
            return format!("No datasets in {}\n", snapshot_root);
        }
        let mut text = String::new();
        for info in &data.datasets {
            let shown_path = if info.path.is_empty() { "." } else { info.path.as_str() };
            text.push_str(&format!("{} {}\n", info.root, shown_path));
        }
        text
    })
}

fn cmd_ls(root: &Path, hash_str: &Option<String>, long: bool, out: &OutputWriter) -> Result<()> {
    let store = open_store(root)?;

    let Some(hash_str) = hash_str else {
        return cmd_refs_list(root, out);
    };

    let hash = Hash::from_hex(hash_str).with_context(|| format!("Invalid hash: {}", hash_str))?;

    let entries = store
        .get_tree(&hash)
        .with_context(|| format!("Failed to read tree {}", hash))?;

    let infos: Vec<TreeEntryInfo> = entries
        .iter()
        .map(|entry| TreeEntryInfo {
            name: entry.name.clone(),
            entry_type: match entry.entry_type {
                EntryType::Blob => "blob".to_string(),
                EntryType::Tree => "tree".to_string(),
            },
            mode: format!("{:06o}", entry.mode),
            hash: entry.hash,
        })
        .collect();

    let data = LsOutput {
        success: true,
        hash,
        entries: infos,
    };

    out.write(&data, || {
        let mut text = String::new();
        for info in &data.entries {
            if long {
                text.push_str(&format!(
                    "{} {} {} {}\n",
                    &info.entry_type[..1],
                    info.mode,
                    info.hash,
                    info.name
                ));
            } else {
                text.push_str(&format!("{}\n", info.name));
            }
        }
        text
    })
}

fn cmd_cat(root: &Path, hash_str: &str) -> Result<()> {
    let store = open_store(root)?;

    let hash = Hash::from_hex(hash_str).with_context(|| format!("Invalid hash: {}", hash_str))?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    store
        .blob_to_writer(&hash, &mut handle)
        .with_context(|| format!("Failed to output blob {}", hash))?;

    Ok(())
}

fn cmd_refs_add(root: &Path, name: &str, hash_str: &str) -> Result<()> {
    let store = open_store(root)?;

    let hash = Hash::from_hex(hash_str).with_context(|| format!("Invalid hash: {}", hash_str))?;

    store
        .refs()
        .add(name, &hash)
        .with_context(|| format!("Failed to add reference: {}", name))?;

    println!("{} -> {}", name, hash);

    Ok(())
}

fn cmd_refs_list(root: &Path, out: &OutputWriter) -> Result<()> {
    let store = open_store(root)?;

    let refs = store
        .refs()
        .list()
        .with_context(|| "Failed to list references")?;

    let data = RefsListOutput {
        success: true,
        refs: refs
            .into_iter()
            .map(|(name, hash)| RefInfo { name, hash })
            .collect(),
    };

    out.write(&data, || {
        if data.refs.is_empty() {
            return "No references (use 'lode import --ref-name' to create one)\n".to_string();
        }
        let mut text = String::new();
        for info in &data.refs {
            text.push_str(&format!("{} -> {}\n", info.name, info.hash));
        }
        text
    })
}

fn cmd_refs_rm(root: &Path, name: &str) -> Result<()> {
    let store = open_store(root)?;

    store
        .refs()
        .remove(name)
        .with_context(|| format!("Failed to remove reference: {}", name))?;

    println!("Removed reference: {}", name);

    Ok(())
}
