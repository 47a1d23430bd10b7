//! pklot-prep: prepare the PKLot parking dataset for YOLO training.
//!
//! Three stages run against a dataset directory, each completing before
//! the next begins:
//!
//! 1. [`acquire`]: download the Kaggle archive and install it, replacing
//!    any previous copy of the dataset directory.
//! 2. [`convert`]: rewrite every COCO annotation file into per-image
//!    YOLO-style label files and relocate images into `images/`.
//! 3. [`rename`]: strip the generator's `.rf.<hex>` fingerprint from
//!    image filenames.
//!
//! # Modules
//!
//! - [`coco`]: serde types and readers for the consumed COCO subset
//! - [`convert`]: split discovery and label conversion
//! - [`rename`]: image filename normalization
//! - [`acquire`]: archive download, extraction, and install
//! - [`error`]: error types for pklot-prep operations

pub mod acquire;
pub mod coco;
pub mod convert;
pub mod error;
pub mod rename;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use convert::ConvertOptions;

pub use error::PrepError;

/// The pklot-prep CLI application.
#[derive(Parser)]
#[command(name = "pklot-prep")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Run all three stages: download, convert, rename.
    Prepare(PrepareArgs),

    /// Download the dataset archive and install it at the dataset directory.
    Download(DownloadArgs),

    /// Convert COCO annotation files to YOLO labels and relocate images.
    Convert(ConvertArgs),

    /// Strip generator fingerprints from image filenames.
    Rename(RenameArgs),
}

/// Arguments for the prepare subcommand.
#[derive(clap::Args)]
struct PrepareArgs {
    /// Dataset directory to prepare.
    #[arg(default_value = "./pklot_dataset")]
    dataset_dir: PathBuf,

    /// Kaggle dataset to download, in '<owner>/<slug>' form.
    #[arg(long, default_value = acquire::DEFAULT_DATASET)]
    dataset: String,

    /// Name of the per-split label output directory.
    #[arg(long, default_value = "labels")]
    labels_dir_name: String,

    /// Name of the per-split directory images are moved into.
    #[arg(long, default_value = "images")]
    images_dir_name: String,
}

/// Arguments for the download subcommand.
#[derive(clap::Args)]
struct DownloadArgs {
    /// Directory the dataset is installed into (replaced if present).
    #[arg(default_value = "./pklot_dataset")]
    dataset_dir: PathBuf,

    /// Kaggle dataset to download, in '<owner>/<slug>' form.
    #[arg(long, default_value = acquire::DEFAULT_DATASET)]
    dataset: String,
}

/// Arguments for the convert subcommand.
#[derive(clap::Args)]
struct ConvertArgs {
    /// Dataset directory holding the downloaded splits.
    #[arg(default_value = "./pklot_dataset")]
    dataset_dir: PathBuf,

    /// Name of the per-split label output directory.
    #[arg(long, default_value = "labels")]
    labels_dir_name: String,

    /// Name of the per-split directory images are moved into.
    #[arg(long, default_value = "images")]
    images_dir_name: String,
}

/// Arguments for the rename subcommand.
#[derive(clap::Args)]
struct RenameArgs {
    /// Dataset directory holding the converted splits.
    #[arg(default_value = "./pklot_dataset")]
    dataset_dir: PathBuf,
}

/// Run the pklot-prep CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), PrepError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Prepare(args)) => run_prepare(args),
        Some(Commands::Download(args)) => run_download(args),
        Some(Commands::Convert(args)) => run_convert(args),
        Some(Commands::Rename(args)) => run_rename(args),
        None => {
            println!("pklot-prep {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Prepare the PKLot parking dataset for YOLO training.");
            println!();
            println!("Run 'pklot-prep --help' for usage information.");
            Ok(())
        }
    }
}

/// Execute the prepare subcommand: all three stages in order.
fn run_prepare(args: PrepareArgs) -> Result<(), PrepError> {
    download_stage(&args.dataset, &args.dataset_dir)?;

    let options = ConvertOptions {
        labels_dir_name: args.labels_dir_name,
        images_dir_name: args.images_dir_name,
    };
    convert_stage(&args.dataset_dir, &options)?;
    rename_stage(&args.dataset_dir)?;

    println!("Processing complete!");
    Ok(())
}

/// Execute the download subcommand.
fn run_download(args: DownloadArgs) -> Result<(), PrepError> {
    download_stage(&args.dataset, &args.dataset_dir)
}

/// Execute the convert subcommand.
fn run_convert(args: ConvertArgs) -> Result<(), PrepError> {
    let options = ConvertOptions {
        labels_dir_name: args.labels_dir_name,
        images_dir_name: args.images_dir_name,
    };
    convert_stage(&args.dataset_dir, &options)
}

/// Execute the rename subcommand.
fn run_rename(args: RenameArgs) -> Result<(), PrepError> {
    rename_stage(&args.dataset_dir)
}

fn download_stage(dataset: &str, dataset_dir: &Path) -> Result<(), PrepError> {
    let dataset = acquire::parse_dataset_ref(dataset)?;
    println!("Downloading dataset...");
    acquire::download_dataset(&dataset, dataset_dir)?;
    println!("Dataset downloaded to: {}", dataset_dir.display());
    Ok(())
}

fn convert_stage(dataset_dir: &Path, options: &ConvertOptions) -> Result<(), PrepError> {
    println!("Processing annotations and images...");
    let summary = convert::convert_dataset(dataset_dir, options)?;
    println!("Converted {summary}");
    Ok(())
}

fn rename_stage(dataset_dir: &Path) -> Result<(), PrepError> {
    println!("Renaming image files...");
    let summary = rename::normalize_image_names(dataset_dir)?;
    println!(
        "Renamed {} of {} image file(s)",
        summary.files_renamed, summary.files_seen
    );
    Ok(())
}
