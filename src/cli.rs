use clap::{Parser, Subcommand};
use pixport_common::ImageFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pixport")]
#[command(author, version, about = "Batch image conversion with zip export")]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert images and package the results into a zip archive
    Convert {
        /// Input image files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Target format (png, jpg, webp, gif, bmp, tiff)
        #[arg(short, long)]
        to: ImageFormat,

        /// Output archive path (defaults to converted_images_<timestamp>.zip)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Per-item conversion deadline in seconds
        #[arg(long, default_value = "30")]
        timeout_secs: u64,

        /// Pause between items in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,
    },

    /// List supported image formats
    Formats,

    /// Display version information
    Version,
}
