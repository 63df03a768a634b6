use clap::{Parser, Subcommand};
use std::path::PathBuf;

use pdfkit_tools::pdf::images::{Orientation, PageSize};

#[derive(Parser)]
#[command(name = "pdfkit-tools")]
#[command(about = "Merge, split, convert and compress PDFs, with MCP server support")]
#[command(version)]
pub struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as MCP server
    Mcp,

    /// Display PDF metadata
    Info {
        /// PDF file to inspect
        path: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Combine PDFs into one, in the order given
    Merge {
        /// PDF files or directories of PDFs
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file or directory
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Extract a page selection to a new PDF
    #[command(alias = "extract")]
    Split {
        /// PDF file to extract from
        path: PathBuf,

        /// Page selection (e.g., "1-3, 5, 2")
        pages: String,

        /// Output file or directory (default: next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write every page to its own file
    Burst {
        /// PDF file to split
        path: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output_dir: PathBuf,
    },

    /// Lay out images one per page in a new PDF
    Convert {
        /// Image files or directories of images
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Output file or directory
        #[arg(short, long)]
        output: PathBuf,

        #[arg(long, value_enum, default_value_t = PageSize::A4)]
        page_size: PageSize,

        #[arg(long, value_enum, default_value_t = Orientation::Portrait)]
        orientation: Orientation,

        /// Margin around each image, in millimetres
        #[arg(long, default_value_t = 10.0)]
        margin: f32,

        /// JPEG quality for images that are not already JPEGs
        #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u8).range(1..=100))]
        quality: u8,
    },

    /// Rewrite a PDF with unused objects dropped and streams compressed
    Compress {
        /// PDF file to compress
        path: PathBuf,

        /// Output file or directory (default: next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
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
    fn test_extract_alias() {
        let cli = Cli::try_parse_from(["pdfkit-tools", "extract", "a.pdf", "1-2"]).unwrap();
        assert!(matches!(cli.command, Commands::Split { output: None, .. }));
    }

    #[test]
    fn test_convert_defaults() {
        let cli =
            Cli::try_parse_from(["pdfkit-tools", "-v", "convert", "a.png", "-o", "out.pdf"])
                .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Convert {
                page_size,
                orientation,
                margin,
                quality,
                ..
            } => {
                assert_eq!(page_size, PageSize::A4);
                assert_eq!(orientation, Orientation::Portrait);
                assert_eq!(margin, 10.0);
                assert_eq!(quality, 100);
            }
            _ => panic!("expected convert"),
        }
    }

    #[test]
    fn test_quality_range_checked() {
        let args = ["pdfkit-tools", "convert", "a.png", "-o", "o.pdf", "--quality", "0"];
        assert!(Cli::try_parse_from(args).is_err());
    }
}
