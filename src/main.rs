mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use pdfkit_tools::commands;
use pdfkit_tools::pdf::images::PageLayout;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries command output and the MCP transport.
    let default_filter = if cli.verbose {
        "pdfkit_tools=debug"
    } else {
        "pdfkit_tools=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Mcp => {
            pdfkit_tools::run_server().await?;
        }
        Commands::Info { path, json } => {
            commands::info::run(&path, json)?;
        }
        Commands::Merge { inputs, output } => {
            commands::merge::run(&inputs, &output)?;
        }
        Commands::Split {
            path,
            pages,
            output,
        } => {
            commands::split::run(&path, &pages, output)?;
        }
        Commands::Burst { path, output_dir } => {
            commands::burst::run(&path, &output_dir)?;
        }
        Commands::Convert {
            images,
            output,
            page_size,
            orientation,
            margin,
            quality,
        } => {
            let layout = PageLayout {
                size: page_size,
                orientation,
                margin_mm: margin,
                quality,
            };
            commands::convert::run(&images, &output, layout)?;
        }
        Commands::Compress { path, output } => {
            commands::compress::run(&path, output)?;
        }
    }

    Ok(())
}
