//! msf command-line tool
//!
//! Lists and extracts the streams of an MSF (PDB) container

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use msf_rs::{from_dos_datetime, ArchiveBuilder, Entry, MsfArchive};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "msf")]
#[command(about = "Inspect and extract streams of MSF (PDB) containers")]
struct Args {
    /// TOML file with directory options
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Do not check page numbers against the file size
    #[arg(long, global = true)]
    no_verify_pages: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List present streams
    List {
        /// Container file
        file: PathBuf,

        /// Print entries as JSON
        #[arg(long)]
        json: bool,

        /// Compute a CRC-32 for every stream
        #[arg(long)]
        crc: bool,
    },

    /// Extract streams into a directory, one file per stream
    Extract {
        /// Container file
        file: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Extract only this stream
        #[arg(short, long)]
        stream: Option<usize>,
    },

    /// Write one stream to stdout
    Cat {
        /// Container file
        file: PathBuf,

        /// Stream index
        index: usize,
    },
}

#[derive(Serialize)]
struct ListedEntry {
    #[serde(flatten)]
    entry: Entry,

    #[serde(skip_serializing_if = "Option::is_none")]
    crc32: Option<u32>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    match &args.command {
        Command::List { file, json, crc } => {
            let archive = open_archive(&args, file)?;
            list(&archive, *json, *crc)
        }
        Command::Extract {
            file,
            output,
            stream,
        } => {
            let archive = open_archive(&args, file)?;
            extract(&archive, output, *stream)
        }
        Command::Cat { file, index } => {
            let archive = open_archive(&args, file)?;
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            archive
                .extract_to(*index, &mut out)
                .with_context(|| format!("failed to read stream {}", index))?;
            out.flush()?;
            Ok(())
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn open_archive(args: &Args, file: &Path) -> Result<MsfArchive> {
    let mut builder = ArchiveBuilder::new().path(file);

    if let Some(config) = &args.config {
        debug!("Loading options from {:?}", config);
        builder = builder
            .config_file(config)
            .with_context(|| format!("failed to load config {}", config.display()))?;
    }

    if args.no_verify_pages {
        builder = builder.verify_page_bounds(false);
    }

    builder
        .build()
        .with_context(|| format!("failed to open {}", file.display()))
}

fn list(archive: &MsfArchive, json: bool, crc: bool) -> Result<()> {
    let mut listed = Vec::new();
    for entry in archive.entries() {
        let crc32 = if crc {
            Some(archive.checksum(entry.index)?)
        } else {
            None
        };
        listed.push(ListedEntry { entry, crc32 });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&listed)?);
        return Ok(());
    }

    println!(
        "{} stream slots, page size {}",
        archive.directory().stream_count(),
        archive.directory().page_size()
    );
    for item in &listed {
        let time = item
            .entry
            .modified
            .and_then(from_dos_datetime)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());

        match item.crc32 {
            Some(crc32) => println!(
                "{:>6} {:>12} {:>19} {:08x}",
                item.entry.name, item.entry.size, time, crc32
            ),
            None => println!("{:>6} {:>12} {:>19}", item.entry.name, item.entry.size, time),
        }
    }

    Ok(())
}

fn extract(archive: &MsfArchive, output: &Path, stream: Option<usize>) -> Result<()> {
    match stream {
        Some(index) => {
            std::fs::create_dir_all(output)?;
            let path = output.join(index.to_string());
            let mut writer = BufWriter::new(File::create(&path)?);
            let written = archive
                .extract_to(index, &mut writer)
                .with_context(|| format!("failed to extract stream {}", index))?;
            writer.flush()?;
            info!("Wrote {} bytes to {:?}", written, path);
        }
        None => {
            let count = archive
                .extract_all(output)
                .with_context(|| format!("failed to extract to {}", output.display()))?;
            info!("Wrote {} streams to {:?}", count, output);
        }
    }

    Ok(())
}
