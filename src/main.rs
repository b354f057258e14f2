use std::{
    io::{self, Write},
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::Parser;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::{info, span, Level};

use cdnfs::{
    adapters::s3::S3Adapter,
    config::{AppConfig, Args, Command},
    logging, Config, Entry, ObjectFS,
};

fn main() -> Result<()> {
    logging::init_logger();

    let span = span!(Level::INFO, "main", context = "main");
    let _e = span.enter();
    info!("called");

    let args = Args::parse();
    let config = AppConfig::from_args(&args)?;
    info!(
        storage_name = %config.s3.storage_name,
        endpoint = %config.s3.endpoint,
        subfolder = %config.s3.subfolder,
        "args"
    );

    let client = S3Adapter::connect(&config.s3).context("failed to build the S3 client")?;
    let fs = ObjectFS::new(Arc::new(client)).with_last_modified_skew(config.last_modified_skew);

    run(&fs, args.command)
}

fn run(fs: &ObjectFS, command: Command) -> Result<()> {
    let mut stdout = io::stdout().lock();

    match command {
        Command::Ls { deep, path } => {
            for entry in fs.list_contents(&path, deep) {
                let entry = entry.with_context(|| format!("failed to list: {}", path))?;
                writeln!(stdout, "{}", format_entry(&entry))?;
            }
        }
        Command::Cat { path } => {
            let mut reader = fs.read_stream(&path)?;
            io::copy(&mut reader, &mut stdout)?;
        }
        Command::Put { path, file } => {
            let contents = std::fs::read(&file)
                .with_context(|| format!("failed to read local file: {}", file.display()))?;
            fs.write(&path, &contents, &Config::default())?;
        }
        Command::Cp {
            source,
            destination,
        } => fs.copy(&source, &destination, &Config::default())?,
        Command::Mv {
            source,
            destination,
        } => fs.move_path(&source, &destination, &Config::default())?,
        Command::Rm { path } => fs.delete(&path)?,
        Command::Rmdir { path } => fs.delete_directory(&path)?,
        Command::Mkdir { path } => fs.create_directory(&path, &Config::default())?,
        Command::Stat { path } => {
            let size = fs.file_size(&path)?;
            let modified = fs.last_modified(&path)?;
            let mime_type = fs.mime_type(&path)?;
            let visibility = fs.visibility(&path)?;

            writeln!(stdout, "path: {}", size.path)?;
            writeln!(stdout, "size: {}", size.file_size.unwrap_or(0))?;
            writeln!(stdout, "modified: {}", format_timestamp(modified.last_modified))?;
            writeln!(stdout, "mime_type: {}", mime_type.mime_type.unwrap_or_default())?;
            if let Some(visibility) = visibility.visibility {
                writeln!(stdout, "visibility: {}", visibility)?;
            }
        }
        Command::Checksum { algo, path } => {
            let checksum = fs.checksum(&path, &Config::default().with_checksum_algo(algo))?;
            writeln!(stdout, "{}  {}", checksum, path)?;
        }
    }

    Ok(())
}

fn format_entry(entry: &Entry) -> String {
    match entry {
        Entry::File(file) => format!(
            "file {:>12} {} {}",
            file.file_size.unwrap_or(0),
            format_timestamp(entry.last_modified()),
            file.path
        ),
        Entry::Directory(dir) => format!(
            "dir  {:>12} {} {}/",
            "-",
            format_timestamp(entry.last_modified()),
            dir.path
        ),
    }
}

fn format_timestamp(timestamp: Option<i64>) -> String {
    timestamp
        .and_then(|ts| OffsetDateTime::from_unix_timestamp(ts).ok())
        .and_then(|dt| dt.format(&Rfc3339).ok())
        .unwrap_or_else(|| "-".to_string())
}
