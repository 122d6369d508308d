// SPDX-License-Identifier: MIT
//! Command-line surface
//!
//! Accepts both the subcommand spellings (`dupe`, `add`, `help`) and the
//! legacy single-dash modes (`-dupe`, `-add`, `-help`).

use std::ffi::OsString;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tempfile::NamedTempFile;
use tracing::info;

use crate::codec::ContainerCodec;
use crate::config::Config;
use crate::container::{ShaderContainer, TableRole};
use crate::mutator::TableMutator;

#[derive(Parser, Debug)]
#[command(name = "shader-container")]
#[command(about = "Add shaders for game profiles to a shader container", long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Duplicate a profile shader for a new profile
    Dupe {
        /// Container to read
        input: PathBuf,
        /// Where to write the new container
        output: PathBuf,
        /// Profile entry to duplicate
        source_name: String,
        /// Name of the new profile entry
        new_name: String,
    },
    /// Add a profile shader from compiled pixel and vertex blobs
    Add {
        /// Container to read
        input: PathBuf,
        /// Where to write the new container
        output: PathBuf,
        /// Compiled pixel shader
        pixel_blob: PathBuf,
        /// Compiled vertex shader
        vertex_blob: PathBuf,
        /// Name of the new profile entry
        new_name: String,
    },
    /// List the entries of both tables
    Inspect {
        /// Container to read
        input: PathBuf,
    },
}

/// Rewrite a legacy `-dupe` / `-add` / `-help` mode into its subcommand
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .enumerate()
        .map(|(index, arg)| {
            if index != 1 {
                return arg;
            }
            match arg.to_str() {
                Some("-dupe") => OsString::from("dupe"),
                Some("-add") => OsString::from("add"),
                Some("-help") => OsString::from("help"),
                _ => arg,
            }
        })
        .collect()
}

pub fn run(command: Commands, config: &Config) -> Result<()> {
    let codec = ContainerCodec::from_config(config);
    let mutator = TableMutator::from_config(config);

    match command {
        Commands::Dupe {
            input,
            output,
            source_name,
            new_name,
        } => {
            let mut container = read_container(&codec, &input)?;
            mutator
                .duplicate_in_both(&mut container, &source_name, &new_name)
                .with_context(|| format!("Failed to duplicate {source_name:?} as {new_name:?}"))?;
            write_container(&codec, &container, &output)?;
            println!("Wrote new container to {}", output.display());
        }
        Commands::Add {
            input,
            output,
            pixel_blob,
            vertex_blob,
            new_name,
        } => {
            let mut container = read_container(&codec, &input)?;
            let pixel = open(&pixel_blob)?;
            let vertex = open(&vertex_blob)?;
            mutator
                .append_to_both(&mut container, &new_name, pixel, vertex)
                .with_context(|| format!("Failed to add {new_name:?}"))?;
            write_container(&codec, &container, &output)?;
            println!("Wrote new container to {}", output.display());
        }
        Commands::Inspect { input } => {
            let file = open(&input)?;
            let layout = codec
                .scan(file)
                .with_context(|| format!("Failed to read container {}", input.display()))?;
            println!("{} ({} bytes)", input.display(), layout.length);
            for &role in TableRole::all() {
                let entries = layout.entries(role);
                println!("{role} table: {} entries", entries.len());
                for entry in entries {
                    println!(
                        "  {:<32} size={:<10} offset=0x{:x}",
                        entry.name, entry.size, entry.offset
                    );
                }
            }
        }
    }

    Ok(())
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(BufReader::new(file))
}

fn read_container(codec: &ContainerCodec, path: &Path) -> Result<ShaderContainer> {
    info!(path = %path.display(), "Reading container");
    codec
        .decode(open(path)?)
        .with_context(|| format!("Failed to read container {}", path.display()))
}

/// Encode into a temporary file next to `path`, then rename it into place
fn write_container(codec: &ContainerCodec, container: &ShaderContainer, path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let temp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;

    let temp = codec
        .encode(container, BufWriter::new(temp))
        .with_context(|| format!("Failed to encode container for {}", path.display()))?
        .into_inner()
        .map_err(|e| e.into_error())
        .context("Failed to flush container")?;
    temp.as_file().sync_all().context("Failed to sync container")?;
    temp.persist(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!(path = %path.display(), entries = container.entry_count(), "Wrote container");
    Ok(())
}
