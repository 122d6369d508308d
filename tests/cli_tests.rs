// SPDX-License-Identifier: MIT
//! End-to-end runs of the command pipeline against files in a temp directory

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use tempfile::TempDir;

use shader_container::cli::{normalize_args, run, Cli, Commands};
use shader_container::{
    Config, ContainerCodec, ReadMode, ShaderContainer, ShaderEntry, ShaderTable, TableRole,
};

fn write_sample(dir: &Path) -> PathBuf {
    let container = ShaderContainer::new(
        ShaderTable::from_entries(
            TableRole::Vertex,
            vec![
                ShaderEntry::new("profile_a", vec![0x10u8, 0x11, 0x12]),
                ShaderEntry::new("profile_b", vec![0x20u8]),
            ],
        ),
        ShaderTable::from_entries(
            TableRole::Pixel,
            vec![
                ShaderEntry::new("profile_a", vec![0x30u8]),
                ShaderEntry::new("profile_b", vec![0x40u8, 0x41]),
            ],
        ),
    );
    let path = dir.join("shader.bin");
    fs::write(&path, ContainerCodec::new().encode_to_vec(&container).unwrap()).unwrap();
    path
}

fn read(path: &Path) -> ShaderContainer {
    ContainerCodec::new()
        .decode_slice(&fs::read(path).unwrap())
        .unwrap()
}

fn command(args: &[&str]) -> Commands {
    Cli::try_parse_from(normalize_args(args.iter().copied()))
        .unwrap()
        .command
}

#[test]
fn dupe_writes_new_container() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let input = write_sample(temp_dir.path());
    let output = temp_dir.path().join("out").join("shader.bin");
    fs::create_dir_all(output.parent().unwrap()).unwrap();

    run(
        command(&[
            "tool",
            "-dupe",
            input.to_str().unwrap(),
            output.to_str().unwrap(),
            "profile_b",
            "profile_c",
        ]),
        &Config::default(),
    )
    .unwrap();

    let result = read(&output);
    assert_eq!(result.vertex.len(), 3);
    assert_eq!(result.pixel.len(), 3);
    assert_eq!(result.vertex.entries()[2].name(), "profile_c");
    assert_eq!(&result.vertex.entries()[2].payload()[..], &[0x20]);
    assert_eq!(&result.pixel.entries()[2].payload()[..], &[0x40, 0x41]);

    // Input is left untouched.
    assert_eq!(read(&input).vertex.len(), 2);
}

#[test]
fn add_reads_pixel_and_vertex_blobs() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let input = write_sample(temp_dir.path());
    let pixel_blob = temp_dir.path().join("ps.dxbc");
    let vertex_blob = temp_dir.path().join("vs.dxbc");
    fs::write(&pixel_blob, b"DXBC-pixel").unwrap();
    fs::write(&vertex_blob, b"DXBC-vertex-shader").unwrap();
    let output = temp_dir.path().join("new.bin");

    run(
        Commands::Add {
            input,
            output: output.clone(),
            pixel_blob,
            vertex_blob,
            new_name: "profile_z".to_string(),
        },
        &Config::default(),
    )
    .unwrap();

    let result = read(&output);
    let vertex = result.vertex.entries().last().unwrap();
    let pixel = result.pixel.entries().last().unwrap();
    assert_eq!(vertex.name(), "profile_z");
    assert_eq!(&vertex.payload()[..], b"DXBC-vertex-shader");
    assert_eq!(pixel.name(), "profile_z");
    assert_eq!(&pixel.payload()[..], b"DXBC-pixel");
}

#[test]
fn output_may_replace_input() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let input = write_sample(temp_dir.path());

    run(
        Commands::Dupe {
            input: input.clone(),
            output: input.clone(),
            source_name: "profile_a".to_string(),
            new_name: "profile_a2".to_string(),
        },
        &Config::default(),
    )
    .unwrap();

    let result = read(&input);
    assert_eq!(result.vertex.len(), 3);
    assert_eq!(&result.pixel.entries()[2].payload()[..], &[0x30]);
}

#[test]
fn missing_source_leaves_no_output() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let input = write_sample(temp_dir.path());
    let output = temp_dir.path().join("never.bin");

    let err = run(
        Commands::Dupe {
            input,
            output: output.clone(),
            source_name: "profile_missing".to_string(),
            new_name: "profile_c".to_string(),
        },
        &Config::default(),
    )
    .unwrap_err();

    assert!(format!("{err:#}").contains("profile_missing"));
    assert!(!output.exists());
    // Only the input remains in the directory; no stray temp files.
    assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
}

#[test]
fn missing_blob_is_an_error() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let input = write_sample(temp_dir.path());

    let err = run(
        Commands::Add {
            input,
            output: temp_dir.path().join("new.bin"),
            pixel_blob: temp_dir.path().join("missing_ps.dxbc"),
            vertex_blob: temp_dir.path().join("missing_vs.dxbc"),
            new_name: "profile_z".to_string(),
        },
        &Config::default(),
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("missing_ps.dxbc"));
}

#[test]
fn truncated_input_depends_on_read_mode() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let input = write_sample(temp_dir.path());
    let mut bytes = fs::read(&input).unwrap();
    bytes.pop();
    fs::write(&input, &bytes).unwrap();
    let output = temp_dir.path().join("out.bin");

    let dupe = || Commands::Dupe {
        input: input.clone(),
        output: output.clone(),
        source_name: "profile_a".to_string(),
        new_name: "profile_c".to_string(),
    };

    assert!(run(dupe(), &Config::default()).is_err());

    let lenient = Config {
        read_mode: ReadMode::Lenient,
        ..Config::default()
    };
    run(dupe(), &lenient).unwrap();
    let result = read(&output);
    assert_eq!(&result.pixel.entries()[1].payload()[..], &[0x40, 0x00]);
    assert_eq!(result.pixel.entries()[2].name(), "profile_c");
}

#[test]
fn inspect_reads_without_writing() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let input = write_sample(temp_dir.path());

    run(command(&["tool", "inspect", input.to_str().unwrap()]), &Config::default()).unwrap();
    assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
}
