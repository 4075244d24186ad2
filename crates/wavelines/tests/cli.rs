use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn wavelines(config_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_wavelines"))
        .env("WAVELINES_CONFIG_DIR", config_dir)
        .env("RUST_LOG", "warn")
        .args(args)
        .output()
        .expect("failed to run wavelines")
}

fn png_dimensions(bytes: &[u8]) -> (u32, u32) {
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    assert_eq!(&bytes[12..16], b"IHDR");
    let width = u32::from_be_bytes(bytes[16..20].try_into().unwrap());
    let height = u32::from_be_bytes(bytes[20..24].try_into().unwrap());
    (width, height)
}

#[test]
fn config_check_prints_defaults_without_a_file() {
    let root = TempDir::new().unwrap();
    let output = wavelines(root.path(), &["config", "check"]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("\"bands\""));
    assert!(stdout.contains("\"mix_blend_mode\": \"screen\""));
}

#[test]
fn config_check_reads_the_default_config_file() {
    let root = TempDir::new().unwrap();
    fs::write(
        root.path().join("wavelines.toml"),
        "version = 1\n\n[lines]\nenabled_waves = [\"middle\"]\nline_count = 4\ninteractive = false\n",
    )
    .unwrap();

    let output = wavelines(root.path(), &["config", "check"]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("\"line_count\": 4"));
    assert!(stdout.contains("\"interactive\": false"));
}

#[test]
fn config_check_rejects_broken_files() {
    let root = TempDir::new().unwrap();
    let path = root.path().join("broken.toml");
    fs::write(&path, "[lines\nline_count = ").unwrap();

    let output = wavelines(
        root.path(),
        &["config", "check", "--config", path.to_str().unwrap()],
    );
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn config_check_rejects_unknown_versions() {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("wavelines.toml"), "version = 7\n").unwrap();

    let output = wavelines(root.path(), &["config", "check"]);
    assert!(!output.status.success());
}

#[test]
fn snapshot_writes_a_png_of_the_requested_size() {
    let root = TempDir::new().unwrap();
    let out = root.path().join("still.png");

    let output = wavelines(
        root.path(),
        &[
            "snapshot",
            "--out",
            out.to_str().unwrap(),
            "--size",
            "40x24",
            "--time",
            "1.5",
            "--pointer",
            "20,12",
        ],
    );
    assert!(output.status.success());

    let bytes = fs::read(&out).unwrap();
    assert_eq!(png_dimensions(&bytes), (40, 24));
}

#[test]
fn snapshot_uses_the_preview_size_from_config() {
    let root = TempDir::new().unwrap();
    let config = root.path().join("lines.json");
    fs::write(
        &config,
        r##"{"preview": {"width": 32, "height": 18}, "lines": {"linesGradient": ["#e947f5", "#2f4ba2"]}}"##,
    )
    .unwrap();
    let out = root.path().join("still.png");

    let output = wavelines(
        root.path(),
        &[
            "snapshot",
            "--out",
            out.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
        ],
    );
    assert!(output.status.success());
    assert_eq!(png_dimensions(&fs::read(&out).unwrap()), (32, 18));
}

#[test]
fn snapshot_rejects_zero_sizes() {
    let root = TempDir::new().unwrap();
    let out = root.path().join("still.png");

    let output = wavelines(
        root.path(),
        &["snapshot", "--out", out.to_str().unwrap(), "--size", "0x10"],
    );
    assert!(!output.status.success());
    assert!(!out.exists());
}
