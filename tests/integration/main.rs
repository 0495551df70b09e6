// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Integration tests.
//!
//! Some help for laying out these tests was taken from:
//! https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html

use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
    process::Output,
    str::from_utf8,
};

use assert_cmd::{output::OutputError, Command};
use indoc::indoc;
use tempfile::TempDir;

use chansparse::{ChannelSparsity, Id, SparsityDict};

fn chansparse() -> Command {
    Command::cargo_bin("chansparse").unwrap()
}

fn get_cmd_output(result: Result<Output, OutputError>) -> (String, String) {
    let output = match result {
        Ok(o) => o,
        Err(o) => o.as_output().unwrap().clone(),
    };
    (
        from_utf8(&output.stdout).unwrap().to_string(),
        from_utf8(&output.stderr).unwrap().to_string(),
    )
}

fn make_file_in_dir<T: AsRef<Path>, U: AsRef<Path>>(filename: T, dir: U, contents: &str) -> PathBuf {
    let path = dir.as_ref().join(filename);
    let mut f = File::create(&path).expect("couldn't make file");
    f.write_all(contents.as_bytes()).expect("couldn't write file");
    path
}

/// Two units on three channels. Unit 0 peaks on channel "b", unit 1 on "c".
const TEMPLATES_JSON: &str = indoc! {r#"
    {
        "templates": [
            [[0.0, -1.0, 0.0], [-2.0, -9.0, -1.0]],
            [[0.0, 0.0, -1.0], [0.0, -3.0, -7.0]]
        ],
        "sampling_frequency": 30000.0,
        "nbefore": 1,
        "channel_ids": ["a", "b", "c"],
        "unit_ids": [0, 1],
        "channel_locations": [[0.0, 0.0], [0.0, 25.0], [0.0, 50.0]],
        "noise_levels": [1.0, 1.0, 1.0]
    }
"#};

fn read_sparsity(path: &Path) -> ChannelSparsity {
    let dict = SparsityDict::read(path).unwrap();
    ChannelSparsity::from_dict(&dict).unwrap()
}

#[test]
fn test_compute_best_channels() {
    let tmp_dir = TempDir::new().unwrap();
    let templates = make_file_in_dir("templates.json", tmp_dir.path(), TEMPLATES_JSON);
    let output = tmp_dir.path().join("sparsity.json");

    let cmd = chansparse()
        .args([
            "compute",
            "-t",
            &format!("{}", templates.display()),
            "-m",
            "best_channels",
            "--num-channels",
            "1",
            "-o",
            &format!("{}", output.display()),
            "--no-progress-bars",
        ])
        .ok();
    assert!(cmd.is_ok(), "compute failed on simple test data: {}", cmd.err().unwrap());

    let sparsity = read_sparsity(&output);
    assert_eq!(sparsity.unit_ids(), &[Id::Int(0), Id::Int(1)]);
    assert_eq!(sparsity.channel_ids_of(&Id::Int(0)).unwrap(), &[Id::from("b")]);
    assert_eq!(sparsity.channel_ids_of(&Id::Int(1)).unwrap(), &[Id::from("c")]);

    // The written file can be summarised.
    let cmd = chansparse()
        .args(["info", &format!("{}", output.display())])
        .ok();
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("Max. number of active channels: 1"), "{stdout}");
}

#[test]
fn test_compute_snr_with_toml_arg_file() {
    let tmp_dir = TempDir::new().unwrap();
    let templates = make_file_in_dir("templates.json", tmp_dir.path(), TEMPLATES_JSON);
    let output = tmp_dir.path().join("sparsity.toml");
    let args_file = make_file_in_dir(
        "args.toml",
        tmp_dir.path(),
        &format!(
            "templates = {:?}\nmethod = \"snr\"\nthreshold = 3.0\noutput = {:?}\n",
            templates.display().to_string(),
            output.display().to_string()
        ),
    );

    let cmd = chansparse()
        .args([
            "compute",
            &format!("{}", args_file.display()),
            "--no-progress-bars",
        ])
        .ok();
    assert!(cmd.is_ok(), "compute failed with an args file: {}", cmd.err().unwrap());

    let sparsity = read_sparsity(&output);
    assert_eq!(
        sparsity.channel_ids_of(&Id::Int(0)).unwrap(),
        &[Id::from("b")]
    );
    assert_eq!(
        sparsity.channel_ids_of(&Id::Int(1)).unwrap(),
        &[Id::from("b"), Id::from("c")]
    );
}

#[test]
fn test_compute_unknown_method() {
    let tmp_dir = TempDir::new().unwrap();
    let templates = make_file_in_dir("templates.json", tmp_dir.path(), TEMPLATES_JSON);

    let cmd = chansparse()
        .args([
            "compute",
            "-t",
            &format!("{}", templates.display()),
            "-m",
            "nearest",
            "--no-progress-bars",
        ])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("nearest"), "{stderr}");
    assert!(stderr.contains("best_channels"), "{stderr}");
}

#[test]
fn test_compute_missing_templates() {
    let cmd = chansparse()
        .args(["compute", "-m", "radius", "--no-progress-bars"])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("No templates file"), "{stderr}");
}

#[test]
fn test_dry_run_writes_nothing() {
    let tmp_dir = TempDir::new().unwrap();
    let templates = make_file_in_dir("templates.json", tmp_dir.path(), TEMPLATES_JSON);
    let output = tmp_dir.path().join("sparsity.json");

    let cmd = chansparse()
        .args([
            "compute",
            "-t",
            &format!("{}", templates.display()),
            "-o",
            &format!("{}", output.display()),
            "--dry-run",
            "--no-progress-bars",
        ])
        .ok();
    assert!(cmd.is_ok(), "{}", cmd.err().unwrap());
    assert!(!output.exists());
}

#[test]
fn test_estimate_radius() {
    let tmp_dir = TempDir::new().unwrap();
    // 40 samples of silence on 3 channels, 100 um apart, with a negative
    // deflection under channel 0 at samples 10 and 25, and under channel 2 at
    // sample 18.
    let mut traces = vec![vec![0.0; 3]; 40];
    for s in [10, 25] {
        traces[s][0] = -10.0;
        traces[s][1] = -2.0;
    }
    traces[18][2] = -6.0;
    let json = serde_json::json!({
        "sampling_frequency": 1000.0,
        "channel_ids": [0, 1, 2],
        "traces": [traces],
        "channel_locations": [[0.0, 0.0], [0.0, 100.0], [0.0, 200.0]],
        "unit_ids": ["u0", "u1"],
        "spike_trains": [[[10, 25], [18]]],
    });
    let recording = make_file_in_dir("recording.json", tmp_dir.path(), &json.to_string());
    let output = tmp_dir.path().join("sparsity.json");

    let cmd = chansparse()
        .args([
            "estimate",
            "-r",
            &format!("{}", recording.display()),
            "--ms-before",
            "2",
            "--ms-after",
            "3",
            "--radius-um",
            "100",
            "-o",
            &format!("{}", output.display()),
            "--no-progress-bars",
        ])
        .ok();
    assert!(cmd.is_ok(), "estimate failed on simple test data: {}", cmd.err().unwrap());

    let sparsity = read_sparsity(&output);
    assert_eq!(
        sparsity.channel_ids_of(&Id::from("u0")).unwrap(),
        &[Id::Int(0), Id::Int(1)]
    );
    assert_eq!(
        sparsity.channel_ids_of(&Id::from("u1")).unwrap(),
        &[Id::Int(1), Id::Int(2)]
    );
}

#[test]
fn test_estimate_rejects_snr() {
    let tmp_dir = TempDir::new().unwrap();
    let json = serde_json::json!({
        "sampling_frequency": 1000.0,
        "channel_ids": [0],
        "traces": [[[0.0], [0.0], [0.0]]],
        "channel_locations": [[0.0, 0.0]],
        "unit_ids": [0],
        "spike_trains": [[[1]]],
    });
    let recording = make_file_in_dir("recording.json", tmp_dir.path(), &json.to_string());

    let cmd = chansparse()
        .args([
            "estimate",
            "-r",
            &format!("{}", recording.display()),
            "-m",
            "snr",
            "--no-progress-bars",
        ])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("snr"), "{stderr}");
}

#[test]
fn test_compute_nonexistent_templates() {
    let tmp_dir = TempDir::new().unwrap();
    let templates = tmp_dir.path().join("does_not_exist.json");

    let cmd = chansparse()
        .args([
            "compute",
            "-t",
            &format!("{}", templates.display()),
            "--no-progress-bars",
        ])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("Couldn't open"), "{stderr}");
    assert!(stderr.contains("does_not_exist.json"), "{stderr}");
    assert!(stderr.contains("Input files are json"), "{stderr}");
}

#[test]
fn test_compute_help() {
    let cmd = chansparse().args(["compute", "--help"]).ok();
    assert!(cmd.is_ok(), "{}", cmd.err().unwrap());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("A file of arguments (toml, json)"), "{stdout}");
    assert!(stdout.contains("Hide the per-unit progress bars"), "{stdout}");
    assert!(stdout.contains("-vv trace messages"), "{stdout}");
}
