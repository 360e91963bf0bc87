use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

fn level_file(name: &str, contents: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("sandsink-cli-{}", std::process::id()));
    fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join(format!("{name}.level"));
    fs::write(&path, contents).expect("write level");
    path
}

const CORRIDOR: &str = "v1\n:name Corridor\n:layers\n1111\n1111\n---\n0003\n0000\n---\n2000\n0000\n";

#[test]
fn play_with_a_move_script_reports_completion() {
    let path = level_file("corridor", CORRIDOR);

    let output = Command::new(env!("CARGO_BIN_EXE_sandsink"))
        .arg("play")
        .arg(&path)
        .args(["--moves", "ddd"])
        .output()
        .expect("run sandsink");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf8");
    assert!(stdout.starts_with("@..>\n....\n"), "unexpected output {stdout:?}");
    assert!(stdout.contains("level completed in 3 turns"));
}

#[test]
fn check_reports_unplayable_levels() {
    let good = level_file("good", CORRIDOR);
    let bad = level_file("no-actor", "v1\n:layers\n11\n11\n");

    let output = Command::new(env!("CARGO_BIN_EXE_sandsink"))
        .arg("check")
        .arg(&good)
        .arg(&bad)
        .output()
        .expect("run sandsink");

    assert!(!output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf8");
    assert!(stdout.contains("\"Corridor\" 4x2, 3 layers"));
}

#[test]
fn format_pads_layers_to_the_level_size() {
    let path = level_file("ragged", "v1\n:name Ragged\n:layers\n111\n111\n---\n2\n");

    let status = Command::new(env!("CARGO_BIN_EXE_sandsink"))
        .arg("format")
        .arg(&path)
        .status()
        .expect("run sandsink");

    assert!(status.success());
    assert_eq!(
        fs::read_to_string(&path).expect("read back"),
        "v1\n:name Ragged\n:layers\n111\n111\n---\n200\n000\n"
    );
}

#[test]
fn bundled_campaign_can_be_won() {
    let workspace = Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
    let mut child = Command::new(env!("CARGO_BIN_EXE_sandsink"))
        .arg("campaign")
        .current_dir(&workspace)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("run sandsink");

    child
        .stdin
        .take()
        .expect("piped stdin")
        .write_all(b"dddd\ndddd\nsssdddd\n")
        .expect("write moves");
    let output = child.wait_with_output().expect("wait for sandsink");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf8");
    assert!(stdout.contains("level 1/3: First steps"));
    assert!(stdout.contains("level 3/3: Lilies"));
    assert!(stdout.ends_with("victory! every level is completed\n"));
}
