use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

fn write_network(dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    fs::write(dir.join("node.dat"), "A\tp\nB\tp\nC\th\nD\tm\n")?;
    fs::write(
        dir.join("link.dat"),
        "A\tB\t1\ta\nB\tA\t1\ta\nB\tC\t2\tb\nC\tD\t1\tb\n",
    )?;
    Ok(())
}

#[test]
fn test_cli_no_args_prints_usage() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("prosnet")?;
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Usage"))
        .stdout(predicate::str::contains("--node"));
    Ok(())
}

#[test]
fn test_cli_missing_value_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    write_network(dir.path())?;

    let mut cmd = Command::cargo_bin("prosnet")?;
    cmd.arg("-node")
        .arg(dir.path().join("node.dat"))
        .arg("-link")
        .arg(dir.path().join("link.dat"))
        .arg("-size");
    cmd.assert().code(1);
    Ok(())
}

#[test]
fn test_cli_invalid_train_mode_fails() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("prosnet")?;
    cmd.args(["-node", "n", "-link", "l", "-train_mode", "9"]);
    cmd.assert().code(1);
    Ok(())
}

#[test]
fn test_cli_unreadable_node_file_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let mut cmd = Command::cargo_bin("prosnet")?;
    cmd.arg("-node")
        .arg(dir.path().join("missing.dat"))
        .arg("-link")
        .arg(dir.path().join("link.dat"));
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to load node file"));
    Ok(())
}

#[test]
fn test_cli_unknown_node_in_link_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    write_network(dir.path())?;
    fs::write(dir.path().join("link.dat"), "A\tZ\t1\ta\n")?;

    let mut cmd = Command::cargo_bin("prosnet")?;
    cmd.arg("-node")
        .arg(dir.path().join("node.dat"))
        .arg("-link")
        .arg(dir.path().join("link.dat"));
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown node: Z"));
    Ok(())
}

#[test]
fn test_cli_trains_and_writes_text() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    write_network(dir.path())?;
    let output = dir.path().join("out").join("vec.txt");

    let mut cmd = Command::cargo_bin("prosnet")?;
    cmd.arg("-node")
        .arg(dir.path().join("node.dat"))
        .arg("-link")
        .arg(dir.path().join("link.dat"))
        .arg("-output")
        .arg(&output)
        .args(["-size", "8", "-samples", "0.01", "-iters", "2", "-threads", "2"])
        .args(["-model", "2", "-meta_path", "unused.txt"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Embeddings written to"));

    let text = fs::read_to_string(&output)?;
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("4 8"));
    let ids: Vec<&str> = lines.map(|l| l.split(' ').next().unwrap_or("")).collect();
    assert_eq!(ids, vec!["A", "B", "C", "D"]);

    // Round 0 checkpoint lands next to the output.
    let periodic: Vec<_> = fs::read_dir(dir.path().join("out"))?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with("node_8_2_0.300000_0_"))
        .collect();
    assert_eq!(periodic.len(), 1);
    assert!(periodic[0]
        .file_name()
        .to_string_lossy()
        .ends_with("_enum_2_lr_0.002500_train_mode_0"));
    Ok(())
}

#[test]
fn test_cli_zero_iters_binary() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    write_network(dir.path())?;
    let output = dir.path().join("vec.bin");

    let mut cmd = Command::cargo_bin("prosnet")?;
    cmd.arg("--node")
        .arg(dir.path().join("node.dat"))
        .arg("--link")
        .arg(dir.path().join("link.dat"))
        .arg("-output")
        .arg(&output)
        .args(["-binary", "1", "-size", "4", "-iters", "0", "-edge_types", "b,x"]);
    cmd.assert().success();

    let bytes = fs::read(&output)?;
    let header = b"4 4\n".len();
    // id + space + 4 floats + newline per node
    assert_eq!(bytes.len(), header + 4 * (1 + 1 + 16 + 1));
    Ok(())
}
