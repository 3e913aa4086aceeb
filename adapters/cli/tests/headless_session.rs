use std::{fs, process::Command};

fn stream_siege() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_stream-siege"));
    let _ = command.env("RUST_LOG", "warn");
    command
}

#[test]
fn demo_script_starts_the_first_wave() {
    let output = stream_siege()
        .args(["--seconds", "5", "--fps", "20"])
        .output()
        .expect("run stream-siege");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Welcome to Stream Siege."));
    assert!(stdout.contains("phase -> Preparation"));
    assert!(stdout.contains("wave 1 begins"));
}

#[test]
fn scripts_and_configs_are_read_from_disk() {
    let dir = tempfile::tempdir().expect("temp dir");
    let script = dir.path().join("session.txt");
    fs::write(&script, "t=0 chat u1 Aki 戦士\nt=0.5 place-all\nt=1 start\n").expect("script");
    let config = dir.path().join("session.toml");
    fs::write(&config, "locale = \"japanese\"\nfps = 10\n").expect("config");

    let output = stream_siege()
        .arg("--script")
        .arg(&script)
        .arg("--config")
        .arg(&config)
        .args(["--seconds", "3", "--mode", "tiktok"])
        .output()
        .expect("run stream-siege");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("wave 1 begins"));
}

#[test]
fn malformed_scripts_fail_with_the_line_number() {
    let dir = tempfile::tempdir().expect("temp dir");
    let script = dir.path().join("broken.txt");
    fs::write(&script, "t=0 start\nt=1 summon dragon\n").expect("script");

    let output = stream_siege()
        .arg("--script")
        .arg(&script)
        .output()
        .expect("run stream-siege");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("script line 2"));
}
