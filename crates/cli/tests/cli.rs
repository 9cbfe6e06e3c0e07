use assert_cmd::Command;

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("bookshelf-cli").unwrap();
    cmd.env("BOOKSHELF_CONFIG_DIR", std::env::temp_dir().join("bookshelf-cli-no-config"))
        .env_remove("BOOKSHELF_ENV");
    cmd
}

#[test]
fn help_lists_subcommands() {
    let output = cli().arg("--help").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("serve"));
    assert!(stdout.contains("config"));
}

#[test]
fn config_prints_environment_overrides() {
    let output = cli()
        .env("BOOKSHELF_SERVER__PORT", "9100")
        .arg("config")
        .output()
        .unwrap();
    assert!(output.status.success());

    let settings: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(settings["server"]["port"], 9100);
    assert_eq!(settings["environment"], "local");
}

#[test]
fn unknown_environment_fails() {
    cli().env("BOOKSHELF_ENV", "qa").arg("config").assert().failure();
}
