use assert_cmd::Command;
use predicates::str::contains;
use tempfile::TempDir;

fn shell(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ifo_ledger_cli").unwrap();
    cmd.env("IFO_LEDGER_HOME", home.path())
        .env("IFO_LEDGER_CLI_SCRIPT", "1")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn script_mode_adds_and_commits_rows() {
    let home = TempDir::new().unwrap();
    let input = "\
add Date=2024-01-01 Type=spending Category=food Currency=USD InputValue=0 OutputValue=12.5 OutputAccount=Checking
add Date=2024-01-15 Type=earning Category=salary Currency=USD InputValue=900 OutputValue=0 \"Description=January pay\"
commit
exit
";

    shell(&home)
        .write_stdin(input)
        .assert()
        .success()
        .stdout(contains("No ledger found"))
        .stdout(contains("Added row 0."))
        .stdout(contains("Added row 1."))
        .stdout(contains("Saved 2 row(s)."));

    let json = std::fs::read_to_string(home.path().join("data").join("database.json")).unwrap();
    assert!(json.contains("\"January pay\""));
    assert!(json.contains("\"2024-01-15\""));
}

#[test]
fn script_mode_filters_and_sums_saved_rows() {
    let home = TempDir::new().unwrap();
    shell(&home)
        .write_stdin(
            "add Date=2024-02-01 Type=spending Category=food Currency=USD InputValue=0 OutputValue=4\n\
             add Date=2024-02-03 Type=spending Category=rent Currency=USD InputValue=0 OutputValue=600\n\
             commit\n",
        )
        .assert()
        .success();

    shell(&home)
        .write_stdin("sum OutputValue Category=food\nfilter StartDate=2024-02-02\n")
        .assert()
        .success()
        .stdout(contains("Sum of OutputValue: 4.00"))
        .stdout(contains("rent"))
        .stdout(contains("1 row(s)."));
}

#[test]
fn script_mode_reports_bad_input_and_keeps_going() {
    let home = TempDir::new().unwrap();
    shell(&home)
        .write_stdin("filter Merchant=acme\nadd Date=2024-01-01\nlsit\nlist\n")
        .assert()
        .success()
        .stderr(contains("Invalid predicate"))
        .stderr(contains("Malformed record"))
        .stderr(contains("Unknown command `lsit`"))
        .stdout(contains("Suggestion: `list`?"))
        .stdout(contains("No transactions."));
}

#[test]
fn script_mode_backs_up_and_restores() {
    let home = TempDir::new().unwrap();
    shell(&home)
        .write_stdin(
            "restore\n\
             add Date=2024-03-01 Type=spending Category=food Currency=USD InputValue=0 OutputValue=1\n\
             commit\n\
             backup\n\
             snapshots\n\
             remove 0\n\
             commit\n\
             restore\n\
             list\n",
        )
        .assert()
        .success()
        .stderr(contains("No backup"))
        .stdout(contains("Backup written to"))
        .stdout(contains("Removed 1 row(s)."))
        .stdout(contains("Restored backup from"))
        .stdout(contains("1 row(s)."));
}

#[test]
fn corrupt_store_without_backup_is_left_intact() {
    let home = TempDir::new().unwrap();
    let data = home.path().join("data");
    std::fs::create_dir_all(&data).unwrap();
    let store = data.join("database.json");
    let original = "{\"0\": {\"Date\": \"2024-01-01\", \"Type\"";
    std::fs::write(&store, original).unwrap();

    shell(&home)
        .write_stdin("commit\ncommit\n")
        .assert()
        .failure()
        .stderr(contains("Store unavailable"));

    assert_eq!(std::fs::read_to_string(&store).unwrap(), original);
    assert!(!home.path().join("backup").exists());
}
