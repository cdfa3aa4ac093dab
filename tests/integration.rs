use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const POKEMON_CSV: &str = "\
#,Name,Type 1,Type 2,Total,HP,Attack,Defense,Sp. Atk,Sp. Def,Speed,Generation,Legendary
1,Bulbasaur,Grass,Poison,318,45,49,49,65,65,45,1,False
4,Charmander,Fire,,309,39,52,43,60,50,65,1,False
150,Mewtwo,Psychic,,680,106,110,90,154,90,130,1,True
152,Chikorita,Grass,,318,45,49,65,49,65,45,2,False
249,Lugia,Psychic,Flying,680,106,90,130,90,154,110,2,True
";

fn catalog_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("catalog");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    fs::write(root.join("pokemon.csv"), POKEMON_CSV).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/catalog.sqlite"

[server]
bind = "127.0.0.1:7340"
"#,
        root.display()
    );

    let config_path = config_dir.join("catalog.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_catalog(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = catalog_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run catalog binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn csv_path(config_path: &Path) -> String {
    config_path
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("pokemon.csv")
        .display()
        .to_string()
}

/// Id of the listed entry with the given name.
fn id_of(list_stdout: &str, name: &str) -> String {
    list_stdout
        .lines()
        .find(|line| line.split_whitespace().nth(1) == Some(name))
        .and_then(|line| line.split_whitespace().next())
        .unwrap_or_else(|| panic!("{} not in output:\n{}", name, list_stdout))
        .to_string()
}

fn imported_env() -> (TempDir, PathBuf) {
    let (tmp, config_path) = setup_test_env();
    let (_, stderr, success) = run_catalog(&config_path, &["init"]);
    assert!(success, "init failed: {}", stderr);
    let csv = csv_path(&config_path);
    let (_, stderr, success) = run_catalog(&config_path, &["import", &csv]);
    assert!(success, "import failed: {}", stderr);
    (tmp, config_path)
}

#[test]
fn test_init_creates_database() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_catalog(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_catalog(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_catalog(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_import_reports_count() {
    let (_tmp, config_path) = setup_test_env();
    run_catalog(&config_path, &["init"]);

    let csv = csv_path(&config_path);
    let (stdout, stderr, success) = run_catalog(&config_path, &["import", &csv]);
    assert!(success, "import failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Imported 5 entries (0 skipped)"), "got: {}", stdout);
}

#[test]
fn test_import_missing_file_fails() {
    let (_tmp, config_path) = setup_test_env();
    run_catalog(&config_path, &["init"]);

    let (_, stderr, success) = run_catalog(&config_path, &["import", "/nonexistent/file.csv"]);
    assert!(!success);
    assert!(stderr.contains("ingestion failed"), "got: {}", stderr);
}

#[test]
fn test_list_all_ordered_by_name() {
    let (_tmp, config_path) = imported_env();

    let (stdout, _, success) = run_catalog(&config_path, &["list"]);
    assert!(success);
    assert!(stdout.contains("page 1/1 (5 total, limit 10)"), "got: {}", stdout);

    let names: Vec<&str> = stdout
        .lines()
        .skip(1)
        .filter_map(|l| l.split_whitespace().nth(1))
        .collect();
    assert_eq!(
        names,
        vec!["Bulbasaur", "Charmander", "Chikorita", "Lugia", "Mewtwo"]
    );
}

#[test]
fn test_list_filters() {
    let (_tmp, config_path) = imported_env();

    let (stdout, _, success) = run_catalog(
        &config_path,
        &["list", "--legendary", "true", "--generation", "1"],
    );
    assert!(success);
    assert!(stdout.contains("Mewtwo"));
    assert!(!stdout.contains("Lugia"));
    assert!(stdout.contains("(1 total"));

    let (stdout, _, success) = run_catalog(&config_path, &["list", "--type1", "GRASS"]);
    assert!(success);
    assert!(stdout.contains("Bulbasaur"));
    assert!(stdout.contains("Chikorita"));
    assert!(stdout.contains("(2 total"));
}

#[test]
fn test_list_pagination() {
    let (_tmp, config_path) = imported_env();

    let (stdout, _, success) = run_catalog(&config_path, &["list", "--page", "3", "--limit", "2"]);
    assert!(success);
    assert!(stdout.contains("page 3/3 (5 total, limit 2)"), "got: {}", stdout);
    assert!(stdout.contains("Mewtwo"));
}

#[test]
fn test_list_rejects_bad_limit() {
    let (_tmp, config_path) = imported_env();

    let (_, stderr, success) = run_catalog(&config_path, &["list", "--limit", "500"]);
    assert!(!success);
    assert!(stderr.contains("invalid limit"), "got: {}", stderr);
}

#[test]
fn test_get_entry() {
    let (_tmp, config_path) = imported_env();
    let (list, _, _) = run_catalog(&config_path, &["list"]);
    let id = id_of(&list, "Mewtwo");

    let (stdout, stderr, success) = run_catalog(&config_path, &["get", &id]);
    assert!(success, "get failed: {}", stderr);
    assert!(stdout.contains("--- Entry ---"));
    assert!(stdout.contains("name:        Mewtwo"));
    assert!(stdout.contains("sp_attack:   154"));
    assert!(stdout.contains("official-artwork/150.png"));
    assert!(!stdout.contains("favorite:"));
}

#[test]
fn test_get_missing_entry() {
    let (_tmp, config_path) = imported_env();

    let (_, stderr, success) = run_catalog(&config_path, &["get", "nonexistent-id"]);
    assert!(!success);
    assert!(stderr.contains("not found"), "got: {}", stderr);
}

#[test]
fn test_toggle_and_favorites() {
    let (_tmp, config_path) = imported_env();
    let (list, _, _) = run_catalog(&config_path, &["list"]);
    let mewtwo = id_of(&list, "Mewtwo");
    let lugia = id_of(&list, "Lugia");

    let (stdout, _, success) = run_catalog(&config_path, &["toggle", &mewtwo, "--user", "ash"]);
    assert!(success);
    assert!(stdout.contains("isFavorite: true"));
    let (stdout, _, _) = run_catalog(&config_path, &["toggle", &lugia, "--user", "ash"]);
    assert!(stdout.contains("isFavorite: true"));

    let (stdout, _, success) = run_catalog(&config_path, &["favorites", "--user", "ash"]);
    assert!(success);
    assert!(stdout.contains("(2 total"));

    let (stdout, _, _) = run_catalog(&config_path, &["favorites", "--user", "misty"]);
    assert!(stdout.contains("(0 total"));

    let (stdout, _, _) = run_catalog(&config_path, &["get", &mewtwo, "--user", "ash"]);
    assert!(stdout.contains("favorite:    true"));
    let (stdout, _, _) = run_catalog(&config_path, &["get", &mewtwo, "--user", "misty"]);
    assert!(stdout.contains("favorite:    false"));

    let (stdout, _, _) = run_catalog(&config_path, &["toggle", &mewtwo, "--user", "ash"]);
    assert!(stdout.contains("isFavorite: false"));
    let (stdout, _, _) = run_catalog(&config_path, &["favorites", "--user", "ash"]);
    assert!(stdout.contains("(1 total"));
    assert!(stdout.contains("Lugia"));
}

#[test]
fn test_reimport_clears_favorites() {
    let (_tmp, config_path) = imported_env();
    let (list, _, _) = run_catalog(&config_path, &["list"]);
    let mewtwo = id_of(&list, "Mewtwo");
    run_catalog(&config_path, &["toggle", &mewtwo, "--user", "ash"]);

    let csv = csv_path(&config_path);
    let (_, _, success) = run_catalog(&config_path, &["import", &csv]);
    assert!(success);

    let (stdout, _, _) = run_catalog(&config_path, &["favorites", "--user", "ash"]);
    assert!(stdout.contains("(0 total"));
}

#[test]
fn test_toggle_unknown_entry() {
    let (_tmp, config_path) = imported_env();

    let (_, stderr, success) = run_catalog(&config_path, &["toggle", "nope", "--user", "ash"]);
    assert!(!success);
    assert!(stderr.contains("not found"));
}
