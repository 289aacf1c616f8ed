use std::path::Path;

use typeroll_config::{BuildConfig, ConfigError, DEFAULT_CONFIG_FILE, Workspace};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn write(path: &Path, contents: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

fn write_manifest(root: &Path, packages_dir: &str, dir: &str, manifest: &str) {
    write(&root.join(packages_dir).join(dir).join("package.json"), manifest);
}

// ---------------------------------------------------------------------------
// Workspace loading
// ---------------------------------------------------------------------------

#[test]
fn workspace_uses_config_file_in_root() {
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join(DEFAULT_CONFIG_FILE),
        "packages_dir: packages/core\nextractor:\n  timeout_secs: 30\n",
    );
    write_manifest(dir.path(), "packages/core", "garfish", r#"{"name":"garfish","types":"dist/garfish.d.ts"}"#);
    write_manifest(dir.path(), "packages/core", "loader", r#"{"name":"@garfish/loader","private":true}"#);

    let workspace = Workspace::load(dir.path(), None).unwrap();
    assert_eq!(workspace.config.extractor.timeout_secs, Some(30));
    assert_eq!(workspace.config.extractor.program, "api-extractor");
    assert_eq!(workspace.registry.public_targets(), vec!["garfish"]);
    assert!(workspace.registry.by_dir_name("garfish").unwrap().has_types());
}

#[test]
fn workspace_without_config_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path(), "packages", "app", r#"{"name":"app"}"#);

    let workspace = Workspace::load(dir.path(), None).unwrap();
    assert_eq!(workspace.config.packages_dir, "packages");
    assert_eq!(workspace.registry.len(), 1);
}

#[test]
fn explicit_missing_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.yml");
    let err = Workspace::load(dir.path(), Some(&missing)).unwrap_err();
    assert!(matches!(err, ConfigError::IoError(_)));
}

#[test]
fn duplicate_package_names_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path(), "packages", "a", r#"{"name":"@x/same"}"#);
    write_manifest(dir.path(), "packages", "b", r#"{"name":"@x/same","private":true}"#);

    let err = Workspace::load(dir.path(), None).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidRegistry(_)));
    assert!(err.to_string().contains("@x/same"));
}

// ---------------------------------------------------------------------------
// Extraction configs
// ---------------------------------------------------------------------------

#[test]
fn extraction_config_resolves_project_folder_and_keeps_settings() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path(), "packages", "app", r#"{"name":"app","types":"dist/app.d.ts"}"#);
    write(
        &dir.path().join("packages/app/api-extractor.json"),
        r#"{
  // api-extractor config
  "projectFolder": ".",
  "mainEntryPointFilePath": "<projectFolder>/dist/packages/app/src/index.d.ts",
  "dtsRollup": {
    "enabled": true,
    "publicTrimmedFilePath": "<projectFolder>/dist/<unscopedPackageName>.d.ts"
  },
  "apiReport": { "enabled": false }
}"#,
    );

    let workspace = Workspace::load(dir.path(), None).unwrap();
    let app = workspace.registry.by_dir_name("app").unwrap();
    let config = workspace.extraction_config(app).unwrap();

    let package_dir = dir.path().join("packages/app");
    assert_eq!(config.entry_point, package_dir.join("dist/packages/app/src/index.d.ts"));
    assert_eq!(config.output, package_dir.join("dist/<unscopedPackageName>.d.ts"));
    assert_eq!(config.settings["apiReport"]["enabled"], false);
}

#[test]
fn extraction_config_without_output_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path(), "packages", "app", r#"{"name":"app"}"#);
    write(
        &dir.path().join("packages/app/api-extractor.json"),
        r#"{ "mainEntryPointFilePath": "index.d.ts" }"#,
    );

    let workspace = Workspace::load(dir.path(), None).unwrap();
    let app = workspace.registry.by_dir_name("app").unwrap();
    let err = workspace.extraction_config(app).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidExtractionConfig { .. }));
}

// ---------------------------------------------------------------------------
// Config round-trip
// ---------------------------------------------------------------------------

#[test]
fn saved_config_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DEFAULT_CONFIG_FILE);
    let mut config = BuildConfig::default();
    config.bundler.args = vec!["--silent".to_string()];
    config.cleanup = vec!["{root}/temp".to_string()];
    config.save(&path).unwrap();

    let loaded = BuildConfig::load(&path).unwrap();
    assert_eq!(loaded.bundler.args, vec!["--silent"]);
    assert_eq!(loaded.cleanup, vec!["{root}/temp"]);
    assert_eq!(
        loaded.cleanup_paths(dir.path(), &dir.path().join("packages/app")),
        vec![dir.path().join("temp")]
    );
}
