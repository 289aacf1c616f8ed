//! Loading per-package extraction tool configs.
//!
//! The extraction tool reads a JSON config (with comments) per package. The
//! build needs exactly two values from it, the declaration entry point and
//! the rolled-up output path; everything else is handed back to the tool
//! untouched through [`ExtractionConfig::settings`].
//!
//! Path values may start with the `<projectFolder>` token, which expands to
//! the `projectFolder` setting (or the package directory when unset).
//! Relative paths resolve against the config file's directory.

use std::path::{Component, Path, PathBuf};

use serde_json::Value;
use tracing::debug;
use typeroll_core::ExtractionConfig;

use crate::error::{ConfigError, Result};

/// Setting holding the declaration entry point.
pub const ENTRY_POINT_KEY: &str = "mainEntryPointFilePath";
/// Section holding the rollup settings.
pub const DTS_ROLLUP_KEY: &str = "dtsRollup";
/// Key inside [`DTS_ROLLUP_KEY`] holding the rolled-up output path.
pub const OUTPUT_KEY: &str = "publicTrimmedFilePath";

const PROJECT_FOLDER_KEY: &str = "projectFolder";
const PROJECT_FOLDER_TOKEN: &str = "<projectFolder>";
const LOOKUP_TOKEN: &str = "<lookup>";

/// Loads the extraction config at `path` for the package in `package_dir`.
///
/// # Errors
///
/// Returns [`IoError`](ConfigError::IoError) or
/// [`JsonError`](ConfigError::JsonError) when the file cannot be read or
/// parsed, and
/// [`InvalidExtractionConfig`](ConfigError::InvalidExtractionConfig) when
/// the entry point or output path is missing.
pub fn load_extraction_config(path: impl AsRef<Path>, package_dir: impl AsRef<Path>) -> Result<ExtractionConfig> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)?;
    let mut settings: Value = serde_json::from_str(&strip_json_comments(&raw))?;
    let config_dir = path.parent().unwrap_or_else(|| Path::new("."));

    let invalid = |reason: &str| ConfigError::InvalidExtractionConfig {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    let project_folder = match settings.get(PROJECT_FOLDER_KEY).and_then(Value::as_str) {
        Some(folder) if folder != LOOKUP_TOKEN => normalize_path(&config_dir.join(folder)),
        _ => normalize_path(package_dir.as_ref()),
    };

    let entry = settings
        .get(ENTRY_POINT_KEY)
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("missing \"mainEntryPointFilePath\""))?;
    let output = settings
        .get(DTS_ROLLUP_KEY)
        .and_then(|rollup| rollup.get(OUTPUT_KEY))
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("missing \"dtsRollup.publicTrimmedFilePath\""))?;

    let entry_point = resolve_setting_path(entry, &project_folder, config_dir);
    let output = resolve_setting_path(output, &project_folder, config_dir);
    debug!(
        config = %path.display(),
        entry = %entry_point.display(),
        output = %output.display(),
        "Loaded extraction config"
    );

    // Pin the project folder so the tool never has to look it up.
    if let Some(object) = settings.as_object_mut() {
        object.insert(
            PROJECT_FOLDER_KEY.to_string(),
            Value::String(project_folder.to_string_lossy().into_owned()),
        );
    }

    Ok(ExtractionConfig::new(entry_point, output, settings).with_config_dir(config_dir))
}

/// Renders `config` back into the tool's JSON format.
///
/// The shared settings are cloned and the entry point and output path are
/// replaced by the job's own, so one settings value can serve every job in
/// a closure. Every other setting is kept as written, so the rendered file
/// belongs in [`ExtractionConfig::config_dir`].
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use typeroll_config::render_extraction_settings;
/// use typeroll_core::ExtractionConfig;
///
/// let config = ExtractionConfig::new("/r/in.d.ts", "/r/out.d.ts", json!({ "bundledPackages": [] }));
/// let rendered = render_extraction_settings(&config);
/// assert_eq!(rendered["mainEntryPointFilePath"], "/r/in.d.ts");
/// assert_eq!(rendered["dtsRollup"]["publicTrimmedFilePath"], "/r/out.d.ts");
/// assert_eq!(rendered["bundledPackages"], json!([]));
/// ```
pub fn render_extraction_settings(config: &ExtractionConfig) -> Value {
    let mut rendered = config.settings.as_ref().clone();
    if !rendered.is_object() {
        rendered = Value::Object(serde_json::Map::new());
    }
    if let Some(object) = rendered.as_object_mut() {
        object.insert(
            ENTRY_POINT_KEY.to_string(),
            Value::String(config.entry_point.to_string_lossy().into_owned()),
        );

        let rollup = object
            .entry(DTS_ROLLUP_KEY.to_string())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
        if let Some(rollup) = rollup.as_object_mut() {
            rollup.insert("enabled".to_string(), Value::Bool(true));
            rollup.insert(
                OUTPUT_KEY.to_string(),
                Value::String(config.output.to_string_lossy().into_owned()),
            );
        }
    }
    rendered
}

fn resolve_setting_path(value: &str, project_folder: &Path, config_dir: &Path) -> PathBuf {
    let resolved = match value.strip_prefix(PROJECT_FOLDER_TOKEN) {
        Some(rest) => project_folder.join(rest.trim_start_matches(['/', '\\'])),
        None => config_dir.join(value),
    };
    normalize_path(&resolved)
}

/// Lexically removes `.` and `..` segments.
///
/// The files involved usually do not exist yet when configs are loaded, so
/// the filesystem is never consulted.
///
/// # Examples
///
/// ```
/// use std::path::{Path, PathBuf};
/// use typeroll_config::normalize_path;
///
/// assert_eq!(
///     normalize_path(Path::new("/repo/packages/app/../../dist/./types")),
///     PathBuf::from("/repo/dist/types"),
/// );
/// ```
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Removes `//` and `/* */` comments outside string literals.
pub fn strip_json_comments(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        let next = chars.peek().copied();
        match (c, next) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    if next == '\n' {
                        out.push('\n');
                    }
                    prev = next;
                }
            }
            _ => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
/**
 * Config file for API Extractor.
 */
{
  // Inputs come from the monorepo-wide declaration build.
  "mainEntryPointFilePath": "<projectFolder>/dist/packages/core/garfish/src/index.d.ts",
  "dtsRollup": {
    "enabled": true,
    "publicTrimmedFilePath": "<projectFolder>/dist/garfish.d.ts"
  },
  "apiReport": { "enabled": false },
  "docModel": { "enabled": false, "apiJsonFilePath": "//not/a/comment" }
}
"#;

    #[test]
    fn test_strip_json_comments_keeps_strings() {
        let stripped = strip_json_comments(SAMPLE);
        let value: Value = serde_json::from_str(&stripped).unwrap();
        assert_eq!(value["docModel"]["apiJsonFilePath"], "//not/a/comment");
    }

    #[test]
    fn test_load_resolves_project_folder_token() {
        let dir = tempfile::tempdir().unwrap();
        let package_dir = dir.path().join("packages/core/garfish");
        std::fs::create_dir_all(&package_dir).unwrap();
        let config_path = package_dir.join("api-extractor.json");
        std::fs::write(&config_path, SAMPLE).unwrap();

        let config = load_extraction_config(&config_path, &package_dir).unwrap();
        assert_eq!(
            config.entry_point,
            package_dir.join("dist/packages/core/garfish/src/index.d.ts")
        );
        assert_eq!(config.output, package_dir.join("dist/garfish.d.ts"));
        assert_eq!(config.settings["apiReport"]["enabled"], false);
    }

    #[test]
    fn test_load_resolves_relative_paths_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("api-extractor.json");
        std::fs::write(
            &config_path,
            r#"{"mainEntryPointFilePath":"../types/a/index.d.ts","dtsRollup":{"publicTrimmedFilePath":"./dist/a.d.ts"}}"#,
        )
        .unwrap();

        let config = load_extraction_config(&config_path, dir.path()).unwrap();
        let parent = dir.path().parent().unwrap();
        assert_eq!(config.entry_point, parent.join("types/a/index.d.ts"));
        assert_eq!(config.output, dir.path().join("dist/a.d.ts"));
    }

    #[test]
    fn test_load_rejects_missing_output() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("api-extractor.json");
        std::fs::write(&config_path, r#"{"mainEntryPointFilePath":"a.d.ts"}"#).unwrap();

        let err = load_extraction_config(&config_path, dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidExtractionConfig { .. }));
    }

    #[test]
    fn test_render_keeps_other_settings_as_written() {
        let config = ExtractionConfig::new(
            "/r/in.d.ts",
            "/r/out.d.ts",
            serde_json::json!({
                "projectFolder": "/r",
                "extends": "../../api-extractor.base.json",
                "dtsRollup": { "enabled": false }
            }),
        );
        let rendered = render_extraction_settings(&config);
        assert_eq!(rendered["projectFolder"], "/r");
        assert_eq!(rendered["extends"], "../../api-extractor.base.json");
        assert_eq!(rendered["dtsRollup"]["enabled"], true);
    }

    #[test]
    fn test_load_pins_project_folder_and_records_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let package_dir = dir.path().join("packages/core/garfish");
        std::fs::create_dir_all(&package_dir).unwrap();
        let config_path = package_dir.join("api-extractor.json");
        std::fs::write(
            &config_path,
            r#"{
  "extends": "../../../api-extractor.base.json",
  "compiler": { "tsconfigFilePath": "<projectFolder>/tsconfig.json" },
  "mainEntryPointFilePath": "<projectFolder>/dist/index.d.ts",
  "dtsRollup": { "publicTrimmedFilePath": "<projectFolder>/dist/garfish.d.ts" }
}"#,
        )
        .unwrap();

        let config = load_extraction_config(&config_path, &package_dir).unwrap();
        assert_eq!(config.config_dir.as_deref(), Some(package_dir.as_path()));
        assert_eq!(config.settings["projectFolder"], &*package_dir.to_string_lossy());
        assert_eq!(config.settings["extends"], "../../../api-extractor.base.json");
        assert_eq!(
            config.settings["compiler"]["tsconfigFilePath"],
            "<projectFolder>/tsconfig.json"
        );
    }
}
