use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use tokio::fs;

use crate::descriptor::CacheCleanConfig;

/// Writes the descriptor to `output_file`, creating the parent directory if
/// needed. The file is written to a temporary sibling and renamed into place
/// so a failed run never leaves a truncated descriptor behind.
pub async fn write_config(
    config: &CacheCleanConfig,
    output_file: &Path,
) -> Result<(), anyhow::Error> {
    let parent = output_file
        .parent()
        .with_context(|| format!("Output file has no parent directory: {:?}", output_file))?;
    if !parent.exists() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    let mut content = to_pretty_json(config)?;
    content.push('\n');

    let tmp_file = output_file.with_extension("json.tmp");
    fs::write(&tmp_file, content)
        .await
        .with_context(|| format!("Failed to write to {:?}", tmp_file))?;
    fs::rename(&tmp_file, output_file)
        .await
        .with_context(|| format!("Failed to move {:?} into place", tmp_file))?;

    Ok(())
}

/// Four-space indentation, matching the pretty-printed output the
/// descriptor's consumer already reads. serde_json leaves forward slashes
/// unescaped.
fn to_pretty_json(config: &CacheCleanConfig) -> Result<String, anyhow::Error> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    config
        .serialize(&mut serializer)
        .context("Failed to serialize configuration")?;
    String::from_utf8(buffer).map_err(|e| anyhow::anyhow!(e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample_config() -> CacheCleanConfig {
        CacheCleanConfig {
            app: json!({"backend": {"frontName": "admin"}}),
            modules: vec!["app/code/Vendor/A".to_string()],
            themes: vec![],
        }
    }

    #[test]
    fn pretty_prints_with_four_space_indent_and_plain_slashes() {
        let content = to_pretty_json(&sample_config()).unwrap();
        assert_eq!(
            content,
            "{\n    \"app\": {\n        \"backend\": {\n            \"frontName\": \"admin\"\n        }\n    },\n    \"modules\": [\n        \"app/code/Vendor/A\"\n    ],\n    \"themes\": []\n}"
        );
    }

    #[tokio::test]
    async fn creates_missing_parent_directory_and_trailing_newline() {
        let tree = TempDir::new().unwrap();
        let output_file = tree.path().join("var").join("cache-clean-config.json");

        write_config(&sample_config(), &output_file).await.unwrap();

        let written = std::fs::read_to_string(&output_file).unwrap();
        assert!(written.ends_with("}\n"));
        assert!(!tree.path().join("var/cache-clean-config.json.tmp").exists());
    }

    #[tokio::test]
    async fn overwrites_existing_file() {
        let tree = TempDir::new().unwrap();
        let var_dir = tree.path().join("var");
        std::fs::create_dir_all(&var_dir).unwrap();
        let output_file = var_dir.join("cache-clean-config.json");
        std::fs::write(&output_file, "stale").unwrap();

        write_config(&sample_config(), &output_file).await.unwrap();

        let written = std::fs::read_to_string(&output_file).unwrap();
        assert!(written.starts_with('{'));
        assert!(!written.contains("stale"));
    }
}
