use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};

/// The fixed layout of a Magento installation, anchored at its canonical
/// base directory.
#[derive(Debug, Clone)]
pub struct Installation {
    base_dir: PathBuf,
}

impl Installation {
    /// Resolves `dir` to a canonical base directory.
    pub fn locate(dir: &Path) -> Result<Self, anyhow::Error> {
        let base_dir = dir
            .canonicalize()
            .with_context(|| format!("The path {:?} does not exist", dir))?;
        Ok(Installation { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn env_file(&self) -> PathBuf {
        self.base_dir.join("app").join("etc").join("env.php")
    }

    pub fn autoload_file(&self) -> PathBuf {
        self.base_dir.join("vendor").join("autoload.php")
    }

    pub fn output_file(&self) -> PathBuf {
        self.base_dir.join("var").join("cache-clean-config.json")
    }

    /// Verifies the two files every generation run depends on. The composer
    /// autoload file is never executed; its absence means the installation
    /// has no installed components to enumerate.
    pub fn verify(&self) -> Result<(), anyhow::Error> {
        let env_file = self.env_file();
        if !env_file.exists() {
            return Err(anyhow!("Unable to find configuration {:?}", env_file));
        }
        let autoload_file = self.autoload_file();
        if !autoload_file.exists() {
            return Err(anyhow!(
                "Unable to find composer autoload file {:?}",
                autoload_file
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn locate_rejects_missing_directory() {
        let tree = TempDir::new().unwrap();
        let missing = tree.path().join("nope");
        assert!(Installation::locate(&missing).is_err());
    }

    #[test]
    fn verify_requires_env_file() {
        let tree = TempDir::new().unwrap();
        fs::create_dir_all(tree.path().join("vendor")).unwrap();
        fs::write(tree.path().join("vendor/autoload.php"), "<?php\n").unwrap();

        let installation = Installation::locate(tree.path()).unwrap();
        let error = installation.verify().unwrap_err();
        assert!(error.to_string().contains("Unable to find configuration"));
        assert!(error.to_string().contains("env.php"));
    }

    #[test]
    fn verify_requires_autoload_file() {
        let tree = TempDir::new().unwrap();
        fs::create_dir_all(tree.path().join("app/etc")).unwrap();
        fs::write(tree.path().join("app/etc/env.php"), "<?php return [];").unwrap();

        let installation = Installation::locate(tree.path()).unwrap();
        let error = installation.verify().unwrap_err();
        assert!(error
            .to_string()
            .contains("Unable to find composer autoload file"));
    }

    #[test]
    fn verify_passes_on_complete_layout() {
        let tree = TempDir::new().unwrap();
        fs::create_dir_all(tree.path().join("app/etc")).unwrap();
        fs::write(tree.path().join("app/etc/env.php"), "<?php return [];").unwrap();
        fs::create_dir_all(tree.path().join("vendor")).unwrap();
        fs::write(tree.path().join("vendor/autoload.php"), "<?php\n").unwrap();

        let installation = Installation::locate(tree.path()).unwrap();
        assert!(installation.verify().is_ok());
        assert!(installation.output_file().ends_with("var/cache-clean-config.json"));
    }
}
