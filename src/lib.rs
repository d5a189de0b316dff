use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

mod descriptor;
mod installation;
pub mod php_array;
mod registration;
pub mod registry;
mod relativize;
mod write_config;

pub use installation::Installation;

use descriptor::CacheCleanConfig;
use registry::FileRegistrar;

/// Generates `var/cache-clean-config.json` for the Magento installation
/// rooted at `base_dir` and returns the path of the written file.
pub async fn generate_config(base_dir: &Path) -> Result<PathBuf> {
    let installation = Installation::locate(base_dir)?;
    installation.verify()?;

    let env_file = installation.env_file();
    let env_source = tokio::fs::read_to_string(&env_file)
        .await
        .with_context(|| format!("Failed to read file: {:?}", env_file))?;
    let app = php_array::parse_php_config(&env_source)
        .with_context(|| format!("Failed to parse configuration {:?}", env_file))?;

    let registrar = FileRegistrar::scan(installation.base_dir()).await?;
    let config = CacheCleanConfig::assemble(app, &registrar, installation.base_dir());

    let output_file = installation.output_file();
    write_config::write_config(&config, &output_file).await?;

    Ok(output_file)
}
