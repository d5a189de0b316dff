use std::path::{Path, PathBuf};

use anyhow::Context;
use futures::{stream::FuturesOrdered, StreamExt};
use indexmap::IndexMap;

use crate::registration::scan_registrations;

/// The component kinds the descriptor consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Module,
    Theme,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Module => "module",
            ComponentKind::Theme => "theme",
        }
    }
}

/// The registrar capability: name to installation path, per component kind,
/// in registration order.
pub trait ComponentRegistry {
    fn paths(&self, kind: ComponentKind) -> &IndexMap<String, PathBuf>;
}

/// Registrar backed by the installation's registration.php files, read
/// statically instead of through the PHP autoloader.
#[derive(Debug, Default)]
pub struct FileRegistrar {
    modules: IndexMap<String, PathBuf>,
    themes: IndexMap<String, PathBuf>,
}

/// A directory pattern that holds components: `registration.php` sits
/// `depth` directory levels below `path`.
struct RegistrationRoot {
    path: PathBuf,
    depth: usize,
}

/// Composer packages register before anything under app/, mirroring the
/// autoload-files-first order of a live installation.
fn registration_roots(base_dir: &Path) -> Vec<RegistrationRoot> {
    vec![
        RegistrationRoot {
            path: base_dir.join("vendor"),
            depth: 2,
        },
        RegistrationRoot {
            path: base_dir.join("app").join("code"),
            depth: 2,
        },
        RegistrationRoot {
            path: base_dir.join("app").join("design"),
            depth: 3,
        },
    ]
}

impl FileRegistrar {
    /// Scans the installation for registration.php files and collects the
    /// module and theme registrations they declare.
    pub async fn scan(base_dir: &Path) -> Result<Self, anyhow::Error> {
        let mut registrar = FileRegistrar::default();

        for root in registration_roots(base_dir) {
            let files = collect_registration_files(&root.path, root.depth).await?;

            let mut futures = FuturesOrdered::new();
            for file in files {
                futures.push_back(async move {
                    let source = tokio::fs::read_to_string(&file)
                        .await
                        .with_context(|| format!("Failed to read file: {:?}", file))?;
                    Ok::<_, anyhow::Error>((file, source))
                });
            }

            while let Some(result) = futures.next().await {
                let (file, source) = result?;
                let registrations = scan_registrations(&source);
                if registrations.is_empty() {
                    log::debug!("no static component registrations in {}", file.display());
                    continue;
                }
                let component_dir = file
                    .parent()
                    .with_context(|| format!("Registration file has no parent: {:?}", file))?;
                for registration in registrations {
                    registrar.insert(registration.kind, registration.name, component_dir.to_path_buf());
                }
            }
        }

        Ok(registrar)
    }

    fn insert(&mut self, kind: ComponentKind, name: String, path: PathBuf) {
        let map = match kind {
            ComponentKind::Module => &mut self.modules,
            ComponentKind::Theme => &mut self.themes,
        };
        if let Some(existing) = map.get(&name) {
            log::warn!(
                "{} '{}' already registered at {}, ignoring {}",
                kind.as_str(),
                name,
                existing.display(),
                path.display()
            );
            return;
        }
        log::debug!("registered {} '{}' at {}", kind.as_str(), name, path.display());
        map.insert(name, path);
    }
}

impl ComponentRegistry for FileRegistrar {
    fn paths(&self, kind: ComponentKind) -> &IndexMap<String, PathBuf> {
        match kind {
            ComponentKind::Module => &self.modules,
            ComponentKind::Theme => &self.themes,
        }
    }
}

/// Lists the registration.php files exactly `depth` directory levels below
/// `root`, visiting directories in lexicographic order so a given tree always
/// enumerates identically.
async fn collect_registration_files(
    root: &Path,
    depth: usize,
) -> Result<Vec<PathBuf>, anyhow::Error> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut frontier = vec![root.to_path_buf()];
    for _ in 0..depth {
        let mut next = Vec::new();
        for dir in frontier {
            next.extend(sorted_subdirectories(&dir).await?);
        }
        frontier = next;
    }

    Ok(frontier
        .into_iter()
        .map(|dir| dir.join("registration.php"))
        .filter(|file| file.is_file())
        .collect())
}

async fn sorted_subdirectories(dir: &Path) -> Result<Vec<PathBuf>, anyhow::Error> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to read directory: {:?}", dir))?;

    let mut subdirectories = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .with_context(|| format!("Failed to read entry in directory: {:?}", dir))?
    {
        let metadata = entry
            .metadata()
            .await
            .with_context(|| format!("Failed to get metadata for entry: {:?}", entry.path()))?;
        if metadata.is_dir() {
            subdirectories.push(entry.path());
        }
    }

    subdirectories.sort();
    Ok(subdirectories)
}
