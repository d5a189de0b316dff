use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::registry::{ComponentKind, ComponentRegistry};
use crate::relativize::relativize;

/// The consolidated document consumed by the cache-clean watcher: the
/// installation's environment configuration plus the relativized locations
/// of every installed module and theme.
#[derive(Debug, Serialize, PartialEq)]
pub struct CacheCleanConfig {
    pub app: Value,
    pub modules: Vec<String>,
    pub themes: Vec<String>,
}

impl CacheCleanConfig {
    /// Builds the descriptor. Component names are dropped; the lists keep
    /// the registrar's enumeration order.
    pub fn assemble(app: Value, registry: &dyn ComponentRegistry, base_dir: &Path) -> Self {
        CacheCleanConfig {
            app,
            modules: relativized_paths(registry, ComponentKind::Module, base_dir),
            themes: relativized_paths(registry, ComponentKind::Theme, base_dir),
        }
    }
}

fn relativized_paths(
    registry: &dyn ComponentRegistry,
    kind: ComponentKind,
    base_dir: &Path,
) -> Vec<String> {
    registry
        .paths(kind)
        .values()
        .map(|path| relativize(base_dir, path))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use serde_json::json;
    use std::path::PathBuf;

    #[derive(Default)]
    struct StubRegistry {
        modules: IndexMap<String, PathBuf>,
        themes: IndexMap<String, PathBuf>,
    }

    impl ComponentRegistry for StubRegistry {
        fn paths(&self, kind: ComponentKind) -> &IndexMap<String, PathBuf> {
            match kind {
                ComponentKind::Module => &self.modules,
                ComponentKind::Theme => &self.themes,
            }
        }
    }

    #[test]
    fn assembles_relativized_lists_in_registry_order() {
        let base = PathBuf::from("/srv/magento");
        let mut registry = StubRegistry::default();
        registry.modules.insert(
            "Vendor_B".to_string(),
            base.join("vendor/vendor/module-b"),
        );
        registry
            .modules
            .insert("Vendor_A".to_string(), base.join("app/code/Vendor/A"));
        registry.themes.insert(
            "frontend/Vendor/default".to_string(),
            base.join("app/design/frontend/Vendor/default"),
        );

        let config = CacheCleanConfig::assemble(json!({"backend": "admin"}), &registry, &base);

        assert_eq!(
            config,
            CacheCleanConfig {
                app: json!({"backend": "admin"}),
                modules: vec![
                    "vendor/vendor/module-b".to_string(),
                    "app/code/Vendor/A".to_string(),
                ],
                themes: vec!["app/design/frontend/Vendor/default".to_string()],
            }
        );
    }

    #[test]
    fn empty_registry_yields_empty_lists() {
        let registry = StubRegistry::default();
        let config = CacheCleanConfig::assemble(
            json!({"backend": "admin"}),
            &registry,
            Path::new("/srv/magento"),
        );
        assert!(config.modules.is_empty());
        assert!(config.themes.is_empty());
    }
}
