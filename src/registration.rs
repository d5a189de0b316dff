use lazy_static::lazy_static;
use regex::Regex;

use crate::registry::ComponentKind;

lazy_static! {
    static ref REGISTER_CALL: Regex = Regex::new(
        r#"ComponentRegistrar\s*::\s*register\s*\(\s*(?:\\?(?:[A-Za-z_][A-Za-z0-9_]*\\)+)?ComponentRegistrar\s*::\s*([A-Z_]+)\s*,\s*['"]([^'"]+)['"]\s*,\s*__DIR__\s*\)"#
    )
    .unwrap();
}

/// A single `ComponentRegistrar::register(...)` call found in a
/// registration.php file. The component's path is the directory holding the
/// file (`__DIR__`), resolved by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub kind: ComponentKind,
    pub name: String,
}

/// Extracts the component registrations from a registration.php source.
///
/// Kinds other than module and theme (language packs, libraries) are valid
/// register calls but irrelevant to the descriptor, so they are dropped.
/// Files that compute their registrations dynamically match nothing and
/// contribute nothing.
pub fn scan_registrations(source: &str) -> Vec<Registration> {
    REGISTER_CALL
        .captures_iter(source)
        .filter_map(|captures| {
            let kind = match &captures[1] {
                "MODULE" => ComponentKind::Module,
                "THEME" => ComponentKind::Theme,
                _ => return None,
            };
            Some(Registration {
                kind,
                name: captures[2].to_string(),
            })
        })
        .collect()
}
