use std::path::Path;

/// Strips `base_dir` and the following separator from `path`, yielding the
/// forward-slash relative form the descriptor records. A path outside
/// `base_dir` passes through unchanged.
pub fn relativize(base_dir: &Path, path: &Path) -> String {
    match path.strip_prefix(base_dir) {
        Ok(relative) => relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => path.to_string_lossy().into_owned(),
    }
}
