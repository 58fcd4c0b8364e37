use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const REVWATCH_DIR: &str = ".revwatch";
pub const CONFIG_FILE: &str = ".revwatch/config.yaml";
pub const CURSOR_FILE: &str = ".revwatch/last_commit";
pub const CHECKOUT_DIR: &str = ".revwatch/checkout";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn revwatch_dir(root: &Path) -> PathBuf {
    root.join(REVWATCH_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn cursor_path(root: &Path) -> PathBuf {
    root.join(CURSOR_FILE)
}

/// Resolve a configured path against the project root. Absolute paths win.
pub fn resolve(root: &Path, configured: &Path) -> PathBuf {
    if configured.is_absolute() {
        configured.to_path_buf()
    } else {
        root.join(configured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_helpers() {
        let root = Path::new("/srv/bot");
        assert_eq!(
            config_path(root),
            PathBuf::from("/srv/bot/.revwatch/config.yaml")
        );
        assert_eq!(
            cursor_path(root),
            PathBuf::from("/srv/bot/.revwatch/last_commit")
        );
    }

    #[test]
    fn resolve_keeps_absolute_paths() {
        let root = Path::new("/srv/bot");
        assert_eq!(
            resolve(root, Path::new("/data/gamedata")),
            PathBuf::from("/data/gamedata")
        );
        assert_eq!(
            resolve(root, Path::new(CHECKOUT_DIR)),
            PathBuf::from("/srv/bot/.revwatch/checkout")
        );
    }
}
