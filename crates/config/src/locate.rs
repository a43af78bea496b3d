// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::path::{Path, PathBuf};

use path_clean::clean;

pub const DEFAULT_CONFIG_NAME: &str = "fhevm.config.yaml";

/// Strategy used to look for a file in a directory and its ancestors
pub type Finder = fn(&Path, &str) -> Option<PathBuf>;

/// Walk from `start` towards the filesystem root looking for `filename`
pub fn find_in_ancestors(start: &Path, filename: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(filename))
        .find(|candidate| candidate.exists())
}

/// Where to look for the configuration file
#[derive(Debug, Clone)]
pub struct ConfigSearch {
    pub cwd: PathBuf,
    pub default_dir: PathBuf,
    pub filename: String,
}

impl ConfigSearch {
    pub fn new(cwd: impl Into<PathBuf>, default_dir: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            default_dir: default_dir.into(),
            filename: DEFAULT_CONFIG_NAME.to_string(),
        }
    }

    /// Resolve the config path. An explicit path wins (relative paths are taken from the cwd),
    /// then the nearest file found from the cwd upwards, then the default config dir.
    pub fn resolve(&self, finder: Finder, explicit: Option<PathBuf>) -> PathBuf {
        if let Some(explicit) = explicit {
            if explicit.is_absolute() {
                return explicit;
            }
            return clean(self.cwd.join(explicit));
        }

        finder(&self.cwd, &self.filename)
            .unwrap_or_else(|| clean(self.default_dir.join(&self.filename)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;

    fn not_found(_: &Path, _: &str) -> Option<PathBuf> {
        None
    }

    fn found(_: &Path, _: &str) -> Option<PathBuf> {
        Some(PathBuf::from("/foo/fhevm.config.yaml"))
    }

    #[test]
    fn test_resolve_order() {
        let search = ConfigSearch::new("/foo/bar", "/my/config");

        assert_eq!(
            search.resolve(not_found, None),
            PathBuf::from("/my/config/fhevm.config.yaml")
        );
        assert_eq!(
            search.resolve(found, Some(PathBuf::from("/abs/conf.yaml"))),
            PathBuf::from("/abs/conf.yaml")
        );
        assert_eq!(
            search.resolve(found, Some(PathBuf::from("../conf.yaml"))),
            PathBuf::from("/foo/conf.yaml")
        );
        assert_eq!(
            search.resolve(found, None),
            PathBuf::from("/foo/fhevm.config.yaml")
        );
    }

    #[test]
    fn test_find_in_ancestors() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested)?;
        fs::write(dir.path().join(DEFAULT_CONFIG_NAME), "network_id: 1")?;

        assert_eq!(
            find_in_ancestors(&nested, DEFAULT_CONFIG_NAME),
            Some(dir.path().join(DEFAULT_CONFIG_NAME))
        );
        assert_eq!(find_in_ancestors(&nested, "missing.yaml"), None);
        Ok(())
    }
}
