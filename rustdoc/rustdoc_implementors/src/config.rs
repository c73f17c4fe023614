//! Configuration for loading a rustdoc output tree.
//!
//! [`ConfigLoader`] is the key type in this module.
use std::path::PathBuf;

use anyhow::Context;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};

use crate::controller::PendingPolicy;

/// The name of the optional configuration file, looked up in the doc root.
pub const CONFIG_FILE_NAME: &str = "rustdoc-index.yml";

static ENV_PREFIX: &str = "RUSTDOC_INDEX_";

/// How a rustdoc output tree is laid out and how its trait pages behave.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// What trait pages do with batches published before they are ready.
    pub pending_policy: PendingPolicy,
    /// The directory, relative to the doc root, that contains the data loaders.
    pub implementors_dir: String,
    /// The name of the sidebar file in each crate directory.
    pub sidebar_file: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            pending_policy: PendingPolicy::default(),
            implementors_dir: "implementors".into(),
            sidebar_file: "sidebar-items.js".into(),
        }
    }
}

#[derive(Clone, Debug, Default)]
/// A utility to load [`SiteConfig`] by merging together, in increasing order
/// of precedence:
///
/// 1. The default values
/// 2. A YAML configuration file (`<doc root>/rustdoc-index.yml` by default)
/// 3. Environment variables (`RUSTDOC_INDEX_*`, e.g. `RUSTDOC_INDEX_PENDING_POLICY`)
///
/// A missing configuration file is not an error.
pub struct ConfigLoader {
    file: Option<PathBuf>,
    root: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look for `rustdoc-index.yml` in the given doc root.
    pub fn root<Dir>(mut self, dir: Dir) -> Self
    where
        Dir: Into<PathBuf>,
    {
        self.root = Some(dir.into());
        self
    }

    /// Load the configuration file from an explicit path, rather than from the doc root.
    pub fn file<File>(mut self, path: File) -> Self
    where
        File: Into<PathBuf>,
    {
        self.file = Some(path.into());
        self
    }

    /// Merge the configuration sources together.
    ///
    /// The configuration file in the doc root is optional. A file passed to
    /// [`ConfigLoader::file`] must exist.
    pub fn load(self) -> Result<SiteConfig, ConfigLoadError> {
        let (filepath, explicit) = match (self.file, self.root) {
            (Some(file), _) => (file, true),
            (None, Some(root)) => (root.join(CONFIG_FILE_NAME), false),
            (None, None) => (PathBuf::from(CONFIG_FILE_NAME), false),
        };
        let span = tracing::debug_span!(
            "Loading configuration",
            configuration.file = %filepath.display(),
            configuration.explicit = explicit,
        );
        let _guard = span.enter();

        if explicit && !filepath.is_file() {
            return Err(ConfigLoadError(anyhow::anyhow!(
                "The configuration file `{}` doesn't exist",
                filepath.display()
            )));
        }

        Figment::new()
            .merge(Serialized::defaults(SiteConfig::default()))
            .merge(Yaml::file(filepath))
            .merge(Env::prefixed(ENV_PREFIX).only(&[
                "pending_policy",
                "implementors_dir",
                "sidebar_file",
            ]))
            .extract()
            .context("Failed to load the site configuration")
            .map_err(ConfigLoadError)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Failed to load configuration")]
/// The error returned by [`ConfigLoader::load`].
pub struct ConfigLoadError(#[source] anyhow::Error);
