//! Discover and load the index data of a rustdoc output tree (e.g. `target/doc`).
use std::fmt::{Display, Formatter};
use std::io::Read;
use std::str::FromStr;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use itertools::Itertools;
use sha2::Digest;

use crate::config::SiteConfig;
use crate::controller::PageController;
use crate::literal;
use crate::loader::DataLoader;
use crate::sidebar::{self, SidebarItems};
use crate::types::ImplementorBatch;

/// The path of the trait whose page owns a data loader, e.g. `core::fmt::LowerHex`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TraitPath {
    segments: Vec<String>,
}

impl TraitPath {
    /// The name of the trait, i.e. the last path segment.
    pub fn name(&self) -> &str {
        self.segments
            .last()
            .expect("A trait path always has at least one segment")
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The location of the data loader, relative to the implementors directory.
    ///
    /// `core::fmt::LowerHex` -> `core/fmt/trait.LowerHex.js`.
    pub fn relative_file_path(&self) -> Utf8PathBuf {
        let (name, modules) = self
            .segments
            .split_last()
            .expect("A trait path always has at least one segment");
        let mut path: Utf8PathBuf = modules.iter().collect();
        path.push(format!("trait.{name}.js"));
        path
    }

    /// The inverse of [`TraitPath::relative_file_path`].
    pub fn from_relative_file_path(path: &Utf8Path) -> Result<Self, InvalidTraitPath> {
        let mut segments: Vec<String> = path.components().map(|c| c.as_str().to_owned()).collect();
        let file_name = segments.pop().ok_or(InvalidTraitPath::Empty)?;
        let name = file_name
            .strip_prefix("trait.")
            .and_then(|n| n.strip_suffix(".js"))
            .filter(|n| !n.is_empty())
            .ok_or_else(|| InvalidTraitPath::NotADataLoader {
                file_name: file_name.clone(),
            })?;
        segments.push(name.to_owned());
        validate_segments(&segments)?;
        Ok(Self { segments })
    }
}

impl FromStr for TraitPath {
    type Err = InvalidTraitPath;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments: Vec<String> = s.split("::").map(str::to_owned).collect();
        validate_segments(&segments)?;
        Ok(Self { segments })
    }
}

/// Every segment must be a Rust identifier, so that the data loader path
/// stays inside the implementors directory.
fn validate_segments(segments: &[String]) -> Result<(), InvalidTraitPath> {
    for segment in segments {
        if segment.is_empty() {
            return Err(InvalidTraitPath::Empty);
        }
        if !is_identifier(segment) {
            return Err(InvalidTraitPath::InvalidSegment {
                segment: segment.to_owned(),
            });
        }
    }
    Ok(())
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_alphabetic() => {}
        _ => return false,
    }
    s != "_" && chars.all(|c| c == '_' || c.is_alphanumeric())
}

impl Display for TraitPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segments.iter().join("::"))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InvalidTraitPath {
    #[error("A trait path can't be empty, nor contain empty segments")]
    Empty,
    #[error("`{file_name}` is not a data loader: expected a file named `trait.<Name>.js`")]
    NotADataLoader { file_name: String },
    #[error("`{segment}` is not a valid path segment: expected a Rust identifier")]
    InvalidSegment { segment: String },
}

/// A data loader found in the implementors directory of a doc root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLoaderFile {
    pub trait_path: TraitPath,
    pub path: Utf8PathBuf,
}

/// A sidebar file found in a crate directory of a doc root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarFile {
    pub crate_name: String,
    pub path: Utf8PathBuf,
}

/// When the data loader of a page runs, relative to the page controller initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadOrder {
    /// The controller is ready when the data loader runs.
    #[default]
    ControllerFirst,
    /// The data loader runs first and its batch is parked until initialization.
    LoaderFirst,
}

/// A rustdoc output tree.
#[derive(Debug, Clone)]
pub struct DocSite {
    root: Utf8PathBuf,
    config: SiteConfig,
}

impl DocSite {
    pub fn new(root: impl Into<Utf8PathBuf>, config: SiteConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn implementors_dir(&self) -> Utf8PathBuf {
        self.root.join(&self.config.implementors_dir)
    }

    /// The location of the data loader for a trait.
    pub fn data_loader_path(&self, trait_path: &TraitPath) -> Utf8PathBuf {
        self.implementors_dir().join(trait_path.relative_file_path())
    }

    /// The location of the sidebar file for a crate.
    pub fn sidebar_path(&self, crate_name: &str) -> Utf8PathBuf {
        self.root.join(crate_name).join(&self.config.sidebar_file)
    }

    /// Find all the data loaders in the implementors directory, sorted by trait path.
    ///
    /// A missing implementors directory yields an empty list.
    #[tracing::instrument("Discover data loaders", skip_all, level = tracing::Level::DEBUG, fields(root = %self.root))]
    pub fn discover_data_loaders(&self) -> Result<Vec<DataLoaderFile>, anyhow::Error> {
        let implementors_dir = self.implementors_dir();
        if !implementors_dir.is_dir() {
            tracing::debug!("There is no implementors directory");
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for path in find_files(&implementors_dir, "**/trait.*.js")? {
            let relative = path
                .strip_prefix(&implementors_dir)
                .context("A discovered data loader is outside the implementors directory")?;
            let trait_path = TraitPath::from_relative_file_path(relative)
                .with_context(|| format!("Failed to determine the trait path for `{path}`"))?;
            files.push(DataLoaderFile { trait_path, path });
        }
        files.sort_by(|a, b| a.trait_path.cmp(&b.trait_path));
        Ok(files)
    }

    /// Find the sidebar files of all the crates in the doc root, sorted by crate name.
    #[tracing::instrument("Discover sidebar files", skip_all, level = tracing::Level::DEBUG, fields(root = %self.root))]
    pub fn discover_sidebars(&self) -> Result<Vec<SidebarFile>, anyhow::Error> {
        let pattern = format!("*/{}", self.config.sidebar_file);
        let mut files = Vec::new();
        for path in find_files(&self.root, &pattern)? {
            let Some(crate_name) = path
                .parent()
                .and_then(Utf8Path::file_name)
                .map(str::to_owned)
            else {
                continue;
            };
            if crate_name == self.config.implementors_dir {
                continue;
            }
            files.push(SidebarFile { crate_name, path });
        }
        files.sort_by(|a, b| a.crate_name.cmp(&b.crate_name));
        Ok(files)
    }

    /// Read and decode the data loader for a trait.
    #[tracing::instrument("Load data loader", skip_all, level = tracing::Level::DEBUG, fields(trait_path = %trait_path))]
    pub fn load_data_loader(&self, trait_path: &TraitPath) -> Result<DataLoader, anyhow::Error> {
        let path = self.data_loader_path(trait_path);
        let source = fs_err::read_to_string(&path)?;
        DataLoader::from_literal(&source)
            .with_context(|| format!("Failed to decode the data loader at `{path}`"))
    }

    /// Read and decode the sidebar file for a crate.
    #[tracing::instrument("Load sidebar", skip_all, level = tracing::Level::DEBUG, fields(crate.name = %crate_name))]
    pub fn load_sidebar(&self, crate_name: &str) -> Result<SidebarItems, anyhow::Error> {
        let path = self.sidebar_path(crate_name);
        let source = fs_err::read_to_string(&path)?;
        sidebar::parse(&source)
            .with_context(|| format!("Failed to decode the sidebar items at `{path}`"))
    }

    /// Open the page of a trait: create its controller and run its data loader,
    /// in the given order relative to the controller initialization.
    #[tracing::instrument("Open trait page", skip_all, fields(trait_path = %trait_path, order = ?order))]
    pub fn open_page(
        &self,
        trait_path: &TraitPath,
        order: LoadOrder,
    ) -> Result<PageController, anyhow::Error> {
        let loader = self.load_data_loader(trait_path)?;
        let mut controller = PageController::new(self.config.pending_policy);
        match order {
            LoadOrder::ControllerFirst => {
                controller.initialize();
                loader.publish(&mut controller);
            }
            LoadOrder::LoaderFirst => {
                loader.publish(&mut controller);
                controller.initialize();
            }
        }
        Ok(controller)
    }

    /// Write the data loader for a trait.
    ///
    /// The file is only touched if its content changes. Returns `true` if the
    /// file was written.
    #[tracing::instrument("Write data loader", skip_all, level = tracing::Level::DEBUG, fields(trait_path = %trait_path))]
    pub fn write_data_loader(
        &self,
        trait_path: &TraitPath,
        batch: &ImplementorBatch,
    ) -> Result<bool, anyhow::Error> {
        let path = self.data_loader_path(trait_path);
        if let Some(parent) = path.parent() {
            fs_err::create_dir_all(parent)?;
        }
        persist_if_changed(&path, literal::emit(batch).as_bytes())
    }
}

fn find_files(dir: &Utf8Path, pattern: &str) -> Result<Vec<Utf8PathBuf>, anyhow::Error> {
    let walker = globwalk::GlobWalkerBuilder::from_patterns(dir, &[pattern])
        .build()
        .with_context(|| format!("Failed to scan `{dir}`"))?;
    let mut paths = Vec::new();
    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to scan `{dir}`"))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = Utf8PathBuf::from_path_buf(entry.into_path())
            .map_err(|p| anyhow::anyhow!("`{}` is not a valid UTF-8 path", p.display()))?;
        paths.push(path);
    }
    Ok(paths)
}

/// Only persist the content if it differs from the one already on disk.
fn persist_if_changed(path: &Utf8Path, content: &[u8]) -> Result<bool, anyhow::Error> {
    if !has_changed(path, content).unwrap_or(true) {
        return Ok(false);
    }
    fs_err::write(path, content)?;
    Ok(true)
}

/// Returns `true` if the file contents are different from the buffer.
///
/// It returns an error if the outcome can't be determined (e.g. the file doesn't exist).
fn has_changed(path: &Utf8Path, content: &[u8]) -> Result<bool, anyhow::Error> {
    let file = fs_err::File::open(path)?;
    // Cheaper check first.
    if file.metadata()?.len() != content.len() as u64 {
        return Ok(true);
    }
    let mut hasher = sha2::Sha256::new();
    let mut reader = std::io::BufReader::new(file);
    let mut buffer = [0; 8192];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(hasher.finalize() != sha2::Sha256::digest(content))
}
