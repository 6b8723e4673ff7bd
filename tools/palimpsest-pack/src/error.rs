use std::fmt;
use std::io;
use std::path::PathBuf;

use palimpsest_core::CatalogError;

/// Everything that can stop an image build
#[derive(Debug)]
pub enum PackError {
    /// Reading an input or writing the output failed
    Io { path: PathBuf, source: io::Error },
    /// The manifest does not parse or names impossible values
    Manifest(String),
    /// Regions overlap or exceed what the loader accepts
    Layout(String),
    /// The catalog would not decode on the target
    Catalog(CatalogError),
}

impl PackError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        PackError::Io {
            path: path.into(),
            source,
        }
    }
}

impl fmt::Display for PackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackError::Io { path, source } => write!(f, "{}: {}", path.display(), source),
            PackError::Manifest(msg) => write!(f, "manifest: {}", msg),
            PackError::Layout(msg) => write!(f, "layout: {}", msg),
            PackError::Catalog(CatalogError::DuplicateModuleId(id)) => {
                write!(f, "catalog: module id {} used twice", id)
            }
            PackError::Catalog(CatalogError::TooManyFunctions { module_id, count }) => write!(
                f,
                "catalog: module {} declares {} functions",
                module_id, count
            ),
            PackError::Catalog(CatalogError::Transport(e)) => write!(f, "catalog: {:?}", e),
        }
    }
}

impl std::error::Error for PackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PackError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<CatalogError> for PackError {
    fn from(e: CatalogError) -> Self {
        PackError::Catalog(e)
    }
}

impl From<toml::de::Error> for PackError {
    fn from(e: toml::de::Error) -> Self {
        PackError::Manifest(e.to_string())
    }
}
