//! Pack manifest
//!
//! ```toml
//! target = "stm32f401"          # or "v85xx", or a full [layout] table
//!
//! [[module]]
//! id = 1
//! address = 0x4000
//! image = "build/module1.bin"
//! got = "build/module1.got"     # optional, zero-filled if absent
//!
//! [[module.function]]
//! name = "process_data"
//! offset = 0x0
//! size = 256
//! peripherals = ["uart", "gpio"]
//! ```
//!
//! Paths are relative to the manifest.

use std::path::{Path, PathBuf};

use palimpsest_core::LoaderLayout;
use serde::Deserialize;

use crate::error::PackError;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Layout preset name
    #[serde(default)]
    pub target: Option<String>,
    /// Explicit layout; exclusive with `target`
    #[serde(default)]
    pub layout: Option<LoaderLayout>,
    #[serde(default, rename = "module")]
    pub modules: Vec<ModuleSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleSpec {
    pub id: u32,
    pub address: u32,
    pub image: PathBuf,
    /// Declared module size; defaults to the extent of image and GOT/PLT
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub got: Option<PathBuf>,
    #[serde(default)]
    pub plt: Option<PathBuf>,
    #[serde(default, rename = "function")]
    pub functions: Vec<FunctionSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FunctionSpec {
    pub name: String,
    pub offset: u32,
    pub size: u32,
    #[serde(default)]
    pub peripherals: Vec<String>,
}

impl Manifest {
    pub fn parse(text: &str) -> Result<Self, PackError> {
        Ok(toml::from_str(text)?)
    }

    /// Effective loader layout
    pub fn layout(&self) -> Result<LoaderLayout, PackError> {
        match (&self.target, &self.layout) {
            (Some(_), Some(_)) => Err(PackError::Layout(
                "give either `target` or [layout], not both".into(),
            )),
            (Some(target), None) => preset(target),
            (None, Some(layout)) => Ok(*layout),
            (None, None) => Ok(LoaderLayout::default()),
        }
    }
}

fn preset(name: &str) -> Result<LoaderLayout, PackError> {
    match name.to_ascii_lowercase().as_str() {
        "stm32f401" => Ok(LoaderLayout::STM32F401),
        "v85xx" => Ok(LoaderLayout::V85XX),
        _ => Err(PackError::Layout(format!("unknown target `{}`", name))),
    }
}

impl ModuleSpec {
    /// Resolve input paths against the manifest directory
    pub fn resolve(&mut self, base: &Path) {
        self.image = base.join(&self.image);
        if let Some(got) = &mut self.got {
            *got = base.join(&*got);
        }
        if let Some(plt) = &mut self.plt {
            *plt = base.join(&*plt);
        }
    }
}
