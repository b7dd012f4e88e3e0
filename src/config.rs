// Global registry of scattering-table locations.
use crate::tables::TablePaths;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;

pub static CONFIG: Lazy<Mutex<Config>> = Lazy::new(|| Mutex::new(Config::new()));

/// Process-wide mapping from material names to the paths of the four
/// interpolation tables that drive that material's inelastic scattering.
///
/// Table paths are opaque strings; resolving and reading them is the table
/// loader's business. A single global instance is exposed via the `CONFIG`
/// static; most code should obtain a guard with [`Config::global`] rather
/// than locking the mutex directly.
#[derive(Debug, Clone, Default)]
pub struct Config {
    scatter_tables: HashMap<String, TablePaths>,
}

impl Config {
    pub fn new() -> Self {
        Config {
            scatter_tables: HashMap::new(),
        }
    }

    /// Register the table set for a material, replacing any previous entry.
    pub fn set_scatter_tables(&mut self, material: &str, paths: TablePaths) {
        self.scatter_tables.insert(material.to_string(), paths);
    }

    pub fn scatter_tables(&self, material: &str) -> Option<TablePaths> {
        self.scatter_tables.get(material).cloned()
    }

    pub fn clear(&mut self) {
        self.scatter_tables.clear();
    }

    /// Get the global configuration instance.
    pub fn global() -> std::sync::MutexGuard<'static, Self> {
        CONFIG
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
