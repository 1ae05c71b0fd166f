//! Universe configuration: the codes to scan and their display names.
//!
//! Stored as TOML, either as one flat `[symbols]` table or as sector tables
//! (`[sectors.<name>]`) that are merged. A code listed in several places is
//! scanned once. Iteration is in sorted code order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_TAIWAN: &str = include_str!("../universe/taiwan.toml");

#[derive(Debug, Error)]
pub enum UniverseError {
    #[error("read universe file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse universe TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize universe: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// On-disk layout; both tables are optional.
#[derive(Debug, Default, Deserialize)]
struct UniverseFile {
    #[serde(default)]
    symbols: BTreeMap<String, String>,
    #[serde(default)]
    sectors: BTreeMap<String, BTreeMap<String, String>>,
}

/// Code → display name, deduplicated and sorted by code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Universe {
    symbols: BTreeMap<String, String>,
}

impl Universe {
    /// Load a universe from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, UniverseError> {
        let content = std::fs::read_to_string(path).map_err(|source| UniverseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a universe from a TOML string.
    ///
    /// Sector tables are merged in sector-name order, then `[symbols]`; on a
    /// repeated code the later entry's name wins.
    pub fn from_toml(content: &str) -> Result<Self, UniverseError> {
        let file: UniverseFile = toml::from_str(content)?;
        let mut symbols = BTreeMap::new();
        for (_, members) in file.sectors {
            symbols.extend(members);
        }
        symbols.extend(file.symbols);
        Ok(Self::from_pairs(symbols))
    }

    /// Build from (code, name) pairs; blank codes are dropped, codes trimmed.
    pub fn from_pairs<I, C, N>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (C, N)>,
        C: AsRef<str>,
        N: Into<String>,
    {
        let symbols = pairs
            .into_iter()
            .filter_map(|(code, name)| {
                let code = code.as_ref().trim();
                (!code.is_empty()).then(|| (code.to_string(), name.into()))
            })
            .collect();
        Self { symbols }
    }

    /// The built-in Taiwan list: Taiwan 50 core, mid-caps, themes and ETFs.
    pub fn default_taiwan() -> Self {
        // The bundled file is checked by the `default_universe_*` tests.
        Self::from_toml(DEFAULT_TAIWAN).unwrap_or_default()
    }

    /// Display name for a code, if listed.
    pub fn name_of(&self, code: &str) -> Option<&str> {
        self.symbols.get(code).map(String::as_str)
    }

    /// (code, name) in sorted code order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.symbols.iter().map(|(c, n)| (c.as_str(), n.as_str()))
    }

    pub fn codes(&self) -> Vec<&str> {
        self.symbols.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Serialize the universe to TOML (flat `[symbols]` table).
    pub fn to_toml(&self) -> Result<String, UniverseError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
