//! Persisted pair list.
//!
//! One base symbol per line. The scanner reads it at the start of every
//! tick; the catalog refresh rewrites it only when the set of pairs changed.

use std::collections::{BTreeSet, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::MarketError;
use crate::types::Pair;

/// Trim, upper-case, drop blanks and duplicates. First occurrence wins.
pub fn normalize_pairs<'a>(lines: impl IntoIterator<Item = &'a str>) -> Vec<Pair> {
    let mut seen = HashSet::new();
    lines
        .into_iter()
        .filter_map(Pair::parse)
        .filter(|p| seen.insert(p.clone()))
        .collect()
}

/// What a catalog sync did to the file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PairListUpdate {
    Created { count: usize },
    Updated { added: Vec<Pair>, removed: Vec<Pair> },
    Unchanged,
}

#[derive(Clone, Debug)]
pub struct PairListFile {
    path: PathBuf,
}

impl PairListFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current pair list. A missing file is an empty list.
    pub async fn load(&self) -> Result<Vec<Pair>, MarketError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(normalize_pairs(raw.lines())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %self.path.display(), "pair list file not found; tracking no pairs");
                Ok(Vec::new())
            }
            Err(source) => Err(self.io_error(source)),
        }
    }

    /// Compare `current` with the persisted set and rewrite the file when
    /// they differ.
    pub async fn sync(&self, current: &[Pair]) -> Result<PairListUpdate, MarketError> {
        let previous = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => Some(normalize_pairs(raw.lines())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "pair list file not found, creating a new one");
                None
            }
            Err(source) => return Err(self.io_error(source)),
        };

        let current_set: BTreeSet<Pair> = current.iter().cloned().collect();

        let update = match previous {
            None => PairListUpdate::Created {
                count: current_set.len(),
            },
            Some(previous) => {
                let previous_set: BTreeSet<Pair> = previous.into_iter().collect();
                if previous_set == current_set {
                    return Ok(PairListUpdate::Unchanged);
                }
                PairListUpdate::Updated {
                    added: current_set.difference(&previous_set).cloned().collect(),
                    removed: previous_set.difference(&current_set).cloned().collect(),
                }
            }
        };

        let mut body = String::new();
        for pair in &current_set {
            body.push_str(pair.symbol());
            body.push('\n');
        }
        self.replace_contents(body).await?;

        Ok(update)
    }

    /// Write to a sibling file and rename it over the list, so concurrent
    /// readers see either the old or the new contents.
    async fn replace_contents(&self, body: String) -> Result<(), MarketError> {
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|source| self.io_error(source))?;

        if let Err(source) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(self.io_error(source));
        }
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut raw = self.path.clone().into_os_string();
        raw.push(".tmp");
        PathBuf::from(raw)
    }

    fn io_error(&self, source: std::io::Error) -> MarketError {
        MarketError::PairFile {
            path: self.path.clone(),
            source,
        }
    }
}
