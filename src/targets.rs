use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::model::Target;

/// Where pending scraping requests come from.
pub trait TargetSource {
    fn pending(&self) -> Result<Vec<Target>>;
}

/// A JSON array of targets on disk.
pub struct JsonTargets {
    path: PathBuf,
}

impl JsonTargets {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl TargetSource for JsonTargets {
    fn pending(&self) -> Result<Vec<Target>> {
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read targets from {}", self.path.display()))?;
        let targets = parse_targets(&raw)
            .with_context(|| format!("Failed to parse targets in {}", self.path.display()))?;
        info!("Loaded {} targets from {}", targets.len(), self.path.display());
        Ok(targets)
    }
}

/// Parse a targets document, dropping entries without a name or URL.
pub fn parse_targets(raw: &str) -> Result<Vec<Target>> {
    let all: Vec<Target> = serde_json::from_str(raw)?;
    Ok(all
        .into_iter()
        .filter(|t| {
            let ok = !t.company_name.trim().is_empty() && !t.careers_url.trim().is_empty();
            if !ok {
                warn!("Skipping incomplete target: {:?}", t);
            }
            ok
        })
        .map(|t| Target {
            company_name: t.company_name.trim().to_string(),
            careers_url: t.careers_url.trim().to_string(),
            keywords: t
                .keywords
                .into_iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
        })
        .collect())
}
