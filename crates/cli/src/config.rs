use anyhow::{Context, Result};
use evidence_citation::{
    CitationSettings, DEFAULT_DETAIL_CHARS, DEFAULT_GRAPH_TIMEOUT_MS, DEFAULT_PER_BUCKET_CAP,
};
use evidence_mailbox::{ActorDirectory, ArchiveSource, DEFAULT_EXTENSIONS};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "evidence.toml";

/// Settings read from `evidence.toml`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvidenceConfig {
    pub archive: ArchiveConfig,
    pub registry: RegistryConfig,
    pub claims: ClaimsConfig,
    pub citations: CitationsConfig,
    pub graph: GraphConfig,

    /// Address or `@domain` to party name
    pub actors: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArchiveConfig {
    pub dir: PathBuf,
    pub fallback_file: Option<String>,
    pub extensions: Vec<String>,
    pub concurrency: usize,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("mail"),
            fallback_file: None,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            concurrency: 4,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClaimsConfig {
    /// Bucket document; the bundled set is used when absent
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CitationsConfig {
    pub per_bucket_cap: usize,
    pub detail_chars: usize,
}

impl Default for CitationsConfig {
    fn default() -> Self {
        Self {
            per_bucket_cap: DEFAULT_PER_BUCKET_CAP,
            detail_chars: DEFAULT_DETAIL_CHARS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GraphConfig {
    /// JSON graph export; graph citations are disabled when absent
    pub snapshot: Option<PathBuf>,
    pub timeout_ms: u64,
    pub fact_limit: Option<usize>,
    pub neighborhood_hops: usize,
    pub neighborhood_limit: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            snapshot: None,
            timeout_ms: DEFAULT_GRAPH_TIMEOUT_MS,
            fact_limit: None,
            neighborhood_hops: 0,
            neighborhood_limit: 5,
        }
    }
}

/// Command-line values that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub archive_dir: Option<PathBuf>,
    pub registry: Option<PathBuf>,
    pub claims: Option<PathBuf>,
    pub graph_snapshot: Option<PathBuf>,
}

impl EvidenceConfig {
    /// Load `path`, or `evidence.toml` in the working directory when present.
    ///
    /// An explicitly named file must exist; the implicit one is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let implicit = Path::new(DEFAULT_CONFIG_FILE);
                if implicit.is_file() {
                    Self::from_file(implicit)
                } else {
                    log::debug!("No {DEFAULT_CONFIG_FILE} found; using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = Self::parse(&raw)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(config.resolve_paths(base))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Make relative paths relative to `base`
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        join(&mut self.archive.dir);
        for path in [
            &mut self.registry.path,
            &mut self.claims.path,
            &mut self.graph.snapshot,
        ]
        .into_iter()
        .flatten()
        {
            join(path);
        }
        self
    }

    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(dir) = overrides.archive_dir {
            self.archive.dir = dir;
        }
        if let Some(path) = overrides.registry {
            self.registry.path = Some(path);
        }
        if let Some(path) = overrides.claims {
            self.claims.path = Some(path);
        }
        if let Some(path) = overrides.graph_snapshot {
            self.graph.snapshot = Some(path);
        }
    }

    pub fn archive_source(&self) -> ArchiveSource {
        let mut source =
            ArchiveSource::new(&self.archive.dir).with_extensions(self.archive.extensions.clone());
        if let Some(name) = &self.archive.fallback_file {
            source = source.with_fallback_file(name.clone());
        }
        source
    }

    pub fn actor_directory(&self) -> ActorDirectory {
        ActorDirectory::from_entries(&self.actors)
    }

    pub fn citation_settings(&self) -> CitationSettings {
        CitationSettings {
            per_bucket_cap: self.citations.per_bucket_cap,
            detail_chars: self.citations.detail_chars,
            graph_timeout_ms: self.graph.timeout_ms,
            graph_fact_limit: self.graph.fact_limit,
            neighborhood_hops: self.graph.neighborhood_hops,
            neighborhood_limit: self.graph.neighborhood_limit,
        }
    }
}
