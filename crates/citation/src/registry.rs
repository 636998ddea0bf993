use crate::error::{CitationError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Exhibit number as written in the registry (`12` or `"12-A"`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExhibitNumber {
    Number(u64),
    Text(String),
}

impl fmt::Display for ExhibitNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExhibitNumber::Number(n) => write!(f, "{n}"),
            ExhibitNumber::Text(s) => f.write_str(s),
        }
    }
}

/// One documentary exhibit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exhibit {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default, rename = "type")]
    pub kind: Option<String>,

    #[serde(default)]
    pub path: Option<String>,

    #[serde(default)]
    pub date: Option<String>,

    #[serde(default)]
    pub slug: Option<String>,

    #[serde(default)]
    pub no: Option<ExhibitNumber>,
}

impl Exhibit {
    /// Filesystem path, if present and non-blank
    pub fn file(&self) -> Option<&str> {
        non_blank(self.path.as_deref())
    }

    /// Title, falling back to the file name of `path`
    pub fn display_title(&self) -> String {
        if let Some(title) = non_blank(self.title.as_deref()) {
            return title.to_string();
        }
        self.file()
            .and_then(|p| Path::new(p).file_name())
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "Untitled exhibit".to_string())
    }

    /// Stable key used in citation ids
    pub fn key(&self, position: usize) -> String {
        if let Some(slug) = non_blank(self.slug.as_deref()) {
            return slug.to_string();
        }
        match &self.no {
            Some(no) => format!("ex{no}"),
            None => format!("idx{position}"),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Document/exhibit registry (`{ exhibits: [...], generated_at }`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExhibitRegistry {
    #[serde(default)]
    pub exhibits: Vec<Exhibit>,

    #[serde(default)]
    pub generated_at: Option<String>,
}

#[derive(Deserialize)]
struct RawRegistry {
    #[serde(default)]
    exhibits: Vec<serde_json::Value>,

    #[serde(default)]
    generated_at: Option<String>,
}

impl ExhibitRegistry {
    pub fn new(exhibits: Vec<Exhibit>) -> Self {
        Self {
            exhibits,
            generated_at: None,
        }
    }

    /// Load a registry, degrading to an empty one when missing or malformed
    pub async fn load(path: &Path) -> Self {
        match Self::try_load(path).await {
            Ok(registry) => {
                log::debug!(
                    "Loaded {} exhibit(s) from {}",
                    registry.exhibits.len(),
                    path.display()
                );
                registry
            }
            Err(CitationError::MissingRegistry(path)) => {
                log::warn!("Exhibit registry {} not found; citing no documents", path.display());
                Self::default()
            }
            Err(e) => {
                log::warn!("{e}; citing no documents");
                Self::default()
            }
        }
    }

    pub async fn try_load(path: &Path) -> Result<Self> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CitationError::MissingRegistry(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        Self::from_slice(&bytes).map_err(|reason| CitationError::InvalidRegistry {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Parse a registry document.
    ///
    /// Fails only when the document itself is not a registry; exhibits that
    /// do not fit the schema are skipped with a warning.
    pub fn from_slice(bytes: &[u8]) -> std::result::Result<Self, String> {
        let raw: RawRegistry = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
        let exhibits = raw
            .exhibits
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value::<Exhibit>(entry) {
                Ok(exhibit) => Some(exhibit),
                Err(e) => {
                    log::warn!("Skipping exhibit #{index}: {e}");
                    None
                }
            })
            .collect();
        Ok(Self {
            exhibits,
            generated_at: raw.generated_at,
        })
    }

    pub fn len(&self) -> usize {
        self.exhibits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exhibits.is_empty()
    }
}
