use crate::error::DependencyError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// A fact node in the external graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphFact {
    pub id: String,

    #[serde(default)]
    pub label: String,

    #[serde(default)]
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// File the fact was extracted from, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
}

impl GraphFact {
    fn searchable_text(&self) -> String {
        format!("{} {}", self.label, self.text).to_lowercase()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphRelationship {
    pub from: String,
    pub to: String,

    #[serde(rename = "type", default)]
    pub kind: String,
}

/// Nodes around a fact and the relationships among them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neighborhood {
    pub nodes: Vec<GraphFact>,
    pub relationships: Vec<GraphRelationship>,
}

/// Keyword query for facts supporting one claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactQuery {
    pub claim: String,

    /// Lower-cased phrases; a fact matches if it contains any
    pub keywords: Vec<String>,

    pub limit: usize,
}

/// Facts answering a [`FactQuery`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactMatches {
    /// Matching facts before `limit` was applied
    pub total: usize,

    /// At most `limit` facts, in graph order
    pub facts: Vec<GraphFact>,
}

/// Read contract of the external fact-graph collaborator
#[async_trait]
pub trait GraphFactSource: Send + Sync {
    async fn connect(&self) -> Result<(), DependencyError>;

    async fn execute_query(&self, query: &FactQuery) -> Result<FactMatches, DependencyError>;

    async fn get_neighborhood(
        &self,
        id: &str,
        hops: usize,
        limit: usize,
    ) -> Result<Neighborhood, DependencyError>;

    async fn disconnect(&self) -> Result<(), DependencyError>;
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SnapshotData {
    #[serde(default)]
    nodes: Vec<GraphFact>,
    #[serde(default)]
    relationships: Vec<GraphRelationship>,
}

/// [`GraphFactSource`] backed by a JSON export of the fact graph.
///
/// `connect` reads the file; queries before `connect` fail as unavailable.
pub struct JsonGraphSnapshot {
    path: PathBuf,
    data: RwLock<Option<Arc<SnapshotData>>>,
}

impl JsonGraphSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            data: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn snapshot(&self) -> Result<Arc<SnapshotData>, DependencyError> {
        self.data
            .read()
            .await
            .clone()
            .ok_or_else(|| DependencyError::Unavailable("graph snapshot is not connected".to_string()))
    }
}

#[async_trait]
impl GraphFactSource for JsonGraphSnapshot {
    async fn connect(&self) -> Result<(), DependencyError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| DependencyError::Unavailable(format!("{}: {e}", self.path.display())))?;
        let data: SnapshotData = serde_json::from_slice(&bytes)
            .map_err(|e| DependencyError::Unavailable(format!("{}: {e}", self.path.display())))?;
        log::debug!(
            "Graph snapshot {} loaded: {} node(s), {} relationship(s)",
            self.path.display(),
            data.nodes.len(),
            data.relationships.len()
        );
        *self.data.write().await = Some(Arc::new(data));
        Ok(())
    }

    async fn execute_query(&self, query: &FactQuery) -> Result<FactMatches, DependencyError> {
        let data = self.snapshot().await?;
        let matching: Vec<&GraphFact> = data
            .nodes
            .iter()
            .filter(|node| {
                let text = node.searchable_text();
                query.keywords.iter().any(|k| text.contains(k.as_str()))
            })
            .collect();
        Ok(FactMatches {
            total: matching.len(),
            facts: matching.into_iter().take(query.limit).cloned().collect(),
        })
    }

    async fn get_neighborhood(
        &self,
        id: &str,
        hops: usize,
        limit: usize,
    ) -> Result<Neighborhood, DependencyError> {
        let data = self.snapshot().await?;
        let by_id: HashMap<&str, &GraphFact> =
            data.nodes.iter().map(|n| (n.id.as_str(), n)).collect();
        let Some(center) = by_id.get(id) else {
            return Err(DependencyError::Query(format!("unknown node '{id}'")));
        };

        let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
        for rel in &data.relationships {
            adjacency.entry(rel.from.as_str()).or_default().push(rel.to.as_str());
            adjacency.entry(rel.to.as_str()).or_default().push(rel.from.as_str());
        }

        let mut visited: HashSet<&str> = HashSet::from([id]);
        let mut nodes = vec![(*center).clone()];
        let mut queue = VecDeque::from([(id, 0usize)]);
        'walk: while let Some((current, depth)) = queue.pop_front() {
            if depth >= hops {
                continue;
            }
            for &next in adjacency.get(current).into_iter().flatten() {
                if nodes.len() > limit {
                    break 'walk;
                }
                if !visited.insert(next) {
                    continue;
                }
                if let Some(node) = by_id.get(next) {
                    nodes.push((*node).clone());
                    queue.push_back((next, depth + 1));
                }
            }
        }
        nodes.truncate(limit + 1);

        let kept: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        let relationships = data
            .relationships
            .iter()
            .filter(|r| kept.contains(r.from.as_str()) && kept.contains(r.to.as_str()))
            .cloned()
            .collect();

        Ok(Neighborhood {
            nodes,
            relationships,
        })
    }

    async fn disconnect(&self) -> Result<(), DependencyError> {
        *self.data.write().await = None;
        Ok(())
    }
}
