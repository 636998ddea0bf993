use crate::types::{Citation, CitationReport, ClaimCitations, SourceType};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SAMPLE_CAP: usize = 5;

/// Support for one claim from one source type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorroborationCell {
    pub claim: String,
    pub source_type: SourceType,

    /// Matches before the per-bucket cap
    pub count: usize,

    pub samples: Vec<Citation>,
}

/// A citation proposed as an exhibit for a claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedEvidence {
    pub claim: String,
    pub label: String,
    pub citation: Citation,
    pub justification: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorroborationMatrix {
    pub cells: Vec<CorroborationCell>,
    pub suggestions: Vec<SuggestedEvidence>,
}

impl CorroborationMatrix {
    pub fn cell(&self, claim: &str, source_type: SourceType) -> Option<&CorroborationCell> {
        self.cells
            .iter()
            .find(|c| c.claim == claim && c.source_type == source_type)
    }

    /// Claims with at least one citation of two or more source types
    pub fn corroborated_claims(&self) -> Vec<&str> {
        let mut claims: Vec<&str> = Vec::new();
        for cell in &self.cells {
            if claims.contains(&cell.claim.as_str()) {
                continue;
            }
            let supporting = self
                .cells
                .iter()
                .filter(|c| c.claim == cell.claim && c.count > 0)
                .count();
            if supporting >= 2 {
                claims.push(&cell.claim);
            }
        }
        claims
    }
}

/// Groups citations into a claim × source-type matrix and proposes exhibits
#[derive(Debug, Clone)]
pub struct EvidenceClusterer {
    sample_cap: usize,
}

impl Default for EvidenceClusterer {
    fn default() -> Self {
        Self {
            sample_cap: DEFAULT_SAMPLE_CAP,
        }
    }
}

impl EvidenceClusterer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sample_cap(mut self, sample_cap: usize) -> Self {
        self.sample_cap = sample_cap;
        self
    }

    pub fn cluster(&self, report: &CitationReport) -> CorroborationMatrix {
        let mut matrix = CorroborationMatrix::default();
        for claim in &report.claims {
            for source_type in SourceType::ALL {
                let set = claim.set(source_type);
                matrix.cells.push(CorroborationCell {
                    claim: claim.claim.clone(),
                    source_type,
                    count: set.total,
                    samples: set.items.iter().take(self.sample_cap).cloned().collect(),
                });
            }
            matrix.suggestions.extend(suggestions_for(claim));
        }
        log::debug!(
            "Clustered {} claim(s) into {} cell(s), {} suggestion(s)",
            report.claims.len(),
            matrix.cells.len(),
            matrix.suggestions.len()
        );
        matrix
    }
}

/// First document, then first e-mail, for a claim
fn suggestions_for(claim: &ClaimCitations) -> Vec<SuggestedEvidence> {
    let picks = [
        (
            claim.documents.first(),
            format!("Primary documentary support for {}", claim.label),
        ),
        (
            claim.emails.first(),
            format!("Contemporaneous communication corroborating {}", claim.label),
        ),
    ];
    picks
        .into_iter()
        .filter_map(|(citation, justification)| {
            citation.map(|citation| SuggestedEvidence {
                claim: claim.claim.clone(),
                label: claim.label.clone(),
                citation: citation.clone(),
                justification,
            })
        })
        .collect()
}
