use evidence_analytics::{EmailStats, ThreadSummary};
use evidence_citation::{CorroborationMatrix, GraphStatus, SourceRef, SourceType};
use evidence_mailbox::IngestReport;
use std::collections::BTreeSet;

pub struct ReportInput<'a> {
    pub ingest: &'a IngestReport,
    pub stats: &'a EmailStats,
    pub threads: &'a [ThreadSummary],
    pub matrix: &'a CorroborationMatrix,
    pub graph_status: GraphStatus,
}

pub fn render_markdown(input: &ReportInput<'_>) -> String {
    let mut md = String::new();
    md.push_str("# Evidence report\n\n");
    md.push_str(&format!(
        "- Archives: `{}` ({} failed)\n",
        input.ingest.files,
        input.ingest.failed_files.len()
    ));
    md.push_str(&format!("- Messages: `{}`\n", input.ingest.messages));
    md.push_str(&format!(
        "- Skipped malformed: `{}`\n",
        input.ingest.skipped_malformed
    ));
    md.push_str(&format!("- Threads: `{}`\n", input.threads.len()));
    md.push_str(&format!("- Graph: `{}`\n\n", graph_status_label(input.graph_status)));

    render_actors(&mut md, input.stats);
    render_matrix(&mut md, input.matrix);
    render_suggestions(&mut md, input.matrix);
    md
}

fn render_actors(md: &mut String, stats: &EmailStats) {
    md.push_str("## Actors\n\n");
    if stats.is_empty() {
        md.push_str("_No messages._\n\n");
        return;
    }
    md.push_str("| actor | messages | continuances | avg reply days |\n");
    md.push_str("|---|---:|---:|---:|\n");
    let actors: BTreeSet<&String> = stats
        .counts_by_actor
        .keys()
        .chain(stats.continuances_by_actor.keys())
        .chain(stats.avg_days_by_actor.keys())
        .collect();
    for actor in actors {
        md.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            escape_cell(actor),
            stats.counts_by_actor.get(actor).copied().unwrap_or(0),
            stats.continuances_by_actor.get(actor).copied().unwrap_or(0),
            stats
                .avg_days_by_actor
                .get(actor)
                .map_or("n/a".to_string(), |d| format!("{d:.2}")),
        ));
    }
    md.push('\n');
}

fn render_matrix(md: &mut String, matrix: &CorroborationMatrix) {
    md.push_str("## Corroboration\n\n");
    md.push_str("| claim | email | document | graph |\n");
    md.push_str("|---|---:|---:|---:|\n");
    let mut seen = BTreeSet::new();
    for cell in &matrix.cells {
        if !seen.insert(cell.claim.as_str()) {
            continue;
        }
        let count = |source_type: SourceType| {
            matrix
                .cell(&cell.claim, source_type)
                .map_or(0, |c| c.count)
        };
        md.push_str(&format!(
            "| `{}` | {} | {} | {} |\n",
            cell.claim,
            count(SourceType::Email),
            count(SourceType::Document),
            count(SourceType::Graph),
        ));
    }
    md.push('\n');
}

fn render_suggestions(md: &mut String, matrix: &CorroborationMatrix) {
    md.push_str("## Suggested exhibits\n\n");
    if matrix.suggestions.is_empty() {
        md.push_str("_None._\n");
        return;
    }
    for suggestion in &matrix.suggestions {
        let citation = &suggestion.citation;
        let source = match &citation.source {
            SourceRef::File(path) => format!("`{path}`"),
            SourceRef::Node(id) => format!("graph node `{id}`"),
        };
        md.push_str(&format!(
            "- **{}**: {} ({}, {})\n",
            suggestion.label,
            escape_inline(&citation.title),
            citation.source_type,
            source
        ));
        md.push_str(&format!("  - {}\n", suggestion.justification));
    }
}

fn graph_status_label(status: GraphStatus) -> &'static str {
    match status {
        GraphStatus::Disabled => "disabled",
        GraphStatus::Available => "available",
        GraphStatus::Unavailable => "unavailable",
        GraphStatus::Degraded => "degraded",
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn escape_inline(text: &str) -> String {
    text.replace('\n', " ").replace('*', "\\*")
}

#[cfg(test)]
mod tests {
    use super::*;
    use evidence_citation::{Citation, CorroborationCell, SuggestedEvidence};
    use std::collections::BTreeMap;

    #[test]
    fn renders_actor_table_and_suggestions() {
        let stats = EmailStats {
            counts_by_actor: BTreeMap::from([("a|b".to_string(), 2), ("c".to_string(), 1)]),
            continuances_by_actor: BTreeMap::from([("c".to_string(), 1)]),
            avg_days_by_actor: BTreeMap::from([("c".to_string(), 1.5)]),
        };
        let citation = Citation {
            id: "mortgage_relief_doc_0_ex7".to_string(),
            source_type: SourceType::Document,
            title: "Denial letter".to_string(),
            date: None,
            detail: String::new(),
            source: SourceRef::File("/ex/denial.pdf".to_string()),
        };
        let matrix = CorroborationMatrix {
            cells: vec![CorroborationCell {
                claim: "mortgage_relief".to_string(),
                source_type: SourceType::Document,
                count: 1,
                samples: vec![citation.clone()],
            }],
            suggestions: vec![SuggestedEvidence {
                claim: "mortgage_relief".to_string(),
                label: "Mortgage relief".to_string(),
                citation,
                justification: "Primary documentary support for Mortgage relief".to_string(),
            }],
        };

        let md = render_markdown(&ReportInput {
            ingest: &IngestReport::default(),
            stats: &stats,
            threads: &[],
            matrix: &matrix,
            graph_status: GraphStatus::Disabled,
        });

        assert!(md.contains("| a\\|b | 2 | 0 | n/a |"));
        assert!(md.contains("| c | 1 | 1 | 1.50 |"));
        assert!(md.contains("| `mortgage_relief` | 0 | 1 | 0 |"));
        assert!(md.contains("- **Mortgage relief**: Denial letter (document, `/ex/denial.pdf`)"));
        assert!(md.contains("- Graph: `disabled`"));
    }

    #[test]
    fn empty_inputs_render_placeholders() {
        let md = render_markdown(&ReportInput {
            ingest: &IngestReport::default(),
            stats: &EmailStats::default(),
            threads: &[],
            matrix: &CorroborationMatrix::default(),
            graph_status: GraphStatus::Unavailable,
        });
        assert!(md.contains("_No messages._"));
        assert!(md.contains("_None._"));
        assert!(md.contains("- Graph: `unavailable`"));
    }
}
