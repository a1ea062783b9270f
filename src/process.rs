use std::collections::HashSet;

use crate::config::{ProcessType, WorkflowDraft};

// Language in task descriptions that signals delegation between agents.
const DELEGATION_MARKERS: &[&str] = &[
    "coordinate",
    "coordination",
    "delegate",
    "delegation",
    "oversee",
    "supervise",
    "review",
    "approve",
    "approval",
    "manage",
    "orchestrate",
];

/// Resolve the execution topology for a validated draft.
///
/// An ordered chain of decision sources, first match wins: the caller's
/// explicit choice, then the model's recommendation, then a deterministic
/// heuristic over the draft itself.
pub fn select(draft: &WorkflowDraft, explicit: Option<ProcessType>) -> ProcessType {
    if let Some(process) = explicit {
        return process;
    }
    if let Some(process) = draft.process {
        if let Some(rationale) = &draft.process_rationale {
            tracing::debug!("adopting model process recommendation ({rationale})");
        }
        return process;
    }
    infer(draft)
}

// Scoring is deterministic and conservative: a lone weak signal is a tie,
// and ties resolve to sequential.
fn infer(draft: &WorkflowDraft) -> ProcessType {
    let mut score = 0u32;

    if draft.agents.iter().any(|a| a.is_manager) {
        score += 2;
    }
    if draft
        .tasks
        .iter()
        .any(|t| has_delegation_language(&t.description))
    {
        score += 1;
    }
    let distinct_roles: HashSet<String> = draft
        .agents
        .iter()
        .map(|a| a.role.trim().to_ascii_lowercase())
        .collect();
    if distinct_roles.len() > 3 {
        score += 1;
    }

    if score >= 2 {
        ProcessType::Hierarchical
    } else {
        ProcessType::Sequential
    }
}

fn has_delegation_language(text: &str) -> bool {
    let lowered = text.to_ascii_lowercase();
    DELEGATION_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}
