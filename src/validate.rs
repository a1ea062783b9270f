use std::collections::{HashMap, HashSet};
use std::fmt;

use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::prelude::StableGraph;
use petgraph::visit::Dfs;
use thiserror::Error;

use crate::config::{Framework, WorkflowDraft};

/// A single field-level violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub field: String,
    pub message: String,
}

impl Problem {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every invariant violation found in one draft, collected rather than
/// short-circuited so the orchestrator can re-prompt with precise guidance.
#[derive(Debug, Clone, Error)]
#[error("configuration failed validation: {}", .problems.iter().map(|p| p.to_string()).collect::<Vec<_>>().join("; "))]
pub struct ValidationReport {
    pub problems: Vec<Problem>,
}

/// Check a decoded draft against every configuration-model invariant for the
/// given framework. A draft that passes needs no downstream re-validation.
pub fn validate(draft: &WorkflowDraft, framework: Framework) -> Result<(), ValidationReport> {
    let mut problems = Vec::new();

    check_agents(draft, &mut problems);
    check_tools(draft, &mut problems);

    if framework.is_task_based() {
        check_tasks(draft, &mut problems);
    }
    if framework.is_graph_based() {
        check_graph(draft, &mut problems);
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(ValidationReport { problems })
    }
}

fn check_agents(draft: &WorkflowDraft, problems: &mut Vec<Problem>) {
    if draft.agents.is_empty() {
        problems.push(Problem::new("agents", "at least one agent is required"));
        return;
    }

    let mut seen = HashSet::with_capacity(draft.agents.len());
    for (i, agent) in draft.agents.iter().enumerate() {
        if agent.name.is_empty() {
            problems.push(Problem::new(format!("agents[{i}].name"), "must not be empty"));
        } else if !seen.insert(agent.name.as_str()) {
            problems.push(Problem::new(
                format!("agents[{i}].name"),
                format!("duplicate agent name \"{}\"", agent.name),
            ));
        }
        if agent.role.is_empty() {
            problems.push(Problem::new(format!("agents[{i}].role"), "must not be empty"));
        }
    }

    let managers = draft.agents.iter().filter(|a| a.is_manager).count();
    if managers > 1 {
        problems.push(Problem::new(
            "agents",
            format!("{managers} agents are marked isManager; at most one may be"),
        ));
    }
}

fn check_tools(draft: &WorkflowDraft, problems: &mut Vec<Problem>) {
    let mut declared = HashSet::with_capacity(draft.tools.len());
    for (i, tool) in draft.tools.iter().enumerate() {
        if tool.name.is_empty() {
            problems.push(Problem::new(format!("tools[{i}].name"), "must not be empty"));
        } else if !declared.insert(tool.name.as_str()) {
            problems.push(Problem::new(
                format!("tools[{i}].name"),
                format!("duplicate tool name \"{}\"", tool.name),
            ));
        }
    }

    for (i, agent) in draft.agents.iter().enumerate() {
        for tool_name in &agent.tools {
            if !declared.contains(tool_name.as_str()) {
                problems.push(Problem::new(
                    format!("agents[{i}].tools"),
                    format!(
                        "agent \"{}\" references undeclared tool \"{tool_name}\"",
                        agent.name
                    ),
                ));
            }
        }
    }
}

fn check_tasks(draft: &WorkflowDraft, problems: &mut Vec<Problem>) {
    if draft.tasks.is_empty() {
        problems.push(Problem::new("tasks", "at least one task is required"));
        return;
    }

    let agents: HashSet<&str> = draft.agents.iter().map(|a| a.name.as_str()).collect();
    let mut task_names = HashSet::with_capacity(draft.tasks.len());
    for (i, task) in draft.tasks.iter().enumerate() {
        if task.name.is_empty() {
            problems.push(Problem::new(format!("tasks[{i}].name"), "must not be empty"));
        } else if !task_names.insert(task.name.as_str()) {
            problems.push(Problem::new(
                format!("tasks[{i}].name"),
                format!("duplicate task name \"{}\"", task.name),
            ));
        }
        if task.description.is_empty() {
            problems.push(Problem::new(
                format!("tasks[{i}].description"),
                "must not be empty",
            ));
        }
        if task.assigned_agent.is_empty() {
            problems.push(Problem::new(
                format!("tasks[{i}].assignedAgent"),
                format!("task \"{}\" has no assigned agent", task.name),
            ));
        } else if !agents.contains(task.assigned_agent.as_str()) {
            problems.push(Problem::new(
                format!("tasks[{i}].assignedAgent"),
                format!(
                    "task \"{}\" references undeclared agent \"{}\"",
                    task.name, task.assigned_agent
                ),
            ));
        }
    }

    // Dependency graph over declared task names; unknown references are
    // reported here and left out of the cycle check.
    let mut graph = StableGraph::<(), ()>::new();
    let mut indices: HashMap<&str, NodeIndex> = HashMap::with_capacity(draft.tasks.len());
    for task in &draft.tasks {
        indices.entry(task.name.as_str()).or_insert_with(|| graph.add_node(()));
    }
    for (i, task) in draft.tasks.iter().enumerate() {
        for dep in &task.depends_on {
            match indices.get(dep.as_str()) {
                Some(&dep_idx) => {
                    graph.add_edge(dep_idx, indices[task.name.as_str()], ());
                }
                None => problems.push(Problem::new(
                    format!("tasks[{i}].dependsOn"),
                    format!("task \"{}\" depends on undeclared task \"{dep}\"", task.name),
                )),
            }
        }
    }
    if has_cycle(&graph) {
        problems.push(Problem::new("tasks", "task dependencies form a cycle"));
    }
}

fn check_graph(draft: &WorkflowDraft, problems: &mut Vec<Problem>) {
    if draft.nodes.is_empty() {
        problems.push(Problem::new("nodes", "at least one node is required"));
        return;
    }

    let agents: HashSet<&str> = draft.agents.iter().map(|a| a.name.as_str()).collect();
    let mut node_names = HashSet::with_capacity(draft.nodes.len());
    for (i, node) in draft.nodes.iter().enumerate() {
        if node.name.is_empty() {
            problems.push(Problem::new(format!("nodes[{i}].name"), "must not be empty"));
        } else if !node_names.insert(node.name.as_str()) {
            problems.push(Problem::new(
                format!("nodes[{i}].name"),
                format!("duplicate node name \"{}\"", node.name),
            ));
        }
        if !agents.contains(node.agent.as_str()) {
            problems.push(Problem::new(
                format!("nodes[{i}].agent"),
                format!(
                    "node \"{}\" references undeclared agent \"{}\"",
                    node.name, node.agent
                ),
            ));
        }
    }

    let mut graph = StableGraph::<(), ()>::new();
    let mut indices: HashMap<&str, NodeIndex> = HashMap::with_capacity(draft.nodes.len());
    for node in &draft.nodes {
        indices.entry(node.name.as_str()).or_insert_with(|| graph.add_node(()));
    }

    for (i, edge) in draft.edges.iter().enumerate() {
        let source = indices.get(edge.source.as_str()).copied();
        if source.is_none() {
            problems.push(Problem::new(
                format!("edges[{i}].source"),
                format!("edge references undeclared node \"{}\"", edge.source),
            ));
        }
        if edge.is_terminal_edge() {
            continue;
        }
        match indices.get(edge.target.as_str()) {
            Some(&target) => {
                if let Some(source) = source {
                    graph.add_edge(source, target, ());
                }
            }
            None => problems.push(Problem::new(
                format!("edges[{i}].target"),
                format!("edge references undeclared node \"{}\"", edge.target),
            )),
        }
    }

    if has_cycle(&graph) {
        problems.push(Problem::new("edges", "graph edges form a cycle"));
    }

    // Entry set: explicit markers win, otherwise nodes without incoming edges.
    let mut entries: Vec<NodeIndex> = draft
        .nodes
        .iter()
        .filter(|n| n.is_entry_point)
        .filter_map(|n| indices.get(n.name.as_str()).copied())
        .collect();
    if entries.is_empty() {
        entries = graph
            .node_indices()
            .filter(|&idx| {
                graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .collect();
    }
    if entries.is_empty() {
        problems.push(Problem::new(
            "nodes",
            "no entry point: mark a node with isEntryPoint or leave one without incoming edges",
        ));
        return;
    }

    let mut reachable = HashSet::new();
    for &entry in &entries {
        let mut dfs = Dfs::new(&graph, entry);
        while let Some(idx) = dfs.next(&graph) {
            reachable.insert(idx);
        }
    }
    for node in &draft.nodes {
        if let Some(idx) = indices.get(node.name.as_str())
            && !reachable.contains(idx)
        {
            problems.push(Problem::new(
                "nodes",
                format!("node \"{}\" is not reachable from any entry point", node.name),
            ));
        }
    }

    let has_terminal = draft.nodes.iter().any(|node| {
        let Some(&idx) = indices.get(node.name.as_str()) else {
            return false;
        };
        if !reachable.contains(&idx) {
            return false;
        }
        node.is_terminal
            || draft
                .edges
                .iter()
                .any(|e| e.source == node.name && e.is_terminal_edge())
            || graph
                .neighbors_directed(idx, Direction::Outgoing)
                .next()
                .is_none()
    });
    if !has_terminal {
        problems.push(Problem::new(
            "edges",
            "no terminal reachable from an entry point: mark a node with isTerminal or add an edge to END",
        ));
    }
}

// DFS cycle detection; indices are contiguous because nothing is removed.
fn has_cycle(graph: &StableGraph<(), ()>) -> bool {
    let mut visited = vec![false; graph.node_count()];
    let mut rec_stack = vec![false; graph.node_count()];

    for node in graph.node_indices() {
        if !visited[node.index()] && is_cyclic_util(graph, node, &mut visited, &mut rec_stack) {
            return true;
        }
    }
    false
}

fn is_cyclic_util(
    graph: &StableGraph<(), ()>,
    node: NodeIndex,
    visited: &mut [bool],
    rec_stack: &mut [bool],
) -> bool {
    visited[node.index()] = true;
    rec_stack[node.index()] = true;

    for neighbor in graph.neighbors_directed(node, Direction::Outgoing) {
        if !visited[neighbor.index()] {
            if is_cyclic_util(graph, neighbor, visited, rec_stack) {
                return true;
            }
        } else if rec_stack[neighbor.index()] {
            return true;
        }
    }

    rec_stack[node.index()] = false;
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkflowDraft;

    fn draft(json: &str) -> WorkflowDraft {
        serde_json::from_str(json).unwrap()
    }

    const VALID_CREW: &str = r#"{
        "agents": [
            {"name": "researcher", "role": "Research Specialist", "goal": "find papers", "tools": ["search_tool"]},
            {"name": "writer", "role": "Content Writer", "goal": "summarize"}
        ],
        "tools": [{"name": "search_tool", "description": "web search"}],
        "tasks": [
            {"name": "research", "description": "find papers", "expectedOutput": "paper list", "assignedAgent": "researcher"},
            {"name": "summarize", "description": "summarize them", "expectedOutput": "summary", "assignedAgent": "writer", "dependsOn": ["research"]}
        ]
    }"#;

    #[test]
    fn valid_crew_draft_passes() {
        validate(&draft(VALID_CREW), Framework::CrewAi).unwrap();
    }

    #[test]
    fn dangling_agent_reference_names_task_and_reference() {
        let d = draft(
            r#"{
                "agents": [{"name": "researcher", "role": "R", "goal": "g"}],
                "tasks": [{"name": "summarize", "description": "d", "expectedOutput": "o", "assignedAgent": "ghost"}]
            }"#,
        );
        let report = validate(&d, Framework::CrewAi).unwrap_err();
        let problem = report
            .problems
            .iter()
            .find(|p| p.field.contains("assignedAgent"))
            .unwrap();
        assert!(problem.message.contains("summarize"));
        assert!(problem.message.contains("ghost"));
    }

    #[test]
    fn dependency_cycle_is_rejected() {
        let d = draft(
            r#"{
                "agents": [{"name": "a", "role": "r", "goal": "g"}],
                "tasks": [
                    {"name": "t1", "description": "d", "expectedOutput": "o", "assignedAgent": "a", "dependsOn": ["t2"]},
                    {"name": "t2", "description": "d", "expectedOutput": "o", "assignedAgent": "a", "dependsOn": ["t1"]}
                ]
            }"#,
        );
        let report = validate(&d, Framework::CrewAi).unwrap_err();
        assert!(report.problems.iter().any(|p| p.message.contains("cycle")));
    }

    #[test]
    fn violations_are_collected_not_short_circuited() {
        let d = draft(
            r#"{
                "agents": [
                    {"name": "a", "role": "r", "goal": "g", "tools": ["missing_tool"]},
                    {"name": "a", "role": "r", "goal": "g"}
                ],
                "tasks": [{"name": "t", "description": "", "expectedOutput": "o", "assignedAgent": "nobody"}]
            }"#,
        );
        let report = validate(&d, Framework::CrewAi).unwrap_err();
        assert!(report.problems.len() >= 3);
        assert!(report.problems.iter().any(|p| p.message.contains("duplicate")));
        assert!(report.problems.iter().any(|p| p.message.contains("missing_tool")));
        assert!(report.problems.iter().any(|p| p.message.contains("nobody")));
    }

    const VALID_GRAPH: &str = r#"{
        "agents": [
            {"name": "researcher", "role": "R", "goal": "g"},
            {"name": "summarizer", "role": "S", "goal": "g"}
        ],
        "nodes": [
            {"name": "research", "agent": "researcher", "isEntryPoint": true},
            {"name": "summarize", "agent": "summarizer"}
        ],
        "edges": [
            {"source": "research", "target": "summarize"},
            {"source": "summarize", "target": "END"}
        ]
    }"#;

    #[test]
    fn valid_graph_draft_passes() {
        validate(&draft(VALID_GRAPH), Framework::LangGraph).unwrap();
    }

    #[test]
    fn edge_to_undeclared_node_is_rejected() {
        let d = draft(
            r#"{
                "agents": [{"name": "a", "role": "r", "goal": "g"}],
                "nodes": [{"name": "n1", "agent": "a", "isEntryPoint": true}],
                "edges": [{"source": "n1", "target": "nowhere"}]
            }"#,
        );
        let report = validate(&d, Framework::LangGraph).unwrap_err();
        assert!(report.problems.iter().any(|p| p.message.contains("nowhere")));
    }

    #[test]
    fn unreachable_node_is_rejected() {
        let d = draft(
            r#"{
                "agents": [{"name": "a", "role": "r", "goal": "g"}],
                "nodes": [
                    {"name": "n1", "agent": "a", "isEntryPoint": true},
                    {"name": "island", "agent": "a"}
                ],
                "edges": [{"source": "n1", "target": "END"}]
            }"#,
        );
        let report = validate(&d, Framework::LangGraph).unwrap_err();
        assert!(report.problems.iter().any(|p| p.message.contains("island")));
    }

    #[test]
    fn graph_cycle_is_rejected() {
        let d = draft(
            r#"{
                "agents": [{"name": "a", "role": "r", "goal": "g"}],
                "nodes": [
                    {"name": "n1", "agent": "a", "isEntryPoint": true},
                    {"name": "n2", "agent": "a"}
                ],
                "edges": [
                    {"source": "n1", "target": "n2"},
                    {"source": "n2", "target": "n1"}
                ]
            }"#,
        );
        let report = validate(&d, Framework::LangGraph).unwrap_err();
        assert!(report.problems.iter().any(|p| p.message.contains("cycle")));
    }

    #[test]
    fn react_requires_an_agent() {
        let d = draft(r#"{"tools": [{"name": "t", "description": "d"}]}"#);
        let report = validate(&d, Framework::React).unwrap_err();
        assert!(report.problems.iter().any(|p| p.field == "agents"));
    }
}
