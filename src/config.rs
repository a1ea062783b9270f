use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Edge target accepted as the terminal sentinel in graph configurations.
pub const END_NODE: &str = "END";

#[derive(Debug, Error)]
#[error("unsupported framework: {0}")]
pub struct UnsupportedFrameworkError(pub String);

/// The code generation target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Framework {
    #[serde(rename = "crewai")]
    CrewAi,
    #[serde(rename = "crewai-flow")]
    CrewAiFlow,
    #[serde(rename = "langgraph")]
    LangGraph,
    #[serde(rename = "react")]
    React,
    #[serde(rename = "react-lcel")]
    ReactLcel,
}

impl Framework {
    /// Frameworks that describe work as tasks assigned to agents.
    pub fn is_task_based(self) -> bool {
        matches!(self, Self::CrewAi | Self::CrewAiFlow)
    }

    /// Frameworks that describe work as a node/edge graph.
    pub fn is_graph_based(self) -> bool {
        matches!(self, Self::LangGraph)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CrewAi => "crewai",
            Self::CrewAiFlow => "crewai-flow",
            Self::LangGraph => "langgraph",
            Self::React => "react",
            Self::ReactLcel => "react-lcel",
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Framework {
    type Err = UnsupportedFrameworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "crewai" => Ok(Self::CrewAi),
            "crewai-flow" => Ok(Self::CrewAiFlow),
            "langgraph" => Ok(Self::LangGraph),
            "react" => Ok(Self::React),
            "react-lcel" => Ok(Self::ReactLcel),
            other => Err(UnsupportedFrameworkError(other.to_owned())),
        }
    }
}

/// Execution topology of the agent team.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessType {
    #[default]
    Sequential,
    Hierarchical,
}

impl fmt::Display for ProcessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => f.write_str("sequential"),
            Self::Hierarchical => f.write_str("hierarchical"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AgentSpec {
    pub name: String,
    pub role: String,
    pub goal: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backstory: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<String>,
    #[serde(alias = "llm", skip_serializing_if = "Option::is_none")]
    pub llm_hint: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub is_manager: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TaskSpec {
    pub name: String,
    pub description: String,
    #[serde(alias = "expected_output")]
    pub expected_output: String,
    #[serde(alias = "agent")]
    pub assigned_agent: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeSpec {
    pub name: String,
    pub description: String,
    pub agent: String,
    #[serde(skip_serializing_if = "is_false")]
    pub is_entry_point: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_terminal: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeSpec {
    #[serde(alias = "from")]
    pub source: String,
    #[serde(alias = "to")]
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl EdgeSpec {
    /// Whether this edge terminates the graph rather than pointing at a node.
    pub fn is_terminal_edge(&self) -> bool {
        self.target == END_NODE
    }
}

/// The decoded model reply, before process resolution.
///
/// Field names follow the configuration model; a handful of aliases tolerate
/// the vocabulary upstream models habitually emit (`agent`, `llm`, `from`/`to`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkflowDraft {
    #[serde(deserialize_with = "lenient_process")]
    pub process: Option<ProcessType>,
    pub process_rationale: Option<String>,
    pub agents: Vec<AgentSpec>,
    pub tools: Vec<ToolSpec>,
    pub tasks: Vec<TaskSpec>,
    pub nodes: Vec<NodeSpec>,
    pub edges: Vec<EdgeSpec>,
}

impl WorkflowDraft {
    /// Freeze the draft into the immutable configuration consumed by a renderer.
    ///
    /// The draft must have passed [`crate::validate::validate`] for the same
    /// framework; renderers rely on that and never re-validate.
    pub fn into_config(self, framework: Framework, process: ProcessType) -> WorkflowConfig {
        WorkflowConfig {
            target_framework: framework,
            process_type: process,
            agents: self.agents,
            tools: self.tools,
            tasks: self.tasks,
            nodes: self.nodes,
            edges: self.edges,
        }
    }
}

// An unrecognized recommendation is ignored rather than failing the decode;
// the selector then falls through to its heuristic.
fn lenient_process<'de, D>(deserializer: D) -> Result<Option<ProcessType>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| match s.trim().to_ascii_lowercase().as_str() {
        "sequential" => Some(ProcessType::Sequential),
        "hierarchical" => Some(ProcessType::Hierarchical),
        _ => None,
    }))
}

/// The validated, framework-neutral description of a workflow.
///
/// Constructed once per generation request from a validated draft; immutable
/// thereafter and consumed by exactly one renderer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowConfig {
    pub target_framework: Framework,
    pub process_type: ProcessType,
    pub agents: Vec<AgentSpec>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolSpec>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<TaskSpec>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<NodeSpec>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub edges: Vec<EdgeSpec>,
}

impl WorkflowConfig {
    /// The coordinating agent for hierarchical configurations: the explicitly
    /// marked manager, or the first agent by inference.
    pub fn manager_agent(&self) -> Option<&AgentSpec> {
        self.agents
            .iter()
            .find(|a| a.is_manager)
            .or_else(|| self.agents.first())
    }

    pub fn tool(&self, name: &str) -> Option<&ToolSpec> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}
