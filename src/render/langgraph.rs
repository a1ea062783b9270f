use std::collections::BTreeSet;

use crate::config::{EdgeSpec, WorkflowConfig};

use super::{pascal_ident, py_str, sanitize_ident};

/// Emit a LangGraph program: tool classes, one node function per agent, and
/// the graph wiring in edge declaration order. Conditional edges render as a
/// branching router function keyed on the edge's condition text.
pub fn render(config: &WorkflowConfig) -> String {
    let mut code = String::new();
    code.push_str("from langgraph.graph import StateGraph, END\n");
    code.push_str("from langchain_core.messages import BaseMessage, HumanMessage, AIMessage\n");
    code.push_str("from langchain_openai import ChatOpenAI\n");
    code.push_str("from langchain_core.tools import BaseTool\n");
    code.push_str("from typing import Dict, List, Any, TypedDict\n\n");

    code.push_str("# Define state\n");
    code.push_str("class AgentState(TypedDict):\n");
    code.push_str("    messages: List[BaseMessage]\n");
    code.push_str("    next: str\n\n");

    let tool_names: BTreeSet<&str> = config
        .agents
        .iter()
        .flat_map(|a| a.tools.iter().map(String::as_str))
        .collect();
    if !tool_names.is_empty() {
        code.push_str("# Define tools\n");
        for name in &tool_names {
            let class = format!("{}Tool", pascal_ident(name));
            let description = config
                .tool(name)
                .map(|t| t.description.clone())
                .unwrap_or_else(|| format!("Tool for {name} operations"));

            code.push_str(&format!("class {class}(BaseTool):\n"));
            code.push_str(&format!("    name = {}\n", py_str(name)));
            code.push_str(&format!("    description = {}\n\n", py_str(&description)));
            code.push_str("    def _run(self, query: str) -> str:\n");
            code.push_str("        # Implement actual functionality here\n");
            code.push_str(&format!(
                "        return f\"Result from {name}: {{query}}\"\n\n"
            ));
            code.push_str("    async def _arun(self, query: str) -> str:\n");
            code.push_str("        return self._run(query)\n\n");
        }
        code.push_str("tools = [\n");
        for name in &tool_names {
            code.push_str(&format!("    {}Tool(),\n", pascal_ident(name)));
        }
        code.push_str("]\n\n");
    }

    for agent in &config.agents {
        let ident = sanitize_ident(&agent.name);
        let model = agent.llm_hint.as_deref().unwrap_or("gpt-4.1-mini");

        code.push_str(&format!("# Agent: {}\n", agent.name));
        code.push_str(&format!("def {ident}_agent(state: AgentState) -> AgentState:\n"));
        code.push_str(&format!(
            "    \"\"\"Agent that handles {}.\"\"\"\n",
            agent.role
        ));
        code.push_str(&format!("    llm = ChatOpenAI(model={})\n", py_str(model)));
        code.push_str("    messages = state[\"messages\"]\n");
        code.push_str("    response = llm.invoke(messages)\n");
        code.push_str("    return {\n");
        code.push_str("        \"messages\": messages + [response],\n");
        code.push_str("        \"next\": state.get(\"next\", \"\")\n");
        code.push_str("    }\n\n");
    }

    // Outgoing edges per source, in declaration order.
    let mut sources: Vec<&str> = Vec::new();
    for edge in &config.edges {
        if !sources.contains(&edge.source.as_str()) {
            sources.push(edge.source.as_str());
        }
    }
    let grouped: Vec<(&str, Vec<&EdgeSpec>)> = sources
        .iter()
        .map(|&source| {
            let edges = config.edges.iter().filter(|e| e.source == source).collect();
            (source, edges)
        })
        .collect();

    for &(source, ref edges) in &grouped {
        if !edges.iter().any(|e| e.condition.is_some()) {
            continue;
        }
        let ident = sanitize_ident(source);
        let fallback = edges
            .iter()
            .find(|e| e.condition.is_none())
            .or_else(|| edges.first())
            .map(|e| e.target.as_str())
            .unwrap_or("END");

        code.push_str(&format!("def route_{ident}(state: AgentState) -> str:\n"));
        code.push_str(&format!(
            "    \"\"\"Pick the next node after {source}.\"\"\"\n"
        ));
        for edge in edges.iter() {
            match &edge.condition {
                Some(condition) => {
                    code.push_str(&format!("    # {condition} -> {}\n", edge.target));
                }
                None => code.push_str(&format!("    # otherwise -> {}\n", edge.target)),
            }
        }
        code.push_str(&format!(
            "    return state.get(\"next\", {})\n\n",
            py_str(fallback)
        ));
    }

    code.push_str("# Define the graph\n");
    code.push_str("workflow = StateGraph(AgentState)\n\n");

    code.push_str("# Add nodes to the graph\n");
    for node in &config.nodes {
        code.push_str(&format!(
            "workflow.add_node({}, {}_agent)\n",
            py_str(&node.name),
            sanitize_ident(&node.agent)
        ));
    }
    code.push('\n');

    code.push_str("# Wire the edges\n");
    for &(source, ref edges) in &grouped {
        if edges.iter().any(|e| e.condition.is_some()) {
            let ident = sanitize_ident(source);
            let mapping: Vec<String> = edges
                .iter()
                .map(|e| {
                    if e.is_terminal_edge() {
                        "\"END\": END".to_owned()
                    } else {
                        format!("{}: {}", py_str(&e.target), py_str(&e.target))
                    }
                })
                .collect();
            code.push_str(&format!(
                "workflow.add_conditional_edges({}, route_{ident}, {{{}}})\n",
                py_str(source),
                mapping.join(", ")
            ));
        } else {
            for edge in edges {
                if edge.is_terminal_edge() {
                    code.push_str(&format!("workflow.add_edge({}, END)\n", py_str(source)));
                } else {
                    code.push_str(&format!(
                        "workflow.add_edge({}, {})\n",
                        py_str(source),
                        py_str(&edge.target)
                    ));
                }
            }
        }
    }
    for node in &config.nodes {
        let already_terminal = config
            .edges
            .iter()
            .any(|e| e.source == node.name && e.is_terminal_edge());
        if node.is_terminal && !already_terminal {
            code.push_str(&format!(
                "workflow.add_edge({}, END)\n",
                py_str(&node.name)
            ));
        }
    }

    let entry = config
        .nodes
        .iter()
        .find(|n| n.is_entry_point)
        .or_else(|| config.nodes.first())
        .map(|n| n.name.as_str())
        .unwrap_or_default();
    code.push_str("\n# Set entry point\n");
    code.push_str(&format!("workflow.set_entry_point({})\n\n", py_str(entry)));

    code.push_str("# Compile the graph\n");
    code.push_str("app = workflow.compile()\n\n");

    code.push_str("# Run the graph\n");
    code.push_str("def run_agent(query: str) -> List[BaseMessage]:\n");
    code.push_str("    \"\"\"Run the agent on a query.\"\"\"\n");
    code.push_str("    result = app.invoke({\n");
    code.push_str("        \"messages\": [HumanMessage(content=query)],\n");
    code.push_str("        \"next\": \"\"\n");
    code.push_str("    })\n");
    code.push_str("    return result[\"messages\"]\n\n");

    code.push_str("# Example usage\n");
    code.push_str("if __name__ == \"__main__\":\n");
    code.push_str("    result = run_agent(\"Your query here\")\n");
    code.push_str("    for message in result:\n");
    code.push_str("        print(f\"{message.type}: {message.content}\")\n");
    code
}
