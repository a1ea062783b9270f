use crate::config::{Framework, WorkflowConfig};

pub mod crewai;
pub mod crewai_flow;
pub mod langgraph;
pub mod react;
pub mod react_lcel;

/// Render a validated configuration to framework source text.
///
/// Fixed dispatch on the framework tag; every renderer is a pure, total,
/// deterministic function over configurations that passed validation. Adding
/// a framework means adding one enum variant and one renderer module.
pub fn render(config: &WorkflowConfig) -> String {
    match config.target_framework {
        Framework::CrewAi => crewai::render(config),
        Framework::CrewAiFlow => crewai_flow::render(config),
        Framework::LangGraph => langgraph::render(config),
        Framework::React => react::render(config),
        Framework::ReactLcel => react_lcel::render(config),
    }
}

// Convert a configuration name to a valid Python identifier.
pub(crate) fn sanitize_ident(name: &str) -> String {
    let mut ident = String::with_capacity(name.len());
    for ch in name.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            ident.push(ch.to_ascii_lowercase());
        } else if ch != '\'' && ch != '"' {
            ident.push('_');
        }
    }
    if ident.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if ident.is_empty() {
        ident.push('_');
    }
    ident
}

// PascalCase form used for generated Python class names.
pub(crate) fn pascal_ident(name: &str) -> String {
    sanitize_ident(name)
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

// A double-quoted Python string literal.
pub(crate) fn py_str(text: &str) -> String {
    let mut lit = String::with_capacity(text.len() + 2);
    lit.push('"');
    for ch in text.chars() {
        match ch {
            '\\' => lit.push_str("\\\\"),
            '"' => lit.push_str("\\\""),
            '\n' => lit.push_str("\\n"),
            '\r' => lit.push_str("\\r"),
            '\t' => lit.push_str("\\t"),
            _ => lit.push(ch),
        }
    }
    lit.push('"');
    lit
}

pub(crate) fn py_str_list(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| py_str(s)).collect();
    format!("[{}]", quoted.join(", "))
}

pub(crate) fn py_bool(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProcessType, WorkflowDraft};

    fn config(json: &str, framework: Framework, process: ProcessType) -> WorkflowConfig {
        let draft: WorkflowDraft = serde_json::from_str(json).unwrap();
        draft.into_config(framework, process)
    }

    const CREW: &str = r#"{
        "agents": [
            {"name": "researcher", "role": "Research Specialist", "goal": "find papers", "tools": ["search_tool"]},
            {"name": "writer", "role": "Content Writer", "goal": "summarize findings"}
        ],
        "tools": [{"name": "search_tool", "description": "web search"}],
        "tasks": [
            {"name": "research", "description": "find papers", "expectedOutput": "paper list", "assignedAgent": "researcher"},
            {"name": "summarize", "description": "summarize them", "expectedOutput": "summary", "assignedAgent": "writer", "dependsOn": ["research"]}
        ]
    }"#;

    const GRAPH: &str = r#"{
        "agents": [
            {"name": "researcher", "role": "Research Agent", "goal": "gather facts", "tools": ["search_tool"], "llmHint": "gpt-4o"},
            {"name": "summarizer", "role": "Summarization Agent", "goal": "condense findings"}
        ],
        "tools": [{"name": "search_tool", "description": "web search"}],
        "nodes": [
            {"name": "research", "agent": "researcher", "isEntryPoint": true},
            {"name": "summarize", "agent": "summarizer"}
        ],
        "edges": [
            {"source": "research", "target": "summarize", "condition": "enough facts gathered"},
            {"source": "research", "target": "END"},
            {"source": "summarize", "target": "END"}
        ]
    }"#;

    const REACT: &str = r#"{
        "agents": [
            {"name": "assistant", "role": "General Assistant", "goal": "help with research", "tools": ["search_tool"], "llmHint": "gpt-4.1-mini"}
        ],
        "tools": [
            {"name": "search_tool", "description": "Searches the web", "parameters": {"query": "what to search for"}}
        ]
    }"#;

    fn fixture(framework: Framework) -> WorkflowConfig {
        match framework {
            Framework::CrewAi | Framework::CrewAiFlow => {
                config(CREW, framework, ProcessType::Sequential)
            }
            Framework::LangGraph => config(GRAPH, framework, ProcessType::Sequential),
            Framework::React | Framework::ReactLcel => {
                config(REACT, framework, ProcessType::Sequential)
            }
        }
    }

    #[test]
    fn rendering_is_deterministic_for_every_framework() {
        for framework in [
            Framework::CrewAi,
            Framework::CrewAiFlow,
            Framework::LangGraph,
            Framework::React,
            Framework::ReactLcel,
        ] {
            let cfg = fixture(framework);
            assert_eq!(render(&cfg), render(&cfg), "{framework} render not stable");
        }
    }

    #[test]
    fn crewai_sequential_declares_agents_and_crew() {
        let code = render(&fixture(Framework::CrewAi));
        assert!(code.contains("agent_researcher = Agent("));
        assert!(code.contains("agent_writer = Agent("));
        assert!(code.contains("process=Process.sequential"));
        assert!(code.contains("crew = Crew("));
        assert!(!code.contains("manager_agent"));
    }

    #[test]
    fn crewai_hierarchical_designates_a_manager() {
        let cfg = config(CREW, Framework::CrewAi, ProcessType::Hierarchical);
        let code = render(&cfg);
        assert!(code.contains("process=Process.hierarchical"));
        // No explicit isManager marker, so the first agent is the manager.
        assert!(code.contains("manager_agent=agent_researcher"));
        assert!(code.contains("allow_delegation=True"));
    }

    #[test]
    fn crewai_flow_wires_listen_chain_in_task_order() {
        let code = render(&fixture(Framework::CrewAiFlow));
        assert!(code.contains("class WorkflowFlow(Flow[AgentState])"));
        assert!(code.contains("@listen('initial_input')"));
        assert!(code.contains("def execute_research"));
        assert!(code.contains("@listen('execute_research')"));
        assert!(code.contains("def execute_summarize"));
    }

    #[test]
    fn langgraph_renders_nodes_edges_and_entry_point() {
        let code = render(&fixture(Framework::LangGraph));
        assert!(code.contains("workflow = StateGraph(AgentState)"));
        assert!(code.contains("workflow.add_node(\"research\", researcher_agent)"));
        assert!(code.contains("workflow.set_entry_point(\"research\")"));
        assert!(code.contains("workflow.add_edge(\"summarize\", END)"));
        // The conditional edge renders as a branching router.
        assert!(code.contains("def route_research"));
        assert!(code.contains("# enough facts gathered -> summarize"));
        assert!(code.contains("workflow.add_conditional_edges(\"research\", route_research"));
        // Node llm hints flow through to the agent bindings.
        assert!(code.contains("ChatOpenAI(model=\"gpt-4o\")"));
    }

    #[test]
    fn react_renders_a_single_agent_executor() {
        let code = render(&fixture(Framework::React));
        assert!(code.contains("class SearchToolTool(BaseTool)"));
        assert!(code.contains("def _run(self, query)"));
        assert!(code.contains("create_react_agent(llm, tools, react_prompt)"));
        assert!(code.contains("AgentExecutor(agent=agent, tools=tools, verbose=True)"));
        assert!(code.contains("You are General Assistant."));
    }

    #[test]
    fn react_lcel_composes_a_chain_instead_of_a_loop() {
        let code = render(&fixture(Framework::ReactLcel));
        assert!(code.contains("StrOutputParser()"));
        assert!(code.contains("| react_prompt"));
        assert!(code.contains("RunnablePassthrough()"));
        assert!(!code.contains("AgentExecutor"));
    }

    #[test]
    fn sanitize_ident_produces_python_identifiers() {
        assert_eq!(sanitize_ident("Research Specialist"), "research_specialist");
        assert_eq!(sanitize_ident("agent-o'brien"), "agent_obrien");
        assert_eq!(sanitize_ident("3rd_stage"), "_3rd_stage");
        assert_eq!(pascal_ident("search_tool"), "SearchTool");
    }

    #[test]
    fn py_str_escapes_quotes_and_newlines() {
        assert_eq!(py_str("say \"hi\"\nnow"), r#""say \"hi\"\nnow""#);
    }
}
