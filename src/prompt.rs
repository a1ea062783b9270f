use crate::config::{Framework, ProcessType};

/// Build the instruction prompt for one generation request.
///
/// Pure string assembly: the target framework picks the output schema and the
/// structural exemplar, `process_hint` pins the topology when the caller chose
/// one, and `correction` carries the failure detail from a rejected previous
/// reply when the orchestrator re-prompts.
pub fn build(
    description: &str,
    framework: Framework,
    process_hint: Option<ProcessType>,
    correction: Option<&str>,
) -> String {
    let mut prompt = format!(
        "You are an expert at designing multi-agent AI workflows with the {framework} framework.\n\
        Based on the user's request, propose {shape}.\n\n\
        You must respond with **RAW JSON (no markdown fences, no prose)**: exactly one JSON object\n\
        with this structure:\n\n{exemplar}\n\n{rules}",
        framework = framework_label(framework),
        shape = shape_of(framework),
        exemplar = exemplar_for(framework),
        rules = rules_for(framework),
    );

    match process_hint {
        Some(process) => {
            prompt.push_str(&format!(
                "\nSet \"process\" to \"{process}\"; the caller has fixed the execution topology.\n"
            ));
        }
        None => {
            prompt.push_str(
                "\nAlso set \"process\" to \"sequential\" or \"hierarchical\" — whichever suits the \
                request best — and put a one-line justification in \"processRationale\".\n\
                Sequential means tasks run one after another; hierarchical means a manager agent \
                coordinates and delegates to specialized agents.\n",
            );
        }
    }

    if let Some(detail) = correction {
        prompt.push_str(&format!(
            "\nYour previous reply was rejected:\n{detail}\n\
            Fix every problem listed and resend the complete JSON object.\n"
        ));
    }

    prompt.push_str(&format!("\nUser request:\n{description}\n"));
    prompt
}

fn framework_label(framework: Framework) -> &'static str {
    match framework {
        Framework::CrewAi => "CrewAI",
        Framework::CrewAiFlow => "CrewAI Flow",
        Framework::LangGraph => "LangChain LangGraph",
        Framework::React => "ReAct (Reasoning + Acting)",
        Framework::ReactLcel => "ReAct (Reasoning + Acting, LCEL style)",
    }
}

fn shape_of(framework: Framework) -> &'static str {
    if framework.is_graph_based() {
        "appropriate agents, tools, and the graph nodes and edges connecting them"
    } else if framework.is_task_based() {
        "appropriate agents, their roles, tools, and tasks"
    } else {
        "an appropriate agent and the tools it needs"
    }
}

fn exemplar_for(framework: Framework) -> &'static str {
    match framework {
        Framework::CrewAi | Framework::CrewAiFlow => TASK_EXEMPLAR,
        Framework::LangGraph => GRAPH_EXEMPLAR,
        Framework::React | Framework::ReactLcel => REACT_EXEMPLAR,
    }
}

fn rules_for(framework: Framework) -> &'static str {
    match framework {
        Framework::CrewAi | Framework::CrewAiFlow => TASK_RULES,
        Framework::LangGraph => GRAPH_RULES,
        Framework::React | Framework::ReactLcel => REACT_RULES,
    }
}

const TASK_EXEMPLAR: &str = r#"{
    "process": "sequential",
    "processRationale": "flat two-step pipeline with no delegation",
    "agents": [
        {
            "name": "research_specialist",
            "role": "Research Specialist",
            "goal": "Gather and organize relevant information",
            "backstory": "Seasoned researcher with years of literature review experience",
            "tools": ["search_tool"],
            "isManager": false
        },
        {
            "name": "content_writer",
            "role": "Content Writer",
            "goal": "Turn findings into clear written content",
            "backstory": "Professional writer focused on technical material",
            "tools": ["writing_tool"],
            "isManager": false
        }
    ],
    "tools": [
        {"name": "search_tool", "description": "Searches the web for relevant sources"},
        {"name": "writing_tool", "description": "Drafts and edits long-form text"}
    ],
    "tasks": [
        {
            "name": "research_task",
            "description": "Collect background material on the requested topic",
            "expectedOutput": "A structured set of findings with sources",
            "assignedAgent": "research_specialist",
            "dependsOn": []
        },
        {
            "name": "writing_task",
            "description": "Write the final report from the research findings",
            "expectedOutput": "A polished report document",
            "assignedAgent": "content_writer",
            "dependsOn": ["research_task"]
        }
    ]
}"#;

const TASK_RULES: &str = "\
Rules:
- Create specialized agents with distinct roles and expertise.
- Every task's \"assignedAgent\" must exactly match the \"name\" of one declared agent; \
match agent specialization to task requirements (research tasks to researchers, writing \
tasks to writers, review tasks to reviewers, coordination tasks to managers).
- Declare every tool an agent references in the top-level \"tools\" array.
- \"dependsOn\" lists the names of tasks that must complete first and must not form a cycle.
- For a hierarchical process, mark exactly one agent with \"isManager\": true.
";

const GRAPH_EXEMPLAR: &str = r#"{
    "process": "sequential",
    "processRationale": "linear research graph",
    "agents": [
        {
            "name": "researcher",
            "role": "Research Agent",
            "goal": "Answer questions with sourced facts",
            "tools": ["search_tool"],
            "llmHint": "gpt-4.1-mini"
        },
        {
            "name": "summarizer",
            "role": "Summarization Agent",
            "goal": "Condense findings into a short answer",
            "tools": [],
            "llmHint": "gpt-4.1-mini"
        }
    ],
    "tools": [
        {"name": "search_tool", "description": "Searches the web for relevant sources"}
    ],
    "nodes": [
        {"name": "research", "description": "Gather facts", "agent": "researcher", "isEntryPoint": true},
        {"name": "summarize", "description": "Condense the findings", "agent": "summarizer", "isTerminal": true}
    ],
    "edges": [
        {"source": "research", "target": "summarize"},
        {"source": "summarize", "target": "END"}
    ]
}"#;

const GRAPH_RULES: &str = "\
Rules:
- Every node's \"agent\" must exactly match the \"name\" of one declared agent.
- Every edge endpoint must name a declared node; use the literal target \"END\" to finish.
- Mark the starting node with \"isEntryPoint\": true; every node must be reachable from it.
- Edges must not form a cycle. Put branching logic in an edge's optional \"condition\" text.
- Declare every tool an agent references in the top-level \"tools\" array.
";

const REACT_EXEMPLAR: &str = r#"{
    "agents": [
        {
            "name": "assistant",
            "role": "General Assistant",
            "goal": "Help the user by reasoning step by step and using tools",
            "tools": ["search_tool", "calculator"],
            "llmHint": "gpt-4.1-mini"
        }
    ],
    "tools": [
        {
            "name": "search_tool",
            "description": "Searches the web for relevant sources",
            "parameters": {"query": "What to search for"}
        },
        {
            "name": "calculator",
            "description": "Evaluates arithmetic expressions",
            "parameters": {"expression": "The expression to evaluate"}
        }
    ]
}"#;

const REACT_RULES: &str = "\
Rules:
- Declare one primary agent; the generated executor binds the first agent in the array.
- Declare every tool the agent references in the top-level \"tools\" array, with a
  \"parameters\" object mapping each parameter name to a short description.
";
