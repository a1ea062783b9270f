use crate::config::{ProcessType, WorkflowConfig};

use super::{py_bool, py_str, py_str_list, sanitize_ident};

/// Emit a CrewAI program: agent declarations, tasks bound to agents, and a
/// crew assembly in the configured process mode.
pub fn render(config: &WorkflowConfig) -> String {
    let hierarchical = config.process_type == ProcessType::Hierarchical;
    let manager = config
        .manager_agent()
        .map(|a| a.name.clone())
        .unwrap_or_default();

    let mut code = String::new();
    code.push_str("from crewai import Agent, Task, Crew, Process\n");
    code.push_str("from typing import Dict, List, Any\n\n");

    for agent in &config.agents {
        let var = format!("agent_{}", sanitize_ident(&agent.name));
        let is_manager = hierarchical && agent.name == manager;

        code.push_str(&format!("# Agent: {}\n", agent.name));
        code.push_str(&format!("{var} = Agent(\n"));
        code.push_str(&format!("    role={},\n", py_str(&agent.role)));
        code.push_str(&format!("    goal={},\n", py_str(&agent.goal)));
        code.push_str(&format!(
            "    backstory={},\n",
            py_str(agent.backstory.as_deref().unwrap_or_default())
        ));
        code.push_str("    verbose=True,\n");
        code.push_str(&format!("    allow_delegation={},\n", py_bool(is_manager)));
        code.push_str(&format!("    tools={}", py_str_list(&agent.tools)));
        if is_manager {
            // The coordinating agent gets bounded iteration and wall-clock.
            code.push_str(",\n    max_iter=5,\n    max_execution_time=300\n");
        } else {
            code.push('\n');
        }
        code.push_str(")\n\n");
    }

    for task in &config.tasks {
        let var = format!("task_{}", sanitize_ident(&task.name));
        let agent_var = format!("agent_{}", sanitize_ident(&task.assigned_agent));

        code.push_str(&format!("# Task: {}\n", task.name));
        code.push_str(&format!("{var} = Task(\n"));
        code.push_str(&format!("    description={},\n", py_str(&task.description)));
        code.push_str(&format!("    agent={agent_var},\n"));
        code.push_str(&format!(
            "    expected_output={}\n",
            py_str(&task.expected_output)
        ));
        code.push_str(")\n\n");
    }

    let agent_vars: Vec<String> = config
        .agents
        .iter()
        .map(|a| format!("agent_{}", sanitize_ident(&a.name)))
        .collect();
    let task_vars: Vec<String> = config
        .tasks
        .iter()
        .map(|t| format!("task_{}", sanitize_ident(&t.name)))
        .collect();

    code.push_str("# Crew Configuration\n");
    code.push_str("crew = Crew(\n");
    code.push_str(&format!("    agents=[{}],\n", agent_vars.join(", ")));
    code.push_str(&format!("    tasks=[{}],\n", task_vars.join(", ")));
    if hierarchical {
        code.push_str("    process=Process.hierarchical,\n");
        code.push_str(&format!(
            "    manager_agent=agent_{},\n",
            sanitize_ident(&manager)
        ));
    } else {
        code.push_str("    process=Process.sequential,\n");
    }
    code.push_str("    verbose=True\n");
    code.push_str(")\n\n");

    code.push_str("# Run the workflow\n");
    code.push_str("def run_workflow(query: str):\n");
    code.push_str("    \"\"\"Run the workflow using CrewAI.\"\"\"\n");
    code.push_str("    result = crew.kickoff(\n");
    code.push_str("        inputs={\n");
    code.push_str("            \"query\": query\n");
    code.push_str("        }\n");
    code.push_str("    )\n");
    code.push_str("    return result\n\n");

    code.push_str("# Example usage\n");
    code.push_str("if __name__ == \"__main__\":\n");
    code.push_str("    result = run_workflow(\"Your query here\")\n");
    code.push_str("    print(result)\n");
    code
}
