use crate::config::{ProcessType, WorkflowConfig};

use super::{py_bool, py_str, py_str_list, sanitize_ident};

/// Emit a CrewAI Flow program: the same agent/task material as the CrewAI
/// renderer plus an event-driven flow class chaining the tasks in order,
/// with condition guards for tasks that carry condition text.
pub fn render(config: &WorkflowConfig) -> String {
    let hierarchical = config.process_type == ProcessType::Hierarchical;
    let manager = config
        .manager_agent()
        .map(|a| a.name.clone())
        .unwrap_or_default();

    let mut code = String::new();
    code.push_str("from crewai import Agent, Task, Crew\n");
    code.push_str("from crewai.flow.flow import Flow, listen, start\n");
    code.push_str("from typing import Dict, List, Any\n");
    code.push_str("from pydantic import BaseModel, Field\n\n");

    code.push_str("# Define flow state\n");
    code.push_str("class AgentState(BaseModel):\n");
    code.push_str("    query: str = Field(default=\"\")\n");
    code.push_str("    results: Dict[str, Any] = Field(default_factory=dict)\n");
    code.push_str("    current_step: str = Field(default=\"\")\n\n");

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
        code.push_str(&format!("    tools={}\n", py_str_list(&agent.tools)));
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
    code.push_str("    verbose=True\n");
    code.push_str(")\n\n");

    // Guard helpers for conditional steps.
    for task in &config.tasks {
        if let Some(condition) = &task.condition {
            let ident = sanitize_ident(&task.name);
            code.push_str(&format!("def should_run_{ident}(state: AgentState) -> bool:\n"));
            code.push_str(&format!("    # {condition}\n"));
            code.push_str("    return True\n\n");
        }
    }

    code.push_str("# Define CrewAI Flow\n");
    code.push_str("class WorkflowFlow(Flow[AgentState]):\n");
    code.push_str("    @start()\n");
    code.push_str("    def initial_input(self):\n");
    code.push_str("        \"\"\"Process the initial user query.\"\"\"\n");
    code.push_str("        print(\"Starting workflow...\")\n");
    let first_step = config
        .tasks
        .first()
        .map(|t| t.name.clone())
        .unwrap_or_else(|| "completed".to_owned());
    code.push_str(&format!(
        "        self.state.current_step = {}\n",
        py_str(&first_step)
    ));
    code.push_str("        return self.state\n\n");

    let mut previous_step = "initial_input".to_owned();
    for (i, task) in config.tasks.iter().enumerate() {
        let ident = sanitize_ident(&task.name);
        let task_var = format!("task_{ident}");

        code.push_str(&format!("    @listen('{previous_step}')\n"));
        code.push_str(&format!("    def execute_{ident}(self, state):\n"));
        code.push_str(&format!(
            "        \"\"\"Execute the {} task.\"\"\"\n",
            task.name
        ));
        if task.condition.is_some() {
            code.push_str(&format!("        if not should_run_{ident}(self.state):\n"));
            code.push_str("            return self.state\n");
        }
        code.push_str(&format!(
            "        print(\"Executing task: {}\")\n",
            task.name
        ));
        code.push_str("        result = crew.kickoff(\n");
        code.push_str(&format!("            tasks=[{task_var}],\n"));
        code.push_str("            inputs={\n");
        code.push_str("                \"query\": self.state.query,\n");
        code.push_str("                \"previous_results\": self.state.results\n");
        code.push_str("            }\n");
        code.push_str("        )\n");
        code.push_str(&format!(
            "        self.state.results[{}] = result\n",
            py_str(&task.name)
        ));
        let next_step = match config.tasks.get(i + 1) {
            Some(next) => next.name.clone(),
            None => "completed".to_owned(),
        };
        code.push_str(&format!(
            "        self.state.current_step = {}\n",
            py_str(&next_step)
        ));
        code.push_str("        return self.state\n\n");
        previous_step = format!("execute_{ident}");
    }

    code.push_str(&format!("    @listen('{previous_step}')\n"));
    code.push_str("    def aggregate_results(self, state):\n");
    code.push_str("        \"\"\"Combine all results from tasks.\"\"\"\n");
    code.push_str("        print(\"Workflow completed, aggregating results...\")\n");
    code.push_str("        combined_result = \"\"\n");
    code.push_str("        for task_name, result in state.results.items():\n");
    code.push_str(
        "            combined_result += f\"\\n\\n=== {task_name} ===\\n{result}\"\n",
    );
    code.push_str("        return combined_result\n\n");

    code.push_str("# Run the flow\n");
    code.push_str("def run_workflow(query: str):\n");
    code.push_str("    flow = WorkflowFlow()\n");
    code.push_str("    flow.state.query = query\n");
    code.push_str("    result = flow.kickoff()\n");
    code.push_str("    return result\n\n");

    code.push_str("# Generate a visualization of the flow\n");
    code.push_str("def visualize_flow():\n");
    code.push_str("    flow = WorkflowFlow()\n");
    code.push_str("    flow.plot(\"workflow_flow\")\n");
    code.push_str("    print(\"Flow visualization saved to workflow_flow.html\")\n\n");

    code.push_str("# Example usage\n");
    code.push_str("if __name__ == \"__main__\":\n");
    code.push_str("    result = run_workflow(\"Your query here\")\n");
    code.push_str("    print(result)\n");
    code
}
