use crate::config::WorkflowConfig;

use super::{pascal_ident, py_str};

/// Emit a classic ReAct program: tool classes with their parameters, a single
/// agent bound to them, and an `AgentExecutor` reasoning/acting loop.
pub fn render(config: &WorkflowConfig) -> String {
    let mut code = String::new();
    code.push_str("from langchain_core.tools import BaseTool\n");
    code.push_str("from langchain_core.prompts import ChatPromptTemplate\n");
    code.push_str("from langchain_openai import ChatOpenAI\n");
    code.push_str("from langchain.agents import create_react_agent, AgentExecutor\n");
    code.push_str("from typing import Dict, List, Any\n\n");

    push_tool_classes(&mut code, config);

    // Validation guarantees at least one agent; the executor binds the first.
    let agent = &config.agents[0];
    let model = agent.llm_hint.as_deref().unwrap_or("gpt-4.1-mini");
    let system = format!(
        "You are {}. Your goal is {}. Use tools when needed.",
        agent.role, agent.goal
    );

    code.push_str(&format!("llm = ChatOpenAI(model={})\n\n", py_str(model)));
    code.push_str("react_prompt = ChatPromptTemplate.from_messages([\n");
    code.push_str(&format!("    (\"system\", {}),\n", py_str(&system)));
    code.push_str("    (\"human\", \"{input}\")\n");
    code.push_str("])\n\n");

    code.push_str("agent = create_react_agent(llm, tools, react_prompt)\n");
    code.push_str("agent_executor = AgentExecutor(agent=agent, tools=tools, verbose=True)\n\n");

    code.push_str("def run_agent(query: str) -> str:\n");
    code.push_str("    response = agent_executor.invoke({\"input\": query})\n");
    code.push_str("    if isinstance(response, dict) and \"intermediate_steps\" in response:\n");
    code.push_str("        print(\"--- Agent Trace ---\")\n");
    code.push_str("        for step in response[\"intermediate_steps\"]:\n");
    code.push_str("            print(step)\n");
    code.push_str("        print(\"-------------------\")\n");
    code.push_str(
        "    return response.get(\"output\", \"No response generated\") if isinstance(response, dict) else str(response)\n\n",
    );

    code.push_str("if __name__ == \"__main__\":\n");
    code.push_str("    result = run_agent(\"Your query here\")\n");
    code.push_str("    print(result)\n");
    code
}

// Shared by the classic and LCEL renderers: one BaseTool subclass per
// declared tool, parameters in declaration (map) order.
pub(super) fn push_tool_classes(code: &mut String, config: &WorkflowConfig) {
    code.push_str("# Define tools\n");
    for tool in &config.tools {
        let class = format!("{}Tool", pascal_ident(&tool.name));
        let params: Vec<&str> = tool.parameters.keys().map(String::as_str).collect();
        let signature = if params.is_empty() {
            String::new()
        } else {
            format!(", {}", params.join(", "))
        };

        code.push_str(&format!("class {class}(BaseTool):\n"));
        code.push_str(&format!("    name = {}\n", py_str(&tool.name)));
        code.push_str(&format!("    description = {}\n\n", py_str(&tool.description)));
        code.push_str(&format!("    def _run(self{signature}) -> str:\n"));
        code.push_str("        try:\n");
        code.push_str("            # TODO: implement actual functionality\n");
        code.push_str(
            "            return f\"Executed {self.name} with inputs: {locals()}\"\n",
        );
        code.push_str("        except Exception as e:\n");
        code.push_str("            return f\"Error in {self.name}: {str(e)}\"\n\n");
        code.push_str(&format!("    async def _arun(self{signature}) -> str:\n"));
        code.push_str(&format!("        return self._run({})\n\n", params.join(", ")));
    }

    code.push_str("tools = [\n");
    for tool in &config.tools {
        code.push_str(&format!("    {}Tool(),\n", pascal_ident(&tool.name)));
    }
    code.push_str("]\n\n");
}
