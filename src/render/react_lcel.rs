use crate::config::WorkflowConfig;

use super::{py_str, react};

/// Emit the LCEL rendition of the ReAct pattern: the same tool material as
/// the classic renderer, with the loop replaced by a composed chain of
/// discrete stages (input shaping, prompt, model, output parsing).
pub fn render(config: &WorkflowConfig) -> String {
    let mut code = String::new();
    code.push_str("from typing import Dict, Any, List\n");
    code.push_str("from langchain_core.prompts import ChatPromptTemplate, MessagesPlaceholder\n");
    code.push_str("from langchain_core.output_parsers import StrOutputParser\n");
    code.push_str("from langchain_core.runnables import RunnablePassthrough\n");
    code.push_str("from langchain_openai import ChatOpenAI\n");
    code.push_str("from langchain_core.tools import BaseTool\n\n");

    react::push_tool_classes(&mut code, config);

    let agent = &config.agents[0];
    let model = agent.llm_hint.as_deref().unwrap_or("gpt-4.1-mini");
    let system = format!(
        "You are {}. Your goal is {}. Use tools when needed.",
        agent.role, agent.goal
    );

    code.push_str(&format!("llm = ChatOpenAI(model={})\n\n", py_str(model)));
    code.push_str("react_prompt = ChatPromptTemplate.from_messages([\n");
    code.push_str(&format!("    (\"system\", {}),\n", py_str(&system)));
    code.push_str("    MessagesPlaceholder(\"history\"),\n");
    code.push_str("    (\"human\", \"{input}\")\n");
    code.push_str("])\n\n");

    code.push_str("chain = (\n");
    code.push_str("    {\"input\": RunnablePassthrough(), \"history\": RunnablePassthrough()}\n");
    code.push_str("    | react_prompt\n");
    code.push_str("    | llm\n");
    code.push_str("    | StrOutputParser()\n");
    code.push_str(")\n\n");

    code.push_str("def run_agent(query: str, history: List[str] = []) -> str:\n");
    code.push_str("    return chain.invoke({\"input\": query, \"history\": history})\n\n");

    code.push_str("if __name__ == \"__main__\":\n");
    code.push_str("    result = run_agent(\"Your query here\")\n");
    code.push_str("    print(result)\n");
    code
}
