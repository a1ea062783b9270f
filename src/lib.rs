//! Agentforge turns plain-English descriptions of multi-agent workflows into a
//! validated, framework-neutral configuration and generated source code for
//! several agent frameworks (CrewAI, CrewAI Flow, LangGraph, ReAct).
pub mod config;
pub mod generator;
pub mod llm;
pub mod parser;
pub mod process;
pub mod prompt;
pub mod render;
pub mod validate;
