//! The eleven skills seeded into every [`SkillRegistry`] at startup.
//!
//! Concrete skill semantics (actually calling an LLM, a browser, a
//! shell, …) are out of scope for this core — see `SPEC_FULL.md` §2.
//! What's modeled here is the metadata every skill carries (parameters,
//! outputs, timeout, retry policy, icon/color) plus a stub `execute`
//! that produces a well-shaped success result, so the runner and its
//! tests can exercise real end-to-end dispatch without a live external
//! system.

use std::time::Instant;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::context::{ExecutionContext, SkillResult};
use crate::definition::{SkillCategory, SkillDefinition, SkillOutput, SkillParameter};
use crate::registry::SkillRegistry;
use crate::traits::Skill;

/// A skill whose behavior is fully described by its [`SkillDefinition`]:
/// validation follows the default rule in [`Skill::validate_inputs`],
/// and execution synthesizes one placeholder value per declared output.
pub struct StandardSkill {
    definition: SkillDefinition,
}

impl StandardSkill {
    pub fn new(definition: SkillDefinition) -> Self {
        Self { definition }
    }
}

#[async_trait]
impl Skill for StandardSkill {
    fn definition(&self) -> &SkillDefinition {
        &self.definition
    }

    async fn execute(&self, ctx: &ExecutionContext) -> SkillResult {
        let start = Instant::now();
        let mut outputs = Map::new();
        for output in &self.definition.outputs {
            outputs.insert(output.name.clone(), Value::Null);
        }
        let duration_ms = start.elapsed().as_millis() as u64;
        SkillResult::success(outputs, duration_ms).with_logs(vec![format!(
            "{} executed for node {}",
            self.definition.id, ctx.node_id
        )])
    }
}

fn standard_definitions() -> Vec<SkillDefinition> {
    vec![
        SkillDefinition::new(
            "dynamic-planner",
            "Dynamic Planner",
            "Breaks a goal into a sequence of sub-tasks using an LLM planner.",
            SkillCategory::Cognitive,
        )
        .with_parameters(vec![
            SkillParameter::required("goal", "string", "The objective to plan for."),
            SkillParameter::optional("model", "string", "LLM model id.", json!("default")),
        ])
        .with_outputs(vec![SkillOutput::new("plan", "array", "Ordered list of sub-tasks.")])
        .with_icon("route")
        .with_color("#7c3aed"),
        SkillDefinition::new(
            "data-extractor",
            "Data Extractor",
            "Extracts, reshapes, merges, or splits structured data.",
            SkillCategory::Cognitive,
        )
        .with_parameters(vec![
            SkillParameter::required("source", "object", "Input data to operate on."),
            SkillParameter::optional("mode", "string", "set | merge | split.", json!("set"))
                .with_allowed_values(vec![json!("set"), json!("merge"), json!("split")]),
        ])
        .with_outputs(vec![SkillOutput::new("data", "object", "Resulting data.")])
        .with_icon("filter")
        .with_color("#2563eb"),
        SkillDefinition::new(
            "document-summarizer",
            "Document Summarizer",
            "Produces a condensed summary of a document.",
            SkillCategory::Cognitive,
        )
        .with_parameters(vec![
            SkillParameter::required("document", "string", "Document text or reference."),
            SkillParameter::optional("max_words", "number", "Maximum summary length.", json!(200)),
        ])
        .with_outputs(vec![SkillOutput::new("summary", "string", "Condensed summary.")])
        .with_icon("file-text")
        .with_color("#0891b2"),
        SkillDefinition::new(
            "browser-operator",
            "Browser Operator",
            "Drives a headless browser session to interact with a web page.",
            SkillCategory::Web,
        )
        .with_parameters(vec![
            SkillParameter::required("url", "string", "Page to navigate to."),
            SkillParameter::optional("actions", "array", "Ordered browser actions.", json!([])),
        ])
        .with_outputs(vec![SkillOutput::new("result", "object", "Page state or extracted data.")])
        .with_timeout(600)
        .with_icon("globe")
        .with_color("#ea580c"),
        SkillDefinition::new(
            "wide-researcher",
            "Wide Researcher",
            "Fans out web searches across multiple sources and synthesizes findings.",
            SkillCategory::Web,
        )
        .with_parameters(vec![
            SkillParameter::required("query", "string", "Research question."),
            SkillParameter::optional("max_sources", "number", "Sources to consult.", json!(5)),
        ])
        .with_outputs(vec![SkillOutput::new("report", "string", "Synthesized findings.")])
        .with_timeout(600)
        .with_retries(1)
        .with_icon("search")
        .with_color("#059669"),
        SkillDefinition::new(
            "http-request",
            "HTTP Request",
            "Issues an HTTP request and returns the response.",
            SkillCategory::Web,
        )
        .with_parameters(vec![
            SkillParameter::required("url", "string", "Target URL."),
            SkillParameter::optional("method", "string", "HTTP method.", json!("GET"))
                .with_allowed_values(vec![
                    json!("GET"), json!("POST"), json!("PUT"), json!("PATCH"), json!("DELETE"),
                ]),
            SkillParameter::optional("headers", "object", "Request headers.", json!({})),
            SkillParameter::optional("body", "object", "Request body.", json!(null)),
        ])
        .with_outputs(vec![
            SkillOutput::new("status", "number", "HTTP status code."),
            SkillOutput::new("body", "object", "Response body."),
        ])
        .with_retries(2)
        .with_icon("send")
        .with_color("#2563eb"),
        SkillDefinition::new(
            "python-sandbox",
            "Python Sandbox",
            "Runs Python (or JS) code in an isolated sandbox.",
            SkillCategory::Execution,
        )
        .with_parameters(vec![
            SkillParameter::required("code", "string", "Source code to run."),
        ])
        .with_outputs(vec![SkillOutput::new("result", "object", "The code's return value.")])
        .with_timeout(120)
        .with_icon("code")
        .with_color("#0f172a"),
        SkillDefinition::new(
            "bash-commander",
            "Bash Commander",
            "Executes a shell command in a sandboxed working directory.",
            SkillCategory::Execution,
        )
        .with_parameters(vec![
            SkillParameter::required("command", "string", "Shell command line."),
        ])
        .with_outputs(vec![
            SkillOutput::new("stdout", "string", "Captured stdout."),
            SkillOutput::new("exit_code", "number", "Process exit code."),
        ])
        .with_timeout(120)
        .with_icon("terminal")
        .with_color("#0f172a"),
        SkillDefinition::new(
            "file-manager",
            "File Manager",
            "Reads or writes a text or binary file.",
            SkillCategory::Execution,
        )
        .with_parameters(vec![
            SkillParameter::required("path", "string", "File path."),
            SkillParameter::optional("content", "string", "Content to write.", json!(null)),
        ])
        .with_outputs(vec![SkillOutput::new("content", "string", "File contents (on read).")])
        .with_icon("folder")
        .with_color("#64748b"),
        SkillDefinition::new(
            "n8n-webhook",
            "n8n Webhook",
            "Represents an inbound n8n-style webhook trigger.",
            SkillCategory::Integration,
        )
        .with_parameters(vec![
            SkillParameter::optional("webhook_url", "string", "Path segment this webhook listens on.", json!("")),
        ])
        .with_outputs(vec![SkillOutput::new("payload", "object", "The received webhook payload.")])
        .with_icon("webhook")
        .with_color("#d946ef"),
        SkillDefinition::new(
            "database-operator",
            "Database Operator",
            "Runs a query against a configured database connection.",
            SkillCategory::Integration,
        )
        .with_parameters(vec![
            SkillParameter::required("query", "string", "SQL (or equivalent) query."),
            SkillParameter::optional("params", "array", "Bound query parameters.", json!([])),
        ])
        .with_outputs(vec![SkillOutput::new("rows", "array", "Resulting rows.")])
        .with_retries(1)
        .with_icon("database")
        .with_color("#16a34a"),
    ]
}

impl SkillRegistry {
    /// Builds a registry pre-populated with the eleven standard skills.
    pub fn with_standard_skills() -> Self {
        let mut registry = Self::new();
        for definition in standard_definitions() {
            registry.register(move || Box::new(StandardSkill::new(definition.clone())));
        }
        registry
    }
}
