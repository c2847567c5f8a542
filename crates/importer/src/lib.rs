//! Converts a foreign n8n workflow JSON document into an [`engine::Workflow`].
//!
//! `convert` is a pure function over its input: it never mutates global
//! state and repeated calls on the same document produce structurally
//! identical output. The importer itself never raises on a structurally
//! sound-but-broken workflow (e.g. a dangling edge) — it runs the result
//! through [`engine::validate_workflow`] and surfaces those errors as
//! `ImporterError::Invalid`.

use std::collections::HashMap;
use std::path::Path;

use serde_json::{Map, Value};
use thiserror::Error;

use engine::{Edge, Node, NodeCondition, NodeType, Workflow};

#[derive(Debug, Error)]
pub enum ImporterError {
    #[error("n8n document is missing a '{0}' field")]
    MissingField(&'static str),

    #[error("node at index {0} has no 'name' field")]
    NodeMissingName(usize),

    #[error("imported workflow failed validation: {0:?}")]
    Invalid(Vec<String>),

    #[error("failed to read import file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse import file as JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Skill ids the node-type table resolves to. Kept dash-cased to match
/// the skill registry's own seed ids.
mod skills {
    pub const TRIGGER_WEBHOOK: &str = "trigger-webhook";
    pub const TRIGGER_SCHEDULE: &str = "trigger-schedule";
    pub const TRIGGER_MANUAL: &str = "trigger-manual";
    pub const HTTP_REQUEST: &str = "http-request";
    pub const PYTHON_SANDBOX: &str = "python-sandbox";
    pub const BASH_COMMANDER: &str = "bash-commander";
    pub const FILE_MANAGER: &str = "file-manager";
    pub const DATABASE_OPERATOR: &str = "database-operator";
    pub const DYNAMIC_PLANNER: &str = "dynamic-planner";
    pub const DATA_EXTRACTOR: &str = "data-extractor";
}

/// Read and convert an n8n export from disk.
pub fn convert_file(path: &Path) -> Result<Workflow, ImporterError> {
    let raw = std::fs::read_to_string(path)?;
    let doc: Value = serde_json::from_str(&raw)?;
    convert(&doc)
}

/// Convert a parsed n8n document into a `Workflow`, rejecting it with
/// `ImporterError::Invalid` if `validate_workflow` finds structural
/// problems in the result.
pub fn convert(doc: &Value) -> Result<Workflow, ImporterError> {
    let raw_nodes = doc
        .get("nodes")
        .and_then(Value::as_array)
        .ok_or(ImporterError::MissingField("nodes"))?;

    let workflow_id = doc
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(|id| format!("manus_{id}"))
        .unwrap_or_else(|| format!("manus_{}", fresh_suffix()));
    let name = doc
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("Imported workflow")
        .to_string();

    let mut name_to_id: HashMap<String, String> = HashMap::new();
    let mut nodes = Vec::with_capacity(raw_nodes.len());
    let mut triggers = Vec::new();

    for (index, raw) in raw_nodes.iter().enumerate() {
        let original_id = raw.get("id").and_then(Value::as_str).unwrap_or("").to_string();
        let node_name = raw
            .get("name")
            .and_then(Value::as_str)
            .ok_or(ImporterError::NodeMissingName(index))?
            .to_string();
        let internal_id = format!("node_{original_id}");
        name_to_id.insert(node_name.clone(), internal_id.clone());

        let foreign_type = raw.get("type").and_then(Value::as_str).unwrap_or("");
        let raw_params = raw.get("parameters").and_then(Value::as_object).cloned().unwrap_or_default();

        let (node_type, skill_id) = classify(foreign_type);
        let parameters = map_parameters(skill_id.as_deref(), &raw_params);
        let position = parse_position(raw.get("position"));

        let mut node = Node::new(internal_id.clone(), node_name, node_type)
            .with_parameters(parameters)
            .with_position(position.0, position.1);
        if let Some(id) = &skill_id {
            node = node.with_skill(id.clone());
        }
        if node_type == NodeType::Condition {
            node.conditions = extract_conditions(&raw_params);
        }
        if node.is_trigger() {
            triggers.push(internal_id.clone());
        }

        nodes.push(node);
    }

    let edges = build_edges(doc.get("connections"), &name_to_id);

    let workflow = Workflow::new(workflow_id, name).with_nodes(nodes).with_edges(edges).with_triggers(triggers);

    let errors = engine::validate_workflow(&workflow);
    if !errors.is_empty() {
        return Err(ImporterError::Invalid(errors));
    }
    Ok(workflow)
}

/// Node classification, applied before the node-type table: a
/// case-insensitive substring match on the foreign type decides the
/// node's category and, for trigger/condition/merge nodes, its skill
/// id directly. Plain skill nodes fall through to [`resolve_skill`].
fn classify(foreign_type: &str) -> (NodeType, Option<String>) {
    let lower = foreign_type.to_lowercase();

    if lower.contains("webhook") {
        return (NodeType::Trigger, Some(skills::TRIGGER_WEBHOOK.to_string()));
    }
    if lower.contains("cron") || lower.contains("schedule") {
        return (NodeType::Trigger, Some(skills::TRIGGER_SCHEDULE.to_string()));
    }
    if lower.contains("trigger") {
        return (NodeType::Trigger, Some(skills::TRIGGER_MANUAL.to_string()));
    }
    if lower.contains("if") || lower.contains("switch") || lower.contains("condition") {
        return (NodeType::Condition, Some(skills::DYNAMIC_PLANNER.to_string()));
    }
    if lower.contains("merge") {
        return (NodeType::Merge, Some(skills::DATA_EXTRACTOR.to_string()));
    }

    (NodeType::Skill, Some(resolve_skill(&lower).to_string()))
}

/// The node-type table: maps a foreign type substring to an internal
/// skill id. Falls back to `http-request` when nothing matches, mirroring
/// the source's behavior of routing unrecognized integrations through
/// the generic HTTP skill.
fn resolve_skill(lower: &str) -> &'static str {
    const TABLE: &[(&str, &str)] = &[
        ("httprequest", skills::HTTP_REQUEST),
        ("code", skills::PYTHON_SANDBOX),
        ("function", skills::PYTHON_SANDBOX),
        ("executecommand", skills::BASH_COMMANDER),
        ("readtextfile", skills::FILE_MANAGER),
        ("writetextfile", skills::FILE_MANAGER),
        ("readbinaryfile", skills::FILE_MANAGER),
        ("writebinaryfile", skills::FILE_MANAGER),
        ("postgres", skills::DATABASE_OPERATOR),
        ("mysql", skills::DATABASE_OPERATOR),
        ("sqlite", skills::DATABASE_OPERATOR),
        ("mongodb", skills::DATABASE_OPERATOR),
        ("openai", skills::DYNAMIC_PLANNER),
        ("anthropic", skills::DYNAMIC_PLANNER),
        ("langchain", skills::DYNAMIC_PLANNER),
        ("htmlextract", skills::DATA_EXTRACTOR),
        ("set", skills::DATA_EXTRACTOR),
        ("split", skills::DATA_EXTRACTOR),
        ("slack", skills::HTTP_REQUEST),
        ("discord", skills::HTTP_REQUEST),
        ("telegram", skills::HTTP_REQUEST),
        ("emailsend", skills::HTTP_REQUEST),
    ];

    TABLE
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, skill)| *skill)
        .unwrap_or(skills::HTTP_REQUEST)
}

/// The parameter-name table: maps a foreign parameter key to its
/// internal name. Unknown keys pass through unchanged.
fn rename_parameter(key: &str) -> &str {
    match key {
        "authentication" => "auth",
        "jsCode" | "pythonCode" | "code" => "code",
        "fileName" | "filePath" => "path",
        "fileContent" | "binaryData" => "content",
        "query" | "sql" => "query",
        "parameters" => "params",
        "httpMethod" => "method",
        "path" => "webhook_url",
        "responseData" => "payload",
        other => other,
    }
}

fn map_parameters(skill_id: Option<&str>, raw_params: &Map<String, Value>) -> Map<String, Value> {
    let mut parameters = Map::new();
    for (key, value) in raw_params {
        parameters.insert(rename_parameter(key).to_string(), value.clone());
    }

    if skill_id == Some(skills::HTTP_REQUEST) {
        parameters.entry("method").or_insert_with(|| Value::String("GET".to_string()));
        if !parameters.contains_key("url") {
            if let Some(path) = raw_params.get("path") {
                parameters.insert("url".to_string(), path.clone());
            }
        }
    }

    if skill_id == Some(skills::PYTHON_SANDBOX) {
        let code = ["jsCode", "pythonCode", "code"]
            .iter()
            .find_map(|key| raw_params.get(*key).and_then(Value::as_str).filter(|s| !s.is_empty()));
        if let Some(code) = code {
            parameters.insert("code".to_string(), Value::String(code.to_string()));
        }
    }

    parameters
}

fn extract_conditions(raw_params: &Map<String, Value>) -> Vec<NodeCondition> {
    if let Some(conditions) = raw_params.get("conditions").and_then(Value::as_array) {
        return conditions.iter().map(|c| condition_from(c, condition_output(c, 0))).collect();
    }
    if let Some(rules) = raw_params.get("rules").and_then(Value::as_array) {
        return rules
            .iter()
            .enumerate()
            .map(|(index, rule)| condition_from(rule, index as u32))
            .collect();
    }
    Vec::new()
}

fn condition_output(value: &Value, default: u32) -> u32 {
    value.get("output").and_then(Value::as_u64).map(|n| n as u32).unwrap_or(default)
}

fn condition_from(value: &Value, output: u32) -> NodeCondition {
    NodeCondition {
        condition_type: value.get("condition").and_then(Value::as_str).unwrap_or("").to_string(),
        left: value.get("leftValue").cloned().unwrap_or(Value::Null),
        right: value.get("rightValue").cloned().unwrap_or(Value::Null),
        output,
    }
}

/// Foreign positions may be a `[x, y]` array or an `{x, y}` object.
fn parse_position(value: Option<&Value>) -> (i64, i64) {
    match value {
        Some(Value::Array(coords)) if coords.len() >= 2 => {
            (coords[0].as_i64().unwrap_or(0), coords[1].as_i64().unwrap_or(0))
        }
        Some(Value::Object(obj)) => (
            obj.get("x").and_then(Value::as_i64).unwrap_or(0),
            obj.get("y").and_then(Value::as_i64).unwrap_or(0),
        ),
        _ => (0, 0),
    }
}

/// The foreign document's `connections` maps a source node *name* to
/// `{"main": [[{"node": name}, ...], ...]}`. Resolves names to the
/// internal ids assigned while walking `nodes`, emitting one edge per
/// listed target with `output_index` set to the outer branch index.
fn build_edges(connections: Option<&Value>, name_to_id: &HashMap<String, String>) -> Vec<Edge> {
    let mut edges = Vec::new();
    let Some(Value::Object(sources)) = connections else {
        return edges;
    };

    for (source_name, outputs) in sources {
        let Some(source_id) = name_to_id.get(source_name) else { continue };
        let Some(branches) = outputs.get("main").and_then(Value::as_array) else { continue };

        for (output_index, branch) in branches.iter().enumerate() {
            let Some(targets) = branch.as_array() else { continue };
            for target in targets {
                let Some(target_name) = target.get("node").and_then(Value::as_str) else { continue };
                let Some(target_id) = name_to_id.get(target_name) else { continue };
                edges.push(Edge {
                    id: format!("edge_{source_id}_{target_id}"),
                    source: source_id.clone(),
                    target: target_id.clone(),
                    output_index: output_index as u32,
                });
            }
        }
    }

    edges
}

fn fresh_suffix() -> String {
    let raw = uuid::Uuid::new_v4().simple().to_string();
    raw[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_doc() -> Value {
        json!({
            "id": "wf1",
            "name": "Webhook to HTTP to code",
            "nodes": [
                {
                    "id": "1",
                    "name": "Webhook",
                    "type": "n8n-nodes-base.webhook",
                    "position": [0, 0],
                    "parameters": { "path": "/incoming" }
                },
                {
                    "id": "2",
                    "name": "Call API",
                    "type": "n8n-nodes-base.httpRequest",
                    "position": [250, 0],
                    "parameters": { "url": "https://example.com" }
                },
                {
                    "id": "3",
                    "name": "Transform",
                    "type": "n8n-nodes-base.code",
                    "position": [500, 0],
                    "parameters": { "jsCode": "return items[0].json;" }
                }
            ],
            "connections": {
                "Webhook": { "main": [[ { "node": "Call API" } ]] },
                "Call API": { "main": [[ { "node": "Transform" } ]] }
            }
        })
    }

    #[test]
    fn s6_converts_webhook_http_code_chain() {
        let workflow = convert(&sample_doc()).unwrap();

        assert_eq!(workflow.nodes.len(), 3);
        assert_eq!(workflow.edges.len(), 2);
        assert_eq!(workflow.triggers, vec!["node_1".to_string()]);

        let skill_ids: Vec<_> = workflow.nodes.iter().map(|n| n.skill_id.clone().unwrap()).collect();
        assert_eq!(skill_ids, vec!["trigger-webhook", "http-request", "python-sandbox"]);

        let node2 = workflow.nodes.iter().find(|n| n.id == "node_2").unwrap();
        assert_eq!(node2.parameters["method"], "GET");

        let node3 = workflow.nodes.iter().find(|n| n.id == "node_3").unwrap();
        assert_eq!(node3.parameters["code"], "return items[0].json;");
    }

    #[test]
    fn converting_twice_is_deterministic() {
        let doc = sample_doc();
        let first = convert(&doc).unwrap();
        let second = convert(&doc).unwrap();
        assert_eq!(serde_json::to_value(&first).unwrap(), serde_json::to_value(&second).unwrap());
    }

    #[test]
    fn missing_nodes_field_is_an_error() {
        let doc = json!({ "name": "broken" });
        assert!(matches!(convert(&doc), Err(ImporterError::MissingField("nodes"))));
    }

    #[test]
    fn position_accepts_object_form() {
        let doc = json!({
            "id": "wf2",
            "name": "obj position",
            "nodes": [{
                "id": "1",
                "name": "Start",
                "type": "n8n-nodes-base.manualTrigger",
                "position": { "x": 10, "y": 20 },
                "parameters": {}
            }],
            "connections": {}
        });
        let workflow = convert(&doc).unwrap();
        assert_eq!(workflow.nodes[0].position, (10, 20));
    }

    #[test]
    fn condition_rules_fall_back_to_index_as_output() {
        let params: Map<String, Value> = [(
            "rules".to_string(),
            json!([{ "condition": "eq", "leftValue": 1, "rightValue": 1 }, { "condition": "neq", "leftValue": 2, "rightValue": 3 }]),
        )]
        .into_iter()
        .collect();
        let conditions = extract_conditions(&params);
        assert_eq!(conditions[0].output, 0);
        assert_eq!(conditions[1].output, 1);
    }
}
