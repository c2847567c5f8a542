//! Structural validation and topological ordering.
//!
//! [`validate_workflow`] is the spec's multi-error validator: it
//! accumulates every problem it finds and returns the full list (empty
//! means valid) rather than stopping at the first fault.
//! [`get_execution_order`] is the single-fault Kahn's-algorithm sort the
//! runner and the CLI's `validate` subcommand use once a workflow is
//! already known to be well-formed.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::EngineError;
use crate::model::Workflow;

/// Run every structural check from the spec and return all the errors
/// found. An empty vec means the workflow is valid.
pub fn validate_workflow(workflow: &Workflow) -> Vec<String> {
    let mut errors = Vec::new();

    if workflow.id.trim().is_empty() {
        errors.push("Workflow id is missing".to_string());
    }
    if workflow.name.trim().is_empty() {
        errors.push("Workflow name is missing".to_string());
    }
    if workflow.nodes.is_empty() {
        errors.push("Workflow has no nodes".to_string());
    }
    if workflow.triggers.is_empty() {
        errors.push("Workflow has no trigger nodes".to_string());
    }

    let mut seen_ids: HashSet<&str> = HashSet::new();
    for node in &workflow.nodes {
        if !seen_ids.insert(node.id.as_str()) {
            errors.push(format!("Duplicate node id: {}", node.id));
        }
        if !node.is_trigger() && node.skill_id.as_deref().unwrap_or("").is_empty() {
            errors.push(format!("Node '{}' has no skill_id", node.id));
        }
    }

    let node_set: HashSet<&str> = workflow.nodes.iter().map(|n| n.id.as_str()).collect();
    for edge in &workflow.edges {
        if !node_set.contains(edge.source.as_str()) {
            errors.push(format!("Edge references unknown source: {}", edge.source));
        }
        if !node_set.contains(edge.target.as_str()) {
            errors.push(format!("Edge references unknown target: {}", edge.target));
        }
    }

    // A cycle makes the topological sort fail to visit every node.
    // Only run it once the other checks haven't already flagged a
    // dangling edge, otherwise the Kahn pass would spuriously blame a
    // cycle for what is really a missing node.
    if errors.is_empty() {
        if let Err(EngineError::CycleDetected) = get_execution_order(workflow) {
            errors.push("Workflow graph contains a cycle".to_string());
        }
    }

    errors
}

/// Topologically sort `workflow.nodes` via Kahn's algorithm. Ties are
/// broken by the nodes' insertion order, making the result deterministic.
///
/// # Errors
/// [`EngineError::DuplicateNodeId`], [`EngineError::UnknownNodeReference`],
/// or [`EngineError::CycleDetected`].
pub fn get_execution_order(workflow: &Workflow) -> Result<Vec<String>, EngineError> {
    let mut seen_ids: HashSet<&str> = HashSet::new();
    for node in &workflow.nodes {
        if !seen_ids.insert(node.id.as_str()) {
            return Err(EngineError::DuplicateNodeId(node.id.clone()));
        }
    }
    let node_set: HashSet<&str> = workflow.nodes.iter().map(|n| n.id.as_str()).collect();

    for edge in &workflow.edges {
        if !node_set.contains(edge.source.as_str()) {
            return Err(EngineError::UnknownNodeReference {
                node_id: edge.source.clone(),
                side: "source",
            });
        }
        if !node_set.contains(edge.target.as_str()) {
            return Err(EngineError::UnknownNodeReference {
                node_id: edge.target.clone(),
                side: "target",
            });
        }
    }

    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut in_degree: HashMap<&str, usize> = HashMap::new();

    for node in &workflow.nodes {
        adjacency.entry(node.id.as_str()).or_default();
        in_degree.entry(node.id.as_str()).or_insert(0);
    }
    for edge in &workflow.edges {
        adjacency
            .entry(edge.source.as_str())
            .or_default()
            .push(edge.target.as_str());
        *in_degree.entry(edge.target.as_str()).or_insert(0) += 1;
    }

    // Seed with zero-in-degree nodes, in workflow insertion order, so
    // ties among ready nodes resolve deterministically.
    let mut queue: VecDeque<&str> = workflow
        .nodes
        .iter()
        .map(|n| n.id.as_str())
        .filter(|id| in_degree[id] == 0)
        .collect();

    let mut sorted: Vec<String> = Vec::with_capacity(workflow.nodes.len());

    while let Some(node_id) = queue.pop_front() {
        sorted.push(node_id.to_owned());
        if let Some(neighbours) = adjacency.get(node_id) {
            for &neighbour in neighbours {
                let deg = in_degree.entry(neighbour).or_insert(0);
                *deg -= 1;
                if *deg == 0 {
                    queue.push_back(neighbour);
                }
            }
        }
    }

    if sorted.len() != workflow.nodes.len() {
        return Err(EngineError::CycleDetected);
    }

    Ok(sorted)
}
