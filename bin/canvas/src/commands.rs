//! Command implementations.
//!
//! Each command works against the collaborator traits and returns the text
//! to print, so the binary only wires up concrete adapters.

use crate::error::CliError;
use flowdeck_workflow::{
    AgentCatalog, EditorContext, EditorController, ExecutionRequest, LayoutOptions, Node,
    NodeType, Position, Workflow, WorkflowExecutor, WorkflowGraph, WorkflowStore,
};
use tracing::info;

/// Creates a workflow holding a single trigger node.
pub async fn create(
    store: &dyn WorkflowStore,
    name: &str,
    description: Option<&str>,
) -> Result<String, CliError> {
    let graph = WorkflowGraph::from_parts(
        vec![Node::of_type("trigger", NodeType::Trigger, Position::default())],
        Vec::new(),
    );
    let mut workflow = Workflow::new(name).with_graph(graph);
    if let Some(description) = description {
        workflow = workflow.with_description(description);
    }
    store.save(&workflow).await?;
    Ok(format!("created {name} ({})", workflow.id))
}

/// Lays out a stored workflow and saves the new positions.
pub async fn layout(
    store: &dyn WorkflowStore,
    name: &str,
    options: LayoutOptions,
) -> Result<String, CliError> {
    let mut workflow = store.load(name).await?;
    let direction = options.direction;
    let context = EditorContext::new(workflow.id).with_layout(options);
    let mut editor = EditorController::new(context, workflow.graph.clone());
    editor.request_layout(direction);
    workflow.set_graph(editor.into_graph());
    store.save(&workflow).await?;

    let out: String = workflow
        .graph
        .nodes()
        .iter()
        .map(|node| {
            format!(
                "{}\t{}\t{:.1}\t{:.1}\n",
                node.id(),
                node.node_type(),
                node.position.x,
                node.position.y
            )
        })
        .collect();
    info!(workflow = name, %direction, "layout saved");
    Ok(out)
}

/// Loads a workflow. Stores reject documents whose graph is invalid, so a
/// successful load means the graph passed validation.
pub async fn validate(store: &dyn WorkflowStore, name: &str) -> Result<String, CliError> {
    let workflow = store.load(name).await?;
    Ok(format!(
        "{name}: {} nodes, {} edges, valid",
        workflow.graph.node_count(),
        workflow.graph.edge_count()
    ))
}

/// Lists stored workflows.
pub async fn list(store: &dyn WorkflowStore) -> Result<String, CliError> {
    let rows: String = store
        .list()
        .await?
        .into_iter()
        .map(|summary| {
            format!(
                "{}\t{} nodes\t{} edges\t{}\t{}\n",
                summary.name,
                summary.node_count,
                summary.edge_count,
                summary.updated_at.to_rfc3339(),
                summary.description.unwrap_or_default()
            )
        })
        .collect();
    Ok(rows)
}

/// Lists the node palette.
pub async fn agents(catalog: &dyn AgentCatalog) -> Result<String, CliError> {
    let rows: String = catalog
        .list_agents()
        .await?
        .into_iter()
        .map(|agent| format!("{}\t{}\t{}\n", agent.node_type, agent.id, agent.name))
        .collect();
    Ok(rows)
}

/// Submits a stored workflow for execution.
///
/// Returns the pretty-printed result and whether the run succeeded.
pub async fn execute(
    store: &dyn WorkflowStore,
    executor: &dyn WorkflowExecutor,
    name: &str,
) -> Result<(String, bool), CliError> {
    let workflow = store.load(name).await?;
    let result = executor.execute(ExecutionRequest::from(&workflow)).await;
    Ok((serde_json::to_string_pretty(&result)?, result.success))
}
