//! Node command handlers: `create_node` and `update_node`.
//!
//! These build the opaque update payloads the plugin's translation layer
//! executes. The broker accepts them whether or not the plugin is connected,
//! so the replies report "sent" or "queued", never "plugin not found".

use async_trait::async_trait;
use drawbridge_core::FileId;
use serde_json::{Map, Value, json};

use crate::errors::ToolError;
use crate::handlers::accepted;
use crate::params::{optional_string, optional_u64, optional_value, require_string};
use crate::reply::ToolReply;
use crate::traits::{BridgeTool, ToolContext};

/// Node types the plugin can create.
const VALID_NODE_TYPES: [&str; 24] = [
    "FRAME",
    "TEXT",
    "RECTANGLE",
    "ELLIPSE",
    "LINE",
    "VECTOR",
    "STAR",
    "POLYGON",
    "GROUP",
    "COMPONENT",
    "COMPONENT_SET",
    "INSTANCE",
    "BOOLEAN_OPERATION",
    "SLICE",
    "STICKY",
    "CONNECTOR",
    "SHAPE_WITH_TEXT",
    "CODE_BLOCK",
    "EMBED",
    "LINK_UNFURL",
    "MEDIA",
    "SECTION",
    "HIGHLIGHT",
    "WIDGET",
];

/// `create_node` — create a node of any supported type.
pub struct CreateNode;

#[async_trait]
impl BridgeTool for CreateNode {
    fn name(&self) -> &str {
        "create_node"
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<ToolReply, ToolError> {
        let file = FileId::from(require_string(&params, "fileId")?);
        let node_type = require_string(&params, "nodeType")?;

        let upper = node_type.to_uppercase();
        if !VALID_NODE_TYPES.contains(&upper.as_str()) {
            return Err(ToolError::validation(format!(
                "Invalid nodeType \"{node_type}\". Valid types: {}",
                VALID_NODE_TYPES.join(", ")
            )));
        }

        let mut data = Map::new();
        let _ = data.insert("nodeType".to_owned(), Value::String(upper));
        if let Some(properties) = optional_value(&params, "properties") {
            let _ = data.insert("properties".to_owned(), properties);
        }
        if let Some(parent) = optional_string(&params, "parentId") {
            let _ = data.insert("parentId".to_owned(), Value::String(parent));
        }

        let payload = json!({ "updates": [{ "type": "createNode", "data": data }] });
        let delivery = ctx.broker.send(&file, payload).await?;
        Ok(accepted("Node creation", delivery, &file))
    }
}

/// `update_node` — update a node's properties or delete it, selected by the
/// `operation` parameter.
pub struct UpdateNode;

#[async_trait]
impl BridgeTool for UpdateNode {
    fn name(&self) -> &str {
        "update_node"
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<ToolReply, ToolError> {
        let file = FileId::from(require_string(&params, "fileId")?);
        let node_id = require_string(&params, "nodeId")?;

        let operation = optional_string(&params, "operation");
        let operation = match operation.as_deref() {
            Some(op @ ("update" | "delete")) => op,
            _ => {
                return Err(ToolError::validation(
                    "operation must be either 'update' or 'delete'",
                ));
            }
        };

        let properties = optional_value(&params, "properties");
        if operation == "update" && properties.is_none() {
            return Err(ToolError::validation(
                "properties are required when operation is 'update'",
            ));
        }

        let mut data = Map::new();
        let _ = data.insert("nodeId".to_owned(), Value::String(node_id));
        if operation == "update" {
            if let Some(properties) = properties {
                let _ = data.insert("properties".to_owned(), properties);
            }
        }
        if let Some(parent) = optional_string(&params, "parentId") {
            let _ = data.insert("parentId".to_owned(), Value::String(parent));
        }
        if let Some(index) = optional_u64(&params, "index") {
            let _ = data.insert("index".to_owned(), Value::from(index));
        }

        let kind = if operation == "delete" {
            "deleteNode"
        } else {
            "updateNode"
        };
        let payload = json!({ "updates": [{ "type": kind, "data": data }] });
        let delivery = ctx.broker.send(&file, payload).await?;

        let action = if operation == "delete" {
            "Node deletion"
        } else {
            "Node update"
        };
        Ok(accepted(action, delivery, &file))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use drawbridge_broker::{PluginLink, SessionBroker};
    use tokio::sync::mpsc;

    use super::*;

    fn test_ctx() -> ToolContext {
        ToolContext::new(Arc::new(SessionBroker::default()))
    }

    /// Context with a live transport for "f1"; returns the frame receiver.
    async fn connected_ctx() -> (ToolContext, mpsc::Receiver<String>) {
        let broker = Arc::new(SessionBroker::default());
        let (tx, rx) = mpsc::channel(32);
        let link = PluginLink::new("f1".into(), "p1".into(), tx);
        broker.attach_transport(link).await;
        (ToolContext::new(broker), rx)
    }

    fn first_update(frame: &str) -> Value {
        let envelope: Value = serde_json::from_str(frame).unwrap();
        envelope["updates"]["updates"][0].clone()
    }

    #[tokio::test]
    async fn create_node_requires_file_and_type() {
        let ctx = test_ctx();

        let err = CreateNode
            .execute(json!({ "nodeType": "FRAME" }), &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "fileId is required");

        let err = CreateNode
            .execute(json!({ "fileId": "f1" }), &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "nodeType is required");
    }

    #[tokio::test]
    async fn create_node_rejects_unknown_type() {
        let ctx = test_ctx();
        let err = CreateNode
            .execute(json!({ "fileId": "f1", "nodeType": "BLOB" }), &ctx)
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Invalid nodeType \"BLOB\""));
        assert!(message.contains("FRAME"));
        assert!(message.contains("WIDGET"));
    }

    #[tokio::test]
    async fn create_node_uppercases_type_and_sends_payload() {
        let (ctx, mut rx) = connected_ctx().await;

        let reply = CreateNode
            .execute(
                json!({
                    "fileId": "f1",
                    "nodeType": "frame",
                    "properties": { "width": 100 },
                    "parentId": "node-9",
                }),
                &ctx,
            )
            .await
            .unwrap();

        assert!(!reply.is_error);
        assert_eq!(
            reply.first_text(),
            Some("Node creation request sent to the plugin for file f1")
        );

        let update = first_update(&rx.recv().await.unwrap());
        assert_eq!(update["type"], "createNode");
        assert_eq!(update["data"]["nodeType"], "FRAME");
        assert_eq!(update["data"]["properties"]["width"], 100);
        assert_eq!(update["data"]["parentId"], "node-9");
    }

    #[tokio::test]
    async fn create_node_queues_when_disconnected() {
        let ctx = test_ctx();
        let reply = CreateNode
            .execute(json!({ "fileId": "f1", "nodeType": "TEXT" }), &ctx)
            .await
            .unwrap();
        assert!(!reply.is_error);
        assert!(reply.first_text().unwrap().contains("queued for file f1"));
        assert_eq!(ctx.broker.queue_depth(&"f1".into()), 1);
    }

    #[tokio::test]
    async fn update_node_validates_operation() {
        let ctx = test_ctx();

        let err = UpdateNode
            .execute(json!({ "fileId": "f1", "nodeId": "n1" }), &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "operation must be either 'update' or 'delete'");

        let err = UpdateNode
            .execute(
                json!({ "fileId": "f1", "nodeId": "n1", "operation": "move" }),
                &ctx,
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "operation must be either 'update' or 'delete'");
    }

    #[tokio::test]
    async fn update_requires_properties() {
        let ctx = test_ctx();
        let err = UpdateNode
            .execute(
                json!({ "fileId": "f1", "nodeId": "n1", "operation": "update" }),
                &ctx,
            )
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "properties are required when operation is 'update'"
        );
    }

    #[tokio::test]
    async fn update_node_sends_update_payload() {
        let (ctx, mut rx) = connected_ctx().await;

        let reply = UpdateNode
            .execute(
                json!({
                    "fileId": "f1",
                    "nodeId": "n1",
                    "operation": "update",
                    "properties": { "opacity": 0.5 },
                    "index": 2,
                }),
                &ctx,
            )
            .await
            .unwrap();

        assert_eq!(
            reply.first_text(),
            Some("Node update request sent to the plugin for file f1")
        );

        let update = first_update(&rx.recv().await.unwrap());
        assert_eq!(update["type"], "updateNode");
        assert_eq!(update["data"]["nodeId"], "n1");
        assert_eq!(update["data"]["properties"]["opacity"], 0.5);
        assert_eq!(update["data"]["index"], 2);
    }

    #[tokio::test]
    async fn delete_sends_delete_payload_without_properties() {
        let (ctx, mut rx) = connected_ctx().await;

        let reply = UpdateNode
            .execute(
                json!({
                    "fileId": "f1",
                    "nodeId": "n1",
                    "operation": "delete",
                    "properties": { "ignored": true },
                }),
                &ctx,
            )
            .await
            .unwrap();

        assert_eq!(
            reply.first_text(),
            Some("Node deletion request sent to the plugin for file f1")
        );

        let update = first_update(&rx.recv().await.unwrap());
        assert_eq!(update["type"], "deleteNode");
        assert_eq!(update["data"]["nodeId"], "n1");
        assert!(
            update["data"].get("properties").is_none(),
            "deleteNode carries no properties"
        );
    }
}
