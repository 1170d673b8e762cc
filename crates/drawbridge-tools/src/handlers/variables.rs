//! Variable command handlers: `get_variables`, `create_variable`,
//! `update_variable`, `delete_variable`.
//!
//! `get_variables` is the one read in the tool surface: it runs the broker's
//! bounded wait and returns the cached snapshot as pretty JSON. The write
//! handlers are fire-and-forget like the node commands.

use std::time::Duration;

use async_trait::async_trait;
use drawbridge_broker::ReadOutcome;
use drawbridge_core::FileId;
use drawbridge_core::constants::{FETCH_POLL_MS, FETCH_WAIT_MS};
use serde_json::{Map, Value, json};

use crate::errors::ToolError;
use crate::handlers::accepted;
use crate::params::{optional_string, optional_value, require_string};
use crate::reply::ToolReply;
use crate::traits::{BridgeTool, ToolContext};

/// `get_variables` — read the session's variables, waiting briefly for the
/// plugin when the cache is cold.
pub struct GetVariables;

#[async_trait]
impl BridgeTool for GetVariables {
    fn name(&self) -> &str {
        "get_variables"
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<ToolReply, ToolError> {
        let file = FileId::from(require_string(&params, "fileId")?);

        let outcome = ctx
            .broker
            .read_variables(
                &file,
                Duration::from_millis(FETCH_WAIT_MS),
                Duration::from_millis(FETCH_POLL_MS),
            )
            .await?;

        match outcome {
            ReadOutcome::Ready(snapshot) => Ok(ToolReply::json(&json!({
                "variables": snapshot.variables,
                "collections": snapshot.collections,
            }))),
            ReadOutcome::TimedOut => Ok(ToolReply::error(format!(
                "Error: The plugin for file {file} has not responded with variables yet. \
                 The request stays queued; retry once the plugin is connected."
            ))),
        }
    }
}

/// `create_variable` — create a design variable in a collection.
pub struct CreateVariable;

#[async_trait]
impl BridgeTool for CreateVariable {
    fn name(&self) -> &str {
        "create_variable"
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<ToolReply, ToolError> {
        let file = FileId::from(require_string(&params, "fileId")?);
        let name = require_string(&params, "name")?;
        let variable_type = require_string(&params, "variableType")?;
        let values_by_mode = require_values_by_mode(&params)?;

        let mut data = Map::new();
        let _ = data.insert("name".to_owned(), Value::String(name));
        let _ = data.insert("variableType".to_owned(), Value::String(variable_type));
        let _ = data.insert("valuesByMode".to_owned(), values_by_mode);
        if let Some(collection) = optional_string(&params, "collectionId") {
            let _ = data.insert("collectionId".to_owned(), Value::String(collection));
        }
        if let Some(description) = optional_string(&params, "description") {
            let _ = data.insert("description".to_owned(), Value::String(description));
        }
        if let Some(scopes) = optional_value(&params, "scopes") {
            let _ = data.insert("scopes".to_owned(), scopes);
        }

        let payload = json!({ "updates": [{ "type": "createVariable", "data": data }] });
        let delivery = ctx.broker.send(&file, payload).await?;
        Ok(accepted("Variable creation", delivery, &file))
    }
}

/// `update_variable` — change an existing variable's name, values,
/// description, or scopes.
pub struct UpdateVariable;

#[async_trait]
impl BridgeTool for UpdateVariable {
    fn name(&self) -> &str {
        "update_variable"
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<ToolReply, ToolError> {
        let file = FileId::from(require_string(&params, "fileId")?);
        let variable_id = require_string(&params, "variableId")?;

        let mut data = Map::new();
        let _ = data.insert("variableId".to_owned(), Value::String(variable_id));
        if let Some(name) = optional_string(&params, "name") {
            let _ = data.insert("name".to_owned(), Value::String(name));
        }
        if let Some(values) = optional_value(&params, "valuesByMode") {
            let _ = data.insert("valuesByMode".to_owned(), values);
        }
        if let Some(description) = optional_string(&params, "description") {
            let _ = data.insert("description".to_owned(), Value::String(description));
        }
        if let Some(scopes) = optional_value(&params, "scopes") {
            let _ = data.insert("scopes".to_owned(), scopes);
        }

        let payload = json!({ "updates": [{ "type": "updateVariable", "data": data }] });
        let delivery = ctx.broker.send(&file, payload).await?;
        Ok(accepted("Variable update", delivery, &file))
    }
}

/// `delete_variable` — remove a variable.
pub struct DeleteVariable;

#[async_trait]
impl BridgeTool for DeleteVariable {
    fn name(&self) -> &str {
        "delete_variable"
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<ToolReply, ToolError> {
        let file = FileId::from(require_string(&params, "fileId")?);
        let variable_id = require_string(&params, "variableId")?;

        let payload = json!({
            "updates": [{ "type": "deleteVariable", "data": { "variableId": variable_id } }]
        });
        let delivery = ctx.broker.send(&file, payload).await?;
        Ok(accepted("Variable deletion", delivery, &file))
    }
}

/// `valuesByMode` must be an object with at least one mode entry.
fn require_values_by_mode(params: &Value) -> Result<Value, ToolError> {
    match params.get("valuesByMode").and_then(Value::as_object) {
        Some(map) if !map.is_empty() => Ok(Value::Object(map.clone())),
        _ => Err(ToolError::validation(
            "valuesByMode is required and must have at least one mode",
        )),
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

    async fn connected_ctx() -> (ToolContext, PluginLink, mpsc::Receiver<String>) {
        let broker = Arc::new(SessionBroker::default());
        let (tx, rx) = mpsc::channel(32);
        let link = PluginLink::new("f1".into(), "p1".into(), tx);
        broker.attach_transport(link.clone()).await;
        (ToolContext::new(broker), link, rx)
    }

    fn first_update(frame: &str) -> Value {
        let envelope: Value = serde_json::from_str(frame).unwrap();
        envelope["updates"]["updates"][0].clone()
    }

    #[tokio::test]
    async fn get_variables_requires_file() {
        let err = GetVariables
            .execute(json!({}), &test_ctx())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "fileId is required");
    }

    #[tokio::test]
    async fn get_variables_returns_cached_snapshot_as_json() {
        let (ctx, link, mut rx) = connected_ctx().await;
        ctx.broker
            .ingest_snapshot(
                &link,
                vec![json!({ "id": "v1", "name": "primary" })],
                vec![json!({ "id": "c1" })],
            )
            .await;

        let reply = GetVariables
            .execute(json!({ "fileId": "f1" }), &ctx)
            .await
            .unwrap();

        assert!(!reply.is_error);
        let text = reply.first_text().unwrap();
        let parsed: Value = serde_json::from_str(text).unwrap();
        assert_eq!(parsed["variables"][0]["id"], "v1");
        assert_eq!(parsed["collections"][0]["id"], "c1");
        assert!(rx.try_recv().is_err(), "a cache hit sends nothing");
    }

    #[tokio::test]
    async fn get_variables_times_out_with_retry_hint() {
        tokio::time::pause();
        let ctx = test_ctx();

        let reply = GetVariables
            .execute(json!({ "fileId": "f2" }), &ctx)
            .await
            .unwrap();

        assert!(reply.is_error);
        let text = reply.first_text().unwrap();
        assert!(text.starts_with("Error:"));
        assert!(text.contains("retry"));
        assert_eq!(
            ctx.broker.queue_depth(&"f2".into()),
            1,
            "the fetch request stays queued for the next connection"
        );
    }

    #[tokio::test]
    async fn create_variable_validation_messages() {
        let ctx = test_ctx();

        let err = CreateVariable
            .execute(json!({ "fileId": "f1" }), &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "name is required");

        let err = CreateVariable
            .execute(json!({ "fileId": "f1", "name": "primary" }), &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "variableType is required");

        for missing in [
            json!({ "fileId": "f1", "name": "primary", "variableType": "COLOR" }),
            json!({
                "fileId": "f1", "name": "primary", "variableType": "COLOR",
                "valuesByMode": {},
            }),
            json!({
                "fileId": "f1", "name": "primary", "variableType": "COLOR",
                "valuesByMode": "light",
            }),
        ] {
            let err = CreateVariable.execute(missing, &ctx).await.unwrap_err();
            assert_eq!(
                err.to_string(),
                "valuesByMode is required and must have at least one mode"
            );
        }
    }

    #[tokio::test]
    async fn create_variable_sends_full_payload() {
        let (ctx, _link, mut rx) = connected_ctx().await;

        let reply = CreateVariable
            .execute(
                json!({
                    "fileId": "f1",
                    "name": "primary",
                    "variableType": "COLOR",
                    "valuesByMode": { "light": "#ffffff", "dark": "#000000" },
                    "collectionId": "c1",
                    "description": "brand color",
                    "scopes": ["FILL_COLOR"],
                }),
                &ctx,
            )
            .await
            .unwrap();

        assert_eq!(
            reply.first_text(),
            Some("Variable creation request sent to the plugin for file f1")
        );

        let update = first_update(&rx.recv().await.unwrap());
        assert_eq!(update["type"], "createVariable");
        assert_eq!(update["data"]["name"], "primary");
        assert_eq!(update["data"]["variableType"], "COLOR");
        assert_eq!(update["data"]["valuesByMode"]["light"], "#ffffff");
        assert_eq!(update["data"]["collectionId"], "c1");
        assert_eq!(update["data"]["scopes"][0], "FILL_COLOR");
    }

    #[tokio::test]
    async fn create_variable_omits_absent_optionals() {
        let (ctx, _link, mut rx) = connected_ctx().await;

        let _ = CreateVariable
            .execute(
                json!({
                    "fileId": "f1",
                    "name": "spacing-s",
                    "variableType": "FLOAT",
                    "valuesByMode": { "default": 8 },
                }),
                &ctx,
            )
            .await
            .unwrap();

        let update = first_update(&rx.recv().await.unwrap());
        assert!(update["data"].get("collectionId").is_none());
        assert!(update["data"].get("description").is_none());
        assert!(update["data"].get("scopes").is_none());
    }

    #[tokio::test]
    async fn update_variable_requires_ids() {
        let ctx = test_ctx();

        let err = UpdateVariable
            .execute(json!({ "variableId": "v1" }), &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "fileId is required");

        let err = UpdateVariable
            .execute(json!({ "fileId": "f1" }), &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "variableId is required");
    }

    #[tokio::test]
    async fn update_variable_sends_only_present_fields() {
        let (ctx, _link, mut rx) = connected_ctx().await;

        let reply = UpdateVariable
            .execute(
                json!({
                    "fileId": "f1",
                    "variableId": "v1",
                    "valuesByMode": { "dark": "#111111" },
                }),
                &ctx,
            )
            .await
            .unwrap();

        assert_eq!(
            reply.first_text(),
            Some("Variable update request sent to the plugin for file f1")
        );

        let update = first_update(&rx.recv().await.unwrap());
        assert_eq!(update["type"], "updateVariable");
        assert_eq!(update["data"]["variableId"], "v1");
        assert_eq!(update["data"]["valuesByMode"]["dark"], "#111111");
        assert!(update["data"].get("name").is_none());
        assert!(update["data"].get("description").is_none());
    }

    #[tokio::test]
    async fn delete_variable_sends_minimal_payload() {
        let (ctx, _link, mut rx) = connected_ctx().await;

        let reply = DeleteVariable
            .execute(json!({ "fileId": "f1", "variableId": "v1" }), &ctx)
            .await
            .unwrap();

        assert_eq!(
            reply.first_text(),
            Some("Variable deletion request sent to the plugin for file f1")
        );

        let update = first_update(&rx.recv().await.unwrap());
        assert_eq!(update["type"], "deleteVariable");
        assert_eq!(update["data"], json!({ "variableId": "v1" }));
    }

    #[tokio::test]
    async fn delete_variable_queues_offline() {
        let ctx = test_ctx();
        let reply = DeleteVariable
            .execute(json!({ "fileId": "f1", "variableId": "v1" }), &ctx)
            .await
            .unwrap();
        assert!(!reply.is_error);
        assert!(reply.first_text().unwrap().contains("queued"));
    }
}
