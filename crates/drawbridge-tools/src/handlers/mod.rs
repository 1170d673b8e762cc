//! Tool handler modules and registration.

pub mod nodes;
pub mod variables;

use std::sync::Arc;

use drawbridge_broker::Delivery;
use drawbridge_core::FileId;

use crate::registry::ToolRegistry;
use crate::reply::ToolReply;

/// Register all bridge tool handlers with the registry.
pub fn register_all(registry: &mut ToolRegistry) {
    // Nodes
    registry.register(Arc::new(nodes::CreateNode));
    registry.register(Arc::new(nodes::UpdateNode));

    // Variables
    registry.register(Arc::new(variables::GetVariables));
    registry.register(Arc::new(variables::CreateVariable));
    registry.register(Arc::new(variables::UpdateVariable));
    registry.register(Arc::new(variables::DeleteVariable));
}

/// Success reply for a command the broker accepted.
///
/// Both delivery modes are a success from the caller's point of view; the
/// text only tells them whether the plugin already has the request or will
/// receive it on its next connection.
pub(crate) fn accepted(action: &str, delivery: Delivery, file: &FileId) -> ToolReply {
    match delivery {
        Delivery::Direct => {
            ToolReply::text(format!("{action} request sent to the plugin for file {file}"))
        }
        Delivery::Queued => ToolReply::text(format!(
            "{action} request queued for file {file}; it will be delivered when the plugin connects"
        )),
    }
}
