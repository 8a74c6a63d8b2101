//! Payload handler infrastructure and the core request handlers
//!
//! Incoming payloads are dispatched by their metadata type to a registered
//! handler. Handlers run on the shared pool and must be safe under
//! concurrent invocation.

pub mod file_push;
pub mod file_request;
pub mod log_query;
pub mod transfer;

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use logmesh_api::remote::model::Payload;
use logmesh_common::LogMeshError;

/// Trait for handling payload messages
#[async_trait]
pub trait PayloadHandler: Send + Sync {
    async fn handle(&self, payload: &Payload) -> Result<Payload, LogMeshError>;

    /// Request type this handler accepts
    fn can_handle(&self) -> &'static str;
}

/// Maps request types to their handlers
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: DashMap<String, Arc<dyn PayloadHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, handler: Arc<dyn PayloadHandler>) {
        self.handlers
            .insert(handler.can_handle().to_string(), handler);
    }

    pub async fn handle(&self, payload: &Payload) -> Result<Payload, LogMeshError> {
        let request_type = payload.metadata.r#type.clone();
        // Clone the handler Arc out before awaiting so no map guard is held.
        let handler = self
            .handlers
            .get(&request_type)
            .map(|e| e.value().clone())
            .ok_or_else(|| {
                LogMeshError::transport(format!(
                    "no handler for request type '{}'",
                    request_type
                ))
            })?;

        handler.handle(payload).await
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoHandler;

    #[async_trait]
    impl PayloadHandler for EchoHandler {
        async fn handle(&self, payload: &Payload) -> Result<Payload, LogMeshError> {
            Ok(payload.clone())
        }

        fn can_handle(&self) -> &'static str {
            "EchoRequest"
        }
    }

    #[tokio::test]
    async fn test_dispatch_by_type() {
        let registry = HandlerRegistry::new();
        registry.register(Arc::new(EchoHandler));

        let mut payload = Payload::default();
        payload.metadata.r#type = "EchoRequest".to_string();
        assert!(registry.handle(&payload).await.is_ok());

        payload.metadata.r#type = "UnknownRequest".to_string();
        let result = registry.handle(&payload).await;
        assert!(matches!(result, Err(LogMeshError::Transport(_))));
    }
}
