// Log query handler: answers bounded log-entry batches from the local store

use std::sync::Arc;

use async_trait::async_trait;

use logmesh_api::model::MAX_LOG_EVENT_BATCH;
use logmesh_api::remote::model::{
    LogQueryRequest, LogQueryResponse, Payload, RequestTrait, Response, ResponseTrait,
};
use logmesh_common::LogMeshError;

use crate::store::LogStore;

use super::PayloadHandler;

/// Handler for LogQueryRequest
pub struct LogQueryHandler {
    pub store: Arc<LogStore>,
}

#[async_trait]
impl PayloadHandler for LogQueryHandler {
    async fn handle(&self, payload: &Payload) -> Result<Payload, LogMeshError> {
        let request = LogQueryRequest::from(payload);
        let request_id = request.request_id();

        let mut events = self.store.query(&request.query);
        // Synchronous replies stay bounded; anything larger goes through
        // the file-transfer side channel.
        events.truncate(MAX_LOG_EVENT_BATCH);

        let response = LogQueryResponse::new(Response::ok(request_id), events);
        Ok(response.to_payload())
    }

    fn can_handle(&self) -> &'static str {
        "LogQueryRequest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logmesh_api::logdata::model::{LogEntry, LogLevel, LogQuery};

    fn handler_with(timestamps: &[i64]) -> (tempfile::TempDir, LogQueryHandler) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LogStore::open(dir.path().join("logmesh.db")).unwrap());
        for &ts in timestamps {
            store
                .append(LogEntry::new(LogLevel::Info, "test", ts, "x"))
                .unwrap();
        }
        (dir, LogQueryHandler { store })
    }

    #[tokio::test]
    async fn test_query_applies_bounds() {
        let (_dir, handler) = handler_with(&[10, 20, 30]);

        let request = LogQueryRequest::new(LogQuery::newer_than(10));
        let reply = handler.handle(&request.to_payload()).await.unwrap();

        let response = LogQueryResponse::from(&reply);
        assert!(response.response.is_success());
        let timestamps: Vec<i64> = response.events.iter().map(|e| e.timestamp).collect();
        assert_eq!(timestamps, vec![20, 30]);
    }

    #[tokio::test]
    async fn test_no_match_is_empty_success() {
        let (_dir, handler) = handler_with(&[]);

        let request = LogQueryRequest::new(LogQuery::all());
        let reply = handler.handle(&request.to_payload()).await.unwrap();

        let response = LogQueryResponse::from(&reply);
        assert!(response.response.is_success());
        assert!(response.events.is_empty());
    }
}
