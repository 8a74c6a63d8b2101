// File push handler: receives unsolicited uploads carried inside the RPC

use std::sync::Arc;

use async_trait::async_trait;

use logmesh_api::remote::model::{
    FilePushRequest, FilePushResponse, Payload, RequestTrait, Response, ResponseTrait,
};
use logmesh_common::LogMeshError;

use crate::transfer::service::FileTransferService;

use super::PayloadHandler;

/// Handler for FilePushRequest
pub struct FilePushHandler {
    pub transfer: Arc<FileTransferService>,
}

#[async_trait]
impl PayloadHandler for FilePushHandler {
    async fn handle(&self, payload: &Payload) -> Result<Payload, LogMeshError> {
        let request = FilePushRequest::from(payload);
        let request_id = request.request_id();

        let response = match self.transfer.handle_file_push(&request) {
            Ok(message) => FilePushResponse::new(request_id, message),
            Err(error) => FilePushResponse {
                response: Response::fail(request_id, error.to_string()),
                message: String::default(),
            },
        };

        Ok(response.to_payload())
    }

    fn can_handle(&self) -> &'static str {
        "FilePushRequest"
    }
}
