// File request handler: the acceptance handshake of the two-phase transfer

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use logmesh_api::remote::model::{
    FileRequest, FileRequestResponse, Payload, RequestTrait, ResponseTrait,
};
use logmesh_common::LogMeshError;

use crate::transfer::service::FileTransferService;

use super::PayloadHandler;

/// Handler for FileRequest
///
/// Always answers with a status response; failures on this path degrade to
/// declines because the caller is on the other end of an RPC boundary.
pub struct FileRequestHandler {
    pub transfer: Arc<FileTransferService>,
}

#[async_trait]
impl PayloadHandler for FileRequestHandler {
    async fn handle(&self, payload: &Payload) -> Result<Payload, LogMeshError> {
        let request = FileRequest::from(payload);
        let request_id = request.request_id();

        info!(
            requester = %request.requester_address,
            correlation_id = request.correlation_id,
            "Received file request"
        );

        let status = self
            .transfer
            .handle_file_request(&request.requester_address, request.correlation_id)
            .await;

        let response = FileRequestResponse::new(request_id, status);
        Ok(response.to_payload())
    }

    fn can_handle(&self) -> &'static str {
        "FileRequest"
    }
}
