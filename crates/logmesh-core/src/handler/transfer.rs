// Delivery-queue consumer: drains the node's transfer queue and hands each
// payload to the push-handler body

use std::sync::Arc;

use tokio::{sync::mpsc::UnboundedReceiver, task::JoinHandle};
use tracing::debug;

use logmesh_api::remote::model::TransferPayload;

use crate::transfer::service::FileTransferService;

/// Spawn the consumer task for a node's delivery queue
///
/// Runs until the queue's sender side is dropped. Deliveries arrive here on
/// a pool thread unrelated to any blocked requester, possibly long after
/// the request that asked for them.
pub fn spawn_delivery_consumer(
    transfer: Arc<FileTransferService>,
    mut receiver: UnboundedReceiver<TransferPayload>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(payload) = receiver.recv().await {
            transfer.on_delivery(payload).await;
        }
        debug!("Delivery queue closed, consumer exiting");
    })
}
