// Correlation-based file transfer: pending table, staging, and the
// two-phase protocol itself

pub mod pending;
pub mod service;
pub mod staging;

pub use pending::{PendingTransferTable, TransferOutcome};
pub use service::FileTransferService;
