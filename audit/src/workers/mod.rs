//! Pipeline stage workers.

mod ingest;
mod persist;
mod transform;

pub use ingest::{IngestWorker, IngestWorkerHandle};
pub use persist::{PersistWorker, PersistWorkerHandle};
pub use transform::{TransformWorker, TransformWorkerHandle};
