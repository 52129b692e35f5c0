//! Archive engine: HTTP transport and effect execution off the UI thread.
mod api;
mod engine;
mod persist;
mod timer;
mod types;

pub use api::{ApiSettings, ArchiveApi, ReqwestApi};
pub use engine::{EngineEvents, EngineHandle};
pub use persist::{ensure_dir, AtomicFileWriter, PersistError};
pub use types::{ApiError, EngineError, EngineEvent, FailureKind};
