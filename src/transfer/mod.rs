//! Cross-account transfer: origin tracking, planning and orchestration

pub mod error;
pub mod orchestrator;
pub mod origin;
pub mod plan;

pub use error::{TransferError, TransferResult};
pub use orchestrator::{
    collect_static_files, TransferOrchestrator, TransferOutcome, TransferPhase, TransferSummary,
};
pub use origin::{is_loopback, AccountIdentity, Origin, OriginRegistry};
pub use plan::TransferPlan;
