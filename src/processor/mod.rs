// Rule processing: error taxonomy, handler trait, dispatch tables, per record type
// handlers, the per-record orchestrator and the batch driver

pub mod context;
pub mod dispatch;
pub mod error;
pub mod implementations;
pub mod pipeline;
pub mod registry;
pub mod traits;

pub use context::{Collaborators, ProcessingContext};
pub use dispatch::{DispatchError, DispatchTable, SupportedCombination};
pub use error::{ErrorEntry, RuleError, Severity, NO_CHANGE_MESSAGE};
pub use pipeline::{ProcessingResult, RuleProcessor};
pub use registry::{BatchError, BatchItem, BatchRecord, BatchReport, BulkEditService, DynProcessor, ProcessorRegistry};
pub use traits::{mutation, AppliedAction, Mutation, RecordHandler};
