//! VERDICT Core - Entity Types and Lifecycle State Machines
//!
//! Pure data structures and transition rules. All other crates depend on
//! this. This crate contains no I/O and no async code: the approval and
//! session lifecycles are expressed as plain types so that the storage and
//! API layers can enforce them uniformly.

pub mod approval;
pub mod entity_ref;
pub mod error;
pub mod identity;
pub mod session;
pub mod work_item;

pub use approval::{
    ActionType, Approval, ApprovalCounts, ApprovalData, ApprovalState, ApprovalStateError,
    ApprovalStatus, ApprovalStatusParseError, Approved, Denied, Executed, ExecutionFailed, Pending,
    RiskLevel, StoredApproval, TypedApproval,
};
pub use entity_ref::{EntityKind, EntityKindParseError, EntityRef};
pub use error::{StorageError, ValidationError, VerdictError, VerdictResult};
pub use identity::{new_entity_id, ApprovalId, EntityId, SessionId, Timestamp};
pub use session::{
    ModelRates, SessionData, SessionStatus, SessionStatusParseError, SessionTransitionError,
    TokenDelta,
};
pub use work_item::{
    ReviewRequest, ReviewStatus, WorkItem, WorkItemKind, WorkItemStatus, WorkItemStatusParseError,
};
