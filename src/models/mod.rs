pub mod complaint;
pub mod evidence;
pub mod record;
pub mod verification;

pub use complaint::{
    ComplaintDraft, DraftField, PLACEHOLDER_DISTRIBUTOR, PLACEHOLDER_LOCATION, ValidatedRequest,
    ViolationReason,
};
pub use evidence::Evidence;
pub use record::{NewSubmissionRecord, ReviewStatus, SubmissionRecord};
pub use verification::{BatchId, Outcome, VerificationRequest, VerificationVerdict};
