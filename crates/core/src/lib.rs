pub mod category;
pub mod money;
pub mod transaction;

pub use category::{Category, UnknownCategory};
pub use money::Amount;
pub use transaction::{
    collapse_whitespace, CandidateError, DedupKey, NotificationKind, Source,
    TransactionCandidate, DEDUP_PREFIX_CHARS, MIN_DESCRIPTION_CHARS,
};
