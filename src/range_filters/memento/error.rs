//! Status codes for Memento Filter operations
//!
//! Constructor-time validation uses [`crate::common::SketchError`] (the
//! teacher crate's usual `Result`-returning style). The hot insert/delete/
//! query path instead returns a plain status code, mirroring the original
//! `qf_insert_mementos`/`qf_delete_single`/`qf_point_query` C return-value
//! convention: non-negative values carry information (e.g. distance from
//! home slot), negative values are fixed error constants.

/// Result of a mutating or querying operation on a [`crate::MementoFilter`].
///
/// Non-negative variants carry a value (slot distance, or a query
/// positive/needs-rejuvenation flag); negative variants are the fixed
/// error codes from the spec's external interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i64)]
pub enum StatusCode {
    /// Operation succeeded; for insertions, the distance in slots from the
    /// home slot to the inserted keepsake box.
    Success(u64) = 0,
    /// No space left to complete a shift; auto-resize (if enabled) already
    /// retried once before this was returned to the caller.
    NoSpace = -1,
    /// `TRY_ONCE` locking failed to acquire a latch.
    CouldntLock = -2,
    /// Delete or update targeted a key that isn't present.
    DoesntExist = -3,
    /// Invalid usage: e.g. hash-mode-incompatible API call.
    Invalid = -4,
    /// Iterator has run past its last element.
    IterEnd = -5,
}

impl StatusCode {
    /// The raw integer code, matching the spec's `NO_SPACE = -1`, etc.
    pub fn code(self) -> i64 {
        match self {
            StatusCode::Success(distance) => distance as i64,
            StatusCode::NoSpace => -1,
            StatusCode::CouldntLock => -2,
            StatusCode::DoesntExist => -3,
            StatusCode::Invalid => -4,
            StatusCode::IterEnd => -5,
        }
    }

    /// True for any non-negative (success) status.
    pub fn is_success(self) -> bool {
        matches!(self, StatusCode::Success(_))
    }
}

/// Outcome of a point or range query.
///
/// Mirrors `qf_point_query`/`qf_range_query`'s boolean-equivalent return:
/// a key either is or isn't present, per spec §7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryResult {
    /// Definitely absent.
    Negative,
    /// Present.
    Positive,
}

impl QueryResult {
    /// Boolean-equivalent view of the result, as required by §7: "Successful
    /// queries return a Boolean-equivalent ... ".
    pub fn is_positive(self) -> bool {
        matches!(self, QueryResult::Positive)
    }
}
