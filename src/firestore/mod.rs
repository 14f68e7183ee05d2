//! Firestore write analysis.
//!
//! Stateless analyzers over [`crate::syntax`] call expressions:
//! classification of monitored writes, payload inspection, merge option
//! validation and fix synthesis. [`checks`] combines them into rules.

pub mod checks;
pub mod classify;
pub mod fix;
pub mod merge;
pub mod operations;
pub mod payload;

pub use checks::{CallRule, Finding, NoUndefinedValues, NoUndefinedValuesOptions, SetRequireMerge};
pub use classify::{classify, CallSignature};
pub use fix::{Suggestion, TextEdit};
pub use merge::{check_merge, MergeCheck, MissingReason};
pub use operations::{MonitoredOperations, ReceiverFilter};
pub use payload::contains_sentinel;
