//! The matching-and-context engine.
//!
//! A search pass is a linear pipeline over one immutable line sequence:
//!
//! 1. [`matcher`] — decides, per line, whether the pattern matches under the
//!    active mode flags (literal/regex, case folding). The engine XORs the
//!    result with the invert flag to form the inclusion predicate.
//! 2. [`ranges::build_ranges`] — widens the selected line indices into closed
//!    intervals of before/after context, clamped to the sequence.
//! 3. [`ranges::merge_ranges`] — coalesces overlapping and adjacent
//!    intervals into a sorted, disjoint, non-adjacent set.
//! 4. [`emitter`] — renders the covered lines (or just a count) in ascending
//!    index order.
//!
//! [`engine`] orchestrates the stages and owns the two short-circuits: count
//! mode never builds ranges, and an empty match set never reaches the merger.
//! The match stage may fan out across threads; everything downstream is
//! strictly sequential and operates on data built once and never mutated.

pub mod emitter;
pub mod engine;
pub mod matcher;
pub mod ranges;

pub use engine::{run, search};
pub use matcher::LineMatcher;
