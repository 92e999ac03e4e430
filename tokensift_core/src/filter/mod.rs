//! Predicate-driven filtering of token streams.
//!
//! A [`TokenFilter`] is a lazy tree of decisions paralleling the document
//! structure: each callback decides the fate of one child value and hands
//! back the filter to consult for that child's own children. The tree is
//! never materialized; [`FilterDecision::Retain`] reuses the current node and
//! [`FilterDecision::Descend`] produces the next one on demand.
//!
//! [`FilteringCursor`](cursor::FilteringCursor) drives an upstream
//! [`TokenSource`](crate::stream::TokenSource) through such a filter and
//! re-exposes the surviving tokens.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::stream::ScalarValue;

pub mod context;
pub mod cursor;
pub mod filters;

pub use cursor::FilteringCursor;

/// Outcome of a single [`TokenFilter`] decision.
#[derive(Clone)]
pub enum FilterDecision {
    /// Drop the value this decision covers, subtree included. The drop is
    /// final: none of its tokens are buffered or revisited.
    Exclude,
    /// Emit the value and everything beneath it with no further checks.
    IncludeAll,
    /// Keep consulting this same filter, child by child.
    Retain,
    /// Consult the given filter for the children of this value.
    Descend(Rc<dyn TokenFilter>),
}

impl fmt::Debug for FilterDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterDecision::Exclude => write!(f, "Exclude"),
            FilterDecision::IncludeAll => write!(f, "IncludeAll"),
            FilterDecision::Retain => write!(f, "Retain"),
            FilterDecision::Descend(_) => write!(f, "Descend(..)"),
        }
    }
}

/// A user-supplied predicate over a token stream.
///
/// All callbacks take `&self`: a filter making per-call decisions based on
/// earlier ones (counters, toggles) uses interior mutability.
///
/// The default implementations retain composite values for further
/// child-by-child inspection, accept scalars, and never synthesize empty
/// containers; a no-op filter therefore passes the stream through intact.
pub trait TokenFilter {
    /// Refine the filter when an object this filter covers begins.
    fn filter_start_object(&self) -> FilterDecision {
        FilterDecision::Retain
    }

    /// Refine the filter when an array this filter covers begins.
    fn filter_start_array(&self) -> FilterDecision {
        FilterDecision::Retain
    }

    /// Notification that the covered object ended.
    fn filter_finish_object(&self) {}

    /// Notification that the covered array ended.
    fn filter_finish_array(&self) {}

    /// Decide the fate of the object property `name`.
    fn include_property(&self, _name: &str) -> FilterDecision {
        FilterDecision::Retain
    }

    /// Decide the fate of the array element at `index` (zero-based).
    fn include_element(&self, _index: usize) -> FilterDecision {
        FilterDecision::Retain
    }

    /// Whether to emit a leaf scalar. Leaves are never included merely
    /// because their enclosing path survived; this decision is theirs alone.
    fn include_value(&self, _value: &ScalarValue) -> bool {
        true
    }

    /// Whether to synthesize `{}` when nothing inside an object matched.
    /// `has_name` reports whether any property name was seen.
    fn include_empty_object(&self, _has_name: bool) -> bool {
        false
    }

    /// Whether to synthesize `[]` when nothing inside an array matched.
    /// `has_index` reports whether any element was seen.
    fn include_empty_array(&self, _has_index: bool) -> bool {
        false
    }
}

/// A resolved, non-null filter slot: either the include-all sentinel or a
/// live predicate.
///
/// The sentinel is a dedicated variant rather than a filter instance, so it
/// stays distinguishable from a user filter that happens to accept
/// everything.
#[derive(Clone)]
pub enum FilterHandle {
    /// Emit every token in the covered subtree without consulting anything.
    IncludeAll,
    /// A live predicate, consulted per child.
    Custom(Rc<dyn TokenFilter>),
}

impl FilterHandle {
    pub fn custom(filter: impl TokenFilter + 'static) -> Self {
        FilterHandle::Custom(Rc::new(filter))
    }

    pub fn is_include_all(&self) -> bool {
        matches!(self, FilterHandle::IncludeAll)
    }

    /// Combine a callback's decision with the filter that produced it.
    /// `None` models exclusion.
    pub(crate) fn resolved(
        current: &Rc<dyn TokenFilter>,
        decision: FilterDecision,
    ) -> Option<FilterHandle> {
        match decision {
            FilterDecision::Exclude => None,
            FilterDecision::IncludeAll => Some(FilterHandle::IncludeAll),
            FilterDecision::Retain => Some(FilterHandle::Custom(Rc::clone(current))),
            FilterDecision::Descend(next) => Some(FilterHandle::Custom(next)),
        }
    }
}

impl fmt::Debug for FilterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterHandle::IncludeAll => write!(f, "IncludeAll"),
            FilterHandle::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Policy governing enclosing path tokens and scalar nulls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Inclusion {
    /// Emit only the tokens of subtrees the filter resolved to include-all;
    /// enclosing start markers and property names stay hidden.
    OnlyIncludeAll,
    /// Additionally emit the start markers and property names on the path
    /// from the match outward, in original stream order.
    IncludeAllAndPath,
    /// Path inclusion, except that values the filter accepts as scalar nulls
    /// are dropped together with their names.
    IncludeNonNull,
}
