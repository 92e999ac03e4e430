//! # tokensift
//!
//! Tokensift filters streaming token sequences (objects, arrays, property
//! names, and scalars) through a user-supplied predicate, re-exposing only
//! the tokens that survive.
//!
//! The interesting part is what happens to composite values: whether an
//! object or array should be emitted may depend on children the producer has
//! not delivered yet. The [`FilteringCursor`] enters such values tentatively,
//! mirrors them on a shadow context stack, and once a deep descendant earns
//! inclusion, replays the suppressed start markers and property names in
//! their original order before resuming live forwarding.
//!
//! ```
//! use tokensift::filters::PointerFilter;
//! use tokensift::{filter_json, FilterHandle, Inclusion};
//!
//! let tokens = filter_json(
//!     r#"{"a":1,"b":{"c":2,"d":3}}"#,
//!     FilterHandle::custom(PointerFilter::new("/b/c")),
//!     Inclusion::IncludeAllAndPath,
//!     false,
//! )
//! .unwrap();
//!
//! // The enclosing path of the match is replayed around it:
//! // { "b" { "c" 2 } }
//! assert_eq!(tokens.len(), 7);
//! ```
//!
//! Custom filters implement [`TokenFilter`]; any producer of tokens can feed
//! a cursor by implementing [`TokenSource`]. Cursors are sources themselves,
//! so filters compose by stacking.

// The filtering cursor and the contracts it is built from.
pub use tokensift_core::filter::context::{ContextKind, FilterContext};
pub use tokensift_core::filter::{
    FilterDecision, FilterHandle, FilteringCursor, Inclusion, TokenFilter,
};

// The token model and the upstream seam.
pub use tokensift_core::stream::{
    json, ScalarValue, Token, TokenBuffer, TokenKind, TokenSource, TokenStreamError,
};

/// Provided filters for common selection patterns.
pub mod filters {
    pub use tokensift_core::filter::filters::{NameMatchFilter, PointerFilter, RegexNameFilter};
}

/// Filter a JSON document, returning the surviving token sequence.
pub fn filter_json(
    input: &str,
    filter: FilterHandle,
    inclusion: Inclusion,
    allow_multiple_matches: bool,
) -> anyhow::Result<Vec<Token>> {
    let tokens = json::tokens_from_str(input)?;
    let cursor =
        FilteringCursor::new(TokenBuffer::new(tokens), filter, inclusion, allow_multiple_matches);
    Ok(cursor.collect::<Result<Vec<_>, _>>()?)
}
