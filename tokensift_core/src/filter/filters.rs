//! Provided filters for common selection patterns.

use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;

use regex::Regex;

use super::{FilterDecision, TokenFilter};
use crate::stream::ScalarValue;

/// Retains the value at a slash-separated pointer, e.g. `/a/0/b`.
///
/// Segments use the usual `~0`/`~1` escapes for `~` and `/`. A `*` segment
/// matches any property name or element index. The empty pointer matches the
/// whole document. Only values at the full pointer are emitted; scalars met
/// along the way are not.
#[derive(Debug, Clone)]
pub struct PointerFilter {
    segments: Arc<[String]>,
    depth: usize,
}

impl PointerFilter {
    pub fn new(pointer: &str) -> Self {
        let segments = pointer
            .split('/')
            .skip(1)
            .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
            .collect();
        Self { segments, depth: 0 }
    }

    fn segment(&self) -> Option<&str> {
        self.segments.get(self.depth).map(String::as_str)
    }

    fn advance(&self, matched: bool) -> FilterDecision {
        if !matched {
            return FilterDecision::Exclude;
        }
        if self.depth + 1 == self.segments.len() {
            FilterDecision::IncludeAll
        } else {
            FilterDecision::Descend(Rc::new(Self {
                segments: Arc::clone(&self.segments),
                depth: self.depth + 1,
            }))
        }
    }
}

impl TokenFilter for PointerFilter {
    fn include_property(&self, name: &str) -> FilterDecision {
        match self.segment() {
            None => FilterDecision::IncludeAll,
            Some(segment) => self.advance(segment == "*" || segment == name),
        }
    }

    fn include_element(&self, index: usize) -> FilterDecision {
        match self.segment() {
            None => FilterDecision::IncludeAll,
            Some(segment) => self.advance(segment == "*" || segment.parse() == Ok(index)),
        }
    }

    fn include_value(&self, _value: &ScalarValue) -> bool {
        self.depth == self.segments.len()
    }
}

/// Retains any value whose property name is in the given set, at any depth.
#[derive(Debug, Clone)]
pub struct NameMatchFilter {
    names: HashSet<String>,
}

impl NameMatchFilter {
    pub fn new<I, T>(names: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self { names: names.into_iter().map(Into::into).collect() }
    }
}

impl TokenFilter for NameMatchFilter {
    fn include_property(&self, name: &str) -> FilterDecision {
        if self.names.contains(name) {
            FilterDecision::IncludeAll
        } else {
            FilterDecision::Retain
        }
    }

    fn include_value(&self, _value: &ScalarValue) -> bool {
        false
    }
}

/// Retains any value whose property name matches the pattern, at any depth.
#[derive(Debug, Clone)]
pub struct RegexNameFilter {
    pattern: Regex,
}

impl RegexNameFilter {
    pub fn new(pattern: Regex) -> Self {
        Self { pattern }
    }
}

impl TokenFilter for RegexNameFilter {
    fn include_property(&self, name: &str) -> FilterDecision {
        if self.pattern.is_match(name) {
            FilterDecision::IncludeAll
        } else {
            FilterDecision::Retain
        }
    }

    fn include_value(&self, _value: &ScalarValue) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use regex::Regex;

    use super::{NameMatchFilter, PointerFilter, RegexNameFilter};
    use crate::filter::{FilterDecision, TokenFilter};
    use crate::stream::ScalarValue;

    fn is_include_all(decision: &FilterDecision) -> bool {
        matches!(decision, FilterDecision::IncludeAll)
    }

    #[test]
    fn pointer_walks_segments() {
        let filter = PointerFilter::new("/a/b");
        let next = match filter.include_property("a") {
            FilterDecision::Descend(next) => next,
            other => panic!("expected Descend, got {other:?}"),
        };
        assert!(is_include_all(&next.include_property("b")));
        assert!(matches!(next.include_property("c"), FilterDecision::Exclude));
        assert!(matches!(filter.include_property("b"), FilterDecision::Exclude));
    }

    #[test]
    fn pointer_matches_element_indexes() {
        let filter = PointerFilter::new("/2");
        assert!(is_include_all(&filter.include_element(2)));
        assert!(matches!(filter.include_element(1), FilterDecision::Exclude));
        assert!(matches!(filter.include_property("2"), FilterDecision::IncludeAll));
    }

    #[test]
    fn pointer_wildcard_matches_any_segment() {
        let filter = PointerFilter::new("/*/x");
        let via_name = match filter.include_property("whatever") {
            FilterDecision::Descend(next) => next,
            other => panic!("expected Descend, got {other:?}"),
        };
        assert!(is_include_all(&via_name.include_property("x")));
        assert!(matches!(filter.include_element(17), FilterDecision::Descend(_)));
    }

    #[test]
    fn pointer_unescapes_segments() {
        let filter = PointerFilter::new("/a~1b~0c");
        assert!(is_include_all(&filter.include_property("a/b~c")));
        assert!(matches!(filter.include_property("a~1b~0c"), FilterDecision::Exclude));
    }

    #[test]
    fn empty_pointer_matches_the_document() {
        let filter = PointerFilter::new("");
        assert!(is_include_all(&filter.include_property("anything")));
        assert!(filter.include_value(&ScalarValue::Int64(1)));
    }

    #[test]
    fn mid_path_scalars_are_rejected() {
        let filter = PointerFilter::new("/a/b");
        assert!(!filter.include_value(&ScalarValue::Int64(1)));
    }

    #[test]
    fn name_match_filter_keeps_descending_otherwise() {
        let filter = NameMatchFilter::new(["x"]);
        assert!(is_include_all(&filter.include_property("x")));
        assert!(matches!(filter.include_property("y"), FilterDecision::Retain));
        assert!(!filter.include_value(&ScalarValue::Int64(1)));
    }

    #[test]
    fn regex_filter_matches_names() {
        let filter = RegexNameFilter::new(Regex::new("^item_[0-9]+$").unwrap());
        assert!(is_include_all(&filter.include_property("item_12")));
        assert!(matches!(filter.include_property("item_x"), FilterDecision::Retain));
    }
}
