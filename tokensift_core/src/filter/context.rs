//! Shadow frames mirroring the upstream parser's open containers.

use std::sync::Arc;

use super::FilterHandle;
use crate::stream::Token;

/// What kind of container a shadow frame mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    Root,
    Object,
    Array,
}

/// One frame of the shadow context stack.
///
/// A frame tracks the filter active inside its container, the path component
/// of the child currently being processed, and what the frame still owes the
/// downstream consumer: its own start marker while `start_handled` is false,
/// and then at most the pending property name of the current child. Those two
/// flags are the frame's replay queue; sibling names overwrite one another
/// because a rejected sibling's drop is final.
#[derive(Debug)]
pub struct FilterContext {
    kind: ContextKind,
    filter: Option<FilterHandle>,
    start_handled: bool,
    need_name: bool,
    current_name: Option<Arc<str>>,
    current_index: Option<usize>,
}

impl FilterContext {
    pub(crate) fn root(filter: Option<FilterHandle>) -> Self {
        Self {
            kind: ContextKind::Root,
            filter,
            start_handled: true,
            need_name: false,
            current_name: None,
            current_index: None,
        }
    }

    pub(crate) fn child(
        kind: ContextKind,
        filter: Option<FilterHandle>,
        start_handled: bool,
    ) -> Self {
        Self {
            kind,
            filter,
            start_handled,
            need_name: false,
            current_name: None,
            current_index: None,
        }
    }

    pub fn kind(&self) -> ContextKind {
        self.kind
    }

    pub fn in_object(&self) -> bool {
        self.kind == ContextKind::Object
    }

    pub fn in_array(&self) -> bool {
        self.kind == ContextKind::Array
    }

    /// Name of the child currently being processed, if any.
    pub fn current_name(&self) -> Option<&str> {
        self.current_name.as_deref()
    }

    /// Index of the child currently being processed, if any element has been
    /// seen.
    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn has_current_name(&self) -> bool {
        self.current_name.is_some()
    }

    pub fn has_current_index(&self) -> bool {
        self.current_index.is_some()
    }

    /// Whether this frame's start marker has been emitted downstream.
    pub fn is_start_handled(&self) -> bool {
        self.start_handled
    }

    pub(crate) fn needs_name(&self) -> bool {
        self.need_name
    }

    pub(crate) fn filter(&self) -> Option<&FilterHandle> {
        self.filter.as_ref()
    }

    /// Record the upcoming child's name and return the filter to consult for
    /// its value. The name stays pending until the value's fate is decided.
    pub(crate) fn set_property_name(&mut self, name: Arc<str>) -> Option<FilterHandle> {
        self.current_name = Some(name);
        self.need_name = true;
        self.filter.clone()
    }

    /// The pending name was emitted, or its value was dropped for good.
    pub(crate) fn mark_name_handled(&mut self) {
        self.need_name = false;
    }

    /// Refine `filter` for the upcoming child value. Array frames advance
    /// their element index and consult the filter; object frames already
    /// narrowed the filter at the property-name step; the root frame counts
    /// root values and passes through.
    pub(crate) fn check_value(&mut self, filter: &FilterHandle) -> Option<FilterHandle> {
        match self.kind {
            ContextKind::Object => Some(filter.clone()),
            ContextKind::Array => {
                let index = self.bump_index();
                match filter {
                    FilterHandle::IncludeAll => Some(FilterHandle::IncludeAll),
                    FilterHandle::Custom(custom) => {
                        FilterHandle::resolved(custom, custom.include_element(index))
                    }
                }
            }
            ContextKind::Root => {
                self.bump_index();
                Some(filter.clone())
            }
        }
    }

    fn bump_index(&mut self) -> usize {
        let next = self.current_index.map_or(0, |index| index + 1);
        self.current_index = Some(next);
        next
    }

    /// Pop the next token this frame owes the consumer: the start marker
    /// first, then a pending property name. `None` once drained.
    pub(crate) fn next_token_to_read(&mut self) -> Option<Token> {
        if !self.start_handled {
            self.start_handled = true;
            return match self.kind {
                ContextKind::Object => Some(Token::StartObject),
                ContextKind::Array => Some(Token::StartArray),
                ContextKind::Root => None,
            };
        }
        if self.need_name && self.kind == ContextKind::Object {
            self.need_name = false;
            return self.current_name.clone().map(Token::PropertyName);
        }
        None
    }

    /// The pointer segment for the child currently being processed.
    pub(crate) fn path_segment(&self) -> Option<String> {
        match self.kind {
            ContextKind::Root => None,
            ContextKind::Object => self
                .current_name
                .as_deref()
                .map(|name| name.replace('~', "~0").replace('/', "~1")),
            ContextKind::Array => self.current_index.map(|index| index.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{ContextKind, FilterContext};
    use crate::filter::{FilterDecision, FilterHandle, TokenFilter};
    use crate::stream::Token;

    struct EvenElements;
    impl TokenFilter for EvenElements {
        fn include_element(&self, index: usize) -> FilterDecision {
            if index % 2 == 0 {
                FilterDecision::Retain
            } else {
                FilterDecision::Exclude
            }
        }
    }

    #[test]
    fn array_frames_advance_the_index_per_value() {
        let mut frame = FilterContext::child(ContextKind::Array, None, false);
        let filter = FilterHandle::custom(EvenElements);
        assert!(!frame.has_current_index());

        assert!(frame.check_value(&filter).is_some());
        assert_eq!(frame.current_index(), Some(0));
        assert!(frame.check_value(&filter).is_none());
        assert_eq!(frame.current_index(), Some(1));
        assert!(frame.check_value(&filter).is_some());
        assert_eq!(frame.current_index(), Some(2));
    }

    #[test]
    fn object_frames_pass_the_narrowed_filter_through() {
        let mut frame = FilterContext::child(ContextKind::Object, None, false);
        let filter = FilterHandle::IncludeAll;
        assert!(matches!(frame.check_value(&filter), Some(FilterHandle::IncludeAll)));
        assert!(!frame.has_current_index());
    }

    #[test]
    fn drains_start_marker_then_pending_name() {
        let mut frame =
            FilterContext::child(ContextKind::Object, Some(FilterHandle::IncludeAll), false);
        frame.set_property_name(Arc::from("a"));
        frame.set_property_name(Arc::from("b"));

        assert_eq!(frame.next_token_to_read(), Some(Token::StartObject));
        assert!(frame.is_start_handled());
        assert_eq!(frame.next_token_to_read(), Some(Token::name("b")));
        assert_eq!(frame.next_token_to_read(), None);
    }

    #[test]
    fn handled_names_are_not_replayed() {
        let mut frame = FilterContext::child(ContextKind::Object, None, false);
        frame.set_property_name(Arc::from("a"));
        frame.mark_name_handled();
        assert_eq!(frame.next_token_to_read(), Some(Token::StartObject));
        assert_eq!(frame.next_token_to_read(), None);
    }

    #[test]
    fn path_segments_escape_pointer_characters() {
        let mut object = FilterContext::child(ContextKind::Object, None, true);
        object.set_property_name(Arc::from("a/b~c"));
        assert_eq!(object.path_segment().as_deref(), Some("a~1b~0c"));

        let root = FilterContext::root(None);
        assert_eq!(root.path_segment(), None);
    }
}
