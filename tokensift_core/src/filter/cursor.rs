//! The filtering state machine.

use std::borrow::Cow;
use std::sync::Arc;

use itertools::Itertools;
use smallvec::SmallVec;

use super::context::{ContextKind, FilterContext};
use super::{FilterHandle, Inclusion};
use crate::stream::{Token, TokenKind, TokenSource, TokenStreamError};

/// A filtering view over an upstream token source.
///
/// The cursor drives the upstream source forward, consults the filter for
/// every value boundary, and re-exposes the tokens that survive. Emitted
/// tokens are a subsequence of the upstream stream, except that start markers
/// and property names suppressed while a composite value's fate was still
/// undecided are replayed, in original order, once a descendant earns
/// inclusion, always before any further live token.
///
/// The cursor is single-threaded and pull-driven: all work happens inside
/// [`next_token`](FilteringCursor::next_token), and stopping early is simply
/// ceasing to pull.
pub struct FilteringCursor<S> {
    source: S,
    inclusion: Inclusion,
    allow_multiple_matches: bool,
    /// Shadow stack mirroring the upstream parser's open containers.
    /// `contexts[0]` is the root frame and lives as long as the cursor.
    contexts: SmallVec<[FilterContext; 8]>,
    /// Frame currently being drained for replay, if any.
    exposed: Option<usize>,
    /// Filter for the next immediate value; carries decisions across the
    /// name/value gap and between array siblings.
    item_filter: Option<FilterHandle>,
    current: Option<Token>,
    last_cleared: Option<Token>,
    match_count: usize,
}

impl<S: TokenSource> FilteringCursor<S> {
    pub fn new(
        source: S,
        filter: FilterHandle,
        inclusion: Inclusion,
        allow_multiple_matches: bool,
    ) -> Self {
        let mut contexts = SmallVec::new();
        contexts.push(FilterContext::root(Some(filter.clone())));
        Self {
            source,
            inclusion,
            allow_multiple_matches,
            contexts,
            exposed: None,
            item_filter: Some(filter),
            current: None,
            last_cleared: None,
            match_count: 0,
        }
    }

    pub fn into_inner(self) -> S {
        self.source
    }

    /// Advance to the next token that survives filtering, or `None` at the
    /// end of the filtered stream.
    pub fn next_token(&mut self) -> Result<Option<Token>, TokenStreamError> {
        // A single-match stream ends right after a bare scalar match.
        if !self.allow_multiple_matches
            && self.exposed.is_none()
            && self.inclusion == Inclusion::OnlyIncludeAll
            && self.current.as_ref().is_some_and(Token::is_scalar)
            && !self.head().is_start_handled()
            && matches!(self.item_filter, Some(FilterHandle::IncludeAll))
        {
            self.current = None;
            return Ok(None);
        }

        let token = self.advance()?;
        self.current.clone_from(&token);
        Ok(token)
    }

    fn advance(&mut self) -> Result<Option<Token>, TokenStreamError> {
        // Drain any replay in progress before reading live.
        while let Some(exposed) = self.exposed {
            if let Some(token) = self.contexts[exposed].next_token_to_read() {
                return Ok(Some(token));
            }
            if exposed == self.head_index() {
                self.exposed = None;
                let token = self.source.current_token().cloned();
                if self.head().in_array() {
                    if matches!(token, Some(Token::EndArray)) {
                        self.pop_head();
                    }
                    return Ok(token);
                }
                if matches!(token, Some(Token::PropertyName(_))) {
                    // The live loop still owes this name a filter decision.
                    break;
                }
                if matches!(token, Some(Token::EndObject)) {
                    self.pop_head();
                }
                return Ok(token);
            }
            let next = exposed + 1;
            if next > self.head_index() {
                return Err(TokenStreamError::BrokenReplayChain);
            }
            self.exposed = Some(next);
        }

        self.next_live_token()
    }

    fn next_live_token(&mut self) -> Result<Option<Token>, TokenStreamError> {
        loop {
            let Some(token) = self.source.next_token()? else {
                return Ok(None);
            };
            match token {
                Token::StartObject => {
                    if let Some(emitted) =
                        self.enter_live_container(ContextKind::Object, Token::StartObject)?
                    {
                        return Ok(Some(emitted));
                    }
                }
                Token::StartArray => {
                    if let Some(emitted) =
                        self.enter_live_container(ContextKind::Array, Token::StartArray)?
                    {
                        return Ok(Some(emitted));
                    }
                }
                Token::EndObject | Token::EndArray => {
                    let is_object = matches!(token, Token::EndObject);
                    let return_end = self.head().is_start_handled();
                    if let Some(FilterHandle::Custom(filter)) = self.head().filter().cloned() {
                        let include_empty = if is_object {
                            filter.include_empty_array(self.head().has_current_name())
                        } else {
                            filter.include_empty_array(self.head().has_current_index())
                        };
                        if is_object {
                            filter.filter_finish_object();
                        } else {
                            filter.filter_finish_array();
                        }
                        if include_empty && !return_end {
                            let head = self.head_index();
                            return self.start_replay(head).map(Some);
                        }
                    }
                    self.pop_head();
                    if return_end {
                        return Ok(Some(token));
                    }
                }
                Token::PropertyName(name) => {
                    match self.head_mut().set_property_name(Arc::clone(&name)) {
                        Some(FilterHandle::IncludeAll) => {
                            self.item_filter = Some(FilterHandle::IncludeAll);
                            self.head_mut().mark_name_handled();
                            return Ok(Some(Token::PropertyName(name)));
                        }
                        None => {
                            self.head_mut().mark_name_handled();
                            self.source.next_token()?;
                            self.source.skip_children()?;
                        }
                        Some(FilterHandle::Custom(filter)) => {
                            match FilterHandle::resolved(&filter, filter.include_property(&name)) {
                                None => {
                                    self.head_mut().mark_name_handled();
                                    self.source.next_token()?;
                                    self.source.skip_children()?;
                                }
                                Some(FilterHandle::IncludeAll) => {
                                    self.item_filter = Some(FilterHandle::IncludeAll);
                                    if self.verify_allowed_match() {
                                        match self.inclusion {
                                            Inclusion::IncludeAllAndPath => {
                                                self.head_mut().mark_name_handled();
                                                return Ok(Some(Token::PropertyName(name)));
                                            }
                                            Inclusion::OnlyIncludeAll => {
                                                self.head_mut().mark_name_handled();
                                            }
                                            // Pending until a non-null value
                                            // confirms the name.
                                            Inclusion::IncludeNonNull => {}
                                        }
                                    } else {
                                        self.head_mut().mark_name_handled();
                                        self.source.next_token()?;
                                        self.source.skip_children()?;
                                    }
                                }
                                Some(handle) => {
                                    self.item_filter = Some(handle);
                                    if self.inclusion != Inclusion::OnlyIncludeAll {
                                        let root = self.head_index();
                                        if let Some(emitted) = self.next_buffered_token(root)? {
                                            return Ok(Some(emitted));
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
                Token::Scalar(value) => match self.item_filter.clone() {
                    Some(FilterHandle::IncludeAll) => {
                        if self.has_deferred_name() {
                            if value.is_null() {
                                self.head_mut().mark_name_handled();
                                continue;
                            }
                            let head = self.head_index();
                            return self.start_replay(head).map(Some);
                        }
                        return Ok(Some(Token::Scalar(value)));
                    }
                    Some(handle @ FilterHandle::Custom(_)) => {
                        let accepted = match self.head_mut().check_value(&handle) {
                            Some(FilterHandle::IncludeAll) => true,
                            Some(FilterHandle::Custom(custom)) => custom.include_value(&value),
                            None => false,
                        };
                        if accepted
                            && !(self.inclusion == Inclusion::IncludeNonNull && value.is_null())
                            && self.verify_allowed_match()
                        {
                            return Ok(Some(Token::Scalar(value)));
                        }
                    }
                    None => {}
                },
            }
        }
    }

    /// Buffered lookahead inside a tentatively-entered composite. Tokens are
    /// consumed without emission until a descendant resolves the subtree's
    /// fate; a positive resolution replays the suppressed path from
    /// `buffer_root` downward. Returns `None` once the buffer root closes
    /// without its start marker ever having been owed.
    fn next_buffered_token(
        &mut self,
        buffer_root: usize,
    ) -> Result<Option<Token>, TokenStreamError> {
        loop {
            let Some(token) = self.source.next_token()? else {
                return Ok(None);
            };
            match token {
                Token::StartObject | Token::StartArray => {
                    let kind = if matches!(token, Token::StartObject) {
                        ContextKind::Object
                    } else {
                        ContextKind::Array
                    };
                    match self.item_filter.clone() {
                        None => self.source.skip_children()?,
                        Some(FilterHandle::IncludeAll) => {
                            self.push_child(kind, Some(FilterHandle::IncludeAll), true);
                            return self.start_replay(buffer_root).map(Some);
                        }
                        Some(handle @ FilterHandle::Custom(_)) => {
                            if let Some(refined) = self.refine_start(kind, &handle)? {
                                match refined {
                                    Some(FilterHandle::IncludeAll) => {
                                        self.push_child(kind, Some(FilterHandle::IncludeAll), true);
                                        return self.start_replay(buffer_root).map(Some);
                                    }
                                    Some(custom)
                                        if self.inclusion == Inclusion::IncludeNonNull =>
                                    {
                                        self.push_child(ContextKind::Array, Some(custom), true);
                                        return self.start_replay(buffer_root).map(Some);
                                    }
                                    other => self.push_child(kind, other, false),
                                }
                            }
                        }
                    }
                }
                Token::EndObject | Token::EndArray => {
                    let is_object = matches!(token, Token::EndObject);
                    if let Some(FilterHandle::Custom(filter)) = self.head().filter().cloned() {
                        let include_empty = if is_object {
                            filter.include_empty_object(self.head().has_current_name())
                        } else {
                            filter.include_empty_array(self.head().has_current_index())
                        };
                        if is_object {
                            filter.filter_finish_object();
                        } else {
                            filter.filter_finish_array();
                        }
                        if include_empty {
                            return self.start_replay(buffer_root).map(Some);
                        }
                    }
                    let got_end = self.head_index() == buffer_root;
                    let return_end = got_end && self.head().is_start_handled();
                    self.pop_head();
                    if return_end {
                        return Ok(Some(token));
                    }
                    if got_end {
                        return Ok(None);
                    }
                }
                Token::PropertyName(name) => {
                    match self.head_mut().set_property_name(Arc::clone(&name)) {
                        Some(FilterHandle::IncludeAll) => {
                            self.item_filter = Some(FilterHandle::IncludeAll);
                            return self.start_replay(buffer_root).map(Some);
                        }
                        None => {
                            self.head_mut().mark_name_handled();
                            self.source.next_token()?;
                            self.source.skip_children()?;
                        }
                        Some(FilterHandle::Custom(filter)) => {
                            match FilterHandle::resolved(&filter, filter.include_property(&name)) {
                                None => {
                                    self.head_mut().mark_name_handled();
                                    self.source.next_token()?;
                                    self.source.skip_children()?;
                                }
                                Some(FilterHandle::IncludeAll) => {
                                    self.item_filter = Some(FilterHandle::IncludeAll);
                                    if self.verify_allowed_match() {
                                        return self.start_replay(buffer_root).map(Some);
                                    }
                                    // Denied by the budget: reseed so the value
                                    // is judged by this frame's filter instead
                                    // of the stale match.
                                    self.item_filter =
                                        self.head_mut().set_property_name(name);
                                }
                                Some(handle) => self.item_filter = Some(handle),
                            }
                        }
                    }
                }
                Token::Scalar(value) => match self.item_filter.clone() {
                    Some(FilterHandle::IncludeAll) => {
                        return self.start_replay(buffer_root).map(Some);
                    }
                    Some(handle @ FilterHandle::Custom(_)) => {
                        let accepted = match self.head_mut().check_value(&handle) {
                            Some(FilterHandle::IncludeAll) => true,
                            Some(FilterHandle::Custom(custom)) => custom.include_value(&value),
                            None => false,
                        };
                        if accepted
                            && !(self.inclusion == Inclusion::IncludeNonNull && value.is_null())
                            && self.verify_allowed_match()
                        {
                            return self.start_replay(buffer_root).map(Some);
                        }
                    }
                    None => {}
                },
            }
        }
    }

    fn enter_live_container(
        &mut self,
        kind: ContextKind,
        start: Token,
    ) -> Result<Option<Token>, TokenStreamError> {
        match self.item_filter.clone() {
            None => {
                self.source.skip_children()?;
                Ok(None)
            }
            Some(FilterHandle::IncludeAll) => {
                let deferred = self.has_deferred_name();
                let parent = self.head_index();
                self.push_child(kind, Some(FilterHandle::IncludeAll), true);
                if deferred {
                    return self.start_replay(parent).map(Some);
                }
                Ok(Some(start))
            }
            Some(handle @ FilterHandle::Custom(_)) => {
                let Some(refined) = self.refine_start(kind, &handle)? else {
                    return Ok(None);
                };
                match refined {
                    Some(FilterHandle::IncludeAll) => {
                        self.push_child(kind, Some(FilterHandle::IncludeAll), true);
                        Ok(Some(start))
                    }
                    Some(custom) if self.inclusion == Inclusion::IncludeNonNull => {
                        self.push_child(kind, Some(custom), true);
                        Ok(Some(start))
                    }
                    other => {
                        self.push_child(kind, other, false);
                        if self.inclusion == Inclusion::IncludeAllAndPath {
                            let root = self.head_index();
                            return self.next_buffered_token(root);
                        }
                        Ok(None)
                    }
                }
            }
        }
    }

    /// Refine the item filter for a container start: the element/value check
    /// first, then the start hook. The outer `None` means the subtree was
    /// skipped outright.
    fn refine_start(
        &mut self,
        kind: ContextKind,
        handle: &FilterHandle,
    ) -> Result<Option<Option<FilterHandle>>, TokenStreamError> {
        let Some(checked) = self.head_mut().check_value(handle) else {
            self.source.skip_children()?;
            return Ok(None);
        };
        let refined = match &checked {
            FilterHandle::IncludeAll => Some(FilterHandle::IncludeAll),
            FilterHandle::Custom(custom) => {
                let decision = match kind {
                    ContextKind::Object => custom.filter_start_object(),
                    _ => custom.filter_start_array(),
                };
                FilterHandle::resolved(custom, decision)
            }
        };
        self.item_filter = refined.clone();
        Ok(Some(refined))
    }

    /// Begin replaying suppressed path tokens from `buffer_root`, returning
    /// the first one. The exposure stays active so subsequent calls keep
    /// draining.
    fn start_replay(&mut self, buffer_root: usize) -> Result<Token, TokenStreamError> {
        let mut index = buffer_root;
        self.exposed = Some(index);
        loop {
            if let Some(token) = self.contexts[index].next_token_to_read() {
                return Ok(token);
            }
            if index == self.head_index() {
                return Err(TokenStreamError::MissingBufferedTokens);
            }
            index += 1;
            self.exposed = Some(index);
        }
    }

    /// Whether the head frame holds a matched property name whose emission
    /// awaits a non-null value.
    fn has_deferred_name(&self) -> bool {
        self.inclusion == Inclusion::IncludeNonNull
            && self.head().is_start_handled()
            && self.head().needs_name()
    }

    fn verify_allowed_match(&mut self) -> bool {
        if self.match_count == 0 || self.allow_multiple_matches {
            self.match_count += 1;
            true
        } else {
            false
        }
    }

    fn head(&self) -> &FilterContext {
        self.contexts.last().expect("context stack is never empty")
    }

    fn head_mut(&mut self) -> &mut FilterContext {
        self.contexts.last_mut().expect("context stack is never empty")
    }

    fn head_index(&self) -> usize {
        self.contexts.len() - 1
    }

    fn push_child(&mut self, kind: ContextKind, filter: Option<FilterHandle>, start_handled: bool) {
        self.contexts.push(FilterContext::child(kind, filter, start_handled));
    }

    fn pop_head(&mut self) {
        if self.contexts.len() > 1 {
            self.contexts.pop();
        }
        self.item_filter = self.head().filter().cloned();
    }
}

impl<S: TokenSource> FilteringCursor<S> {
    /// As [`next_token`](Self::next_token), stepping over a property name to
    /// its value.
    pub fn next_value(&mut self) -> Result<Option<Token>, TokenStreamError> {
        let token = self.next_token()?;
        if matches!(token, Some(Token::PropertyName(_))) {
            return self.next_token();
        }
        Ok(token)
    }

    /// If positioned at a start marker, consume filtered tokens through the
    /// matching end marker. Depth is counted locally: the upstream cursor may
    /// be at a different position than the consumer sees.
    pub fn skip_children(&mut self) -> Result<(), TokenStreamError> {
        if !self.current.as_ref().is_some_and(Token::is_struct_start) {
            return Ok(());
        }
        let mut depth = 1usize;
        while depth > 0 {
            match self.next_token()? {
                None => break,
                Some(token) if token.is_struct_start() => depth += 1,
                Some(token) if token.is_struct_end() => depth -= 1,
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Advance, returning the property name if the next token is one.
    pub fn next_name(&mut self) -> Result<Option<Arc<str>>, TokenStreamError> {
        Ok(match self.next_token()? {
            Some(Token::PropertyName(name)) => Some(name),
            _ => None,
        })
    }

    /// Advance, reporting whether the next token is the given property name.
    pub fn next_name_eq(&mut self, expected: &str) -> Result<bool, TokenStreamError> {
        Ok(self.next_name()?.as_deref() == Some(expected))
    }

    /// Advance, reporting which of `candidates` the next property name is.
    pub fn next_name_match(
        &mut self,
        candidates: &[&str],
    ) -> Result<Option<usize>, TokenStreamError> {
        let name = self.next_name()?;
        Ok(name.and_then(|name| candidates.iter().position(|c| *c == name.as_ref())))
    }

    pub fn current_token(&self) -> Option<&Token> {
        self.current.as_ref()
    }

    pub fn has_current_token(&self) -> bool {
        self.current.is_some()
    }

    pub fn current_token_kind(&self) -> Option<TokenKind> {
        self.current.as_ref().map(Token::kind)
    }

    pub fn has_token_kind(&self, kind: TokenKind) -> bool {
        self.current_token_kind() == Some(kind)
    }

    /// Null the current token, preserving it for `last_cleared_token`.
    pub fn clear_current_token(&mut self) {
        if let Some(token) = self.current.take() {
            self.last_cleared = Some(token);
        }
    }

    pub fn last_cleared_token(&self) -> Option<&Token> {
        self.last_cleared.as_ref()
    }

    /// Total number of filter acceptances counted against the match budget.
    pub fn match_count(&self) -> usize {
        self.match_count
    }

    /// The shadow frame the consumer is positioned in: the frame being
    /// drained during replay, the head otherwise.
    pub fn stream_read_context(&self) -> &FilterContext {
        let index = self.exposed.unwrap_or_else(|| self.head_index());
        &self.contexts[index]
    }

    /// The current property name per the shadow stack. For container-start
    /// tokens this is the enclosing frame's name.
    pub fn current_name(&self) -> Option<&str> {
        let index = self.exposed.unwrap_or_else(|| self.head_index());
        match self.current {
            Some(Token::StartObject | Token::StartArray) => index
                .checked_sub(1)
                .and_then(|parent| self.contexts[parent].current_name()),
            _ => self.contexts[index].current_name(),
        }
    }

    /// Changing the current name mid-filtering would desynchronize the shadow
    /// stack, so it is rejected.
    pub fn override_current_name(&mut self, _name: &str) -> Result<(), TokenStreamError> {
        Err(TokenStreamError::NameOverrideUnsupported)
    }

    /// Pointer to the value currently being processed, e.g. `/a/0/b`.
    pub fn path_pointer(&self) -> String {
        self.contexts
            .iter()
            .filter_map(FilterContext::path_segment)
            .map(|segment| format!("/{segment}"))
            .join("")
    }

    /// Textual payload of the current token. For a replayed property name the
    /// shadow stack is authoritative, since the upstream cursor may already
    /// have moved past it.
    pub fn text(&self) -> Option<Cow<'_, str>> {
        if matches!(self.current, Some(Token::PropertyName(_))) {
            return self.current_name().map(Cow::Borrowed);
        }
        self.source.text()
    }

    pub fn text_len(&self) -> Option<usize> {
        if matches!(self.current, Some(Token::PropertyName(_))) {
            return self.current_name().map(str::len);
        }
        self.source.text_len()
    }

    /// False for property names: their text may be synthesized from the
    /// shadow stack rather than backed by upstream characters.
    pub fn has_text_characters(&self) -> bool {
        if matches!(self.current, Some(Token::PropertyName(_))) {
            return false;
        }
        self.source.has_text_characters()
    }

    pub fn value_as_string(&self) -> Option<String> {
        if matches!(self.current, Some(Token::PropertyName(_))) {
            return self.current_name().map(str::to_owned);
        }
        self.source.value_as_string()
    }
}

impl<S: TokenSource> Iterator for FilteringCursor<S> {
    type Item = Result<Token, TokenStreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}

/// Filtering cursors are themselves token sources, so filters compose by
/// stacking cursors.
impl<S: TokenSource> TokenSource for FilteringCursor<S> {
    fn next_token(&mut self) -> Result<Option<Token>, TokenStreamError> {
        FilteringCursor::next_token(self)
    }

    fn current_token(&self) -> Option<&Token> {
        self.current.as_ref()
    }

    fn skip_children(&mut self) -> Result<(), TokenStreamError> {
        FilteringCursor::skip_children(self)
    }

    fn text(&self) -> Option<Cow<'_, str>> {
        FilteringCursor::text(self)
    }

    fn text_len(&self) -> Option<usize> {
        FilteringCursor::text_len(self)
    }

    fn has_text_characters(&self) -> bool {
        FilteringCursor::has_text_characters(self)
    }

    fn value_as_string(&self) -> Option<String> {
        FilteringCursor::value_as_string(self)
    }
}
