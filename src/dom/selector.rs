//! Compiled selectors and the process-wide compile cache.
//!
//! The pipeline addresses nodes with a small selector grammar (type,
//! `[attr]`, `[attr^=v]`, `[class~=v]`, `:empty`, `:only-child`, descendant
//! and child combinators, comma alternation). Parsing is delegated to the
//! `selectors` crate; matching walks the arena in document order.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock, RwLock};

use cssparser::{Parser, ParserInput};
use selectors::context::{MatchingContext, SelectorCaches};
use selectors::matching::{MatchingForInvalidation, MatchingMode, NeedsSelectorFlags};
use selectors::parser::{ParseRelative, SelectorList};

use super::arena::{Dom, NodeId};
use super::element_ref::{DocSelectors, ElementRef};
use crate::error::{Error, Result};

/// A compiled, reusable selector list.
#[derive(Clone)]
pub struct Selector {
    pattern: String,
    selectors: Vec<selectors::parser::Selector<DocSelectors>>,
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Selector").field(&self.pattern).finish()
    }
}

impl Selector {
    /// Compile a selector pattern.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Selector`] when the pattern is empty or malformed.
    pub fn compile(pattern: &str) -> Result<Self> {
        let mut input = ParserInput::new(pattern);
        let mut parser = Parser::new(&mut input);
        let list = SelectorList::parse(&DocSelectors, &mut parser, ParseRelative::No).map_err(
            |e| Error::Selector {
                pattern: pattern.to_string(),
                message: format!("{:?} at column {}", e.kind, e.location.column),
            },
        )?;

        Ok(Self {
            pattern: pattern.to_string(),
            selectors: list.slice().to_vec(),
        })
    }

    /// The source pattern.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Check whether a single node matches.
    pub fn matches(&self, dom: &Dom, id: NodeId) -> bool {
        let mut caches = SelectorCaches::default();
        self.matches_with(dom, id, &mut caches)
    }

    fn matches_with(&self, dom: &Dom, id: NodeId, caches: &mut SelectorCaches) -> bool {
        if !dom.is_element(id) {
            return false;
        }
        let element = ElementRef::new(dom, id);
        let mut context = MatchingContext::new(
            MatchingMode::Normal,
            None,
            caches,
            selectors::context::QuirksMode::NoQuirks,
            NeedsSelectorFlags::No,
            MatchingForInvalidation::No,
        );
        self.selectors.iter().any(|selector| {
            selectors::matching::matches_selector(selector, 0, None, &element, &mut context)
        })
    }

    /// Every matching node at or below `root`, in document order.
    ///
    /// The result is a snapshot: callers may mutate the tree while walking it.
    pub fn match_all(&self, dom: &Dom, root: NodeId) -> Vec<NodeId> {
        let mut caches = SelectorCaches::default();
        dom.descendants(root)
            .filter(|&id| self.matches_with(dom, id, &mut caches))
            .collect()
    }

    /// First matching node at or below `root` in document order.
    pub fn match_first(&self, dom: &Dom, root: NodeId) -> Option<NodeId> {
        let mut caches = SelectorCaches::default();
        dom.descendants(root)
            .find(|&id| self.matches_with(dom, id, &mut caches))
    }
}

static CACHE: LazyLock<RwLock<HashMap<String, Arc<Selector>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Compile a pattern once per process and hand out shared copies.
///
/// Concurrent callers asking for the same pattern all receive the same
/// compiled instance.
pub fn cached(pattern: &str) -> Result<Arc<Selector>> {
    if let Ok(cache) = CACHE.read()
        && let Some(hit) = cache.get(pattern)
    {
        return Ok(Arc::clone(hit));
    }

    let mut cache = CACHE.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(hit) = cache.get(pattern) {
        return Ok(Arc::clone(hit));
    }
    let compiled = Arc::new(Selector::compile(pattern)?);
    cache.insert(pattern.to_string(), Arc::clone(&compiled));
    Ok(compiled)
}
