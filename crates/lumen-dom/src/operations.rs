//! DOM Node Operations
//!
//! Core node manipulation: appendChild, removeChild, insertBefore,
//! replaceChild, cloneNode, normalize.

use std::str::FromStr;

use crate::NodeId;

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors, named after the DOMException they model
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// Reference node is not where the caller said it is
    #[error("NotFoundError: {0}")]
    NotFound(&'static str),

    /// Insertion would produce an invalid tree
    #[error("HierarchyRequestError: {0}")]
    HierarchyRequest(&'static str),

    /// Structurally fixed element or read-only destination
    #[error("NoModificationAllowedError: {0}")]
    NoModificationAllowed(String),

    /// Operation needs state the node does not have (e.g. a parent)
    #[error("InvalidStateError: {0}")]
    InvalidState(&'static str),

    /// Unparseable argument (position keyword, selector)
    #[error("SyntaxError: {0}")]
    Syntax(String),

    /// Name is not a valid element/attribute name
    #[error("InvalidCharacterError: {0:?} is not a valid name")]
    InvalidCharacter(String),

    /// Prefix/namespace combination is not allowed
    #[error("NamespaceError: {0}")]
    Namespace(String),

    /// Handle does not address a node of this document
    #[error("invalid node {0}")]
    InvalidNode(NodeId),

    /// Node exists but has the wrong kind for this operation
    #[error("node {0} has the wrong type for this operation")]
    WrongNodeType(NodeId),
}

/// Node operations trait
pub trait NodeOperations {
    /// Append a child node
    fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId>;

    /// Remove a child node
    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId>;

    /// Insert before a reference node; `None` appends
    fn insert_before(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        ref_child: Option<NodeId>,
    ) -> DomResult<NodeId>;

    /// Replace a child with another node, returning the old child
    fn replace_child(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> DomResult<NodeId>;

    /// Clone a node
    fn clone_node(&mut self, node: NodeId, deep: bool) -> DomResult<NodeId>;

    /// Normalize text nodes (merge adjacent, drop empty)
    fn normalize(&mut self, node: NodeId) -> DomResult<()>;
}

/// `insertAdjacent*` position keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjacentPosition {
    BeforeBegin,
    AfterBegin,
    BeforeEnd,
    AfterEnd,
}

impl AdjacentPosition {
    /// Positions that insert into the target's parent
    pub fn needs_parent(self) -> bool {
        matches!(self, Self::BeforeBegin | Self::AfterEnd)
    }
}

impl FromStr for AdjacentPosition {
    type Err = DomError;

    /// Case-insensitive, as browsers accept `BeforeEnd` and `BEFOREEND`
    fn from_str(s: &str) -> DomResult<Self> {
        if s.eq_ignore_ascii_case("beforebegin") {
            Ok(Self::BeforeBegin)
        } else if s.eq_ignore_ascii_case("afterbegin") {
            Ok(Self::AfterBegin)
        } else if s.eq_ignore_ascii_case("beforeend") {
            Ok(Self::BeforeEnd)
        } else if s.eq_ignore_ascii_case("afterend") {
            Ok(Self::AfterEnd)
        } else {
            Err(DomError::Syntax(format!("invalid position {s:?}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_case_insensitive() {
        assert_eq!("beforeBegin".parse(), Ok(AdjacentPosition::BeforeBegin));
        assert_eq!("AFTERBEGIN".parse(), Ok(AdjacentPosition::AfterBegin));
        assert_eq!("BeforeEnd".parse(), Ok(AdjacentPosition::BeforeEnd));
        assert_eq!("afterend".parse(), Ok(AdjacentPosition::AfterEnd));
    }

    #[test]
    fn test_position_rejects_unknown() {
        let err = "middle".parse::<AdjacentPosition>().unwrap_err();
        assert!(matches!(err, DomError::Syntax(_)));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            DomError::NotFound("not a child").to_string(),
            "NotFoundError: not a child"
        );
        assert!(DomError::InvalidCharacter("a b".into())
            .to_string()
            .starts_with("InvalidCharacterError"));
    }
}
