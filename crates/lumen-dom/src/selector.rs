//! Selector engine for `querySelector`/`querySelectorAll`
//!
//! Supports type, universal, id, class and attribute selectors, the
//! structural pseudo-classes `:first-child`, `:last-child`, `:only-child`,
//! `:empty` and `:not(...)`, the four combinators and selector lists.
//! Matching runs right to left with backtracking.

use crate::classlist::split_tokens;
use crate::node::{ElementData, NodeData};
use crate::operations::{DomError, DomResult};
use crate::tree::DomTree;
use crate::NodeId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AttrCondition {
    Exists { key: String },
    Eq { key: String, value: String },
    StartsWith { key: String, value: String },
    EndsWith { key: String, value: String },
    Contains { key: String, value: String },
    Includes { key: String, value: String },
    DashMatch { key: String, value: String },
}

impl AttrCondition {
    fn key(&self) -> &str {
        match self {
            Self::Exists { key }
            | Self::Eq { key, .. }
            | Self::StartsWith { key, .. }
            | Self::EndsWith { key, .. }
            | Self::Contains { key, .. }
            | Self::Includes { key, .. }
            | Self::DashMatch { key, .. } => key,
        }
    }

    fn matches(&self, actual: &str) -> bool {
        match self {
            Self::Exists { .. } => true,
            Self::Eq { value, .. } => actual == value,
            Self::StartsWith { value, .. } => !value.is_empty() && actual.starts_with(value.as_str()),
            Self::EndsWith { value, .. } => !value.is_empty() && actual.ends_with(value.as_str()),
            Self::Contains { value, .. } => !value.is_empty() && actual.contains(value.as_str()),
            Self::Includes { value, .. } => split_tokens(actual).any(|t| t == value),
            Self::DashMatch { value, .. } => {
                actual == value
                    || actual
                        .strip_prefix(value.as_str())
                        .is_some_and(|rest| rest.starts_with('-'))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PseudoClass {
    FirstChild,
    LastChild,
    OnlyChild,
    Empty,
    Not(SelectorList),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrCondition>,
    pseudo_classes: Vec<PseudoClass>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attrs.is_empty()
            && self.pseudo_classes.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Combinator {
    Descendant,
    Child,
    AdjacentSibling,
    GeneralSibling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Part {
    compound: Compound,
    // Relation to the part on the left
    combinator: Option<Combinator>,
}

/// Parsed, comma-separated selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SelectorList {
    groups: Vec<Vec<Part>>,
}

struct Cursor<'a> {
    src: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn error(&self) -> DomError {
        DomError::Syntax(format!("'{}' is not a valid selector", self.src))
    }

    fn ident(&mut self) -> DomResult<String> {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.pos += 1;
                out.push(self.bump().ok_or_else(|| self.error())?);
            } else if c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() {
                out.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        if out.is_empty() || out == "-" || out.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(self.error());
        }
        Ok(out)
    }

    fn attr_value(&mut self) -> DomResult<String> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let mut out = String::new();
                loop {
                    match self.bump() {
                        Some('\\') => out.push(self.bump().ok_or_else(|| self.error())?),
                        Some(c) if c == quote => return Ok(out),
                        Some(c) => out.push(c),
                        None => return Err(self.error()),
                    }
                }
            }
            _ => self.ident(),
        }
    }
}

impl SelectorList {
    pub(crate) fn parse(selector: &str) -> DomResult<Self> {
        let mut cursor = Cursor::new(selector);
        let list = Self::parse_list(&mut cursor)?;
        if cursor.peek().is_some() {
            return Err(cursor.error());
        }
        Ok(list)
    }

    fn parse_list(cursor: &mut Cursor<'_>) -> DomResult<Self> {
        let mut groups = Vec::new();
        loop {
            cursor.skip_whitespace();
            groups.push(parse_complex(cursor)?);
            cursor.skip_whitespace();
            if !cursor.eat(',') {
                break;
            }
        }
        Ok(Self { groups })
    }

    /// Whether element `id` matches any selector in the list
    pub(crate) fn matches(&self, tree: &DomTree, id: NodeId, quirks: bool) -> bool {
        self.groups
            .iter()
            .any(|parts| match_part(tree, id, parts, parts.len() - 1, quirks))
    }
}

fn parse_complex(cursor: &mut Cursor<'_>) -> DomResult<Vec<Part>> {
    let mut parts = Vec::new();
    let mut combinator = None;
    loop {
        let compound = parse_compound(cursor)?;
        parts.push(Part {
            compound,
            combinator,
        });

        let had_space = cursor.skip_whitespace();
        combinator = match cursor.peek() {
            Some('>') => Some(Combinator::Child),
            Some('+') => Some(Combinator::AdjacentSibling),
            Some('~') => Some(Combinator::GeneralSibling),
            Some(',') | Some(')') | None => return Ok(parts),
            Some(_) if had_space => {
                combinator = Some(Combinator::Descendant);
                continue;
            }
            Some(_) => return Err(cursor.error()),
        };
        cursor.pos += 1;
        cursor.skip_whitespace();
    }
}

fn parse_compound(cursor: &mut Cursor<'_>) -> DomResult<Compound> {
    let mut compound = Compound::default();
    let mut universal = false;

    if cursor.eat('*') {
        universal = true;
    } else if cursor
        .peek()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '\\' || !c.is_ascii())
    {
        compound.tag = Some(cursor.ident()?);
    }

    loop {
        match cursor.peek() {
            Some('#') => {
                cursor.pos += 1;
                compound.id = Some(cursor.ident()?);
            }
            Some('.') => {
                cursor.pos += 1;
                compound.classes.push(cursor.ident()?);
            }
            Some('[') => {
                cursor.pos += 1;
                compound.attrs.push(parse_attr(cursor)?);
            }
            Some(':') => {
                cursor.pos += 1;
                compound.pseudo_classes.push(parse_pseudo(cursor)?);
            }
            _ => break,
        }
    }

    if compound.is_empty() && !universal {
        return Err(cursor.error());
    }
    Ok(compound)
}

fn parse_attr(cursor: &mut Cursor<'_>) -> DomResult<AttrCondition> {
    cursor.skip_whitespace();
    let key = cursor.ident()?.to_ascii_lowercase();
    cursor.skip_whitespace();
    if cursor.eat(']') {
        return Ok(AttrCondition::Exists { key });
    }

    let op = match cursor.bump() {
        Some('=') => '=',
        Some(c @ ('^' | '$' | '*' | '~' | '|')) if cursor.eat('=') => c,
        _ => return Err(cursor.error()),
    };
    cursor.skip_whitespace();
    let value = cursor.attr_value()?;
    cursor.skip_whitespace();
    if !cursor.eat(']') {
        return Err(cursor.error());
    }

    Ok(match op {
        '^' => AttrCondition::StartsWith { key, value },
        '$' => AttrCondition::EndsWith { key, value },
        '*' => AttrCondition::Contains { key, value },
        '~' => AttrCondition::Includes { key, value },
        '|' => AttrCondition::DashMatch { key, value },
        _ => AttrCondition::Eq { key, value },
    })
}

fn parse_pseudo(cursor: &mut Cursor<'_>) -> DomResult<PseudoClass> {
    let name = cursor.ident()?.to_ascii_lowercase();
    match name.as_str() {
        "first-child" => Ok(PseudoClass::FirstChild),
        "last-child" => Ok(PseudoClass::LastChild),
        "only-child" => Ok(PseudoClass::OnlyChild),
        "empty" => Ok(PseudoClass::Empty),
        "not" => {
            if !cursor.eat('(') {
                return Err(cursor.error());
            }
            let inner = SelectorList::parse_list(cursor)?;
            if !cursor.eat(')') {
                return Err(cursor.error());
            }
            Ok(PseudoClass::Not(inner))
        }
        _ => Err(cursor.error()),
    }
}

fn parent_element(tree: &DomTree, id: NodeId) -> Option<NodeId> {
    tree.parent(id).filter(|&p| tree.element(p).is_some())
}

fn element_siblings(tree: &DomTree, id: NodeId) -> (Vec<NodeId>, Option<usize>) {
    let Some(parent) = tree.parent(id) else {
        return (vec![id], Some(0));
    };
    let siblings: Vec<NodeId> = tree
        .children(parent)
        .iter()
        .copied()
        .filter(|&c| tree.element(c).is_some())
        .collect();
    let index = siblings.iter().position(|&c| c == id);
    (siblings, index)
}

fn match_compound(tree: &DomTree, id: NodeId, elem: &ElementData, compound: &Compound, quirks: bool) -> bool {
    if let Some(tag) = &compound.tag {
        let same = if elem.is_html() {
            elem.local_name().eq_ignore_ascii_case(tag)
        } else {
            elem.local_name() == tag
        };
        if !same {
            return false;
        }
    }

    if let Some(want) = &compound.id {
        if elem.get_attr_local("id") != Some(want.as_str()) {
            return false;
        }
    }

    if !compound.classes.is_empty() {
        let Some(class) = elem.get_attr_local("class") else {
            return false;
        };
        let ok = compound.classes.iter().all(|want| {
            split_tokens(class).any(|have| {
                if quirks {
                    have.eq_ignore_ascii_case(want)
                } else {
                    have == want
                }
            })
        });
        if !ok {
            return false;
        }
    }

    for cond in &compound.attrs {
        let actual = if elem.is_html() {
            elem.attrs()
                .iter()
                .find(|a| a.name().eq_ignore_ascii_case(cond.key()))
                .map(|a| a.value.as_str())
        } else {
            elem.get_attr(cond.key())
        };
        if !actual.is_some_and(|v| cond.matches(v)) {
            return false;
        }
    }

    compound.pseudo_classes.iter().all(|pseudo| match pseudo {
        PseudoClass::FirstChild => element_siblings(tree, id).1 == Some(0),
        PseudoClass::LastChild => {
            let (siblings, index) = element_siblings(tree, id);
            index.is_some_and(|i| i + 1 == siblings.len())
        }
        PseudoClass::OnlyChild => element_siblings(tree, id).0.len() == 1,
        PseudoClass::Empty => tree.children(id).iter().all(|&c| {
            match tree.get(c).map(|n| n.data()) {
                Some(NodeData::Text(t)) => t.is_empty(),
                Some(NodeData::Comment(_)) => true,
                _ => false,
            }
        }),
        PseudoClass::Not(inner) => !inner.matches(tree, id, quirks),
    })
}

fn match_part(tree: &DomTree, id: NodeId, parts: &[Part], index: usize, quirks: bool) -> bool {
    let Some(elem) = tree.element(id) else {
        return false;
    };
    let part = &parts[index];
    if !match_compound(tree, id, elem, &part.compound, quirks) {
        return false;
    }
    let Some(combinator) = part.combinator else {
        return true;
    };
    let prev = index - 1;

    match combinator {
        Combinator::Child => {
            parent_element(tree, id).is_some_and(|p| match_part(tree, p, parts, prev, quirks))
        }
        Combinator::Descendant => {
            let mut current = parent_element(tree, id);
            while let Some(ancestor) = current {
                if match_part(tree, ancestor, parts, prev, quirks) {
                    return true;
                }
                current = parent_element(tree, ancestor);
            }
            false
        }
        Combinator::AdjacentSibling => {
            let (siblings, index) = element_siblings(tree, id);
            index
                .and_then(|i| i.checked_sub(1))
                .is_some_and(|i| match_part(tree, siblings[i], parts, prev, quirks))
        }
        Combinator::GeneralSibling => {
            let (siblings, index) = element_siblings(tree, id);
            siblings[..index.unwrap_or(0)]
                .iter()
                .any(|&s| match_part(tree, s, parts, prev, quirks))
        }
    }
}
