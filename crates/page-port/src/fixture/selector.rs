//! A small CSS selector engine for fixture pages.

use super::dom::FlatDom;
use crate::error::PageError;

#[derive(Clone, Debug, PartialEq)]
enum AttrOp {
    Exists,
    Equals(String),
    Prefix(String),
    Suffix(String),
    Contains(String),
}

#[derive(Clone, Debug, PartialEq)]
enum Pseudo {
    NthChild(usize),
    NthOfType(usize),
    FirstChild,
    LastChild,
}

#[derive(Clone, Debug, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attrs: Vec<(String, AttrOp)>,
    pseudos: Vec<Pseudo>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && self.ids.is_empty()
            && self.classes.is_empty()
            && self.attrs.is_empty()
            && self.pseudos.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Clone, Debug, PartialEq)]
struct Complex {
    compounds: Vec<Compound>,
    combinators: Vec<Combinator>,
}

/// A parsed selector list.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Selector {
    alternatives: Vec<Complex>,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self, PageError> {
        let mut parser = Parser {
            chars: input.chars().collect(),
            pos: 0,
            source: input,
        };
        let selector = parser.selector_list()?;
        Ok(selector)
    }

    pub fn matches(&self, dom: &FlatDom, idx: usize) -> bool {
        self.alternatives
            .iter()
            .any(|complex| match_at(dom, idx, complex, complex.compounds.len() - 1))
    }
}

fn match_at(dom: &FlatDom, idx: usize, complex: &Complex, part: usize) -> bool {
    if !compound_matches(dom, idx, &complex.compounds[part]) {
        return false;
    }
    if part == 0 {
        return true;
    }
    match complex.combinators[part - 1] {
        Combinator::Child => dom
            .node(idx)
            .parent
            .map(|parent| match_at(dom, parent, complex, part - 1))
            .unwrap_or(false),
        Combinator::Descendant => {
            let mut cursor = dom.node(idx).parent;
            while let Some(ancestor) = cursor {
                if match_at(dom, ancestor, complex, part - 1) {
                    return true;
                }
                cursor = dom.node(ancestor).parent;
            }
            false
        }
    }
}

fn compound_matches(dom: &FlatDom, idx: usize, compound: &Compound) -> bool {
    let node = dom.node(idx);
    if let Some(tag) = &compound.tag {
        if !tag.eq_ignore_ascii_case(&node.tag) {
            return false;
        }
    }
    if !compound
        .ids
        .iter()
        .all(|id| node.attr("id") == Some(id.as_str()))
    {
        return false;
    }
    if !compound
        .classes
        .iter()
        .all(|class| node.classes().any(|c| c == class))
    {
        return false;
    }
    for (name, op) in &compound.attrs {
        let Some(value) = node.attr(name) else {
            return false;
        };
        let ok = match op {
            AttrOp::Exists => true,
            AttrOp::Equals(expected) => value == expected,
            AttrOp::Prefix(expected) => !expected.is_empty() && value.starts_with(expected.as_str()),
            AttrOp::Suffix(expected) => !expected.is_empty() && value.ends_with(expected.as_str()),
            AttrOp::Contains(expected) => !expected.is_empty() && value.contains(expected.as_str()),
        };
        if !ok {
            return false;
        }
    }
    compound.pseudos.iter().all(|pseudo| {
        let siblings: Vec<usize> = match node.parent {
            Some(parent) => dom.node(parent).children.clone(),
            None => vec![idx],
        };
        match pseudo {
            Pseudo::NthChild(n) => siblings.iter().position(|s| *s == idx) == Some(n - 1),
            Pseudo::FirstChild => siblings.first() == Some(&idx),
            Pseudo::LastChild => siblings.last() == Some(&idx),
            Pseudo::NthOfType(n) => siblings
                .iter()
                .filter(|s| dom.node(**s).tag == node.tag)
                .position(|s| *s == idx)
                == Some(n - 1),
        }
    })
}

struct Parser<'a> {
    chars: Vec<char>,
    pos: usize,
    source: &'a str,
}

impl<'a> Parser<'a> {
    fn error(&self, reason: &str) -> PageError {
        PageError::invalid_query(format!(
            "'{}' is not a valid selector: {} at offset {}",
            self.source, reason, self.pos
        ))
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn selector_list(&mut self) -> Result<Selector, PageError> {
        let mut alternatives = Vec::new();
        loop {
            self.skip_ws();
            alternatives.push(self.complex()?);
            self.skip_ws();
            match self.peek() {
                None => break,
                Some(',') => self.pos += 1,
                Some(_) => return Err(self.error("unexpected character")),
            }
        }
        Ok(Selector { alternatives })
    }

    fn complex(&mut self) -> Result<Complex, PageError> {
        let mut compounds = vec![self.compound()?];
        let mut combinators = Vec::new();
        loop {
            let had_ws = self.skip_ws();
            match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.pos += 1;
                    self.skip_ws();
                    combinators.push(Combinator::Child);
                }
                Some(_) if had_ws => combinators.push(Combinator::Descendant),
                Some(_) => return Err(self.error("unexpected character")),
            }
            compounds.push(self.compound()?);
        }
        Ok(Complex {
            compounds,
            combinators,
        })
    }

    fn compound(&mut self) -> Result<Compound, PageError> {
        let mut compound = Compound::default();
        match self.peek() {
            Some('*') => {
                self.pos += 1;
                return self.compound_tail(compound, true);
            }
            Some(c) if is_ident_start(c) => {
                compound.tag = Some(self.ident()?.to_ascii_lowercase());
            }
            _ => {}
        }
        self.compound_tail(compound, false)
    }

    fn compound_tail(&mut self, mut compound: Compound, universal: bool) -> Result<Compound, PageError> {
        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.ids.push(self.ident()?);
                }
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.ident()?);
                }
                Some('[') => {
                    self.pos += 1;
                    let attr = self.attribute()?;
                    compound.attrs.push(attr);
                }
                Some(':') => {
                    self.pos += 1;
                    let pseudo = self.pseudo()?;
                    compound.pseudos.push(pseudo);
                }
                _ => break,
            }
        }
        if compound.is_empty() && !universal {
            return Err(self.error("expected a simple selector"));
        }
        Ok(compound)
    }

    fn attribute(&mut self) -> Result<(String, AttrOp), PageError> {
        self.skip_ws();
        let name = self.ident()?.to_ascii_lowercase();
        self.skip_ws();
        let op = match self.peek() {
            Some(']') => {
                self.pos += 1;
                return Ok((name, AttrOp::Exists));
            }
            Some('=') => {
                self.pos += 1;
                "="
            }
            Some(c @ ('^' | '$' | '*')) if self.chars.get(self.pos + 1) == Some(&'=') => {
                self.pos += 2;
                match c {
                    '^' => "^=",
                    '$' => "$=",
                    _ => "*=",
                }
            }
            _ => return Err(self.error("malformed attribute selector")),
        };
        self.skip_ws();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let mut value = String::new();
                loop {
                    match self.peek() {
                        None => return Err(self.error("unterminated string")),
                        Some(c) if c == quote => {
                            self.pos += 1;
                            break;
                        }
                        Some('\\') => value.push(self.escape()?),
                        Some(c) => {
                            value.push(c);
                            self.pos += 1;
                        }
                    }
                }
                value
            }
            _ => self.ident()?,
        };
        self.skip_ws();
        if self.peek() != Some(']') {
            return Err(self.error("expected ']'"));
        }
        self.pos += 1;
        let op = match op {
            "=" => AttrOp::Equals(value),
            "^=" => AttrOp::Prefix(value),
            "$=" => AttrOp::Suffix(value),
            _ => AttrOp::Contains(value),
        };
        Ok((name, op))
    }

    fn pseudo(&mut self) -> Result<Pseudo, PageError> {
        let name = self.ident()?.to_ascii_lowercase();
        match name.as_str() {
            "first-child" => Ok(Pseudo::FirstChild),
            "last-child" => Ok(Pseudo::LastChild),
            "nth-child" | "nth-of-type" => {
                if self.peek() != Some('(') {
                    return Err(self.error("expected '('"));
                }
                self.pos += 1;
                self.skip_ws();
                let start = self.pos;
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.pos += 1;
                }
                let digits: String = self.chars[start..self.pos].iter().collect();
                self.skip_ws();
                if self.peek() != Some(')') {
                    return Err(self.error("unsupported nth expression"));
                }
                self.pos += 1;
                let n: usize = digits
                    .parse()
                    .map_err(|_| self.error("expected an index"))?;
                if n == 0 {
                    return Err(self.error("nth index must be positive"));
                }
                Ok(if name == "nth-child" {
                    Pseudo::NthChild(n)
                } else {
                    Pseudo::NthOfType(n)
                })
            }
            _ => Err(self.error("unsupported pseudo-class")),
        }
    }

    fn ident(&mut self) -> Result<String, PageError> {
        let mut out = String::new();
        loop {
            match self.peek() {
                Some('\\') => out.push(self.escape()?),
                Some(c) if is_ident_char(c) => {
                    out.push(c);
                    self.pos += 1;
                }
                _ => break,
            }
        }
        if out.is_empty() {
            return Err(self.error("expected an identifier"));
        }
        Ok(out)
    }

    /// Consume a backslash escape and return the character it denotes.
    fn escape(&mut self) -> Result<char, PageError> {
        self.pos += 1;
        let start = self.pos;
        while self.pos - start < 6 && matches!(self.peek(), Some(c) if c.is_ascii_hexdigit()) {
            self.pos += 1;
        }
        if self.pos > start {
            let hex: String = self.chars[start..self.pos].iter().collect();
            if matches!(self.peek(), Some(c) if c.is_whitespace()) {
                self.pos += 1;
            }
            let code = u32::from_str_radix(&hex, 16).map_err(|_| self.error("bad escape"))?;
            return Ok(char::from_u32(code).unwrap_or('\u{FFFD}'));
        }
        match self.peek() {
            Some(c) => {
                self.pos += 1;
                Ok(c)
            }
            None => Err(self.error("dangling escape")),
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-' || c == '\\' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::dom::{DomNode, FixtureDocument};

    fn dom() -> FlatDom {
        let doc = FixtureDocument::from_body(
            "https://example.com",
            DomNode::element("body")
                .child(
                    DomNode::element("ul")
                        .attr("class", "menu main")
                        .child(DomNode::element("li").text("a"))
                        .child(DomNode::element("li").attr("data-k", "two").text("b")),
                )
                .child(DomNode::element("p").attr("id", "123").text("digits")),
        );
        FlatDom::from_root(&doc.root)
    }

    fn select(dom: &FlatDom, selector: &str) -> Vec<usize> {
        let parsed = Selector::parse(selector).unwrap();
        (0..dom.len()).filter(|idx| parsed.matches(dom, *idx)).collect()
    }

    #[test]
    fn matches_compounds_and_combinators() {
        let dom = dom();
        assert_eq!(select(&dom, "li").len(), 2);
        assert_eq!(select(&dom, "ul.menu > li:nth-child(2)").len(), 1);
        assert_eq!(select(&dom, "html body li[data-k=\"two\"]").len(), 1);
        assert_eq!(select(&dom, "body > li").len(), 0);
        assert_eq!(select(&dom, "li:first-child, p").len(), 2);
        assert_eq!(select(&dom, "*").len(), dom.len());
    }

    #[test]
    fn resolves_escaped_identifiers() {
        let dom = dom();
        assert_eq!(select(&dom, "#\\31 23").len(), 1);
    }

    #[test]
    fn rejects_malformed_selectors() {
        for bad in ["", "div >", "[id", "p:hover", "div{", "#", "li:nth-child(0)"] {
            let err = Selector::parse(bad).unwrap_err();
            assert!(err.is_invalid_query(), "{bad} should be invalid");
        }
    }
}
