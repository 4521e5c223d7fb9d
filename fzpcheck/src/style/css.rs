//! Minimal CSS support for SVG stylesheets
//!
//! Parses `<style>` blocks and inline `style` attributes into declarations and
//! matches simple selectors against an element's ancestor path. Supported
//! selector syntax: `*`, type, `.class`, `#id`, compounds of those, and the
//! descendant (` `) and child (`>`) combinators. A selector using anything
//! else (attribute selectors, pseudo-classes, sibling combinators) never
//! matches.

use crate::parser::{Document, Element};

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

/// Parse a declaration block such as `fill: red; stroke-width: 2 !important`.
pub fn parse_declarations(block: &str) -> Vec<Declaration> {
    block
        .split(';')
        .filter_map(|item| {
            let (property, value) = item.split_once(':')?;
            let property = property.trim().to_ascii_lowercase();
            let mut value = value.trim();
            if property.is_empty() || value.is_empty() {
                return None;
            }
            let mut important = false;
            if let Some(idx) = value.to_ascii_lowercase().rfind("!important") {
                important = true;
                value = value[..idx].trim_end();
            }
            Some(Declaration {
                property,
                value: value.to_string(),
                important,
            })
        })
        .collect()
}

/// (id selectors, class selectors, type selectors)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Specificity(pub u32, pub u32, pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Compound {
    fn parse(token: &str) -> Option<Self> {
        let mut compound = Compound::default();
        let mut chars = token.chars().peekable();

        if chars.peek() == Some(&'*') {
            chars.next();
        } else {
            let tag = take_ident(&mut chars);
            if !tag.is_empty() {
                compound.tag = Some(tag);
            }
        }

        while let Some(ch) = chars.next() {
            let ident = take_ident(&mut chars);
            if ident.is_empty() {
                return None;
            }
            match ch {
                '.' => compound.classes.push(ident),
                '#' => compound.id = Some(ident),
                _ => return None,
            }
        }
        Some(compound)
    }

    fn specificity(&self) -> Specificity {
        Specificity(
            self.id.is_some() as u32,
            self.classes.len() as u32,
            self.tag.is_some() as u32,
        )
    }

    fn matches(&self, element: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if element.name != *tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.id() != Some(id.as_str()) {
                return false;
            }
        }
        if self.classes.is_empty() {
            return true;
        }
        let classes: Vec<&str> = element
            .attr("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default();
        self.classes.iter().all(|c| classes.contains(&c.as_str()))
    }
}

fn take_ident(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut ident = String::new();
    while let Some(&ch) = chars.peek() {
        if ch.is_alphanumeric() || ch == '-' || ch == '_' || !ch.is_ascii() {
            ident.push(ch);
            chars.next();
        } else {
            break;
        }
    }
    ident
}

/// One complex selector. Each part stores the combinator linking it to the
/// part on its left; the rightmost part is the subject.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    parts: Vec<(Combinator, Compound)>,
}

impl Selector {
    pub fn parse(text: &str) -> Option<Self> {
        let spaced = text.replace('>', " > ");
        let mut parts = Vec::new();
        let mut pending = Combinator::Descendant;
        for token in spaced.split_whitespace() {
            if token == ">" {
                if parts.is_empty() {
                    return None;
                }
                pending = Combinator::Child;
                continue;
            }
            parts.push((pending, Compound::parse(token)?));
            pending = Combinator::Descendant;
        }
        if parts.is_empty() || pending == Combinator::Child {
            return None;
        }
        Some(Self { parts })
    }

    pub fn specificity(&self) -> Specificity {
        self.parts
            .iter()
            .map(|(_, c)| c.specificity())
            .fold(Specificity::default(), |acc, s| {
                Specificity(acc.0 + s.0, acc.1 + s.1, acc.2 + s.2)
            })
    }

    /// `path` runs from the document root to the subject element.
    pub fn matches(&self, path: &[&Element]) -> bool {
        let Some(((link, subject_part), left)) = self.parts.split_last() else {
            return false;
        };
        let Some((subject, ancestors)) = path.split_last() else {
            return false;
        };
        subject_part.matches(subject) && match_left(left, *link, ancestors)
    }
}

fn match_left(parts: &[(Combinator, Compound)], link: Combinator, ancestors: &[&Element]) -> bool {
    let Some(((next_link, compound), rest)) = parts.split_last() else {
        return true;
    };
    match link {
        Combinator::Child => match ancestors.split_last() {
            Some((parent, above)) => {
                compound.matches(parent) && match_left(rest, *next_link, above)
            }
            None => false,
        },
        Combinator::Descendant => (0..ancestors.len()).rev().any(|i| {
            compound.matches(ancestors[i]) && match_left(rest, *next_link, &ancestors[..i])
        }),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyleRule {
    pub selectors: Vec<Selector>,
    pub declarations: Vec<Declaration>,
}

/// Matched declaration with the data needed to order it in the cascade.
#[derive(Debug, Clone, Copy)]
pub struct MatchedDeclaration<'a> {
    pub specificity: Specificity,
    pub order: usize,
    pub declaration: &'a Declaration,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleSheet {
    rules: Vec<StyleRule>,
}

impl StyleSheet {
    pub fn parse(css: &str) -> Self {
        let css = strip_comments(css);
        let mut rules = Vec::new();
        let mut rest = css.as_str();

        loop {
            rest = rest.trim_start();
            if rest.is_empty() {
                break;
            }
            let Some(open) = rest.find('{') else {
                break;
            };
            // Statement at-rules (`@import ...;`) have no block.
            if rest.starts_with('@') {
                if let Some(semi) = rest.find(';').filter(|&s| s < open) {
                    rest = &rest[semi + 1..];
                    continue;
                }
            }
            let Some(close) = matching_brace(rest, open) else {
                break;
            };
            let prelude = rest[..open].trim();
            if !prelude.starts_with('@') {
                let selectors: Vec<Selector> =
                    prelude.split(',').filter_map(Selector::parse).collect();
                if !selectors.is_empty() {
                    rules.push(StyleRule {
                        selectors,
                        declarations: parse_declarations(&rest[open + 1..close]),
                    });
                }
            }
            rest = &rest[close + 1..];
        }

        Self { rules }
    }

    /// Concatenated sheet of every `<style>` element, in document order.
    pub fn from_document(doc: &Document) -> Self {
        let mut rules = Vec::new();
        for style in doc.descendants().filter(|e| e.has_tag("style")) {
            if let Some(text) = &style.text {
                rules.extend(Self::parse(text).rules);
            }
        }
        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[StyleRule] {
        &self.rules
    }

    /// Every declaration whose rule matches the last element of `path`.
    pub fn matching(&self, path: &[&Element]) -> Vec<MatchedDeclaration<'_>> {
        let mut matched = Vec::new();
        let mut order = 0;
        for rule in &self.rules {
            let best = rule
                .selectors
                .iter()
                .filter(|s| s.matches(path))
                .map(Selector::specificity)
                .max();
            if let Some(specificity) = best {
                for declaration in &rule.declarations {
                    matched.push(MatchedDeclaration {
                        specificity,
                        order,
                        declaration,
                    });
                    order += 1;
                }
            } else {
                order += rule.declarations.len();
            }
        }
        matched
    }
}

fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

fn matching_brace(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, ch) in text[open..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}
