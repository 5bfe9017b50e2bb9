//! Title selectors for site overrides.
//!
//! A selector is written as `term (+ term)*`:
//!
//! | term                     | value                                      |
//! |--------------------------|--------------------------------------------|
//! | `title()`                | text of the first `<title>`                |
//! | `meta_property(og:title)`| `content` of `<meta property="og:title">`  |
//! | `meta_name(product)`     | `content` of `<meta name="product">`       |
//! | `text(.topictitle)`      | text of the first element matching the CSS|
//! | `attr(link[rel=x], href)`| attribute of the first matching element    |
//! | `" - "`                  | literal text                               |
//!
//! Several terms concatenate; every non-literal term must resolve.

use std::fmt;
use std::str::FromStr;

use scraper::{Html, Selector};

use crate::error::{Result, UrlTitleError};

/// A closed set of ways to locate a title in an HTML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleSelector {
    TitleTag,
    MetaProperty(String),
    MetaName(String),
    Text(String),
    Attr { css: String, attr: String },
    Composite(Vec<SelectorTerm>),
}

/// One term of a composite selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorTerm {
    Literal(String),
    Node(TitleSelector),
}

impl TitleSelector {
    /// Evaluates the selector against a parsed document.
    ///
    /// Returns the raw (untrimmed) value, or `None` if any part is missing
    /// or resolves to blank text.
    pub fn select(&self, doc: &Html) -> Option<String> {
        let value = match self {
            TitleSelector::TitleTag => first_text(doc, "title"),
            TitleSelector::MetaProperty(name) => first_attr(doc, &format!("meta[property=\"{}\"]", name), "content"),
            TitleSelector::MetaName(name) => first_attr(doc, &format!("meta[name=\"{}\"]", name), "content"),
            TitleSelector::Text(css) => first_text(doc, css),
            TitleSelector::Attr { css, attr } => first_attr(doc, css, attr),
            TitleSelector::Composite(terms) => {
                let mut joined = String::new();
                for term in terms {
                    match term {
                        SelectorTerm::Literal(text) => joined.push_str(text),
                        SelectorTerm::Node(selector) => joined.push_str(selector.select(doc)?.trim()),
                    }
                }
                Some(joined)
            }
        }?;

        if value.trim().is_empty() { None } else { Some(value) }
    }

    /// Whether this is the plain `<title>` tag selector.
    pub fn is_title_tag(&self) -> bool {
        matches!(self, TitleSelector::TitleTag)
    }
}

fn first_text(doc: &Html, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    doc.select(&selector).next().map(|el| el.text().collect::<String>())
}

fn first_attr(doc: &Html, css: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    doc.select(&selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(|value| value.to_string())
}

impl FromStr for TitleSelector {
    type Err = UrlTitleError;

    fn from_str(s: &str) -> Result<Self> {
        let terms = split_terms(s)?
            .into_iter()
            .map(parse_term)
            .collect::<Result<Vec<_>>>()?;

        match terms.as_slice() {
            [] => Err(selector_error(s, "empty selector")),
            [SelectorTerm::Node(selector)] => Ok(selector.clone()),
            _ if terms.iter().all(|t| matches!(t, SelectorTerm::Literal(_))) => {
                Err(selector_error(s, "a selector needs at least one non-literal term"))
            }
            _ => Ok(TitleSelector::Composite(terms)),
        }
    }
}

/// Splits on `+` outside of quotes and parentheses.
fn split_terms(s: &str) -> Result<Vec<&str>> {
    let mut terms = Vec::new();
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '(' if !in_quotes => depth += 1,
            ')' if !in_quotes => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| selector_error(s, "unbalanced parentheses"))?;
            }
            '+' if !in_quotes && depth == 0 => {
                terms.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }

    if in_quotes {
        return Err(selector_error(s, "unterminated string literal"));
    }
    if depth != 0 {
        return Err(selector_error(s, "unbalanced parentheses"));
    }

    let last = s[start..].trim();
    if !last.is_empty() || !terms.is_empty() {
        terms.push(last);
    }
    if terms.iter().any(|t| t.is_empty()) {
        return Err(selector_error(s, "empty term"));
    }
    Ok(terms)
}

fn parse_term(term: &str) -> Result<SelectorTerm> {
    if let Some(literal) = term.strip_prefix('"').and_then(|t| t.strip_suffix('"')) {
        return Ok(SelectorTerm::Literal(literal.to_string()));
    }

    let (name, args) = term
        .split_once('(')
        .and_then(|(name, rest)| rest.strip_suffix(')').map(|args| (name.trim(), args.trim())))
        .ok_or_else(|| selector_error(term, "expected kind(argument)"))?;

    let selector = match name {
        "title" if args.is_empty() => TitleSelector::TitleTag,
        "meta_property" => TitleSelector::MetaProperty(meta_key(term, args)?),
        "meta_name" => TitleSelector::MetaName(meta_key(term, args)?),
        "text" => TitleSelector::Text(css(term, args)?),
        "attr" => {
            let (selector, attr) = args
                .rsplit_once(',')
                .ok_or_else(|| selector_error(term, "attr needs a CSS selector and an attribute name"))?;
            let attr = attr.trim();
            if attr.is_empty() {
                return Err(selector_error(term, "empty attribute name"));
            }
            TitleSelector::Attr { css: css(term, selector.trim())?, attr: attr.to_string() }
        }
        _ => return Err(selector_error(term, &format!("unknown selector kind '{}'", name))),
    };

    Ok(SelectorTerm::Node(selector))
}

fn meta_key(term: &str, key: &str) -> Result<String> {
    if key.is_empty() || key.contains(['"', '\'', ']']) {
        Err(selector_error(term, "invalid meta key"))
    } else {
        Ok(key.to_string())
    }
}

fn css(term: &str, css: &str) -> Result<String> {
    Selector::parse(css).map_err(|e| selector_error(term, &format!("invalid CSS selector: {}", e)))?;
    Ok(css.to_string())
}

fn selector_error(selector: &str, reason: &str) -> UrlTitleError {
    UrlTitleError::SiteConfigError(format!("Invalid title selector '{}': {}", selector, reason))
}

impl fmt::Display for TitleSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TitleSelector::TitleTag => write!(f, "title()"),
            TitleSelector::MetaProperty(name) => write!(f, "meta_property({})", name),
            TitleSelector::MetaName(name) => write!(f, "meta_name({})", name),
            TitleSelector::Text(css) => write!(f, "text({})", css),
            TitleSelector::Attr { css, attr } => write!(f, "attr({}, {})", css, attr),
            TitleSelector::Composite(terms) => {
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        write!(f, " + ")?;
                    }
                    match term {
                        SelectorTerm::Literal(text) => write!(f, "\"{}\"", text)?,
                        SelectorTerm::Node(selector) => write!(f, "{}", selector)?,
                    }
                }
                Ok(())
            }
        }
    }
}
