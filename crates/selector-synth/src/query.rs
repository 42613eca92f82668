//! Selector evaluation over a snapshot.
//!
//! Supports what synthesis emits: `>>` chains of css (matched by `scraper`),
//! `text=` (quoted exact, `/regex/flags`, or case-insensitive substring) and
//! `xpath=` / `//` paths with `[n]` and `[normalize-space(.)='t']` predicates.

use std::collections::BTreeSet;

use regex::RegexBuilder;
use scraper::{ElementRef, Selector};

use crate::errors::SynthError;
use crate::snapshot::{normalize_space, SnapshotTree};

/// Evaluate a full chain, returning element indices in document order
pub(crate) fn evaluate(tree: &SnapshotTree, selector: &str) -> Result<Vec<usize>, SynthError> {
    let parts = split_chain(selector)?;
    let mut scope: Option<Vec<usize>> = None;
    for part in parts {
        let matches = evaluate_part(tree, selector, &part, scope.as_deref())?;
        if matches.is_empty() {
            return Ok(Vec::new());
        }
        scope = Some(matches);
    }
    Ok(scope.unwrap_or_default())
}

fn split_chain(selector: &str) -> Result<Vec<String>, SynthError> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut chars = selector.chars().peekable();

    while let Some(ch) = chars.next() {
        match quote {
            Some(q) => {
                current.push(ch);
                if ch == '\\' {
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                } else if ch == q {
                    quote = None;
                }
            }
            None => {
                if ch == '>' && chars.peek() == Some(&'>') {
                    chars.next();
                    parts.push(std::mem::take(&mut current));
                    continue;
                }
                if ch == '"' || ch == '\'' {
                    quote = Some(ch);
                }
                current.push(ch);
            }
        }
    }
    if quote.is_some() {
        return Err(SynthError::invalid(selector, "unterminated string"));
    }
    parts.push(current);

    let parts: Vec<String> = parts.into_iter().map(|p| p.trim().to_string()).collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(SynthError::invalid(selector, "empty selector part"));
    }
    Ok(parts)
}

fn evaluate_part(
    tree: &SnapshotTree,
    full: &str,
    part: &str,
    scope: Option<&[usize]>,
) -> Result<Vec<usize>, SynthError> {
    if let Some(body) = part.strip_prefix("css=") {
        return match_css(tree, full, body, scope);
    }
    if let Some(body) = part.strip_prefix("text=") {
        let matcher = TextMatcher::parse(full, body)?;
        return Ok(match_text(tree, &matcher, scope));
    }
    if let Some(body) = part.strip_prefix("xpath=") {
        return evaluate_xpath(tree, full, body, scope);
    }
    if part.starts_with("//") || part.starts_with("..") {
        return evaluate_xpath(tree, full, part, scope);
    }
    if part.starts_with('"') || part.starts_with('\'') {
        let matcher = TextMatcher::parse(full, part)?;
        return Ok(match_text(tree, &matcher, scope));
    }
    match_css(tree, full, part, scope)
}

/// Candidate elements for a part: the whole document or the descendants of
/// every scope element, deduplicated in document order.
fn candidates(tree: &SnapshotTree, scope: Option<&[usize]>) -> Vec<usize> {
    match scope {
        None => {
            let mut all = vec![SnapshotTree::ROOT];
            all.extend(tree.descendants(SnapshotTree::ROOT));
            all
        }
        Some(roots) => {
            let mut set = BTreeSet::new();
            for root in roots {
                set.extend(tree.descendants(*root));
            }
            set.into_iter().collect()
        }
    }
}

// ---- css ------------------------------------------------------------------

fn match_css(
    tree: &SnapshotTree,
    full: &str,
    body: &str,
    scope: Option<&[usize]>,
) -> Result<Vec<usize>, SynthError> {
    let selector =
        Selector::parse(body).map_err(|err| SynthError::invalid(full, err.to_string()))?;
    let html = tree.html.lock();
    let mut found = BTreeSet::new();
    match scope {
        None => {
            found.extend(
                html.select(&selector)
                    .filter_map(|element| tree.index_of(element.id())),
            );
        }
        Some(roots) => {
            for root in roots {
                let Some(root) = html.tree.get(tree.node_id(*root)).and_then(ElementRef::wrap)
                else {
                    continue;
                };
                found.extend(
                    root.select(&selector)
                        .filter_map(|element| tree.index_of(element.id())),
                );
            }
        }
    }
    Ok(found.into_iter().collect())
}

fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '-' || ch == '_'
}

fn read_ident(chars: &[char], pos: &mut usize) -> String {
    let start = *pos;
    while *pos < chars.len() && is_ident_char(chars[*pos]) {
        *pos += 1;
    }
    chars[start..*pos].iter().collect()
}

fn read_quoted(full: &str, chars: &[char], pos: &mut usize, quote: char) -> Result<String, SynthError> {
    let mut out = String::new();
    while let Some(&ch) = chars.get(*pos) {
        *pos += 1;
        if ch == '\\' {
            if let Some(&next) = chars.get(*pos) {
                out.push(next);
                *pos += 1;
            }
        } else if ch == quote {
            return Ok(out);
        } else {
            out.push(ch);
        }
    }
    Err(SynthError::invalid(full, "unterminated string"))
}

fn skip_whitespace(chars: &[char], pos: &mut usize) {
    while *pos < chars.len() && chars[*pos].is_whitespace() {
        *pos += 1;
    }
}

// ---- text -----------------------------------------------------------------

enum TextMatcher {
    Exact(String),
    Pattern(regex::Regex),
    Contains(String),
}

impl TextMatcher {
    fn parse(full: &str, body: &str) -> Result<Self, SynthError> {
        let body = body.trim();
        if body.len() >= 2 && (body.starts_with('"') || body.starts_with('\'')) {
            let quote = body.chars().next().unwrap_or('"');
            let chars: Vec<char> = body.chars().collect();
            let mut pos = 1;
            let value = read_quoted(full, &chars, &mut pos, quote)?;
            if pos != chars.len() {
                return Err(SynthError::invalid(full, "trailing characters after text"));
            }
            return Ok(TextMatcher::Exact(normalize_space(&value)));
        }
        if body.len() >= 2 && body.starts_with('/') {
            let close = body
                .rfind('/')
                .filter(|close| *close > 0)
                .ok_or_else(|| SynthError::invalid(full, "unterminated regex"))?;
            let pattern = &body[1..close];
            let flags = &body[close + 1..];
            let regex = RegexBuilder::new(pattern)
                .case_insensitive(flags.contains('i'))
                .build()
                .map_err(|err| SynthError::invalid(full, err.to_string()))?;
            return Ok(TextMatcher::Pattern(regex));
        }
        if body.is_empty() {
            return Err(SynthError::invalid(full, "empty text selector"));
        }
        Ok(TextMatcher::Contains(normalize_space(body).to_lowercase()))
    }

    fn matches(&self, text: &str) -> bool {
        match self {
            TextMatcher::Exact(value) => text == value,
            TextMatcher::Pattern(regex) => regex.is_match(text),
            TextMatcher::Contains(needle) => text.to_lowercase().contains(needle.as_str()),
        }
    }
}

fn match_text(tree: &SnapshotTree, matcher: &TextMatcher, scope: Option<&[usize]>) -> Vec<usize> {
    candidates(tree, scope)
        .into_iter()
        .filter(|index| {
            let text = tree.own_text(*index);
            !text.is_empty() && matcher.matches(&text)
        })
        .collect()
}

// ---- xpath ----------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
enum Axis {
    Child,
    DescendantOrSelf,
}

#[derive(Debug, Clone)]
enum Predicate {
    Position(usize),
    NormalizedText(String),
}

#[derive(Debug, Clone)]
struct XPathStep {
    axis: Axis,
    name: Option<String>,
    predicates: Vec<Predicate>,
}

fn parse_xpath(full: &str, input: &str) -> Result<(bool, Vec<XPathStep>), SynthError> {
    let chars: Vec<char> = input.trim().chars().collect();
    let mut pos = 0;
    let mut relative = false;
    if chars.first() == Some(&'.') {
        relative = true;
        pos += 1;
    }

    let mut steps = Vec::new();
    while pos < chars.len() {
        if chars[pos] != '/' {
            return Err(SynthError::invalid(full, "expected '/' in xpath"));
        }
        pos += 1;
        let axis = if chars.get(pos) == Some(&'/') {
            pos += 1;
            Axis::DescendantOrSelf
        } else {
            Axis::Child
        };

        let name = if chars.get(pos) == Some(&'*') {
            pos += 1;
            None
        } else {
            let ident = read_ident(&chars, &mut pos);
            if ident.is_empty() {
                return Err(SynthError::invalid(full, "missing xpath step name"));
            }
            Some(ident.to_ascii_lowercase())
        };

        let mut predicates = Vec::new();
        while chars.get(pos) == Some(&'[') {
            pos += 1;
            predicates.push(read_predicate(full, &chars, &mut pos)?);
        }
        steps.push(XPathStep {
            axis,
            name,
            predicates,
        });
    }

    if steps.is_empty() {
        return Err(SynthError::invalid(full, "empty xpath"));
    }
    Ok((relative, steps))
}

fn read_predicate(full: &str, chars: &[char], pos: &mut usize) -> Result<Predicate, SynthError> {
    skip_whitespace(chars, pos);
    let start = *pos;
    while *pos < chars.len() && chars[*pos].is_ascii_digit() {
        *pos += 1;
    }
    if *pos > start {
        let digits: String = chars[start..*pos].iter().collect();
        let position: usize = digits
            .parse()
            .map_err(|_| SynthError::invalid(full, "bad xpath position"))?;
        skip_whitespace(chars, pos);
        if chars.get(*pos) != Some(&']') || position == 0 {
            return Err(SynthError::invalid(full, "bad xpath position"));
        }
        *pos += 1;
        return Ok(Predicate::Position(position));
    }

    const FUNCTION: &str = "normalize-space(.)";
    let rest: String = chars[*pos..].iter().collect();
    if !rest.starts_with(FUNCTION) {
        return Err(SynthError::invalid(full, "unsupported xpath predicate"));
    }
    *pos += FUNCTION.chars().count();
    skip_whitespace(chars, pos);
    if chars.get(*pos) != Some(&'=') {
        return Err(SynthError::invalid(full, "expected '=' in xpath predicate"));
    }
    *pos += 1;
    skip_whitespace(chars, pos);
    let literal = match chars.get(*pos) {
        Some(&q) if q == '"' || q == '\'' => {
            *pos += 1;
            // XPath 1.0 literals have no escapes.
            let begin = *pos;
            while *pos < chars.len() && chars[*pos] != q {
                *pos += 1;
            }
            if *pos >= chars.len() {
                return Err(SynthError::invalid(full, "unterminated xpath literal"));
            }
            let literal: String = chars[begin..*pos].iter().collect();
            *pos += 1;
            literal
        }
        _ => return Err(SynthError::invalid(full, "expected xpath literal")),
    };
    skip_whitespace(chars, pos);
    if chars.get(*pos) != Some(&']') {
        return Err(SynthError::invalid(full, "unterminated xpath predicate"));
    }
    *pos += 1;
    Ok(Predicate::NormalizedText(literal))
}

/// Context node: `None` stands for the document node above `<html>`.
type Context = Option<usize>;

fn evaluate_xpath(
    tree: &SnapshotTree,
    full: &str,
    input: &str,
    scope: Option<&[usize]>,
) -> Result<Vec<usize>, SynthError> {
    let (relative, steps) = parse_xpath(full, input)?;
    let mut contexts: Vec<Context> = match scope {
        Some(roots) if relative || steps[0].axis == Axis::DescendantOrSelf => {
            roots.iter().map(|root| Some(*root)).collect()
        }
        _ => vec![None],
    };

    for step in &steps {
        let parents: BTreeSet<Context> = match step.axis {
            Axis::Child => contexts.iter().copied().collect(),
            Axis::DescendantOrSelf => {
                let mut set = BTreeSet::new();
                for context in &contexts {
                    set.insert(*context);
                    let below = match context {
                        None => {
                            let mut all = vec![SnapshotTree::ROOT];
                            all.extend(tree.descendants(SnapshotTree::ROOT));
                            all
                        }
                        Some(index) => tree.descendants(*index),
                    };
                    set.extend(below.into_iter().map(Some));
                }
                set
            }
        };

        let mut next = BTreeSet::new();
        for parent in parents {
            let kids: Vec<usize> = match parent {
                None => vec![SnapshotTree::ROOT],
                Some(index) => tree.element_children(index).collect(),
            };
            let mut selected: Vec<usize> = kids
                .into_iter()
                .filter(|kid| step.name.as_deref().map_or(true, |name| tree.tag(*kid) == name))
                .collect();
            for predicate in &step.predicates {
                selected = match predicate {
                    Predicate::Position(position) => {
                        selected.get(position - 1).copied().into_iter().collect()
                    }
                    Predicate::NormalizedText(literal) => selected
                        .into_iter()
                        .filter(|kid| normalize_space(&tree.text_content(*kid)) == *literal)
                        .collect(),
                };
            }
            next.extend(selected);
        }
        contexts = next.into_iter().map(Some).collect();
        if contexts.is_empty() {
            break;
        }
    }

    Ok(contexts.into_iter().flatten().collect())
}
