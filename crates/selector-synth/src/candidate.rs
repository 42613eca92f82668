//! Per-element candidate construction

use crate::dom::{DomChild, DomElement};
use crate::types::SelectorToken;

/// Own text longer than this is truncated and matched through a regex
pub const TEXT_CANDIDATE_MAX_LEN: usize = 30;

/// An id is generated when `transitions * divisor >= length`
pub const GUID_TRANSITION_DIVISOR: usize = 4;

const TEST_ID_ATTRIBUTES: [&str; 3] = ["data-testid", "data-test-id", "data-test"];
const ARIA_ATTRIBUTES: [&str; 2] = ["aria-label", "role"];
const INPUT_ATTRIBUTES: [&str; 3] = ["name", "type", "placeholder"];

/// Build the candidate token for a single element.
///
/// Checked in order: test ids, ARIA attributes, `input`/`img` attributes,
/// own text, then a readable `id`.
pub fn build_candidate<E: DomElement>(element: &E) -> Option<SelectorToken> {
    let tag = element.tag_name();

    for name in TEST_ID_ATTRIBUTES.iter().chain(ARIA_ATTRIBUTES.iter()) {
        if let Some(value) = element.attribute(name) {
            return Some(SelectorToken::css(attribute_selector(&tag, name, &value)));
        }
    }

    match tag.as_str() {
        "input" => {
            for name in INPUT_ATTRIBUTES {
                if let Some(value) = non_empty(element.attribute(name)) {
                    return Some(SelectorToken::css(attribute_selector(&tag, name, &value)));
                }
            }
        }
        "img" => {
            if let Some(value) = non_empty(element.attribute("alt")) {
                return Some(SelectorToken::css(attribute_selector(&tag, "alt", &value)));
            }
        }
        _ => {}
    }

    if let Some(text) = text_selector_for_element(element) {
        return Some(SelectorToken::text(text));
    }

    if let Some(id) = non_empty(element.attribute("id")) {
        if !is_guid_like(&id) {
            return Some(SelectorToken::css(attribute_selector(&tag, "id", &id)));
        }
    }

    None
}

/// Text-engine body for the element's own text, if it has exactly one
/// non-blank text child.
pub fn text_selector_for_element<E: DomElement>(element: &E) -> Option<String> {
    let mut needs_regex = false;
    let mut trimmed: Option<String> = None;

    for child in element.children() {
        let DomChild::Text(raw) = child else {
            continue;
        };
        if raw.trim().is_empty() {
            needs_regex = true;
            continue;
        }
        if trimmed.is_some() {
            return None;
        }
        let clipped: String = raw.trim().chars().take(TEXT_CANDIDATE_MAX_LEN).collect();
        if clipped != raw {
            needs_regex = true;
        }
        trimmed = Some(clipped);
    }

    let text = trimmed?;
    Some(if needs_regex {
        format!("/.*{}.*/", escape_for_regex(&text))
    } else {
        quote_string(&text)
    })
}

/// Heuristic for auto-generated ids.
///
/// Counts transitions between lower, upper, digit and other characters;
/// `-` and `_` are skipped but still count toward the length.
pub fn is_guid_like(id: &str) -> bool {
    #[derive(Clone, Copy, PartialEq)]
    enum Class {
        Lower,
        Upper,
        Digit,
        Other,
    }

    let mut last: Option<Class> = None;
    let mut transitions = 0usize;
    let mut length = 0usize;

    for ch in id.chars() {
        length += 1;
        if ch == '-' || ch == '_' {
            continue;
        }
        let class = if ch.is_ascii_lowercase() {
            Class::Lower
        } else if ch.is_ascii_uppercase() {
            Class::Upper
        } else if ch.is_ascii_digit() {
            Class::Digit
        } else {
            Class::Other
        };

        // Capitalized words are not evidence of generation.
        if class == Class::Lower && last == Some(Class::Upper) {
            last = Some(class);
            continue;
        }
        if let Some(previous) = last {
            if previous != class {
                transitions += 1;
            }
        }
        last = Some(class);
    }

    length > 0 && transitions * GUID_TRANSITION_DIVISOR >= length
}

/// Double-quote a string, escaping embedded quotes and backslashes
pub fn quote_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        if ch == '"' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

pub fn escape_for_regex(text: &str) -> String {
    regex::escape(text)
}

fn attribute_selector(tag: &str, name: &str, value: &str) -> String {
    format!("{}[{}={}]", tag, name, quote_string(value))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readable_ids_are_not_guid_like() {
        assert!(!is_guid_like("first-item"));
        assert!(!is_guid_like("submitButton"));
        assert!(!is_guid_like("Header"));
        assert!(!is_guid_like("main_content"));
    }

    #[test]
    fn generated_ids_are_guid_like() {
        assert!(is_guid_like("aAbBcCdDeE"));
        assert!(is_guid_like("a1b2c3d4"));
        assert!(is_guid_like("x9Kq2Zr7"));
    }

    #[test]
    fn digits_and_punctuation_are_separate_classes() {
        assert!(is_guid_like("v1.2.3.4"));
        assert!(is_guid_like("7:3:9:1"));
        assert!(is_guid_like("12.34.56"));
        assert!(!is_guid_like("item-42"));
        assert!(!is_guid_like("section2024"));
    }

    #[test]
    fn quotes_are_escaped() {
        assert_eq!(quote_string("say \"hi\""), r#""say \"hi\"""#);
        assert_eq!(quote_string("plain"), "\"plain\"");
    }

    #[test]
    fn regex_escape_keeps_plain_text() {
        assert_eq!(escape_for_regex("Text"), "Text");
        assert_eq!(escape_for_regex("a.b"), "a\\.b");
    }
}
