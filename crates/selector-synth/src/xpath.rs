//! Structural XPath fallback

use tracing::debug;

use crate::dom::{DomElement, SelectorQuery};
use crate::candidate::TEXT_CANDIDATE_MAX_LEN;

/// Build the shortest `//`-anchored path that uniquely resolves to `target`,
/// or the absolute path from the document element.
pub async fn build_xpath<E, Q>(target: &E, query: &Q) -> String
where
    E: DomElement,
    Q: SelectorQuery<E> + ?Sized,
{
    let mut steps: Vec<String> = Vec::new();
    let mut cursor = Some(target.clone());

    while let Some(element) = cursor {
        steps.insert(0, xpath_step(&element, &element == target));
        if element.is_document_element() {
            break;
        }

        let candidate = format!("//{}", steps.join("/"));
        match query.query_all(&candidate).await {
            Ok(matches) if matches.len() == 1 && &matches[0] == target => return candidate,
            Ok(matches) => debug!(xpath = %candidate, matches = matches.len(), "xpath not unique"),
            Err(err) => debug!(xpath = %candidate, error = %err, "xpath query failed"),
        }
        cursor = element.parent_element();
    }

    format!("/{}", steps.join("/"))
}

fn xpath_step<E: DomElement>(element: &E, is_target: bool) -> String {
    let tag = element.tag_name();
    let mut step = tag.clone();

    if let Some(parent) = element.parent_element() {
        let same_tag: Vec<E> = parent
            .element_children()
            .into_iter()
            .filter(|sibling| sibling.tag_name() == tag)
            .collect();
        if same_tag.len() > 1 {
            if let Some(position) = same_tag.iter().position(|sibling| sibling == element) {
                step.push_str(&format!("[{}]", position + 1));
            }
        }
    }

    if is_target {
        if let Some(literal) = text_literal(&element.text_content()) {
            step.push_str(&format!("[normalize-space(.)={}]", literal));
        }
    }
    step
}

/// XPath literal for short normalized text; `None` when it cannot be quoted.
fn text_literal(raw: &str) -> Option<String> {
    let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() || text.chars().count() > TEXT_CANDIDATE_MAX_LEN {
        return None;
    }
    if !text.contains('\'') {
        Some(format!("'{}'", text))
    } else if !text.contains('"') {
        Some(format!("\"{}\"", text))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_pick_a_free_quote() {
        assert_eq!(text_literal("  Hello   world "), Some("'Hello world'".into()));
        assert_eq!(text_literal("it's"), Some("\"it's\"".into()));
        assert_eq!(text_literal("it's \"x\""), None);
        assert_eq!(text_literal("   "), None);
        assert_eq!(text_literal(&"x".repeat(31)), None);
    }
}
