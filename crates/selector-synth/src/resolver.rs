//! Greedy ancestor walk

use tracing::{debug, instrument, warn};

use crate::candidate::build_candidate;
use crate::dom::{DomElement, SelectorQuery};
use crate::types::{join_selector, SelectorSource, SelectorToken, Synthesis};
use crate::xpath::build_xpath;

/// Synthesizes selectors by validating candidates through a query capability
pub struct SelectorPathResolver<Q> {
    query: Q,
}

impl<Q> SelectorPathResolver<Q> {
    pub fn new(query: Q) -> Self {
        Self { query }
    }

    pub fn query(&self) -> &Q {
        &self.query
    }

    /// Selector string for `target`
    pub async fn build_selector<E>(&self, target: &E) -> String
    where
        E: DomElement,
        Q: SelectorQuery<E>,
    {
        self.synthesize(target).await.selector
    }

    /// Walk from `target` to the document element, prepending each ancestor's
    /// candidate and accepting the first path whose first match contains the
    /// target. Paths that narrow the match count are kept; a path matching
    /// nothing aborts the walk.
    #[instrument(skip_all, fields(target = ?target))]
    pub async fn synthesize<E>(&self, target: &E) -> Synthesis
    where
        E: DomElement,
        Q: SelectorQuery<E>,
    {
        let mut path: Vec<SelectorToken> = Vec::new();
        let mut best_count = usize::MAX;
        let mut queries = 0usize;
        let mut cursor = Some(target.clone());

        while let Some(element) = cursor {
            if element.is_document_element() {
                break;
            }
            let parent = element.parent_element();

            if let Some(candidate) = build_candidate(&element) {
                let mut tentative = Vec::with_capacity(path.len() + 1);
                tentative.push(candidate);
                tentative.extend(path.iter().cloned());
                let selector = join_selector(&tentative);

                queries += 1;
                let matches = match self.query.query_all(&selector).await {
                    Ok(matches) => matches,
                    Err(err) => {
                        warn!(%selector, error = %err, "candidate query failed");
                        Vec::new()
                    }
                };

                if matches.is_empty() {
                    debug!(%selector, "candidate matched nothing, abandoning walk");
                    break;
                }
                if matches[0].contains(target) {
                    debug!(%selector, queries, "selector accepted");
                    return Synthesis {
                        selector,
                        source: SelectorSource::CandidatePath,
                        queries,
                    };
                }
                if matches.len() < best_count {
                    best_count = matches.len();
                    path = tentative;
                }
            }

            cursor = parent;
        }

        let selector = build_xpath(target, &self.query).await;
        debug!(%selector, "falling back to xpath");
        Synthesis {
            selector,
            source: SelectorSource::XpathFallback,
            queries,
        }
    }
}
