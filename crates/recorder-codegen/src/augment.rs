//! Merge policy between the previously emitted action and a new one.

use crate::actions::{Action, ActionInContext};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AugmentDecision {
    /// Render the new action at all
    pub emit: bool,
    /// Pop the previous action's lines before rendering
    pub erase_previous: bool,
}

impl AugmentDecision {
    pub const APPEND: Self = Self {
        emit: true,
        erase_previous: false,
    };
    pub const REPLACE: Self = Self {
        emit: true,
        erase_previous: true,
    };
    pub const SUPPRESS: Self = Self {
        emit: false,
        erase_previous: false,
    };
}

/// Decide how `next` relates to `previous`.
///
/// Rules only apply within one page. Duplicate navigations are dropped even
/// when the previous one is committed, since standalone navigations are born
/// committed. Every other merge needs the previous action still open.
pub fn decide(previous: Option<&ActionInContext>, next: &ActionInContext) -> AugmentDecision {
    let Some(previous) = previous else {
        return AugmentDecision::APPEND;
    };
    if previous.page_alias != next.page_alias {
        return AugmentDecision::APPEND;
    }

    if let (Action::Navigate { url: last_url }, Action::Navigate { url }) =
        (&previous.action, &next.action)
    {
        if last_url == url {
            return AugmentDecision::SUPPRESS;
        }
    }

    if previous.is_committed() {
        return AugmentDecision::APPEND;
    }

    match (&previous.action, &next.action) {
        (Action::Fill { selector: last, .. }, Action::Fill { selector, .. }) if last == selector => {
            AugmentDecision::REPLACE
        }
        (
            Action::Click {
                selector: last,
                click_count: last_count,
                ..
            },
            Action::Click {
                selector,
                click_count,
                ..
            },
        ) if last == selector && click_count > last_count => AugmentDecision::REPLACE,
        (Action::Click { selector: last, .. }, Action::Check { selector })
        | (Action::Click { selector: last, .. }, Action::Uncheck { selector })
            if last == selector =>
        {
            AugmentDecision::REPLACE
        }
        _ => AugmentDecision::APPEND,
    }
}
