//! Page-side recording logic
//!
//! [`PageRecorder`] is the state machine that runs inside each document: it
//! tracks the hovered and active elements, synthesizes their selectors and
//! turns raw DOM events into binding calls ([`PageCommand`]). Each handled
//! event also reports whether the page should swallow it.
//!
//! A live browser bridge owns one recorder per document and feeds it through
//! [`PageRecorder::forward`]. This crate ships no such bridge; replayed logs
//! already carry binding calls and go straight to the controller.

use recorder_codegen::{Action, FrameRef, Modifiers, MouseButton};
use selector_synth::{DomElement, SelectorPathResolver, SelectorQuery};
use soulbrowser_core_types::PageId;
use tracing::{debug, trace};

use crate::controller::ControllerHandle;
use crate::errors::RecorderError;
use crate::events::RecorderEvent;

/// Raw DOM events the recorder listens to.
#[derive(Clone, Debug)]
pub enum PageEvent<E> {
    /// `target` is `None` when the pointer is over no element
    MouseMove { target: Option<E> },
    /// `left_document` is set when the pointer left the frame itself
    MouseLeave { left_document: bool },
    MouseDown,
    MouseUp,
    /// Carries `document.activeElement` after the focus change
    Focus { active: Option<E> },
    Scroll,
    Click {
        target: E,
        /// Legacy `which`: 1 left, 2 middle, 3 right
        which: u32,
        modifiers: Modifiers,
        /// `detail`, the click count
        detail: u32,
    },
    Input { target: E, state: InputState },
    KeyDown {
        target: E,
        key: String,
        modifiers: Modifiers,
    },
    KeyUp { key: String, modifiers: Modifiers },
}

/// Form state read from the input target.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InputState {
    pub value: String,
    pub checked: bool,
    /// File names of a file input
    pub files: Vec<String>,
    /// Values of the selected options of a `<select>`
    pub selected: Vec<String>,
}

/// Binding call issued by page content.
#[derive(Clone, Debug, PartialEq)]
pub enum PageCommand {
    /// `performPlaywrightAction`: the browser executes the action
    Perform(Action),
    /// `recordPlaywrightAction`: the page already did it
    Record(Action),
    CommitLastAction,
}

impl PageCommand {
    pub fn into_event(self, page: PageId, frame: FrameRef) -> RecorderEvent {
        match self {
            PageCommand::Perform(action) => RecorderEvent::PerformAction {
                page,
                frame,
                action,
            },
            PageCommand::Record(action) => RecorderEvent::RecordAction {
                page,
                frame,
                action,
            },
            PageCommand::CommitLastAction => RecorderEvent::CommitLastAction,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Reaction {
    /// Page must prevent default handling and stop propagation
    pub consumed: bool,
    pub command: Option<PageCommand>,
}

impl Reaction {
    fn pass() -> Self {
        Self::default()
    }

    fn consume() -> Self {
        Self {
            consumed: true,
            command: None,
        }
    }

    fn consume_with(command: PageCommand) -> Self {
        Self {
            consumed: true,
            command: Some(command),
        }
    }
}

#[derive(Clone, Debug)]
struct HighlightModel<E> {
    selector: String,
    element: E,
}

pub fn button_for(which: u32) -> MouseButton {
    match which {
        2 => MouseButton::Middle,
        3 => MouseButton::Right,
        _ => MouseButton::Left,
    }
}

/// Whether a keydown becomes a `press` action. Editing keys and plain
/// printable characters are captured by the input handler instead.
pub fn should_generate_key_press(key: &str, modifiers: Modifiers) -> bool {
    if matches!(key, "Backspace" | "Delete" | "Shift" | "Control" | "Meta" | "Alt") {
        return false;
    }
    let has_modifier = modifiers.intersects(Modifiers::CONTROL | Modifiers::ALT | Modifiers::META);
    !(key.chars().count() == 1 && !has_modifier)
}

pub struct PageRecorder<E, Q> {
    resolver: SelectorPathResolver<Q>,
    hovered_element: Option<E>,
    hovered: Option<HighlightModel<E>>,
    active: Option<HighlightModel<E>>,
    performing: bool,
    expect_key_up: bool,
}

impl<E, Q> PageRecorder<E, Q>
where
    E: DomElement,
    Q: SelectorQuery<E>,
{
    pub fn new(query: Q) -> Self {
        Self {
            resolver: SelectorPathResolver::new(query),
            hovered_element: None,
            hovered: None,
            active: None,
            performing: false,
            expect_key_up: false,
        }
    }

    pub fn hovered_selector(&self) -> Option<&str> {
        self.hovered.as_ref().map(|model| model.selector.as_str())
    }

    pub fn active_selector(&self) -> Option<&str> {
        self.active.as_ref().map(|model| model.selector.as_str())
    }

    pub fn is_performing(&self) -> bool {
        self.performing
    }

    /// The `performPlaywrightAction` call returned.
    pub fn action_performed(&mut self) {
        self.performing = false;
    }

    /// Handles `event` and delivers the resulting binding call, if any, to
    /// the controller. Returns whether the page should swallow the event.
    pub async fn forward(
        &mut self,
        event: PageEvent<E>,
        page: &PageId,
        frame: &FrameRef,
        controller: &ControllerHandle,
    ) -> Result<bool, RecorderError> {
        let Reaction { consumed, command } = self.handle(event).await;
        if let Some(command) = command {
            controller
                .send(command.into_event(page.clone(), frame.clone()))
                .await?;
        }
        Ok(consumed)
    }

    pub async fn handle(&mut self, event: PageEvent<E>) -> Reaction {
        let reaction = match event {
            PageEvent::MouseMove { target } => self.on_mouse_move(target).await,
            PageEvent::MouseLeave { left_document } => {
                if left_document {
                    self.hovered_element = None;
                    self.update_hovered_model().await
                } else {
                    Reaction::pass()
                }
            }
            PageEvent::MouseDown => {
                self.active = self.hovered.clone();
                self.consume_unless_performing()
            }
            PageEvent::MouseUp => self.consume_unless_performing(),
            PageEvent::Focus { active } => {
                self.active = match active {
                    Some(element) => self.model_for(element).await,
                    None => None,
                };
                Reaction::pass()
            }
            PageEvent::Scroll => {
                self.hovered = None;
                Reaction::pass()
            }
            PageEvent::Click {
                target,
                which,
                modifiers,
                detail,
            } => self.on_click(&target, which, modifiers, detail),
            PageEvent::Input { target, state } => self.on_input(&target, state),
            PageEvent::KeyDown {
                target,
                key,
                modifiers,
            } => self.on_key_down(&target, key, modifiers),
            PageEvent::KeyUp { key, modifiers } => {
                if !should_generate_key_press(&key, modifiers) {
                    Reaction::pass()
                } else if self.expect_key_up {
                    self.expect_key_up = false;
                    Reaction::pass()
                } else {
                    Reaction::consume()
                }
            }
        };
        if let Some(PageCommand::Perform(action)) = &reaction.command {
            debug!(action = %action, "performing through binding");
            self.performing = true;
        }
        reaction
    }

    async fn on_mouse_move(&mut self, target: Option<E>) -> Reaction {
        if self.hovered_element == target {
            return Reaction::pass();
        }
        self.hovered_element = target;
        self.update_hovered_model().await
    }

    /// Hovering a new selector commits the last recorded action.
    async fn update_hovered_model(&mut self) -> Reaction {
        let Some(element) = self.hovered_element.clone() else {
            self.hovered = None;
            return Reaction::pass();
        };
        let selector = self.resolver.build_selector(&element).await;
        if self
            .hovered
            .as_ref()
            .is_some_and(|model| model.selector == selector)
        {
            return Reaction::pass();
        }
        trace!(%selector, "hovered selector changed");
        self.hovered = (!selector.is_empty()).then(|| HighlightModel { selector, element });
        Reaction {
            consumed: false,
            command: Some(PageCommand::CommitLastAction),
        }
    }

    async fn model_for(&self, element: E) -> Option<HighlightModel<E>> {
        let selector = self.resolver.build_selector(&element).await;
        (!selector.is_empty()).then(|| HighlightModel { selector, element })
    }

    fn consume_unless_performing(&self) -> Reaction {
        if self.performing {
            Reaction::pass()
        } else {
            Reaction::consume()
        }
    }

    fn on_click(&mut self, target: &E, which: u32, modifiers: Modifiers, detail: u32) -> Reaction {
        // Selects and checkboxes are recorded from their input events.
        if target.tag_name() == "select" || is_input_of_type(target, "checkbox") {
            return Reaction::pass();
        }
        if self.performing {
            return Reaction::pass();
        }
        let Some(hovered) = &self.hovered else {
            return Reaction::consume();
        };
        Reaction::consume_with(PageCommand::Perform(Action::Click {
            selector: hovered.selector.clone(),
            button: button_for(which),
            modifiers,
            click_count: detail,
        }))
    }

    fn on_input(&mut self, target: &E, state: InputState) -> Reaction {
        let tag = target.tag_name();
        if tag == "input" || tag == "textarea" {
            let kind = input_type(target);
            if kind == "checkbox" {
                if self.performing {
                    return Reaction::pass();
                }
                let Some(selector) = self.active_selector_for(target) else {
                    return Reaction::consume();
                };
                let action = if state.checked {
                    Action::Check { selector }
                } else {
                    Action::Uncheck { selector }
                };
                return Reaction::consume_with(PageCommand::Perform(action));
            }

            if kind == "file" {
                let Some(active) = &self.active else {
                    return Reaction::pass();
                };
                return Reaction {
                    consumed: false,
                    command: Some(PageCommand::Record(Action::SetInputFiles {
                        selector: active.selector.clone(),
                        files: state.files,
                    })),
                };
            }

            let Some(selector) = self.active_selector_for(target) else {
                return Reaction::consume();
            };
            return Reaction {
                consumed: false,
                command: Some(PageCommand::Record(Action::Fill {
                    selector,
                    text: state.value,
                })),
            };
        }

        if tag == "select" {
            if self.performing {
                return Reaction::pass();
            }
            let Some(hovered) = &self.hovered else {
                return Reaction::consume();
            };
            return Reaction::consume_with(PageCommand::Perform(Action::Select {
                selector: hovered.selector.clone(),
                options: state.selected,
            }));
        }
        Reaction::pass()
    }

    fn on_key_down(&mut self, target: &E, key: String, modifiers: Modifiers) -> Reaction {
        if !should_generate_key_press(&key, modifiers) {
            return Reaction::pass();
        }
        if self.performing {
            self.expect_key_up = true;
            return Reaction::pass();
        }
        let Some(selector) = self.active_selector_for(target) else {
            return Reaction::consume();
        };
        Reaction::consume_with(PageCommand::Perform(Action::Press {
            selector,
            key,
            modifiers,
        }))
    }

    /// Active selector, only when `target` is the active element.
    fn active_selector_for(&self, target: &E) -> Option<String> {
        match &self.active {
            Some(model) if &model.element == target => Some(model.selector.clone()),
            Some(model) => {
                debug!(active = %model.selector, "event target is not the active element");
                None
            }
            None => None,
        }
    }
}

fn input_type<E: DomElement>(element: &E) -> String {
    element
        .attribute("type")
        .map(|kind| kind.to_ascii_lowercase())
        .unwrap_or_default()
}

fn is_input_of_type<E: DomElement>(element: &E, kind: &str) -> bool {
    element.tag_name() == "input" && input_type(element) == kind
}
