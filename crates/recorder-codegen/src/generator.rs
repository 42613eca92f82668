//! Action stream to script text.
//!
//! The generator keeps two slots. `current` holds the action the browser is
//! executing right now, so signals that fire mid-execution land on it before
//! anything is printed. `last` holds the most recently printed action, which
//! stays open for late signals and merges until it is committed.
//!
//! The output buffer always ends with the footer block, and the last action's
//! text sits directly above it. Erasing is done by popping lines by count, so
//! every rewrite pops the footer (and optionally the last action) and prints
//! both again.

use soulbrowser_core_types::ActionId;
use tracing::{debug, trace};

use crate::actions::{Action, ActionInContext, FrameRef, NavigationKind, Signal};
use crate::augment::{self, AugmentDecision};
use crate::errors::CodegenError;
use crate::languages::LanguageGenerator;
use crate::options::ScriptHeader;
use crate::output::CodeOutput;

/// Where a signal ended up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignalDisposition {
    AttachedToCurrent,
    AttachedToLast,
    StandaloneNavigation,
    Dropped,
}

pub struct CodeGenerator<O: CodeOutput> {
    output: O,
    language: Box<dyn LanguageGenerator>,
    current_action: Option<ActionInContext>,
    last_action: Option<ActionInContext>,
    last_action_text: Option<String>,
    footer_text: String,
    footer_line_count: usize,
}

impl<O: CodeOutput> CodeGenerator<O> {
    /// Writes the header and footer immediately. Recorded scripts always
    /// launch headed unless the caller says otherwise.
    pub fn new(mut header: ScriptHeader, language: Box<dyn LanguageGenerator>, mut output: O) -> Self {
        header.launch.headless.get_or_insert(false);
        let header_text = language.generate_header(&header);
        let footer_text = format!("\n{}", language.generate_footer());
        let footer_line_count = footer_text.split('\n').count();
        output.write_ln(&header_text);
        output.write_ln(&footer_text);
        debug!(language = %language.language(), footer_line_count, "code generator ready");
        Self {
            output,
            language,
            current_action: None,
            last_action: None,
            last_action_text: None,
            footer_text,
            footer_line_count,
        }
    }

    pub fn will_perform_action(&mut self, action: ActionInContext) {
        trace!(action_id = %action.id, name = action.action.name(), "will perform");
        self.current_action = Some(action);
    }

    /// Prints `action`, merging with the last action where the policy allows.
    ///
    /// When `action` is the one announced through `will_perform_action`, the
    /// announced copy wins since it carries the signals gathered meanwhile.
    pub fn did_perform_action(&mut self, action: ActionInContext) -> AugmentDecision {
        let action = match self.current_action.take() {
            Some(current) if current.id == action.id => current,
            Some(other) => {
                self.current_action = Some(other);
                action
            }
            None => action,
        };
        let decision = augment::decide(self.last_action.as_ref(), &action);
        if !decision.emit {
            debug!(action_id = %action.id, title = %action.action, "suppressed duplicate");
            self.clear_current_if(&action.id);
            return decision;
        }
        // Performing means the action ran in the browser; navigations seen
        // while it ran already happened.
        self.print_action(action, decision.erase_previous, true);
        decision
    }

    /// Records an action that the page already executed.
    pub fn add_action(&mut self, action: ActionInContext) -> AugmentDecision {
        self.will_perform_action(action.clone());
        self.did_perform_action(action)
    }

    pub fn signal(&mut self, page_alias: &str, frame: &FrameRef, signal: Signal) -> SignalDisposition {
        if let Some(current) = self.current_action.as_mut() {
            let signal = with_navigation_kind(signal, NavigationKind::Assert);
            trace!(action_id = %current.id, ?signal, "signal while performing");
            *current = current.with_signal(signal);
            return SignalDisposition::AttachedToCurrent;
        }

        if let Some(last) = self.last_action.as_ref() {
            let attachable = !last.is_committed() && !matches!(last.action, Action::Navigate { .. });
            if attachable {
                let mut next = last.clone();
                match (&signal, next.signals.last()) {
                    // A download reported as navigation first: keep the download.
                    (Signal::Navigation { .. }, Some(Signal::Download)) => {
                        return SignalDisposition::Dropped;
                    }
                    (Signal::Download, Some(Signal::Navigation { .. })) => {
                        next.signals.pop();
                    }
                    _ => {}
                }
                let next = next.with_signal(with_navigation_kind(signal, NavigationKind::Await));
                debug!(action_id = %next.id, page = %next.page_alias, "late signal reprints last action");
                self.print_action(next, true, false);
                return SignalDisposition::AttachedToLast;
            }
        }

        if let Signal::Navigation { url, .. } = signal {
            let navigate = ActionInContext::new(page_alias, frame.clone(), Action::Navigate { url })
                .into_committed();
            if self.add_action(navigate).emit {
                return SignalDisposition::StandaloneNavigation;
            }
        }
        SignalDisposition::Dropped
    }

    pub fn commit_last_action(&mut self) {
        if let Some(last) = self.last_action.as_mut() {
            last.commit();
        }
    }

    /// Commits the last action only if it still is `id`. Returns whether it did.
    pub fn commit_action(&mut self, id: &ActionId) -> bool {
        match self.last_action.as_mut() {
            Some(last) if &last.id == id => {
                last.commit();
                true
            }
            _ => false,
        }
    }

    pub fn flush(&mut self) -> Result<(), CodegenError> {
        self.output.flush()
    }

    pub fn current_action(&self) -> Option<&ActionInContext> {
        self.current_action.as_ref()
    }

    pub fn last_action(&self) -> Option<&ActionInContext> {
        self.last_action.as_ref()
    }

    pub fn footer_line_count(&self) -> usize {
        self.footer_line_count
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn into_output(self) -> O {
        self.output
    }

    fn clear_current_if(&mut self, id: &ActionId) {
        if self.current_action.as_ref().is_some_and(|current| &current.id == id) {
            self.current_action = None;
        }
    }

    fn print_action(&mut self, action: ActionInContext, erase_last_action: bool, performing_action: bool) {
        let mut erase_lines = self.footer_line_count;
        if erase_last_action {
            if let Some(text) = &self.last_action_text {
                erase_lines += text.split('\n').count();
            }
        }
        for _ in 0..erase_lines {
            self.output.pop_line();
        }

        self.clear_current_if(&action.id);
        let text = self.language.generate_action(&action, performing_action);
        self.output.write_ln(&text);
        self.output.write_ln(&self.footer_text);
        debug!(
            action_id = %action.id,
            page = %action.page_alias,
            title = %action.action,
            erased = erase_last_action,
            "printed action"
        );
        self.last_action = Some(action);
        self.last_action_text = Some(text);
    }
}

fn with_navigation_kind(signal: Signal, kind: NavigationKind) -> Signal {
    match signal {
        Signal::Navigation { url, .. } => Signal::Navigation { url, kind },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{Modifiers, MouseButton};
    use crate::languages::Language;
    use crate::output::MemoryOutput;

    fn generator() -> (CodeGenerator<MemoryOutput>, MemoryOutput) {
        let output = MemoryOutput::new();
        let generator = CodeGenerator::new(
            ScriptHeader::default(),
            Language::Javascript.generator(),
            output.clone(),
        );
        (generator, output)
    }

    fn main_frame() -> FrameRef {
        FrameRef::main("https://example.com/")
    }

    fn click(selector: &str) -> ActionInContext {
        ActionInContext::new(
            "page",
            main_frame(),
            Action::Click {
                selector: selector.into(),
                button: MouseButton::Left,
                modifiers: Modifiers::empty(),
                click_count: 1,
            },
        )
    }

    #[test]
    fn footer_is_always_last() {
        let (mut generator, output) = generator();
        let footer = Language::Javascript.generator().generate_footer();
        assert!(output.text().ends_with(&footer));
        generator.add_action(click("#a"));
        assert!(output.text().ends_with(&footer));
        assert_eq!(generator.footer_line_count(), footer.split('\n').count() + 1);
    }

    #[test]
    fn header_defaults_to_headed_launch() {
        let (_generator, output) = generator();
        assert!(output.text().contains("headless: false"));
    }

    #[test]
    fn signal_during_perform_lands_on_current() {
        let (mut generator, output) = generator();
        let action = click("#go");
        generator.will_perform_action(action.clone());
        let disposition = generator.signal(
            "page",
            &main_frame(),
            Signal::Navigation {
                url: "https://example.com/next".into(),
                kind: NavigationKind::Await,
            },
        );
        assert_eq!(disposition, SignalDisposition::AttachedToCurrent);
        assert!(!output.text().contains("#go"));

        generator.did_perform_action(action);
        assert!(generator.current_action().is_none());
        assert!(output
            .text()
            .contains("// assert.equal(page.url(), 'https://example.com/next');"));
    }

    #[test]
    fn late_signal_reprints_last_in_place() {
        let (mut generator, output) = generator();
        generator.add_action(click("#go"));
        let before = output.lines().len();
        let disposition = generator.signal(
            "page",
            &main_frame(),
            Signal::Navigation {
                url: "https://example.com/next".into(),
                kind: NavigationKind::Assert,
            },
        );
        assert_eq!(disposition, SignalDisposition::AttachedToLast);
        let text = output.text();
        assert_eq!(text.matches("// Click #go").count(), 1);
        assert!(text.contains("page.waitForNavigation(/*{ url: 'https://example.com/next' }*/),"));
        assert!(output.lines().len() > before);
    }

    #[test]
    fn committed_last_turns_navigation_into_standalone_step() {
        let (mut generator, output) = generator();
        let action = click("#go");
        let id = action.id.clone();
        generator.add_action(action);
        assert!(generator.commit_action(&id));
        let disposition = generator.signal(
            "page",
            &main_frame(),
            Signal::Navigation {
                url: "https://example.com/next".into(),
                kind: NavigationKind::Await,
            },
        );
        assert_eq!(disposition, SignalDisposition::StandaloneNavigation);
        assert!(output.text().contains("await page.goto('https://example.com/next');"));
        assert!(generator.last_action().is_some_and(|a| a.is_committed()));
    }

    #[test]
    fn popup_without_open_action_is_dropped() {
        let (mut generator, _output) = generator();
        let disposition = generator.signal(
            "page",
            &main_frame(),
            Signal::Popup {
                popup_alias: "popup1".into(),
            },
        );
        assert_eq!(disposition, SignalDisposition::Dropped);
    }

    #[test]
    fn download_replaces_trailing_navigation() {
        let (mut generator, output) = generator();
        generator.add_action(click("#export"));
        generator.signal(
            "page",
            &main_frame(),
            Signal::Navigation {
                url: "https://example.com/file.csv".into(),
                kind: NavigationKind::Await,
            },
        );
        generator.signal("page", &main_frame(), Signal::Download);
        let last = generator.last_action().unwrap();
        assert_eq!(last.signals, vec![Signal::Download]);
        assert!(output.text().contains("const [download] = await Promise.all(["));
        assert!(!output.text().contains("waitForNavigation"));
    }

    #[test]
    fn stale_commit_timer_is_ignored() {
        let (mut generator, _output) = generator();
        let first = click("#a");
        let stale = first.id.clone();
        generator.add_action(first);
        generator.add_action(click("#b"));
        assert!(!generator.commit_action(&stale));
        assert!(!generator.last_action().unwrap().is_committed());
    }
}
