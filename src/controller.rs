//! Recorder controller
//!
//! Bridges browser events to the code generator. All state changes happen on
//! one message queue: external events, completions of browser calls and
//! commit timers are all [`ControllerMessage`]s handled one at a time. Browser
//! calls run on spawned tasks so that signals fired while an action executes
//! are handled before the action's completion comes back.
//!
//! The controller only keeps a weak sender. Once every [`ControllerHandle`]
//! is gone and no browser call is pending, the queue drains and the session
//! closes as if `ContextClosed` had arrived.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use recorder_codegen::{
    Action, ActionInContext, CodeGenerator, CodeOutput, FrameRef, NavigationKind, Signal,
    SignalDisposition,
};
use soulbrowser_core_types::{ActionId, PageId, SoulError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

use crate::errors::RecorderError;
use crate::events::RecorderEvent;
use crate::ports::{self, BrowserPort, BINDINGS};

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug)]
pub enum ControllerMessage {
    External(RecorderEvent),
    ActionPerformed {
        action_id: ActionId,
        result: Result<(), SoulError>,
    },
    CommitTimeout {
        action_id: ActionId,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Closed,
}

/// Sending half used by event sources.
#[derive(Clone)]
pub struct ControllerHandle {
    tx: mpsc::Sender<ControllerMessage>,
}

impl ControllerHandle {
    pub async fn send(&self, event: RecorderEvent) -> Result<(), RecorderError> {
        self.tx
            .send(ControllerMessage::External(event))
            .await
            .map_err(|_| RecorderError::ChannelClosed)
    }
}

#[derive(Debug)]
struct PageState {
    alias: String,
    url: String,
}

pub struct RecorderController<O: CodeOutput> {
    generator: CodeGenerator<O>,
    browser: Arc<dyn BrowserPort>,
    pages: HashMap<PageId, PageState>,
    last_popup_ordinal: usize,
    last_dialog_ordinal: usize,
    in_flight: HashMap<ActionId, ActionInContext>,
    timers: HashMap<ActionId, CancellationToken>,
    shutdown: CancellationToken,
    commit_timeout: Duration,
    tx: mpsc::WeakSender<ControllerMessage>,
    rx: mpsc::Receiver<ControllerMessage>,
}

impl<O: CodeOutput> RecorderController<O> {
    pub fn new(
        generator: CodeGenerator<O>,
        browser: Arc<dyn BrowserPort>,
        commit_timeout: Duration,
    ) -> (Self, ControllerHandle) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let weak = tx.downgrade();
        let handle = ControllerHandle { tx };
        let controller = Self {
            generator,
            browser,
            pages: HashMap::new(),
            last_popup_ordinal: 0,
            last_dialog_ordinal: 0,
            in_flight: HashMap::new(),
            timers: HashMap::new(),
            shutdown: CancellationToken::new(),
            commit_timeout,
            tx: weak,
            rx,
        };
        (controller, handle)
    }

    /// Registers the page bindings. Failures are logged and ignored.
    pub async fn install_bindings(&self) {
        for name in BINDINGS {
            if let Err(err) = self.browser.expose_binding(name).await {
                warn!(binding = name, error = %err, "failed to expose binding");
            }
        }
    }

    /// Processes messages until the context closes or every handle is
    /// dropped, then returns the flushed sink.
    pub async fn run(mut self) -> Result<O, RecorderError> {
        self.install_bindings().await;
        loop {
            let Some(message) = self.rx.recv().await else {
                info!("all event sources dropped, closing context");
                self.close()?;
                break;
            };
            if self.handle(message).await? == Flow::Closed {
                break;
            }
        }
        Ok(self.generator.into_output())
    }

    /// Waits for every in-flight browser call to complete. Messages that
    /// arrive meanwhile are applied in order.
    pub async fn settle(&mut self) -> Result<Flow, RecorderError> {
        while !self.in_flight.is_empty() {
            let Some(message) = self.rx.recv().await else {
                return Err(RecorderError::ChannelClosed);
            };
            if self.apply_message(message)? == Flow::Closed {
                return Ok(Flow::Closed);
            }
        }
        Ok(Flow::Continue)
    }

    pub async fn handle(&mut self, message: ControllerMessage) -> Result<Flow, RecorderError> {
        match message {
            ControllerMessage::External(event) => self.handle_event(event).await,
            other => self.apply_message(other),
        }
    }

    /// Applies one event. `Idle` settles in-flight browser calls first.
    pub async fn handle_event(&mut self, event: RecorderEvent) -> Result<Flow, RecorderError> {
        if matches!(event, RecorderEvent::Idle) {
            return self.settle().await;
        }
        self.apply_event(event)
    }

    fn apply_message(&mut self, message: ControllerMessage) -> Result<Flow, RecorderError> {
        match message {
            ControllerMessage::External(event) => self.apply_event(event),
            ControllerMessage::ActionPerformed { action_id, result } => {
                self.on_action_performed(action_id, result);
                Ok(Flow::Continue)
            }
            ControllerMessage::CommitTimeout { action_id } => {
                if let Some(token) = self.timers.remove(&action_id) {
                    token.cancel();
                }
                if self.generator.commit_action(&action_id) {
                    trace!(%action_id, "commit timer fired");
                }
                Ok(Flow::Continue)
            }
        }
    }

    #[instrument(skip_all, fields(event = event.name()))]
    fn apply_event(&mut self, event: RecorderEvent) -> Result<Flow, RecorderError> {
        match event {
            RecorderEvent::PageOpened { page, url, opener } => {
                self.on_page(&page, url, opener.is_some());
            }
            RecorderEvent::PageClosed { page } => {
                let (alias, frame) = self.page_context(&page);
                let action = ActionInContext::new(alias, frame, Action::ClosePage);
                self.generator.add_action(action.into_committed());
            }
            RecorderEvent::FrameNavigated { page, frame } => {
                if !frame.is_main {
                    return Ok(Flow::Continue);
                }
                let alias = self.alias_for(&page);
                if let Some(state) = self.pages.get_mut(&page) {
                    state.url = frame.url.clone();
                }
                let signal = Signal::Navigation {
                    url: frame.url.clone(),
                    kind: NavigationKind::Await,
                };
                self.signal(&alias, &frame, signal);
            }
            RecorderEvent::Popup { page, popup } => {
                let (alias, frame) = self.page_context(&page);
                let popup_alias = self.alias_for(&popup);
                self.signal(&alias, &frame, Signal::Popup { popup_alias });
            }
            RecorderEvent::Download { page } => {
                let (alias, frame) = self.page_context(&page);
                self.signal(&alias, &frame, Signal::Download);
            }
            RecorderEvent::Dialog { page } => {
                let (alias, frame) = self.page_context(&page);
                self.last_dialog_ordinal += 1;
                let dialog_alias = self.last_dialog_ordinal.to_string();
                self.signal(&alias, &frame, Signal::Dialog { dialog_alias });
            }
            RecorderEvent::PerformAction {
                page,
                frame,
                action,
            } => {
                let alias = self.alias_for(&page);
                self.perform_action(ActionInContext::new(alias, frame, action));
            }
            RecorderEvent::RecordAction {
                page,
                frame,
                action,
            } => {
                let alias = self.alias_for(&page);
                let decision = self
                    .generator
                    .add_action(ActionInContext::new(alias, frame, action));
                trace!(?decision, "recorded action");
            }
            RecorderEvent::CommitLastAction => self.generator.commit_last_action(),
            // Already settling when it shows up here.
            RecorderEvent::Idle => {}
            RecorderEvent::ContextClosed => {
                self.close()?;
                return Ok(Flow::Closed);
            }
        }
        Ok(Flow::Continue)
    }

    pub fn generator(&self) -> &CodeGenerator<O> {
        &self.generator
    }

    pub fn page_alias(&self, page: &PageId) -> Option<&str> {
        self.pages.get(page).map(|state| state.alias.as_str())
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn into_output(self) -> O {
        self.generator.into_output()
    }

    fn on_page(&mut self, page: &PageId, url: String, is_popup: bool) {
        let alias = self.alias_for(page);
        if let Some(state) = self.pages.get_mut(page) {
            state.url = url.clone();
        }
        info!(page = %alias, %url, is_popup, "page opened");
        // Popups are announced through the opener's popup signal.
        if !is_popup {
            let frame = FrameRef::main(url.clone());
            let action = ActionInContext::new(alias, frame, Action::OpenPage { url });
            self.generator.add_action(action.into_committed());
        }
    }

    /// First page is `page`, later ones `popup1`, `popup2`, ... Aliases are
    /// never released, so a closed page's alias is not reused.
    fn alias_for(&mut self, page: &PageId) -> String {
        if let Some(state) = self.pages.get(page) {
            return state.alias.clone();
        }
        let alias = if self.pages.is_empty() {
            "page".to_string()
        } else {
            self.last_popup_ordinal += 1;
            format!("popup{}", self.last_popup_ordinal)
        };
        debug!(page = %page.0, %alias, "assigned page alias");
        self.pages.insert(
            page.clone(),
            PageState {
                alias: alias.clone(),
                url: String::new(),
            },
        );
        alias
    }

    fn page_context(&mut self, page: &PageId) -> (String, FrameRef) {
        let alias = self.alias_for(page);
        let url = self
            .pages
            .get(page)
            .map(|state| state.url.clone())
            .unwrap_or_default();
        (alias, FrameRef::main(url))
    }

    fn signal(&mut self, alias: &str, frame: &FrameRef, signal: Signal) {
        let disposition = self.generator.signal(alias, frame, signal);
        if disposition == SignalDisposition::Dropped {
            debug!(page = %alias, "signal dropped, no open action");
        } else {
            trace!(page = %alias, ?disposition, "signal handled");
        }
    }

    fn perform_action(&mut self, action: ActionInContext) {
        let action_id = action.id.clone();
        debug!(%action_id, page = %action.page_alias, title = %action.action, "performing action");
        self.generator.will_perform_action(action.clone());
        self.in_flight.insert(action_id.clone(), action.clone());

        let browser = Arc::clone(&self.browser);
        let Some(tx) = self.tx.upgrade() else {
            // Nobody can observe the outcome once every handle is gone.
            debug!(%action_id, "event sources dropped, not awaiting browser call");
            tokio::spawn(async move {
                let _ = ports::perform(browser.as_ref(), &action.frame, &action.action).await;
            });
            self.on_action_performed(action_id, Ok(()));
            return;
        };
        tokio::spawn(async move {
            let result = ports::perform(browser.as_ref(), &action.frame, &action.action).await;
            let _ = tx.send(ControllerMessage::ActionPerformed { action_id, result }).await;
        });
    }

    fn on_action_performed(&mut self, action_id: ActionId, result: Result<(), SoulError>) {
        let Some(action) = self.in_flight.remove(&action_id) else {
            return;
        };
        if let Err(err) = result {
            // The action is recorded anyway; replay will surface real failures.
            warn!(%action_id, error = %err, "browser call failed");
        }
        self.generator.did_perform_action(action);
        self.start_commit_timer(action_id);
    }

    fn start_commit_timer(&mut self, action_id: ActionId) {
        let token = self.shutdown.child_token();
        let child = token.clone();
        let tx = self.tx.clone();
        let timeout = self.commit_timeout;
        let id = action_id.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = child.cancelled() => {}
                _ = tokio::time::sleep(timeout) => {
                    if let Some(tx) = tx.upgrade() {
                        let _ = tx.send(ControllerMessage::CommitTimeout { action_id: id }).await;
                    }
                }
            }
        });
        self.timers.insert(action_id, token);
    }

    fn close(&mut self) -> Result<(), RecorderError> {
        let cancelled = self.timers.len();
        self.shutdown.cancel();
        self.timers.clear();
        info!(cancelled_timers = cancelled, "context closed, flushing script");
        self.generator.flush()?;
        Ok(())
    }
}
