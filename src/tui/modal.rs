//! Preview modal state machine.
//!
//! At most one session exists at a time. Phases run CLOSED ->
//! OPENING -> OPEN -> CLOSING -> CLOSED; the open and close
//! transitions are timed so the renderer can animate them, and the
//! preview frame URL is always dropped before the controller reports
//! CLOSED so a torn-down preview can never keep loading.

use std::time::{Duration, Instant};

use crate::github::types::Project;
use crate::tui::state::AppState;

pub const OPEN_TRANSITION: Duration = Duration::from_millis(150);
pub const CLOSE_TRANSITION: Duration = Duration::from_millis(300);
/// How long an unresolved README request may keep the doc pane in its
/// loading state before we settle for fallback text.
pub const DOC_WAIT: Duration = Duration::from_millis(4000);
const NOTICE_TTL: Duration = Duration::from_millis(2500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalPhase {
    Closed,
    Opening,
    Open,
    Closing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewMode {
    /// Deployed site, only for projects with a homepage.
    Live,
    /// StackBlitz source view, always available.
    Source,
}

/// The embedded preview surface. Holding a URL means the preview is
/// (conceptually) loading or loaded; `None` means torn down.
#[derive(Debug, Clone, Default)]
pub struct PreviewFrame {
    src: Option<String>,
}

impl PreviewFrame {
    fn load(&mut self, url: String) {
        self.src = Some(url);
    }

    fn clear(&mut self) {
        self.src = None;
    }

    pub fn src(&self) -> Option<&str> {
        self.src.as_deref()
    }
}

/// Documentation pane contents for the selected project.
#[derive(Debug, Clone)]
pub enum DocState {
    /// Full README text in hand.
    Ready(String),
    /// README requested, not yet arrived.
    Loading { since: Instant },
    /// Gave up waiting; short stand-in text.
    Fallback(String),
}

#[derive(Debug, Clone)]
pub struct ModalSession {
    pub item: Project,
    pub mode: PreviewMode,
    pub frame: PreviewFrame,
    pub doc: DocState,
}

impl ModalSession {
    pub fn live_available(&self) -> bool {
        self.item.homepage.is_some()
    }
}

#[derive(Debug)]
pub struct ModalController {
    phase: ModalPhase,
    phase_since: Instant,
    session: Option<ModalSession>,
    notice: Option<(String, Instant)>,
}

impl ModalController {
    pub fn new() -> Self {
        Self {
            phase: ModalPhase::Closed,
            phase_since: Instant::now(),
            session: None,
            notice: None,
        }
    }

    pub fn phase(&self) -> ModalPhase {
        self.phase
    }

    pub fn session(&self) -> Option<&ModalSession> {
        self.session.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.phase != ModalPhase::Closed
    }

    pub fn frame_src(&self) -> Option<&str> {
        self.session.as_ref().and_then(|s| s.frame.src())
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_ref().map(|(text, _)| text.as_str())
    }

    /// Starts a session for `item`, replacing any session already on
    /// screen. Initial mode is LIVE when the project has a homepage,
    /// SOURCE otherwise, and the frame loads immediately.
    pub fn open(&mut self, item: Project, now: Instant) {
        let mode = if item.homepage.is_some() {
            PreviewMode::Live
        } else {
            PreviewMode::Source
        };
        let mut frame = PreviewFrame::default();
        frame.load(preview_url(&item, mode));
        let doc = match &item.readme {
            Some(text) => DocState::Ready(text.clone()),
            None => DocState::Loading { since: now },
        };
        self.session = Some(ModalSession {
            item,
            mode,
            frame,
            doc,
        });
        self.phase = ModalPhase::Opening;
        self.phase_since = now;
        self.notice = None;
    }

    /// Id of the session's project if its README still needs to be
    /// fetched.
    pub fn wants_doc(&self) -> Option<u64> {
        let session = self.session.as_ref()?;
        match session.doc {
            DocState::Loading { .. } => Some(session.item.id),
            _ => None,
        }
    }

    /// Switches preview mode, tearing the frame down and reloading it
    /// at the other URL. Asking for LIVE without a homepage changes
    /// nothing except posting a notice.
    pub fn set_mode(&mut self, mode: PreviewMode, now: Instant) {
        if !matches!(self.phase, ModalPhase::Opening | ModalPhase::Open) {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if mode == PreviewMode::Live && !session.live_available() {
            self.notice = Some(("No live demo available.".to_string(), now));
            return;
        }
        session.mode = mode;
        session.frame.clear();
        session.frame.load(preview_url(&session.item, mode));
    }

    pub fn close(&mut self, now: Instant) {
        if matches!(self.phase, ModalPhase::Opening | ModalPhase::Open) {
            self.phase = ModalPhase::Closing;
            self.phase_since = now;
        }
    }

    /// Advances timed transitions. Called once per UI frame.
    pub fn tick(&mut self, now: Instant) {
        match self.phase {
            ModalPhase::Opening if now.duration_since(self.phase_since) >= OPEN_TRANSITION => {
                self.phase = ModalPhase::Open;
                self.phase_since = now;
            }
            ModalPhase::Closing if now.duration_since(self.phase_since) >= CLOSE_TRANSITION => {
                if let Some(session) = self.session.as_mut() {
                    session.frame.clear();
                }
                self.session = None;
                self.phase = ModalPhase::Closed;
                self.phase_since = now;
            }
            _ => {}
        }

        if let Some(session) = self.session.as_mut() {
            if let DocState::Loading { since } = session.doc {
                if now.duration_since(since) >= DOC_WAIT {
                    session.doc = DocState::Fallback(doc_fallback(&session.item));
                }
            }
        }

        let notice_expired = self
            .notice
            .as_ref()
            .is_some_and(|(_, posted)| now.duration_since(*posted) >= NOTICE_TTL);
        if notice_expired {
            self.notice = None;
        }
    }

    /// Picks up a README that the engine has since published into the
    /// shared state.
    pub fn poll_doc(&mut self, state: &AppState) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !matches!(session.doc, DocState::Loading { .. }) {
            return;
        }
        if let Some(text) = state
            .project_by_id(session.item.id)
            .and_then(|p| p.readme.clone())
        {
            session.item.readme = Some(text.clone());
            session.doc = DocState::Ready(text);
        }
    }
}

fn preview_url(item: &Project, mode: PreviewMode) -> String {
    match mode {
        PreviewMode::Live => item
            .live_url()
            .map(str::to_string)
            .unwrap_or_else(|| item.sandbox_url()),
        PreviewMode::Source => item.sandbox_url(),
    }
}

fn doc_fallback(item: &Project) -> String {
    item.description
        .clone()
        .unwrap_or_else(|| "No detailed documentation.".to_string())
}
