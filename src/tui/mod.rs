pub mod modal;
pub mod render;
pub mod state;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use modal::{ModalController, PreviewMode};
use ratatui::prelude::*;
use state::AppState;
use std::io::stdout;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Commands the TUI can send back to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TuiCommand {
    Refresh { force: bool },
    FetchDoc { id: u64 },
    Quit,
}

/// Frame-local UI state: selection, reveal clock, and the preview
/// modal. Owned by the TUI task, never shared with the engine.
pub struct UiState {
    pub selected: usize,
    pub show_logs: bool,
    pub spinner_frame: u8,
    pub reveal_started: Instant,
    pub last_seen_seq: u64,
    pub modal: ModalController,
}

impl UiState {
    fn new() -> Self {
        Self {
            selected: 0,
            show_logs: false,
            spinner_frame: 0,
            reveal_started: Instant::now(),
            last_seen_seq: 0,
            modal: ModalController::new(),
        }
    }
}

/// Run the TUI. Reads state from `state_rx`, sends commands on `cmd_tx`.
pub async fn run_tui(
    state_rx: watch::Receiver<AppState>,
    cmd_tx: tokio::sync::mpsc::Sender<TuiCommand>,
) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = tui_loop(&mut terminal, state_rx, cmd_tx).await;

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

async fn tui_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state_rx: watch::Receiver<AppState>,
    cmd_tx: tokio::sync::mpsc::Sender<TuiCommand>,
) -> Result<()> {
    let mut ui = UiState::new();
    loop {
        let state = state_rx.borrow().clone();

        // A new listing restarts the reveal and re-clamps the cursor.
        if state.sync_seq != ui.last_seen_seq {
            ui.last_seen_seq = state.sync_seq;
            ui.reveal_started = Instant::now();
            if ui.selected >= state.projects.len() {
                ui.selected = state.projects.len().saturating_sub(1);
            }
        }

        ui.modal.poll_doc(&state);
        ui.modal.tick(Instant::now());
        ui.spinner_frame = ui.spinner_frame.wrapping_add(1);

        terminal.draw(|f| render::draw(f, &state, &ui))?;

        // Poll for keyboard events with 100ms timeout; the timeout is
        // also what paces the reveal and modal animations.
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press
                    && handle_key(key.code, &state, &mut ui, &cmd_tx).await?
                {
                    return Ok(());
                }
            }
        }
    }
}

/// Dispatches one key press. Returns `Ok(true)` to quit.
async fn handle_key(
    code: KeyCode,
    state: &AppState,
    ui: &mut UiState,
    cmd_tx: &tokio::sync::mpsc::Sender<TuiCommand>,
) -> Result<bool> {
    let now = Instant::now();

    if ui.modal.is_visible() {
        match code {
            KeyCode::Esc | KeyCode::Char('q') => ui.modal.close(now),
            KeyCode::Char('l') => ui.modal.set_mode(PreviewMode::Live, now),
            KeyCode::Char('s') => ui.modal.set_mode(PreviewMode::Source, now),
            KeyCode::Char('o') => {
                if let Some(url) = ui.modal.frame_src() {
                    open_external(url);
                }
            }
            KeyCode::Char('b') => {
                if let Some(session) = ui.modal.session() {
                    open_external(&session.item.source_url);
                }
            }
            _ => {}
        }
        return Ok(false);
    }

    match code {
        KeyCode::Char('q') | KeyCode::Esc => {
            let _ = cmd_tx.send(TuiCommand::Quit).await;
            return Ok(true);
        }
        KeyCode::Up | KeyCode::Char('k') => {
            ui.selected = ui.selected.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if ui.selected + 1 < state.projects.len() {
                ui.selected += 1;
            }
        }
        KeyCode::Enter => {
            if let Some(project) = state.projects.get(ui.selected) {
                ui.modal.open(project.clone(), now);
                if let Some(id) = ui.modal.wants_doc() {
                    let _ = cmd_tx.send(TuiCommand::FetchDoc { id }).await;
                }
            }
        }
        KeyCode::Char('b') => {
            if let Some(project) = state.projects.get(ui.selected) {
                open_external(&project.source_url);
            }
        }
        KeyCode::Char('r') => {
            let _ = cmd_tx.send(TuiCommand::Refresh { force: false }).await;
        }
        KeyCode::Char('R') => {
            let _ = cmd_tx.send(TuiCommand::Refresh { force: true }).await;
        }
        KeyCode::Char('g') => {
            ui.show_logs = !ui.show_logs;
        }
        _ => {}
    }
    Ok(false)
}

fn open_external(url: &str) {
    if let Err(e) = open::that_detached(url) {
        tracing::warn!(url, error = %e, "failed to hand URL to the system opener");
    }
}
