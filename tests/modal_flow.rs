//! Integration tests for the preview modal driven by published app
//! state, covering the full open/close cycle and the doc handoff.

use std::time::Instant;

use chrono::Utc;

use repo_gallery::fetch::{DataOrigin, LoadOutcome};
use repo_gallery::github::types::{Enrichment, Project};
use repo_gallery::tui::modal::{
    DocState, ModalController, ModalPhase, PreviewMode, CLOSE_TRANSITION, DOC_WAIT,
    OPEN_TRANSITION,
};
use repo_gallery::tui::state::AppState;

fn project(id: u64, name: &str, homepage: Option<&str>) -> Project {
    Project {
        id,
        name: name.to_string(),
        full_name: format!("octocat/{}", name),
        description: Some(format!("{} in one line", name)),
        language: Some("Rust".to_string()),
        homepage: homepage.map(str::to_string),
        source_url: format!("https://github.com/octocat/{}", name),
        pushed_at: Utc::now(),
        enrichment: Enrichment::defaults(None, &[]),
        readme: None,
    }
}

fn publish(state: &mut AppState, projects: Vec<Project>) {
    state.apply_outcome(LoadOutcome {
        projects,
        origin: DataOrigin::Fresh,
        warning: None,
    });
}

#[test]
fn test_full_open_close_cycle() {
    let mut modal = ModalController::new();
    let t0 = Instant::now();

    // 1. Open lands in OPENING with the frame already loading.
    modal.open(project(1, "site", Some("https://site.dev")), t0);
    assert_eq!(modal.phase(), ModalPhase::Opening);
    assert_eq!(modal.frame_src(), Some("https://site.dev"));

    // 2. The open transition settles into OPEN.
    modal.tick(t0 + OPEN_TRANSITION);
    assert_eq!(modal.phase(), ModalPhase::Open);

    // 3. Close starts the teardown but keeps the session around for
    //    the animation.
    let t1 = t0 + OPEN_TRANSITION;
    modal.close(t1);
    assert_eq!(modal.phase(), ModalPhase::Closing);
    assert!(modal.session().is_some());

    // 4. Once the close transition elapses the frame source is gone
    //    and only then does the controller report CLOSED.
    modal.tick(t1 + CLOSE_TRANSITION);
    assert_eq!(modal.phase(), ModalPhase::Closed);
    assert!(modal.frame_src().is_none());
    assert!(modal.session().is_none());
}

#[test]
fn test_initial_mode_tracks_homepage() {
    let mut modal = ModalController::new();
    let t0 = Instant::now();

    modal.open(project(1, "deployed", Some("https://deployed.dev")), t0);
    assert_eq!(modal.session().unwrap().mode, PreviewMode::Live);

    modal.open(project(2, "library", None), t0);
    let session = modal.session().unwrap();
    assert_eq!(session.mode, PreviewMode::Source);
    assert!(modal
        .frame_src()
        .unwrap()
        .starts_with("https://stackblitz.com/github/octocat/library"));
}

#[test]
fn test_live_without_homepage_is_refused_with_notice() {
    let mut modal = ModalController::new();
    let t0 = Instant::now();
    modal.open(project(1, "library", None), t0);
    let frame_before = modal.frame_src().map(str::to_string);

    modal.set_mode(PreviewMode::Live, t0);

    assert_eq!(modal.session().unwrap().mode, PreviewMode::Source);
    assert_eq!(modal.frame_src(), frame_before.as_deref());
    assert_eq!(modal.notice(), Some("No live demo available."));
}

#[test]
fn test_mode_toggle_reloads_the_frame() {
    let mut modal = ModalController::new();
    let t0 = Instant::now();
    modal.open(project(1, "site", Some("https://site.dev")), t0);

    modal.set_mode(PreviewMode::Source, t0);
    assert!(modal.frame_src().unwrap().starts_with("https://stackblitz.com/"));

    modal.set_mode(PreviewMode::Live, t0);
    assert_eq!(modal.frame_src(), Some("https://site.dev"));
}

#[test]
fn test_open_over_open_replaces_the_session() {
    let mut modal = ModalController::new();
    let t0 = Instant::now();
    modal.open(project(1, "first", Some("https://first.dev")), t0);
    modal.tick(t0 + OPEN_TRANSITION);

    modal.open(project(2, "second", None), t0 + OPEN_TRANSITION);

    assert_eq!(modal.phase(), ModalPhase::Opening);
    assert_eq!(modal.session().unwrap().item.id, 2);
    assert_eq!(modal.session().unwrap().mode, PreviewMode::Source);
}

#[test]
fn test_doc_handoff_from_engine_to_modal() {
    let mut state = AppState::new("octocat", 150);
    publish(&mut state, vec![project(7, "alpha", None)]);

    let mut modal = ModalController::new();
    let t0 = Instant::now();
    modal.open(state.projects[0].clone(), t0);

    // The modal wants the README and tells us which project needs it.
    assert_eq!(modal.wants_doc(), Some(7));
    assert!(matches!(
        modal.session().unwrap().doc,
        DocState::Loading { .. }
    ));

    // The engine publishes the fetched README into shared state.
    if let Some(p) = state.projects.iter_mut().find(|p| p.id == 7) {
        p.readme = Some("# alpha\n\nEverything about alpha.".to_string());
    }

    // The next frame polls it into the session.
    modal.poll_doc(&state);
    match &modal.session().unwrap().doc {
        DocState::Ready(text) => assert!(text.contains("Everything about alpha.")),
        other => panic!("expected Ready, got {:?}", other),
    }
    assert!(modal.wants_doc().is_none());
}

#[test]
fn test_doc_gives_up_after_wait_and_uses_description() {
    let mut modal = ModalController::new();
    let t0 = Instant::now();
    modal.open(project(9, "slowpoke", None), t0);

    modal.tick(t0 + DOC_WAIT);

    match &modal.session().unwrap().doc {
        DocState::Fallback(text) => assert_eq!(text, "slowpoke in one line"),
        other => panic!("expected Fallback, got {:?}", other),
    }
}

#[test]
fn test_sync_seq_bumps_signal_listing_changes() {
    let mut state = AppState::new("octocat", 150);
    assert_eq!(state.sync_seq, 0);

    publish(&mut state, vec![project(1, "a", None)]);
    assert_eq!(state.sync_seq, 1);

    publish(&mut state, vec![project(1, "a", None), project(2, "b", None)]);
    assert_eq!(state.sync_seq, 2);
}
