use std::borrow::Cow;

use chrono::{DateTime, Utc};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap},
    Frame,
};

use super::modal::{DocState, ModalPhase, PreviewMode};
use super::state::{AppState, SyncPhase};
use super::UiState;
use crate::fetch::DataOrigin;

const SPINNER_FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

pub fn draw(f: &mut Frame, state: &AppState, ui: &UiState) {
    let mut constraints = vec![Constraint::Length(3)];
    if state.warning.is_some() {
        constraints.push(Constraint::Length(1));
    }
    constraints.push(Constraint::Min(0));
    if ui.show_logs {
        constraints.push(Constraint::Length(10));
    }
    constraints.push(Constraint::Length(1));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(f.area());

    let mut idx = 0;
    draw_header(f, state, chunks[idx], ui.spinner_frame);
    idx += 1;
    if let Some(warning) = &state.warning {
        draw_warning(f, warning, chunks[idx]);
        idx += 1;
    }
    let body = chunks[idx];
    idx += 1;
    if ui.show_logs {
        draw_logs(f, state, chunks[idx]);
        idx += 1;
    }
    draw_footer(f, ui, chunks[idx]);

    match &state.phase {
        SyncPhase::Failed(message) => draw_error(f, message, body),
        _ if state.projects.is_empty() && state.phase == SyncPhase::Syncing => {
            draw_loading(f, ui.spinner_frame, body)
        }
        _ if state.projects.is_empty() => draw_empty(f, body),
        _ => {
            let panes = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(5), Constraint::Length(7)])
                .split(body);
            draw_gallery(f, state, ui, panes[0]);
            draw_detail(f, state, ui, panes[1]);
        }
    }

    if ui.modal.is_visible() {
        draw_modal(f, ui, f.area());
    }
}

fn draw_header(f: &mut Frame, state: &AppState, area: Rect, spinner_frame: u8) {
    let block = Block::default().borders(Borders::ALL);
    f.render_widget(block, area);

    let left = Paragraph::new(Line::from(vec![
        Span::styled(
            " REPO GALLERY ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("\u{00b7} {} ", state.username),
            Style::default().fg(Color::White),
        ),
    ]));
    let inner = Rect {
        x: area.x + 1,
        y: area.y + 1,
        width: area.width.saturating_sub(2),
        height: 1,
    };
    f.render_widget(left, inner);

    let phase_span = match &state.phase {
        SyncPhase::Syncing => Span::styled(
            format!("{} SYNCING", spinner_char(spinner_frame)),
            Style::default().fg(Color::Yellow),
        ),
        SyncPhase::Ready => Span::styled("READY", Style::default().fg(Color::Green)),
        SyncPhase::Failed(_) => Span::styled(
            "FAILED",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
    };
    let mut right_spans = vec![phase_span];
    if let Some(origin) = state.origin {
        let (label, color) = origin_badge(origin);
        right_spans.push(Span::raw("  "));
        right_spans.push(Span::styled(label, Style::default().fg(color)));
    }
    if let Some(last_sync) = state.last_sync {
        let age = (Utc::now() - last_sync).to_std().unwrap_or_default();
        right_spans.push(Span::styled(
            format!("  synced {} ago", format_age(age)),
            Style::default().fg(Color::DarkGray),
        ));
    }
    right_spans.push(Span::styled(
        format!("  up {} ", state.uptime()),
        Style::default().fg(Color::DarkGray),
    ));
    let right = Paragraph::new(Line::from(right_spans)).alignment(Alignment::Right);
    f.render_widget(right, inner);
}

fn draw_warning(f: &mut Frame, warning: &str, area: Rect) {
    let line = Paragraph::new(Line::from(Span::styled(
        format!(" \u{26a0} {}", warning),
        Style::default().fg(Color::Yellow),
    )));
    f.render_widget(line, area);
}

fn draw_gallery(f: &mut Frame, state: &AppState, ui: &UiState, area: Rect) {
    let elapsed_ms = ui.reveal_started.elapsed().as_millis() as u64;
    let revealed = reveal_count(elapsed_ms, state.projects.len(), state.stagger_ms);
    let name_width = area.width.saturating_sub(2 + 12 + 10 + 24 + 8) as usize;

    let rows: Vec<Row> = state
        .projects
        .iter()
        .take(revealed)
        .enumerate()
        .map(|(i, project)| {
            let marker = if i == ui.selected { "\u{25b8}" } else { " " };
            let language = project
                .language
                .clone()
                .unwrap_or_else(|| "\u{2014}".to_string());
            Row::new(vec![
                Cell::from(marker),
                Cell::from(truncate_with_ellipsis(&display_title(&project.name), name_width.max(12)).into_owned()),
                Cell::from(language),
                Cell::from(format_updated(project.pushed_at)),
                Cell::from(tags_line(&project.enrichment.tags)),
            ])
        })
        .collect();

    let header = Row::new(vec!["", "PROJECT", "LANGUAGE", "UPDATED", "TAGS"]).style(
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    );
    let title = format!(" PROJECTS {}/{} ", revealed, state.projects.len());
    let table = Table::new(
        rows,
        [
            Constraint::Length(2),
            Constraint::Min(24),
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Length(24),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(title))
    .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));

    let mut table_state = TableState::default();
    if ui.selected < revealed {
        table_state.select(Some(ui.selected));
    }
    f.render_stateful_widget(table, area, &mut table_state);
}

fn draw_detail(f: &mut Frame, state: &AppState, ui: &UiState, area: Rect) {
    let Some(project) = state.projects.get(ui.selected) else {
        return;
    };
    let text_width = area.width.saturating_sub(16) as usize;
    let field = |label: &'static str, value: &str| {
        Line::from(vec![
            Span::styled(
                format!(" {:<12}", label),
                Style::default().fg(Color::DarkGray),
            ),
            Span::raw(truncate_with_ellipsis(value, text_width.max(12)).into_owned()),
        ])
    };
    let lines = vec![
        field("PROBLEM", &project.enrichment.problem),
        field("STACK", &project.enrichment.architecture),
        field("IMPACT", &project.enrichment.impact),
        field("TAGS", &tags_line(&project.enrichment.tags)),
        Line::from(Span::styled(
            format!(
                " {:<12}{}",
                "LINKS",
                match project.live_url() {
                    Some(url) => format!("{}  \u{00b7}  {}", url, project.source_url),
                    None => project.source_url.clone(),
                }
            ),
            Style::default().fg(Color::Blue),
        )),
    ];
    let title = format!(
        " {} \u{00b7} {} ",
        display_title(&project.name),
        card_label(project.language.as_deref(), project.pushed_at)
    );
    let detail = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(detail, area);
}

fn draw_loading(f: &mut Frame, spinner_frame: u8, area: Rect) {
    let text = Paragraph::new(format!(
        "{} Syncing projects\u{2026}",
        spinner_char(spinner_frame)
    ))
    .style(Style::default().fg(Color::Yellow))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(text, centered_rect(50, 20, area));
}

fn draw_empty(f: &mut Frame, area: Rect) {
    let text = Paragraph::new(vec![
        Line::from("No projects found."),
        Line::from(Span::styled(
            "Press r to refresh.",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(text, centered_rect(50, 24, area));
}

fn draw_error(f: &mut Frame, message: &str, area: Rect) {
    let popup = centered_rect(70, 40, area);
    let text = Paragraph::new(vec![
        Line::default(),
        Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(Color::White),
        )),
        Line::default(),
        Line::from(Span::styled(
            "Press R to retry.",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .wrap(Wrap { trim: true })
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(Span::styled(
                " SYSTEM SYNC FAILED ",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
    );
    f.render_widget(text, popup);
}

fn draw_logs(f: &mut Frame, state: &AppState, area: Rect) {
    let visible = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = state
        .logs
        .iter()
        .rev()
        .take(visible)
        .rev()
        .map(|entry| {
            let level_color = match entry.level.as_str() {
                "ERROR" => Color::Red,
                "WARN" => Color::Yellow,
                _ => Color::DarkGray,
            };
            Line::from(vec![
                Span::styled(
                    format!(" {} ", entry.time),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(format!("{:<5} ", entry.level), Style::default().fg(level_color)),
                Span::raw(entry.message.clone()),
            ])
        })
        .collect();
    let logs = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" LOG "));
    f.render_widget(logs, area);
}

fn draw_footer(f: &mut Frame, ui: &UiState, area: Rect) {
    let hints = if ui.modal.is_visible() {
        " l live \u{00b7} s source \u{00b7} o open preview \u{00b7} b open source \u{00b7} esc close"
    } else {
        " j/k select \u{00b7} enter preview \u{00b7} b source \u{00b7} r refresh \u{00b7} R force \u{00b7} g logs \u{00b7} q quit"
    };
    let footer = Paragraph::new(hints).style(Style::default().fg(Color::DarkGray));
    f.render_widget(footer, area);
}

fn draw_modal(f: &mut Frame, ui: &UiState, area: Rect) {
    let Some(session) = ui.modal.session() else {
        return;
    };
    let popup = centered_rect(84, 82, area);
    f.render_widget(Clear, popup);

    let border_style = match ui.modal.phase() {
        ModalPhase::Opening | ModalPhase::Closing => Style::default().fg(Color::DarkGray),
        _ => Style::default().fg(Color::Cyan),
    };
    let title = format!(
        " {} \u{00b7} {} ",
        display_title(&session.item.name),
        subtitle(session.item.language.as_deref())
    );
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(title);
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let panes = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(inner);

    let live_label = if session.live_available() {
        Line::from(" LIVE ")
    } else {
        Line::from(Span::styled(
            " LIVE ",
            Style::default().fg(Color::DarkGray),
        ))
    };
    let tabs = Tabs::new(vec![live_label, Line::from(" SOURCE ")])
        .select(match session.mode {
            PreviewMode::Live => 0,
            PreviewMode::Source => 1,
        })
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(tabs, panes[0]);

    let url_width = panes[1].width.saturating_sub(8) as usize;
    let mut frame_lines = vec![match session.frame.src() {
        Some(src) => Line::from(vec![
            Span::styled(" URL  ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                truncate_with_ellipsis(src, url_width.max(12)).into_owned(),
                Style::default().fg(Color::Blue),
            ),
        ]),
        None => Line::from(Span::styled(
            " preview torn down",
            Style::default().fg(Color::DarkGray),
        )),
    }];
    frame_lines.push(match ui.modal.phase() {
        ModalPhase::Opening => Line::from(Span::styled(
            format!(" {} loading preview\u{2026}", spinner_char(ui.spinner_frame)),
            Style::default().fg(Color::Yellow),
        )),
        ModalPhase::Closing => Line::from(Span::styled(
            " closing\u{2026}",
            Style::default().fg(Color::DarkGray),
        )),
        _ => Line::from(Span::styled(
            " o opens this URL in your browser",
            Style::default().fg(Color::DarkGray),
        )),
    });
    if !session.item.enrichment.impact_is_default() {
        frame_lines.push(Line::from(vec![
            Span::styled(" IMPACT ", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::raw(
                truncate_with_ellipsis(&session.item.enrichment.impact, url_width.max(12))
                    .into_owned(),
            ),
        ]));
    }
    f.render_widget(Paragraph::new(frame_lines), panes[1]);

    let doc = match &session.doc {
        DocState::Ready(text) => Paragraph::new(text.as_str())
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::TOP).title(" DOCUMENTATION ")),
        DocState::Loading { .. } => Paragraph::new(format!(
            " {} Loading documentation\u{2026}",
            spinner_char(ui.spinner_frame)
        ))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::TOP).title(" DOCUMENTATION ")),
        DocState::Fallback(text) => Paragraph::new(text.as_str())
            .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC))
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::TOP).title(" DOCUMENTATION ")),
    };
    f.render_widget(doc, panes[2]);

    if let Some(notice) = ui.modal.notice() {
        let line = Paragraph::new(Span::styled(
            format!(" {} ", notice),
            Style::default().fg(Color::Black).bg(Color::Yellow),
        ));
        f.render_widget(line, panes[3]);
    }
}

/// How many cards the staggered reveal shows after `elapsed_ms`. The
/// first card is visible immediately; each step adds one.
fn reveal_count(elapsed_ms: u64, total: usize, stagger_ms: u64) -> usize {
    if total == 0 {
        return 0;
    }
    if stagger_ms == 0 {
        return total;
    }
    ((elapsed_ms / stagger_ms) as usize + 1).min(total)
}

fn spinner_char(frame: u8) -> char {
    SPINNER_FRAMES[frame as usize % SPINNER_FRAMES.len()]
}

fn origin_badge(origin: DataOrigin) -> (&'static str, Color) {
    match origin {
        DataOrigin::Fresh => ("LIVE", Color::Green),
        DataOrigin::CacheFresh => ("CACHE", Color::Cyan),
        DataOrigin::CacheStale => ("STALE", Color::Yellow),
    }
}

fn display_title(name: &str) -> String {
    name.replace('-', " ").to_uppercase()
}

fn subtitle(language: Option<&str>) -> String {
    language.unwrap_or("PROJECT").to_uppercase()
}

fn format_updated(pushed_at: DateTime<Utc>) -> String {
    if pushed_at == DateTime::<Utc>::MIN_UTC {
        return "\u{2014}".to_string();
    }
    pushed_at.format("%b %Y").to_string().to_uppercase()
}

fn card_label(language: Option<&str>, pushed_at: DateTime<Utc>) -> String {
    format!(
        "{} \u{2022} {}",
        language.unwrap_or("Systems").to_uppercase(),
        format_updated(pushed_at)
    )
}

fn tags_line(tags: &[String]) -> String {
    tags.iter()
        .take(3)
        .map(|t| format!("#{}", t))
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_age(age: std::time::Duration) -> String {
    let secs = age.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else {
        format!("{}h{:02}m", secs / 3600, (secs % 3600) / 60)
    }
}

fn truncate_with_ellipsis(s: &str, max_width: usize) -> Cow<'_, str> {
    if s.chars().count() <= max_width {
        return Cow::Borrowed(s);
    }
    if max_width <= 3 {
        return Cow::Owned("...".chars().take(max_width).collect());
    }
    let truncated: String = s.chars().take(max_width - 3).collect();
    Cow::Owned(format!("{}...", truncated))
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);
    horizontal[1]
}
