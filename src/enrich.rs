//! README section extraction.
//!
//! Cards and the preview modal show three short narrative fields per
//! project. Each field is filled from the first README section whose
//! heading matches one of a small list of labels, in priority order;
//! repos without a usable section keep the stock defaults assigned at
//! listing time.

use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};

use crate::github::types::Project;

/// Display cap for extracted fields, counted in characters. Longer
/// sections are cut to 149 characters plus an ellipsis.
pub const FIELD_MAX: usize = 150;

/// Headings deeper than this never start a section.
const MATCH_MAX_RANK: u8 = 3;

const PROBLEM_LABELS: &[&str] = &["Problem", "Challenge", "Overview"];
const ARCHITECTURE_LABELS: &[&str] = &["Architecture", "Tech Stack", "Solution"];
const IMPACT_LABELS: &[&str] = &["Impact", "Results", "Features"];

/// Folds one fetched README into a project: narrative fields from
/// matching sections, and the raw text kept for the modal.
pub fn apply_readme(mut project: Project, markdown: &str) -> Project {
    if let Some(text) = extract_first(markdown, PROBLEM_LABELS) {
        project.enrichment.problem = truncate_field(&text);
    }
    if let Some(text) = extract_first(markdown, ARCHITECTURE_LABELS) {
        project.enrichment.architecture = truncate_field(&text);
    }
    if let Some(text) = extract_first(markdown, IMPACT_LABELS) {
        project.enrichment.impact = truncate_field(&text);
    }
    project.readme = Some(markdown.to_string());
    project
}

fn extract_first(markdown: &str, labels: &[&str]) -> Option<String> {
    labels.iter().find_map(|label| extract_section(markdown, label))
}

/// Pulls the body of the first section whose heading starts with
/// `label` (case-insensitive, H1 to H3 only). The body runs until the
/// next heading of equal or higher level; nested deeper headings stay
/// part of the body. Inline markup is flattened to plain text with
/// single spaces. Returns `None` for no match or an empty body, so
/// callers can fall through to the next label.
pub fn extract_section(markdown: &str, label: &str) -> Option<String> {
    let mut heading_rank_in_progress: Option<u8> = None;
    let mut heading_text = String::new();
    let mut section_rank: Option<u8> = None;
    let mut body = String::new();

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                heading_rank_in_progress = Some(heading_rank(level));
                heading_text.clear();
            }
            Event::End(TagEnd::Heading(level)) => {
                let rank = heading_rank(level);
                heading_rank_in_progress = None;
                match section_rank {
                    None => {
                        if rank <= MATCH_MAX_RANK && heading_matches(&heading_text, label) {
                            section_rank = Some(rank);
                        }
                    }
                    Some(start_rank) => {
                        if rank <= start_rank {
                            break;
                        }
                        body.push_str(&heading_text);
                        body.push(' ');
                    }
                }
            }
            Event::Text(text) | Event::Code(text) => {
                if heading_rank_in_progress.is_some() {
                    heading_text.push_str(&text);
                } else if section_rank.is_some() {
                    body.push_str(&text);
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if heading_rank_in_progress.is_some() {
                    heading_text.push(' ');
                } else if section_rank.is_some() {
                    body.push(' ');
                }
            }
            Event::End(TagEnd::Paragraph) | Event::End(TagEnd::Item) => {
                if section_rank.is_some() {
                    body.push(' ');
                }
            }
            _ => {}
        }
    }

    section_rank?;
    let body = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if body.is_empty() {
        None
    } else {
        Some(body)
    }
}

fn heading_rank(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn heading_matches(heading: &str, label: &str) -> bool {
    let mut heading_chars = heading.trim().chars();
    label.chars().all(|expected| {
        heading_chars
            .next()
            .is_some_and(|got| got.eq_ignore_ascii_case(&expected))
    })
}

/// Caps a field at [`FIELD_MAX`] characters, the last one an ellipsis
/// when anything was cut. Char-counted, so multibyte text never
/// splits.
pub fn truncate_field(text: &str) -> String {
    if text.chars().count() <= FIELD_MAX {
        return text.to_string();
    }
    let mut out: String = text.chars().take(FIELD_MAX - 1).collect();
    out.push('\u{2026}');
    out
}
