use std::fmt::Write;

use serde::Serialize;

use crate::model::view::{GroupView, RenderModel, SessionSummary, TabMode, TabView};
use crate::util::unicode::{display_width, single_line, truncate_to_width};

/// Cells reserved for the title column of a tab row
const TITLE_WIDTH: usize = 28;

pub fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Text rendering
// ---------------------------------------------------------------------------

/// Plain-text rendering of a render model.
pub fn render_view(model: &RenderModel) -> String {
    let mut out = String::new();
    match model.window_id {
        Some(w) => {
            let _ = write!(out, "window {}", w);
        }
        None => out.push_str("no window"),
    }
    if !model.filter.is_empty() {
        let _ = write!(out, "  filter: \"{}\"", model.filter);
    }
    out.push('\n');

    if !model.sessions.is_empty() {
        let names: Vec<String> = model
            .sessions
            .iter()
            .map(|s| {
                let marker = if s.active { "*" } else { "" };
                format!("{}{} ({})", marker, single_line(&s.title), s.tab_count)
            })
            .collect();
        let _ = writeln!(out, "sessions: {}", names.join("  "));
    }
    out.push('\n');

    if model.groups.is_empty() {
        out.push_str("(no tabs)\n");
    }
    for group in &model.groups {
        render_group(&mut out, group);
    }

    if !model.nav.query.is_empty() {
        let _ = writeln!(out, "\nhistory for \"{}\":", model.nav.query);
        for item in &model.nav.results {
            let _ = writeln!(out, "  {}  {}", pad_title(&item.title), item.url);
        }
    }
    out
}

fn render_group(out: &mut String, group: &GroupView) {
    let glyph = if group.collapsed { '\u{25b8}' } else { '\u{25be}' };
    let _ = write!(out, "{} {}", glyph, group.title);
    if group.key != group.title {
        let _ = write!(out, " [{}]", group.key);
    }
    let _ = writeln!(out, " ({})", group.count());
    if group.collapsed {
        return;
    }
    for view in &group.tabs {
        render_tab(out, view);
    }
}

fn render_tab(out: &mut String, view: &TabView) {
    let tab = &view.tab;
    let active = if tab.active { '*' } else { ' ' };
    let pinned = if tab.pinned { 'p' } else { ' ' };
    let detail = match &view.mode {
        TabMode::Normal => tab.url.clone(),
        TabMode::Editing(text) => format!("edit> {}", text),
    };
    let _ = writeln!(
        out,
        "  {}{} {:>4}  {}  {}",
        active,
        pinned,
        tab.id,
        pad_title(tab.display_title()),
        detail
    );
}

/// Title flattened to one line, cut or padded to the title column.
fn pad_title(title: &str) -> String {
    let mut cell = truncate_to_width(&single_line(title), TITLE_WIDTH);
    let width = display_width(&cell);
    cell.extend(std::iter::repeat_n(' ', TITLE_WIDTH.saturating_sub(width)));
    cell
}

/// One line per session: active marker, id, title, member count.
pub fn render_sessions(sessions: &[SessionSummary]) -> String {
    let mut out = String::new();
    for s in sessions {
        let marker = if s.active { '*' } else { ' ' };
        let _ = writeln!(out, "{} {}  {} ({})", marker, s.id, single_line(&s.title), s.tab_count);
    }
    out
}
