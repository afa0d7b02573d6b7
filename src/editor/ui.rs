//! UI rendering for the editor.

use ratatui::{
    layout::{Constraint, Layout, Position, Rect},
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};
use unicode_width::UnicodeWidthStr;

use super::app::App;
use crate::suggest::{EditorDocument, GhostOverlay};

const BORDER: Color = Color::DarkGray;
const GHOST: Style = Style::new()
    .fg(Color::DarkGray)
    .add_modifier(Modifier::ITALIC);
const KEYBINDINGS: &[(&str, &str)] = &[
    ("Tab", "accept"),
    ("Esc", "dismiss"),
    ("^S/^Enter", "confirm"),
    ("^Q", "quit"),
];

pub fn render(frame: &mut Frame, app: &App) {
    let [header_area, source_area, editor_area, status_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Percentage(35),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    render_header(frame, app, header_area);
    render_source(frame, app, source_area);
    render_editor(frame, app, editor_area);
    render_status(frame, app, status_area);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::styled(
        " sidecar-tui ",
        Style::new().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )];
    if let Some(snapshot) = app.snapshot() {
        spans.push(Span::styled(
            snapshot.language_pair(),
            Style::new().fg(Color::Yellow),
        ));
        spans.push(Span::styled(
            format!("  received {}", snapshot.received_at.format("%H:%M:%S")),
            Style::new().fg(BORDER),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_source(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Source ")
        .borders(Borders::ALL)
        .border_style(Style::new().fg(BORDER));

    let text = app.snapshot().map_or_else(
        || Text::styled("No segment yet", Style::new().fg(BORDER)),
        |s| Text::raw(s.source_text.as_str()),
    );
    frame.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn render_editor(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Translation ")
        .borders(Borders::ALL)
        .border_style(Style::new().fg(Color::Cyan));
    let inner = block.inner(area);

    let document = app.document();
    let (row, col) = cursor_position(document);
    let scroll = row.saturating_sub(inner.height.saturating_sub(1));

    let lines = editor_lines(document, app.overlay());
    frame.render_widget(
        Paragraph::new(lines).block(block).scroll((scroll, 0)),
        area,
    );

    if inner.width > 0 && inner.height > 0 {
        frame.set_cursor_position(Position::new(
            inner.x + col.min(inner.width - 1),
            inner.y + row - scroll,
        ));
    }
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = Vec::new();
    if let Some(spinner) = app.spinner() {
        spans.push(Span::styled(format!("{spinner} "), Style::new().fg(Color::Yellow)));
    }
    spans.push(Span::styled(app.status(), Style::new().fg(Color::Green)));
    spans.push(Span::raw("  "));

    let separator = Span::styled(" │ ", Style::new().fg(BORDER));
    for (i, (key, desc)) in KEYBINDINGS.iter().enumerate() {
        if i > 0 {
            spans.push(separator.clone());
        }
        spans.push(Span::styled(*key, Style::new().fg(Color::Cyan)));
        spans.push(Span::raw(format!(": {desc}")));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Document text with the ghost text spliced in at its anchor.
fn editor_lines<'a>(
    document: &'a EditorDocument,
    overlay: Option<&'a GhostOverlay>,
) -> Vec<Line<'a>> {
    let (before, after) = overlay.map_or((document.text(), ""), |o| {
        document.split_at(o.anchor_offset)
    });
    let ghost = overlay.map_or("", |o| o.text.as_str());

    let mut lines = vec![Line::default()];
    for (chunk, style) in [(before, Style::new()), (ghost, GHOST), (after, Style::new())] {
        for (i, part) in chunk.split('\n').enumerate() {
            if i > 0 {
                lines.push(Line::default());
            }
            if !part.is_empty() {
                if let Some(line) = lines.last_mut() {
                    line.push_span(Span::styled(part, style));
                }
            }
        }
    }
    lines
}

/// Row and display column of the cursor.
fn cursor_position(document: &EditorDocument) -> (u16, u16) {
    let (before, _) = document.split_at(document.cursor());
    let row = before.matches('\n').count();
    let line = before.rsplit('\n').next().unwrap_or_default();
    (
        u16::try_from(row).unwrap_or(u16::MAX),
        u16::try_from(line.width()).unwrap_or(u16::MAX),
    )
}
