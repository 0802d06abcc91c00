use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use unicode_width::UnicodeWidthStr;

use super::highlight_spans;
use crate::finder::{FinderOptions, FinderState};

const PROMPT: &str = "> ";
const POINTER: &str = "> ";
const NO_POINTER: &str = "  ";

pub fn draw(f: &mut Frame, state: &mut FinderState, options: &FinderOptions) {
    let area = f.size();
    let header_height = state.header().len() as u16;
    let info_height = if options.inline_info { 0 } else { 1 };

    let mut constraints = vec![
        Constraint::Length(1),
        Constraint::Length(info_height),
        Constraint::Length(header_height),
        Constraint::Min(0),
    ];
    if !options.reverse {
        constraints.reverse();
    }
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);
    let (prompt_area, info_area, header_area, list_area) = if options.reverse {
        (chunks[0], chunks[1], chunks[2], chunks[3])
    } else {
        (chunks[3], chunks[2], chunks[1], chunks[0])
    };

    draw_prompt(f, state, options, prompt_area);
    if !options.inline_info {
        f.render_widget(Paragraph::new(info_line(state)), info_area);
    }
    draw_header(f, state, header_area);
    draw_list(f, state, options, list_area);
}

fn info_line(state: &FinderState) -> Line<'static> {
    Line::from(Span::styled(
        format!("  {}/{}", state.matches().len(), state.total()),
        Style::default().fg(Color::DarkGray),
    ))
}

fn draw_prompt(f: &mut Frame, state: &FinderState, options: &FinderOptions, area: Rect) {
    let mut spans = vec![
        Span::styled(
            PROMPT,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(state.query().to_string()),
    ];
    if options.inline_info {
        spans.push(Span::styled(
            format!("  < {}/{}", state.matches().len(), state.total()),
            Style::default().fg(Color::DarkGray),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);

    let cursor_x = area.x + (PROMPT.width() + state.query().width()) as u16;
    f.set_cursor(cursor_x.min(area.right().saturating_sub(1)), area.y);
}

fn draw_header(f: &mut Frame, state: &FinderState, area: Rect) {
    let style = Style::default().fg(Color::Yellow);
    let lines: Vec<Line> = state
        .header()
        .iter()
        .map(|h| Line::from(vec![Span::raw(NO_POINTER), Span::styled(h.as_str(), style)]))
        .collect();
    f.render_widget(Paragraph::new(lines), area);
}

fn draw_list(f: &mut Frame, state: &mut FinderState, options: &FinderOptions, area: Rect) {
    let height = area.height as usize;
    let window = state.window(height);
    let cursor = state.cursor();

    let mut lines: Vec<Line> = state.matches()[window.clone()]
        .iter()
        .zip(window)
        .map(|(m, rank)| {
            let selected = rank == cursor;
            let base = if selected {
                Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let pointer = if selected {
                Span::styled(POINTER, base.fg(Color::Red))
            } else {
                Span::raw(NO_POINTER)
            };
            let mut spans = vec![pointer];
            spans.extend(highlight_spans(state.item(m), &m.positions, base));
            Line::from(spans)
        })
        .collect();

    if !options.reverse {
        // best match sits at the bottom, right above the prompt
        lines.reverse();
        let padding = height.saturating_sub(lines.len());
        let mut padded = vec![Line::default(); padding];
        padded.append(&mut lines);
        lines = padded;
    }
    f.render_widget(Paragraph::new(lines), area);
}
