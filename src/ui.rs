pub mod finder_view;

use ratatui::{
    style::{Color, Modifier, Style},
    text::Span,
};

/// Split `text` into spans with the chars at `positions` highlighted.
pub fn highlight_spans<'a>(text: &'a str, positions: &[usize], base: Style) -> Vec<Span<'a>> {
    let highlight = base.fg(Color::Green).add_modifier(Modifier::BOLD);

    let mut spans = Vec::new();
    let mut segment_start = 0;
    let mut segment_highlighted = false;
    for (i, (byte, _)) in text.char_indices().enumerate() {
        let highlighted = positions.contains(&i);
        if highlighted != segment_highlighted {
            if byte > segment_start {
                let style = if segment_highlighted { highlight } else { base };
                spans.push(Span::styled(&text[segment_start..byte], style));
            }
            segment_start = byte;
            segment_highlighted = highlighted;
        }
    }
    if segment_start < text.len() {
        let style = if segment_highlighted { highlight } else { base };
        spans.push(Span::styled(&text[segment_start..], style));
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlights_matched_runs() {
        let spans = highlight_spans("alice", &[0, 1, 4], Style::default());
        let parts: Vec<&str> = spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(parts, vec!["al", "ic", "e"]);
        assert!(spans[0].style.add_modifier.contains(Modifier::BOLD));
        assert!(!spans[1].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn positions_are_char_offsets() {
        let spans = highlight_spans("数据库", &[1], Style::default());
        let parts: Vec<&str> = spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(parts, vec!["数", "据", "库"]);
    }

    #[test]
    fn no_positions_is_one_plain_span() {
        let spans = highlight_spans("bob", &[], Style::default());
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].content, "bob");
    }
}
