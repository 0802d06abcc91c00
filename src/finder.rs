use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{self, disable_raw_mode, enable_raw_mode},
};
use fuzzy_matcher::{skim::SkimMatcherV2, FuzzyMatcher};
use ratatui::{backend::CrosstermBackend, Terminal, TerminalOptions, Viewport};
use std::io::{self, Stderr};

use crate::error::Result;
use crate::table::HEADER_LINES;
use crate::ui;

/// The finder never shrinks below this many rows unless the terminal does.
const MIN_HEIGHT: u16 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct FinderOptions {
    /// Leading input lines shown as a fixed header, never matched.
    pub header_lines: usize,
    /// Show the match counter on the prompt line.
    pub inline_info: bool,
    /// Viewport height in percent of the terminal rows.
    pub height_percent: u16,
    /// Prompt on top and best match right below it.
    pub reverse: bool,
}

impl Default for FinderOptions {
    fn default() -> Self {
        Self {
            header_lines: HEADER_LINES,
            inline_info: true,
            height_percent: 30,
            reverse: true,
        }
    }
}

impl FinderOptions {
    pub fn viewport_height(&self, terminal_rows: u16) -> u16 {
        let wanted = (u32::from(terminal_rows) * u32::from(self.height_percent) / 100) as u16;
        wanted.max(MIN_HEIGHT).min(terminal_rows)
    }
}

/// Picks one line out of a block of text.
///
/// Returns the committed line verbatim, or `None` when the user backs out.
pub trait Finder {
    fn find(&mut self, input: &str, options: &FinderOptions) -> Result<Option<String>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Accept,
    Abort,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Position of the item in the input, header excluded.
    pub index: usize,
    pub score: i64,
    /// Char offsets of the matched characters.
    pub positions: Vec<usize>,
}

/// Query, ranking and cursor of a finder session, without any terminal.
pub struct FinderState {
    header: Vec<String>,
    items: Vec<String>,
    query: String,
    matches: Vec<Match>,
    cursor: usize,
    offset: usize,
    matcher: SkimMatcherV2,
}

impl FinderState {
    pub fn new(input: &str, header_lines: usize) -> Self {
        let mut lines = input.lines().map(str::to_string);
        let header = lines.by_ref().take(header_lines).collect();
        let items = lines.collect();

        let mut state = Self {
            header,
            items,
            query: String::new(),
            matches: Vec::new(),
            cursor: 0,
            offset: 0,
            matcher: SkimMatcherV2::default(),
        };
        state.refilter();
        state
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn item(&self, m: &Match) -> &str {
        &self.items[m.index]
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected(&self) -> Option<&str> {
        self.matches.get(self.cursor).map(|m| self.item(m))
    }

    /// Range of `matches` that fits in `height` rows with the cursor visible.
    pub fn window(&mut self, height: usize) -> std::ops::Range<usize> {
        if height == 0 {
            return 0..0;
        }
        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + height {
            self.offset = self.cursor + 1 - height;
        }
        self.offset..(self.offset + height).min(self.matches.len())
    }

    pub fn push_char(&mut self, c: char) {
        self.query.push(c);
        self.refilter();
    }

    pub fn pop_char(&mut self) {
        if self.query.pop().is_some() {
            self.refilter();
        }
    }

    pub fn clear_query(&mut self) {
        if !self.query.is_empty() {
            self.query.clear();
            self.refilter();
        }
    }

    pub fn delete_word(&mut self) {
        let start = self
            .query
            .trim_end()
            .trim_end_matches(|c: char| !c.is_whitespace())
            .len();
        self.query.truncate(start);
        self.refilter();
    }

    /// Toward the prompt, i.e. to a better ranked match.
    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.cursor + 1 < self.matches.len() {
            self.cursor += 1;
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match (key.code, ctrl) {
            (KeyCode::Esc, _)
            | (KeyCode::Char('c'), true)
            | (KeyCode::Char('g'), true)
            | (KeyCode::Char('q'), true) => return Action::Abort,
            (KeyCode::Enter, _) | (KeyCode::Char('m'), true) => return Action::Accept,
            (KeyCode::Up, _) | (KeyCode::Char('p'), true) | (KeyCode::Char('k'), true) => {
                self.move_up()
            }
            (KeyCode::Down, _) | (KeyCode::Char('n'), true) | (KeyCode::Char('j'), true) => {
                self.move_down()
            }
            (KeyCode::Backspace, _) | (KeyCode::Char('h'), true) => self.pop_char(),
            (KeyCode::Char('u'), true) => self.clear_query(),
            (KeyCode::Char('w'), true) => self.delete_word(),
            (KeyCode::Char(c), false) => self.push_char(c),
            _ => {}
        }
        Action::Continue
    }

    fn refilter(&mut self) {
        self.matches = if self.query.is_empty() {
            (0..self.items.len())
                .map(|index| Match {
                    index,
                    score: 0,
                    positions: Vec::new(),
                })
                .collect()
        } else {
            let mut matches: Vec<Match> = self
                .items
                .iter()
                .enumerate()
                .filter_map(|(index, item)| {
                    self.matcher
                        .fuzzy_indices(item, &self.query)
                        .map(|(score, positions)| Match {
                            index,
                            score,
                            positions,
                        })
                })
                .collect();
            // stable: equal scores keep input order
            matches.sort_by(|a, b| b.score.cmp(&a.score));
            matches
        };
        self.cursor = 0;
        self.offset = 0;
    }
}

/// Raw mode plus an inline ratatui viewport; both undone on drop.
struct FinderTerminal {
    terminal: Terminal<CrosstermBackend<Stderr>>,
}

impl FinderTerminal {
    fn new(height: u16) -> Result<Self> {
        enable_raw_mode()?;
        let backend = CrosstermBackend::new(io::stderr());
        let terminal = match Terminal::with_options(
            backend,
            TerminalOptions {
                viewport: Viewport::Inline(height),
            },
        ) {
            Ok(terminal) => terminal,
            Err(e) => {
                let _ = disable_raw_mode();
                return Err(e.into());
            }
        };
        Ok(Self { terminal })
    }
}

impl Drop for FinderTerminal {
    fn drop(&mut self) {
        let _ = self.terminal.clear();
        let _ = disable_raw_mode();
        let _ = self.terminal.show_cursor();
    }
}

/// Interactive finder drawn inline on the controlling terminal.
#[derive(Debug, Default)]
pub struct TerminalFinder;

impl Finder for TerminalFinder {
    fn find(&mut self, input: &str, options: &FinderOptions) -> Result<Option<String>> {
        let mut state = FinderState::new(input, options.header_lines);
        let (_, rows) = terminal::size()?;
        let height = options.viewport_height(rows);
        tracing::debug!(
            "Opening finder: {} items, {} rows of {}",
            state.total(),
            height,
            rows
        );

        let mut session = FinderTerminal::new(height)?;
        loop {
            session
                .terminal
                .draw(|f| ui::finder_view::draw(f, &mut state, options))?;

            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match state.handle_key(key) {
                    Action::Continue => {}
                    Action::Accept => return Ok(state.selected().map(str::to_string)),
                    Action::Abort => return Ok(None),
                }
            }
        }
    }
}
