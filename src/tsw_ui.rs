use anyhow::Context;
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Span, Spans, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::{Frame, Terminal};
use std::io;
use std::time::Duration;
use unicode_width::UnicodeWidthStr;

use crate::tsw_board::Coord2;
use crate::tsw_color::{Adapt, tile_glyph};
use crate::tsw_config::Config;
use crate::tsw_session::{ActionResult, DisplayKind, GameSession, Outcome, format_elapsed};

// Timer label refresh interval
const TICK_RATE: Duration = Duration::from_millis(100);

const KEY_HINTS: [(&str, &str); 4] = [("Space", "Reveal"), ("F", "Flag"), ("F2", "New"), ("Esc", "Exit")];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

// Front-end state: what is on screen, never the game rules
#[derive(Debug)]
struct UiState {
    view: Vec<DisplayKind>,      // Cached display per tile, patched from action results
    size: Coord2,                // Board dimensions the cache was built for
    cursor: Coord2,              // Keyboard cursor (cell coords)
    board_rect: Option<Rect>,    // Last drawn board area, for mouse hit-testing
    prompt: Option<Outcome>,     // Play-again prompt after a terminal outcome
}

impl UiState {
    fn new(session: &GameSession) -> Self {
        let mut ui = UiState {
            view: Vec::new(),
            size: session.board().size(),
            cursor: (0, 0),
            board_rect: None,
            prompt: None,
        };
        ui.repaint(session);
        ui
    }

    // Full repaint, used at start and after a restart
    fn repaint(&mut self, session: &GameSession) {
        self.size = session.board().size();
        self.view = session
            .board()
            .iter()
            .map(|(pos, _)| session.display_kind(pos))
            .collect();
        self.cursor = (self.cursor.0.min(self.size.0 - 1), self.cursor.1.min(self.size.1 - 1));
        self.prompt = None;
    }

    // Incremental update: only the tiles named in the result change
    fn apply(&mut self, result: &ActionResult) {
        if result.is_empty() {
            return;
        }
        for tile in &result.changed_tiles {
            let idx = tile.y * self.size.0 + tile.x;
            self.view[idx] = tile.display;
        }
        if result.outcome.is_some() {
            self.prompt = result.outcome;
        }
    }

    fn display_at(&self, (x, y): Coord2) -> DisplayKind {
        self.view[y * self.size.0 + x]
    }

    fn step_cursor(&mut self, dx: isize, dy: isize) {
        let nx = (self.cursor.0 as isize + dx).clamp(0, (self.size.0 - 1) as isize) as usize;
        let ny = (self.cursor.1 as isize + dy).clamp(0, (self.size.1 - 1) as isize) as usize;
        self.cursor = (nx, ny);
    }

    // Map a terminal cell to board coordinates; each tile is two columns wide
    fn cell_at(&self, column: u16, row: u16) -> Option<Coord2> {
        let brect = self.board_rect?;
        let inner = Rect::new(brect.x + 1, brect.y + 1, brect.width.saturating_sub(2), brect.height.saturating_sub(2));
        if column < inner.x || row < inner.y || column >= inner.x + inner.width || row >= inner.y + inner.height {
            return None;
        }
        let cx = ((column - inner.x) / 2) as usize;
        let cy = (row - inner.y) as usize;
        (cx < self.size.0 && cy < self.size.1).then_some((cx, cy))
    }
}

pub fn run(cfg: &Config, session: &mut GameSession) -> anyhow::Result<()> {
    enable_raw_mode().context("cannot enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnableMouseCapture, terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, cfg, session);

    // always hand the terminal back, even when the loop failed
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableMouseCapture, terminal::LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

fn event_loop<B: Backend>(terminal: &mut Terminal<B>, cfg: &Config, session: &mut GameSession) -> anyhow::Result<()> {
    let mut ui = UiState::new(session);

    loop {
        terminal.draw(|f| draw(f, cfg, session, &mut ui))?;

        // redraw at least once per tick so the timer label keeps moving
        if event::poll(TICK_RATE)? {
            let flow = match event::read()? {
                // Windows reports releases too; act on presses only
                Event::Key(KeyEvent { code, kind: KeyEventKind::Press, .. }) => handle_key(code, session, &mut ui)?,
                Event::Mouse(me) => handle_mouse(me, session, &mut ui)?,
                _ => Flow::Continue,
            };
            if flow == Flow::Quit {
                break;
            }
        }
    }

    tracing::info!(
        state = ?session.state(),
        started = session.start_time().is_some(),
        revealed = session.revealed_count(),
        correct_flags = session.correct_flag_count(),
        "leaving game"
    );
    Ok(())
}

fn handle_key(code: KeyCode, session: &mut GameSession, ui: &mut UiState) -> anyhow::Result<Flow> {
    if ui.prompt.is_some() {
        match code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => new_game(session, ui),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc | KeyCode::Char('q') => return Ok(Flow::Quit),
            _ => {}
        }
        return Ok(Flow::Continue);
    }

    match code {
        KeyCode::Esc | KeyCode::Char('q') => return Ok(Flow::Quit),
        KeyCode::F(2) => new_game(session, ui),
        KeyCode::Left => ui.step_cursor(-1, 0),
        KeyCode::Right => ui.step_cursor(1, 0),
        KeyCode::Up => ui.step_cursor(0, -1),
        KeyCode::Down => ui.step_cursor(0, 1),
        KeyCode::Char(' ') | KeyCode::Enter => {
            let (x, y) = ui.cursor;
            ui.apply(&session.request_reveal(x, y)?);
        }
        KeyCode::Char('f') | KeyCode::Char('F') => {
            let (x, y) = ui.cursor;
            ui.apply(&session.request_flag_toggle(x, y)?);
        }
        _ => {}
    }
    Ok(Flow::Continue)
}

fn handle_mouse(me: MouseEvent, session: &mut GameSession, ui: &mut UiState) -> anyhow::Result<Flow> {
    if ui.prompt.is_some() {
        return Ok(Flow::Continue);
    }
    let Some((x, y)) = ui.cell_at(me.column, me.row) else {
        return Ok(Flow::Continue);
    };
    match me.kind {
        MouseEventKind::Moved => ui.cursor = (x, y),
        MouseEventKind::Down(MouseButton::Left) => {
            ui.cursor = (x, y);
            ui.apply(&session.request_reveal(x, y)?);
        }
        MouseEventKind::Down(MouseButton::Right) => {
            ui.cursor = (x, y);
            ui.apply(&session.request_flag_toggle(x, y)?);
        }
        _ => {}
    }
    Ok(Flow::Continue)
}

fn new_game(session: &mut GameSession, ui: &mut UiState) {
    session.restart();
    ui.repaint(session);
}

fn draw<B: Backend>(f: &mut Frame<B>, cfg: &Config, session: &GameSession, ui: &mut UiState) {
    let size = f.size();
    let (w, h) = ui.size;
    // board sizes are capped, but never let a cast wrap into a bogus small area
    let board_w = u16::try_from(w.saturating_mul(2)).unwrap_or(u16::MAX).saturating_add(3);
    let board_h = u16::try_from(h).unwrap_or(u16::MAX).saturating_add(2);
    let min_twidth = board_w.max(44);
    let min_theight = board_h.saturating_add(6);
    // If terminal too small, render a centered warning and skip normal UI
    if size.width < min_twidth || size.height < min_theight {
        let warn_lines = vec![
            Spans::from(Span::raw("Terminal size too small.")),
            Spans::from(Span::raw(format!("Minimum required: {} x {}", min_twidth, min_theight))),
        ];
        let warn = Paragraph::new(Text::from(warn_lines))
            .block(Block::default().borders(Borders::ALL).title("Resize Terminal"))
            .alignment(Alignment::Center);
        f.render_widget(Clear, size);
        let area = center_rect(40u16.min(size.width), 4u16.min(size.height), size);
        f.render_widget(warn, area);
        ui.board_rect = None;
        return;
    }

    // layout: timer row, center board, bottom status
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(board_h), Constraint::Length(3)].as_ref())
        .split(size);

    let timer = Paragraph::new(Spans::from(Span::styled(
        format_elapsed(session.elapsed()),
        Style::default().add_modifier(Modifier::BOLD),
    )))
    .block(Block::default().borders(Borders::ALL))
    .alignment(Alignment::Center);
    f.render_widget(timer, chunks[0]);

    f.render_widget(status_bar(session, chunks[2].width), chunks[2]);

    let board_bg = Color::DarkGray.adapted();
    let cursor_bg = Color::LightBlue.adapted();
    let triggered_bg = Color::Red.adapted();
    let board_area = center_rect(board_w, board_h, chunks[1]);
    ui.board_rect = Some(board_area);
    let mut lines = Vec::with_capacity(h);
    for y in 0..h {
        let mut spans = Vec::with_capacity(w + 1);
        for x in 0..w {
            let (glyph, fg) = tile_glyph(ui.display_at((x, y)), cfg.ascii_icons);
            let mut style = Style::default().fg(fg).bg(board_bg);
            if session.triggered_mine() == Some((x, y)) {
                style = style.bg(triggered_bg);
            }
            if ui.cursor == (x, y) && !session.is_finished() {
                style = style.bg(cursor_bg);
            }
            spans.push(Span::styled(format!(" {}", glyph), style));
        }
        // right-side padding column in board background
        spans.push(Span::styled(" ", Style::default().bg(board_bg)));
        lines.push(Spans::from(spans));
    }
    let title = format!("{}x{}", w, h);
    let board = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title(title).title_alignment(Alignment::Center))
        .alignment(Alignment::Left);
    f.render_widget(board, board_area);

    if let Some(outcome) = ui.prompt {
        let pb = bottom_centered_block(36, 6, size);
        f.render_widget(Clear, pb);
        let msg = match outcome {
            Outcome::Won => "You Win! Play again?",
            Outcome::Lost => "You Lose! Play again?",
        };
        let lines = vec![
            Spans::from(Span::raw("")),
            Spans::from(Span::styled(msg, Style::default().add_modifier(Modifier::BOLD))),
            Spans::from(Span::styled("[Y]es   [N]o", Style::default().fg(Color::Yellow.adapted()))),
        ];
        let p = Paragraph::new(Text::from(lines))
            .block(Block::default().borders(Borders::ALL).title("Game Over"))
            .alignment(Alignment::Center);
        f.render_widget(p, pb);
    }
}

// Counters on the left, key hints right-aligned
fn status_bar(session: &GameSession, width: u16) -> Paragraph<'static> {
    let left_text = format!(" Mines: {}   Flags: {} ", session.total_mines(), session.flag_count());
    let key_style = Style::default().fg(Color::Yellow.adapted()).add_modifier(Modifier::BOLD);

    let mut hint_spans = Vec::new();
    let mut hints_w = 0;
    for (i, (key, label)) in KEY_HINTS.iter().enumerate() {
        if i > 0 {
            hint_spans.push(Span::raw("  "));
            hints_w += 2;
        }
        hint_spans.push(Span::styled(key.to_string(), key_style));
        hint_spans.push(Span::raw(format!(": {}", label)));
        hints_w += key.width() + 2 + label.width();
    }

    let inner_w = width.saturating_sub(2) as usize;
    let left_w = left_text.as_str().width();
    let mid_spaces = if inner_w > left_w + hints_w + 1 { inner_w - left_w - hints_w - 1 } else { 1 };

    let mut spans = vec![Span::raw(left_text), Span::raw(" ".repeat(mid_spaces))];
    spans.extend(hint_spans);
    Paragraph::new(Spans::from(spans))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left)
}

fn center_rect(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn bottom_centered_block(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + r.height.saturating_sub(height);
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tsw_board::Board;
    use ratatui::backend::TestBackend;

    fn session(size: Coord2, mines: &[Coord2]) -> GameSession {
        GameSession::from_board(Board::from_mine_coords(size.0, size.1, mines).unwrap())
    }

    fn assert_view_matches(ui: &UiState, session: &GameSession) {
        for (pos, _) in session.board().iter() {
            assert_eq!(ui.display_at(pos), session.display_kind(pos), "tile {pos:?}");
        }
    }

    #[test]
    fn patched_view_tracks_session() {
        let mut s = session((5, 4), &[(4, 0), (4, 3)]);
        let mut ui = UiState::new(&s);
        assert!(ui.view.iter().all(|k| *k == DisplayKind::Plain));

        ui.apply(&s.request_flag_toggle(4, 0).unwrap());
        assert_view_matches(&ui, &s);
        ui.apply(&s.request_reveal(0, 0).unwrap());
        assert_view_matches(&ui, &s);
        assert_eq!(ui.prompt, None);

        ui.apply(&s.request_reveal(4, 3).unwrap());
        assert_view_matches(&ui, &s);
        assert_eq!(ui.prompt, Some(Outcome::Lost));
    }

    #[test]
    fn keys_drive_the_session() {
        let mut s = session((3, 3), &[(0, 0)]);
        let mut ui = UiState::new(&s);

        handle_key(KeyCode::Char('f'), &mut s, &mut ui).unwrap();
        assert_eq!(s.flag_count(), 1);
        handle_key(KeyCode::Right, &mut s, &mut ui).unwrap();
        handle_key(KeyCode::Down, &mut s, &mut ui).unwrap();
        handle_key(KeyCode::Down, &mut s, &mut ui).unwrap();
        handle_key(KeyCode::Down, &mut s, &mut ui).unwrap();
        assert_eq!(ui.cursor, (1, 2));

        handle_key(KeyCode::Char(' '), &mut s, &mut ui).unwrap();
        assert_eq!(ui.prompt, Some(Outcome::Won));
        // board input is locked while the prompt is open
        assert_eq!(handle_key(KeyCode::Left, &mut s, &mut ui).unwrap(), Flow::Continue);
        assert_eq!(ui.cursor, (1, 2));

        handle_key(KeyCode::Char('y'), &mut s, &mut ui).unwrap();
        assert_eq!(ui.prompt, None);
        assert!(!s.is_finished());
        assert_eq!(s.flag_count(), 0);
        assert_view_matches(&ui, &s);
    }

    #[test]
    fn declining_the_prompt_quits() {
        let mut s = session((2, 1), &[(0, 0)]);
        let mut ui = UiState::new(&s);
        handle_key(KeyCode::Char(' '), &mut s, &mut ui).unwrap();
        assert_eq!(ui.prompt, Some(Outcome::Lost));
        assert_eq!(handle_key(KeyCode::Char('n'), &mut s, &mut ui).unwrap(), Flow::Quit);
    }

    #[test]
    fn mouse_hit_test_maps_two_column_cells() {
        let s = session((4, 3), &[]);
        let mut ui = UiState::new(&s);
        ui.board_rect = Some(Rect::new(10, 5, 11, 5));

        assert_eq!(ui.cell_at(11, 6), Some((0, 0)));
        assert_eq!(ui.cell_at(12, 6), Some((0, 0)));
        assert_eq!(ui.cell_at(13, 7), Some((1, 1)));
        assert_eq!(ui.cell_at(18, 8), Some((3, 2)));
        // padding column and border
        assert_eq!(ui.cell_at(19, 8), None);
        assert_eq!(ui.cell_at(10, 6), None);
        assert_eq!(ui.cell_at(11, 9), None);
    }

    #[test]
    fn draws_board_and_counters() {
        let mut s = session((4, 3), &[(3, 2)]);
        let cfg = Config {
            ascii_icons: true,
            ..Config::default()
        };
        let mut ui = UiState::new(&s);
        ui.apply(&s.request_flag_toggle(3, 2).unwrap());

        let mut terminal = Terminal::new(TestBackend::new(60, 16)).unwrap();
        terminal.draw(|f| draw(f, &cfg, &s, &mut ui)).unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content.iter().map(|c| c.symbol.as_str()).collect();
        assert!(text.contains("00:00:00"));
        assert!(text.contains("Mines: 1   Flags: 1"));
        assert!(text.contains('F'));
        assert!(ui.board_rect.is_some());
    }

    #[test]
    fn largest_board_asks_for_a_bigger_terminal() {
        use crate::tsw_board::{MAX_HEIGHT, MAX_WIDTH};

        let s = session((MAX_WIDTH, MAX_HEIGHT), &[]);
        let mut ui = UiState::new(&s);
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| draw(f, &Config::default(), &s, &mut ui)).unwrap();

        let text: String = terminal.backend().buffer().content.iter().map(|c| c.symbol.as_str()).collect();
        assert!(text.contains("Resize"));
        assert!(text.contains("131 x 72"));
        assert!(ui.board_rect.is_none());
    }

    #[test]
    fn empty_results_leave_the_view_alone() {
        let mut s = session((3, 3), &[(0, 0)]);
        let mut ui = UiState::new(&s);
        ui.apply(&s.request_reveal(1, 1).unwrap());
        let before = ui.view.clone();

        let repeat = s.request_reveal(1, 1).unwrap();
        assert!(repeat.is_empty());
        ui.apply(&repeat);
        assert_eq!(ui.view, before);
        assert_eq!(ui.prompt, None);
    }

    #[test]
    fn small_terminal_shows_resize_warning() {
        let s = session((15, 15), &[]);
        let mut ui = UiState::new(&s);
        let mut terminal = Terminal::new(TestBackend::new(30, 10)).unwrap();
        terminal.draw(|f| draw(f, &Config::default(), &s, &mut ui)).unwrap();

        let text: String = terminal.backend().buffer().content.iter().map(|c| c.symbol.as_str()).collect();
        assert!(text.contains("Resize"));
        assert!(ui.board_rect.is_none());
    }
}
