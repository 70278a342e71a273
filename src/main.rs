use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use xp_ladder::feed::{self, FETCH_FAILED_MESSAGE};
use xp_ladder::state::{AppState, Delta, Entry, LoadPhase, ProviderCommand, apply_delta};
use xp_ladder::viewer::{opt_env, viewer_profile_from_env};

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
    poll: Duration,
    last_poll: Instant,
}

impl App {
    fn new(cmd_tx: Option<mpsc::Sender<ProviderCommand>>) -> Self {
        let poll_secs = opt_env("LADDER_POLL_SECS")
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(30)
            .max(5);
        Self {
            state: AppState::new(),
            should_quit: false,
            cmd_tx,
            poll: Duration::from_secs(poll_secs),
            last_poll: Instant::now(),
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('r') | KeyCode::Char('R') => self.request_refresh(true),
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => self.state.help_overlay = false,
            _ => {}
        }
    }

    fn request_refresh(&mut self, announce: bool) {
        if self.state.view.is_loading() {
            if announce {
                self.state.push_log("[INFO] Refresh already in flight");
            }
            return;
        }
        let generation = self.state.view.begin_load();
        self.dispatch_fetch(generation, announce);
    }

    fn dispatch_fetch(&mut self, generation: u64, announce: bool) {
        let sent = self
            .cmd_tx
            .as_ref()
            .is_some_and(|tx| {
                tx.send(ProviderCommand::FetchLeaderboard { generation }).is_ok()
            });

        if sent {
            self.last_poll = Instant::now();
            if announce {
                self.state.push_log("[INFO] Leaderboard refresh requested");
            }
        } else {
            // No provider means no data will ever arrive; settle the pending
            // load on the fallback path so the view is never stuck loading.
            self.state.push_log("[WARN] Leaderboard provider unavailable");
            apply_delta(
                &mut self.state,
                Delta::LeaderboardFailed {
                    generation,
                    message: FETCH_FAILED_MESSAGE.to_string(),
                },
            );
        }
    }

    fn request_profile(&mut self) {
        if let Some(tx) = &self.cmd_tx
            && tx.send(ProviderCommand::FetchProfile).is_err()
        {
            self.state.push_log("[WARN] Profile request failed");
        }
    }

    fn maybe_refresh(&mut self) {
        if self.last_poll.elapsed() >= self.poll && !self.state.view.is_loading() {
            self.request_refresh(false);
        }
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    feed::spawn_provider(tx, cmd_rx);

    let mut app = App::new(Some(cmd_tx));
    app.state.viewer = viewer_profile_from_env();
    app.request_profile();
    app.request_refresh(false);

    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        // A viewer-identity change already re-entered Loading; it only
        // remains to ship the fetch for the new generation.
        if let Some(generation) = app.state.take_refresh_request() {
            app.dispatch_fetch(generation, false);
        }

        app.maybe_refresh();

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header =
        Paragraph::new(header_text(&app.state)).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    render_ladder(frame, chunks[1], &app.state);

    let footer = Paragraph::new("r Refresh | j/k/↑/↓ Move | ? Help | q Quit")
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[2]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let line1 = "  XP LADDER | Compete with your friends".to_string();
    let standing = match state.current_user() {
        Some(you) => format!("Your rank #{} | {} XP", you.rank, you.xp),
        None => "Not ranked yet".to_string(),
    };
    let updated = state
        .updated_at
        .map(|at| format!(" | Updated {}", at.format("%H:%M:%S")))
        .unwrap_or_default();
    format!("{line1}\n  {standing}{updated}")
}

fn render_ladder(frame: &mut Frame, area: Rect, state: &AppState) {
    let mut constraints: Vec<Constraint> = Vec::new();
    let banner = state.view.error_message().is_some();
    if banner {
        constraints.push(Constraint::Length(1));
    }
    constraints.push(Constraint::Length(8));
    constraints.push(Constraint::Min(1));
    constraints.push(Constraint::Length(4));

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);
    let mut next = 0;

    if banner {
        let message = state.view.error_message().unwrap_or_default();
        let advisory =
            Paragraph::new(format!(" {message}")).style(Style::default().fg(Color::Yellow));
        frame.render_widget(advisory, sections[next]);
        next += 1;
    }

    if state.view.is_loading() {
        let loading = Paragraph::new("Loading leaderboard...")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(loading, sections[next]);
        return;
    }

    if state.view.phase() == LoadPhase::Idle {
        return;
    }

    if state.view.entries().is_empty() {
        let empty = Paragraph::new(
            "No friends yet\nAdd friends to see how you stack up against them!",
        )
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, sections[next]);
        return;
    }

    render_podium(frame, sections[next], state.podium());
    render_remainder(frame, sections[next + 1], state);
    render_stats(frame, sections[next + 2], state);
}

fn render_podium(frame: &mut Frame, area: Rect, podium: &[Entry]) {
    let block = Block::default().title("Top Performers").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Logical order stays 1,2,3; only the visual arrangement puts the
    // leader in the middle.
    let arrangement: &[usize] = match podium.len() {
        0 => return,
        1 => &[0],
        2 => &[1, 0],
        _ => &[1, 0, 2],
    };

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![
            Constraint::Ratio(1, arrangement.len() as u32);
            arrangement.len()
        ])
        .split(inner);

    for (col, &idx) in arrangement.iter().enumerate() {
        let entry = &podium[idx];
        let style = match entry.rank {
            1 => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            2 => Style::default().fg(Color::Gray),
            _ => Style::default().fg(Color::LightRed),
        };
        let cell = Paragraph::new(podium_cell_text(entry))
            .style(style)
            .alignment(Alignment::Center);
        frame.render_widget(cell, cols[col]);
    }
}

fn podium_cell_text(entry: &Entry) -> String {
    let initial = entry
        .name
        .chars()
        .next()
        .map(|c| c.to_ascii_uppercase())
        .unwrap_or('?');
    let you = if entry.is_current_user { " (You)" } else { "" };
    format!(
        "#{}\n({initial}) {}{you}\nLevel {}\n{} XP",
        entry.rank, entry.name, entry.level, entry.xp
    )
}

fn render_remainder(frame: &mut Frame, area: Rect, state: &AppState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let widths = remainder_columns();
    render_remainder_header(frame, sections[0], &widths);

    let list_area = sections[1];
    let remainder = state.remainder();
    if remainder.is_empty() {
        let empty = Paragraph::new("Everyone fits on the podium")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, list_area);
        return;
    }
    if list_area.height == 0 {
        return;
    }

    let visible = list_area.height as usize;
    let (start, end) = visible_range(state.selected, remainder.len(), visible);

    for (i, idx) in (start..end).enumerate() {
        let row_area = Rect {
            x: list_area.x,
            y: list_area.y + i as u16,
            width: list_area.width,
            height: 1,
        };

        let entry = &remainder[idx];
        let selected = idx == state.selected;
        let row_style = if selected {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else if entry.is_current_user {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        if selected {
            frame.render_widget(Block::default().style(row_style), row_area);
        }

        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(widths)
            .split(row_area);

        let name = if entry.is_current_user {
            format!("{} (You)", entry.name)
        } else {
            entry.name.clone()
        };
        render_cell_text(frame, cols[0], &format!("#{}", entry.rank), row_style);
        render_cell_text(frame, cols[1], &name, row_style);
        render_cell_text(frame, cols[2], &entry.level.to_string(), row_style);
        render_cell_text(
            frame,
            cols[3],
            &entry.total_tasks_completed.to_string(),
            row_style,
        );
        render_cell_text(frame, cols[4], &entry.xp.to_string(), row_style);
    }
}

fn remainder_columns() -> [Constraint; 5] {
    [
        Constraint::Length(6),
        Constraint::Min(16),
        Constraint::Length(7),
        Constraint::Length(7),
        Constraint::Length(10),
    ]
}

fn render_remainder_header(frame: &mut Frame, area: Rect, widths: &[Constraint]) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(widths)
        .split(area);
    let style = Style::default().add_modifier(Modifier::BOLD);

    render_cell_text(frame, cols[0], "Rank", style);
    render_cell_text(frame, cols[1], "Name", style);
    render_cell_text(frame, cols[2], "Level", style);
    render_cell_text(frame, cols[3], "Tasks", style);
    render_cell_text(frame, cols[4], "XP", style);
}

fn render_stats(frame: &mut Frame, area: Rect, state: &AppState) {
    let stats = state.stats();
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    let cells = [
        ("Competitors", stats.participant_count.to_string()),
        ("Combined XP", stats.combined_xp.to_string()),
        ("Tasks Completed", stats.combined_tasks.to_string()),
    ];
    for (i, (title, value)) in cells.iter().enumerate() {
        let cell = Paragraph::new(value.as_str())
            .alignment(Alignment::Center)
            .block(Block::default().title(*title).borders(Borders::ALL));
        frame.render_widget(cell, cols[i]);
    }
}

fn render_cell_text(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    let paragraph = Paragraph::new(text).style(style);
    frame.render_widget(paragraph, area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let width = area.width.min(46);
    let height = area.height.min(9);
    let popup = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };

    frame.render_widget(Clear, popup);
    let help = Paragraph::new(
        "r        Refresh leaderboard\n\
         j/k ↑/↓  Move selection\n\
         ?        Toggle this help\n\
         Esc      Close help\n\
         q        Quit",
    )
    .block(Block::default().title("Help").borders(Borders::ALL));
    frame.render_widget(help, popup);
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}
