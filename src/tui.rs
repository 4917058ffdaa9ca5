use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
    Frame as TermFrame, Terminal,
};
use std::io;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::render::Dashboard;

const TITLE: &str = " Wikimedia edits: bots vs humans ";
const MIN_PANEL_WIDTH: u16 = 60;
const MIN_PANEL_HEIGHT: u16 = 20;

/// Terminal surface for the dashboard. Restores the terminal on drop.
pub struct TuiApp {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TuiApp {
    pub fn new() -> Result<Self, io::Error> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self { terminal })
    }

    pub fn draw(&mut self, dashboard: &Dashboard) -> Result<(), io::Error> {
        draw_to(&mut self.terminal, dashboard)
    }
}

impl Drop for TuiApp {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = std::io::Write::flush(&mut std::io::stdout());
    }
}

/// Draw the dashboard on any backend (the crossterm one, or a test backend).
pub fn draw_to<B: Backend>(
    terminal: &mut Terminal<B>,
    dashboard: &Dashboard,
) -> Result<(), io::Error> {
    terminal.draw(|f| render_panel(f, dashboard))?;
    Ok(())
}

/// Centered bordered panel: summary line on top, chart beneath. Blank until
/// the dashboard has drawn its first frame.
pub fn render_panel(f: &mut TermFrame, dashboard: &Dashboard) {
    let lines = dashboard
        .frame()
        .map(|frame| frame.to_lines(dashboard.chart_config()))
        .unwrap_or_default();

    let content_width = lines.iter().map(|l| l.width()).max().unwrap_or(0) as u16;
    let area = centered(
        f.area(),
        (content_width + 2).max(MIN_PANEL_WIDTH),
        (lines.len() as u16 + 2).max(MIN_PANEL_HEIGHT),
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .title(TITLE)
        .border_style(Style::default().fg(Color::Green));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .style(Style::default().bg(Color::Black));

    f.render_widget(paragraph, area);
}

fn centered(outer: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(outer.width);
    let h = height.min(outer.height);
    Rect {
        x: outer.x + (outer.width - w) / 2,
        y: outer.y + (outer.height - h) / 2,
        width: w,
        height: h,
    }
}

/// `q`, `Esc` and `Ctrl-C` quit.
pub fn is_quit_key(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Poll the keyboard on a plain thread (crossterm polling blocks) and cancel
/// `cancel` on a quit key. Exits once `cancel` is cancelled from elsewhere.
pub fn spawn_key_listener(cancel: CancellationToken) -> JoinHandle<()> {
    std::thread::spawn(move || {
        while !cancel.is_cancelled() {
            match event::poll(Duration::from_millis(100)) {
                Ok(true) => {
                    if let Ok(Event::Key(key)) = event::read() {
                        if is_quit_key(&key) {
                            cancel.cancel();
                        }
                    }
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(error = ?e, "keyboard polling failed");
                    cancel.cancel();
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartConfig;
    use crate::rolling::SeriesId;
    use ratatui::backend::TestBackend;

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buf = terminal.backend().buffer();
        let width = buf.area.width as usize;
        buf.content()
            .chunks(width)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn quit_keys() {
        let q = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        let esc = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        let c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE);
        assert!(is_quit_key(&q));
        assert!(is_quit_key(&esc));
        assert!(is_quit_key(&ctrl_c));
        assert!(!is_quit_key(&c));
    }

    #[test]
    fn panel_shows_summary_and_chart() {
        let mut d = Dashboard::new(100, ChartConfig::default());
        d.push(SeriesId::Bot, 7.0);
        d.push(SeriesId::Human, 12.0);
        d.render();

        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        draw_to(&mut terminal, &d).unwrap();
        let text = screen_text(&terminal);
        assert!(text.contains("Bots: 7 Humans: 12"), "{text}");
        assert!(text.contains("12.00"), "{text}");
        assert!(text.contains("Wikimedia edits"), "{text}");
    }

    #[test]
    fn panel_is_blank_before_first_frame() {
        let d = Dashboard::new(100, ChartConfig::default());
        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        draw_to(&mut terminal, &d).unwrap();
        let text = screen_text(&terminal);
        assert!(!text.contains("Bots:"));
        assert!(text.contains("Wikimedia edits"));
    }

    #[test]
    fn panel_fits_small_terminals() {
        let d = Dashboard::new(100, ChartConfig::default());
        let mut terminal = Terminal::new(TestBackend::new(20, 5)).unwrap();
        draw_to(&mut terminal, &d).unwrap();
    }
}
