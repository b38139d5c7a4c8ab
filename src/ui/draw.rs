// Frame layout and widgets

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph, Widget},
    Frame,
};

use super::app::{App, Focus};
use crate::player::{PlayerState, VideoFrame};
use crate::youtube::descriptor::truncate_title;

const LIST_TITLE_CHARS: usize = 60;
const FILL: Color = Color::Rgb(64, 64, 64);
const ORANGE: Color = Color::Rgb(255, 165, 0);
// Keeps the UI text readable over bright video.
const DIM_NUMERATOR: u16 = 155;

/// Paints the background video with half blocks: each cell carries two
/// vertically stacked pixels.
struct Backdrop {
    frame: Option<VideoFrame>,
}

impl Widget for Backdrop {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for row in 0..area.height {
            for col in 0..area.width {
                let cell = buf.get_mut(area.x + col, area.y + row);
                let (x, y) = (col as usize, row as usize * 2);
                match &self.frame {
                    Some(frame) if x < frame.width() && y + 1 < frame.height() => {
                        cell.set_symbol("▀")
                            .set_fg(darken(frame.pixel(x, y)))
                            .set_bg(darken(frame.pixel(x, y + 1)));
                    }
                    _ => {
                        cell.set_symbol(" ").set_bg(FILL);
                    }
                }
            }
        }
    }
}

fn darken((r, g, b): (u8, u8, u8)) -> Color {
    let scale = |c: u8| (c as u16 * DIM_NUMERATOR / 255) as u8;
    Color::Rgb(scale(r), scale(g), scale(b))
}

pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.size();

    let backdrop = app
        .background
        .next_frame(area.width as usize, area.height as usize * 2);
    frame.render_widget(Backdrop { frame: backdrop }, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(4),
        ])
        .split(area);

    draw_url(frame, app, chunks[0]);

    let controls_row = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(24)])
        .split(chunks[1]);
    draw_actions(frame, app, controls_row[0]);
    draw_volume(frame, app, controls_row[1]);

    app.list_area = chunks[2];
    if app.videos.is_empty() {
        draw_instructions(frame, chunks[2]);
    } else {
        draw_list(frame, app, chunks[2]);
    }

    draw_status(frame, app, chunks[3]);
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    }
}

fn draw_url(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Url;
    let title = if app.is_fetching() {
        "YouTube URL (fetching...)"
    } else {
        "YouTube URL"
    };

    // Scroll horizontally so the cursor stays visible.
    let width = area.width.saturating_sub(2) as usize;
    let scroll = app.input.cursor().saturating_sub(width.saturating_sub(1));
    let visible: String = app.input.text().chars().skip(scroll).take(width).collect();

    let input = Paragraph::new(visible).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(focus_style(focused))
            .title(title),
    );
    frame.render_widget(input, area);

    if focused && width > 0 {
        let column = (app.input.cursor() - scroll) as u16;
        frame.set_cursor(area.x + 1 + column, area.y + 1);
    }
}

fn draw_actions(frame: &mut Frame, app: &App, area: Rect) {
    let controls = app.controls();
    let playing = app.background.is_playing();
    let hints = [
        ("Enter", "Fetch", controls.fetch),
        ("d", "Download", controls.download),
        ("c", "Cancel", controls.cancel),
        ("b", "Play BG", app.background.is_available() && !playing),
        ("s", "Stop BG", playing),
        ("o", "Folder", true),
    ];

    let mut spans = Vec::new();
    for (key, label, enabled) in hints {
        let style = if enabled {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!("[{}] {}", key, label), style));
        spans.push(Span::raw("  "));
    }

    let actions = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("Actions"));
    frame.render_widget(actions, area);
}

fn draw_volume(frame: &mut Frame, app: &App, area: Rect) {
    let volume = app.background.volume();
    let percent = (volume * 100.0).round() as u16;
    let title = match app.background.audio_state() {
        PlayerState::Playing => "Volume ▶",
        PlayerState::Paused => "Volume ⏸",
        PlayerState::Stopped => "Volume",
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(f64::from(volume).clamp(0.0, 1.0))
        .label(format!("{}%", percent));
    frame.render_widget(gauge, area);
}

fn draw_list(frame: &mut Frame, app: &mut App, area: Rect) {
    let items: Vec<ListItem> = app
        .videos
        .iter()
        .map(|video| {
            let checkbox = if video.selected { "[x]" } else { "[ ]" };
            let title_style = if video.selected {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(vec![
                Line::from(Span::styled(
                    format!("{} {}", checkbox, truncate_title(&video.title, LIST_TITLE_CHARS)),
                    title_style,
                )),
                Line::from(Span::styled(
                    format!("    {} • {}", video.duration, video.uploader),
                    Style::default().fg(Color::Gray),
                )),
            ])
        })
        .collect();

    let focused = app.focus == Focus::List;
    let title = format!(
        "Videos ({} selected of {})",
        app.selected_count(),
        app.videos.len()
    );
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(focus_style(focused))
                .title(title),
        )
        .highlight_style(if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        });
    frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn draw_instructions(frame: &mut Frame, area: Rect) {
    let key = Style::default().fg(Color::Cyan);
    let lines = vec![
        Line::from("Paste a video or playlist URL above and press Enter."),
        Line::from(""),
        Line::from(vec![
            Span::styled("Tab", key),
            Span::raw(" switch between URL and list   "),
            Span::styled("Space", key),
            Span::raw(" select   "),
            Span::styled("a", key),
            Span::raw(" select all"),
        ]),
        Line::from(vec![
            Span::styled("d", key),
            Span::raw(" download selected   "),
            Span::styled("c", key),
            Span::raw(" cancel   "),
            Span::styled("o", key),
            Span::raw(" open download folder"),
        ]),
        Line::from(vec![
            Span::styled("b/s", key),
            Span::raw(" play/stop background   "),
            Span::styled("+/-", key),
            Span::raw(" volume   "),
            Span::styled("q", key),
            Span::raw(" quit"),
        ]),
    ];

    let help = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Getting started"));
    frame.render_widget(help, area);
}

fn draw_status(frame: &mut Frame, app: &App, area: Rect) {
    let lines = vec![
        Line::from(app.status.as_str()),
        Line::from(Span::styled(app.progress.as_str(), Style::default().fg(ORANGE))),
    ];
    let status = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Status | saving to {}", app.download_dir().display())),
    );
    frame.render_widget(status, area);
}
