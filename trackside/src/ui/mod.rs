use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
};
use trackside_core::{
    color::TeamColor,
    snapshot::{MatchPhase, PenaltyTime},
};

use crate::{
    app::App,
    behavior::UiMode,
};

pub fn format_clock(secs: u16) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// The scoreboard sits on the terminal's dark background; a pick that would
/// not read there falls back to white.
fn team_style(color: TeamColor) -> Style {
    let shown = if color.readable_on(TeamColor::Black) {
        color
    } else {
        TeamColor::White
    };
    let (r, g, b) = shown.rgb();
    Style::default().fg(Color::Rgb(r, g, b))
}

fn phase_label(phase: MatchPhase) -> String {
    match phase {
        MatchPhase::Setup => "Setup".to_string(),
        MatchPhase::Period(n) => format!("Period {n}"),
        MatchPhase::Interval(n) => format!("Interval {n}"),
        MatchPhase::Overtime => "Overtime".to_string(),
        MatchPhase::Finished => "Full Time".to_string(),
    }
}

pub fn draw(app: &mut App, f: &mut Frame) {
    let area = f.area();

    let border_style = if app.flashing() {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let frame_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(format!(
            " Track Side [{}] {} ",
            app.ui_state.mode,
            app.health_status(),
        ));
    let inner = frame_block.inner(area);
    f.render_widget(frame_block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(4), Constraint::Length(1)])
        .split(inner);

    match app.ui_state.mode {
        UiMode::Setup => render_setup(app, f, chunks[0]),
        UiMode::Analysis => render_analysis(app, f, chunks[0]),
        UiMode::Standard | UiMode::Intensive | UiMode::OneHand => {
            render_scoreboard(app, f, chunks[0])
        }
    }

    render_status_line(app, f, chunks[1]);
}

fn render_setup(app: &App, f: &mut Frame, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Min(0),
        ])
        .split(area);

    let sport = Paragraph::new(format!("Sport: {}  (s to change)", app.sport()));
    f.render_widget(sport, chunks[0]);

    let name_line = match app.editing_name() {
        Some(partial) => format!("Opponent: {partial}_  (enter to save, esc to cancel)"),
        None => format!("Opponent: {}  (n to edit)", app.opponent_name()),
    };
    f.render_widget(Paragraph::new(name_line), chunks[1]);

    let rules = app.rules();
    let structure = format!(
        "{} periods of {}, intervals of {}",
        rules.regulation_periods,
        format_clock(rules.period_duration.as_secs() as u16),
        format_clock(rules.interval_duration.as_secs() as u16),
    );
    f.render_widget(Paragraph::new(structure), chunks[2]);

    let help = Paragraph::new(
        "b: begin match    o: toggle one-handed    q: quit",
    )
    .style(Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC))
    .wrap(Wrap { trim: true });
    f.render_widget(help, chunks[3]);
}

fn render_scoreboard(app: &App, f: &mut Frame, area: Rect) {
    let layout = &app.ui_state.layout;

    let constraints = if layout.show_clock_large {
        vec![
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(layout.event_feed_rows + 2),
            Constraint::Min(0),
        ]
    } else {
        vec![
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(layout.event_feed_rows + 2),
            Constraint::Min(0),
        ]
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    render_clock(app, f, chunks[0]);
    render_scores(app, f, chunks[1]);
    render_event_feed(app, f, chunks[2]);
    render_help(app, f, chunks[3]);
}

fn render_clock(app: &App, f: &mut Frame, area: Rect) {
    let Some(snapshot) = app.snapshot() else {
        return;
    };

    let running = if snapshot.clock_running { "\u{25b6}" } else { "\u{23f8}" };
    let text = format!(
        "{}  {}  {}",
        phase_label(snapshot.phase),
        format_clock(snapshot.secs_in_phase),
        running,
    );
    let style = if snapshot.clock_running {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    };
    let clock = Paragraph::new(Span::styled(text, style)).alignment(Alignment::Center);
    f.render_widget(clock, area);
}

fn render_scores(app: &App, f: &mut Frame, area: Rect) {
    let Some(snapshot) = app.snapshot() else {
        return;
    };

    let single = app.ui_state.layout.single_column;
    let penalties = |list: &[trackside_core::snapshot::PenaltySnapshot]| -> String {
        list.iter()
            .map(|pen| {
                let player = pen
                    .player_number
                    .map(|n| format!("#{n} "))
                    .unwrap_or_default();
                match pen.time {
                    PenaltyTime::Seconds(secs) => format!("{player}{}", format_clock(secs)),
                    PenaltyTime::Dismissal => format!("{player}DSMS"),
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
    };

    let us_line = Line::from(vec![
        Span::styled("Us   ", team_style(app.config().game.our_color)),
        Span::styled(
            snapshot.scores.us.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("   {}", penalties(&snapshot.penalties.us))),
    ]);
    let them_line = Line::from(vec![
        Span::styled(
            format!("{:<5}", truncate(app.opponent_name(), 12)),
            team_style(app.config().game.opponent_color),
        ),
        Span::styled(
            snapshot.scores.them.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("   {}", penalties(&snapshot.penalties.them))),
    ]);

    if single || area.width < 60 {
        let scores = Paragraph::new(vec![us_line, them_line]);
        f.render_widget(scores, area);
    } else {
        let halves = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);
        f.render_widget(Paragraph::new(us_line), halves[0]);
        f.render_widget(Paragraph::new(them_line), halves[1]);
    }
}

fn render_event_feed(app: &App, f: &mut Frame, area: Rect) {
    let rows = app.ui_state.layout.event_feed_rows as usize;
    if rows == 0 {
        return;
    }

    let lines: Vec<Line> = app
        .events()
        .iter()
        .rev()
        .take(rows)
        .map(|event| {
            let secs = event.game_time.as_secs();
            Line::from(format!(
                "{:02}:{:02}  {}  {}{}",
                secs / 60,
                secs % 60,
                event.side,
                event.label,
                event
                    .player_number
                    .map(|n| format!(" #{n}"))
                    .unwrap_or_default(),
            ))
        })
        .collect();

    let feed = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::TOP)
            .title(format!("Events ({})", app.events().len())),
    );
    f.render_widget(feed, area);
}

fn render_help(app: &App, f: &mut Frame, area: Rect) {
    if area.height == 0 {
        return;
    }
    let text = match app.ui_state.mode {
        UiMode::Intensive => "g/h: goal  u: undo  space: clock",
        _ => "g/h: goal us/them  p: penalty  f: foul  y/r: cards  u: undo  space: clock  +/-: adjust clock  m: end  x: export  q: quit",
    };
    let help = Paragraph::new(text)
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC))
        .wrap(Wrap { trim: true });
    f.render_widget(help, area);
}

fn render_analysis(app: &App, f: &mut Frame, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(3), Constraint::Length(1)])
        .split(area);

    let scores = app.scores();
    let summary = Paragraph::new(format!(
        "Final: Us {} - {} {}   ({} events)",
        scores.us,
        scores.them,
        truncate(app.opponent_name(), 20),
        app.events().len(),
    ))
    .style(Style::default().add_modifier(Modifier::BOLD));
    f.render_widget(summary, chunks[0]);

    let table_height = chunks[1].height.saturating_sub(2) as usize;
    let header = Row::new(vec!["Time", "Phase", "Side", "Event", "Player", "Note"]).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );
    let rows: Vec<Row> = app
        .events()
        .iter()
        .skip(app.analysis_scroll())
        .take(table_height)
        .map(|event| {
            Row::new(vec![
                Cell::from(format_clock(event.game_time.as_secs() as u16)),
                Cell::from(phase_label(event.phase)),
                Cell::from(event.side.to_string()),
                Cell::from(event.label.clone()),
                Cell::from(
                    event
                        .player_number
                        .map(|n| format!("#{n}"))
                        .unwrap_or_default(),
                ),
                Cell::from(event.note.clone().unwrap_or_default()),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        &[
            Constraint::Length(6),
            Constraint::Length(11),
            Constraint::Length(5),
            Constraint::Length(14),
            Constraint::Length(7),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::TOP).title("Match log"));
    f.render_widget(table, chunks[1]);

    let help = Paragraph::new("up/down: scroll  a: amend last  x: export  n: new match  q: quit")
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC));
    f.render_widget(help, chunks[2]);
}

fn render_status_line(app: &mut App, f: &mut Frame, area: Rect) {
    let text = if let Some(announcement) = app.take_announcement() {
        announcement
    } else if let Some(status) = app.status_line() {
        status.to_string()
    } else {
        String::new()
    };
    let status = Paragraph::new(text).style(Style::default().fg(Color::Magenta));
    f.render_widget(status, area);
}

fn truncate(input: &str, max: usize) -> String {
    if input.chars().count() <= max {
        input.to_string()
    } else {
        let cut: String = input.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}\u{2026}")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(63), "01:03");
        assert_eq!(format_clock(2700), "45:00");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Rockets", 12), "Rockets");
        assert_eq!(truncate("A very long opponent", 8), "A very \u{2026}");
    }

    #[test]
    fn test_phase_label() {
        assert_eq!(phase_label(MatchPhase::Period(2)), "Period 2");
        assert_eq!(phase_label(MatchPhase::Finished), "Full Time");
    }

    #[test]
    fn test_team_style_uses_the_palette_rgb() {
        let (r, g, b) = TeamColor::Yellow.rgb();
        assert_eq!(team_style(TeamColor::Yellow).fg, Some(Color::Rgb(r, g, b)));
    }

    #[test]
    fn test_unreadable_team_color_falls_back_to_white() {
        let (r, g, b) = TeamColor::White.rgb();
        assert_eq!(team_style(TeamColor::Black).fg, Some(Color::Rgb(r, g, b)));
    }
}
