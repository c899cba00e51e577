//! Terminal UI rendering.
//!
//! All drawing logic lives here, separated from application state ([`App`])
//! and input handling ([`crate::input`]).
//!
//! ## For contributors
//!
//! * The layout is a two-row split: the feed on top and a one-line status
//!   bar at the bottom.  With the detail pane open the top row is split
//!   again, list on the left and article on the right.
//! * Colours and styles are defined inline.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::feed::Phase;
use crate::source::Article;

/// Draw the complete UI for one frame.
pub fn draw(app: &mut App, frame: &mut Frame) {
    let [main_area, status_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(frame.area());

    if app.show_detail {
        let [list_area, detail_area] =
            Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)])
                .areas(main_area);
        draw_feed_list(app, frame, list_area);
        draw_detail(app, frame, detail_area);
    } else {
        draw_feed_list(app, frame, main_area);
    }
    draw_status_bar(app, frame, status_area);
}

fn format_date(article: &Article) -> String {
    article
        .published
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "no date".into())
}

/// Render the scrollable article list.
fn draw_feed_list(app: &mut App, frame: &mut Frame, area: Rect) {
    let state = app.feed.state();
    let list_items: Vec<ListItem> = app
        .feed
        .filtered()
        .into_iter()
        .map(|article| {
            let line = Line::from(vec![
                Span::styled(
                    format!("{:<18}", format_date(article)),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(" "),
                Span::styled(article.title.clone(), Style::default().fg(Color::White)),
                Span::raw("  "),
                Span::styled(
                    format!("[{}]", article.source),
                    Style::default().fg(Color::Cyan),
                ),
            ]);
            ListItem::new(line)
        })
        .collect();

    let title = format!(
        " News · {} · source: {} ",
        state.mode.label(),
        state.source_filter.label()
    );
    let footer = if state.has_more {
        " n: load more "
    } else {
        " end of feed "
    };

    let list = List::new(list_items)
        .block(
            Block::default()
                .title(title)
                .title_bottom(footer)
                .borders(Borders::ALL),
        )
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .bg(Color::DarkGray),
        )
        .highlight_symbol("▸ ");

    frame.render_stateful_widget(list, area, &mut app.list_state);
}

/// Render the selected article: metadata, then the summary as plain text.
fn draw_detail(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default().title(" Article ").borders(Borders::ALL);

    let Some(article) = app.selected_article() else {
        frame.render_widget(Paragraph::new("Nothing selected").block(block), area);
        return;
    };

    let label = Style::default().fg(Color::DarkGray);
    let mut lines = vec![
        Line::from(Span::styled(
            article.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("source   ", label),
            Span::styled(article.source.clone(), Style::default().fg(Color::Cyan)),
        ]),
        Line::from(vec![Span::styled("date     ", label), Span::raw(format_date(article))]),
    ];
    if let Some(category) = &article.category {
        lines.push(Line::from(vec![
            Span::styled("category ", label),
            Span::raw(category.clone()),
        ]));
    }
    if let Some(score) = article.relevance_score {
        lines.push(Line::from(vec![
            Span::styled("relevance", label),
            Span::raw(format!(" {score:.0}/10")),
        ]));
    }
    lines.push(Line::from(vec![
        Span::styled("link     ", label),
        Span::styled(article.link.clone(), Style::default().fg(Color::Blue)),
    ]));
    lines.push(Line::raw(""));

    let width = area.width.saturating_sub(2) as usize;
    lines.extend(article.summary_text(width).lines().map(|l| Line::raw(l.to_string())));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// Render the bottom status bar.
fn draw_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let state = app.feed.state();
    let activity = match app.feed.phase() {
        Phase::Idle => "",
        Phase::Loading => "⟳ loading ",
        Phase::Refreshing => "⟳ refreshing ",
        Phase::LoadingMore => "⟳ more ",
    };
    let totals = app
        .feed
        .stats()
        .map(|s| format!("  {} sources / {} stored", s.total_sources, s.total_articles))
        .unwrap_or_default();

    let status = Paragraph::new(Line::from(vec![
        Span::styled(" ", Style::default()),
        Span::styled(activity, Style::default().fg(Color::Magenta)),
        Span::styled(&app.status, Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        Span::styled(
            format!("{}/{} shown", app.shown_len(), state.visible.len()),
            Style::default().fg(Color::Green),
        ),
        Span::styled(totals, Style::default().fg(Color::DarkGray)),
        Span::raw("  q quit  r refresh  m mode  f/a filter  ⏎ detail"),
    ]));
    frame.render_widget(status, area);
}
