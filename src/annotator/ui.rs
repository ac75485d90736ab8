//! Annotator screen layout.
//!
//! Three columns: the audio/segment lists on the left, segment info and the
//! class checkboxes in the center, and the stored annotation table on the
//! right. Annotated files and segments are marked with a check.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph},
};

use super::app::{App, Focus};

pub fn draw(f: &mut Frame, app: &App) {
    let size = f.area();

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(28),
            Constraint::Percentage(44),
            Constraint::Percentage(28),
        ])
        .split(size);

    draw_lists(f, columns[0], app);
    draw_center(f, columns[1], app);
    draw_annotations(f, columns[2], app);
}

fn draw_lists(f: &mut Frame, area: Rect, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    // Audio files, checked when any of their segments carries a row
    let items: Vec<ListItem> = app
        .audio_files
        .iter()
        .map(|path| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let label = if app.store.is_audio_annotated(&name) {
                format!("✓ {name}")
            } else {
                format!("  {name}")
            };
            ListItem::new(label)
        })
        .collect();
    let mut state = ListState::default();
    state.select(app.selected_audio);
    f.render_stateful_widget(
        List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Audio Files "),
            )
            .highlight_style(highlight_style(app.focus == Focus::AudioList)),
        rows[0],
        &mut state,
    );

    // Segments of the selected file
    let audio_name = app.audio_name().unwrap_or_default();
    let items: Vec<ListItem> = app
        .segments
        .iter()
        .enumerate()
        .map(|(i, span)| {
            let annotated = app.store.get(&audio_name, i as u32).is_some();
            let mark = if annotated { "✓" } else { " " };
            ListItem::new(format!("{mark} Segment {} [{}s]", i + 1, span.time_label()))
        })
        .collect();
    let mut state = ListState::default();
    state.select(app.selected_segment);
    f.render_stateful_widget(
        List::new(items)
            .block(Block::default().borders(Borders::ALL).title(" Segments "))
            .highlight_style(highlight_style(app.focus == Focus::SegmentList)),
        rows[1],
        &mut state,
    );
}

fn draw_center(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(2), // Title
            Constraint::Length(3), // Segment info
            Constraint::Length(3), // Progress through file
            Constraint::Min(5),    // Class checkboxes
            Constraint::Length(3), // Status / key help
        ])
        .split(area);

    let title = Paragraph::new("✏ segmark")
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    draw_segment_info(f, chunks[1], app);
    draw_progress(f, chunks[2], app);
    draw_classes(f, chunks[3], app);
    draw_status(f, chunks[4], app);
}

fn draw_segment_info(f: &mut Frame, area: Rect, app: &App) {
    let text = match (app.audio_name(), app.selected_segment, app.current_span()) {
        (Some(name), Some(index), Some(span)) => {
            let playing = if app.is_playing { " ▶" } else { "" };
            format!(
                "Audio: {name} | Segment: {}/{} | Duration: {:.2}s{playing}",
                index + 1,
                app.segments.len(),
                span.duration_ms() as f64 / 1000.0,
            )
        }
        (Some(name), _, _) => format!("Audio: {name} | no segments"),
        _ => "No audio loaded".to_string(),
    };

    let info = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);
    f.render_widget(info, area);
}

fn draw_progress(f: &mut Frame, area: Rect, app: &App) {
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Progress "))
        .gauge_style(Style::default().fg(Color::Cyan))
        .ratio(app.progress());
    f.render_widget(gauge, area);
}

fn draw_classes(f: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = app
        .config
        .classes
        .iter()
        .enumerate()
        .map(|(i, class)| {
            let checked = app.checked.get(i).copied().unwrap_or(false);
            let line = if checked {
                Line::from(vec![
                    Span::styled("[x] ", Style::default().fg(Color::Green)),
                    Span::raw(format!("{} ", i + 1)),
                    Span::styled(
                        class.clone(),
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ),
                ])
            } else {
                Line::from(vec![
                    Span::raw("[ ] "),
                    Span::raw(format!("{} ", i + 1)),
                    Span::raw(class.clone()),
                ])
            };
            ListItem::new(line)
        })
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(" Classes "));
    f.render_widget(list, area);
}

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    let line = match &app.status_message {
        Some(message) => Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Yellow),
        )),
        None => Line::from(Span::styled(
            "1-9 toggle class · space play/stop · ←/→ segment · tab focus · q quit",
            Style::default().fg(Color::DarkGray),
        )),
    };

    let status = Paragraph::new(line)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);
    f.render_widget(status, area);
}

fn draw_annotations(f: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = app
        .store
        .records()
        .iter()
        .map(|record| {
            let labels = if record.class_names.is_empty() {
                "(no classes)".to_string()
            } else {
                record.class_names.join(",")
            };
            ListItem::new(format!(
                "{} - Segment {}: {labels}",
                record.audio_name, record.segment_number
            ))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" Annotations ({}) ", app.store.len())),
    );
    f.render_widget(list, area);
}

fn highlight_style(focused: bool) -> Style {
    if focused {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::REVERSED)
    }
}
