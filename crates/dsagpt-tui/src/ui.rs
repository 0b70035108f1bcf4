use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};
use dsagpt_core::{DictationState, Sender};
use crate::app::{App, InputMode};

const WELCOME_TITLE: &str = "DSA GPT - Your Algorithm Coach";
const INPUT_PLACEHOLDER: &str = "Ask about DSA concepts, problems, or solutions...";
const UNSUPPORTED_NOTICE: &str = "Your system does not support speech recognition.";

/// Style `**bold**` runs in a reply line; an unmatched `**` stays literal
fn parse_markdown_line(text: &str) -> Line<'static> {
    let parts: Vec<&str> = text.split("**").collect();
    // An even number of parts means the last `**` has no partner
    let closed = if parts.len() % 2 == 0 { parts.len() - 1 } else { parts.len() };

    let mut spans: Vec<Span<'static>> = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        if i >= closed {
            spans.push(Span::raw(format!("**{}", part)));
        } else if i % 2 == 1 && !part.is_empty() {
            spans.push(Span::styled(
                part.to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ));
        } else if !part.is_empty() {
            spans.push(Span::raw(part.to_string()));
        }
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    if !app.chat.speech_supported() {
        render_unsupported(frame, body_area);
        render_footer(app, frame, footer_area);
        return;
    }

    render_chat_screen(app, frame, body_area);
    render_footer(app, frame, footer_area);

    if app.chat.suggestions().is_visible() {
        render_suggestions(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let user = app
        .chat
        .identity()
        .map(|identity| format!(" [{}]", identity.display_name()))
        .unwrap_or_default();

    let title = Line::from(vec![
        Span::styled(" DSA-GPT ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(user, Style::default().fg(Color::White)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode() {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.input_mode() {
        InputMode::Normal => " CHAT ",
        InputMode::Editing => " INPUT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);
    let hint = |key: &'static str, label: &'static str| {
        [Span::styled(key, key_style), Span::styled(label, label_style)]
    };

    let hints: Vec<Span> = if !app.chat.speech_supported() {
        hint(" q ", " quit ").into()
    } else if app.chat.suggestions().is_visible() {
        [hint(" ↑/↓ ", " pick "), hint(" Enter ", " use "), hint(" Esc ", " close ")].concat()
    } else {
        let dictation = match app.chat.dictation_state() {
            DictationState::Listening => " stop mic ",
            DictationState::Stopped => " mic ",
        };
        match app.input_mode() {
            InputMode::Normal => [
                hint(" i ", " type "),
                hint(" m ", dictation),
                hint(" s ", " suggest "),
                hint(" j/k ", " scroll "),
                hint(" L ", " logout "),
                hint(" q ", " quit "),
            ]
            .concat(),
            InputMode::Editing => [
                hint(" Enter ", " send "),
                hint(" F2 ", dictation),
                hint(" F3 ", " suggest "),
                hint(" Esc ", " done "),
            ]
            .concat(),
        }
    };

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];
    spans.extend(hints);
    if let Some(status) = &app.status {
        spans.push(Span::styled(
            format!(" {} ", status),
            Style::default().fg(Color::Yellow),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_unsupported(frame: &mut Frame, area: Rect) {
    let [_, notice_area, _] = Layout::vertical([
        Constraint::Percentage(40),
        Constraint::Length(3),
        Constraint::Min(0),
    ])
    .areas(area);

    let notice = Paragraph::new(vec![
        Line::from(Span::styled(UNSUPPORTED_NOTICE, Style::default().fg(Color::Red).bold())),
        Line::default(),
        Line::from(Span::styled(
            "Set dictation_command in the config file to an installed dictation program.",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });

    frame.render_widget(notice, notice_area);
}

fn render_chat_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Chat ");

    if app.chat.conversation().is_empty() && !app.chat.is_awaiting_reply() {
        render_welcome(app, frame, chat_block, chat_area);
    } else {
        render_messages(app, frame, chat_block, chat_area);
    }

    render_input(app, frame, input_area);
}

fn render_welcome(app: &App, frame: &mut Frame, block: Block, area: Rect) {
    let mut lines = vec![
        Line::default(),
        Line::from(Span::styled(
            WELCOME_TITLE,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(Span::styled("Try asking:", Style::default().fg(Color::DarkGray))),
    ];
    for suggestion in app.chat.suggestions().suggestions() {
        lines.push(Line::from(format!("\"{}\"", suggestion)));
    }

    let welcome = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(welcome, area);
}

fn render_messages(app: &App, frame: &mut Frame, block: Block, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();

    for msg in app.chat.conversation().messages() {
        match msg.sender() {
            Sender::User => {
                lines.push(Line::from(Span::styled(
                    App::sender_label(Sender::User),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(msg.text()));
            }
            Sender::Bot => {
                lines.push(Line::from(Span::styled(
                    App::sender_label(Sender::Bot),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                for line in msg.text().lines() {
                    lines.push(parse_markdown_line(line));
                }
            }
        }
        lines.push(Line::default());
    }

    if app.chat.is_awaiting_reply() {
        lines.push(Line::from(Span::styled(
            App::sender_label(Sender::Bot),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let listening = app.chat.dictation_state() == DictationState::Listening;
    let editing = app.input_mode() == InputMode::Editing;

    let border_color = if listening {
        Color::Red
    } else if editing {
        Color::Yellow
    } else {
        Color::DarkGray
    };
    let title = if listening { " ● Listening " } else { " Ask " };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let input = app.chat.input();

    if input.is_empty() && !editing && !listening {
        let placeholder = Paragraph::new(INPUT_PLACEHOLDER)
            .style(Style::default().fg(Color::DarkGray))
            .block(input_block);
        frame.render_widget(placeholder, area);
        return;
    }

    // Calculate visible portion of input with horizontal scrolling
    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = input.cursor();

    // Calculate scroll offset to keep cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = input
        .text()
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let paragraph = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);
    frame.render_widget(paragraph, area);

    // Show cursor when editing
    if editing && !listening {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_suggestions(app: &App, frame: &mut Frame, area: Rect) {
    let panel = app.chat.suggestions();

    // Calculate popup size and position (centered)
    let popup_width = 60.min(area.width.saturating_sub(4));
    let popup_height = (panel.suggestions().len() as u16 + 2).min(area.height.saturating_sub(4));

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Suggestions (Enter to use, Esc to close) ");

    let items: Vec<ListItem> = panel
        .suggestions()
        .iter()
        .map(|suggestion| ListItem::new(format!(" {} ", suggestion)))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default().with_selected(panel.selected_index());
    frame.render_stateful_widget(list, popup_area, &mut state);
}
