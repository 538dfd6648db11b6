use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use assistant_core::{ChatRole, PipelineStatus};
use crate::app::{App, AuthMode, ChatView, FormStatus, LoginField, LoginForm, Screen};

/// Wrap text to fit within a given width, returning multiple lines
///
/// Breaks on word boundaries and keeps the line's leading indentation.
/// Words wider than `width` are split across lines.
fn wrap_text_to_width(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let body = text.trim_start();
    let indent: String = text[..text.len() - body.len()]
        .chars()
        .take(width - 1)
        .collect();

    let mut lines = Vec::new();
    let mut current_len = indent.chars().count();
    let mut current_line = indent;
    let mut has_word = false;

    for word in body.split_whitespace() {
        let mut rest = word;
        while !rest.is_empty() {
            let rest_len = rest.chars().count();
            let sep = usize::from(has_word);

            if current_len + sep + rest_len <= width {
                // Word fits on current line
                if has_word {
                    current_line.push(' ');
                }
                current_line.push_str(rest);
                current_len += sep + rest_len;
                has_word = true;
                break;
            }

            if has_word {
                // Word doesn't fit, start new line
                lines.push(std::mem::take(&mut current_line));
                current_len = 0;
                has_word = false;
                continue;
            }

            // Too long for a whole line: hard-break it
            let room = width - current_len;
            let split = rest
                .char_indices()
                .nth(room)
                .map(|(i, _)| i)
                .unwrap_or(rest.len());
            current_line.push_str(&rest[..split]);
            lines.push(std::mem::take(&mut current_line));
            current_len = 0;
            rest = &rest[split..];
        }
    }

    if !current_line.is_empty() || lines.is_empty() {
        lines.push(current_line);
    }

    lines
}

/// Pre-wrap a message body, keeping its own line breaks.
fn wrap_content(content: &str, width: usize) -> Vec<String> {
    content
        .split('\n')
        .flat_map(|line| wrap_text_to_width(line, width))
        .collect()
}

/// Furthest scroll offset that still fills the viewport.
fn max_scroll(line_count: usize, viewport: u16) -> u16 {
    u16::try_from(line_count)
        .unwrap_or(u16::MAX)
        .saturating_sub(viewport)
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

    let frame_idx = app.animation_frame;
    match &mut app.screen {
        Screen::Login(form) => render_login(form, frame, body_area),
        Screen::Chat(chat) => render_chat(chat, frame_idx, frame, body_area),
    }

    render_footer(app, frame, footer_area);
}

fn status_style(status: PipelineStatus) -> Style {
    match status {
        PipelineStatus::Ready => Style::default().fg(Color::Green),
        PipelineStatus::Busy => Style::default().fg(Color::Yellow),
        PipelineStatus::Error => Style::default().fg(Color::Red),
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let mut spans = vec![
        Span::styled(" Ollama AI Assistant ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ];

    if let Screen::Chat(chat) = &app.screen {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("{}: {}", chat.pipeline.provider_name(), chat.pipeline.model()),
            Style::default().fg(Color::White),
        ));
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("● {}", chat.status.label()),
            status_style(chat.status),
        ));
        spans.push(Span::styled(
            format!("  {}", chat.session.user().email),
            Style::default().fg(Color::Gray),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints: Vec<(&str, &str)> = match &app.screen {
        Screen::Login(form) => {
            let toggle = match form.mode {
                AuthMode::SignIn => " sign up ",
                AuthMode::SignUp => " sign in ",
            };
            vec![(" Tab ", " next field "), (" Enter ", " submit "), (" ^T ", toggle), (" Esc ", " quit ")]
        }
        Screen::Chat(chat) => {
            let send = if chat.pipeline.is_busy() { " sending... " } else { " send " };
            vec![
                (" Enter ", send),
                (" ^L ", " clear "),
                (" PgUp/PgDn ", " scroll "),
                (" Esc ", " quit "),
            ]
        }
    };

    let spans: Vec<Span> = hints
        .into_iter()
        .flat_map(|(key, label)| {
            [Span::styled(key, key_style), Span::styled(label, label_style)]
        })
        .collect();

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_login(form: &LoginForm, frame: &mut Frame, area: Rect) {
    let title = match form.mode {
        AuthMode::SignIn => " Login ",
        AuthMode::SignUp => " Sign Up ",
    };
    let fields = form.fields();

    // Centered box: one row per field plus status line and borders
    let popup_width = 50.min(area.width.saturating_sub(4));
    let popup_height = (fields.len() as u16) * 2 + 5;
    let popup_x = area.x + (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = area.y + (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height.min(area.height));

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let mut lines: Vec<Line> = Vec::new();
    let mut cursor = None;
    for (row, field) in fields.iter().enumerate() {
        let (label, value) = match field {
            LoginField::Email => ("Email", form.email.clone()),
            LoginField::Password => ("Password", "*".repeat(form.password.chars().count())),
            LoginField::Confirm => ("Confirm Password", "*".repeat(form.confirm.chars().count())),
        };
        let focused = *field == form.focus;
        let label_style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        lines.push(Line::from(Span::styled(label, label_style)));
        if focused {
            cursor = Some((row * 2 + 1, value.chars().count()));
        }
        lines.push(Line::from(Span::styled(value, Style::default().fg(Color::Cyan))));
    }

    lines.push(Line::default());
    if let Some(status) = &form.status {
        let (text, color) = match status {
            FormStatus::Info(text) => (text.as_str(), Color::Yellow),
            FormStatus::Success(text) => (text.as_str(), Color::Green),
            FormStatus::Error(text) => (text.as_str(), Color::Red),
        };
        lines.push(Line::from(Span::styled(text.to_string(), Style::default().fg(color))));
    }

    frame.render_widget(Paragraph::new(Text::from(lines)), inner);

    if let Some((row, col)) = cursor {
        if !form.pending {
            let x = inner.x + (col as u16).min(inner.width.saturating_sub(1));
            frame.set_cursor_position((x, inner.y + row as u16));
        }
    }
}

fn render_chat(chat: &mut ChatView, animation_frame: u8, frame: &mut Frame, area: Rect) {
    let [chat_area, notice_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(if chat.notice.is_some() { 1 } else { 0 }),
        Constraint::Length(3),
    ])
    .areas(area);

    // Store inner dimensions for scroll calculations
    chat.chat_height = chat_area.height.saturating_sub(2);
    let width = chat_area.width.saturating_sub(2) as usize;

    let mut lines: Vec<Line> = Vec::new();
    for turn in chat.pipeline.transcript().all() {
        let role_color = match turn.role() {
            ChatRole::User => Color::Cyan,
            ChatRole::Assistant => Color::Green,
        };
        lines.push(Line::from(vec![
            Span::styled(
                turn.role().display_name(),
                Style::default().fg(role_color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  {}", turn.time_label()), Style::default().fg(Color::Gray)),
        ]));
        for line in wrap_content(turn.content(), width) {
            lines.push(Line::from(line));
        }
        lines.push(Line::default());
    }

    if chat.pipeline.is_busy() {
        lines.push(Line::from(Span::styled(
            "AI Assistant",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        )));
    }

    let scroll_limit = max_scroll(lines.len(), chat.chat_height);
    if chat.auto_scroll || chat.scroll >= scroll_limit {
        chat.scroll = scroll_limit;
        chat.auto_scroll = true;
    }

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Conversation ");
    let transcript = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .wrap(Wrap { trim: false })
        .scroll((chat.scroll, 0));
    frame.render_widget(transcript, chat_area);

    if let Some(notice) = &chat.notice {
        frame.render_widget(
            Paragraph::new(Span::styled(notice.as_str(), Style::default().fg(Color::Yellow))),
            notice_area,
        );
    }

    // Input box is dimmed while a reply is outstanding
    let busy = chat.pipeline.is_busy();
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if busy { Color::DarkGray } else { Color::Yellow }))
        .title(if busy { " Sending... " } else { " Message (Enter to send) " });

    // Horizontal scrolling keeps the cursor visible
    let inner_width = input_area.width.saturating_sub(2) as usize;
    let scroll_offset = if inner_width == 0 || chat.cursor < inner_width {
        0
    } else {
        chat.cursor - inner_width + 1
    };
    let visible_text: String = chat.input.chars().skip(scroll_offset).take(inner_width).collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);
    frame.render_widget(input, input_area);

    if !busy {
        let cursor_x = (chat.cursor - scroll_offset) as u16;
        frame.set_cursor_position((input_area.x + cursor_x + 1, input_area.y + 1));
    }
}
