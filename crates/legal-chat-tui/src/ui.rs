use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
};
use legal_chat_core::Role;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};
use crate::app::{App, BackendStatus};

const TITLE: &str = " Legal RAG Chatbot ";
const SUBTITLE: &str = " Ask questions about Pakistan's Constitution";
const PLACEHOLDER: &str = "Type your question about the Constitution...";

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let status = match &app.backend {
        BackendStatus::Checking => Span::styled(" connecting... ", Style::default().fg(Color::Gray)),
        BackendStatus::Online => Span::styled(" online ", Style::default().fg(Color::Green)),
        BackendStatus::Offline(_) => Span::styled(" offline ", Style::default().fg(Color::Red)),
    };

    let title = Line::from(vec![
        Span::styled(TITLE, Style::default().fg(Color::Cyan).bold()),
        status,
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);
    let subtitle = Line::from(vec![
        Span::raw(SUBTITLE),
        Span::styled(format!("  ({})", app.api_url), Style::default().fg(Color::Gray)),
    ]);

    let header = Paragraph::new(vec![title, subtitle]).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

/// Wrap one line of text to `width` display columns, breaking at spaces.
/// Spacing inside a row is kept as sent; words wider than the row are
/// split by character. An empty line still takes one row.
fn wrap_text_to_width(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut rows = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;
    let mut started = false;

    for word in text.split(' ') {
        let word_width = UnicodeWidthStr::width(word);

        if started && current_width + 1 + word_width <= width {
            // Word fits on current row
            current.push(' ');
            current.push_str(word);
            current_width += 1 + word_width;
            continue;
        }

        if started {
            rows.push(std::mem::take(&mut current));
            current_width = 0;
        }

        for c in word.chars() {
            let char_width = c.width().unwrap_or(0);
            if current_width > 0 && current_width + char_width > width {
                rows.push(std::mem::take(&mut current));
                current_width = 0;
            }
            current.push(c);
            current_width += char_width;
        }
        started = true;
    }

    rows.push(current);
    rows
}

/// Every row of the chat pane at the given inner width, already wrapped,
/// so the row count is exactly what gets drawn.
fn chat_rows(app: &App, width: usize) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for msg in app.conversation.messages() {
        lines.push(role_line(msg.role()));
        // Content is shown exactly as received
        for line in msg.content().lines() {
            lines.extend(wrap_text_to_width(line, width).into_iter().map(Line::from));
        }
        lines.push(Line::default());
    }

    if app.is_pending() {
        lines.push(role_line(Role::Assistant));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Inner size minus borders drives wrap and scroll calculations
    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2);

    let lines = chat_rows(app, inner_width as usize);
    app.sync_viewport(inner_width, inner_height, lines.len());

    let border_color = if app.viewport.is_following() { Color::Cyan } else { Color::DarkGray };
    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Conversation ");

    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .scroll((app.viewport.offset, 0));

    frame.render_widget(chat, area);
}

fn role_line(role: Role) -> Line<'static> {
    let color = match role {
        Role::User => Color::Cyan,
        Role::Assistant => Color::Yellow,
    };
    Line::from(Span::styled(
        App::role_label(role),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let pending = app.is_pending();
    let (border_color, title) = if pending {
        (Color::DarkGray, " Waiting for answer... ")
    } else {
        (Color::Yellow, " Ask (Enter to send) ")
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let (visible_text, cursor_x) = visible_input(&app.input, app.cursor, inner_width);

    let input = if app.input.is_empty() {
        Paragraph::new(PLACEHOLDER).style(Style::default().fg(Color::DarkGray))
    } else {
        let color = if pending { Color::Gray } else { Color::Cyan };
        Paragraph::new(visible_text).style(Style::default().fg(color))
    };

    frame.render_widget(input.block(input_block), area);

    if inner_width > 0 {
        frame.set_cursor_position((
            area.x.saturating_add(1).saturating_add(cursor_x),
            area.y.saturating_add(1),
        ));
    }
}

/// The slice of the draft that fits in `width` columns with the cursor
/// (a char index) kept in view, and the cursor's column within it.
fn visible_input(input: &str, cursor: usize, width: usize) -> (String, u16) {
    if width == 0 {
        return (String::new(), 0);
    }

    let widths: Vec<usize> = input.chars().map(|c| c.width().unwrap_or(0)).collect();
    let cursor = cursor.min(widths.len());

    // Drop chars from the left until the cursor column is inside the box
    let mut start = 0;
    let mut before: usize = widths[..cursor].iter().sum();
    while before >= width && start < cursor {
        before -= widths[start];
        start += 1;
    }

    let mut used = 0;
    let visible: String = input
        .chars()
        .zip(widths.iter())
        .skip(start)
        .take_while(|(_, w)| {
            used += **w;
            used <= width
        })
        .map(|(c, _)| c)
        .collect();

    (visible, before.min(u16::MAX as usize) as u16)
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode = if app.is_pending() {
        Span::styled(" SENDING ", Style::default().bg(Color::Yellow).fg(Color::Black))
    } else {
        Span::styled(" READY ", Style::default().bg(Color::Blue).fg(Color::White))
    };

    let hints = " Enter send | Up/Down PgUp/PgDn scroll | Ctrl-U clear | Esc quit ";

    let mut spans = vec![mode, Span::styled(hints, Style::default().fg(Color::Gray))];
    if let BackendStatus::Offline(reason) = &app.backend {
        spans.push(Span::styled(
            format!("backend: {}", reason),
            Style::default().fg(Color::Red),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use legal_chat_core::{Answer, Dispatcher, Failure};
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;
    use tokio::sync::mpsc;

    struct Unused;

    #[async_trait]
    impl Dispatcher for Unused {
        async fn ask(&self, _question: &str) -> Result<Answer, Failure> {
            Err(Failure::default())
        }
    }

    fn new_app(greeting: &str) -> App {
        let (tx, _rx) = mpsc::unbounded_channel();
        App::new(greeting, String::new(), Arc::new(Unused), tx)
    }

    fn screen_rows(terminal: &Terminal<TestBackend>) -> Vec<String> {
        let buffer = terminal.backend().buffer();
        buffer
            .content
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect())
            .collect()
    }

    fn settle_view(terminal: &mut Terminal<TestBackend>, app: &mut App) {
        terminal.draw(|frame| render(app, frame)).unwrap();
        for _ in 0..30 {
            app.tick();
        }
        terminal.draw(|frame| render(app, frame)).unwrap();
    }

    #[test]
    fn test_wrap_breaks_at_spaces() {
        assert_eq!(
            wrap_text_to_width("aaaaaaaaaaa bbbbbbbbbbb cc", 20),
            vec!["aaaaaaaaaaa", "bbbbbbbbbbb cc"]
        );
        assert_eq!(wrap_text_to_width("short", 20), vec!["short"]);
        assert_eq!(wrap_text_to_width("", 20), vec![""]);
    }

    #[test]
    fn test_wrap_splits_long_words_and_keeps_spacing() {
        assert_eq!(wrap_text_to_width("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap_text_to_width("a  b", 10), vec!["a  b"]);
        assert_eq!(wrap_text_to_width("  indented", 20), vec!["  indented"]);
    }

    #[test]
    fn test_wrap_uses_display_width() {
        // Each of these takes two columns
        let rows = wrap_text_to_width("憲法憲法憲法", 5);
        assert_eq!(rows, vec!["憲法", "憲法", "憲法"]);
        for row in rows {
            assert!(UnicodeWidthStr::width(row.as_str()) <= 5);
        }
    }

    #[test]
    fn test_latest_wrapped_answer_is_visible() {
        let mut terminal = Terminal::new(TestBackend::new(22, 14)).unwrap();
        let mut app = new_app("Hello! I am your Legal Assistant. How may I help?");

        app.conversation.begin("q");
        let answer = [
            "aaaaaaaaaaa", "bbbbbbbbbbb", "ccccccccccc", "ddddddddddd", "eeeeeeeeeee",
            "fffffffffff", "ggggggggggg", "hhhhhhhhhhh", "iiiiiiiiiii", "ENDMARK",
        ]
        .join(" ");
        app.settle(Ok(Answer::new(answer)));

        settle_view(&mut terminal, &mut app);

        let rows = screen_rows(&terminal);
        assert!(
            rows.iter().any(|row| row.contains("ENDMARK")),
            "last word not on screen: {:#?}",
            rows
        );
        assert!(rows.iter().any(|row| row.contains("iiiiiiiiiii")));
    }

    #[test]
    fn test_pending_row_is_visible() {
        let mut terminal = Terminal::new(TestBackend::new(30, 12)).unwrap();
        let mut app = new_app("A greeting long enough to need several rows in a narrow pane.");

        app.conversation.begin("What is Article 25 of the Constitution?");
        settle_view(&mut terminal, &mut app);

        let rows = screen_rows(&terminal);
        assert!(rows.iter().any(|row| row.contains("Thinking")));
    }

    #[test]
    fn test_visible_input_ascii() {
        assert_eq!(visible_input("hello", 5, 10), ("hello".to_string(), 5));
        assert_eq!(visible_input("hello world", 11, 5), ("orld".to_string(), 4));
        assert_eq!(visible_input("hello world", 0, 5), ("hello".to_string(), 0));
    }

    #[test]
    fn test_visible_input_wide_chars() {
        // Cursor after three two-column chars sits at column 6
        assert_eq!(visible_input("憲法第", 3, 10), ("憲法第".to_string(), 6));
        // In a 5-column box the view shifts so the cursor stays inside
        let (text, column) = visible_input("憲法第二", 4, 5);
        assert!(column < 5);
        assert!(UnicodeWidthStr::width(text.as_str()) <= 5);
        assert!(text.ends_with('二'));
    }

    #[test]
    fn test_visible_input_zero_width_box() {
        assert_eq!(visible_input("anything", 3, 0), (String::new(), 0));
    }

    #[test]
    fn test_tiny_terminal_does_not_panic() {
        let mut terminal = Terminal::new(TestBackend::new(2, 3)).unwrap();
        let mut app = new_app("hi");
        app.input = "typed".to_string();
        app.cursor = 5;
        terminal.draw(|frame| render(&mut app, frame)).unwrap();
    }
}
