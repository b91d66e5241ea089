use chrono::{DateTime, Local};
use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use vercelscope_logs::{LogStreamController, StreamPhase};
use vercelscope_types::LogEvent;

use crate::{
    app::AppState,
    ui::{
        Layout, Theme,
        components::{StatusBar, log_viewer_hints},
    },
};

/// Build log viewer for a single deployment
pub struct LogViewerScreen;

impl LogViewerScreen {
    pub fn render(frame: &mut Frame, state: &mut AppState, logs: &LogStreamController) {
        let area = frame.area();
        let (header_area, content_area, status_area) = Layout::main(area);

        Self::render_header(frame, header_area, state, logs);
        Self::render_logs(frame, content_area, state, logs);
        Self::render_status_bar(frame, status_area, state, logs);
    }

    fn render_header(
        frame: &mut Frame,
        area: Rect,
        state: &AppState,
        logs: &LogStreamController,
    ) {
        let deployment = state.viewing.as_ref();
        let url = deployment
            .and_then(|d| d.url.as_deref())
            .unwrap_or("unknown");
        let branch = deployment.and_then(|d| d.branch()).unwrap_or("-");

        let mut spans = vec![
            Span::styled("Build Logs", Theme::title()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(url, Theme::text()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(branch, Theme::text_highlight()),
        ];
        if logs.phase() == StreamPhase::StreamingLive {
            spans.push(Span::styled(" │ ", Theme::text_dim()));
            spans.push(Span::styled("● live", Theme::live_indicator()));
        }

        let header = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border()),
        );

        frame.render_widget(header, area);
    }

    fn render_logs(
        frame: &mut Frame,
        area: Rect,
        state: &mut AppState,
        logs: &LogStreamController,
    ) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::border_focused());
        let inner_height = area.height.saturating_sub(2) as usize;

        let feed = logs.feed();

        if feed.is_loading() {
            let widget = Paragraph::new(Line::from(Span::styled(
                "Loading logs...",
                Theme::text_dim(),
            )))
            .block(block);
            frame.render_widget(widget, area);
            return;
        }

        if feed.is_empty() {
            let message = match logs.last_error() {
                Some(error) => Line::from(Span::styled(error.to_string(), Theme::error())),
                None => Line::from(Span::styled(
                    "No build logs available",
                    Theme::text_dim(),
                )),
            };
            let widget = Paragraph::new(message).block(block);
            frame.render_widget(widget, area);
            return;
        }

        let lines: Vec<Line> = feed.events().iter().flat_map(event_lines).collect();
        let total = lines.len();

        // Follow mode pins the viewport to the newest line; manual scrolling
        // is clamped so the last page stays full.
        let max_scroll = total.saturating_sub(inner_height);
        if state.ui_state.auto_scroll {
            state.ui_state.log_scroll = max_scroll;
        } else {
            state.ui_state.log_scroll = state.ui_state.log_scroll.min(max_scroll);
        }

        let widget = Paragraph::new(lines)
            .block(block)
            .scroll((scroll_offset(state.ui_state.log_scroll), 0));
        frame.render_widget(widget, area);
    }

    fn render_status_bar(
        frame: &mut Frame,
        area: Rect,
        state: &AppState,
        logs: &LogStreamController,
    ) {
        let feed = logs.feed();
        let right = if state.ui_state.auto_scroll {
            format!("{} events │ following", feed.len())
        } else {
            format!("{} events", feed.len())
        };

        let status = StatusBar::new().hints(log_viewer_hints()).right(right);

        frame.render_widget(status, area);
    }
}

/// Render one event as displayable lines, timestamp on the first
fn event_lines(event: &LogEvent) -> Vec<Line<'_>> {
    let style = if event.is_stderr() {
        Theme::error()
    } else {
        Theme::text()
    };
    let stamp = event.timestamp().and_then(format_timestamp);

    event
        .text()
        .lines()
        .enumerate()
        .map(|(i, text)| {
            let mut spans = Vec::new();
            match (&stamp, i) {
                (Some(stamp), 0) => {
                    spans.push(Span::styled(format!("{} ", stamp), Theme::text_dim()));
                }
                (Some(_), _) => {
                    // Continuation lines align under the first
                    spans.push(Span::raw(" ".repeat(9)));
                }
                (None, _) => {}
            }
            spans.push(Span::styled(text.to_string(), style));
            Line::from(spans)
        })
        .collect()
}

/// Scroll position as the widget offset, saturating on very deep feeds
fn scroll_offset(scroll: usize) -> u16 {
    scroll.min(u16::MAX as usize) as u16
}

/// Epoch milliseconds to a local wall-clock stamp
fn format_timestamp(ms: i64) -> Option<String> {
    let stamp = DateTime::from_timestamp_millis(ms)?.with_timezone(&Local);
    Some(stamp.format("%H:%M:%S").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: &str, text: &str) -> LogEvent {
        LogEvent {
            kind: kind.to_string(),
            created: Some(1_700_000_000_000),
            text: Some(text.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_multiline_event_yields_one_line_each() {
        let multiline = event("stdout", "first\nsecond\nthird");
        let lines = event_lines(&multiline);
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_timestamp_only_on_first_line() {
        let multiline = event("stdout", "first\nsecond");
        let lines = event_lines(&multiline);
        // First line carries the stamp span plus text, continuation a pad
        assert_eq!(lines[0].spans.len(), 2);
        assert_eq!(lines[1].spans[0].content, " ".repeat(9));
    }

    #[test]
    fn test_event_without_timestamp_has_no_prefix() {
        let bare = LogEvent {
            kind: "stdout".to_string(),
            text: Some("plain".to_string()),
            ..Default::default()
        };
        let lines = event_lines(&bare);
        assert_eq!(lines[0].spans.len(), 1);
    }

    #[test]
    fn test_scroll_offset_saturates() {
        assert_eq!(scroll_offset(0), 0);
        assert_eq!(scroll_offset(1000), 1000);
        assert_eq!(scroll_offset(usize::MAX), u16::MAX);
    }

    #[test]
    fn test_format_timestamp_rejects_out_of_range() {
        assert!(format_timestamp(i64::MAX).is_none());
        assert!(format_timestamp(1_700_000_000_000).is_some());
    }
}
