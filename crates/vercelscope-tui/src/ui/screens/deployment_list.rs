use ratatui::{
    Frame,
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Row, Table, Tabs},
};
use unicode_width::UnicodeWidthStr;

use vercelscope_types::{Deployment, time_ago_short};

use crate::{
    app::AppState,
    ui::{
        Layout, Theme,
        components::{StatusBar, deployment_nav_hints},
    },
};

/// Deployments table with branch tabs
pub struct DeploymentListScreen;

impl DeploymentListScreen {
    pub fn render(frame: &mut Frame, state: &mut AppState, now_ms: i64) {
        let area = frame.area();
        let (header_area, content_area, status_area) = Layout::main(area);

        Self::render_branch_tabs(frame, header_area, state);
        Self::render_table(frame, content_area, state, now_ms);
        Self::render_status_bar(frame, status_area, state);
    }

    fn render_branch_tabs(frame: &mut Frame, area: Rect, state: &AppState) {
        let project_name = state
            .project
            .as_ref()
            .map(|p| p.name.as_str())
            .unwrap_or("unknown");

        let tabs = Tabs::new(state.branch_tabs())
            .select(state.selected_branch)
            .style(Theme::tab())
            .highlight_style(Theme::tab_selected())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Theme::border())
                    .title(Line::from(vec![
                        Span::styled(" vercelscope ", Theme::title()),
                        Span::styled(format!("│ {} ", project_name), Theme::text()),
                    ])),
            );

        frame.render_widget(tabs, area);
    }

    fn render_table(frame: &mut Frame, area: Rect, state: &mut AppState, now_ms: i64) {
        let rows: Vec<Row> = state
            .visible_deployments()
            .iter()
            .map(|d| Self::deployment_row(d, now_ms))
            .collect();

        let header = Row::new(vec!["Time", "Status", "Target", "URL", "Branch", "Commit"])
            .style(Theme::table_header());

        let table = Table::new(
            rows,
            [
                Constraint::Length(6),
                Constraint::Length(12),
                Constraint::Length(10),
                Constraint::Min(24),
                Constraint::Length(20),
                Constraint::Min(10),
            ],
        )
        .header(header)
        .row_highlight_style(Theme::row_selected())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border_focused()),
        );

        frame.render_stateful_widget(table, area, &mut state.table_state);
    }

    fn deployment_row<'a>(deployment: &Deployment, now_ms: i64) -> Row<'a> {
        let status = deployment.status();
        let age = deployment
            .created
            .map(|created| time_ago_short(created, now_ms))
            .unwrap_or_default();
        let commit = match (deployment.short_sha(), deployment.commit_message()) {
            (Some(sha), Some(msg)) => format!("{} {}", sha, truncate(msg, 40)),
            (Some(sha), None) => sha.to_string(),
            (None, Some(msg)) => truncate(msg, 40),
            (None, None) => String::new(),
        };

        Row::new(vec![
            Cell::from(age),
            Cell::from(Span::styled(status.label(), Theme::ready_state(status))),
            Cell::from(deployment.target.clone().unwrap_or_default()),
            Cell::from(deployment.url.clone().unwrap_or_default()),
            Cell::from(truncate(deployment.branch().unwrap_or(""), 20)),
            Cell::from(commit),
        ])
    }

    fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState) {
        let count = state.visible_deployments().len();
        let right = match &state.ui_state.error_message {
            Some(message) => message.clone(),
            None => format!("{} deployments", count),
        };

        let status = StatusBar::new().hints(deployment_nav_hints()).right(right);

        frame.render_widget(status, area);
    }
}

/// Cut `s` to at most `max` columns, appending an ellipsis when cut
fn truncate(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    let mut width = 0;
    for c in s.chars() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if width + w > max.saturating_sub(1) {
            break;
        }
        width += w;
        out.push(c);
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_string_untouched() {
        assert_eq!(truncate("main", 20), "main");
    }

    #[test]
    fn test_truncate_long_string_gets_ellipsis() {
        let out = truncate("feature/very-long-branch-name", 10);
        assert!(out.ends_with('…'));
        assert!(out.width() <= 10);
    }

    #[test]
    fn test_truncate_counts_display_width() {
        // Wide characters take two columns each
        let out = truncate("ログストリーム", 6);
        assert!(out.width() <= 6);
    }
}
