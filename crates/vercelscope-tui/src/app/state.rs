use ratatui::widgets::TableState;
use tokio::sync::mpsc;

use vercelscope_types::{Deployment, Project};

use super::Action;

/// Branch tab shown before all per-branch tabs
pub const ALL_BRANCHES: &str = "All";

/// Screen enumeration
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Screen {
    Deployments,
    LogViewer,
}

/// UI-specific transient state
pub struct UiState {
    /// Scroll position in log viewer
    pub log_scroll: usize,

    /// Auto-scroll enabled (follow mode)?
    pub auto_scroll: bool,

    /// Is help overlay visible?
    pub help_visible: bool,

    /// Error message to display (if any)
    pub error_message: Option<String>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            log_scroll: 0,
            auto_scroll: true,
            help_visible: false,
            error_message: None,
        }
    }
}

/// Global application state
pub struct AppState {
    /// Current screen being displayed
    pub current_screen: Screen,

    /// The linked project
    pub project: Option<Project>,

    /// Team the project belongs to (if any)
    pub team_id: Option<String>,

    /// All fetched deployments, unfiltered
    pub deployments: Vec<Deployment>,

    /// Index into `branch_tabs()`
    pub selected_branch: usize,

    /// Table selection for the deployments screen
    pub table_state: TableState,

    /// Deployment whose logs are open (log viewer screen)
    pub viewing: Option<Deployment>,

    /// UI state
    pub ui_state: UiState,

    /// Whether app should quit
    pub should_quit: bool,

    /// Channel sender for async actions
    pub action_tx: mpsc::UnboundedSender<Action>,
}

impl AppState {
    pub fn new(action_tx: mpsc::UnboundedSender<Action>) -> Self {
        let mut table_state = TableState::default();
        table_state.select(Some(0));

        Self {
            current_screen: Screen::Deployments,
            project: None,
            team_id: None,
            deployments: Vec::new(),
            selected_branch: 0,
            table_state,
            viewing: None,
            ui_state: UiState::default(),
            should_quit: false,
            action_tx,
        }
    }

    /// Branch tabs: "All" first, then branches ordered by their most recent
    /// deployment, newest first, ties broken alphabetically
    pub fn branch_tabs(&self) -> Vec<String> {
        let mut latest_by_branch: Vec<(String, i64)> = Vec::new();

        for deployment in &self.deployments {
            let Some(branch) = deployment.branch() else {
                continue;
            };
            let created = deployment.created_at();
            match latest_by_branch.iter_mut().find(|(b, _)| b == branch) {
                Some((_, latest)) => {
                    if created > *latest {
                        *latest = created;
                    }
                }
                None => latest_by_branch.push((branch.to_string(), created)),
            }
        }

        latest_by_branch.sort_by(|(branch_a, created_a), (branch_b, created_b)| {
            created_b.cmp(created_a).then_with(|| branch_a.cmp(branch_b))
        });

        let mut tabs = vec![ALL_BRANCHES.to_string()];
        tabs.extend(latest_by_branch.into_iter().map(|(branch, _)| branch));
        tabs
    }

    /// Name of the currently selected branch tab
    pub fn selected_branch_name(&self) -> String {
        let tabs = self.branch_tabs();
        tabs.get(self.selected_branch)
            .cloned()
            .unwrap_or_else(|| ALL_BRANCHES.to_string())
    }

    /// Deployments under the selected branch tab, newest first
    pub fn visible_deployments(&self) -> Vec<&Deployment> {
        let branch = self.selected_branch_name();
        let mut visible: Vec<&Deployment> = self
            .deployments
            .iter()
            .filter(|d| branch == ALL_BRANCHES || d.branch() == Some(branch.as_str()))
            .collect();
        visible.sort_by_key(|d| std::cmp::Reverse(d.created_at()));
        visible
    }

    /// The deployment currently highlighted in the table
    pub fn selected_deployment(&self) -> Option<&Deployment> {
        let visible = self.visible_deployments();
        visible.get(self.table_state.selected()?).copied()
    }

    /// Replace the deployment list, clamping the selection if it shrank
    pub fn set_deployments(&mut self, deployments: Vec<Deployment>) {
        self.deployments = deployments;

        let tab_count = self.branch_tabs().len();
        if self.selected_branch >= tab_count {
            self.selected_branch = 0;
        }
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_deployments().len();
        let selected = self.table_state.selected().unwrap_or(0);
        if len == 0 {
            self.table_state.select(Some(0));
        } else if selected >= len {
            self.table_state.select(Some(len - 1));
        }
    }

    /// Move table selection up, wrapping at the top
    pub fn list_up(&mut self) {
        let len = self.visible_deployments().len();
        if len == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.table_state.select(Some(i));
    }

    /// Move table selection down, wrapping at the bottom
    pub fn list_down(&mut self) {
        let len = self.visible_deployments().len();
        if len == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.table_state.select(Some(i));
    }

    /// Cycle to the next branch tab
    pub fn branch_next(&mut self) {
        let tab_count = self.branch_tabs().len();
        if tab_count == 0 {
            return;
        }
        self.selected_branch = (self.selected_branch + 1) % tab_count;
        self.clamp_selection();
    }

    /// Cycle to the previous branch tab
    pub fn branch_prev(&mut self) {
        let tab_count = self.branch_tabs().len();
        if tab_count == 0 {
            return;
        }
        self.selected_branch = (self.selected_branch + tab_count - 1) % tab_count;
        self.clamp_selection();
    }

    /// Open the log viewer for the highlighted deployment
    ///
    /// Returns the deployment to bind the log stream to.
    pub fn open_selected(&mut self) -> Option<Deployment> {
        let deployment = self.selected_deployment()?.clone();
        self.viewing = Some(deployment.clone());
        self.current_screen = Screen::LogViewer;
        self.ui_state.log_scroll = 0;
        self.ui_state.auto_scroll = true;
        Some(deployment)
    }

    /// Leave the log viewer back to the deployments table
    pub fn close_log_viewer(&mut self) {
        self.viewing = None;
        self.current_screen = Screen::Deployments;
    }

    /// Show an error message
    pub fn show_error(&mut self, msg: String) {
        self.ui_state.error_message = Some(msg);
    }

    /// Dismiss the error message
    pub fn dismiss_error(&mut self) {
        self.ui_state.error_message = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn deployment(uid: &str, branch: Option<&str>, created: i64) -> Deployment {
        let mut value = json!({ "uid": uid, "created": created });
        if let Some(branch) = branch {
            value["meta"] = json!({ "githubCommitRef": branch });
        }
        serde_json::from_value(value).unwrap()
    }

    fn state_with(deployments: Vec<Deployment>) -> AppState {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut state = AppState::new(tx);
        state.set_deployments(deployments);
        state
    }

    #[test]
    fn test_branch_tabs_all_first_then_by_recency() {
        let state = state_with(vec![
            deployment("d1", Some("main"), 100),
            deployment("d2", Some("feature/x"), 300),
            deployment("d3", Some("main"), 200),
            deployment("d4", None, 500),
        ]);

        assert_eq!(state.branch_tabs(), vec!["All", "feature/x", "main"]);
    }

    #[test]
    fn test_branch_tabs_recency_ties_break_alphabetically() {
        let state = state_with(vec![
            deployment("d1", Some("beta"), 100),
            deployment("d2", Some("alpha"), 100),
        ]);

        assert_eq!(state.branch_tabs(), vec!["All", "alpha", "beta"]);
    }

    #[test]
    fn test_visible_deployments_sorted_newest_first() {
        let state = state_with(vec![
            deployment("old", Some("main"), 100),
            deployment("new", Some("main"), 300),
            deployment("mid", Some("main"), 200),
        ]);

        let uids: Vec<_> = state.visible_deployments().iter().map(|d| d.uid.as_str()).collect();
        assert_eq!(uids, vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_branch_filter() {
        let mut state = state_with(vec![
            deployment("d1", Some("main"), 300),
            deployment("d2", Some("dev"), 200),
            deployment("d3", Some("main"), 100),
        ]);

        // Tabs: All, main, dev
        state.branch_next();
        assert_eq!(state.selected_branch_name(), "main");

        let uids: Vec<_> = state.visible_deployments().iter().map(|d| d.uid.as_str()).collect();
        assert_eq!(uids, vec!["d1", "d3"]);
    }

    #[test]
    fn test_branch_cycling_wraps() {
        let mut state = state_with(vec![deployment("d1", Some("main"), 100)]);

        assert_eq!(state.selected_branch_name(), "All");
        state.branch_prev();
        assert_eq!(state.selected_branch_name(), "main");
        state.branch_next();
        assert_eq!(state.selected_branch_name(), "All");
    }

    #[test]
    fn test_selection_clamped_when_list_shrinks() {
        let mut state = state_with(vec![
            deployment("d1", Some("main"), 300),
            deployment("d2", Some("main"), 200),
            deployment("d3", Some("main"), 100),
        ]);
        state.table_state.select(Some(2));

        state.set_deployments(vec![deployment("d1", Some("main"), 300)]);
        assert_eq!(state.table_state.selected(), Some(0));
    }

    #[test]
    fn test_list_navigation_wraps() {
        let mut state = state_with(vec![
            deployment("d1", Some("main"), 200),
            deployment("d2", Some("main"), 100),
        ]);

        assert_eq!(state.table_state.selected(), Some(0));
        state.list_up();
        assert_eq!(state.table_state.selected(), Some(1));
        state.list_down();
        assert_eq!(state.table_state.selected(), Some(0));
    }

    #[test]
    fn test_open_selected_switches_screen() {
        let mut state = state_with(vec![deployment("d1", Some("main"), 100)]);

        let opened = state.open_selected().unwrap();
        assert_eq!(opened.uid, "d1");
        assert_eq!(state.current_screen, Screen::LogViewer);

        state.close_log_viewer();
        assert_eq!(state.current_screen, Screen::Deployments);
        assert!(state.viewing.is_none());
    }
}
