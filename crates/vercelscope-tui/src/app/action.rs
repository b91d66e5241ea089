/// All possible actions in the application (command pattern)
#[derive(Clone, Debug)]
pub enum Action {
    // Navigation
    GoBack,
    Quit,

    // Deployments table
    ListUp,
    ListDown,
    ListSelect,
    BranchNext,
    BranchPrev,
    RefreshDeployments,
    OpenInBrowser,

    // Log viewer
    ScrollUp(usize),
    ScrollDown(usize),
    PageUp,
    PageDown,
    ScrollToTop,
    ScrollToBottom,
    ToggleAutoScroll,

    // UI toggles
    ToggleHelp,

    // Error handling
    ShowError(String),
    DismissError,

    // Tick (for periodic updates)
    Tick,

    // Render request
    Render,
}
