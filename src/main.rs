use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;

use vercelscope_api::VercelClient;
use vercelscope_logs::{LogStreamController, StampedUpdate};
use vercelscope_tui::{
    Action, AppState, DeploymentListScreen, Event, EventHandler, HelpOverlay, KeyBindings,
    KeyContext, LogViewerScreen, Screen, Tui,
};
use vercelscope_types::{Deployment, Project};

mod config;

/// How often the deployments table is refreshed in the background
const REFRESH_INTERVAL: Duration = Duration::from_secs(10);

const TICK_RATE: Duration = Duration::from_millis(100);

/// Vercelscope - A terminal UI for watching Vercel deployments and tailing build logs
#[derive(Parser, Debug)]
#[command(name = "vercelscope")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// API token (falls back to VERCEL_TOKEN, then the config file)
    #[arg(long)]
    token: Option<String>,

    /// Team id to scope API calls to (overrides the project link file)
    #[arg(long)]
    team: Option<String>,

    /// Project id to watch (overrides .vercel/project.json)
    #[arg(long)]
    project: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing for debugging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Run the application
    let result = run_app(args).await;

    // Handle any errors
    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

/// Internal actions for async operations
enum InternalAction {
    DeploymentsLoaded(Vec<Deployment>),
    Error(String),
}

/// Resolve credentials and the project to watch, before any TUI setup
async fn connect(args: &Args) -> Result<(VercelClient, Project)> {
    let token = config::resolve_token(args.token.clone())?;

    // Project id and team scope come from the link file unless overridden
    let cwd = std::env::current_dir().context("Could not determine working directory")?;
    let (project_id, link_team) = match (&args.project, config::load_project_link(&cwd)) {
        (Some(project), _) => (project.clone(), None),
        (None, Ok(link)) => {
            let team = link.team_id().map(str::to_string);
            (link.project_id, team)
        }
        (None, Err(e)) => return Err(e.into()),
    };
    let team_id = args.team.clone().or(link_team);

    let client = VercelClient::new(token, team_id)?;
    client.validate_token().await?;

    let projects = client.get_projects().await?;
    let project = projects
        .into_iter()
        .find(|p| p.id == project_id || p.name == project_id)
        .with_context(|| format!("Project '{}' not found for this account", project_id))?;

    Ok((client, project))
}

async fn run_app(args: Args) -> Result<()> {
    let (client, project) = connect(&args).await?;

    // Create action channels
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let (internal_tx, mut internal_rx) = mpsc::unbounded_channel::<InternalAction>();

    // Initialize state
    let mut state = AppState::new(action_tx.clone());
    state.team_id = client.team_id().map(str::to_string);

    // Initial deployment listing, before entering the alternate screen so a
    // failure surfaces as a plain error message
    let deployments = client.get_deployments(&project.id).await?;
    state.set_deployments(deployments);
    state.project = Some(project);

    // Log stream controller for the viewed deployment
    let (mut logs, mut log_rx) = LogStreamController::new();

    // Initialize TUI
    let mut tui = Tui::new()?;

    // Initialize event handler
    let mut events = EventHandler::new(TICK_RATE);

    // Initialize keybindings
    let keybindings = KeyBindings::new();

    let mut ticks_since_refresh: u32 = 0;
    let refresh_ticks = (REFRESH_INTERVAL.as_millis() / TICK_RATE.as_millis()) as u32;

    // Initial render
    render(&mut tui, &mut state, &logs)?;

    // Main event loop
    loop {
        tokio::select! {
            // Handle terminal events
            Some(event) = events.next() => {
                match event {
                    Event::Key(key) => {
                        let context = match state.current_screen {
                            Screen::Deployments => KeyContext::DeploymentList,
                            Screen::LogViewer => KeyContext::LogViewer,
                        };

                        if let Some(action) = keybindings.get_action(context, &key) {
                            let _ = action_tx.send(action);
                        }
                    }
                    Event::Tick => {
                        ticks_since_refresh += 1;
                        if ticks_since_refresh >= refresh_ticks {
                            ticks_since_refresh = 0;
                            if state.current_screen == Screen::Deployments {
                                let _ = action_tx.send(Action::RefreshDeployments);
                            }
                        }
                    }
                    Event::Resize => {
                        let _ = action_tx.send(Action::Render);
                    }
                    Event::Error(e) => {
                        state.show_error(e);
                    }
                }
            }

            // Handle log stream updates for the viewed deployment
            Some(update) = log_rx.recv() => {
                apply_log_updates(&mut logs, update, &mut log_rx);
            }

            // Handle user actions
            Some(action) = action_rx.recv() => {
                handle_action(&mut state, &mut logs, &client, &internal_tx, action);
            }

            // Handle internal async actions
            Some(internal) = internal_rx.recv() => {
                match internal {
                    InternalAction::DeploymentsLoaded(deployments) => {
                        state.set_deployments(deployments);
                        state.dismiss_error();
                    }
                    InternalAction::Error(msg) => {
                        state.show_error(msg);
                    }
                }
            }
        }

        if state.should_quit {
            break;
        }

        render(&mut tui, &mut state, &logs)?;
    }

    // Cleanup
    logs.cancel();
    events.shutdown();
    tui.restore()?;

    Ok(())
}

/// Apply one log update, then drain whatever else is already queued so a
/// burst of stream chunks costs a single redraw
fn apply_log_updates(
    logs: &mut LogStreamController,
    first: StampedUpdate,
    rx: &mut mpsc::UnboundedReceiver<StampedUpdate>,
) {
    logs.apply(first);
    while let Ok(update) = rx.try_recv() {
        logs.apply(update);
    }
}

fn handle_action(
    state: &mut AppState,
    logs: &mut LogStreamController,
    client: &VercelClient,
    internal_tx: &mpsc::UnboundedSender<InternalAction>,
    action: Action,
) {
    match action {
        Action::Quit => {
            state.should_quit = true;
        }
        Action::GoBack => {
            if state.ui_state.help_visible {
                state.ui_state.help_visible = false;
            } else if state.ui_state.error_message.is_some() {
                state.dismiss_error();
            } else if state.current_screen == Screen::LogViewer {
                logs.cancel();
                state.close_log_viewer();
            } else {
                state.should_quit = true;
            }
        }

        // Deployments table
        Action::ListUp => {
            state.list_up();
        }
        Action::ListDown => {
            state.list_down();
        }
        Action::ListSelect => {
            if let Some(deployment) = state.open_selected() {
                logs.bind(client, &deployment);
            }
        }
        Action::BranchNext => {
            state.branch_next();
        }
        Action::BranchPrev => {
            state.branch_prev();
        }
        Action::RefreshDeployments => {
            spawn_refresh(state, client, internal_tx);
        }
        Action::OpenInBrowser => {
            open_in_browser(state);
        }

        // Log viewer actions
        Action::ScrollUp(n) => {
            state.ui_state.auto_scroll = false;
            state.ui_state.log_scroll = state.ui_state.log_scroll.saturating_sub(n);
        }
        Action::ScrollDown(n) => {
            state.ui_state.auto_scroll = false;
            // Don't cap here - the renderer clamps to the actual line count
            state.ui_state.log_scroll = state.ui_state.log_scroll.saturating_add(n);
        }
        Action::PageUp => {
            state.ui_state.auto_scroll = false;
            state.ui_state.log_scroll = state.ui_state.log_scroll.saturating_sub(20);
        }
        Action::PageDown => {
            state.ui_state.auto_scroll = false;
            state.ui_state.log_scroll = state.ui_state.log_scroll.saturating_add(20);
        }
        Action::ScrollToTop => {
            state.ui_state.auto_scroll = false;
            state.ui_state.log_scroll = 0;
        }
        Action::ScrollToBottom => {
            state.ui_state.auto_scroll = false;
            // Set to max value - the renderer clamps to the actual bottom
            state.ui_state.log_scroll = usize::MAX;
        }
        Action::ToggleAutoScroll => {
            state.ui_state.auto_scroll = !state.ui_state.auto_scroll;
        }

        Action::ShowError(msg) => {
            state.show_error(msg);
        }
        Action::DismissError => {
            state.dismiss_error();
        }
        Action::ToggleHelp => {
            state.ui_state.help_visible = !state.ui_state.help_visible;
        }

        Action::Tick | Action::Render => {
            // Redraw happens after every loop iteration anyway
        }
    }
}

/// Kick off a background deployment refresh
fn spawn_refresh(
    state: &AppState,
    client: &VercelClient,
    internal_tx: &mpsc::UnboundedSender<InternalAction>,
) {
    let Some(project) = &state.project else {
        return;
    };
    let client = client.clone();
    let project_id = project.id.clone();
    let tx = internal_tx.clone();

    tokio::spawn(async move {
        match client.get_deployments(&project_id).await {
            Ok(deployments) => {
                let _ = tx.send(InternalAction::DeploymentsLoaded(deployments));
            }
            Err(e) => {
                let _ = tx.send(InternalAction::Error(format!(
                    "Could not refresh deployments: {}",
                    e
                )));
            }
        }
    });
}

/// Open the relevant deployment's URL in the default browser
fn open_in_browser(state: &mut AppState) {
    let deployment = match state.current_screen {
        Screen::LogViewer => state.viewing.clone(),
        Screen::Deployments => state.selected_deployment().cloned(),
    };

    let Some(url) = deployment.and_then(|d| d.url) else {
        state.show_error("No URL for this deployment".to_string());
        return;
    };

    if let Err(e) = open::that_detached(format!("https://{}", url)) {
        state.show_error(format!("Could not open browser: {}", e));
    }
}

fn render(tui: &mut Tui, state: &mut AppState, logs: &LogStreamController) -> Result<()> {
    let now_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0);

    tui.draw(|frame| {
        match state.current_screen {
            Screen::Deployments => {
                DeploymentListScreen::render(frame, state, now_ms);
            }
            Screen::LogViewer => {
                LogViewerScreen::render(frame, state, logs);
            }
        }

        // Render help overlay if visible
        if state.ui_state.help_visible {
            HelpOverlay::render(frame);
        }
    })?;

    Ok(())
}
