use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

use crate::app::Action;

/// A key combination
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn ctrl(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    pub fn shift(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::SHIFT,
        }
    }

    pub fn from_event(event: &KeyEvent) -> Self {
        Self {
            code: event.code,
            modifiers: event.modifiers,
        }
    }
}

/// Context for keybindings
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyContext {
    Global,
    DeploymentList,
    LogViewer,
}

/// Keybinding configuration
pub struct KeyBindings {
    bindings: HashMap<KeyContext, HashMap<KeyBinding, Action>>,
}

impl KeyBindings {
    pub fn new() -> Self {
        let mut bindings = HashMap::new();

        // Global bindings
        let mut global = HashMap::new();
        global.insert(KeyBinding::new(KeyCode::Char('?')), Action::ToggleHelp);
        global.insert(KeyBinding::new(KeyCode::Esc), Action::GoBack);
        global.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::Quit);
        global.insert(KeyBinding::new(KeyCode::Char('q')), Action::Quit);
        bindings.insert(KeyContext::Global, global);

        // Deployments table bindings
        let mut list = HashMap::new();
        list.insert(KeyBinding::new(KeyCode::Char('j')), Action::ListDown);
        list.insert(KeyBinding::new(KeyCode::Down), Action::ListDown);
        list.insert(KeyBinding::new(KeyCode::Char('k')), Action::ListUp);
        list.insert(KeyBinding::new(KeyCode::Up), Action::ListUp);
        list.insert(KeyBinding::new(KeyCode::Enter), Action::ListSelect);
        list.insert(KeyBinding::new(KeyCode::Char('l')), Action::BranchNext);
        list.insert(KeyBinding::new(KeyCode::Right), Action::BranchNext);
        list.insert(KeyBinding::new(KeyCode::Tab), Action::BranchNext);
        list.insert(KeyBinding::new(KeyCode::Char('h')), Action::BranchPrev);
        list.insert(KeyBinding::new(KeyCode::Left), Action::BranchPrev);
        list.insert(KeyBinding::new(KeyCode::Char('r')), Action::RefreshDeployments);
        list.insert(KeyBinding::new(KeyCode::Char('o')), Action::OpenInBrowser);
        bindings.insert(KeyContext::DeploymentList, list);

        // Log viewer bindings - less-like navigation
        let mut log_viewer = HashMap::new();
        log_viewer.insert(KeyBinding::new(KeyCode::Char('j')), Action::ScrollDown(1));
        log_viewer.insert(KeyBinding::new(KeyCode::Down), Action::ScrollDown(1));
        log_viewer.insert(KeyBinding::new(KeyCode::Char('k')), Action::ScrollUp(1));
        log_viewer.insert(KeyBinding::new(KeyCode::Up), Action::ScrollUp(1));
        log_viewer.insert(KeyBinding::ctrl(KeyCode::Char('f')), Action::PageDown);
        log_viewer.insert(KeyBinding::ctrl(KeyCode::Char('b')), Action::PageUp);
        log_viewer.insert(KeyBinding::ctrl(KeyCode::Char('d')), Action::PageDown);
        log_viewer.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::PageUp);
        log_viewer.insert(KeyBinding::new(KeyCode::PageDown), Action::PageDown);
        log_viewer.insert(KeyBinding::new(KeyCode::PageUp), Action::PageUp);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('g')), Action::ScrollToTop);
        log_viewer.insert(KeyBinding::shift(KeyCode::Char('G')), Action::ScrollToBottom);
        log_viewer.insert(KeyBinding::new(KeyCode::Home), Action::ScrollToTop);
        log_viewer.insert(KeyBinding::new(KeyCode::End), Action::ScrollToBottom);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('f')), Action::ToggleAutoScroll);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('o')), Action::OpenInBrowser);
        // q closes the viewer rather than the app
        log_viewer.insert(KeyBinding::new(KeyCode::Char('q')), Action::GoBack);
        bindings.insert(KeyContext::LogViewer, log_viewer);

        Self { bindings }
    }

    /// Look up action for key event in given context
    pub fn get_action(&self, context: KeyContext, key: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(key);

        // First check context-specific bindings
        if let Some(context_bindings) = self.bindings.get(&context) {
            if let Some(action) = context_bindings.get(&binding) {
                return Some(action.clone());
            }
        }

        // Fall back to global bindings
        self.bindings
            .get(&KeyContext::Global)?
            .get(&binding)
            .cloned()
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_context_binding_overrides_global() {
        let bindings = KeyBindings::new();

        // 'q' quits globally but only closes the log viewer
        let q = key(KeyCode::Char('q'));
        assert!(matches!(
            bindings.get_action(KeyContext::DeploymentList, &q),
            Some(Action::Quit)
        ));
        assert!(matches!(
            bindings.get_action(KeyContext::LogViewer, &q),
            Some(Action::GoBack)
        ));
    }

    #[test]
    fn test_global_fallback() {
        let bindings = KeyBindings::new();

        let help = key(KeyCode::Char('?'));
        assert!(matches!(
            bindings.get_action(KeyContext::LogViewer, &help),
            Some(Action::ToggleHelp)
        ));
    }

    #[test]
    fn test_unbound_key_yields_nothing() {
        let bindings = KeyBindings::new();

        let unbound = key(KeyCode::Char('z'));
        assert!(bindings.get_action(KeyContext::DeploymentList, &unbound).is_none());
    }
}
