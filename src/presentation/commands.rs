use crate::domain::keybinding::{Action, KeyContext, Keybind};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::borrow::Cow;
use std::collections::HashMap;
use tracing::warn;

/// Key bindings per screen context.
///
/// Lookups try the active context first and fall back to [`KeyContext::Global`].
pub struct CommandRegistry {
    display_bindings: HashMap<(KeyContext, Action), KeyEvent>,
    input_bindings: Vec<(KeyContext, KeyEvent, Action)>,
}

const fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

const fn ctrl(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
}

const fn ch(c: char) -> KeyEvent {
    key(KeyCode::Char(c))
}

impl Default for CommandRegistry {
    fn default() -> Self {
        let mut display_bindings = HashMap::new();
        let mut input_bindings = Vec::new();

        let mut register = |context: KeyContext, action: Action, key: KeyEvent, is_primary: bool| {
            if is_primary {
                display_bindings.insert((context, action), key);
            }
            input_bindings.push((context, normalize(key), action));
        };

        use KeyContext::{Admin, Blog, Browse, Favorites, Global, Inbox, Messages};

        register(Global, Action::Quit, ch('q'), true);
        register(Global, Action::Quit, ctrl('c'), false);
        register(Global, Action::Logout, ctrl('l'), true);
        register(Global, Action::NextTab, key(KeyCode::Tab), true);
        register(Global, Action::PreviousTab, key(KeyCode::BackTab), true);
        register(Global, Action::ToggleSound, ch('S'), true);
        register(Global, Action::NavigateUp, key(KeyCode::Up), true);
        register(Global, Action::NavigateUp, ch('k'), false);
        register(Global, Action::NavigateDown, key(KeyCode::Down), true);
        register(Global, Action::NavigateDown, ch('j'), false);
        register(Global, Action::Select, key(KeyCode::Enter), true);
        register(Global, Action::Cancel, key(KeyCode::Esc), true);
        register(Global, Action::LoadMore, ch('n'), true);

        register(Browse, Action::FocusSearch, ch('/'), true);
        register(Browse, Action::ToggleFavorite, ch('f'), true);
        register(Browse, Action::OpenInBrowser, ch('o'), true);
        register(Browse, Action::MessageSeller, ch('m'), true);
        register(Browse, Action::CycleSort, ch('c'), true);
        register(Browse, Action::SetLocation, ch('l'), true);
        register(Browse, Action::ClearFilters, ch('x'), true);

        register(Favorites, Action::ToggleFavorite, ch('f'), true);
        register(Favorites, Action::OpenInBrowser, ch('o'), true);

        register(Messages, Action::Compose, ch('i'), true);
        register(Messages, Action::RetryMessage, ch('r'), true);

        register(Blog, Action::ScrollDown, key(KeyCode::PageDown), true);
        register(Blog, Action::ScrollUp, key(KeyCode::PageUp), true);

        register(Inbox, Action::MarkAllRead, ch('A'), true);

        register(Admin, Action::SwitchPane, key(KeyCode::Tab), true);
        register(Admin, Action::BanUser, ch('b'), true);
        register(Admin, Action::UnbanUser, ch('u'), true);
        register(Admin, Action::ApproveListing, ch('a'), true);
        register(Admin, Action::RejectListing, ch('r'), true);

        Self {
            display_bindings,
            input_bindings,
        }
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the `[keybindings]` table from the config file applied.
    ///
    /// Entries map a key spec such as `"Ctrl+f"` to an action. Unparseable
    /// specs are logged and skipped.
    pub fn with_overrides(overrides: &HashMap<String, Action>) -> Self {
        let mut registry = Self::default();
        let mut entries: Vec<_> = overrides.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        for (spec, action) in entries {
            match parse_key_spec(spec) {
                Some(key) => registry.bind(*action, key),
                None => warn!(key = %spec, action = ?action, "Ignoring unparseable key binding"),
            }
        }
        registry
    }

    /// Binds `key` to `action` in the action's own context, replacing whatever
    /// that key did there. The new key becomes the one shown in the footer.
    pub fn bind(&mut self, action: Action, key: KeyEvent) {
        let context = action.context();
        let key = normalize(key);
        self.input_bindings
            .retain(|(c, k, _)| !(*c == context && same_key(k, &key)));
        self.input_bindings.insert(0, (context, key, action));
        self.display_bindings.insert((context, action), key);
    }

    pub fn get(&self, action: Action) -> Option<KeyEvent> {
        let context = action.context();
        self.display_bindings
            .get(&(context, action))
            .or_else(|| {
                self.display_bindings
                    .iter()
                    .find(|((_, a), _)| *a == action)
                    .map(|(_, k)| k)
            })
            .copied()
    }

    pub fn find_action(&self, context: KeyContext, key: KeyEvent) -> Option<Action> {
        let key = normalize(key);
        let lookup = |wanted: KeyContext| {
            self.input_bindings
                .iter()
                .find(|(c, k, _)| *c == wanted && same_key(k, &key))
                .map(|(_, _, a)| *a)
        };
        lookup(context).or_else(|| {
            if context == KeyContext::Global {
                None
            } else {
                lookup(KeyContext::Global)
            }
        })
    }

    /// Footer entry for `action`, if it has a key.
    pub fn keybind(&self, action: Action, label: impl Into<Cow<'static, str>>) -> Option<Keybind> {
        self.get(action).map(|key| Keybind::new(key, action, label))
    }
}

pub trait HasCommands {
    fn get_commands(&self, registry: &CommandRegistry) -> Vec<Keybind>;
}

fn same_key(a: &KeyEvent, b: &KeyEvent) -> bool {
    a.code == b.code && a.modifiers == b.modifiers
}

/// Drops SHIFT where the key code already carries it, so `A` and `Shift+a`
/// reported by different terminals compare equal.
fn normalize(key: KeyEvent) -> KeyEvent {
    let mut key = KeyEvent::new(key.code, key.modifiers);
    match key.code {
        KeyCode::Char(c) if key.modifiers.contains(KeyModifiers::SHIFT) => {
            key.code = KeyCode::Char(c.to_ascii_uppercase());
            key.modifiers.remove(KeyModifiers::SHIFT);
        }
        KeyCode::BackTab => key.modifiers.remove(KeyModifiers::SHIFT),
        _ => {}
    }
    key
}

/// Parses specs like `q`, `A`, `Ctrl+f`, `Alt+Enter`, `Shift+Tab` or `F5`.
pub fn parse_key_spec(spec: &str) -> Option<KeyEvent> {
    let spec = spec.trim();
    if spec.is_empty() {
        return None;
    }
    // "+" on its own, or as the final key of a combination
    let (mods_part, key_part) = match spec.strip_suffix("++") {
        Some(prefix) => (Some(prefix), "+"),
        None if spec == "+" => (None, "+"),
        None => match spec.rsplit_once('+') {
            Some((mods, key)) => (Some(mods), key),
            None => (None, spec),
        },
    };

    let mut modifiers = KeyModifiers::NONE;
    if let Some(mods) = mods_part {
        for part in mods.split('+') {
            match part.trim().to_ascii_lowercase().as_str() {
                "ctrl" | "control" | "c" => modifiers.insert(KeyModifiers::CONTROL),
                "alt" | "meta" | "a" => modifiers.insert(KeyModifiers::ALT),
                "shift" | "s" => modifiers.insert(KeyModifiers::SHIFT),
                _ => return None,
            }
        }
    }

    let key_part = key_part.trim();
    let code = match key_part.to_ascii_lowercase().as_str() {
        "enter" | "return" => KeyCode::Enter,
        "esc" | "escape" => KeyCode::Esc,
        "tab" if modifiers.contains(KeyModifiers::SHIFT) => KeyCode::BackTab,
        "tab" => KeyCode::Tab,
        "backtab" => KeyCode::BackTab,
        "space" => KeyCode::Char(' '),
        "backspace" | "bksp" => KeyCode::Backspace,
        "delete" | "del" => KeyCode::Delete,
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        "pageup" | "pgup" => KeyCode::PageUp,
        "pagedown" | "pgdn" => KeyCode::PageDown,
        lower if lower.len() > 1 && lower.starts_with('f') => {
            let n: u8 = lower[1..].parse().ok()?;
            if !(1..=24).contains(&n) {
                return None;
            }
            KeyCode::F(n)
        }
        _ => {
            let mut chars = key_part.chars();
            let c = chars.next()?;
            if chars.next().is_some() {
                return None;
            }
            KeyCode::Char(c)
        }
    };

    Some(normalize(KeyEvent::new(code, modifiers)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("q", KeyCode::Char('q'), KeyModifiers::NONE; "plain char")]
    #[test_case("A", KeyCode::Char('A'), KeyModifiers::NONE; "uppercase char")]
    #[test_case("Shift+a", KeyCode::Char('A'), KeyModifiers::NONE; "shift folds into char")]
    #[test_case("Ctrl+f", KeyCode::Char('f'), KeyModifiers::CONTROL; "ctrl")]
    #[test_case("ctrl+alt+x", KeyCode::Char('x'), KeyModifiers::CONTROL | KeyModifiers::ALT; "two modifiers")]
    #[test_case("Shift+Tab", KeyCode::BackTab, KeyModifiers::NONE; "backtab")]
    #[test_case("F5", KeyCode::F(5), KeyModifiers::NONE; "function key")]
    #[test_case("Space", KeyCode::Char(' '), KeyModifiers::NONE; "space")]
    #[test_case("Ctrl++", KeyCode::Char('+'), KeyModifiers::CONTROL; "plus key")]
    #[test_case("pagedown", KeyCode::PageDown, KeyModifiers::NONE; "named key")]
    fn test_parse_key_spec(spec: &str, code: KeyCode, modifiers: KeyModifiers) {
        let key = parse_key_spec(spec).unwrap();
        assert_eq!(key.code, code);
        assert_eq!(key.modifiers, modifiers);
    }

    #[test_case(""; "empty")]
    #[test_case("Hyper+x"; "unknown modifier")]
    #[test_case("F99"; "function key out of range")]
    #[test_case("ab"; "two characters")]
    fn test_parse_key_spec_rejects(spec: &str) {
        assert!(parse_key_spec(spec).is_none());
    }

    #[test]
    fn test_context_binding_shadows_global() {
        let registry = CommandRegistry::new();
        let tab = KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE);

        assert_eq!(registry.find_action(KeyContext::Browse, tab), Some(Action::NextTab));
        assert_eq!(registry.find_action(KeyContext::Admin, tab), Some(Action::SwitchPane));
    }

    #[test]
    fn test_find_action_accepts_shifted_chars() {
        let registry = CommandRegistry::new();
        let shifted = KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT);
        assert_eq!(
            registry.find_action(KeyContext::Inbox, shifted),
            Some(Action::MarkAllRead)
        );
        assert_eq!(registry.find_action(KeyContext::Browse, shifted), None);
    }

    #[test]
    fn test_overrides_replace_binding() {
        let mut overrides = HashMap::new();
        overrides.insert("Ctrl+f".to_string(), Action::ToggleFavorite);
        overrides.insert("???+".to_string(), Action::Quit);
        let registry = CommandRegistry::with_overrides(&overrides);

        let ctrl_f = KeyEvent::new(KeyCode::Char('f'), KeyModifiers::CONTROL);
        assert_eq!(
            registry.find_action(KeyContext::Browse, ctrl_f),
            Some(Action::ToggleFavorite)
        );
        assert_eq!(registry.get(Action::ToggleFavorite), Some(ctrl_f));
        assert_eq!(
            registry.find_action(KeyContext::Global, KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)),
            Some(Action::Quit)
        );
    }

    #[test]
    fn test_keybind_uses_primary_key() {
        let registry = CommandRegistry::new();
        let bind = registry.keybind(Action::NavigateDown, "Down").unwrap();
        assert_eq!(bind.key.code, KeyCode::Down);
    }
}
