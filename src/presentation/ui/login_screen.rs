//! Login screen.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

use crate::application::dto::{LoginRequest, TokenSource};
use crate::domain::ports::{Credentials, Password};
use crate::presentation::widgets::TextInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    Input,
    Validating,
    Error,
    Success,
}

/// Whether the user signs in with email and password or pastes a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMode {
    Credentials,
    Token,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Email,
    Password,
    Token,
    Remember,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginAction {
    None,
    Submit,
    DeleteToken,
    Quit,
}

/// Login screen UI.
pub struct LoginScreen {
    email_input: TextInput,
    password_input: TextInput,
    token_input: TextInput,
    mode: LoginMode,
    focus: Field,
    state: LoginState,
    error_message: Option<String>,
    persist_token: bool,
}

impl LoginScreen {
    /// Creates new login screen.
    #[must_use]
    pub fn new() -> Self {
        let mut email_input = TextInput::new(" Email ").placeholder("you@example.com");
        email_input.set_focused(true);

        Self {
            email_input,
            password_input: TextInput::new(" Password ").password(),
            token_input: TextInput::new(" Access token ")
                .password()
                .placeholder("Paste your marketplace token here..."),
            mode: LoginMode::Credentials,
            focus: Field::Email,
            state: LoginState::Input,
            error_message: None,
            persist_token: true,
        }
    }

    /// Returns current state.
    #[must_use]
    pub const fn state(&self) -> LoginState {
        self.state
    }

    #[must_use]
    pub const fn mode(&self) -> LoginMode {
        self.mode
    }

    /// Returns persistence preference.
    #[must_use]
    pub const fn should_persist(&self) -> bool {
        self.persist_token
    }

    /// Builds the request for the current mode, or `None` while required
    /// fields are empty.
    #[must_use]
    pub fn request(&self) -> Option<LoginRequest> {
        let request = match self.mode {
            LoginMode::Credentials => {
                let email = self.email_input.value().trim();
                let password = self.password_input.value();
                if email.is_empty() || password.is_empty() {
                    return None;
                }
                LoginRequest::credentials(Credentials::new(email, Password::new(password)))
            }
            LoginMode::Token => {
                let token = self.token_input.value().trim();
                if token.is_empty() {
                    return None;
                }
                LoginRequest::token(token.to_string(), TokenSource::UserInput)
            }
        };
        Some(request.with_persistence(self.persist_token))
    }

    /// Sets validating state.
    pub fn set_validating(&mut self) {
        self.state = LoginState::Validating;
        self.error_message = None;
    }

    /// Sets success state.
    pub fn set_success(&mut self) {
        self.state = LoginState::Success;
        self.error_message = None;
        self.password_input.clear();
    }

    /// Sets error state.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.state = LoginState::Error;
        self.error_message = Some(message.into());
        self.password_input.clear();
    }

    /// Resets to input state.
    pub fn reset(&mut self) {
        self.state = LoginState::Input;
        self.error_message = None;
    }

    fn fields(&self) -> &'static [Field] {
        match self.mode {
            LoginMode::Credentials => &[Field::Email, Field::Password, Field::Remember],
            LoginMode::Token => &[Field::Token, Field::Remember],
        }
    }

    fn set_focus(&mut self, field: Field) {
        self.focus = field;
        self.email_input.set_focused(field == Field::Email);
        self.password_input.set_focused(field == Field::Password);
        self.token_input.set_focused(field == Field::Token);
    }

    fn cycle_focus(&mut self, forward: bool) {
        let fields = self.fields();
        let index = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        let next = if forward {
            (index + 1) % fields.len()
        } else {
            (index + fields.len() - 1) % fields.len()
        };
        self.set_focus(fields[next]);
    }

    fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            LoginMode::Credentials => LoginMode::Token,
            LoginMode::Token => LoginMode::Credentials,
        };
        self.set_focus(self.fields()[0]);
    }

    fn focused_input(&mut self) -> Option<&mut TextInput> {
        match self.focus {
            Field::Email => Some(&mut self.email_input),
            Field::Password => Some(&mut self.password_input),
            Field::Token => Some(&mut self.token_input),
            Field::Remember => None,
        }
    }

    /// Handles key event, returns action.
    pub fn handle_key(&mut self, key: KeyEvent) -> LoginAction {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return LoginAction::Quit;
        }

        if self.state == LoginState::Validating {
            return LoginAction::None;
        }

        if self.state == LoginState::Error {
            self.reset();
            if key.code != KeyCode::Esc {
                return LoginAction::None;
            }
        }

        let alt = key.modifiers.contains(KeyModifiers::ALT);
        match key.code {
            KeyCode::Esc => return LoginAction::Quit,
            KeyCode::Char('d') if alt => return LoginAction::DeleteToken,
            KeyCode::Char('t') if alt => self.toggle_mode(),
            KeyCode::Enter => {
                if self.request().is_some() {
                    return LoginAction::Submit;
                }
                // Enter on an incomplete form moves on to the next field.
                self.cycle_focus(true);
            }
            KeyCode::Tab | KeyCode::Down => self.cycle_focus(true),
            KeyCode::BackTab | KeyCode::Up => self.cycle_focus(false),
            KeyCode::Char(' ') if self.focus == Field::Remember => {
                self.persist_token = !self.persist_token;
            }
            _ => {
                if let Some(input) = self.focused_input() {
                    input.handle_key(key);
                }
            }
        }

        LoginAction::None
    }

    fn render_inner(&self, area: Rect, buf: &mut Buffer) {
        let form_height = match self.mode {
            LoginMode::Credentials => 15,
            LoginMode::Token => 12,
        };
        let vertical = Layout::vertical([
            Constraint::Fill(1),
            Constraint::Length(form_height),
            Constraint::Fill(1),
        ]);
        let [_, center, _] = vertical.areas(area);

        let horizontal = Layout::horizontal([
            Constraint::Fill(1),
            Constraint::Min(56),
            Constraint::Fill(1),
        ]);
        let [_, content_area, _] = horizontal.areas(center);

        Clear.render(content_area, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Bazaar Login ");

        let inner = block.inner(content_area);
        block.render(content_area, buf);

        let (title, inputs): (&str, Vec<&TextInput>) = match self.mode {
            LoginMode::Credentials => (
                "Sign in with your marketplace account",
                vec![&self.email_input, &self.password_input],
            ),
            LoginMode::Token => ("Sign in with an access token", vec![&self.token_input]),
        };

        let mut constraints = vec![Constraint::Length(1), Constraint::Length(1)];
        constraints.extend(inputs.iter().map(|_| Constraint::Length(3)));
        constraints.extend([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ]);
        let areas = Layout::vertical(constraints).split(inner);

        Paragraph::new(title)
            .style(Style::default().add_modifier(Modifier::BOLD))
            .render(areas[0], buf);

        for (i, input) in inputs.iter().enumerate() {
            (*input).render(areas[2 + i], buf);
        }
        let mut row = 2 + inputs.len() + 1;

        let checkbox = if self.persist_token { "[x]" } else { "[ ]" };
        let checkbox_style = if self.focus == Field::Remember {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::REVERSED)
        } else {
            Style::default().fg(Color::Yellow)
        };
        Paragraph::new(Line::from(vec![
            Span::styled(checkbox, checkbox_style),
            Span::raw(" Remember me (Space to toggle)"),
        ]))
        .render(areas[row], buf);
        row += 2;

        let hint = Style::default().fg(Color::DarkGray);
        let status = match self.state {
            LoginState::Input => Line::from(vec![
                Span::styled("Enter: Login", hint),
                Span::raw(" | "),
                Span::styled("Tab: Next", hint),
                Span::raw(" | "),
                Span::styled(
                    match self.mode {
                        LoginMode::Credentials => "Alt+T: Use token",
                        LoginMode::Token => "Alt+T: Use email",
                    },
                    hint,
                ),
                Span::raw(" | "),
                Span::styled("Alt+D: Clear saved", hint),
            ]),
            LoginState::Validating => Line::from(Span::styled(
                "Signing in...",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::ITALIC),
            )),
            LoginState::Error => {
                let msg = self.error_message.as_deref().unwrap_or("Unknown error");
                Line::from(Span::styled(
                    format!("Error: {msg}"),
                    Style::default().fg(Color::Red),
                ))
            }
            LoginState::Success => Line::from(Span::styled(
                "Login successful!",
                Style::default().fg(Color::Green),
            )),
        };
        Paragraph::new(status).render(areas[row], buf);
    }
}

impl Default for LoginScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for &LoginScreen {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.render_inner(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dto::LoginMethod;
    use ratatui::{Terminal, backend::TestBackend};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn alt(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::ALT)
    }

    fn type_text(screen: &mut LoginScreen, text: &str) {
        for c in text.chars() {
            screen.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_initial_state() {
        let screen = LoginScreen::new();
        assert_eq!(screen.state(), LoginState::Input);
        assert_eq!(screen.mode(), LoginMode::Credentials);
        assert!(screen.request().is_none());
        assert!(screen.should_persist());
    }

    #[test]
    fn test_credentials_flow() {
        let mut screen = LoginScreen::new();
        type_text(&mut screen, "ada@example.com");
        assert_eq!(screen.handle_key(key(KeyCode::Enter)), LoginAction::None, "password missing");

        type_text(&mut screen, "hunter2");
        assert_eq!(screen.handle_key(key(KeyCode::Enter)), LoginAction::Submit);

        let request = screen.request().unwrap();
        match request.method {
            LoginMethod::Credentials(credentials) => {
                assert_eq!(credentials.email, "ada@example.com");
                assert_eq!(credentials.password.expose(), "hunter2");
            }
            LoginMethod::Token(_) => panic!("expected credentials"),
        }
        assert!(request.persist_token);
    }

    #[test]
    fn test_remember_toggle() {
        let mut screen = LoginScreen::new();
        screen.handle_key(key(KeyCode::Tab));
        screen.handle_key(key(KeyCode::Tab));
        screen.handle_key(key(KeyCode::Char(' ')));
        assert!(!screen.should_persist());

        screen.handle_key(key(KeyCode::Tab));
        type_text(&mut screen, "a@b.c");
        assert!(!screen.should_persist(), "space in a text field types");
    }

    #[test]
    fn test_token_mode() {
        let mut screen = LoginScreen::new();
        screen.handle_key(alt('t'));
        assert_eq!(screen.mode(), LoginMode::Token);

        type_text(&mut screen, "bz_live_0123456789abcdef");
        assert_eq!(screen.handle_key(key(KeyCode::Enter)), LoginAction::Submit);
        let request = screen.request().unwrap();
        assert_eq!(request.source, TokenSource::UserInput);
        assert!(matches!(request.method, LoginMethod::Token(ref t) if t == "bz_live_0123456789abcdef"));
    }

    #[test]
    fn test_delete_token_and_quit() {
        let mut screen = LoginScreen::new();
        assert_eq!(screen.handle_key(alt('d')), LoginAction::DeleteToken);
        assert_eq!(screen.handle_key(key(KeyCode::Char('q'))), LoginAction::None);
        assert_eq!(screen.handle_key(key(KeyCode::Esc)), LoginAction::Quit);
    }

    #[test]
    fn test_error_clears_password_and_any_key_resets() {
        let mut screen = LoginScreen::new();
        type_text(&mut screen, "ada@example.com");
        screen.handle_key(key(KeyCode::Tab));
        type_text(&mut screen, "wrong");
        screen.set_validating();
        assert_eq!(screen.handle_key(key(KeyCode::Enter)), LoginAction::None);

        screen.set_error("Invalid email or password");
        assert!(screen.request().is_none());
        screen.handle_key(key(KeyCode::Char('x')));
        assert_eq!(screen.state(), LoginState::Input);
    }

    #[test]
    fn test_render_smoke() {
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        let screen = LoginScreen::new();
        terminal
            .draw(|frame| frame.render_widget(&screen, frame.area()))
            .unwrap();
        let buffer = terminal.backend().buffer();
        let text: String = (0..24)
            .flat_map(|y| (0..80).map(move |x| (x, y)))
            .map(|(x, y)| buffer[(x, y)].symbol().to_string())
            .collect();
        assert!(text.contains("Bazaar Login"));
        assert!(text.contains("Remember me"));
    }
}
