use std::sync::Arc;
use std::time::Duration;

use assistant_core::{
    AuthError, Authenticated, ChatError, Completion, InferenceProvider, PipelineStatus,
    SessionGate, SignUpOutcome, SubmissionPipeline,
};
use log::{debug, info};
use tokio::sync::mpsc;

use crate::tui::{AppEvent, EventSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    SignIn,
    SignUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Email,
    Password,
    Confirm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormStatus {
    Info(String),
    Success(String),
    Error(String),
}

/// Sign-in / sign-up form state.
#[derive(Debug)]
pub struct LoginForm {
    pub mode: AuthMode,
    pub email: String,
    pub password: String,
    pub confirm: String,
    pub focus: LoginField,
    pub status: Option<FormStatus>,
    pub pending: bool,
}

impl LoginForm {
    pub fn new() -> Self {
        Self {
            mode: AuthMode::SignIn,
            email: String::new(),
            password: String::new(),
            confirm: String::new(),
            focus: LoginField::Email,
            status: None,
            pending: false,
        }
    }

    pub fn fields(&self) -> &'static [LoginField] {
        match self.mode {
            AuthMode::SignIn => &[LoginField::Email, LoginField::Password],
            AuthMode::SignUp => &[LoginField::Email, LoginField::Password, LoginField::Confirm],
        }
    }

    pub fn focus_next(&mut self) {
        let fields = self.fields();
        let idx = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = fields[(idx + 1) % fields.len()];
    }

    pub fn focus_prev(&mut self) {
        let fields = self.fields();
        let idx = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = fields[(idx + fields.len() - 1) % fields.len()];
    }

    pub fn focused_value(&mut self) -> &mut String {
        match self.focus {
            LoginField::Email => &mut self.email,
            LoginField::Password => &mut self.password,
            LoginField::Confirm => &mut self.confirm,
        }
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            AuthMode::SignIn => AuthMode::SignUp,
            AuthMode::SignUp => AuthMode::SignIn,
        };
        self.confirm.clear();
        self.status = None;
        if !self.fields().contains(&self.focus) {
            self.focus = LoginField::Email;
        }
    }
}

/// The chat surface. Only reachable with an [`Authenticated`] session.
pub struct ChatView {
    pub session: Authenticated,
    pub pipeline: SubmissionPipeline,
    pub status: PipelineStatus,
    pub input: String,
    pub cursor: usize, // cursor position in chars
    pub notice: Option<String>,
    pub scroll: u16,
    pub auto_scroll: bool,
    pub chat_height: u16, // Height of transcript area for scroll calculations
}

impl ChatView {
    pub fn scroll_up(&mut self, lines: u16) {
        self.auto_scroll = false;
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_add(lines);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.auto_scroll = true;
    }
}

pub enum Screen {
    Login(LoginForm),
    Chat(Box<ChatView>),
}

pub struct App {
    pub should_quit: bool,
    pub screen: Screen,
    pub gate: SessionGate,
    pub inference: Arc<dyn InferenceProvider>,
    pub request_timeout: Duration,
    pub events: mpsc::UnboundedSender<AppEvent>,
    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl App {
    pub fn new(
        gate: SessionGate,
        inference: Arc<dyn InferenceProvider>,
        request_timeout: Duration,
        events: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            should_quit: false,
            screen: Screen::Login(LoginForm::new()),
            gate,
            inference,
            request_timeout,
            events,
            animation_frame: 0,
        }
    }

    pub fn tick_animation(&mut self) {
        self.animation_frame = (self.animation_frame + 1) % 3;
    }

    /// Kick off sign-in or sign-up on a background task.
    pub fn submit_login(&mut self) {
        let Screen::Login(form) = &mut self.screen else {
            return;
        };
        if form.pending {
            return;
        }

        form.pending = true;
        let gate = self.gate.clone();
        let tx = self.events.clone();
        let email = form.email.clone();
        let password = form.password.clone();

        match form.mode {
            AuthMode::SignIn => {
                form.status = Some(FormStatus::Info("Logging in...".to_string()));
                tokio::spawn(async move {
                    let result = gate.sign_in(&email, &password).await;
                    let _ = tx.send(AppEvent::SignIn(result));
                });
            }
            AuthMode::SignUp => {
                form.status = Some(FormStatus::Info("Signing up...".to_string()));
                let confirm = form.confirm.clone();
                tokio::spawn(async move {
                    let result = gate.sign_up(&email, &password, &confirm).await;
                    let _ = tx.send(AppEvent::SignUp(result));
                });
            }
        }
    }

    pub fn on_sign_in(&mut self, result: Result<Authenticated, AuthError>) {
        match result {
            Ok(session) => self.open_chat(session),
            Err(err) => self.login_failed(err),
        }
    }

    pub fn on_sign_up(&mut self, result: Result<SignUpOutcome, AuthError>) {
        match result {
            Ok(SignUpOutcome::Authenticated(session)) => self.open_chat(session),
            Ok(SignUpOutcome::ConfirmationRequired(user)) => {
                if let Screen::Login(form) = &mut self.screen {
                    info!("account created for {}, awaiting confirmation", user.email);
                    form.pending = false;
                    form.toggle_mode();
                    form.password.clear();
                    form.focus = LoginField::Password;
                    form.status = Some(FormStatus::Success(
                        "Signup successful! Please check your email to confirm, then sign in."
                            .to_string(),
                    ));
                }
            }
            Err(err) => self.login_failed(err),
        }
    }

    fn login_failed(&mut self, err: AuthError) {
        if let Screen::Login(form) = &mut self.screen {
            form.pending = false;
            let message = match err {
                AuthError::AuthFailure(reason) => format!("Login failed: {}", reason),
                other => other.to_string(),
            };
            form.status = Some(FormStatus::Error(message));
        }
    }

    /// Swap the login screen for the chat surface.
    fn open_chat(&mut self, session: Authenticated) {
        info!("opening chat for {}", session.user().email);
        let sink = Arc::new(EventSink(self.events.clone()));
        let pipeline = SubmissionPipeline::new(self.inference.clone(), sink, self.request_timeout);

        let mut status_rx = pipeline.subscribe_status();
        let tx = self.events.clone();
        tokio::spawn(async move {
            while status_rx.changed().await.is_ok() {
                let status = *status_rx.borrow_and_update();
                if tx.send(AppEvent::Status(status)).is_err() {
                    break;
                }
            }
        });

        let status = pipeline.status();
        self.screen = Screen::Chat(Box::new(ChatView {
            session,
            pipeline,
            status,
            input: String::new(),
            cursor: 0,
            notice: None,
            scroll: 0,
            auto_scroll: true,
            chat_height: 0,
        }));
    }

    /// Send the current input. Ignored while a reply is outstanding.
    pub fn submit_prompt(&mut self) {
        let Screen::Chat(chat) = &mut self.screen else {
            return;
        };
        if chat.pipeline.is_busy() {
            return;
        }

        let prompt = chat.input.trim().to_string();
        match chat.pipeline.submit(&prompt) {
            Ok(id) => {
                debug!("submitted request {}", id);
                chat.input.clear();
                chat.cursor = 0;
                chat.notice = None;
                chat.scroll_to_bottom();
            }
            Err(err) => chat.notice = Some(err.to_string()),
        }
    }

    pub fn clear_chat(&mut self) {
        if let Screen::Chat(chat) = &mut self.screen {
            match chat.pipeline.clear() {
                Ok(()) => {
                    chat.notice = None;
                    chat.scroll = 0;
                    chat.scroll_to_bottom();
                }
                Err(ChatError::RequestInFlight) => {
                    chat.notice = Some("Wait for the current reply before clearing".to_string());
                }
                Err(err) => chat.notice = Some(err.to_string()),
            }
        }
    }

    pub fn on_completion(&mut self, completion: Completion) {
        if let Screen::Chat(chat) = &mut self.screen {
            if chat.pipeline.complete(completion) {
                chat.scroll_to_bottom();
            }
        }
    }

    pub fn on_status(&mut self, status: PipelineStatus) {
        if let Screen::Chat(chat) = &mut self.screen {
            debug!("pipeline status -> {:?}", status);
            chat.status = status;
        }
    }
}
