use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crate::app::{App, ChatView, LoginForm, Screen};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Inference(completion) => app.on_completion(completion),
        AppEvent::Status(status) => app.on_status(status),
        AppEvent::SignIn(result) => app.on_sign_in(result),
        AppEvent::SignUp(result) => app.on_sign_up(result),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work on every screen
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if key.code == KeyCode::Esc || (ctrl && key.code == KeyCode::Char('c')) {
        app.should_quit = true;
        return;
    }

    match &mut app.screen {
        Screen::Login(form) => {
            if handle_login_key(form, key) {
                app.submit_login();
            }
        }
        Screen::Chat(_) => handle_chat_key(app, key),
    }
}

/// Returns true when the form should be submitted.
fn handle_login_key(form: &mut LoginForm, key: KeyEvent) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Enter => return !form.pending,
        KeyCode::Char('t') if ctrl => {
            if !form.pending {
                form.toggle_mode();
            }
        }
        KeyCode::Tab | KeyCode::Down => form.focus_next(),
        KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
        KeyCode::Backspace => {
            form.focused_value().pop();
        }
        KeyCode::Char(c) if !ctrl => form.focused_value().push(c),
        _ => {}
    }
    false
}

fn handle_chat_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Enter => app.submit_prompt(),
        KeyCode::Char('l') if ctrl => app.clear_chat(),
        _ => {
            if let Screen::Chat(chat) = &mut app.screen {
                handle_chat_editing(chat, key);
            }
        }
    }
}

fn handle_chat_editing(chat: &mut ChatView, key: KeyEvent) {
    let page = chat.chat_height.max(1);
    match key.code {
        KeyCode::PageUp => chat.scroll_up(page / 2),
        KeyCode::PageDown => chat.scroll_down(page / 2),
        KeyCode::Up => chat.scroll_up(1),
        KeyCode::Down => chat.scroll_down(1),
        KeyCode::Backspace => {
            if chat.cursor > 0 {
                chat.cursor -= 1;
                let byte_pos = char_to_byte_index(&chat.input, chat.cursor);
                chat.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = chat.input.chars().count();
            if chat.cursor < char_count {
                let byte_pos = char_to_byte_index(&chat.input, chat.cursor);
                chat.input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            chat.cursor = chat.cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = chat.input.chars().count();
            chat.cursor = (chat.cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            chat.cursor = 0;
        }
        KeyCode::End => {
            chat.cursor = chat.input.chars().count();
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            let byte_pos = char_to_byte_index(&chat.input, chat.cursor);
            chat.input.insert(byte_pos, c);
            chat.cursor += 1;
            chat.notice = None;
        }
        _ => {}
    }
}
