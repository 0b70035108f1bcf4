use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use crate::app::{App, InputMode};
use crate::tui::AppEvent;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key).await?,
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
        AppEvent::Chat(event) => app.chat.handle_event(event),
    }
    app.check_logout().await;
    app.follow_new_content();
    Ok(())
}

async fn handle_key(app: &mut App, key: KeyEvent) -> Result<()> {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return Ok(());
    }

    // Without dictation only the notice is shown
    if !app.chat.speech_supported() {
        if key.code == KeyCode::Char('q') {
            app.should_quit = true;
        }
        return Ok(());
    }

    match key.code {
        KeyCode::F(2) => {
            app.toggle_dictation();
            return Ok(());
        }
        KeyCode::F(3) => {
            app.chat.toggle_suggestions();
            return Ok(());
        }
        _ => {}
    }

    if app.chat.suggestions().is_visible() {
        handle_suggestions(app, key);
        return Ok(());
    }

    match app.input_mode() {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }

    Ok(())
}

fn handle_suggestions(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('s') => app.chat.hide_suggestions(),
        KeyCode::Char('j') | KeyCode::Down => app.chat.suggestion_next(),
        KeyCode::Char('k') | KeyCode::Up => app.chat.suggestion_prev(),
        KeyCode::Enter => app.chat.select_highlighted_suggestion(),
        _ => {}
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        // Quit
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Char('i') | KeyCode::Enter => app.chat.focus_input(),
        KeyCode::Char('m') => app.toggle_dictation(),
        KeyCode::Char('s') => app.chat.toggle_suggestions(),
        KeyCode::Char('L') => app.start_logout(),

        // Scrolling
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(),
        KeyCode::PageDown => app.scroll_half_page_down(),
        KeyCode::PageUp => app.scroll_half_page_up(),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_down();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_up();
        }
        KeyCode::Char('G') => app.scroll_to_bottom(),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.chat.blur_input(),
        KeyCode::Enter => {
            app.chat.submit_turn();
        }
        _ => {
            // The transcript owns the input while listening
            let Some(input) = app.chat.edit_input() else {
                app.status = Some("Stop dictation to edit".to_string());
                return;
            };
            match key.code {
                KeyCode::Backspace => input.backspace(),
                KeyCode::Delete => input.delete(),
                KeyCode::Left => input.move_left(),
                KeyCode::Right => input.move_right(),
                KeyCode::Home => input.move_home(),
                KeyCode::End => input.move_end(),
                KeyCode::Char(c) => input.insert_char(c),
                _ => {}
            }
        }
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollDown => {
            app.scroll_down();
            app.scroll_down();
            app.scroll_down();
        }
        MouseEventKind::ScrollUp => {
            app.scroll_up();
            app.scroll_up();
            app.scroll_up();
        }
        _ => {}
    }
}
