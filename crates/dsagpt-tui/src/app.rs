use dsagpt_core::{AccountClient, Sender, ServiceError, TurnOrchestrator};
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    pub should_quit: bool,

    /// All chat state lives here; the app only adds view state around it
    pub chat: TurnOrchestrator,
    pub account: AccountClient,

    // Chat view state
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    /// One-line notice shown in the footer
    pub status: Option<String>,

    pub logout_task: Option<JoinHandle<Result<(), ServiceError>>>,

    revisions: watch::Receiver<u64>,
    was_awaiting: bool,
}

impl App {
    pub fn new(chat: TurnOrchestrator, account: AccountClient) -> Self {
        let revisions = chat.conversation().subscribe();
        Self {
            should_quit: false,
            chat,
            account,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,
            status: None,
            logout_task: None,
            revisions,
            was_awaiting: false,
        }
    }

    pub fn input_mode(&self) -> InputMode {
        if self.chat.input().is_focused() {
            InputMode::Editing
        } else {
            InputMode::Normal
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.chat.is_awaiting_reply() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Jump to the latest message when new content arrived or the typing
    /// indicator appeared
    pub fn follow_new_content(&mut self) {
        let awaiting = self.chat.is_awaiting_reply();
        let appended = self.revisions.has_changed().unwrap_or(false);
        if appended {
            self.revisions.borrow_and_update();
        }
        if appended || (awaiting && !self.was_awaiting) {
            self.scroll_to_bottom();
        }
        self.was_awaiting = awaiting;
    }

    /// Total rendered lines of the chat log at the current width
    pub fn chat_line_count(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for msg in self.chat.conversation().messages() {
            total_lines = total_lines.saturating_add(1); // Sender line ("You:" or "DSA-GPT:")
            for line in msg.text().lines() {
                // Use character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                let wrapped = if char_count == 0 { 1 } else { char_count / wrap_width + 1 };
                total_lines = total_lines.saturating_add(wrapped as u16);
            }
            total_lines = total_lines.saturating_add(1); // Blank line after message
        }

        if self.chat.is_awaiting_reply() {
            total_lines = total_lines.saturating_add(2); // "DSA-GPT:" + "Thinking..."
        }

        total_lines
    }

    fn max_scroll(&self) -> u16 {
        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };
        self.chat_line_count().saturating_sub(visible_height)
    }

    /// Scroll chat to bottom so the newest entry is visible
    pub fn scroll_to_bottom(&mut self) {
        self.chat_scroll = self.max_scroll();
    }

    pub fn scroll_down(&mut self) {
        self.chat_scroll = (self.chat_scroll + 1).min(self.max_scroll());
    }

    pub fn scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_half_page_down(&mut self) {
        let half = (self.chat_height / 2).max(1);
        self.chat_scroll = self.chat_scroll.saturating_add(half).min(self.max_scroll());
    }

    pub fn scroll_half_page_up(&mut self) {
        let half = (self.chat_height / 2).max(1);
        self.chat_scroll = self.chat_scroll.saturating_sub(half);
    }

    pub fn toggle_dictation(&mut self) {
        match self.chat.toggle_dictation() {
            Ok(state) => {
                self.status = Some(format!("Dictation {}", state.to_string().to_lowercase()));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not toggle dictation");
                self.status = Some(format!("Dictation unavailable: {}", e));
            }
        }
    }

    /// Ask the account service to end the session in the background
    pub fn start_logout(&mut self) {
        if self.logout_task.is_some() {
            return;
        }
        let account = self.account.clone();
        self.logout_task = Some(tokio::spawn(async move { account.logout().await }));
        self.status = Some("Logging out...".to_string());
    }

    /// Collect a finished logout. Success quits; on failure the client stays open.
    pub async fn check_logout(&mut self) {
        let finished = self
            .logout_task
            .as_ref()
            .map(|task| task.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }
        let Some(task) = self.logout_task.take() else {
            return;
        };

        match task.await {
            Ok(Ok(())) => self.should_quit = true,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Error logging out");
                self.status = Some("Logout failed".to_string());
            }
            Err(e) => {
                tracing::warn!(error = %e, "Logout task failed");
                self.status = Some("Logout failed".to_string());
            }
        }
    }

    pub fn sender_label(sender: Sender) -> &'static str {
        match sender {
            Sender::User => "You:",
            Sender::Bot => "DSA-GPT:",
        }
    }
}
