/// Canned prompts offered on the welcome screen and in the suggestion panel
pub const DEFAULT_SUGGESTIONS: [&str; 4] = [
    "Explain binary search complexity",
    "How do I implement a bubble sort?",
    "What's the best way to solve this sorting problem?",
    "Help me understand merge sort",
];

#[derive(Debug, Clone)]
pub struct SuggestionPanel {
    suggestions: Vec<String>,
    visible: bool,
    selected: usize,
}

impl Default for SuggestionPanel {
    fn default() -> Self {
        Self::new(DEFAULT_SUGGESTIONS.iter().map(|s| s.to_string()).collect())
    }
}

impl SuggestionPanel {
    pub fn new(suggestions: Vec<String>) -> Self {
        Self {
            suggestions,
            visible: false,
            selected: 0,
        }
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn selected_index(&self) -> Option<usize> {
        if self.suggestions.is_empty() {
            None
        } else {
            Some(self.selected)
        }
    }

    pub fn selected(&self) -> Option<&str> {
        self.suggestions.get(self.selected).map(String::as_str)
    }

    pub fn select_next(&mut self) {
        let len = self.suggestions.len();
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_flips_visibility() {
        let mut panel = SuggestionPanel::default();
        assert!(!panel.is_visible());
        panel.toggle();
        assert!(panel.is_visible());
        panel.toggle();
        assert!(!panel.is_visible());
    }

    #[test]
    fn test_navigation_is_clamped() {
        let mut panel = SuggestionPanel::default();
        assert_eq!(panel.selected(), Some("Explain binary search complexity"));

        panel.select_prev();
        assert_eq!(panel.selected_index(), Some(0));

        for _ in 0..10 {
            panel.select_next();
        }
        assert_eq!(panel.selected(), Some("Help me understand merge sort"));
    }

    #[test]
    fn test_empty_panel() {
        let mut panel = SuggestionPanel::new(Vec::new());
        panel.select_next();
        assert_eq!(panel.selected_index(), None);
        assert_eq!(panel.selected(), None);
    }
}
