//! Outbound request construction.
//!
//! Every request starts with the fixed system instruction, followed by the
//! (windowed) session history and the new user message. The instruction is
//! resent on every turn and never stored in the session.

use buzz_core::types::Message;

/// Sentence the model must answer with for any off-topic question.
pub const REFUSAL_MESSAGE: &str = "I apologize, but I can only assist with social media-related \
questions. Your question appears to be about something else. Please ask me about social media \
marketing, strategy, platforms, or management instead.";

/// Platforms the assistant covers.
pub const PLATFORMS: &[&str] = &[
    "Instagram",
    "Twitter/X",
    "LinkedIn",
    "TikTok",
    "Facebook",
    "YouTube",
    "Pinterest",
    "Snapchat",
];

/// Topics the assistant covers.
pub const TOPICS: &[&str] = &[
    "Platform Strategy",
    "Content Creation",
    "Engagement Tactics",
    "Analytics & Metrics",
    "Trend Analysis",
    "Best Practices",
    "Community Management",
    "Brand Building",
];

/// Build the fixed system instruction.
pub fn system_instruction() -> String {
    format!(
        "You are a specialized social media expert with STRICT guidelines.\n\n\
         ONLY respond to questions about:\n\
         1. Social Media Platforms ({platforms})\n\
         2. Social Media Marketing (content strategy, posting, advertising)\n\
         3. Social Media Management (engagement, moderation, brand voice)\n\
         4. Social Media Analytics (metrics, tracking, ROI)\n\
         5. Social Media Tools (scheduling, analytics, content creation)\n\
         6. Social Media Trends (updates, features, best practices)\n\n\
         For ANY question not directly related to social media, respond ONLY with:\n\
         \"{refusal}\"\n\n\
         Before providing any answer, verify that the question is genuinely about social media.",
        platforms = PLATFORMS.join(", "),
        refusal = REFUSAL_MESSAGE,
    )
}

/// How much prior history is sent with each request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryWindow {
    /// Send the whole session history.
    #[default]
    Unbounded,
    /// Send only the most recent `n` messages.
    LastMessages(usize),
}

impl HistoryWindow {
    /// Map the `chat.history_window` setting, where `0` means unbounded.
    pub fn from_setting(n: usize) -> Self {
        if n == 0 {
            HistoryWindow::Unbounded
        } else {
            HistoryWindow::LastMessages(n)
        }
    }

    /// The slice of `history` that falls inside the window.
    pub fn apply<'a>(&self, history: &'a [Message]) -> &'a [Message] {
        match *self {
            HistoryWindow::Unbounded => history,
            HistoryWindow::LastMessages(n) => &history[history.len().saturating_sub(n)..],
        }
    }
}

/// Builds the ordered message list for one completion request.
#[derive(Debug, Clone)]
pub struct PromptComposer {
    instruction: String,
    window: HistoryWindow,
}

impl Default for PromptComposer {
    fn default() -> Self {
        Self::new(HistoryWindow::Unbounded)
    }
}

impl PromptComposer {
    pub fn new(window: HistoryWindow) -> Self {
        Self {
            instruction: system_instruction(),
            window,
        }
    }

    /// Compose `[system, ..history, user(query)]`.
    ///
    /// `history` must not yet contain the message for `query`.
    pub fn compose(&self, history: &[Message], query: &str) -> Vec<Message> {
        let recent = self.window.apply(history);
        let mut request = Vec::with_capacity(recent.len() + 2);
        request.push(Message::system(self.instruction.clone()));
        request.extend(recent.iter().cloned());
        request.push(Message::user(query));
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buzz_core::types::Role;

    fn history(n: usize) -> Vec<Message> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    Message::user(format!("q{}", i / 2))
                } else {
                    Message::assistant(format!("a{}", i / 2))
                }
            })
            .collect()
    }

    #[test]
    fn test_first_turn_is_system_then_user() {
        let composer = PromptComposer::default();
        let request = composer.compose(&[], "Q");
        assert_eq!(request.len(), 2);
        assert_eq!(request[0].role(), Role::System);
        assert_eq!(request[0].content(), system_instruction());
        assert_eq!(request[1], Message::user("Q"));
    }

    #[test]
    fn test_history_kept_in_order_between_system_and_query() {
        let composer = PromptComposer::default();
        let past = history(4);
        let request = composer.compose(&past, "next");

        assert_eq!(request.len(), 6);
        assert_eq!(request[0].role(), Role::System);
        assert_eq!(&request[1..5], past.as_slice());
        assert_eq!(request[5], Message::user("next"));
    }

    #[test]
    fn test_compose_does_not_mutate_history() {
        let composer = PromptComposer::default();
        let past = history(2);
        let before = past.clone();
        let _ = composer.compose(&past, "again");
        assert_eq!(past, before);
    }

    #[test]
    fn test_system_instruction_sent_exactly_once() {
        let composer = PromptComposer::default();
        let request = composer.compose(&history(6), "q");
        let systems = request.iter().filter(|m| m.role() == Role::System).count();
        assert_eq!(systems, 1);
    }

    #[test]
    fn test_instruction_carries_refusal_and_platforms() {
        let text = system_instruction();
        assert!(text.contains(REFUSAL_MESSAGE));
        for platform in PLATFORMS {
            assert!(text.contains(platform), "missing {}", platform);
        }
        assert!(text.contains("verify that the question is genuinely about social media"));
    }

    #[test]
    fn test_window_last_messages() {
        let composer = PromptComposer::new(HistoryWindow::LastMessages(2));
        let past = history(6);
        let request = composer.compose(&past, "q");

        assert_eq!(request.len(), 4);
        assert_eq!(&request[1..3], &past[4..6]);
    }

    #[test]
    fn test_window_larger_than_history_sends_everything() {
        let window = HistoryWindow::LastMessages(50);
        let past = history(3);
        assert_eq!(window.apply(&past), past.as_slice());
    }

    #[test]
    fn test_window_from_setting() {
        assert_eq!(HistoryWindow::from_setting(0), HistoryWindow::Unbounded);
        assert_eq!(HistoryWindow::from_setting(8), HistoryWindow::LastMessages(8));
    }
}
