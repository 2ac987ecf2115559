//! Conversation controller: the per-session turn state machine.
//!
//! `Idle -> Pending -> Idle`. A turn appends the user message and enters
//! `Pending`; the completion result either appends an assistant message
//! (success) or nothing (failure), and the controller returns to `Idle`.
//! Input and reset are only accepted while `Idle`.

use std::sync::Arc;

use buzz_core::types::Message;

use crate::completion::CompletionClient;
use crate::error::{ChatError, CompletionError};
use crate::prompt::PromptComposer;
use crate::session::SessionStore;

/// Where the controller is in the turn cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// Waiting for input.
    Idle,
    /// A completion request is in flight.
    Pending,
}

/// Result of one turn, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The service answered; the message was appended to the session.
    Answered(Message),
    /// The service failed; the text reads `Error: <description>`.
    Failed(String),
}

/// Check a user input against the length limit.
pub fn validate_input(input: &str, max_chars: usize) -> Result<(), ChatError> {
    if input.trim().is_empty() {
        return Err(ChatError::EmptyMessage);
    }
    if input.chars().count() > max_chars {
        return Err(ChatError::MessageTooLong(max_chars));
    }
    Ok(())
}

/// Drives one session's history through the completion client.
pub struct ConversationController {
    store: SessionStore,
    composer: PromptComposer,
    client: Arc<dyn CompletionClient>,
    state: TurnState,
    max_message_chars: usize,
}

impl ConversationController {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        composer: PromptComposer,
        max_message_chars: usize,
    ) -> Self {
        Self {
            store: SessionStore::new(),
            composer,
            client,
            state: TurnState::Idle,
            max_message_chars,
        }
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    /// The visible transcript. Never contains the system instruction.
    pub fn history(&self) -> &[Message] {
        self.store.all()
    }

    /// The shared completion client.
    pub fn client(&self) -> Arc<dyn CompletionClient> {
        Arc::clone(&self.client)
    }

    /// Start a turn: validate `input`, compose the request from the history
    /// so far, append the user message and enter `Pending`.
    ///
    /// Returns the request to send upstream.
    pub fn begin_turn(&mut self, input: &str) -> Result<Vec<Message>, ChatError> {
        if self.state == TurnState::Pending {
            return Err(ChatError::TurnInFlight);
        }
        validate_input(input, self.max_message_chars)?;

        let request = self.composer.compose(self.store.all(), input);
        self.store.append(Message::user(input));
        self.state = TurnState::Pending;
        Ok(request)
    }

    /// Finish the pending turn with the completion result and return to `Idle`.
    pub fn finish_turn(
        &mut self,
        result: Result<String, CompletionError>,
    ) -> Result<TurnOutcome, ChatError> {
        if self.state != TurnState::Pending {
            return Err(ChatError::NoPendingTurn);
        }
        self.state = TurnState::Idle;

        match result {
            Ok(text) => {
                let reply = Message::assistant(text);
                self.store.append(reply.clone());
                Ok(TurnOutcome::Answered(reply))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Completion failed; turn ends without a reply");
                Ok(TurnOutcome::Failed(format!("Error: {}", e)))
            }
        }
    }

    /// Run a whole turn: begin, call the client, finish.
    pub async fn submit(&mut self, input: &str) -> Result<TurnOutcome, ChatError> {
        let request = self.begin_turn(input)?;
        let result = self.client.complete(&request).await;
        self.finish_turn(result)
    }

    /// Clear the transcript. Rejected while a turn is in flight.
    pub fn reset(&mut self) -> Result<(), ChatError> {
        if self.state == TurnState::Pending {
            return Err(ChatError::TurnInFlight);
        }
        self.store.reset();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use buzz_core::types::Role;

    use crate::prompt::{system_instruction, HistoryWindow, REFUSAL_MESSAGE};

    /// Replays canned results and records every request it receives.
    struct ScriptedClient {
        replies: Mutex<VecDeque<Result<String, CompletionError>>>,
        requests: Mutex<Vec<Vec<Message>>>,
    }

    impl ScriptedClient {
        fn new(replies: Vec<Result<String, CompletionError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<Vec<Message>> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(&self, messages: &[Message]) -> Result<String, CompletionError> {
            self.requests.lock().unwrap().push(messages.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("default reply".to_string()))
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    fn controller(client: Arc<ScriptedClient>) -> ConversationController {
        ConversationController::new(client, PromptComposer::default(), 4000)
    }

    #[tokio::test]
    async fn test_successful_turn_appends_user_and_assistant() {
        let client = ScriptedClient::new(vec![Ok("Use 3-5 niche hashtags.".to_string())]);
        let mut ctl = controller(Arc::clone(&client));

        let outcome = ctl
            .submit("What hashtags work best on Instagram?")
            .await
            .unwrap();

        assert_eq!(
            outcome,
            TurnOutcome::Answered(Message::assistant("Use 3-5 niche hashtags."))
        );
        assert_eq!(
            ctl.history(),
            &[
                Message::user("What hashtags work best on Instagram?"),
                Message::assistant("Use 3-5 niche hashtags."),
            ]
        );
        assert_eq!(ctl.state(), TurnState::Idle);

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].len(), 2);
        assert_eq!(requests[0][0], Message::system(system_instruction()));
        assert_eq!(
            requests[0][1],
            Message::user("What hashtags work best on Instagram?")
        );
    }

    #[tokio::test]
    async fn test_n_turns_give_2n_alternating_messages() {
        let client = ScriptedClient::new(vec![]);
        let mut ctl = controller(Arc::clone(&client));

        for i in 0..5 {
            ctl.submit(&format!("question {}", i)).await.unwrap();
        }

        let history = ctl.history();
        assert_eq!(history.len(), 10);
        for (i, msg) in history.iter().enumerate() {
            let expected = if i % 2 == 0 { Role::User } else { Role::Assistant };
            assert_eq!(msg.role(), expected);
        }
        assert_eq!(history[8].content(), "question 4");
    }

    #[tokio::test]
    async fn test_later_turns_send_full_history() {
        let client = ScriptedClient::new(vec![Ok("a1".into()), Ok("a2".into())]);
        let mut ctl = controller(Arc::clone(&client));

        ctl.submit("q1").await.unwrap();
        ctl.submit("q2").await.unwrap();

        let second = &client.requests()[1];
        assert_eq!(second.len(), 4);
        assert_eq!(second[0].role(), Role::System);
        assert_eq!(second[1], Message::user("q1"));
        assert_eq!(second[2], Message::assistant("a1"));
        assert_eq!(second[3], Message::user("q2"));
    }

    #[tokio::test]
    async fn test_failure_keeps_user_message_only() {
        let client = ScriptedClient::new(vec![Err(CompletionError::Upstream(
            "connection reset".to_string(),
        ))]);
        let mut ctl = controller(client);

        let outcome = ctl.submit("How often should I post on TikTok?").await.unwrap();

        assert_eq!(
            outcome,
            TurnOutcome::Failed("Error: connection reset".to_string())
        );
        assert_eq!(ctl.history().len(), 1);
        assert_eq!(ctl.history()[0].role(), Role::User);
        assert_eq!(ctl.state(), TurnState::Idle);
    }

    #[tokio::test]
    async fn test_session_usable_after_failure() {
        let client = ScriptedClient::new(vec![
            Err(CompletionError::Upstream("quota exceeded".into())),
            Ok("Post daily.".into()),
        ]);
        let mut ctl = controller(Arc::clone(&client));

        ctl.submit("first").await.unwrap();
        let outcome = ctl.submit("second").await.unwrap();

        assert!(matches!(outcome, TurnOutcome::Answered(_)));
        assert_eq!(ctl.history().len(), 3);
        // The failed turn's user message is part of the next request.
        let second = &client.requests()[1];
        assert_eq!(second[1], Message::user("first"));
        assert_eq!(second[2], Message::user("second"));
    }

    #[tokio::test]
    async fn test_refusal_is_a_normal_answer() {
        let client = ScriptedClient::new(vec![Ok(REFUSAL_MESSAGE.to_string())]);
        let mut ctl = controller(client);

        let outcome = ctl.submit("What's the capital of France?").await.unwrap();

        assert_eq!(
            outcome,
            TurnOutcome::Answered(Message::assistant(REFUSAL_MESSAGE))
        );
        assert_eq!(ctl.history().len(), 2);
        assert_eq!(ctl.history()[1].content(), REFUSAL_MESSAGE);
    }

    #[tokio::test]
    async fn test_empty_input_rejected_without_state_change() {
        let client = ScriptedClient::new(vec![]);
        let mut ctl = controller(Arc::clone(&client));

        assert!(matches!(ctl.submit("").await, Err(ChatError::EmptyMessage)));
        assert!(matches!(ctl.submit("   \n").await, Err(ChatError::EmptyMessage)));
        assert!(ctl.history().is_empty());
        assert!(client.requests().is_empty());
        assert_eq!(ctl.state(), TurnState::Idle);
    }

    #[tokio::test]
    async fn test_too_long_input_rejected() {
        let client = ScriptedClient::new(vec![]);
        let mut ctl = ConversationController::new(client, PromptComposer::default(), 10);

        let result = ctl.submit(&"a".repeat(11)).await;
        assert!(matches!(result, Err(ChatError::MessageTooLong(10))));
        assert!(ctl.history().is_empty());

        assert!(ctl.submit(&"a".repeat(10)).await.is_ok());
    }

    #[test]
    fn test_length_limit_counts_chars_not_bytes() {
        assert!(validate_input("\u{1f680}\u{1f680}", 2).is_ok());
        assert!(validate_input("\u{1f680}\u{1f680}\u{1f680}", 2).is_err());
    }

    #[test]
    fn test_begin_turn_enters_pending() {
        let mut ctl = controller(ScriptedClient::new(vec![]));
        let request = ctl.begin_turn("Q").unwrap();

        assert_eq!(request.len(), 2);
        assert_eq!(ctl.state(), TurnState::Pending);
        assert_eq!(ctl.history(), &[Message::user("Q")]);
    }

    #[test]
    fn test_input_while_pending_rejected() {
        let mut ctl = controller(ScriptedClient::new(vec![]));
        ctl.begin_turn("first").unwrap();

        assert!(matches!(ctl.begin_turn("second"), Err(ChatError::TurnInFlight)));
        assert_eq!(ctl.history().len(), 1);
    }

    #[test]
    fn test_reset_while_pending_rejected() {
        let mut ctl = controller(ScriptedClient::new(vec![]));
        ctl.begin_turn("first").unwrap();

        assert!(matches!(ctl.reset(), Err(ChatError::TurnInFlight)));
        assert_eq!(ctl.history().len(), 1);

        ctl.finish_turn(Ok("done".into())).unwrap();
        assert!(ctl.reset().is_ok());
        assert!(ctl.history().is_empty());
    }

    #[test]
    fn test_finish_without_pending_turn_rejected() {
        let mut ctl = controller(ScriptedClient::new(vec![]));
        let result = ctl.finish_turn(Ok("stray".into()));
        assert!(matches!(result, Err(ChatError::NoPendingTurn)));
        assert!(ctl.history().is_empty());
    }

    #[tokio::test]
    async fn test_reset_clears_and_is_idempotent() {
        let mut ctl = controller(ScriptedClient::new(vec![]));
        ctl.submit("one").await.unwrap();
        ctl.submit("two").await.unwrap();
        assert_eq!(ctl.history().len(), 4);

        ctl.reset().unwrap();
        assert!(ctl.history().is_empty());
        ctl.reset().unwrap();
        assert!(ctl.history().is_empty());
        assert_eq!(ctl.state(), TurnState::Idle);
    }

    #[tokio::test]
    async fn test_first_turn_after_reset_has_no_history() {
        let client = ScriptedClient::new(vec![]);
        let mut ctl = controller(Arc::clone(&client));

        ctl.submit("before").await.unwrap();
        ctl.reset().unwrap();
        ctl.submit("after").await.unwrap();

        let last = client.requests().pop().unwrap();
        assert_eq!(last.len(), 2);
        assert_eq!(last[1], Message::user("after"));
    }

    #[tokio::test]
    async fn test_history_window_limits_request_not_transcript() {
        let client = ScriptedClient::new(vec![]);
        let mut ctl = ConversationController::new(
            Arc::clone(&client) as Arc<dyn CompletionClient>,
            PromptComposer::new(HistoryWindow::LastMessages(2)),
            4000,
        );

        for i in 0..4 {
            ctl.submit(&format!("q{}", i)).await.unwrap();
        }

        assert_eq!(ctl.history().len(), 8);
        let last = client.requests().pop().unwrap();
        // system + 2 windowed + new user message
        assert_eq!(last.len(), 4);
        assert_eq!(last[1], Message::user("q2"));
        assert_eq!(last[3], Message::user("q3"));
    }
}
