//! Per-call conversation state

use std::collections::VecDeque;

use tokio::time::Instant;

/// Mutable conversational record for one call.
///
/// Owned exclusively by its session; mutated only by the handler sequence
/// for that call's events.
#[derive(Debug)]
pub struct ConversationContext {
    /// Completed utterances, oldest first. Bounded; oldest evicted on
    /// overflow.
    history: VecDeque<String>,
    /// Accumulating partial transcript for the in-progress utterance.
    pub current_speech: String,
    /// Full text of the most recent AI response.
    pub last_response: String,
    /// Personality driving the AI side of this call.
    pub personality_id: String,
    /// When the session was created.
    pub started_at: Instant,
    /// Completed AI turns. Monotonic, incremented once per turn.
    pub turn_count: u32,

    max_history: usize,
}

impl ConversationContext {
    pub fn new(personality_id: String, max_history: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(max_history),
            current_speech: String::new(),
            last_response: String::new(),
            personality_id,
            started_at: Instant::now(),
            turn_count: 0,
            max_history,
        }
    }

    /// Append one utterance, evicting the oldest entries past the bound.
    pub fn push_history(&mut self, entry: String) {
        self.history.push_back(entry);
        while self.history.len() > self.max_history {
            self.history.pop_front();
        }
    }

    /// Snapshot of the history for seeding a provider chat.
    pub fn history(&self) -> Vec<String> {
        self.history.iter().cloned().collect()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_history_is_bounded() {
        let mut context = ConversationContext::new("professional".to_string(), 10);
        for i in 0..25 {
            context.push_history(format!("User: utterance {i}"));
        }
        assert_eq!(context.history_len(), 10);

        // The ten most recent entries survive
        let history = context.history();
        assert_eq!(history[0], "User: utterance 15");
        assert_eq!(history[9], "User: utterance 24");
    }

    #[tokio::test]
    async fn test_new_context_is_empty() {
        let context = ConversationContext::new("zen".to_string(), 10);
        assert_eq!(context.history_len(), 0);
        assert_eq!(context.turn_count, 0);
        assert!(context.current_speech.is_empty());
        assert_eq!(context.personality_id, "zen");
    }
}
