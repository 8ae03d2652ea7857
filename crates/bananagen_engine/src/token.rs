use crate::types::ChatMessage;

pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> u32;
}

/// Simple, deterministic whitespace tokenizer.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhitespaceTokenCounter;

impl TokenCounter for WhitespaceTokenCounter {
    fn count(&self, text: &str) -> u32 {
        text.split_whitespace().count() as u32
    }
}

/// Drops the oldest messages until the rest fit in `budget` tokens.
/// Returns how many messages were dropped.
pub fn fit_to_budget(
    messages: &mut Vec<ChatMessage>,
    budget: u32,
    counter: &dyn TokenCounter,
) -> usize {
    let mut kept = 0;
    let mut used: u32 = 0;
    for message in messages.iter().rev() {
        let cost = counter.count(&message.text_content());
        if used.saturating_add(cost) > budget {
            break;
        }
        used += cost;
        kept += 1;
    }
    let dropped = messages.len() - kept;
    messages.drain(..dropped);
    dropped
}
