//! Bounded history windows.

/// Keeps the opening message plus the most recent ones.
///
/// When the history is longer than `max_messages`, the window is the first message
/// followed by the last `max_messages - 1` messages, in their original order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryWindower {
    max_messages: usize,
}

impl HistoryWindower {
    pub fn new(max_messages: usize) -> Self {
        Self { max_messages }
    }

    pub fn window<T: Clone>(&self, messages: &[T]) -> Vec<T> {
        window(messages, self.max_messages)
    }
}

pub fn window<T: Clone>(messages: &[T], max_count: usize) -> Vec<T> {
    if messages.len() <= max_count {
        return messages.to_vec();
    }

    match max_count {
        0 => Vec::new(),
        1 => messages[..1].to_vec(),
        _ => {
            let tail_start = messages.len() - (max_count - 1);
            let mut bounded = Vec::with_capacity(max_count);
            bounded.push(messages[0].clone());
            bounded.extend_from_slice(&messages[tail_start..]);
            bounded
        }
    }
}
