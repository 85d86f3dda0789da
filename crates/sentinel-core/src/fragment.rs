use serde::{Deserialize, Serialize};

/// One unit relayed to the caller while a generation streams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamFragment {
    /// A chunk of generated content, or an in-band diagnostic that stands in for it.
    Text { content: String },
    /// End of stream. Always the last fragment of a completed stream.
    Done,
}

impl StreamFragment {
    pub fn text(content: impl Into<String>) -> Self {
        StreamFragment::Text {
            content: content.into(),
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, StreamFragment::Done)
    }

    pub fn content(&self) -> Option<&str> {
        match self {
            StreamFragment::Text { content } => Some(content),
            StreamFragment::Done => None,
        }
    }
}
