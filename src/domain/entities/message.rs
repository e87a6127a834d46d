use super::Sender;
use chrono::{DateTime, Utc};

/// One typed segment of an inbound group message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Text(String),
    Image(Vec<u8>),
    /// Anything the host does not interpret (faces, mentions, replies, ...)
    Other(String),
}

/// A single incoming group message, as delivered by the network client
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub id: String,
    pub group_id: i64,
    pub sender: Sender,
    pub elements: Vec<Element>,
    pub timestamp: DateTime<Utc>,
}

impl InboundEvent {
    pub fn new(group_id: i64, sender: Sender) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            group_id,
            sender,
            elements: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.elements.push(Element::Text(text.into()));
        self
    }

    pub fn with_image(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.elements.push(Element::Image(data.into()));
        self
    }

    pub fn with_element(mut self, element: Element) -> Self {
        self.elements.push(element);
        self
    }

    /// Short human-readable rendering used in logs
    pub fn summary(&self) -> String {
        self.elements
            .iter()
            .map(|el| match el {
                Element::Text(s) => s.chars().take(50).collect::<String>(),
                Element::Image(data) => format!("[image {} bytes]", data.len()),
                Element::Other(kind) => format!("[{}]", kind),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// One segment of an outgoing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Image(Vec<u8>),
}

/// Message composed by a module and handed to the network client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub segments: Vec<Segment>,
}

impl OutgoingMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new().with_text(text)
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.segments.push(Segment::Text(text.into()));
        self
    }

    pub fn with_image(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.segments.push(Segment::Image(data.into()));
        self
    }

    pub fn has_image(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Image(_)))
    }

    /// Concatenated text segments
    pub fn plain_text(&self) -> String {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Text(t) => Some(t.as_str()),
                Segment::Image(_) => None,
            })
            .collect()
    }
}
