/// The command a message was classified as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    AddRecord,
    RandomRecord,
    NoOp,
}

impl CommandKind {
    pub fn as_str(&self) -> &str {
        match self {
            CommandKind::AddRecord => "add-record",
            CommandKind::RandomRecord => "random-record",
            CommandKind::NoOp => "no-op",
        }
    }
}

/// Result of classifying one inbound message. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    pub kind: CommandKind,
    pub payload: Option<Vec<u8>>,
}

impl CommandInvocation {
    pub fn noop() -> Self {
        Self {
            kind: CommandKind::NoOp,
            payload: None,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.kind == CommandKind::NoOp
    }
}

impl Default for CommandInvocation {
    fn default() -> Self {
        Self::noop()
    }
}
