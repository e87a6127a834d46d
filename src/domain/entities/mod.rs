//! Domain entities - Core business objects with no external dependencies

pub mod sender;
pub mod message;
pub mod command;
pub mod snippet;

pub use sender::Sender;
pub use message::{Element, InboundEvent, OutgoingMessage, Segment};
pub use command::{CommandInvocation, CommandKind};
pub use snippet::{NewSnippet, Snippet};
