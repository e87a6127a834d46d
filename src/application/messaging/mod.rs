//! Message handling - Event routing and command dispatch

pub mod classifier;
pub mod dispatcher;
pub mod router;

pub use classifier::CommandClassifier;
pub use dispatcher::{CommandContext, CommandDispatcher, CommandHandler, DispatchOutcome, FAILURE_PREFIX, SUCCESS_PREFIX};
pub use router::{DispatchReport, EventRouter, GroupMessageHandler, Interest};
