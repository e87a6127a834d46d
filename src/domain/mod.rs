//! Domain layer - Core types with no infrastructure dependencies
//! 
//! This layer contains:
//! - Entities: Group messages, commands, stored snippets
//! - Traits: Abstractions for infrastructure (GroupClient, SnippetStore)

pub mod entities;
pub mod traits;
