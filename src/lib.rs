//! snippets-bot - a group chat bot host with pluggable feature modules

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod modules;
