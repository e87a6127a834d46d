//! Console adapter for development/testing

use async_trait::async_trait;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::application::errors::BotError;
use crate::domain::entities::{Element, InboundEvent, OutgoingMessage, Segment, Sender};
use crate::domain::traits::{ClientInfo, GroupClient};
use crate::infrastructure::config::ConsoleConfig;

/// Console adapter: every stdin line is a message in one fixed group.
///
/// `[image:<path>]` tokens in a line are read from disk and become image
/// elements, so commands that need an image can be tried locally.
///
/// The inbound stream ends at stdin EOF, which shuts the bot down. Run it
/// attached to a terminal or pipe, not with stdin closed.
pub struct ConsoleAdapter {
    info: ClientInfo,
    group: i64,
    sender: Sender,
}

impl ConsoleAdapter {
    pub fn new(config: &ConsoleConfig) -> Self {
        Self {
            info: ClientInfo {
                uin: 0,
                name: "snippets-bot".to_string(),
                platform: "console".to_string(),
            },
            group: config.group,
            sender: Sender::new(config.uin, config.display_name.clone()),
        }
    }

    /// Build an event from one line of input
    pub async fn parse_line(&self, line: &str) -> InboundEvent {
        let mut event = InboundEvent::new(self.group, self.sender.clone());
        for element in split_line(line) {
            let element = match element {
                LinePart::Text(text) => Element::Text(text),
                LinePart::Image(path) => match tokio::fs::read(Path::new(&path)).await {
                    Ok(data) => Element::Image(data),
                    Err(e) => {
                        tracing::warn!("Cannot read image {}: {}", path, e);
                        continue;
                    }
                },
            };
            event = event.with_element(element);
        }
        event
    }
}

#[derive(Debug, PartialEq, Eq)]
enum LinePart {
    Text(String),
    Image(String),
}

fn split_line(line: &str) -> Vec<LinePart> {
    let mut parts = Vec::new();
    let mut rest = line;

    while let Some(start) = rest.find("[image:") {
        let Some(len) = rest[start..].find(']') else {
            break;
        };
        if start > 0 {
            parts.push(LinePart::Text(rest[..start].to_string()));
        }
        let path = rest[start + "[image:".len()..start + len].trim();
        parts.push(LinePart::Image(path.to_string()));
        rest = &rest[start + len + 1..];
    }

    if !rest.is_empty() {
        parts.push(LinePart::Text(rest.to_string()));
    }
    parts
}

#[async_trait]
impl GroupClient for ConsoleAdapter {
    async fn run(&self, events: mpsc::Sender<InboundEvent>) -> Result<(), BotError> {
        tracing::info!("Starting console client (dev mode), messages go to group {}", self.group);

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?
        {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let event = self.parse_line(line).await;
            if events.send(event).await.is_err() {
                break;
            }
        }

        Ok(())
    }

    async fn send_group_message(&self, group_id: i64, message: OutgoingMessage) -> Result<(), BotError> {
        for segment in &message.segments {
            match segment {
                Segment::Text(text) => println!("[BOT -> {}] {}", group_id, text),
                Segment::Image(data) => println!("[BOT -> {}] [image {} bytes]", group_id, data.len()),
            }
        }
        Ok(())
    }

    fn client_info(&self) -> ClientInfo {
        self.info.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_line() {
        assert_eq!(split_line("hello"), vec![LinePart::Text("hello".to_string())]);
        assert_eq!(
            split_line("!添加语录 [image: a.png] tail"),
            vec![
                LinePart::Text("!添加语录 ".to_string()),
                LinePart::Image("a.png".to_string()),
                LinePart::Text(" tail".to_string()),
            ]
        );
        assert_eq!(split_line("[image:x]"), vec![LinePart::Image("x".to_string())]);
        // Unterminated token stays text
        assert_eq!(split_line("a [image:x"), vec![LinePart::Text("a [image:x".to_string())]);
    }

    #[tokio::test]
    async fn test_parse_line_reads_image() {
        let dir = tempfile::tempdir().unwrap();
        let img = dir.path().join("a.png");
        std::fs::write(&img, b"png").unwrap();

        let adapter = ConsoleAdapter::new(&ConsoleConfig::default());
        let event = adapter
            .parse_line(&format!("!添加语录 [image:{}]", img.display()))
            .await;

        assert_eq!(event.group_id, ConsoleConfig::default().group);
        assert_eq!(
            event.elements,
            vec![Element::Text("!添加语录 ".to_string()), Element::Image(b"png".to_vec())]
        );
    }
}
