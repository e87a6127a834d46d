use std::fmt;

/// The member who posted a group message
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sender {
    pub uin: i64,
    pub nickname: String,
    pub card_name: Option<String>,
}

impl Sender {
    pub fn new(uin: i64, nickname: impl Into<String>) -> Self {
        Self {
            uin,
            nickname: nickname.into(),
            card_name: None,
        }
    }

    /// Set the group card name, which takes precedence over the nickname
    pub fn with_card_name(mut self, card: impl Into<String>) -> Self {
        self.card_name = Some(card.into());
        self
    }

    pub fn display_name(&self) -> String {
        match self.card_name {
            Some(ref card) if !card.is_empty() => card.clone(),
            _ => self.nickname.clone(),
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name(), self.uin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_name_wins_over_nickname() {
        let sender = Sender::new(42, "alice").with_card_name("Alice in group");
        assert_eq!(sender.display_name(), "Alice in group");
        assert_eq!(sender.to_string(), "Alice in group (42)");
    }

    #[test]
    fn test_empty_card_name_falls_back() {
        let sender = Sender::new(42, "alice").with_card_name("");
        assert_eq!(sender.display_name(), "alice");
    }
}
