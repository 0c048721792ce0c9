use serde::{Deserialize, Serialize};

pub const DEFAULT_GREETING_NAME: &str = "World";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GreetingQuery {
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Greeting {
    /// Position of this greeting in the sequence handed out since startup
    pub id: u64,
    pub content: String,
}

impl Greeting {
    pub fn new(id: u64, name: Option<&str>) -> Self {
        let name = name.unwrap_or(DEFAULT_GREETING_NAME);
        Self { id, content: format!("Hello, {name}!") }
    }
}
