//! Gotify wire types. Unknown fields are ignored.

use serde::{Deserialize, Serialize};

/// An application registered on the Gotify server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: i64,
    /// Display name. `None` when the server omitted it; such entries cannot
    /// be used to label a notification.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub internal: bool,
    #[serde(default)]
    pub image: Option<String>,
}

impl Application {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
            description: String::new(),
            internal: false,
            image: None,
        }
    }

    /// The display name, if it is present and not blank.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.trim().is_empty())
    }
}

/// A message pushed on the Gotify stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    #[serde(default)]
    pub id: Option<i64>,
    pub appid: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub appname: Option<String>,
    #[serde(default)]
    pub extras: Option<serde_json::Value>,
}

impl NotificationEvent {
    pub fn new(appid: i64, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: None,
            appid,
            title: title.into(),
            message: message.into(),
            priority: None,
            date: None,
            appname: None,
            extras: None,
        }
    }
}

/// Response of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub health: String,
    pub database: String,
}

impl Health {
    pub fn is_green(&self) -> bool {
        self.health == "green" && self.database == "green"
    }
}
