use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationCategory {
    Success,
    Error,
    Warning,
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NotificationCategory::Success => "success",
            NotificationCategory::Error => "error",
            NotificationCategory::Warning => "warning",
        };
        f.write_str(label)
    }
}

/// What the banner currently shows. Hidden banners keep their last message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationState {
    pub message: String,
    pub category: NotificationCategory,
    pub visible: bool,
}

impl NotificationState {
    pub fn shown(message: impl Into<String>, category: NotificationCategory) -> Self {
        Self {
            message: message.into(),
            category,
            visible: true,
        }
    }
}

impl Default for NotificationState {
    fn default() -> Self {
        Self {
            message: String::new(),
            category: NotificationCategory::Success,
            visible: false,
        }
    }
}
