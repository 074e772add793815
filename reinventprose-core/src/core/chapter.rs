use serde::{Deserialize, Serialize};

/// A numbered chapter belonging to a [`Book`](crate::Book).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: i64,
    pub book_id: i64,
    /// Unique within the book; export order follows this number.
    pub chapter_number: i64,
    pub title: String,
    /// Rich markup; see [`RichText`](crate::RichText).
    pub content: String,
    /// The single guiding idea the chapter is written around.
    pub abstract_idea: String,
    pub created_at: i64,
    pub modified_at: i64,
}

impl Chapter {
    /// Label shown in the chapter list, e.g. `"Ch. 3: The Storm"`.
    pub fn display_label(&self) -> String {
        format!("Ch. {}: {}", self.chapter_number, self.title)
    }
}

/// One of the concrete, actionable ideas attached to a chapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcreteIdea {
    pub id: i64,
    pub chapter_id: i64,
    pub idea: String,
}
