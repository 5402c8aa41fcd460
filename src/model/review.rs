//! Review aggregate: a review owns attachments, reactions and replies, and
//! each reply owns its own attachments and reactions.

use super::{FileRef, double_option, lenient_i64, opaque_id, opaque_id_opt};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Review {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    #[serde(deserialize_with = "opaque_id")]
    pub specialist_id: String,
    #[serde(deserialize_with = "opaque_id_opt")]
    pub user_id: Option<String>,
    #[serde(alias = "userName")]
    pub author_name: Option<String>,
    #[serde(deserialize_with = "lenient_i64")]
    pub rating: i64,
    #[serde(alias = "comment")]
    pub text: String,
    pub is_moderated: bool,
    pub is_published: bool,
    pub attachments: Vec<FileRef>,
    pub reactions: Vec<Reaction>,
    pub replies: Vec<ReviewReply>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// One reaction per (user, type) on the same review or reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Reaction {
    #[serde(deserialize_with = "opaque_id")]
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReviewReply {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    #[serde(deserialize_with = "opaque_id_opt")]
    pub user_id: Option<String>,
    #[serde(alias = "userName")]
    pub author_name: Option<String>,
    pub text: String,
    pub is_published: bool,
    pub attachments: Vec<FileRef>,
    pub reactions: Vec<Reaction>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Default for ReviewReply {
    fn default() -> Self {
        Self {
            id: String::new(),
            user_id: None,
            author_name: None,
            text: String::new(),
            is_published: true,
            attachments: Vec::new(),
            reactions: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }
}

impl ReviewReply {
    /// Replies saved without an id get one derived from their position.
    pub fn id_for(&self, review_id: &str, index: usize) -> String {
        if self.id.is_empty() {
            format!("{}-reply-{}", review_id, index)
        } else {
            self.id.clone()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReviewPatch {
    #[serde(deserialize_with = "double_option")]
    pub author_name: Option<Option<String>>,
    pub rating: Option<i64>,
    pub text: Option<String>,
    pub is_moderated: Option<bool>,
    pub is_published: Option<bool>,
    pub attachments: Option<Vec<FileRef>>,
}

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

pub fn rating_in_range(rating: i64) -> bool {
    (MIN_RATING..=MAX_RATING).contains(&rating)
}
