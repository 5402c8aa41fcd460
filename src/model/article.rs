use super::{double_option, opaque_id, opaque_id_opt, string_enum_serde};
use crate::Error;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ArticleStatus {
    #[default]
    Draft,
    Published,
}

impl ArticleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatus::Draft => "draft",
            ArticleStatus::Published => "published",
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, ArticleStatus::Published)
    }
}

impl FromStr for ArticleStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" | "" => Ok(ArticleStatus::Draft),
            "published" | "publish" => Ok(ArticleStatus::Published),
            _ => Err(Error::Invalid(format!("Unknown article status: {}", s))),
        }
    }
}

string_enum_serde!(ArticleStatus);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Article {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub image: Option<String>,
    pub status: ArticleStatus,
    /// Author; older files call it `authorId`
    #[serde(alias = "authorId", deserialize_with = "opaque_id_opt")]
    pub specialist_id: Option<String>,
    pub tags: Vec<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Article {
    /// Trimmed, de-duplicated, non-empty tags.
    pub fn distinct_tags(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::with_capacity(self.tags.len());
        for tag in &self.tags {
            let tag = tag.trim();
            if !tag.is_empty() && !out.contains(&tag) {
                out.push(tag);
            }
        }
        out
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArticlePatch {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    #[serde(deserialize_with = "double_option")]
    pub excerpt: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub image: Option<Option<String>>,
    pub status: Option<ArticleStatus>,
    #[serde(deserialize_with = "double_option")]
    pub specialist_id: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
}
