use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tags every new board starts with.
pub const DEFAULT_TAGS: [&str; 3] = ["Food", "Sightseeing", "Other"];

/// Emoji -> names of the members who reacted with it.
///
/// The lists behave as sets: a member appears at most once per emoji.
pub type Reactions = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    /// Document key; not part of the stored body.
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub members: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created_by_device_id: String,
    pub created_at: DateTime<Utc>,
}

/// A board as submitted for creation, before the store stamps `created_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBoard {
    pub id: String,
    pub title: String,
    pub members: Vec<String>,
    pub tags: Vec<String>,
    pub created_by_device_id: String,
}

impl NewBoard {
    pub fn new(id: impl Into<String>, title: impl Into<String>, members: Vec<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            members,
            tags: DEFAULT_TAGS.iter().map(|t| t.to_string()).collect(),
            created_by_device_id: String::new(),
        }
    }

    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.created_by_device_id = device_id.into();
        self
    }

    pub fn into_board(self, created_at: DateTime<Utc>) -> Board {
        Board {
            id: self.id,
            title: self.title,
            members: self.members,
            tags: self.tags,
            created_by_device_id: self.created_by_device_id,
            created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub domain: String,
    pub category: String,
    pub added_by: String,
    #[serde(default)]
    pub reactions: Reactions,
    pub created_at: DateTime<Utc>,
}

/// A link ready to be stored: URL plus resolved preview fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewLink {
    pub url: String,
    pub title: String,
    pub image_url: String,
    pub description: String,
    pub domain: String,
    pub category: String,
    pub added_by: String,
    pub reactions: Option<Reactions>,
}

impl NewLink {
    pub fn into_link(self, id: String, created_at: DateTime<Utc>) -> Link {
        Link {
            id,
            url: self.url,
            title: self.title,
            image_url: self.image_url,
            description: self.description,
            domain: self.domain,
            category: self.category,
            added_by: self.added_by,
            reactions: self.reactions.unwrap_or_default(),
            created_at,
        }
    }
}

/// Flip `member`'s reaction with `emoji`.
///
/// Returns `true` if the reaction was added, `false` if it was removed.
/// Lists for other emoji are left alone; an emoji with no members left is
/// dropped from the map.
pub fn toggle_reaction(reactions: &mut Reactions, emoji: &str, member: &str) -> bool {
    let members = reactions.entry(emoji.to_string()).or_default();
    let before = members.len();
    members.retain(|name| name != member);

    let added = members.len() == before;
    if added {
        members.push(member.to_string());
    } else if members.is_empty() {
        reactions.remove(emoji);
    }
    added
}
