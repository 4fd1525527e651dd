use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Input rejected before it reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("at least one member is required")]
    NoMembers,
    #[error("no valid fields to update")]
    EmptyPatch,
}

// -- Boards --

#[derive(Debug, Deserialize)]
pub struct CreateBoardRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub members: Vec<String>,
    /// Opaque id the client generated for this device.
    #[serde(default)]
    pub device_id: String,
}

/// A create-board request after trimming and validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidBoard {
    pub title: String,
    pub members: Vec<String>,
    pub device_id: String,
}

impl CreateBoardRequest {
    pub fn validate(self) -> Result<ValidBoard, ValidationError> {
        let title = required("title", &self.title)?;
        let members = trim_members(self.members)?;

        Ok(ValidBoard {
            title,
            members,
            device_id: self.device_id.trim().to_string(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateBoardResponse {
    pub board_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListBoardsQuery {
    #[serde(default)]
    pub device_id: String,
    /// Kept as text so a malformed value falls back to the default limit
    /// instead of failing the request.
    pub limit: Option<String>,
}

impl ListBoardsQuery {
    pub fn limit(&self) -> Option<i64> {
        self.limit.as_deref().and_then(|l| l.trim().parse().ok())
    }
}

/// Fields of a board that may be changed after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoardField {
    Title,
    Members,
    Tags,
}

impl BoardField {
    pub const ALL: [BoardField; 3] = [BoardField::Title, BoardField::Members, BoardField::Tags];

    pub fn as_str(self) -> &'static str {
        match self {
            BoardField::Title => "title",
            BoardField::Members => "members",
            BoardField::Tags => "tags",
        }
    }
}

/// Partial board update. Unknown keys in the incoming JSON are dropped by
/// serde, so only whitelisted fields can ever reach the store.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BoardPatch {
    pub title: Option<String>,
    pub members: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

impl BoardPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn members(mut self, members: Vec<String>) -> Self {
        self.members = Some(members);
        self
    }

    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.members.is_none() && self.tags.is_none()
    }

    /// Trim the supplied fields and enforce the board invariants on them.
    pub fn validate(self) -> Result<Self, ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::EmptyPatch);
        }
        let title = self.title.as_deref().map(|t| required("title", t)).transpose()?;
        let members = self.members.map(trim_members).transpose()?;

        Ok(Self {
            title,
            members,
            tags: self.tags,
        })
    }

    /// The supplied fields as a field-name keyed JSON map.
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        for field in BoardField::ALL {
            let value = match field {
                BoardField::Title => self.title.clone().map(Value::from),
                BoardField::Members => self.members.clone().map(Value::from),
                BoardField::Tags => self.tags.clone().map(Value::from),
            };
            if let Some(value) = value {
                fields.insert(field.as_str().to_string(), value);
            }
        }
        fields
    }
}

// -- Links --

#[derive(Debug, Deserialize)]
pub struct CreateLinkRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub added_by: String,
}

impl CreateLinkRequest {
    pub fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            url: required("url", &self.url)?,
            category: required("category", &self.category)?,
            added_by: required("added_by", &self.added_by)?,
        })
    }
}

// -- Reactions --

#[derive(Debug, Deserialize)]
pub struct ToggleReactionRequest {
    #[serde(default)]
    pub emoji: String,
    #[serde(default)]
    pub member: String,
}

impl ToggleReactionRequest {
    pub fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            emoji: required("emoji", &self.emoji)?,
            member: required("member", &self.member)?,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn required(name: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required(name));
    }
    Ok(trimmed.to_string())
}

fn trim_members(members: Vec<String>) -> Result<Vec<String>, ValidationError> {
    let trimmed: Vec<String> = members
        .iter()
        .map(|m| m.trim())
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect();

    if trimmed.is_empty() {
        return Err(ValidationError::NoMembers);
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_request(title: &str, members: &[&str]) -> CreateBoardRequest {
        CreateBoardRequest {
            title: title.into(),
            members: members.iter().map(|m| m.to_string()).collect(),
            device_id: " device-1 ".into(),
        }
    }

    #[test]
    fn create_board_trims_input() {
        let board = board_request("  Kyoto trip ", &[" Alice", "", "  ", "Bob "])
            .validate()
            .unwrap();
        assert_eq!(board.title, "Kyoto trip");
        assert_eq!(board.members, vec!["Alice", "Bob"]);
        assert_eq!(board.device_id, "device-1");
    }

    #[test]
    fn create_board_rejects_blank_title() {
        let err = board_request("   ", &["Alice"]).validate().unwrap_err();
        assert_eq!(err, ValidationError::Required("title"));
    }

    #[test]
    fn create_board_rejects_blank_members() {
        let err = board_request("Trip", &[" ", ""]).validate().unwrap_err();
        assert_eq!(err, ValidationError::NoMembers);

        let err = board_request("Trip", &[]).validate().unwrap_err();
        assert_eq!(err, ValidationError::NoMembers);
    }

    #[test]
    fn patch_drops_unknown_fields() {
        let patch: BoardPatch = serde_json::from_value(serde_json::json!({
            "created_at": "2020-01-01T00:00:00Z",
            "created_by_device_id": "someone-else",
            "title": "Renamed",
        }))
        .unwrap();

        assert_eq!(patch, BoardPatch::new().title("Renamed"));
        let fields = patch.to_fields();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["title"], "Renamed");
    }

    #[test]
    fn patch_with_only_unknown_fields_is_rejected() {
        let patch: BoardPatch =
            serde_json::from_value(serde_json::json!({ "created_at": "2020-01-01T00:00:00Z" }))
                .unwrap();
        assert!(patch.is_empty());
        assert_eq!(patch.validate().unwrap_err(), ValidationError::EmptyPatch);
    }

    #[test]
    fn patch_validation_trims_members() {
        let patch = BoardPatch::new()
            .members(vec![" Carol ".into(), "".into()])
            .validate()
            .unwrap();
        assert_eq!(patch.members, Some(vec!["Carol".to_string()]));

        let err = BoardPatch::new().members(vec![" ".into()]).validate().unwrap_err();
        assert_eq!(err, ValidationError::NoMembers);
    }

    #[test]
    fn patch_allows_empty_tags() {
        let patch = BoardPatch::new().tags(vec![]).validate().unwrap();
        assert_eq!(patch.to_fields()["tags"], serde_json::json!([]));
    }

    #[test]
    fn list_query_limit_parsing() {
        let query = |limit: Option<&str>| ListBoardsQuery {
            device_id: "d".into(),
            limit: limit.map(str::to_string),
        };
        assert_eq!(query(None).limit(), None);
        assert_eq!(query(Some("10")).limit(), Some(10));
        assert_eq!(query(Some("-5")).limit(), Some(-5));
        assert_eq!(query(Some("ten")).limit(), None);
    }

    #[test]
    fn link_request_requires_all_fields() {
        let req = CreateLinkRequest {
            url: "https://example.com".into(),
            category: " ".into(),
            added_by: "Alice".into(),
        };
        assert_eq!(req.validate().unwrap_err(), ValidationError::Required("category"));
    }

    #[test]
    fn reaction_request_requires_member() {
        let req = ToggleReactionRequest {
            emoji: "👍".into(),
            member: "".into(),
        };
        assert_eq!(req.validate().unwrap_err(), ValidationError::Required("member"));
    }
}
