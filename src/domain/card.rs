use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub lanes: Vec<Lane>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub sort_order: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lane {
    pub id: i64,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(default)]
    pub color: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub text: String,
    #[serde(default)]
    pub checked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checklist {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub items: Vec<ChecklistItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentAuthor {
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub id: Option<i64>,
    pub text: String,
    #[serde(default)]
    pub author: Option<CommentAuthor>,
    #[serde(default)]
    pub created: Option<String>,
}

impl Comment {
    pub fn author_name(&self) -> &str {
        self.author
            .as_ref()
            .and_then(|a| a.full_name.as_deref())
            .filter(|name| !name.trim().is_empty())
            .unwrap_or("Unknown")
    }

    /// Destination comments are posted by the target token's owner, so the
    /// original author is carried in the markdown body.
    pub fn migrated_text(&self) -> String {
        match self.created.as_deref() {
            Some(created) => format!(
                "**Comment from {}** ({})\n{}",
                self.author_name(),
                created,
                self.text
            ),
            None => format!("**Comment from {}**\n{}", self.author_name(), self.text),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardFile {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub url: String,
}

/// A card as returned by `GET cards` and `GET cards/{id}`. Fields not
/// modelled here are kept in `extra`, so serializing a card gives back what
/// the API sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asap: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_later: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checklists: Vec<Checklist>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Card {
    /// Label used in selection widgets; titles are not unique, ids are.
    pub fn display_label(&self) -> String {
        format!("{} (ID: {})", self.title, self.id)
    }
}

/// Body of `POST cards`. `None` fields are left out of the request.
#[derive(Debug, Clone, Serialize)]
pub struct NewCard {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub board_id: i64,
    pub column_id: i64,
    pub lane_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    pub asap: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
    pub expires_later: bool,
}

impl NewCard {
    pub fn from_source(card: &Card, target: &MigrationTarget) -> Self {
        Self {
            title: card.title.clone(),
            description: card.description.clone(),
            board_id: target.board_id,
            column_id: target.column_id,
            lane_id: target.lane_id,
            type_id: card.type_id,
            size_text: card.size_text.clone(),
            due_date: card.due_date.clone(),
            asap: card.asap.unwrap_or(false),
            properties: prepare_properties(card.properties.as_ref()),
            expires_later: card.expires_later.unwrap_or(false),
        }
    }
}

/// Minimal view of a created entity; only the id is needed to continue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Created {
    pub id: i64,
}

/// Where migrated cards land in the destination space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationTarget {
    pub board_id: i64,
    pub column_id: i64,
    pub lane_id: i64,
}

/// Pairs a source card with the card created for it in the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MigrationMapping {
    pub source_card_id: i64,
    pub target_card_id: i64,
}

/// Card creation expects user-typed properties as bare id lists, while reads
/// return them expanded into objects. Lists of objects with an `id` are
/// collapsed to their ids; every other value is copied unchanged.
pub fn prepare_properties(source: Option<&Map<String, Value>>) -> Option<Map<String, Value>> {
    let source = source.filter(|props| !props.is_empty())?;

    let prepared = source
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::Array(items) if is_object_list_with_ids(items) => Value::Array(
                    items
                        .iter()
                        .filter_map(|item| item.get("id").cloned())
                        .collect(),
                ),
                other => other.clone(),
            };
            (key.clone(), value)
        })
        .collect();

    Some(prepared)
}

fn is_object_list_with_ids(items: &[Value]) -> bool {
    items
        .first()
        .and_then(Value::as_object)
        .is_some_and(|first| first.contains_key("id"))
}
