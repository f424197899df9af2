use serde::{Deserialize, Serialize};

use uuid::Uuid;

use crate::domain::{Board, Card, SpaceForm};

#[derive(Debug, Deserialize)]
pub struct LoadBoardsRequest {
    pub source: SpaceForm,
    pub target: SpaceForm,
}

#[derive(Debug, Serialize)]
pub struct LoadBoardsResponse {
    pub source_boards: Vec<Board>,
    pub target_boards: Vec<Board>,
}

#[derive(Debug, Deserialize)]
pub struct ListCardsRequest {
    pub source: SpaceForm,
    pub board_id: i64,
    pub column_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct BoardCardsRequest {
    pub source: SpaceForm,
    pub board_id: i64,
}

/// A card as offered in the selection list; `card` feeds the preview pane.
#[derive(Debug, Serialize)]
pub struct CardOption {
    pub id: i64,
    pub label: String,
    pub card: Card,
}

impl From<Card> for CardOption {
    fn from(card: Card) -> Self {
        Self {
            id: card.id,
            label: card.display_label(),
            card,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StartMigrationRequest {
    pub source: SpaceForm,
    pub target: SpaceForm,
    #[serde(default)]
    pub card_ids: Vec<i64>,
    pub target_board_id: i64,
    pub target_column_id: i64,
    #[serde(default)]
    pub target_lane_id: Option<i64>,
}

/// Returned as soon as a run is accepted; its events on `/api/events` carry
/// the same `run_id`.
#[derive(Debug, Serialize)]
pub struct MigrationStarted {
    pub run_id: Uuid,
    pub total: usize,
}
