use axum::{extract::State, Json};

use crate::api::dto::{BoardCardsRequest, LoadBoardsRequest, LoadBoardsResponse};
use crate::api::AppState;
use crate::domain::MigrationError;
use crate::services::{BoardLoader, ColumnCards};

/// "Load boards": validates both sides of the form and lists their boards.
pub async fn load_boards(
    State(state): State<AppState>,
    Json(req): Json<LoadBoardsRequest>,
) -> Result<Json<LoadBoardsResponse>, MigrationError> {
    let (source, source_client) = state.connect(&req.source, "source")?;
    let (target, target_client) = state.connect(&req.target, "target")?;

    let source_boards = BoardLoader::load_boards(&source_client, source.space_id).await?;
    let target_boards = BoardLoader::load_boards(&target_client, target.space_id).await?;

    tracing::info!(
        source_domain = source.domain.as_str(),
        target_domain = target.domain.as_str(),
        source_boards = source_boards.len(),
        target_boards = target_boards.len(),
        "Boards loaded"
    );

    Ok(Json(LoadBoardsResponse {
        source_boards,
        target_boards,
    }))
}

pub async fn board_cards(
    State(state): State<AppState>,
    Json(req): Json<BoardCardsRequest>,
) -> Result<Json<Vec<ColumnCards>>, MigrationError> {
    let (source, client) = state.connect(&req.source, "source")?;
    let columns = BoardLoader::load_board_cards(&client, source.space_id, req.board_id).await?;
    Ok(Json(columns))
}
