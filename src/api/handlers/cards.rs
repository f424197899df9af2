use axum::{extract::State, Json};

use crate::api::dto::{CardOption, ListCardsRequest};
use crate::api::AppState;
use crate::domain::MigrationError;
use crate::services::BoardLoader;

pub async fn list_cards(
    State(state): State<AppState>,
    Json(req): Json<ListCardsRequest>,
) -> Result<Json<Vec<CardOption>>, MigrationError> {
    let (source, client) = state.connect(&req.source, "source")?;
    let cards =
        BoardLoader::load_column_cards(&client, source.space_id, req.board_id, req.column_id)
            .await?;

    Ok(Json(cards.into_iter().map(CardOption::from).collect()))
}
