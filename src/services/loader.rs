use std::cmp::Ordering;

use serde::Serialize;

use crate::domain::{Board, Card, Column, MigrationError, MigrationTarget};
use crate::kaiten::KaitenApi;

#[derive(Debug, Clone, Serialize)]
pub struct ColumnCards {
    pub column: Column,
    pub cards: Vec<Card>,
}

/// Read-only views of a space for the selection widgets.
pub struct BoardLoader;

impl BoardLoader {
    pub async fn load_boards(
        api: &dyn KaitenApi,
        space_id: i64,
    ) -> Result<Vec<Board>, MigrationError> {
        let mut boards = api.list_boards(space_id).await?;
        for board in &mut boards {
            board.columns.sort_by(compare_columns);
        }

        tracing::debug!(space_id, count = boards.len(), "Loaded boards");
        Ok(boards)
    }

    pub async fn load_column_cards(
        api: &dyn KaitenApi,
        space_id: i64,
        board_id: i64,
        column_id: i64,
    ) -> Result<Vec<Card>, MigrationError> {
        let cards = api.list_cards(space_id, board_id, column_id).await?;
        tracing::debug!(space_id, board_id, column_id, count = cards.len(), "Loaded cards");
        Ok(cards)
    }

    /// Every column of `board_id`, in board order, with its cards.
    pub async fn load_board_cards(
        api: &dyn KaitenApi,
        space_id: i64,
        board_id: i64,
    ) -> Result<Vec<ColumnCards>, MigrationError> {
        let board = Self::find_board(api, space_id, board_id).await?;

        let mut columns = Vec::with_capacity(board.columns.len());
        for column in board.columns {
            let cards = Self::load_column_cards(api, space_id, board.id, column.id).await?;
            columns.push(ColumnCards { column, cards });
        }

        Ok(columns)
    }

    /// Checks that the column belongs to the board and picks the lane new
    /// cards are placed in: the requested one, or the board's first lane.
    pub async fn resolve_target(
        api: &dyn KaitenApi,
        space_id: i64,
        board_id: i64,
        column_id: i64,
        lane_id: Option<i64>,
    ) -> Result<MigrationTarget, MigrationError> {
        let board = Self::find_board(api, space_id, board_id).await?;

        if !board.columns.iter().any(|c| c.id == column_id) {
            return Err(MigrationError::Validation(format!(
                "column {column_id} does not belong to target board {:?}",
                board.title
            )));
        }

        let lane_id = match lane_id {
            Some(id) if board.lanes.iter().any(|l| l.id == id) => id,
            Some(id) => {
                return Err(MigrationError::Validation(format!(
                    "lane {id} does not belong to target board {:?}",
                    board.title
                )))
            }
            None => {
                board
                    .lanes
                    .first()
                    .ok_or_else(|| {
                        MigrationError::Validation(format!(
                            "target board {:?} has no lanes; cards cannot be placed on it",
                            board.title
                        ))
                    })?
                    .id
            }
        };

        Ok(MigrationTarget {
            board_id,
            column_id,
            lane_id,
        })
    }

    async fn find_board(
        api: &dyn KaitenApi,
        space_id: i64,
        board_id: i64,
    ) -> Result<Board, MigrationError> {
        Self::load_boards(api, space_id)
            .await?
            .into_iter()
            .find(|b| b.id == board_id)
            .ok_or_else(|| {
                MigrationError::Validation(format!(
                    "board {board_id} not found in space {space_id}"
                ))
            })
    }
}

// Columns without a sort order keep their API position after the sorted ones.
fn compare_columns(a: &Column, b: &Column) -> Ordering {
    match (a.sort_order, b.sort_order) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
