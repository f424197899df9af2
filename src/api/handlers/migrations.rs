use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;

use crate::api::dto::{MigrationStarted, StartMigrationRequest};
use crate::api::AppState;
use crate::domain::MigrationError;
use crate::services::{BoardLoader, MigrationService, ProgressReporter};

/// "Start migration": validates the form and the destination, then runs the
/// migration in a background task so it does not depend on the caller staying
/// connected. Progress and the final outcome are streamed on `/api/events`,
/// tagged with the returned `run_id`.
pub async fn start_migration(
    State(state): State<AppState>,
    Json(req): Json<StartMigrationRequest>,
) -> Result<(StatusCode, Json<MigrationStarted>), MigrationError> {
    let (_, source_client) = state.connect(&req.source, "source")?;
    let (target, target_client) = state.connect(&req.target, "target")?;

    let run_id = Uuid::new_v4();
    let total = req.card_ids.len();

    if req.card_ids.is_empty() {
        let mut reporter = ProgressReporter::new(run_id, state.sse_tx.clone());
        reporter.run_started(0);
        reporter.run_finished(0, 0, None);
        return Ok((StatusCode::ACCEPTED, Json(MigrationStarted { run_id, total })));
    }

    let destination = BoardLoader::resolve_target(
        &target_client,
        target.space_id,
        req.target_board_id,
        req.target_column_id,
        req.target_lane_id,
    )
    .await?;

    tracing::info!(
        run_id = %run_id,
        cards = total,
        board_id = destination.board_id,
        column_id = destination.column_id,
        lane_id = destination.lane_id,
        "Starting migration run"
    );

    let sse_tx = state.sse_tx.clone();
    let card_ids = req.card_ids;
    tokio::spawn(async move {
        let mut reporter = ProgressReporter::new(run_id, sse_tx);
        let report = MigrationService::new(&source_client, &target_client)
            .run(&card_ids, destination, &mut reporter)
            .await;

        tracing::info!(
            run_id = %run_id,
            migrated = report.migrated,
            total = report.total,
            fatal = report.fatal.as_deref(),
            "Migration run finished"
        );
    });

    Ok((StatusCode::ACCEPTED, Json(MigrationStarted { run_id, total })))
}
