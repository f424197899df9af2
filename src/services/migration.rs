use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Card, CardFile, MigrationError, MigrationMapping, MigrationTarget, NewCard};
use crate::kaiten::KaitenApi;

use super::progress::{ProgressLine, ProgressReporter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationStep {
    Fetch,
    Create,
    Tags,
    Checklists,
    Comments,
    Attachments,
}

impl fmt::Display for MigrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MigrationStep::Fetch => "fetch",
            MigrationStep::Create => "create",
            MigrationStep::Tags => "tags",
            MigrationStep::Checklists => "checklists",
            MigrationStep::Comments => "comments",
            MigrationStep::Attachments => "attachments",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepFailure {
    pub step: MigrationStep,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CardOutcome {
    pub source_card_id: i64,
    pub title: Option<String>,
    pub target_card_id: Option<i64>,
    pub failures: Vec<StepFailure>,
}

impl CardOutcome {
    fn new(source_card_id: i64) -> Self {
        Self {
            source_card_id,
            title: None,
            target_card_id: None,
            failures: Vec::new(),
        }
    }

    pub fn is_migrated(&self) -> bool {
        self.target_card_id.is_some()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub run_id: Uuid,
    pub total: usize,
    pub migrated: usize,
    pub cards: Vec<CardOutcome>,
    /// Set when the run stopped early; cards after the failing one were not attempted.
    pub fatal: Option<String>,
    pub log: Vec<ProgressLine>,
}

/// Copies cards from the source space into one destination column, one card
/// at a time. Reads go to `source` only, writes to `target` only.
pub struct MigrationService<'a> {
    source: &'a dyn KaitenApi,
    target: &'a dyn KaitenApi,
}

impl<'a> MigrationService<'a> {
    pub fn new(source: &'a dyn KaitenApi, target: &'a dyn KaitenApi) -> Self {
        Self { source, target }
    }

    pub async fn run(
        &self,
        card_ids: &[i64],
        destination: MigrationTarget,
        reporter: &mut ProgressReporter,
    ) -> MigrationReport {
        let total = card_ids.len();
        reporter.run_started(total);

        let mut cards = Vec::with_capacity(total);
        let mut fatal = None;

        for &card_id in card_ids {
            let mut outcome = CardOutcome::new(card_id);
            let result = self
                .migrate_card(card_id, destination, reporter, &mut outcome)
                .await;
            cards.push(outcome);

            if let Err(err) = result {
                reporter.error(
                    Some(card_id),
                    format!("Fatal error on card {card_id}, stopping the run: {err}"),
                );
                fatal = Some(err.to_string());
                break;
            }
        }

        let migrated = cards.iter().filter(|c| c.is_migrated()).count();
        reporter.run_finished(migrated, total, fatal.as_deref());

        MigrationReport {
            run_id: reporter.run_id(),
            total,
            migrated,
            cards,
            fatal,
            log: reporter.lines().to_vec(),
        }
    }

    /// Returns `Err` only for errors that must stop the whole run.
    async fn migrate_card(
        &self,
        card_id: i64,
        destination: MigrationTarget,
        reporter: &mut ProgressReporter,
        outcome: &mut CardOutcome,
    ) -> Result<(), MigrationError> {
        reporter.info(Some(card_id), format!("Starting card {card_id}"));

        let card = match self.source.get_card(card_id).await {
            Ok(card) => card,
            Err(err) => {
                return skip_card(reporter, outcome, MigrationStep::Fetch, err);
            }
        };
        outcome.title = Some(card.title.clone());

        let created = match self
            .target
            .create_card(&NewCard::from_source(&card, &destination))
            .await
        {
            Ok(created) => created,
            Err(err) => {
                return skip_card(reporter, outcome, MigrationStep::Create, err);
            }
        };

        let mapping = MigrationMapping {
            source_card_id: card.id,
            target_card_id: created.id,
        };
        outcome.target_card_id = Some(created.id);
        reporter.info(
            Some(card_id),
            format!("Created card {} for {:?}", created.id, card.title),
        );

        self.migrate_tags(mapping, reporter, outcome).await?;
        self.migrate_checklists(&card, mapping, reporter, outcome).await?;
        self.migrate_comments(mapping, reporter, outcome).await?;
        self.migrate_attachments(mapping, reporter, outcome).await?;

        if outcome.failures.is_empty() {
            reporter.success(Some(card_id), format!("Card {card_id} migrated: {}", card.title));
        } else {
            reporter.warning(
                Some(card_id),
                format!(
                    "Card {card_id} migrated with {} failed step(s): {}",
                    outcome.failures.len(),
                    card.title
                ),
            );
        }

        Ok(())
    }

    async fn migrate_tags(
        &self,
        mapping: MigrationMapping,
        reporter: &mut ProgressReporter,
        outcome: &mut CardOutcome,
    ) -> Result<(), MigrationError> {
        let tags = match self.source.list_tags(mapping.source_card_id).await {
            Ok(tags) => tags,
            Err(err) => return record_failure(reporter, outcome, MigrationStep::Tags, "tags", err),
        };

        let mut copied = 0;
        for tag in &tags {
            match self.target.add_tag(mapping.target_card_id, tag).await {
                Ok(()) => copied += 1,
                Err(err) => {
                    let what = format!("tag {:?}", tag.name);
                    record_failure(reporter, outcome, MigrationStep::Tags, &what, err)?;
                }
            }
        }

        report_step(reporter, mapping, "tags", copied, tags.len());
        Ok(())
    }

    async fn migrate_checklists(
        &self,
        card: &Card,
        mapping: MigrationMapping,
        reporter: &mut ProgressReporter,
        outcome: &mut CardOutcome,
    ) -> Result<(), MigrationError> {
        let total: usize = card.checklists.iter().map(|c| c.items.len()).sum();
        let mut copied = 0;

        for checklist in &card.checklists {
            let created = match self
                .target
                .create_checklist(mapping.target_card_id, &checklist.name)
                .await
            {
                Ok(created) => created,
                Err(err) => {
                    let what = format!("checklist {:?}", checklist.name);
                    record_failure(reporter, outcome, MigrationStep::Checklists, &what, err)?;
                    continue;
                }
            };

            for item in &checklist.items {
                match self
                    .target
                    .add_checklist_item(mapping.target_card_id, created.id, item)
                    .await
                {
                    Ok(()) => copied += 1,
                    Err(err) => {
                        let what = format!("checklist item {:?}", item.text);
                        record_failure(reporter, outcome, MigrationStep::Checklists, &what, err)?;
                    }
                }
            }
        }

        report_step(reporter, mapping, "checklist items", copied, total);
        Ok(())
    }

    async fn migrate_comments(
        &self,
        mapping: MigrationMapping,
        reporter: &mut ProgressReporter,
        outcome: &mut CardOutcome,
    ) -> Result<(), MigrationError> {
        let comments = match self.source.list_comments(mapping.source_card_id).await {
            Ok(comments) => comments,
            Err(err) => {
                return record_failure(reporter, outcome, MigrationStep::Comments, "comments", err)
            }
        };

        let mut copied = 0;
        for comment in &comments {
            match self
                .target
                .add_comment(mapping.target_card_id, &comment.migrated_text())
                .await
            {
                Ok(()) => copied += 1,
                Err(err) => {
                    let what = format!("comment by {}", comment.author_name());
                    record_failure(reporter, outcome, MigrationStep::Comments, &what, err)?;
                }
            }
        }

        report_step(reporter, mapping, "comments", copied, comments.len());
        Ok(())
    }

    async fn migrate_attachments(
        &self,
        mapping: MigrationMapping,
        reporter: &mut ProgressReporter,
        outcome: &mut CardOutcome,
    ) -> Result<(), MigrationError> {
        let files = match self.source.list_files(mapping.source_card_id).await {
            Ok(files) => files,
            Err(err) => {
                return record_failure(
                    reporter,
                    outcome,
                    MigrationStep::Attachments,
                    "attachments",
                    err,
                )
            }
        };

        let mut copied = 0;
        for file in &files {
            match self.transfer_file(mapping, file).await {
                Ok(bytes) => {
                    copied += 1;
                    tracing::debug!(
                        card_id = mapping.source_card_id,
                        file = file.name.as_str(),
                        bytes,
                        "Attachment transferred"
                    );
                }
                Err(err) => {
                    let what = format!("file {:?}", file.name);
                    record_failure(reporter, outcome, MigrationStep::Attachments, &what, err)?;
                }
            }
        }

        report_step(reporter, mapping, "attachments", copied, files.len());
        Ok(())
    }

    /// The temp file lives only for this call and is removed on drop, whether
    /// or not the upload succeeded.
    async fn transfer_file(
        &self,
        mapping: MigrationMapping,
        file: &CardFile,
    ) -> Result<u64, MigrationError> {
        let temp = tempfile::Builder::new()
            .prefix("kaiten-attachment-")
            .tempfile()?;

        let bytes = self.source.download_file(file, temp.path()).await?;
        self.target
            .upload_file(mapping.target_card_id, temp.path(), &file.name)
            .await?;

        Ok(bytes)
    }
}

fn skip_card(
    reporter: &mut ProgressReporter,
    outcome: &mut CardOutcome,
    step: MigrationStep,
    err: MigrationError,
) -> Result<(), MigrationError> {
    if err.is_fatal() {
        outcome.failures.push(StepFailure {
            step,
            message: err.to_string(),
        });
        return Err(err);
    }

    let card_id = outcome.source_card_id;
    let message = match step {
        MigrationStep::Fetch => format!("Skipping card {card_id}: could not read it: {err}"),
        _ => format!("Skipping card {card_id}: could not create it in the destination: {err}"),
    };
    reporter.error(Some(card_id), message);
    outcome.failures.push(StepFailure {
        step,
        message: err.to_string(),
    });
    Ok(())
}

/// Logs a non-fatal failure against the card and lets the caller carry on;
/// fatal errors are handed back to stop the run.
fn record_failure(
    reporter: &mut ProgressReporter,
    outcome: &mut CardOutcome,
    step: MigrationStep,
    what: &str,
    err: MigrationError,
) -> Result<(), MigrationError> {
    let card_id = outcome.source_card_id;
    outcome.failures.push(StepFailure {
        step,
        message: format!("{what}: {err}"),
    });

    if err.is_fatal() {
        return Err(err);
    }

    tracing::warn!(card_id, step = %step, error = %err, "Sub-resource migration failed");
    reporter.error(
        Some(card_id),
        format!("Card {card_id}: failed to migrate {what}: {err}"),
    );
    Ok(())
}

fn report_step(
    reporter: &mut ProgressReporter,
    mapping: MigrationMapping,
    what: &str,
    copied: usize,
    total: usize,
) {
    if total == 0 {
        return;
    }
    reporter.info(
        Some(mapping.source_card_id),
        format!("Migrated {copied} of {total} {what}"),
    );
}
