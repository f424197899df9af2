//! Access to a Kaiten workspace over its REST API.
//!
//! The migration only ever talks to Kaiten through [`KaitenApi`], so the
//! orchestrator can be driven by the HTTP client in production and by an
//! in-memory fake in tests.

pub mod client;

use std::path::Path;

use async_trait::async_trait;

use crate::domain::{
    Board, Card, CardFile, ChecklistItem, Comment, Created, MigrationError, NewCard, Tag,
};

pub use client::KaitenClient;

#[async_trait]
pub trait KaitenApi: Send + Sync {
    // ── Reads ──────────────────────────────────────────────────

    /// Boards of a space, each with its columns and lanes embedded.
    async fn list_boards(&self, space_id: i64) -> Result<Vec<Board>, MigrationError>;

    async fn list_cards(
        &self,
        space_id: i64,
        board_id: i64,
        column_id: i64,
    ) -> Result<Vec<Card>, MigrationError>;

    /// Full card detail, including checklists.
    async fn get_card(&self, card_id: i64) -> Result<Card, MigrationError>;

    async fn list_tags(&self, card_id: i64) -> Result<Vec<Tag>, MigrationError>;

    async fn list_comments(&self, card_id: i64) -> Result<Vec<Comment>, MigrationError>;

    async fn list_files(&self, card_id: i64) -> Result<Vec<CardFile>, MigrationError>;

    /// Streams the attachment body into `dest`, returning the byte count.
    async fn download_file(&self, file: &CardFile, dest: &Path) -> Result<u64, MigrationError>;

    // ── Writes ─────────────────────────────────────────────────

    async fn create_card(&self, card: &NewCard) -> Result<Created, MigrationError>;

    async fn add_tag(&self, card_id: i64, tag: &Tag) -> Result<(), MigrationError>;

    async fn create_checklist(&self, card_id: i64, name: &str) -> Result<Created, MigrationError>;

    async fn add_checklist_item(
        &self,
        card_id: i64,
        checklist_id: i64,
        item: &ChecklistItem,
    ) -> Result<(), MigrationError>;

    async fn add_comment(&self, card_id: i64, text: &str) -> Result<(), MigrationError>;

    async fn upload_file(
        &self,
        card_id: i64,
        path: &Path,
        file_name: &str,
    ) -> Result<(), MigrationError>;
}
