use std::path::Path;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

use crate::domain::{
    Board, Card, CardFile, ChecklistItem, Comment, Created, MigrationError, NewCard, Space, Tag,
};

use super::KaitenApi;

/// Markdown, as the web UI renders it.
const TEXT_FORMAT_MARKDOWN: i64 = 1;

#[derive(Clone)]
pub struct KaitenClient {
    base_url: String,
    token: String,
    http_client: reqwest::Client,
}

impl KaitenClient {
    pub fn new(space: &Space, scheme: &str, http_client: reqwest::Client) -> Self {
        Self::with_base_url(space.base_url(scheme), &space.token, http_client)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        token: &str,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.to_string(),
            http_client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));
        tracing::debug!(method = %method, url = url.as_str(), "Kaiten request");
        self.http_client.request(method, url).bearer_auth(&self.token)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, i64)],
    ) -> Result<T, MigrationError> {
        let response = self.request(Method::GET, endpoint).query(query).send().await?;
        let response = check_status(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, MigrationError> {
        let response = self.request(Method::POST, endpoint).json(body).send().await?;
        let response = check_status(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// File URLs are usually absolute, but relative ones resolve against the
    /// workspace host.
    fn resolve_file_url(&self, raw: &str) -> Result<Url, MigrationError> {
        let base = Url::parse(&self.base_url)
            .map_err(|e| MigrationError::Internal(format!("invalid base URL {}: {e}", self.base_url)))?;
        base.join(raw)
            .map_err(|e| MigrationError::Validation(format!("invalid file URL {raw:?}: {e}")))
    }
}

/// Turns any non-2xx response into an error carrying its status and body.
async fn check_status(response: Response) -> Result<Response, MigrationError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(
        status = status.as_u16(),
        url = url.as_str(),
        body = body.as_str(),
        "Kaiten request failed"
    );
    Err(MigrationError::from_status(status.as_u16(), body))
}

#[async_trait]
impl KaitenApi for KaitenClient {
    async fn list_boards(&self, space_id: i64) -> Result<Vec<Board>, MigrationError> {
        self.get_json(&format!("spaces/{space_id}/boards"), &[]).await
    }

    async fn list_cards(
        &self,
        space_id: i64,
        board_id: i64,
        column_id: i64,
    ) -> Result<Vec<Card>, MigrationError> {
        self.get_json(
            "cards",
            &[
                ("space_id", space_id),
                ("board_id", board_id),
                ("column_id", column_id),
            ],
        )
        .await
    }

    async fn get_card(&self, card_id: i64) -> Result<Card, MigrationError> {
        self.get_json(&format!("cards/{card_id}"), &[]).await
    }

    async fn list_tags(&self, card_id: i64) -> Result<Vec<Tag>, MigrationError> {
        self.get_json(&format!("cards/{card_id}/tags"), &[]).await
    }

    async fn list_comments(&self, card_id: i64) -> Result<Vec<Comment>, MigrationError> {
        self.get_json(&format!("cards/{card_id}/comments"), &[]).await
    }

    async fn list_files(&self, card_id: i64) -> Result<Vec<CardFile>, MigrationError> {
        self.get_json(&format!("cards/{card_id}/files"), &[]).await
    }

    async fn download_file(&self, file: &CardFile, dest: &Path) -> Result<u64, MigrationError> {
        let url = self.resolve_file_url(&file.url)?;
        tracing::debug!(url = %url, file = file.name.as_str(), "Downloading attachment");

        let response = self
            .http_client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        // A refused download fails this attachment only, whatever the status.
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                status = status.as_u16(),
                file = file.name.as_str(),
                body = body.as_str(),
                "Attachment download failed"
            );
            return Err(MigrationError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let mut out = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            out.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        out.flush().await?;

        Ok(written)
    }

    async fn create_card(&self, card: &NewCard) -> Result<Created, MigrationError> {
        self.post_json("cards", card).await
    }

    async fn add_tag(&self, card_id: i64, tag: &Tag) -> Result<(), MigrationError> {
        let _: Value = self
            .post_json(
                &format!("cards/{card_id}/tags"),
                &json!({ "name": tag.name, "color": tag.color }),
            )
            .await?;
        Ok(())
    }

    async fn create_checklist(&self, card_id: i64, name: &str) -> Result<Created, MigrationError> {
        self.post_json(&format!("cards/{card_id}/checklists"), &json!({ "name": name }))
            .await
    }

    async fn add_checklist_item(
        &self,
        card_id: i64,
        checklist_id: i64,
        item: &ChecklistItem,
    ) -> Result<(), MigrationError> {
        let _: Value = self
            .post_json(
                &format!("cards/{card_id}/checklists/{checklist_id}/items"),
                item,
            )
            .await?;
        Ok(())
    }

    async fn add_comment(&self, card_id: i64, text: &str) -> Result<(), MigrationError> {
        let _: Value = self
            .post_json(
                &format!("cards/{card_id}/comments"),
                &json!({ "text": text, "text_format_type_id": TEXT_FORMAT_MARKDOWN }),
            )
            .await?;
        Ok(())
    }

    async fn upload_file(
        &self,
        card_id: i64,
        path: &Path,
        file_name: &str,
    ) -> Result<(), MigrationError> {
        let file = tokio::fs::File::open(path).await?;
        let length = file.metadata().await?.len();
        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
        let part = Part::stream_with_length(body, length)
            .file_name(file_name.to_string())
            .mime_str("application/octet-stream")?;
        let form = Form::new().part("file", part);

        let response = self
            .request(Method::POST, &format!("cards/{card_id}/files"))
            .multipart(form)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}
