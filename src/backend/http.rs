//! HTTP backend implementation.

use async_trait::async_trait;
use log::debug;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use super::{Attachment, Backend, BackendError, NewNote, NoteEdit, RemoteTask, TaskPatch, TaskQuery};
use crate::constants::{
    API_NOTES_PATH, API_TASKS_PATH, ATTACHMENT_MIME, FIELD_CONTENT, FIELD_DELETE_IMAGES, FIELD_IMAGES,
    FIELD_NEW_IMAGES, FIELD_NOTE_ID, FIELD_TASK_ID,
};

/// Response envelope: `{ "status": ..., "data": ... }`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

/// Backend talking to the task server over HTTP.
pub struct HttpBackend {
    client: Client,
    base_url: String,
    auth_header: String,
}

impl HttpBackend {
    /// Create a backend for `base_url`, sending `auth_header` verbatim as `Authorization`.
    pub fn new(base_url: &str, auth_header: String, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_header,
        })
    }

    fn tasks_url(&self) -> String {
        format!("{}{}", self.base_url, API_TASKS_PATH)
    }

    fn task_url(&self, id: &str) -> String {
        format!("{}{}/{}", self.base_url, API_TASKS_PATH, id)
    }

    fn notes_url(&self) -> String {
        format!("{}{}", self.base_url, API_NOTES_PATH)
    }

    fn note_url(&self, id: &str) -> String {
        format!("{}{}/{}", self.base_url, API_NOTES_PATH, id)
    }

    /// Send a request and classify the outcome.
    async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = request
            .header(AUTHORIZATION, &self.auth_header)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let status = response.status();
        debug!("{} {}", status.as_u16(), response.url());
        if status.is_success() {
            Ok(response)
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(BackendError::Http {
                status: status.as_u16(),
                message,
            })
        }
    }

    /// Read an enveloped JSON payload.
    async fn read_data<T: DeserializeOwned>(response: Response) -> Result<Option<T>, BackendError> {
        let body = response.bytes().await.map_err(|e| BackendError::Network(e.to_string()))?;
        let envelope: Envelope<T> =
            serde_json::from_slice(&body).map_err(|e| BackendError::InvalidData(e.to_string()))?;
        Ok(envelope.data)
    }

    fn image_part(attachment: &Attachment) -> Result<Part, BackendError> {
        Part::bytes(attachment.bytes.clone())
            .file_name(attachment.filename.clone())
            .mime_str(ATTACHMENT_MIME)
            .map_err(|e| BackendError::InvalidData(e.to_string()))
    }
}

#[async_trait]
impl Backend for HttpBackend {
    fn backend_type(&self) -> &str {
        "http"
    }

    async fn fetch_tasks(&self, query: &TaskQuery) -> Result<Vec<RemoteTask>, BackendError> {
        let request = self.client.get(self.tasks_url()).query(&query.to_query_pairs());
        let response = self.send(request).await?;
        Ok(Self::read_data(response).await?.unwrap_or_default())
    }

    async fn fetch_task(&self, id: &str) -> Result<RemoteTask, BackendError> {
        let response = self.send(self.client.get(self.task_url(id))).await?;
        Self::read_data(response)
            .await?
            .ok_or_else(|| BackendError::InvalidData(format!("Task {id} missing from response")))
    }

    async fn create_task(&self, task: &RemoteTask) -> Result<(), BackendError> {
        self.send(self.client.post(self.tasks_url()).json(task)).await?;
        Ok(())
    }

    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<(), BackendError> {
        self.send(self.client.put(self.task_url(id)).json(patch)).await?;
        Ok(())
    }

    async fn delete_task(&self, id: &str) -> Result<(), BackendError> {
        self.send(self.client.delete(self.task_url(id))).await?;
        Ok(())
    }

    async fn create_note(&self, note: &NewNote) -> Result<(), BackendError> {
        let mut form = Form::new()
            .text(FIELD_TASK_ID, note.task_id.clone())
            .text(FIELD_CONTENT, note.content.clone())
            .text(FIELD_NOTE_ID, note.id.clone());
        for attachment in &note.attachments {
            form = form.part(FIELD_IMAGES, Self::image_part(attachment)?);
        }

        self.send(self.client.post(self.notes_url()).multipart(form)).await?;
        Ok(())
    }

    async fn update_note(&self, id: &str, edit: &NoteEdit) -> Result<(), BackendError> {
        let mut form = Form::new();
        if let Some(content) = &edit.content {
            form = form.text(FIELD_CONTENT, content.clone());
        }
        for attachment in &edit.new_attachments {
            form = form.part(FIELD_NEW_IMAGES, Self::image_part(attachment)?);
        }
        for name in &edit.deleted_attachments {
            form = form.text(FIELD_DELETE_IMAGES, name.clone());
        }

        self.send(self.client.put(self.note_url(id)).multipart(form)).await?;
        Ok(())
    }

    async fn delete_note(&self, id: &str) -> Result<(), BackendError> {
        self.send(self.client.delete(self.note_url(id))).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answer exactly one request with a canned response; returns the base URL.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 64 * 1024];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}")
    }

    fn backend(base_url: &str) -> HttpBackend {
        HttpBackend::new(base_url, "Basic dGVzdDp0ZXN0".to_string(), Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn test_urls_ignore_trailing_slash() {
        let backend = backend("http://nas.local:5000/");
        assert_eq!(backend.tasks_url(), "http://nas.local:5000/api/tasks");
        assert_eq!(backend.task_url("abc"), "http://nas.local:5000/api/tasks/abc");
        assert_eq!(backend.notes_url(), "http://nas.local:5000/api/notes");
        assert_eq!(backend.note_url("n1"), "http://nas.local:5000/api/notes/n1");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let backend = backend(&format!("http://{addr}"));
        let err = backend.delete_task("abc").await.unwrap_err();
        assert!(err.is_network(), "expected network error, got {err:?}");
        assert_eq!(err.status(), None);
    }

    #[tokio::test]
    async fn test_conflict_status_is_classified() {
        let url = serve_once("409 CONFLICT", r#"{"error":"Task ID already exists"}"#).await;
        let task = RemoteTask {
            id: "t-1".to_string(),
            title: "Dup".to_string(),
            category: None,
            content: None,
            priority: None,
            start_date: None,
            due_date: None,
            is_archived: None,
            completed: false,
            completed_at: None,
            created_at: None,
            updated_at: None,
            notes: None,
        };

        let err = backend(&url).create_task(&task).await.unwrap_err();
        assert_eq!(err.status(), Some(409));
    }

    #[tokio::test]
    async fn test_fetch_tasks_reads_envelope() {
        let url = serve_once(
            "200 OK",
            r#"{"status":"success","data":[{"id":"a","title":"One","completed":false,"notes":[{"id":"n","content":"hi","images":[],"images_info":[]}]}]}"#,
        )
        .await;

        let tasks = backend(&url).fetch_tasks(&TaskQuery::default()).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, "a");
        assert_eq!(tasks[0].notes.as_ref().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_undecodable_body_is_invalid_data() {
        let url = serve_once("200 OK", "not json").await;
        let err = backend(&url).fetch_task("a").await.unwrap_err();
        assert!(matches!(err, BackendError::InvalidData(_)));
    }
}
