// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use shotdesk_app::{
    Comment, CommentId, NewProject, Project, ProjectId, RosterError, RosterQuery, RosterResult,
    SessionInfo, Shot, ShotId, ShotUpdate, classify, decode_shots, thumbnail_path,
};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Blocking client for the shot-tracking REST API. Cheap to clone; worker
/// threads each take their own copy.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("server.base_url must not be empty");
        }
        Url::parse(&base_url)
            .with_context(|| format!("server.base_url {base_url:?} is not a valid URL"))?;

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Absolute URL for a server-relative path such as an export link.
    pub fn resolve(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn thumbnail_url(&self, shot_id: ShotId) -> String {
        self.resolve(&thumbnail_path(shot_id))
    }

    pub fn session(&self) -> Result<SessionInfo, RosterError> {
        self.get_json("/api/session", "session")
    }

    pub fn list_projects(&self) -> Result<Vec<Project>, RosterError> {
        self.get_json("/api/projects", "project list")
    }

    /// Creates a project. Needs an admin or producer session.
    pub fn create_project(&self, project: &NewProject) -> Result<Project, RosterError> {
        let request = self.http.post(self.resolve("/api/projects")).json(project);
        decode(self.send(request)?, "new project")
    }

    pub fn get_project(&self, project_id: ProjectId) -> Result<Project, RosterError> {
        self.get_json(&format!("/api/projects/{project_id}"), "project")
    }

    /// Roster for the query's project, tagged flat or grouped.
    pub fn list_shots(&self, query: &RosterQuery) -> Result<RosterResult, RosterError> {
        let payload: Value = self.get_json(&query.shots_path(), "roster")?;
        classify(payload)
    }

    /// Child rows of one reel group. Always a flat list.
    pub fn list_group(&self, query: &RosterQuery) -> Result<Vec<Shot>, RosterError> {
        let payload: Value = self.get_json(&query.shots_path(), "reel group")?;
        decode_shots(payload)
    }

    pub fn get_shot(&self, shot_id: ShotId) -> Result<Shot, RosterError> {
        self.get_json(&format!("/api/shots/{shot_id}"), "shot")
    }

    pub fn update_shot(&self, shot_id: ShotId, update: &ShotUpdate) -> Result<Shot, RosterError> {
        let request = self
            .http
            .put(self.resolve(&format!("/api/shots/{shot_id}")))
            .json(update);
        decode(self.send(request)?, "updated shot")
    }

    pub fn delete_shot(&self, shot_id: ShotId) -> Result<(), RosterError> {
        let request = self
            .http
            .delete(self.resolve(&format!("/api/shots/{shot_id}")));
        self.send(request)?;
        Ok(())
    }

    /// Deletes every id in one request and returns the server's count.
    pub fn bulk_delete(&self, ids: &[ShotId]) -> Result<u64, RosterError> {
        if ids.is_empty() {
            return Err(RosterError::validation("nothing selected"));
        }
        let request = self
            .http
            .post(self.resolve("/api/shots/bulk_delete"))
            .json(&json!({ "ids": ids }));
        let parsed: BulkDeleteResponse = decode(self.send(request)?, "bulk delete result")?;
        Ok(parsed.deleted)
    }

    pub fn list_comments(&self, shot_id: ShotId) -> Result<Vec<Comment>, RosterError> {
        self.get_json(&format!("/api/shots/{shot_id}/comments"), "comment list")
    }

    pub fn add_comment(&self, shot_id: ShotId, text: &str) -> Result<Comment, RosterError> {
        let request = self
            .http
            .post(self.resolve(&format!("/api/shots/{shot_id}/comments")))
            .json(&json!({ "text": text }));
        decode(self.send(request)?, "new comment")
    }

    pub fn update_comment(&self, comment_id: CommentId, text: &str) -> Result<Comment, RosterError> {
        let request = self
            .http
            .put(self.resolve(&format!("/api/comments/{comment_id}")))
            .json(&json!({ "text": text }));
        decode(self.send(request)?, "updated comment")
    }

    pub fn delete_comment(&self, comment_id: CommentId) -> Result<(), RosterError> {
        let request = self
            .http
            .delete(self.resolve(&format!("/api/comments/{comment_id}")));
        self.send(request)?;
        Ok(())
    }

    /// Tool (Nuke) script path, or `None` when the server has none
    /// configured for the shot.
    pub fn nuke_path(&self, shot_id: ShotId) -> Result<Option<String>, RosterError> {
        let response = self
            .http
            .get(self.resolve(&format!("/api/shots/{shot_id}/nuke_path")))
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let parsed: PathResponse = decode(check_status(response)?, "nuke path")?;
        Ok(parsed.path.filter(|path| !path.trim().is_empty()))
    }

    /// Asks the server to create a composite script. Returns its path.
    pub fn generate_comp(&self, shot_id: ShotId) -> Result<String, RosterError> {
        let request = self
            .http
            .post(self.resolve(&format!("/api/shots/{shot_id}/generate_comp")));
        let parsed: PathResponse = decode(self.send(request)?, "generated composite")?;
        parsed
            .path
            .filter(|path| !path.trim().is_empty())
            .ok_or_else(|| RosterError::parse("composite response has no path"))
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, what: &str) -> Result<T, RosterError> {
        debug!(path, "GET");
        decode(self.send(self.http.get(self.resolve(path)))?, what)
    }

    fn send(&self, request: RequestBuilder) -> Result<Response, RosterError> {
        let response = request
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;
        check_status(response)
    }
}

#[derive(Debug, Deserialize)]
struct BulkDeleteResponse {
    #[serde(default)]
    deleted: u64,
}

#[derive(Debug, Deserialize)]
struct PathResponse {
    #[serde(default)]
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<String>,
    detail: Option<String>,
}

fn check_status(response: Response) -> Result<Response, RosterError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(clean_error_response(status, &body))
}

fn decode<T: DeserializeOwned>(response: Response, what: &str) -> Result<T, RosterError> {
    let body = response
        .text()
        .map_err(|error| RosterError::network(None, format!("read {what}: {error}")))?;
    serde_json::from_str(&body).map_err(|error| RosterError::parse(format!("{what}: {error}")))
}

fn connection_error(base_url: &str, error: reqwest::Error) -> RosterError {
    RosterError::network(
        None,
        format!("cannot reach {base_url} -- is the shot server running? ({error})"),
    )
}

fn clean_error_response(status: StatusCode, body: &str) -> RosterError {
    let code = Some(status.as_u16());
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(error) = parsed.error
        && !error.is_empty()
    {
        let message = match parsed.detail {
            Some(detail) if !detail.is_empty() => format!("{error} ({detail})"),
            _ => error,
        };
        return RosterError::network(code, message);
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() && trimmed.len() < 100 && !trimmed.contains('<') {
        return RosterError::network(code, trimmed);
    }

    RosterError::network(
        code,
        status.canonical_reason().unwrap_or("request failed"),
    )
}
