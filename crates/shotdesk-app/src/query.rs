// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use url::form_urlencoded;

use crate::{FilterField, FilterState, GroupMode, ProjectId, RosterError};

/// A roster request for one project, as ordered query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterQuery {
    pub project: ProjectId,
    pub params: Vec<(String, String)>,
}

impl RosterQuery {
    fn new(project: ProjectId) -> Self {
        Self {
            project,
            params: Vec::new(),
        }
    }

    fn push(&mut self, key: &str, value: &str) {
        self.params.push((key.to_owned(), value.to_owned()));
    }

    pub fn values(&self, key: &str) -> Vec<&str> {
        self.params
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Form-urlencoded parameters without the leading `?`.
    pub fn query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.params {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }

    /// Path and query relative to the API root.
    pub fn shots_path(&self) -> String {
        with_query(format!("/api/projects/{}/shots", self.project), self)
    }

    pub fn export_path(&self) -> String {
        with_query(format!("/api/projects/{}/export_csv", self.project), self)
    }
}

fn with_query(path: String, query: &RosterQuery) -> String {
    if query.is_empty() {
        path
    } else {
        format!("{path}?{}", query.query_string())
    }
}

/// Maps the filter state to the roster query. Values are trimmed but never
/// case folded; matching is the server's business.
pub fn build_query(
    project: Option<ProjectId>,
    filters: &FilterState,
) -> Result<RosterQuery, RosterError> {
    let project = require_project(project)?;
    let mut query = RosterQuery::new(project);
    for field in FilterField::ALL {
        let value = filters.field(field).trim();
        if !value.is_empty() {
            query.push(field.query_key(), value);
        }
    }
    for status in filters.statuses() {
        query.push("status", status.as_str());
    }
    if filters.group == GroupMode::Reel {
        query.push("group_by", GroupMode::Reel.as_str());
    }
    Ok(query)
}

/// Child rows of one reel group.
pub fn build_group_query(project: ProjectId, reel: &str) -> RosterQuery {
    let mut query = RosterQuery::new(project);
    query.push(FilterField::Reel.query_key(), reel);
    query
}

/// CSV export carries the status set plus the reel and code filters.
pub fn build_export_query(
    project: Option<ProjectId>,
    filters: &FilterState,
) -> Result<RosterQuery, RosterError> {
    let project = require_project(project)?;
    let mut query = RosterQuery::new(project);
    for status in filters.statuses() {
        query.push("status", status.as_str());
    }
    for field in [FilterField::Reel, FilterField::Code] {
        let value = filters.field(field).trim();
        if !value.is_empty() {
            query.push(field.query_key(), value);
        }
    }
    Ok(query)
}

fn require_project(project: Option<ProjectId>) -> Result<ProjectId, RosterError> {
    project.ok_or_else(|| RosterError::validation("select a project"))
}
