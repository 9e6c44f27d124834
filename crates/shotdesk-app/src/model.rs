// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::ids::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ShotStatus {
    NotStarted,
    InProgress,
    OnHold,
    Kickback,
    InReview,
    Approved,
    Final,
}

impl ShotStatus {
    /// Legend order.
    pub const ALL: [Self; 7] = [
        Self::NotStarted,
        Self::InProgress,
        Self::OnHold,
        Self::Kickback,
        Self::InReview,
        Self::Approved,
        Self::Final,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "Not Started",
            Self::InProgress => "In Progress",
            Self::OnHold => "On Hold",
            Self::Kickback => "Kickback",
            Self::InReview => "In Review",
            Self::Approved => "Approved",
            Self::Final => "Final",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Not Started" => Some(Self::NotStarted),
            "In Progress" => Some(Self::InProgress),
            "On Hold" => Some(Self::OnHold),
            "Kickback" => Some(Self::Kickback),
            "In Review" => Some(Self::InReview),
            "Approved" => Some(Self::Approved),
            "Final" => Some(Self::Final),
            _ => None,
        }
    }

    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let index = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(index + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl TryFrom<String> for ShotStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        // The server stores a NULL status as "".
        if value.trim().is_empty() {
            return Ok(Self::NotStarted);
        }
        Self::parse(&value).ok_or_else(|| format!("unknown shot status {value:?}"))
    }
}

impl From<ShotStatus> for String {
    fn from(value: ShotStatus) -> Self {
        value.as_str().to_owned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shot {
    pub id: ShotId,
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    pub code: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub reel: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub assigned_to: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub start_date: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub due_date: String,
    #[serde(default = "default_status")]
    pub status: ShotStatus,
    #[serde(default, deserialize_with = "nullable_string")]
    pub plate_path: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub mov_path: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub exr_path: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub version: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub nuke_path: String,
}

impl Shot {
    pub fn plate(&self) -> Option<&str> {
        present(&self.plate_path)
    }

    pub fn mov(&self) -> Option<&str> {
        present(&self.mov_path)
    }

    pub fn exr(&self) -> Option<&str> {
        present(&self.exr_path)
    }

    pub fn artist(&self) -> Option<&str> {
        present(&self.assigned_to)
    }

    /// Label used by the detail panel header.
    pub fn display_label(&self) -> String {
        if self.code.trim().is_empty() {
            format!("Shot {}", self.id)
        } else {
            self.code.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReelGroup {
    #[serde(default, deserialize_with = "lenient_reel")]
    pub reel: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub shot_id: ShotId,
    #[serde(default, deserialize_with = "nullable_string")]
    pub author: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub author_role: String,
    pub text: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub short: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub start_date: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub details_text: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub folder_path: String,
}

/// Fields of the project-creation form. The server derives the short code
/// from the name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct NewProject {
    pub name: String,
    pub start_date: String,
}

impl NewProject {
    pub fn new(name: impl Into<String>, start_date: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start_date: start_date.into(),
        }
    }

    /// Trimmed copy, or `None` when the name is blank.
    pub fn normalized(&self) -> Option<Self> {
        let name = self.name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self::new(name, self.start_date.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionInfo {
    pub logged_in: bool,
    #[serde(default, deserialize_with = "nullable_string")]
    pub username: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub role: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub display_name: String,
}

impl SessionInfo {
    pub fn label(&self) -> String {
        if self.logged_in {
            format!("{} ({})", self.username, self.role)
        } else {
            String::new()
        }
    }
}

/// Partial field set for a single-shot update.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ShotUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ShotStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
}

impl ShotUpdate {
    pub fn status(status: ShotStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn assigned_to(artist: impl Into<String>) -> Self {
        Self {
            assigned_to: Some(artist.into()),
            ..Self::default()
        }
    }
}

fn present(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn default_status() -> ShotStatus {
    ShotStatus::NotStarted
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Aggregate headers only label a group, so a numeric reel is kept as text
/// and anything else reads as empty.
fn lenient_reel<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(reel)) => reel,
        Some(Value::Number(reel)) => reel.to_string(),
        _ => String::new(),
    })
}

/// Counts that are not a non-negative number read as zero.
fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(count)) => count
            .as_u64()
            .or_else(|| {
                count
                    .as_f64()
                    .filter(|count| count.is_finite() && *count >= 0.0)
                    .map(|count| count as u64)
            })
            .unwrap_or(0),
        Some(Value::String(count)) => count.trim().parse().unwrap_or(0),
        _ => 0,
    })
}
