// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeSet;

use serde_json::Value;
use tracing::warn;
use url::Url;

use crate::{FilterState, ReelGroup, RosterError, Shot, ShotId};

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];
const VIDEO_EXTENSIONS: [&str; 2] = ["mp4", "mov"];

/// A decoded roster payload. The server does not tag the two shapes, so
/// the tag is assigned once here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterResult {
    Flat(Vec<Shot>),
    Grouped(Vec<ReelGroup>),
}

pub fn classify(payload: Value) -> Result<RosterResult, RosterError> {
    let Value::Array(items) = payload else {
        return Err(RosterError::parse("expected a JSON array of shots"));
    };

    let grouped = items
        .first()
        .and_then(Value::as_object)
        .is_some_and(|first| first.contains_key("reel") && first.contains_key("count"));

    if grouped {
        Ok(RosterResult::Grouped(decode_groups(items)))
    } else {
        decode_shots(Value::Array(items)).map(RosterResult::Flat)
    }
}

/// Once the first element marks the payload as grouped it stays grouped.
/// Elements that are not aggregate objects are skipped.
fn decode_groups(items: Vec<Value>) -> Vec<ReelGroup> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| {
            if !item.is_object() {
                warn!(index, "skipping reel group that is not an object");
                return None;
            }
            serde_json::from_value::<ReelGroup>(item)
                .inspect_err(|error| warn!(index, %error, "skipping undecodable reel group"))
                .ok()
        })
        .collect()
}

pub fn decode_shots(payload: Value) -> Result<Vec<Shot>, RosterError> {
    let Value::Array(items) = payload else {
        return Err(RosterError::parse("expected a JSON array of shots"));
    };
    items
        .into_iter()
        .map(|item| {
            serde_json::from_value::<Shot>(item)
                .map_err(|error| RosterError::parse(format!("shot: {error}")))
        })
        .collect()
}

/// Explicit reel wins; otherwise the second `_` token of the code.
pub fn derive_reel(reel: &str, code: &str) -> String {
    let explicit = reel.trim();
    if !explicit.is_empty() {
        return explicit.to_owned();
    }
    code.split('_').nth(1).unwrap_or_default().to_owned()
}

fn extension(path: &str) -> Option<String> {
    let (_, ext) = path.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

pub fn is_image_path(path: &str) -> bool {
    extension(path).is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

pub fn is_video_path(path: &str) -> bool {
    extension(path).is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
}

pub fn thumbnail_path(id: ShotId) -> String {
    format!("/api/shot_thumb/{id}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThumbCell {
    Image { url: String },
    Play { path: String },
    Open { path: String },
    Missing,
}

impl ThumbCell {
    pub fn for_shot(shot: &Shot) -> Self {
        match shot.plate() {
            None => Self::Missing,
            Some(path) if is_image_path(path) => Self::Image {
                url: thumbnail_path(shot.id),
            },
            Some(path) if is_video_path(path) => Self::Play {
                path: path.to_owned(),
            },
            Some(path) => Self::Open {
                path: path.to_owned(),
            },
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Image { .. } => "▣",
            Self::Play { .. } => "▶",
            Self::Open { .. } | Self::Missing => "□",
        }
    }

    pub fn enabled(&self) -> bool {
        !matches!(self, Self::Missing)
    }
}

/// One rendered roster row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterRow {
    pub shot: Shot,
    pub reel: String,
    pub thumb: ThumbCell,
}

impl RosterRow {
    pub fn new(shot: Shot) -> Self {
        let reel = derive_reel(&shot.reel, &shot.code);
        let thumb = ThumbCell::for_shot(&shot);
        Self { shot, reel, thumb }
    }

    pub fn id(&self) -> ShotId {
        self.shot.id
    }
}

/// Rows that survive the client-side status re-filter.
pub fn project_rows(shots: Vec<Shot>, filters: &FilterState) -> Vec<RosterRow> {
    shots
        .into_iter()
        .filter(|shot| filters.admits(shot.status))
        .map(RosterRow::new)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupView {
    pub reel: String,
    pub count: u64,
    /// `None` until the group's own fetch resolves.
    pub rows: Option<Vec<RosterRow>>,
}

impl GroupView {
    pub fn header(&self) -> String {
        let reel = if self.reel.is_empty() {
            "(empty)"
        } else {
            self.reel.as_str()
        };
        format!("Reel: {reel} ({} shots)", self.count)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RosterView {
    #[default]
    Empty,
    Flat(Vec<RosterRow>),
    Grouped(Vec<GroupView>),
}

impl RosterView {
    pub fn grouped(groups: Vec<ReelGroup>) -> Self {
        Self::Grouped(
            groups
                .into_iter()
                .map(|group| GroupView {
                    reel: group.reel,
                    count: group.count,
                    rows: None,
                })
                .collect(),
        )
    }

    /// Every row currently on screen, in display order.
    pub fn rows(&self) -> Vec<&RosterRow> {
        match self {
            Self::Empty => Vec::new(),
            Self::Flat(rows) => rows.iter().collect(),
            Self::Grouped(groups) => groups
                .iter()
                .filter_map(|group| group.rows.as_ref())
                .flatten()
                .collect(),
        }
    }

    pub fn row(&self, id: ShotId) -> Option<&RosterRow> {
        self.rows().into_iter().find(|row| row.id() == id)
    }

    pub fn row_mut(&mut self, id: ShotId) -> Option<&mut RosterRow> {
        match self {
            Self::Empty => None,
            Self::Flat(rows) => rows.iter_mut().find(|row| row.id() == id),
            Self::Grouped(groups) => groups
                .iter_mut()
                .filter_map(|group| group.rows.as_mut())
                .flatten()
                .find(|row| row.id() == id),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows().len()
    }

    /// Attaches child rows to the group at `index`. Returns false when the
    /// view no longer has such a group.
    pub fn attach_group(&mut self, index: usize, reel: &str, rows: Vec<RosterRow>) -> bool {
        let Self::Grouped(groups) = self else {
            return false;
        };
        match groups.get_mut(index) {
            Some(group) if group.reel == reel => {
                group.rows = Some(rows);
                true
            }
            _ => false,
        }
    }
}

/// Option lists for the reel and artist filter pickers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterOptions {
    pub reels: Vec<String>,
    pub artists: Vec<String>,
}

impl FilterOptions {
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a RosterRow>) -> Self {
        let mut reels = BTreeSet::new();
        let mut artists = BTreeSet::new();
        for row in rows {
            if !row.reel.is_empty() {
                reels.insert(row.reel.clone());
            }
            if let Some(artist) = row.shot.artist() {
                artists.insert(artist.to_owned());
            }
        }
        Self {
            reels: reels.into_iter().collect(),
            artists: artists.into_iter().collect(),
        }
    }
}

/// Normalizes a filesystem path or URL into something a launcher can open.
/// URLs pass through; paths become percent-encoded `file://` URLs.
pub fn open_target(path: &str) -> String {
    let path = path.trim();
    let lower = path.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("file://")
    {
        return path.to_owned();
    }
    let normalized = path.replace('\\', "/");
    // Drive-letter and relative paths hang off the root like absolute ones.
    let rooted = if normalized.starts_with('/') {
        normalized
    } else {
        format!("/{normalized}")
    };
    match Url::parse("file:///") {
        Ok(mut url) => {
            url.set_path(&rooted);
            url.into()
        }
        Err(_) => format!("file://{rooted}"),
    }
}
