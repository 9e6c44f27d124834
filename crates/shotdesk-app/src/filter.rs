// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::ShotStatus;

/// Scalar filter dimensions. Each maps to one optional query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    Reel,
    Version,
    Code,
    Artist,
    Due,
}

impl FilterField {
    pub const ALL: [Self; 5] = [
        Self::Reel,
        Self::Version,
        Self::Code,
        Self::Artist,
        Self::Due,
    ];

    pub const fn query_key(self) -> &'static str {
        match self {
            Self::Reel => "reel",
            Self::Version => "version",
            Self::Code => "code",
            Self::Artist => "artist",
            Self::Due => "due",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Reel => "Reel",
            Self::Version => "Version",
            Self::Code => "Code",
            Self::Artist => "Artist",
            Self::Due => "Due",
        }
    }

    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupMode {
    #[default]
    Flat,
    Reel,
}

impl GroupMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Flat => "none",
            Self::Reel => "reel",
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            Self::Flat => Self::Reel,
            Self::Reel => Self::Flat,
        }
    }
}

/// Active query dimensions. Empty strings and an empty status set mean
/// "no constraint".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    pub reel: String,
    pub version: String,
    pub code: String,
    pub artist: String,
    pub due: String,
    statuses: Vec<ShotStatus>,
    pub group: GroupMode,
}

impl FilterState {
    pub fn field(&self, field: FilterField) -> &str {
        match field {
            FilterField::Reel => &self.reel,
            FilterField::Version => &self.version,
            FilterField::Code => &self.code,
            FilterField::Artist => &self.artist,
            FilterField::Due => &self.due,
        }
    }

    pub fn set_field(&mut self, field: FilterField, value: impl Into<String>) {
        let slot = match field {
            FilterField::Reel => &mut self.reel,
            FilterField::Version => &mut self.version,
            FilterField::Code => &mut self.code,
            FilterField::Artist => &mut self.artist,
            FilterField::Due => &mut self.due,
        };
        *slot = value.into();
    }

    /// Selected statuses in the order they were turned on.
    pub fn statuses(&self) -> &[ShotStatus] {
        &self.statuses
    }

    pub fn has_status(&self, status: ShotStatus) -> bool {
        self.statuses.contains(&status)
    }

    /// Flips membership and returns whether the status is now active.
    pub fn toggle_status(&mut self, status: ShotStatus) -> bool {
        if let Some(index) = self.statuses.iter().position(|s| *s == status) {
            self.statuses.remove(index);
            false
        } else {
            self.statuses.push(status);
            true
        }
    }

    pub fn select_all_statuses(&mut self) {
        for status in ShotStatus::ALL {
            if !self.statuses.contains(&status) {
                self.statuses.push(status);
            }
        }
    }

    pub fn clear_statuses(&mut self) {
        self.statuses.clear();
    }

    /// Resets every scalar and the status set. Grouping is a view mode and
    /// stays as it is.
    pub fn clear_all(&mut self) {
        for field in FilterField::ALL {
            self.set_field(field, String::new());
        }
        self.statuses.clear();
    }

    pub fn set_group_mode(&mut self, mode: GroupMode) {
        self.group = mode;
    }

    /// Whether a row with this status survives the client-side re-filter.
    pub fn admits(&self, status: ShotStatus) -> bool {
        self.statuses.is_empty() || self.has_status(status)
    }

    pub fn apply(&mut self, edit: FilterEdit) {
        match edit {
            FilterEdit::ToggleStatus(status) => {
                self.toggle_status(status);
            }
            FilterEdit::SelectAllStatuses => self.select_all_statuses(),
            FilterEdit::ClearStatuses => self.clear_statuses(),
            FilterEdit::SetField(field, value) => self.set_field(field, value),
            FilterEdit::SetGroupMode(mode) => self.set_group_mode(mode),
            FilterEdit::ClearAll => self.clear_all(),
        }
    }
}

/// One filter mutation, used to batch several edits behind a single fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterEdit {
    ToggleStatus(ShotStatus),
    SelectAllStatuses,
    ClearStatuses,
    SetField(FilterField, String),
    SetGroupMode(GroupMode),
    ClearAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegendEntry {
    pub status: ShotStatus,
    pub active: bool,
}

/// Legend highlight, always recomputed from the status set.
pub fn legend(filters: &FilterState) -> Vec<LegendEntry> {
    ShotStatus::ALL
        .iter()
        .map(|status| LegendEntry {
            status: *status,
            active: filters.has_status(*status),
        })
        .collect()
}

pub fn highlighted(entries: &[LegendEntry]) -> Vec<ShotStatus> {
    entries
        .iter()
        .filter(|entry| entry.active)
        .map(|entry| entry.status)
        .collect()
}
