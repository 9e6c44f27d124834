// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;

use anyhow::Result;
use tracing::warn;

pub const MIN_COLUMN_WIDTH: u16 = 3;
pub const MAX_COLUMN_WIDTH: u16 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RosterColumn {
    Select,
    Thumb,
    Code,
    Reel,
    Version,
    Artist,
    Due,
    Status,
    Mov,
    Exr,
    Tool,
    Actions,
}

impl RosterColumn {
    pub const ALL: [Self; 12] = [
        Self::Select,
        Self::Thumb,
        Self::Code,
        Self::Reel,
        Self::Version,
        Self::Artist,
        Self::Due,
        Self::Status,
        Self::Mov,
        Self::Exr,
        Self::Tool,
        Self::Actions,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Thumb => "thumb",
            Self::Code => "code",
            Self::Reel => "reel",
            Self::Version => "version",
            Self::Artist => "artist",
            Self::Due => "due",
            Self::Status => "status",
            Self::Mov => "mov",
            Self::Exr => "exr",
            Self::Tool => "tool",
            Self::Actions => "actions",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|column| column.as_str() == value)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Select => "",
            Self::Thumb => "",
            Self::Code => "Code",
            Self::Reel => "Reel",
            Self::Version => "Ver",
            Self::Artist => "Artist",
            Self::Due => "Due",
            Self::Status => "Status",
            Self::Mov => "MOV",
            Self::Exr => "EXR",
            Self::Tool => "Nuke",
            Self::Actions => "Actions",
        }
    }

    pub const fn default_width(self) -> u16 {
        match self {
            Self::Select | Self::Thumb => 3,
            Self::Code => 18,
            Self::Reel | Self::Version => 8,
            Self::Artist => 14,
            Self::Due => 11,
            Self::Status => 12,
            Self::Mov | Self::Exr => 4,
            Self::Tool => 5,
            Self::Actions => 12,
        }
    }
}

/// Persisted preference keys. Booleans are stored as `true`/`false`,
/// widths as integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrefKey {
    LayoutTight,
    LayoutCompact,
    ShowMovColumn,
    ShowExrColumn,
    ColumnWidth(RosterColumn),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefValueKind {
    Bool,
    Width,
}

impl PrefKey {
    pub const TOGGLES: [Self; 4] = [
        Self::LayoutTight,
        Self::LayoutCompact,
        Self::ShowMovColumn,
        Self::ShowExrColumn,
    ];

    pub fn as_str(self) -> String {
        match self {
            Self::LayoutTight => "layout.tight".to_owned(),
            Self::LayoutCompact => "layout.compact".to_owned(),
            Self::ShowMovColumn => "columns.mov".to_owned(),
            Self::ShowExrColumn => "columns.exr".to_owned(),
            Self::ColumnWidth(column) => format!("columns.width.{}", column.as_str()),
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "layout.tight" => Some(Self::LayoutTight),
            "layout.compact" => Some(Self::LayoutCompact),
            "columns.mov" => Some(Self::ShowMovColumn),
            "columns.exr" => Some(Self::ShowExrColumn),
            other => other
                .strip_prefix("columns.width.")
                .and_then(RosterColumn::parse)
                .map(Self::ColumnWidth),
        }
    }

    pub const fn expected_value_kind(self) -> PrefValueKind {
        match self {
            Self::ColumnWidth(_) => PrefValueKind::Width,
            _ => PrefValueKind::Bool,
        }
    }

    pub fn all() -> Vec<Self> {
        let mut keys = Self::TOGGLES.to_vec();
        keys.extend(RosterColumn::ALL.into_iter().map(Self::ColumnWidth));
        keys
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefValue {
    Bool(bool),
    Width(u16),
}

impl PrefValue {
    pub fn parse_for_key(key: PrefKey, raw: &str) -> Option<Self> {
        match key.expected_value_kind() {
            PrefValueKind::Bool => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => Some(Self::Bool(true)),
                "0" | "false" | "off" | "no" => Some(Self::Bool(false)),
                _ => None,
            },
            PrefValueKind::Width => raw
                .trim()
                .parse::<u16>()
                .ok()
                .filter(|width| (MIN_COLUMN_WIDTH..=MAX_COLUMN_WIDTH).contains(width))
                .map(Self::Width),
        }
    }

    pub fn to_storage(self, key: PrefKey) -> Option<String> {
        match (key.expected_value_kind(), self) {
            (PrefValueKind::Bool, Self::Bool(value)) => {
                Some(if value { "true" } else { "false" }.to_owned())
            }
            (PrefValueKind::Width, Self::Width(width)) => Some(width.to_string()),
            _ => None,
        }
    }
}

/// String-valued key/value persistence for preferences.
pub trait PreferenceStore {
    fn get(&self, key: PrefKey) -> Result<Option<String>>;
    fn set(&mut self, key: PrefKey, value: &str) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    values: BTreeMap<String, String>,
}

impl MemoryPreferences {
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: PrefKey) -> Result<Option<String>> {
        Ok(self.values.get(&key.as_str()).cloned())
    }

    fn set(&mut self, key: PrefKey, value: &str) -> Result<()> {
        self.values.insert(key.as_str(), value.to_owned());
        Ok(())
    }
}

/// Preference-derived view state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    pub tight: bool,
    pub compact: bool,
    pub show_mov: bool,
    pub show_exr: bool,
    widths: BTreeMap<RosterColumn, u16>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            tight: false,
            compact: false,
            show_mov: true,
            show_exr: true,
            widths: BTreeMap::new(),
        }
    }
}

impl Preferences {
    /// Reads every known key. Absent or malformed values fall back to the
    /// defaults.
    pub fn load(store: &dyn PreferenceStore) -> Result<Self> {
        let mut prefs = Self::default();
        for key in PrefKey::all() {
            let Some(raw) = store.get(key)? else {
                continue;
            };
            match PrefValue::parse_for_key(key, &raw) {
                Some(value) => prefs.apply(key, value),
                None => warn!(key = %key.as_str(), value = %raw, "ignoring malformed preference"),
            }
        }
        Ok(prefs)
    }

    pub fn apply(&mut self, key: PrefKey, value: PrefValue) {
        match (key, value) {
            (PrefKey::LayoutTight, PrefValue::Bool(on)) => self.tight = on,
            (PrefKey::LayoutCompact, PrefValue::Bool(on)) => self.compact = on,
            (PrefKey::ShowMovColumn, PrefValue::Bool(on)) => self.show_mov = on,
            (PrefKey::ShowExrColumn, PrefValue::Bool(on)) => self.show_exr = on,
            (PrefKey::ColumnWidth(column), PrefValue::Width(width)) => {
                self.widths.insert(column, width);
            }
            _ => {}
        }
    }

    pub fn flag(&self, key: PrefKey) -> Option<bool> {
        match key {
            PrefKey::LayoutTight => Some(self.tight),
            PrefKey::LayoutCompact => Some(self.compact),
            PrefKey::ShowMovColumn => Some(self.show_mov),
            PrefKey::ShowExrColumn => Some(self.show_exr),
            PrefKey::ColumnWidth(_) => None,
        }
    }

    pub fn width(&self, column: RosterColumn) -> u16 {
        self.widths
            .get(&column)
            .copied()
            .unwrap_or_else(|| column.default_width())
    }

    pub fn column_visible(&self, column: RosterColumn) -> bool {
        match column {
            RosterColumn::Mov => self.show_mov,
            RosterColumn::Exr => self.show_exr,
            _ => true,
        }
    }

    pub fn visible_columns(&self) -> Vec<RosterColumn> {
        RosterColumn::ALL
            .into_iter()
            .filter(|column| self.column_visible(*column))
            .collect()
    }

    /// Layout classes in effect, in a stable order.
    pub fn layout_classes(&self) -> Vec<&'static str> {
        let mut classes = Vec::new();
        if self.tight {
            classes.push("tight");
        }
        if self.compact {
            classes.push("compact");
        }
        if !self.show_mov {
            classes.push("hide-mov");
        }
        if !self.show_exr {
            classes.push("hide-exr");
        }
        classes
    }

    pub fn toggle_label(&self, key: PrefKey) -> String {
        match key {
            PrefKey::ShowMovColumn => format!("MOV {}", mark(self.show_mov)),
            PrefKey::ShowExrColumn => format!("EXR {}", mark(self.show_exr)),
            PrefKey::LayoutTight if self.tight => "Tight ✓".to_owned(),
            PrefKey::LayoutTight => "Tight".to_owned(),
            PrefKey::LayoutCompact if self.compact => "Compact ✓".to_owned(),
            PrefKey::LayoutCompact => "Compact".to_owned(),
            PrefKey::ColumnWidth(column) => format!("{} {}", column.label(), self.width(column)),
        }
    }
}

fn mark(on: bool) -> &'static str {
    if on { "✓" } else { "✗" }
}
