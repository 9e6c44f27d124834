// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{Comment, CommentId, ShotId};

/// Identifies one comment-list request. Only the latest ticket for the
/// active shot is ever applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailTicket {
    pub shot_id: ShotId,
    pub seq: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DetailPanel {
    active: Option<ShotId>,
    label: String,
    comments: Vec<Comment>,
    latest: u64,
    pub input: String,
    /// Comment being edited through `input`, if any.
    pub editing: Option<CommentId>,
}

impl DetailPanel {
    pub fn active(&self) -> Option<ShotId> {
        self.active
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn is_open(&self) -> bool {
        self.active.is_some()
    }

    /// Points the panel at `shot_id` and returns the ticket for its load.
    /// Switching shots drops the previous thread right away.
    pub fn open(&mut self, shot_id: ShotId, label: impl Into<String>) -> DetailTicket {
        if self.active != Some(shot_id) {
            self.comments.clear();
            self.input.clear();
            self.editing = None;
        }
        self.active = Some(shot_id);
        self.label = label.into();
        self.issue(shot_id)
    }

    /// Ticket for reloading the active shot's thread.
    pub fn reload(&mut self) -> Option<DetailTicket> {
        let shot_id = self.active?;
        Some(self.issue(shot_id))
    }

    fn issue(&mut self, shot_id: ShotId) -> DetailTicket {
        self.latest += 1;
        DetailTicket {
            shot_id,
            seq: self.latest,
        }
    }

    pub fn is_current(&self, ticket: DetailTicket) -> bool {
        self.active == Some(ticket.shot_id) && self.latest == ticket.seq
    }

    /// Replaces the thread if `ticket` is still current. Returns whether it
    /// was applied.
    pub fn accept(&mut self, ticket: DetailTicket, comments: Vec<Comment>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.comments = comments;
        true
    }

    pub fn comment(&self, id: CommentId) -> Option<&Comment> {
        self.comments.iter().find(|comment| comment.id == id)
    }

    pub fn close(&mut self) {
        self.active = None;
        self.label.clear();
        self.comments.clear();
        self.input.clear();
        self.editing = None;
    }
}
