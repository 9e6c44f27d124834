// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::{
    Comment, CommentId, DetailPanel, DetailTicket, FilterEdit, FilterField, FilterOptions,
    FilterState, GroupMode, LegendEntry, MAX_COLUMN_WIDTH, MIN_COLUMN_WIDTH, NewProject, PrefKey,
    PrefValue,
    PreferenceStore, Preferences, Project, ProjectId, RosterColumn, RosterError, RosterQuery,
    RosterResult, RosterRow, RosterView, SelectionSet, SessionInfo, Shot, ShotId, ShotStatus,
    ShotUpdate, build_export_query, build_group_query, build_query, legend, open_target,
    project_rows,
};

/// Per-row actions, keyed by shot id rather than by rendered widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowAction {
    ToggleSelect,
    Activate,
    OpenPlate,
    OpenMov,
    OpenExr,
    ChangeStatus(ShotStatus),
    Assign(String),
    ResolveToolPath,
    GenerateComp,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingConfirm {
    DeleteShot { shot_id: ShotId, code: String },
    BulkDelete(Vec<ShotId>),
    DeleteComment(CommentId),
}

impl PendingConfirm {
    pub fn prompt(&self) -> String {
        match self {
            Self::DeleteShot { code, .. } => format!("Delete {code}?"),
            Self::BulkDelete(ids) => format!("Delete {} selected shots?", ids.len()),
            Self::DeleteComment(_) => "Delete comment?".to_owned(),
        }
    }
}

/// Network work the controller wants done. The runtime executes it off the
/// UI thread and hands back the matching [`Response`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    LoadSession,
    LoadProjects,
    CreateProject(NewProject),
    LoadRoster {
        token: u64,
        query: RosterQuery,
    },
    LoadGroup {
        token: u64,
        index: usize,
        reel: String,
        query: RosterQuery,
    },
    LoadComments {
        ticket: DetailTicket,
    },
    UpdateShot {
        shot_id: ShotId,
        update: ShotUpdate,
    },
    DeleteShot {
        shot_id: ShotId,
    },
    BulkDelete {
        ids: Vec<ShotId>,
    },
    AddComment {
        shot_id: ShotId,
        text: String,
    },
    UpdateComment {
        comment_id: CommentId,
        text: String,
    },
    DeleteComment {
        comment_id: CommentId,
    },
    ResolveToolPath {
        shot_id: ShotId,
    },
    GenerateComp {
        shot_id: ShotId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Session(Result<SessionInfo, RosterError>),
    Projects(Result<Vec<Project>, RosterError>),
    ProjectCreated(Result<Project, RosterError>),
    Roster {
        token: u64,
        result: Result<RosterResult, RosterError>,
    },
    Group {
        token: u64,
        index: usize,
        reel: String,
        result: Result<Vec<Shot>, RosterError>,
    },
    Comments {
        ticket: DetailTicket,
        result: Result<Vec<Comment>, RosterError>,
    },
    ShotUpdated {
        shot_id: ShotId,
        update: ShotUpdate,
        result: Result<Shot, RosterError>,
    },
    ShotDeleted {
        shot_id: ShotId,
        result: Result<(), RosterError>,
    },
    BulkDeleted {
        result: Result<u64, RosterError>,
    },
    CommentAdded {
        shot_id: ShotId,
        result: Result<Comment, RosterError>,
    },
    CommentUpdated {
        result: Result<Comment, RosterError>,
    },
    CommentDeleted {
        result: Result<(), RosterError>,
    },
    ToolPath {
        shot_id: ShotId,
        result: Result<Option<String>, RosterError>,
    },
    CompGenerated {
        shot_id: ShotId,
        result: Result<String, RosterError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    Start,
    SelectProject(ProjectId),
    CreateProject(NewProject),
    ToggleStatus(ShotStatus),
    SelectAllStatuses,
    ClearStatuses,
    SetFilter(FilterField, String),
    EditFilters(Vec<FilterEdit>),
    ClearFilters,
    SetGroupMode(GroupMode),
    Refresh,
    Row { shot_id: ShotId, action: RowAction },
    BulkDelete,
    Confirm,
    Cancel,
    AddComment(String),
    EditComment { comment_id: CommentId, text: String },
    DeleteComment(CommentId),
    TogglePreference(PrefKey),
    AdjustColumnWidth { column: RosterColumn, delta: i16 },
    ExportCsv,
    DismissNotice,
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Issue(Request),
    LegendChanged(Vec<LegendEntry>),
    SessionLoaded(String),
    ProjectsLoaded(usize),
    ProjectSelected(ProjectId),
    RosterRendered { rows: usize },
    GroupsRendered { groups: usize },
    GroupAttached { reel: String, rows: usize },
    FilterDiscarded(FilterField),
    SelectionChanged(usize),
    RowActivated(ShotId),
    RowPatched(ShotId),
    DetailLoaded { shot_id: ShotId, comments: usize },
    ConfirmRequested(String),
    Notice(String),
    OpenTarget(String),
    OpenApiPath(String),
    PreferenceChanged { key: PrefKey, value: String },
    StatusUpdated(String),
    StatusCleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StatusPatch {
    confirmed_at: u64,
    status: ShotStatus,
}

/// Owns every piece of roster view state. Only the UI thread mutates it,
/// through [`AppState::dispatch`] and [`AppState::apply`].
pub struct AppState {
    store: Box<dyn PreferenceStore>,
    prefs: Preferences,
    session: Option<SessionInfo>,
    projects: Vec<Project>,
    startup_project: Option<String>,
    active_project: Option<ProjectId>,
    filters: FilterState,
    roster: RosterView,
    options: FilterOptions,
    selection: SelectionSet,
    active_shot: Option<ShotId>,
    detail: DetailPanel,
    pending: Option<PendingConfirm>,
    notice: Option<String>,
    pub status_line: Option<String>,
    clock: u64,
    roster_token: u64,
    status_patches: BTreeMap<ShotId, StatusPatch>,
}

impl AppState {
    pub fn new(store: Box<dyn PreferenceStore>) -> Result<Self> {
        let prefs = Preferences::load(&*store)?;
        Ok(Self {
            store,
            prefs,
            session: None,
            projects: Vec::new(),
            startup_project: None,
            active_project: None,
            filters: FilterState::default(),
            roster: RosterView::Empty,
            options: FilterOptions::default(),
            selection: SelectionSet::default(),
            active_shot: None,
            detail: DetailPanel::default(),
            pending: None,
            notice: None,
            status_line: None,
            clock: 0,
            roster_token: 0,
            status_patches: BTreeMap::new(),
        })
    }

    /// Project (by name or short code) to select once the list arrives.
    pub fn with_startup_project(mut self, project: Option<String>) -> Self {
        self.startup_project = project.filter(|name| !name.trim().is_empty());
        self
    }

    pub fn prefs(&self) -> &Preferences {
        &self.prefs
    }

    pub fn session(&self) -> Option<&SessionInfo> {
        self.session.as_ref()
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn active_project(&self) -> Option<ProjectId> {
        self.active_project
    }

    pub fn project(&self) -> Option<&Project> {
        let id = self.active_project?;
        self.projects.iter().find(|project| project.id == id)
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn legend(&self) -> Vec<LegendEntry> {
        legend(&self.filters)
    }

    pub fn roster(&self) -> &RosterView {
        &self.roster
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn active_shot(&self) -> Option<ShotId> {
        self.active_shot
    }

    pub fn detail(&self) -> &DetailPanel {
        &self.detail
    }

    /// Comment input and edit target are plain fields the front end edits
    /// directly.
    pub fn detail_mut(&mut self) -> &mut DetailPanel {
        &mut self.detail
    }

    pub fn pending_confirm(&self) -> Option<&PendingConfirm> {
        self.pending.as_ref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::Start => vec![
                AppEvent::Issue(Request::LoadSession),
                AppEvent::Issue(Request::LoadProjects),
            ],
            AppCommand::SelectProject(project) => self.select_project(project),
            AppCommand::CreateProject(project) => match project.normalized() {
                Some(project) => vec![AppEvent::Issue(Request::CreateProject(project))],
                None => {
                    let error = RosterError::validation("project name required");
                    vec![self.notify(error.to_string())]
                }
            },
            AppCommand::ToggleStatus(status) => {
                self.edit_filters(vec![FilterEdit::ToggleStatus(status)])
            }
            AppCommand::SelectAllStatuses => self.edit_filters(vec![FilterEdit::SelectAllStatuses]),
            AppCommand::ClearStatuses => self.edit_filters(vec![FilterEdit::ClearStatuses]),
            AppCommand::SetFilter(field, value) => {
                self.edit_filters(vec![FilterEdit::SetField(field, value)])
            }
            AppCommand::EditFilters(edits) => self.edit_filters(edits),
            AppCommand::ClearFilters => self.edit_filters(vec![FilterEdit::ClearAll]),
            AppCommand::SetGroupMode(mode) => {
                self.edit_filters(vec![FilterEdit::SetGroupMode(mode)])
            }
            AppCommand::Refresh => self.refetch(),
            AppCommand::Row { shot_id, action } => self.row_action(shot_id, action),
            AppCommand::BulkDelete => match self.selection.bulk_ids() {
                Ok(ids) => self.ask(PendingConfirm::BulkDelete(ids)),
                Err(error) => vec![self.notify(error.to_string())],
            },
            AppCommand::Confirm => self.confirm(),
            AppCommand::Cancel => {
                if self.pending.take().is_some() {
                    vec![self.set_status("cancelled")]
                } else {
                    Vec::new()
                }
            }
            AppCommand::AddComment(text) => self.add_comment(&text),
            AppCommand::EditComment { comment_id, text } => self.edit_comment(comment_id, &text),
            AppCommand::DeleteComment(comment_id) => {
                if self.detail.comment(comment_id).is_none() {
                    return Vec::new();
                }
                self.ask(PendingConfirm::DeleteComment(comment_id))
            }
            AppCommand::TogglePreference(key) => match self.prefs.flag(key) {
                Some(current) => self.write_preference(key, PrefValue::Bool(!current)),
                None => Vec::new(),
            },
            AppCommand::AdjustColumnWidth { column, delta } => {
                let current = i32::from(self.prefs.width(column));
                let next = (current + i32::from(delta))
                    .clamp(i32::from(MIN_COLUMN_WIDTH), i32::from(MAX_COLUMN_WIDTH));
                if next == current {
                    return Vec::new();
                }
                let width = u16::try_from(next).unwrap_or(MIN_COLUMN_WIDTH);
                self.write_preference(PrefKey::ColumnWidth(column), PrefValue::Width(width))
            }
            AppCommand::ExportCsv => match build_export_query(self.active_project, &self.filters) {
                Ok(query) => vec![AppEvent::OpenApiPath(query.export_path())],
                Err(error) => vec![self.notify(error.to_string())],
            },
            AppCommand::DismissNotice => {
                self.notice = None;
                Vec::new()
            }
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    pub fn apply(&mut self, response: Response) -> Vec<AppEvent> {
        match response {
            Response::Session(result) => match result {
                Ok(session) => {
                    let label = session.label();
                    self.session = Some(session);
                    vec![AppEvent::SessionLoaded(label)]
                }
                Err(error) => {
                    warn!(%error, "session load failed");
                    Vec::new()
                }
            },
            Response::Projects(result) => match result {
                Ok(projects) => self.load_projects(projects),
                Err(error) => {
                    warn!(%error, "project list load failed");
                    Vec::new()
                }
            },
            Response::ProjectCreated(result) => match result {
                Ok(project) => {
                    info!(project_id = %project.id, name = %project.name, "project created");
                    vec![
                        self.set_status(&format!("created project {}", project.name)),
                        AppEvent::Issue(Request::LoadProjects),
                    ]
                }
                Err(error) => vec![self.notify(format!("Create project failed: {error}"))],
            },
            Response::Roster { token, result } => self.apply_roster(token, result),
            Response::Group {
                token,
                index,
                reel,
                result,
            } => self.apply_group(token, index, &reel, result),
            Response::Comments { ticket, result } => match result {
                Ok(comments) => {
                    let count = comments.len();
                    if self.detail.accept(ticket, comments) {
                        vec![AppEvent::DetailLoaded {
                            shot_id: ticket.shot_id,
                            comments: count,
                        }]
                    } else {
                        debug!(shot_id = %ticket.shot_id, seq = ticket.seq, "dropping stale comment list");
                        Vec::new()
                    }
                }
                Err(error) => {
                    warn!(shot_id = %ticket.shot_id, %error, "comment list load failed");
                    Vec::new()
                }
            },
            Response::ShotUpdated {
                shot_id,
                update,
                result,
            } => self.apply_shot_update(shot_id, &update, result),
            Response::ShotDeleted { shot_id, result } => match result {
                Ok(()) => {
                    info!(%shot_id, "shot deleted");
                    if self.detail.active() == Some(shot_id) {
                        self.detail.close();
                        self.active_shot = None;
                    }
                    let mut events = vec![self.set_status("shot deleted")];
                    events.extend(self.refetch());
                    events
                }
                Err(error) => vec![self.notify(format!("Delete failed: {error}"))],
            },
            Response::BulkDeleted { result } => {
                let notice = match result {
                    Ok(deleted) => {
                        info!(deleted, "bulk delete finished");
                        format!("Deleted {deleted} shots")
                    }
                    Err(error) => format!("Delete failed: {error}"),
                };
                let mut events = vec![self.notify(notice)];
                events.extend(self.refetch());
                events
            }
            Response::CommentAdded { shot_id, result } => match result {
                Ok(_) => {
                    let mut events = vec![self.set_status("comment added")];
                    if self.detail.active() == Some(shot_id) {
                        self.detail.input.clear();
                        events.extend(self.reload_detail());
                    }
                    events
                }
                Err(error) => vec![self.notify(format!("Comment failed: {error}"))],
            },
            Response::CommentUpdated { result } => match result {
                Ok(_) => {
                    self.detail.editing = None;
                    self.detail.input.clear();
                    let mut events = vec![self.set_status("comment updated")];
                    events.extend(self.reload_detail());
                    events
                }
                Err(error) => vec![self.notify(format!("Comment edit failed: {error}"))],
            },
            Response::CommentDeleted { result } => match result {
                Ok(()) => {
                    let mut events = vec![self.set_status("comment deleted")];
                    events.extend(self.reload_detail());
                    events
                }
                Err(error) => vec![self.notify(format!("Comment delete failed: {error}"))],
            },
            Response::ToolPath { shot_id, result } => match result {
                Ok(Some(path)) => {
                    debug!(%shot_id, %path, "opening tool path");
                    vec![AppEvent::OpenTarget(open_target(&path))]
                }
                Ok(None) => vec![self.notify("Nuke path not configured".to_owned())],
                Err(error) => vec![self.notify(format!("Nuke path lookup failed: {error}"))],
            },
            Response::CompGenerated { shot_id, result } => match result {
                Ok(path) => {
                    info!(%shot_id, %path, "composite created");
                    let mut events = vec![self.notify(format!("Created: {path}"))];
                    events.extend(self.refetch());
                    events
                }
                Err(error) => vec![self.notify(format!("Generate failed: {error}"))],
            },
        }
    }

    /// Blocking notice for a failure the front end hit outside a request.
    pub fn report_failure(&mut self, action: &str, error: &anyhow::Error) -> AppEvent {
        warn!(action, error = %format!("{error:#}"), "action failed");
        self.notify(format!("{action} failed: {error:#}"))
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn select_project(&mut self, project: ProjectId) -> Vec<AppEvent> {
        self.active_project = Some(project);
        self.roster = RosterView::Empty;
        self.options = FilterOptions::default();
        self.selection.clear();
        self.detail.close();
        self.active_shot = None;
        self.pending = None;
        self.status_patches.clear();
        let mut events = vec![AppEvent::ProjectSelected(project)];
        events.extend(self.refetch());
        events
    }

    fn load_projects(&mut self, projects: Vec<Project>) -> Vec<AppEvent> {
        self.projects = projects;
        let mut events = vec![AppEvent::ProjectsLoaded(self.projects.len())];
        if let Some(wanted) = self.startup_project.take() {
            let found = self
                .projects
                .iter()
                .find(|project| {
                    project.name.eq_ignore_ascii_case(&wanted)
                        || project.short.eq_ignore_ascii_case(&wanted)
                })
                .map(|project| project.id);
            match found {
                Some(project) => events.extend(self.select_project(project)),
                None => warn!(project = %wanted, "configured project not found"),
            }
        }
        events
    }

    fn edit_filters(&mut self, edits: Vec<FilterEdit>) -> Vec<AppEvent> {
        if edits.is_empty() {
            return Vec::new();
        }
        for edit in edits {
            self.filters.apply(edit);
        }
        let mut events = vec![AppEvent::LegendChanged(self.legend())];
        events.extend(self.refetch());
        events
    }

    fn refetch(&mut self) -> Vec<AppEvent> {
        let Some(project) = self.active_project else {
            debug!("no active project, skipping roster fetch");
            return Vec::new();
        };
        match build_query(Some(project), &self.filters) {
            Ok(query) => {
                self.roster_token = self.tick();
                vec![AppEvent::Issue(Request::LoadRoster {
                    token: self.roster_token,
                    query,
                })]
            }
            Err(error) => {
                warn!(%error, "cannot build roster query");
                Vec::new()
            }
        }
    }

    fn apply_roster(
        &mut self,
        token: u64,
        result: Result<RosterResult, RosterError>,
    ) -> Vec<AppEvent> {
        if token != self.roster_token {
            debug!(token, current = self.roster_token, "dropping stale roster response");
            return Vec::new();
        }
        let Some(project) = self.active_project else {
            return Vec::new();
        };
        let result = match result {
            Ok(result) => result,
            Err(error) => {
                warn!(%error, "roster fetch failed, keeping rendered rows");
                return Vec::new();
            }
        };

        self.selection.clear();
        self.status_patches
            .retain(|_, patch| patch.confirmed_at > token);

        match result {
            RosterResult::Flat(shots) => {
                let rows = project_rows(self.overlay_patches(shots, token), &self.filters);
                self.options = FilterOptions::from_rows(&rows);
                let count = rows.len();
                self.roster = RosterView::Flat(rows);
                let mut events = vec![
                    AppEvent::RosterRendered { rows: count },
                    AppEvent::SelectionChanged(0),
                ];
                events.extend(self.discard_missing_options());
                events
            }
            RosterResult::Grouped(groups) => {
                let requests: Vec<AppEvent> = groups
                    .iter()
                    .enumerate()
                    .map(|(index, group)| {
                        AppEvent::Issue(Request::LoadGroup {
                            token,
                            index,
                            reel: group.reel.clone(),
                            query: build_group_query(project, &group.reel),
                        })
                    })
                    .collect();
                let count = groups.len();
                self.roster = RosterView::grouped(groups);
                let mut events = vec![
                    AppEvent::GroupsRendered { groups: count },
                    AppEvent::SelectionChanged(0),
                ];
                events.extend(requests);
                events
            }
        }
    }

    fn apply_group(
        &mut self,
        token: u64,
        index: usize,
        reel: &str,
        result: Result<Vec<Shot>, RosterError>,
    ) -> Vec<AppEvent> {
        if token != self.roster_token {
            debug!(token, reel, "dropping stale group response");
            return Vec::new();
        }
        let shots = match result {
            Ok(shots) => shots,
            Err(error) => {
                warn!(reel, %error, "group fetch failed");
                return Vec::new();
            }
        };
        let rows = project_rows(self.overlay_patches(shots, token), &self.filters);
        let count = rows.len();
        if self.roster.attach_group(index, reel, rows) {
            vec![AppEvent::GroupAttached {
                reel: reel.to_owned(),
                rows: count,
            }]
        } else {
            Vec::new()
        }
    }

    /// Status confirmed after `token` was issued wins over the fetched one.
    fn overlay_patches(&self, mut shots: Vec<Shot>, token: u64) -> Vec<Shot> {
        for shot in &mut shots {
            if let Some(patch) = self.status_patches.get(&shot.id)
                && patch.confirmed_at > token
            {
                shot.status = patch.status;
            }
        }
        shots
    }

    fn discard_missing_options(&mut self) -> Vec<AppEvent> {
        let mut events = Vec::new();
        let reel = self.filters.reel.trim().to_owned();
        if !reel.is_empty() && !self.options.reels.contains(&reel) {
            self.filters.set_field(FilterField::Reel, String::new());
            events.push(AppEvent::FilterDiscarded(FilterField::Reel));
        }
        let artist = self.filters.artist.trim().to_owned();
        if !artist.is_empty() && !self.options.artists.contains(&artist) {
            self.filters.set_field(FilterField::Artist, String::new());
            events.push(AppEvent::FilterDiscarded(FilterField::Artist));
        }
        events
    }

    fn row_action(&mut self, shot_id: ShotId, action: RowAction) -> Vec<AppEvent> {
        let Some(shot) = self.roster.row(shot_id).map(|row| row.shot.clone()) else {
            debug!(%shot_id, "ignoring action for a row that is no longer rendered");
            return Vec::new();
        };
        match action {
            RowAction::ToggleSelect => {
                self.selection.toggle(shot_id);
                vec![AppEvent::SelectionChanged(self.selection.len())]
            }
            RowAction::Activate => {
                self.active_shot = Some(shot_id);
                let ticket = self.detail.open(shot_id, shot.display_label());
                vec![
                    AppEvent::RowActivated(shot_id),
                    AppEvent::Issue(Request::LoadComments { ticket }),
                ]
            }
            RowAction::OpenPlate => self.open_path(shot.plate(), "plate"),
            RowAction::OpenMov => self.open_path(shot.mov(), "MOV"),
            RowAction::OpenExr => self.open_path(shot.exr(), "EXR"),
            RowAction::ChangeStatus(status) => {
                if status == shot.status {
                    return Vec::new();
                }
                vec![AppEvent::Issue(Request::UpdateShot {
                    shot_id,
                    update: ShotUpdate::status(status),
                })]
            }
            RowAction::Assign(artist) => {
                let artist = artist.trim();
                if artist == shot.assigned_to.trim() {
                    return Vec::new();
                }
                vec![AppEvent::Issue(Request::UpdateShot {
                    shot_id,
                    update: ShotUpdate::assigned_to(artist),
                })]
            }
            RowAction::ResolveToolPath => vec![AppEvent::Issue(Request::ResolveToolPath { shot_id })],
            RowAction::GenerateComp => vec![AppEvent::Issue(Request::GenerateComp { shot_id })],
            RowAction::Delete => self.ask(PendingConfirm::DeleteShot {
                shot_id,
                code: shot.display_label(),
            }),
        }
    }

    fn open_path(&mut self, path: Option<&str>, what: &str) -> Vec<AppEvent> {
        match path {
            Some(path) => vec![AppEvent::OpenTarget(open_target(path))],
            None => vec![self.set_status(&format!("no {what} path"))],
        }
    }

    fn apply_shot_update(
        &mut self,
        shot_id: ShotId,
        update: &ShotUpdate,
        result: Result<Shot, RosterError>,
    ) -> Vec<AppEvent> {
        let shot = match result {
            Ok(shot) => shot,
            Err(error) => {
                warn!(%shot_id, %error, "shot update failed");
                let action = if update.status.is_some() {
                    "Status update"
                } else {
                    "Assignment"
                };
                return vec![self.notify(format!("{action} failed: {error}"))];
            }
        };
        if update.status.is_some() {
            let confirmed_at = self.tick();
            self.status_patches.insert(
                shot_id,
                StatusPatch {
                    confirmed_at,
                    status: shot.status,
                },
            );
        }
        let message = match &update.status {
            Some(_) => format!("{} is now {}", shot.display_label(), shot.status.as_str()),
            None => format!("{} assigned to {}", shot.display_label(), shot.assigned_to),
        };
        let Some(row) = self.roster.row_mut(shot_id) else {
            return vec![self.set_status(&message)];
        };
        // The server's shot omits the explicit reel; keep the rendered one.
        let reel = row.reel.clone();
        *row = RosterRow::new(shot);
        row.reel = reel;
        if matches!(self.roster, RosterView::Flat(_)) {
            self.options = FilterOptions::from_rows(self.roster.rows());
        }
        vec![AppEvent::RowPatched(shot_id), self.set_status(&message)]
    }

    fn ask(&mut self, pending: PendingConfirm) -> Vec<AppEvent> {
        let prompt = pending.prompt();
        self.pending = Some(pending);
        vec![AppEvent::ConfirmRequested(prompt)]
    }

    fn confirm(&mut self) -> Vec<AppEvent> {
        let Some(pending) = self.pending.take() else {
            return Vec::new();
        };
        let request = match pending {
            PendingConfirm::DeleteShot { shot_id, .. } => Request::DeleteShot { shot_id },
            PendingConfirm::BulkDelete(ids) => Request::BulkDelete { ids },
            PendingConfirm::DeleteComment(comment_id) => Request::DeleteComment { comment_id },
        };
        vec![AppEvent::Issue(request)]
    }

    fn add_comment(&mut self, text: &str) -> Vec<AppEvent> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }
        let Some(shot_id) = self.detail.active() else {
            return vec![self.notify("select a shot".to_owned())];
        };
        vec![AppEvent::Issue(Request::AddComment {
            shot_id,
            text: text.to_owned(),
        })]
    }

    fn edit_comment(&mut self, comment_id: CommentId, text: &str) -> Vec<AppEvent> {
        let text = text.trim();
        if text.is_empty() || self.detail.comment(comment_id).is_none() {
            return Vec::new();
        }
        vec![AppEvent::Issue(Request::UpdateComment {
            comment_id,
            text: text.to_owned(),
        })]
    }

    fn reload_detail(&mut self) -> Vec<AppEvent> {
        match self.detail.reload() {
            Some(ticket) => vec![AppEvent::Issue(Request::LoadComments { ticket })],
            None => Vec::new(),
        }
    }

    fn write_preference(&mut self, key: PrefKey, value: PrefValue) -> Vec<AppEvent> {
        let Some(raw) = value.to_storage(key) else {
            return Vec::new();
        };
        if let Err(error) = self.store.set(key, &raw) {
            return vec![self.report_failure("Saving preference", &error)];
        }
        self.prefs.apply(key, value);
        let label = self.prefs.toggle_label(key);
        vec![
            AppEvent::PreferenceChanged { key, value: raw },
            self.set_status(&label),
        ]
    }

    fn notify(&mut self, message: String) -> AppEvent {
        self.notice = Some(message.clone());
        AppEvent::Notice(message)
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::{AppCommand, AppEvent, AppState, PendingConfirm, Request, Response, RowAction};
    use crate::{
        Comment, CommentId, FilterEdit, FilterField, GroupMode, MemoryPreferences, NewProject,
        PrefKey,
        PreferenceStore, Project, ProjectId, ReelGroup, RosterColumn, RosterError, RosterResult,
        RosterView, Shot, ShotId, ShotStatus, ShotUpdate, classify, decode_shots, highlighted,
    };
    use anyhow::{Result, anyhow};
    use serde_json::json;

    struct ReadOnlyStore;

    impl PreferenceStore for ReadOnlyStore {
        fn get(&self, _key: PrefKey) -> Result<Option<String>> {
            Ok(None)
        }

        fn set(&mut self, _key: PrefKey, _value: &str) -> Result<()> {
            Err(anyhow!("attempt to write a readonly database"))
        }
    }

    fn shot(id: i64, code: &str, status: ShotStatus, artist: &str) -> Shot {
        let mov_path = if id % 2 == 0 { "/mnt/mov/a.mov" } else { "" };
        serde_json::from_value(json!({
            "id": id,
            "project_id": 1,
            "code": code,
            "status": status.as_str(),
            "assigned_to": artist,
            "mov_path": mov_path,
        }))
        .expect("fixture shot")
    }

    fn fixture_shots() -> Vec<Shot> {
        vec![
            shot(1, "SEQ_010_comp", ShotStatus::InProgress, "mia"),
            shot(2, "SEQ_010_roto", ShotStatus::Final, "ravi"),
            shot(3, "SEQ_020_comp", ShotStatus::OnHold, "mia"),
        ]
    }

    fn comment(id: i64, shot_id: i64, text: &str) -> Comment {
        Comment {
            id: CommentId::new(id),
            shot_id: ShotId::new(shot_id),
            author: "lead".to_owned(),
            author_role: "supervisor".to_owned(),
            text: text.to_owned(),
            created_at: "2026-02-01T09:00:00".to_owned(),
        }
    }

    fn new_state() -> AppState {
        AppState::new(Box::new(MemoryPreferences::default())).expect("state")
    }

    fn issued(events: &[AppEvent]) -> Vec<Request> {
        events
            .iter()
            .filter_map(|event| match event {
                AppEvent::Issue(request) => Some(request.clone()),
                _ => None,
            })
            .collect()
    }

    fn roster_token(events: &[AppEvent]) -> u64 {
        issued(events)
            .into_iter()
            .find_map(|request| match request {
                Request::LoadRoster { token, .. } => Some(token),
                _ => None,
            })
            .expect("roster request")
    }

    fn state_with_rows() -> AppState {
        let mut state = new_state();
        let events = state.dispatch(AppCommand::SelectProject(ProjectId::new(1)));
        let token = roster_token(&events);
        state.apply(Response::Roster {
            token,
            result: Ok(RosterResult::Flat(fixture_shots())),
        });
        state
    }

    fn row_status(state: &AppState, id: i64) -> ShotStatus {
        state
            .roster()
            .row(ShotId::new(id))
            .expect("row rendered")
            .shot
            .status
    }

    #[test]
    fn start_loads_session_and_projects() {
        let mut state = new_state();
        let events = state.dispatch(AppCommand::Start);
        assert_eq!(
            issued(&events),
            vec![Request::LoadSession, Request::LoadProjects]
        );
    }

    #[test]
    fn filter_change_without_project_updates_legend_only() {
        let mut state = new_state();
        let events = state.dispatch(AppCommand::ToggleStatus(ShotStatus::Final));
        assert!(issued(&events).is_empty());
        let AppEvent::LegendChanged(entries) = &events[0] else {
            panic!("expected legend event, got {events:?}");
        };
        assert_eq!(highlighted(entries), vec![ShotStatus::Final]);
        assert_eq!(state.filters().statuses(), &[ShotStatus::Final]);
    }

    #[test]
    fn legend_equals_status_set_after_each_command() {
        let mut state = state_with_rows();
        let commands = [
            AppCommand::ToggleStatus(ShotStatus::Approved),
            AppCommand::ToggleStatus(ShotStatus::Final),
            AppCommand::SelectAllStatuses,
            AppCommand::ToggleStatus(ShotStatus::Approved),
            AppCommand::ClearStatuses,
            AppCommand::ToggleStatus(ShotStatus::Kickback),
            AppCommand::ClearFilters,
        ];
        for command in commands {
            let events = state.dispatch(command);
            let legend = events
                .iter()
                .find_map(|event| match event {
                    AppEvent::LegendChanged(entries) => Some(highlighted(entries)),
                    _ => None,
                })
                .expect("legend event");
            let mut expected = state.filters().statuses().to_vec();
            expected.sort();
            let mut shown = legend;
            shown.sort();
            assert_eq!(shown, expected);
        }
    }

    #[test]
    fn filter_change_with_project_issues_one_fetch() {
        let mut state = state_with_rows();
        let events = state.dispatch(AppCommand::SetFilter(FilterField::Code, "comp".to_owned()));
        let requests = issued(&events);
        assert_eq!(requests.len(), 1);
        let Request::LoadRoster { query, .. } = &requests[0] else {
            panic!("expected roster fetch");
        };
        assert_eq!(query.query_string(), "code=comp");
    }

    #[test]
    fn batched_edits_issue_a_single_fetch() {
        let mut state = state_with_rows();
        let events = state.dispatch(AppCommand::EditFilters(vec![
            FilterEdit::SetField(FilterField::Reel, "010".to_owned()),
            FilterEdit::ToggleStatus(ShotStatus::Final),
            FilterEdit::ToggleStatus(ShotStatus::Approved),
            FilterEdit::SetGroupMode(GroupMode::Reel),
        ]));
        let requests = issued(&events);
        assert_eq!(requests.len(), 1);
        let Request::LoadRoster { query, .. } = &requests[0] else {
            panic!("expected roster fetch");
        };
        assert_eq!(
            query.query_string(),
            "reel=010&status=Final&status=Approved&group_by=reel"
        );
    }

    #[test]
    fn failed_refetch_keeps_rendered_rows() {
        let mut state = state_with_rows();
        let before = state.roster().clone();
        let events = state.dispatch(AppCommand::Refresh);
        let token = roster_token(&events);

        let applied = state.apply(Response::Roster {
            token,
            result: Err(RosterError::network(Some(500), "database is locked")),
        });
        assert!(applied.is_empty());
        assert_eq!(state.roster(), &before);
        assert!(state.notice().is_none());
    }

    #[test]
    fn stale_roster_response_is_ignored() {
        let mut state = state_with_rows();
        let first = roster_token(&state.dispatch(AppCommand::Refresh));
        let second = roster_token(&state.dispatch(AppCommand::Refresh));
        assert!(second > first);

        state.apply(Response::Roster {
            token: second,
            result: Ok(RosterResult::Flat(vec![shot(
                9,
                "SEQ_090_comp",
                ShotStatus::Final,
                "",
            )])),
        });
        let stale = state.apply(Response::Roster {
            token: first,
            result: Ok(RosterResult::Flat(fixture_shots())),
        });
        assert!(stale.is_empty());
        assert_eq!(state.roster().row_count(), 1);
    }

    #[test]
    fn render_clears_selection_and_derives_options() {
        let mut state = state_with_rows();
        assert_eq!(state.options().reels, vec!["010", "020"]);
        assert_eq!(state.options().artists, vec!["mia", "ravi"]);

        state.dispatch(AppCommand::Row {
            shot_id: ShotId::new(1),
            action: RowAction::ToggleSelect,
        });
        assert!(state.selection().bulk_delete_visible());

        let token = roster_token(&state.dispatch(AppCommand::Refresh));
        state.apply(Response::Roster {
            token,
            result: Ok(RosterResult::Flat(fixture_shots())),
        });
        assert!(state.selection().is_empty());
    }

    #[test]
    fn filter_value_missing_from_options_is_discarded() {
        let mut state = state_with_rows();
        let token = roster_token(&state.dispatch(AppCommand::EditFilters(vec![
            FilterEdit::SetField(FilterField::Artist, "nobody".to_owned()),
            FilterEdit::SetField(FilterField::Reel, "010".to_owned()),
        ])));
        let events = state.apply(Response::Roster {
            token,
            result: Ok(RosterResult::Flat(fixture_shots())),
        });
        assert!(events.contains(&AppEvent::FilterDiscarded(FilterField::Artist)));
        assert!(issued(&events).is_empty());
        assert_eq!(state.filters().artist, "");
        assert_eq!(state.filters().reel, "010");
    }

    #[test]
    fn client_refilter_hides_rows_outside_status_set() {
        let mut state = state_with_rows();
        let token = roster_token(&state.dispatch(AppCommand::ToggleStatus(ShotStatus::Final)));
        state.apply(Response::Roster {
            token,
            result: Ok(RosterResult::Flat(fixture_shots())),
        });
        assert_eq!(state.roster().row_count(), 1);
        assert!(state.roster().row(ShotId::new(2)).is_some());
    }

    #[test]
    fn bulk_delete_with_empty_selection_sends_nothing() {
        let mut state = state_with_rows();
        let events = state.dispatch(AppCommand::BulkDelete);
        assert!(issued(&events).is_empty());
        assert_eq!(events, vec![AppEvent::Notice("nothing selected".to_owned())]);
        assert!(state.pending_confirm().is_none());
    }

    #[test]
    fn bulk_delete_confirms_then_refetches_either_way() {
        let mut state = state_with_rows();
        for id in [1, 3] {
            state.dispatch(AppCommand::Row {
                shot_id: ShotId::new(id),
                action: RowAction::ToggleSelect,
            });
        }

        let asked = state.dispatch(AppCommand::BulkDelete);
        assert_eq!(
            asked,
            vec![AppEvent::ConfirmRequested(
                "Delete 2 selected shots?".to_owned()
            )]
        );
        assert_eq!(
            state.pending_confirm(),
            Some(&PendingConfirm::BulkDelete(vec![
                ShotId::new(1),
                ShotId::new(3)
            ]))
        );

        let confirmed = state.dispatch(AppCommand::Confirm);
        assert_eq!(
            issued(&confirmed),
            vec![Request::BulkDelete {
                ids: vec![ShotId::new(1), ShotId::new(3)]
            }]
        );

        let done = state.apply(Response::BulkDeleted { result: Ok(2) });
        assert_eq!(done[0], AppEvent::Notice("Deleted 2 shots".to_owned()));
        assert_eq!(issued(&done).len(), 1);

        let failed = state.apply(Response::BulkDeleted {
            result: Err(RosterError::network(Some(403), "forbidden")),
        });
        assert_eq!(
            failed[0],
            AppEvent::Notice("Delete failed: server returned 403: forbidden".to_owned())
        );
        assert_eq!(issued(&failed).len(), 1);
    }

    #[test]
    fn cancel_drops_pending_delete() {
        let mut state = state_with_rows();
        state.dispatch(AppCommand::Row {
            shot_id: ShotId::new(2),
            action: RowAction::Delete,
        });
        assert_eq!(
            state.pending_confirm().map(PendingConfirm::prompt),
            Some("Delete SEQ_010_roto?".to_owned())
        );
        state.dispatch(AppCommand::Cancel);
        assert!(state.pending_confirm().is_none());
        assert!(issued(&state.dispatch(AppCommand::Confirm)).is_empty());
    }

    #[test]
    fn detail_panel_ignores_out_of_order_comments() {
        let mut state = state_with_rows();
        let a = issued(&state.dispatch(AppCommand::Row {
            shot_id: ShotId::new(1),
            action: RowAction::Activate,
        }));
        let b = issued(&state.dispatch(AppCommand::Row {
            shot_id: ShotId::new(2),
            action: RowAction::Activate,
        }));
        let (Request::LoadComments { ticket: a }, Request::LoadComments { ticket: b }) =
            (a[0].clone(), b[0].clone())
        else {
            panic!("expected comment loads");
        };

        state.apply(Response::Comments {
            ticket: b,
            result: Ok(vec![comment(20, 2, "roto edges look good")]),
        });
        let late = state.apply(Response::Comments {
            ticket: a,
            result: Ok(vec![comment(10, 1, "stale")]),
        });
        assert!(late.is_empty());
        assert_eq!(state.active_shot(), Some(ShotId::new(2)));
        assert_eq!(state.detail().label(), "SEQ_010_roto");
        assert_eq!(state.detail().comments(), &[comment(20, 2, "roto edges look good")]);
    }

    #[test]
    fn adding_a_comment_clears_input_and_reloads() {
        let mut state = state_with_rows();
        assert_eq!(
            state.dispatch(AppCommand::AddComment("hello".to_owned())),
            vec![AppEvent::Notice("select a shot".to_owned())]
        );

        state.dispatch(AppCommand::Row {
            shot_id: ShotId::new(3),
            action: RowAction::Activate,
        });
        assert!(state.dispatch(AppCommand::AddComment("   ".to_owned())).is_empty());

        state.detail_mut().input = "  needs grain  ".to_owned();
        let draft = state.detail().input.clone();
        let events = state.dispatch(AppCommand::AddComment(draft));
        assert_eq!(
            issued(&events),
            vec![Request::AddComment {
                shot_id: ShotId::new(3),
                text: "needs grain".to_owned()
            }]
        );

        let added = state.apply(Response::CommentAdded {
            shot_id: ShotId::new(3),
            result: Ok(comment(30, 3, "needs grain")),
        });
        assert!(state.detail().input.is_empty());
        assert!(matches!(
            issued(&added).as_slice(),
            [Request::LoadComments { ticket }] if ticket.shot_id == ShotId::new(3)
        ));
    }

    #[test]
    fn status_change_patches_row_without_refetch() {
        let mut state = state_with_rows();
        let events = state.dispatch(AppCommand::Row {
            shot_id: ShotId::new(1),
            action: RowAction::ChangeStatus(ShotStatus::InReview),
        });
        assert_eq!(
            issued(&events),
            vec![Request::UpdateShot {
                shot_id: ShotId::new(1),
                update: ShotUpdate::status(ShotStatus::InReview),
            }]
        );
        assert_eq!(row_status(&state, 1), ShotStatus::InProgress);

        let mut updated = shot(1, "SEQ_010_comp", ShotStatus::InReview, "mia");
        updated.reel = String::new();
        let applied = state.apply(Response::ShotUpdated {
            shot_id: ShotId::new(1),
            update: ShotUpdate::status(ShotStatus::InReview),
            result: Ok(updated),
        });
        assert!(issued(&applied).is_empty());
        assert!(applied.contains(&AppEvent::RowPatched(ShotId::new(1))));
        assert_eq!(row_status(&state, 1), ShotStatus::InReview);
    }

    #[test]
    fn assignment_refreshes_artist_options() {
        let mut state = state_with_rows();
        let events = state.dispatch(AppCommand::Row {
            shot_id: ShotId::new(1),
            action: RowAction::Assign(" theo ".to_owned()),
        });
        assert_eq!(
            issued(&events),
            vec![Request::UpdateShot {
                shot_id: ShotId::new(1),
                update: ShotUpdate::assigned_to("theo"),
            }]
        );

        state.apply(Response::ShotUpdated {
            shot_id: ShotId::new(1),
            update: ShotUpdate::assigned_to("theo"),
            result: Ok(shot(1, "SEQ_010_comp", ShotStatus::InProgress, "theo")),
        });
        assert_eq!(state.options().artists, vec!["mia", "ravi", "theo"]);
        assert_eq!(state.options().reels, vec!["010", "020"]);
        assert_eq!(state.status_line.as_deref(), Some("SEQ_010_comp assigned to theo"));

        state.apply(Response::ShotUpdated {
            shot_id: ShotId::new(3),
            update: ShotUpdate::assigned_to("theo"),
            result: Ok(shot(3, "SEQ_020_comp", ShotStatus::OnHold, "theo")),
        });
        assert_eq!(state.options().artists, vec!["ravi", "theo"]);
    }

    #[test]
    fn failed_status_change_keeps_previous_status() {
        let mut state = state_with_rows();
        let events = state.apply(Response::ShotUpdated {
            shot_id: ShotId::new(3),
            update: ShotUpdate::status(ShotStatus::Final),
            result: Err(RosterError::network(Some(403), "forbidden")),
        });
        assert_eq!(row_status(&state, 3), ShotStatus::OnHold);
        assert_eq!(
            state.notice(),
            Some("Status update failed: server returned 403: forbidden")
        );
        assert!(issued(&events).is_empty());
    }

    #[test]
    fn patched_status_survives_older_roster_response() {
        let mut state = state_with_rows();
        let token = roster_token(&state.dispatch(AppCommand::Refresh));

        state.apply(Response::ShotUpdated {
            shot_id: ShotId::new(1),
            update: ShotUpdate::status(ShotStatus::Approved),
            result: Ok(shot(1, "SEQ_010_comp", ShotStatus::Approved, "mia")),
        });
        state.apply(Response::Roster {
            token,
            result: Ok(RosterResult::Flat(fixture_shots())),
        });
        assert_eq!(row_status(&state, 1), ShotStatus::Approved);

        let newer = roster_token(&state.dispatch(AppCommand::Refresh));
        state.apply(Response::Roster {
            token: newer,
            result: Ok(RosterResult::Flat(fixture_shots())),
        });
        assert_eq!(row_status(&state, 1), ShotStatus::InProgress);
    }

    #[test]
    fn grouped_roster_fetches_each_reel_independently() {
        let mut state = state_with_rows();
        let token = roster_token(&state.dispatch(AppCommand::SetGroupMode(GroupMode::Reel)));
        let events = state.apply(Response::Roster {
            token,
            result: Ok(RosterResult::Grouped(vec![
                ReelGroup {
                    reel: "010".to_owned(),
                    count: 2,
                },
                ReelGroup {
                    reel: "020".to_owned(),
                    count: 1,
                },
            ])),
        });
        let loads = issued(&events);
        assert_eq!(loads.len(), 2);
        let Request::LoadGroup { query, .. } = &loads[1] else {
            panic!("expected group load");
        };
        assert_eq!(query.query_string(), "reel=020");

        let attached = state.apply(Response::Group {
            token,
            index: 1,
            reel: "020".to_owned(),
            result: Ok(vec![shot(3, "SEQ_020_comp", ShotStatus::OnHold, "mia")]),
        });
        assert_eq!(
            attached,
            vec![AppEvent::GroupAttached {
                reel: "020".to_owned(),
                rows: 1
            }]
        );

        let stale = state.apply(Response::Group {
            token: token - 1,
            index: 0,
            reel: "010".to_owned(),
            result: Ok(fixture_shots()),
        });
        assert!(stale.is_empty());
        let RosterView::Grouped(groups) = state.roster() else {
            panic!("expected grouped view");
        };
        assert!(groups[0].rows.is_none());
        assert_eq!(groups[1].rows.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn grouped_payload_with_stray_elements_still_renders_groups() {
        let mut state = state_with_rows();
        let token = roster_token(&state.dispatch(AppCommand::SetGroupMode(GroupMode::Reel)));
        let result = classify(json!([
            {"reel": "010", "count": null},
            7,
            {"reel": "020", "count": 1},
        ]));
        let events = state.apply(Response::Roster { token, result });

        assert!(events.contains(&AppEvent::GroupsRendered { groups: 2 }));
        let reels: Vec<_> = issued(&events)
            .into_iter()
            .filter_map(|request| match request {
                Request::LoadGroup { index, reel, .. } => Some((index, reel)),
                _ => None,
            })
            .collect();
        assert_eq!(reels, vec![(0, "010".to_owned()), (1, "020".to_owned())]);
        let RosterView::Grouped(groups) = state.roster() else {
            panic!("expected grouped view");
        };
        assert_eq!(groups[0].header(), "Reel: 010 (0 shots)");
    }

    #[test]
    fn malformed_group_rows_leave_other_groups_untouched() {
        let mut state = state_with_rows();
        let token = roster_token(&state.dispatch(AppCommand::SetGroupMode(GroupMode::Reel)));
        state.apply(Response::Roster {
            token,
            result: Ok(RosterResult::Grouped(
                ["010", "020", "030"]
                    .into_iter()
                    .map(|reel| ReelGroup {
                        reel: reel.to_owned(),
                        count: 1,
                    })
                    .collect(),
            )),
        });
        state.apply(Response::Group {
            token,
            index: 0,
            reel: "010".to_owned(),
            result: Ok(vec![shot(1, "SEQ_010_comp", ShotStatus::InProgress, "mia")]),
        });
        let before = state.roster().clone();

        let malformed = decode_shots(json!([
            {"id": 3, "code": "SEQ_020_comp", "status": "On Hold"},
            {"code": "SEQ_020_noid"},
        ]));
        assert!(matches!(malformed, Err(RosterError::Parse(_))));
        let applied = state.apply(Response::Group {
            token,
            index: 1,
            reel: "020".to_owned(),
            result: malformed,
        });
        assert!(applied.is_empty());
        assert!(state.notice().is_none());
        assert_eq!(state.roster(), &before);

        let RosterView::Grouped(groups) = state.roster() else {
            panic!("expected grouped view");
        };
        assert_eq!(groups[0].rows.as_ref().map(Vec::len), Some(1));
        assert!(groups[1].rows.is_none());
        assert!(groups[2].rows.is_none());

        let late = state.apply(Response::Group {
            token,
            index: 2,
            reel: "030".to_owned(),
            result: Ok(Vec::new()),
        });
        assert_eq!(
            late,
            vec![AppEvent::GroupAttached {
                reel: "030".to_owned(),
                rows: 0
            }]
        );
        assert_eq!(state.roster().row_count(), 1);
    }

    #[test]
    fn tool_path_opens_or_reports_not_configured() {
        let mut state = state_with_rows();
        let opened = state.apply(Response::ToolPath {
            shot_id: ShotId::new(1),
            result: Ok(Some(r"S:\comp\SEQ_010_comp_v001.nk".to_owned())),
        });
        assert_eq!(
            opened,
            vec![AppEvent::OpenTarget(
                "file:///S:/comp/SEQ_010_comp_v001.nk".to_owned()
            )]
        );

        let missing = state.apply(Response::ToolPath {
            shot_id: ShotId::new(1),
            result: Ok(None),
        });
        assert_eq!(
            missing,
            vec![AppEvent::Notice("Nuke path not configured".to_owned())]
        );
    }

    #[test]
    fn generate_comp_refetches_only_on_success() {
        let mut state = state_with_rows();
        let created = state.apply(Response::CompGenerated {
            shot_id: ShotId::new(2),
            result: Ok("/shows/comp/SEQ_010_roto.nk".to_owned()),
        });
        assert_eq!(
            created[0],
            AppEvent::Notice("Created: /shows/comp/SEQ_010_roto.nk".to_owned())
        );
        assert_eq!(issued(&created).len(), 1);

        let failed = state.apply(Response::CompGenerated {
            shot_id: ShotId::new(2),
            result: Err(RosterError::network(Some(400), "no plate path")),
        });
        assert!(issued(&failed).is_empty());
        assert_eq!(
            state.notice(),
            Some("Generate failed: server returned 400: no plate path")
        );
    }

    #[test]
    fn open_buttons_are_disabled_without_paths() {
        let mut state = state_with_rows();
        let missing = state.dispatch(AppCommand::Row {
            shot_id: ShotId::new(1),
            action: RowAction::OpenMov,
        });
        assert_eq!(missing, vec![AppEvent::StatusUpdated("no MOV path".to_owned())]);

        let opened = state.dispatch(AppCommand::Row {
            shot_id: ShotId::new(2),
            action: RowAction::OpenMov,
        });
        assert_eq!(
            opened,
            vec![AppEvent::OpenTarget("file:///mnt/mov/a.mov".to_owned())]
        );
    }

    #[test]
    fn preference_toggle_persists_and_rederives() {
        let mut state = new_state();
        let events = state.dispatch(AppCommand::TogglePreference(PrefKey::ShowMovColumn));
        assert_eq!(
            events,
            vec![
                AppEvent::PreferenceChanged {
                    key: PrefKey::ShowMovColumn,
                    value: "false".to_owned()
                },
                AppEvent::StatusUpdated("MOV ✗".to_owned()),
            ]
        );
        assert!(!state.prefs().show_mov);
        assert_eq!(state.prefs().layout_classes(), vec!["hide-mov"]);

        state.dispatch(AppCommand::AdjustColumnWidth {
            column: RosterColumn::Code,
            delta: 2,
        });
        assert_eq!(
            state.prefs().width(RosterColumn::Code),
            RosterColumn::Code.default_width() + 2
        );
    }

    #[test]
    fn failed_preference_write_leaves_state_unchanged() {
        let mut state = AppState::new(Box::new(ReadOnlyStore)).expect("state");
        let events = state.dispatch(AppCommand::TogglePreference(PrefKey::LayoutTight));
        assert!(!state.prefs().tight);
        assert!(matches!(
            events.as_slice(),
            [AppEvent::Notice(message)] if message.starts_with("Saving preference failed")
        ));
    }

    #[test]
    fn export_requires_a_project() {
        let mut state = new_state();
        assert_eq!(
            state.dispatch(AppCommand::ExportCsv),
            vec![AppEvent::Notice("select a project".to_owned())]
        );

        let mut state = state_with_rows();
        state.dispatch(AppCommand::ToggleStatus(ShotStatus::Final));
        assert_eq!(
            state.dispatch(AppCommand::ExportCsv),
            vec![AppEvent::OpenApiPath(
                "/api/projects/1/export_csv?status=Final".to_owned()
            )]
        );
    }

    #[test]
    fn startup_project_is_selected_when_projects_arrive() {
        let mut state = new_state().with_startup_project(Some("lnd".to_owned()));
        let projects = vec![
            Project {
                id: ProjectId::new(4),
                name: "Harbor".to_owned(),
                short: "HBR".to_owned(),
                start_date: String::new(),
                details_text: String::new(),
                folder_path: String::new(),
            },
            Project {
                id: ProjectId::new(7),
                name: "Landfall".to_owned(),
                short: "LND".to_owned(),
                start_date: "2026-01-05".to_owned(),
                details_text: String::new(),
                folder_path: String::new(),
            },
        ];
        let events = state.apply(Response::Projects(Ok(projects)));
        assert!(events.contains(&AppEvent::ProjectSelected(ProjectId::new(7))));
        assert_eq!(issued(&events).len(), 1);
        assert_eq!(state.project().map(|p| p.name.as_str()), Some("Landfall"));
    }

    #[test]
    fn creating_a_project_reloads_the_project_list() {
        let mut state = state_with_rows();
        let events = state.dispatch(AppCommand::CreateProject(NewProject::new(
            "  Harbor Lights ",
            " 2026-03-02",
        )));
        assert_eq!(
            issued(&events),
            vec![Request::CreateProject(NewProject::new(
                "Harbor Lights",
                "2026-03-02"
            ))]
        );

        let created = state.apply(Response::ProjectCreated(Ok(Project {
            id: ProjectId::new(3),
            name: "Harbor Lights".to_owned(),
            short: "HARBOR".to_owned(),
            start_date: "2026-03-02".to_owned(),
            details_text: String::new(),
            folder_path: String::new(),
        })));
        assert_eq!(issued(&created), vec![Request::LoadProjects]);
        assert_eq!(
            state.status_line.as_deref(),
            Some("created project Harbor Lights")
        );
        assert_eq!(state.active_project(), Some(ProjectId::new(1)));
    }

    #[test]
    fn project_creation_needs_a_name_and_reports_failures() {
        let mut state = new_state();
        let blank = NewProject::new("   ", "2026-03-02");
        let events = state.dispatch(AppCommand::CreateProject(blank));
        assert_eq!(
            events,
            vec![AppEvent::Notice("project name required".to_owned())]
        );
        state.dispatch(AppCommand::DismissNotice);

        let failed = state.apply(Response::ProjectCreated(Err(RosterError::network(
            Some(403),
            "forbidden",
        ))));
        assert!(issued(&failed).is_empty());
        assert_eq!(
            state.notice(),
            Some("Create project failed: server returned 403: forbidden")
        );
        assert!(state.projects().is_empty());
    }

    #[test]
    fn selecting_a_project_resets_detail_and_selection() {
        let mut state = state_with_rows();
        state.dispatch(AppCommand::Row {
            shot_id: ShotId::new(1),
            action: RowAction::ToggleSelect,
        });
        state.dispatch(AppCommand::Row {
            shot_id: ShotId::new(1),
            action: RowAction::Activate,
        });
        let old = state.dispatch(AppCommand::Refresh);

        state.dispatch(AppCommand::SelectProject(ProjectId::new(2)));
        assert!(state.selection().is_empty());
        assert!(!state.detail().is_open());
        assert_eq!(state.roster(), &RosterView::Empty);

        let stale = state.apply(Response::Roster {
            token: roster_token(&old),
            result: Ok(RosterResult::Flat(fixture_shots())),
        });
        assert!(stale.is_empty());
    }
}
