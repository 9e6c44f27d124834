// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use shotdesk_app::{
    AppCommand, AppEvent, AppState, CommentId, FilterEdit, FilterField, FilterState, NewProject,
    PrefKey, Request, Response, RosterColumn, RosterRow, RosterView, RowAction, ShotId, ShotStatus,
};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::debug;

const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);
const DETAIL_PANEL_PERCENT: u16 = 38;

/// Executes controller requests and launches external targets. The UI
/// thread only ever talks to the network through this trait.
pub trait RosterRuntime {
    /// Runs one request to completion.
    fn execute(&mut self, request: Request) -> Response;

    /// Runs a request off the UI thread and posts the response to `tx`.
    /// The default runs inline, which suits in-memory backends.
    fn spawn_request(&mut self, request: Request, tx: Sender<InternalEvent>) -> Result<()> {
        let response = self.execute(request);
        tx.send(InternalEvent::Response(response))
            .map_err(|_| anyhow!("response channel closed"))?;
        Ok(())
    }

    /// Hands a normalized path or URL to the desktop launcher.
    fn open_target(&mut self, target: &str) -> Result<()>;

    /// Absolute URL for a server-relative API path.
    fn resolve_api_path(&self, path: &str) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
    Response(Response),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Focus {
    #[default]
    Roster,
    Detail,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum InputMode {
    #[default]
    Nav,
    /// Edits a draft of every scalar filter; one fetch on submit.
    Filter {
        field: FilterField,
        draft: FilterState,
    },
    /// Types into the detail panel's comment input.
    Comment,
    Assign {
        shot_id: ShotId,
        buffer: String,
    },
    Status {
        shot_id: ShotId,
        choice: ShotStatus,
    },
    Project {
        index: usize,
    },
    /// Project-creation form, opened from the project picker.
    NewProject {
        field: FormField,
        form: NewProject,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormField {
    Name,
    StartDate,
}

impl FormField {
    fn toggled(self) -> Self {
        match self {
            Self::Name => Self::StartDate,
            Self::StartDate => Self::Name,
        }
    }
}

impl InputMode {
    fn label(&self) -> &'static str {
        match self {
            Self::Nav => "NAV",
            Self::Filter { .. } => "FILTER",
            Self::Comment => "COMMENT",
            Self::Assign { .. } => "ASSIGN",
            Self::Status { .. } => "STATUS",
            Self::Project { .. } => "PROJECT",
            Self::NewProject { .. } => "NEW PROJECT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ViewData {
    cursor: usize,
    comment_cursor: usize,
    focus: Focus,
    input: InputMode,
    width_column: usize,
    help_visible: bool,
    status_token: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum BodyLine {
    Header(String),
    Loading,
    Row(ShotId),
}

pub fn run_app<R: RosterRuntime>(state: &mut AppState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();
    dispatch(
        state,
        runtime,
        &mut view_data,
        &internal_tx,
        AppCommand::Start,
    );

    let mut result = Ok(());
    loop {
        process_internal_events(state, runtime, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event {
            if let Event::Key(key) = event::read().context("read event")?
                && handle_key_event(state, runtime, &mut view_data, &internal_tx, key)
            {
                break;
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events<R: RosterRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::Response(response) => {
                let events = state.apply(response);
                handle_app_events(state, runtime, view_data, tx, events);
            }
        }
    }
}

fn dispatch<R: RosterRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    command: AppCommand,
) {
    let events = state.dispatch(command);
    handle_app_events(state, runtime, view_data, tx, events);
}

fn handle_app_events<R: RosterRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    events: Vec<AppEvent>,
) {
    for event in events {
        match event {
            AppEvent::Issue(request) => {
                if let Err(error) = runtime.spawn_request(request, tx.clone()) {
                    state.report_failure("Request", &error);
                }
            }
            AppEvent::OpenTarget(target) => open_external(state, runtime, &target),
            AppEvent::OpenApiPath(path) => {
                let url = runtime.resolve_api_path(&path);
                open_external(state, runtime, &url);
            }
            AppEvent::StatusUpdated(_) => {
                view_data.status_token = view_data.status_token.saturating_add(1);
                schedule_status_clear(tx, view_data.status_token);
            }
            AppEvent::ProjectSelected(_) => {
                view_data.cursor = 0;
                view_data.comment_cursor = 0;
                view_data.focus = Focus::Roster;
            }
            AppEvent::RosterRendered { .. }
            | AppEvent::GroupsRendered { .. }
            | AppEvent::GroupAttached { .. } => clamp_cursor(state, view_data),
            AppEvent::DetailLoaded { comments, .. } => {
                view_data.comment_cursor = view_data.comment_cursor.min(comments.saturating_sub(1));
            }
            AppEvent::Notice(message) => debug!(%message, "notice shown"),
            _ => {}
        }
    }
}

fn open_external<R: RosterRuntime>(state: &mut AppState, runtime: &mut R, target: &str) {
    debug!(target, "opening");
    if let Err(error) = runtime.open_target(target) {
        state.report_failure("Open", &error);
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.status_line = Some(message.into());
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn clamp_cursor(state: &AppState, view_data: &mut ViewData) {
    let rows = state.roster().row_count();
    view_data.cursor = view_data.cursor.min(rows.saturating_sub(1));
}

fn cursor_row(state: &AppState, view_data: &ViewData) -> Option<ShotId> {
    state
        .roster()
        .rows()
        .get(view_data.cursor)
        .map(|row| row.id())
}

fn width_target(view_data: &ViewData) -> RosterColumn {
    RosterColumn::ALL[view_data.width_column % RosterColumn::ALL.len()]
}

fn selected_comment(state: &AppState, view_data: &ViewData) -> Option<CommentId> {
    state
        .detail()
        .comments()
        .get(view_data.comment_cursor)
        .map(|comment| comment.id)
}

fn handle_key_event<R: RosterRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if state.notice().is_some() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
            dispatch(state, runtime, view_data, internal_tx, AppCommand::DismissNotice);
        }
        return false;
    }

    if state.pending_confirm().is_some() {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                dispatch(state, runtime, view_data, internal_tx, AppCommand::Confirm);
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                dispatch(state, runtime, view_data, internal_tx, AppCommand::Cancel);
            }
            _ => {}
        }
        return false;
    }

    if view_data.help_visible {
        if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
            view_data.help_visible = false;
        }
        return false;
    }

    match std::mem::take(&mut view_data.input) {
        InputMode::Nav => {}
        InputMode::Filter { field, draft } => {
            handle_filter_key(state, runtime, view_data, internal_tx, key, field, draft);
            return false;
        }
        InputMode::Comment => {
            handle_comment_key(state, runtime, view_data, internal_tx, key);
            return false;
        }
        InputMode::Assign { shot_id, buffer } => {
            handle_assign_key(state, runtime, view_data, internal_tx, key, shot_id, buffer);
            return false;
        }
        InputMode::Status { shot_id, choice } => {
            handle_status_key(state, runtime, view_data, internal_tx, key, shot_id, choice);
            return false;
        }
        InputMode::Project { index } => {
            handle_project_key(state, runtime, view_data, internal_tx, key, index);
            return false;
        }
        InputMode::NewProject { field, form } => {
            handle_new_project_key(state, runtime, view_data, internal_tx, key, field, form);
            return false;
        }
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return false;
    }

    if view_data.focus == Focus::Detail {
        handle_detail_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    handle_roster_key(state, runtime, view_data, internal_tx, key)
}

fn handle_roster_key<R: RosterRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    let row = cursor_row(state, view_data);
    let row_command = |action: RowAction| row.map(|shot_id| AppCommand::Row { shot_id, action });

    let command = match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('?') => {
            view_data.help_visible = true;
            None
        }
        KeyCode::Char('j') | KeyCode::Down => {
            let rows = state.roster().row_count();
            if view_data.cursor + 1 < rows {
                view_data.cursor += 1;
            }
            None
        }
        KeyCode::Char('k') | KeyCode::Up => {
            view_data.cursor = view_data.cursor.saturating_sub(1);
            None
        }
        KeyCode::Char('g') | KeyCode::Home => {
            view_data.cursor = 0;
            None
        }
        KeyCode::Char('G') | KeyCode::End => {
            view_data.cursor = state.roster().row_count().saturating_sub(1);
            None
        }
        KeyCode::Tab => {
            if state.detail().is_open() {
                view_data.focus = Focus::Detail;
            } else {
                emit_status(state, view_data, tx, "open a shot first");
            }
            None
        }
        KeyCode::Char(' ') => row_command(RowAction::ToggleSelect),
        KeyCode::Enter => row_command(RowAction::Activate),
        KeyCode::Char('p') => row_command(RowAction::OpenPlate),
        KeyCode::Char('m') => row_command(RowAction::OpenMov),
        KeyCode::Char('e') => row_command(RowAction::OpenExr),
        KeyCode::Char('n') => row_command(RowAction::ResolveToolPath),
        KeyCode::Char('N') => row_command(RowAction::GenerateComp),
        KeyCode::Char('x') => row_command(RowAction::Delete),
        KeyCode::Char('X') => Some(AppCommand::BulkDelete),
        KeyCode::Char('s') => {
            if let Some(shot_id) = row
                && let Some(current) = state.roster().row(shot_id).map(|r| r.shot.status)
            {
                view_data.input = InputMode::Status {
                    shot_id,
                    choice: current,
                };
            }
            None
        }
        KeyCode::Char('a') => {
            if let Some(shot_id) = row
                && let Some(artist) = state
                    .roster()
                    .row(shot_id)
                    .map(|r| r.shot.assigned_to.clone())
            {
                view_data.input = InputMode::Assign {
                    shot_id,
                    buffer: artist,
                };
            }
            None
        }
        KeyCode::Char(digit @ '1'..='7') => {
            let index = digit as usize - '1' as usize;
            ShotStatus::ALL
                .get(index)
                .map(|status| AppCommand::ToggleStatus(*status))
        }
        KeyCode::Char('0') => Some(AppCommand::ClearStatuses),
        KeyCode::Char('*') => Some(AppCommand::SelectAllStatuses),
        KeyCode::Char('f') => {
            view_data.input = InputMode::Filter {
                field: FilterField::Reel,
                draft: state.filters().clone(),
            };
            None
        }
        KeyCode::Char('F') => Some(AppCommand::ClearFilters),
        KeyCode::Char('r') => Some(AppCommand::SetGroupMode(state.filters().group.toggled())),
        KeyCode::Char('R') => Some(AppCommand::Refresh),
        KeyCode::Char('P') => {
            let index = state
                .active_project()
                .and_then(|id| state.projects().iter().position(|p| p.id == id))
                .unwrap_or(0);
            view_data.input = InputMode::Project { index };
            None
        }
        KeyCode::Char('o') => Some(AppCommand::ExportCsv),
        KeyCode::Char('t') => Some(AppCommand::TogglePreference(PrefKey::LayoutTight)),
        KeyCode::Char('T') => Some(AppCommand::TogglePreference(PrefKey::LayoutCompact)),
        KeyCode::Char('M') => Some(AppCommand::TogglePreference(PrefKey::ShowMovColumn)),
        KeyCode::Char('E') => Some(AppCommand::TogglePreference(PrefKey::ShowExrColumn)),
        KeyCode::Char('w') => {
            view_data.width_column = (view_data.width_column + 1) % RosterColumn::ALL.len();
            let column = width_target(view_data);
            let label = format!(
                "width: {} {}",
                column.as_str(),
                state.prefs().width(column)
            );
            emit_status(state, view_data, tx, label);
            None
        }
        KeyCode::Char('+') | KeyCode::Char('=') => Some(AppCommand::AdjustColumnWidth {
            column: width_target(view_data),
            delta: 1,
        }),
        KeyCode::Char('-') => Some(AppCommand::AdjustColumnWidth {
            column: width_target(view_data),
            delta: -1,
        }),
        _ => None,
    };

    if let Some(command) = command {
        dispatch(state, runtime, view_data, tx, command);
    }
    false
}

fn handle_detail_key<R: RosterRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Tab | KeyCode::Esc => view_data.focus = Focus::Roster,
        KeyCode::Char('j') | KeyCode::Down => {
            let count = state.detail().comments().len();
            if view_data.comment_cursor + 1 < count {
                view_data.comment_cursor += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            view_data.comment_cursor = view_data.comment_cursor.saturating_sub(1);
        }
        KeyCode::Char('c') => {
            let detail = state.detail_mut();
            detail.editing = None;
            detail.input.clear();
            view_data.input = InputMode::Comment;
        }
        KeyCode::Char('e') => {
            let Some(comment_id) = selected_comment(state, view_data) else {
                return;
            };
            let text = state
                .detail()
                .comment(comment_id)
                .map(|comment| comment.text.clone())
                .unwrap_or_default();
            let detail = state.detail_mut();
            detail.editing = Some(comment_id);
            detail.input = text;
            view_data.input = InputMode::Comment;
        }
        KeyCode::Char('d') => {
            if let Some(comment_id) = selected_comment(state, view_data) {
                dispatch(
                    state,
                    runtime,
                    view_data,
                    tx,
                    AppCommand::DeleteComment(comment_id),
                );
            }
        }
        _ => {}
    }
}

fn handle_comment_key<R: RosterRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Esc => {
            let detail = state.detail_mut();
            detail.editing = None;
            detail.input.clear();
        }
        KeyCode::Enter => {
            let draft = state.detail().input.clone();
            let command = match state.detail().editing {
                Some(comment_id) => AppCommand::EditComment {
                    comment_id,
                    text: draft,
                },
                None => AppCommand::AddComment(draft),
            };
            dispatch(state, runtime, view_data, tx, command);
        }
        KeyCode::Backspace => {
            state.detail_mut().input.pop();
            view_data.input = InputMode::Comment;
        }
        KeyCode::Char(ch) => {
            state.detail_mut().input.push(ch);
            view_data.input = InputMode::Comment;
        }
        _ => view_data.input = InputMode::Comment,
    }
}

fn handle_filter_key<R: RosterRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
    field: FilterField,
    mut draft: FilterState,
) {
    let picked = matches!(field, FilterField::Reel | FilterField::Artist);
    let mut field = field;
    match key.code {
        KeyCode::Esc => return,
        KeyCode::Enter => {
            let edits = FilterField::ALL
                .into_iter()
                .filter(|f| draft.field(*f) != state.filters().field(*f))
                .map(|f| FilterEdit::SetField(f, draft.field(f).to_owned()))
                .collect();
            dispatch(state, runtime, view_data, tx, AppCommand::EditFilters(edits));
            return;
        }
        KeyCode::Down | KeyCode::Tab => field = field.next(),
        KeyCode::Up | KeyCode::BackTab => field = prev_field(field),
        KeyCode::Left | KeyCode::Right if picked => {
            let options = match field {
                FilterField::Reel => &state.options().reels,
                _ => &state.options().artists,
            };
            let next = cycle_option(options, draft.field(field), key.code == KeyCode::Right);
            draft.set_field(field, next);
        }
        KeyCode::Backspace if !picked => {
            let mut value = draft.field(field).to_owned();
            value.pop();
            draft.set_field(field, value);
        }
        KeyCode::Char(ch) if !picked => {
            let mut value = draft.field(field).to_owned();
            value.push(ch);
            draft.set_field(field, value);
        }
        _ => {}
    }
    view_data.input = InputMode::Filter { field, draft };
}

fn prev_field(field: FilterField) -> FilterField {
    let len = FilterField::ALL.len();
    let index = FilterField::ALL
        .iter()
        .position(|f| *f == field)
        .unwrap_or(0);
    FilterField::ALL[(index + len - 1) % len]
}

/// Steps through `options` with a leading "any" entry.
fn cycle_option(options: &[String], current: &str, forward: bool) -> String {
    let mut choices = vec![""];
    choices.extend(options.iter().map(String::as_str));
    let len = choices.len();
    let index = choices.iter().position(|c| *c == current).unwrap_or(0);
    let next = if forward {
        (index + 1) % len
    } else {
        (index + len - 1) % len
    };
    choices[next].to_owned()
}

fn handle_assign_key<R: RosterRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
    shot_id: ShotId,
    mut buffer: String,
) {
    match key.code {
        KeyCode::Esc => return,
        KeyCode::Enter => {
            dispatch(
                state,
                runtime,
                view_data,
                tx,
                AppCommand::Row {
                    shot_id,
                    action: RowAction::Assign(buffer),
                },
            );
            return;
        }
        KeyCode::Tab => {
            buffer = cycle_option(&state.options().artists, buffer.trim(), true);
        }
        KeyCode::Backspace => {
            buffer.pop();
        }
        KeyCode::Char(ch) => buffer.push(ch),
        _ => {}
    }
    view_data.input = InputMode::Assign { shot_id, buffer };
}

fn handle_status_key<R: RosterRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
    shot_id: ShotId,
    choice: ShotStatus,
) {
    let choice = match key.code {
        KeyCode::Esc => return,
        KeyCode::Enter => {
            dispatch(
                state,
                runtime,
                view_data,
                tx,
                AppCommand::Row {
                    shot_id,
                    action: RowAction::ChangeStatus(choice),
                },
            );
            return;
        }
        KeyCode::Right | KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('l') => choice.next(),
        KeyCode::Left | KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('h') => choice.prev(),
        _ => choice,
    };
    view_data.input = InputMode::Status { shot_id, choice };
}

fn handle_project_key<R: RosterRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
    index: usize,
) {
    let count = state.projects().len();
    let index = match key.code {
        KeyCode::Esc => return,
        KeyCode::Enter => {
            if let Some(project) = state.projects().get(index).map(|p| p.id) {
                dispatch(state, runtime, view_data, tx, AppCommand::SelectProject(project));
            }
            return;
        }
        KeyCode::Char('n') => {
            view_data.input = InputMode::NewProject {
                field: FormField::Name,
                form: NewProject::default(),
            };
            return;
        }
        KeyCode::Char('j') | KeyCode::Down if index + 1 < count => index + 1,
        KeyCode::Char('k') | KeyCode::Up => index.saturating_sub(1),
        _ => index,
    };
    view_data.input = InputMode::Project { index };
}

fn handle_new_project_key<R: RosterRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
    mut field: FormField,
    mut form: NewProject,
) {
    let value = match field {
        FormField::Name => &mut form.name,
        FormField::StartDate => &mut form.start_date,
    };
    match key.code {
        KeyCode::Esc => return,
        KeyCode::Enter => {
            dispatch(state, runtime, view_data, tx, AppCommand::CreateProject(form));
            return;
        }
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Down | KeyCode::Up => field = field.toggled(),
        KeyCode::Backspace => {
            value.pop();
        }
        KeyCode::Char(ch) => value.push(ch),
        _ => {}
    }
    view_data.input = InputMode::NewProject { field, form };
}

fn body_lines(roster: &RosterView) -> Vec<BodyLine> {
    match roster {
        RosterView::Empty => Vec::new(),
        RosterView::Flat(rows) => rows.iter().map(|row| BodyLine::Row(row.id())).collect(),
        RosterView::Grouped(groups) => {
            let mut lines = Vec::new();
            for group in groups {
                lines.push(BodyLine::Header(group.header()));
                match &group.rows {
                    Some(rows) => lines.extend(rows.iter().map(|row| BodyLine::Row(row.id()))),
                    None => lines.push(BodyLine::Loading),
                }
            }
            lines
        }
    }
}

fn status_color(status: ShotStatus) -> Color {
    match status {
        ShotStatus::NotStarted => Color::Gray,
        ShotStatus::InProgress => Color::Blue,
        ShotStatus::OnHold => Color::Yellow,
        ShotStatus::Kickback => Color::Red,
        ShotStatus::InReview => Color::Magenta,
        ShotStatus::Approved => Color::Cyan,
        ShotStatus::Final => Color::Green,
    }
}

/// Pads or truncates to exactly `width` columns.
fn fit(text: &str, width: u16) -> String {
    let width = usize::from(width);
    let mut fitted: String = text.chars().take(width).collect();
    let used = fitted.chars().count();
    fitted.extend(std::iter::repeat_n(' ', width - used));
    fitted
}

fn cell_text(column: RosterColumn, row: &RosterRow, selected: bool) -> String {
    let shot = &row.shot;
    match column {
        RosterColumn::Select => String::from(if selected { "[x]" } else { "[ ]" }),
        RosterColumn::Thumb => row.thumb.glyph().to_owned(),
        RosterColumn::Code => shot.code.clone(),
        RosterColumn::Reel => row.reel.clone(),
        RosterColumn::Version => shot.version.clone(),
        RosterColumn::Artist => shot.assigned_to.clone(),
        RosterColumn::Due => shot.due_date.clone(),
        RosterColumn::Status => shot.status.as_str().to_owned(),
        RosterColumn::Mov => media_mark(shot.mov()).to_owned(),
        RosterColumn::Exr => media_mark(shot.exr()).to_owned(),
        RosterColumn::Tool => "nk".to_owned(),
        RosterColumn::Actions => "gen · del".to_owned(),
    }
}

fn media_mark(path: Option<&str>) -> &'static str {
    if path.is_some() { "▶" } else { "-" }
}

fn column_spacing(state: &AppState) -> &'static str {
    if state.prefs().tight { "" } else { " " }
}

fn header_text(state: &AppState) -> String {
    let prefs = state.prefs();
    prefs
        .visible_columns()
        .into_iter()
        .map(|column| fit(column.label(), prefs.width(column)))
        .collect::<Vec<_>>()
        .join(column_spacing(state))
}

fn row_line(state: &AppState, row: &RosterRow, under_cursor: bool) -> Line<'static> {
    let prefs = state.prefs();
    let selected = state.selection().contains(row.id());
    let active = state.active_shot() == Some(row.id());
    let spacing = column_spacing(state);

    let mut spans = Vec::new();
    for (index, column) in prefs.visible_columns().into_iter().enumerate() {
        if index > 0 && !spacing.is_empty() {
            spans.push(Span::raw(spacing));
        }
        let mut style = Style::default();
        if column == RosterColumn::Status {
            style = style.fg(status_color(row.shot.status));
        }
        if column == RosterColumn::Thumb && !row.thumb.enabled() {
            style = style.fg(Color::DarkGray);
        }
        spans.push(Span::styled(
            fit(&cell_text(column, row, selected), prefs.width(column)),
            style,
        ));
    }

    let mut line_style = Style::default();
    if active {
        line_style = line_style.add_modifier(Modifier::BOLD);
    }
    if under_cursor {
        line_style = line_style.bg(Color::DarkGray);
    }
    Line::from(spans).style(line_style)
}

fn legend_line(state: &AppState) -> Line<'static> {
    let spans = state
        .legend()
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let label = format!(" {}:{} ", index + 1, entry.status.as_str());
            let color = status_color(entry.status);
            let style = if entry.active {
                Style::default()
                    .fg(Color::Black)
                    .bg(color)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(color)
            };
            Span::styled(label, style)
        })
        .collect::<Vec<_>>();
    Line::from(spans)
}

fn filter_summary(filters: &FilterState) -> String {
    let mut parts = FilterField::ALL
        .into_iter()
        .filter(|field| !filters.field(*field).trim().is_empty())
        .map(|field| format!("{}={}", field.query_key(), filters.field(field).trim()))
        .collect::<Vec<_>>();
    if parts.is_empty() {
        parts.push("no filters".to_owned());
    }
    parts.push(format!("group={}", filters.group.as_str()));
    parts.join("  ")
}

fn title_text(state: &AppState) -> String {
    let project = state
        .project()
        .map(|project| {
            if project.short.is_empty() {
                project.name.clone()
            } else {
                format!("{} [{}]", project.name, project.short)
            }
        })
        .unwrap_or_else(|| "no project (P to pick)".to_owned());
    let session = state
        .session()
        .map(|session| session.label())
        .filter(|label| !label.is_empty())
        .unwrap_or_else(|| "not logged in".to_owned());
    let classes = state.prefs().layout_classes();
    if classes.is_empty() {
        format!("{project} | {session}")
    } else {
        format!("{project} | {session} | {}", classes.join(" "))
    }
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let header = Paragraph::new(title_text(state))
        .block(Block::default().title("shotdesk").borders(Borders::ALL));
    frame.render_widget(header, layout[0]);

    let filter_text = match &view_data.input {
        InputMode::Filter { field, draft } => filter_editor_line(*field, draft),
        _ => Line::from(filter_summary(state.filters())),
    };
    let filters = Paragraph::new(vec![legend_line(state), filter_text])
        .block(Block::default().title("filters").borders(Borders::ALL));
    frame.render_widget(filters, layout[1]);

    let body = if state.detail().is_open() {
        let split = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(100 - DETAIL_PANEL_PERCENT),
                Constraint::Percentage(DETAIL_PANEL_PERCENT),
            ])
            .split(layout[2]);
        render_detail(frame, split[1], state, view_data);
        split[0]
    } else {
        layout[2]
    };
    render_roster(frame, body, state, view_data);

    let status = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[3]);

    render_overlays(frame, state, view_data);
}

fn filter_editor_line(field: FilterField, draft: &FilterState) -> Line<'static> {
    let spans = FilterField::ALL
        .into_iter()
        .map(|f| {
            let text = format!(" {}: {} ", f.label(), draft.field(f));
            if f == field {
                Span::styled(
                    text,
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                Span::raw(text)
            }
        })
        .collect::<Vec<_>>();
    Line::from(spans)
}

fn render_roster(frame: &mut ratatui::Frame<'_>, area: Rect, state: &AppState, view_data: &ViewData) {
    let cursor_id = if view_data.focus == Focus::Roster {
        cursor_row(state, view_data)
    } else {
        None
    };

    let mut lines = vec![Line::from(Span::styled(
        header_text(state),
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    ))];
    let mut cursor_line = 0;
    for line in body_lines(state.roster()) {
        match line {
            BodyLine::Header(text) => lines.push(Line::from(Span::styled(
                text,
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ))),
            BodyLine::Loading => lines.push(Line::from(Span::styled(
                "  loading…",
                Style::default().fg(Color::DarkGray),
            ))),
            BodyLine::Row(id) => {
                let Some(row) = state.roster().row(id) else {
                    continue;
                };
                let under_cursor = cursor_id == Some(id);
                if under_cursor {
                    cursor_line = lines.len();
                }
                lines.push(row_line(state, row, under_cursor));
            }
        }
    }
    if lines.len() == 1 {
        let hint = if state.active_project().is_some() {
            "no shots match"
        } else {
            "select a project with P"
        };
        lines.push(Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray))));
    }

    let compact = state.prefs().compact;
    let inner_height = if compact {
        area.height
    } else {
        area.height.saturating_sub(2)
    };
    let offset = scroll_offset(cursor_line, usize::from(inner_height));

    let title = match state.selection().len() {
        0 => format!("shots ({})", state.roster().row_count()),
        n => format!("shots ({}) | {n} selected, X to delete", state.roster().row_count()),
    };
    let mut widget = Paragraph::new(lines).scroll((u16::try_from(offset).unwrap_or(u16::MAX), 0));
    if !compact {
        widget = widget.block(Block::default().title(title).borders(Borders::ALL));
    }
    frame.render_widget(widget, area);
}

fn scroll_offset(cursor_line: usize, height: usize) -> usize {
    if height == 0 || cursor_line < height {
        0
    } else {
        cursor_line + 1 - height
    }
}

fn render_detail(frame: &mut ratatui::Frame<'_>, area: Rect, state: &AppState, view_data: &ViewData) {
    let detail = state.detail();
    let focused = view_data.focus == Focus::Detail;
    let mut lines = Vec::new();
    if detail.comments().is_empty() {
        lines.push(Line::from(Span::styled(
            "no comments",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for (index, comment) in detail.comments().iter().enumerate() {
        let mut meta = format!("{} ", comment.author);
        if !comment.author_role.is_empty() {
            meta.push_str(&format!("({}) ", comment.author_role));
        }
        meta.push_str(&comment.created_at);
        let mut style = Style::default();
        if focused && index == view_data.comment_cursor {
            style = style.bg(Color::DarkGray);
        }
        lines.push(Line::from(Span::styled(
            meta,
            style.fg(Color::Cyan),
        )));
        lines.push(Line::from(Span::styled(comment.text.clone(), style)));
    }

    lines.push(Line::from(""));
    let prompt = if detail.editing.is_some() {
        "edit> "
    } else {
        "> "
    };
    let mut input = format!("{prompt}{}", detail.input);
    if view_data.input == InputMode::Comment {
        input.push('▏');
    }
    lines.push(Line::from(input));

    let border = if focused { Color::Cyan } else { Color::White };
    let widget = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .title(detail.label().to_owned())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border)),
    );
    frame.render_widget(widget, area);
}

fn render_overlays(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    if let Some(notice) = state.notice() {
        render_popup(frame, 60, 20, "notice", vec![
            Line::from(notice.to_owned()),
            Line::from(""),
            Line::from(Span::styled(
                "enter to dismiss",
                Style::default().fg(Color::DarkGray),
            )),
        ]);
        return;
    }

    if let Some(pending) = state.pending_confirm() {
        render_popup(frame, 50, 20, "confirm", vec![
            Line::from(pending.prompt()),
            Line::from(""),
            Line::from(Span::styled("y / n", Style::default().fg(Color::DarkGray))),
        ]);
        return;
    }

    match &view_data.input {
        InputMode::Status { choice, .. } => {
            let lines = ShotStatus::ALL
                .into_iter()
                .map(|status| {
                    let style = if status == *choice {
                        Style::default()
                            .fg(Color::Black)
                            .bg(status_color(status))
                            .add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(status_color(status))
                    };
                    Line::from(Span::styled(status.as_str(), style))
                })
                .collect();
            render_popup(frame, 30, 40, "status", lines);
        }
        InputMode::Assign { buffer, .. } => {
            render_popup(frame, 50, 20, "assign", vec![
                Line::from(format!("> {buffer}▏")),
                Line::from(Span::styled(
                    "tab cycles known artists",
                    Style::default().fg(Color::DarkGray),
                )),
            ]);
        }
        InputMode::Project { .. } if state.projects().is_empty() => {
            render_popup(frame, 50, 20, "projects", vec![
                Line::from("no projects yet"),
                Line::from(Span::styled(
                    "n to create one",
                    Style::default().fg(Color::DarkGray),
                )),
            ]);
        }
        InputMode::Project { index } => {
            let lines = state
                .projects()
                .iter()
                .enumerate()
                .map(|(i, project)| {
                    let text = format!("{} [{}]", project.name, project.short);
                    if i == *index {
                        Line::from(Span::styled(
                            text,
                            Style::default().fg(Color::Black).bg(Color::Cyan),
                        ))
                    } else {
                        Line::from(text)
                    }
                })
                .collect();
            render_popup(frame, 50, 50, "projects", lines);
        }
        InputMode::NewProject { field, form } => {
            let caret = |active: bool| if active { "▏" } else { "" };
            render_popup(frame, 50, 25, "new project", vec![
                Line::from(format!(
                    "name:  {}{}",
                    form.name,
                    caret(*field == FormField::Name)
                )),
                Line::from(format!(
                    "start: {}{}",
                    form.start_date,
                    caret(*field == FormField::StartDate)
                )),
                Line::from(""),
                Line::from(Span::styled(
                    "start date as YYYY-MM-DD, may be left blank",
                    Style::default().fg(Color::DarkGray),
                )),
            ]);
        }
        _ => {}
    }

    if view_data.help_visible {
        let lines = HELP_LINES.iter().map(|line| Line::from(*line)).collect();
        render_popup(frame, 70, 80, "help", lines);
    }
}

const HELP_LINES: [&str; 17] = [
    "j/k g/G     move",
    "enter       open comments   tab  focus comments",
    "space       select          X    delete selected",
    "p m e       open plate / MOV / EXR",
    "s           change status   a    assign artist",
    "n / N       open / generate Nuke script",
    "x           delete shot",
    "1-7 0 *     toggle status / clear / all",
    "f / F       edit filters / clear filters",
    "r / R       group by reel / refresh",
    "P           pick project    o    export CSV",
    "P n         new project",
    "t T         tight / compact layout",
    "M E         MOV / EXR column",
    "w - +       pick column, narrow, widen",
    "comments    c new, e edit, d delete",
    "ctrl+q q    quit",
];

fn render_popup(
    frame: &mut ratatui::Frame<'_>,
    percent_x: u16,
    percent_y: u16,
    title: &str,
    lines: Vec<Line<'static>>,
) {
    let area = centered_rect(percent_x, percent_y, frame.area());
    frame.render_widget(Clear, area);
    let popup = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().title(title.to_owned()).borders(Borders::ALL));
    frame.render_widget(popup, area);
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    let hints = match &view_data.input {
        InputMode::Nav if view_data.focus == Focus::Detail => {
            "j/k | c new | e edit | d delete | tab back"
        }
        InputMode::Nav => "j/k | enter | space | s a | n N | 1-7 | f r | P o | ? help | q",
        InputMode::Filter { .. } => "tab/↑↓ field | ←→ pick | type | enter apply | esc",
        InputMode::Comment => "type | enter save | esc cancel",
        InputMode::Assign { .. } => "type | tab cycle | enter save | esc",
        InputMode::Status { .. } => "←→ pick | enter apply | esc",
        InputMode::Project { .. } => "j/k | enter select | n new | esc",
        InputMode::NewProject { .. } => "type | tab field | enter create | esc",
    };
    let mode = view_data.input.label();
    match &state.status_line {
        Some(status) => format!("{mode} | {status} | {hints}"),
        None => format!("{mode} | {hints}"),
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
