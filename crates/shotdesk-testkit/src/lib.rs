// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use shotdesk_app::{
    Comment, CommentId, NewProject, Project, ProjectId, ReelGroup, Request, Response, RosterError,
    RosterQuery, RosterResult, SessionInfo, Shot, ShotId, ShotStatus, ShotUpdate, derive_reel,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use time::macros::{datetime, format_description};
use time::{Duration, OffsetDateTime};

const ARTISTS: [&str; 8] = [
    "mia", "jonas", "priya", "theo", "sana", "oskar", "lena", "rafa",
];

const TASKS: [&str; 10] = [
    "paint out rig",
    "sky replacement",
    "roto hero",
    "add muzzle flash",
    "cleanup boom shadow",
    "extend set",
    "beauty pass",
    "match grain",
    "remove tracking markers",
    "relight window",
];

const PLATE_EXTENSIONS: [&str; 4] = ["jpg", "mp4", "dpx", ""];

const EDITOR_ROLES: [&str; 3] = ["admin", "producer", "supervisor"];
const PROJECT_ROLES: [&str; 2] = ["admin", "producer"];
const SHORT_CODE_LEN: usize = 6;

const FIXTURE_REELS: [&str; 3] = ["010", "020", "030"];
const SHOTS_PER_REEL: usize = 4;

fn reference_now() -> OffsetDateTime {
    datetime!(2026-02-19 12:34:56 UTC)
}

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Seeded generator for roster fixtures. The same seed always yields the
/// same shots.
#[derive(Debug, Clone)]
pub struct ShotFaker {
    rng: DeterministicRng,
    seed: u64,
}

impl ShotFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            seed: normalized,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn status(&mut self) -> ShotStatus {
        ShotStatus::ALL[self.rng.int_n(ShotStatus::ALL.len())]
    }

    /// Blank roughly one time in five.
    pub fn artist(&mut self) -> String {
        if self.rng.int_n(5) == 0 {
            String::new()
        } else {
            self.pick(&ARTISTS).to_owned()
        }
    }

    pub fn shot(&mut self, id: i64, project: &Project, reel: &str, number: usize) -> Shot {
        let code = format!("{}_{reel}_sh{number:02}", project.short);
        let root = if project.folder_path.is_empty() {
            format!("/mnt/{}", project.short.to_ascii_lowercase())
        } else {
            project.folder_path.clone()
        };

        let plate_path = match self.pick(&PLATE_EXTENSIONS) {
            "" => String::new(),
            ext => format!("{root}/plates/{reel}/{code}_plate.{ext}"),
        };
        let mov_path = if self.rng.int_n(3) == 0 {
            String::new()
        } else {
            format!("{root}/renders/{reel}/{code}.mov")
        };
        let exr_path = if self.rng.int_n(3) == 0 {
            String::new()
        } else {
            format!("{root}/renders/{reel}/{code}/exr")
        };

        let due = reference_now() + Duration::days(7 + self.rng.int_n(28) as i64);
        Shot {
            id: ShotId::new(id),
            project_id: Some(project.id),
            code,
            reel: String::new(),
            description: self.pick(&TASKS).to_owned(),
            assigned_to: self.artist(),
            start_date: format_date(reference_now()),
            due_date: format_date(due),
            status: self.status(),
            plate_path,
            mov_path,
            exr_path,
            version: format!("V{:03}", 1 + self.rng.int_n(4)),
            nuke_path: String::new(),
        }
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }
}

pub fn fixture_projects() -> Vec<Project> {
    vec![
        Project {
            id: ProjectId::new(1),
            name: "Landfall".to_owned(),
            short: "LND".to_owned(),
            start_date: "2026-01-05".to_owned(),
            details_text: "Feature, 3 reels".to_owned(),
            folder_path: "/shows/landfall".to_owned(),
        },
        Project {
            id: ProjectId::new(2),
            name: "Night Ferry".to_owned(),
            short: "NFY".to_owned(),
            start_date: "2026-02-02".to_owned(),
            details_text: "Episodic".to_owned(),
            folder_path: String::new(),
        },
    ]
}

/// Every fixture project gets `SHOTS_PER_REEL` shots in each fixture reel.
pub fn fixture_shots(projects: &[Project], seed: u64) -> Vec<Shot> {
    let mut faker = ShotFaker::new(seed);
    let mut shots = Vec::new();
    let mut next_id = 1;
    for project in projects {
        for reel in FIXTURE_REELS {
            for number in 1..=SHOTS_PER_REEL {
                shots.push(faker.shot(next_id, project, reel, number));
                next_id += 1;
            }
        }
    }
    shots
}

pub fn fixture_session() -> SessionInfo {
    SessionInfo {
        logged_in: true,
        username: "lead".to_owned(),
        role: "supervisor".to_owned(),
        display_name: "Comp Lead".to_owned(),
    }
}

/// A bare shot for tests that only care about a few fields.
pub fn fixture_shot(id: i64, code: &str, status: ShotStatus) -> Shot {
    Shot {
        id: ShotId::new(id),
        project_id: Some(ProjectId::new(1)),
        code: code.to_owned(),
        reel: String::new(),
        description: String::new(),
        assigned_to: String::new(),
        start_date: String::new(),
        due_date: String::new(),
        status,
        plate_path: String::new(),
        mov_path: String::new(),
        exr_path: String::new(),
        version: String::new(),
        nuke_path: String::new(),
    }
}

pub fn fixture_datetime() -> &'static str {
    "2026-02-19T12:34:56"
}

pub fn temp_prefs_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("prefs.db");
    Ok((dir, db_path))
}

fn format_date(at: OffsetDateTime) -> String {
    at.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_default()
}

fn format_timestamp(at: OffsetDateTime) -> String {
    at.format(format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second]"
    ))
    .unwrap_or_default()
}

/// In-memory stand-in for the shot server. Answers the same requests with
/// the same filter and permission rules, so the terminal front end can run
/// without a network.
#[derive(Debug, Clone)]
pub struct DemoServer {
    session: SessionInfo,
    projects: Vec<Project>,
    shots: Vec<Shot>,
    comments: Vec<Comment>,
    next_comment: i64,
    comp_versions: BTreeMap<ShotId, u32>,
}

impl Default for DemoServer {
    fn default() -> Self {
        let projects = fixture_projects();
        let shots = fixture_shots(&projects, 7);
        Self::with_data(fixture_session(), projects, shots)
    }
}

impl DemoServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(session: SessionInfo, projects: Vec<Project>, shots: Vec<Shot>) -> Self {
        Self {
            session,
            projects,
            shots,
            comments: Vec::new(),
            next_comment: 1,
            comp_versions: BTreeMap::new(),
        }
    }

    pub fn set_session(&mut self, session: SessionInfo) {
        self.session = session;
    }

    pub fn shots(&self) -> &[Shot] {
        &self.shots
    }

    pub fn shot(&self, shot_id: ShotId) -> Option<&Shot> {
        self.shots.iter().find(|shot| shot.id == shot_id)
    }

    /// Answers one request the way the network runtime would.
    pub fn handle(&mut self, request: Request) -> Response {
        match request {
            Request::LoadSession => Response::Session(self.session()),
            Request::LoadProjects => Response::Projects(self.list_projects()),
            Request::CreateProject(project) => {
                Response::ProjectCreated(self.create_project(&project))
            }
            Request::LoadRoster { token, query } => Response::Roster {
                token,
                result: self.list_shots(&query),
            },
            Request::LoadGroup {
                token,
                index,
                reel,
                query,
            } => Response::Group {
                token,
                index,
                reel,
                result: self.list_group(&query),
            },
            Request::LoadComments { ticket } => Response::Comments {
                ticket,
                result: self.list_comments(ticket.shot_id),
            },
            Request::UpdateShot { shot_id, update } => {
                let result = self.update_shot(shot_id, &update);
                Response::ShotUpdated {
                    shot_id,
                    update,
                    result,
                }
            }
            Request::DeleteShot { shot_id } => Response::ShotDeleted {
                shot_id,
                result: self.delete_shot(shot_id),
            },
            Request::BulkDelete { ids } => Response::BulkDeleted {
                result: self.bulk_delete(&ids),
            },
            Request::AddComment { shot_id, text } => Response::CommentAdded {
                shot_id,
                result: self.add_comment(shot_id, &text),
            },
            Request::UpdateComment { comment_id, text } => Response::CommentUpdated {
                result: self.update_comment(comment_id, &text),
            },
            Request::DeleteComment { comment_id } => Response::CommentDeleted {
                result: self.delete_comment(comment_id),
            },
            Request::ResolveToolPath { shot_id } => Response::ToolPath {
                shot_id,
                result: self.nuke_path(shot_id),
            },
            Request::GenerateComp { shot_id } => Response::CompGenerated {
                shot_id,
                result: self.generate_comp(shot_id),
            },
        }
    }

    pub fn session(&self) -> Result<SessionInfo, RosterError> {
        Ok(self.session.clone())
    }

    /// Sorted by name, like the server.
    pub fn list_projects(&self) -> Result<Vec<Project>, RosterError> {
        let mut projects = self.projects.clone();
        projects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(projects)
    }

    /// Short code falls back to the upper-cased first six characters of the
    /// name.
    pub fn create_project(&mut self, project: &NewProject) -> Result<Project, RosterError> {
        if !self.session.logged_in || !PROJECT_ROLES.contains(&self.session.role.as_str()) {
            return Err(forbidden());
        }
        let name = project.name.trim();
        if name.is_empty() {
            return Err(RosterError::network(Some(400), "name required"));
        }
        let id = self
            .projects
            .iter()
            .map(|project| project.id.get())
            .max()
            .unwrap_or(0)
            + 1;
        let created = Project {
            id: ProjectId::new(id),
            name: name.to_owned(),
            short: name.chars().take(SHORT_CODE_LEN).collect::<String>().to_uppercase(),
            start_date: project.start_date.trim().to_owned(),
            details_text: String::new(),
            folder_path: String::new(),
        };
        self.projects.push(created.clone());
        Ok(created)
    }

    pub fn list_shots(&self, query: &RosterQuery) -> Result<RosterResult, RosterError> {
        let matched = self.matching(query)?;
        if !query.values("group_by").contains(&"reel") {
            return Ok(RosterResult::Flat(matched));
        }

        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for shot in &matched {
            *counts.entry(derive_reel(&shot.reel, &shot.code)).or_default() += 1;
        }
        // An empty array carries no shape on the wire.
        if counts.is_empty() {
            return Ok(RosterResult::Flat(Vec::new()));
        }
        Ok(RosterResult::Grouped(
            counts
                .into_iter()
                .map(|(reel, count)| ReelGroup { reel, count })
                .collect(),
        ))
    }

    pub fn list_group(&self, query: &RosterQuery) -> Result<Vec<Shot>, RosterError> {
        self.matching(query)
    }

    pub fn update_shot(
        &mut self,
        shot_id: ShotId,
        update: &ShotUpdate,
    ) -> Result<Shot, RosterError> {
        self.require_editor()?;
        let shot = self.shot_mut(shot_id)?;
        if let Some(status) = update.status {
            shot.status = status;
        }
        if let Some(artist) = &update.assigned_to {
            shot.assigned_to = artist.clone();
        }
        Ok(shot.clone())
    }

    pub fn delete_shot(&mut self, shot_id: ShotId) -> Result<(), RosterError> {
        self.require_editor()?;
        self.shot_mut(shot_id)?;
        self.remove_shots(&[shot_id]);
        Ok(())
    }

    pub fn bulk_delete(&mut self, ids: &[ShotId]) -> Result<u64, RosterError> {
        self.require_editor()?;
        if ids.is_empty() {
            return Err(RosterError::network(Some(400), "ids required"));
        }
        Ok(self.remove_shots(ids))
    }

    pub fn list_comments(&self, shot_id: ShotId) -> Result<Vec<Comment>, RosterError> {
        self.find_shot(shot_id)?;
        Ok(self
            .comments
            .iter()
            .filter(|comment| comment.shot_id == shot_id)
            .cloned()
            .collect())
    }

    pub fn add_comment(&mut self, shot_id: ShotId, text: &str) -> Result<Comment, RosterError> {
        self.find_shot(shot_id)?;
        self.require_login()?;
        let text = require_text(text)?;

        let id = self.next_comment;
        self.next_comment += 1;
        let comment = Comment {
            id: CommentId::new(id),
            shot_id,
            author: self.session.username.clone(),
            author_role: self.session.role.clone(),
            text,
            created_at: format_timestamp(reference_now() + Duration::minutes(id)),
        };
        self.comments.push(comment.clone());
        Ok(comment)
    }

    pub fn update_comment(
        &mut self,
        comment_id: CommentId,
        text: &str,
    ) -> Result<Comment, RosterError> {
        let index = self.owned_comment(comment_id)?;
        let text = require_text(text)?;
        let comment = &mut self.comments[index];
        comment.text = text;
        Ok(comment.clone())
    }

    pub fn delete_comment(&mut self, comment_id: CommentId) -> Result<(), RosterError> {
        let index = self.owned_comment(comment_id)?;
        self.comments.remove(index);
        Ok(())
    }

    /// Stored script path, else the conventional first version under the
    /// project folder, else nothing.
    pub fn nuke_path(&self, shot_id: ShotId) -> Result<Option<String>, RosterError> {
        let shot = self.find_shot(shot_id)?;
        if !shot.nuke_path.is_empty() {
            return Ok(Some(shot.nuke_path.clone()));
        }
        Ok(self
            .folder_for(shot)
            .map(|folder| comp_script_path(folder, shot, 1)))
    }

    pub fn generate_comp(&mut self, shot_id: ShotId) -> Result<String, RosterError> {
        let shot = self.find_shot(shot_id)?;
        let Some(folder) = self.folder_for(shot) else {
            return Err(RosterError::network(
                Some(400),
                "project folder_path not configured",
            ));
        };
        let version = self.comp_versions.get(&shot_id).copied().unwrap_or(0) + 1;
        let path = comp_script_path(folder, shot, version);

        self.comp_versions.insert(shot_id, version);
        self.shot_mut(shot_id)?.nuke_path = path.clone();
        Ok(path)
    }

    fn matching(&self, query: &RosterQuery) -> Result<Vec<Shot>, RosterError> {
        if !self.projects.iter().any(|project| project.id == query.project) {
            return Err(not_found());
        }
        let statuses = query.values("status");
        let mut matched: Vec<Shot> = self
            .shots
            .iter()
            .filter(|shot| shot.project_id == Some(query.project))
            .filter(|shot| {
                query.values("reel").iter().all(|reel| {
                    derive_reel(&shot.reel, &shot.code).eq_ignore_ascii_case(reel)
                        || contains_folded(&shot.code, reel)
                })
            })
            .filter(|shot| {
                query
                    .values("code")
                    .iter()
                    .all(|code| contains_folded(&shot.code, code))
            })
            .filter(|shot| {
                query
                    .values("version")
                    .iter()
                    .all(|version| contains_folded(&shot.version, version))
            })
            .filter(|shot| {
                query
                    .values("artist")
                    .iter()
                    .all(|artist| contains_folded(&shot.assigned_to, artist))
            })
            .filter(|shot| query.values("due").iter().all(|due| shot.due_date == *due))
            .filter(|shot| statuses.is_empty() || statuses.contains(&shot.status.as_str()))
            .cloned()
            .collect();
        matched.sort_by_key(|shot| shot.id);
        Ok(matched)
    }

    fn find_shot(&self, shot_id: ShotId) -> Result<&Shot, RosterError> {
        self.shot(shot_id).ok_or_else(not_found)
    }

    fn shot_mut(&mut self, shot_id: ShotId) -> Result<&mut Shot, RosterError> {
        self.shots
            .iter_mut()
            .find(|shot| shot.id == shot_id)
            .ok_or_else(not_found)
    }

    fn remove_shots(&mut self, ids: &[ShotId]) -> u64 {
        let before = self.shots.len();
        self.shots.retain(|shot| !ids.contains(&shot.id));
        self.comments
            .retain(|comment| !ids.contains(&comment.shot_id));
        (before - self.shots.len()) as u64
    }

    fn folder_for(&self, shot: &Shot) -> Option<&str> {
        self.projects
            .iter()
            .find(|project| Some(project.id) == shot.project_id)
            .map(|project| project.folder_path.trim_end_matches('/'))
            .filter(|folder| !folder.is_empty())
    }

    fn owned_comment(&self, comment_id: CommentId) -> Result<usize, RosterError> {
        let index = self
            .comments
            .iter()
            .position(|comment| comment.id == comment_id)
            .ok_or_else(not_found)?;
        self.require_login()?;
        let comment = &self.comments[index];
        if self.session.role != "admin" && self.session.username != comment.author {
            return Err(forbidden());
        }
        Ok(index)
    }

    fn require_login(&self) -> Result<(), RosterError> {
        if self.session.logged_in {
            Ok(())
        } else {
            Err(RosterError::network(Some(403), "login required"))
        }
    }

    fn require_editor(&self) -> Result<(), RosterError> {
        if self.session.logged_in && EDITOR_ROLES.contains(&self.session.role.as_str()) {
            Ok(())
        } else {
            Err(forbidden())
        }
    }
}

/// `<folder>/Comp/<reel>/<code>/<code>_comp_vNNN.nk`
fn comp_script_path(folder: &str, shot: &Shot, version: u32) -> String {
    let reel = shot.code.split('_').nth(1).unwrap_or("REEL");
    let code = if shot.code.is_empty() {
        format!("shot_{}", shot.id)
    } else {
        shot.code.clone()
    };
    format!("{folder}/Comp/{reel}/{code}/{code}_comp_v{version:03}.nk")
}

fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack
        .to_ascii_lowercase()
        .contains(&needle.to_ascii_lowercase())
}

fn require_text(text: &str) -> Result<String, RosterError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(RosterError::network(Some(400), "text required"))
    } else {
        Ok(trimmed.to_owned())
    }
}

fn not_found() -> RosterError {
    RosterError::network(Some(404), "Not Found")
}

fn forbidden() -> RosterError {
    RosterError::network(Some(403), "forbidden")
}
