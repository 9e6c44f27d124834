// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use shotdesk_api::Client;
use shotdesk_app::{Request, Response};
use shotdesk_testkit::DemoServer;
use shotdesk_tui::{InternalEvent, RosterRuntime};
use std::process::Command;
use std::sync::mpsc::Sender;
use std::thread;
use tracing::{debug, warn};

const DEMO_SCHEME: &str = "demo:";

/// Talks to a live server. Every request runs on its own worker thread with
/// a clone of the HTTP client.
pub struct ApiRuntime {
    client: Client,
}

impl ApiRuntime {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl RosterRuntime for ApiRuntime {
    fn execute(&mut self, request: Request) -> Response {
        execute_request(&self.client, request)
    }

    fn spawn_request(&mut self, request: Request, tx: Sender<InternalEvent>) -> Result<()> {
        let client = self.client.clone();
        thread::Builder::new()
            .name("shotdesk-request".to_owned())
            .spawn(move || {
                let response = execute_request(&client, request);
                if tx.send(InternalEvent::Response(response)).is_err() {
                    debug!("UI closed before the response arrived");
                }
            })
            .context("spawn request worker")?;
        Ok(())
    }

    fn open_target(&mut self, target: &str) -> Result<()> {
        launch(target)
    }

    fn resolve_api_path(&self, path: &str) -> String {
        self.client.resolve(path)
    }
}

/// Serves requests from an in-memory fixture server. Nothing touches the
/// network or the filesystem.
#[derive(Debug, Default)]
pub struct DemoRuntime {
    server: DemoServer,
}

impl DemoRuntime {
    pub fn new(server: DemoServer) -> Self {
        Self { server }
    }
}

impl RosterRuntime for DemoRuntime {
    fn execute(&mut self, request: Request) -> Response {
        self.server.handle(request)
    }

    fn open_target(&mut self, target: &str) -> Result<()> {
        if target.starts_with(DEMO_SCHEME) {
            bail!("export needs a live server; restart without --demo");
        }
        launch(target)
    }

    fn resolve_api_path(&self, path: &str) -> String {
        format!("{DEMO_SCHEME}{path}")
    }
}

fn execute_request(client: &Client, request: Request) -> Response {
    debug!(?request, "executing request");
    match request {
        Request::LoadSession => Response::Session(client.session()),
        Request::LoadProjects => Response::Projects(client.list_projects()),
        Request::CreateProject(project) => {
            Response::ProjectCreated(client.create_project(&project))
        }
        Request::LoadRoster { token, query } => Response::Roster {
            token,
            result: client.list_shots(&query),
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
            result: client.list_group(&query),
        },
        Request::LoadComments { ticket } => Response::Comments {
            ticket,
            result: client.list_comments(ticket.shot_id),
        },
        Request::UpdateShot { shot_id, update } => {
            let result = client.update_shot(shot_id, &update);
            Response::ShotUpdated {
                shot_id,
                update,
                result,
            }
        }
        Request::DeleteShot { shot_id } => Response::ShotDeleted {
            shot_id,
            result: client.delete_shot(shot_id),
        },
        Request::BulkDelete { ids } => Response::BulkDeleted {
            result: client.bulk_delete(&ids),
        },
        Request::AddComment { shot_id, text } => Response::CommentAdded {
            shot_id,
            result: client.add_comment(shot_id, &text),
        },
        Request::UpdateComment { comment_id, text } => Response::CommentUpdated {
            result: client.update_comment(comment_id, &text),
        },
        Request::DeleteComment { comment_id } => Response::CommentDeleted {
            result: client.delete_comment(comment_id),
        },
        Request::ResolveToolPath { shot_id } => Response::ToolPath {
            shot_id,
            result: client.nuke_path(shot_id),
        },
        Request::GenerateComp { shot_id } => Response::CompGenerated {
            shot_id,
            result: client.generate_comp(shot_id),
        },
    }
}

/// Hands a path or URL to the desktop's default handler.
fn launch(target: &str) -> Result<()> {
    if let Err(error) = launcher_command(target).spawn() {
        warn!(target, %error, "launcher failed");
        return Err(error).with_context(|| format!("launch {target}"));
    }
    Ok(())
}

#[cfg(target_os = "windows")]
fn launcher_command(target: &str) -> Command {
    let mut command = Command::new("cmd");
    command.args(["/C", "start", "", target]);
    command
}

#[cfg(target_os = "macos")]
fn launcher_command(target: &str) -> Command {
    let mut command = Command::new("open");
    command.arg(target);
    command
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn launcher_command(target: &str) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(target);
    command
}
