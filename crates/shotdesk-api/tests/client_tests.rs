// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use shotdesk_api::Client;
use shotdesk_app::{
    FilterField, FilterState, NewProject, ProjectId, RosterError, RosterResult, ShotId,
    ShotStatus, ShotUpdate, build_group_query, build_query,
};
use std::io::Read;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tiny_http::{Header, Response, Server};

struct Exchange {
    method: &'static str,
    url: &'static str,
    status: u16,
    body: &'static str,
}

/// Serves the scripted exchanges in order and returns the request bodies.
fn mock_server(exchanges: Vec<Exchange>) -> Result<(String, JoinHandle<Vec<String>>)> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let mut bodies = Vec::new();
        for exchange in exchanges {
            let mut request = server.recv().expect("request expected");
            assert_eq!(request.method().as_str(), exchange.method);
            assert_eq!(request.url(), exchange.url);
            let mut body = String::new();
            request
                .as_reader()
                .read_to_string(&mut body)
                .expect("read request body");
            bodies.push(body);
            let response = Response::from_string(exchange.body)
                .with_status_code(exchange.status)
                .with_header(
                    Header::from_bytes("Content-Type", "application/json")
                        .expect("valid content type header"),
                );
            request.respond(response).expect("response should succeed");
        }
        bodies
    });
    Ok((addr, handle))
}

fn client(addr: &str) -> Result<Client> {
    Client::new(addr, Duration::from_secs(2))
}

#[test]
fn new_rejects_empty_and_invalid_base_urls() {
    assert!(Client::new("  ", Duration::from_secs(1)).is_err());
    assert!(Client::new("not a url", Duration::from_secs(1)).is_err());
    let client = Client::new("http://studio.local:5000/", Duration::from_secs(1))
        .expect("client should initialize");
    assert_eq!(client.base_url(), "http://studio.local:5000");
    assert_eq!(
        client.thumbnail_url(ShotId::new(12)),
        "http://studio.local:5000/api/shot_thumb/12"
    );
}

#[test]
fn unreachable_server_is_a_network_error() {
    let client = Client::new("http://127.0.0.1:1", Duration::from_millis(50))
        .expect("client should initialize");
    let error = client.session().expect_err("nothing listens on port 1");
    assert!(matches!(error, RosterError::Network { status: None, .. }));
    assert!(error.to_string().contains("cannot reach"));
}

#[test]
fn list_shots_sends_repeated_status_params_and_classifies() -> Result<()> {
    let (addr, handle) = mock_server(vec![
        Exchange {
            method: "GET",
            url: "/api/projects/3/shots?reel=010&status=Final&status=Approved",
            status: 200,
            body: r#"[{"id":1,"project_id":3,"code":"SEQ_010_comp","status":"Final","assigned_to":"","due_date":"","plate_path":"","mov_path":"","exr_path":"","version":"V002","nuke_path":"","description":"","start_date":""}]"#,
        },
        Exchange {
            method: "GET",
            url: "/api/projects/3/shots?group_by=reel",
            status: 200,
            body: r#"[{"reel":"010","count":2},{"reel":"020","count":1}]"#,
        },
    ])?;

    let client = client(&addr)?;
    let mut filters = FilterState::default();
    filters.set_field(FilterField::Reel, "010");
    filters.toggle_status(ShotStatus::Final);
    filters.toggle_status(ShotStatus::Approved);
    let flat = client.list_shots(&build_query(Some(ProjectId::new(3)), &filters)?)?;
    let RosterResult::Flat(shots) = flat else {
        panic!("expected flat roster");
    };
    assert_eq!(shots[0].version, "V002");

    let mut grouped = FilterState::default();
    grouped.set_group_mode(shotdesk_app::GroupMode::Reel);
    let groups = client.list_shots(&build_query(Some(ProjectId::new(3)), &grouped)?)?;
    assert!(matches!(groups, RosterResult::Grouped(groups) if groups.len() == 2));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn non_json_roster_body_is_a_parse_error() -> Result<()> {
    let (addr, handle) = mock_server(vec![Exchange {
        method: "GET",
        url: "/api/projects/1/shots?reel=020",
        status: 200,
        body: "<html>login</html>",
    }])?;

    let error = client(&addr)?
        .list_group(&build_group_query(ProjectId::new(1), "020"))
        .expect_err("html is not a roster");
    assert!(matches!(error, RosterError::Parse(_)));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn update_shot_sends_partial_fields_and_surfaces_server_error() -> Result<()> {
    let (addr, handle) = mock_server(vec![
        Exchange {
            method: "PUT",
            url: "/api/shots/4",
            status: 200,
            body: r#"{"id":4,"code":"SEQ_020_comp","status":"In Review"}"#,
        },
        Exchange {
            method: "PUT",
            url: "/api/shots/4",
            status: 403,
            body: r#"{"error":"forbidden"}"#,
        },
    ])?;

    let client = client(&addr)?;
    let shot = client.update_shot(ShotId::new(4), &ShotUpdate::status(ShotStatus::InReview))?;
    assert_eq!(shot.status, ShotStatus::InReview);

    let error = client
        .update_shot(ShotId::new(4), &ShotUpdate::assigned_to("mia"))
        .expect_err("forbidden");
    assert_eq!(error, RosterError::network(Some(403), "forbidden"));

    let bodies = handle.join().expect("server thread should join");
    assert_eq!(bodies[0], r#"{"status":"In Review"}"#);
    assert_eq!(bodies[1], r#"{"assigned_to":"mia"}"#);
    Ok(())
}

#[test]
fn bulk_delete_posts_all_ids_once() -> Result<()> {
    let (addr, handle) = mock_server(vec![Exchange {
        method: "POST",
        url: "/api/shots/bulk_delete",
        status: 200,
        body: r#"{"deleted":2}"#,
    }])?;

    let client = client(&addr)?;
    let deleted = client.bulk_delete(&[ShotId::new(5), ShotId::new(9)])?;
    assert_eq!(deleted, 2);
    assert!(client.bulk_delete(&[]).is_err());

    let bodies = handle.join().expect("server thread should join");
    assert_eq!(bodies, vec![r#"{"ids":[5,9]}"#.to_owned()]);
    Ok(())
}

#[test]
fn nuke_path_treats_404_and_blank_as_not_configured() -> Result<()> {
    let (addr, handle) = mock_server(vec![
        Exchange {
            method: "GET",
            url: "/api/shots/1/nuke_path",
            status: 200,
            body: r#"{"path":"/shows/lnd/Comp/010/SEQ_010_comp/SEQ_010_comp_comp_v001.nk"}"#,
        },
        Exchange {
            method: "GET",
            url: "/api/shots/2/nuke_path",
            status: 404,
            body: r#"{"path":""}"#,
        },
        Exchange {
            method: "GET",
            url: "/api/shots/3/nuke_path",
            status: 200,
            body: r#"{"path":""}"#,
        },
    ])?;

    let client = client(&addr)?;
    assert_eq!(
        client.nuke_path(ShotId::new(1))?.as_deref(),
        Some("/shows/lnd/Comp/010/SEQ_010_comp/SEQ_010_comp_comp_v001.nk")
    );
    assert_eq!(client.nuke_path(ShotId::new(2))?, None);
    assert_eq!(client.nuke_path(ShotId::new(3))?, None);

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn generate_comp_returns_path_or_reason() -> Result<()> {
    let (addr, handle) = mock_server(vec![
        Exchange {
            method: "POST",
            url: "/api/shots/7/generate_comp",
            status: 200,
            body: r#"{"created":true,"path":"/shows/Comp/020/S_020/S_020_comp_v002.nk"}"#,
        },
        Exchange {
            method: "POST",
            url: "/api/shots/8/generate_comp",
            status: 400,
            body: r#"{"error":"project folder_path not configured"}"#,
        },
    ])?;

    let client = client(&addr)?;
    assert_eq!(
        client.generate_comp(ShotId::new(7))?,
        "/shows/Comp/020/S_020/S_020_comp_v002.nk"
    );
    let error = client
        .generate_comp(ShotId::new(8))
        .expect_err("no folder configured");
    assert_eq!(
        error.to_string(),
        "server returned 400: project folder_path not configured"
    );

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn comment_round_trip_hits_shot_and_comment_routes() -> Result<()> {
    let (addr, handle) = mock_server(vec![
        Exchange {
            method: "POST",
            url: "/api/shots/3/comments",
            status: 201,
            body: r#"{"id":11,"shot_id":3,"author":"lead","author_role":"supervisor","text":"more grain","created_at":"2026-03-01T10:00:00"}"#,
        },
        Exchange {
            method: "PUT",
            url: "/api/comments/11",
            status: 200,
            body: r#"{"id":11,"shot_id":3,"author":"lead","author_role":null,"text":"less grain","created_at":"2026-03-01T10:00:00"}"#,
        },
        Exchange {
            method: "GET",
            url: "/api/shots/3/comments",
            status: 200,
            body: r#"[{"id":11,"shot_id":3,"author":"lead","author_role":"supervisor","text":"less grain","created_at":"2026-03-01T10:00:00"}]"#,
        },
        Exchange {
            method: "DELETE",
            url: "/api/comments/11",
            status: 200,
            body: r#"{"ok":true}"#,
        },
    ])?;

    let client = client(&addr)?;
    let added = client.add_comment(ShotId::new(3), "more grain")?;
    let edited = client.update_comment(added.id, "less grain")?;
    assert_eq!(edited.author_role, "");
    let thread = client.list_comments(ShotId::new(3))?;
    assert_eq!(thread.len(), 1);
    assert_eq!(thread[0].text, "less grain");
    client.delete_comment(added.id)?;

    let bodies = handle.join().expect("server thread should join");
    assert_eq!(bodies[0], r#"{"text":"more grain"}"#);
    Ok(())
}

#[test]
fn session_and_projects_decode() -> Result<()> {
    let (addr, handle) = mock_server(vec![
        Exchange {
            method: "GET",
            url: "/api/session",
            status: 200,
            body: r#"{"logged_in":true,"username":"lead","role":"supervisor","display_name":"Lead"}"#,
        },
        Exchange {
            method: "GET",
            url: "/api/projects",
            status: 200,
            body: r#"[{"id":1,"name":"Landfall","short":"LND","start_date":"","details_text":"","folder_path":null}]"#,
        },
    ])?;

    let client = client(&addr)?;
    assert_eq!(client.session()?.label(), "lead (supervisor)");
    let projects = client.list_projects()?;
    assert_eq!(projects[0].short, "LND");
    assert_eq!(projects[0].folder_path, "");

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn create_project_posts_the_form_and_surfaces_refusal() -> Result<()> {
    let (addr, handle) = mock_server(vec![
        Exchange {
            method: "POST",
            url: "/api/projects",
            status: 201,
            body: r#"{"id":5,"name":"Harbor","short":"HARBOR","start_date":"2026-03-02","details_text":"","folder_path":""}"#,
        },
        Exchange {
            method: "POST",
            url: "/api/projects",
            status: 403,
            body: r#"{"error":"forbidden"}"#,
        },
    ])?;

    let client = client(&addr)?;
    let form = NewProject::new("Harbor", "2026-03-02");
    let created = client.create_project(&form)?;
    assert_eq!(created.id, ProjectId::new(5));
    assert_eq!(created.short, "HARBOR");

    let error = client
        .create_project(&form)
        .expect_err("artists cannot create projects");
    assert_eq!(error, RosterError::network(Some(403), "forbidden"));

    let bodies = handle.join().expect("server thread should join");
    assert_eq!(bodies[0], r#"{"name":"Harbor","start_date":"2026-03-02"}"#);
    Ok(())
}
