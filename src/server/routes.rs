// SPDX-License-Identifier: PMPL-1.0-or-later

//! Transport-free routing from requests to goals

use crate::query::{ErrorKind, GoalBuilder, QueryLimits, ResultEnvelope};
use crate::server::microserver::{HttpRequest, HttpResponse};
use crate::server::AppState;
use percent_encoding::percent_decode_str;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;
use url::form_urlencoded;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    uptime_secs: u64,
    clauses: usize,
}

impl HttpResponse {
    fn json(status: u16, value: &impl Serialize) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: serde_json::to_vec(value).unwrap_or_default(),
        }
    }

    fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

pub(crate) fn with_security_headers(response: HttpResponse) -> HttpResponse {
    response
        .with_header("X-Content-Type-Options", "nosniff")
        .with_header("X-Frame-Options", "DENY")
}

pub(crate) fn json_error(status: u16, message: &str) -> HttpResponse {
    HttpResponse::json(status, &serde_json::json!({"error": message}))
}

/// HTTP status for a query outcome
pub fn status_for(envelope: &ResultEnvelope) -> u16 {
    match envelope.error.as_ref().map(|err| err.kind()) {
        None => 200,
        Some(ErrorKind::SyntaxError) => 400,
        Some(ErrorKind::LimitError) => 422,
        Some(ErrorKind::Error) => 500,
    }
}

pub fn route_request(request: &HttpRequest, state: &AppState) -> HttpResponse {
    debug!(method = %request.method, target = %request.target, "request");
    if request.method != "GET" {
        return with_security_headers(
            json_error(405, "Method not allowed").with_header("Allow", "GET"),
        );
    }

    let path = request.path();
    let response = if let Some(encoded) = path.strip_prefix("/query/") {
        handle_raw_query(encoded, request.query(), state)
    } else {
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        match segments.as_slice() {
            [""] => handle_index(),
            ["health"] => handle_health(state),
            ["scenes"] => {
                let goal = GoalBuilder::new("scene").var("ID").build();
                run_goal(&goal, state.limits, state)
            }
            ["clues"] => {
                let goal = GoalBuilder::new("clue")
                    .var("ID")
                    .var("SCENE")
                    .anonymous()
                    .anonymous()
                    .build();
                run_goal(&goal, state.limits, state)
            }
            ["clues", id] => match decode(id) {
                Ok(id) => {
                    let goal = GoalBuilder::new("clue")
                        .param(&id)
                        .var("SCENE")
                        .var("DESCRIPTION")
                        .var("FOUND")
                        .build();
                    run_goal(&goal, state.limits, state)
                }
                Err(response) => response,
            },
            ["scenes", id] => match decode(id) {
                Ok(id) => {
                    let goal = GoalBuilder::new("scene_name")
                        .var("NUM")
                        .param(&id)
                        .var("NAME")
                        .build();
                    run_goal(&goal, state.limits, state)
                }
                Err(response) => response,
            },
            _ => json_error(404, "Not found"),
        }
    };
    with_security_headers(response)
}

/// GET /query/:query_str
fn handle_raw_query(encoded: &str, query: Option<&str>, state: &AppState) -> HttpResponse {
    if !state.allow_raw_queries {
        return json_error(403, "Raw queries are disabled");
    }
    let goal = match decode(encoded) {
        Ok(goal) => goal,
        Err(response) => return response,
    };
    if goal.trim().is_empty() {
        return json_error(400, "Empty goal");
    }

    let params = parse_query_params(query);
    let requested = match params.get("limit").map(|raw| raw.trim().parse::<usize>()) {
        None => None,
        Some(Ok(limit)) => Some(limit),
        Some(Err(_)) => return json_error(400, "limit must be a non-negative integer"),
    };
    run_goal(&goal, state.limits.capped(requested), state)
}

fn handle_index() -> HttpResponse {
    HttpResponse::json(
        200,
        &serde_json::json!({
            "name": "casefile",
            "version": env!("CARGO_PKG_VERSION"),
            "routes": ["/scenes", "/scenes/:id", "/clues", "/clues/:id", "/query/:goal", "/health"],
        }),
    )
}

fn handle_health(state: &AppState) -> HttpResponse {
    HttpResponse::json(
        200,
        &HealthResponse {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
            uptime_secs: state.uptime_secs(),
            clauses: state.session.clause_count(),
        },
    )
}

fn run_goal(goal: &str, limits: QueryLimits, state: &AppState) -> HttpResponse {
    let envelope = state.session.execute(goal, &limits);
    HttpResponse::json(status_for(&envelope), &envelope)
}

fn decode(segment: &str) -> Result<String, HttpResponse> {
    percent_decode_str(segment)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| json_error(400, "Path is not valid UTF-8"))
}

fn parse_query_params(query: Option<&str>) -> HashMap<String, String> {
    let Some(query) = query else {
        return HashMap::new();
    };
    form_urlencoded::parse(query.as_bytes())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}
