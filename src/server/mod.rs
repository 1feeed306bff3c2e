// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP front end for the case-file session

pub mod microserver;
pub mod routes;

use crate::config::Config;
use crate::query::QueryLimits;
use crate::session::Session;
use anyhow::{Context, Result};
use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

pub use routes::{route_request, status_for};

/// State shared by every connection
pub struct AppState {
    pub session: Arc<Session>,
    pub limits: QueryLimits,
    pub allow_raw_queries: bool,
    start_time: Instant,
}

impl AppState {
    pub fn new(session: Arc<Session>, limits: QueryLimits, allow_raw_queries: bool) -> Self {
        Self {
            session,
            limits,
            allow_raw_queries,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

pub fn handle_connection(stream: &mut (impl Read + Write), state: &AppState) {
    let request = match microserver::read_request(stream) {
        Some(Ok(request)) => request,
        Some(Err(msg)) => {
            warn!(error = %msg, "malformed request");
            let response = routes::with_security_headers(routes::json_error(400, &msg));
            microserver::write_response(stream, &response);
            return;
        }
        None => return,
    };

    let response = route_request(&request, state);
    microserver::write_response(stream, &response);
}

/// Bind the configured address and serve until the process exits
pub fn run_server(config: &Config, session: Arc<Session>) -> Result<()> {
    let addr = config.bind_address();
    let listener =
        TcpListener::bind(&addr).with_context(|| format!("binding HTTP listener on {}", addr))?;
    let state = Arc::new(AppState::new(
        session,
        config.query_limits(),
        config.query.allow_raw_queries,
    ));

    if config.server.host != "127.0.0.1" && config.server.host != "localhost" {
        warn!(host = %config.server.host, "listening beyond loopback without authentication");
    }
    info!(address = %addr, raw_queries = state.allow_raw_queries, "casefile listening");

    accept_loop(listener, state);
    Ok(())
}

fn accept_loop(listener: TcpListener, state: Arc<AppState>) {
    for stream in listener.incoming() {
        match stream {
            Ok(mut stream) => {
                let state = Arc::clone(&state);
                std::thread::spawn(move || {
                    handle_connection(&mut stream, &state);
                    let _ = stream.shutdown(Shutdown::Write);
                });
            }
            Err(e) => error!(error = %e, "accept failed"),
        }
    }
}
