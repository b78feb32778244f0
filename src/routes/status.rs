//! Cache and write-back counters (`/status`)

use hyper::{Response, StatusCode};
use serde::Serialize;

use super::{json_response, BoxBody};
use crate::service::{AccountService, ServiceStatus};

#[derive(Serialize)]
struct StatusResponse {
    #[serde(flatten)]
    status: ServiceStatus,
    hit_rate: f64,
    pending_writes: usize,
}

pub fn status_check(service: &AccountService) -> Response<BoxBody> {
    let status = service.status();
    let hit_rate = status.cache.hit_rate();
    let pending_writes = status
        .queues
        .iter()
        .map(|q| q.pending_updates + q.pending_appends)
        .sum();

    json_response(
        StatusCode::OK,
        &StatusResponse {
            status,
            hit_rate,
            pending_writes,
        },
    )
}
