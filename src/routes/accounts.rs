//! Account endpoints
//!
//! - `POST /api/v1/accounts/claim`  - lookup-or-claim
//! - `POST /api/v1/accounts/update` - mutate one row
//! - `POST /api/v1/cache/clear`     - flush and drop a store's partitions (admin)

use hyper::body::Body;
use hyper::{Request, Response, StatusCode};

use super::{error_response, json_response, parse_json_body, BoxBody};
use crate::service::{AccountService, ClaimRequest, ClearRequest, UpdateRequest};

pub async fn handle_claim<B>(service: &AccountService, req: Request<B>) -> Response<BoxBody>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let request: ClaimRequest = match parse_json_body(req.into_body()).await {
        Ok(r) => r,
        Err(e) => return error_response(e),
    };

    match service.claim(request).await {
        Ok(response) => json_response(StatusCode::OK, &response),
        Err(e) => error_response(e),
    }
}

pub async fn handle_update<B>(service: &AccountService, req: Request<B>) -> Response<BoxBody>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let request: UpdateRequest = match parse_json_body(req.into_body()).await {
        Ok(r) => r,
        Err(e) => return error_response(e),
    };

    match service.mutate(request).await {
        Ok(response) => json_response(StatusCode::OK, &response),
        Err(e) => error_response(e),
    }
}

pub async fn handle_clear_cache<B>(service: &AccountService, req: Request<B>) -> Response<BoxBody>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let request: ClearRequest = match parse_json_body(req.into_body()).await {
        Ok(r) => r,
        Err(e) => return error_response(e),
    };

    match service.clear_cache(request).await {
        Ok(response) => json_response(StatusCode::OK, &response),
        Err(e) => error_response(e),
    }
}
