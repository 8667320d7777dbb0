//! Governance API handlers
//!
//! One handler per path. Each dispatches on method so an unsupported verb
//! gets the 405 envelope instead of an empty framework response.

use super::envelope::{failure, respond};
use crate::governance::{
    parse_proposal_id, CreateProposalRequest, CreateReceipt, GovernanceError, GovernanceResult,
    GovernanceService, ListParams, ProposalView, VoteRequest,
};
use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{Method, StatusCode};
use axum::response::Response;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

type ServiceState = State<Arc<GovernanceService>>;

/// `/governance/proposals` (GET)
pub async fn proposals(
    State(service): ServiceState,
    method: Method,
    query: Result<Query<ListParams>, QueryRejection>,
) -> Response {
    if method != Method::GET {
        return failure(GovernanceError::MethodNotAllowed);
    }
    let params = match query {
        Ok(Query(params)) => params,
        Err(rejection) => return failure(bad_query(rejection)),
    };
    respond(StatusCode::OK, service.list_proposals(&params).await)
}

/// `/governance/proposal` (GET by id, POST to create)
pub async fn proposal(
    State(service): ServiceState,
    method: Method,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    if method == Method::GET {
        respond(StatusCode::OK, get_proposal(&service, query).await)
    } else if method == Method::POST {
        respond(StatusCode::CREATED, create_proposal(&service, body).await)
    } else {
        failure(GovernanceError::MethodNotAllowed)
    }
}

/// `/governance/vote` (POST)
pub async fn vote(
    State(service): ServiceState,
    method: Method,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    if method != Method::POST {
        return failure(GovernanceError::MethodNotAllowed);
    }
    let result = match json_body::<VoteRequest>(body) {
        Ok(request) => service.vote(&request).await,
        Err(err) => Err(err),
    };
    respond(StatusCode::OK, result)
}

async fn get_proposal(
    service: &GovernanceService,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> GovernanceResult<ProposalView> {
    let Query(params) = query.map_err(bad_query)?;
    let id = parse_proposal_id(params.get("id").map(String::as_str))?;
    service.get_proposal(id).await
}

async fn create_proposal(
    service: &GovernanceService,
    body: Result<Bytes, BytesRejection>,
) -> GovernanceResult<CreateReceipt> {
    let request = json_body::<CreateProposalRequest>(body)?;
    service.create_proposal(&request).await
}

fn json_body<T: DeserializeOwned>(body: Result<Bytes, BytesRejection>) -> GovernanceResult<T> {
    let bytes = body.map_err(|rejection| {
        debug!(%rejection, "unreadable request body");
        GovernanceError::invalid_input("unreadable request body")
    })?;
    serde_json::from_slice(&bytes)
        .map_err(|e| GovernanceError::invalid_input(format!("invalid JSON body: {}", e)))
}

fn bad_query(rejection: QueryRejection) -> GovernanceError {
    GovernanceError::invalid_input(format!("invalid query string: {}", rejection.body_text()))
}
