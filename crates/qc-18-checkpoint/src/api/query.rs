//! State query handler
//!
//! Maps raw query parameters onto [`CheckpointQueryApi`] and renders the
//! result as a JSON body plus a [`QueryStatus`] the REST layer can turn into
//! an HTTP code. Absent singletons are `NoContent`, absent lookups are
//! `NotFound`, and only store faults become `InternalError`.

use crate::domain::{Checkpoint, Commitment, CommitmentHeader, Milestone, MilestoneId};
use crate::error::CheckpointResult;
use crate::ports::inbound::CheckpointQueryApi;
use serde_json::{json, Value};
use tracing::error;

/// Outcome class of a query, mirroring HTTP semantics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryStatus {
    Ok,
    NoContent,
    NotFound,
    BadRequest,
    InternalError,
}

impl QueryStatus {
    pub fn http_code(&self) -> u16 {
        match self {
            QueryStatus::Ok => 200,
            QueryStatus::NoContent => 204,
            QueryStatus::NotFound => 404,
            QueryStatus::BadRequest => 400,
            QueryStatus::InternalError => 500,
        }
    }
}

/// Supported state queries. Parameters stay raw so parse failures can be
/// reported as `BadRequest`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckpointQuery {
    LatestCheckpoint,
    BufferedCheckpoint,
    CheckpointBySequence(String),
    CheckpointContaining(String),
    AckCount,
    CheckpointLastNoAck,
    LatestMilestone,
    BufferedMilestone,
    MilestoneByNumber(String),
    MilestoneCount,
    MilestoneLastNoAck,
    LastNoAckMilestone,
    NoAckMilestone(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct QueryResponse {
    pub status: QueryStatus,
    pub body: Option<Value>,
}

impl QueryResponse {
    fn ok(result: Value) -> Self {
        Self {
            status: QueryStatus::Ok,
            body: Some(json!({ "result": result })),
        }
    }

    fn empty(status: QueryStatus) -> Self {
        Self { status, body: None }
    }

    fn error(status: QueryStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            body: Some(json!({ "error": message.into() })),
        }
    }

    pub fn http_code(&self) -> u16 {
        self.status.http_code()
    }
}

fn header_view(header: &CommitmentHeader) -> Value {
    json!({
        "start_block": header.start_block,
        "end_block": header.end_block,
        "root_hash": format!("0x{}", hex::encode(header.root_hash)),
        "proposer": format!("0x{}", hex::encode(header.proposer)),
        "bor_chain_id": header.bor_chain_id,
        "timestamp": header.timestamp,
    })
}

fn checkpoint_view(checkpoint: &Checkpoint) -> Value {
    let mut view = header_view(checkpoint.header());
    view["id"] = json!(checkpoint.sequence_number);
    view
}

fn milestone_view(milestone: &Milestone) -> Value {
    let mut view = header_view(milestone.header());
    view["milestone_id"] = json!(milestone.milestone_id.as_str());
    view
}

fn parse_number(name: &str, raw: &str) -> Result<u64, QueryResponse> {
    raw.trim().parse::<u64>().map_err(|_| {
        QueryResponse::error(QueryStatus::BadRequest, format!("invalid {name}: {raw:?}"))
    })
}

fn parse_milestone_id(raw: &str) -> Result<MilestoneId, QueryResponse> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    match hex::decode(digits) {
        Ok(bytes) if bytes.len() == 32 => Ok(MilestoneId(format!("0x{}", digits.to_lowercase()))),
        _ => Err(QueryResponse::error(
            QueryStatus::BadRequest,
            format!("invalid milestone id: {raw:?}"),
        )),
    }
}

/// Answers state queries against a [`CheckpointQueryApi`].
pub struct QueryHandler<Q> {
    api: Q,
}

impl<Q: CheckpointQueryApi> QueryHandler<Q> {
    pub fn new(api: Q) -> Self {
        Self { api }
    }

    pub fn handle(&self, query: &CheckpointQuery) -> QueryResponse {
        self.dispatch(query).unwrap_or_else(|response| response)
    }

    fn dispatch(&self, query: &CheckpointQuery) -> Result<QueryResponse, QueryResponse> {
        Ok(match query {
            CheckpointQuery::LatestCheckpoint => {
                singleton(self.api.latest_checkpoint(), |c| checkpoint_view(&c))
            }
            CheckpointQuery::BufferedCheckpoint => {
                singleton(self.api.buffered_checkpoint(), |c| checkpoint_view(&c))
            }
            CheckpointQuery::CheckpointBySequence(raw) => {
                let sequence = parse_number("sequence number", raw)?;
                lookup(self.api.checkpoint_by_sequence(sequence), |c| {
                    checkpoint_view(&c)
                })
            }
            CheckpointQuery::CheckpointContaining(raw) => {
                let height = parse_number("block height", raw)?;
                lookup(self.api.checkpoint_containing(height), |c| {
                    checkpoint_view(&c)
                })
            }
            CheckpointQuery::AckCount => count(self.api.ack_count()),
            CheckpointQuery::CheckpointLastNoAck => {
                singleton(self.api.checkpoint_last_no_ack_time(), |t| json!(t))
            }
            CheckpointQuery::LatestMilestone => {
                singleton(self.api.latest_milestone(), |m| milestone_view(&m))
            }
            CheckpointQuery::BufferedMilestone => {
                singleton(self.api.buffered_milestone(), |m| milestone_view(&m))
            }
            CheckpointQuery::MilestoneByNumber(raw) => {
                let number = parse_number("milestone number", raw)?;
                lookup(self.api.milestone_by_number(number), |m| milestone_view(&m))
            }
            CheckpointQuery::MilestoneCount => count(self.api.milestone_count()),
            CheckpointQuery::MilestoneLastNoAck => {
                singleton(self.api.milestone_last_no_ack_time(), |t| json!(t))
            }
            CheckpointQuery::LastNoAckMilestone => {
                singleton(self.api.last_no_ack_milestone(), |id| json!(id.as_str()))
            }
            CheckpointQuery::NoAckMilestone(raw) => {
                let id = parse_milestone_id(raw)?;
                lookup(self.api.no_ack_milestone(&id), |t| json!(t))
            }
        })
    }
}

fn singleton<T>(result: CheckpointResult<Option<T>>, view: impl FnOnce(T) -> Value) -> QueryResponse {
    match result {
        Ok(Some(value)) => QueryResponse::ok(view(value)),
        Ok(None) => QueryResponse::empty(QueryStatus::NoContent),
        Err(e) => internal(e),
    }
}

fn lookup<T>(result: CheckpointResult<Option<T>>, view: impl FnOnce(T) -> Value) -> QueryResponse {
    match result {
        Ok(Some(value)) => QueryResponse::ok(view(value)),
        Ok(None) => QueryResponse::empty(QueryStatus::NotFound),
        Err(e) => internal(e),
    }
}

fn count(result: CheckpointResult<u64>) -> QueryResponse {
    match result {
        Ok(n) => QueryResponse::ok(json!(n)),
        Err(e) => internal(e),
    }
}

fn internal(e: crate::error::CheckpointError) -> QueryResponse {
    error!("[qc-18] state query error: {}", e);
    QueryResponse::error(QueryStatus::InternalError, e.to_string())
}
