//! The request-facing side of a search: raw strings in, a status plus a JSON body out.
//!
//! Not finding a path is a normal answer, reported separately from bad input.

use crate::error::FinderError;
use crate::finder::{PathFinder, SearchResult};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;

pub const NOT_FOUND_MESSAGE: &str = "No path found or query took too long";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    Found,
    NotFound,
    BadRequest,
}

impl QueryStatus {
    /// HTTP status a web handler should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            QueryStatus::Found | QueryStatus::NotFound => 200,
            QueryStatus::BadRequest => 400,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub status: QueryStatus,
    pub body: Value,
    #[serde(skip)]
    pub result: Option<SearchResult>,
}

impl QueryResponse {
    pub fn from_result(result: SearchResult) -> Self {
        let (status, body) = match &result.path {
            Some(path) => (QueryStatus::Found, json!(path)),
            None => (
                QueryStatus::NotFound,
                json!({ "message": NOT_FOUND_MESSAGE }),
            ),
        };
        Self {
            status,
            body,
            result: Some(result),
        }
    }

    pub fn from_error(err: &FinderError) -> Self {
        Self {
            status: QueryStatus::BadRequest,
            body: json!({ "error": err.to_string() }),
            result: None,
        }
    }

    pub fn nodes_expanded(&self) -> Option<usize> {
        self.result.as_ref().map(|r| r.nodes_expanded)
    }
}

pub async fn run_query(finder: &PathFinder, start: &str, end: &str) -> QueryResponse {
    match finder.find_path(start, end).await {
        Ok(result) => QueryResponse::from_result(result),
        Err(e) => {
            debug!("Rejected query {:?} -> {:?}: {}", start, end, e);
            QueryResponse::from_error(&e)
        }
    }
}
