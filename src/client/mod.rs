//! Connection to both the Buildkite REST API and the Buildkite GraphQL interface

use std::collections::HashSet;
use std::fmt::Debug;

use reqwest::header::{HeaderMap, LINK};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{Error, Result};

mod graphql;

pub use graphql::GraphQlString;

pub const REST_URL: &str = "https://api.buildkite.com/v2";
pub const GRAPHQL_URL: &str = "https://graphql.buildkite.com/v1";

/// Base URLs of the Buildkite APIs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Base of the REST API, without trailing slash
    pub rest: String,
    /// GraphQL endpoint
    pub graphql: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            rest: REST_URL.to_owned(),
            graphql: GRAPHQL_URL.to_owned(),
        }
    }
}

/// Authenticated Buildkite client
///
/// Cloning is cheap: the underlying connection pool is shared.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    token: String,
    organization_slug: Option<String>,
    endpoints: Endpoints,
}

impl Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("organization_slug", &self.organization_slug)
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a client authenticated with a static bearer token
    ///
    /// # Arguments
    ///
    /// * `token` - API token used for both REST and GraphQL calls
    /// * `organization_slug` - Default organization for organization scoped reads
    pub fn new<T: Into<String>>(token: T, organization_slug: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            token: token.into(),
            organization_slug,
            endpoints: Default::default(),
        }
    }

    /// Point the client to other API endpoints
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Resolve the organization to read from: explicit value wins, then the provider default
    pub fn organization_slug<'a>(&'a self, explicit: Option<&'a str>) -> Result<&'a str> {
        explicit
            .filter(|slug| !slug.is_empty())
            .or(self.organization_slug.as_deref())
            .ok_or_else(|| {
                Error::Config(
                    "organization_slug must be set either on the data source or on the provider"
                        .to_owned(),
                )
            })
    }

    pub(crate) fn rest_url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoints.rest, path.trim_start_matches('/'))
    }

    /// Fetch every page of a REST collection
    ///
    /// Pages are requested in sequence by following the `rel="next"` link of each response,
    /// and their items are concatenated in page order.
    pub(crate) async fn get_paginated<T: DeserializeOwned>(&self, url: String) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut visited = HashSet::new();
        let mut url = url;

        loop {
            debug!(%url, "Fetching REST page");
            let response = self
                .http
                .get(&url)
                .bearer_auth(&self.token)
                .send()
                .await
                .map_err(Error::Transport)?;

            let status = response.status();
            let next = next_link(response.headers());
            let bytes = response.bytes().await.map_err(Error::Io)?;

            if !status.is_success() {
                return Err(Error::Status {
                    status: status.as_u16(),
                    body: String::from_utf8_lossy(&bytes).into_owned(),
                });
            }

            let page: Vec<T> = serde_json::from_slice(&bytes)?;
            items.extend(page);
            visited.insert(url);

            match next {
                Some(next) if visited.contains(&next) => {
                    return Err(Error::Protocol(format!(
                        "Pagination loop detected: `{next}` was already fetched"
                    )))
                }
                Some(next) => url = next,
                None => break,
            }
        }

        Ok(items)
    }
}

/// Extract the `rel="next"` target from the `Link` headers of a response
fn next_link(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(LINK)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .find_map(parse_next)
}

fn parse_next(entry: &str) -> Option<String> {
    let mut parts = entry.split(';');
    let target = parts
        .next()?
        .trim()
        .strip_prefix('<')?
        .strip_suffix('>')?;

    let is_next = parts.any(|param| match param.split_once('=') {
        Some((name, value)) => {
            name.trim().eq_ignore_ascii_case("rel")
                && value
                    .trim()
                    .trim_matches('"')
                    .split_whitespace()
                    .any(|rel| rel.eq_ignore_ascii_case("next"))
        }
        None => false,
    });

    is_next.then(|| target.to_owned())
}
