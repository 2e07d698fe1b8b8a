//! Buildkite entities exposed by the provider

use async_trait::async_trait;
use tracing::warn;

use crate::client::Client;
use crate::convert::{Convert, EdgeList};
use crate::error::Result;

mod agent;
mod build;
mod member;
mod organization;
mod pipeline;
mod sso_provider;
mod team;
mod user;

pub use agent::{Agent, OperatingSystem};
pub use build::{Annotation, AnnotationBody, Build, BuildSource, PullRequest, TriggeredFrom};
pub use member::Member;
pub use organization::Organization;
pub use pipeline::{Pipeline, PipelineSchedule, Repository, RepositoryProvider, Steps};
pub use sso_provider::SsoProvider;
pub use team::Team;
pub use user::{Avatar, User};

/// Entity that can be listed by a data source
#[async_trait]
pub trait Entity: Convert + Sized + Send + Sync + 'static {
    /// Name of the collection, used for both the data source and its list attribute
    const COLLECTION: &'static str;
    /// Description of the data source
    const DESCRIPTION: &'static str;
    /// Whether reads are scoped to an organization
    const ORGANIZATION_SCOPED: bool = true;

    /// Fetch every entity of the collection
    ///
    /// # Arguments
    ///
    /// * `client` - Configured Buildkite client
    /// * `organization_slug` - Organization requested by the data source, if any
    async fn read(client: &Client, organization_slug: Option<&str>) -> Result<Vec<Self>>;
}

/// Warn when a collection does not hold as many edges as announced
pub(crate) fn check_count<T>(collection: &str, scope: &str, expected: i64, list: &EdgeList<T>) {
    let received = list.edges.len();
    if i64::try_from(received).ok() != Some(expected) {
        warn!(
            collection,
            scope,
            expected,
            received,
            "GraphQL returned an unexpected number of edges"
        );
    }
}
