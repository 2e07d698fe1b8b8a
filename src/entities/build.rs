use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tf_provider::map;
use tf_provider::schema::Attribute;

use crate::client::Client;
use crate::convert::{
    attributes, computed_map, computed_number, computed_string, convert_all, convert_optional,
    list_attribute, object_attribute, parse_key_values, Attributes, Convert, SchemaMode,
};
use crate::error::{Error, Result};

use super::{Entity, Pipeline, User};

/// Build of a pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Build {
    pub annotations: Vec<Annotation>,
    pub branch: String,
    pub canceled_at: Option<String>,
    pub canceled_by: Option<User>,
    pub commit: String,
    pub created_at: Option<String>,
    pub created_by: Option<User>,
    pub env: Vec<String>,
    pub finished_at: Option<String>,
    pub id: String,
    pub message: Option<String>,
    pub number: i64,
    pub pipeline: Option<Pipeline>,
    pub pull_request: Option<PullRequest>,
    pub rebuilt_from: Option<Box<Build>>,
    pub scheduled_at: Option<String>,
    pub source: Option<BuildSource>,
    pub started_at: Option<String>,
    pub state: String,
    pub triggered_from: Option<TriggeredFrom>,
    pub url: String,
    pub uuid: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PullRequest {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BuildSource {
    pub name: Option<String>,
}

/// Job that triggered a build
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TriggeredFrom {
    pub build: Option<Box<Build>>,
    pub id: Option<String>,
    pub uuid: Option<String>,
}

/// Annotation attached to a build
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Annotation {
    pub body: Option<AnnotationBody>,
    pub context: String,
    pub created_at: Option<String>,
    pub id: String,
    pub style: Option<String>,
    pub updated_at: Option<String>,
    pub uuid: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AnnotationBody {
    pub html: Option<String>,
    pub text: Option<String>,
}

impl Convert for Build {
    fn schema(mode: SchemaMode) -> HashMap<String, Attribute> {
        let user = |description| object_attribute::<User>(SchemaMode::ReferenceOnly, description);
        let build = |description| object_attribute::<Build>(SchemaMode::ReferenceOnly, description);
        match mode {
            SchemaMode::ReferenceOnly => map! {
                "uuid" => computed_string("UUID of the build"),
            },
            SchemaMode::FullEntity => map! {
                "annotations" => list_attribute::<Annotation>(
                    SchemaMode::ReferenceOnly,
                    "Annotations of the build",
                ),
                "branch" => computed_string("Branch of the build"),
                "canceled_at" => computed_string("Time the build was canceled"),
                "canceled_by" => user("User who canceled the build"),
                "commit" => computed_string("Commit of the build"),
                "created_at" => computed_string("Creation time of the build"),
                "created_by" => user("User who created the build"),
                "env" => computed_map("Environment variables of the build"),
                "finished_at" => computed_string("Time the build finished"),
                "id" => computed_string("GraphQL ID of the build"),
                "message" => computed_string("Message of the build"),
                "number" => computed_number("Number of the build within its pipeline"),
                "pipeline" => object_attribute::<Pipeline>(
                    SchemaMode::ReferenceOnly,
                    "Pipeline of the build",
                ),
                "pull_request_id" => computed_string("ID of the pull request of the build"),
                "rebuilt_from" => build("Build this build is a rebuild of"),
                "scheduled_at" => computed_string("Time the build was scheduled"),
                "source" => computed_string("Source that created the build"),
                "started_at" => computed_string("Time the build started"),
                "state" => computed_string("State of the build"),
                "triggered_from_build" => build("Build whose trigger step created this build"),
                "url" => computed_string("URL of the build"),
                "uuid" => computed_string("UUID of the build"),
            },
        }
    }

    fn convert(&self, mode: SchemaMode) -> Result<Attributes> {
        let reference = SchemaMode::ReferenceOnly;
        Ok(match mode {
            SchemaMode::ReferenceOnly => attributes! {
                "uuid" => self.uuid.as_str(),
            },
            SchemaMode::FullEntity => attributes! {
                "annotations" => convert_all(&self.annotations, reference)?,
                "branch" => self.branch.as_str(),
                "canceled_at" => self.canceled_at.clone(),
                "canceled_by" => convert_optional(self.canceled_by.as_ref(), reference)?,
                "commit" => self.commit.as_str(),
                "created_at" => self.created_at.clone(),
                "created_by" => convert_optional(self.created_by.as_ref(), reference)?,
                "env" => parse_key_values(&self.env)?,
                "finished_at" => self.finished_at.clone(),
                "id" => self.id.as_str(),
                "message" => self.message.clone(),
                "number" => self.number,
                "pipeline" => convert_optional(self.pipeline.as_ref(), reference)?,
                "pull_request_id" => self
                    .pull_request
                    .as_ref()
                    .and_then(|pull_request| pull_request.id.clone()),
                "rebuilt_from" => convert_optional(self.rebuilt_from.as_deref(), reference)?,
                "scheduled_at" => self.scheduled_at.clone(),
                "source" => self.source.as_ref().and_then(|source| source.name.clone()),
                "started_at" => self.started_at.clone(),
                "state" => self.state.as_str(),
                "triggered_from_build" => convert_optional(
                    self.triggered_from
                        .as_ref()
                        .and_then(|triggered_from| triggered_from.build.as_deref()),
                    reference,
                )?,
                "url" => self.url.as_str(),
                "uuid" => self.uuid.as_str(),
            },
        })
    }
}

impl Convert for Annotation {
    fn schema(mode: SchemaMode) -> HashMap<String, Attribute> {
        match mode {
            SchemaMode::ReferenceOnly => map! {
                "uuid" => computed_string("UUID of the annotation"),
            },
            SchemaMode::FullEntity => map! {
                "body_html" => computed_string("HTML body of the annotation"),
                "body_text" => computed_string("Raw body of the annotation"),
                "context" => computed_string("Context of the annotation"),
                "created_at" => computed_string("Creation time of the annotation"),
                "id" => computed_string("GraphQL ID of the annotation"),
                "style" => computed_string("Style of the annotation"),
                "updated_at" => computed_string("Last update time of the annotation"),
                "uuid" => computed_string("UUID of the annotation"),
            },
        }
    }

    fn convert(&self, mode: SchemaMode) -> Result<Attributes> {
        let body = self.body.as_ref();
        Ok(match mode {
            SchemaMode::ReferenceOnly => attributes! {
                "uuid" => self.uuid.as_str(),
            },
            SchemaMode::FullEntity => attributes! {
                "body_html" => body.and_then(|body| body.html.clone()),
                "body_text" => body.and_then(|body| body.text.clone()),
                "context" => self.context.as_str(),
                "created_at" => self.created_at.clone(),
                "id" => self.id.as_str(),
                "style" => self.style.clone(),
                "updated_at" => self.updated_at.clone(),
                "uuid" => self.uuid.as_str(),
            },
        })
    }
}

#[async_trait]
impl Entity for Build {
    const COLLECTION: &'static str = "builds";
    const DESCRIPTION: &'static str = "List the builds of a Buildkite organization";
    const ORGANIZATION_SCOPED: bool = false;

    async fn read(_client: &Client, _organization_slug: Option<&str>) -> Result<Vec<Self>> {
        Err(Error::NotImplemented(Self::COLLECTION))
    }
}
