use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tf_provider::map;
use tf_provider::schema::Attribute;

use crate::client::Client;
use crate::convert::{
    attributes, computed_bool, computed_map, computed_number, computed_string, convert_all,
    convert_optional, list_attribute, object_attribute, parse_key_values, Attributes, Convert,
    SchemaMode,
};
use crate::error::{Error, Result};

use super::{Entity, User};

/// Pipeline of an organization
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Pipeline {
    pub cancel_intermediate_builds: bool,
    pub cancel_intermediate_builds_branch_filter: Option<String>,
    pub commit_short_length: Option<i64>,
    pub created_at: Option<String>,
    pub default_branch: Option<String>,
    pub description: Option<String>,
    pub favorite: bool,
    pub id: String,
    pub name: String,
    pub next_build_number: i64,
    pub repository: Option<Repository>,
    pub schedules: Vec<PipelineSchedule>,
    pub skip_intermediate_builds: bool,
    pub skip_intermediate_builds_branch_filter: Option<String>,
    pub slug: String,
    pub steps: Option<Steps>,
    pub url: Option<String>,
    pub uuid: String,
    pub visibility: Option<String>,
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Repository {
    pub provider: Option<RepositoryProvider>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RepositoryProvider {
    pub name: Option<String>,
    pub url: Option<String>,
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Steps {
    pub yaml: Option<String>,
}

/// Scheduled build of a pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineSchedule {
    pub branch: Option<String>,
    pub commit: Option<String>,
    pub created_at: Option<String>,
    pub created_by: Option<User>,
    pub cronline: String,
    pub enabled: bool,
    pub env: Vec<String>,
    pub failed_at: Option<String>,
    pub failed_message: Option<String>,
    pub id: String,
    pub label: Option<String>,
    pub message: Option<String>,
    pub next_build_at: Option<String>,
    pub owned_by: Option<User>,
    pub pipeline: Option<Pipeline>,
    pub uuid: String,
}

impl Convert for Pipeline {
    fn schema(mode: SchemaMode) -> HashMap<String, Attribute> {
        match mode {
            SchemaMode::ReferenceOnly => map! {
                "slug" => computed_string("Slug of the pipeline"),
            },
            SchemaMode::FullEntity => map! {
                "cancel_intermediate_builds" => computed_bool(
                    "Whether running builds are canceled when a newer build is created",
                ),
                "cancel_intermediate_builds_branch_filter" => computed_string(
                    "Branches on which intermediate builds are canceled",
                ),
                "commit_short_length" => computed_number("Length of abbreviated commit hashes"),
                "created_at" => computed_string("Creation time of the pipeline"),
                "default_branch" => computed_string("Default branch of the pipeline"),
                "description" => computed_string("Description of the pipeline"),
                "favorite" => computed_bool("Whether the pipeline is a favorite of the user"),
                "id" => computed_string("GraphQL ID of the pipeline"),
                "name" => computed_string("Name of the pipeline"),
                "next_build_number" => computed_number("Number of the next build"),
                "repository_provider" => computed_string("Name of the repository provider"),
                "repository_url" => computed_string("URL of the repository"),
                "schedules" => list_attribute::<PipelineSchedule>(
                    SchemaMode::ReferenceOnly,
                    "Build schedules of the pipeline",
                ),
                "skip_intermediate_builds" => computed_bool(
                    "Whether queued builds are skipped when a newer build is created",
                ),
                "skip_intermediate_builds_branch_filter" => computed_string(
                    "Branches on which intermediate builds are skipped",
                ),
                "slug" => computed_string("Slug of the pipeline"),
                "steps_yaml" => computed_string("YAML definition of the steps"),
                "url" => computed_string("URL of the pipeline"),
                "uuid" => computed_string("UUID of the pipeline"),
                "visibility" => computed_string("Visibility of the pipeline"),
                "webhook_url" => computed_string("URL of the webhook triggering builds"),
            },
        }
    }

    fn convert(&self, mode: SchemaMode) -> Result<Attributes> {
        Ok(match mode {
            SchemaMode::ReferenceOnly => attributes! {
                "slug" => self.slug.as_str(),
            },
            SchemaMode::FullEntity => attributes! {
                "cancel_intermediate_builds" => self.cancel_intermediate_builds,
                "cancel_intermediate_builds_branch_filter" => {
                    self.cancel_intermediate_builds_branch_filter.clone()
                },
                "commit_short_length" => self.commit_short_length,
                "created_at" => self.created_at.clone(),
                "default_branch" => self.default_branch.clone(),
                "description" => self.description.clone(),
                "favorite" => self.favorite,
                "id" => self.id.as_str(),
                "name" => self.name.as_str(),
                "next_build_number" => self.next_build_number,
                "repository_provider" => self
                    .repository
                    .as_ref()
                    .and_then(|repository| repository.provider.as_ref())
                    .and_then(|provider| provider.name.clone()),
                "repository_url" => self
                    .repository
                    .as_ref()
                    .and_then(|repository| repository.url.clone()),
                "schedules" => convert_all(&self.schedules, SchemaMode::ReferenceOnly)?,
                "skip_intermediate_builds" => self.skip_intermediate_builds,
                "skip_intermediate_builds_branch_filter" => {
                    self.skip_intermediate_builds_branch_filter.clone()
                },
                "slug" => self.slug.as_str(),
                "steps_yaml" => self.steps.as_ref().and_then(|steps| steps.yaml.clone()),
                "url" => self.url.clone(),
                "uuid" => self.uuid.as_str(),
                "visibility" => self.visibility.clone(),
                "webhook_url" => self.webhook_url.clone(),
            },
        })
    }
}

impl Convert for PipelineSchedule {
    fn schema(mode: SchemaMode) -> HashMap<String, Attribute> {
        let user = |description| object_attribute::<User>(SchemaMode::ReferenceOnly, description);
        match mode {
            SchemaMode::ReferenceOnly => map! {
                "uuid" => computed_string("UUID of the schedule"),
            },
            SchemaMode::FullEntity => map! {
                "branch" => computed_string("Branch built by the schedule"),
                "commit" => computed_string("Commit built by the schedule"),
                "created_at" => computed_string("Creation time of the schedule"),
                "created_by" => user("User who created the schedule"),
                "cronline" => computed_string("Cron expression of the schedule"),
                "enabled" => computed_bool("Whether the schedule is enabled"),
                "env" => computed_map("Environment variables of the scheduled builds"),
                "failed_at" => computed_string("Time the schedule last failed"),
                "failed_message" => computed_string("Reason of the last failure"),
                "id" => computed_string("GraphQL ID of the schedule"),
                "label" => computed_string("Label of the schedule"),
                "message" => computed_string("Message of the scheduled builds"),
                "next_build_at" => computed_string("Time of the next scheduled build"),
                "owned_by" => user("User owning the schedule"),
                "pipeline" => object_attribute::<Pipeline>(
                    SchemaMode::ReferenceOnly,
                    "Pipeline of the schedule",
                ),
                "uuid" => computed_string("UUID of the schedule"),
            },
        }
    }

    fn convert(&self, mode: SchemaMode) -> Result<Attributes> {
        Ok(match mode {
            SchemaMode::ReferenceOnly => attributes! {
                "uuid" => self.uuid.as_str(),
            },
            SchemaMode::FullEntity => attributes! {
                "branch" => self.branch.clone(),
                "commit" => self.commit.clone(),
                "created_at" => self.created_at.clone(),
                "created_by" => convert_optional(self.created_by.as_ref(), SchemaMode::ReferenceOnly)?,
                "cronline" => self.cronline.as_str(),
                "enabled" => self.enabled,
                "env" => parse_key_values(&self.env)?,
                "failed_at" => self.failed_at.clone(),
                "failed_message" => self.failed_message.clone(),
                "id" => self.id.as_str(),
                "label" => self.label.clone(),
                "message" => self.message.clone(),
                "next_build_at" => self.next_build_at.clone(),
                "owned_by" => convert_optional(self.owned_by.as_ref(), SchemaMode::ReferenceOnly)?,
                "pipeline" => convert_optional(self.pipeline.as_ref(), SchemaMode::ReferenceOnly)?,
                "uuid" => self.uuid.as_str(),
            },
        })
    }
}

#[async_trait]
impl Entity for Pipeline {
    const COLLECTION: &'static str = "pipelines";
    const DESCRIPTION: &'static str = "List the pipelines of a Buildkite organization";
    const ORGANIZATION_SCOPED: bool = false;

    async fn read(_client: &Client, _organization_slug: Option<&str>) -> Result<Vec<Self>> {
        Err(Error::NotImplemented(Self::COLLECTION))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::tests::{assert_matches_schema, assert_reference};
    use crate::convert::AttributeValue;
    use std::collections::BTreeMap;

    fn deploy_pipeline() -> Pipeline {
        serde_json::from_value(serde_json::json!({
            "cancelIntermediateBuilds": true,
            "cancelIntermediateBuildsBranchFilter": "!main",
            "createdAt": "2022-11-02T10:00:00Z",
            "defaultBranch": "main",
            "id": "UGlwZWxpbmUtLS0x",
            "name": "Deploy",
            "nextBuildNumber": 42,
            "repository": {
                "provider": { "name": "GitHub", "url": "https://github.com" },
                "url": "git@github.com:acme/deploy.git"
            },
            "schedules": [
                { "uuid": "s-1", "cronline": "@daily" },
                { "uuid": "s-2", "cronline": "0 * * * *" }
            ],
            "slug": "deploy",
            "steps": { "yaml": "steps:\n  - command: make deploy\n" },
            "uuid": "p-1",
            "visibility": "PRIVATE",
        }))
        .unwrap()
    }

    #[test]
    fn test_pipeline_reference_uses_slug() {
        assert_reference(&deploy_pipeline(), "slug", "deploy");
    }

    #[test]
    fn test_pipeline_conversion() {
        let pipeline = deploy_pipeline();
        assert_matches_schema(&pipeline, SchemaMode::FullEntity);

        let attributes = pipeline.convert(SchemaMode::FullEntity).unwrap();
        assert_eq!(attributes["repository_provider"], AttributeValue::from("GitHub"));
        assert_eq!(
            attributes["repository_url"],
            AttributeValue::from("git@github.com:acme/deploy.git")
        );
        assert_eq!(attributes["next_build_number"], AttributeValue::Number(42));
        assert_eq!(attributes["description"], AttributeValue::Null);
        assert_eq!(
            attributes["schedules"],
            AttributeValue::List(vec![
                Attributes::from([("uuid".to_string(), AttributeValue::from("s-1"))]),
                Attributes::from([("uuid".to_string(), AttributeValue::from("s-2"))]),
            ])
        );
    }

    #[test]
    fn test_pipeline_schedule_conversion() {
        let schedule: PipelineSchedule = serde_json::from_value(serde_json::json!({
            "branch": "main",
            "cronline": "@daily",
            "enabled": true,
            "env": ["DEPLOY=1", "TARGET=prod=eu"],
            "id": "UGlwZWxpbmVTY2hlZHVsZS0tLTE=",
            "ownedBy": { "uuid": "u-1" },
            "pipeline": { "slug": "deploy" },
            "uuid": "s-1",
        }))
        .unwrap();

        assert_reference(&schedule, "uuid", "s-1");
        assert_matches_schema(&schedule, SchemaMode::FullEntity);

        let attributes = schedule.convert(SchemaMode::FullEntity).unwrap();
        assert_eq!(
            attributes["env"],
            AttributeValue::Map(BTreeMap::from([
                ("DEPLOY".to_string(), "1".to_string()),
                ("TARGET".to_string(), "prod=eu".to_string()),
            ]))
        );
        assert_eq!(
            attributes["pipeline"],
            AttributeValue::Object(Attributes::from([(
                "slug".to_string(),
                AttributeValue::from("deploy")
            )]))
        );
        assert_eq!(attributes["created_by"], AttributeValue::Null);
    }

    #[test]
    fn test_pipeline_schedule_malformed_env() {
        let schedule = PipelineSchedule {
            uuid: "s-1".to_string(),
            env: vec!["BROKEN".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            schedule.convert(SchemaMode::FullEntity),
            Err(Error::MalformedMetadata(entry)) if entry == "BROKEN"
        ));
        // Reference mode does not look at the environment
        assert!(schedule.convert(SchemaMode::ReferenceOnly).is_ok());
    }
}
