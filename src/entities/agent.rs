use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tf_provider::map;
use tf_provider::schema::Attribute;
use tracing::info;

use crate::client::{Client, GraphQlString};
use crate::convert::{
    attributes, computed_bool, computed_map, computed_string, parse_key_values, Attributes,
    Convert, EdgeList, SchemaMode,
};
use crate::error::Result;

use super::{check_count, Entity};

/// Fields requested for every agent
const AGENT_FIELDS: &str = "hostname id ipAddress isDeprecated metaData name \
    operatingSystem { name } public userAgent uuid version versionHasKnownIssues";

/// Agent connected to an organization
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Agent {
    pub hostname: Option<String>,
    pub id: String,
    pub ip_address: Option<String>,
    pub is_deprecated: bool,
    pub meta_data: Vec<String>,
    pub name: String,
    pub operating_system: Option<OperatingSystem>,
    pub public: bool,
    pub user_agent: Option<String>,
    pub uuid: String,
    pub version: Option<String>,
    pub version_has_known_issues: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OperatingSystem {
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OrganizationAgents {
    agents: EdgeList<Agent>,
}

impl Client {
    /// List the agents of an organization
    ///
    /// The number of agents is queried first, then every agent is requested in a single page.
    pub async fn read_agents(&self, organization_slug: Option<&str>) -> Result<Vec<Agent>> {
        let slug = self.organization_slug(organization_slug)?;
        let organization = GraphQlString(slug);

        let counts: OrganizationAgents = self
            .query(&format!(
                "organization(slug: {organization}) {{ agents {{ count }} }}"
            ))
            .await?;
        let count = counts.agents.count;

        let listed: OrganizationAgents = self
            .query(&format!(
                "organization(slug: {organization}) {{ \
                 agents(first: {count}) {{ edges {{ node {{ {AGENT_FIELDS} }} }} }} }}"
            ))
            .await?;
        check_count("agents", slug, count, &listed.agents);

        info!(organization = slug, count = listed.agents.edges.len(), "Read agents");
        Ok(listed.agents.edges.into_iter().map(|edge| edge.node).collect())
    }
}

impl Convert for Agent {
    fn schema(mode: SchemaMode) -> HashMap<String, Attribute> {
        match mode {
            SchemaMode::ReferenceOnly => map! {
                "uuid" => computed_string("UUID of the agent"),
            },
            SchemaMode::FullEntity => map! {
                "hostname" => computed_string("Hostname of the machine running the agent"),
                "id" => computed_string("GraphQL ID of the agent"),
                "ip_address" => computed_string("IP address of the agent"),
                "is_deprecated" => computed_bool("Whether the agent version is deprecated"),
                "meta_data" => computed_map("Tags of the agent"),
                "name" => computed_string("Name of the agent"),
                "operating_system" => computed_string("Operating system of the agent"),
                "public" => computed_bool("Whether the agent is visible publicly"),
                "user_agent" => computed_string("User agent reported by the agent"),
                "uuid" => computed_string("UUID of the agent"),
                "version" => computed_string("Version of the agent"),
                "version_has_known_issues" => computed_bool(
                    "Whether the version of the agent has known issues",
                ),
            },
        }
    }

    fn convert(&self, mode: SchemaMode) -> Result<Attributes> {
        Ok(match mode {
            SchemaMode::ReferenceOnly => attributes! {
                "uuid" => self.uuid.as_str(),
            },
            SchemaMode::FullEntity => attributes! {
                "hostname" => self.hostname.clone(),
                "id" => self.id.as_str(),
                "ip_address" => self.ip_address.clone(),
                "is_deprecated" => self.is_deprecated,
                "meta_data" => parse_key_values(&self.meta_data)?,
                "name" => self.name.as_str(),
                "operating_system" => self
                    .operating_system
                    .as_ref()
                    .and_then(|os| os.name.clone()),
                "public" => self.public,
                "user_agent" => self.user_agent.clone(),
                "uuid" => self.uuid.as_str(),
                "version" => self.version.clone(),
                "version_has_known_issues" => self.version_has_known_issues,
            },
        })
    }
}

#[async_trait]
impl Entity for Agent {
    const COLLECTION: &'static str = "agents";
    const DESCRIPTION: &'static str = "List the agents connected to a Buildkite organization";

    async fn read(client: &Client, organization_slug: Option<&str>) -> Result<Vec<Self>> {
        client.read_agents(organization_slug).await
    }
}
