use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tf_provider::map;
use tf_provider::schema::Attribute;
use tracing::{debug, info};

use crate::client::{Client, GraphQlString};
use crate::convert::{
    attributes, computed_bool, computed_string, list_attribute, Attributes, Convert, EdgeList,
    SchemaMode,
};
use crate::error::Result;

use super::{check_count, Agent, Entity, Member, Pipeline, SsoProvider, Team};

/// Buildkite organization
///
/// The REST API provides the organization itself, the GraphQL API its collections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Organization {
    pub agents: EdgeList<Agent>,
    #[serde(alias = "icon_url")]
    pub icon_url: Option<String>,
    pub id: String,
    pub members: EdgeList<Member>,
    pub name: String,
    pub pipelines: EdgeList<Pipeline>,
    pub public: bool,
    pub slug: String,
    pub sso_providers: EdgeList<SsoProvider>,
    pub teams: EdgeList<Team>,
    pub url: Option<String>,
    pub uuid: String,
    #[serde(alias = "web_url")]
    pub web_url: Option<String>,
}

/// Summary fields and collection sizes, as returned by the GraphQL API
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct OrganizationSummary {
    agents: EdgeList<Agent>,
    icon_url: Option<String>,
    id: String,
    members: EdgeList<Member>,
    name: String,
    pipelines: EdgeList<Pipeline>,
    public: bool,
    slug: String,
    sso_providers: EdgeList<SsoProvider>,
    teams: EdgeList<Team>,
    uuid: String,
}

/// Collections of an organization, each in a single page
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct OrganizationCollections {
    agents: EdgeList<Agent>,
    members: EdgeList<Member>,
    pipelines: EdgeList<Pipeline>,
    sso_providers: EdgeList<SsoProvider>,
    teams: EdgeList<Team>,
}

fn summary_query(slug: &str) -> String {
    format!(
        "organization(slug: {}) {{ agents {{ count }} iconUrl id members {{ count }} name \
         pipelines {{ count }} public slug ssoProviders {{ count }} teams {{ count }} uuid }}",
        GraphQlString(slug)
    )
}

fn collections_query(slug: &str, organization: &Organization) -> String {
    format!(
        "organization(slug: {}) {{ \
         agents(first: {}) {{ edges {{ node {{ uuid }} }} }} \
         members(first: {}) {{ edges {{ node {{ uuid }} }} }} \
         pipelines(first: {}) {{ edges {{ node {{ slug }} }} }} \
         ssoProviders(first: {}) {{ edges {{ node {{ uuid }} }} }} \
         teams(first: {}) {{ edges {{ node {{ uuid }} }} }} }}",
        GraphQlString(slug),
        organization.agents.count,
        organization.members.count,
        organization.pipelines.count,
        organization.sso_providers.count,
        organization.teams.count,
    )
}

impl OrganizationSummary {
    fn apply(self, organization: &mut Organization) {
        organization.agents.count = self.agents.count;
        organization.icon_url = self.icon_url;
        organization.id = self.id;
        organization.members.count = self.members.count;
        organization.name = self.name;
        organization.pipelines.count = self.pipelines.count;
        organization.public = self.public;
        organization.slug = self.slug;
        organization.sso_providers.count = self.sso_providers.count;
        organization.teams.count = self.teams.count;
        organization.uuid = self.uuid;
    }
}

impl OrganizationCollections {
    fn apply(self, slug: &str, organization: &mut Organization) {
        check_count("agents", slug, organization.agents.count, &self.agents);
        check_count("members", slug, organization.members.count, &self.members);
        check_count("pipelines", slug, organization.pipelines.count, &self.pipelines);
        check_count(
            "sso_providers",
            slug,
            organization.sso_providers.count,
            &self.sso_providers,
        );
        check_count("teams", slug, organization.teams.count, &self.teams);

        organization.agents.edges = self.agents.edges;
        organization.members.edges = self.members.edges;
        organization.pipelines.edges = self.pipelines.edges;
        organization.sso_providers.edges = self.sso_providers.edges;
        organization.teams.edges = self.teams.edges;
    }
}

impl Client {
    /// List every organization the token has access to, with their collections
    pub async fn read_organizations(&self) -> Result<Vec<Organization>> {
        let mut organizations: Vec<Organization> =
            self.get_paginated(self.rest_url("organizations")).await?;

        for organization in &mut organizations {
            self.enrich_organization(organization).await?;
        }

        info!(count = organizations.len(), "Read organizations");
        Ok(organizations)
    }

    /// Complete an organization fetched from the REST API with its GraphQL collections
    ///
    /// Collection sizes are fetched first, as they are needed to request every item at once.
    async fn enrich_organization(&self, organization: &mut Organization) -> Result<()> {
        let slug = organization.slug.clone();
        debug!(organization = slug.as_str(), "Enriching organization");

        let summary: OrganizationSummary = self.query(&summary_query(&slug)).await?;
        summary.apply(organization);

        let collections: OrganizationCollections =
            self.query(&collections_query(&slug, organization)).await?;
        collections.apply(&slug, organization);

        Ok(())
    }
}

impl Convert for Organization {
    fn schema(mode: SchemaMode) -> HashMap<String, Attribute> {
        let reference = SchemaMode::ReferenceOnly;
        match mode {
            SchemaMode::ReferenceOnly => map! {
                "slug" => computed_string("Slug of the organization"),
            },
            SchemaMode::FullEntity => map! {
                "agents" => list_attribute::<Agent>(reference, "Agents of the organization"),
                "icon_url" => computed_string("URL of the icon of the organization"),
                "id" => computed_string("GraphQL ID of the organization"),
                "members" => list_attribute::<Member>(reference, "Members of the organization"),
                "name" => computed_string("Name of the organization"),
                "pipelines" => list_attribute::<Pipeline>(reference, "Pipelines of the organization"),
                "public" => computed_bool("Whether the organization is public"),
                "slug" => computed_string("Slug of the organization"),
                "sso_providers" => list_attribute::<SsoProvider>(
                    reference,
                    "SSO providers of the organization",
                ),
                "teams" => list_attribute::<Team>(reference, "Teams of the organization"),
                "url" => computed_string("REST API URL of the organization"),
                "uuid" => computed_string("UUID of the organization"),
                "web_url" => computed_string("Web URL of the organization"),
            },
        }
    }

    fn convert(&self, mode: SchemaMode) -> Result<Attributes> {
        let reference = SchemaMode::ReferenceOnly;
        Ok(match mode {
            SchemaMode::ReferenceOnly => attributes! {
                "slug" => self.slug.as_str(),
            },
            SchemaMode::FullEntity => attributes! {
                "agents" => self.agents.convert(reference)?,
                "icon_url" => self.icon_url.clone(),
                "id" => self.id.as_str(),
                "members" => self.members.convert(reference)?,
                "name" => self.name.as_str(),
                "pipelines" => self.pipelines.convert(reference)?,
                "public" => self.public,
                "slug" => self.slug.as_str(),
                "sso_providers" => self.sso_providers.convert(reference)?,
                "teams" => self.teams.convert(reference)?,
                "url" => self.url.clone(),
                "uuid" => self.uuid.as_str(),
                "web_url" => self.web_url.clone(),
            },
        })
    }
}

#[async_trait]
impl Entity for Organization {
    const COLLECTION: &'static str = "organizations";
    const DESCRIPTION: &'static str = "List the Buildkite organizations accessible with the token";
    const ORGANIZATION_SCOPED: bool = false;

    async fn read(client: &Client, _organization_slug: Option<&str>) -> Result<Vec<Self>> {
        client.read_organizations().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Endpoints;
    use crate::convert::tests::{assert_matches_schema, assert_reference};
    use crate::convert::AttributeValue;
    use crate::error::Error;
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(uri: &str) -> Client {
        Client::new("token", None).with_endpoints(Endpoints {
            rest: format!("{uri}/v2"),
            graphql: format!("{uri}/v1"),
        })
    }

    fn rest_organization(slug: &str) -> serde_json::Value {
        serde_json::json!({
            "id": format!("rest-{slug}"),
            "graphql_id": format!("T3JnYW5pemF0aW9uLS0t{slug}"),
            "url": format!("https://api.buildkite.com/v2/organizations/{slug}"),
            "web_url": format!("https://buildkite.com/{slug}"),
            "name": slug,
            "slug": slug,
            "agents_url": format!("https://api.buildkite.com/v2/organizations/{slug}/agents"),
            "created_at": "2021-01-01T00:00:00.000Z"
        })
    }

    fn summary(slug: &str, agents: i64) -> serde_json::Value {
        serde_json::json!({
            "data": { "organization": {
                "agents": { "count": agents },
                "iconUrl": format!("https://buildkite.com/{slug}.png"),
                "id": format!("gql-{slug}"),
                "members": { "count": 1 },
                "name": format!("{slug} Inc"),
                "pipelines": { "count": 1 },
                "public": true,
                "slug": slug,
                "ssoProviders": { "count": 0 },
                "teams": { "count": 1 },
                "uuid": format!("uuid-{slug}")
            } }
        })
    }

    fn collections(agents: &[&str]) -> serde_json::Value {
        let agents: Vec<_> = agents
            .iter()
            .map(|uuid| serde_json::json!({ "node": { "uuid": uuid } }))
            .collect();
        serde_json::json!({
            "data": { "organization": {
                "agents": { "edges": agents },
                "members": { "edges": [{ "node": { "uuid": "m-1" } }] },
                "pipelines": { "edges": [{ "node": { "slug": "deploy" } }] },
                "ssoProviders": { "edges": [] },
                "teams": { "edges": [{ "node": { "uuid": "t-1" } }] }
            } }
        })
    }

    #[test]
    fn test_rest_organization_decoding() {
        let organization: Organization =
            serde_json::from_value(rest_organization("acme")).unwrap();
        assert_eq!(organization.slug, "acme");
        assert_eq!(organization.web_url.as_deref(), Some("https://buildkite.com/acme"));
        assert_eq!(organization.agents.count, 0);
        assert!(organization.agents.edges.is_empty());
    }

    #[test]
    fn test_collections_query_uses_counts() {
        let mut organization = Organization::default();
        organization.agents.count = 2;
        organization.members.count = 5;
        organization.teams.count = 3;
        let query = collections_query("acme", &organization);
        assert!(query.starts_with(r#"organization(slug: "acme") { agents(first: 2)"#));
        assert!(query.contains("members(first: 5) { edges { node { uuid } } }"));
        assert!(query.contains("pipelines(first: 0) { edges { node { slug } } }"));
        assert!(query.contains("ssoProviders(first: 0)"));
        assert!(query.contains("teams(first: 3)"));
    }

    #[tokio::test]
    async fn test_read_organizations_enriches_each_organization() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2/organizations"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!([
                    rest_organization("acme")
                ])),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1"))
            .and(body_string_contains("agents { count }"))
            .respond_with(ResponseTemplate::new(200).set_body_json(summary("acme", 2)))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1"))
            .and(body_string_contains("agents(first: 2)"))
            .and(body_string_contains("members(first: 1)"))
            .and(body_string_contains("ssoProviders(first: 0)"))
            .respond_with(ResponseTemplate::new(200).set_body_json(collections(&["a-1", "a-2"])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server.uri());
        let organizations = Organization::read(&client, None).await.unwrap();
        assert_eq!(organizations.len(), 1);

        let acme = &organizations[0];
        assert_eq!(acme.id, "gql-acme");
        assert_eq!(acme.name, "acme Inc");
        assert_eq!(acme.uuid, "uuid-acme");
        assert!(acme.public);
        assert_eq!(acme.web_url.as_deref(), Some("https://buildkite.com/acme"));
        assert_eq!(acme.agents.count, 2);
        let agents: Vec<&str> = acme.agents.nodes().map(|agent| agent.uuid.as_str()).collect();
        assert_eq!(agents, vec!["a-1", "a-2"]);

        assert_matches_schema(acme, SchemaMode::FullEntity);
        assert_reference(acme, "slug", "acme");

        let attributes = acme.convert(SchemaMode::FullEntity).unwrap();
        assert_eq!(
            attributes["agents"],
            AttributeValue::List(vec![
                Attributes::from([("uuid".to_string(), AttributeValue::from("a-1"))]),
                Attributes::from([("uuid".to_string(), AttributeValue::from("a-2"))]),
            ])
        );
        assert_eq!(
            attributes["pipelines"],
            AttributeValue::List(vec![Attributes::from([(
                "slug".to_string(),
                AttributeValue::from("deploy")
            )])])
        );
        assert_eq!(attributes["sso_providers"], AttributeValue::List(vec![]));
    }

    #[tokio::test]
    async fn test_read_organizations_across_pages() {
        let mock_server = MockServer::start().await;
        let uri = mock_server.uri();

        Mock::given(method("GET"))
            .and(path("/v2/organizations"))
            .and(query_param("page", "2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([rest_organization("globex")])),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v2/organizations"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header(
                        "Link",
                        format!(r#"<{uri}/v2/organizations?page=2>; rel="next""#).as_str(),
                    )
                    .set_body_json(serde_json::json!([rest_organization("acme")])),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        for (slug, agents) in [("acme", 1), ("globex", 0)] {
            let summary_matcher = format!(r#"organization(slug: \"{slug}\") {{ agents {{ count }}"#);
            Mock::given(method("POST"))
                .and(path("/v1"))
                .and(body_string_contains(summary_matcher.as_str()))
                .respond_with(ResponseTemplate::new(200).set_body_json(summary(slug, agents)))
                .expect(1)
                .mount(&mock_server)
                .await;
        }

        Mock::given(method("POST"))
            .and(path("/v1"))
            .and(body_string_contains("agents(first: 1)"))
            .respond_with(ResponseTemplate::new(200).set_body_json(collections(&["a-1"])))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1"))
            .and(body_string_contains("agents(first: 0)"))
            .respond_with(ResponseTemplate::new(200).set_body_json(collections(&[])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = test_client(&uri);
        let organizations = client.read_organizations().await.unwrap();

        let slugs: Vec<&str> = organizations.iter().map(|org| org.slug.as_str()).collect();
        assert_eq!(slugs, vec!["acme", "globex"]);
        assert_eq!(organizations[0].agents.edges.len(), 1);
        assert!(organizations[1].agents.edges.is_empty());
    }

    #[tokio::test]
    async fn test_count_mismatch_keeps_returned_edges() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2/organizations"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([rest_organization("acme")])),
            )
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1"))
            .and(body_string_contains("agents { count }"))
            .respond_with(ResponseTemplate::new(200).set_body_json(summary("acme", 3)))
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1"))
            .and(body_string_contains("agents(first: 3)"))
            .respond_with(ResponseTemplate::new(200).set_body_json(collections(&["a-1"])))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server.uri());
        let organizations = client.read_organizations().await.unwrap();
        assert_eq!(organizations[0].agents.count, 3);
        assert_eq!(organizations[0].agents.edges.len(), 1);
    }

    #[tokio::test]
    async fn test_graphql_failure_aborts_read() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2/organizations"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([rest_organization("acme")])),
            )
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "errors": [{ "message": "Your API token does not have GraphQL access" }]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server.uri());
        let err = client.read_organizations().await.unwrap_err();
        assert!(matches!(err, Error::Protocol(_)), "{err:?}");
    }
}
