//! The Buildkite provider

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tf_provider::schema::Schema;
use tf_provider::value::ValueEmpty;
use tf_provider::{map, Diagnostics, DynamicDataSource, DynamicResource, Provider};
use tokio::sync::RwLock;
use tracing::info;

use crate::client::Client;
use crate::config::ProviderConfig;
use crate::data_source::EntityDataSource;
use crate::entities::{Agent, Build, Entity, Member, Organization, Pipeline, SsoProvider, Team};
use crate::resource::PlaceholderResource;
use crate::utils::WithSchema;

/// Client shared by the provider and its data sources, set once the provider is configured
pub type SharedClient = Arc<RwLock<Option<Client>>>;

#[derive(Debug, Default, Clone)]
pub struct BuildkiteProvider {
    client: SharedClient,
}

impl BuildkiteProvider {
    /// Client in use, if the provider is configured
    pub async fn client(&self) -> Option<Client> {
        self.client.read().await.clone()
    }
}

#[async_trait]
impl Provider for BuildkiteProvider {
    type Config<'a> = ProviderConfig<'a>;
    type MetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(ProviderConfig::schema())
    }

    async fn configure<'a>(
        &self,
        diags: &mut Diagnostics,
        terraform_version: String,
        config: Self::Config<'a>,
    ) -> Option<()> {
        let settings = config.resolve(diags, |name| std::env::var(name).ok())?;
        info!(
            terraform_version,
            organization = ?settings.organization_slug,
            "Configuring the Buildkite provider"
        );

        *self.client.write().await =
            Some(Client::new(settings.api_token, settings.organization_slug));
        Some(())
    }

    fn get_resources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<HashMap<String, Box<dyn DynamicResource>>> {
        Some(map! {
            "pipeline" => PlaceholderResource::new("Buildkite pipeline"),
            "pipeline_schedule" => PlaceholderResource::new("Build schedule of a Buildkite pipeline"),
            "sso_provider" => PlaceholderResource::new("Buildkite SSO provider"),
            "team" => PlaceholderResource::new("Buildkite team"),
            "team_member" => PlaceholderResource::new("Membership of a user in a Buildkite team"),
            "team_pipeline" => PlaceholderResource::new("Access of a Buildkite team to a pipeline"),
        })
    }

    fn get_data_sources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<HashMap<String, Box<dyn DynamicDataSource>>> {
        let client = &self.client;
        Some(map! {
            Agent::COLLECTION => EntityDataSource::<Agent>::new(client.clone()),
            Build::COLLECTION => EntityDataSource::<Build>::new(client.clone()),
            Member::COLLECTION => EntityDataSource::<Member>::new(client.clone()),
            Organization::COLLECTION => EntityDataSource::<Organization>::new(client.clone()),
            Pipeline::COLLECTION => EntityDataSource::<Pipeline>::new(client.clone()),
            SsoProvider::COLLECTION => EntityDataSource::<SsoProvider>::new(client.clone()),
            Team::COLLECTION => EntityDataSource::<Team>::new(client.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;
    use tf_provider::value::Value;

    fn sorted_keys<V>(map: &HashMap<String, V>) -> Vec<&str> {
        let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    #[test]
    fn test_registered_data_sources() {
        let provider = BuildkiteProvider::default();
        let data_sources = provider
            .get_data_sources(&mut Diagnostics::default())
            .unwrap();
        assert_eq!(
            sorted_keys(&data_sources),
            vec![
                "agents",
                "builds",
                "members",
                "organizations",
                "pipelines",
                "sso_providers",
                "teams"
            ]
        );
    }

    #[test]
    fn test_registered_resources() {
        let provider = BuildkiteProvider::default();
        let resources = provider.get_resources(&mut Diagnostics::default()).unwrap();
        assert_eq!(
            sorted_keys(&resources),
            vec![
                "pipeline",
                "pipeline_schedule",
                "sso_provider",
                "team",
                "team_member",
                "team_pipeline"
            ]
        );
    }

    #[test]
    fn test_schema() {
        let provider = BuildkiteProvider::default();
        let schema = Provider::schema(&provider, &mut Diagnostics::default()).unwrap();
        assert_eq!(
            sorted_keys(&schema.block.attributes),
            vec!["api_token", "organization_slug"]
        );
    }

    #[tokio::test]
    async fn test_configure_shares_client_with_data_sources() {
        let provider = BuildkiteProvider::default();
        assert!(provider.client().await.is_none());

        let mut diags = Diagnostics::default();
        let config = ProviderConfig {
            api_token: Value::Value(Cow::Borrowed("token")),
            organization_slug: Value::Value(Cow::Borrowed("acme")),
        };
        provider
            .configure(&mut diags, "1.9.0".to_string(), config)
            .await
            .unwrap();
        assert!(diags.errors.is_empty());

        let client = provider.client().await.unwrap();
        assert_eq!(client.organization_slug(None).unwrap(), "acme");
    }
}
