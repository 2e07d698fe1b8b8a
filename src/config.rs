//! Provider configuration

use serde::{Deserialize, Serialize};
use tf_provider::map;
use tf_provider::schema::{
    Attribute, AttributeConstraint, AttributeType, Block, Description, Schema,
};
use tf_provider::value::ValueString;
use tf_provider::{AttributePath, Diagnostics};

use crate::utils::WithSchema;

pub const API_TOKEN_VARIABLES: [&str; 2] = ["BUILDKITE_API_TOKEN", "BUILDKITE_AGENT_ACCESS_TOKEN"];
pub const ORGANIZATION_SLUG_VARIABLE: &str = "BUILDKITE_ORGANIZATION_SLUG";

/// Content of the `provider "buildkite"` block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig<'a> {
    #[serde(borrow = "'a")]
    pub api_token: ValueString<'a>,
    pub organization_slug: ValueString<'a>,
}

/// Configuration once the environment fallbacks are applied
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_token: String,
    pub organization_slug: Option<String>,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("organization_slug", &self.organization_slug)
            .finish_non_exhaustive()
    }
}

impl ProviderConfig<'_> {
    /// Apply the environment fallbacks
    ///
    /// # Arguments
    ///
    /// * `diags` - Diagnostics where a missing token is reported
    /// * `env` - Lookup of environment variables
    ///
    /// # Remarks
    ///
    /// Empty values are treated as unset, both in the configuration and in the environment.
    pub fn resolve<F>(&self, diags: &mut Diagnostics, env: F) -> Option<Settings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| env(name).filter(|value| !value.is_empty());

        let api_token = non_empty(&self.api_token)
            .or_else(|| API_TOKEN_VARIABLES.iter().find_map(|name| lookup(name)));
        let organization_slug =
            non_empty(&self.organization_slug).or_else(|| lookup(ORGANIZATION_SLUG_VARIABLE));

        let Some(api_token) = api_token else {
            diags.error(
                "Missing Buildkite API token",
                format!(
                    "Set `api_token` in the provider configuration, or one of the {} environment variables.",
                    API_TOKEN_VARIABLES.join(" or ")
                ),
                AttributePath::new("api_token"),
            );
            return None;
        };

        Some(Settings {
            api_token,
            organization_slug,
        })
    }
}

fn non_empty(value: &ValueString<'_>) -> Option<String> {
    value
        .as_deref_option()
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

impl WithSchema for ProviderConfig<'_> {
    fn schema() -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "api_token" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain(
                            "API token used to reach Buildkite. Defaults to BUILDKITE_API_TOKEN, then BUILDKITE_AGENT_ACCESS_TOKEN",
                        ),
                        constraint: AttributeConstraint::Optional,
                        sensitive: true,
                        ..Default::default()
                    },
                    "organization_slug" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain(
                            "Organization read by default. Defaults to BUILDKITE_ORGANIZATION_SLUG",
                        ),
                        constraint: AttributeConstraint::Optional,
                        ..Default::default()
                    },
                },
                description: Description::plain("Buildkite"),
                ..Default::default()
            },
        }
    }
}
