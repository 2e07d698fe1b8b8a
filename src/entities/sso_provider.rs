use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tf_provider::map;
use tf_provider::schema::Attribute;

use crate::client::Client;
use crate::convert::{
    attributes, computed_bool, computed_number, computed_string, convert_optional,
    object_attribute, Attributes, Convert, SchemaMode,
};
use crate::error::{Error, Result};

use super::{Entity, User};

/// Single sign-on provider of an organization
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SsoProvider {
    pub created_at: Option<String>,
    pub created_by: Option<User>,
    pub disabled_at: Option<String>,
    pub disabled_by: Option<User>,
    pub disabled_reason: Option<String>,
    pub email_domain: Option<String>,
    pub email_domain_verification_address: Option<String>,
    pub email_domain_verified_at: Option<String>,
    pub enabled_at: Option<String>,
    pub enabled_by: Option<User>,
    pub id: String,
    pub note: Option<String>,
    pub session_duration_in_hours: Option<i64>,
    pub state: String,
    pub test_authorization_required: bool,
    #[serde(rename = "type")]
    pub provider_type: String,
    pub url: Option<String>,
    pub uuid: String,
}

impl Convert for SsoProvider {
    fn schema(mode: SchemaMode) -> HashMap<String, Attribute> {
        let user = |description| object_attribute::<User>(SchemaMode::ReferenceOnly, description);
        match mode {
            SchemaMode::ReferenceOnly => map! {
                "uuid" => computed_string("UUID of the SSO provider"),
            },
            SchemaMode::FullEntity => map! {
                "created_at" => computed_string("Creation time of the SSO provider"),
                "created_by" => user("User who created the SSO provider"),
                "disabled_at" => computed_string("Time the SSO provider was disabled"),
                "disabled_by" => user("User who disabled the SSO provider"),
                "disabled_reason" => computed_string("Reason the SSO provider was disabled"),
                "email_domain" => computed_string("Email domain handled by the SSO provider"),
                "email_domain_verification_address" => computed_string(
                    "Address used to verify the email domain",
                ),
                "email_domain_verified_at" => computed_string("Time the email domain was verified"),
                "enabled_at" => computed_string("Time the SSO provider was enabled"),
                "enabled_by" => user("User who enabled the SSO provider"),
                "id" => computed_string("GraphQL ID of the SSO provider"),
                "note" => computed_string("Note attached to the SSO provider"),
                "session_duration_in_hours" => computed_number(
                    "Duration of the sessions opened through the SSO provider",
                ),
                "state" => computed_string("State of the SSO provider"),
                "test_authorization_required" => computed_bool(
                    "Whether a test authorization is required before enabling",
                ),
                "type" => computed_string("Type of the SSO provider"),
                "url" => computed_string("URL of the SSO provider"),
                "uuid" => computed_string("UUID of the SSO provider"),
            },
        }
    }

    fn convert(&self, mode: SchemaMode) -> Result<Attributes> {
        let user = |user: &Option<User>| convert_optional(user.as_ref(), SchemaMode::ReferenceOnly);
        Ok(match mode {
            SchemaMode::ReferenceOnly => attributes! {
                "uuid" => self.uuid.as_str(),
            },
            SchemaMode::FullEntity => attributes! {
                "created_at" => self.created_at.clone(),
                "created_by" => user(&self.created_by)?,
                "disabled_at" => self.disabled_at.clone(),
                "disabled_by" => user(&self.disabled_by)?,
                "disabled_reason" => self.disabled_reason.clone(),
                "email_domain" => self.email_domain.clone(),
                "email_domain_verification_address" => {
                    self.email_domain_verification_address.clone()
                },
                "email_domain_verified_at" => self.email_domain_verified_at.clone(),
                "enabled_at" => self.enabled_at.clone(),
                "enabled_by" => user(&self.enabled_by)?,
                "id" => self.id.as_str(),
                "note" => self.note.clone(),
                "session_duration_in_hours" => self.session_duration_in_hours,
                "state" => self.state.as_str(),
                "test_authorization_required" => self.test_authorization_required,
                "type" => self.provider_type.as_str(),
                "url" => self.url.clone(),
                "uuid" => self.uuid.as_str(),
            },
        })
    }
}

#[async_trait]
impl Entity for SsoProvider {
    const COLLECTION: &'static str = "sso_providers";
    const DESCRIPTION: &'static str = "List the SSO providers of a Buildkite organization";
    const ORGANIZATION_SCOPED: bool = false;

    async fn read(_client: &Client, _organization_slug: Option<&str>) -> Result<Vec<Self>> {
        Err(Error::NotImplemented(Self::COLLECTION))
    }
}
