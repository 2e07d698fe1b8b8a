use std::collections::HashMap;

use serde::Deserialize;
use tf_provider::map;
use tf_provider::schema::Attribute;

use crate::convert::{attributes, computed_bool, computed_string, Attributes, Convert, SchemaMode};
use crate::error::Result;

/// Buildkite user, referenced by most entities as creator or owner
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct User {
    pub avatar: Option<Avatar>,
    pub bot: bool,
    pub email: Option<String>,
    pub has_password: bool,
    pub id: String,
    pub name: Option<String>,
    pub uuid: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Avatar {
    pub url: Option<String>,
}

impl Convert for User {
    fn schema(mode: SchemaMode) -> HashMap<String, Attribute> {
        match mode {
            SchemaMode::ReferenceOnly => map! {
                "uuid" => computed_string("UUID of the user"),
            },
            SchemaMode::FullEntity => map! {
                "avatar_url" => computed_string("URL of the avatar of the user"),
                "bot" => computed_bool("Whether the user is a bot"),
                "email" => computed_string("Email address of the user"),
                "has_password" => computed_bool("Whether the user has a password"),
                "id" => computed_string("GraphQL ID of the user"),
                "name" => computed_string("Name of the user"),
                "uuid" => computed_string("UUID of the user"),
            },
        }
    }

    fn convert(&self, mode: SchemaMode) -> Result<Attributes> {
        Ok(match mode {
            SchemaMode::ReferenceOnly => attributes! {
                "uuid" => self.uuid.as_str(),
            },
            SchemaMode::FullEntity => attributes! {
                "avatar_url" => self.avatar.as_ref().and_then(|avatar| avatar.url.clone()),
                "bot" => self.bot,
                "email" => self.email.clone(),
                "has_password" => self.has_password,
                "id" => self.id.as_str(),
                "name" => self.name.clone(),
                "uuid" => self.uuid.as_str(),
            },
        })
    }
}
