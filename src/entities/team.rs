use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tf_provider::map;
use tf_provider::schema::Attribute;

use crate::client::Client;
use crate::convert::{
    attributes, computed_bool, computed_string, convert_optional, object_attribute, Attributes,
    Convert, SchemaMode,
};
use crate::error::{Error, Result};

use super::{Entity, User};

/// Team of an organization
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Team {
    pub created_at: Option<String>,
    pub created_by: Option<User>,
    pub default_member_role: String,
    pub description: Option<String>,
    pub id: String,
    pub is_default_team: bool,
    pub members_can_create_pipelines: bool,
    pub name: String,
    pub privacy: String,
    pub slug: String,
    pub uuid: String,
}

impl Convert for Team {
    fn schema(mode: SchemaMode) -> HashMap<String, Attribute> {
        match mode {
            SchemaMode::ReferenceOnly => map! {
                "uuid" => computed_string("UUID of the team"),
            },
            SchemaMode::FullEntity => map! {
                "created_at" => computed_string("Creation time of the team"),
                "created_by" => object_attribute::<User>(
                    SchemaMode::ReferenceOnly,
                    "User who created the team",
                ),
                "default_member_role" => computed_string("Role given to new members of the team"),
                "description" => computed_string("Description of the team"),
                "id" => computed_string("GraphQL ID of the team"),
                "is_default_team" => computed_bool("Whether new organization members join the team"),
                "members_can_create_pipelines" => computed_bool(
                    "Whether members of the team can create pipelines",
                ),
                "name" => computed_string("Name of the team"),
                "privacy" => computed_string("Privacy of the team: VISIBLE or SECRET"),
                "slug" => computed_string("Slug of the team"),
                "uuid" => computed_string("UUID of the team"),
            },
        }
    }

    fn convert(&self, mode: SchemaMode) -> Result<Attributes> {
        Ok(match mode {
            SchemaMode::ReferenceOnly => attributes! {
                "uuid" => self.uuid.as_str(),
            },
            SchemaMode::FullEntity => attributes! {
                "created_at" => self.created_at.clone(),
                "created_by" => convert_optional(self.created_by.as_ref(), SchemaMode::ReferenceOnly)?,
                "default_member_role" => self.default_member_role.as_str(),
                "description" => self.description.clone(),
                "id" => self.id.as_str(),
                "is_default_team" => self.is_default_team,
                "members_can_create_pipelines" => self.members_can_create_pipelines,
                "name" => self.name.as_str(),
                "privacy" => self.privacy.as_str(),
                "slug" => self.slug.as_str(),
                "uuid" => self.uuid.as_str(),
            },
        })
    }
}

#[async_trait]
impl Entity for Team {
    const COLLECTION: &'static str = "teams";
    const DESCRIPTION: &'static str = "List the teams of a Buildkite organization";
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

    fn platform_team() -> Team {
        serde_json::from_value(serde_json::json!({
            "createdAt": "2023-01-02T03:04:05Z",
            "createdBy": { "uuid": "u-1", "name": "Jane" },
            "defaultMemberRole": "MEMBER",
            "id": "VGVhbS0tLTE=",
            "isDefaultTeam": false,
            "membersCanCreatePipelines": true,
            "name": "Platform",
            "privacy": "VISIBLE",
            "slug": "platform",
            "uuid": "t-1",
        }))
        .unwrap()
    }

    #[test]
    fn test_team_conversion() {
        let team = platform_team();
        assert_reference(&team, "uuid", "t-1");
        assert_matches_schema(&team, SchemaMode::FullEntity);

        let attributes = team.convert(SchemaMode::FullEntity).unwrap();
        assert_eq!(attributes["description"], AttributeValue::Null);
        assert_eq!(
            attributes["created_by"],
            AttributeValue::Object(Attributes::from([(
                "uuid".to_string(),
                AttributeValue::from("u-1")
            )]))
        );
    }

    #[test]
    fn test_team_without_creator() {
        let team = Team {
            uuid: "t-2".to_string(),
            ..Default::default()
        };
        let attributes = team.convert(SchemaMode::FullEntity).unwrap();
        assert_eq!(attributes["created_by"], AttributeValue::Null);
    }
}
