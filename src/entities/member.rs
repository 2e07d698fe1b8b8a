use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tf_provider::map;
use tf_provider::schema::Attribute;

use crate::client::Client;
use crate::convert::{attributes, computed_string, Attributes, Convert, SchemaMode};
use crate::error::{Error, Result};

use super::Entity;

/// Member of an organization
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Member {
    pub uuid: String,
}

impl Convert for Member {
    fn schema(_mode: SchemaMode) -> HashMap<String, Attribute> {
        map! {
            "uuid" => computed_string("UUID of the member"),
        }
    }

    fn convert(&self, _mode: SchemaMode) -> Result<Attributes> {
        Ok(attributes! {
            "uuid" => self.uuid.as_str(),
        })
    }
}

#[async_trait]
impl Entity for Member {
    const COLLECTION: &'static str = "members";
    const DESCRIPTION: &'static str = "List the members of a Buildkite organization";
    const ORGANIZATION_SCOPED: bool = false;

    async fn read(_client: &Client, _organization_slug: Option<&str>) -> Result<Vec<Self>> {
        Err(Error::NotImplemented(Self::COLLECTION))
    }
}
