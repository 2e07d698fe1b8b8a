//! Data sources listing Buildkite entities

use std::fmt;
use std::marker::PhantomData;

use async_trait::async_trait;
use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tf_provider::map;
use tf_provider::schema::{
    Attribute, AttributeConstraint, AttributeType, Block, Description, Schema,
};
use tf_provider::value::{Value, ValueEmpty};
use tf_provider::{DataSource, Diagnostics};
use tracing::{info, warn};

use crate::convert::{convert_all, list_attribute, Attributes, SchemaMode};
use crate::entities::Entity;
use crate::error::Error;
use crate::provider::SharedClient;
use crate::utils::{unique_id, WithSchema};

/// Data source listing every entity of a collection
pub struct EntityDataSource<E> {
    client: SharedClient,
    entity: PhantomData<fn() -> E>,
}

impl<E: Entity> EntityDataSource<E> {
    pub fn new(client: SharedClient) -> Self {
        Self {
            client,
            entity: PhantomData,
        }
    }
}

impl<E> fmt::Debug for EntityDataSource<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityDataSource")
            .field("entity", &std::any::type_name::<E>())
            .finish_non_exhaustive()
    }
}

/// State of an [`EntityDataSource`]
///
/// The list attribute is named after the collection, hence the manual serde implementations.
pub struct EntityDataSourceState<E> {
    pub id: Value<String>,
    pub organization_slug: Value<String>,
    pub entities: Value<Vec<Attributes>>,
    entity: PhantomData<fn() -> E>,
}

impl<E> Default for EntityDataSourceState<E> {
    fn default() -> Self {
        Self {
            id: Value::Null,
            organization_slug: Value::Null,
            entities: Value::Null,
            entity: PhantomData,
        }
    }
}

impl<E> fmt::Debug for EntityDataSourceState<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityDataSourceState")
            .field("id", &self.id)
            .field("organization_slug", &self.organization_slug)
            .field("entities", &self.entities)
            .finish()
    }
}

impl<E: Entity> Serialize for EntityDataSourceState<E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if E::ORGANIZATION_SCOPED { 3 } else { 2 };
        let mut state = serializer.serialize_struct("EntityDataSourceState", len)?;
        state.serialize_field("id", &self.id)?;
        if E::ORGANIZATION_SCOPED {
            state.serialize_field("organization_slug", &self.organization_slug)?;
        }
        state.serialize_field(E::COLLECTION, &self.entities)?;
        state.end()
    }
}

impl<'de, E: Entity> Deserialize<'de> for EntityDataSourceState<E> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(StateVisitor(PhantomData))
    }
}

struct StateVisitor<E>(PhantomData<fn() -> E>);

impl<'de, E: Entity> Visitor<'de> for StateVisitor<E> {
    type Value = EntityDataSourceState<E>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "the state of the {} data source", E::COLLECTION)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut state = EntityDataSourceState::default();
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "id" => state.id = map.next_value()?,
                "organization_slug" => state.organization_slug = map.next_value()?,
                key if key == E::COLLECTION => state.entities = map.next_value()?,
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(state)
    }
}

impl<E: Entity> WithSchema for EntityDataSourceState<E> {
    fn schema() -> Schema {
        let mut attributes: std::collections::HashMap<String, Attribute> = map! {
            "id" => Attribute {
                attr_type: AttributeType::String,
                description: Description::plain("Random identifier of the read"),
                constraint: AttributeConstraint::Computed,
                ..Default::default()
            },
            E::COLLECTION => list_attribute::<E>(SchemaMode::FullEntity, E::DESCRIPTION),
        };
        if E::ORGANIZATION_SCOPED {
            attributes.insert(
                "organization_slug".to_owned(),
                Attribute {
                    attr_type: AttributeType::String,
                    description: Description::plain(
                        "Organization to read from, defaults to the organization of the provider",
                    ),
                    constraint: AttributeConstraint::Optional,
                    ..Default::default()
                },
            );
        }

        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes,
                description: Description::plain(E::DESCRIPTION),
                ..Default::default()
            },
        }
    }
}

#[async_trait]
impl<E: Entity> DataSource for EntityDataSource<E> {
    type State<'a> = EntityDataSourceState<E>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(EntityDataSourceState::<E>::schema())
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        config: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::State<'a>> {
        let client = self.client.read().await.clone();
        let Some(client) = client else {
            diags.root_error(
                "Provider is not configured",
                format!(
                    "The Buildkite provider must be configured before reading {}",
                    E::COLLECTION
                ),
            );
            return None;
        };

        let entities = match E::read(&client, config.organization_slug.as_deref_option()).await {
            Ok(entities) => entities,
            Err(Error::NotImplemented(collection)) => {
                warn!(collection, "Reading a collection that is not available yet");
                diags.root_warning(
                    format!("Reading {collection} is not implemented"),
                    format!("The `{collection}` list is left empty."),
                );
                Vec::new()
            }
            Err(err) => {
                diags.root_error(format!("Failed to read {}", E::COLLECTION), err.to_string());
                return None;
            }
        };

        let entities = match convert_all(&entities, SchemaMode::FullEntity) {
            Ok(entities) => entities,
            Err(err) => {
                diags.root_error(format!("Failed to convert {}", E::COLLECTION), err.to_string());
                return None;
            }
        };
        info!(collection = E::COLLECTION, count = entities.len(), "Read data source");

        Some(EntityDataSourceState {
            id: Value::Value(unique_id()),
            organization_slug: config.organization_slug,
            entities: Value::Value(entities),
            entity: PhantomData,
        })
    }
}
