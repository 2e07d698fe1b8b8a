//! Placeholder resources
//!
//! They accept an `address` and keep it in the state, without any call to Buildkite.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tf_provider::map;
use tf_provider::schema::{
    Attribute, AttributeConstraint, AttributeType, Block, Description, Schema,
};
use tf_provider::value::{ValueEmpty, ValueString};
use tf_provider::{AttributePath, Diagnostics, Resource};

use crate::utils::WithSchema;

#[derive(Debug, Default, Clone)]
pub struct PlaceholderResource {
    description: &'static str,
}

impl PlaceholderResource {
    pub fn new(description: &'static str) -> Self {
        Self { description }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AddressState<'a> {
    #[serde(borrow = "'a")]
    pub address: ValueString<'a>,
}

impl WithSchema for AddressState<'_> {
    fn schema() -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "address" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Address of the resource"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                },
                ..Default::default()
            },
        }
    }
}

#[async_trait]
impl Resource for PlaceholderResource {
    type State<'a> = AddressState<'a>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        let mut schema = AddressState::schema();
        schema.block.description = Description::plain(self.description);
        Some(schema)
    }

    async fn read<'a>(
        &self,
        _diags: &mut Diagnostics,
        state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        Some((state, private_state))
    }

    async fn plan_create<'a>(
        &self,
        _diags: &mut Diagnostics,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        Some((proposed_state, Default::default()))
    }

    async fn plan_update<'a>(
        &self,
        _diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>, Vec<AttributePath>)> {
        Some((proposed_state, prior_private_state, vec![]))
    }

    async fn plan_destroy<'a>(
        &self,
        _diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::PrivateState<'a>> {
        Some(prior_private_state)
    }

    async fn create<'a>(
        &self,
        diags: &mut Diagnostics,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        planned_private_state: Self::PrivateState<'a>,
        provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        Resource::read(
            self,
            diags,
            planned_state,
            planned_private_state,
            provider_meta_state,
        )
        .await
    }

    async fn update<'a>(
        &self,
        diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        planned_private_state: Self::PrivateState<'a>,
        provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        Resource::read(
            self,
            diags,
            planned_state,
            planned_private_state,
            provider_meta_state,
        )
        .await
    }

    async fn destroy<'a>(
        &self,
        _diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        _planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<()> {
        Some(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tf_provider::value::Value;

    fn state(address: &'static str) -> AddressState<'static> {
        AddressState {
            address: Value::from(address),
        }
    }

    #[test]
    fn test_schema() {
        let resource = PlaceholderResource::new("Buildkite team");
        let schema = Resource::schema(&resource, &mut Diagnostics::default()).unwrap();
        assert_eq!(schema.block.attributes.len(), 1);
        assert_eq!(
            schema.block.attributes["address"].constraint,
            AttributeConstraint::Required
        );
        assert_eq!(schema.block.description, Description::plain("Buildkite team"));
    }

    #[tokio::test]
    async fn test_lifecycle_keeps_address() {
        let resource = PlaceholderResource::new("Buildkite team");
        let mut diags = Diagnostics::default();

        let (planned, private) = resource
            .plan_create(&mut diags, state("team-a"), state("team-a"), Value::Null)
            .await
            .unwrap();
        assert_eq!(planned, state("team-a"));

        let (created, private) = resource
            .create(&mut diags, planned, state("team-a"), private, Value::Null)
            .await
            .unwrap();
        assert_eq!(created, state("team-a"));

        let (updated, private) = resource
            .update(
                &mut diags,
                created,
                state("team-b"),
                state("team-b"),
                private,
                Value::Null,
            )
            .await
            .unwrap();
        assert_eq!(updated, state("team-b"));

        let (read, private) = Resource::read(&resource, &mut diags, updated, private, Value::Null)
            .await
            .unwrap();
        assert_eq!(read, state("team-b"));

        let private = resource
            .plan_destroy(&mut diags, read.clone(), private, Value::Null)
            .await
            .unwrap();
        assert!(resource
            .destroy(&mut diags, read, private, Value::Null)
            .await
            .is_some());
        assert!(diags.errors.is_empty());
    }
}
