//! GraphQL queries against the Buildkite GraphQL endpoint
//!
//! GraphQL answers are wrapped in `{"data": {<root>: <payload>}}`.
//! Instead of decoding the whole tree and re-decoding the interesting part,
//! the envelope is walked with serde visitors and the payload is deserialized
//! straight into the requested type.

use std::fmt::{self, Display};
use std::marker::PhantomData;

use serde::de::{DeserializeOwned, DeserializeSeed, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::json;
use tracing::debug;

use crate::error::{self, Error};

use super::Client;

/// String argument rendered as a quoted and escaped GraphQL string literal
///
/// ```
/// # use terraform_provider_buildkite::client::GraphQlString;
/// assert_eq!(
///     format!("organization(slug: {})", GraphQlString("acme")),
///     r#"organization(slug: "acme")"#,
/// );
/// ```
#[derive(Debug, Clone, Copy)]
pub struct GraphQlString<'a>(pub &'a str);

impl Display for GraphQlString<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(
            serde_json::to_string(self.0)
                .or(Err(fmt::Error))?
                .as_str(),
        )
    }
}

impl Client {
    /// Run a GraphQL query and decode the content of its root field
    ///
    /// # Arguments
    ///
    /// * `query` - Body of the query, without the enclosing braces
    ///
    /// # Remarks
    ///
    /// The name of the root field is ignored: callers only get its content.
    /// The request is attempted once, without retry.
    pub async fn query<T: DeserializeOwned>(&self, query: &str) -> error::Result<T> {
        let body = json!({ "query": format!("{{ {query} }}") });
        debug!(endpoint = %self.endpoints.graphql, query, "Sending GraphQL query");

        let response = self
            .http
            .post(&self.endpoints.graphql)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(Error::Transport)?;
        let bytes = response.bytes().await.map_err(Error::Io)?;

        decode_envelope(&bytes)
    }
}

/// Decode the payload of a `{"data": {<root>: <payload>}}` response
pub(crate) fn decode_envelope<T: DeserializeOwned>(body: &[u8]) -> error::Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(body);
    let walk = Envelope::<T>(PhantomData)
        .deserialize(&mut deserializer)
        .and_then(|walk| deserializer.end().map(|()| walk))
        .map_err(|err| {
            if err.is_eof() {
                Error::Protocol(format!(
                    "GraphQL expected more tokens, but received 'EOF' instead: {err}"
                ))
            } else if err.is_syntax() {
                Error::Protocol(format!("GraphQL response is malformed: {err}"))
            } else {
                Error::Decode(err)
            }
        })?;

    walk.map_err(|mismatch| {
        Error::Protocol(format!(
            "GraphQL expected token '{}', but received '{}' instead",
            mismatch.expected, mismatch.received
        ))
    })
}

/// Envelope token found where another one was required
#[derive(Debug)]
struct Mismatch {
    expected: &'static str,
    received: String,
}

/// Payload, or the envelope token that prevented reaching it
type Walk<T> = Result<T, Mismatch>;

fn mismatch<T>(expected: &'static str, received: impl Into<String>) -> Walk<T> {
    Err(Mismatch {
        expected,
        received: received.into(),
    })
}

/// Consume the rest of a map whose current value has not been read
fn skip_rest<'de, A: MapAccess<'de>>(mut map: A) -> Result<(), A::Error> {
    map.next_value::<IgnoredAny>()?;
    skip_entries(map)
}

fn skip_entries<'de, A: MapAccess<'de>>(mut map: A) -> Result<(), A::Error> {
    while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
    Ok(())
}

fn skip_seq<'de, A: SeqAccess<'de>>(mut seq: A) -> Result<(), A::Error> {
    while seq.next_element::<IgnoredAny>()?.is_some() {}
    Ok(())
}

/// Top level object, holding the `data` field
struct Envelope<T>(PhantomData<fn() -> T>);

impl<'de, T: Deserialize<'de>> DeserializeSeed<'de> for Envelope<T> {
    type Value = Walk<T>;

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de, T: Deserialize<'de>> Visitor<'de> for Envelope<T> {
    type Value = Walk<T>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a GraphQL response")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        match map.next_key::<String>()? {
            Some(key) if key == "data" => (),
            Some(key) => {
                skip_rest(map)?;
                return Ok(mismatch("data", key));
            }
            None => return Ok(mismatch("data", "}")),
        }

        let payload = map.next_value_seed(RootField::<T>(PhantomData))?;
        skip_entries(map)?;
        Ok(payload)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> Result<Self::Value, A::Error> {
        skip_seq(seq)?;
        Ok(mismatch("{", "["))
    }

    fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(mismatch("{", "null"))
    }
}

/// Content of `data`: a single root field whose name is ignored
struct RootField<T>(PhantomData<fn() -> T>);

impl<'de, T: Deserialize<'de>> DeserializeSeed<'de> for RootField<T> {
    type Value = Walk<T>;

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de, T: Deserialize<'de>> Visitor<'de> for RootField<T> {
    type Value = Walk<T>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("the data of a GraphQL response")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        // Only the content of the root field matters, not its name
        if map.next_key::<IgnoredAny>()?.is_none() {
            return Ok(mismatch("root field", "}"));
        }
        let payload = map.next_value::<T>()?;
        skip_entries(map)?;
        Ok(Ok(payload))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> Result<Self::Value, A::Error> {
        skip_seq(seq)?;
        Ok(mismatch("{", "["))
    }

    fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(mismatch("{", "null"))
    }
}
