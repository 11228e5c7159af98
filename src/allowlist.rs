use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, ValidationError};
use crate::plan::{BlockState, PropertyValue};

/// Block id -> property -> permitted values (in string form).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Allowlist {
    blocks: BTreeMap<String, BTreeMap<String, BTreeSet<String>>>,
}

/// Either the flat `{ "ns:id": { "prop": [values] } }` layout or the older
/// `{ "allowed_blocks": { "ns:id": { "allowed_properties": {...} } } }` one.
#[derive(Deserialize)]
#[serde(untagged)]
enum AllowlistDocument {
    Wrapped(WrappedDocument),
    Flat(BTreeMap<String, BTreeMap<String, Vec<PropertyValue>>>),
}

const WRAPPED_KEY: &str = "allowed_blocks";

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct WrappedDocument {
    allowed_blocks: BTreeMap<String, WrappedRules>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct WrappedRules {
    #[serde(default)]
    allowed_properties: BTreeMap<String, Vec<PropertyValue>>,
}

fn to_value_sets(
    rules: BTreeMap<String, Vec<PropertyValue>>,
) -> BTreeMap<String, BTreeSet<String>> {
    rules
        .into_iter()
        .map(|(prop, values)| (prop, values.iter().map(ToString::to_string).collect()))
        .collect()
}

impl Allowlist {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path).map_err(|e| Error::Allowlist {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_json(&text).map_err(|message| Error::Allowlist {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, String> {
        let document: AllowlistDocument = serde_json::from_str(text).map_err(|e| {
            format!(
                "expected an object of block ids to property/value lists ({})",
                e
            )
        })?;
        let blocks = match document {
            AllowlistDocument::Wrapped(WrappedDocument { allowed_blocks }) => allowed_blocks
                .into_iter()
                .map(|(id, rules)| (id, to_value_sets(rules.allowed_properties)))
                .collect(),
            AllowlistDocument::Flat(blocks) if blocks.contains_key(WRAPPED_KEY) => {
                return Err(format!(
                    "'{}' cannot be mixed with top-level block ids",
                    WRAPPED_KEY
                ));
            }
            AllowlistDocument::Flat(blocks) => blocks
                .into_iter()
                .map(|(id, rules)| (id, to_value_sets(rules)))
                .collect(),
        };
        Ok(Allowlist { blocks })
    }

    /// Permits `block_id` with the given properties and values.
    pub fn allow<'a>(
        mut self,
        block_id: &str,
        properties: impl IntoIterator<Item = (&'a str, &'a [&'a str])>,
    ) -> Self {
        let rules = self.blocks.entry(block_id.to_owned()).or_default();
        for (prop, values) in properties {
            rules
                .entry(prop.to_owned())
                .or_default()
                .extend(values.iter().map(|v| (*v).to_owned()));
        }
        self
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn validate(
        &self,
        block_id: &str,
        properties: &BTreeMap<String, PropertyValue>,
    ) -> Result<(), ValidationError> {
        let rules = self
            .blocks
            .get(block_id)
            .ok_or_else(|| ValidationError::BlockNotAllowed {
                block_id: block_id.to_owned(),
            })?;

        for (prop, value) in properties {
            let allowed = rules
                .get(prop)
                .ok_or_else(|| ValidationError::PropertyNotAllowed {
                    block_id: block_id.to_owned(),
                    property: prop.clone(),
                })?;
            let value = value.to_string();
            if !allowed.contains(&value) {
                return Err(ValidationError::ValueNotAllowed {
                    block_id: block_id.to_owned(),
                    property: prop.clone(),
                    value,
                });
            }
        }
        Ok(())
    }

    pub fn validate_state(&self, state: &BlockState) -> Result<(), ValidationError> {
        self.validate(&state.block_id, &state.properties)
    }
}
