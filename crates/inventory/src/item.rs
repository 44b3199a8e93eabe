use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use revive_core::Entity;

/// Conventional attribute holding an item's name. Every record carries it.
pub const NAME_ATTRIBUTE: &str = "name";

/// A single item: attribute name → value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemRecord {
    fields: BTreeMap<String, String>,
}

impl ItemRecord {
    pub fn from_fields(fields: BTreeMap<String, String>) -> Self {
        Self { fields }
    }

    pub fn name(&self) -> &str {
        self.get(NAME_ATTRIBUTE).unwrap_or_default()
    }

    pub fn get(&self, attribute: &str) -> Option<&str> {
        self.fields.get(attribute).map(String::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    /// Case-insensitive substring match against every field value.
    ///
    /// `needle` must already be lowercased.
    pub(crate) fn matches_lowercase(&self, needle: &str) -> bool {
        self.fields
            .values()
            .any(|value| value.to_lowercase().contains(needle))
    }
}

/// An admin-defined item category: schema plus the items created under it.
///
/// # Invariants
/// - Each record holds the name attribute plus every attribute the schema
///   declared when the record was created.
/// - Redefining the schema never rewrites existing records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemType {
    /// Key in the registry document, restored on load.
    #[serde(skip)]
    pub(crate) name: String,
    pub(crate) attributes: Vec<String>,
    #[serde(default)]
    pub(crate) items: Vec<ItemRecord>,
}

impl ItemType {
    pub(crate) fn new(name: String, attributes: Vec<String>) -> Self {
        Self {
            name,
            attributes,
            items: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn items(&self) -> &[ItemRecord] {
        &self.items
    }

    /// Attributes a new record of this type receives, in prompt order.
    ///
    /// The name attribute always comes first, even when the schema omits it.
    pub fn record_attributes(&self) -> impl Iterator<Item = &str> {
        std::iter::once(NAME_ATTRIBUTE).chain(
            self.attributes
                .iter()
                .map(String::as_str)
                .filter(|a| *a != NAME_ATTRIBUTE),
        )
    }

    /// `(attribute, value)` pairs of `record` for display.
    ///
    /// Current schema order first, then any fields left over from an older
    /// schema.
    pub fn display_fields<'a>(&'a self, record: &'a ItemRecord) -> Vec<(&'a str, &'a str)> {
        let mut out: Vec<(&str, &str)> = self
            .record_attributes()
            .filter_map(|attr| record.get(attr).map(|value| (attr, value)))
            .collect();

        for (attr, value) in record.fields() {
            if !out.iter().any(|(seen, _)| *seen == attr.as_str()) {
                out.push((attr.as_str(), value.as_str()));
            }
        }
        out
    }
}

impl Entity for ItemType {
    type Id = String;

    fn id(&self) -> &Self::Id {
        &self.name
    }
}

/// Trim attribute names, drop blanks and collapse duplicates (first wins).
pub fn normalize_attributes<I, S>(attributes: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for attr in attributes {
        let attr = attr.as_ref().trim();
        if attr.is_empty() || out.iter().any(|a| a == attr) {
            continue;
        }
        out.push(attr.to_string());
    }
    out
}
