//! Type registry and item store operations.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use revive_core::{require_non_blank, DomainError, DomainResult, Entity};

use crate::item::{normalize_attributes, ItemRecord, ItemType, NAME_ATTRIBUTE};

/// Owner of every item type and the items created under it.
///
/// Serialized as a JSON object keyed by type name:
/// `{ "<type>": { "attributes": [...], "items": [{...}] } }`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeRegistry {
    types: BTreeMap<String, ItemType>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ItemType> {
        self.types.get(name)
    }

    /// Defined type names, sorted.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    fn require(&self, name: &str) -> DomainResult<&ItemType> {
        self.types
            .get(name)
            .ok_or_else(|| DomainError::unknown_type(name))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Schema (admin) operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Define a new item type with an empty item list.
    pub fn define_type<I, S>(&mut self, name: &str, attributes: I) -> DomainResult<&ItemType>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let name = name.trim();
        require_non_blank("type name", name)?;
        if self.types.contains_key(name) {
            return Err(DomainError::duplicate_type(name));
        }

        let item_type = ItemType::new(name.to_string(), normalize_attributes(attributes));
        tracing::debug!(
            item_type = name,
            attributes = ?item_type.attributes(),
            "item type defined"
        );

        let key = item_type.id().clone();
        Ok(&*self.types.entry(key).or_insert(item_type))
    }

    /// Replace a type's schema in place.
    ///
    /// Existing items keep the fields they were created with.
    pub fn redefine_attributes<I, S>(&mut self, name: &str, attributes: I) -> DomainResult<&ItemType>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let item_type = self
            .types
            .get_mut(name.trim())
            .ok_or_else(|| DomainError::unknown_type(name.trim()))?;

        item_type.attributes = normalize_attributes(attributes);
        tracing::debug!(
            item_type = item_type.name(),
            attributes = ?item_type.attributes(),
            "item type attributes redefined"
        );
        Ok(&*item_type)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Item (user) operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Append an item to `type_name`.
    ///
    /// The record holds the name attribute plus exactly the attributes the
    /// schema currently declares. Missing values are stored as empty strings;
    /// keys outside the schema are ignored. Nothing is mutated on failure.
    pub fn add_item(
        &mut self,
        type_name: &str,
        values: &BTreeMap<String, String>,
    ) -> DomainResult<&ItemRecord> {
        let item_type = self
            .types
            .get_mut(type_name)
            .ok_or_else(|| DomainError::unknown_type(type_name))?;

        let name = values.get(NAME_ATTRIBUTE).map(|v| v.trim()).unwrap_or_default();
        require_non_blank(NAME_ATTRIBUTE, name)?;

        let fields: BTreeMap<String, String> = item_type
            .record_attributes()
            .map(|attr| {
                let value = values.get(attr).map(|v| v.trim()).unwrap_or_default();
                (attr.to_string(), value.to_string())
            })
            .collect();

        let index = item_type.items.len();
        item_type.items.push(ItemRecord::from_fields(fields));
        tracing::debug!(item_type = type_name, item = name, "item added");

        Ok(&item_type.items[index])
    }

    /// Items of `type_name` with at least one field containing `keyword`,
    /// ignoring case. An empty keyword matches every item.
    pub fn search<'a>(&'a self, type_name: &str, keyword: &str) -> DomainResult<Search<'a>> {
        let item_type = self.require(type_name)?;
        Ok(Search {
            items: item_type.items.iter(),
            needle: keyword.to_lowercase(),
        })
    }

    /// Every item of `type_name`, in insertion order.
    pub fn items(&self, type_name: &str) -> DomainResult<&[ItemRecord]> {
        Ok(self.require(type_name)?.items())
    }
}

/// Lazy, order-preserving keyword match over one type's items.
///
/// Single pass: once exhausted it yields nothing further.
#[derive(Debug, Clone)]
pub struct Search<'a> {
    items: std::slice::Iter<'a, ItemRecord>,
    needle: String,
}

impl<'a> Iterator for Search<'a> {
    type Item = &'a ItemRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let needle = self.needle.as_str();
        self.items.by_ref().find(|item| item.matches_lowercase(needle))
    }
}

impl Serialize for TypeRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.types.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TypeRegistry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut types = BTreeMap::<String, ItemType>::deserialize(deserializer)?;
        for (name, item_type) in types.iter_mut() {
            item_type.name = name.clone();
        }
        Ok(Self { types })
    }
}
