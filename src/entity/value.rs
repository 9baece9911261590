//! Materialized entity values

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::schema::{EntityType, SchemaError, SchemaResult};

/// Rust type that can be produced from a materialized entity.
///
/// ```ignore
/// #[derive(Deserialize)]
/// struct Person { name: String }
///
/// impl Model for Person {
///     fn entity_type() -> EntityType { PERSON }
/// }
/// ```
pub trait Model: DeserializeOwned {
    fn entity_type() -> EntityType;
}

/// Value of one entity field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Converted scalar (or scalar array) value
    Scalar(Value),
    /// Single nested entity
    Object(Box<Entity>),
    /// Sequence of nested entities; join-all columns may nest one level
    Array(Vec<FieldValue>),
    /// Name-keyed nested entities
    Map(BTreeMap<String, Entity>),
}

impl FieldValue {
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            FieldValue::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            FieldValue::Object(entity) => Some(entity),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Entity>> {
        match self {
            FieldValue::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Renders the value back to JSON
    pub fn to_value(&self) -> Value {
        match self {
            FieldValue::Scalar(value) => value.clone(),
            FieldValue::Object(entity) => entity.to_value(),
            FieldValue::Array(items) => Value::Array(items.iter().map(FieldValue::to_value).collect()),
            FieldValue::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, entity)| (key.clone(), entity.to_value()))
                    .collect(),
            ),
        }
    }
}

/// Typed entity built by the materializer.
///
/// Fields keep row order; unset fields are absent rather than null.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    model: EntityType,
    fields: Vec<(String, FieldValue)>,
}

impl Entity {
    pub(crate) fn new(model: EntityType) -> Self {
        Self {
            model,
            fields: Vec::new(),
        }
    }

    pub(crate) fn set(&mut self, name: &str, value: FieldValue) {
        match self.fields.iter_mut().find(|(field, _)| field == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    pub fn entity_type(&self) -> EntityType {
        self.model
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Scalar value of a field
    pub fn scalar(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(FieldValue::as_scalar)
    }

    /// Nested entity of an OBJECT field
    pub fn nested(&self, name: &str) -> Option<&Entity> {
        self.get(name).and_then(FieldValue::as_entity)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Names of the set fields, in row order
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Renders the entity back to a JSON object
    pub fn to_value(&self) -> Value {
        let mut object = Map::new();
        for (name, value) in &self.fields {
            object.insert(name.clone(), value.to_value());
        }
        Value::Object(object)
    }

    /// Decodes the entity into a Rust type
    pub fn into_model<T: DeserializeOwned>(&self) -> SchemaResult<T> {
        serde_json::from_value(self.to_value())
            .map_err(|e| SchemaError::entity_decode(self.model.name(), e))
    }
}

impl Serialize for Entity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    const ADDRESS: EntityType = EntityType::named("Address");
    const PERSON: EntityType = EntityType::named("Person");

    fn address(city: &str) -> Entity {
        let mut entity = Entity::new(ADDRESS);
        entity.set("city", FieldValue::Scalar(json!(city)));
        entity
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut entity = Entity::new(PERSON);
        entity.set("name", FieldValue::Scalar(json!("A")));
        entity.set("age", FieldValue::Scalar(json!(3)));
        entity.set("name", FieldValue::Scalar(json!("B")));

        assert_eq!(entity.field_names(), vec!["name", "age"]);
        assert_eq!(entity.scalar("name"), Some(&json!("B")));
        assert_eq!(entity.len(), 2);
    }

    #[test]
    fn test_to_value_recurses() {
        let mut entity = Entity::new(PERSON);
        entity.set("home", FieldValue::Object(Box::new(address("X"))));
        entity.set(
            "past",
            FieldValue::Array(vec![
                FieldValue::Object(Box::new(address("Y"))),
                FieldValue::Array(vec![FieldValue::Object(Box::new(address("Z")))]),
            ]),
        );
        let mut by_kind = BTreeMap::new();
        by_kind.insert("work".to_string(), address("W"));
        entity.set("by_kind", FieldValue::Map(by_kind));

        let expected = json!({
            "home": {"city": "X"},
            "past": [{"city": "Y"}, [{"city": "Z"}]],
            "by_kind": {"work": {"city": "W"}}
        });
        assert_eq!(entity.to_value(), expected);
        assert_eq!(serde_json::to_value(&entity).unwrap(), expected);
        assert_eq!(entity.nested("home").unwrap().scalar("city"), Some(&json!("X")));
    }

    #[test]
    fn test_into_model() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Address {
            city: String,
            zip: Option<String>,
        }

        let decoded: Address = address("X").into_model().unwrap();
        assert_eq!(
            decoded,
            Address {
                city: "X".into(),
                zip: None
            }
        );

        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Strict {
            street: String,
        }
        let err = address("X").into_model::<Strict>().unwrap_err();
        assert_eq!(err.code(), crate::schema::SchemaErrorCode::EntityDecode);
    }
}
