use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    Date,
    Datetime,
    Json,
}

/// One entry of a collection schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(
        rename = "allowNull",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub allow_null: Option<bool>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    /// Element type for arrays.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<FieldDefinition>>,
}

impl FieldDefinition {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: None,
            allow_null: None,
            enum_values: None,
            items: None,
        }
    }

    pub fn string() -> Self {
        Self::new(FieldType::String)
    }

    pub fn number() -> Self {
        Self::new(FieldType::Number)
    }

    pub fn boolean() -> Self {
        Self::new(FieldType::Boolean)
    }

    pub fn array_of(items: FieldDefinition) -> Self {
        let mut def = Self::new(FieldType::Array);
        def.items = Some(Box::new(items));
        def
    }

    pub fn required(mut self) -> Self {
        self.required = Some(true);
        self
    }

    pub fn nullable(mut self) -> Self {
        self.allow_null = Some(true);
        self
    }

    pub fn one_of<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }
}

/// Field name to definition. Ordered so the serialized schema is stable.
pub type Schema = BTreeMap<String, FieldDefinition>;

/// Start a schema: `schema([("name", FieldDefinition::string().required())])`.
pub fn schema<I, K>(fields: I) -> Schema
where
    I: IntoIterator<Item = (K, FieldDefinition)>,
    K: Into<String>,
{
    fields.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

/// Parse a decoded schema object back into typed definitions, skipping
/// entries that don't match the known shape.
pub fn typed_schema(raw: &Map<String, Value>) -> Schema {
    raw.iter()
        .filter_map(|(name, def)| {
            serde_json::from_value::<FieldDefinition>(def.clone())
                .ok()
                .map(|d| (name.clone(), d))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimaryKeyType {
    String,
    Number,
    Uuid,
}

/// Which document field acts as the external identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKeyConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub key_type: Option<PrimaryKeyType>,
    /// Values are generated by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto: Option<bool>,
}

impl PrimaryKeyConfig {
    pub fn field(field: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            ..Self::default()
        }
    }

    pub fn key_type(mut self, key_type: PrimaryKeyType) -> Self {
        self.key_type = Some(key_type);
        self
    }

    pub fn auto(mut self, auto: bool) -> Self {
        self.auto = Some(auto);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.field.is_none() && self.key_type.is_none() && self.auto.is_none()
    }
}

/// Attached to list, query and sync results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_more: Option<bool>,
}

impl Pagination {
    pub fn has_more(&self) -> bool {
        self.has_more.unwrap_or(self.next_cursor.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_definition_omits_unset_keys() {
        let def = FieldDefinition::string().required();
        assert_eq!(
            serde_json::to_value(&def).unwrap(),
            json!({"type": "string", "required": true})
        );

        let def =
            FieldDefinition::array_of(FieldDefinition::string().one_of(["a", "b"])).nullable();
        assert_eq!(
            serde_json::to_value(&def).unwrap(),
            json!({
                "type": "array",
                "allowNull": true,
                "items": {"type": "string", "enum": ["a", "b"]}
            })
        );
    }

    #[test]
    fn test_typed_schema_skips_unknown_shapes() {
        let raw = json!({
            "name": {"type": "string", "required": true},
            "weird": {"kind": "???"}
        });
        let typed = typed_schema(raw.as_object().unwrap());
        assert_eq!(typed.len(), 1);
        assert_eq!(typed["name"].required, Some(true));
    }

    #[test]
    fn test_pagination_has_more_falls_back_to_cursor() {
        let p: Pagination = serde_json::from_value(json!({"next_cursor": "abc"})).unwrap();
        assert!(p.has_more());
        let p: Pagination = serde_json::from_value(json!({"count": 3})).unwrap();
        assert!(!p.has_more());
    }
}
