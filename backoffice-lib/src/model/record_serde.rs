//! Custom serialization for Record.
//!
//! ## Write Format (Serialization)
//!
//! Payloads for create/update carry the fields only:
//! - the identifier is never written, the URL carries it
//! - null fields are skipped
//! - decimals serialize as JSON numbers
//!
//! ## Read Format (Deserialization)
//!
//! Backend records are flat JSON objects. An integer `id` becomes the
//! record identifier; every other key becomes a field.

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de::Error as _;
use serde::de::MapAccess;
use serde::de::Visitor;
use serde::ser::SerializeMap;

use super::ID_FIELD;
use super::Record;
use super::RecordId;
use super::Value;

impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let present = self.fields.values().filter(|v| !v.is_null()).count();
        let mut map = serializer.serialize_map(Some(present))?;

        for (key, value) in &self.fields {
            if value.is_null() {
                continue;
            }
            map.serialize_entry(key, value)?;
        }

        map.end()
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(RecordVisitor)
    }
}

struct RecordVisitor;

impl<'de> Visitor<'de> for RecordVisitor {
    type Value = Record;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a JSON object representing a record")
    }

    fn visit_map<M>(self, mut map: M) -> Result<Record, M::Error>
    where
        M: MapAccess<'de>,
    {
        let mut id = None;
        let mut fields = HashMap::new();

        while let Some(key) = map.next_key::<String>()? {
            let value: serde_json::Value = map.next_value()?;

            if key == ID_FIELD {
                id = match value {
                    serde_json::Value::Null => None,
                    serde_json::Value::Number(n) => match n.as_i64() {
                        Some(n) => Some(RecordId(n)),
                        None => return Err(M::Error::custom(format!("invalid id: {}", n))),
                    },
                    serde_json::Value::String(s) => match s.parse::<RecordId>() {
                        Ok(id) => Some(id),
                        Err(_) => return Err(M::Error::custom(format!("invalid id: {}", s))),
                    },
                    other => return Err(M::Error::custom(format!("invalid id: {}", other))),
                };
            } else {
                fields.insert(key, Value::from_json(value));
            }
        }

        Ok(Record { id, fields })
    }
}
