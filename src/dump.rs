use crate::tag::{CompoundTag, Tag};
use serde_json::{Map, Number, Value};

impl Tag {
    /// Renders tag as JSON for display.
    ///
    /// Type information is lost: every number becomes a JSON number and
    /// lists and arrays both become JSON arrays. Compound entries keep their
    /// order. Non-finite floats and `End` render as `null`.
    pub fn dump(&self) -> Value {
        match self {
            Tag::End => Value::Null,
            Tag::Byte(value) => Value::from(*value),
            Tag::Short(value) => Value::from(*value),
            Tag::Int(value) => Value::from(*value),
            Tag::Long(value) => Value::from(*value),
            Tag::Float(value) => dump_float(f64::from(*value)),
            Tag::Double(value) => dump_float(*value),
            Tag::ByteArray(values) => values.iter().copied().map(Value::from).collect(),
            Tag::String(value) => Value::String(value.clone()),
            Tag::List(list_tag) => list_tag.iter().map(Tag::dump).collect(),
            Tag::Compound(compound_tag) => compound_tag.dump(),
            Tag::IntArray(values) => values.iter().copied().map(Value::from).collect(),
            Tag::LongArray(values) => values.iter().copied().map(Value::from).collect(),
        }
    }
}

impl CompoundTag {
    pub fn dump(&self) -> Value {
        let map: Map<String, Value> = self
            .iter()
            .map(|(name, tag)| (name.clone(), tag.dump()))
            .collect();

        Value::Object(map)
    }
}

fn dump_float(value: f64) -> Value {
    Number::from_f64(value).map_or(Value::Null, Value::Number)
}
