use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One segment of a flatten path into the accumulated data. Parsed once at
/// deserialization instead of re-interpreting raw strings on every walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlattenPathSegment {
    /// Descend into an object field.
    Field(String),
    /// Map over the elements of an array, written `"@"` on the wire.
    List,
}

impl FlattenPathSegment {
    pub fn as_field(&self) -> Option<&str> {
        match self {
            FlattenPathSegment::Field(name) => Some(name),
            FlattenPathSegment::List => None,
        }
    }
}

impl fmt::Display for FlattenPathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlattenPathSegment::Field(name) => f.write_str(name),
            FlattenPathSegment::List => f.write_str("@"),
        }
    }
}

impl Serialize for FlattenPathSegment {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            FlattenPathSegment::Field(name) => serializer.serialize_str(name),
            FlattenPathSegment::List => serializer.serialize_str("@"),
        }
    }
}

impl<'de> Deserialize<'de> for FlattenPathSegment {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SegmentVisitor;

        impl<'de> Visitor<'de> for SegmentVisitor {
            type Value = FlattenPathSegment;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a path segment string or a {\"Field\": name} wrapper")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                if value == "@" {
                    Ok(FlattenPathSegment::List)
                } else {
                    Ok(FlattenPathSegment::Field(value.to_owned()))
                }
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut segment = None;
                while let Some(key) = map.next_key::<String>()? {
                    match key.as_str() {
                        "Field" => {
                            segment = Some(FlattenPathSegment::Field(map.next_value::<String>()?));
                        }
                        "List" => {
                            let _ = map.next_value::<de::IgnoredAny>()?;
                            segment = Some(FlattenPathSegment::List);
                        }
                        _ => {
                            let _ = map.next_value::<de::IgnoredAny>()?;
                        }
                    }
                }
                segment.ok_or_else(|| de::Error::custom("unrecognized flatten path segment"))
            }
        }

        deserializer.deserialize_any(SegmentVisitor)
    }
}

/// One segment of a rewrite path. The wire form embeds type conditions as
/// `"... on Type"` strings; those are parsed into a typed variant here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewritePathSegment {
    Field(String),
    TypeCondition(String),
}

const TYPE_CONDITION_PREFIX: &str = "... on ";

impl fmt::Display for RewritePathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RewritePathSegment::Field(name) => f.write_str(name),
            RewritePathSegment::TypeCondition(type_name) => {
                write!(f, "{}{}", TYPE_CONDITION_PREFIX, type_name)
            }
        }
    }
}

impl Serialize for RewritePathSegment {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RewritePathSegment {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        match raw.strip_prefix(TYPE_CONDITION_PREFIX) {
            Some(type_name) => Ok(RewritePathSegment::TypeCondition(type_name.to_owned())),
            None => Ok(RewritePathSegment::Field(raw)),
        }
    }
}
