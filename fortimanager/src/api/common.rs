//! Common wire-shape adapters for the FortiManager API
//!
//! The device database mixes representations freely: enable/disable flags
//! arrive as strings or 0/1 integers, object references as a bare string or
//! a list of strings, and subnets as "a.b.c.d/m" or an [address, mask] pair.
//! These adapters normalize all of that at the serde boundary.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnableDisable {
    Enable,
    Disable,
}

impl EnableDisable {
    pub fn as_bool(self) -> bool {
        self == EnableDisable::Enable
    }
}

impl From<bool> for EnableDisable {
    fn from(value: bool) -> Self {
        if value {
            EnableDisable::Enable
        } else {
            EnableDisable::Disable
        }
    }
}

impl From<EnableDisable> for bool {
    fn from(value: EnableDisable) -> Self {
        value.as_bool()
    }
}

impl Serialize for EnableDisable {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            EnableDisable::Enable => serializer.serialize_str("enable"),
            EnableDisable::Disable => serializer.serialize_str("disable"),
        }
    }
}

impl<'de> Deserialize<'de> for EnableDisable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum StringOrInt {
            String(String),
            Int(u8),
        }

        match StringOrInt::deserialize(deserializer)? {
            StringOrInt::String(s) => match s.as_str() {
                "enable" => Ok(EnableDisable::Enable),
                "disable" => Ok(EnableDisable::Disable),
                other => Err(serde::de::Error::custom(format!(
                    "expected enable/disable, got '{}'",
                    other
                ))),
            },
            StringOrInt::Int(0) => Ok(EnableDisable::Disable),
            StringOrInt::Int(1) => Ok(EnableDisable::Enable),
            StringOrInt::Int(_) => Err(serde::de::Error::custom("expected 0 or 1")),
        }
    }
}

/// Object-reference members: "all" on the wire may be a bare string or a
/// one-element list. Always a list in memory.
pub mod member_list {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<Vec<String>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(members) => serializer.collect_seq(members),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum StringOrVec {
            String(String),
            Vec(Vec<String>),
        }

        Ok(Option::<StringOrVec>::deserialize(deserializer)?.map(|v| match v {
            StringOrVec::String(s) => vec![s],
            StringOrVec::Vec(v) => v,
        }))
    }
}

/// Subnets: "192.168.1.0/24" in configuration, often ["192.168.1.0",
/// "255.255.255.0"] in responses. Always the address/mask pair joined with
/// a space in memory, matching what `set` accepts.
pub mod subnet {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(s) => serializer.serialize_some(s),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum StringOrPair {
            String(String),
            Pair(Vec<String>),
        }

        Ok(Option::<StringOrPair>::deserialize(deserializer)?.map(|v| match v {
            StringOrPair::String(s) => s,
            StringOrPair::Pair(parts) => parts.join(" "),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct Flags {
        status: EnableDisable,
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Members {
        #[serde(with = "member_list")]
        srcaddr: Option<Vec<String>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Route {
        #[serde(with = "subnet")]
        dst: Option<String>,
    }

    #[test]
    fn enable_disable_serializes_as_string() {
        let json = serde_json::to_string(&Flags {
            status: EnableDisable::Enable,
        })
        .unwrap();
        assert_eq!(json, r#"{"status":"enable"}"#);
    }

    #[test]
    fn enable_disable_accepts_strings_and_integers() {
        let from_str: Flags = serde_json::from_str(r#"{"status":"disable"}"#).unwrap();
        assert_eq!(from_str.status, EnableDisable::Disable);

        let from_int: Flags = serde_json::from_str(r#"{"status":1}"#).unwrap();
        assert_eq!(from_int.status, EnableDisable::Enable);

        assert!(serde_json::from_str::<Flags>(r#"{"status":"maybe"}"#).is_err());
    }

    #[test]
    fn member_list_accepts_bare_string() {
        let members: Members = serde_json::from_str(r#"{"srcaddr":"all"}"#).unwrap();
        assert_eq!(members.srcaddr, Some(vec!["all".to_string()]));
    }

    #[test]
    fn member_list_accepts_list() {
        let members: Members =
            serde_json::from_str(r#"{"srcaddr":["net-a","net-b"]}"#).unwrap();
        assert_eq!(
            members.srcaddr,
            Some(vec!["net-a".to_string(), "net-b".to_string()])
        );
    }

    #[test]
    fn subnet_joins_address_mask_pair() {
        let route: Route =
            serde_json::from_str(r#"{"dst":["10.0.0.0","255.0.0.0"]}"#).unwrap();
        assert_eq!(route.dst.as_deref(), Some("10.0.0.0 255.0.0.0"));

        let route: Route = serde_json::from_str(r#"{"dst":"10.0.0.0/8"}"#).unwrap();
        assert_eq!(route.dst.as_deref(), Some("10.0.0.0/8"));
    }
}
