//! Strongly-typed client identifier

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name a workstation is registered under in the state store.
///
/// Free-form; agents default it to the machine hostname.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientName(String);

impl ClientName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ClientName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ClientName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_name_equality() {
        let a = ClientName::new("desk-01");
        let b = ClientName::new("desk-01");
        let c = ClientName::new("desk-02");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn client_name_serializes_as_plain_string() {
        let name = ClientName::new("desk-01");
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"desk-01\"");

        let parsed: ClientName = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, name);
    }
}
