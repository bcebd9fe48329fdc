// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Authentication tokens (section 6's `auth` configuration option).
//!
//! The driver lineage this crate is patterned on also ships an `AuthManager`
//! trait with rotating/bearer-token caching backed by `parking_lot::Mutex`
//! and token-expiry bookkeeping. That machinery exists to support auth
//! schemes whose credentials change mid-session (SSO bearer tokens); nothing
//! in this crate's scope refreshes credentials once a [`Connection`] is
//! past HELLO/LOGON, so only the static token itself is carried over.
//!
//! [`Connection`]: crate::bolt::Connection

use std::collections::HashMap;

use crate::value::Value;

/// Authentication information sent during HELLO/LOGON (section 4.4).
#[derive(Debug, Clone, PartialEq)]
pub struct AuthToken {
    pub(crate) data: HashMap<String, Value>,
}

impl AuthToken {
    /// No authentication: servers with authentication disabled.
    pub fn new_none_auth() -> Self {
        let mut data = HashMap::new();
        data.insert("scheme".to_string(), Value::String("none".into()));
        Self { data }
    }

    /// Username/password authentication.
    pub fn new_basic_auth(username: impl Into<String>, password: impl Into<String>) -> Self {
        let mut data = HashMap::new();
        data.insert("scheme".to_string(), Value::String("basic".into()));
        data.insert("principal".to_string(), Value::String(username.into()));
        data.insert("credentials".to_string(), Value::String(password.into()));
        Self { data }
    }

    /// Authentication against a server-side custom authentication plugin.
    /// Any of `principal`, `credentials`, `realm` may be omitted; `scheme`
    /// defaults to `"custom"` if not given.
    pub fn new_custom_auth(
        principal: Option<String>,
        credentials: Option<String>,
        realm: Option<String>,
        scheme: Option<String>,
        parameters: Option<HashMap<String, Value>>,
    ) -> Self {
        let mut data = HashMap::new();
        data.insert(
            "scheme".to_string(),
            Value::String(scheme.unwrap_or_else(|| "custom".to_string())),
        );
        if let Some(principal) = principal {
            data.insert("principal".to_string(), Value::String(principal));
        }
        if let Some(credentials) = credentials {
            data.insert("credentials".to_string(), Value::String(credentials));
        }
        if let Some(realm) = realm {
            data.insert("realm".to_string(), Value::String(realm));
        }
        if let Some(parameters) = parameters {
            data.insert("parameters".to_string(), Value::Map(parameters));
        }
        Self { data }
    }

    pub(crate) fn data(&self) -> &HashMap<String, Value> {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_auth_has_scheme_only() {
        let token = AuthToken::new_none_auth();
        assert_eq!(token.data.len(), 1);
        assert_eq!(token.data.get("scheme"), Some(&Value::String("none".into())));
    }

    #[test]
    fn basic_auth_carries_principal_and_credentials() {
        let token = AuthToken::new_basic_auth("neo4j", "hunter2");
        assert_eq!(token.data.get("scheme"), Some(&Value::String("basic".into())));
        assert_eq!(token.data.get("principal"), Some(&Value::String("neo4j".into())));
        assert_eq!(
            token.data.get("credentials"),
            Some(&Value::String("hunter2".into()))
        );
    }

    #[test]
    fn custom_auth_defaults_scheme() {
        let token = AuthToken::new_custom_auth(Some("bob".into()), None, None, None, None);
        assert_eq!(token.data.get("scheme"), Some(&Value::String("custom".into())));
        assert_eq!(token.data.get("principal"), Some(&Value::String("bob".into())));
        assert!(!token.data.contains_key("credentials"));
    }

    #[test]
    fn custom_auth_carries_parameters() {
        let mut params = HashMap::new();
        params.insert("tenant".to_string(), Value::String("acme".into()));
        let token = AuthToken::new_custom_auth(None, None, None, Some("custom-plugin".into()), Some(params));
        assert_eq!(
            token.data.get("scheme"),
            Some(&Value::String("custom-plugin".into()))
        );
        assert!(matches!(token.data.get("parameters"), Some(Value::Map(_))));
    }
}
