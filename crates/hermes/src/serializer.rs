//! Pluggable body and query-string serializers.
//!
//! A [`SerializerRegistry`] maps content types to body serializers and holds
//! an optional query-string serializer override. Every request is attached to
//! a registry at dispatch; by default that is the process-wide instance
//! returned by [`SerializerRegistry::shared`]. Tests that replace serializers
//! can attach their own registry instead of mutating the shared one.
//!
//! # Example
//!
//! ```
//! use hermes::{encoders, SerializerRegistry, FORM_URLENCODED};
//! use serde_json::json;
//!
//! let registry = SerializerRegistry::new();
//! registry.add_serializer(FORM_URLENCODED, encoders::bracket_form);
//!
//! let serializer = registry.serializer_for(FORM_URLENCODED).unwrap();
//! assert_eq!(serializer(&json!({"ids": [1]})).unwrap(), "ids%5B%5D=1");
//!
//! registry.remove_serializer(FORM_URLENCODED);
//! let serializer = registry.serializer_for(FORM_URLENCODED).unwrap();
//! assert_eq!(serializer(&json!({"ids": [1]})).unwrap(), "ids=1");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use serde_json::Value;

use crate::body::{APPLICATION_JSON, FORM_URLENCODED, MULTIPART_FORM_DATA};
use crate::encoders;
use crate::error::BoxError;
use crate::query::QueryParams;

/// Renders a structured value into the wire string for one content type.
///
/// For `multipart/form-data` the serializer renders each text field value;
/// part framing is always done by the multipart encoder.
pub type BodySerializer = Arc<dyn Fn(&Value) -> Result<String, BoxError> + Send + Sync>;

/// Renders query parameters into a query string (without the leading `?`).
pub type QsSerializer = Arc<dyn Fn(&QueryParams) -> Result<String, BoxError> + Send + Sync>;

/// Content-type keyed serializer table plus the query-string override slot.
///
/// Registration is last-write-wins. Removing a serializer restores the
/// built-in default for `application/json`,
/// `application/x-www-form-urlencoded` and `multipart/form-data`; other
/// content types are dropped entirely.
pub struct SerializerRegistry {
    body: RwLock<HashMap<String, BodySerializer>>,
    qs: RwLock<Option<QsSerializer>>,
}

impl SerializerRegistry {
    /// Creates a registry with the built-in defaults installed.
    pub fn new() -> Self {
        let body = [APPLICATION_JSON, FORM_URLENCODED, MULTIPART_FORM_DATA]
            .into_iter()
            .filter_map(|ct| builtin(ct).map(|serializer| (ct.to_string(), serializer)))
            .collect();

        Self {
            body: RwLock::new(body),
            qs: RwLock::new(None),
        }
    }

    /// The process-wide registry used by requests that were not given one.
    pub fn shared() -> Arc<Self> {
        static SHARED: OnceLock<Arc<SerializerRegistry>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(|| Arc::new(Self::new())))
    }

    /// Registers `serializer` for `content_type`, replacing any previous one.
    ///
    /// The content type is matched on its essence, so parameters such as
    /// `; charset=utf-8` are ignored and the comparison is case-insensitive.
    pub fn add_serializer<F>(&self, content_type: &str, serializer: F)
    where
        F: Fn(&Value) -> Result<String, BoxError> + Send + Sync + 'static,
    {
        let key = essence(content_type);
        let replaced = self
            .body
            .write()
            .insert(key.clone(), Arc::new(serializer))
            .is_some();
        tracing::debug!(content_type = %key, replaced, "registered body serializer");
    }

    /// Removes the serializer for `content_type`, restoring the built-in
    /// default if there is one.
    #[doc(alias = "remove_parser")]
    pub fn remove_serializer(&self, content_type: &str) {
        let key = essence(content_type);
        let mut body = self.body.write();
        match builtin(&key) {
            Some(default) => {
                body.insert(key.clone(), default);
                tracing::debug!(content_type = %key, "restored default body serializer");
            }
            None => {
                body.remove(&key);
                tracing::debug!(content_type = %key, "removed body serializer");
            }
        }
    }

    /// Returns the serializer currently registered for `content_type`.
    pub fn serializer_for(&self, content_type: &str) -> Option<BodySerializer> {
        self.body.read().get(&essence(content_type)).cloned()
    }

    /// Overrides query-string encoding for every request using this registry.
    pub fn set_qs_serializer<F>(&self, serializer: F)
    where
        F: Fn(&QueryParams) -> Result<String, BoxError> + Send + Sync + 'static,
    {
        *self.qs.write() = Some(Arc::new(serializer));
        tracing::debug!("registered query string serializer");
    }

    /// Drops the query-string override, restoring repeated-key encoding.
    pub fn remove_qs_serializer(&self) {
        *self.qs.write() = None;
        tracing::debug!("restored default query string serializer");
    }

    /// Returns the active query-string serializer.
    pub fn qs_serializer(&self) -> QsSerializer {
        self.qs.read().clone().unwrap_or_else(default_qs_serializer)
    }

    /// Returns true when a query-string override is installed.
    pub fn has_qs_override(&self) -> bool {
        self.qs.read().is_some()
    }

    /// Restores every default and drops all custom registrations.
    pub fn reset(&self) {
        let defaults = Self::new();
        *self.body.write() = defaults.body.into_inner();
        *self.qs.write() = None;
    }
}

impl Default for SerializerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SerializerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut content_types: Vec<String> = self.body.read().keys().cloned().collect();
        content_types.sort();
        f.debug_struct("SerializerRegistry")
            .field("content_types", &content_types)
            .field("qs_override", &self.has_qs_override())
            .finish()
    }
}

fn builtin(content_type: &str) -> Option<BodySerializer> {
    let serializer: BodySerializer = match content_type {
        APPLICATION_JSON => Arc::new(encoders::json),
        FORM_URLENCODED => Arc::new(encoders::flat_form),
        MULTIPART_FORM_DATA => Arc::new(encoders::multipart_field),
        _ => return None,
    };
    Some(serializer)
}

fn default_qs_serializer() -> QsSerializer {
    Arc::new(encoders::repeated_query)
}

fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
