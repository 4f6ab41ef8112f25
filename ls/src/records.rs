//! Record shapes exchanged with the backends
//!
//! Every shape is validated when it is deserialized: a catalog row missing a
//! required field fails the whole load rather than being defaulted.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A report to be judged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Stable report identity
    pub id: i64,
    pub title: String,
    /// Publication date (`YYYY-MM-DD`)
    pub creation_date: NaiveDate,
    pub description: String,
}

/// A user profile that reports are judged against
///
/// Everything besides `user_id` and `name` is kept as a free-form profile
/// field. Non-string scalars are stringified; arrays of scalars are joined
/// with the list separator so they render as lists. Fields keep the order
/// they had in the source row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UserRow", into = "UserRow")]
pub struct User {
    /// Stable user identity
    pub user_id: i64,
    pub name: String,
    pub profile: Vec<(String, String)>,
}

#[derive(Serialize, Deserialize)]
struct UserRow {
    user_id: i64,
    name: String,
    #[serde(flatten)]
    profile: Map<String, Value>,
}

impl User {
    /// Build a user from raw profile values, rejecting nested objects
    pub fn from_parts(user_id: i64, name: String, profile: Map<String, Value>) -> Result<Self, String> {
        let profile = profile
            .into_iter()
            .map(|(key, value)| profile_value(&key, value).map(|v| (key, v)))
            .collect::<Result<_, _>>()?;
        Ok(Self { user_id, name, profile })
    }

    /// Look up a profile field by key
    pub fn field(&self, key: &str) -> Option<&str> {
        self.profile.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Profile as a JSON object, in field order
    pub fn profile_object(&self) -> Map<String, Value> {
        self.profile
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect()
    }
}

fn profile_value(key: &str, value: Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Null => Ok(String::new()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Array(items) => {
            let parts = items
                .into_iter()
                .map(|item| match item {
                    Value::Array(_) | Value::Object(_) => Err(format!("profile field '{}' has a nested list", key)),
                    other => profile_value(key, other),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(parts.join(&format!("{} ", crate::PROFILE_LIST_SEPARATOR)))
        }
        Value::Object(_) => Err(format!("profile field '{}' is an object", key)),
    }
}

impl TryFrom<UserRow> for User {
    type Error = String;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        User::from_parts(row.user_id, row.name, row.profile)
    }
}

impl From<User> for UserRow {
    fn from(user: User) -> Self {
        Self {
            profile: user.profile_object(),
            user_id: user.user_id,
            name: user.name,
        }
    }
}

/// The persisted cursor row
///
/// Field names follow the stored columns: `report_id` and `user_id` hold the
/// traversal indexes, not record identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorRecord {
    pub report_id: i64,
    pub user_id: i64,
    pub show_tutorial: bool,
}

impl Default for CursorRecord {
    fn default() -> Self {
        Self {
            report_id: 0,
            user_id: 0,
            show_tutorial: true,
        }
    }
}

/// One user's accumulated judgments, as stored
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationEntry {
    #[serde(default)]
    pub relevant_reports: Vec<i64>,
}

/// The annotation blob, keyed by user id
pub type AnnotationData = BTreeMap<i64, AnnotationEntry>;

/// Accept `null` wherever an annotation blob is expected
pub(crate) fn null_as_empty<'de, D>(deserializer: D) -> Result<AnnotationData, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<AnnotationData>::deserialize(deserializer)?.unwrap_or_default())
}
