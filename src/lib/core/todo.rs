use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::ValidationError;

/// Id carried by a record the store has not assigned one to yet.
pub const UNASSIGNED_ID: i32 = 0;
pub const DONE_PERCENTAGE: i32 = 100;
pub const COMPLETION_RANGE: std::ops::RangeInclusive<i32> = 0..=DONE_PERCENTAGE;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "storage", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct ToDo {
    #[serde(default)]
    pub id: i32,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(with = "timestamp")]
    pub expiry_date: DateTime<Utc>,
    #[serde(default)]
    pub completion_percentage: i32,
}

/// Payload of a create request. Anything the caller sends for `id` or
/// `completionPercentage` is dropped during deserialization.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewToDo {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "timestamp::option::deserialize")]
    pub expiry_date: Option<DateTime<Utc>>,
}

impl NewToDo {
    /// Checks the title first, then the expiry.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if !is_present(self.title.as_deref()) {
            return Err(ValidationError::BlankTitle);
        }
        match self.expiry_date {
            Some(expiry) if expiry > now => Ok(()),
            _ => Err(ValidationError::ExpiryNotInFuture),
        }
    }

    /// Builds the record to insert, or the first rule it violates.
    pub fn into_record(self, now: DateTime<Utc>) -> Result<ToDo, ValidationError> {
        self.validate(now)?;
        let expiry_date = self.expiry_date.ok_or(ValidationError::ExpiryNotInFuture)?;
        Ok(ToDo {
            id: UNASSIGNED_ID,
            title: self.title,
            description: self.description,
            expiry_date,
            completion_percentage: 0,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToDoPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "timestamp::option::deserialize")]
    pub expiry_date: Option<DateTime<Utc>>,
}

impl ToDoPatch {
    /// Applies every field rule against `current` and reports whether any of
    /// them changed it.
    pub fn apply_to(self, current: &mut ToDo, now: DateTime<Utc>) -> bool {
        let title = self.title.filter(|t| is_present(Some(t.as_str()))).map(Some);
        let description = self.description.map(Some);
        let expiry_date = self.expiry_date.filter(|expiry| *expiry > now);

        let changes = [
            replace_if_differs(&mut current.title, title),
            replace_if_differs(&mut current.description, description),
            replace_if_differs(&mut current.expiry_date, expiry_date),
        ];
        changes.into_iter().any(|changed| changed)
    }
}

impl ToDo {
    /// Sets the completion when it differs and lies within [`COMPLETION_RANGE`].
    pub fn set_completion(&mut self, percentage: i32) -> bool {
        let candidate = Some(percentage).filter(|p| COMPLETION_RANGE.contains(p));
        replace_if_differs(&mut self.completion_percentage, candidate)
    }
}

fn replace_if_differs<T: PartialEq>(slot: &mut T, candidate: Option<T>) -> bool {
    match candidate {
        Some(value) if *slot != value => {
            *slot = value;
            true
        }
        _ => false,
    }
}

fn is_present(text: Option<&str>) -> bool {
    text.is_some_and(|t| !t.trim().is_empty())
}

/// Serde glue for UTC timestamps.
///
/// Accepts RFC 3339 with any offset, a naive date-time, or a bare date; the
/// latter two are read as UTC. Always writes RFC 3339 with a `Z` suffix.
pub mod timestamp {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        let naive = NAIVE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok());
        if let Some(naive) = naive {
            return Some(naive.and_utc());
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }

    pub fn format(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp `{raw}`")))
    }

    pub mod option {
        use super::*;

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => parse(&raw)
                    .map(Some)
                    .ok_or_else(|| D::Error::custom(format!("invalid timestamp `{raw}`"))),
                None => Ok(None),
            }
        }
    }
}
