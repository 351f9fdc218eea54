//! Explicit request validation.
//!
//! Handlers read their inputs through a [`Params`] reader which records every
//! problem instead of stopping at the first, then call [`Params::finish`] to
//! turn the collected problems into one `bad_params` error.

use crate::error::{AppError, FieldError};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;

pub struct Params<'a> {
    raw: &'a serde_json::Value,
    errors: Vec<FieldError>,
}

/// Tri-state for patch-style updates: absent keeps the stored value,
/// `null` clears it.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch<T> {
    Keep,
    Clear,
    Set(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Keep
    }
}

impl<T> Patch<T> {
    pub fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            Patch::Keep => current,
            Patch::Clear => None,
            Patch::Set(v) => Some(v),
        }
    }
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    // A full ISO timestamp is accepted too; only the calendar part is kept.
    let s = s.trim();
    let day = s.split_once('T').map_or(s, |(day, _)| day);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

impl<'a> Params<'a> {
    pub fn new(raw: &'a serde_json::Value) -> Self {
        Self {
            raw,
            errors: Vec::new(),
        }
    }

    fn fail(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    fn get(&self, key: &str) -> Option<&'a serde_json::Value> {
        self.raw.get(key).filter(|v| !v.is_null())
    }

    fn present(&self, key: &str) -> bool {
        self.raw.get(key).is_some()
    }

    pub fn required_str(&mut self, key: &str) -> String {
        match self.get(key).and_then(|v| v.as_str()) {
            Some(s) if !s.trim().is_empty() => s.trim().to_string(),
            Some(_) => {
                self.fail(key, "must not be empty");
                String::new()
            }
            None => {
                self.fail(key, format!("missing {}", key));
                String::new()
            }
        }
    }

    pub fn optional_str(&mut self, key: &str) -> Option<String> {
        let v = self.get(key)?;
        match v.as_str() {
            Some(s) => Some(s.to_string()),
            None => {
                self.fail(key, "must be a string");
                None
            }
        }
    }

    pub fn patch_str(&mut self, key: &str) -> Patch<String> {
        if !self.present(key) {
            return Patch::Keep;
        }
        match self.optional_str(key) {
            Some(s) => Patch::Set(s),
            None => Patch::Clear,
        }
    }

    /// Like [`patch_str`](Self::patch_str) but a present value must be non-empty.
    pub fn patch_name(&mut self, key: &str) -> Patch<String> {
        if !self.present(key) {
            return Patch::Keep;
        }
        Patch::Set(self.required_str(key))
    }

    pub fn required_date(&mut self, key: &str) -> NaiveDate {
        match self.optional_date(key) {
            Some(d) => d,
            None => {
                if self.get(key).is_none() {
                    self.fail(key, format!("missing {}", key));
                }
                NaiveDate::MIN
            }
        }
    }

    pub fn optional_date(&mut self, key: &str) -> Option<NaiveDate> {
        let v = self.get(key)?;
        match v.as_str().and_then(parse_date) {
            Some(d) => Some(d),
            None => {
                self.fail(key, "must be a YYYY-MM-DD date");
                None
            }
        }
    }

    pub fn patch_date(&mut self, key: &str) -> Patch<NaiveDate> {
        if !self.present(key) {
            return Patch::Keep;
        }
        match self.optional_date(key) {
            Some(d) => Patch::Set(d),
            None => Patch::Clear,
        }
    }

    pub fn required_bool(&mut self, key: &str) -> bool {
        match self.get(key).and_then(|v| v.as_bool()) {
            Some(b) => b,
            None => {
                self.fail(key, "must be a boolean");
                false
            }
        }
    }

    pub fn optional_bool(&mut self, key: &str) -> Option<bool> {
        let v = self.get(key)?;
        match v.as_bool() {
            Some(b) => Some(b),
            None => {
                self.fail(key, "must be a boolean");
                None
            }
        }
    }

    pub fn optional_i64(&mut self, key: &str) -> Option<i64> {
        let v = self.get(key)?;
        match v.as_i64() {
            Some(n) => Some(n),
            None => {
                self.fail(key, "must be an integer");
                None
            }
        }
    }

    pub fn patch_i64(&mut self, key: &str) -> Patch<i64> {
        if !self.present(key) {
            return Patch::Keep;
        }
        match self.optional_i64(key) {
            Some(n) => Patch::Set(n),
            None => Patch::Clear,
        }
    }

    pub fn email(&mut self, key: &str) -> String {
        let s = self.required_str(key);
        if !s.is_empty() && !looks_like_email(&s) {
            self.fail(key, "must be an email address");
        }
        s.to_ascii_lowercase()
    }

    pub fn min_len(&mut self, key: &str, value: &str, min: usize) {
        if value.chars().count() < min {
            self.fail(key, format!("must be at least {} characters long", min));
        }
    }

    /// Deserialize a nested object, recording a field error on mismatch.
    pub fn required_object<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        let Some(v) = self.get(key) else {
            self.fail(key, format!("missing {}", key));
            return None;
        };
        self.decode(key, v)
    }

    pub fn optional_object<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        let v = self.get(key)?;
        self.decode(key, v)
    }

    fn decode<T: DeserializeOwned>(&mut self, key: &str, v: &serde_json::Value) -> Option<T> {
        match serde_json::from_value::<T>(v.clone()) {
            Ok(t) => Some(t),
            Err(e) => {
                self.fail(key, e.to_string());
                None
            }
        }
    }

    pub fn finish(self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.errors))
        }
    }
}

fn looks_like_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}
