//! Raw and validated export requests

use crate::domain::definition::ParamValue;
use crate::domain::ids::ExportKey;
use serde::Serialize;
use std::collections::BTreeMap;

/// Multi-valued, string-keyed request parameters as received from a caller
///
/// Typically derived from an HTTP query string. Values keep their arrival
/// order; the validator only looks at the first value of each name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawParams(BTreeMap<String, Vec<String>>);

impl RawParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an `application/x-www-form-urlencoded` query string
    ///
    /// # Examples
    ///
    /// ```
    /// use csv_export::domain::RawParams;
    ///
    /// let params = RawParams::from_query("status=READY&office=0P322F&office=1A2B3C");
    /// assert_eq!(params.first("office"), Some("0P322F"));
    /// assert_eq!(params.get_all("office").len(), 2);
    /// ```
    pub fn from_query(query: &str) -> Self {
        url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
            .into_owned()
            .collect()
    }

    /// Append a value for `name`
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.entry(name.into()).or_default().push(value.into());
    }

    /// First value supplied for `name`
    pub fn first(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// All values supplied for `name`
    pub fn get_all(&self, name: &str) -> &[String] {
        self.0.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.get(name).is_some_and(|values| !values.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = RawParams::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

/// Typed, schema-checked parameter set bound to one export
///
/// Only recognized parameters survive validation. `max_rows` is always the
/// definition's ceiling; nothing in the raw input can raise it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedExportRequest {
    export_key: ExportKey,
    params: BTreeMap<String, ParamValue>,
    max_rows: u64,
}

impl ValidatedExportRequest {
    pub fn new(export_key: ExportKey, params: BTreeMap<String, ParamValue>, max_rows: u64) -> Self {
        Self {
            export_key,
            params,
            max_rows,
        }
    }

    pub fn export_key(&self) -> &ExportKey {
        &self.export_key
    }

    /// Typed value of a parameter, if it was supplied or defaulted
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name)
    }

    pub fn params(&self) -> &BTreeMap<String, ParamValue> {
        &self.params
    }

    pub fn max_rows(&self) -> u64 {
        self.max_rows
    }
}
