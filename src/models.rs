use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Record whose JSON field names are known up front.
pub trait ApiRecord: DeserializeOwned {
    const FIELDS: &'static [&'static str];
}

/// Decodes `T` after matching object keys to `T::FIELDS` without regard to
/// ASCII case. An exact key wins over a case-folded one.
#[derive(Debug)]
pub struct CaseInsensitive<T>(pub T);

impl<'de, T: ApiRecord> Deserialize<'de> for CaseInsensitive<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut value = Value::deserialize(deserializer)?;
        if let Value::Object(map) = &mut value {
            fold_keys(map, T::FIELDS);
        }
        serde_json::from_value(value)
            .map(CaseInsensitive)
            .map_err(D::Error::custom)
    }
}

fn fold_keys(map: &mut Map<String, Value>, fields: &[&str]) {
    let stray: Vec<String> = map
        .keys()
        .filter(|key| !fields.contains(&key.as_str()))
        .cloned()
        .collect();

    for key in stray {
        if let Some(field) = fields.iter().find(|field| field.eq_ignore_ascii_case(&key)) {
            if let Some(value) = map.remove(&key) {
                map.entry(*field).or_insert(value);
            }
        }
    }
}

/// Entry of the "list all tests" response. Only the identifier is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TestSummary {
    #[serde(rename = "TestID", default, deserialize_with = "nullable")]
    pub test_id: i64,
}

/// Full record for one monitored test.
///
/// Every field falls back to its zero value when it is absent or `null` in the
/// response body.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TestDetail {
    #[serde(rename = "TestID", deserialize_with = "nullable")]
    pub test_id: i64,
    #[serde(rename = "WebsiteName", deserialize_with = "nullable")]
    pub website_name: String,
    #[serde(rename = "URI", deserialize_with = "nullable")]
    pub uri: String,
    #[serde(rename = "ContactGroup", deserialize_with = "nullable")]
    pub contact_group: String,
    #[serde(rename = "Status", deserialize_with = "nullable")]
    pub status: String,
    #[serde(rename = "Tags", deserialize_with = "nullable")]
    pub tags: Vec<String>,
    #[serde(rename = "Uptime", deserialize_with = "nullable")]
    pub uptime: f32,
    #[serde(rename = "CheckRate", deserialize_with = "nullable")]
    pub check_rate: i64,
}

impl ApiRecord for TestSummary {
    const FIELDS: &'static [&'static str] = &["TestID"];
}

impl ApiRecord for TestDetail {
    const FIELDS: &'static [&'static str] = &[
        "TestID",
        "WebsiteName",
        "URI",
        "ContactGroup",
        "Status",
        "Tags",
        "Uptime",
        "CheckRate",
    ];
}

impl TestDetail {
    /// Cells rendered in the summary table: tags, website name, URI.
    pub fn row(&self) -> Vec<String> {
        vec![
            self.tags.join(","),
            self.website_name.clone(),
            self.uri.clone(),
        ]
    }
}

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
