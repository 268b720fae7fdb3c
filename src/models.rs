use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::fmt;

// Identity of a story. Algolia sends objectID as a string, older payloads
// and hand-written fixtures use integers, so both are accepted and kept in
// textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "RawObjectId")]
pub struct ObjectId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawObjectId {
    Number(i64),
    Text(String),
}

impl From<RawObjectId> for ObjectId {
    fn from(raw: RawObjectId) -> Self {
        match raw {
            RawObjectId::Number(n) => Self(n.to_string()),
            RawObjectId::Text(s) => Self(s),
        }
    }
}

impl ObjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ObjectId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<u64> for ObjectId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StoryItem {
    #[serde(default, deserialize_with = "default_on_error")]
    pub title: String,
    #[serde(default, deserialize_with = "default_on_error")]
    pub url: String,
    #[serde(default, deserialize_with = "default_on_error")]
    pub author: String,
    #[serde(default, deserialize_with = "default_on_error")]
    pub num_comments: Option<u32>,
    #[serde(default, deserialize_with = "default_on_error")]
    pub points: i64,
    #[serde(rename = "objectID")]
    pub object_id: ObjectId,
}

impl StoryItem {
    // Host part of the story URL without a leading "www.", empty for text posts
    pub fn domain(&self) -> String {
        reqwest::Url::parse(&self.url)
            .ok()
            .and_then(|url| url.host_str().map(|host| host.trim_start_matches("www.").to_string()))
            .unwrap_or_default()
    }
}

// Only `hits` is read from the search response, everything else is ignored.
// Hits stay raw here so one odd entry cannot sink the whole response.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub hits: Vec<serde_json::Value>,
}

// Fields are not validated: nulls (Algolia sends them for `url` on Ask HN
// posts) and values of the wrong type fall back to the field's default
fn default_on_error<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_id_accepts_strings_and_integers() {
        let from_number: ObjectId = serde_json::from_str("1").unwrap();
        let from_text: ObjectId = serde_json::from_str("\"1\"").unwrap();

        assert_eq!(from_number, from_text);
        assert_eq!(from_number.as_str(), "1");
        assert_eq!(ObjectId::from(1u64), from_text);
    }

    #[test]
    fn story_item_tolerates_nulls_and_missing_fields() {
        let json = r#"{
            "title": null,
            "url": null,
            "author": "pg",
            "points": 12,
            "objectID": "42"
        }"#;

        let item: StoryItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.title, "");
        assert_eq!(item.url, "");
        assert_eq!(item.author, "pg");
        assert_eq!(item.num_comments, None);
        assert_eq!(item.points, 12);
        assert_eq!(item.object_id, ObjectId::new("42"));
    }

    #[test]
    fn search_response_ignores_extra_fields() {
        let json = r#"{
            "hits": [
                {"title": "React", "url": "https://react.dev", "author": "dan",
                 "num_comments": 3, "points": 100, "objectID": 1, "_tags": ["story"]}
            ],
            "nbHits": 1,
            "page": 0
        }"#;

        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.hits.len(), 1);

        let item = StoryItem::deserialize(&response.hits[0]).unwrap();
        assert_eq!(item.title, "React");
        assert_eq!(item.num_comments, Some(3));
    }

    #[test]
    fn story_item_defaults_fields_of_the_wrong_type() {
        let json = r#"{
            "title": 7,
            "url": ["not", "a", "url"],
            "author": "pg",
            "num_comments": -1,
            "points": "12",
            "objectID": 9
        }"#;

        let item: StoryItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.title, "");
        assert_eq!(item.url, "");
        assert_eq!(item.author, "pg");
        assert_eq!(item.num_comments, None);
        assert_eq!(item.points, 0);
        assert_eq!(item.object_id, ObjectId::from(9u64));
    }

    #[test]
    fn story_item_requires_object_id() {
        let result = serde_json::from_str::<StoryItem>(r#"{"title": "no id", "points": 1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn domain_strips_www_prefix() {
        let mut item: StoryItem = serde_json::from_str(
            r#"{"title": "t", "url": "https://www.example.com/a/b", "author": "a", "points": 1, "objectID": "1"}"#,
        )
        .unwrap();
        assert_eq!(item.domain(), "example.com");

        item.url.clear();
        assert_eq!(item.domain(), "");
    }
}
