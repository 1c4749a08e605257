use serde_json::{Map, Value};

use crate::sql::ConvertError;

/// One element of the input array, reduced to the columns of the `page` table.
///
/// Every column holds the literal text written into the value tuple: strings
/// without their JSON quotes, anything else as its JSON text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub page_number: String,
    pub chapter_number: String,
    pub image_id: String,
    pub name: String,
    pub published_at: String,
}

const PUBLISHED_STATUS: &str = "published_status";
const PUBLISHED_AT: &str = "PublishedAt";
const PUBLISHED_AT_PATH: &str = "published_status.PublishedAt";

impl PageRecord {
    /// Extracts a record from the element at `index` of the input array.
    pub fn from_value(index: usize, value: &Value) -> Result<Self, ConvertError> {
        let object = value
            .as_object()
            .ok_or(ConvertError::NotAnObject { index })?;

        let page_number = field(index, object, "page_number", "page_number")?;
        let chapter_number = field(index, object, "chapter_number", "chapter_number")?;
        let image_id = field(index, object, "image_id", "image_id")?;
        let name = field(index, object, "name", "name")?;

        let status = required(index, object, PUBLISHED_STATUS, PUBLISHED_STATUS)?
            .as_object()
            .ok_or(ConvertError::InvalidField {
                index,
                field: PUBLISHED_STATUS,
                expected: "an object",
            })?;
        let published_at = field(index, status, PUBLISHED_AT, PUBLISHED_AT_PATH)?;

        Ok(Self {
            page_number,
            chapter_number,
            image_id,
            name,
            published_at,
        })
    }
}

/// Parses a JSON document holding an array of page records.
///
/// Stops at the first element that can't be turned into a record.
pub fn parse_pages(json: &str) -> Result<Vec<PageRecord>, ConvertError> {
    let root: Value = serde_json::from_str(json)?;
    let elements = root.as_array().ok_or(ConvertError::NotAnArray)?;

    elements
        .iter()
        .enumerate()
        .map(|(index, element)| PageRecord::from_value(index, element))
        .collect()
}

// `path` is what gets reported, so nested keys can name their parent.
fn required<'a>(
    index: usize,
    object: &'a Map<String, Value>,
    key: &str,
    path: &'static str,
) -> Result<&'a Value, ConvertError> {
    object
        .get(key)
        .ok_or(ConvertError::MissingField { index, field: path })
}

fn field(
    index: usize,
    object: &Map<String, Value>,
    key: &str,
    path: &'static str,
) -> Result<String, ConvertError> {
    Ok(literal_text(required(index, object, key, path)?))
}

fn literal_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        // numbers keep serde_json's formatting: -1, 1.0, 1.5
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn page_one() -> Value {
        json!({
            "page_number": 1,
            "chapter_number": 2,
            "image_id": "img1",
            "name": "Page One",
            "published_status": { "PublishedAt": "2020-01-01" }
        })
    }

    #[test]
    fn extracts_every_column() {
        let record = PageRecord::from_value(0, &page_one()).unwrap();
        assert_eq!(
            record,
            PageRecord {
                page_number: "1".into(),
                chapter_number: "2".into(),
                image_id: "img1".into(),
                name: "Page One".into(),
                published_at: "2020-01-01".into(),
            }
        );
    }

    #[test]
    fn ignores_unknown_keys() {
        let mut value = page_one();
        value["is_published"] = json!(true);
        value["published_status"]["Extra"] = json!(3);
        assert!(PageRecord::from_value(0, &value).is_ok());
    }

    #[test]
    fn missing_top_level_field() {
        for key in ["page_number", "chapter_number", "image_id", "name"] {
            let mut value = page_one();
            value.as_object_mut().unwrap().remove(key);
            match PageRecord::from_value(4, &value) {
                Err(ConvertError::MissingField { index, field }) => {
                    assert_eq!(index, 4);
                    assert_eq!(field, key);
                }
                other => panic!("expected missing {key}, got {other:?}"),
            }
        }
    }

    #[test]
    fn missing_published_status() {
        let mut value = page_one();
        value.as_object_mut().unwrap().remove("published_status");
        assert!(matches!(
            PageRecord::from_value(0, &value),
            Err(ConvertError::MissingField {
                field: "published_status",
                ..
            })
        ));
    }

    #[test]
    fn missing_nested_published_at() {
        let mut value = page_one();
        value["published_status"] = json!({});
        assert!(matches!(
            PageRecord::from_value(1, &value),
            Err(ConvertError::MissingField {
                index: 1,
                field: "published_status.PublishedAt",
            })
        ));
    }

    #[test]
    fn numbers_keep_their_json_text() {
        let mut value = page_one();
        value["page_number"] = json!(-1);
        value["chapter_number"] = json!(1.5);
        let record = PageRecord::from_value(0, &value).unwrap();
        assert_eq!(record.page_number, "-1");
        assert_eq!(record.chapter_number, "1.5");

        value["page_number"] = json!(1.0);
        let record = PageRecord::from_value(0, &value).unwrap();
        assert_eq!(record.page_number, "1.0");
    }

    #[test]
    fn non_string_text_columns_use_json_text() {
        let mut value = page_one();
        value["image_id"] = json!(42);
        value["name"] = json!(null);
        value["published_status"]["PublishedAt"] = json!(false);
        let record = PageRecord::from_value(0, &value).unwrap();
        assert_eq!(record.image_id, "42");
        assert_eq!(record.name, "null");
        assert_eq!(record.published_at, "false");
    }

    #[test]
    fn string_number_columns_lose_their_quotes() {
        let mut value = page_one();
        value["page_number"] = json!("12");
        let record = PageRecord::from_value(0, &value).unwrap();
        assert_eq!(record.page_number, "12");
    }

    #[test]
    fn published_status_must_be_an_object() {
        let mut value = page_one();
        value["published_status"] = json!("PublishedAt");
        assert!(matches!(
            PageRecord::from_value(0, &value),
            Err(ConvertError::InvalidField {
                field: "published_status",
                ..
            })
        ));
    }

    #[test]
    fn parse_keeps_input_order() {
        let json = r#"[
            {"page_number":3,"chapter_number":1,"image_id":"c","name":"C","published_status":{"PublishedAt":"t3"}},
            {"page_number":1,"chapter_number":1,"image_id":"a","name":"A","published_status":{"PublishedAt":"t1"}}
        ]"#;
        let pages = parse_pages(json).unwrap();
        let numbers: Vec<&str> = pages.iter().map(|page| page.page_number.as_str()).collect();
        assert_eq!(numbers, vec!["3", "1"]);
    }

    #[test]
    fn parse_rejects_bad_documents() {
        assert!(matches!(
            parse_pages(r#"[{"page_number":1,"#),
            Err(ConvertError::Parse(_))
        ));
        assert!(matches!(parse_pages("{}"), Err(ConvertError::NotAnArray)));
        assert!(matches!(
            parse_pages("[1]"),
            Err(ConvertError::NotAnObject { index: 0 })
        ));
    }

    #[test]
    fn parse_reports_index_of_bad_element() {
        let json = r#"[
            {"page_number":1,"chapter_number":1,"image_id":"a","name":"A","published_status":{"PublishedAt":"t1"}},
            {"page_number":2,"chapter_number":1,"image_id":"b","name":"B"}
        ]"#;
        assert!(matches!(
            parse_pages(json),
            Err(ConvertError::MissingField {
                index: 1,
                field: "published_status",
            })
        ));
    }
}
