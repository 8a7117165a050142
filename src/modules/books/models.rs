use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// A catalog entry as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Book {
    /// Backend-assigned identifier, hex form of the document ObjectId
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Storage-side document shape.
///
/// The collection imposes no required fields; presence of `name`, `img`,
/// and `summary` is enforced at the API boundary, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl From<BookDocument> for Book {
    fn from(doc: BookDocument) -> Self {
        Self {
            id: doc.id.map(|oid| oid.to_hex()).unwrap_or_default(),
            name: doc.name,
            img: doc.img,
            summary: doc.summary,
        }
    }
}

/// Request payload for create and full-replacement update.
#[derive(Debug, Clone, Deserialize)]
pub struct BookInput {
    pub name: Option<String>,
    pub img: Option<String>,
    pub summary: Option<String>,
}

/// The validated field triple handed to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookFields {
    pub name: String,
    pub img: String,
    pub summary: String,
}

impl BookInput {
    /// Check that all three fields are present and non-empty.
    ///
    /// Returns one `{field, error}` detail per offending field, in the
    /// shape the error envelope carries.
    pub fn validate(self) -> Result<BookFields, Vec<serde_json::Value>> {
        let mut details = Vec::new();

        for (field, value) in [
            ("name", &self.name),
            ("img", &self.img),
            ("summary", &self.summary),
        ] {
            match value {
                Some(v) if !v.is_empty() => {}
                _ => details.push(json!({ "field": field, "error": "required" })),
            }
        }

        if !details.is_empty() {
            return Err(details);
        }

        Ok(BookFields {
            name: self.name.unwrap_or_default(),
            img: self.img.unwrap_or_default(),
            summary: self.summary.unwrap_or_default(),
        })
    }
}

/// Equality filters accepted by the list operation; omitted fields match
/// everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookFilter {
    pub name: Option<String>,
    pub img: Option<String>,
    pub summary: Option<String>,
}

/// Confirmation payload returned by the delete operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteConfirmation {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_input() -> BookInput {
        BookInput {
            name: Some("Dune".to_string()),
            img: Some("dune.jpg".to_string()),
            summary: Some("Desert planet saga".to_string()),
        }
    }

    #[test]
    fn valid_input_passes_validation() {
        let fields = full_input().validate().unwrap();
        assert_eq!(fields.name, "Dune");
        assert_eq!(fields.img, "dune.jpg");
        assert_eq!(fields.summary, "Desert planet saga");
    }

    #[test]
    fn missing_field_is_reported_by_name() {
        let mut input = full_input();
        input.summary = None;

        let details = input.validate().unwrap_err();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0]["field"], "summary");
        assert_eq!(details[0]["error"], "required");
    }

    #[test]
    fn empty_field_counts_as_missing() {
        let mut input = full_input();
        input.img = Some(String::new());

        let details = input.validate().unwrap_err();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0]["field"], "img");
    }

    #[test]
    fn every_missing_field_is_listed() {
        let input = BookInput {
            name: None,
            img: None,
            summary: None,
        };

        let details = input.validate().unwrap_err();
        assert_eq!(details.len(), 3);
    }

    #[test]
    fn document_without_fields_maps_to_sparse_book() {
        let oid = ObjectId::new();
        let doc = BookDocument {
            id: Some(oid),
            name: Some("Dune".to_string()),
            img: None,
            summary: None,
        };

        let book = Book::from(doc);
        assert_eq!(book.id, oid.to_hex());
        assert_eq!(book.name.as_deref(), Some("Dune"));
        assert!(book.img.is_none());
        assert!(book.summary.is_none());
    }
}
