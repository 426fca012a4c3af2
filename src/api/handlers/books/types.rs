//! Request/response types for book endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BookOwner {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub condition: String,
    pub availability_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub owner: BookOwner,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BookPayload {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub condition: String,
    pub availability_status: String,
    pub location: Option<String>,
    pub description: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    pub status: String,
    pub book: Book,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BookListResponse {
    pub status: String,
    pub books: Vec<Book>,
}

/// Pagination for listings; substring query for search.
#[derive(ToSchema, Deserialize, Debug)]
pub struct ListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct SearchParams {
    pub q: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn book_payload_uses_camel_case() -> Result<()> {
        let payload: BookPayload = serde_json::from_value(serde_json::json!({
            "title": "Dune",
            "author": "Frank Herbert",
            "genre": "Sci-Fi",
            "condition": "Good",
            "availabilityStatus": "Available",
        }))?;
        assert_eq!(payload.availability_status, "Available");
        assert!(payload.location.is_none());
        Ok(())
    }

    #[test]
    fn book_omits_empty_optional_fields() -> Result<()> {
        let book = Book {
            id: Uuid::nil(),
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            genre: "Sci-Fi".to_string(),
            condition: "Good".to_string(),
            availability_status: "Available".to_string(),
            location: None,
            description: None,
            owner: BookOwner {
                id: Uuid::nil(),
                name: "A".to_string(),
                email: "a@x.com".to_string(),
            },
        };
        let value = serde_json::to_value(&book)?;
        assert!(value.get("location").is_none());
        assert_eq!(
            value.get("availabilityStatus").and_then(serde_json::Value::as_str),
            Some("Available")
        );
        Ok(())
    }
}
