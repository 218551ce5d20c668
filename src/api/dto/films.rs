/*
 * Responsibility
 * - films の request/response DTO
 * - id / owner は client から受け取らない (server 側で token の sub から決める)
 */
use serde::{Deserialize, Serialize};

use crate::error::FieldError;
use crate::repos::Film;

#[derive(Debug, Deserialize)]
pub struct CreateFilmRequest {
    pub title: Option<String>,
}

impl CreateFilmRequest {
    /// Returns the title to store. Missing and empty titles are rejected;
    /// any other string is stored as sent.
    pub fn validate(&self) -> Result<&str, FieldError> {
        match self.title.as_deref() {
            None => Err(FieldError::new("title", "title is required")),
            Some("") => Err(FieldError::new("title", "title must not be empty")),
            Some(title) => Ok(title),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilmResponse {
    pub id: String,
    pub title: String,
    pub owner_user_id: String,
}

impl From<Film> for FilmResponse {
    fn from(film: Film) -> Self {
        Self {
            id: film.id.to_string(),
            title: film.title,
            owner_user_id: film.owner_user_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn request(title: Option<&str>) -> CreateFilmRequest {
        CreateFilmRequest {
            title: title.map(str::to_string),
        }
    }

    #[test]
    fn title_is_required_and_non_empty() {
        assert_eq!(request(Some("Inception")).validate(), Ok("Inception"));
        assert_eq!(request(None).validate().unwrap_err().field, "title");
        assert!(request(Some("")).validate().is_err());
    }

    #[test]
    fn whitespace_title_is_kept_verbatim() {
        assert_eq!(request(Some("  \t")).validate(), Ok("  \t"));
        assert_eq!(request(Some(" Heat ")).validate(), Ok(" Heat "));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let req: CreateFilmRequest =
            serde_json::from_str(r#"{"title":"Heat","ownerUserId":"mallory","id":"1"}"#).unwrap();
        assert_eq!(req.validate(), Ok("Heat"));
    }

    #[test]
    fn response_uses_camel_case_owner() {
        let film = Film {
            id: Uuid::nil(),
            title: "Inception".into(),
            owner_user_id: "alice".into(),
        };

        let json = serde_json::to_value(FilmResponse::from(film)).unwrap();
        assert_eq!(json["id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["title"], "Inception");
        assert_eq!(json["ownerUserId"], "alice");
    }
}
