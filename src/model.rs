use chrono::Datelike;
use serde::{Deserialize, Deserializer, Serialize};

pub const EARLIEST_YEAR: i32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub genre: Option<String>,
    pub year: Option<i32>,
    pub created_at: String,
    pub updated_at: String,
}

/// Raw book fields as submitted by the new/update forms.
///
/// Only these four fields are ever read from a request body; anything else the
/// client sends is ignored. Values are kept verbatim so a rejected submission
/// can be echoed back into the form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookForm {
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub author: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub genre: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub year: String,
}

/// Validated book fields, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct BookInput {
    pub title: String,
    pub author: String,
    pub genre: Option<String>,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        FieldError {
            field,
            message: message.into(),
        }
    }
}

impl From<&Book> for BookForm {
    fn from(book: &Book) -> Self {
        BookForm {
            title: book.title.clone(),
            author: book.author.clone(),
            genre: book.genre.clone().unwrap_or_default(),
            year: book.year.map(|y| y.to_string()).unwrap_or_default(),
        }
    }
}

pub fn latest_year() -> i32 {
    chrono::Utc::now().year() + 1
}

impl BookForm {
    pub fn validate(&self) -> Result<BookInput, Vec<FieldError>> {
        let mut errors = Vec::new();

        let title = self.title.trim();
        if title.is_empty() {
            errors.push(FieldError::new("title", r#"Please provide a value for "title""#));
        }

        let author = self.author.trim();
        if author.is_empty() {
            errors.push(FieldError::new("author", r#"Please provide a value for "author""#));
        }

        let genre = Some(self.genre.trim())
            .filter(|g| !g.is_empty())
            .map(str::to_owned);

        let year = match self.year.trim() {
            "" => None,
            raw => match raw.parse::<i32>() {
                Ok(y) if (EARLIEST_YEAR..=latest_year()).contains(&y) => Some(y),
                Ok(_) => {
                    errors.push(FieldError::new(
                        "year",
                        format!(r#""year" must be between {} and {}"#, EARLIEST_YEAR, latest_year()),
                    ));
                    None
                }
                Err(_) => {
                    errors.push(FieldError::new("year", r#""year" must be a whole number"#));
                    None
                }
            },
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(BookInput {
            title: title.to_owned(),
            author: author.to_owned(),
            genre,
            year,
        })
    }
}

// Forms always send text; JSON clients may send numbers, nulls or worse.
// Anything that is not text or a number reaches validation as an empty value
// so it is reported against its field instead of rejecting the request.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Integer(i64),
        Float(f64),
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Integer(n)) => n.to_string(),
        Some(Raw::Float(f)) => f.to_string(),
        Some(Raw::Text(s)) => s,
        Some(Raw::Other(_)) | None => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(title: &str, author: &str, genre: &str, year: &str) -> BookForm {
        BookForm {
            title: title.to_string(),
            author: author.to_string(),
            genre: genre.to_string(),
            year: year.to_string(),
        }
    }

    #[test]
    fn test_valid_form_is_trimmed() {
        let input = form("  Dune ", "Frank Herbert", " Science Fiction ", " 1965 ")
            .validate()
            .unwrap();
        assert_eq!(input.title, "Dune");
        assert_eq!(input.author, "Frank Herbert");
        assert_eq!(input.genre.as_deref(), Some("Science Fiction"));
        assert_eq!(input.year, Some(1965));
    }

    #[test]
    fn test_optional_fields_may_be_blank() {
        let input = form("Emma", "Jane Austen", "", "").validate().unwrap();
        assert_eq!(input.genre, None);
        assert_eq!(input.year, None);
    }

    #[test]
    fn test_missing_title_and_author() {
        let errors = form("", "   ", "", "").validate().unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["title", "author"]);
        assert_eq!(errors[0].message, r#"Please provide a value for "title""#);
    }

    #[test]
    fn test_year_must_be_numeric() {
        let errors = form("Emma", "Jane Austen", "", "eighteen").validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "year");
    }

    #[test]
    fn test_year_must_be_plausible() {
        assert!(form("Emma", "Jane Austen", "", "0").validate().is_err());
        assert!(form("Emma", "Jane Austen", "", "-400").validate().is_err());
        let too_late = (latest_year() + 1).to_string();
        assert!(form("Emma", "Jane Austen", "", &too_late).validate().is_err());
        assert!(form("Emma", "Jane Austen", "", "1815").validate().is_ok());
    }

    #[test]
    fn test_json_accepts_numeric_year_and_nulls() {
        let form: BookForm = serde_json::from_str(
            r#"{"title":"Emma","author":"Jane Austen","genre":null,"year":1815,"id":99}"#,
        )
        .unwrap();
        assert_eq!(form.year, "1815");
        assert_eq!(form.genre, "");
    }

    #[test]
    fn test_json_fractional_year_is_a_field_error() {
        let form: BookForm =
            serde_json::from_str(r#"{"title":"Emma","author":"Jane Austen","year":1815.5}"#).unwrap();
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "year");
        assert_eq!(errors[0].message, r#""year" must be a whole number"#);

        let whole: BookForm =
            serde_json::from_str(r#"{"title":"Emma","author":"Jane Austen","year":1815.0}"#).unwrap();
        assert_eq!(whole.validate().unwrap().year, Some(1815));
    }

    #[test]
    fn test_json_non_text_title_is_a_field_error() {
        let form: BookForm =
            serde_json::from_str(r#"{"title":["Emma"],"author":"Jane Austen","year":true}"#).unwrap();
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "title");

        let numeric: BookForm = serde_json::from_str(r#"{"title":1984,"author":"George Orwell"}"#).unwrap();
        assert_eq!(numeric.validate().unwrap().title, "1984");
    }

    #[test]
    fn test_form_round_trips_from_book() {
        let book = Book {
            id: 3,
            title: "Emma".into(),
            author: "Jane Austen".into(),
            genre: None,
            year: Some(1815),
            created_at: String::new(),
            updated_at: String::new(),
        };
        let form = BookForm::from(&book);
        assert_eq!(form.genre, "");
        assert_eq!(form.year, "1815");
    }
}
