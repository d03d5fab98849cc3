use axum::{
    Form, Json, async_trait,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::model::BookForm;

const DEFAULT_PAGE: u32 = 1;

/// Query string of `GET /books`.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub p: Option<String>,
    pub search: Option<String>,
}

impl ListParams {
    /// 1-based page number; anything unparsable or below 1 means the first page.
    pub fn page(&self) -> u32 {
        self.p
            .as_deref()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(DEFAULT_PAGE)
    }

    /// The search term, or `None` when no (or a blank) term was given.
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

fn is_json(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.trim_start().starts_with("application/json"))
        .unwrap_or(false)
}

/// Book bodies arrive either form-encoded (from the HTML forms) or as JSON.
#[async_trait]
impl<S> FromRequest<S> for BookForm
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_json(&req) {
            let Json(form) = Json::<BookForm>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(form)
        } else {
            let Form(form) = Form::<BookForm>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(form)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(p: Option<&str>, search: Option<&str>) -> ListParams {
        ListParams {
            p: p.map(String::from),
            search: search.map(String::from),
        }
    }

    #[test]
    fn test_page_defaults_and_fallbacks() {
        assert_eq!(params(None, None).page(), 1);
        assert_eq!(params(Some("3"), None).page(), 3);
        assert_eq!(params(Some("0"), None).page(), 1);
        assert_eq!(params(Some("-2"), None).page(), 1);
        assert_eq!(params(Some("abc"), None).page(), 1);
    }

    #[test]
    fn test_blank_search_is_no_search() {
        assert_eq!(params(None, None).search_term(), None);
        assert_eq!(params(None, Some("   ")).search_term(), None);
        assert_eq!(params(None, Some(" dune ")).search_term(), Some("dune"));
    }
}
