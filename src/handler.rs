use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

use tracing::info;

use crate::api::ListParams;
use crate::db::{Database, Ordering};
use crate::error::{HandlerError, StoreError};
use crate::model::BookForm;
use crate::pagination::{offset_for, page_numbers};
use crate::views::{IndexPage, View};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub page_size: u32,
}

const BOOKS_PATH: &str = "/books";

// Ids that do not parse can never match a row.
fn parse_id(raw: &str) -> Result<i64, HandlerError> {
    raw.parse::<i64>().map_err(|_| HandlerError::NotFound)
}

pub async fn redirect_home() -> Redirect {
    Redirect::to(BOOKS_PATH)
}

/// `GET /books`: one page of the catalog ordered by title, plus the results
/// of `search` (if any) as a separate, unpaginated list.
pub async fn list_books(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<View, HandlerError> {
    let page = params.page();
    let (books, total) = state
        .db
        .list_page(offset_for(page, state.page_size), state.page_size, Ordering::TITLE_ASC)
        .await?;

    let search_term = params.search_term();
    let results = match search_term {
        Some(term) => Some(state.db.search(term).await?),
        None => None,
    };

    info!(page, total, searched = search_term.is_some(), "listed books");
    Ok(View::Index(IndexPage {
        books,
        pages: page_numbers(total, state.page_size),
        current_page: page,
        search_term: search_term.map(str::to_owned),
        results,
    }))
}

pub async fn new_book_form() -> View {
    View::NewBook {
        form: BookForm::default(),
        errors: vec![],
    }
}

pub async fn create_book(State(state): State<AppState>, form: BookForm) -> Result<Response, HandlerError> {
    match state.db.create_book(&form).await {
        Ok(_) => Ok(Redirect::to(BOOKS_PATH).into_response()),
        Err(StoreError::Validation(errors)) => {
            info!(errors = errors.len(), "rejected new book");
            Ok(View::NewBook { form, errors }.into_response())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn edit_book_form(State(state): State<AppState>, Path(id): Path<String>) -> Result<View, HandlerError> {
    let id = parse_id(&id)?;
    let book = state.db.get_book(id).await?;

    Ok(View::UpdateBook {
        id: book.id,
        form: BookForm::from(&book),
        errors: vec![],
    })
}

pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    form: BookForm,
) -> Result<Response, HandlerError> {
    let id = parse_id(&id)?;

    match state.db.update_book(id, &form).await {
        Ok(_) => Ok(Redirect::to(BOOKS_PATH).into_response()),
        Err(StoreError::Validation(errors)) => {
            info!(book_id = id, errors = errors.len(), "rejected book update");
            Ok(View::UpdateBook { id, form, errors }.into_response())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn delete_book(State(state): State<AppState>, Path(id): Path<String>) -> Result<Redirect, HandlerError> {
    let id = parse_id(&id)?;
    state.db.delete_book(id).await?;
    Ok(Redirect::to(BOOKS_PATH))
}

pub async fn page_not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, View::NotFound)
}

/// Renders the generic error page for a handler that panicked.
pub fn panic_page(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    tracing::error!(panic = detail, "request handler panicked");

    (StatusCode::INTERNAL_SERVER_ERROR, View::Error).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("12").unwrap(), 12);
        assert!(matches!(parse_id("twelve"), Err(HandlerError::NotFound)));
        assert!(matches!(parse_id(""), Err(HandlerError::NotFound)));
    }

    #[test]
    fn test_panic_page_is_500() {
        let response = panic_page(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
