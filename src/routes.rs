use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::assets::serve_static;
use crate::handler::{
    AppState, create_book, delete_book, edit_book_form, list_books, new_book_form, page_not_found, panic_page,
    redirect_home, update_book,
};

pub fn router(state: AppState) -> Router {
    // A known path with the wrong method is still "not found", not a bare 405.
    Router::new()
        .route("/", get(redirect_home).fallback(page_not_found))
        .route("/books", get(list_books).fallback(page_not_found))
        .route("/books/new", get(new_book_form).post(create_book).fallback(page_not_found))
        .route("/books/:id", get(edit_book_form).post(update_book).fallback(page_not_found))
        .route("/books/:id/delete", post(delete_book).fallback(page_not_found))
        .route("/static/*path", get(serve_static).fallback(page_not_found))
        .fallback(page_not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::custom(panic_page)),
        )
        .with_state(state)
}
