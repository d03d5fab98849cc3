//! HTML pages rendered with Maud.
//!
//! Every page is a variant of [`View`]; handlers build the variant with the
//! data it needs and hand it to axum. Templates only read what they are given.

use axum::response::{IntoResponse, Response};
use maud::{DOCTYPE, Markup, html};

use crate::model::{Book, BookForm, FieldError};

#[derive(Debug, Clone)]
pub struct IndexPage {
    pub books: Vec<Book>,
    pub pages: Vec<u64>,
    pub current_page: u32,
    pub search_term: Option<String>,
    /// `None` when no search was requested.
    pub results: Option<Vec<Book>>,
}

#[derive(Debug, Clone)]
pub enum View {
    Index(IndexPage),
    NewBook {
        form: BookForm,
        errors: Vec<FieldError>,
    },
    UpdateBook {
        id: i64,
        form: BookForm,
        errors: Vec<FieldError>,
    },
    NotFound,
    Error,
}

impl View {
    pub fn name(&self) -> &'static str {
        match self {
            View::Index(_) => "index",
            View::NewBook { .. } => "new-book",
            View::UpdateBook { .. } => "update-book",
            View::NotFound => "page-not-found",
            View::Error => "error",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            View::Index(_) => "Books",
            View::NewBook { .. } => "New Book",
            View::UpdateBook { .. } => "Update Book",
            View::NotFound => "Page Not Found",
            View::Error => "Server Error",
        }
    }

    pub fn render(&self) -> Markup {
        let content = match self {
            View::Index(page) => index(page),
            View::NewBook { form, errors } => new_book(form, errors),
            View::UpdateBook { id, form, errors } => update_book(*id, form, errors),
            View::NotFound => page_not_found(),
            View::Error => error(),
        };
        layout(self.title(), content)
    }
}

impl IntoResponse for View {
    fn into_response(self) -> Response {
        tracing::debug!(view = self.name(), "rendering page");
        self.render().into_response()
    }
}

fn layout(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                link rel="stylesheet" href="/static/stylesheets/style.css";
            }
            body {
                div #wrapper {
                    (content)
                }
            }
        }
    }
}

fn page_href(page: u64, search_term: Option<&str>) -> String {
    match search_term {
        Some(term) => format!("/books?p={}&search={}", page, urlencoding::encode(term)),
        None => format!("/books?p={}", page),
    }
}

fn book_table(books: &[Book]) -> Markup {
    html! {
        table {
            thead {
                tr {
                    th { "Title" }
                    th { "Author" }
                    th { "Genre" }
                    th { "Year" }
                }
            }
            tbody {
                @for book in books {
                    tr {
                        td { a href={ "/books/" (book.id) } { (book.title) } }
                        td { (book.author) }
                        td { (book.genre.as_deref().unwrap_or_default()) }
                        td {
                            @if let Some(year) = book.year {
                                (year)
                            }
                        }
                    }
                }
            }
        }
    }
}

fn index(page: &IndexPage) -> Markup {
    let search_term = page.search_term.as_deref();
    html! {
        h1 { "Books" }
        p { a.button href="/books/new" { "Create New Book" } }

        form #search action="/books" method="get" {
            input type="search" name="search" placeholder="Search by title, author, genre or year" value=(search_term.unwrap_or_default());
            input.button type="submit" value="Search";
        }

        (book_table(&page.books))

        @if !page.pages.is_empty() {
            ul.pagination {
                @for n in &page.pages {
                    li {
                        a.active[*n == page.current_page as u64] href=(page_href(*n, search_term)) { (n) }
                    }
                }
            }
        }

        @if let Some(results) = &page.results {
            section #search-results {
                h2 { "Search results for \"" (search_term.unwrap_or_default()) "\"" }
                @if results.is_empty() {
                    p { "No books matched your search." }
                } @else {
                    (book_table(results))
                }
            }
        }
    }
}

fn error_list(errors: &[FieldError]) -> Markup {
    html! {
        @if !errors.is_empty() {
            h2.error { "Oooops!" }
            div.error {
                ul {
                    @for e in errors {
                        li data-field=(e.field) { (e.message) }
                    }
                }
            }
        }
    }
}

fn book_fields(form: &BookForm) -> Markup {
    html! {
        p {
            label for="title" { "Title" }
            input #title name="title" type="text" value=(form.title);
        }
        p {
            label for="author" { "Author" }
            input #author name="author" type="text" value=(form.author);
        }
        p {
            label for="genre" { "Genre" }
            input #genre name="genre" type="text" value=(form.genre);
        }
        p {
            label for="year" { "Year" }
            input #year name="year" type="text" value=(form.year);
        }
    }
}

fn new_book(form: &BookForm, errors: &[FieldError]) -> Markup {
    html! {
        h1 { "New Book" }
        (error_list(errors))
        form action="/books/new" method="post" {
            (book_fields(form))
            p { input.button type="submit" value="Create New Book"; }
        }
        p { a.button href="/books" { "Cancel" } }
    }
}

fn update_book(id: i64, form: &BookForm, errors: &[FieldError]) -> Markup {
    html! {
        h1 { "Update Book" }
        (error_list(errors))
        form action={ "/books/" (id) } method="post" {
            (book_fields(form))
            p { input.button type="submit" value="Update Book"; }
        }
        form action={ "/books/" (id) "/delete" } method="post"
            onsubmit="return confirm('Are you sure you want to delete this book?');" {
            p { input.button type="submit" value="Delete Book"; }
        }
        p { a.button href="/books" { "Cancel" } }
    }
}

fn page_not_found() -> Markup {
    html! {
        h1 { "Page Not Found" }
        p { "Sorry! We couldn't find the page you were looking for." }
        p { a.button href="/books" { "Home" } }
    }
}

fn error() -> Markup {
    html! {
        h1 { "Server Error" }
        p { "Sorry! There was an unexpected error on the server." }
        p { a.button href="/books" { "Home" } }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(id: i64, title: &str) -> Book {
        Book {
            id,
            title: title.to_string(),
            author: "Someone".to_string(),
            genre: None,
            year: Some(2001),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_names_and_titles() {
        assert_eq!(View::NotFound.name(), "page-not-found");
        assert_eq!(View::Error.title(), "Server Error");
        let html = View::NotFound.render().into_string();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Page Not Found</title>"));
    }

    #[test]
    fn test_index_renders_rows_and_pagination() {
        let view = View::Index(IndexPage {
            books: vec![book(1, "Dune"), book(2, "Emma")],
            pages: vec![1, 2],
            current_page: 2,
            search_term: None,
            results: None,
        });
        let html = view.render().into_string();
        assert!(html.contains(r#"<a href="/books/1">Dune</a>"#));
        assert!(html.contains(r#"href="/books?p=2""#));
        assert!(html.contains(r#"href="/books?p=1""#));
        assert_eq!(html.matches("active").count(), 1);
        assert!(!html.contains("search-results"));
    }

    #[test]
    fn test_index_shows_search_results_separately() {
        let view = View::Index(IndexPage {
            books: vec![],
            pages: vec![],
            current_page: 1,
            search_term: Some("sci fi".to_string()),
            results: Some(vec![book(7, "Anathem")]),
        });
        let html = view.render().into_string();
        assert!(html.contains("search-results"));
        assert!(html.contains(r#"<a href="/books/7">Anathem</a>"#));
    }

    #[test]
    fn test_page_href_encodes_search() {
        assert_eq!(page_href(3, Some("sci fi&more")), "/books?p=3&search=sci%20fi%26more");
    }

    #[test]
    fn test_form_echoes_input_and_escapes() {
        let view = View::NewBook {
            form: BookForm {
                title: "<script>".to_string(),
                ..BookForm::default()
            },
            errors: vec![],
        };
        let html = view.render().into_string();
        assert!(html.contains(r#"value="&lt;script&gt;""#));
        assert!(!html.contains("Oooops!"));
    }

    #[test]
    fn test_update_form_lists_errors() {
        let view = View::UpdateBook {
            id: 4,
            form: BookForm::default(),
            errors: vec![FieldError {
                field: "title",
                message: r#"Please provide a value for "title""#.to_string(),
            }],
        };
        let html = view.render().into_string();
        assert!(html.contains(r#"action="/books/4""#));
        assert!(html.contains(r#"action="/books/4/delete""#));
        assert!(html.contains("Please provide a value for &quot;title&quot;"));
    }
}
