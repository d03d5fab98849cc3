use axum::{
    extract::Path,
    http::header,
    response::{IntoResponse, Response},
};
use rust_embed::Embed;

use crate::handler::page_not_found;

#[derive(Embed)]
#[folder = "public"]
pub struct Assets;

/// `GET /static/*path`: files from `public/`, compiled into the binary.
pub async fn serve_static(Path(path): Path<String>) -> Response {
    let path = path.trim_start_matches('/');

    match Assets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.as_ref().to_owned())], content.data.into_owned()).into_response()
        }
        None => page_not_found().await.into_response(),
    }
}
