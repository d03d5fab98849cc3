use std::error::Error;

pub mod api;
pub mod assets;
pub mod config;
pub mod db;
pub mod error;
pub mod handler;
pub mod model;
pub mod pagination;
pub mod routes;
pub mod views;

pub fn unpack_error(err: &(dyn Error)) -> String {
    let mut parts = Vec::new();
    parts.push(err.to_string());
    let mut current = err.source();
    while let Some(source) = current {
        parts.push(source.to_string());
        current = source.source();
    }
    parts.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpack_error_walks_chain() {
        let err = anyhow::anyhow!("disk full").context("insert book").context("create book");
        assert_eq!(unpack_error(&*err), "create book: insert book: disk full");
    }
}
