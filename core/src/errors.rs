use std::io;

use anyhow::Error as AnyError;
use serde_json::error::Category;

/// Returns `true` if the provided error chain bottoms out in a missing
/// file or directory.
pub fn is_not_found(err: &AnyError) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<io::Error>()
            .map(|io_err| io_err.kind() == io::ErrorKind::NotFound)
            .unwrap_or(false)
    })
}

/// Returns `true` if the provided error chain contains a JSON syntax or
/// data error, i.e. the offending bytes were not a well-formed JSON value.
pub fn is_invalid_json(err: &AnyError) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<serde_json::Error>()
            .map(|json_err| !matches!(json_err.classify(), Category::Io))
            .unwrap_or(false)
    })
}
