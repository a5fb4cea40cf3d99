use std::fmt::Display;

/// Formats one porcelain line.
pub(crate) fn porcelain_field(key: &str, value: impl Display) -> String {
    format!("{key}: {value}")
}
