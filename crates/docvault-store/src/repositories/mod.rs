//! Concrete repository implementations.
//!
//! Repositories hold the pool for plain reads; every method that must
//! participate in a caller-scoped transaction takes a
//! `&mut SqliteConnection` instead, threaded down from the coordinator.

pub mod access;
pub mod document;
pub mod folder;
pub mod version;

pub use access::AccessRepository;
pub use document::DocumentRepository;
pub use folder::FolderRepository;
pub use version::VersionRepository;

/// Build the LIKE pattern matching every descendant path of `path`.
///
/// Paths come from user-chosen names, so LIKE metacharacters must be
/// escaped. All queries using the result must specify `ESCAPE '\'`.
pub(crate) fn descendant_pattern(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len() + 2);
    for ch in path.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push_str("/%");
    escaped
}

/// Whether a sqlx error is a unique-constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descendant_pattern_plain() {
        assert_eq!(descendant_pattern("/A/B"), "/A/B/%");
    }

    #[test]
    fn test_descendant_pattern_escapes_metacharacters() {
        assert_eq!(descendant_pattern("/100%"), "/100\\%/%");
        assert_eq!(descendant_pattern("/a_b"), "/a\\_b/%");
        assert_eq!(descendant_pattern("/a\\b"), "/a\\\\b/%");
    }
}
