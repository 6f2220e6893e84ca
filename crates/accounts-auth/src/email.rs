//! Email address normalization.

/// Normalize an email address before storing or comparing it.
///
/// Addresses are lowercased; no other canonicalization is applied.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases() {
        assert_eq!(normalize_email("John.Doe@Example.COM"), "john.doe@example.com");
    }

    #[test]
    fn test_keeps_surrounding_whitespace() {
        assert_eq!(normalize_email(" A@B.com"), " a@b.com");
    }
}
