//! Email address helpers.

/// Loose syntactic check: one `@`, non-empty local part, dotted domain, no spaces.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.len() > 254 || email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// Lowercased, trimmed form used for storage and duplicate checks.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Mask an address for log fields: `s***@example.com`.
pub fn mask_email(email: &str) -> String {
    match email.find('@') {
        Some(at_pos) => {
            let (local, domain) = email.split_at(at_pos);
            match local.chars().next() {
                Some(first) if local.chars().count() > 1 => format!("{}***{}", first, domain),
                _ => format!("***{}", domain),
            }
        }
        None => "***".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_addresses() {
        assert!(is_valid_email("sari@example.co.uk"));
        assert!(is_valid_email("  first.last+tag@shop.example.com "));
    }

    #[test]
    fn rejects_malformed_addresses() {
        for bad in ["", "no-at-sign", "@example.com", "a@b", "a@@b.com", "a b@c.com", "a@.com"] {
            assert!(!is_valid_email(bad), "{bad}");
        }
    }

    #[test]
    fn masks_local_part() {
        assert_eq!(mask_email("sari@example.com"), "s***@example.com");
        assert_eq!(mask_email("s@example.com"), "***@example.com");
        assert_eq!(mask_email("garbage"), "***");
    }

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_email("  Sari@Example.COM "), "sari@example.com");
    }
}
