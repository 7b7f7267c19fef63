//! Statements a SQL-backed [`UserRepository`](super::UserRepository) runs.
//!
//! Table and column names follow the `Users`/`Authorities` schema shared with
//! the authentication layer. Placeholders are positional (`?`).

/// Credentials lookup used by the authentication layer.
pub const USER_BY_USERNAME: &str = "select Username,Password,Enabled from `Users` where Username = ?";

/// Authorities granted to one user.
pub const AUTHORITIES_BY_USERNAME: &str = "select Username,Authority from `Authorities` where Username = ?";

/// Existence check.
pub const USER_EXISTS: &str = "select Username from `Users` where Username = ?";

/// First page of enabled users.
pub const FIRST_ENABLED: &str =
    "select Username,DisplayName,Email,Enabled from `Users` where Enabled = 1 limit ?";

/// Enabled users whose username matches a `LIKE` pattern (see [`contains_pattern`]).
pub const ENABLED_BY_USERNAME_LIKE: &str = "select Username,DisplayName,Email,Enabled from `Users` \
     where lower(Username) like lower(?) escape '\\' and Enabled = 1 limit ?";

/// Rows for a set of usernames; expand the placeholder list with [`in_list`].
pub const BY_USERNAMES_PREFIX: &str = "select Username,DisplayName,Email,Enabled from `Users` where Username in ";

/// A `LIKE` pattern matching any username containing `fragment`.
///
/// `%`, `_` and the escape character itself are escaped so the fragment
/// matches literally.
pub fn contains_pattern(fragment: &str) -> String {
    let mut pattern = String::with_capacity(fragment.len() + 2);
    pattern.push('%');
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// `(?,?,...)` with `count` placeholders.
pub fn in_list(count: usize) -> String {
    let placeholders = vec!["?"; count.max(1)];
    format!("({})", placeholders.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("bob"), "%bob%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern(""), "%%");
    }

    #[test]
    fn test_in_list() {
        assert_eq!(in_list(3), "(?,?,?)");
        assert_eq!(in_list(0), "(?)");
        assert!(format!("{}{}", BY_USERNAMES_PREFIX, in_list(2)).ends_with("in (?,?)"));
    }

    fn placeholders(statement: &str) -> usize {
        statement.matches('?').count()
    }

    #[test]
    fn test_statement_shapes() {
        for statement in [USER_BY_USERNAME, AUTHORITIES_BY_USERNAME, USER_EXISTS] {
            assert_eq!(placeholders(statement), 1, "{}", statement);
            assert!(statement.ends_with("where Username = ?"));
        }
        assert!(USER_BY_USERNAME.starts_with("select Username,Password,Enabled "));
        assert!(AUTHORITIES_BY_USERNAME.contains("from `Authorities`"));

        // Listing statements carry the columns a UserRow is built from.
        for statement in [FIRST_ENABLED, ENABLED_BY_USERNAME_LIKE, BY_USERNAMES_PREFIX] {
            assert!(statement.starts_with("select Username,DisplayName,Email,Enabled from `Users`"));
        }
        assert_eq!(placeholders(FIRST_ENABLED), 1);
        assert!(FIRST_ENABLED.contains("Enabled = 1"));

        // Pattern then limit; the pattern escapes with the same character
        // `contains_pattern` uses.
        assert_eq!(placeholders(ENABLED_BY_USERNAME_LIKE), 2);
        assert!(ENABLED_BY_USERNAME_LIKE.contains("like lower(?) escape '\\'"));
        assert!(contains_pattern("a_b").contains("\\_"));

        let by_names = format!("{}{}", BY_USERNAMES_PREFIX, in_list(3));
        assert_eq!(placeholders(&by_names), 3);
    }
}
