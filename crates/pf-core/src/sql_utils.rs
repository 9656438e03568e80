//! SQL quoting helpers for dynamically built statements

/// Quote a SQL identifier, doubling embedded double quotes.
///
/// # Examples
/// ```
/// use pf_core::sql_utils::quote_ident;
/// assert_eq!(quote_ident("daily_agg"), r#""daily_agg""#);
/// assert_eq!(quote_ident(r#"odd"name"#), r#""odd""name""#);
/// ```
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Escape a value for use inside a single-quoted SQL string literal.
pub fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}

/// Render a value as a complete single-quoted SQL string literal.
///
/// # Examples
/// ```
/// use pf_core::sql_utils::sql_literal;
/// assert_eq!(sql_literal("2024-05-01"), "'2024-05-01'");
/// assert_eq!(sql_literal("it's"), "'it''s'");
/// ```
pub fn sql_literal(value: &str) -> String {
    format!("'{}'", escape_sql_string(value))
}

/// Comma-separated list of quoted identifiers
pub fn quote_ident_list<'a>(idents: impl IntoIterator<Item = &'a str>) -> String {
    idents
        .into_iter()
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("timestamp"), r#""timestamp""#);
        assert_eq!(quote_ident(""), r#""""#);
    }

    #[test]
    fn test_escape_sql_string() {
        assert_eq!(escape_sql_string("plain"), "plain");
        assert_eq!(escape_sql_string("a'b'c"), "a''b''c");
    }

    #[test]
    fn test_quote_ident_list() {
        assert_eq!(
            quote_ident_list(["partition_date", "price_usd"]),
            r#""partition_date", "price_usd""#
        );
        assert_eq!(quote_ident_list(Vec::<&str>::new()), "");
    }
}
