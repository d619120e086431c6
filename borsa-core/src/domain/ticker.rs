//! Ticker symbol helpers.

/// Replace symbol separators and path-hostile characters with `_`.
///
/// `ENI.MI` becomes `ENI_MI`, `^GSPC` becomes `_GSPC`.
pub fn sanitize_ticker(ticker: &str) -> String {
    ticker
        .chars()
        .map(|c| match c {
            '.' | '/' | '\\' | ':' | '^' => '_',
            c => c,
        })
        .collect()
}

/// Trim, drop blanks and keep the first occurrence of each symbol.
pub fn dedup_symbols<I, S>(symbols: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = std::collections::HashSet::new();
    symbols
        .into_iter()
        .map(|s| s.as_ref().trim().to_string())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.clone()))
        .collect()
}
