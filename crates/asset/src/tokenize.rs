//! Line/token splitting and numeric classification for line-oriented text formats.
//! Everything here is pure and borrows from the input.

/// Lines of `input`, split on `\n`, `\r\n` or a bare `\r`.
pub fn lines(input: &str) -> impl Iterator<Item = &str> {
    input
        .split('\n')
        .flat_map(|line| line.strip_suffix('\r').unwrap_or(line).split('\r'))
}

#[inline]
pub fn trim(line: &str) -> &str {
    line.trim()
}

/// Trim, then split on any run of whitespace (spaces and tabs alike).
pub fn tokens(line: &str) -> Vec<&str> {
    trim(line).split_whitespace().collect()
}

/// `true` if `token` is a (signed) integer.
pub fn is_numeric(token: &str) -> bool {
    parse_int(token).is_some()
}

/// `true` if `token` is a finite floating-point number.
pub fn is_float(token: &str) -> bool {
    parse_float(token).is_some()
}

pub fn parse_int(token: &str) -> Option<i64> {
    token.parse::<i64>().ok()
}

/// Finite `f32` or nothing; `inf`/`nan` spellings are rejected.
pub fn parse_float(token: &str) -> Option<f32> {
    token.parse::<f32>().ok().filter(|v| v.is_finite())
}
