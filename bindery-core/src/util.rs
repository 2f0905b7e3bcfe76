/// Largest prefix of `value` not longer than `len` bytes that ends on a char boundary.
pub fn floor_prefix(value: &str, len: usize) -> &str {
    if value.len() <= len {
        return value;
    }
    let mut end = len;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

/// Write `count` copies of `item` separated by `separator`.
pub fn repeat_separated(out: &mut String, item: &str, separator: &str, count: usize) {
    for i in 0..count {
        if i > 0 {
            out.push_str(separator);
        }
        out.push_str(item);
    }
}

#[macro_export]
/// Truncate long strings for logging and error messages purpose.
///
/// Returns a `format_args!` that yields at most 497 bytes from the start
/// of the input followed by `...` when truncation occurred.
///
/// If true is the second argument, it evaluates the first argument just once
/// and produces a `String`.
///
/// # Examples
/// ```
/// use bindery_core::truncate_long;
/// let short = "SELECT 1";
/// assert_eq!(format!("{}", truncate_long!(short)), "SELECT 1");
/// let long = format!("SELECT {}", "X".repeat(600));
/// let logged = format!("{}", truncate_long!(long));
/// assert!(logged.starts_with("SELECT XXXXXX"));
/// assert!(logged.ends_with("..."));
/// ```
macro_rules! truncate_long {
    ($query:expr) => {
        format_args!(
            "{}{}",
            $crate::floor_prefix(&$query, 497).trim(),
            if $query.len() > 497 { "..." } else { "" },
        )
    };
    ($query:expr,true) => {{
        let query = $query;
        format!(
            "{}{}",
            $crate::floor_prefix(&query, 497).trim(),
            if query.len() > 497 { "..." } else { "" },
        )
    }};
}
