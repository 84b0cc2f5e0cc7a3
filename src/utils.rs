//! # Utility Functions Module
//!
//! Small helpers for building external tool command lines.

/// Converts any iterable of string-like items to `Vec<String>`.
///
/// Tool arguments mix literals, numbers and paths; this keeps the call sites
/// free of `.to_string()` noise.
///
/// # Example
/// ```rust
/// use image_mirror_optimizer::utils::to_string_vec;
///
/// let args = to_string_vec(["--strip-all", "--quiet"]);
/// assert_eq!(args, vec!["--strip-all".to_string(), "--quiet".to_string()]);
/// ```
pub fn to_string_vec<T, I>(items: I) -> Vec<String>
where
    T: ToString,
    I: IntoIterator<Item = T>,
{
    items.into_iter().map(|item| item.to_string()).collect()
}

/// Build an argument vector from heterogeneous items.
///
/// ```rust
/// use image_mirror_optimizer::args;
///
/// let level = 2;
/// let args = args!["-o", level];
/// assert_eq!(args, vec!["-o".to_string(), "2".to_string()]);
/// ```
#[macro_export]
macro_rules! args {
    [] => {
        ::std::vec::Vec::<::std::string::String>::new()
    };
    [$($item:expr),+ $(,)?] => {
        vec![$($item.to_string()),+]
    };
}
