//! Well-known current form and file type values.

pub const UNKNOWN: &str = "UNKNOWN";
pub const ERROR: &str = "ERROR";
pub const DONE: &str = "DONE";
pub const EMPTY: &str = "EMPTY_SESSION";

pub const TEXT: &str = "TEXT";
pub const HTML: &str = "HTML";

/// Prefix for language forms, e.g. `LANG-ENGLISH`.
pub const PREFIXES_LANG: &str = "LANG-";

/// Suffix for html-escaped variants of a form.
pub const SUFFIXES_HTMLESC: &str = "-HTMLESC";
