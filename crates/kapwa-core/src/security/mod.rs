//! HTML security helpers: escaping, URL checks and the allow-list sanitizer

pub mod sanitizer;
pub mod xss;

pub use sanitizer::{HtmlSanitizer, SanitizerError, SanitizerPolicy, sanitize_html};
pub use xss::{escape_html, escape_html_attr, is_safe_url, strip_tags_safe};
