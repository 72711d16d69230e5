//! XSS prevention utilities

use once_cell::sync::Lazy;
use regex::Regex;

/// Escape HTML special characters
///
/// # Examples
///
/// ```
/// use kapwa_core::security::escape_html;
///
/// let input = "<script>alert('XSS')</script>";
/// let escaped = escape_html(input);
/// assert_eq!(escaped, "&lt;script&gt;alert(&#x27;XSS&#x27;)&lt;/script&gt;");
/// ```
pub fn escape_html(input: &str) -> String {
	let mut out = String::with_capacity(input.len());
	for ch in input.chars() {
		match ch {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&#x27;"),
			_ => out.push(ch),
		}
	}
	out
}

/// Escape HTML attribute values
///
/// Same as [`escape_html`], with line breaks encoded as numeric references so
/// attribute values survive on a single line.
///
/// # Examples
///
/// ```
/// use kapwa_core::security::xss::escape_html_attr;
///
/// let attr = r#"value" onload="alert('xss')"#;
/// let escaped = escape_html_attr(attr);
/// assert!(escaped.contains("&quot;"));
/// assert!(escaped.contains("&#x27;"));
/// assert_eq!(escape_html_attr("a\nb"), "a&#10;b");
/// ```
pub fn escape_html_attr(input: &str) -> String {
	let mut out = String::with_capacity(input.len());
	for ch in input.chars() {
		match ch {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&#x27;"),
			'\n' => out.push_str("&#10;"),
			'\r' => out.push_str("&#13;"),
			_ => out.push(ch),
		}
	}
	out
}

/// Decode the character references produced by [`escape_html_attr`] and the
/// common named and numeric references found in hand-written markup.
///
/// Unknown named references are left as literal text.
///
/// # Examples
///
/// ```
/// use kapwa_core::security::xss::{decode_entities, escape_html_attr};
///
/// assert_eq!(decode_entities("a &amp; b"), "a & b");
/// assert_eq!(decode_entities("&#106;avascript"), "javascript");
/// assert_eq!(decode_entities("&unknown;"), "&unknown;");
///
/// let raw = "say \"hi\" & <go>\n";
/// assert_eq!(decode_entities(&escape_html_attr(raw)), raw);
/// ```
pub fn decode_entities(input: &str) -> String {
	let mut out = String::with_capacity(input.len());
	let mut rest = input;

	while let Some(pos) = rest.find('&') {
		out.push_str(&rest[..pos]);
		let tail = &rest[pos..];
		match tail.find(';').filter(|end| *end <= 12) {
			Some(end) => {
				let reference = &tail[1..end];
				match decode_reference(reference) {
					Some(ch) => {
						out.push(ch);
						rest = &tail[end + 1..];
					}
					None => {
						out.push('&');
						rest = &tail[1..];
					}
				}
			}
			None => {
				out.push('&');
				rest = &tail[1..];
			}
		}
	}
	out.push_str(rest);
	out
}

fn decode_reference(reference: &str) -> Option<char> {
	if let Some(numeric) = reference.strip_prefix('#') {
		let code = if let Some(hex) = numeric
			.strip_prefix('x')
			.or_else(|| numeric.strip_prefix('X'))
		{
			u32::from_str_radix(hex, 16).ok()?
		} else {
			numeric.parse::<u32>().ok()?
		};
		return match char::from_u32(code) {
			Some('\0') | None => Some('\u{FFFD}'),
			Some(ch) => Some(ch),
		};
	}

	match reference {
		"amp" => Some('&'),
		"lt" => Some('<'),
		"gt" => Some('>'),
		"quot" => Some('"'),
		"apos" => Some('\''),
		"nbsp" => Some('\u{a0}'),
		"colon" => Some(':'),
		"tab" => Some('\t'),
		"newline" => Some('\n'),
		_ => None,
	}
}

static DANGEROUS_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
	[
		// JavaScript protocol
		r"(?i)javascript:",
		// Data URI
		r"(?i)data:text/html",
		// VBScript (IE)
		r"(?i)vbscript:",
		// Event handlers
		r"(?i)\bon\w+\s*=",
		// Embedding tags
		r"(?i)<(iframe|embed|object|applet|meta|link|base)",
		r"(?i)<script",
	]
	.iter()
	.filter_map(|pattern| Regex::new(pattern).ok())
	.collect()
});

/// Detect dangerous patterns
///
/// Used for diagnostics only; sanitizing never relies on it.
///
/// # Examples
///
/// ```
/// use kapwa_core::security::xss::detect_xss_patterns;
///
/// assert!(detect_xss_patterns("<script>alert(1)</script>"));
/// assert!(detect_xss_patterns(r#"<img src=x onerror="alert(1)">"#));
/// assert!(detect_xss_patterns("javascript:alert(1)"));
/// assert!(!detect_xss_patterns("Safe text"));
/// ```
pub fn detect_xss_patterns(input: &str) -> bool {
	DANGEROUS_PATTERNS
		.iter()
		.any(|pattern| pattern.is_match(input))
}

/// Validate URLs and allow only safe protocols
///
/// Allows relative paths (`/path`, `./path`), anchor links (`#section`),
/// and safe protocols (`http://`, `https://`, `mailto:`, `ftp://`, `ftps://`).
///
/// Rejects dangerous protocols (`javascript:`, `data:`, `vbscript:`) and
/// path traversal prefixes (`../`).
///
/// # Examples
///
/// ```
/// use kapwa_core::security::xss::is_safe_url;
///
/// assert!(is_safe_url("https://example.com"));
/// assert!(is_safe_url("/path/to/page"));
/// assert!(is_safe_url("mailto:user@example.com"));
/// assert!(!is_safe_url("javascript:alert(1)"));
/// assert!(!is_safe_url("../parent/path"));
/// ```
pub fn is_safe_url(url: &str) -> bool {
	let url_lower = url.to_lowercase();

	// Relative URLs and anchors, never parent traversal
	if url.starts_with('/') || url.starts_with("./") || url.starts_with('#') {
		return true;
	}

	let safe_protocols = ["http://", "https://", "mailto:", "ftp://", "ftps://"];

	safe_protocols
		.iter()
		.any(|protocol| url_lower.starts_with(protocol))
}

/// Strip HTML tags with proper handling of malformed HTML
///
/// Handles `>` inside quoted attributes, unclosed tags at end of input and
/// HTML comments. Text is returned as-is; entities are not decoded.
///
/// # Examples
///
/// ```
/// use kapwa_core::security::xss::strip_tags_safe;
///
/// assert_eq!(strip_tags_safe("<p>Hello <b>World</b></p>"), "Hello World");
/// assert_eq!(strip_tags_safe(r#"<a title="x>y">Link</a>"#), "Link");
/// assert_eq!(strip_tags_safe("Hello<!-- comment -->World"), "HelloWorld");
/// assert_eq!(strip_tags_safe("Hello<br"), "Hello");
/// ```
pub fn strip_tags_safe(html: &str) -> String {
	let mut result = String::with_capacity(html.len());
	let chars: Vec<char> = html.chars().collect();
	let len = chars.len();
	let mut i = 0;

	while i < len {
		if chars[i] != '<' {
			result.push(chars[i]);
			i += 1;
			continue;
		}

		if chars[i..].starts_with(&['<', '!', '-', '-']) {
			match find_seq(&chars, i + 4, &['-', '-', '>']) {
				Some(end) => {
					i = end + 3;
					continue;
				}
				None => break,
			}
		}

		// Skip to the matching '>' while respecting quotes
		i += 1;
		let mut in_single_quote = false;
		let mut in_double_quote = false;
		while i < len {
			match chars[i] {
				'"' if !in_single_quote => in_double_quote = !in_double_quote,
				'\'' if !in_double_quote => in_single_quote = !in_single_quote,
				'>' if !in_single_quote && !in_double_quote => {
					i += 1;
					break;
				}
				_ => {}
			}
			i += 1;
		}
	}
	result
}

pub(crate) fn find_seq(chars: &[char], from: usize, needle: &[char]) -> Option<usize> {
	if from >= chars.len() {
		return None;
	}
	chars[from..]
		.windows(needle.len())
		.position(|window| window == needle)
		.map(|pos| pos + from)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[test]
	fn test_escape_html() {
		assert_eq!(
			escape_html("<script>alert('xss')</script>"),
			"&lt;script&gt;alert(&#x27;xss&#x27;)&lt;/script&gt;"
		);
		assert_eq!(escape_html("Tom & Jerry"), "Tom &amp; Jerry");
	}

	#[test]
	fn test_escape_html_attr_line_breaks() {
		assert_eq!(escape_html_attr("a\r\nb"), "a&#13;&#10;b");
	}

	#[rstest]
	#[case("&amp;&lt;&gt;&quot;&#x27;&#39;", "&<>\"''")]
	#[case("&#x6A;ava", "java")]
	#[case("&#X6A;ava", "java")]
	#[case("no refs", "no refs")]
	#[case("dangling &", "dangling &")]
	#[case("&#0;", "\u{FFFD}")]
	#[case("&verylongentityname;", "&verylongentityname;")]
	fn test_decode_entities(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(decode_entities(input), expected);
	}

	#[test]
	fn test_detect_xss_patterns() {
		assert!(detect_xss_patterns("<iframe src='evil.com'>"));
		assert!(!detect_xss_patterns("Normal <b>HTML</b>"));
		assert!(!detect_xss_patterns("Phone: 555-1234"));
	}

	#[rstest]
	#[case("https://example.com", true)]
	#[case("http://example.com", true)]
	#[case("/path/to/page", true)]
	#[case("./relative/path", true)]
	#[case("#section", true)]
	#[case("mailto:user@example.com", true)]
	#[case("HTTPS://EXAMPLE.COM", true)]
	#[case("../parent/path", false)]
	#[case("javascript:alert(1)", false)]
	#[case("data:text/html,<script>alert(1)</script>", false)]
	#[case("vbscript:alert(1)", false)]
	#[case("", false)]
	fn test_is_safe_url(#[case] url: &str, #[case] expected: bool) {
		assert_eq!(is_safe_url(url), expected);
	}

	#[test]
	fn test_strip_tags_safe_quoted_attributes() {
		assert_eq!(strip_tags_safe("<a title='x>y'>Link</a>"), "Link");
		assert_eq!(
			strip_tags_safe(r#"<a title="a>b" href="c>d">Text</a>"#),
			"Text"
		);
	}

	#[test]
	fn test_strip_tags_safe_comments() {
		assert_eq!(strip_tags_safe("A<!-- multi\nline -->B"), "AB");
		assert_eq!(strip_tags_safe("Hello<!-- unclosed"), "Hello");
	}

	#[test]
	fn test_find_seq() {
		let chars: Vec<char> = "ab-->cd".chars().collect();
		assert_eq!(find_seq(&chars, 0, &['-', '-', '>']), Some(2));
		assert_eq!(find_seq(&chars, 3, &['-', '-', '>']), None);
		assert_eq!(find_seq(&chars, 10, &['-']), None);
	}
}
