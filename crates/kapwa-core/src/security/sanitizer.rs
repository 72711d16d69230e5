//! Allow-list HTML sanitizer
//!
//! Rich text authored in the page builder is untrusted. [`HtmlSanitizer`]
//! re-emits only allow-listed elements and attributes, unwraps every other
//! element (its text survives), and drops script-capable elements together
//! with their content. The output is well-formed: every element it opens is
//! closed, stray end tags disappear, and text is entity-safe.
//!
//! Sanitizing is idempotent: `sanitize(sanitize(x)) == sanitize(x)`.

use super::xss::{decode_entities, escape_html_attr, find_seq, is_safe_url};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Elements allowed by default
pub const DEFAULT_ALLOWED_TAGS: &[&str] = &[
	"h1",
	"h2",
	"h3",
	"h4",
	"h5",
	"h6",
	"p",
	"br",
	"hr",
	"ul",
	"ol",
	"li",
	"a",
	"strong",
	"b",
	"em",
	"i",
	"u",
	"s",
	"blockquote",
	"code",
	"pre",
	"table",
	"thead",
	"tbody",
	"tr",
	"th",
	"td",
	"img",
	"figure",
	"figcaption",
	"div",
	"span",
];

/// Attributes allowed by default
pub const DEFAULT_ALLOWED_ATTRIBUTES: &[&str] = &[
	"href", "target", "rel", "src", "alt", "title", "width", "height", "class", "id",
];

/// Elements removed together with everything inside them
const DROP_WITH_CONTENT: &[&str] = &[
	"script", "style", "iframe", "object", "embed", "noscript", "template", "textarea", "title",
	"xmp", "noembed", "noframes", "svg", "math", "select", "applet",
];

const FORBIDDEN_TAGS: &[&str] = &["base", "meta", "link", "form", "input", "button", "frame", "frameset"];

const VOID_ELEMENTS: &[&str] = &[
	"area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
	"track", "wbr",
];

const URL_ATTRIBUTES: &[&str] = &["href", "src"];

const FORBIDDEN_ATTRIBUTES: &[&str] = &["style", "srcdoc", "formaction", "xmlns"];

/// Errors raised when building a sanitizer from an allow-list
#[non_exhaustive]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SanitizerError {
	/// The element can execute script or embed foreign documents
	#[error("Element cannot be allow-listed: {0}")]
	ForbiddenTag(String),

	/// The attribute is an event handler or otherwise script-bearing
	#[error("Attribute cannot be allow-listed: {0}")]
	ForbiddenAttribute(String),
}

/// Allow-list configuration for [`HtmlSanitizer`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizerPolicy {
	/// Element names kept in the output
	pub allowed_tags: Vec<String>,
	/// Attribute names kept on allowed elements
	pub allowed_attributes: Vec<String>,
}

impl Default for SanitizerPolicy {
	fn default() -> Self {
		Self {
			allowed_tags: DEFAULT_ALLOWED_TAGS.iter().map(|t| t.to_string()).collect(),
			allowed_attributes: DEFAULT_ALLOWED_ATTRIBUTES
				.iter()
				.map(|a| a.to_string())
				.collect(),
		}
	}
}

/// Allow-list HTML sanitizer
///
/// # Examples
///
/// ```
/// use kapwa_core::security::HtmlSanitizer;
///
/// let sanitizer = HtmlSanitizer::new();
/// assert_eq!(
///     sanitizer.sanitize("<p>hi</p><script>alert(1)</script>"),
///     "<p>hi</p>"
/// );
/// assert_eq!(
///     sanitizer.sanitize(r#"<a href="javascript:alert(1)" onclick="x()">go</a>"#),
///     "<a>go</a>"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct HtmlSanitizer {
	tags: HashSet<String>,
	attributes: HashSet<String>,
}

impl HtmlSanitizer {
	/// Sanitizer using the default allow-lists
	pub fn new() -> Self {
		Self {
			tags: DEFAULT_ALLOWED_TAGS.iter().map(|t| t.to_string()).collect(),
			attributes: DEFAULT_ALLOWED_ATTRIBUTES
				.iter()
				.map(|a| a.to_string())
				.collect(),
		}
	}

	/// Build a sanitizer from a policy
	///
	/// Names are matched case-insensitively. Script-capable elements and
	/// event-handler attributes are rejected.
	///
	/// # Examples
	///
	/// ```
	/// use kapwa_core::security::{HtmlSanitizer, SanitizerError, SanitizerPolicy};
	///
	/// let policy = SanitizerPolicy {
	///     allowed_tags: vec!["p".into(), "script".into()],
	///     allowed_attributes: vec![],
	/// };
	/// assert_eq!(
	///     HtmlSanitizer::from_policy(&policy).unwrap_err(),
	///     SanitizerError::ForbiddenTag("script".into())
	/// );
	/// ```
	pub fn from_policy(policy: &SanitizerPolicy) -> Result<Self, SanitizerError> {
		let mut tags = HashSet::new();
		for tag in &policy.allowed_tags {
			let tag = tag.trim().to_ascii_lowercase();
			if DROP_WITH_CONTENT.contains(&tag.as_str()) || FORBIDDEN_TAGS.contains(&tag.as_str()) {
				return Err(SanitizerError::ForbiddenTag(tag));
			}
			tags.insert(tag);
		}

		let mut attributes = HashSet::new();
		for attribute in &policy.allowed_attributes {
			let attribute = attribute.trim().to_ascii_lowercase();
			if attribute.starts_with("on") || FORBIDDEN_ATTRIBUTES.contains(&attribute.as_str()) {
				return Err(SanitizerError::ForbiddenAttribute(attribute));
			}
			attributes.insert(attribute);
		}

		Ok(Self { tags, attributes })
	}

	/// Whether `tag` survives sanitizing
	pub fn allows_tag(&self, tag: &str) -> bool {
		self.tags.contains(&tag.to_ascii_lowercase())
	}

	/// Whether `attribute` survives on allowed elements
	pub fn allows_attribute(&self, attribute: &str) -> bool {
		self.attributes.contains(&attribute.to_ascii_lowercase())
	}

	/// Sanitize an HTML fragment
	pub fn sanitize(&self, input: &str) -> String {
		let chars: Vec<char> = input.chars().filter(|c| *c != '\0').collect();
		let mut out = String::with_capacity(input.len());
		let mut open: Vec<String> = Vec::new();
		let len = chars.len();
		let mut i = 0;

		while i < len {
			match chars[i] {
				'<' => {
					let next = chars.get(i + 1).copied();
					i = match next {
						Some('!') if chars[i..].starts_with(&['<', '!', '-', '-']) => {
							match find_seq(&chars, i + 4, &['-', '-', '>']) {
								Some(end) => end + 3,
								None => len,
							}
						}
						Some('!') | Some('?') => find_from(&chars, i, '>').map_or(len, |p| p + 1),
						Some('/') => self.end_tag(&chars, i, &mut open, &mut out),
						Some(c) if c.is_ascii_alphabetic() => {
							self.start_tag(&chars, i, &mut open, &mut out)
						}
						_ => {
							out.push_str("&lt;");
							i + 1
						}
					};
				}
				'&' => match entity_len(&chars[i..]) {
					Some(n) => {
						out.extend(&chars[i..i + n]);
						i += n;
					}
					None => {
						out.push_str("&amp;");
						i += 1;
					}
				},
				'>' => {
					out.push_str("&gt;");
					i += 1;
				}
				c => {
					out.push(c);
					i += 1;
				}
			}
		}

		while let Some(tag) = open.pop() {
			push_end_tag(&mut out, &tag);
		}
		out
	}

	fn end_tag(&self, chars: &[char], start: usize, open: &mut Vec<String>, out: &mut String) -> usize {
		let name_start = start + 2;
		match chars.get(name_start) {
			Some(c) if c.is_ascii_alphabetic() => {}
			Some('>') => return name_start + 1,
			// Bogus comment
			_ => return find_from(chars, start, '>').map_or(chars.len(), |p| p + 1),
		}

		let (name, after_name) = read_name(chars, name_start);
		// Unterminated end tag swallows the rest of the input
		let Some(close) = find_from(chars, after_name, '>') else {
			return chars.len();
		};
		let end = close + 1;

		if let Some(pos) = open.iter().rposition(|tag| *tag == name) {
			while open.len() > pos {
				if let Some(tag) = open.pop() {
					push_end_tag(out, &tag);
				}
			}
		}
		end
	}

	fn start_tag(&self, chars: &[char], start: usize, open: &mut Vec<String>, out: &mut String) -> usize {
		let (name, after_name) = read_name(chars, start + 1);
		let Some(tag) = parse_attributes(chars, after_name) else {
			return chars.len();
		};

		if DROP_WITH_CONTENT.contains(&name.as_str()) {
			tracing::debug!(tag = %name, "dropping element with content");
			if tag.self_closing {
				return tag.end;
			}
			return skip_raw_text(chars, tag.end, &name);
		}

		if !self.tags.contains(&name) {
			return tag.end;
		}

		out.push('<');
		out.push_str(&name);
		let mut seen: HashSet<&str> = HashSet::new();
		let mut target_blank = false;
		let mut has_rel = false;
		for (attr, value) in &tag.attributes {
			if !seen.insert(attr.as_str()) || !self.is_attribute_allowed(attr) {
				continue;
			}
			let value = value.trim();
			if URL_ATTRIBUTES.contains(&attr.as_str()) {
				let compact: String = value
					.chars()
					.filter(|c| !c.is_whitespace() && !c.is_control())
					.collect();
				if !is_safe_url(&compact) {
					tracing::debug!(tag = %name, attribute = %attr, "dropping unsafe url");
					continue;
				}
			}
			if attr == "target" && value.eq_ignore_ascii_case("_blank") {
				target_blank = true;
			}
			if attr == "rel" {
				if value.is_empty() {
					continue;
				}
				has_rel = true;
			}
			out.push(' ');
			out.push_str(attr);
			out.push_str("=\"");
			out.push_str(&escape_html_attr(value));
			out.push('"');
		}
		if name == "a" && target_blank && !has_rel {
			out.push_str(" rel=\"noopener noreferrer\"");
		}
		out.push('>');

		if VOID_ELEMENTS.contains(&name.as_str()) {
			// Nothing to close
		} else if tag.self_closing {
			push_end_tag(out, &name);
		} else {
			open.push(name);
		}
		tag.end
	}

	fn is_attribute_allowed(&self, attr: &str) -> bool {
		!attr.starts_with("on")
			&& !FORBIDDEN_ATTRIBUTES.contains(&attr)
			&& attr
				.chars()
				.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
			&& self.attributes.contains(attr)
	}
}

impl Default for HtmlSanitizer {
	fn default() -> Self {
		Self::new()
	}
}

static DEFAULT_SANITIZER: Lazy<HtmlSanitizer> = Lazy::new(HtmlSanitizer::new);

/// Sanitize with the default allow-lists
///
/// # Examples
///
/// ```
/// use kapwa_core::security::sanitize_html;
///
/// assert_eq!(sanitize_html("<p onclick=\"x()\">Hi <blink>there</blink></p>"), "<p>Hi there</p>");
/// ```
pub fn sanitize_html(input: &str) -> String {
	DEFAULT_SANITIZER.sanitize(input)
}

struct ParsedTag {
	attributes: Vec<(String, String)>,
	self_closing: bool,
	/// Index just past the closing `>`
	end: usize,
}

fn push_end_tag(out: &mut String, tag: &str) {
	out.push_str("</");
	out.push_str(tag);
	out.push('>');
}

fn read_name(chars: &[char], from: usize) -> (String, usize) {
	let mut i = from;
	let mut name = String::new();
	while i < chars.len() && !chars[i].is_whitespace() && chars[i] != '/' && chars[i] != '>' {
		name.push(chars[i].to_ascii_lowercase());
		i += 1;
	}
	(name, i)
}

fn find_from(chars: &[char], from: usize, ch: char) -> Option<usize> {
	chars
		.get(from..)?
		.iter()
		.position(|c| *c == ch)
		.map(|pos| pos + from)
}

/// Parse attributes up to the closing `>`; `None` when the tag never closes
fn parse_attributes(chars: &[char], from: usize) -> Option<ParsedTag> {
	let len = chars.len();
	let mut i = from;
	let mut attributes = Vec::new();
	let mut self_closing = false;

	loop {
		while i < len && (chars[i].is_whitespace() || chars[i] == '/') {
			if chars[i] == '/' && chars.get(i + 1) == Some(&'>') {
				self_closing = true;
			}
			i += 1;
		}
		if i >= len {
			return None;
		}
		if chars[i] == '>' {
			return Some(ParsedTag {
				attributes,
				self_closing,
				end: i + 1,
			});
		}
		self_closing = false;

		let mut name = String::new();
		name.push(chars[i].to_ascii_lowercase());
		i += 1;
		while i < len
			&& !chars[i].is_whitespace()
			&& chars[i] != '/'
			&& chars[i] != '>'
			&& chars[i] != '='
		{
			name.push(chars[i].to_ascii_lowercase());
			i += 1;
		}
		while i < len && chars[i].is_whitespace() {
			i += 1;
		}

		let mut value = String::new();
		if i < len && chars[i] == '=' {
			i += 1;
			while i < len && chars[i].is_whitespace() {
				i += 1;
			}
			match chars.get(i) {
				Some(&quote) if quote == '"' || quote == '\'' => {
					let close = chars[i + 1..].iter().position(|c| *c == quote)?;
					value = chars[i + 1..i + 1 + close].iter().collect();
					i += close + 2;
				}
				Some(_) => {
					while i < len && !chars[i].is_whitespace() && chars[i] != '>' {
						value.push(chars[i]);
						i += 1;
					}
				}
				None => return None,
			}
		}
		attributes.push((name, decode_entities(&value)));
	}
}

/// Skip the content of a raw-text element through its end tag
fn skip_raw_text(chars: &[char], from: usize, name: &str) -> usize {
	let needle: Vec<char> = format!("</{}", name).chars().collect();
	let mut i = from;
	while i + needle.len() <= chars.len() {
		let candidate = &chars[i..i + needle.len()];
		let matches = candidate
			.iter()
			.zip(needle.iter())
			.all(|(a, b)| a.to_ascii_lowercase() == *b);
		let boundary = chars
			.get(i + needle.len())
			.is_none_or(|c| c.is_whitespace() || *c == '>' || *c == '/');
		if matches && boundary {
			return find_from(chars, i + needle.len(), '>').map_or(chars.len(), |p| p + 1);
		}
		i += 1;
	}
	chars.len()
}

/// Length of a well-formed character reference at the start of `chars`
fn entity_len(chars: &[char]) -> Option<usize> {
	let mut i = 1;
	if chars.get(i) == Some(&'#') {
		i += 1;
		let hex = matches!(chars.get(i), Some('x') | Some('X'));
		if hex {
			i += 1;
		}
		let digits_start = i;
		let is_digit = |c: char| {
			if hex {
				c.is_ascii_hexdigit()
			} else {
				c.is_ascii_digit()
			}
		};
		while i < chars.len() && is_digit(chars[i]) {
			i += 1;
		}
		if i == digits_start || i - digits_start > 8 {
			return None;
		}
	} else {
		let name_start = i;
		while i < chars.len() && chars[i].is_ascii_alphanumeric() {
			i += 1;
		}
		if i == name_start || i - name_start > 32 {
			return None;
		}
	}
	(chars.get(i) == Some(&';')).then_some(i + 1)
}
