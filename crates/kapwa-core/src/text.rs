//! Text helpers shared by the page builder

/// Convert text to a URL slug
///
/// Lowercases, turns every run of non-alphanumeric characters into a single
/// `-`, and trims dashes from both ends.
///
/// # Examples
///
/// ```
/// use kapwa_core::text::slugify;
///
/// assert_eq!(slugify("Hello World!"), "hello-world");
/// assert_eq!(slugify("  About  Us -- 2024 "), "about-us-2024");
/// assert_eq!(slugify("***"), "");
/// ```
pub fn slugify(text: &str) -> String {
	text.to_lowercase()
		.chars()
		.map(|ch| if ch.is_alphanumeric() { ch } else { '-' })
		.collect::<String>()
		.split('-')
		.filter(|s| !s.is_empty())
		.collect::<Vec<_>>()
		.join("-")
}

/// Keep the first `max_chars` characters, appending `...` when anything was cut
///
/// # Examples
///
/// ```
/// use kapwa_core::text::truncate_with_ellipsis;
///
/// assert_eq!(truncate_with_ellipsis("Hello World", 20), "Hello World");
/// assert_eq!(truncate_with_ellipsis("Hello World", 5), "Hello...");
/// ```
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
	match text.char_indices().nth(max_chars) {
		Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
		None => text.to_string(),
	}
}

/// Turn a property key into a form label
///
/// Underscores become spaces and the first letter of each word is
/// uppercased. Other characters are left untouched.
///
/// # Examples
///
/// ```
/// use kapwa_core::text::humanize_key;
///
/// assert_eq!(humanize_key("background_image"), "Background Image");
/// assert_eq!(humanize_key("showType"), "ShowType");
/// ```
pub fn humanize_key(key: &str) -> String {
	let mut label = String::with_capacity(key.len());
	let mut at_word_start = true;
	for ch in key.chars() {
		let ch = if ch == '_' { ' ' } else { ch };
		if at_word_start && ch.is_alphanumeric() {
			label.extend(ch.to_uppercase());
		} else {
			label.push(ch);
		}
		at_word_start = !ch.is_alphanumeric();
	}
	label
}
