//! Builtin block types
//!
//! Six block types covering every field kind. Renderers escape all plain
//! text and only emit URLs that pass [`is_safe_url`].

use super::{BlockCategory, BlockContext, BlockTypeDescriptor, PropAccess, Props, RenderError};
use crate::schema::{FieldSchema, SchemaMap};
use kapwa_core::security::{escape_html, escape_html_attr, is_safe_url};
use serde_json::json;

/// Descriptors of every builtin block type, in picker order
pub fn descriptors() -> Vec<BlockTypeDescriptor> {
	vec![
		hero(),
		rich_text_section(),
		card_grid(),
		steps(),
		announcement_banner(),
		needs_widget(),
	]
}

/// Page header with headline and call-to-action buttons
pub fn hero() -> BlockTypeDescriptor {
	let cta_schema = SchemaMap::from([
		("label".to_string(), FieldSchema::text("Button Text")),
		("href".to_string(), FieldSchema::text("Link URL")),
		(
			"variant".to_string(),
			FieldSchema::select(
				"Style",
				[("primary", "Primary"), ("secondary", "Secondary"), ("outline", "Outline")],
			),
		),
	]);

	BlockTypeDescriptor::new("hero", "Hero Section", BlockCategory::Layout, render_hero)
		.with_description("Large header section with headline and call-to-action")
		.with_icon("view_headline")
		.with_default_props(json!({
			"headline": "Welcome to Our Community",
			"subheadline": "Building connections that matter",
			"alignment": "center",
			"ctas": []
		}))
		.with_field("headline", FieldSchema::text("Headline").required())
		.with_field("subheadline", FieldSchema::textarea("Subheadline", Some(2)))
		.with_field("backgroundImage", FieldSchema::url("Background Image URL"))
		.with_field(
			"alignment",
			FieldSchema::select("Text Alignment", [("left", "Left"), ("center", "Center"), ("right", "Right")]),
		)
		.with_field(
			"ctas",
			FieldSchema::array(
				"Call-to-Action Buttons",
				Some(cta_schema),
				json!({"label": "Click Here", "href": "/", "variant": "primary"}),
			)
			.with_item_label("Button"),
		)
}

/// Free-form HTML section
pub fn rich_text_section() -> BlockTypeDescriptor {
	BlockTypeDescriptor::new(
		"rich_text_section",
		"Rich Text",
		BlockCategory::Content,
		render_rich_text_section,
	)
	.with_description("Formatted text content with headings and paragraphs")
	.with_icon("format_align_left")
	.with_default_props(json!({"content": "<p>Add your content here...</p>"}))
	.with_field("content", FieldSchema::richtext("Content (HTML)").required())
}

/// Grid of linkable cards
pub fn card_grid() -> BlockTypeDescriptor {
	let card_schema = SchemaMap::from([
		("title".to_string(), FieldSchema::text("Title")),
		("description".to_string(), FieldSchema::textarea("Description", None)),
		("imageUrl".to_string(), FieldSchema::url("Image URL")),
		("href".to_string(), FieldSchema::text("Link URL (optional)")),
	]);

	BlockTypeDescriptor::new("card_grid", "Card Grid", BlockCategory::Layout, render_card_grid)
		.with_description("Grid of cards with images, titles, and descriptions")
		.with_icon("grid_view")
		.with_default_props(json!({"heading": "Our Services", "columns": 3, "cards": []}))
		.with_field("heading", FieldSchema::text("Section Heading"))
		.with_field(
			"columns",
			FieldSchema::select("Columns", [("2", "2 Columns"), ("3", "3 Columns"), ("4", "4 Columns")]),
		)
		.with_field(
			"cards",
			FieldSchema::array(
				"Cards",
				Some(card_schema),
				json!({"title": "Card Title", "description": "", "imageUrl": ""}),
			)
			.with_item_label("Card"),
		)
}

/// Numbered process steps
pub fn steps() -> BlockTypeDescriptor {
	let step_schema = SchemaMap::from([
		("number".to_string(), FieldSchema::number("Step Number")),
		("title".to_string(), FieldSchema::text("Title")),
		("description".to_string(), FieldSchema::textarea("Description", None)),
	]);

	BlockTypeDescriptor::new("steps", "Steps", BlockCategory::Content, render_steps)
		.with_description("Numbered steps or process flow")
		.with_icon("format_list_numbered")
		.with_default_props(json!({
			"heading": "How It Works",
			"steps": [
				{"number": 1, "title": "Step 1", "description": "Description here"},
				{"number": 2, "title": "Step 2", "description": "Description here"},
				{"number": 3, "title": "Step 3", "description": "Description here"}
			]
		}))
		.with_field("heading", FieldSchema::text("Section Heading"))
		.with_field(
			"steps",
			FieldSchema::array(
				"Steps",
				Some(step_schema),
				json!({"number": 1, "title": "Step Title", "description": ""}),
			)
			.with_item_label("Step"),
		)
}

/// Dismissible notice strip
pub fn announcement_banner() -> BlockTypeDescriptor {
	BlockTypeDescriptor::new(
		"announcement_banner",
		"Announcement Banner",
		BlockCategory::Layout,
		render_announcement_banner,
	)
	.with_description("Dismissible announcement or alert")
	.with_icon("campaign")
	.with_default_props(json!({
		"message": "Important announcement here",
		"type": "info",
		"dismissible": true
	}))
	.with_field("message", FieldSchema::text("Message").required())
	.with_field(
		"type",
		FieldSchema::select(
			"Banner Type",
			[("info", "Info"), ("warning", "Warning"), ("success", "Success"), ("error", "Error")],
		),
	)
	.with_field("dismissible", FieldSchema::boolean("Allow dismiss"))
}

/// Live feed of community requests and offers
pub fn needs_widget() -> BlockTypeDescriptor {
	BlockTypeDescriptor::new("needs_widget", "Needs Widget", BlockCategory::Interactive, render_needs_widget)
		.with_description("Live feed of community help requests and offers")
		.with_icon("volunteer_activism")
		.with_default_props(json!({"heading": "Community Needs", "showType": "both", "limit": 6}))
		.with_field("heading", FieldSchema::text("Section Heading"))
		.with_field(
			"showType",
			FieldSchema::select(
				"Show",
				[
					("both", "Both Requests & Offers"),
					("request", "Requests Only"),
					("offer", "Offers Only"),
				],
			),
		)
		.with_field("limit", FieldSchema::number("Number of Items").with_range(1, 12))
}

/// `value` when it is one of `allowed`, else `fallback`
fn one_of<'a>(value: &str, allowed: &[&'a str], fallback: &'a str) -> &'a str {
	allowed
		.iter()
		.copied()
		.find(|candidate| *candidate == value)
		.unwrap_or(fallback)
}

/// Trimmed URL when it is non-empty and safe to emit
fn safe_url(props: &Props, key: &str) -> Option<String> {
	let url = props.text(key);
	let url = url.trim();
	(!url.is_empty() && is_safe_url(url)).then(|| url.to_string())
}

fn heading(props: &Props, key: &str, tag: &str, class: &str) -> String {
	let text = props.text(key);
	if text.trim().is_empty() {
		return String::new();
	}
	format!("<{tag} class=\"{class}\">{}</{tag}>", escape_html(&text))
}

fn render_hero(ctx: &BlockContext<'_>) -> Result<String, RenderError> {
	let props = ctx.props();
	let headline = props.required_text("headline")?;
	let alignment = one_of(&props.text("alignment"), &["left", "center", "right"], "center");

	let mut html = format!("<section class=\"kapwa-hero kapwa-hero--{alignment}\">");
	if let Some(background) = safe_url(props, "backgroundImage") {
		html.push_str(&format!(
			"<img class=\"kapwa-hero__background\" src=\"{}\" alt=\"\">",
			escape_html_attr(&background)
		));
	}
	html.push_str(&format!("<h1 class=\"kapwa-hero__headline\">{}</h1>", escape_html(&headline)));
	html.push_str(&heading(props, "subheadline", "p", "kapwa-hero__subheadline"));

	let ctas: Vec<String> = props.items("ctas").into_iter().filter_map(render_cta).collect();
	if !ctas.is_empty() {
		html.push_str("<div class=\"kapwa-hero__actions\">");
		html.push_str(&ctas.concat());
		html.push_str("</div>");
	}
	html.push_str("</section>");
	Ok(html)
}

fn render_cta(cta: &Props) -> Option<String> {
	let label = cta.text("label");
	if label.trim().is_empty() {
		return None;
	}
	let href = safe_url(cta, "href").unwrap_or_else(|| "#".to_string());
	let variant = one_of(&cta.text("variant"), &["primary", "secondary", "outline"], "primary");
	let target = if cta.flag("openInNewTab", false) {
		" target=\"_blank\" rel=\"noopener noreferrer\""
	} else {
		""
	};
	Some(format!(
		"<a class=\"kapwa-button kapwa-button--{variant}\" href=\"{}\"{target}>{}</a>",
		escape_html_attr(&href),
		escape_html(&label)
	))
}

fn render_rich_text_section(ctx: &BlockContext<'_>) -> Result<String, RenderError> {
	// content arrives sanitized
	Ok(format!(
		"<section class=\"kapwa-rich-text\">{}</section>",
		ctx.props().text("content")
	))
}

fn render_card_grid(ctx: &BlockContext<'_>) -> Result<String, RenderError> {
	let props = ctx.props();
	let columns = props.integer("columns", 3).clamp(1, 4);

	let mut html = String::from("<section class=\"kapwa-card-grid\">");
	html.push_str(&heading(props, "heading", "h2", "kapwa-card-grid__heading"));
	html.push_str(&format!("<div class=\"kapwa-card-grid__cards kapwa-columns-{columns}\">"));
	for card in props.items("cards") {
		html.push_str(&render_card(card));
	}
	html.push_str("</div></section>");
	Ok(html)
}

fn render_card(card: &Props) -> String {
	let title = card.text("title");
	let mut body = String::new();
	if let Some(image) = safe_url(card, "imageUrl") {
		body.push_str(&format!(
			"<img class=\"kapwa-card__image\" src=\"{}\" alt=\"{}\">",
			escape_html_attr(&image),
			escape_html_attr(&title)
		));
	}
	body.push_str(&format!("<h3 class=\"kapwa-card__title\">{}</h3>", escape_html(&title)));
	body.push_str(&heading(card, "description", "p", "kapwa-card__description"));

	match safe_url(card, "href") {
		Some(href) => format!(
			"<a class=\"kapwa-card\" href=\"{}\">{body}</a>",
			escape_html_attr(&href)
		),
		None => format!("<div class=\"kapwa-card\">{body}</div>"),
	}
}

fn render_steps(ctx: &BlockContext<'_>) -> Result<String, RenderError> {
	let props = ctx.props();

	let mut html = String::from("<section class=\"kapwa-steps\">");
	html.push_str(&heading(props, "heading", "h2", "kapwa-steps__heading"));
	html.push_str("<ol class=\"kapwa-steps__list\">");
	for (index, step) in props.items("steps").into_iter().enumerate() {
		let number = step.integer("number", index as i64 + 1);
		html.push_str(&format!(
			"<li class=\"kapwa-step\"><span class=\"kapwa-step__number\">{number}</span><h3 class=\"kapwa-step__title\">{}</h3>{}</li>",
			escape_html(&step.text("title")),
			heading(step, "description", "p", "kapwa-step__description")
		));
	}
	html.push_str("</ol></section>");
	Ok(html)
}

fn render_announcement_banner(ctx: &BlockContext<'_>) -> Result<String, RenderError> {
	let props = ctx.props();
	let kind = one_of(&props.text("type"), &["info", "warning", "success", "error"], "info");
	let role = if matches!(kind, "warning" | "error") {
		"alert"
	} else {
		"status"
	};

	let mut html = format!(
		"<div class=\"kapwa-banner kapwa-banner--{kind}\" role=\"{role}\"><p class=\"kapwa-banner__message\">{}</p>",
		escape_html(&props.text("message"))
	);
	if props.flag("dismissible", false) {
		html.push_str(
			"<button type=\"button\" class=\"kapwa-banner__dismiss\" aria-label=\"Dismiss announcement\">&times;</button>",
		);
	}
	html.push_str("</div>");
	Ok(html)
}

fn render_needs_widget(ctx: &BlockContext<'_>) -> Result<String, RenderError> {
	let props = ctx.props();
	let show_type = one_of(&props.text("showType"), &["both", "request", "offer"], "both");
	let limit = props.integer("limit", 6).clamp(1, 12);

	// The feed itself is filled in by the live widget on the client
	Ok(format!(
		"<section class=\"kapwa-needs\" data-show-type=\"{show_type}\" data-limit=\"{limit}\">{}<div class=\"kapwa-needs__feed\" aria-live=\"polite\"><p class=\"kapwa-needs__empty\">No community needs at the moment.</p></div></section>",
		heading(props, "heading", "h2", "kapwa-needs__heading")
	))
}
