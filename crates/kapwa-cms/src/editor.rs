//! Document editor
//!
//! Owns the live [`PageDocument`] of an editing session. Every mutation
//! builds a new document and swaps it in, so callers can detect change by
//! comparing [`DocumentEditor::snapshot`] pointers and undo is a matter of
//! keeping old snapshots around.
//!
//! Transient UI state lives next to the document: the selected block, the
//! view mode, the drag-reorder state machine and the dirty flag.

use crate::admin::PropertyEditor;
use crate::blocks::{Block, BlockId, BlockRegistry, Props, new_block_id};
use crate::error::{CmsError, CmsResult, SAVE_FAILED_MESSAGE};
use crate::pages::{PageDocument, PageStatus, PageUpdate};
use crate::persistence::{PageStore, SaveCoordinator, SaveOutcome};
use kapwa_conf::EditorSettings;
use kapwa_core::security::strip_tags_safe;
use kapwa_core::text::truncate_with_ellipsis;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Message used when publishing fails without details
pub const PUBLISH_FAILED_MESSAGE: &str = "Failed to publish page.";

/// Preview text of a block with nothing to show
pub const EMPTY_PREVIEW: &str = "Click to edit...";

/// Canvas mode of the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
	/// Block cards with the property editor
	#[default]
	Edit,
	/// Rendered page
	Preview,
}

/// Drag-reorder state machine
///
/// `Idle -> Dragging -> DragOver -> Idle`. Ending a drag commits a move only
/// from `DragOver`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
	/// No drag in progress
	#[default]
	Idle,
	/// A block is being dragged but has not crossed another block
	Dragging {
		/// Index of the dragged block
		source: usize,
	},
	/// The dragged block last crossed the block at `target`
	DragOver {
		/// Index of the dragged block
		source: usize,
		/// Index it will move to
		target: usize,
	},
}

impl DragState {
	/// Index of the dragged block
	pub fn source(&self) -> Option<usize> {
		match self {
			Self::Idle => None,
			Self::Dragging { source } | Self::DragOver { source, .. } => Some(*source),
		}
	}

	/// Recorded drop target
	pub fn target(&self) -> Option<usize> {
		match self {
			Self::DragOver { target, .. } => Some(*target),
			_ => None,
		}
	}
}

/// Summary of one block for the editing canvas
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockCard {
	/// Block id
	pub id: BlockId,
	/// Raw type id
	pub block_type: String,
	/// Display name, the raw type id when unregistered
	pub display_name: String,
	/// Position in the document
	pub index: usize,
	/// Whether the type is registered
	pub registered: bool,
	/// Whether the block is selected
	pub selected: bool,
	/// Whether the block is being dragged
	pub dragging: bool,
	/// Whether the dragged block last crossed this one
	pub drag_over: bool,
	/// Whether `move_up` would move it
	pub can_move_up: bool,
	/// Whether `move_down` would move it
	pub can_move_down: bool,
	/// Short text preview of the content
	pub preview: String,
}

/// Editing session over one page document
pub struct DocumentEditor {
	document: Arc<PageDocument>,
	registry: Arc<BlockRegistry>,
	selected: Option<BlockId>,
	view_mode: ViewMode,
	drag: DragState,
	dirty: bool,
	revision: u64,
	status_revision: u64,
	retired_ids: HashSet<BlockId>,
	undo: VecDeque<Arc<PageDocument>>,
	redo: Vec<Arc<PageDocument>>,
	history_limit: usize,
	preview_length: usize,
}

impl DocumentEditor {
	/// Editor with default settings
	pub fn new(document: PageDocument, registry: Arc<BlockRegistry>) -> Self {
		Self::with_settings(document, registry, &EditorSettings::default())
	}

	/// Editor with explicit settings
	pub fn with_settings(document: PageDocument, registry: Arc<BlockRegistry>, settings: &EditorSettings) -> Self {
		Self {
			document: Arc::new(document),
			registry,
			selected: None,
			view_mode: ViewMode::Edit,
			drag: DragState::Idle,
			dirty: false,
			revision: 0,
			status_revision: 0,
			retired_ids: HashSet::new(),
			undo: VecDeque::new(),
			redo: Vec::new(),
			history_limit: settings.history_limit,
			preview_length: settings.preview_length,
		}
	}

	/// Current document
	pub fn document(&self) -> &PageDocument {
		&self.document
	}

	/// Shared handle to the current document state
	pub fn snapshot(&self) -> Arc<PageDocument> {
		self.document.clone()
	}

	/// Registry the editor resolves block types in
	pub fn registry(&self) -> &BlockRegistry {
		&self.registry
	}

	/// Selected block id
	pub fn selected(&self) -> Option<&str> {
		self.selected.as_deref()
	}

	/// Selected block
	pub fn selected_block(&self) -> Option<&Block> {
		self.selected
			.as_deref()
			.and_then(|id| self.document.block(id))
	}

	/// Current view mode
	pub fn view_mode(&self) -> ViewMode {
		self.view_mode
	}

	/// Current drag state
	pub fn drag_state(&self) -> DragState {
		self.drag
	}

	/// Whether there are unsaved changes
	pub fn is_dirty(&self) -> bool {
		self.dirty
	}

	/// Counter bumped by every change to the document
	pub fn revision(&self) -> u64 {
		self.revision
	}

	/// Whether [`undo`](Self::undo) would do anything
	pub fn can_undo(&self) -> bool {
		!self.undo.is_empty()
	}

	/// Whether [`redo`](Self::redo) would do anything
	pub fn can_redo(&self) -> bool {
		!self.redo.is_empty()
	}

	fn commit(&mut self, document: PageDocument) {
		let status_changed = document.status != self.document.status;
		let previous = std::mem::replace(&mut self.document, Arc::new(document));
		if self.history_limit > 0 {
			self.undo.push_back(previous);
			while self.undo.len() > self.history_limit {
				self.undo.pop_front();
			}
		}
		self.redo.clear();
		self.touch();
		if status_changed {
			self.status_revision = self.revision;
		}
	}

	fn touch(&mut self) {
		self.dirty = true;
		self.revision += 1;
	}

	fn mint_id(&self) -> BlockId {
		loop {
			let id = new_block_id();
			if !self.retired_ids.contains(&id) && self.document.block_index(&id).is_none() {
				return id;
			}
		}
	}

	/// Insert a new block of `type_id` at `index`, clamped to the document
	///
	/// Unregistered types leave the document untouched and return `None`.
	/// The new block is selected.
	pub fn insert_block(&mut self, index: usize, type_id: &str) -> Option<BlockId> {
		let Some(descriptor) = self.registry.lookup(type_id) else {
			debug!(block_type = %type_id, "Ignoring insert of unregistered block type");
			return None;
		};

		let id = self.mint_id();
		let block = Block::with_id(id.clone(), type_id, descriptor.default_props.clone());
		let mut next = (*self.document).clone();
		let index = index.min(next.blocks.len());
		next.blocks.insert(index, block);

		self.drag = DragState::Idle;
		self.commit(next);
		self.selected = Some(id.clone());
		debug!(block_id = %id, block_type = %type_id, index, "Inserted block");
		Some(id)
	}

	/// Remove the block with `id`; returns whether one was removed
	pub fn delete_block(&mut self, id: &str) -> bool {
		let Some(index) = self.document.block_index(id) else {
			return false;
		};

		let mut next = (*self.document).clone();
		let removed = next.blocks.remove(index);
		self.retired_ids.insert(removed.id);

		if self.selected.as_deref() == Some(id) {
			self.selected = None;
		}
		self.drag = DragState::Idle;
		self.commit(next);
		debug!(block_id = %id, index, "Deleted block");
		true
	}

	/// Move the block at `from` to `to`, shifting the blocks in between
	///
	/// `to` is clamped to the last index. Returns whether anything moved.
	pub fn move_block(&mut self, from: usize, to: usize) -> bool {
		let len = self.document.blocks.len();
		if from >= len {
			return false;
		}
		let to = to.min(len - 1);
		if from == to {
			return false;
		}

		let mut next = (*self.document).clone();
		let block = next.blocks.remove(from);
		next.blocks.insert(to, block);
		self.drag = DragState::Idle;
		self.commit(next);
		debug!(from, to, "Moved block");
		true
	}

	/// Move the block with `id` one place up
	pub fn move_up(&mut self, id: &str) -> bool {
		match self.document.block_index(id) {
			Some(index) if index > 0 => self.move_block(index, index - 1),
			_ => false,
		}
	}

	/// Move the block with `id` one place down
	pub fn move_down(&mut self, id: &str) -> bool {
		match self.document.block_index(id) {
			Some(index) => self.move_block(index, index + 1),
			None => false,
		}
	}

	/// Replace the whole props bag of the block with `id`
	///
	/// Returns whether the block exists. Identical props mark the editor
	/// dirty without producing a new document state.
	pub fn update_props(&mut self, id: &str, props: Props) -> bool {
		let Some(index) = self.document.block_index(id) else {
			return false;
		};
		if self.document.blocks[index].props == props {
			self.dirty = true;
			return true;
		}

		let mut next = (*self.document).clone();
		next.blocks[index].props = props;
		self.commit(next);
		true
	}

	/// Edit one field of a block through its property editor
	///
	/// Returns whether the document changed hands to a new props bag; values
	/// the field rejects are ignored.
	pub fn edit_field(&mut self, id: &str, key: &str, value: Value) -> bool {
		let props = {
			let Some(block) = self.document.block(id) else {
				return false;
			};
			PropertyEditor::new(block, &self.registry).set_field(key, value)
		};
		match props {
			Some(props) => self.update_props(id, props),
			None => false,
		}
	}

	/// Property editor for the selected block, available in edit mode
	pub fn property_editor(&self) -> Option<PropertyEditor<'_>> {
		if self.view_mode != ViewMode::Edit {
			return None;
		}
		self.selected_block()
			.map(|block| PropertyEditor::new(block, &self.registry))
	}

	/// Select a block, or clear the selection with `None`
	///
	/// Ids not in the document are ignored.
	pub fn select_block(&mut self, id: Option<&str>) {
		match id {
			None => self.selected = None,
			Some(id) if self.document.block_index(id).is_some() => self.selected = Some(id.to_string()),
			Some(id) => debug!(block_id = %id, "Ignoring selection of unknown block"),
		}
	}

	/// Switch between editing and previewing
	pub fn set_view_mode(&mut self, mode: ViewMode) {
		self.view_mode = mode;
	}

	/// Start dragging the block at `index`
	pub fn drag_start(&mut self, index: usize) {
		if index < self.document.blocks.len() {
			self.drag = DragState::Dragging { source: index };
		}
	}

	/// Record the block the pointer is over
	///
	/// Only targets other than the source are recorded.
	pub fn drag_over(&mut self, index: usize) {
		let Some(source) = self.drag.source() else {
			return;
		};
		if index != source && index < self.document.blocks.len() {
			self.drag = DragState::DragOver { source, target: index };
		}
	}

	/// Finish the drag, moving the block when a target was recorded
	///
	/// Always returns to [`DragState::Idle`]. Returns whether a move happened.
	pub fn drag_end(&mut self) -> bool {
		let state = std::mem::take(&mut self.drag);
		match state {
			DragState::DragOver { source, target } => self.move_block(source, target),
			_ => false,
		}
	}

	/// Abandon the drag without moving anything
	pub fn drag_cancel(&mut self) {
		self.drag = DragState::Idle;
	}

	/// Change the page title
	pub fn set_title(&mut self, title: &str) -> bool {
		if self.document.title == title {
			return false;
		}
		let mut next = (*self.document).clone();
		next.title = title.to_string();
		self.commit(next);
		true
	}

	/// Change the page slug
	pub fn set_slug(&mut self, slug: &str) -> bool {
		if self.document.slug == slug {
			return false;
		}
		let mut next = (*self.document).clone();
		next.slug = slug.to_string();
		self.commit(next);
		true
	}

	/// Change the publication status
	pub fn set_status(&mut self, status: PageStatus) -> bool {
		if self.document.status == status {
			return false;
		}
		let mut next = (*self.document).clone();
		next.status = status;
		self.commit(next);
		true
	}

	/// Restore the previous document state
	pub fn undo(&mut self) -> bool {
		let Some(previous) = self.undo.pop_back() else {
			return false;
		};
		let current = std::mem::replace(&mut self.document, previous);
		self.after_history_step(current.status);
		self.redo.push(current);
		true
	}

	/// Re-apply the last undone state
	pub fn redo(&mut self) -> bool {
		let Some(next) = self.redo.pop() else {
			return false;
		};
		let current = std::mem::replace(&mut self.document, next);
		self.after_history_step(current.status);
		self.undo.push_back(current);
		true
	}

	fn after_history_step(&mut self, replaced_status: PageStatus) {
		if let Some(id) = &self.selected
			&& self.document.block_index(id).is_none()
		{
			self.selected = None;
		}
		self.drag = DragState::Idle;
		self.touch();
		if self.document.status != replaced_status {
			self.status_revision = self.revision;
		}
	}

	/// Cards for every block, in document order
	pub fn block_cards(&self) -> Vec<BlockCard> {
		let len = self.document.blocks.len();
		self.document
			.blocks
			.iter()
			.enumerate()
			.map(|(index, block)| {
				let descriptor = self.registry.lookup(&block.block_type);
				BlockCard {
					id: block.id.clone(),
					block_type: block.block_type.clone(),
					display_name: descriptor
						.map_or_else(|| block.block_type.clone(), |d| d.display_name.clone()),
					index,
					registered: descriptor.is_some(),
					selected: self.selected.as_deref() == Some(block.id.as_str()),
					dragging: self.drag.source() == Some(index),
					drag_over: self.drag.target() == Some(index),
					can_move_up: index > 0,
					can_move_down: index + 1 < len,
					preview: preview_text(&block.props, self.preview_length),
				}
			})
			.collect()
	}

	/// Payload saving the current document as-is
	pub fn save_request(&self) -> PageUpdate {
		PageUpdate::from(self.document.as_ref())
	}

	/// Payload saving the current document as published
	pub fn publish_request(&self) -> PageUpdate {
		PageUpdate {
			status: PageStatus::Published,
			..self.save_request()
		}
	}

	/// Record a successful save of `revision`
	///
	/// Clears the dirty flag unless the document changed after that revision.
	pub fn mark_saved(&mut self, revision: u64) -> bool {
		if revision != self.revision {
			return false;
		}
		self.dirty = false;
		true
	}

	/// Start a save: the current revision and its payload
	///
	/// The editor stays free for further edits while the payload is in
	/// flight. Hand the store's answer to [`finish_save`](Self::finish_save).
	pub fn begin_save(&self) -> (u64, PageUpdate) {
		(self.revision, self.save_request())
	}

	/// Start a publish: the current revision and its published payload
	pub fn begin_publish(&self) -> (u64, PageUpdate) {
		(self.revision, self.publish_request())
	}

	/// Apply the outcome of a save started with [`begin_save`](Self::begin_save)
	///
	/// A stored revision clears the dirty flag unless the document changed
	/// since. A queued save leaves the editor as it is. On failure the
	/// document and the dirty flag are left as they were.
	pub fn finish_save(&mut self, result: CmsResult<SaveOutcome>) -> CmsResult<SaveOutcome> {
		self.finish(result, SAVE_FAILED_MESSAGE)
	}

	/// Apply the outcome of a publish started with [`begin_publish`](Self::begin_publish)
	///
	/// Once the store holds the page as published the local status follows,
	/// without counting as an edit, unless the status was changed locally
	/// after the published revision.
	pub fn finish_publish(&mut self, result: CmsResult<SaveOutcome>) -> CmsResult<SaveOutcome> {
		self.finish(result, PUBLISH_FAILED_MESSAGE)
	}

	fn finish(&mut self, result: CmsResult<SaveOutcome>, fallback: &str) -> CmsResult<SaveOutcome> {
		match result {
			Ok(SaveOutcome::Saved { revision, record }) => {
				if record.document.status == PageStatus::Published
					&& self.document.status != PageStatus::Published
					&& self.status_revision <= revision
				{
					let mut next = (*self.document).clone();
					next.status = PageStatus::Published;
					self.document = Arc::new(next);
				}
				let clean = self.mark_saved(revision);
				info!(page_id = %record.id, revision, status = ?record.document.status, clean, "Page saved");
				Ok(SaveOutcome::Saved { revision, record })
			}
			Ok(SaveOutcome::Queued) => {
				debug!(revision = self.revision, "Save queued behind the outstanding one");
				Ok(SaveOutcome::Queued)
			}
			Err(err) => {
				error!(error = %err, "Failed to save page");
				Err(user_facing(err, fallback))
			}
		}
	}

	/// Save the document through `coordinator`
	///
	/// Holds the editor until the store answers; to keep editing meanwhile,
	/// pair [`begin_save`](Self::begin_save) with
	/// [`finish_save`](Self::finish_save).
	pub async fn save<S>(&mut self, coordinator: &SaveCoordinator<S>) -> CmsResult<SaveOutcome>
	where
		S: PageStore + ?Sized,
	{
		let (revision, update) = self.begin_save();
		let result = coordinator.save(revision, update).await;
		self.finish_save(result)
	}

	/// Save the document through `coordinator` with status forced to published
	pub async fn publish<S>(&mut self, coordinator: &SaveCoordinator<S>) -> CmsResult<SaveOutcome>
	where
		S: PageStore + ?Sized,
	{
		let (revision, update) = self.begin_publish();
		let result = coordinator.save(revision, update).await;
		self.finish_publish(result)
	}
}

/// Replace a blank persistence message with the operation's fallback
fn user_facing(err: CmsError, fallback: &str) -> CmsError {
	match err {
		CmsError::Persistence { message } if message.trim().is_empty() => CmsError::Persistence {
			message: fallback.to_string(),
		},
		other => other,
	}
}

/// Preview line for a block card
///
/// The first non-empty of `headline`, `title` and `heading`, else `content`
/// with tags stripped and cut to `max_chars`.
pub fn preview_text(props: &Props, max_chars: usize) -> String {
	let text_of = |key: &str| {
		props
			.get(key)
			.map(crate::schema::value_to_text)
			.filter(|text| !text.is_empty())
	};

	if let Some(text) = text_of("headline")
		.or_else(|| text_of("title"))
		.or_else(|| text_of("heading"))
	{
		return text;
	}
	if let Some(content) = text_of("content") {
		return truncate_with_ellipsis(&strip_tags_safe(&content), max_chars);
	}
	EMPTY_PREVIEW.to_string()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::pages::{PageDocument, PageRecord, PageType};
	use rstest::{fixture, rstest};
	use serde_json::json;

	#[fixture]
	fn editor() -> DocumentEditor {
		DocumentEditor::new(
			PageDocument::new("Home"),
			Arc::new(BlockRegistry::with_builtin_blocks()),
		)
	}

	fn ids(editor: &DocumentEditor) -> Vec<String> {
		editor.document().blocks.iter().map(|b| b.id.clone()).collect()
	}

	#[rstest]
	fn test_insert_clamps_index_and_selects(mut editor: DocumentEditor) {
		// Arrange
		let first = editor.insert_block(0, "hero").unwrap();

		// Act
		let second = editor.insert_block(99, "steps").unwrap();

		// Assert
		assert_eq!(ids(&editor), vec![first, second.clone()]);
		assert_eq!(editor.selected(), Some(second.as_str()));
		assert_eq!(editor.revision(), 2);
	}

	#[rstest]
	fn test_insert_unregistered_is_noop(mut editor: DocumentEditor) {
		let before = editor.snapshot();

		assert_eq!(editor.insert_block(0, "carousel"), None);

		assert!(Arc::ptr_eq(&before, &editor.snapshot()));
		assert!(!editor.is_dirty());
	}

	#[rstest]
	fn test_every_mutation_replaces_snapshot(mut editor: DocumentEditor) {
		let id = editor.insert_block(0, "hero").unwrap();
		let before = editor.snapshot();

		editor.update_props(&id, Props::new());

		assert!(!Arc::ptr_eq(&before, &editor.snapshot()));
		assert_eq!(before.blocks[0].props["headline"], json!("Welcome to Our Community"));
	}

	#[rstest]
	fn test_delete_clears_selection(mut editor: DocumentEditor) {
		let a = editor.insert_block(0, "hero").unwrap();
		let b = editor.insert_block(1, "steps").unwrap();
		editor.select_block(Some(&a));

		assert!(editor.delete_block(&a));

		assert_eq!(editor.selected(), None);
		assert_eq!(ids(&editor), vec![b]);
	}

	#[rstest]
	fn test_delete_unselected_keeps_selection(mut editor: DocumentEditor) {
		let a = editor.insert_block(0, "hero").unwrap();
		let b = editor.insert_block(1, "steps").unwrap();

		editor.delete_block(&a);

		assert_eq!(editor.selected(), Some(b.as_str()));
	}

	#[rstest]
	fn test_reinserted_block_gets_new_id(mut editor: DocumentEditor) {
		let first = editor.insert_block(0, "hero").unwrap();
		editor.delete_block(&first);

		let second = editor.insert_block(0, "hero").unwrap();

		assert_ne!(first, second);
	}

	#[rstest]
	#[case(0, 0, false)]
	#[case(3, 0, false)]
	#[case(0, 9, true)]
	fn test_move_bounds(mut editor: DocumentEditor, #[case] from: usize, #[case] to: usize, #[case] moved: bool) {
		editor.insert_block(0, "hero");
		editor.insert_block(1, "steps");
		editor.insert_block(2, "card_grid");
		let before = ids(&editor);

		assert_eq!(editor.move_block(from, to), moved);

		if moved {
			assert_eq!(ids(&editor), vec![before[1].clone(), before[2].clone(), before[0].clone()]);
		} else {
			assert_eq!(ids(&editor), before);
		}
	}

	#[rstest]
	fn test_move_up_and_down(mut editor: DocumentEditor) {
		let a = editor.insert_block(0, "hero").unwrap();
		let b = editor.insert_block(1, "steps").unwrap();

		assert!(!editor.move_up(&a));
		assert!(!editor.move_down(&b));
		assert!(editor.move_down(&a));
		assert_eq!(ids(&editor), vec![b, a]);
	}

	#[rstest]
	fn test_identical_props_marks_dirty_only(mut editor: DocumentEditor) {
		let id = editor.insert_block(0, "hero").unwrap();
		editor.mark_saved(editor.revision());
		let props = editor.document().blocks[0].props.clone();
		let before = editor.snapshot();

		assert!(editor.update_props(&id, props));

		assert!(editor.is_dirty());
		assert!(Arc::ptr_eq(&before, &editor.snapshot()));
	}

	#[rstest]
	fn test_select_unknown_is_ignored(mut editor: DocumentEditor) {
		let id = editor.insert_block(0, "hero").unwrap();

		editor.select_block(Some("nope"));
		assert_eq!(editor.selected(), Some(id.as_str()));

		editor.select_block(None);
		assert_eq!(editor.selected(), None);
	}

	#[rstest]
	fn test_drag_without_target_does_nothing(mut editor: DocumentEditor) {
		editor.insert_block(0, "hero");
		editor.insert_block(1, "steps");
		let revision = editor.revision();

		editor.drag_start(1);
		editor.drag_over(1);

		assert_eq!(editor.drag_state(), DragState::Dragging { source: 1 });
		assert!(!editor.drag_end());
		assert_eq!(editor.drag_state(), DragState::Idle);
		assert_eq!(editor.revision(), revision);
	}

	#[rstest]
	fn test_drag_over_keeps_last_target(mut editor: DocumentEditor) {
		let a = editor.insert_block(0, "hero").unwrap();
		let b = editor.insert_block(1, "steps").unwrap();
		let c = editor.insert_block(2, "card_grid").unwrap();

		editor.drag_start(0);
		editor.drag_over(2);
		editor.drag_over(0);
		editor.drag_over(7);

		assert_eq!(editor.drag_state(), DragState::DragOver { source: 0, target: 2 });
		assert!(editor.drag_end());
		assert_eq!(ids(&editor), vec![b, c, a]);
	}

	#[rstest]
	fn test_move_during_drag_resets_drag(mut editor: DocumentEditor) {
		// Arrange
		let a = editor.insert_block(0, "hero").unwrap();
		let b = editor.insert_block(1, "steps").unwrap();
		let c = editor.insert_block(2, "card_grid").unwrap();
		editor.drag_start(0);
		editor.drag_over(2);

		// Act
		assert!(editor.move_up(&b));
		let moved = editor.drag_end();

		// Assert
		assert!(!moved);
		assert_eq!(editor.drag_state(), DragState::Idle);
		assert_eq!(ids(&editor), vec![b, a, c]);
	}

	#[rstest]
	fn test_drag_over_while_idle_is_ignored(mut editor: DocumentEditor) {
		editor.insert_block(0, "hero");
		editor.insert_block(1, "steps");

		editor.drag_over(1);

		assert_eq!(editor.drag_state(), DragState::Idle);
	}

	#[rstest]
	fn test_page_settings_mark_dirty_on_change(mut editor: DocumentEditor) {
		assert!(!editor.set_title("Home"));
		assert!(!editor.is_dirty());

		assert!(editor.set_title("Start"));
		assert!(editor.set_slug("start"));
		assert!(editor.set_status(PageStatus::Archived));

		assert!(editor.is_dirty());
		assert_eq!(editor.document().slug, "start");
	}

	#[rstest]
	fn test_undo_redo(mut editor: DocumentEditor) {
		// Arrange
		let a = editor.insert_block(0, "hero").unwrap();
		editor.insert_block(1, "steps");

		// Act
		assert!(editor.undo());
		let after_undo = ids(&editor);
		assert!(editor.redo());

		// Assert
		assert_eq!(after_undo, vec![a.clone()]);
		assert_eq!(editor.document().blocks.len(), 2);
		assert!(!editor.can_redo());
		assert!(editor.undo() && editor.undo());
		assert!(editor.document().blocks.is_empty());
		assert_eq!(editor.selected(), None);
		assert!(!editor.undo());
	}

	#[test]
	fn test_history_limit_bounds_undo() {
		let settings = EditorSettings {
			history_limit: 1,
			preview_length: 100,
		};
		let mut editor = DocumentEditor::with_settings(
			PageDocument::new("x"),
			Arc::new(BlockRegistry::with_builtin_blocks()),
			&settings,
		);
		editor.insert_block(0, "hero");
		editor.insert_block(0, "steps");

		assert!(editor.undo());
		assert!(!editor.undo());
		assert_eq!(editor.document().blocks.len(), 1);
	}

	#[rstest]
	fn test_new_edit_clears_redo(mut editor: DocumentEditor) {
		editor.insert_block(0, "hero");
		editor.undo();

		editor.insert_block(0, "steps");

		assert!(!editor.can_redo());
	}

	#[rstest]
	fn test_mark_saved_respects_later_edits(mut editor: DocumentEditor) {
		editor.insert_block(0, "hero");
		let saved = editor.revision();
		editor.insert_block(0, "steps");

		assert!(!editor.mark_saved(saved));
		assert!(editor.is_dirty());
		assert!(editor.mark_saved(editor.revision()));
		assert!(!editor.is_dirty());
	}

	fn stored(update: PageUpdate) -> PageRecord {
		let mut document = PageDocument::new(update.title).with_blocks(update.blocks);
		document.status = update.status;
		PageRecord::new(PageType::Home, document)
	}

	#[rstest]
	fn test_finish_publish_adopts_status_without_edit(mut editor: DocumentEditor) {
		// Arrange
		editor.insert_block(0, "hero");
		let (revision, update) = editor.begin_publish();

		// Act
		let outcome = editor.finish_publish(Ok(SaveOutcome::Saved {
			revision,
			record: stored(update),
		}));

		// Assert
		assert!(outcome.is_ok());
		assert_eq!(editor.document().status, PageStatus::Published);
		assert_eq!(editor.revision(), revision);
		assert!(!editor.is_dirty());
	}

	#[rstest]
	fn test_finish_publish_keeps_later_status_change(mut editor: DocumentEditor) {
		let (revision, update) = editor.begin_publish();
		editor.set_status(PageStatus::Archived);

		editor
			.finish_publish(Ok(SaveOutcome::Saved {
				revision,
				record: stored(update),
			}))
			.unwrap();

		assert_eq!(editor.document().status, PageStatus::Archived);
		assert!(editor.is_dirty());
	}

	#[rstest]
	fn test_finish_save_when_queued_keeps_dirty(mut editor: DocumentEditor) {
		editor.insert_block(0, "hero");

		let outcome = editor.finish_save(Ok(SaveOutcome::Queued)).unwrap();

		assert_eq!(outcome, SaveOutcome::Queued);
		assert!(editor.is_dirty());
	}

	#[rstest]
	fn test_edit_field_coerces(mut editor: DocumentEditor) {
		let id = editor.insert_block(0, "needs_widget").unwrap();

		assert!(editor.edit_field(&id, "limit", json!("30")));
		assert!(!editor.edit_field(&id, "showType", json!("everything")));
		assert!(!editor.edit_field("missing", "limit", json!(1)));

		assert_eq!(editor.document().blocks[0].props["limit"], json!(12));
	}

	#[rstest]
	fn test_property_editor_only_in_edit_mode(mut editor: DocumentEditor) {
		editor.insert_block(0, "hero");
		assert!(editor.property_editor().is_some());

		editor.set_view_mode(ViewMode::Preview);

		assert!(editor.property_editor().is_none());
	}

	#[rstest]
	fn test_publish_request_forces_status(editor: DocumentEditor) {
		assert_eq!(editor.save_request().status, PageStatus::Draft);
		assert_eq!(editor.publish_request().status, PageStatus::Published);
	}

	#[rstest]
	#[case(json!({"headline": "Hi", "title": "T"}), "Hi")]
	#[case(json!({"headline": "", "heading": "Section"}), "Section")]
	#[case(json!({"content": "<p>Short <b>text</b></p>"}), "Short text")]
	#[case(json!({"cards": []}), "Click to edit...")]
	fn test_preview_text(#[case] props: Value, #[case] expected: &str) {
		assert_eq!(preview_text(props.as_object().unwrap(), 100), expected);
	}

	#[test]
	fn test_preview_text_truncates_content() {
		let props = json!({"content": format!("<p>{}</p>", "a".repeat(120))});

		let preview = preview_text(props.as_object().unwrap(), 100);

		assert_eq!(preview, format!("{}...", "a".repeat(100)));
	}

	#[rstest]
	fn test_block_cards(mut editor: DocumentEditor) {
		editor.insert_block(0, "hero");
		let rich = editor.insert_block(1, "rich_text_section").unwrap();
		editor.drag_start(0);

		let cards = editor.block_cards();

		assert_eq!(cards[0].display_name, "Hero Section");
		assert_eq!(cards[0].preview, "Welcome to Our Community");
		assert!(cards[0].dragging && !cards[0].can_move_up && cards[0].can_move_down);
		assert_eq!(cards[1].id, rich);
		assert!(cards[1].selected);
		assert_eq!(cards[1].preview, "Add your content here...");
	}
}
