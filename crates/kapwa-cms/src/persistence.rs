//! Page persistence boundary
//!
//! [`PageStore`] is the collaborator the editor saves through. It is assumed
//! last-write-wins with no document locking, so [`SaveCoordinator`] keeps at
//! most one update per page in flight and coalesces the rest.

use crate::error::{CmsError, CmsResult};
use crate::pages::{PageDocument, PageOverrides, PageRecord, PageTemplate, PageType, PageUpdate};
use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Storage for pages and page templates
#[async_trait]
pub trait PageStore: Send + Sync {
	/// Load a page
	async fn get(&self, page_id: Uuid) -> CmsResult<PageRecord>;

	/// Replace the editable state of a page
	async fn update(&self, page_id: Uuid, update: PageUpdate) -> CmsResult<PageRecord>;

	/// Create a draft page from a template
	async fn create_from_template(&self, template_id: &str, overrides: PageOverrides) -> CmsResult<PageRecord>;

	/// Available templates
	async fn templates(&self) -> CmsResult<Vec<PageTemplate>>;
}

/// In-memory [`PageStore`]
///
/// Slugs are unique across stored pages.
#[derive(Debug, Default)]
pub struct MemoryPageStore {
	pages: RwLock<IndexMap<Uuid, PageRecord>>,
	templates: RwLock<IndexMap<String, PageTemplate>>,
}

impl MemoryPageStore {
	/// Empty store
	pub fn new() -> Self {
		Self::default()
	}

	/// Store preloaded with templates
	pub fn with_templates(templates: impl IntoIterator<Item = PageTemplate>) -> Self {
		let store = Self::new();
		for template in templates {
			store.add_template(template);
		}
		store
	}

	/// Add or replace a template
	pub fn add_template(&self, template: PageTemplate) {
		self.templates.write().insert(template.id.clone(), template);
	}

	/// Store a new page
	pub fn insert_page(&self, page_type: PageType, document: PageDocument) -> CmsResult<PageRecord> {
		self.insert_record(PageRecord::new(page_type, document))
	}

	/// Every stored page, in creation order
	pub fn pages(&self) -> Vec<PageRecord> {
		self.pages.read().values().cloned().collect()
	}

	fn insert_record(&self, record: PageRecord) -> CmsResult<PageRecord> {
		let mut pages = self.pages.write();
		ensure_unique_slug(&pages, &record.document.slug, None)?;
		pages.insert(record.id, record.clone());
		debug!(page_id = %record.id, slug = %record.document.slug, "Stored page");
		Ok(record)
	}
}

fn ensure_unique_slug(pages: &IndexMap<Uuid, PageRecord>, slug: &str, except: Option<Uuid>) -> CmsResult<()> {
	let taken = pages
		.values()
		.any(|record| Some(record.id) != except && record.document.slug == slug);
	if taken {
		return Err(CmsError::DuplicateSlug(slug.to_string()));
	}
	Ok(())
}

#[async_trait]
impl PageStore for MemoryPageStore {
	async fn get(&self, page_id: Uuid) -> CmsResult<PageRecord> {
		self.pages
			.read()
			.get(&page_id)
			.cloned()
			.ok_or_else(|| CmsError::PageNotFound(page_id.to_string()))
	}

	async fn update(&self, page_id: Uuid, update: PageUpdate) -> CmsResult<PageRecord> {
		let mut pages = self.pages.write();
		if !pages.contains_key(&page_id) {
			return Err(CmsError::PageNotFound(page_id.to_string()));
		}
		ensure_unique_slug(&pages, &update.slug, Some(page_id))?;

		let record = pages
			.get_mut(&page_id)
			.ok_or_else(|| CmsError::PageNotFound(page_id.to_string()))?;
		record.document = PageDocument::from(update);
		record.updated_at = Utc::now();
		Ok(record.clone())
	}

	async fn create_from_template(&self, template_id: &str, overrides: PageOverrides) -> CmsResult<PageRecord> {
		let template = self
			.templates
			.read()
			.get(template_id)
			.cloned()
			.ok_or_else(|| CmsError::TemplateNotFound(template_id.to_string()))?;

		let mut record = PageRecord::new(template.page_type, template.create_document(&overrides));
		record.source_template = Some(template.id.clone());
		let record = self.insert_record(record)?;
		info!(page_id = %record.id, template = %template.id, "Created page from template");
		Ok(record)
	}

	async fn templates(&self) -> CmsResult<Vec<PageTemplate>> {
		Ok(self.templates.read().values().cloned().collect())
	}
}

/// Result of asking a [`SaveCoordinator`] to save
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
	/// The store accepted the payload of `revision`, the latest one sent
	Saved {
		/// Editor revision the stored payload was taken at
		revision: u64,
		/// Stored page
		record: PageRecord,
	},
	/// Another save was in flight; this payload will be sent after it
	Queued,
}

#[derive(Debug, Default)]
struct SaveState {
	in_flight: bool,
	pending: Option<(u64, PageUpdate)>,
}

/// Serializes saves of one page
///
/// While an update is outstanding, further saves are queued. Only the most
/// recent queued payload is kept, and it is sent as soon as the outstanding
/// update completes. The caller whose save started the chain receives the
/// outcome of the last payload sent.
pub struct SaveCoordinator<S: PageStore + ?Sized> {
	store: Arc<S>,
	page_id: Uuid,
	state: Mutex<SaveState>,
}

impl<S: PageStore + ?Sized> SaveCoordinator<S> {
	/// Coordinator for saves of `page_id`
	pub fn new(store: Arc<S>, page_id: Uuid) -> Self {
		Self {
			store,
			page_id,
			state: Mutex::new(SaveState::default()),
		}
	}

	/// Page this coordinator saves
	pub fn page_id(&self) -> Uuid {
		self.page_id
	}

	/// Whether an update is outstanding
	pub fn is_saving(&self) -> bool {
		self.state.lock().in_flight
	}

	/// Whether a payload is waiting for the outstanding update
	pub fn has_pending(&self) -> bool {
		self.state.lock().pending.is_some()
	}

	/// Save `update`, taken at editor `revision`
	///
	/// A failed update discards any queued payload and returns the error;
	/// the editor stays dirty so the author can retry.
	pub async fn save(&self, revision: u64, update: PageUpdate) -> CmsResult<SaveOutcome> {
		{
			let mut state = self.state.lock();
			if state.in_flight {
				let replaced = state.pending.replace((revision, update)).is_some();
				debug!(page_id = %self.page_id, revision, replaced, "Queued page save");
				return Ok(SaveOutcome::Queued);
			}
			state.in_flight = true;
		}

		let (mut revision, mut update) = (revision, update);
		loop {
			let result = self.store.update(self.page_id, update).await;

			let next = {
				let mut state = self.state.lock();
				let next = match &result {
					Ok(_) => state.pending.take(),
					Err(_) => {
						state.pending = None;
						None
					}
				};
				if next.is_none() {
					state.in_flight = false;
				}
				next
			};

			match (result, next) {
				(Ok(_), Some((queued_revision, queued_update))) => {
					debug!(page_id = %self.page_id, revision = queued_revision, "Sending queued page save");
					revision = queued_revision;
					update = queued_update;
				}
				(Ok(record), None) => return Ok(SaveOutcome::Saved { revision, record }),
				(Err(err), _) => {
					warn!(page_id = %self.page_id, revision, error = %err, "Page save failed");
					return Err(err);
				}
			}
		}
	}
}
