use std::path::Path;

use chrono::Utc;

use crate::annotations::AnnotationStore;
use crate::collection::{MessageEntry, MessageLog};
use crate::config::ViewerConfig;
use crate::diagnostics::DiagnosticsLog;
use crate::error::CoreError;
use crate::filter::{self, FilterCriteria, TimePreset};
use crate::loader::{load_messages, reconcile_media};
use crate::media::MediaKind;
use crate::models::{AnnotationTag, FacetOption, Message, MessageKey, ReportId};
use crate::pagination::PageCursor;
use crate::selection::{FacetSelection, SelectionControl, SelectionMode};
use crate::storage::StorageBackend;
use crate::timestamp::TimestampParser;

type Clock = Box<dyn Fn() -> i64>;

/// One message as handed to the renderer.
#[derive(Debug, Clone)]
pub struct PageEntry<'a> {
    pub key: &'a MessageKey,
    pub message: &'a Message,
    pub media_kind: Option<MediaKind>,
    pub tags: Vec<AnnotationTag>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageCounts {
    pub filtered: usize,
    pub total: usize,
}

/// Session state for one loaded export: facets, search, time range,
/// annotations, and the paged filter result.
///
/// Every state change recomputes the filtered sequence in full and restarts
/// paging.
pub struct ThreadView<B: StorageBackend> {
    parser: TimestampParser,
    log: MessageLog,
    store: AnnotationStore<B>,
    chat: SelectionControl,
    sender: SelectionControl,
    media: SelectionControl,
    tags: SelectionControl,
    search: String,
    time: TimePreset,
    cursor: PageCursor<usize>,
    clock: Clock,
}

impl<B: StorageBackend> ThreadView<B> {
    pub fn new(messages: Vec<Message>, config: &ViewerConfig, backend: B) -> Result<Self, CoreError> {
        config.validate()?;
        let parser = config.timestamp_parser()?;
        let log = MessageLog::new(messages, &parser);
        let mut store = AnnotationStore::open(log.report_id().clone(), &config.storage_prefix, backend);
        if let Some(dir) = &config.diagnostics_dir {
            store = store.with_diagnostics(DiagnosticsLog::new(dir));
        }

        let chat = SelectionControl::with_options(SelectionMode::Single, plain_options(log.chats()));
        let sender = SelectionControl::with_options(SelectionMode::Multi, plain_options(log.senders(None)));
        let media = SelectionControl::with_options(SelectionMode::Multi, MediaKind::facet_options());
        let tags = SelectionControl::with_options(SelectionMode::Multi, tag_options());

        let mut view = Self {
            parser,
            log,
            store,
            chat,
            sender,
            media,
            tags,
            search: String::new(),
            time: TimePreset::All,
            cursor: PageCursor::new(Vec::new(), config.page_size),
            clock: Box::new(|| Utc::now().timestamp_millis()),
        };
        view.refresh();
        Ok(view)
    }

    /// Loads an exported `chat.json`, checks attachments against the media
    /// folder when one is given, and opens a view over the result.
    pub fn open_export(
        chat_json: &Path,
        media_dir: Option<&Path>,
        config: &ViewerConfig,
        backend: B,
    ) -> Result<Self, CoreError> {
        let mut messages = load_messages(chat_json, &config.default_chat)?;
        if let Some(dir) = media_dir {
            reconcile_media(&mut messages, dir);
        }
        Self::new(messages, config, backend)
    }

    /// Replaces the wall clock used to resolve relative time presets.
    pub fn with_clock(mut self, clock: impl Fn() -> i64 + 'static) -> Self {
        self.clock = Box::new(clock);
        self.refresh();
        self
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    pub fn report_id(&self) -> &ReportId {
        self.log.report_id()
    }

    pub fn store(&self) -> &AnnotationStore<B> {
        &self.store
    }

    pub fn parser(&self) -> &TimestampParser {
        &self.parser
    }

    pub fn chat_facet(&self) -> &SelectionControl {
        &self.chat
    }

    pub fn sender_facet(&self) -> &SelectionControl {
        &self.sender
    }

    pub fn media_facet(&self) -> &SelectionControl {
        &self.media
    }

    pub fn tag_facet(&self) -> &SelectionControl {
        &self.tags
    }

    /// Direct access for bulk actions and option filter text. Call
    /// [`ThreadView::refresh`] after changing the selection this way.
    pub fn sender_facet_mut(&mut self) -> &mut SelectionControl {
        &mut self.sender
    }

    pub fn media_facet_mut(&mut self) -> &mut SelectionControl {
        &mut self.media
    }

    pub fn tag_facet_mut(&mut self) -> &mut SelectionControl {
        &mut self.tags
    }

    pub fn chat_facet_mut(&mut self) -> &mut SelectionControl {
        &mut self.chat
    }

    /// Picks (or clears) the chat and narrows the sender options to it.
    pub fn toggle_chat(&mut self, chat: &str) -> bool {
        let changed = self.chat.toggle(chat);
        if changed {
            self.refresh_sender_options();
            self.refresh();
        }
        changed
    }

    pub fn toggle_sender(&mut self, sender: &str) -> bool {
        self.toggle_and_refresh(|view| view.sender.toggle(sender))
    }

    pub fn toggle_media(&mut self, kind: MediaKind) -> bool {
        self.toggle_and_refresh(|view| view.media.toggle(kind.as_str()))
    }

    pub fn toggle_tag_filter(&mut self, tag: AnnotationTag) -> bool {
        self.toggle_and_refresh(|view| view.tags.toggle(tag.name()))
    }

    pub fn set_search(&mut self, text: impl Into<String>) {
        self.search = text.into();
        self.refresh();
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_time_preset(&mut self, preset: TimePreset) {
        self.time = preset;
        self.refresh();
    }

    pub fn time_preset(&self) -> TimePreset {
        self.time
    }

    pub fn set_custom_range(&mut self, from: &str, to: &str) {
        let preset = TimePreset::custom_from_text(from, to, &self.parser);
        self.set_time_preset(preset);
    }

    /// Recomputes the filtered sequence and restarts paging.
    pub fn refresh(&mut self) {
        let now = (self.clock)();
        let criteria = FilterCriteria {
            chat: &self.chat,
            sender: &self.sender,
            media: &self.media,
            tags: &self.tags,
            search: &self.search,
            time: self.time.bounds(now),
        };
        let positions = filter::matching_positions(self.log.entries(), &criteria, self.store.assignments());
        self.cursor.replace(positions);
    }

    /// Next page of the current result; empty once everything was revealed.
    pub fn next_page(&mut self) -> Vec<PageEntry<'_>> {
        let indices = self.cursor.next_page().to_vec();
        let this: &Self = self;
        indices
            .into_iter()
            .map(move |idx| this.page_entry(&this.log.entries()[idx]))
            .collect()
    }

    pub fn has_more(&self) -> bool {
        self.cursor.has_more()
    }

    pub fn counts(&self) -> MessageCounts {
        MessageCounts {
            filtered: self.cursor.len(),
            total: self.log.len(),
        }
    }

    /// Filtered messages in display order, regardless of paging.
    pub fn filtered(&self) -> Vec<&MessageEntry> {
        self.cursor
            .items()
            .iter()
            .map(|idx| &self.log.entries()[*idx])
            .collect()
    }

    pub fn tags_for(&self, key: &MessageKey) -> Vec<AnnotationTag> {
        self.store.get_tags(key)
    }

    pub fn set_tag(&mut self, key: &MessageKey, tag: &str, enabled: bool) -> bool {
        let changed = self.store.set_tag(key, tag, enabled);
        if changed {
            self.refresh();
        }
        changed
    }

    pub fn export_json(&self) -> Result<String, CoreError> {
        self.store.export_json()
    }

    pub fn export_filename(&self) -> String {
        self.store.export_filename()
    }

    /// Imports annotation file contents. The text is fully validated before
    /// any state changes.
    pub fn import_json(&mut self, text: &str, allow_mismatch: bool) -> Result<usize, CoreError> {
        let annotated = self.store.import_json(text, allow_mismatch)?;
        self.refresh();
        Ok(annotated)
    }

    fn toggle_and_refresh(&mut self, toggle: impl FnOnce(&mut Self) -> bool) -> bool {
        let changed = toggle(self);
        if changed {
            self.refresh();
        }
        changed
    }

    fn refresh_sender_options(&mut self) {
        let chat = self.chat.selected().iter().next().cloned();
        self.sender
            .set_options(plain_options(self.log.senders(chat.as_deref())));
    }

    fn page_entry<'a>(&'a self, entry: &'a MessageEntry) -> PageEntry<'a> {
        PageEntry {
            key: &entry.key,
            message: &entry.message,
            media_kind: entry.media_kind,
            tags: self.store.get_tags(&entry.key),
        }
    }
}

fn plain_options(values: Vec<String>) -> Vec<FacetOption> {
    values.into_iter().map(FacetOption::plain).collect()
}

fn tag_options() -> Vec<FacetOption> {
    AnnotationTag::ALL
        .iter()
        .map(|tag| FacetOption {
            value: tag.name().to_string(),
            label: tag.name().to_string(),
            color: Some(tag.color().to_string()),
        })
        .collect()
}
