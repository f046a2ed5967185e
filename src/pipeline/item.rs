use super::content::ContentFactory;
use super::history::{HistoryEntry, TransformHistory};

use std::collections::{BTreeMap, VecDeque};
use std::io;
use std::sync::Arc;
use uuid::Uuid;

/// Terminator stored after every processing error message.
pub const PROCESSING_ERROR_TERMINATOR: char = '\n';

/// Default priority given to new items.
pub const DEFAULT_PRIORITY: i32 = 50;

/// The unit of content flowing through the processing pipeline.
///
/// A work item is mutated in place by every stage it visits. Identity
/// (`internal_id`) is generated on construction and can only be chosen
/// explicitly through [`WorkItem::with_internal_id`].
#[derive(Debug)]
pub struct WorkItem {
    internal_id: Uuid,
    /// Front is the top of the stack (the form routed on next).
    current_forms: VecDeque<String>,
    history: TransformHistory,
    alternate_views: BTreeMap<String, Vec<u8>>,
    parameters: BTreeMap<String, Vec<String>>,
    extracted_records: Option<Vec<WorkItem>>,
    content: Option<Arc<dyn ContentFactory>>,

    id: Option<String>,
    transaction_id: Option<String>,
    work_bundle_id: Option<String>,
    filename: Option<String>,
    file_type: Option<String>,
    classification: Option<String>,
    priority: i32,
    /// Milliseconds since the unix epoch.
    creation_timestamp: u64,
    font_encoding: Option<String>,
    header_encoding: Option<String>,
    header: Option<Vec<u8>>,
    footer: Option<Vec<u8>>,
    num_children: usize,
    num_siblings: usize,
    birth_order: usize,
    broken: Option<String>,
    outputable: bool,
    processing_error: Option<String>,
}

impl Default for WorkItem {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkItem {
    pub fn new() -> Self {
        Self::with_internal_id(Uuid::new_v4())
    }

    /// Builds an item carrying a caller-chosen identity.
    pub fn with_internal_id(internal_id: Uuid) -> Self {
        Self {
            internal_id,
            current_forms: VecDeque::new(),
            history: TransformHistory::new(),
            alternate_views: BTreeMap::new(),
            parameters: BTreeMap::new(),
            extracted_records: None,
            content: None,
            id: None,
            transaction_id: None,
            work_bundle_id: None,
            filename: None,
            file_type: None,
            classification: None,
            priority: DEFAULT_PRIORITY,
            creation_timestamp: now_ms(),
            font_encoding: None,
            header_encoding: None,
            header: None,
            footer: None,
            num_children: 0,
            num_siblings: 0,
            birth_order: 0,
            broken: None,
            outputable: true,
            processing_error: None,
        }
    }

    /// Convenience constructor for an item with a payload, name and initial form.
    pub fn with_content(
        content: Arc<dyn ContentFactory>,
        filename: impl Into<String>,
        form: impl Into<String>,
    ) -> Self {
        let mut item = Self::new();
        item.set_content(Some(content));
        item.set_filename(Some(filename.into()));
        item.push_current_form(form);
        item
    }

    pub fn internal_id(&self) -> Uuid {
        self.internal_id
    }

    /// Short name used in logs and agent listings.
    pub fn short_name(&self) -> String {
        self.filename
            .clone()
            .unwrap_or_else(|| self.internal_id.to_string())
    }

    // --- current forms ---

    pub fn current_form(&self) -> Option<&str> {
        self.current_forms.front().map(String::as_str)
    }

    pub fn push_current_form(&mut self, form: impl Into<String>) {
        self.current_forms.push_front(form.into());
    }

    pub fn enqueue_current_form(&mut self, form: impl Into<String>) {
        self.current_forms.push_back(form.into());
    }

    pub fn pop_current_form(&mut self) -> Option<String> {
        self.current_forms.pop_front()
    }

    /// Clears the stack, then pushes `form` if one is given.
    pub fn replace_current_form(&mut self, form: Option<String>) {
        self.current_forms.clear();
        if let Some(form) = form {
            self.current_forms.push_front(form);
        }
    }

    pub fn all_current_forms(&self) -> Vec<String> {
        self.current_forms.iter().cloned().collect()
    }

    pub fn current_form_size(&self) -> usize {
        self.current_forms.len()
    }

    // --- transform history ---

    pub fn transform_history(&self) -> &TransformHistory {
        &self.history
    }

    pub fn set_history(&mut self, history: &TransformHistory) {
        self.history = history.clone();
    }

    pub fn append_transform_history(&mut self, key: impl Into<String>) {
        self.history.append(HistoryEntry::transform(key));
    }

    pub fn append_sprout(&mut self, key: impl Into<String>) {
        self.history.append(HistoryEntry::sprout(key));
    }

    // --- alternate views ---

    pub fn alternate_views(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.alternate_views
    }

    pub fn alternate_view(&self, name: &str) -> Option<&[u8]> {
        self.alternate_views.get(name).map(Vec::as_slice)
    }

    /// Stores a view under `name`, replacing any previous one.
    pub fn add_alternate_view(&mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.alternate_views.insert(name.into(), data.into());
    }

    // --- parameters ---

    pub fn parameters(&self) -> &BTreeMap<String, Vec<String>> {
        &self.parameters
    }

    pub fn parameter(&self, key: &str) -> Option<&[String]> {
        self.parameters.get(key).map(Vec::as_slice)
    }

    pub fn has_parameter(&self, key: &str) -> bool {
        self.parameters.contains_key(key)
    }

    /// Values joined with `;`.
    pub fn string_parameter(&self, key: &str) -> Option<String> {
        self.parameters.get(key).map(|values| values.join(";"))
    }

    /// Appends `value` to the values already stored under `key`.
    pub fn put_parameter(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.parameters
            .entry(key.into())
            .or_default()
            .push(value.into());
    }

    /// Replaces all values stored under `key`.
    pub fn set_parameter(&mut self, key: impl Into<String>, values: Vec<String>) {
        self.parameters.insert(key.into(), values);
    }

    /// Merges every entry of `parameters` in, appending to existing keys.
    pub fn put_parameters(&mut self, parameters: &BTreeMap<String, Vec<String>>) {
        for (key, values) in parameters {
            self.parameters
                .entry(key.clone())
                .or_default()
                .extend(values.iter().cloned());
        }
    }

    pub fn delete_parameter(&mut self, key: &str) -> Option<Vec<String>> {
        self.parameters.remove(key)
    }

    // --- children ---

    pub fn extracted_records(&self) -> Option<&[WorkItem]> {
        self.extracted_records.as_deref()
    }

    pub fn set_extracted_records(&mut self, records: Option<Vec<WorkItem>>) {
        self.extracted_records = records;
    }

    pub fn add_extracted_record(&mut self, record: WorkItem) {
        self.extracted_records.get_or_insert_with(Vec::new).push(record);
    }

    pub fn take_extracted_records(&mut self) -> Option<Vec<WorkItem>> {
        self.extracted_records.take()
    }

    // --- content ---

    pub fn content(&self) -> Option<&Arc<dyn ContentFactory>> {
        self.content.as_ref()
    }

    pub fn set_content(&mut self, content: Option<Arc<dyn ContentFactory>>) {
        self.content = content;
    }

    pub fn content_size(&self) -> io::Result<u64> {
        match &self.content {
            Some(factory) => factory.size(),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                "work item has no content",
            )),
        }
    }

    // --- processing errors ---

    pub fn processing_error(&self) -> Option<&str> {
        self.processing_error.as_deref()
    }

    pub fn add_processing_error(&mut self, message: &str) {
        let text = self.processing_error.get_or_insert_with(String::new);
        text.push_str(message);
        text.push(PROCESSING_ERROR_TERMINATOR);
    }

    // --- plain accessors ---

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(&mut self, id: Option<String>) {
        self.id = id;
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }

    pub fn set_transaction_id(&mut self, transaction_id: Option<String>) {
        self.transaction_id = transaction_id;
    }

    pub fn work_bundle_id(&self) -> Option<&str> {
        self.work_bundle_id.as_deref()
    }

    pub fn set_work_bundle_id(&mut self, work_bundle_id: Option<String>) {
        self.work_bundle_id = work_bundle_id;
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn set_filename(&mut self, filename: Option<String>) {
        self.filename = filename;
    }

    pub fn file_type(&self) -> Option<&str> {
        self.file_type.as_deref()
    }

    pub fn set_file_type(&mut self, file_type: Option<String>) {
        self.file_type = file_type;
    }

    pub fn classification(&self) -> Option<&str> {
        self.classification.as_deref()
    }

    pub fn set_classification(&mut self, classification: Option<String>) {
        self.classification = classification;
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
    }

    pub fn creation_timestamp(&self) -> u64 {
        self.creation_timestamp
    }

    pub fn set_creation_timestamp(&mut self, timestamp: u64) {
        self.creation_timestamp = timestamp;
    }

    pub fn font_encoding(&self) -> Option<&str> {
        self.font_encoding.as_deref()
    }

    pub fn set_font_encoding(&mut self, encoding: Option<String>) {
        self.font_encoding = encoding;
    }

    pub fn header_encoding(&self) -> Option<&str> {
        self.header_encoding.as_deref()
    }

    pub fn set_header_encoding(&mut self, encoding: Option<String>) {
        self.header_encoding = encoding;
    }

    pub fn header(&self) -> Option<&[u8]> {
        self.header.as_deref()
    }

    pub fn header_mut(&mut self) -> Option<&mut Vec<u8>> {
        self.header.as_mut()
    }

    pub fn set_header(&mut self, header: Option<Vec<u8>>) {
        self.header = header;
    }

    pub fn footer(&self) -> Option<&[u8]> {
        self.footer.as_deref()
    }

    pub fn set_footer(&mut self, footer: Option<Vec<u8>>) {
        self.footer = footer;
    }

    pub fn num_children(&self) -> usize {
        self.num_children
    }

    pub fn set_num_children(&mut self, num_children: usize) {
        self.num_children = num_children;
    }

    pub fn num_siblings(&self) -> usize {
        self.num_siblings
    }

    pub fn set_num_siblings(&mut self, num_siblings: usize) {
        self.num_siblings = num_siblings;
    }

    pub fn birth_order(&self) -> usize {
        self.birth_order
    }

    pub fn set_birth_order(&mut self, birth_order: usize) {
        self.birth_order = birth_order;
    }

    pub fn broken(&self) -> Option<&str> {
        self.broken.as_deref()
    }

    pub fn is_broken(&self) -> bool {
        self.broken.is_some()
    }

    pub fn set_broken(&mut self, reason: Option<String>) {
        self.broken = reason;
    }

    pub fn is_outputable(&self) -> bool {
        self.outputable
    }

    pub fn set_outputable(&mut self, outputable: bool) {
        self.outputable = outputable;
    }
}

/// Current system time in milliseconds.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
