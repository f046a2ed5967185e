//! Work item lineage propagation.
//!
//! Two operations keep downstream routing, audit and dedup consistent:
//! - [`clone_item`]: duplicates an item, optionally including its identity.
//! - [`derive_children`]: pushes parent information onto freshly extracted
//!   children and numbers them within their sibling set.
//!
//! Both are synchronous and only touch the items they are given. The caller
//! guarantees no other worker mutates the same item concurrently.

use super::hashing::{ContentHasher, parent_to_child};
use super::item::{PROCESSING_ERROR_TERMINATOR, WorkItem};

use std::collections::BTreeSet;

/// Parameter recording a child's content size at derivation time.
pub const ORIG_DOC_SIZE_KEY: &str = "ORIG_DOC_SIZE";

/// Settings applied to every child of one extraction step.
#[derive(Debug, Clone, Default)]
pub struct SproutOptions {
    /// Clear the child's file type so routing starts fresh.
    pub nullify_file_type: bool,
    /// Parent parameters copied onto every child, replacing the child's values.
    pub always_copy_keys: BTreeSet<String>,
    /// Key of the place that produced the children.
    pub place_key: String,
}

impl SproutOptions {
    pub fn new(place_key: impl Into<String>) -> Self {
        Self {
            place_key: place_key.into(),
            ..Self::default()
        }
    }

    pub fn nullify_file_type(mut self, nullify: bool) -> Self {
        self.nullify_file_type = nullify;
        self
    }

    pub fn always_copy<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.always_copy_keys.extend(keys.into_iter().map(Into::into));
        self
    }
}

/// Clones a work item.
///
/// An ordinary clone is processing-equivalent but has a fresh identity. A
/// `full_clone` additionally reproduces identity and the physical-formatting
/// fields. Extracted records are carried over as full clones so the copy
/// refers to the same children the original does.
pub fn clone_item(item: &WorkItem, full_clone: bool) -> WorkItem {
    let mut copy = if full_clone {
        WorkItem::with_internal_id(item.internal_id())
    } else {
        WorkItem::new()
    };

    if let Some(content) = item.content() {
        copy.set_content(Some(content.clone()));
    }

    copy.replace_current_form(None);
    for form in item.all_current_forms() {
        copy.enqueue_current_form(form);
    }
    copy.set_history(item.transform_history());
    copy.put_parameters(item.parameters());
    for (name, view) in item.alternate_views() {
        copy.add_alternate_view(name.clone(), view.clone());
    }
    copy.set_priority(item.priority());
    copy.set_creation_timestamp(item.creation_timestamp());
    if let Some(records) = item.extracted_records() {
        copy.set_extracted_records(Some(
            records.iter().map(|record| clone_item(record, true)).collect(),
        ));
    }
    if let Some(filename) = item.filename() {
        copy.set_filename(Some(filename.to_string()));
    }

    if full_clone {
        if let Some(error) = item.processing_error() {
            let message = error
                .strip_suffix(PROCESSING_ERROR_TERMINATOR)
                .unwrap_or(error);
            copy.add_processing_error(message);
        }
        copy.set_font_encoding(item.font_encoding().map(str::to_string));
        copy.set_num_children(item.num_children());
        copy.set_num_siblings(item.num_siblings());
        copy.set_birth_order(item.birth_order());
        copy.set_header(item.header().map(<[u8]>::to_vec));
        copy.set_footer(item.footer().map(<[u8]>::to_vec));
        copy.set_header_encoding(item.header_encoding().map(str::to_string));
        copy.set_classification(item.classification().map(str::to_string));
        copy.set_broken(item.broken().map(str::to_string));
        copy.set_outputable(item.is_outputable());
        copy.set_id(item.id().map(str::to_string));
        copy.set_work_bundle_id(item.work_bundle_id().map(str::to_string));
        copy.set_transaction_id(item.transaction_id().map(str::to_string));
    }

    copy
}

/// Propagates parent information onto a single sprouted child.
///
/// Does not touch birth order or sibling count; see [`derive_children`].
pub fn add_parent_info_to_child(
    parent: &WorkItem,
    child: &mut WorkItem,
    options: &SproutOptions,
    hasher: &dyn ContentHasher,
) {
    if let Some(classification) = parent.classification() {
        child.set_classification(Some(classification.to_string()));
    }

    for key in &options.always_copy_keys {
        if let Some(values) = parent.parameter(key) {
            child.set_parameter(key.clone(), values.to_vec());
        }
    }

    child.set_history(parent.transform_history());
    child.append_sprout(options.place_key.clone());

    match child.content_size() {
        Ok(size) => child.set_parameter(ORIG_DOC_SIZE_KEY, vec![size.to_string()]),
        Err(e) => {
            tracing::debug!(
                "Skipping {} for child {}: {}",
                ORIG_DOC_SIZE_KEY,
                child.internal_id(),
                e
            );
        }
    }

    if options.nullify_file_type {
        child.set_file_type(None);
    }

    parent_to_child(child);

    match hasher.hash(child) {
        Ok(params) => {
            for (key, value) in params {
                child.set_parameter(key, vec![value]);
            }
        }
        Err(e) => {
            tracing::debug!("Hashing child {} failed: {}", child.internal_id(), e);
        }
    }
}

/// Propagates parent information to every child and numbers the siblings.
///
/// `None` entries are skipped with a warning and do not count toward birth
/// order or the sibling total.
pub fn derive_children(
    parent: &WorkItem,
    children: &mut [Option<WorkItem>],
    options: &SproutOptions,
    hasher: &dyn ContentHasher,
) {
    let total_siblings = children.iter().filter(|child| child.is_some()).count();
    let mut birth_order = 1;

    for (position, slot) in children.iter_mut().enumerate() {
        let Some(child) = slot else {
            tracing::warn!(
                "Null child at position {} while deriving from {}",
                position,
                parent.internal_id()
            );
            continue;
        };

        add_parent_info_to_child(parent, child, options, hasher);
        child.set_birth_order(birth_order);
        child.set_num_siblings(total_siblings);
        birth_order += 1;
    }
}
