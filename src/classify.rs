//! Type classification and the dispatch cache.
//!
//! Classification turns a type's [`Shape`] into an [`Encoder`], composing the encoders of any
//! element, value, or referenced types. The rules, in priority order:
//!
//! 1. Indirect references unwrap one level and delegate to the referenced type's encoder.
//! 2. Sequences of `u8` (and byte buffers) become binary blobs.
//! 3. Other sequences become number sets or string sets, depending on the element type.
//! 4. Maps with string keys become nested documents. Any other key type is unsupported.
//! 5. Records nested below the top level are reduced to their partition key's string form.
//! 6. Numbers and strings encode as themselves.
//! 7. Everything else is unsupported.
//!
//! Resolved encoders are cached per concrete type and never evicted. Unsupported encoders are
//! cached like any other: they only fail once they're asked to encode a value.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::{Lazy, OnceCell};
use tracing::debug;

use crate::driver::RecordLayout;
use crate::error::Result;
use crate::shape::{RecordHandle, Shape, TypeHandle};

static GLOBAL: Lazy<Classifier> = Lazy::new(Classifier::new);

/// A resolved encoder for one concrete type.
#[derive(Debug)]
pub enum Encoder {
    Numeric,
    String,
    Bytes,
    /// Encodes each element with `elem`, then aggregates into a number set when `numeric` is
    /// set, or a string set otherwise.
    Sequence { elem: Arc<Encoder>, numeric: bool },
    /// Encodes each entry with `value` into a nested document.
    Map { value: Arc<Encoder> },
    Indirect(Arc<Encoder>),
    /// A nested record, encoded as its partition key. The layout is resolved on first use so
    /// that self-referential records classify in bounded time.
    Record(RecordHandle),
    /// Fails with the named type when used.
    Unsupported(&'static str),
}

/// A cache entry, initialized at most once.
type Slot<T> = Arc<OnceCell<Arc<T>>>;

/// Resolves and caches encoders and record layouts, keyed by concrete type.
///
/// Most code uses the process-wide instance from [`Classifier::global`]. A private instance can
/// be handed to [`Codec::with_classifier`](crate::Codec::with_classifier) to get an isolated
/// cache, which is mostly useful for observing cache behavior.
#[derive(Debug, Default)]
pub struct Classifier {
    encoders: RwLock<HashMap<TypeId, Slot<Encoder>>>,
    layouts: RwLock<HashMap<TypeId, Slot<RecordLayout>>>,
    classified: AtomicUsize,
    resolved: AtomicUsize,
}

impl Classifier {
    /// Create an empty classifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide classifier.
    pub fn global() -> &'static Classifier {
        &GLOBAL
    }

    /// Get the encoder for a type, classifying it on first encounter.
    ///
    /// Each type is classified exactly once. Threads racing on a type's first use wait for the
    /// one doing the work, and all of them get the same encoder.
    pub fn classify(&self, ty: TypeHandle) -> Arc<Encoder> {
        // The map lock is released before resolving, as resolving recurses into component types
        slot(&self.encoders, ty.id())
            .get_or_init(|| {
                let enc = Arc::new(self.resolve(ty));
                self.classified.fetch_add(1, Ordering::Relaxed);
                debug!(ty = ty.name(), encoder = ?enc, "classified type");
                enc
            })
            .clone()
    }

    /// Get the field layout of a record type, resolving its field tags on first encounter.
    /// Failed resolutions aren't cached.
    pub fn layout(&self, record: RecordHandle) -> Result<Arc<RecordLayout>> {
        slot(&self.layouts, record.id())
            .get_or_try_init(|| {
                let layout = Arc::new(RecordLayout::resolve(record)?);
                self.resolved.fetch_add(1, Ordering::Relaxed);
                debug!(
                    record = record.name(),
                    fields = layout.fields().len(),
                    "resolved record layout"
                );
                Ok(layout)
            })
            .map(Arc::clone)
    }

    /// Number of times a type has been classified (i.e. cache misses in [`classify`]).
    ///
    /// [`classify`]: Classifier::classify
    pub fn classifications(&self) -> usize {
        self.classified.load(Ordering::Relaxed)
    }

    /// Number of times a record layout has been resolved (i.e. cache misses in [`layout`]).
    ///
    /// [`layout`]: Classifier::layout
    pub fn layout_resolutions(&self) -> usize {
        self.resolved.load(Ordering::Relaxed)
    }

    fn resolve(&self, ty: TypeHandle) -> Encoder {
        match ty.shape() {
            Shape::Indirect(inner) => Encoder::Indirect(self.classify(inner)),
            Shape::Bytes => Encoder::Bytes,
            Shape::Sequence(elem) if elem.id() == TypeId::of::<u8>() => Encoder::Bytes,
            Shape::Sequence(elem) => Encoder::Sequence {
                numeric: elem.is_numeric(),
                elem: self.classify(elem),
            },
            Shape::Map { key, value } => {
                if matches!(key.shape(), Shape::String) {
                    Encoder::Map {
                        value: self.classify(value),
                    }
                } else {
                    Encoder::Unsupported(ty.name())
                }
            }
            Shape::Record(record) => Encoder::Record(record),
            Shape::Numeric => Encoder::Numeric,
            Shape::String => Encoder::String,
            Shape::Unsupported(_) => Encoder::Unsupported(ty.name()),
        }
    }
}

/// Find the cache entry for a type, adding an empty one if there isn't one yet.
fn slot<T>(map: &RwLock<HashMap<TypeId, Slot<T>>>, id: TypeId) -> Slot<T> {
    if let Some(slot) = map.read().unwrap_or_else(PoisonError::into_inner).get(&id) {
        return slot.clone();
    }
    map.write()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(id)
        .or_default()
        .clone()
}
