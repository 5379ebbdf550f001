//! Type descriptions for encodable values.
//!
//! Rust has no runtime reflection, so a type takes part in encoding by implementing
//! [`Attribute`]. The trait answers two questions:
//!
//! - [`Attribute::shape`]: which category the *type* belongs to, with handles to the types it
//!   is built from (sequence elements, map keys and values, referenced types, record fields).
//!   This is what the classifier resolves and caches, once per concrete type.
//! - [`Attribute::view`]: borrowed access to a particular *value*, in a form matching the shape.
//!
//! Implementations are provided for integers, strings, byte buffers, `Option`, `Box`, `Arc`,
//! the common std sequences and string-keyed maps. Records implement [`Record`], usually through
//! the [`record!`](crate::record) macro.

use std::any::{type_name, Any, TypeId};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;

use crate::Number;

/// A type that can be encoded into attribute values.
pub trait Attribute: 'static {
    /// Describe this type's category.
    fn shape() -> Shape
    where
        Self: Sized;

    /// Borrow this value in the form its shape promises.
    fn view(&self) -> View<'_>;
}

/// A record: a composite type whose fields become the attributes of a document.
pub trait Record: Attribute + Sized {
    /// Type name used to derive the record's table name.
    const NAME: &'static str;

    /// The record's direct fields, in declaration order.
    fn fields() -> Vec<FieldDef>;

    /// The record's field values, in the same order as [`Record::fields`].
    fn values(&self) -> Vec<&dyn Attribute>;
}

/// The classifier's category for a type.
#[derive(Clone, Copy, Debug)]
pub enum Shape {
    Numeric,
    String,
    /// A byte blob. Sequences of `u8` are also treated as blobs by the classifier.
    Bytes,
    /// A homogeneous sequence of the given element type.
    Sequence(TypeHandle),
    /// An associative map. Only string-shaped keys can be encoded.
    Map { key: TypeHandle, value: TypeHandle },
    /// An optional or pointer-like reference to the given type.
    Indirect(TypeHandle),
    Record(RecordHandle),
    /// Anything that can't be encoded. Carries a short description of the kind.
    Unsupported(&'static str),
}

/// Borrowed access to a value, matching its type's [`Shape`].
pub enum View<'a> {
    Number(Number),
    Str(&'a str),
    /// Borrowed when the bytes are contiguous, owned when they had to be gathered.
    Bytes(Cow<'a, [u8]>),
    Seq(Vec<&'a dyn Attribute>),
    Map(Vec<(&'a dyn Attribute, &'a dyn Attribute)>),
    Indirect(Option<&'a dyn Attribute>),
    /// Field values, in declaration order.
    Record(Vec<&'a dyn Attribute>),
    Unsupported,
}

impl<'a> View<'a> {
    /// Short name of the view's kind, for error messages.
    pub fn name(&self) -> &'static str {
        match *self {
            View::Number(_) => "Number",
            View::Str(_) => "Str",
            View::Bytes(_) => "Bytes",
            View::Seq(_) => "Seq",
            View::Map(_) => "Map",
            View::Indirect(_) => "Indirect",
            View::Record(_) => "Record",
            View::Unsupported => "Unsupported",
        }
    }
}

/// Identity and shape of a concrete type.
#[derive(Clone, Copy)]
pub struct TypeHandle {
    id: TypeId,
    name: &'static str,
    shape: fn() -> Shape,
}

impl TypeHandle {
    pub fn of<T: Attribute>() -> Self {
        TypeHandle {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            shape: T::shape,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Full type name, as reported by [`std::any::type_name`].
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn shape(&self) -> Shape {
        (self.shape)()
    }

    /// Whether values of this type are numeric once any indirection is removed.
    pub fn is_numeric(&self) -> bool {
        match self.shape() {
            Shape::Numeric => true,
            Shape::Indirect(inner) => inner.is_numeric(),
            _ => false,
        }
    }

    /// Whether values of this type are byte blobs once any indirection is removed.
    pub fn is_bytes(&self) -> bool {
        match self.shape() {
            Shape::Bytes => true,
            Shape::Sequence(elem) => elem.id() == TypeId::of::<u8>(),
            Shape::Indirect(inner) => inner.is_bytes(),
            _ => false,
        }
    }
}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Identity and field list of a record type.
#[derive(Clone, Copy)]
pub struct RecordHandle {
    id: TypeId,
    name: &'static str,
    fields: fn() -> Vec<FieldDef>,
}

impl RecordHandle {
    pub fn of<R: Record>() -> Self {
        RecordHandle {
            id: TypeId::of::<R>(),
            name: R::NAME,
            fields: R::fields,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The record's type name, as used for table naming.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> Vec<FieldDef> {
        (self.fields)()
    }
}

impl fmt::Debug for RecordHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A record field declaration: its natural name, its tag, and its type.
#[derive(Clone, Copy, Debug)]
pub struct FieldDef {
    pub name: &'static str,
    pub tag: &'static str,
    pub ty: TypeHandle,
}

impl FieldDef {
    pub fn new<T: Attribute>(name: &'static str, tag: &'static str) -> Self {
        FieldDef {
            name,
            tag,
            ty: TypeHandle::of::<T>(),
        }
    }
}

macro_rules! impl_numeric {
    ($t: ty) => {
        impl Attribute for $t {
            fn shape() -> Shape {
                Shape::Numeric
            }

            fn view(&self) -> View<'_> {
                View::Number(Number::from(*self))
            }
        }
    };
}

impl_numeric!(u8);
impl_numeric!(u16);
impl_numeric!(u32);
impl_numeric!(u64);
impl_numeric!(usize);
impl_numeric!(i8);
impl_numeric!(i16);
impl_numeric!(i32);
impl_numeric!(i64);
impl_numeric!(isize);

macro_rules! impl_unsupported {
    ($t: ty, $kind: expr) => {
        impl Attribute for $t {
            fn shape() -> Shape {
                Shape::Unsupported($kind)
            }

            fn view(&self) -> View<'_> {
                View::Unsupported
            }
        }
    };
}

impl_unsupported!(bool, "bool");
impl_unsupported!(char, "char");
impl_unsupported!(f32, "f32");
impl_unsupported!(f64, "f64");
impl_unsupported!((), "unit");

impl Attribute for String {
    fn shape() -> Shape {
        Shape::String
    }

    fn view(&self) -> View<'_> {
        View::Str(self)
    }
}

impl Attribute for &'static str {
    fn shape() -> Shape {
        Shape::String
    }

    fn view(&self) -> View<'_> {
        View::Str(self)
    }
}

impl Attribute for serde_bytes::ByteBuf {
    fn shape() -> Shape {
        Shape::Bytes
    }

    fn view(&self) -> View<'_> {
        View::Bytes(Cow::Borrowed(self.as_slice()))
    }
}

impl<T: Attribute> Attribute for Option<T> {
    fn shape() -> Shape {
        Shape::Indirect(TypeHandle::of::<T>())
    }

    fn view(&self) -> View<'_> {
        View::Indirect(self.as_ref().map(|v| v as &dyn Attribute))
    }
}

impl<T: Attribute> Attribute for Box<T> {
    fn shape() -> Shape {
        Shape::Indirect(TypeHandle::of::<T>())
    }

    fn view(&self) -> View<'_> {
        View::Indirect(Some(&**self))
    }
}

impl<T: Attribute> Attribute for Arc<T> {
    fn shape() -> Shape {
        Shape::Indirect(TypeHandle::of::<T>())
    }

    fn view(&self) -> View<'_> {
        View::Indirect(Some(&**self))
    }
}

impl<T: Attribute> Attribute for Vec<T> {
    fn shape() -> Shape {
        Shape::Sequence(TypeHandle::of::<T>())
    }

    fn view(&self) -> View<'_> {
        // Hand out byte vectors whole, rather than one element at a time
        if let Some(bytes) = (self as &dyn Any).downcast_ref::<Vec<u8>>() {
            return View::Bytes(Cow::Borrowed(bytes.as_slice()));
        }
        View::Seq(self.iter().map(|v| v as &dyn Attribute).collect())
    }
}

impl<T: Attribute> Attribute for VecDeque<T> {
    fn shape() -> Shape {
        Shape::Sequence(TypeHandle::of::<T>())
    }

    fn view(&self) -> View<'_> {
        if let Some(bytes) = (self as &dyn Any).downcast_ref::<VecDeque<u8>>() {
            return match bytes.as_slices() {
                (front, []) => View::Bytes(Cow::Borrowed(front)),
                _ => View::Bytes(Cow::Owned(bytes.iter().copied().collect())),
            };
        }
        View::Seq(self.iter().map(|v| v as &dyn Attribute).collect())
    }
}

impl<T: Attribute> Attribute for BTreeSet<T> {
    fn shape() -> Shape {
        Shape::Sequence(TypeHandle::of::<T>())
    }

    fn view(&self) -> View<'_> {
        if let Some(bytes) = (self as &dyn Any).downcast_ref::<BTreeSet<u8>>() {
            return View::Bytes(Cow::Owned(bytes.iter().copied().collect()));
        }
        View::Seq(self.iter().map(|v| v as &dyn Attribute).collect())
    }
}

impl<T: Attribute, const N: usize> Attribute for [T; N] {
    fn shape() -> Shape {
        Shape::Sequence(TypeHandle::of::<T>())
    }

    fn view(&self) -> View<'_> {
        if let Some(bytes) = (self as &dyn Any).downcast_ref::<[u8; N]>() {
            return View::Bytes(Cow::Borrowed(&bytes[..]));
        }
        View::Seq(self.iter().map(|v| v as &dyn Attribute).collect())
    }
}

impl<K: Attribute, V: Attribute, S: 'static> Attribute for HashMap<K, V, S> {
    fn shape() -> Shape {
        Shape::Map {
            key: TypeHandle::of::<K>(),
            value: TypeHandle::of::<V>(),
        }
    }

    fn view(&self) -> View<'_> {
        View::Map(
            self.iter()
                .map(|(k, v)| (k as &dyn Attribute, v as &dyn Attribute))
                .collect(),
        )
    }
}

impl<K: Attribute, V: Attribute> Attribute for BTreeMap<K, V> {
    fn shape() -> Shape {
        Shape::Map {
            key: TypeHandle::of::<K>(),
            value: TypeHandle::of::<V>(),
        }
    }

    fn view(&self) -> View<'_> {
        View::Map(
            self.iter()
                .map(|(k, v)| (k as &dyn Attribute, v as &dyn Attribute))
                .collect(),
        )
    }
}
