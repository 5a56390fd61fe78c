//! Structural equality and diffing over arbitrary value graphs.
//!
//! The comparator walks two values member by member and reports either
//! [`Comparison::Equal`] or the first point of divergence as a
//! path-qualified [`Difference`]:
//!
//! ```rust
//! use streamcheck::compare::{compare, Comparison};
//! use streamcheck::Inspect;
//!
//! #[derive(Inspect)]
//! struct Order {
//!     id: u32,
//!     items: Vec<&'static str>,
//! }
//!
//! let lhs = Order { id: 7, items: vec!["tea", "milk"] };
//! let rhs = Order { id: 7, items: vec!["tea", "sugar"] };
//!
//! match compare(&lhs, &rhs) {
//!     Comparison::Unequal(difference) => {
//!         assert_eq!(difference.path.to_string(), "Order.items.1");
//!     }
//!     Comparison::Equal => unreachable!(),
//! }
//! ```
//!
//! Values opt in through the [`Inspect`] trait, either with
//! `#[derive(Inspect)]` or by hand. No runtime reflection is involved.

mod engine;
mod impls;
mod path;
mod render;

use std::any::Any;
use std::borrow::Cow;
use std::fmt::{self, Debug};

pub use path::{Comparison, Difference, Path, Segment};
pub use render::render;

use engine::Comparator;

/// A value whose structure the comparator can walk.
///
/// Implementations hand a [`Shape`] describing themselves to `visit`,
/// exactly once. The visitor form lets values that live behind guards
/// (such as `RefCell`) be inspected without cloning.
///
/// # Example
///
/// ```rust
/// use streamcheck::compare::{equals, Member, Shape};
/// use streamcheck::Inspect;
///
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// impl Inspect for Point {
///     fn inspect(&self, visit: &mut dyn FnMut(Shape<'_>)) {
///         visit(Shape::Struct {
///             parent: None,
///             members: vec![Member::named("x", &self.x), Member::named("y", &self.y)],
///         });
///     }
/// }
///
/// assert!(equals(&Point { x: 1, y: 2 }, &Point { x: 1, y: 2 }));
/// ```
pub trait Inspect {
    /// Short runtime type name, used as the first path segment.
    fn type_name(&self) -> Cow<'static, str> {
        Cow::Owned(short_type_name(std::any::type_name::<Self>()))
    }

    /// Describe this value's shape to `visit`.
    fn inspect(&self, visit: &mut dyn FnMut(Shape<'_>));
}

/// A leaf value compared with plain equality.
///
/// Implemented for every `PartialEq + Debug + 'static` type, so scalar
/// [`Inspect`] impls only need to hand `self` over.
pub trait Primitive: Debug {
    /// Upcast used for same-type checks.
    fn as_any(&self) -> &dyn Any;

    /// Equality against another primitive of possibly different type.
    fn eq_primitive(&self, other: &dyn Primitive) -> bool;
}

impl<T: PartialEq + Debug + 'static> Primitive for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_primitive(&self, other: &dyn Primitive) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }
}

/// Structural description of one value.
pub enum Shape<'a> {
    /// Compared directly with `PartialEq`.
    Primitive(&'a dyn Primitive),
    /// A present or absent value. Transparent in paths.
    Optional(Option<&'a dyn Inspect>),
    /// Ordered elements, compared by index.
    Sequence(Vec<&'a dyn Inspect>),
    /// Unordered elements.
    Set(Vec<&'a dyn Inspect>),
    /// Key-value entries with primitive keys.
    Map(Vec<(&'a dyn Primitive, &'a dyn Inspect)>),
    /// A product type. `parent` is compared first, at the same path.
    Struct {
        /// Base part of an inheritance-style chain.
        parent: Option<&'a dyn Inspect>,
        /// Own members in declaration order.
        members: Vec<Member<'a>>,
    },
    /// A sum type with its active case and payload.
    Variant {
        /// Name of the active case.
        case: &'static str,
        /// Payload members, empty when the case carries none.
        members: Vec<Member<'a>>,
    },
    /// A reference-counted node. `identity` breaks cycles.
    Shared {
        /// Address of the shared allocation.
        identity: usize,
        /// The pointee.
        target: &'a dyn Inspect,
    },
    /// Cannot be compared; treated as equal to anything.
    Opaque,
}

impl Shape<'_> {
    fn kind(&self) -> &'static str {
        match self {
            Self::Primitive(_) => "primitive",
            Self::Optional(_) => "optional",
            Self::Sequence(_) => "sequence",
            Self::Set(_) => "set",
            Self::Map(_) => "map",
            Self::Struct { .. } => "struct",
            Self::Variant { .. } => "variant",
            Self::Shared { .. } => "shared",
            Self::Opaque => "opaque",
        }
    }
}

impl Debug for Shape<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

/// Label of a struct or variant member.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Label {
    /// Named field.
    Named(&'static str),
    /// Tuple field index.
    Position(usize),
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Position(index) => write!(f, "{index}"),
        }
    }
}

/// One labelled member of a [`Shape::Struct`] or [`Shape::Variant`].
pub struct Member<'a> {
    /// Field name or position.
    pub label: Label,
    /// Field value.
    pub value: &'a dyn Inspect,
}

impl<'a> Member<'a> {
    /// A named field.
    pub fn named(name: &'static str, value: &'a dyn Inspect) -> Self {
        Self {
            label: Label::Named(name),
            value,
        }
    }

    /// A positional (tuple) field.
    pub fn positional(index: usize, value: &'a dyn Inspect) -> Self {
        Self {
            label: Label::Position(index),
            value,
        }
    }
}

/// Wrapper for members that cannot be compared, such as callbacks.
///
/// Always equal to any other value.
#[derive(Clone, Copy, Default)]
pub struct Opaque<T>(pub T);

impl<T> Debug for Opaque<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Opaque(..)")
    }
}

impl<T> Inspect for Opaque<T> {
    fn inspect(&self, visit: &mut dyn FnMut(Shape<'_>)) {
        visit(Shape::Opaque);
    }
}

/// Compare two values of the same type.
///
/// The reported path always starts with the type name of `lhs`.
pub fn compare<T: Inspect>(lhs: &T, rhs: &T) -> Comparison {
    compare_dyn(lhs, rhs)
}

/// Compare two values of possibly different types.
///
/// A root-level type mismatch is reported with an empty path.
pub fn compare_dyn(lhs: &dyn Inspect, rhs: &dyn Inspect) -> Comparison {
    let lhs_type = lhs.type_name();
    if lhs_type != rhs.type_name() {
        return Comparison::Unequal(Difference::new(
            Path::root(),
            Some(render(lhs)),
            Some(render(rhs)),
        ));
    }

    let mut path = Path::root();
    path.push(Segment::Type(lhs_type.into_owned()));
    Comparator::default().compare(lhs, rhs, &mut path).into()
}

/// `true` when [`compare`] finds no difference.
pub fn equals<T: Inspect>(lhs: &T, rhs: &T) -> bool {
    compare(lhs, rhs).is_equal()
}

/// Assert two values are structurally equal.
///
/// # Panics
///
/// Panics with the path-qualified difference when they are not.
///
/// # Example
///
/// ```rust
/// use streamcheck::assert_structurally_eq;
///
/// assert_structurally_eq!(vec![1, 2, 3], vec![1, 2, 3]);
/// ```
#[macro_export]
macro_rules! assert_structurally_eq {
    ($left:expr, $right:expr) => {{
        if let $crate::compare::Comparison::Unequal(difference) =
            $crate::compare::compare(&$left, &$right)
        {
            panic!("assertion failed: values differ at {}", difference);
        }
    }};
    ($left:expr, $right:expr, $($arg:tt)+) => {{
        if let $crate::compare::Comparison::Unequal(difference) =
            $crate::compare::compare(&$left, &$right)
        {
            panic!(
                "assertion failed: values differ at {}: {}",
                difference,
                format_args!($($arg)+)
            );
        }
    }};
}

/// Run `f` on the shape `value` reports.
///
/// A value that never calls its visitor is treated as [`Shape::Opaque`].
pub(crate) fn with_shape<R>(value: &dyn Inspect, f: impl FnOnce(Shape<'_>) -> R) -> R {
    let mut f = Some(f);
    let mut out = None;
    value.inspect(&mut |shape| {
        if let Some(f) = f.take() {
            out = Some(f(shape));
        }
    });
    if let Some(f) = f {
        return f(Shape::Opaque);
    }
    out.expect("visitor ran exactly once")
}

/// Strip module paths from a `std::any::type_name` string.
///
/// `alloc::vec::Vec<my_crate::Order>` becomes `Vec<Order>`.
pub(crate) fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment_start = 0;
    let mut chars = full.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            ':' if chars.peek() == Some(&':') => {
                chars.next();
                out.truncate(segment_start);
            }
            c if c.is_alphanumeric() || c == '_' => out.push(c),
            other => {
                out.push(other);
                segment_start = out.len();
            }
        }
    }
    out
}
