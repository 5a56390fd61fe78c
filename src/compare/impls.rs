//! [`Inspect`] for std types.

use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt::Debug;
use std::hash::{BuildHasher, Hash};
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use super::{Inspect, Member, Primitive, Shape};

macro_rules! primitive {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Inspect for $ty {
                fn inspect(&self, visit: &mut dyn FnMut(Shape<'_>)) {
                    visit(Shape::Primitive(self));
                }
            }
        )*
    };
}

primitive!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
    String, (), Duration, &'static str,
);

impl<T: Inspect> Inspect for Option<T> {
    fn inspect(&self, visit: &mut dyn FnMut(Shape<'_>)) {
        visit(Shape::Optional(self.as_ref().map(|value| value as &dyn Inspect)));
    }
}

impl<T: Inspect, E: Inspect> Inspect for Result<T, E> {
    fn inspect(&self, visit: &mut dyn FnMut(Shape<'_>)) {
        match self {
            Ok(value) => visit(Shape::Variant {
                case: "Ok",
                members: vec![Member::positional(0, value)],
            }),
            Err(error) => visit(Shape::Variant {
                case: "Err",
                members: vec![Member::positional(0, error)],
            }),
        }
    }
}

impl<T: Inspect> Inspect for Vec<T> {
    fn inspect(&self, visit: &mut dyn FnMut(Shape<'_>)) {
        visit(Shape::Sequence(elements(self)));
    }
}

impl<T: Inspect> Inspect for VecDeque<T> {
    fn inspect(&self, visit: &mut dyn FnMut(Shape<'_>)) {
        visit(Shape::Sequence(elements(self)));
    }
}

impl<T: Inspect, const N: usize> Inspect for [T; N] {
    fn inspect(&self, visit: &mut dyn FnMut(Shape<'_>)) {
        visit(Shape::Sequence(elements(self)));
    }
}

impl<T: Inspect + Eq + Hash, S: BuildHasher> Inspect for HashSet<T, S> {
    fn inspect(&self, visit: &mut dyn FnMut(Shape<'_>)) {
        visit(Shape::Set(elements(self)));
    }
}

impl<T: Inspect + Ord> Inspect for BTreeSet<T> {
    fn inspect(&self, visit: &mut dyn FnMut(Shape<'_>)) {
        visit(Shape::Set(elements(self)));
    }
}

impl<K, V, S> Inspect for HashMap<K, V, S>
where
    K: PartialEq + Debug + 'static,
    V: Inspect,
    S: BuildHasher,
{
    fn inspect(&self, visit: &mut dyn FnMut(Shape<'_>)) {
        visit(Shape::Map(
            self.iter()
                .map(|(key, value)| (key as &dyn Primitive, value as &dyn Inspect))
                .collect(),
        ));
    }
}

impl<K, V> Inspect for BTreeMap<K, V>
where
    K: PartialEq + Debug + 'static,
    V: Inspect,
{
    fn inspect(&self, visit: &mut dyn FnMut(Shape<'_>)) {
        visit(Shape::Map(
            self.iter()
                .map(|(key, value)| (key as &dyn Primitive, value as &dyn Inspect))
                .collect(),
        ));
    }
}

impl<T: Inspect> Inspect for Box<T> {
    fn type_name(&self) -> Cow<'static, str> {
        (**self).type_name()
    }

    fn inspect(&self, visit: &mut dyn FnMut(Shape<'_>)) {
        (**self).inspect(visit);
    }
}

impl<T: Inspect> Inspect for Rc<T> {
    fn type_name(&self) -> Cow<'static, str> {
        (**self).type_name()
    }

    fn inspect(&self, visit: &mut dyn FnMut(Shape<'_>)) {
        visit(Shape::Shared {
            identity: Rc::as_ptr(self) as usize,
            target: &**self,
        });
    }
}

impl<T: Inspect> Inspect for Arc<T> {
    fn type_name(&self) -> Cow<'static, str> {
        (**self).type_name()
    }

    fn inspect(&self, visit: &mut dyn FnMut(Shape<'_>)) {
        visit(Shape::Shared {
            identity: Arc::as_ptr(self) as usize,
            target: &**self,
        });
    }
}

impl<T: Inspect> Inspect for RefCell<T> {
    fn type_name(&self) -> Cow<'static, str> {
        match self.try_borrow() {
            Ok(inner) => inner.type_name(),
            Err(_) => Cow::Owned(super::short_type_name(std::any::type_name::<T>())),
        }
    }

    /// A value that is mutably borrowed elsewhere is opaque.
    fn inspect(&self, visit: &mut dyn FnMut(Shape<'_>)) {
        match self.try_borrow() {
            Ok(inner) => inner.inspect(visit),
            Err(_) => visit(Shape::Opaque),
        }
    }
}

impl<T: ?Sized> Inspect for PhantomData<T> {
    fn inspect(&self, visit: &mut dyn FnMut(Shape<'_>)) {
        visit(Shape::Opaque);
    }
}

macro_rules! tuple {
    ($($name:ident : $index:tt),+) => {
        impl<$($name: Inspect),+> Inspect for ($($name,)+) {
            fn inspect(&self, visit: &mut dyn FnMut(Shape<'_>)) {
                visit(Shape::Struct {
                    parent: None,
                    members: vec![$(Member::positional($index, &self.$index)),+],
                });
            }
        }
    };
}

tuple!(A: 0);
tuple!(A: 0, B: 1);
tuple!(A: 0, B: 1, C: 2);
tuple!(A: 0, B: 1, C: 2, D: 3);
tuple!(A: 0, B: 1, C: 2, D: 3, E: 4);
tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6);
tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7);

fn elements<'a, T: Inspect + 'a>(items: impl IntoIterator<Item = &'a T>) -> Vec<&'a dyn Inspect> {
    items.into_iter().map(|item| item as &dyn Inspect).collect()
}
