//! The recursive comparison walk.

use std::collections::HashSet;

use super::path::{Difference, Path, Segment};
use super::{render, with_shape, Inspect, Label, Member, Primitive, Shape};

/// Walks two value graphs in lockstep.
///
/// `in_progress` holds the `(lhs, rhs)` identity pairs of shared nodes
/// currently on the walk stack. Meeting a pair again means the graphs are
/// cyclic at that point; the pair is treated as equal so the walk terminates.
#[derive(Default)]
pub(super) struct Comparator {
    in_progress: HashSet<(usize, usize)>,
}

impl Comparator {
    pub(super) fn compare(
        &mut self,
        lhs: &dyn Inspect,
        rhs: &dyn Inspect,
        path: &mut Path,
    ) -> Option<Difference> {
        with_shape(lhs, |left| {
            with_shape(rhs, |right| self.compare_shapes(lhs, left, rhs, right, path))
        })
    }

    fn compare_shapes(
        &mut self,
        lhs: &dyn Inspect,
        left: Shape<'_>,
        rhs: &dyn Inspect,
        right: Shape<'_>,
        path: &mut Path,
    ) -> Option<Difference> {
        match (left, right) {
            (Shape::Opaque, _) | (_, Shape::Opaque) => None,
            (Shape::Primitive(l), Shape::Primitive(r)) => (!l.eq_primitive(r))
                .then(|| Difference::new(path.clone(), Some(format!("{l:?}")), Some(format!("{r:?}")))),
            (
                Shape::Shared {
                    identity: l_id,
                    target: l,
                },
                Shape::Shared {
                    identity: r_id,
                    target: r,
                },
            ) => self.compare_shared((l_id, r_id), l, r, path),
            (Shape::Shared { target, .. }, _) => self.compare(target, rhs, path),
            (_, Shape::Shared { target, .. }) => self.compare(lhs, target, path),
            (Shape::Optional(l), Shape::Optional(r)) => match (l, r) {
                (None, None) => None,
                (Some(l), Some(r)) => self.compare(l, r, path),
                (l, r) => Some(Difference::new(
                    path.clone(),
                    l.map(|value| render(value)),
                    r.map(|value| render(value)),
                )),
            },
            (Shape::Map(l), Shape::Map(r)) => self.compare_maps(&l, &r, path),
            (Shape::Sequence(l), Shape::Sequence(r)) => self.compare_sequences(&l, &r, path),
            (Shape::Set(l), Shape::Set(r)) => self.compare_sets(&l, &r, path),
            (
                Shape::Struct {
                    parent: l_parent,
                    members: l,
                },
                Shape::Struct {
                    parent: r_parent,
                    members: r,
                },
            ) => {
                if lhs.type_name() != rhs.type_name() {
                    return Some(whole(lhs, rhs, path));
                }
                match (l_parent, r_parent) {
                    (Some(l_parent), Some(r_parent)) => {
                        if let Some(difference) = self.compare(l_parent, r_parent, path) {
                            return Some(difference);
                        }
                    }
                    (None, None) => {}
                    _ => return Some(whole(lhs, rhs, path)),
                }
                self.compare_members(&l, &r, lhs, rhs, path)
            }
            (
                Shape::Variant {
                    case: l_case,
                    members: l,
                },
                Shape::Variant {
                    case: r_case,
                    members: r,
                },
            ) => {
                if lhs.type_name() != rhs.type_name() {
                    return Some(whole(lhs, rhs, path));
                }
                if l_case != r_case {
                    return Some(Difference::new(
                        path.clone(),
                        Some(l_case.to_owned()),
                        Some(r_case.to_owned()),
                    ));
                }
                path.with(Segment::Case(l_case), |path| match (l.as_slice(), r.as_slice()) {
                    ([l_only], [r_only]) if is_bare_payload(l_only) && is_bare_payload(r_only) => {
                        self.compare(l_only.value, r_only.value, path)
                    }
                    _ => self.compare_members(&l, &r, lhs, rhs, path),
                })
            }
            _ => Some(whole(lhs, rhs, path)),
        }
    }

    fn compare_shared(
        &mut self,
        key: (usize, usize),
        lhs: &dyn Inspect,
        rhs: &dyn Inspect,
        path: &mut Path,
    ) -> Option<Difference> {
        if !self.in_progress.insert(key) {
            return None;
        }
        let found = self.compare(lhs, rhs, path);
        self.in_progress.remove(&key);
        found
    }

    fn compare_members(
        &mut self,
        l: &[Member<'_>],
        r: &[Member<'_>],
        lhs: &dyn Inspect,
        rhs: &dyn Inspect,
        path: &mut Path,
    ) -> Option<Difference> {
        if l.len() != r.len() {
            return Some(whole(lhs, rhs, path));
        }
        for (l, r) in l.iter().zip(r) {
            if l.label != r.label {
                return Some(whole(lhs, rhs, path));
            }
            let found = path.with(Segment::Member(l.label.to_string()), |path| {
                self.compare(l.value, r.value, path)
            });
            if found.is_some() {
                return found;
            }
        }
        None
    }

    fn compare_sequences(
        &mut self,
        l: &[&dyn Inspect],
        r: &[&dyn Inspect],
        path: &mut Path,
    ) -> Option<Difference> {
        for index in 0..l.len().max(r.len()) {
            let found = path.with(Segment::Index(index), |path| match (l.get(index), r.get(index)) {
                (Some(l), Some(r)) => self.compare(*l, *r, path),
                (l, r) => Some(Difference::new(
                    path.clone(),
                    l.map(|value| render(*value)),
                    r.map(|value| render(*value)),
                )),
            });
            if found.is_some() {
                return found;
            }
        }
        None
    }

    fn compare_maps(
        &mut self,
        l: &[(&dyn Primitive, &dyn Inspect)],
        r: &[(&dyn Primitive, &dyn Inspect)],
        path: &mut Path,
    ) -> Option<Difference> {
        for (key, value) in l {
            let other = r
                .iter()
                .find(|(candidate, _)| key.eq_primitive(*candidate))
                .map(|(_, other)| *other);
            let found = path.with(Segment::Key(key_label(*key)), |path| match other {
                Some(other) => self.compare(*value, other, path),
                None => Some(Difference::new(path.clone(), Some(render(*value)), None)),
            });
            if found.is_some() {
                return found;
            }
        }
        for (key, value) in r {
            if !l.iter().any(|(candidate, _)| candidate.eq_primitive(*key)) {
                return path.with(Segment::Key(key_label(*key)), |path| {
                    Some(Difference::new(path.clone(), None, Some(render(*value))))
                });
            }
        }
        None
    }

    /// Multiset comparison: every left element must pair with a distinct,
    /// structurally equal right element.
    fn compare_sets(
        &mut self,
        l: &[&dyn Inspect],
        r: &[&dyn Inspect],
        path: &mut Path,
    ) -> Option<Difference> {
        if l.len() != r.len() {
            return path.with(Segment::Count, |path| {
                Some(Difference::new(
                    path.clone(),
                    Some(l.len().to_string()),
                    Some(r.len().to_string()),
                ))
            });
        }
        let mut unmatched = r.to_vec();
        for value in l {
            let mut scratch = path.clone();
            let partner = unmatched
                .iter()
                .position(|candidate| self.compare(*value, *candidate, &mut scratch).is_none());
            match partner {
                Some(index) => {
                    unmatched.swap_remove(index);
                }
                None => return Some(Difference::new(path.clone(), Some(render(*value)), None)),
            }
        }
        None
    }
}

fn is_bare_payload(member: &Member<'_>) -> bool {
    member.label == Label::Position(0)
}

fn whole(lhs: &dyn Inspect, rhs: &dyn Inspect, path: &Path) -> Difference {
    Difference::new(path.clone(), Some(render(lhs)), Some(render(rhs)))
}

/// Path label for a map key. Strings are shown without quotes.
fn key_label(key: &dyn Primitive) -> String {
    let any = key.as_any();
    if let Some(key) = any.downcast_ref::<String>() {
        key.clone()
    } else if let Some(key) = any.downcast_ref::<&'static str>() {
        (*key).to_owned()
    } else {
        format!("{key:?}")
    }
}
