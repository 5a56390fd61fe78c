//! Debug-like rendering of inspected values.

use std::collections::HashSet;
use std::fmt::Write;

use super::{with_shape, Inspect, Label, Member, Shape};

/// Render a value for diagnostics.
///
/// Output follows `Debug` conventions. Unlike `Debug`, it terminates on
/// cyclic graphs: a shared node met again while it is being rendered is
/// written as `<cycle>`.
///
/// # Example
///
/// ```rust
/// use streamcheck::compare::render;
///
/// assert_eq!(render(&vec![Some(1), None]), "[Some(1), None]");
/// assert_eq!(render(&("a", 2)), "(\"a\", 2)");
/// ```
pub fn render(value: &dyn Inspect) -> String {
    let mut out = String::new();
    Renderer::default().write(value, &mut out);
    out
}

#[derive(Default)]
struct Renderer {
    in_progress: HashSet<usize>,
}

impl Renderer {
    fn write(&mut self, value: &dyn Inspect, out: &mut String) {
        with_shape(value, |shape| match shape {
            Shape::Primitive(primitive) => {
                let _ = write!(out, "{primitive:?}");
            }
            Shape::Optional(None) => out.push_str("None"),
            Shape::Optional(Some(inner)) => {
                out.push_str("Some(");
                self.write(inner, out);
                out.push(')');
            }
            Shape::Sequence(items) => self.write_list(('[', ']'), &items, out),
            Shape::Set(items) => self.write_list(('{', '}'), &items, out),
            Shape::Map(entries) => {
                out.push('{');
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    let _ = write!(out, "{key:?}: ");
                    self.write(*value, out);
                }
                out.push('}');
            }
            Shape::Struct { parent, members } => {
                let mut entries = Vec::new();
                self.collect(parent, &members, &mut entries);
                write_composite(&value.type_name(), &entries, out);
            }
            Shape::Variant { case, members } => {
                let mut entries = Vec::new();
                self.collect(None, &members, &mut entries);
                write_composite(case, &entries, out);
            }
            Shape::Shared { identity, target } => {
                if self.in_progress.insert(identity) {
                    self.write(target, out);
                    self.in_progress.remove(&identity);
                } else {
                    out.push_str("<cycle>");
                }
            }
            Shape::Opaque => out.push_str("<opaque>"),
        });
    }

    fn write_list(&mut self, (open, close): (char, char), items: &[&dyn Inspect], out: &mut String) {
        out.push(open);
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write(*item, out);
        }
        out.push(close);
    }

    /// Flatten parent members ahead of own members.
    fn collect(
        &mut self,
        parent: Option<&dyn Inspect>,
        members: &[Member<'_>],
        entries: &mut Vec<(Label, String)>,
    ) {
        if let Some(parent) = parent {
            with_shape(parent, |shape| match shape {
                Shape::Struct { parent, members } => self.collect(parent, &members, entries),
                _ => {
                    let mut rendered = String::new();
                    self.write(parent, &mut rendered);
                    entries.push((Label::Named("super"), rendered));
                }
            });
        }
        for member in members {
            let mut rendered = String::new();
            self.write(member.value, &mut rendered);
            entries.push((member.label, rendered));
        }
    }
}

fn write_composite(name: &str, entries: &[(Label, String)], out: &mut String) {
    if entries.is_empty() {
        out.push_str(name);
        return;
    }

    if entries
        .iter()
        .all(|(label, _)| matches!(label, Label::Position(_)))
    {
        let body = entries
            .iter()
            .map(|(_, value)| value.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        if name.starts_with('(') {
            let _ = write!(out, "({body})");
        } else {
            let _ = write!(out, "{name}({body})");
        }
    } else {
        let body = entries
            .iter()
            .map(|(label, value)| format!("{label}: {value}"))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = write!(out, "{name} {{ {body} }}");
    }
}
