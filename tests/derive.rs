//! Integration tests for `#[derive(Inspect)]`.

#![cfg(feature = "derive")]

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use streamcheck::compare::{compare, equals, render, Comparison, Difference, Opaque};
use streamcheck::Inspect;

#[derive(Inspect)]
struct Order {
    id: u32,
    items: Vec<&'static str>,
}

#[derive(Inspect)]
struct Named {
    name: String,
}

#[derive(Inspect)]
struct Employee {
    #[inspect(parent)]
    person: Named,
    salary: u32,
}

#[derive(Inspect)]
enum Event {
    Joined(Employee),
    Left { id: u32, reason: Option<String> },
    Idle,
}

#[derive(Inspect)]
struct Cached {
    key: &'static str,
    #[inspect(skip)]
    hits: u64,
}

#[derive(Inspect)]
struct Wrapper<T>(T);

#[derive(Inspect)]
struct Node {
    value: i32,
    next: Option<Rc<RefCell<Node>>>,
}

fn diff_of<T: Inspect>(lhs: &T, rhs: &T) -> Difference {
    match compare(lhs, rhs) {
        Comparison::Unequal(difference) => difference,
        Comparison::Equal => panic!("expected a difference"),
    }
}

fn employee(name: &str, salary: u32) -> Employee {
    Employee {
        person: Named { name: name.into() },
        salary,
    }
}

#[test]
fn test_struct_member_path() {
    let lhs = Order {
        id: 7,
        items: vec!["tea", "milk"],
    };
    let rhs = Order {
        id: 7,
        items: vec!["tea", "sugar"],
    };

    let difference = diff_of(&lhs, &rhs);
    assert_eq!(difference.path.to_string(), "Order.items.1");
    assert_eq!(difference.lhs.as_deref(), Some("\"milk\""));
    assert_eq!(difference.rhs.as_deref(), Some("\"sugar\""));
}

#[test]
fn test_missing_sequence_element_is_absent() {
    let lhs = Order {
        id: 1,
        items: vec!["tea"],
    };
    let rhs = Order {
        id: 1,
        items: vec!["tea", "milk"],
    };

    let difference = diff_of(&lhs, &rhs);
    assert_eq!(difference.path.to_string(), "Order.items.1");
    assert_eq!(difference.lhs, None);
    assert_eq!(difference.rhs.as_deref(), Some("\"milk\""));
}

#[test]
fn test_parent_compared_at_same_path() {
    let difference = diff_of(&employee("Ada", 10), &employee("Grace", 10));
    assert_eq!(difference.path.to_string(), "Employee.name");
    assert_eq!(
        render(&employee("Ada", 10)),
        "Employee { name: \"Ada\", salary: 10 }"
    );
}

#[test]
fn test_variant_case_mismatch_stays_at_parent() {
    let difference = diff_of(&Event::Joined(employee("Ada", 1)), &Event::Idle);
    assert_eq!(difference.path.to_string(), "Event");
    assert_eq!(difference.lhs.as_deref(), Some("Joined"));
    assert_eq!(difference.rhs.as_deref(), Some("Idle"));
}

#[test]
fn test_variant_payload_paths() {
    let difference = diff_of(
        &Event::Joined(employee("Ada", 1)),
        &Event::Joined(employee("Ada", 2)),
    );
    assert_eq!(difference.path.to_string(), "Event.Joined.salary");

    let left = Event::Left {
        id: 3,
        reason: None,
    };
    let right = Event::Left {
        id: 3,
        reason: Some("moved".into()),
    };
    let difference = diff_of(&left, &right);
    assert_eq!(difference.path.to_string(), "Event.Left.reason");
    assert_eq!(difference.lhs, None);
    assert_eq!(difference.rhs.as_deref(), Some("\"moved\""));
}

#[test]
fn test_skipped_field_is_ignored() {
    let lhs = Cached { key: "a", hits: 1 };
    let rhs = Cached { key: "a", hits: 99 };
    assert!(equals(&lhs, &rhs));
    assert_eq!(render(&lhs), "Cached { key: \"a\" }");
}

#[test]
fn test_generic_tuple_struct() {
    let difference = diff_of(&Wrapper(1), &Wrapper(2));
    assert_eq!(difference.path.to_string(), "Wrapper<i32>.0");
    assert_eq!(render(&Wrapper("x")), "Wrapper<&str>(\"x\")");
}

#[test]
fn test_map_comparison_ignores_order() {
    let mut lhs = HashMap::new();
    let mut rhs = HashMap::new();
    for key in ["a", "b", "c", "d"] {
        lhs.insert(key.to_string(), key.len());
    }
    for key in ["d", "c", "b", "a"] {
        rhs.insert(key.to_string(), key.len());
    }
    assert!(equals(&lhs, &rhs));

    rhs.insert("c".to_string(), 9);
    let difference = diff_of(&lhs, &rhs);
    assert_eq!(difference.path.to_string(), "HashMap<String, usize>.c");
}

#[test]
fn test_set_count_mismatch() {
    let lhs: BTreeSet<_> = [1, 2].into_iter().collect();
    let rhs: BTreeSet<_> = [1, 2, 3].into_iter().collect();
    let difference = diff_of(&lhs, &rhs);
    assert_eq!(difference.path.to_string(), "BTreeSet<i32>.count");
}

#[test]
fn test_opaque_member_never_differs() {
    #[derive(Inspect)]
    struct Handler {
        name: &'static str,
        callback: Opaque<fn() -> u8>,
    }

    fn one() -> u8 {
        1
    }
    fn two() -> u8 {
        2
    }

    let lhs = Handler {
        name: "tick",
        callback: Opaque(one),
    };
    let rhs = Handler {
        name: "tick",
        callback: Opaque(two),
    };
    assert!(equals(&lhs, &rhs));
}

#[test]
fn test_cyclic_graphs_terminate() {
    fn ring(value: i32) -> Rc<RefCell<Node>> {
        let node = Rc::new(RefCell::new(Node { value, next: None }));
        node.borrow_mut().next = Some(Rc::clone(&node));
        node
    }

    let a = ring(1);
    let b = ring(1);
    let c = ring(2);

    assert!(equals(&a, &b));
    let difference = diff_of(&a, &c);
    assert_eq!(difference.path.to_string(), "Node.value");

    for node in [a, b, c] {
        node.borrow_mut().next = None;
    }
}
