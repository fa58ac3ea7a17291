use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use quire_model::{ContainerContext, Design, ModelError, Notification};

use crate::common::{body, design, snapshot, style};

const NAMES: [&str; 4] = ["a", "b", "c", "d"];
const STYLES: [&str; 3] = ["s1", "s2", "s3"];

#[derive(Debug, Clone)]
enum Op {
	Add(usize),
	Width(usize, f64),
	Color(usize, usize),
	Rename(usize, usize),
	Style(usize, usize),
	Drop(usize),
	Move(usize, usize),
}

fn op() -> impl Strategy<Value = Op> {
	prop_oneof![
		(0..NAMES.len()).prop_map(Op::Add),
		(0..8usize, -5.0..50.0f64).prop_map(|(i, w)| Op::Width(i, w)),
		(0..8usize, 0..3usize).prop_map(|(i, c)| Op::Color(i, c)),
		(0..8usize, 0..NAMES.len()).prop_map(|(i, n)| Op::Rename(i, n)),
		(0..8usize, 0..STYLES.len()).prop_map(|(i, s)| Op::Style(i, s)),
		(0..8usize).prop_map(Op::Drop),
		(0..8usize, 0..8usize).prop_map(|(i, j)| Op::Move(i, j)),
	]
}

/// Applies `op` to the body content; ops that target a missing element do
/// nothing.
fn apply(d: &mut Design, op: &Op) -> Result<(), ModelError> {
	let root = d.root();
	let body = ContainerContext::named_slot(d, root, "body")?;
	let items = body.contents(d);
	let len = items.len();
	let pick = |i: usize| (len > 0).then(|| items[i % len]);
	match *op {
		Op::Add(n) => d.create_in(&body, "label", Some(NAMES[n]), None).map(|_| ()),
		Op::Width(i, w) => match pick(i) {
			Some(id) => d.set_property(id, "width", Some(w.into())),
			None => Ok(()),
		},
		Op::Color(i, c) => match pick(i) {
			Some(id) => d.set_property(id, "color", Some(["red", "green", "blue"][c].into())),
			None => Ok(()),
		},
		Op::Rename(i, n) => match pick(i) {
			Some(id) => d.rename(id, Some(NAMES[n])),
			None => Ok(()),
		},
		Op::Style(i, s) => match pick(i) {
			Some(id) => d.set_property(id, "style", Some(STYLES[s].into())),
			None => Ok(()),
		},
		Op::Drop(i) => match pick(i) {
			Some(id) => d.drop_element(id),
			None => Ok(()),
		},
		Op::Move(i, j) if len > 0 => d.move_content(&body, i % len, j % len),
		Op::Move(..) => Ok(()),
	}
}

fn seeded() -> Design {
	let mut d = design();
	style(&mut d, "s1", "navy");
	style(&mut d, "s2", "teal");
	body(&mut d, "label", "a");
	body(&mut d, "label", "b");
	d
}

proptest! {
	#![proptest_config(ProptestConfig::with_cases(64))]

	#[test]
	fn test_batches_commit_whole_or_not_at_all(
		ops in prop::collection::vec(op(), 1..10),
		fail_last in any::<bool>(),
	) {
		let mut d = seeded();
		let before = snapshot(&d);
		let history = d.activity().undo_len();

		let outcome = d.transact("batch", |d| {
			for op in &ops {
				apply(d, op)?;
			}
			if fail_last {
				d.create_element("missing-kind", None)?;
			}
			Ok(())
		});

		if outcome.is_err() {
			prop_assert_eq!(snapshot(&d), before);
			prop_assert_eq!(d.activity().undo_len(), history);
			return Ok(());
		}
		let after = snapshot(&d);
		if d.activity().undo_len() > history {
			d.undo().unwrap();
			prop_assert_eq!(snapshot(&d), before);
			d.redo().unwrap();
			prop_assert_eq!(snapshot(&d), after);
		} else {
			prop_assert_eq!(after, before);
		}
	}

	#[test]
	fn test_undo_all_then_redo_all(ops in prop::collection::vec(op(), 1..12)) {
		let mut d = seeded();
		let mut states = vec![snapshot(&d)];
		let start = d.activity().undo_len();
		for op in &ops {
			let len = d.activity().undo_len();
			if apply(&mut d, op).is_ok() && d.activity().undo_len() > len {
				states.push(snapshot(&d));
			}
		}

		let steps = d.activity().undo_len() - start;
		prop_assert_eq!(steps, states.len() - 1);
		for expected in states.iter().rev().skip(1) {
			prop_assert!(d.undo().unwrap().is_some());
			prop_assert_eq!(&snapshot(&d), expected);
		}
		for expected in states.iter().skip(1) {
			prop_assert!(d.redo().unwrap().is_some());
			prop_assert_eq!(&snapshot(&d), expected);
		}
		prop_assert!(!d.can_redo());
	}
}

#[test]
fn test_listeners_hear_only_committed_changes() {
	let mut d = seeded();
	let events = Rc::new(RefCell::new(Vec::new()));
	let sink = events.clone();
	d.add_listener(move |event: &Notification| sink.borrow_mut().push(event.clone()));
	let root = d.root();
	let target = ContainerContext::named_slot(&d, root, "body")
		.unwrap()
		.get(&d, 0)
		.unwrap();

	let handle = d.start_trans("outer").unwrap();
	d.set_property(target, "width", Some(3.0.into())).unwrap();
	let inner = d.start_trans("inner").unwrap();
	d.set_property(target, "text", Some("hi".into())).unwrap();
	d.commit(inner).unwrap();
	assert!(events.borrow().is_empty());
	d.commit(handle).unwrap();

	let properties: Vec<String> = events
		.borrow()
		.iter()
		.filter_map(|e| match e {
			Notification::PropertyChanged { element, property } if *element == target => Some(property.clone()),
			_ => None,
		})
		.collect();
	assert_eq!(properties, vec!["width".to_string(), "text".to_string()]);
	assert_eq!(d.activity().undo_label(), Some("outer"));

	events.borrow_mut().clear();
	let handle = d.start_trans("discarded").unwrap();
	d.set_property(target, "width", Some(9.0.into())).unwrap();
	d.rollback(handle).unwrap();
	assert!(events.borrow().is_empty());
	assert_eq!(d.resolve_value(target, "width").unwrap(), Some(3.0.into()));
}

#[test]
fn test_undo_rejected_mid_transaction() {
	let mut d = seeded();
	let handle = d.start_trans("open").unwrap();
	assert!(matches!(d.undo(), Err(ModelError::Transaction(_))));
	d.rollback(handle).unwrap();
	assert_eq!(d.undo().unwrap().as_deref(), Some("create element"));
}
