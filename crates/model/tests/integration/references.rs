use pretty_assertions::assert_eq;
use quire_model::{Design, ModelConfig, RenamePolicy, UnresolvedRef};
use quire_primitives::{ElementId, ElementRef, PropertyValue};
use rstest::rstest;

use crate::common::{body, design, slot, style};

fn style_of(d: &Design, id: ElementId) -> Option<ElementRef> {
	d.element(id).unwrap().style().cloned()
}

fn clients_of(d: &mut Design, style: &str, count: usize) -> Vec<ElementId> {
	(0..count)
		.map(|i| {
			let id = body(d, "label", &format!("l{i}"));
			d.set_property(id, "style", Some(style.into())).unwrap();
			id
		})
		.collect()
}

#[rstest]
#[case::follow_one(RenamePolicy::Follow, 1)]
#[case::follow_many(RenamePolicy::Follow, 5)]
#[case::unresolve_one(RenamePolicy::Unresolve, 1)]
#[case::unresolve_many(RenamePolicy::Unresolve, 5)]
fn test_rename_repairs_every_client(#[case] policy: RenamePolicy, #[case] count: usize) {
	let config = ModelConfig {
		rename_policy: policy,
		..ModelConfig::default()
	};
	let mut d = design().with_config(config);
	let s = style(&mut d, "plain", "grey");
	let clients = clients_of(&mut d, "plain", count);

	d.rename(s, Some("muted")).unwrap();
	for &client in &clients {
		let expected = match policy {
			RenamePolicy::Follow => ElementRef::resolved("muted", s),
			RenamePolicy::Unresolve => ElementRef::unresolved("plain"),
		};
		assert_eq!(style_of(&d, client), Some(expected));
	}
	assert_eq!(d.has_references(s), policy == RenamePolicy::Follow);

	d.undo().unwrap();
	assert_eq!(d.element(s).unwrap().name(), Some("plain"));
	for &client in &clients {
		assert_eq!(style_of(&d, client), Some(ElementRef::resolved("plain", s)));
		assert_eq!(d.resolve_value(client, "color").unwrap(), Some("grey".into()));
	}
	assert_eq!(d.clients(s).len(), count);
}

#[test]
fn test_drop_leaves_name_for_successor() {
	let mut d = design();
	let old = style(&mut d, "plain", "grey");
	let clients = clients_of(&mut d, "plain", 3);

	d.drop_element(old).unwrap();
	for &client in &clients {
		assert_eq!(style_of(&d, client), Some(ElementRef::unresolved("plain")));
		assert_eq!(d.resolve_value(client, "color").unwrap(), None);
	}

	let successor = style(&mut d, "plain", "black");
	for &client in &clients {
		assert_eq!(style_of(&d, client), Some(ElementRef::resolved("plain", successor)));
		assert_eq!(d.resolve_value(client, "color").unwrap(), Some("black".into()));
	}
}

#[test]
fn test_save_report_lists_dangling_references() {
	let mut d = design();
	let a = body(&mut d, "label", "a");
	let b = body(&mut d, "label", "b");
	d.set_property(a, "style", Some("pending".into())).unwrap();
	d.set_property(b, "data-set", Some("orders".into())).unwrap();

	let report = d.prepare_to_save().unwrap();
	assert!(!report.is_clean());
	let mut unresolved = report.unresolved;
	unresolved.sort();
	assert_eq!(
		unresolved,
		vec![
			UnresolvedRef {
				element: a,
				property: "style".to_string(),
				name: "pending".to_string(),
			},
			UnresolvedRef {
				element: b,
				property: "data-set".to_string(),
				name: "orders".to_string(),
			},
		]
	);

	let history = d.activity().undo_len();
	style(&mut d, "pending", "red");
	let root = d.root();
	let sets = slot(&d, root, "data-sets");
	d.create_in(&sets, "data-set", Some("orders"), None).unwrap();
	assert!(d.prepare_to_save().unwrap().is_clean());
	assert_eq!(d.activity().undo_len(), history + 3);
	assert!(matches!(
		d.local_value(b, "data-set").unwrap(),
		Some(PropertyValue::Ref(r)) if r.is_resolved()
	));
}
