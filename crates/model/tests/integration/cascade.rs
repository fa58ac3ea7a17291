use pretty_assertions::assert_eq;
use proptest::prelude::*;
use quire_model::{Design, ValueSource};
use quire_primitives::{ElementId, PropertyValue};

use crate::common::{body, create, design, style};

fn color(design: &Design, id: ElementId) -> Option<(PropertyValue, ValueSource)> {
	design
		.resolve(id, "color")
		.expect("color is a known property")
		.map(|r| (r.value, r.source))
}

#[test]
fn test_rolled_back_local_keeps_inherited_value() {
	let mut d = design();
	let listing = body(&mut d, "listing", "c");
	let parent = body(&mut d, "group", "b");
	d.set_property(parent, "color", Some("red".into())).unwrap();
	let child = create(&mut d, listing, "groups", "group", "a");
	d.set_property(child, "extends", Some("b".into())).unwrap();

	let inherited = Some((PropertyValue::from("red"), ValueSource::Inherited(parent)));
	assert_eq!(color(&d, child), inherited);

	let history = d.activity().undo_len();
	let handle = d.start_trans("recolor").unwrap();
	d.set_property(child, "color", Some("blue".into())).unwrap();
	assert_eq!(
		color(&d, child),
		Some((PropertyValue::from("blue"), ValueSource::Local(child)))
	);
	d.rollback(handle).unwrap();

	assert_eq!(color(&d, child), inherited);
	assert_eq!(d.activity().undo_len(), history);
}

#[test]
fn test_fallback_chain_in_order() {
	let mut d = design();
	let outer = body(&mut d, "group", "outer");
	let head = create(&mut d, outer, "header", "label", "head");

	assert_eq!(color(&d, head), None);
	assert_eq!(
		d.resolve(head, "font-size").unwrap().map(|r| r.source),
		Some(ValueSource::SchemaDefault)
	);

	style(&mut d, "group-header-1", "slate");
	assert_eq!(
		color(&d, head),
		Some((PropertyValue::from("slate"), ValueSource::Selector("group-header-1".into())))
	);

	style(&mut d, "label", "ochre");
	assert_eq!(
		color(&d, head),
		Some((PropertyValue::from("ochre"), ValueSource::Selector("label".into())))
	);

	let shared = style(&mut d, "shared", "teal");
	d.set_property(head, "style", Some("shared".into())).unwrap();
	assert_eq!(
		color(&d, head),
		Some((PropertyValue::from("teal"), ValueSource::Style(shared)))
	);

	d.set_property(head, "color", Some("black".into())).unwrap();
	assert_eq!(
		color(&d, head),
		Some((PropertyValue::from("black"), ValueSource::Local(head)))
	);
}

#[test]
fn test_nested_groups_pick_deeper_selector() {
	let mut d = design();
	style(&mut d, "group-header-1", "one");
	style(&mut d, "group-header-2", "two");
	let outer = body(&mut d, "group", "outer");
	let inner = create(&mut d, outer, "groups", "group", "inner");
	let outer_head = create(&mut d, outer, "header", "label", "h1");
	let inner_head = create(&mut d, inner, "header", "label", "h2");

	assert_eq!(d.resolve_value(outer_head, "color").unwrap(), Some("one".into()));
	assert_eq!(d.resolve_value(inner_head, "color").unwrap(), Some("two".into()));
}

#[derive(Debug, Clone, Copy)]
struct Layers {
	local: bool,
	shared: bool,
	parent: bool,
	kind_selector: bool,
}

fn layers() -> impl Strategy<Value = Layers> {
	(any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
		|(local, shared, parent, kind_selector)| Layers {
			local,
			shared,
			parent,
			kind_selector,
		},
	)
}

proptest! {
	#[test]
	fn test_highest_layer_wins(layers in layers()) {
		let mut d = design();
		let base = body(&mut d, "label", "base");
		let el = body(&mut d, "label", "el");
		d.set_property(el, "extends", Some("base".into())).unwrap();

		if layers.kind_selector {
			style(&mut d, "label", "selector");
		}
		if layers.parent {
			d.set_property(base, "color", Some("parent".into())).unwrap();
		}
		let shared = layers.shared.then(|| {
			let id = style(&mut d, "shared", "shared");
			d.set_property(el, "style", Some("shared".into())).unwrap();
			id
		});
		if layers.local {
			d.set_property(el, "color", Some("local".into())).unwrap();
		}

		let expected = if layers.local {
			Some(("local", ValueSource::Local(el)))
		} else if let Some(id) = shared {
			Some(("shared", ValueSource::Style(id)))
		} else if layers.parent {
			Some(("parent", ValueSource::Inherited(base)))
		} else if layers.kind_selector {
			Some(("selector", ValueSource::Selector("label".into())))
		} else {
			None
		};
		let expected = expected.map(|(v, s)| (PropertyValue::from(v), s));
		prop_assert_eq!(color(&d, el), expected);
	}
}
