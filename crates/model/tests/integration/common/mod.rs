//! Fixture schema and helpers for model integration tests.

use std::sync::Arc;

use quire_model::{ContainerContext, Design, DesignElement, MemberRef};
use quire_primitives::{ElementId, PropertyValue, Structure};
use quire_schema::{
	ContentCheck, ElementDefn, PropertyDefn, PropertyType, SchemaBuilder, SchemaRegistry, SlotDefn,
	StructDefn,
};

fn no_nested_listings(check: &ContentCheck<'_>) -> Result<(), String> {
	if check.slot == "detail" && check.candidate_kind == "listing" {
		return Err("listings cannot nest".to_string());
	}
	Ok(())
}

fn structure(name: &str) -> PropertyType {
	PropertyType::Structure {
		defn: name.to_string(),
	}
}

fn with_style_props(defn: ElementDefn) -> ElementDefn {
	defn.with_property(PropertyDefn::new("color", PropertyType::String).style())
		.with_property(PropertyDefn::new("background", PropertyType::String).style())
		.with_property(
			PropertyDefn::new("font-size", PropertyType::Int)
				.style()
				.with_range(Some(1.0), Some(72.0))
				.with_default(10i64),
		)
}

/// Report schema with styles, labels, repeating groups, listings and data
/// sets whose columns are nested structures.
pub fn schema() -> Arc<SchemaRegistry> {
	let _ = tracing_subscriber::fmt::try_init();
	let registry = SchemaBuilder::new()
		.style_kind("style")
		.structure(
			StructDefn::new("format")
				.with_member(PropertyDefn::new("pattern", PropertyType::String))
				.with_member(PropertyDefn::new("digits", PropertyType::Int)),
		)
		.structure(
			StructDefn::new("param")
				.with_member(PropertyDefn::new("name", PropertyType::String))
				.with_member(PropertyDefn::new("value", PropertyType::Int)),
		)
		.structure(
			StructDefn::new("column")
				.with_member(PropertyDefn::new("name", PropertyType::String).required())
				.with_member(PropertyDefn::new("aliases", PropertyType::String).list())
				.with_member(PropertyDefn::new("format", structure("format")))
				.with_member(PropertyDefn::new("params", structure("param")).list())
				.with_member(PropertyDefn::new(
					"style",
					PropertyType::ElementRef {
						target: "style".to_string(),
					},
				)),
		)
		.element(with_style_props(ElementDefn::new("style").with_name_space("styles")))
		.element(
			ElementDefn::new("report")
				.with_slot(SlotDefn::new("styles", ["style"]))
				.with_slot(SlotDefn::new("body", ["item"]))
				.with_slot(SlotDefn::new("data-sets", ["data-set"])),
		)
		.element(
			ElementDefn::new("library")
				.with_slot(SlotDefn::new("styles", ["style"]))
				.with_slot(SlotDefn::new("body", ["item"])),
		)
		.element(
			ElementDefn::new("data-set")
				.with_name_space("data-sets")
				.with_property(PropertyDefn::new("title", PropertyType::String))
				.with_property(PropertyDefn::new("tags", PropertyType::String).list())
				.with_property(PropertyDefn::new("primary", structure("column")))
				.with_property(PropertyDefn::new("columns", structure("column")).list()),
		)
		.element(
			with_style_props(ElementDefn::new("item"))
				.with_name_space("elements")
				.styled()
				.extendable()
				.with_property(
					PropertyDefn::new("width", PropertyType::Float)
						.inheritable()
						.with_range(Some(0.0), None),
				)
				.with_property(PropertyDefn::new(
					"data-set",
					PropertyType::ElementRef {
						target: "data-set".to_string(),
					},
				)),
		)
		.element(
			ElementDefn::new("label")
				.with_base("item")
				.with_property(PropertyDefn::new("text", PropertyType::String)),
		)
		.element(
			ElementDefn::new("group")
				.with_base("item")
				.with_slot(
					SlotDefn::new("header", ["item"])
						.single()
						.with_selector("group-header")
						.nested(),
				)
				.with_slot(SlotDefn::new("groups", ["group"])),
		)
		.element(
			ElementDefn::new("listing")
				.with_base("item")
				.with_slot(SlotDefn::new("groups", ["group"]))
				.with_slot(SlotDefn::new("detail", ["item"]))
				.with_content_validator(no_nested_listings),
		)
		.build()
		.expect("fixture schema builds");
	Arc::new(registry)
}

/// Empty report design over [`schema`].
pub fn design() -> Design {
	Design::new(schema(), "report").expect("report design")
}

pub fn slot(design: &Design, owner: ElementId, name: &str) -> ContainerContext {
	ContainerContext::named_slot(design, owner, name).expect("slot exists")
}

/// Creates `kind` named `name` inside slot `slot_name` of `owner`.
pub fn create(design: &mut Design, owner: ElementId, slot_name: &str, kind: &str, name: &str) -> ElementId {
	let ctx = slot(design, owner, slot_name);
	design
		.create_in(&ctx, kind, Some(name), None)
		.expect("element created")
}

pub fn body(design: &mut Design, kind: &str, name: &str) -> ElementId {
	let root = design.root();
	create(design, root, "body", kind, name)
}

pub fn style(design: &mut Design, name: &str, color: &str) -> ElementId {
	let root = design.root();
	let id = create(design, root, "styles", "style", name);
	design
		.set_property(id, "color", Some(color.into()))
		.expect("style color");
	id
}

/// Every live element, ordered by id, for structural comparisons.
pub fn snapshot(design: &Design) -> Vec<DesignElement> {
	let mut out: Vec<DesignElement> = design.graph().elements().cloned().collect();
	out.sort_by_key(DesignElement::id);
	out
}

/// Parses `prop[1].member[0].member` into an address on `id`'s kind.
pub fn address(design: &Design, id: ElementId, path: &str) -> MemberRef {
	let mut parts = path.split('.');
	let (prop, index) = split_index(parts.next().expect("property"));
	let mut addr = design.member_ref(id, prop).expect("property exists");
	if let Some(i) = index {
		addr = addr.index(i);
	}
	for part in parts {
		let (member, index) = split_index(part);
		addr = addr.member(design.schema(), member);
		if let Some(i) = index {
			addr = addr.index(i);
		}
	}
	addr
}

fn split_index(part: &str) -> (&str, Option<usize>) {
	match part.split_once('[') {
		Some((name, rest)) => (name, rest.trim_end_matches(']').parse().ok()),
		None => (part, None),
	}
}

/// A column with two aliases, two params and a format.
pub fn column(name: &str) -> PropertyValue {
	Structure::new("column")
		.with("name", name)
		.with(
			"aliases",
			PropertyValue::List(vec!["x".into(), "y".into()]),
		)
		.with("format", Structure::new("format").with("pattern", "#"))
		.with(
			"params",
			PropertyValue::List(vec![
				Structure::new("param").with("name", "p0").with("value", 0i64).into(),
				Structure::new("param").with("name", "p1").into(),
			]),
		)
		.into()
}
