//! Schema and design fixtures shared by the unit tests.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use quire_primitives::ElementId;
use quire_schema::{
	ContentCheck, ElementDefn, PropertyDefn, PropertyType, SchemaBuilder, SchemaRegistry, SlotDefn,
	StructDefn,
};

use crate::containment::ContainerContext;
use crate::design::Design;
use crate::notification::Notification;

fn no_nested_tables(check: &ContentCheck<'_>) -> Result<(), String> {
	if check.candidate_kind == "table" {
		return Err("tables do not nest".to_string());
	}
	Ok(())
}

fn style_props(defn: ElementDefn) -> ElementDefn {
	defn.with_property(PropertyDefn::new("color", PropertyType::String).style())
		.with_property(
			PropertyDefn::new("font-size", PropertyType::Int)
				.style()
				.with_default(10i64),
		)
}

fn style_ref(name: &str) -> PropertyDefn {
	PropertyDefn::new(
		name,
		PropertyType::ElementRef {
			target: "style".to_string(),
		},
	)
}

/// Report schema: styles, labels, groups with nested header selectors,
/// tables with owned captions, and data sets with column structures.
pub(crate) fn schema() -> Arc<SchemaRegistry> {
	let _ = tracing_subscriber::fmt::try_init();
	let registry = SchemaBuilder::new()
		.style_kind("style")
		.structure(
			StructDefn::new("column")
				.with_member(PropertyDefn::new("name", PropertyType::String).required())
				.with_member(style_ref("style")),
		)
		.element(style_props(ElementDefn::new("style").with_name_space("styles")))
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
				.with_property(
					PropertyDefn::new(
						"columns",
						PropertyType::Structure {
							defn: "column".to_string(),
						},
					)
					.list(),
				)
				.with_property(PropertyDefn::new("tags", PropertyType::Int).list()),
		)
		.element(
			style_props(ElementDefn::new("item"))
				.with_name_space("elements")
				.styled()
				.extendable()
				.with_property(PropertyDefn::new("width", PropertyType::Float).inheritable())
				.with_property(PropertyDefn::new("title", PropertyType::String).nullable())
				.with_property(PropertyDefn::new("tags", PropertyType::String).list())
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
				.with_slot(SlotDefn::new("content", ["item"])),
		)
		.element(
			ElementDefn::new("table")
				.with_base("item")
				.with_slot(SlotDefn::new("detail", ["item"]))
				.with_property(PropertyDefn::new(
					"caption",
					PropertyType::Element {
						kinds: vec!["label".to_string()],
					},
				))
				.with_property(
					PropertyDefn::new(
						"footers",
						PropertyType::Element {
							kinds: vec!["label".to_string()],
						},
					)
					.list(),
				)
				.with_content_validator(no_nested_tables),
		)
		.build()
		.expect("fixture schema builds");
	Arc::new(registry)
}

/// Empty report design.
pub(crate) fn design() -> Design {
	Design::new(schema(), "report").expect("report design")
}

/// Slot `name` of `owner`.
pub(crate) fn slot(design: &Design, owner: ElementId, name: &str) -> ContainerContext {
	ContainerContext::named_slot(design, owner, name).expect("slot exists")
}

/// Creates `kind` named `name` in the body of the main root.
pub(crate) fn add_to_body(design: &mut Design, kind: &str, name: &str) -> ElementId {
	let body = slot(design, design.root(), "body");
	design
		.create_in(&body, kind, Some(name), None)
		.expect("element created")
}

/// Creates a style named `name` in the styles slot of the main root.
pub(crate) fn add_style(design: &mut Design, name: &str) -> ElementId {
	let styles = slot(design, design.root(), "styles");
	design
		.create_in(&styles, "style", Some(name), None)
		.expect("style created")
}

/// Collects every notification delivered to the design's listeners.
pub(crate) fn capture(design: &mut Design) -> Rc<RefCell<Vec<Notification>>> {
	let events = Rc::new(RefCell::new(Vec::new()));
	let sink = events.clone();
	design.add_listener(move |event: &Notification| sink.borrow_mut().push(event.clone()));
	events
}
