use pretty_assertions::assert_eq;
use quire_model::{AddressError, Design, ErrorKind, ModelError, RefShape};
use quire_primitives::{ElementId, PropertyValue, Structure};
use quire_schema::ValueError;
use rstest::rstest;

use crate::common::{address, column, design, slot};

fn data_set(d: &mut Design) -> ElementId {
	let root = d.root();
	let sets = slot(d, root, "data-sets");
	let ds = d.create_in(&sets, "data-set", Some("sales"), None).unwrap();
	d.set_property(ds, "title", Some("Sales".into())).unwrap();
	d.set_property(ds, "tags", Some(PropertyValue::List(vec!["t0".into(), "t1".into()])))
		.unwrap();
	d.set_property(ds, "primary", Some(column("id"))).unwrap();
	d.set_property(ds, "columns", Some(PropertyValue::List(vec![column("region"), column("total")])))
		.unwrap();
	ds
}

#[rstest]
#[case::property("title", RefShape::Property, PropertyValue::from("Revenue"))]
#[case::property_index("tags[1]", RefShape::PropertyIndex, PropertyValue::from("t9"))]
#[case::property_member("primary.name", RefShape::PropertyMember, PropertyValue::from("key"))]
#[case::property_member_member("primary.format.pattern", RefShape::PropertyMemberMember, PropertyValue::from("0.00"))]
#[case::property_member_index("primary.aliases[0]", RefShape::PropertyMemberIndex, PropertyValue::from("pk"))]
#[case::property_member_index_member(
	"primary.params[1].name",
	RefShape::PropertyMemberIndexMember,
	PropertyValue::from("limit")
)]
#[case::property_index_member("columns[1].name", RefShape::PropertyIndexMember, PropertyValue::from("amount"))]
#[case::property_index_member_index("columns[0].aliases[1]", RefShape::PropertyIndexMemberIndex, PropertyValue::from("z"))]
#[case::property_index_member_index_member(
	"columns[1].params[0].value",
	RefShape::PropertyIndexMemberIndexMember,
	PropertyValue::Int(42)
)]
#[case::property_index_member_member("columns[0].format.digits", RefShape::PropertyIndexMemberMember, PropertyValue::Int(2))]
fn test_writes_land_at_the_address(#[case] path: &str, #[case] shape: RefShape, #[case] value: PropertyValue) {
	let mut d = design();
	let ds = data_set(&mut d);
	let addr = address(&d, ds, path);
	assert_eq!(addr.shape(), shape);
	assert_eq!(addr.to_string(), path);

	let property = addr.property_name().to_string();
	let before = d.local_value(ds, &property).unwrap().cloned();
	d.set_member(ds, &addr, Some(value.clone())).unwrap();
	let after = d.local_value(ds, &property).unwrap().cloned();
	assert_eq!(addr.get_value(after.as_ref()), Some(&value));
	assert_ne!(after, before);

	d.undo().unwrap();
	assert_eq!(d.local_value(ds, &property).unwrap().cloned(), before);
}

#[test]
fn test_sibling_entries_are_untouched() {
	let mut d = design();
	let ds = data_set(&mut d);
	let first = address(&d, ds, "columns[0]");
	let columns = d.local_value(ds, "columns").unwrap().cloned();
	let untouched = first.get_value(columns.as_ref()).cloned();

	d.set_member(ds, &address(&d, ds, "columns[1].params[1].value"), Some(7i64.into()))
		.unwrap();
	let columns = d.local_value(ds, "columns").unwrap().cloned();
	assert_eq!(first.get_value(columns.as_ref()).cloned(), untouched);
	let second = address(&d, ds, "columns[1].params[1]");
	assert_eq!(
		second.get_structure(columns.as_ref()),
		Some(&Structure::new("param").with("name", "p1").with("value", 7i64))
	);
}

#[test]
fn test_nested_list_editing() {
	let mut d = design();
	let ds = data_set(&mut d);
	let params = address(&d, ds, "columns[1].params");
	let names = |d: &Design| -> Vec<String> {
		let root = d.local_value(ds, "columns").unwrap();
		params
			.get_list(root)
			.unwrap_or_default()
			.iter()
			.filter_map(|p| p.as_structure()?.get("name")?.as_str().map(str::to_string))
			.collect()
	};

	d.insert_item(ds, &params, 0, Structure::new("param").with("name", "first").into())
		.unwrap();
	assert_eq!(names(&d), vec!["first", "p0", "p1"]);

	d.move_item(ds, &params, 0, 2).unwrap();
	assert_eq!(names(&d), vec!["p0", "p1", "first"]);

	let removed = d.remove_item(ds, &params.index(1)).unwrap();
	assert_eq!(
		removed.as_structure().and_then(|s| s.get("name")),
		Some(&PropertyValue::from("p1"))
	);
	assert_eq!(names(&d), vec!["p0", "first"]);

	for _ in 0..3 {
		d.undo().unwrap();
	}
	assert_eq!(names(&d), vec!["p0", "p1"]);
}

#[test]
fn test_invalid_member_writes_change_nothing() {
	let mut d = design();
	let ds = data_set(&mut d);
	let columns = d.local_value(ds, "columns").unwrap().cloned();
	let history = d.activity().undo_len();

	let err = d
		.set_member(ds, &address(&d, ds, "columns[0].format.digits"), Some("two".into()))
		.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Value);

	let err = d
		.set_member(ds, &address(&d, ds, "columns[0].aliases[0]"), None)
		.unwrap_err();
	assert!(matches!(err, ModelError::Address(AddressError::ClearListItem { .. })));

	let err = d
		.set_member(ds, &address(&d, ds, "columns[5].name"), Some("x".into()))
		.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Address);

	assert_eq!(d.local_value(ds, "columns").unwrap().cloned(), columns);
	assert_eq!(d.activity().undo_len(), history);
}

#[test]
fn test_writes_under_an_unset_structure_need_its_required_members() {
	let mut d = design();
	let root = d.root();
	let sets = slot(&d, root, "data-sets");
	let ds = d.create_in(&sets, "data-set", Some("orders"), None).unwrap();
	let history = d.activity().undo_len();

	let err = d
		.set_member(ds, &address(&d, ds, "primary.format.pattern"), Some("0.00".into()))
		.unwrap_err();
	assert!(matches!(
		err,
		ModelError::Value {
			source: ValueError::RequiredMemberBlank { ref structure, ref member },
			..
		} if structure == "column" && member == "name"
	));
	let err = d
		.insert_item(ds, &address(&d, ds, "primary.aliases"), 0, "pk".into())
		.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Value);
	assert_eq!(d.local_value(ds, "primary").unwrap(), None);
	assert_eq!(d.activity().undo_len(), history);

	d.set_member(ds, &address(&d, ds, "primary.name"), Some("id".into()))
		.unwrap();
	d.set_member(ds, &address(&d, ds, "primary.format.pattern"), Some("0.00".into()))
		.unwrap();
	let primary = address(&d, ds, "primary");
	let value = d.local_value(ds, "primary").unwrap().cloned();
	assert_eq!(
		primary.get_structure(value.as_ref()).and_then(|s| s.get("name")),
		Some(&PropertyValue::from("id"))
	);
}
