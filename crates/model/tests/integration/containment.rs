use pretty_assertions::assert_eq;
use quire_model::{ContainmentError, ModelError};
use quire_primitives::ModuleId;
use rstest::rstest;

use crate::common::{body, create, design, slot};

fn containment_err<T: std::fmt::Debug>(result: Result<T, ModelError>) -> ContainmentError {
	match result {
		Err(ModelError::Containment(e)) => e,
		other => panic!("expected a containment error, got {other:?}"),
	}
}

#[rstest]
#[case::group_in_groups("listing", "groups", "group", true)]
#[case::label_in_groups("listing", "groups", "label", false)]
#[case::label_in_detail("listing", "detail", "label", true)]
#[case::group_in_header("group", "header", "group", true)]
#[case::style_in_header("group", "header", "style", false)]
fn test_slot_kind_rules(#[case] owner_kind: &str, #[case] slot_name: &str, #[case] kind: &str, #[case] ok: bool) {
	let mut d = design();
	let owner = body(&mut d, owner_kind, "owner");
	let ctx = slot(&d, owner, slot_name);
	assert_eq!(ctx.can_contain(&d, kind).is_ok(), ok);
	let created = d.create_in(&ctx, kind, Some("x"), None);
	assert_eq!(created.is_ok(), ok);
	assert_eq!(ctx.count(&d), usize::from(ok));
}

#[test]
fn test_single_slot_holds_one_element() {
	let mut d = design();
	let group = body(&mut d, "group", "g");
	let header = slot(&d, group, "header");
	let first = d.create_in(&header, "label", Some("h1"), None).unwrap();
	let nodes = d.graph().len();

	let err = containment_err(d.create_in(&header, "label", Some("h2"), None));
	assert!(matches!(err, ContainmentError::SlotFull { container, .. } if container == group));
	assert_eq!(header.contents(&d), vec![first]);
	assert_eq!(d.graph().len(), nodes);

	d.drop_element(first).unwrap();
	d.create_in(&header, "label", Some("h2"), None).unwrap();
	assert_eq!(header.count(&d), 1);
}

#[test]
fn test_content_validator_blocks_nested_listings() {
	let mut d = design();
	let listing = body(&mut d, "listing", "outer");
	let detail = slot(&d, listing, "detail");
	let err = containment_err(d.create_in(&detail, "listing", Some("inner"), None));
	assert!(matches!(err, ContainmentError::Rejected { .. }));
	assert!(err.to_string().ends_with("listings cannot nest"));
	assert!(d.find_element(ModuleId::MAIN, "listing", "inner").is_none());

	let free = body(&mut d, "listing", "free");
	assert!(d.move_to(free, &detail, None).is_err());
	assert_eq!(d.element(free).unwrap().parent(), Some(d.root()));
}

#[test]
fn test_moving_between_containers_undoes_cleanly() {
	let mut d = design();
	let listing = body(&mut d, "listing", "l");
	let a = create(&mut d, listing, "groups", "group", "a");
	let b = create(&mut d, listing, "groups", "group", "b");
	let inner = create(&mut d, a, "groups", "group", "inner");

	d.move_to(inner, &slot(&d, b, "groups"), None).unwrap();
	assert_eq!(d.element(inner).unwrap().parent(), Some(b));
	assert_eq!(slot(&d, a, "groups").count(&d), 0);
	assert_eq!(d.graph().ancestors(inner), vec![b, listing, d.root()]);

	d.undo().unwrap();
	assert_eq!(d.element(inner).unwrap().parent(), Some(a));
	assert_eq!(slot(&d, a, "groups").contents(&d), vec![inner]);
	assert_eq!(slot(&d, b, "groups").count(&d), 0);
}

#[test]
fn test_element_cannot_contain_itself() {
	let mut d = design();
	let listing = body(&mut d, "listing", "l");
	let outer = create(&mut d, listing, "groups", "group", "outer");
	let inner = create(&mut d, outer, "groups", "group", "inner");

	let err = containment_err(d.move_to(outer, &slot(&d, inner, "groups"), None));
	assert!(matches!(err, ContainmentError::Cycle { .. }));
	let err = containment_err(d.move_to(outer, &slot(&d, outer, "groups"), None));
	assert!(matches!(err, ContainmentError::Cycle { .. }));
	assert_eq!(d.element(outer).unwrap().parent(), Some(listing));
}

#[test]
fn test_drop_takes_the_subtree() {
	let mut d = design();
	let listing = body(&mut d, "listing", "l");
	let group = create(&mut d, listing, "groups", "group", "g");
	let head = create(&mut d, group, "header", "label", "head");
	let nodes = d.graph().len();

	d.drop_element(listing).unwrap();
	for id in [listing, group, head] {
		assert!(!d.graph().contains(id));
	}
	assert_eq!(d.graph().len(), nodes - 3);

	d.undo().unwrap();
	assert_eq!(d.graph().subtree(listing), vec![listing, group, head]);
	assert_eq!(d.find_element(ModuleId::MAIN, "label", "head"), Some(head));
}
