use pretty_assertions::assert_eq;
use quire_model::{ContainmentError, Design, ModelError, ValueSource};
use quire_primitives::{ElementId, ElementRef, ModuleId, PropertyValue};

use crate::common::{body, create, design, slot};

fn library_with_style(d: &mut Design, color: &str) -> (ModuleId, ElementId) {
	let lib = d.include_library("corp", "library").unwrap();
	let root = d.module_root(lib).unwrap();
	let shared = create(d, root, "styles", "style", "brand");
	d.set_property(shared, "color", Some(color.into())).unwrap();
	(lib, shared)
}

#[test]
fn test_library_styles_reach_the_main_design() {
	let mut d = design();
	let (lib, shared) = library_with_style(&mut d, "purple");
	let label = body(&mut d, "label", "a");

	d.set_property(label, "style", Some("corp.brand".into())).unwrap();
	assert_eq!(
		d.resolve(label, "color").unwrap().map(|r| (r.value, r.source)),
		Some((PropertyValue::from("purple"), ValueSource::Style(shared)))
	);
	assert_eq!(d.ref_name(ModuleId::MAIN, shared).as_deref(), Some("corp.brand"));
	assert_eq!(d.element(shared).unwrap().module(), lib);

	d.rename(shared, Some("house")).unwrap();
	assert_eq!(
		d.element(label).unwrap().style(),
		Some(&ElementRef::resolved("corp.house", shared))
	);
}

#[test]
fn test_modules_do_not_share_content() {
	let mut d = design();
	let (lib, _) = library_with_style(&mut d, "purple");
	let lib_root = d.module_root(lib).unwrap();
	let label = body(&mut d, "label", "a");

	let err = d.move_to(label, &slot(&d, lib_root, "body"), None).unwrap_err();
	assert!(matches!(err, ModelError::Containment(ContainmentError::CrossModule { .. })));
	assert_eq!(d.element(label).unwrap().parent(), Some(d.root()));

	let lib_label = create(&mut d, lib_root, "body", "label", "a");
	assert_eq!(d.find_element(ModuleId::MAIN, "label", "a"), Some(label));
	assert_eq!(d.find_element(lib, "label", "a"), Some(lib_label));
	assert_eq!(d.find_element(ModuleId::MAIN, "label", "corp.a"), Some(lib_label));
}

#[test]
fn test_sealed_library_stays_usable_read_only() {
	let mut d = design();
	let (lib, shared) = library_with_style(&mut d, "purple");
	let lib_root = d.module_root(lib).unwrap();
	d.seal_module(lib).unwrap();

	let err = d.set_property(shared, "color", Some("red".into())).unwrap_err();
	assert!(matches!(err, ModelError::ReadOnly { module, .. } if module == lib));
	assert!(d.create_in(&slot(&d, lib_root, "body"), "label", Some("x"), None).is_err());

	let label = body(&mut d, "label", "a");
	d.set_property(label, "style", Some("corp.brand".into())).unwrap();
	assert_eq!(d.resolve_value(label, "color").unwrap(), Some("purple".into()));
	assert_eq!(d.clients(shared), vec![(label, "style".to_string())]);

	d.drop_element(label).unwrap();
	assert!(!d.has_references(shared));
}

#[test]
fn test_extends_brings_virtual_content() {
	let mut d = design();
	let base = body(&mut d, "group", "base");
	let head = create(&mut d, base, "header", "label", "head");
	d.set_property(head, "color", Some("red".into())).unwrap();
	let derived = body(&mut d, "group", "derived");
	let header = slot(&d, derived, "header");

	d.set_property(derived, "extends", Some("base".into())).unwrap();
	let mirrored = header.contents(&d);
	assert_eq!(mirrored.len(), 1);
	let copy = mirrored[0];
	assert!(d.element(copy).unwrap().is_virtual());
	assert_eq!(
		d.resolve(copy, "color").unwrap().map(|r| r.source),
		Some(ValueSource::Inherited(head))
	);

	d.set_property(copy, "color", Some("blue".into())).unwrap();
	assert_eq!(d.resolve_value(copy, "color").unwrap(), Some("blue".into()));
	assert_eq!(d.resolve_value(head, "color").unwrap(), Some("red".into()));
	assert!(matches!(
		d.create_in(&header, "label", Some("local"), None),
		Err(ModelError::Containment(ContainmentError::InheritedContent { .. }))
	));

	d.undo().unwrap();
	d.undo().unwrap();
	assert_eq!(header.count(&d), 0);
	assert!(!d.graph().contains(copy));

	d.redo().unwrap();
	assert_eq!(header.contents(&d), vec![copy]);
	assert_eq!(d.element(copy).unwrap().virtual_parent(), Some(head));
}
