//! Unit tests for type interning, derived types and object sizes.

use super::{
    type_table::TypeTable,
    types::{StorageClass, TypeCategory, TypeIdentity, ValueCategory},
};

#[test]
fn test_seeded_types() {
    let types = TypeTable::new();

    let int64 = types.int64();
    assert_eq!(int64.name(), "int64");
    assert_eq!(int64.category(), TypeCategory::Integer);
    assert_eq!(int64.value_category(), ValueCategory::None);

    let void = types.void();
    assert_eq!(void.category(), TypeCategory::Void);
    assert_eq!(types.len(), 2);
}

#[test]
fn test_get_or_create_is_idempotent() {
    let types = TypeTable::new();
    let identity = TypeIdentity::atomic("int64", TypeCategory::Integer)
        .with_value_category(ValueCategory::LValue);

    let first = types.get_or_create(identity.clone(), &[]).unwrap();
    let second = types.get_or_create(identity, &[]).unwrap();

    assert_eq!(first, second);
    assert_eq!(first, types.as_lvalue(&types.int64()));
}

#[test]
fn test_clones_share_registry() {
    let types = TypeTable::new();
    let other = types.clone();

    assert_eq!(types.literal_type(), other.literal_type());
}

#[test]
fn test_derived_value_categories() {
    let types = TypeTable::new();
    let int64 = types.int64();

    let prvalue = types.as_prvalue(&int64);
    assert_eq!(prvalue.value_category(), ValueCategory::PRValue);
    assert_eq!(prvalue, types.literal_type());

    let lvalue = types.as_lvalue(&prvalue);
    assert_eq!(lvalue.value_category(), ValueCategory::LValue);
    assert_eq!(types.as_xvalue(&lvalue).value_category(), ValueCategory::XValue);

    assert_eq!(types.as_declared(&lvalue), int64);
    assert_ne!(prvalue, lvalue);
}

#[test]
fn test_reference_type() {
    let types = TypeTable::new();
    let int64 = types.int64();

    let reference = types.as_reference(&int64).unwrap();
    assert_eq!(reference.name(), "int64&");
    assert_eq!(reference.category(), TypeCategory::Reference);
    assert_eq!(reference.storage_class(), StorageClass::Reference);
    assert_eq!(reference.referenced_type(), Some(&int64));
    assert_eq!(reference.object_size(), 8);

    // The pointee is stored in declared form.
    let from_lvalue = types.as_reference(&types.as_lvalue(&int64)).unwrap();
    assert_eq!(reference, from_lvalue);
}

#[test]
fn test_reference_to_reference_is_rejected() {
    let types = TypeTable::new();
    let reference = types.as_reference(&types.int64()).unwrap();

    let error = types.as_reference(&reference).unwrap_err();
    assert_eq!(error.get_error_name(), "ReferenceToReference");
}

#[test]
fn test_reference_needs_one_member() {
    let types = TypeTable::new();
    let identity = TypeIdentity {
        name: "int64&".to_string(),
        rank: None,
        element_count: None,
        category: TypeCategory::Reference,
        value_category: ValueCategory::None,
    };

    let error = types.get_or_create(identity, &[]).unwrap_err();
    assert_eq!(error.get_error_name(), "InternalError");
}

#[test]
fn test_array_type() {
    let types = TypeTable::new();
    let array = types.array_of(&types.int64(), 5).unwrap();

    assert_eq!(array.name(), "int64[5]");
    assert_eq!(array.identity().rank, Some(1));
    assert_eq!(array.element_count(), Some(5));
    assert_eq!(array.element_type(), Some(&types.int64()));
    assert_eq!(array.object_size(), 40);
    assert_eq!(array.storage_class(), StorageClass::Aggregate);

    let reference = types.as_reference(&array).unwrap();
    assert_eq!(reference.element_type(), Some(&types.int64()));

    assert_eq!(types.array_of(&types.int64(), 0).unwrap().object_size(), 0);
}

#[test]
fn test_struct_size_has_no_padding() {
    let types = TypeTable::new();
    let int_ref = types.as_reference(&types.int64()).unwrap();

    let pair = types
        .define_struct(
            "RefPair",
            vec![("a".to_string(), int_ref.clone()), ("b".to_string(), int_ref)],
        )
        .unwrap();

    assert_eq!(pair.object_size(), 16);
    assert!(pair.is_struct());

    let body = pair.struct_body().unwrap();
    assert_eq!(body.member_offset(0), 0);
    assert_eq!(body.member_offset(1), 8);
    assert_eq!(body.member("b").map(|(index, _)| index), Some(1));
    assert!(body.member("c").is_none());
}

#[test]
fn test_forward_struct_reference_is_filled_in() {
    let types = TypeTable::new();

    let forward = types.find_by_name("Pair");
    assert!(forward.is_struct());
    assert!(forward.struct_body().is_none());
    assert!(types.get_atomic_type("Pair").is_err());

    let as_lvalue = types.as_lvalue(&forward);

    types
        .define_struct(
            "Pair",
            vec![
                ("x".to_string(), types.int64()),
                ("y".to_string(), types.array_of(&types.int64(), 2).unwrap()),
            ],
        )
        .unwrap();

    assert_eq!(forward.object_size(), 24);
    assert_eq!(as_lvalue.object_size(), 24);
    assert_eq!(types.get_atomic_type("Pair").unwrap(), forward);
}

#[test]
fn test_struct_errors() {
    let types = TypeTable::new();

    let duplicate = types
        .define_struct(
            "Twice",
            vec![("x".to_string(), types.int64()), ("x".to_string(), types.int64())],
        )
        .unwrap_err();
    assert_eq!(duplicate.get_error_name(), "DuplicateMember");

    types.define_struct("Once", vec![]).unwrap();
    let redeclared = types.define_struct("Once", vec![]).unwrap_err();
    assert_eq!(redeclared.get_error_name(), "StructAlreadyDeclared");
}

#[test]
fn test_fork_keeps_identity_and_isolates_structs() {
    let types = TypeTable::new();
    let array = types.array_of(&types.int64(), 4).unwrap();
    let pending = types.as_reference(&types.find_by_name("Later")).unwrap();

    let fork = types.fork();
    assert_eq!(fork.int64(), types.int64());
    assert_eq!(fork.array_of(&fork.int64(), 4).unwrap(), array);

    fork.define_struct("Later", vec![("x".to_string(), fork.int64())])
        .unwrap();
    assert!(fork.is_struct_defined("Later"));
    assert!(!types.is_struct_defined("Later"));
    assert!(pending.referenced_type().unwrap().struct_body().is_none());

    let pair = fork.define_struct("Pair", vec![]).unwrap();
    assert!(types.get_atomic_type("Pair").is_err());
    assert!(types.fork().define_struct("Pair", vec![]).is_ok());
    assert_eq!(fork.fork().find_by_name("Pair"), pair);
}

#[test]
fn test_unknown_atomic_type() {
    let types = TypeTable::new();

    let error = types.get_atomic_type("float").unwrap_err();
    assert_eq!(error.get_error_name(), "UnknownType");
    assert_eq!(types.get_atomic_type("void").unwrap(), types.void());
}

#[test]
fn test_display_name() {
    let types = TypeTable::new();

    assert_eq!(types.literal_type().display_name(), "int64 (PR Value)");
    assert_eq!(types.as_lvalue(&types.int64()).display_name(), "int64 (L Value)");
    assert_eq!(types.as_xvalue(&types.int64()).display_name(), "int64 (X Value)");
    assert_eq!(types.void().display_name(), "void (NONE)");
}

#[test]
fn test_same_object_ignores_category_and_reference() {
    let types = TypeTable::new();
    let int64 = types.int64();
    let reference = types.as_reference(&int64).unwrap();

    assert!(types.literal_type().same_object(&reference));
    assert!(!int64.same_object(&types.array_of(&int64, 1).unwrap()));
}
