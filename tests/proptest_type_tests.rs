//! Property-based tests for type interning, object sizes and the pipeline.
//!
//! These tests use proptest to check that:
//! 1. Interning is idempotent and name-stable
//! 2. Array and struct sizes follow from their element and member sizes
//! 3. Lexing and parsing never panic on arbitrary input
//! 4. Compiled arithmetic agrees with wrapping `i64` arithmetic

use proptest::prelude::*;
use reflang::{
    ast::expressions::BinaryOperator,
    driver::Session,
    interpreter::interpreter::Interpreter,
    types::{type_table::TypeTable, types::TypeRef},
};

// =============================================================================
// STRATEGY GENERATORS
// =============================================================================

/// Array dimensions, outermost last.
fn dimensions() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(1u64..16, 0..4)
}

/// Struct members as array dimensions applied to `int64`.
fn member_shapes() -> impl Strategy<Value = Vec<Vec<u64>>> {
    prop::collection::vec(dimensions(), 1..6)
}

fn nested_array(types: &TypeTable, dimensions: &[u64]) -> TypeRef {
    dimensions.iter().fold(types.int64(), |element, count| {
        types.array_of(&element, *count).unwrap()
    })
}

fn operator() -> impl Strategy<Value = (BinaryOperator, &'static str)> {
    prop_oneof![
        Just((BinaryOperator::Add, "+")),
        Just((BinaryOperator::Sub, "-")),
        Just((BinaryOperator::Mul, "*")),
        Just((BinaryOperator::And, "&")),
        Just((BinaryOperator::Shl, "<<")),
        Just((BinaryOperator::Shr, ">>")),
    ]
}

// =============================================================================
// TYPE TABLE PROPERTIES
// =============================================================================

proptest! {
    #[test]
    fn interning_is_idempotent(dimensions in dimensions()) {
        let types = TypeTable::new();
        let first = nested_array(&types, &dimensions);
        let size = types.len();
        let second = nested_array(&types, &dimensions);

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(types.len(), size);
        prop_assert_eq!(
            types.as_prvalue(&first),
            types.as_prvalue(&second)
        );
    }

    #[test]
    fn array_names_list_dimensions(dimensions in dimensions()) {
        let types = TypeTable::new();
        let array = nested_array(&types, &dimensions);

        let expected = dimensions
            .iter()
            .fold(String::from("int64"), |name, count| format!("{}[{}]", name, count));
        prop_assert_eq!(array.name(), expected.as_str());
    }

    #[test]
    fn array_size_is_count_times_element(dimensions in dimensions(), count in 1u64..32) {
        let types = TypeTable::new();
        let element = nested_array(&types, &dimensions);
        let array = types.array_of(&element, count).unwrap();

        prop_assert_eq!(array.object_size(), count * element.object_size());
    }

    #[test]
    fn struct_size_is_sum_of_members(shapes in member_shapes()) {
        let types = TypeTable::new();
        let members = shapes
            .iter()
            .enumerate()
            .map(|(index, shape)| (format!("m{}", index), nested_array(&types, shape)))
            .collect::<Vec<_>>();
        let expected = members.iter().map(|(_, ty)| ty.object_size()).sum::<u64>();

        let structure = types.define_struct("S", members).unwrap();
        prop_assert_eq!(structure.object_size(), expected);

        let body = structure.struct_body().unwrap();
        let last = shapes.len() - 1;
        prop_assert_eq!(
            body.member_offset(last) + body.members[last].object_size(),
            expected
        );
    }

    #[test]
    fn references_do_not_change_identity_of_object(dimensions in dimensions()) {
        let types = TypeTable::new();
        let object = nested_array(&types, &dimensions);
        let reference = types.as_reference(&object).unwrap();

        prop_assert!(reference.same_object(&object));
        prop_assert_eq!(reference.object(), object);
        prop_assert!(types.as_reference(&reference).is_err());
    }
}

// =============================================================================
// PIPELINE PROPERTIES
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn pipeline_never_panics(source in prop::string::string_regex(r"[ -~\n]{0,200}").unwrap()) {
        let _ = Session::new().compile(&source, "fuzz.lang");
    }

    #[test]
    fn compiled_arithmetic_matches_evaluate(
        (operator, symbol) in operator(),
        lhs in any::<i64>(),
        rhs in any::<i64>(),
    ) {
        let source = format!("int64 f(int64 a, int64 b) {{ return a {} b; }}", symbol);
        let compilation = Session::new().compile(&source, "arith.lang").unwrap();
        let mut interpreter = Interpreter::new(&compilation.module);

        prop_assert_eq!(
            interpreter.run_function("f", &[lhs, rhs]),
            Ok(Some(operator.evaluate(lhs, rhs)))
        );
    }

    #[test]
    fn comparisons_yield_zero_or_one(lhs in any::<i64>(), rhs in any::<i64>()) {
        for operator in [
            BinaryOperator::Less,
            BinaryOperator::Greater,
            BinaryOperator::LessEquals,
            BinaryOperator::GreaterEquals,
            BinaryOperator::Equals,
        ] {
            let result = operator.evaluate(lhs, rhs);
            prop_assert!(result == 0 || result == 1);
        }
        prop_assert_eq!(BinaryOperator::Add.evaluate(lhs, rhs), lhs.wrapping_add(rhs));
    }
}
