use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scalar_ir::codec::{decode, encode};
use scalar_ir::definition::{load_definitions, render_definitions};
use scalar_ir::expression::{
    validate, ColList, ColumnId, FieldValue, FunctionDef, IrError, OperatorKind, ScalarExpr,
    ScalarType, Tag, Taxonomy, INTERNAL_ERROR_PGCODE,
};
use scalar_ir::rewrite::{
    flatten_conjunctions, negate, node_at, transform_up, visit, visit_with_path,
    with_replaced_children, ExprMemo, ExprPath, RewriteSession,
};
use std::io::Write;
use std::sync::Arc;
use std::thread;

fn var(id: u32) -> ScalarExpr {
    ScalarExpr::variable(ColumnId(id))
}

/// Random valid tree of bounded depth.
fn random_expr(rng: &mut StdRng, depth: u32) -> ScalarExpr {
    let leaf = depth == 0 || rng.gen_bool(0.3);
    if leaf {
        return match rng.gen_range(0..5) {
            0 => var(rng.gen_range(1..8)),
            1 => ScalarExpr::int(rng.gen_range(-100..100)),
            2 => ScalarExpr::null(ScalarType::Unknown),
            3 => ScalarExpr::bool(rng.gen_bool(0.5)),
            _ => ScalarExpr::string("s"),
        };
    }
    let d = depth - 1;
    match rng.gen_range(0..10) {
        0 => ScalarExpr::plus(random_expr(rng, d), random_expr(rng, d)),
        1 => ScalarExpr::lt(random_expr(rng, d), random_expr(rng, d)),
        2 => {
            let n = rng.gen_range(0..4);
            ScalarExpr::and((0..n).map(|_| random_expr(rng, d)).collect())
        }
        3 => {
            let n = rng.gen_range(0..4);
            ScalarExpr::or((0..n).map(|_| random_expr(rng, d)).collect())
        }
        4 => ScalarExpr::not(random_expr(rng, d)),
        5 => {
            let n = rng.gen_range(2..6);
            ScalarExpr::searched_case((0..n).map(|_| random_expr(rng, d)).collect())
                .expect("at least one WHEN branch")
        }
        6 => ScalarExpr::cast(random_expr(rng, d), ScalarType::String),
        7 => ScalarExpr::coalesce(vec![random_expr(rng, d), random_expr(rng, d)]),
        8 => ScalarExpr::function(
            vec![random_expr(rng, d)],
            FunctionDef::new("abs", ScalarType::Int),
        ),
        _ => ScalarExpr::unary_minus(random_expr(rng, d)),
    }
}

#[test]
fn test_random_trees_identity_rewrite() {
    let mut rng = StdRng::seed_from_u64(0x5ca1a7);
    for _ in 0..200 {
        let expr = random_expr(&mut rng, 5);
        validate(&expr).unwrap();

        let mut nodes = Vec::new();
        visit(&expr, &mut |node| nodes.push(node));
        for node in nodes {
            let children: Vec<ScalarExpr> = node.children().into_iter().cloned().collect();
            let rebuilt = with_replaced_children(node, children).unwrap();
            assert_eq!(&rebuilt, node);
            for tag in Tag::ALL {
                assert_eq!(rebuilt.has_tag(tag), node.has_tag(tag));
            }
        }

        assert_eq!(transform_up(&expr, &mut |node| Ok(node)).unwrap(), expr);
        assert_eq!(decode(&encode(&expr).unwrap()).unwrap(), expr);
    }
}

#[test]
fn test_generic_construction_for_every_kind() {
    // Every kind accepts its own fields back through the generic constructor.
    let samples = vec![
        ScalarExpr::exists(scalar_ir::expression::RelationRef::new(1, ScalarType::Bool)),
        ScalarExpr::placeholder(1, ScalarType::Int),
        ScalarExpr::column_access(
            ScalarExpr::tuple(
                vec![ScalarExpr::int(1)],
                ScalarType::Tuple(vec![ScalarType::Int]),
            )
            .unwrap(),
            0,
        ),
        ScalarExpr::aggregations(
            vec![ScalarExpr::aggregate(OperatorKind::Max, var(1)).unwrap()],
            ColList::from(vec![5]),
        )
        .unwrap(),
    ];
    for expr in samples {
        let values: Vec<FieldValue> = expr.fields().iter().map(|f| f.to_value()).collect();
        assert_eq!(ScalarExpr::construct(expr.kind(), values).unwrap(), expr);
    }

    for kind in Taxonomy::all() {
        let expected = kind.schema().len();
        let too_many: Vec<FieldValue> = (0..=expected).map(|_| FieldValue::Ordinal(0)).collect();
        assert_eq!(
            ScalarExpr::construct(*kind, too_many).unwrap_err(),
            IrError::FieldArityMismatch {
                kind: *kind,
                expected,
                actual: expected + 1,
            }
        );
    }
}

#[test]
fn test_fold_and_refine_null() {
    let call = ScalarExpr::function(vec![var(1)], FunctionDef::new("f", ScalarType::Int));
    let root = ScalarExpr::plus(call, ScalarExpr::int(1));
    let path = ExprPath::from(vec![0]);

    let mut session = RewriteSession::new().with_step_validation(true);
    let folded = session.fold_to_null(&root, &path).unwrap();
    assert_eq!(
        node_at(&folded, &path),
        Some(&ScalarExpr::null(ScalarType::Unknown))
    );

    let refined = session.refine_nulls(&folded).unwrap();
    assert_eq!(
        node_at(&refined, &path),
        Some(&ScalarExpr::null(ScalarType::Int))
    );

    let err = session
        .replace(&refined, &path, ScalarExpr::null(ScalarType::Unknown))
        .unwrap_err();
    assert!(matches!(err, IrError::InvalidStructure { .. }));
    assert_eq!(err.pgcode(), INTERNAL_ERROR_PGCODE);
    assert!(err.is_internal());
}

#[test]
fn test_case_parity_and_projection_arity() {
    let branch = || ScalarExpr::eq(var(1), ScalarExpr::int(1));
    let value = || ScalarExpr::string("v");

    let five = ScalarExpr::searched_case(vec![branch(), value(), branch(), value(), value()]).unwrap();
    let two = ScalarExpr::searched_case(vec![branch(), value()]).unwrap();
    match (&five, &two) {
        (ScalarExpr::Case(a), ScalarExpr::Case(b)) => {
            assert!(a.has_else());
            assert!(!b.has_else());
        }
        _ => panic!("expected Case nodes"),
    }
    assert!(matches!(
        ScalarExpr::searched_case(vec![branch()]),
        Err(IrError::InvalidStructure { .. })
    ));

    assert!(matches!(
        ScalarExpr::projections(vec![var(1), var(2)], ColList::from(vec![3])),
        Err(IrError::InvalidStructure { .. })
    ));
}

#[test]
fn test_empty_conjunction_is_true_everywhere() {
    let empty_and = ScalarExpr::and(vec![]);
    let empty_or = ScalarExpr::or(vec![]);

    assert!(empty_and.is_true());
    assert!(empty_or.is_false());
    assert_eq!(negate(empty_and.clone()).unwrap(), ScalarExpr::false_expr());
    assert_eq!(flatten_conjunctions(empty_and), ScalarExpr::true_expr());
    assert_eq!(negate(empty_or).unwrap(), ScalarExpr::true_expr());
}

#[test]
fn test_concurrent_traversal_of_shared_subtree() {
    let memo = Arc::new(ExprMemo::new());
    let shared = memo.intern(ScalarExpr::and(vec![
        ScalarExpr::gt(var(1), ScalarExpr::int(0)),
        ScalarExpr::lt(var(1), ScalarExpr::int(100)),
    ]));
    let snapshot = (*shared).clone();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let shared = Arc::clone(&shared);
            let memo = Arc::clone(&memo);
            thread::spawn(move || {
                let mut comparisons = 0;
                visit_with_path(&shared, &mut |_, node| {
                    if node.is_comparison() {
                        comparisons += 1;
                    }
                });
                // Each thread derives its own tree; the shared one stays put.
                let negated = negate((*shared).clone()).unwrap();
                validate(&negated).unwrap();
                let again = memo.intern((*shared).clone());
                assert!(Arc::ptr_eq(&again, &shared));
                (i, comparisons)
            })
        })
        .collect();

    for handle in handles {
        let (_, comparisons) = handle.join().unwrap();
        assert_eq!(comparisons, 2);
    }
    assert_eq!(*shared, snapshot);
    assert_eq!(memo.len(), 1);
}

#[test]
fn test_definition_file_round_trip() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(render_definitions().as_bytes()).unwrap();
    let decls = load_definitions(file.path()).unwrap();
    assert_eq!(decls.len(), Taxonomy::all().len());
}

#[test]
fn test_definition_file_drift_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ops.def");
    let text = render_definitions().replace(
        "define Not(input: Expr) [Scalar, Boolean]",
        "define Not(input: Expr) [Scalar, Boolean, Unary]",
    );
    std::fs::write(&path, text).unwrap();

    let err = load_definitions(&path).unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("do not match"), "{}", message);
    assert!(message.contains("Not"), "{}", message);

    assert!(load_definitions(dir.path().join("missing.def")).is_err());
}
