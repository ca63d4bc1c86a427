//! End-to-end scenarios: fixture programs through the resolver and all
//! three lint rules.

use excheck_common::diagnostics::lint_codes;
use excheck_lints::{LintContext, check_unit};
use excheck_model::{
    Annotation, ElementFlags, ElementKind, NodeData, Program, ProgramBuilder, TypeId, UnitId,
};
use excheck_resolver::{OverrideTable, ResolverSession};

fn check(program: &Program) -> Vec<(u32, String)> {
    let overrides = OverrideTable::new();
    let session = ResolverSession::new(program, &overrides);
    let ctx = LintContext::new(program, &session);
    check_unit(&ctx, UnitId(0))
        .into_iter()
        .map(|diagnostic| (diagnostic.code, diagnostic.message_text))
        .collect()
}

fn codes(diagnostics: &[(u32, String)]) -> Vec<u32> {
    diagnostics.iter().map(|(code, _)| *code).collect()
}

/// `@safe f() { throw Exception(); }` - one uncaught_throw at the throw.
#[test]
fn simple_unchecked_throw() {
    let mut builder = ProgramBuilder::new("package:app/app.dart");
    let f = builder.function("f", TypeId::VOID);
    builder.set_metadata(f, vec![Annotation::Safe]);
    let throw_node = builder.throw_of_type(TypeId::EXCEPTION, None);
    let stmt = builder.expr_stmt(throw_node);
    let body = builder.block([stmt]);
    builder.set_body(f, body);
    let program = builder.finish();

    let diagnostics = check(&program);
    assert_eq!(codes(&diagnostics), vec![lint_codes::UNCAUGHT_THROW]);
    assert_eq!(diagnostics[0].1, "Exception can't be thrown here");

    // f's configuration comes from @safe: nothing declared, undeclared
    // Errors allowed.
    let overrides = OverrideTable::new();
    let session = ResolverSession::new(&program, &overrides);
    let configuration = session.element_configuration(f).unwrap();
    let invoked = configuration.invoke().unwrap();
    assert!(invoked.throws.thrown_types().is_empty());
    assert!(invoked.throws.can_throw_undeclared);
}

/// `@safe f() { try { throw Exception(); } catch (e) {} }` - caught, no
/// diagnostics.
#[test]
fn caught_throw() {
    let mut builder = ProgramBuilder::new("package:app/app.dart");
    let f = builder.function("f", TypeId::VOID);
    builder.set_metadata(f, vec![Annotation::Safe]);
    let throw_node = builder.throw_of_type(TypeId::EXCEPTION, None);
    let stmt = builder.expr_stmt(throw_node);
    let try_body = builder.block([stmt]);
    let catch_body = builder.block([]);
    let catch_clause = builder.node(NodeData::CatchClause {
        exception_type: None,
        parameter: None,
        body: catch_body,
    });
    let try_stmt = builder.node(NodeData::Try {
        body: try_body,
        catches: [catch_clause].into_iter().collect(),
        finally: None,
    });
    let body = builder.block([try_stmt]);
    builder.set_body(f, body);
    let program = builder.finish();

    assert!(check(&program).is_empty());
}

/// `void g(@safe Fn callback); g(() => throw Exception())` - one
/// unsafe_assignment at the lambda, nothing else.
#[test]
fn unsafe_assignment_at_lambda() {
    let mut builder = ProgramBuilder::new("package:app/app.dart");
    let callback_type = builder.types().function_type([], TypeId::VOID);

    let g = builder.function("g", TypeId::VOID);
    let callback = builder.parameter(g, "callback", callback_type);
    builder.set_metadata(callback, vec![Annotation::Safe]);
    let g_body = builder.block([]);
    builder.set_body(g, g_body);

    // main() { g(() => throw Exception()); }
    let main = builder.function("main", TypeId::VOID);
    let closure = builder.closure_element(TypeId::VOID);
    let closure_body = builder.throw_of_type(TypeId::EXCEPTION, None);
    builder.set_body(closure, closure_body);
    let lambda = builder.node(NodeData::FunctionExpression {
        element: closure,
        parameter: Some(callback),
    });
    let call = builder.call(g, [lambda]);
    let stmt = builder.expr_stmt(call);
    let main_body = builder.block([stmt]);
    builder.set_body(main, main_body);
    let program = builder.finish();

    let diagnostics = check(&program);
    assert_eq!(codes(&diagnostics), vec![lint_codes::UNSAFE_ASSIGNMENT]);
}

/// Base declares `@Throws<FormatException> m()`; the override throws
/// IOException without an annotation - one unsafe_override on the
/// override.
#[test]
fn override_widening() {
    let mut builder = ProgramBuilder::new("package:app/app.dart");
    let format_exception =
        builder
            .types()
            .interface_full("FormatException", None, [TypeId::EXCEPTION], [], []);
    let io_exception =
        builder
            .types()
            .interface_full("IOException", None, [TypeId::EXCEPTION], [], []);

    let (base, base_ty) = builder.class("Base", None);
    let base_m = builder.member(base, "m", ElementKind::Method, Some(TypeId::VOID));
    builder.set_metadata(base_m, vec![Annotation::Throws(format_exception)]);
    let base_body = builder.block([]);
    builder.set_body(base_m, base_body);

    let (sub, _) = builder.class("Sub", Some(base_ty));
    let sub_m = builder.member(sub, "m", ElementKind::Method, Some(TypeId::VOID));
    let throw_node = builder.throw_of_type(io_exception, None);
    let stmt = builder.expr_stmt(throw_node);
    let sub_body = builder.block([stmt]);
    builder.set_body(sub_m, sub_body);
    let program = builder.finish();

    let diagnostics = check(&program);
    assert_eq!(codes(&diagnostics), vec![lint_codes::UNSAFE_OVERRIDE]);
}

/// `@Throws<E> Future<int> f() async { throw E(); }` awaited from a
/// `@safe` async function - one uncaught_throw at the await, naming E.
#[test]
fn await_propagation() {
    let mut builder = ProgramBuilder::new("package:app/app.dart");
    let e = builder
        .types()
        .interface_full("E", None, [TypeId::EXCEPTION], [], []);
    let int_ty = builder.types().interface("int", None);
    let future_int = builder.types().future(int_ty);
    let future_void = builder.types().future(TypeId::VOID);

    let f = builder.function("f", future_int);
    builder.add_flags(f, ElementFlags::ASYNC);
    builder.set_metadata(f, vec![Annotation::Throws(e)]);
    let throw_node = builder.throw_of_type(e, None);
    let stmt = builder.expr_stmt(throw_node);
    let f_body = builder.block([stmt]);
    builder.set_body(f, f_body);

    let g = builder.function("g", future_void);
    builder.add_flags(g, ElementFlags::ASYNC);
    builder.set_metadata(g, vec![Annotation::Safe]);
    let call = builder.call(f, []);
    let awaited = builder.node(NodeData::Await { expr: call });
    let stmt = builder.expr_stmt(awaited);
    let g_body = builder.block([stmt]);
    builder.set_body(g, g_body);
    let program = builder.finish();

    let diagnostics = check(&program);
    assert_eq!(codes(&diagnostics), vec![lint_codes::UNCAUGHT_THROW]);
    assert_eq!(diagnostics[0].1, "E can't be thrown here");
}

/// `@safe a() { b(); } @safe b() { a(); }` - mutual recursion settles
/// with empty throws and no diagnostics.
#[test]
fn mutual_recursion_settles() {
    let mut builder = ProgramBuilder::new("package:app/app.dart");
    let a = builder.function("a", TypeId::VOID);
    builder.set_metadata(a, vec![Annotation::Safe]);
    let b = builder.function("b", TypeId::VOID);
    builder.set_metadata(b, vec![Annotation::Safe]);

    let call_b = builder.call(b, []);
    let stmt = builder.expr_stmt(call_b);
    let a_body = builder.block([stmt]);
    builder.set_body(a, a_body);

    let call_a = builder.call(a, []);
    let stmt = builder.expr_stmt(call_a);
    let b_body = builder.block([stmt]);
    builder.set_body(b, b_body);
    let program = builder.finish();

    assert!(check(&program).is_empty());

    let overrides = OverrideTable::new();
    let session = ResolverSession::new(&program, &overrides);
    for element in [a, b] {
        let configuration = session.element_configuration(element).unwrap();
        assert!(
            configuration
                .invoke()
                .unwrap()
                .throws
                .thrown_types()
                .is_empty()
        );
    }
}
