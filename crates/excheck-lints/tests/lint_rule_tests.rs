//! Rule-level coverage beyond the end-to-end scenarios: partial catches,
//! rethrow, casts, setters, named arguments, interface overrides, and the
//! quiet paths that must stay quiet.

use excheck_common::diagnostics::lint_codes;
use excheck_lints::{LintContext, check_unit};
use excheck_model::{
    Annotation, ElementKind, NodeData, Program, ProgramBuilder, TypeId, UnitId,
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

/// A catch clause for one exception type does not swallow an unrelated
/// one.
#[test]
fn partial_catch_still_reports_the_uncaught_type() {
    let mut builder = ProgramBuilder::new("package:app/app.dart");
    let io = builder
        .types()
        .interface_full("IOException", None, [TypeId::EXCEPTION], [], []);
    let format_exception = builder
        .types()
        .interface_full("FormatException", None, [TypeId::EXCEPTION], [], []);

    let f = builder.function("f", TypeId::VOID);
    builder.set_metadata(f, vec![Annotation::Safe]);
    let throw_io = builder.throw_of_type(io, None);
    let io_stmt = builder.expr_stmt(throw_io);
    let throw_format = builder.throw_of_type(format_exception, None);
    let format_stmt = builder.expr_stmt(throw_format);
    let try_body = builder.block([io_stmt, format_stmt]);
    let catch_body = builder.block([]);
    let catch_clause = builder.node(NodeData::CatchClause {
        exception_type: Some(format_exception),
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

    let diagnostics = check(&program);
    assert_eq!(codes(&diagnostics), vec![lint_codes::UNCAUGHT_THROW]);
    assert_eq!(diagnostics[0].1, "IOException can't be thrown here");
}

/// A throw inside a catch body is not protected by that try's clauses.
#[test]
fn throw_in_catch_body_reports() {
    let mut builder = ProgramBuilder::new("package:app/app.dart");
    let f = builder.function("f", TypeId::VOID);
    builder.set_metadata(f, vec![Annotation::Safe]);
    let throw_inner = builder.throw_of_type(TypeId::EXCEPTION, None);
    let inner_stmt = builder.expr_stmt(throw_inner);
    let try_body = builder.block([]);
    let catch_body = builder.block([inner_stmt]);
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

    assert_eq!(codes(&check(&program)), vec![lint_codes::UNCAUGHT_THROW]);
}

/// `rethrow` throws the enclosing clause's type.
#[test]
fn rethrow_reports_the_caught_type() {
    let mut builder = ProgramBuilder::new("package:app/app.dart");
    let io = builder
        .types()
        .interface_full("IOException", None, [TypeId::EXCEPTION], [], []);

    let f = builder.function("f", TypeId::VOID);
    builder.set_metadata(f, vec![Annotation::Safe]);
    let throw_io = builder.throw_of_type(io, None);
    let throw_stmt = builder.expr_stmt(throw_io);
    let try_body = builder.block([throw_stmt]);
    let rethrow = builder.node(NodeData::Rethrow);
    let rethrow_stmt = builder.expr_stmt(rethrow);
    let catch_body = builder.block([rethrow_stmt]);
    let catch_clause = builder.node(NodeData::CatchClause {
        exception_type: Some(io),
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

    let diagnostics = check(&program);
    assert_eq!(codes(&diagnostics), vec![lint_codes::UNCAUGHT_THROW]);
    assert_eq!(diagnostics[0].1, "IOException can't be thrown here");
}

/// `e as T` can fail with TypeError - but Errors are fine under `@safe`;
/// only `@neverThrows` rejects them.
#[test]
fn cast_reports_only_under_never_throws() {
    for (annotation, expected) in [
        (Annotation::Safe, vec![]),
        (Annotation::NeverThrows, vec![lint_codes::UNCAUGHT_THROW]),
    ] {
        let mut builder = ProgramBuilder::new("package:app/app.dart");
        let f = builder.function("f", TypeId::VOID);
        builder.set_metadata(f, vec![annotation]);
        let operand = builder.node(NodeData::NullLiteral);
        let cast = builder.node(NodeData::Cast {
            expr: operand,
            ty: TypeId::EXCEPTION,
        });
        let stmt = builder.expr_stmt(cast);
        let body = builder.block([stmt]);
        builder.set_body(f, body);
        let program = builder.finish();

        assert_eq!(codes(&check(&program)), expected, "{annotation:?}");
    }
}

/// Assigning through a throwing setter surfaces the setter's throws at
/// the assignment site.
#[test]
fn setter_throws_surface_at_assignment() {
    let mut builder = ProgramBuilder::new("package:app/app.dart");
    let e = builder
        .types()
        .interface_full("E", None, [TypeId::EXCEPTION], [], []);
    let (class, _) = builder.class("Box", None);
    let setter = builder.member(class, "value", ElementKind::Setter, Some(TypeId::VOID));
    builder.set_metadata(setter, vec![Annotation::Throws(e)]);
    let value_param = builder.parameter(setter, "value", TypeId::OBJECT);
    let setter_body = builder.block([]);
    builder.set_body(setter, setter_body);
    let _ = value_param;

    let f = builder.function("f", TypeId::VOID);
    builder.set_metadata(f, vec![Annotation::Safe]);
    let target = builder.node(NodeData::PropertyAccess {
        target: None,
        element: Some(setter),
    });
    let value = builder.node(NodeData::NullLiteral);
    let assignment = builder.node(NodeData::Assignment {
        target,
        value,
        setter: Some(setter),
    });
    let stmt = builder.expr_stmt(assignment);
    let body = builder.block([stmt]);
    builder.set_body(f, body);
    let program = builder.finish();

    let diagnostics = check(&program);
    assert_eq!(codes(&diagnostics), vec![lint_codes::UNCAUGHT_THROW]);
    assert_eq!(diagnostics[0].1, "E can't be thrown here");
}

/// Named arguments pair with parameters by name for assignment checking.
#[test]
fn named_argument_lambda_is_checked_against_its_parameter() {
    let mut builder = ProgramBuilder::new("package:app/app.dart");
    let callback_type = builder.types().function_type([], TypeId::VOID);
    let g = builder.function("g", TypeId::VOID);
    let first = builder.parameter(g, "first", TypeId::OBJECT);
    let callback = builder.parameter(g, "onError", callback_type);
    builder.set_metadata(callback, vec![Annotation::Safe]);
    let g_body = builder.block([]);
    builder.set_body(g, g_body);
    let _ = first;

    let main = builder.function("main", TypeId::VOID);
    let closure = builder.closure_element(TypeId::VOID);
    let closure_body = builder.throw_of_type(TypeId::EXCEPTION, None);
    builder.set_body(closure, closure_body);
    let lambda = builder.node(NodeData::FunctionExpression {
        element: closure,
        parameter: Some(callback),
    });
    let name = builder.interner().intern("onError");
    let named = builder.node(NodeData::NamedArgument { name, expr: lambda });
    let callee = builder.identifier(g);
    let call = builder.node(NodeData::Invocation {
        callee,
        args: [named].into_iter().collect(),
    });
    let stmt = builder.expr_stmt(call);
    let main_body = builder.block([stmt]);
    builder.set_body(main, main_body);
    let program = builder.finish();

    assert_eq!(codes(&check(&program)), vec![lint_codes::UNSAFE_ASSIGNMENT]);
}

/// Initializing an annotated callable variable with a throwing lambda is
/// an unsafe assignment.
#[test]
fn annotated_variable_initializer_is_checked() {
    let mut builder = ProgramBuilder::new("package:app/app.dart");
    let callback_type = builder.types().function_type([], TypeId::VOID);
    let f = builder.function("f", TypeId::VOID);
    let variable = builder.local_variable(f, "handler", Some(callback_type));
    builder.set_metadata(variable, vec![Annotation::NeverThrows]);

    let closure = builder.closure_element(TypeId::VOID);
    let closure_body = builder.throw_of_type(TypeId::STATE_ERROR, None);
    builder.set_body(closure, closure_body);
    let lambda = builder.node(NodeData::FunctionExpression {
        element: closure,
        parameter: None,
    });
    builder.set_initializer(variable, lambda);
    let declaration = builder.node(NodeData::VariableDeclaration { element: variable });
    let body = builder.block([declaration]);
    builder.set_body(f, body);
    let program = builder.finish();

    assert_eq!(codes(&check(&program)), vec![lint_codes::UNSAFE_ASSIGNMENT]);
}

/// Implementing an interface member is held to the same override rule as
/// extending a class.
#[test]
fn interface_implementation_is_checked_for_override_safety() {
    let mut builder = ProgramBuilder::new("package:app/app.dart");
    let (iface, iface_ty) = builder.class("Reader", None);
    let read = builder.member(iface, "read", ElementKind::Method, Some(TypeId::VOID));
    builder.set_metadata(read, vec![Annotation::NeverThrows]);
    let read_body = builder.block([]);
    builder.set_body(read, read_body);

    let (impl_class, _) =
        builder.class_full("FileReader", ElementKind::Class, None, [iface_ty], [], []);
    let impl_read = builder.member(impl_class, "read", ElementKind::Method, Some(TypeId::VOID));
    let throw_node = builder.throw_of_type(TypeId::STATE_ERROR, None);
    let stmt = builder.expr_stmt(throw_node);
    let impl_body = builder.block([stmt]);
    builder.set_body(impl_read, impl_body);
    let program = builder.finish();

    assert_eq!(codes(&check(&program)), vec![lint_codes::UNSAFE_OVERRIDE]);
}

/// An override that narrows is fine.
#[test]
fn narrowing_override_is_quiet() {
    let mut builder = ProgramBuilder::new("package:app/app.dart");
    let io = builder
        .types()
        .interface_full("IOException", None, [TypeId::EXCEPTION], [], []);
    let (base, base_ty) = builder.class("Base", None);
    let m = builder.member(base, "m", ElementKind::Method, Some(TypeId::VOID));
    builder.set_metadata(m, vec![Annotation::Throws(TypeId::EXCEPTION)]);
    let body = builder.block([]);
    builder.set_body(m, body);

    let (sub, _) = builder.class("Sub", Some(base_ty));
    let sub_m = builder.member(sub, "m", ElementKind::Method, Some(TypeId::VOID));
    builder.set_metadata(sub_m, vec![Annotation::Throws(io)]);
    let throw_node = builder.throw_of_type(io, None);
    let stmt = builder.expr_stmt(throw_node);
    let sub_body = builder.block([stmt]);
    builder.set_body(sub_m, sub_body);
    let program = builder.finish();

    assert!(check(&program).is_empty());
}

/// Fully unannotated code never reports: inference covers what bodies
/// throw, and nothing constrains assignments.
#[test]
fn unannotated_code_is_quiet() {
    let mut builder = ProgramBuilder::new("package:app/app.dart");
    let f = builder.function("f", TypeId::VOID);
    let throw_node = builder.throw_of_type(TypeId::EXCEPTION, None);
    let stmt = builder.expr_stmt(throw_node);
    let body = builder.block([stmt]);
    builder.set_body(f, body);

    let g = builder.function("g", TypeId::VOID);
    let call = builder.call(f, []);
    let stmt = builder.expr_stmt(call);
    let g_body = builder.block([stmt]);
    builder.set_body(g, g_body);
    let program = builder.finish();

    assert!(check(&program).is_empty());
}

/// Calling a `@Throws<E>` function from a `@safe` one reports at the
/// call site.
#[test]
fn call_site_reports_callee_declared_throws() {
    let mut builder = ProgramBuilder::new("package:app/app.dart");
    let e = builder
        .types()
        .interface_full("E", None, [TypeId::EXCEPTION], [], []);
    let risky = builder.function("risky", TypeId::VOID);
    builder.set_metadata(risky, vec![Annotation::Throws(e)]);
    let risky_body = builder.block([]);
    builder.set_body(risky, risky_body);

    let f = builder.function("f", TypeId::VOID);
    builder.set_metadata(f, vec![Annotation::Safe]);
    let call = builder.call(risky, []);
    let stmt = builder.expr_stmt(call);
    let body = builder.block([stmt]);
    builder.set_body(f, body);
    let program = builder.finish();

    let diagnostics = check(&program);
    assert_eq!(codes(&diagnostics), vec![lint_codes::UNCAUGHT_THROW]);
    assert_eq!(diagnostics[0].1, "E can't be thrown here");
}

/// An eager local initializer inside a try body is protected by the
/// try's clauses.
#[test]
fn eager_initializer_respects_enclosing_try() {
    let mut builder = ProgramBuilder::new("package:app/app.dart");
    let e = builder
        .types()
        .interface_full("E", None, [TypeId::EXCEPTION], [], []);
    let risky = builder.function("risky", TypeId::OBJECT);
    builder.set_metadata(risky, vec![Annotation::Throws(e)]);
    let risky_body = builder.block([]);
    builder.set_body(risky, risky_body);

    let f = builder.function("f", TypeId::VOID);
    builder.set_metadata(f, vec![Annotation::Safe]);
    let variable = builder.local_variable(f, "x", Some(TypeId::OBJECT));
    let initializer = builder.call(risky, []);
    builder.set_initializer(variable, initializer);
    let declaration = builder.node(NodeData::VariableDeclaration { element: variable });
    let try_body = builder.block([declaration]);
    let catch_body = builder.block([]);
    let catch_clause = builder.node(NodeData::CatchClause {
        exception_type: Some(e),
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
