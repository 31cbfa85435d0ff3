use crate::ast::expr::Expr;
use crate::ast::func::FuncBody;
use crate::ast::stmt::Stmt;
use crate::error::SyntaxErrorType;
use crate::operator::OperatorName;
use crate::parse;

fn err(source: &str) -> SyntaxErrorType {
  parse(source).expect_err(source).typ
}

fn first_expr(source: &str) -> Expr {
  let top = parse(source).unwrap();
  match *top.stx.body[0].stx.clone() {
    Stmt::Expr(e) => *e.stx.expr.stx,
    other => panic!("expected expression statement, got {:?}", other),
  }
}

#[test]
fn binary_precedence_and_associativity() {
  let Expr::Binary(add) = first_expr("1 + 2 * 3") else {
    panic!("expected binary");
  };
  assert_eq!(add.stx.operator, OperatorName::Addition);
  assert!(matches!(add.stx.right.stx.as_ref(), Expr::Binary(b) if b.stx.operator == OperatorName::Multiplication));

  let Expr::Binary(assign) = first_expr("a = b = 1") else {
    panic!("expected binary");
  };
  assert_eq!(assign.stx.operator, OperatorName::Assignment);
  assert!(matches!(assign.stx.right.stx.as_ref(), Expr::Binary(b) if b.stx.operator == OperatorName::Assignment));

  let Expr::Binary(sub) = first_expr("a - b - c") else {
    panic!("expected binary");
  };
  assert!(matches!(sub.stx.left.stx.as_ref(), Expr::Binary(_)));
  assert!(matches!(sub.stx.right.stx.as_ref(), Expr::Id(_)));
}

#[test]
fn conditional_and_logical() {
  let Expr::Cond(cond) = first_expr("a || b ? c : d ?? e") else {
    panic!("expected conditional");
  };
  assert!(matches!(cond.stx.test.stx.as_ref(), Expr::Binary(b) if b.stx.operator == OperatorName::LogicalOr));
  assert!(matches!(cond.stx.alternate.stx.as_ref(), Expr::Binary(b) if b.stx.operator == OperatorName::NullishCoalescing));
}

#[test]
fn arrow_functions() {
  let Expr::ArrowFunc(arrow) = first_expr("(a, b) => a + b") else {
    panic!("expected arrow");
  };
  assert_eq!(arrow.stx.func.stx.parameters, vec!["a", "b"]);
  assert!(matches!(arrow.stx.func.stx.body, FuncBody::Expression(_)));

  let Expr::ArrowFunc(arrow) = first_expr("x => { return x; }") else {
    panic!("expected arrow");
  };
  assert!(arrow.stx.func.stx.arrow);
  assert!(matches!(arrow.stx.func.stx.body, FuncBody::Block(ref b) if b.len() == 1));

  // A parenthesised expression is not mistaken for parameters.
  assert!(matches!(first_expr("(a) * 2"), Expr::Binary(_)));
  assert!(matches!(first_expr("(a + b) * 2"), Expr::Binary(_)));
}

#[test]
fn member_call_and_new() {
  let Expr::Call(call) = first_expr("a.b[c](1, 2,)") else {
    panic!("expected call");
  };
  assert_eq!(call.stx.arguments.len(), 2);
  assert!(matches!(call.stx.callee.stx.as_ref(), Expr::ComputedMember(_)));

  let Expr::New(new) = first_expr("new a.B(1)") else {
    panic!("expected new");
  };
  assert!(matches!(new.stx.callee.stx.as_ref(), Expr::Member(m) if m.stx.right == "B"));
  assert_eq!(new.stx.arguments.len(), 1);

  let Expr::Member(member) = first_expr("a.new") else {
    panic!("expected member");
  };
  assert_eq!(member.stx.right, "new");
}

#[test]
fn object_literals() {
  let top = parse("({ a: 1, 'b c': 2, 3: x, d, })").unwrap();
  let Stmt::Expr(stmt) = top.stx.body[0].stx.as_ref() else {
    panic!("expected expression statement");
  };
  let Expr::LitObj(obj) = stmt.stx.expr.stx.as_ref() else {
    panic!("expected object literal");
  };
  let keys: Vec<_> = obj.stx.members.iter().map(|m| m.stx.key.as_str()).collect();
  assert_eq!(keys, vec!["a", "b c", "3", "d"]);
}

#[test]
fn asi() {
  let top = parse("let a = 1\nlet b = 2\na\n+b").unwrap();
  assert_eq!(top.stx.body.len(), 3);
  assert_eq!(err("let a = 1 let b = 2"), SyntaxErrorType::RequiredTokenNotFound(crate::token::TT::Semicolon));

  // `return` followed by a newline returns nothing.
  let top = parse("function f() { return\n1 }").unwrap();
  let Stmt::FunctionDecl(decl) = top.stx.body[0].stx.as_ref() else {
    panic!("expected function declaration");
  };
  let FuncBody::Block(body) = &decl.stx.function.stx.body else {
    panic!("expected block body");
  };
  assert!(matches!(body[0].stx.as_ref(), Stmt::Return(r) if r.stx.value.is_none()));
}

#[test]
fn use_strict_directive() {
  assert!(parse("'use strict'; var x;").unwrap().stx.strict);
  assert!(parse("\"use strict\"\nx").unwrap().stx.strict);
  assert!(parse("'a'; 'use strict';").unwrap().stx.strict);
  assert!(!parse("x; 'use strict';").unwrap().stx.strict);
  assert!(!parse("'use\\x20strict';").unwrap().stx.strict);
  assert!(!parse("'use strict' + 1;").unwrap().stx.strict);

  let top = parse("function f() { 'use strict'; } function g() {}").unwrap();
  let strictness: Vec<_> = top
    .stx
    .body
    .iter()
    .map(|s| match s.stx.as_ref() {
      Stmt::FunctionDecl(d) => d.stx.function.stx.strict,
      _ => unreachable!(),
    })
    .collect();
  assert_eq!(strictness, vec![true, false]);
}

#[test]
fn control_flow_early_errors() {
  assert_eq!(err("return 1"), SyntaxErrorType::IllegalReturn);
  assert_eq!(err("break"), SyntaxErrorType::IllegalBreak);
  assert_eq!(err("continue"), SyntaxErrorType::IllegalContinue);
  assert_eq!(err("a: { continue a; }"), SyntaxErrorType::IllegalContinue);
  assert_eq!(err("while (1) { function f() { break; } }"), SyntaxErrorType::IllegalBreak);
  assert!(parse("a: { break a; }").is_ok());
  assert!(parse("outer: while (1) { for (;;) { continue outer; } }").is_ok());
  assert!(parse("do x(); while (0) y()").is_ok());
}

#[test]
fn declaration_early_errors() {
  assert_eq!(err("let a; let a;"), SyntaxErrorType::DuplicateDeclaration);
  assert_eq!(err("let a; var a;"), SyntaxErrorType::DuplicateDeclaration);
  assert_eq!(err("let a; { var a; }"), SyntaxErrorType::DuplicateDeclaration);
  assert_eq!(err("const f = 1; function f() {}"), SyntaxErrorType::DuplicateDeclaration);
  assert_eq!(err("function f(a) { let a; }"), SyntaxErrorType::DuplicateDeclaration);
  assert_eq!(err("try {} catch (e) { let e; }"), SyntaxErrorType::DuplicateDeclaration);
  assert!(parse("var a; var a; function a() {}").is_ok());
  assert!(parse("let a; { let a; }").is_ok());
  assert!(parse("try {} catch (e) { var e; }").is_ok());
}

#[test]
fn syntax_errors() {
  assert_eq!(err("1 = 2"), SyntaxErrorType::InvalidAssigmentTarget);
  assert_eq!(err("try {}"), SyntaxErrorType::TryStatementHasNoCatchOrFinally);
  assert_eq!(err("throw\n1"), SyntaxErrorType::LineTerminatorAfterThrow);
  assert_eq!(err("const a;"), SyntaxErrorType::ExpectedSyntax("const initializer"));
  assert_eq!(err("super"), SyntaxErrorType::ExpectedSyntax("`super` property access or call"));
  assert_eq!(err("new.foo"), SyntaxErrorType::ExpectedSyntax("`target` property"));
  assert_eq!(err("(a"), SyntaxErrorType::UnexpectedEnd);
  assert_eq!(err("a +"), SyntaxErrorType::UnexpectedEnd);
}

#[test]
fn nesting_beyond_the_limit_is_rejected() {
  let parens = |n: usize| format!("{}1{}", "(".repeat(n), ")".repeat(n));
  assert_eq!(err(&parens(300)), SyntaxErrorType::NestingTooDeep);
  assert_eq!(err(&parens(100_000)), SyntaxErrorType::NestingTooDeep);
  assert_eq!(
    err(&format!("{}{}", "{".repeat(300), "}".repeat(300))),
    SyntaxErrorType::NestingTooDeep
  );
  assert_eq!(err(&format!("{}x", "!".repeat(300))), SyntaxErrorType::NestingTooDeep);
  assert_eq!(
    err(&format!("{}0{}", "f(".repeat(300), ")".repeat(300))),
    SyntaxErrorType::NestingTooDeep
  );
}

#[test]
fn moderate_nesting_parses() {
  assert!(parse(&format!("{}1{}", "(".repeat(100), ")".repeat(100))).is_ok());
  assert!(parse(&format!("{}{}", "{".repeat(100), "}".repeat(100))).is_ok());
  assert!(parse(&format!("{}x", "!".repeat(100))).is_ok());
  // Long flat chains do not nest.
  assert!(parse(&vec!["1"; 1000].join(" + ")).is_ok());
  assert!(parse(&format!("a{}", ".b".repeat(500))).is_ok());
  // The counter unwinds between statements.
  let deep = format!("{}1{};", "(".repeat(100), ")".repeat(100));
  assert!(parse(&deep.repeat(50)).is_ok());
}
