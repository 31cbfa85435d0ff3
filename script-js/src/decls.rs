//! Declaration name collection over statement lists.
//!
//! These mirror the VarDeclaredNames/LexicallyDeclaredNames static semantics: `var` declarations
//! are hoisted through nested statements (but never into nested functions), while `let`/`const`
//! only belong to the statement list that directly contains them.

use crate::ast::func::Func;
use crate::ast::node::Node;
use crate::ast::stmt::ForTripleStmtInit;
use crate::ast::stmt::Stmt;
use crate::ast::stmt::VarDecl;
use crate::ast::stmt::VarDeclMode;

/// A `let` or `const` binding declared directly in a statement list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LexicalName<'a> {
  pub name: &'a str,
  pub constant: bool,
}

fn push_var_names<'a>(decl: &'a VarDecl, out: &mut Vec<&'a str>) {
  if decl.mode == VarDeclMode::Var {
    out.extend(decl.declarators.iter().map(|d| d.name.as_str()));
  }
}

fn collect_var_names<'a>(stmt: &'a Node<Stmt>, out: &mut Vec<&'a str>) {
  match stmt.stx.as_ref() {
    Stmt::VarDecl(decl) => push_var_names(&decl.stx, out),
    Stmt::Block(block) => {
      for s in &block.stx.body {
        collect_var_names(s, out);
      }
    }
    Stmt::DoWhile(n) => collect_var_names(&n.stx.body, out),
    Stmt::While(n) => collect_var_names(&n.stx.body, out),
    Stmt::ForTriple(n) => {
      if let ForTripleStmtInit::Decl(decl) = &n.stx.init {
        push_var_names(&decl.stx, out);
      }
      collect_var_names(&n.stx.body, out);
    }
    Stmt::If(n) => {
      collect_var_names(&n.stx.consequent, out);
      if let Some(alt) = &n.stx.alternate {
        collect_var_names(alt, out);
      }
    }
    Stmt::Label(n) => collect_var_names(&n.stx.statement, out),
    Stmt::Try(n) => {
      for s in &n.stx.wrapped.stx.body {
        collect_var_names(s, out);
      }
      if let Some(catch) = &n.stx.catch {
        for s in &catch.stx.body {
          collect_var_names(s, out);
        }
      }
      if let Some(finally) = &n.stx.finally {
        for s in &finally.stx.body {
          collect_var_names(s, out);
        }
      }
    }
    Stmt::Break(_)
    | Stmt::Continue(_)
    | Stmt::Empty(_)
    | Stmt::Expr(_)
    | Stmt::FunctionDecl(_)
    | Stmt::Return(_)
    | Stmt::Throw(_) => {}
  }
}

/// Names declared with `var` anywhere within `stmts`, excluding nested functions. May contain
/// duplicates, in source order.
pub fn var_declared_names(stmts: &[Node<Stmt>]) -> Vec<&str> {
  let mut out = Vec::new();
  for stmt in stmts {
    collect_var_names(stmt, &mut out);
  }
  out
}

/// `let`/`const` declarations directly contained in `stmts`.
pub fn lexically_declared_names(stmts: &[Node<Stmt>]) -> Vec<LexicalName<'_>> {
  let mut out = Vec::new();
  for stmt in stmts {
    if let Stmt::VarDecl(decl) = stmt.stx.as_ref() {
      let constant = match decl.stx.mode {
        VarDeclMode::Var => continue,
        VarDeclMode::Let => false,
        VarDeclMode::Const => true,
      };
      out.extend(decl.stx.declarators.iter().map(|d| LexicalName {
        name: d.name.as_str(),
        constant,
      }));
    }
  }
  out
}

/// Function declarations directly contained in `stmts`, in source order.
pub fn function_declarations(stmts: &[Node<Stmt>]) -> Vec<&Node<Func>> {
  stmts
    .iter()
    .filter_map(|stmt| match stmt.stx.as_ref() {
      Stmt::FunctionDecl(decl) => Some(&decl.stx.function),
      _ => None,
    })
    .collect()
}
