//! The runtime and its tree-walking evaluator.
//!
//! Statements evaluate to a [`Completion`]; expressions evaluate to `Result<Value, VmError>`, with
//! a script `throw` carried as [`VmError::Throw`] or as any other catchable error. `try` statements
//! are where the two meet: catchable errors are materialized as error objects of the running realm
//! and become throw completions.

use crate::completion::Completion;
use crate::declarations::{
  block_declaration_instantiation, function_declaration_instantiation,
  global_declaration_instantiation, has_block_scoped_declarations,
};
use crate::env::BindingRef;
use crate::execution_context::ExecutionContext;
use crate::function::{FunctionKind, NativeCall, NativeFunction, ThisMode};
use crate::heap::Trace;
use crate::microtask_queue::MicrotaskQueue;
use crate::module_loading::ModuleLoader;
use crate::ops::{loose_equal, strict_equal, to_boolean, to_number, to_rust_string, type_of};
use crate::property::PropertyDescriptor;
use crate::static_semantics::early_errors;
use crate::{GcEnv, GcObject, Heap, RealmId, Value, Vm, VmError, VmOptions};
use script_js::ast::expr::{
  BinaryExpr, CallExpr, ComputedMemberExpr, Expr, LitObjExpr, MemberExpr, NewExpr, UnaryExpr,
};
use script_js::ast::func::{Func, FuncBody};
use script_js::ast::node::Node;
use script_js::ast::stmt::{
  CatchBlock, DoWhileStmt, ForTripleStmt, ForTripleStmtInit, IfStmt, Stmt, TryStmt, VarDecl,
  VarDeclMode, WhileStmt,
};
use script_js::error::SyntaxErrorType;
use script_js::operator::OperatorName;
use std::rc::Rc;

/// A single-threaded JavaScript runtime: the execution context stack, the heap, the microtask
/// queue and the host's module loader.
pub struct JsRuntime {
  pub vm: Vm,
  pub heap: Heap,
  pub(crate) microtasks: MicrotaskQueue,
  pub(crate) module_loader: Option<Box<dyn ModuleLoader>>,
}

impl JsRuntime {
  pub fn new(options: VmOptions) -> Self {
    let heap = Heap::new(options.heap_limits);
    Self {
      vm: Vm::new(options),
      heap,
      microtasks: MicrotaskQueue::new(),
      module_loader: None,
    }
  }

  /// Runs a GC cycle rooted at the persistent roots, the execution context stack and the queued
  /// jobs. Handles held only in Rust locals are not roots.
  pub fn collect_garbage(&mut self) {
    let Self {
      vm,
      heap,
      microtasks,
      ..
    } = self;
    let roots: [&dyn Trace; 2] = [&*vm, &*microtasks];
    heap.collect_garbage_with(&roots);
  }

  /// Parses and runs a classic script at the top level of `realm`.
  ///
  /// Top-level `let`/`const` bindings persist in the realm's global environment; `var` and
  /// function declarations become global object properties.
  pub fn exec_script(&mut self, realm: RealmId, source: &str) -> Result<Value, VmError> {
    let span = tracing::debug_span!(target: "realm_js::vm", "exec_script", ?realm);
    let _enter = span.enter();

    let top = script_js::parse(source).map_err(|err| VmError::Syntax(vec![err]))?;
    let errors = early_errors(&top.stx.body);
    if !errors.is_empty() {
      return Err(VmError::Syntax(errors));
    }

    let global_env = self.heap.realm_global_env(realm)?;
    let ctx = ExecutionContext {
      realm,
      function: None,
      variable_environment: global_env,
      lexical_environment: global_env,
      strict: top.stx.strict,
    };
    let mut guard = self.enter_execution_context(ctx)?;
    let result = run_script(&mut guard, ctx, &top.stx.body);
    guard.exit()?;
    result
  }

  /// `Call(callee, this, args)`.
  pub fn call(&mut self, callee: Value, this: Value, args: &[Value]) -> Result<Value, VmError> {
    let Value::Object(func) = callee else {
      return Err(VmError::NotCallable);
    };
    match self.heap.function_kind(func)? {
      FunctionKind::Native(f) => self.call_native(func, &f, this, args, Value::Undefined),
      FunctionKind::Ecma {
        code,
        env,
        this_mode,
        strict,
      } => self.call_ecma(func, &code, EcmaCall {
        env,
        this_mode,
        strict,
        this,
        new_target: Value::Undefined,
      }, args),
      FunctionKind::Wrapped {
        target,
        origin_realm,
      } => crate::shadow_realm::call_wrapped(self, func, target, origin_realm, this, args),
    }
  }

  /// `Construct(callee, args, newTarget)`; `new_target` defaults to `callee`.
  pub fn construct(
    &mut self,
    callee: Value,
    args: &[Value],
    new_target: Option<Value>,
  ) -> Result<Value, VmError> {
    if !self.heap.is_constructor(callee) {
      return Err(VmError::NotConstructable);
    }
    let Value::Object(func) = callee else {
      return Err(VmError::NotConstructable);
    };
    let new_target = new_target.unwrap_or(callee);
    match self.heap.function_kind(func)? {
      FunctionKind::Native(f) => self.call_native(func, &f, Value::Undefined, args, new_target),
      FunctionKind::Ecma {
        code,
        env,
        this_mode,
        strict,
      } => {
        let prototype = match new_target.as_object() {
          Some(target) => self.heap.get(target, "prototype")?.as_object(),
          None => None,
        };
        let prototype = match prototype {
          Some(prototype) => prototype,
          None => {
            let realm = self.heap.function_realm(func)?;
            self.heap.realm_intrinsics(realm)?.object_prototype
          }
        };
        let this = Value::Object(self.heap.alloc_object(Some(prototype))?);
        let result = self.call_ecma(func, &code, EcmaCall {
          env,
          this_mode,
          strict,
          this,
          new_target,
        }, args)?;
        Ok(if result.is_object() { result } else { this })
      }
      FunctionKind::Wrapped { .. } => Err(VmError::NotConstructable),
    }
  }

  /// Runs a host function inside an execution context of its own realm.
  ///
  /// Catchable errors other than thrown values are materialized as error objects of that realm.
  fn call_native(
    &mut self,
    func: GcObject,
    f: &NativeFunction,
    this: Value,
    args: &[Value],
    new_target: Value,
  ) -> Result<Value, VmError> {
    let realm = self.heap.function_realm(func)?;
    let global_env = self.heap.realm_global_env(realm)?;
    let ctx = ExecutionContext {
      realm,
      function: Some(func),
      variable_environment: global_env,
      lexical_environment: global_env,
      strict: true,
    };
    let call = NativeCall {
      callee: func,
      this,
      args: args.to_vec(),
      new_target,
    };

    let mut guard = self.enter_execution_context(ctx)?;
    let result = match f(&mut *guard, &call) {
      Err(err) if err.is_catchable() && !matches!(err, VmError::Throw(_)) => {
        Err(VmError::Throw(guard.error_to_value(err, realm)?))
      }
      other => other,
    };
    guard.exit()?;
    result
  }

  fn call_ecma(
    &mut self,
    func: GcObject,
    code: &Rc<Func>,
    call: EcmaCall,
    args: &[Value],
  ) -> Result<Value, VmError> {
    let realm = self.heap.function_realm(func)?;
    let this_value = match call.this_mode {
      ThisMode::Lexical => None,
      ThisMode::Strict => Some(call.this),
      ThisMode::Global => Some(match call.this {
        Value::Undefined | Value::Null => Value::Object(self.heap.realm_global_object(realm)?),
        other => other,
      }),
    };
    let local_env = self
      .heap
      .env_create_function(call.env, this_value, call.new_target)?;
    let ctx = ExecutionContext {
      realm,
      function: Some(func),
      variable_environment: local_env,
      lexical_environment: local_env,
      strict: call.strict,
    };

    let mut guard = self.enter_execution_context(ctx)?;
    let result = run_function_body(&mut guard, ctx, code, args);
    guard.exit()?;
    result
  }
}

/// The closure state an ECMAScript function call needs besides its code.
struct EcmaCall {
  env: GcEnv,
  this_mode: ThisMode,
  strict: bool,
  this: Value,
  new_target: Value,
}

fn run_script(rt: &mut JsRuntime, ctx: ExecutionContext, body: &[Node<Stmt>]) -> Result<Value, VmError> {
  global_declaration_instantiation(&mut rt.heap, ctx.realm, body, ctx.lexical_environment)?;
  match Evaluator::new(rt, ctx).eval_stmt_list(body)? {
    Completion::Normal(value) => Ok(value.unwrap_or(Value::Undefined)),
    Completion::Throw(value) => Err(VmError::Throw(value)),
    Completion::Return(_) | Completion::Break(..) | Completion::Continue(..) => Err(
      VmError::InternalInvariantViolation("non-local jump escaped a script"),
    ),
  }
}

fn run_function_body(
  rt: &mut JsRuntime,
  ctx: ExecutionContext,
  code: &Func,
  args: &[Value],
) -> Result<Value, VmError> {
  function_declaration_instantiation(&mut rt.heap, ctx.realm, code, ctx.lexical_environment, args)?;
  let mut evaluator = Evaluator::new(rt, ctx);
  match &code.body {
    FuncBody::Expression(expr) => evaluator.eval_expr(expr),
    FuncBody::Block(body) => match evaluator.eval_stmt_list(body)? {
      Completion::Normal(_) => Ok(Value::Undefined),
      Completion::Return(value) => Ok(value),
      Completion::Throw(value) => Err(VmError::Throw(value)),
      Completion::Break(..) | Completion::Continue(..) => Err(
        VmError::InternalInvariantViolation("break or continue escaped a function body"),
      ),
    },
  }
}

/// `Break` completions targeting an unlabelled loop end the loop normally.
fn break_to_normal(completion: Completion) -> Completion {
  match completion {
    Completion::Break(None, value) => Completion::normal(value.unwrap_or(Value::Undefined)),
    other => other,
  }
}

fn callee_description(expr: &Node<Expr>) -> String {
  match expr.stx.as_ref() {
    Expr::Id(id) => id.stx.name.clone(),
    Expr::Member(member) => format!("{}.{}", callee_description(&member.stx.left), member.stx.right),
    Expr::This(_) => "this".to_string(),
    _ => "expression".to_string(),
  }
}

fn is_anonymous_function(expr: &Node<Expr>) -> bool {
  match expr.stx.as_ref() {
    Expr::ArrowFunc(_) => true,
    Expr::Func(func) => func.stx.func.stx.name.is_none(),
    _ => false,
  }
}

/// Evaluates statements and expressions against the running execution context.
pub(crate) struct Evaluator<'a> {
  rt: &'a mut JsRuntime,
  realm: RealmId,
  env: GcEnv,
  strict: bool,
}

impl<'a> Evaluator<'a> {
  pub(crate) fn new(rt: &'a mut JsRuntime, ctx: ExecutionContext) -> Self {
    Self {
      rt,
      realm: ctx.realm,
      env: ctx.lexical_environment,
      strict: ctx.strict,
    }
  }

  fn heap(&mut self) -> &mut Heap {
    &mut self.rt.heap
  }

  /// Switches the lexical environment, keeping the running context in sync.
  fn set_env(&mut self, env: GcEnv) {
    self.env = env;
    if let Some(ctx) = self.rt.vm.running_execution_context_mut() {
      ctx.lexical_environment = env;
    }
  }

  /// Runs `f`, turning a catchable error into a throw completion.
  fn catching(
    &mut self,
    f: impl FnOnce(&mut Self) -> Result<Completion, VmError>,
  ) -> Result<Completion, VmError> {
    match f(self) {
      Ok(completion) => Ok(completion),
      Err(err) if err.is_catchable() => {
        let value = self.rt.error_to_value(err, self.realm)?;
        Ok(Completion::Throw(value))
      }
      Err(err) => Err(err),
    }
  }

  pub(crate) fn eval_stmt_list(&mut self, stmts: &[Node<Stmt>]) -> Result<Completion, VmError> {
    let mut last: Option<Value> = None;
    for stmt in stmts {
      match self.eval_stmt(stmt)?.update_empty(last) {
        Completion::Normal(value) => {
          if value.is_some() {
            last = value;
          }
        }
        abrupt => return Ok(abrupt),
      }
    }
    Ok(Completion::Normal(last))
  }

  /// Evaluates a statement list in a fresh block environment when it declares anything.
  fn eval_block(&mut self, stmts: &[Node<Stmt>]) -> Result<Completion, VmError> {
    if !has_block_scoped_declarations(stmts) {
      return self.eval_stmt_list(stmts);
    }
    let outer = self.env;
    let block_env = self.rt.heap.env_create(Some(outer))?;
    block_declaration_instantiation(&mut self.rt.heap, self.realm, stmts, block_env)?;
    self.set_env(block_env);
    let result = self.eval_stmt_list(stmts);
    self.set_env(outer);
    result
  }

  fn eval_stmt(&mut self, stmt: &Node<Stmt>) -> Result<Completion, VmError> {
    self.rt.vm.check_native_stack()?;
    self.eval_labelled(stmt, Vec::new())
  }

  /// `LabelledEvaluation` with the label set accumulated so far.
  fn eval_labelled(&mut self, stmt: &Node<Stmt>, labels: Vec<String>) -> Result<Completion, VmError> {
    match stmt.stx.as_ref() {
      Stmt::Label(label) => {
        let mut labels = labels;
        labels.push(label.stx.name.clone());
        Ok(match self.eval_labelled(&label.stx.statement, labels)? {
          Completion::Break(Some(target), value) if target == label.stx.name => {
            Completion::Normal(value)
          }
          other => other,
        })
      }
      Stmt::While(s) => Ok(break_to_normal(self.eval_while(&s.stx, &labels)?)),
      Stmt::DoWhile(s) => Ok(break_to_normal(self.eval_do_while(&s.stx, &labels)?)),
      Stmt::ForTriple(s) => {
        let outer = self.env;
        let result = self.eval_for_triple(&s.stx, &labels);
        self.set_env(outer);
        Ok(break_to_normal(result?))
      }
      _ => self.eval_simple_stmt(stmt),
    }
  }

  fn eval_simple_stmt(&mut self, stmt: &Node<Stmt>) -> Result<Completion, VmError> {
    match stmt.stx.as_ref() {
      Stmt::Block(block) => self.eval_block(&block.stx.body),
      Stmt::Break(s) => Ok(Completion::Break(s.stx.label.clone(), None)),
      Stmt::Continue(s) => Ok(Completion::Continue(s.stx.label.clone(), None)),
      Stmt::Empty(_) | Stmt::FunctionDecl(_) => Ok(Completion::empty()),
      Stmt::Expr(s) => Ok(Completion::normal(self.eval_expr(&s.stx.expr)?)),
      Stmt::If(s) => self.eval_if(&s.stx),
      Stmt::Return(s) => {
        let value = match &s.stx.value {
          Some(expr) => self.eval_expr(expr)?,
          None => Value::Undefined,
        };
        Ok(Completion::Return(value))
      }
      Stmt::Throw(s) => Ok(Completion::Throw(self.eval_expr(&s.stx.value)?)),
      Stmt::Try(s) => self.eval_try(&s.stx),
      Stmt::VarDecl(s) => {
        self.eval_var_decl(&s.stx)?;
        Ok(Completion::empty())
      }
      Stmt::Label(_) | Stmt::While(_) | Stmt::DoWhile(_) | Stmt::ForTriple(_) => {
        self.eval_labelled(stmt, Vec::new())
      }
    }
  }

  fn eval_if(&mut self, stmt: &IfStmt) -> Result<Completion, VmError> {
    let test = self.eval_expr(&stmt.test)?;
    let completion = if to_boolean(&self.rt.heap, test)? {
      self.eval_stmt(&stmt.consequent)?
    } else if let Some(alternate) = &stmt.alternate {
      self.eval_stmt(alternate)?
    } else {
      Completion::empty()
    };
    Ok(completion.update_empty(Some(Value::Undefined)))
  }

  fn eval_try(&mut self, stmt: &TryStmt) -> Result<Completion, VmError> {
    let mut result = self.catching(|ev| ev.eval_block(&stmt.wrapped.stx.body))?;
    if let (Completion::Throw(thrown), Some(catch)) = (result.clone(), &stmt.catch) {
      result = self.catching(|ev| ev.eval_catch(&catch.stx, thrown))?;
    }
    if let Some(finally) = &stmt.finally {
      let finally_result = self.catching(|ev| ev.eval_block(&finally.stx.body))?;
      if finally_result.is_abrupt() {
        return Ok(finally_result.update_empty(Some(Value::Undefined)));
      }
    }
    Ok(result.update_empty(Some(Value::Undefined)))
  }

  fn eval_catch(&mut self, catch: &CatchBlock, thrown: Value) -> Result<Completion, VmError> {
    let outer = self.env;
    let catch_env = self.rt.heap.env_create(Some(outer))?;
    if let Some(param) = &catch.parameter {
      self
        .rt
        .heap
        .env_create_binding(catch_env, param, true, Some(thrown))?;
    }
    self.set_env(catch_env);
    let result = self.eval_block(&catch.body);
    self.set_env(outer);
    result
  }

  fn eval_while(&mut self, stmt: &WhileStmt, labels: &[String]) -> Result<Completion, VmError> {
    let mut last = Value::Undefined;
    loop {
      let test = self.eval_expr(&stmt.condition)?;
      if !to_boolean(&self.rt.heap, test)? {
        return Ok(Completion::normal(last));
      }
      let result = self.eval_stmt(&stmt.body)?;
      if !result.loop_continues(labels) {
        return Ok(result.update_empty(Some(last)));
      }
      if let Some(value) = result.value() {
        last = value;
      }
    }
  }

  fn eval_do_while(&mut self, stmt: &DoWhileStmt, labels: &[String]) -> Result<Completion, VmError> {
    let mut last = Value::Undefined;
    loop {
      let result = self.eval_stmt(&stmt.body)?;
      if !result.loop_continues(labels) {
        return Ok(result.update_empty(Some(last)));
      }
      if let Some(value) = result.value() {
        last = value;
      }
      let test = self.eval_expr(&stmt.condition)?;
      if !to_boolean(&self.rt.heap, test)? {
        return Ok(Completion::normal(last));
      }
    }
  }

  /// `for (init; cond; post)`, giving each iteration its own copy of the `let` bindings.
  fn eval_for_triple(&mut self, stmt: &ForTripleStmt, labels: &[String]) -> Result<Completion, VmError> {
    let mut per_iteration: Vec<&str> = Vec::new();
    match &stmt.init {
      ForTripleStmtInit::None => {}
      ForTripleStmtInit::Expr(expr) => {
        self.eval_expr(expr)?;
      }
      ForTripleStmtInit::Decl(decl) if decl.stx.mode == VarDeclMode::Var => {
        self.eval_var_decl(&decl.stx)?;
      }
      ForTripleStmtInit::Decl(decl) => {
        let loop_env = self.rt.heap.env_create(Some(self.env))?;
        let constant = decl.stx.mode == VarDeclMode::Const;
        for declarator in &decl.stx.declarators {
          self
            .rt
            .heap
            .env_create_binding(loop_env, &declarator.name, !constant, None)?;
        }
        self.set_env(loop_env);
        self.eval_var_decl(&decl.stx)?;
        if !constant {
          per_iteration = decl.stx.declarators.iter().map(|d| d.name.as_str()).collect();
        }
      }
    }

    self.create_per_iteration_env(&per_iteration)?;
    let mut last = Value::Undefined;
    loop {
      if let Some(cond) = &stmt.cond {
        let test = self.eval_expr(cond)?;
        if !to_boolean(&self.rt.heap, test)? {
          return Ok(Completion::normal(last));
        }
      }
      let result = self.eval_stmt(&stmt.body)?;
      if !result.loop_continues(labels) {
        return Ok(result.update_empty(Some(last)));
      }
      if let Some(value) = result.value() {
        last = value;
      }
      self.create_per_iteration_env(&per_iteration)?;
      if let Some(post) = &stmt.post {
        self.eval_expr(post)?;
      }
    }
  }

  /// `CreatePerIterationEnvironment`.
  fn create_per_iteration_env(&mut self, names: &[&str]) -> Result<(), VmError> {
    if names.is_empty() {
      return Ok(());
    }
    let last_env = self.env;
    let outer = self.rt.heap.env_outer(last_env)?;
    let this_env = self.rt.heap.env_create(outer)?;
    for name in names {
      let value = self
        .rt
        .heap
        .get_binding_value(BindingRef::Declarative(last_env), name)?;
      self.rt.heap.env_create_binding(this_env, name, true, Some(value))?;
    }
    self.set_env(this_env);
    Ok(())
  }

  fn eval_var_decl(&mut self, decl: &VarDecl) -> Result<(), VmError> {
    for declarator in &decl.declarators {
      let name = declarator.name.as_str();
      match decl.mode {
        VarDeclMode::Var => {
          let Some(init) = &declarator.initializer else {
            continue;
          };
          let binding = self.rt.heap.resolve_binding(self.env, name)?;
          let value = self.eval_named(init, name)?;
          self.put_binding(binding, name, value)?;
        }
        VarDeclMode::Let | VarDeclMode::Const => {
          let value = match &declarator.initializer {
            Some(init) => self.eval_named(init, name)?,
            None => Value::Undefined,
          };
          match self.rt.heap.resolve_binding(self.env, name)? {
            BindingRef::Declarative(env) => self.rt.heap.env_initialize_binding(env, name, value)?,
            _ => {
              return Err(VmError::InternalInvariantViolation(
                "lexical declaration without a binding",
              ))
            }
          }
        }
      }
    }
    Ok(())
  }

  fn put_binding(&mut self, binding: BindingRef, name: &str, value: Value) -> Result<(), VmError> {
    let global = self.rt.heap.realm_global_object(self.realm)?;
    let strict = self.strict;
    self
      .rt
      .heap
      .set_binding_value(binding, name, value, strict, global)
  }

  pub(crate) fn eval_expr(&mut self, expr: &Node<Expr>) -> Result<Value, VmError> {
    self.rt.vm.check_native_stack()?;
    match expr.stx.as_ref() {
      Expr::LitBool(lit) => Ok(Value::Bool(lit.stx.value)),
      Expr::LitNull(_) => Ok(Value::Null),
      Expr::LitNum(lit) => Ok(Value::Number(lit.stx.value)),
      Expr::LitStr(lit) => Ok(Value::String(self.heap().alloc_string(&lit.stx.value)?)),
      Expr::LitObj(lit) => self.eval_object_literal(&lit.stx),
      Expr::Id(id) => {
        let binding = self.rt.heap.resolve_binding(self.env, &id.stx.name)?;
        self.rt.heap.get_binding_value(binding, &id.stx.name)
      }
      Expr::This(_) => self.rt.heap.resolve_this(self.env),
      Expr::NewTarget(_) => self.rt.heap.resolve_new_target(self.env),
      Expr::Super(_) => Err(VmError::Syntax(vec![
        expr.error(SyntaxErrorType::UnexpectedSuperProperty),
      ])),
      Expr::Func(func) => self.eval_function_expr(&func.stx.func.stx),
      Expr::ArrowFunc(func) => {
        let (realm, env) = (self.realm, self.env);
        Ok(Value::Object(self.heap().alloc_ecma_function(realm, &func.stx.func.stx, env)?))
      }
      Expr::Member(member) => self.eval_member(&member.stx),
      Expr::ComputedMember(member) => self.eval_computed_member(&member.stx),
      Expr::Call(call) => self.eval_call(&call.stx),
      Expr::New(new) => self.eval_new(&new.stx),
      Expr::Cond(cond) => {
        let test = self.eval_expr(&cond.stx.test)?;
        if to_boolean(&self.rt.heap, test)? {
          self.eval_expr(&cond.stx.consequent)
        } else {
          self.eval_expr(&cond.stx.alternate)
        }
      }
      Expr::Unary(unary) => self.eval_unary(&unary.stx),
      Expr::Binary(binary) => self.eval_binary(&binary.stx),
    }
  }

  /// Evaluates an initializer, naming anonymous functions after their binding.
  fn eval_named(&mut self, expr: &Node<Expr>, name: &str) -> Result<Value, VmError> {
    let value = self.eval_expr(expr)?;
    if let (true, Value::Object(func)) = (is_anonymous_function(expr), value) {
      let name = self.heap().alloc_string(name)?;
      self.heap().define_own_property_or_throw(
        func,
        "name",
        PropertyDescriptor::readonly(Value::String(name)),
      )?;
    }
    Ok(value)
  }

  fn eval_object_literal(&mut self, lit: &LitObjExpr) -> Result<Value, VmError> {
    let prototype = self.rt.heap.realm_intrinsics(self.realm)?.object_prototype;
    let obj = self.heap().alloc_object(Some(prototype))?;
    for member in &lit.members {
      let value = self.eval_named(&member.stx.value, &member.stx.key)?;
      self
        .heap()
        .define_own_property_or_throw(obj, &member.stx.key, PropertyDescriptor::data(value))?;
    }
    Ok(Value::Object(obj))
  }

  /// A named function expression binds its own name in an intermediate environment.
  fn eval_function_expr(&mut self, func: &Func) -> Result<Value, VmError> {
    let (realm, env) = (self.realm, self.env);
    let Some(name) = &func.name else {
      return Ok(Value::Object(self.heap().alloc_ecma_function(realm, func, env)?));
    };
    let func_env = self.heap().env_create(Some(env))?;
    let closure = self.heap().alloc_ecma_function(realm, func, func_env)?;
    self
      .heap()
      .env_create_binding(func_env, name, false, Some(Value::Object(closure)))?;
    Ok(Value::Object(closure))
  }

  fn get_value_property(&mut self, base: Value, key: &str) -> Result<Value, VmError> {
    match base {
      Value::Object(obj) => self.rt.heap.get(obj, key),
      Value::String(s) if key == "length" => {
        let len = self.rt.heap.get_string(s)?.as_str().encode_utf16().count();
        Ok(Value::Number(len as f64))
      }
      Value::Undefined | Value::Null => Err(VmError::TypeError(format!(
        "Cannot read properties of {} (reading '{key}')",
        if base == Value::Null { "null" } else { "undefined" },
      ))),
      _ => Ok(Value::Undefined),
    }
  }

  fn put_value_property(&mut self, base: Value, key: &str, value: Value) -> Result<(), VmError> {
    match base {
      Value::Object(obj) => {
        if !self.rt.heap.set(obj, key, value)? && self.strict {
          return Err(VmError::TypeError(format!(
            "Cannot assign to read only property '{key}' of object"
          )));
        }
        Ok(())
      }
      Value::Undefined | Value::Null => Err(VmError::TypeError(format!(
        "Cannot set properties of {} (setting '{key}')",
        if base == Value::Null { "null" } else { "undefined" },
      ))),
      _ if self.strict => Err(VmError::TypeError(format!(
        "Cannot create property '{key}' on a primitive value"
      ))),
      _ => Ok(()),
    }
  }

  fn eval_member(&mut self, member: &MemberExpr) -> Result<Value, VmError> {
    let base = self.eval_object_operand(&member.left)?;
    self.get_value_property(base, &member.right)
  }

  fn eval_computed_member(&mut self, member: &ComputedMemberExpr) -> Result<Value, VmError> {
    let base = self.eval_object_operand(&member.object)?;
    let key = self.eval_expr(&member.member)?;
    let key = to_rust_string(self.heap(), key)?;
    self.get_value_property(base, &key)
  }

  /// The object operand of a member expression, where `super` is rejected.
  fn eval_object_operand(&mut self, expr: &Node<Expr>) -> Result<Value, VmError> {
    if let Expr::Super(_) = expr.stx.as_ref() {
      return Err(VmError::Syntax(vec![
        expr.error(SyntaxErrorType::UnexpectedSuperProperty),
      ]));
    }
    self.eval_expr(expr)
  }

  fn eval_arguments(&mut self, arguments: &[Node<Expr>]) -> Result<Vec<Value>, VmError> {
    arguments.iter().map(|arg| self.eval_expr(arg)).collect()
  }

  fn eval_call(&mut self, call: &CallExpr) -> Result<Value, VmError> {
    let (callee, this) = match call.callee.stx.as_ref() {
      Expr::Super(_) => {
        return Err(VmError::Syntax(vec![
          call.callee.error(SyntaxErrorType::UnexpectedSuperCall),
        ]))
      }
      Expr::Member(member) => {
        let base = self.eval_object_operand(&member.stx.left)?;
        (self.get_value_property(base, &member.stx.right)?, base)
      }
      Expr::ComputedMember(member) => {
        let base = self.eval_object_operand(&member.stx.object)?;
        let key = self.eval_expr(&member.stx.member)?;
        let key = to_rust_string(self.heap(), key)?;
        (self.get_value_property(base, &key)?, base)
      }
      _ => (self.eval_expr(&call.callee)?, Value::Undefined),
    };
    let args = self.eval_arguments(&call.arguments)?;
    if !self.rt.heap.is_callable(callee) {
      return Err(VmError::TypeError(format!(
        "{} is not a function",
        callee_description(&call.callee)
      )));
    }
    self.rt.call(callee, this, &args)
  }

  fn eval_new(&mut self, new: &NewExpr) -> Result<Value, VmError> {
    let callee = self.eval_expr(&new.callee)?;
    let args = self.eval_arguments(&new.arguments)?;
    if !self.rt.heap.is_constructor(callee) {
      return Err(VmError::TypeError(format!(
        "{} is not a constructor",
        callee_description(&new.callee)
      )));
    }
    self.rt.construct(callee, &args, None)
  }

  fn eval_unary(&mut self, unary: &UnaryExpr) -> Result<Value, VmError> {
    if unary.operator == OperatorName::Typeof {
      let value = match unary.argument.stx.as_ref() {
        Expr::Id(id) => match self.rt.heap.resolve_binding(self.env, &id.stx.name)? {
          BindingRef::Unresolvable => Value::Undefined,
          binding => self.rt.heap.get_binding_value(binding, &id.stx.name)?,
        },
        _ => self.eval_expr(&unary.argument)?,
      };
      let name = type_of(&self.rt.heap, value);
      return Ok(Value::String(self.heap().alloc_string(name)?));
    }

    let value = self.eval_expr(&unary.argument)?;
    Ok(match unary.operator {
      OperatorName::LogicalNot => Value::Bool(!to_boolean(&self.rt.heap, value)?),
      OperatorName::UnaryNegation => Value::Number(-to_number(&self.rt.heap, value)?),
      OperatorName::UnaryPlus => Value::Number(to_number(&self.rt.heap, value)?),
      OperatorName::Void => Value::Undefined,
      _ => {
        return Err(VmError::InternalInvariantViolation(
          "unexpected unary operator",
        ))
      }
    })
  }

  fn eval_binary(&mut self, binary: &BinaryExpr) -> Result<Value, VmError> {
    match binary.operator {
      op if op.is_assignment() => self.eval_assignment(binary),
      OperatorName::LogicalAnd => {
        let left = self.eval_expr(&binary.left)?;
        if to_boolean(&self.rt.heap, left)? {
          self.eval_expr(&binary.right)
        } else {
          Ok(left)
        }
      }
      OperatorName::LogicalOr => {
        let left = self.eval_expr(&binary.left)?;
        if to_boolean(&self.rt.heap, left)? {
          Ok(left)
        } else {
          self.eval_expr(&binary.right)
        }
      }
      OperatorName::NullishCoalescing => {
        let left = self.eval_expr(&binary.left)?;
        match left {
          Value::Undefined | Value::Null => self.eval_expr(&binary.right),
          _ => Ok(left),
        }
      }
      op => {
        let left = self.eval_expr(&binary.left)?;
        let right = self.eval_expr(&binary.right)?;
        self.apply_binary(op, left, right)
      }
    }
  }

  fn apply_binary(&mut self, op: OperatorName, left: Value, right: Value) -> Result<Value, VmError> {
    let heap = &mut self.rt.heap;
    let number = |heap: &Heap, f: fn(f64, f64) -> f64| -> Result<Value, VmError> {
      Ok(Value::Number(f(to_number(heap, left)?, to_number(heap, right)?)))
    };
    match op {
      OperatorName::Addition => {
        let concat = matches!(left, Value::String(_) | Value::Object(_))
          || matches!(right, Value::String(_) | Value::Object(_));
        if concat {
          let mut text = to_rust_string(heap, left)?;
          text.push_str(&to_rust_string(heap, right)?);
          Ok(Value::String(heap.alloc_string(&text)?))
        } else {
          number(heap, |a, b| a + b)
        }
      }
      OperatorName::Subtraction => number(heap, |a, b| a - b),
      OperatorName::Multiplication => number(heap, |a, b| a * b),
      OperatorName::Division => number(heap, |a, b| a / b),
      OperatorName::Remainder => number(heap, |a, b| a % b),
      OperatorName::Equality => Ok(Value::Bool(loose_equal(heap, left, right)?)),
      OperatorName::Inequality => Ok(Value::Bool(!loose_equal(heap, left, right)?)),
      OperatorName::StrictEquality => Ok(Value::Bool(strict_equal(heap, left, right)?)),
      OperatorName::StrictInequality => Ok(Value::Bool(!strict_equal(heap, left, right)?)),
      OperatorName::LessThan
      | OperatorName::LessThanOrEqual
      | OperatorName::GreaterThan
      | OperatorName::GreaterThanOrEqual => Ok(Value::Bool(compare(heap, op, left, right)?)),
      _ => Err(VmError::InternalInvariantViolation(
        "unexpected binary operator",
      )),
    }
  }

  fn eval_assignment(&mut self, binary: &BinaryExpr) -> Result<Value, VmError> {
    let compound = match binary.operator {
      OperatorName::Assignment => None,
      OperatorName::AssignmentAddition => Some(OperatorName::Addition),
      OperatorName::AssignmentSubtraction => Some(OperatorName::Subtraction),
      OperatorName::AssignmentMultiplication => Some(OperatorName::Multiplication),
      _ => {
        return Err(VmError::InternalInvariantViolation(
          "unexpected assignment operator",
        ))
      }
    };

    match binary.left.stx.as_ref() {
      Expr::Id(id) => {
        let name = id.stx.name.as_str();
        let binding = self.rt.heap.resolve_binding(self.env, name)?;
        let value = match compound {
          None => self.eval_named(&binary.right, name)?,
          Some(op) => {
            let current = self.rt.heap.get_binding_value(binding, name)?;
            let right = self.eval_expr(&binary.right)?;
            self.apply_binary(op, current, right)?
          }
        };
        self.put_binding(binding, name, value)?;
        Ok(value)
      }
      Expr::Member(member) => {
        let base = self.eval_object_operand(&member.stx.left)?;
        let key = member.stx.right.as_str();
        let value = self.eval_property_assignment(base, key, compound, &binary.right)?;
        self.put_value_property(base, key, value)?;
        Ok(value)
      }
      Expr::ComputedMember(member) => {
        let base = self.eval_object_operand(&member.stx.object)?;
        let key = self.eval_expr(&member.stx.member)?;
        let key = to_rust_string(self.heap(), key)?;
        let value = self.eval_property_assignment(base, &key, compound, &binary.right)?;
        self.put_value_property(base, &key, value)?;
        Ok(value)
      }
      _ => Err(VmError::Syntax(vec![
        binary.left.error(SyntaxErrorType::InvalidAssigmentTarget),
      ])),
    }
  }

  fn eval_property_assignment(
    &mut self,
    base: Value,
    key: &str,
    compound: Option<OperatorName>,
    right: &Node<Expr>,
  ) -> Result<Value, VmError> {
    match compound {
      None => self.eval_expr(right),
      Some(op) => {
        let current = self.get_value_property(base, key)?;
        let right = self.eval_expr(right)?;
        self.apply_binary(op, current, right)
      }
    }
  }
}

/// `IsLessThan`-based relational comparison: strings compare lexically, everything else as
/// numbers, with `NaN` comparing false.
fn compare(heap: &Heap, op: OperatorName, left: Value, right: Value) -> Result<bool, VmError> {
  use std::cmp::Ordering;

  let ordering = match (left, right) {
    (Value::String(a), Value::String(b)) => {
      Some(heap.get_string(a)?.as_str().cmp(heap.get_string(b)?.as_str()))
    }
    _ => to_number(heap, left)?.partial_cmp(&to_number(heap, right)?),
  };
  let Some(ordering) = ordering else {
    return Ok(false);
  };
  Ok(match op {
    OperatorName::LessThan => ordering == Ordering::Less,
    OperatorName::LessThanOrEqual => ordering != Ordering::Greater,
    OperatorName::GreaterThan => ordering == Ordering::Greater,
    _ => ordering != Ordering::Less,
  })
}
