//! Tree-walking evaluation of a parsed program.

mod functor;
mod intrinsics;
mod operators;

use qsb_ir::{QubitId, StandardGate};
use qsb_lang::ast::{
    AdjointSpec, BinOp, Block, CallableDecl, CallableKind, Expr, Functor, InterpPart, Pattern,
    Program, QubitInit, Stmt,
};
use rustc_hash::FxHashMap;
use tracing::{debug, instrument, trace};

use crate::backend::{Backend, MeasurementResult, Receiver};
use crate::error::{BackendError, EvalError, EvalResult};
use crate::value::{CallableRef, CallableTarget, Value};

/// Recursion limit for callable invocations.
///
/// Each level costs native stack; a run that goes this deep needs a larger
/// stack than the default 2 MiB of a spawned thread.
pub const MAX_CALL_DEPTH: usize = 256;

/// Largest array `[value, size = n]` may create.
pub const MAX_ARRAY_LEN: usize = 1 << 20;

/// A gate with its operands, as recorded for functor application.
pub(crate) type GateOp = (StandardGate, Vec<QubitId>);

/// A parsed program ready for evaluation.
///
/// The interpreter is immutable once built, so one instance can be
/// evaluated many times (once per shot) against fresh backend state.
#[derive(Debug)]
pub struct Interpreter {
    program: Program,
    globals: FxHashMap<String, usize>,
    entry: Entry,
}

#[derive(Debug)]
enum Entry {
    Callable(usize),
    Expression(Expr),
}

impl Interpreter {
    /// Parse `source` and select its entry point.
    ///
    /// The entry point is the callable marked `@EntryPoint()`, or else a
    /// callable named `Main`.
    pub fn new(source: &str) -> EvalResult<Self> {
        let program = qsb_lang::parse(source)?;
        let globals = index_callables(&program);
        let entry = find_entry(&program)?;
        debug!(
            callables = program.callables.len(),
            entry = %program.callables[entry].name,
            "Program loaded"
        );
        Ok(Self {
            program,
            globals,
            entry: Entry::Callable(entry),
        })
    }

    /// Parse `source` and use the callable `name` as the entry, whether or
    /// not it is marked `@EntryPoint()`. `name` may be namespace-qualified,
    /// as in `Test.Main`.
    pub fn with_operation(source: &str, name: &str) -> EvalResult<Self> {
        let program = qsb_lang::parse(source)?;
        let globals = index_callables(&program);
        let entry = *globals
            .get(name)
            .ok_or_else(|| EvalError::UnknownIdentifier(name.to_string()))?;
        let decl = &program.callables[entry];
        if !decl.params.is_empty() {
            return Err(EvalError::EntryPointHasParameters(decl.name.clone()));
        }
        debug!(callables = program.callables.len(), entry = %decl.name, "Program loaded");
        Ok(Self {
            program,
            globals,
            entry: Entry::Callable(entry),
        })
    }

    /// Use a single expression as the entry, e.g.
    /// `{ operation Foo() : Result { ... }; Foo() }`.
    pub fn from_expression(expr: &str) -> EvalResult<Self> {
        let expr = qsb_lang::parse_expression(expr)?;
        Ok(Self {
            program: Program::default(),
            globals: FxHashMap::default(),
            entry: Entry::Expression(expr),
        })
    }

    /// Name of the entry callable, if the entry is not an expression.
    pub fn entry_name(&self) -> Option<&str> {
        match self.entry {
            Entry::Callable(idx) => self.program.callables.get(idx).map(|c| c.name.as_str()),
            Entry::Expression(_) => None,
        }
    }

    /// The parsed program.
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Evaluate the entry point once.
    #[instrument(skip_all)]
    pub fn eval_entry(
        &self,
        backend: &mut dyn Backend,
        receiver: &mut dyn Receiver,
    ) -> EvalResult<Value> {
        let mut evaluator = Evaluator::new(self, backend, receiver);
        let result = match &self.entry {
            Entry::Callable(idx) => {
                let name = self.program.callables[*idx].name.clone();
                let callee = CallableRef::new(CallableTarget::Global(*idx), name);
                evaluator.call(&callee, Vec::new())
            }
            Entry::Expression(expr) => evaluator.eval_top(expr),
        };
        finish(result)
    }
}

fn index_callables(program: &Program) -> FxHashMap<String, usize> {
    let mut globals = FxHashMap::default();
    for (idx, decl) in program.callables.iter().enumerate() {
        globals.entry(decl.name.clone()).or_insert(idx);
        if let Some(ns) = &decl.namespace {
            globals.entry(format!("{ns}.{}", decl.name)).or_insert(idx);
        }
    }
    globals
}

fn find_entry(program: &Program) -> EvalResult<usize> {
    let marked: Vec<usize> = program
        .callables
        .iter()
        .enumerate()
        .filter(|(_, c)| c.has_attribute("EntryPoint"))
        .map(|(i, _)| i)
        .collect();

    let entry = match marked.as_slice() {
        [single] => *single,
        [] => program
            .callables
            .iter()
            .position(|c| c.name == "Main")
            .ok_or(EvalError::NoEntryPoint)?,
        many => {
            let names: Vec<&str> = many
                .iter()
                .map(|i| program.callables[*i].name.as_str())
                .collect();
            return Err(EvalError::MultipleEntryPoints(names.join(", ")));
        }
    };

    let decl = &program.callables[entry];
    if !decl.params.is_empty() {
        return Err(EvalError::EntryPointHasParameters(decl.name.clone()));
    }
    Ok(entry)
}

/// Non-local exits during evaluation.
pub(crate) enum Interrupt {
    Return(Value),
    Error(EvalError),
}

impl From<EvalError> for Interrupt {
    fn from(err: EvalError) -> Self {
        Interrupt::Error(err)
    }
}

impl From<BackendError> for Interrupt {
    fn from(err: BackendError) -> Self {
        Interrupt::Error(err.into())
    }
}

pub(crate) type Exec<T> = Result<T, Interrupt>;

fn finish(result: Exec<Value>) -> EvalResult<Value> {
    match result {
        Ok(value) | Err(Interrupt::Return(value)) => Ok(value),
        Err(Interrupt::Error(err)) => Err(err),
    }
}

struct Binding {
    value: Value,
    mutable: bool,
}

#[derive(Default)]
struct Scope {
    vars: FxHashMap<String, Binding>,
    callables: FxHashMap<String, usize>,
    qubits: Vec<QubitId>,
}

struct Frame {
    kind: CallableKind,
    base: Scope,
    nested: Vec<Scope>,
}

impl Frame {
    fn new(kind: CallableKind) -> Self {
        Self {
            kind,
            base: Scope::default(),
            nested: Vec::new(),
        }
    }

    fn top(&mut self) -> &mut Scope {
        self.nested.last_mut().unwrap_or(&mut self.base)
    }

    fn scopes(&self) -> impl Iterator<Item = &Scope> {
        self.nested.iter().rev().chain(std::iter::once(&self.base))
    }
}

/// State of a single evaluation run.
pub(crate) struct Evaluator<'a> {
    interp: &'a Interpreter,
    backend: &'a mut dyn Backend,
    receiver: &'a mut dyn Receiver,
    current: Frame,
    callers: Vec<Frame>,
    locals: Vec<&'a CallableDecl>,
    recording: Vec<Vec<GateOp>>,
}

impl<'a> Evaluator<'a> {
    fn new(
        interp: &'a Interpreter,
        backend: &'a mut dyn Backend,
        receiver: &'a mut dyn Receiver,
    ) -> Self {
        Self {
            interp,
            backend,
            receiver,
            current: Frame::new(CallableKind::Operation),
            callers: Vec::new(),
            locals: Vec::new(),
            recording: Vec::new(),
        }
    }

    fn eval_top(&mut self, expr: &'a Expr) -> Exec<Value> {
        self.scoped(|ev| ev.eval_expr(expr))
    }

    // Scopes and frames

    fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> Exec<T>) -> Exec<T> {
        self.current.nested.push(Scope::default());
        let result = f(self);
        let scope = self.current.nested.pop().unwrap_or_default();
        let released = self.release_all(scope.qubits);
        match (result, released) {
            (Err(Interrupt::Error(err)), _) => Err(Interrupt::Error(err)),
            (_, Err(err)) => Err(err.into()),
            (result, Ok(())) => result,
        }
    }

    fn with_frame<T>(
        &mut self,
        kind: CallableKind,
        f: impl FnOnce(&mut Self) -> Exec<T>,
    ) -> Exec<T> {
        if self.callers.len() >= MAX_CALL_DEPTH {
            return Err(EvalError::CallDepthExceeded(MAX_CALL_DEPTH).into());
        }
        let caller = std::mem::replace(&mut self.current, Frame::new(kind));
        self.callers.push(caller);
        let result = f(self);
        if let Some(caller) = self.callers.pop() {
            self.current = caller;
        }
        result
    }

    fn release_all(&mut self, qubits: Vec<QubitId>) -> EvalResult<()> {
        for qubit in qubits.into_iter().rev() {
            self.backend.release(qubit)?;
            trace!(%qubit, "released");
        }
        Ok(())
    }

    fn lookup_var(&self, name: &str) -> Option<&Binding> {
        self.current.scopes().find_map(|scope| scope.vars.get(name))
    }

    fn lookup_local_callable(&self, name: &str) -> Option<usize> {
        std::iter::once(&self.current)
            .chain(self.callers.iter().rev())
            .flat_map(Frame::scopes)
            .find_map(|scope| scope.callables.get(name).copied())
    }

    fn declare(&mut self, name: &str, value: Value, mutable: bool) {
        self.current
            .top()
            .vars
            .insert(name.to_string(), Binding { value, mutable });
    }

    fn assign(&mut self, name: &str, value: Value) -> EvalResult<()> {
        let Frame { base, nested, .. } = &mut self.current;
        let binding = nested
            .iter_mut()
            .rev()
            .chain(std::iter::once(base))
            .find_map(|scope| scope.vars.get_mut(name))
            .ok_or_else(|| EvalError::UnknownIdentifier(name.to_string()))?;
        if !binding.mutable {
            return Err(EvalError::ImmutableBinding(name.to_string()));
        }
        binding.value = value;
        Ok(())
    }

    fn bind(&mut self, pattern: &Pattern, value: Value, mutable: bool) -> EvalResult<()> {
        match pattern {
            Pattern::Bind(name) => self.declare(name, value, mutable),
            Pattern::Discard => {}
            Pattern::Tuple(patterns) => match value {
                Value::Tuple(items) if items.len() == patterns.len() => {
                    for (pattern, item) in patterns.iter().zip(items) {
                        self.bind(pattern, item, mutable)?;
                    }
                }
                value if patterns.len() == 1 => self.bind(&patterns[0], value, mutable)?,
                value => {
                    return Err(EvalError::TypeMismatch {
                        expected: format!("tuple of {} items", patterns.len()),
                        found: value.to_string(),
                    });
                }
            },
        }
        Ok(())
    }

    fn resolve(&self, name: &str) -> EvalResult<Value> {
        if !name.contains('.') {
            if let Some(binding) = self.lookup_var(name) {
                return Ok(binding.value.clone());
            }
        }
        if let Some(idx) = self.lookup_local_callable(name) {
            return Ok(Value::Callable(CallableRef::new(CallableTarget::Local(idx), name)));
        }
        let short = name.rsplit('.').next().unwrap_or(name);
        if let Some(idx) = self
            .interp
            .globals
            .get(name)
            .or_else(|| self.interp.globals.get(short))
        {
            return Ok(Value::Callable(CallableRef::new(CallableTarget::Global(*idx), short)));
        }
        if let Some(intrinsic) = intrinsics::lookup(short) {
            return Ok(Value::Callable(CallableRef::new(
                CallableTarget::Intrinsic(intrinsic),
                intrinsic,
            )));
        }
        Err(EvalError::UnknownIdentifier(name.to_string()))
    }

    // Quantum plumbing

    fn ensure_quantum(&self, what: &str) -> EvalResult<()> {
        if self.current.kind == CallableKind::Function {
            return Err(EvalError::QuantumInFunction(what.to_string()));
        }
        Ok(())
    }

    fn ensure_not_recording(&self, what: &str) -> EvalResult<()> {
        if !self.recording.is_empty() {
            return Err(EvalError::NotSupported(format!(
                "{what} inside an adjoint or controlled body"
            )));
        }
        Ok(())
    }

    fn allocate_qubit(&mut self) -> Exec<QubitId> {
        self.ensure_quantum("Qubit")?;
        self.ensure_not_recording("qubit allocation")?;
        let qubit = self.backend.allocate()?;
        self.current.top().qubits.push(qubit);
        trace!(%qubit, "allocated");
        Ok(qubit)
    }

    fn allocate_init(&mut self, init: &'a QubitInit) -> Exec<Value> {
        Ok(match init {
            QubitInit::Single => Value::Qubit(self.allocate_qubit()?),
            QubitInit::Array(size) => {
                let n = self.eval_expr(size)?.as_int()?;
                let n = usize::try_from(n).map_err(|_| EvalError::TypeMismatch {
                    expected: "non-negative register size".into(),
                    found: n.to_string(),
                })?;
                let mut qubits = Vec::new();
                for _ in 0..n {
                    qubits.push(Value::Qubit(self.allocate_qubit()?));
                }
                Value::Array(qubits)
            }
            QubitInit::Tuple(inits) => {
                let mut items = Vec::with_capacity(inits.len());
                for init in inits {
                    items.push(self.allocate_init(init)?);
                }
                Value::Tuple(items)
            }
        })
    }

    /// Apply a gate, expanding controls into primitive gates.
    fn apply_gate(
        &mut self,
        gate: StandardGate,
        qubits: &[QubitId],
        controls: &[QubitId],
    ) -> Exec<()> {
        if controls.is_empty() {
            return self.emit_gate(gate, qubits.to_vec());
        }
        for (gate, qubits) in functor::controlled(gate, controls, qubits)? {
            self.emit_gate(gate, qubits)?;
        }
        Ok(())
    }

    fn emit_gate(&mut self, gate: StandardGate, qubits: Vec<QubitId>) -> Exec<()> {
        if let Some(ops) = self.recording.last_mut() {
            ops.push((gate, qubits));
            return Ok(());
        }
        trace!(%gate, ?qubits, "gate");
        self.backend.gate(&gate, &qubits)?;
        Ok(())
    }

    /// Run `f` with gates captured instead of applied.
    fn record<T>(&mut self, f: impl FnOnce(&mut Self) -> Exec<T>) -> Exec<(T, Vec<GateOp>)> {
        self.recording.push(Vec::new());
        let result = f(self);
        let ops = self.recording.pop().unwrap_or_default();
        Ok((result?, ops))
    }

    fn measure(&mut self, qubit: QubitId, reset: bool) -> Exec<MeasurementResult> {
        self.ensure_not_recording("measurement")?;
        let result = if reset {
            self.backend.mresetz(qubit)?
        } else {
            self.backend.measure(qubit)?
        };
        trace!(%qubit, ?result, "measured");
        Ok(result)
    }

    fn reset(&mut self, qubit: QubitId) -> Exec<()> {
        self.ensure_not_recording("reset")?;
        self.backend.reset(qubit)?;
        Ok(())
    }

    // Calls

    pub(crate) fn call(&mut self, callee: &CallableRef, args: Vec<Value>) -> Exec<Value> {
        let interp = self.interp;
        let decl = match &callee.target {
            CallableTarget::Intrinsic(name) => return self.call_intrinsic(*name, callee, args),
            CallableTarget::Global(idx) => interp.program.callables.get(*idx),
            CallableTarget::Local(idx) => self.locals.get(*idx).copied(),
        };
        let decl = decl.ok_or_else(|| EvalError::UnknownIdentifier(callee.name.clone()))?;
        self.call_user(decl, callee, args)
    }

    fn call_user(
        &mut self,
        decl: &'a CallableDecl,
        callee: &CallableRef,
        args: Vec<Value>,
    ) -> Exec<Value> {
        if decl.kind == CallableKind::Operation {
            self.ensure_quantum(&decl.name)?;
        }
        let (controls, args) = functor::peel_controls(callee.controlled, args)?;
        if !callee.adjoint && controls.is_empty() {
            return self.invoke(decl, &decl.body, args);
        }

        if !controls.is_empty() && !decl.characteristics.iter().any(|c| c == "Ctl") {
            return Err(EvalError::FunctorNotSupported {
                functor: "Controlled".into(),
                target: decl.name.clone(),
            }
            .into());
        }

        let (block, invert) = if callee.adjoint {
            match &decl.adjoint {
                Some(AdjointSpec::Auto) => (&decl.body, true),
                Some(AdjointSpec::SelfAdjoint) => (&decl.body, false),
                Some(AdjointSpec::Explicit(block)) => (block, false),
                None => {
                    return Err(EvalError::FunctorNotSupported {
                        functor: "Adjoint".into(),
                        target: decl.name.clone(),
                    }
                    .into());
                }
            }
        } else {
            (&decl.body, false)
        };

        if controls.is_empty() && !invert {
            return self.invoke(decl, block, args);
        }

        let (value, ops) = self.record(|ev| ev.invoke(decl, block, args))?;
        let ops = if invert { functor::invert(ops) } else { ops };
        for (gate, qubits) in ops {
            self.apply_gate(gate, &qubits, &controls)?;
        }
        Ok(value)
    }

    fn invoke(&mut self, decl: &'a CallableDecl, block: &'a Block, args: Vec<Value>) -> Exec<Value> {
        let result = self.with_frame(decl.kind, |ev| {
            ev.bind_params(decl, args)?;
            ev.eval_block(block)
        });
        match result {
            Err(Interrupt::Return(value)) => Ok(value),
            other => other,
        }
    }

    fn bind_params(&mut self, decl: &CallableDecl, args: Vec<Value>) -> EvalResult<()> {
        let params = &decl.params;
        let args = match (params.len(), args.len()) {
            (p, a) if p == a => args,
            (0, 1) if args[0] == Value::Unit => Vec::new(),
            (1, _) => vec![Value::Tuple(args)],
            (p, 1) => match args.into_iter().next() {
                Some(Value::Tuple(items)) if items.len() == p => items,
                _ => {
                    return Err(EvalError::ArityMismatch {
                        name: decl.name.clone(),
                        expected: p,
                        got: 1,
                    });
                }
            },
            (p, a) => {
                return Err(EvalError::ArityMismatch {
                    name: decl.name.clone(),
                    expected: p,
                    got: a,
                });
            }
        };
        for (param, arg) in params.iter().zip(args) {
            self.declare(&param.name, arg, false);
        }
        Ok(())
    }

    // Statements

    fn eval_block(&mut self, block: &'a Block) -> Exec<Value> {
        self.scoped(|ev| {
            ev.exec_stmts(&block.stmts)?;
            match &block.tail {
                Some(tail) => ev.eval_expr(tail),
                None => Ok(Value::Unit),
            }
        })
    }

    fn exec_stmts(&mut self, stmts: &'a [Stmt]) -> Exec<()> {
        for stmt in stmts {
            if let Stmt::Callable(decl) = stmt {
                let decl: &'a CallableDecl = decl;
                let idx = match self.locals.iter().position(|d| std::ptr::eq(*d, decl)) {
                    Some(idx) => idx,
                    None => {
                        self.locals.push(decl);
                        self.locals.len() - 1
                    }
                };
                self.current.top().callables.insert(decl.name.clone(), idx);
            }
        }
        for stmt in stmts {
            self.exec_stmt(stmt)?;
        }
        Ok(())
    }

    fn exec_stmt(&mut self, stmt: &'a Stmt) -> Exec<()> {
        match stmt {
            Stmt::Let { pattern, value } => {
                let value = self.eval_expr(value)?;
                self.bind(pattern, value, false)?;
            }
            Stmt::Mutable { pattern, value } => {
                let value = self.eval_expr(value)?;
                self.bind(pattern, value, true)?;
            }
            Stmt::Set { target, op, value } => {
                let rhs = self.eval_expr(value)?;
                let updated = match op {
                    Some(op) => {
                        let current = self
                            .lookup_var(target)
                            .ok_or_else(|| EvalError::UnknownIdentifier(target.clone()))?
                            .value
                            .clone();
                        operators::binary(*op, current, rhs)?
                    }
                    None => rhs,
                };
                self.assign(target, updated)?;
            }
            Stmt::SetUpdate { target, index, value } => {
                let index = self.eval_expr(index)?;
                let value = self.eval_expr(value)?;
                let current = self
                    .lookup_var(target)
                    .ok_or_else(|| EvalError::UnknownIdentifier(target.clone()))?
                    .value
                    .clone();
                let updated = operators::update(current, index, value)?;
                self.assign(target, updated)?;
            }
            Stmt::Use { pattern, init, body } => match body {
                Some(block) => {
                    self.scoped(|ev| {
                        let qubits = ev.allocate_init(init)?;
                        ev.bind(pattern, qubits, false)?;
                        ev.eval_block(block)
                    })?;
                }
                None => {
                    let qubits = self.allocate_init(init)?;
                    self.bind(pattern, qubits, false)?;
                }
            },
            Stmt::For { pattern, iterable, body } => {
                let iterable = self.eval_expr(iterable)?;
                for item in operators::iterate(iterable)? {
                    self.scoped(|ev| {
                        ev.bind(pattern, item, false)?;
                        ev.eval_block(body)
                    })?;
                }
            }
            Stmt::While { condition, body } => {
                while self.eval_expr(condition)?.as_bool()? {
                    self.eval_block(body)?;
                }
            }
            Stmt::Repeat { body, until, fixup } => loop {
                let done = self.scoped(|ev| {
                    ev.exec_stmts(&body.stmts)?;
                    if let Some(tail) = &body.tail {
                        ev.eval_expr(tail)?;
                    }
                    let done = ev.eval_expr(until)?.as_bool()?;
                    if !done {
                        if let Some(fixup) = fixup {
                            ev.eval_block(fixup)?;
                        }
                    }
                    Ok(done)
                })?;
                if done {
                    break;
                }
            },
            Stmt::Within { within, apply } => {
                let (_, ops) = self.record(|ev| ev.eval_block(within))?;
                for (gate, qubits) in &ops {
                    self.emit_gate(*gate, qubits.clone())?;
                }
                let applied = self.eval_block(apply);
                for (gate, qubits) in functor::invert(ops) {
                    self.emit_gate(gate, qubits)?;
                }
                applied?;
            }
            Stmt::Return(expr) => {
                let value = self.eval_expr(expr)?;
                return Err(Interrupt::Return(value));
            }
            Stmt::Fail(expr) => {
                let message = self.eval_expr(expr)?.to_string();
                return Err(EvalError::UserFail(message).into());
            }
            Stmt::Expr(expr) => {
                self.eval_expr(expr)?;
            }
            Stmt::Callable(_) => {}
        }
        Ok(())
    }

    // Expressions

    fn eval_list(&mut self, exprs: &'a [Expr]) -> Exec<Vec<Value>> {
        let mut values = Vec::with_capacity(exprs.len());
        for expr in exprs {
            values.push(self.eval_expr(expr)?);
        }
        Ok(values)
    }

    fn eval_int(&mut self, expr: &'a Expr) -> Exec<i64> {
        Ok(self.eval_expr(expr)?.as_int()?)
    }

    fn eval_expr(&mut self, expr: &'a Expr) -> Exec<Value> {
        Ok(match expr {
            Expr::Unit => Value::Unit,
            Expr::Int(i) => Value::Int(*i),
            Expr::Double(d) => Value::Double(*d),
            Expr::Bool(b) => Value::Bool(*b),
            Expr::String(s) => Value::String(s.clone()),
            Expr::Interpolated(parts) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        InterpPart::Text(text) => out.push_str(text),
                        InterpPart::Expr(expr) => {
                            out.push_str(&self.eval_expr(expr)?.to_string());
                        }
                    }
                }
                Value::String(out)
            }
            Expr::Result(bit) => Value::Result(MeasurementResult::Known(*bit)),
            Expr::Pauli(p) => Value::Pauli(*p),
            Expr::Path(name) => self.resolve(name)?,
            Expr::Tuple(items) => Value::Tuple(self.eval_list(items)?),
            Expr::Array(items) => Value::Array(self.eval_list(items)?),
            Expr::ArrayRepeat { value, size } => {
                let value = self.eval_expr(value)?;
                let size = self.eval_int(size)?;
                let size = usize::try_from(size).map_err(|_| EvalError::TypeMismatch {
                    expected: "non-negative array size".into(),
                    found: size.to_string(),
                })?;
                if size > MAX_ARRAY_LEN {
                    return Err(EvalError::ArrayTooLarge {
                        size,
                        max: MAX_ARRAY_LEN,
                    }
                    .into());
                }
                Value::Array(vec![value; size])
            }
            Expr::Range { start, step, end } => {
                let start = match start {
                    Some(e) => Some(self.eval_int(e)?),
                    None => None,
                };
                let step = match step {
                    Some(e) => self.eval_int(e)?,
                    None => 1,
                };
                let end = match end {
                    Some(e) => Some(self.eval_int(e)?),
                    None => None,
                };
                Value::Range { start, step, end }
            }
            Expr::Index { target, index } => {
                let target = self.eval_expr(target)?;
                let index = self.eval_expr(index)?;
                operators::index(target, index)?
            }
            Expr::Update { target, index, value } => {
                let target = self.eval_expr(target)?;
                let index = self.eval_expr(index)?;
                let value = self.eval_expr(value)?;
                operators::update(target, index, value)?
            }
            Expr::Call { callee, args } => {
                let callee = self.eval_expr(callee)?.as_callable()?.clone();
                let args = self.eval_list(args)?;
                self.call(&callee, args)?
            }
            Expr::Functor { functor, target } => {
                let mut callable = self.eval_expr(target)?.as_callable()?.clone();
                match functor {
                    Functor::Adjoint => callable.adjoint = !callable.adjoint,
                    Functor::Controlled => callable.controlled = callable.controlled.saturating_add(1),
                }
                Value::Callable(callable)
            }
            Expr::Unary { op, operand } => {
                let operand = self.eval_expr(operand)?;
                operators::unary(*op, operand)?
            }
            Expr::Binary { op: BinOp::And, left, right } => {
                Value::Bool(self.eval_expr(left)?.as_bool()? && self.eval_expr(right)?.as_bool()?)
            }
            Expr::Binary { op: BinOp::Or, left, right } => {
                Value::Bool(self.eval_expr(left)?.as_bool()? || self.eval_expr(right)?.as_bool()?)
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval_expr(left)?;
                let right = self.eval_expr(right)?;
                operators::binary(*op, left, right)?
            }
            Expr::Ternary { condition, then, otherwise } => {
                if self.eval_expr(condition)?.as_bool()? {
                    self.eval_expr(then)?
                } else {
                    self.eval_expr(otherwise)?
                }
            }
            Expr::If { branches, otherwise } => {
                for (condition, block) in branches {
                    if self.eval_expr(condition)?.as_bool()? {
                        return self.eval_block(block);
                    }
                }
                match otherwise {
                    Some(block) => self.eval_block(block)?,
                    None => Value::Unit,
                }
            }
            Expr::Block(block) => self.eval_block(block)?,
        })
    }
}
