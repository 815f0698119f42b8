//! Tree-walking interpreter (spec.md §4.5): evaluates a [`TokenList`]
//! against a single operand stack and the scope chain, dispatching each
//! primitive token and driving the call protocol for user functions,
//! curried functions, and constructors.

use crate::ast::{AstNode, TokenList};
use crate::error::{ErrorLocation, SofError};
use crate::io::SofIo;
use crate::location::{FileTag, SourceLocation};
use crate::nametable::{Nametable, ScopeChain};
use crate::natives::NativeRegistry;
use crate::token::PrimitiveToken;
use crate::value::{
    CallableKind, CodeBlockValue, CurriedFunctionValue, Extensiveness, FunctionValue, Identifier,
    ObjectValue, Value,
};
use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;
use tracing::{debug, trace};

/// Signals whether the just-evaluated token list ran to completion or is
/// mid-unwind from a `return`/`return:n`. Only a call-site boundary
/// ([`Interpreter::invoke_callable`]) consumes a unit of an in-progress
/// unwind; control-flow bodies (`if`, `ifelse`, `while`) just forward it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Normal,
    Unwind(u32),
}

pub struct Interpreter {
    stack: Vec<Value>,
    scopes: ScopeChain,
    assert_count: u64,
    io: Box<dyn SofIo>,
    natives: NativeRegistry,
    file: FileTag,
    source: String,
}

impl Interpreter {
    pub fn new(io: Box<dyn SofIo>) -> Self {
        Self {
            stack: Vec::new(),
            scopes: ScopeChain::new(),
            assert_count: 0,
            io,
            natives: NativeRegistry::new(),
            file: FileTag::Synthetic("<literal>"),
            source: String::new(),
        }
    }

    pub fn natives_mut(&mut self) -> &mut NativeRegistry {
        &mut self.natives
    }

    pub fn stack(&self) -> &[Value] {
        &self.stack
    }

    pub fn scope_depth(&self) -> usize {
        self.scopes.depth()
    }

    pub fn assert_count(&self) -> u64 {
        self.assert_count
    }

    /// Runs a full program's token list against this interpreter's state.
    /// `file`/`source` are recorded so incomplete errors can be promoted to
    /// complete ones with a real line/column (spec.md §4.6).
    pub fn run(&mut self, list: &TokenList, file: FileTag, source: &str) -> Result<(), SofError> {
        self.file = file;
        self.source = source.to_string();
        match self.eval_list(list)? {
            Flow::Normal => Ok(()),
            Flow::Unwind(n) => Err(SofError::stack(
                ErrorLocation::Complete(SourceLocation::new(self.file.clone(), source.len())),
                format!("return unwound {} frame(s) past the global frame", n),
            )),
        }
    }

    fn here(&self, offset: usize) -> SourceLocation {
        SourceLocation::new(self.file.clone(), offset)
    }

    /// Promotes an `Incomplete` error raised deep in the value model to a
    /// `Complete` one using the current node's span, per spec.md §4.6.
    fn complete(&self, err: SofError, offset: usize) -> SofError {
        err.complete_with(self.here(offset))
    }

    fn eval_list(&mut self, list: &TokenList) -> Result<Flow, SofError> {
        trace!(nodes = list.len(), depth = self.scopes.depth(), "entering token list");
        for node in &list.nodes {
            match self.eval_node(node)? {
                Flow::Normal => continue,
                unwind => return Ok(unwind),
            }
        }
        Ok(Flow::Normal)
    }

    fn eval_node(&mut self, node: &AstNode) -> Result<Flow, SofError> {
        match node {
            AstNode::Literal { value, .. } => {
                self.stack.push(value.copy());
                Ok(Flow::Normal)
            }
            AstNode::Block { body, start, end } => {
                self.stack.push(Value::CodeBlock(Rc::new(CodeBlockValue {
                    body: Rc::new(body.clone()),
                    location: self.here(*start),
                })));
                let _ = end;
                Ok(Flow::Normal)
            }
            AstNode::Atom { id, start, .. } => self.eval_atom(id, *start),
            AstNode::Primitive { token, start, .. } => self.eval_primitive(*token, *start),
        }
    }

    /// Atom dispatch: always resolve by lookup; invoke if callable,
    /// otherwise push (spec.md §4.5, §9).
    fn eval_atom(&mut self, id: &Identifier, offset: usize) -> Result<Flow, SofError> {
        match self.scopes.lookup(id, ErrorLocation::Incomplete) {
            Ok(value) => self.push_or_invoke(value, Some(id.clone()), offset),
            Err(SofError::Name { .. }) if self.natives.has(id.as_str()) => {
                self.invoke_native(id.as_str(), offset)
            }
            Err(err) => Err(self.complete(err, offset)),
        }
    }

    fn push_or_invoke(&mut self, value: Value, hint: Option<Identifier>, offset: usize) -> Result<Flow, SofError> {
        if value.is_callable() {
            self.invoke_callable(value, hint, offset)
        } else {
            self.stack.push(value);
            Ok(Flow::Normal)
        }
    }

    fn invoke_native(&mut self, name: &str, offset: usize) -> Result<Flow, SofError> {
        let arity = self.natives.arity(name).expect("checked has() before calling");
        let args = self.pop_n(arity as usize, offset)?;
        match self.natives.invoke(name, &args).expect("native just checked present") {
            Ok(Some(value)) => self.stack.push(value),
            Ok(None) => {}
            Err(err) => return Err(self.complete(err, offset)),
        }
        Ok(Flow::Normal)
    }

    fn pop_n(&mut self, n: usize, offset: usize) -> Result<Vec<Value>, SofError> {
        if self.stack.len() < n {
            return Err(SofError::stack(
                ErrorLocation::Complete(self.here(offset)),
                format!("stack underflow: needed {} value(s), have {}", n, self.stack.len()),
            ));
        }
        Ok(self.stack.split_off(self.stack.len() - n))
    }

    fn pop1(&mut self, offset: usize) -> Result<Value, SofError> {
        self.stack.pop().ok_or_else(|| {
            SofError::stack(ErrorLocation::Complete(self.here(offset)), "stack underflow")
        })
    }

    fn peek(&self, offset: usize) -> Result<&Value, SofError> {
        self.stack.last().ok_or_else(|| {
            SofError::stack(ErrorLocation::Complete(self.here(offset)), "stack underflow")
        })
    }

    /// The call protocol (spec.md §4.5 steps 1-7). `hint` is the atom name
    /// the callable was resolved through, if any — used as the class
    /// identifier for a fresh [`ObjectValue`] when `value` is a Constructor.
    fn invoke_callable(&mut self, value: Value, hint: Option<Identifier>, offset: usize) -> Result<Flow, SofError> {
        debug!(kind = value.type_name(), hint = hint.as_ref().map(Identifier::as_str), "invoking callable");
        match value {
            Value::Identifier(id) => {
                let resolved = self
                    .scopes
                    .lookup(&id, ErrorLocation::Incomplete)
                    .map_err(|e| self.complete(e, offset))?;
                self.push_or_invoke(resolved, Some(id), offset)
            }
            Value::CodeBlock(block) => self.call_with_frame(&block.body, &[], CallableKind::Function, None, offset),
            Value::Function(func) => {
                let args = self.pop_n(func.arity as usize, offset)?;
                let kind = func.kind;
                let class_hint = hint.unwrap_or_else(|| Identifier::new("object").unwrap());
                self.call_with_frame(&func.body, &args, kind, Some(class_hint), offset)
            }
            Value::CurriedFunction(curried) => {
                let extra = self.pop_n(curried.remaining_arity() as usize, offset)?;
                let mut args = curried.curried_args.clone();
                args.extend(extra);
                let kind = curried.underlying.kind;
                let class_hint = hint.unwrap_or_else(|| Identifier::new("object").unwrap());
                self.call_with_frame(&curried.underlying.body, &args, kind, Some(class_hint), offset)
            }
            other => Err(SofError::type_error(
                ErrorLocation::Complete(self.here(offset)),
                format!("'{}' is not callable", other.type_name()),
            )),
        }
    }

    fn call_with_frame(
        &mut self,
        body: &TokenList,
        args: &[Value],
        kind: CallableKind,
        class_hint: Option<Identifier>,
        offset: usize,
    ) -> Result<Flow, SofError> {
        let frame = Rc::new(RefCell::new(Nametable::new()));
        for (i, arg) in args.iter().enumerate() {
            let name = Identifier::new(&format!("arg{}", i)).expect("arg<n> is always valid");
            frame.borrow_mut().put(name, arg.clone());
        }
        self.scopes.push_frame(Rc::clone(&frame));
        let flow = self.eval_list(body);
        let popped = self.scopes.pop_frame();
        debug_assert!(popped.is_some(), "call_with_frame always pops the frame it pushed");
        drop(popped); // release the scope chain's strong ref so try_unwrap below can succeed

        let flow = flow?;
        let return_value = frame.borrow_mut().take_return();

        let pushed = if kind == CallableKind::Constructor {
            let class_name = class_hint.unwrap_or_else(|| Identifier::new("object").unwrap());
            let table = Rc::try_unwrap(frame)
                .map(|cell| cell.into_inner())
                .unwrap_or_else(|rc| {
                    let mut cloned = Nametable::new();
                    cloned.put_all(&rc.borrow());
                    cloned
                });
            Some(Value::Object(Rc::new(RefCell::new(ObjectValue { class_name, table }))))
        } else {
            return_value
        };

        if let Some(v) = pushed {
            self.stack.push(v);
        }

        match flow {
            Flow::Normal => Ok(Flow::Normal),
            Flow::Unwind(n) if n <= 1 => {
                debug!("unwind consumed at call boundary");
                Ok(Flow::Normal)
            }
            Flow::Unwind(n) => {
                debug!(remaining = n - 1, "unwind passes through call boundary");
                Ok(Flow::Unwind(n - 1))
            }
        }
    }

    fn eval_primitive(&mut self, token: PrimitiveToken, offset: usize) -> Result<Flow, SofError> {
        use PrimitiveToken::*;
        match token {
            Dup => {
                let v = self.peek(offset)?.copy();
                self.stack.push(v);
                Ok(Flow::Normal)
            }
            Pop => {
                self.pop1(offset)?;
                Ok(Flow::Normal)
            }
            Swap => {
                let b = self.pop1(offset)?;
                let a = self.pop1(offset)?;
                self.stack.push(b);
                self.stack.push(a);
                Ok(Flow::Normal)
            }
            Add => self.arith(offset, |a, b| a.checked_add(b), |a, b| a + b),
            Sub => self.arith(offset, |a, b| a.checked_sub(b), |a, b| a - b),
            Mul => self.arith(offset, |a, b| a.checked_mul(b), |a, b| a * b),
            Div => self.div(offset),
            Mod => self.rem(offset),
            Lt => self.compare_op(offset, |o| o == Ordering::Less),
            Gt => self.compare_op(offset, |o| o == Ordering::Greater),
            Le => self.compare_op(offset, |o| o != Ordering::Greater),
            Ge => self.compare_op(offset, |o| o != Ordering::Less),
            Eq => {
                let b = self.pop1(offset)?;
                let a = self.pop1(offset)?;
                self.stack.push(Value::Boolean(a.equals(&b)));
                Ok(Flow::Normal)
            }
            Ne => {
                let b = self.pop1(offset)?;
                let a = self.pop1(offset)?;
                self.stack.push(Value::Boolean(!a.equals(&b)));
                Ok(Flow::Normal)
            }
            And => self.bool_op(offset, |a, b| a && b),
            Or => self.bool_op(offset, |a, b| a || b),
            Xor => self.bool_op(offset, |a, b| a ^ b),
            Not => {
                let a = self.pop1(offset)?;
                match a {
                    Value::Boolean(b) => {
                        self.stack.push(Value::Boolean(!b));
                        Ok(Flow::Normal)
                    }
                    other => Err(type_err(self.here(offset), "not", &other)),
                }
            }
            Cat => {
                let b = self.pop1(offset)?;
                let a = self.pop1(offset)?;
                match (a, b) {
                    (Value::Str(a), Value::Str(b)) => {
                        self.stack.push(Value::Str(format!("{}{}", a, b).into()));
                        Ok(Flow::Normal)
                    }
                    (a, _) => Err(type_err(self.here(offset), "cat", &a)),
                }
            }
            ConvertInt => self.convert_int(offset),
            ConvertFloat => self.convert_float(offset),
            ConvertString => {
                let v = self.pop1(offset)?;
                self.stack.push(Value::Str(v.print().into()));
                Ok(Flow::Normal)
            }
            ConvertBool => self.convert_bool(offset),
            Def => {
                let id = self.expect_identifier(offset)?;
                let value = self.pop1(offset)?;
                self.scopes.define_local(id, value);
                Ok(Flow::Normal)
            }
            GlobalDef => {
                let id = self.expect_identifier(offset)?;
                let value = self.pop1(offset)?;
                self.scopes.define_global(id, value);
                Ok(Flow::Normal)
            }
            Invoke => {
                let callable = self.pop1(offset)?;
                self.invoke_callable(callable, None, offset)
            }
            Alias => {
                let callable = self.pop1(offset)?;
                let id = self.expect_identifier(offset)?;
                self.scopes.define_local(id, callable);
                Ok(Flow::Normal)
            }
            FieldGet => {
                let id = self.expect_identifier(offset)?;
                let object = self.pop1(offset)?;
                match object {
                    Value::Object(obj) => {
                        let value = obj.borrow().table.get(&id).ok_or_else(|| {
                            SofError::name(ErrorLocation::Complete(self.here(offset)), id.as_str())
                        })?;
                        self.stack.push(value);
                        Ok(Flow::Normal)
                    }
                    other => Err(type_err(self.here(offset), ":", &other)),
                }
            }
            FieldSet => {
                let id = self.expect_identifier(offset)?;
                let value = self.pop1(offset)?;
                let object = self.pop1(offset)?;
                match object {
                    Value::Object(obj) => {
                        obj.borrow_mut().table.put(id, value);
                        Ok(Flow::Normal)
                    }
                    other => Err(type_err(self.here(offset), ":=", &other)),
                }
            }
            Return => {
                let value = self.pop1(offset)?;
                self.scopes.top().borrow_mut().set_return(value);
                Ok(Flow::Unwind(1))
            }
            ReturnN(n) => {
                let value = self.pop1(offset)?;
                self.scopes.top().borrow_mut().set_return(value);
                if n == 0 {
                    self.stack.push(self.scopes.top().borrow_mut().take_return().unwrap());
                    Ok(Flow::Normal)
                } else {
                    Ok(Flow::Unwind(n))
                }
            }
            If => {
                let block = self.pop1(offset)?;
                let cond = self.pop1(offset)?;
                match (cond, block) {
                    (Value::Boolean(true), Value::CodeBlock(b)) => self.eval_list(&b.body),
                    (Value::Boolean(false), Value::CodeBlock(_)) => Ok(Flow::Normal),
                    (cond, _) => Err(type_err(self.here(offset), "if", &cond)),
                }
            }
            IfElse => {
                let else_block = self.pop1(offset)?;
                let then_block = self.pop1(offset)?;
                let cond = self.pop1(offset)?;
                match (cond, then_block, else_block) {
                    (Value::Boolean(true), Value::CodeBlock(b), _) => self.eval_list(&b.body),
                    (Value::Boolean(false), _, Value::CodeBlock(b)) => self.eval_list(&b.body),
                    (cond, _, _) => Err(type_err(self.here(offset), "ifelse", &cond)),
                }
            }
            While => self.eval_while(offset),
            Function => self.build_callable(offset, CallableKind::Function),
            Constructor => self.build_callable(offset, CallableKind::Constructor),
            Curry => self.eval_curry(offset),
            Describe => {
                let v = self.peek(offset)?.debug_string(Extensiveness::Full);
                self.stack.push(Value::Str(v.into()));
                Ok(Flow::Normal)
            }
            Writeln => {
                let v = self.pop1(offset)?;
                self.io.writeln(&v.print());
                Ok(Flow::Normal)
            }
            Write => {
                let v = self.pop1(offset)?;
                self.io.write(&v.print());
                Ok(Flow::Normal)
            }
            Assert => {
                let v = self.pop1(offset)?;
                match v {
                    Value::Boolean(true) => {
                        self.assert_count += 1;
                        Ok(Flow::Normal)
                    }
                    Value::Boolean(false) => Err(SofError::assert(ErrorLocation::Complete(self.here(offset)))),
                    other => Err(type_err(self.here(offset), "assert", &other)),
                }
            }
        }
    }

    fn eval_while(&mut self, offset: usize) -> Result<Flow, SofError> {
        let body = self.pop1(offset)?;
        let cond = self.pop1(offset)?;
        let (cond_body, loop_body) = match (cond, body) {
            (Value::CodeBlock(c), Value::CodeBlock(b)) => (c, b),
            (cond, _) => return Err(type_err(self.here(offset), "while", &cond)),
        };
        loop {
            match self.eval_list(&cond_body.body)? {
                Flow::Normal => {}
                unwind => return Ok(unwind),
            }
            match self.pop1(offset)? {
                Value::Boolean(true) => {}
                Value::Boolean(false) => return Ok(Flow::Normal),
                other => return Err(type_err(self.here(offset), "while", &other)),
            }
            match self.eval_list(&loop_body.body)? {
                Flow::Normal => continue,
                unwind => return Ok(unwind),
            }
        }
    }

    fn build_callable(&mut self, offset: usize, kind: CallableKind) -> Result<Flow, SofError> {
        // Stack order is `{ body } argcount function` — argcount is on top.
        let argcount = self.pop1(offset)?;
        let body = self.pop1(offset)?;
        let (body, location) = match body {
            Value::CodeBlock(b) => (Rc::clone(&b.body), b.location.clone()),
            other => return Err(type_err(self.here(offset), "function/constructor", &other)),
        };
        let arity = match argcount {
            Value::Integer(n) if n >= 0 => n as u32,
            other => {
                return Err(SofError::type_error(
                    ErrorLocation::Complete(self.here(offset)),
                    format!("argument count must be a non-negative integer, got '{}'", other.type_name()),
                ))
            }
        };
        let func = FunctionValue {
            body,
            arity,
            global: Rc::downgrade(&self.scopes.global()),
            kind,
            location,
        };
        self.stack.push(Value::Function(Rc::new(func)));
        Ok(Flow::Normal)
    }

    fn eval_curry(&mut self, offset: usize) -> Result<Flow, SofError> {
        let arg = self.pop1(offset)?;
        let callable = self.pop1(offset)?;
        let curried = match callable {
            Value::Function(f) => {
                if f.arity == 0 {
                    return Err(SofError::type_error(
                        ErrorLocation::Complete(self.here(offset)),
                        "cannot curry a 0-arity callable",
                    ));
                }
                CurriedFunctionValue { underlying: f, curried_args: vec![arg] }
            }
            Value::CurriedFunction(c) => {
                if c.remaining_arity() == 0 {
                    return Err(SofError::type_error(
                        ErrorLocation::Complete(self.here(offset)),
                        "cannot curry a 0-arity callable",
                    ));
                }
                let mut curried_args = c.curried_args.clone();
                curried_args.push(arg);
                CurriedFunctionValue { underlying: Rc::clone(&c.underlying), curried_args }
            }
            other => return Err(type_err(self.here(offset), "curry", &other)),
        };
        self.stack.push(Value::CurriedFunction(Rc::new(curried)));
        Ok(Flow::Normal)
    }

    fn expect_identifier(&mut self, offset: usize) -> Result<Identifier, SofError> {
        match self.pop1(offset)? {
            Value::Identifier(id) => Ok(id),
            other => Err(type_err(self.here(offset), "identifier operand", &other)),
        }
    }

    fn arith(
        &mut self,
        offset: usize,
        int_op: impl Fn(i64, i64) -> Option<i64>,
        float_op: impl Fn(f64, f64) -> f64,
    ) -> Result<Flow, SofError> {
        let b = self.pop1(offset)?;
        let a = self.pop1(offset)?;
        let result = match (a, b) {
            (Value::Integer(a), Value::Integer(b)) => Value::Integer(int_op(a, b).ok_or_else(|| {
                SofError::math(ErrorLocation::Complete(self.here(offset)), "integer overflow")
            })?),
            (Value::Integer(a), Value::Float(b)) => Value::Float(float_op(a as f64, b)),
            (Value::Float(a), Value::Integer(b)) => Value::Float(float_op(a, b as f64)),
            (Value::Float(a), Value::Float(b)) => Value::Float(float_op(a, b)),
            (a, _) => return Err(type_err(self.here(offset), "arithmetic", &a)),
        };
        self.stack.push(result);
        Ok(Flow::Normal)
    }

    fn div(&mut self, offset: usize) -> Result<Flow, SofError> {
        let b = self.pop1(offset)?;
        let a = self.pop1(offset)?;
        let result = match (a, b) {
            (Value::Integer(a), Value::Integer(b)) => {
                if b == 0 {
                    return Err(SofError::math(ErrorLocation::Complete(self.here(offset)), "division by zero"));
                }
                Value::Integer(a.checked_div(b).ok_or_else(|| {
                    SofError::math(ErrorLocation::Complete(self.here(offset)), "integer overflow")
                })?)
            }
            (Value::Integer(a), Value::Float(b)) => {
                if b == 0.0 {
                    return Err(SofError::math(ErrorLocation::Complete(self.here(offset)), "division by zero"));
                }
                Value::Float(a as f64 / b)
            }
            (Value::Float(a), Value::Integer(b)) => {
                if b == 0 {
                    return Err(SofError::math(ErrorLocation::Complete(self.here(offset)), "division by zero"));
                }
                Value::Float(a / b as f64)
            }
            (Value::Float(a), Value::Float(b)) => {
                if b == 0.0 {
                    return Err(SofError::math(ErrorLocation::Complete(self.here(offset)), "division by zero"));
                }
                Value::Float(a / b)
            }
            (a, _) => return Err(type_err(self.here(offset), "/", &a)),
        };
        self.stack.push(result);
        Ok(Flow::Normal)
    }

    fn rem(&mut self, offset: usize) -> Result<Flow, SofError> {
        let b = self.pop1(offset)?;
        let a = self.pop1(offset)?;
        let result = match (a, b) {
            (Value::Integer(a), Value::Integer(b)) => {
                if b == 0 {
                    return Err(SofError::math(ErrorLocation::Complete(self.here(offset)), "modulo by zero"));
                }
                Value::Integer(a % b)
            }
            (Value::Integer(a), Value::Float(b)) => Value::Float((a as f64) % b),
            (Value::Float(a), Value::Integer(b)) => Value::Float(a % (b as f64)),
            (Value::Float(a), Value::Float(b)) => Value::Float(a % b),
            (a, _) => return Err(type_err(self.here(offset), "%", &a)),
        };
        self.stack.push(result);
        Ok(Flow::Normal)
    }

    fn compare_op(&mut self, offset: usize, pred: impl Fn(Ordering) -> bool) -> Result<Flow, SofError> {
        let b = self.pop1(offset)?;
        let a = self.pop1(offset)?;
        let ord = a
            .compare(&b, ErrorLocation::Complete(self.here(offset)))
            .map_err(|e| self.complete(e, offset))?;
        self.stack.push(Value::Boolean(pred(ord)));
        Ok(Flow::Normal)
    }

    fn bool_op(&mut self, offset: usize, op: impl Fn(bool, bool) -> bool) -> Result<Flow, SofError> {
        let b = self.pop1(offset)?;
        let a = self.pop1(offset)?;
        match (a, b) {
            (Value::Boolean(a), Value::Boolean(b)) => {
                self.stack.push(Value::Boolean(op(a, b)));
                Ok(Flow::Normal)
            }
            (a, _) => Err(type_err(self.here(offset), "boolean logic", &a)),
        }
    }

    fn convert_int(&mut self, offset: usize) -> Result<Flow, SofError> {
        let v = self.pop1(offset)?;
        let result = match v {
            Value::Integer(n) => n,
            Value::Float(f) => {
                if !f.is_finite() || f < i64::MIN as f64 || f > i64::MAX as f64 {
                    return Err(SofError::math(
                        ErrorLocation::Complete(self.here(offset)),
                        "float out of integer range",
                    ));
                }
                f.trunc() as i64
            }
            Value::Boolean(b) => b as i64,
            Value::Str(s) => s.trim().parse::<i64>().map_err(|_| {
                SofError::math(ErrorLocation::Complete(self.here(offset)), format!("cannot convert '{}' to int", s))
            })?,
            other => return Err(type_err(self.here(offset), "convert:int", &other)),
        };
        self.stack.push(Value::Integer(result));
        Ok(Flow::Normal)
    }

    fn convert_float(&mut self, offset: usize) -> Result<Flow, SofError> {
        let v = self.pop1(offset)?;
        let result = match v {
            Value::Integer(n) => n as f64,
            Value::Float(f) => f,
            Value::Boolean(b) => {
                if b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Str(s) => s.trim().parse::<f64>().map_err(|_| {
                SofError::math(ErrorLocation::Complete(self.here(offset)), format!("cannot convert '{}' to float", s))
            })?,
            other => return Err(type_err(self.here(offset), "convert:float", &other)),
        };
        self.stack.push(Value::Float(result));
        Ok(Flow::Normal)
    }

    fn convert_bool(&mut self, offset: usize) -> Result<Flow, SofError> {
        let v = self.pop1(offset)?;
        let result = match v {
            Value::Boolean(b) => b,
            Value::Integer(n) => n != 0,
            Value::Float(f) => f != 0.0,
            Value::Str(s) => match s.trim() {
                "true" => true,
                "false" => false,
                _ => {
                    return Err(SofError::math(
                        ErrorLocation::Complete(self.here(offset)),
                        format!("cannot convert '{}' to bool", s),
                    ))
                }
            },
            other => return Err(type_err(self.here(offset), "convert:bool", &other)),
        };
        self.stack.push(Value::Boolean(result));
        Ok(Flow::Normal)
    }
}

fn type_err(location: SourceLocation, op: &str, got: &Value) -> SofError {
    SofError::type_error(
        ErrorLocation::Complete(location),
        format!("'{}' does not accept a value of type '{}'", op, got.type_name()),
    )
}
