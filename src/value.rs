//! The tagged-variant value model (spec.md §3, §4.4). Every runtime value
//! is one [`Value`] enum case rather than a class hierarchy — the
//! replacement the Design Notes (§9) call for when the source's virtual
//! dispatch collapses into a closed variant set.

use crate::ast::TokenList;
use crate::error::{ErrorLocation, SofError};
use crate::location::SourceLocation;
use crate::nametable::Nametable;
use once_cell::sync::Lazy;
use regex::Regex;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt::{Debug, Display, Formatter};
use std::rc::{Rc, Weak};

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex is valid"));

/// A validated name, compared by textual equality (spec.md §3).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(Rc<str>);

impl Identifier {
    pub fn new(text: &str) -> Result<Self, String> {
        if IDENTIFIER_RE.is_match(text) {
            Ok(Self(Rc::from(text)))
        } else {
            Err(format!("'{}' is not a valid identifier", text))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Distinguishes a [`Value::Function`] built by `function` from one built
/// by `constructor` without duplicating the struct shape, per spec.md §3's
/// note that a Constructor is "same shape as Function: marker variant".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallableKind {
    Function,
    Constructor,
}

/// An unexecuted code block: an AST reference plus the span it was parsed
/// from, kept so it can be reported in a stack trace (spec.md §3).
#[derive(Debug, Clone)]
pub struct CodeBlockValue {
    pub body: Rc<TokenList>,
    pub location: SourceLocation,
}

/// A `function`/`constructor` value. Holds a *non-owning* reference to the
/// global nametable (Design Note §9: the global frame owns the function
/// values it binds; functions hold only a weak handle back to it, so the
/// value graph never cycles).
#[derive(Debug, Clone)]
pub struct FunctionValue {
    pub body: Rc<TokenList>,
    pub arity: u32,
    pub global: Weak<RefCell<Nametable>>,
    pub kind: CallableKind,
    pub location: SourceLocation,
}

/// A function with some of its leading arguments already supplied.
#[derive(Debug, Clone)]
pub struct CurriedFunctionValue {
    pub underlying: Rc<FunctionValue>,
    pub curried_args: Vec<Value>,
}

impl CurriedFunctionValue {
    /// Remaining arity — invariant: never negative (spec.md §3), enforced
    /// by construction (`curry` never oversupplies, see interpreter.rs).
    pub fn remaining_arity(&self) -> u32 {
        self.underlying.arity - self.curried_args.len() as u32
    }
}

/// An object created by invoking a Constructor: owns a nametable and
/// remembers the class identifier it was constructed under.
#[derive(Debug)]
pub struct ObjectValue {
    pub class_name: Identifier,
    pub table: Nametable,
}

/// Controls how much detail [`Value::debug_string`] renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extensiveness {
    Compact,
    Full,
    Type,
}

/// The universal stack element (spec.md §3).
#[derive(Clone)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Str(Rc<str>),
    Identifier(Identifier),
    CodeBlock(Rc<CodeBlockValue>),
    Function(Rc<FunctionValue>),
    CurriedFunction(Rc<CurriedFunctionValue>),
    Object(Rc<RefCell<ObjectValue>>),
    Nametable(Rc<RefCell<Nametable>>),
}

impl Value {
    /// Only Callable values participate in the call protocol (spec.md §4.4).
    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            Value::CodeBlock(_) | Value::Function(_) | Value::CurriedFunction(_) | Value::Identifier(_)
        )
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Boolean(_) => "boolean",
            Value::Str(_) => "string",
            Value::Identifier(_) => "identifier",
            Value::CodeBlock(_) => "code-block",
            Value::Function(f) => match f.kind {
                CallableKind::Function => "function",
                CallableKind::Constructor => "constructor",
            },
            Value::CurriedFunction(_) => "curried-function",
            Value::Object(_) => "object",
            Value::Nametable(_) => "nametable",
        }
    }

    /// User-visible rendering, used by `writeln`/`write`/`describe`.
    pub fn print(&self) -> String {
        match self {
            Value::Integer(n) => n.to_string(),
            Value::Float(n) => format_float(*n),
            Value::Boolean(b) => b.to_string(),
            Value::Str(s) => s.to_string(),
            Value::Identifier(id) => id.as_str().to_string(),
            Value::CodeBlock(_) => "<code-block>".to_string(),
            Value::Function(f) => match f.kind {
                CallableKind::Function => format!("<function/{}>", f.arity),
                CallableKind::Constructor => format!("<constructor/{}>", f.arity),
            },
            Value::CurriedFunction(c) => format!("<curried/{}>", c.remaining_arity()),
            Value::Object(o) => format!("<object {}>", o.borrow().class_name),
            Value::Nametable(_) => "<nametable>".to_string(),
        }
    }

    /// Debug rendering at a chosen level of detail (spec.md §4.4).
    pub fn debug_string(&self, extensiveness: Extensiveness) -> String {
        match extensiveness {
            Extensiveness::Type => self.type_name().to_string(),
            Extensiveness::Compact => self.print(),
            Extensiveness::Full => format!("{}::{}", self.type_name(), self.print()),
        }
    }

    /// Structural equality. Integer/Float compare across variants by
    /// numeric value; every other cross-variant pairing is simply unequal
    /// rather than an error (mixed-type *ordering* is the one that fails —
    /// see [`Value::compare`]).
    pub fn equals(&self, other: &Value) -> bool {
        use Value::*;
        match (self, other) {
            (Integer(a), Integer(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Integer(a), Float(b)) | (Float(b), Integer(a)) => (*a as f64) == *b,
            (Boolean(a), Boolean(b)) => a == b,
            (Str(a), Str(b)) => a == b,
            (Identifier(a), Identifier(b)) => a == b,
            (Object(a), Object(b)) => Rc::ptr_eq(a, b),
            (Nametable(a), Nametable(b)) => Rc::ptr_eq(a, b),
            (CodeBlock(a), CodeBlock(b)) => Rc::ptr_eq(a, b),
            (Function(a), Function(b)) => Rc::ptr_eq(a, b),
            (CurriedFunction(a), CurriedFunction(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Total ordering on each primitive type; mixed-type ordering (other
    /// than Integer/Float promotion) fails with `type` (spec.md §4.4).
    pub fn compare(&self, other: &Value, location: ErrorLocation) -> Result<Ordering, SofError> {
        use Value::*;
        match (self, other) {
            (Integer(a), Integer(b)) => Ok(a.cmp(b)),
            (Float(a), Float(b)) => a.partial_cmp(b).ok_or_else(|| nan_error(location.clone())),
            (Integer(a), Float(b)) => {
                (*a as f64).partial_cmp(b).ok_or_else(|| nan_error(location.clone()))
            }
            (Float(a), Integer(b)) => a.partial_cmp(&(*b as f64)).ok_or_else(|| nan_error(location.clone())),
            (Boolean(a), Boolean(b)) => Ok(a.cmp(b)),
            (Str(a), Str(b)) => Ok(a.cmp(b)),
            _ => Err(SofError::type_error(
                location,
                format!(
                    "cannot order values of type '{}' and '{}'",
                    self.type_name(),
                    other.type_name()
                ),
            )),
        }
    }

    /// Deep-enough copy: immutable scalars and Rc-shared callables alias
    /// (cloning the handle, not the data), matching spec.md §4.4.
    pub fn copy(&self) -> Value {
        self.clone()
    }
}

fn nan_error(location: ErrorLocation) -> SofError {
    SofError::type_error(location, "cannot order NaN")
}

fn format_float(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() {
        format!("{:.1}", n)
    } else {
        n.to_string()
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.debug_string(Extensiveness::Full))
    }
}
