//! Embedded preamble (spec.md §5, §9): a handful of standard definitions
//! installed into every fresh [`crate::interpreter::Interpreter`], parsed
//! once and memoized behind a [`OnceLock`] — the one-time initializer
//! spec.md §5 requires for the shared, immutable preamble AST.

use crate::ast::TokenList;
use crate::error::SofError;
use crate::interpreter::Interpreter;
use crate::location::FileTag;
use crate::parser::Parser;
use crate::preprocessor::preprocess;
use crate::tokenizer::Tokenizer;
use std::sync::OnceLock;

const PREAMBLE_SOURCE: &str = include_str!("../preamble.sof");

static PREAMBLE_AST: OnceLock<TokenList> = OnceLock::new();

fn preamble_ast() -> Result<&'static TokenList, SofError> {
    if let Some(ast) = PREAMBLE_AST.get() {
        return Ok(ast);
    }
    let cleaned = preprocess(PREAMBLE_SOURCE, FileTag::Synthetic("<preamble>"))?;
    let tokenizer = Tokenizer::new(cleaned, FileTag::Synthetic("<preamble>"));
    let list = Parser::new(tokenizer).parse()?;
    Ok(PREAMBLE_AST.get_or_init(|| list))
}

/// Runs the preamble's definitions against `interp`, installing `id`,
/// `swap2`, `twice` and friends into the global frame. Call once per fresh
/// interpreter, before any user program.
pub fn install(interp: &mut Interpreter) -> Result<(), SofError> {
    let ast = preamble_ast()?;
    interp.run(ast, FileTag::Synthetic("<preamble>"), PREAMBLE_SOURCE)
}
