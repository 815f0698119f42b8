//! End-to-end scenario tests (spec.md §8) driving the public `sof` API
//! against [`BufferIo`] rather than a subprocess — fast, and exercises the
//! same surface the binary does.

use sof::error::SofError;
use sof::interpreter::Interpreter;
use sof::io::BufferIo;
use sof::location::FileTag;
use sof::parser::Parser;
use sof::preamble;
use sof::preprocessor::preprocess;
use sof::tokenizer::Tokenizer;
use sof::value::Value;

fn run_captured(src: &str) -> Result<String, SofError> {
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct SharedBuffer(Rc<RefCell<String>>);
    impl sof::io::SofIo for SharedBuffer {
        fn write(&mut self, s: &str) {
            self.0.borrow_mut().push_str(s);
        }
        fn writeln(&mut self, s: &str) {
            self.0.borrow_mut().push_str(s);
            self.0.borrow_mut().push('\n');
        }
    }

    let buffer = SharedBuffer::default();
    let mut interp = Interpreter::new(Box::new(buffer.clone()));
    preamble::install(&mut interp)?;
    let cleaned = preprocess(src, FileTag::Synthetic("<test>"))?;
    let tokenizer = Tokenizer::new(cleaned.clone(), FileTag::Synthetic("<test>"));
    let list = Parser::new(tokenizer).parse()?;
    interp.run(&list, FileTag::Synthetic("<test>"), &cleaned)?;
    Ok(buffer.0.borrow().clone())
}

#[test]
fn arithmetic_and_output() {
    let out = run_captured("1 2 + 3 * writeln").unwrap();
    assert_eq!(out, "9\n");
}

#[test]
fn string_concatenation() {
    let out = run_captured(r#""hello, " "world" cat writeln"#).unwrap();
    assert_eq!(out, "hello, world\n");
}

#[test]
fn function_definition_and_invocation() {
    let out = run_captured(
        "{ arg1 arg0 + } 2 function 'add def  3 4 add writeln",
    )
    .unwrap();
    assert_eq!(out, "7\n");
}

#[test]
fn conditional_branches() {
    let out = run_captured(
        "5 3 > { \"bigger\" writeln } { \"smaller\" writeln } ifelse",
    )
    .unwrap();
    assert_eq!(out, "bigger\n");
}

#[test]
fn while_loop_accumulates() {
    let out = run_captured("0 { dup 5 < } { dup writeln 1 + } while pop").unwrap();
    assert_eq!(out, "0\n1\n2\n3\n4\n");
}

#[test]
fn curried_function_supplies_leading_args() {
    let out = run_captured(
        "{ arg1 arg0 - } 2 function 10 curry 3 . writeln",
    )
    .unwrap();
    // curried with 10 as arg0, then invoked with 3 supplied for arg1: arg1 - arg0 = 3 - 10
    assert_eq!(out, "-7\n");
}

#[test]
fn constructor_builds_object_with_fields() {
    let out = run_captured(
        "{ } 0 constructor . 'point def  point 10 'x :=  point 'x : writeln",
    )
    .unwrap();
    assert_eq!(out, "10\n");
}

#[test]
fn return_unwinds_to_call_boundary() {
    let out = run_captured(
        "{ 1 2 < { 99 return } if  0 } 0 function . writeln",
    )
    .unwrap();
    assert_eq!(out, "99\n");
}

#[test]
fn division_by_zero_is_a_math_error() {
    let err = run_captured("1 0 /").unwrap_err();
    assert!(matches!(err, SofError::Math { .. }));
}

#[test]
fn undefined_identifier_is_a_name_error() {
    let err = run_captured("totally_undefined").unwrap_err();
    assert!(matches!(err, SofError::Name { .. }));
}

#[test]
fn assert_false_raises_assert_error() {
    let err = run_captured("1 2 = assert").unwrap_err();
    assert!(matches!(err, SofError::Assert { .. }));
}

#[test]
fn preamble_helpers_are_available_without_redefinition() {
    let out = run_captured("42 id writeln").unwrap();
    assert_eq!(out, "42\n");
}

#[test]
fn quoted_identifier_is_pushed_as_data_not_looked_up() {
    let out = run_captured("'not_a_real_name describe writeln").unwrap();
    assert!(out.contains("not_a_real_name"));
}

#[test]
fn swap_exchanges_top_two() {
    let out = run_captured("1 2 swap - writeln").unwrap();
    assert_eq!(out, "1\n");
}

#[test]
fn subtraction_and_modulo() {
    let out = run_captured("10 3 - writeln  10 3 % writeln").unwrap();
    assert_eq!(out, "7\n1\n");
}

#[test]
fn comparison_operators_ge_le_ne() {
    let out = run_captured(
        "3 3 >= writeln  2 3 <= writeln  2 3 /= writeln  3 3 /= writeln",
    )
    .unwrap();
    assert_eq!(out, "true\ntrue\ntrue\nfalse\n");
}

#[test]
fn boolean_operators() {
    let out = run_captured(
        "true false and writeln  true false or writeln  true false xor writeln  true not writeln",
    )
    .unwrap();
    assert_eq!(out, "false\ntrue\ntrue\nfalse\n");
}

#[test]
fn convert_family_round_trips_through_string() {
    let out = run_captured(
        r#""42" convert:int writeln  4 convert:float writeln  "true" convert:bool writeln  7 convert:string writeln"#,
    )
    .unwrap();
    assert_eq!(out, "42\n4.0\ntrue\n7\n");
}

#[test]
fn globaldef_from_inside_a_call_is_visible_afterward() {
    let out = run_captured("{ 5 'g globaldef } 0 function . g writeln").unwrap();
    assert_eq!(out, "5\n");
}

#[test]
fn alias_binds_a_callable_under_a_new_name() {
    // `,` pops the callable first, then the identifier beneath it — push the
    // quoted name before the `Function` value it names.
    let out = run_captured("'sq { arg0 arg0 * } 1 function , 6 sq writeln").unwrap();
    assert_eq!(out, "36\n");
}

#[test]
fn write_does_not_append_a_newline() {
    let out = run_captured(r#""a" write "b" write"#).unwrap();
    assert_eq!(out, "ab");
}

#[test]
fn return_n_unwinds_through_two_call_frames() {
    let out = run_captured(
        "{ { 99 return:2 } 0 function . 888 writeln } 0 function . writeln",
    )
    .unwrap();
    assert_eq!(out, "99\n");
}

#[test]
fn stack_value_for_programmatic_inspection() {
    let mut interp = Interpreter::new(Box::new(BufferIo::new()));
    preamble::install(&mut interp).unwrap();
    let cleaned = preprocess("7 8 *", FileTag::Synthetic("<test>")).unwrap();
    let tokenizer = Tokenizer::new(cleaned.clone(), FileTag::Synthetic("<test>"));
    let list = Parser::new(tokenizer).parse().unwrap();
    interp.run(&list, FileTag::Synthetic("<test>"), &cleaned).unwrap();
    assert!(matches!(interp.stack().last(), Some(Value::Integer(56))));
}
