use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::rc::Rc;

use jack2vm::analyzer::Kind;
use jack2vm::codegen::VmWriter;
use jack2vm::driver::{self, DriverError, Emit, Options};
use jack2vm::error::*;
use jack2vm::lexer::Tokenizer;
use jack2vm::parser::Parser;
use jack2vm::{compile, compile_to_string, parse_tree_to_xml, tokenize_to_xml};

fn wrap_in_main(input: &str) -> String {
    format!("class Main {{ function void main() {{ {} }} }}", input)
}

fn compile_lines(input: &str) -> Vec<String> {
    compile_to_string(input)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

fn lines(expected: &str) -> Vec<String> {
    expected
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_well_formed(line: &str) -> bool {
    const SEGMENTS: [&str; 8] = [
        "constant", "argument", "local", "static", "this", "that", "pointer", "temp",
    ];
    let parts: Vec<_> = line.split(' ').collect();
    match parts.as_slice() {
        ["push" | "pop", segment, index] => {
            SEGMENTS.contains(segment) && index.parse::<usize>().is_ok()
        }
        ["label" | "goto" | "if-goto", label] => !label.is_empty(),
        ["call" | "function", name, n] => name.contains('.') && n.parse::<usize>().is_ok(),
        ["return" | "add" | "sub" | "neg" | "eq" | "gt" | "lt" | "and" | "or" | "not"] => true,
        _ => false,
    }
}

const SQUARE: &str = "
/** A square that can grow and move. */
class Square {
    field int x, y;
    field int size;
    static int instances;

    constructor Square new(int ax, int ay, int asize) {
        let x = ax;
        let y = ay;
        let size = asize;
        let instances = instances + 1;
        do draw();
        return this;
    }

    method void dispose() {
        do Memory.deAlloc(this);
        return;
    }

    method void draw() {
        do Screen.setColor(true);
        do Screen.drawRectangle(x, y, x + size, y + size);
        return;
    }

    method void incSize() {
        if (((y + size) < 254) & ((x + size) < 510)) {
            do erase();
            let size = size + 2;
            do draw();
        }
        return;
    }

    function int area(Square s, Array scratch) {
        var int i, total;
        let i = 0;
        while (i < 2) {
            if (i = 0) {
                let scratch[i] = s.getSize();
            } else {
                let scratch[i] = scratch[i - 1] * 2;
            }
            let i = i + 1;
        }
        let total = scratch[0] * scratch[1];
        return total / 2;
    }

    method int getSize() { return size; }
    method void erase() { return; }
}
";

#[test]
fn field_reads_use_the_this_segment() {
    let input = "
class Counter {
    field int x;
    method int get() { return x; }
    method void bump() { let x = x + 1; return; }
}";
    let expected = "
function Counter.get 0
push argument 0
pop pointer 0
push this 0
return
function Counter.bump 0
push argument 0
pop pointer 0
push this 0
push constant 1
add
pop this 0
push constant 0
return";
    assert_eq!(compile_lines(input), lines(expected));
}

#[test]
fn method_calls_push_the_receiver_and_static_calls_do_not() {
    let input = "
class Main {
    static Point p;
    function void main() {
        do p.length();
        do p.scale(2, 3);
        do Point.origin();
        do Point.at(4);
        return;
    }
}";
    let expected = "
function Main.main 0
push static 0
call Point.length 1
pop temp 0
push static 0
push constant 2
push constant 3
call Point.scale 3
pop temp 0
call Point.origin 0
pop temp 0
push constant 4
call Point.at 1
pop temp 0
push constant 0
return";
    assert_eq!(compile_lines(input), lines(expected));
}

#[test]
fn unqualified_calls_target_the_current_object() {
    let input = "
class Ball {
    method void move(int dx) {
        do erase();
        do shift(dx, 1);
        return;
    }
}";
    let expected = "
function Ball.move 0
push argument 0
pop pointer 0
push pointer 0
call Ball.erase 1
pop temp 0
push pointer 0
push argument 1
push constant 1
call Ball.shift 3
pop temp 0
push constant 0
return";
    assert_eq!(compile_lines(input), lines(expected));
}

#[test]
fn constructor_allocates_one_word_per_field() {
    let input = "
class Point {
    field int x, y;
    field Point next;
    static int count;
    constructor Point new(int ax, int ay) {
        let x = ax;
        let y = ay;
        return this;
    }
}";
    let expected = "
function Point.new 0
push constant 3
call Memory.alloc 1
pop pointer 0
push argument 0
pop this 0
push argument 1
pop this 1
push pointer 0
return";
    assert_eq!(compile_lines(input), lines(expected));
}

#[test]
fn while_lowering() {
    let input = wrap_in_main(
        "
var int i;
let i = 0;
while (i < 10) {
    let i = i + 1;
}
return;",
    );
    let expected = "
function Main.main 1
push constant 0
pop local 0
label L000
push local 0
push constant 10
lt
not
if-goto L001
push local 0
push constant 1
add
pop local 0
goto L000
label L001
push constant 0
return";
    assert_eq!(compile_lines(&input), lines(expected));
}

#[test]
fn if_else_lowering() {
    let input = wrap_in_main(
        "
var boolean b;
var int x;
if (b) { let x = 1; } else { let x = 2; }
if (x) { }
return;",
    );
    let expected = "
function Main.main 2
push local 0
not
if-goto L000
push constant 1
pop local 1
goto L001
label L000
push constant 2
pop local 1
label L001
push local 1
not
if-goto L002
goto L003
label L002
label L003
push constant 0
return";
    assert_eq!(compile_lines(&input), lines(expected));
}

#[test]
fn array_store_stashes_the_address_before_the_value() {
    let input = wrap_in_main(
        "
var Array arr;
var int i;
let arr[i] = arr[i + 1];
return;",
    );
    let expected = "
function Main.main 2
push local 0
push local 1
add
push local 0
push local 1
push constant 1
add
add
pop pointer 1
push that 0
pop temp 0
pop pointer 1
push temp 0
pop that 0
push constant 0
return";
    assert_eq!(compile_lines(&input), lines(expected));
}

#[test]
fn empty_subroutine() {
    let expected = "
function Main.f 0
push constant 0
return";
    assert_eq!(
        compile_lines("class Main { function void f() { return; } }"),
        lines(expected)
    );
}

#[test]
fn operators_group_left_to_right_without_precedence() {
    let input = wrap_in_main(
        "
var int x;
let x = 1 + 2 * 3;
let x = -(4 / 2) - ~x;
let x = (x > 1) | (x = 0) & (x < 5);
return;",
    );
    let expected = "
function Main.main 1
push constant 1
push constant 2
add
push constant 3
call Math.multiply 2
pop local 0
push constant 4
push constant 2
call Math.divide 2
neg
push local 0
not
sub
pop local 0
push local 0
push constant 1
gt
push local 0
push constant 0
eq
or
push local 0
push constant 5
lt
and
pop local 0
push constant 0
return";
    assert_eq!(compile_lines(&input), lines(expected));
}

#[test]
fn literal_and_keyword_terms() {
    let input = "
class Main {
    method String greet() {
        var String s;
        var boolean b;
        var Main m;
        let s = \"hello\";
        let b = true;
        let b = false;
        let m = null;
        return this;
    }
}";
    let expected = "
function Main.greet 3
push argument 0
pop pointer 0
push constant 5
call String.new 1
pop local 0
push constant 0
not
pop local 1
push constant 0
pop local 1
push constant 0
pop local 2
push pointer 0
return";
    assert_eq!(compile_lines(input), lines(expected));
}

#[test]
fn method_parameters_start_after_the_receiver() {
    let input = "
class Calc {
    method int add(int a, int b) { return a + b; }
    function int twice(int a) { return a + a; }
}";
    let expected = "
function Calc.add 0
push argument 0
pop pointer 0
push argument 1
push argument 2
add
return
function Calc.twice 0
push argument 0
push argument 0
add
return";
    assert_eq!(compile_lines(input), lines(expected));
}

#[test]
fn locals_shadow_fields() {
    let input = "
class Main {
    field int x;
    method int f() { var int x; let x = 3; return x; }
    method int g() { return x; }
}";
    let output = compile_lines(input);
    assert!(output.contains(&"pop local 0".to_string()));
    assert!(output.contains(&"push this 0".to_string()));
    assert!(!output.contains(&"pop this 0".to_string()));
}

#[test]
fn output_is_well_formed() {
    let output = compile_lines(SQUARE);
    assert!(!output.is_empty());
    for line in &output {
        assert!(is_well_formed(line), "malformed line: {:?}", line);
    }
}

#[test]
fn compiling_twice_is_byte_identical() {
    assert_eq!(
        compile_to_string(SQUARE).unwrap(),
        compile_to_string(SQUARE).unwrap()
    );
}

#[test]
fn labels_are_unique_and_defined() {
    let output = compile_lines(SQUARE);
    let mut defined = HashSet::new();
    for line in &output {
        if let Some(label) = line.strip_prefix("label ") {
            assert!(defined.insert(label.to_string()), "duplicate label {}", label);
        }
    }
    // an if in incSize, a while and a nested if in area
    assert_eq!(defined.len(), 6);

    for line in &output {
        let target = line
            .strip_prefix("goto ")
            .or_else(|| line.strip_prefix("if-goto "));
        if let Some(target) = target {
            assert!(defined.contains(target), "undefined label {}", target);
        }
    }
}

#[test]
fn identically_nested_constructs_get_distinct_labels() {
    let input = wrap_in_main(
        "
var boolean c;
while (c) { while (c) { if (c) {} if (c) {} } }
return;",
    );
    let labels: Vec<_> = compile_lines(&input)
        .iter()
        .filter_map(|l| l.strip_prefix("label ").map(str::to_string))
        .collect();
    assert_eq!(labels.len(), 8);
    let distinct: HashSet<_> = labels.iter().collect();
    assert_eq!(distinct.len(), 8);
}

#[test]
fn slot_indices_follow_declaration_order() {
    let input = "
class Main {
    static int a, b;
    field int c;
    static boolean d;
    field char e, f;
    method void m(int p, int q) { var int r, s; var char t; return; }
}";
    let tokenizer = Tokenizer::new(input).unwrap();
    let mut parser = Parser::new(tokenizer, VmWriter::new(Vec::new()));
    parser.compile_class().unwrap();
    let symbols = parser.symbols();

    let indices = |names: &[&str]| -> Vec<Option<usize>> {
        names.iter().map(|n| symbols.index_of(n)).collect()
    };
    assert_eq!(indices(&["a", "b", "d"]), vec![Some(0), Some(1), Some(2)]);
    assert_eq!(indices(&["c", "e", "f"]), vec![Some(0), Some(1), Some(2)]);
    assert_eq!(indices(&["this", "p", "q"]), vec![Some(0), Some(1), Some(2)]);
    assert_eq!(indices(&["r", "s", "t"]), vec![Some(0), Some(1), Some(2)]);

    assert_eq!(symbols.count_of(Kind::Static), 3);
    assert_eq!(symbols.count_of(Kind::Field), 3);
    assert_eq!(symbols.count_of(Kind::Arg), 3);
    assert_eq!(symbols.count_of(Kind::Var), 3);
    assert_eq!(symbols.type_of("this"), Some("Main"));
}

#[test]
fn compile_hands_back_the_sink() {
    let out = compile("class Main { function void f() { return; } }", Vec::new()).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "function Main.f 0\npush constant 0\nreturn\n"
    );
}

#[derive(Clone, Debug, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn output_before_an_error_is_kept() {
    let buffer = SharedBuffer::default();
    let input = wrap_in_main("do Output.printInt(1); let y = 2; return;");
    let err = compile(&input, buffer.clone()).unwrap_err();
    assert!(matches!(err, CompileError::Semantic(_)));

    let written = String::from_utf8(buffer.0.borrow().clone()).unwrap();
    assert_eq!(
        written,
        "function Main.main 0\npush constant 1\ncall Output.printInt 1\npop temp 0\n"
    );
}

#[test]
fn missing_semicolon_is_a_syntax_error() {
    let input = wrap_in_main("var int x; let x = 1 return;");
    let err = compile_to_string(&input).unwrap_err();
    assert_eq!(
        err.to_string(),
        "syntax error at line 1: expected ';', found 'return'"
    );
    let CompileError::Syntax(SyntaxError { line, kind }) = err else {
        panic!("expected a syntax error, got {:?}", err);
    };
    assert_eq!(line, 1);
    assert_eq!(
        kind,
        SyntaxErrorKind::Expected {
            expected: "';'".to_string(),
            found: "return".to_string(),
        }
    );
}

#[test]
fn syntax_errors_report_the_line() {
    let input = "class Main {\n    int x;\n}";
    let err = compile_to_string(input).unwrap_err();
    let CompileError::Syntax(SyntaxError { line, .. }) = err else {
        panic!("expected a syntax error, got {:?}", err);
    };
    assert_eq!(line, 2);
}

#[test]
fn class_name_must_be_an_identifier() {
    let err = compile_to_string("class 123 { }").unwrap_err();
    assert!(matches!(
        err,
        CompileError::Syntax(SyntaxError {
            kind: SyntaxErrorKind::Expected { .. },
            ..
        })
    ));
}

#[test]
fn trailing_tokens_are_rejected() {
    let err = compile_to_string("class Main { } class").unwrap_err();
    let CompileError::Syntax(SyntaxError { kind, .. }) = err else {
        panic!("expected a syntax error, got {:?}", err);
    };
    assert_eq!(kind, SyntaxErrorKind::TrailingTokens("class".to_string()));
}

#[test]
fn premature_end_of_input() {
    let err = compile_to_string("class Main {").unwrap_err();
    let CompileError::Syntax(SyntaxError { kind, .. }) = err else {
        panic!("expected a syntax error, got {:?}", err);
    };
    assert_eq!(kind, SyntaxErrorKind::UnexpectedEof);
}

#[test]
fn calling_through_a_primitive_is_a_semantic_error() {
    let input = wrap_in_main("var int n; do n.foo(); return;");
    let err = compile_to_string(&input).unwrap_err();
    let CompileError::Semantic(SemanticError { kind, .. }) = err else {
        panic!("expected a semantic error, got {:?}", err);
    };
    assert_eq!(
        kind,
        SemanticErrorKind::PrimitiveCallTarget {
            name: "n".to_string(),
            ty: "int".to_string(),
        }
    );
}

#[test]
fn undeclared_variables_are_rejected() {
    let err = compile_to_string(&wrap_in_main("let y = 1; return;")).unwrap_err();
    let CompileError::Semantic(SemanticError { kind, .. }) = err else {
        panic!("expected a semantic error, got {:?}", err);
    };
    assert_eq!(kind, SemanticErrorKind::UndefinedVariable("y".to_string()));
}

#[test]
fn lexical_errors_abort_before_parsing() {
    let err = compile_to_string(&wrap_in_main("return #;")).unwrap_err();
    let CompileError::Lex(LexError { kind, .. }) = err else {
        panic!("expected a lexical error, got {:?}", err);
    };
    assert_eq!(kind, LexErrorKind::UnexpectedCharacter('#'));
}

#[test]
fn token_xml() {
    let xml = tokenize_to_xml("class Main { }").unwrap();
    assert_eq!(
        xml,
        "<tokens>\n<keyword> class </keyword>\n<identifier> Main </identifier>\n<symbol> { </symbol>\n<symbol> } </symbol>\n</tokens>\n"
    );
}

#[test]
fn parse_tree_checks_syntax_only() {
    let input = wrap_in_main("let y = 1; return;");
    assert!(compile_to_string(&input).is_err());

    let xml = parse_tree_to_xml(&input).unwrap();
    assert!(xml.starts_with("<class>\n<keyword> class </keyword>\n<identifier> Main </identifier>\n"));
    assert!(xml.ends_with("<symbol> } </symbol>\n</class>\n"));
    assert!(xml.contains("<letStatement>\n<keyword> let </keyword>\n<identifier> y </identifier>\n"));

    let err = parse_tree_to_xml("class Main { } }").unwrap_err();
    assert!(matches!(
        err,
        CompileError::Syntax(SyntaxError {
            kind: SyntaxErrorKind::TrailingTokens(_),
            ..
        })
    ));
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("jack2vm-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

const GOOD: &str = "class Good { function int one() { return 1; } }";
const BAD: &str = "class Bad { function int one() { return 1 } }";

#[test]
fn directory_build_keeps_going_past_failures() {
    let dir = scratch_dir("keep-going");
    fs::write(dir.join("Good.jack"), GOOD).unwrap();
    fs::write(dir.join("Bad.jack"), BAD).unwrap();
    fs::write(dir.join("notes.txt"), "not a class").unwrap();

    let err = driver::compile_path(&dir, &Options::default()).unwrap_err();
    assert!(matches!(err, DriverError::Failed { failed: 1, total: 2 }));
    assert_eq!(
        fs::read_to_string(dir.join("Good.vm")).unwrap(),
        "function Good.one 0\npush constant 1\nreturn\n"
    );

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn directory_build_can_fail_fast() {
    let dir = scratch_dir("fail-fast");
    fs::write(dir.join("Good.jack"), GOOD).unwrap();
    fs::write(dir.join("Bad.jack"), BAD).unwrap();

    let options = Options {
        fail_fast: true,
        ..Options::default()
    };
    let err = driver::compile_path(&dir, &options).unwrap_err();
    assert!(matches!(err, DriverError::Compile { .. }));
    // Bad.jack sorts first
    assert!(!dir.join("Good.vm").exists());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn single_file_build_into_out_dir() {
    let dir = scratch_dir("out-dir");
    let source = dir.join("Good.jack");
    fs::write(&source, GOOD).unwrap();

    let options = Options {
        out_dir: Some(dir.join("build")),
        emit: Emit::Tokens,
        fail_fast: false,
    };
    let outputs = driver::compile_path(&source, &options).unwrap();
    assert_eq!(outputs, vec![dir.join("build").join("GoodT.xml")]);
    let xml = fs::read_to_string(&outputs[0]).unwrap();
    assert!(xml.starts_with("<tokens>\n<keyword> class </keyword>\n"));

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn directory_without_sources() {
    let dir = scratch_dir("empty");
    let err = driver::compile_path(&dir, &Options::default()).unwrap_err();
    assert!(matches!(err, DriverError::NoSources(_)));
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn lexical_errors_leave_no_vm_file() {
    let dir = scratch_dir("lex-error");
    let source = dir.join("Bad.jack");
    fs::write(&source, "class Bad { # }").unwrap();

    let err = driver::compile_path(&source, &Options::default()).unwrap_err();
    assert!(matches!(
        err,
        DriverError::Compile {
            source: CompileError::Lex(_),
            ..
        }
    ));
    assert!(!dir.join("Bad.vm").exists());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn parse_tree_build() {
    let dir = scratch_dir("tree");
    fs::write(dir.join("Good.jack"), GOOD).unwrap();

    let options = Options {
        emit: Emit::Tree,
        ..Options::default()
    };
    let outputs = driver::compile_path(&dir, &options).unwrap();
    assert_eq!(outputs, vec![dir.join("Good.xml")]);
    let xml = fs::read_to_string(&outputs[0]).unwrap();
    assert!(xml.starts_with("<class>\n"));
    assert!(xml.contains("<returnStatement>\n<keyword> return </keyword>\n<expression>\n<term>\n<integerConstant> 1 </integerConstant>\n</term>\n</expression>\n<symbol> ; </symbol>\n</returnStatement>\n"));
    assert!(!dir.join("Good.vm").exists());

    fs::remove_dir_all(&dir).unwrap();
}
