pub mod callable;
mod expr;
pub mod snapshot;
mod stmt;
pub mod table;

use std::io::Write;
use std::rc::Rc;

use crate::error::ScriptError;
use crate::interpreter::callable::{Callable, FunctionRegistry};
use crate::interpreter::snapshot::StateSnapshot;
use crate::interpreter::table::SymbolTable;
use crate::scanner::Cursor;

/// Flags threaded through every evaluation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Context {
    /// When false, `print` writes nothing. Nothing else is suppressed.
    pub effects: bool,
    /// True while executing inside a function body.
    pub in_function: bool,
}

impl Context {
    pub fn top_level(effects: bool) -> Self {
        Self {
            effects,
            in_function: false,
        }
    }

    pub fn function_body(self) -> Self {
        Self {
            in_function: true,
            ..self
        }
    }
}

/// Executes a program straight from its text: statements are recognized and
/// run in the same pass, with no tree built in between.
pub struct Interpreter<'src> {
    cursor: Cursor<'src>,
    /// Set by `return`, drained by the call that is returning.
    pending_return: Option<u64>,
    globals: SymbolTable<'src, u64>,
    /// Bindings of the innermost active call. Replaced, not nested, per call.
    locals: SymbolTable<'src, u64>,
    functions: FunctionRegistry<'src>,
    output: Vec<String>,
    capture: bool,
    /// Writer for print output (allows testing without stdout)
    writer: Box<dyn Write>,
}

impl<'src> Interpreter<'src> {
    pub fn new(source: &'src str) -> Self {
        Self::with_writer(source, std::io::stdout())
    }

    pub fn with_writer(source: &'src str, writer: impl Write + 'static) -> Self {
        Self {
            cursor: Cursor::new(source),
            pending_return: None,
            globals: SymbolTable::new(),
            locals: SymbolTable::new(),
            functions: FunctionRegistry::new(),
            output: Vec::new(),
            capture: false,
            writer: Box::new(writer),
        }
    }

    /// Create an interpreter that records printed lines instead of writing
    /// them anywhere.
    pub fn capturing(source: &'src str) -> Self {
        Self {
            capture: true,
            ..Self::with_writer(source, std::io::sink())
        }
    }

    /// Execute every top-level statement, then require that only whitespace
    /// is left.
    pub fn run(&mut self) -> Result<(), ScriptError> {
        self.execute(Context::top_level(true))
    }

    /// Like [`Interpreter::run`], but `print` produces no output. Variables
    /// and functions are still defined and updated.
    pub fn run_silent(&mut self) -> Result<(), ScriptError> {
        self.execute(Context::top_level(false))
    }

    fn execute(&mut self, cx: Context) -> Result<(), ScriptError> {
        while self.statement(cx)? {}
        self.cursor.end_or_fail()?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn source(&self) -> &'src str {
        self.cursor.source()
    }

    /// Lines printed so far; only recorded by [`Interpreter::capturing`].
    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn global(&self, name: &str) -> Option<u64> {
        self.globals.get(name).copied()
    }

    pub fn function(&self, name: &str) -> Option<Rc<Callable<'src>>> {
        self.functions.get(name)
    }

    pub fn snapshot(&self) -> StateSnapshot<'src> {
        StateSnapshot::new(&self.globals, &self.functions)
    }

    fn emit(&mut self, value: u64) -> Result<(), ScriptError> {
        writeln!(self.writer, "{value}")?;
        if self.capture {
            self.output.push(value.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Fault;
    use crate::scanner::Keyword;
    use rstest::rstest;

    fn run(source: &str) -> Vec<String> {
        let mut interp = Interpreter::capturing(source);
        interp.run().expect("run should succeed");
        interp.output().to_vec()
    }

    fn run_err(source: &str) -> ScriptError {
        let mut interp = Interpreter::capturing(source);
        interp.run().unwrap_err()
    }

    fn fault(source: &str) -> Fault {
        run_err(source).fault().cloned().expect("abort expected")
    }

    #[rstest]
    #[case("print(1 + 2)", "3")]
    #[case("print(10 - 3)", "7")]
    #[case("print(2 * 3 + 4)", "10")]
    #[case("print(2 + 3 * 4)", "14")]
    #[case("print(10 / 4)", "2")]
    #[case("print(10 % 4)", "2")]
    #[case("print(7 / 0)", "0")]
    #[case("print(7 % 0)", "0")]
    #[case("print(0 - 1)", "18446744073709551615")]
    #[case("print(3 - 5 + 2)", "0")]
    #[case("print(20 / 2 / 5)", "2")]
    #[case("print((2 + 3) * 4)", "20")]
    #[case("print(18446744073709551615 + 2)", "1")]
    #[case("print(4294967296 * 4294967296)", "0")]
    fn arithmetic(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(run(source), vec![expected]);
    }

    #[rstest]
    #[case("print(!0)", "1")]
    #[case("print(!5)", "0")]
    #[case("print(!!0)", "0")]
    #[case("print(!!5)", "1")]
    #[case("print(!!!5)", "0")]
    #[case("print(!!18446744073709551615)", "1")]
    #[case("print(!1 + 5)", "5")]
    fn logical_not(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(run(source), vec![expected]);
    }

    #[rstest]
    #[case("print(1 < 2)", "1")]
    #[case("print(2 < 1)", "0")]
    #[case("print(2 <= 2)", "1")]
    #[case("print(3 >= 4)", "0")]
    #[case("print(5 > 4)", "1")]
    #[case("print(7 == 7)", "1")]
    #[case("print(7 != 7)", "0")]
    #[case("print(1 < 2 == 1)", "1")]
    #[case("print(3 < 2 < 1)", "1")]
    #[case("print(0 - 1 > 5)", "1")]
    fn comparisons(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(run(source), vec![expected]);
    }

    #[rstest]
    #[case("print(2 && 3)", "1")]
    #[case("print(2 && 0)", "0")]
    #[case("print(0 || 9)", "1")]
    #[case("print(0 || 0)", "0")]
    #[case("print(1 || 0 && 0)", "1")]
    #[case("print(0 && 1 || 1)", "1")]
    fn logical_and_or(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(run(source), vec![expected]);
    }

    #[test]
    fn logical_operators_evaluate_both_sides() {
        let output = run("fun f(x) { print(x) return x } y = f(0) && f(1) z = f(1) || f(2)");
        assert_eq!(output, vec!["0", "1", "1", "2"]);
    }

    #[test]
    fn variables() {
        assert_eq!(run("x = 10 print(x)"), vec!["10"]);
        assert_eq!(run("x = 1 x = x + 1 print(x)"), vec!["2"]);
        assert_eq!(run("abc1 = 3 b = abc1 * abc1 print(b)"), vec!["9"]);
    }

    #[test]
    fn undefined_variable_reads_as_zero() {
        assert_eq!(run("print(nothing)"), vec!["0"]);
        assert_eq!(run("fun f() { return missing + 1 } print(f())"), vec!["1"]);
    }

    #[test]
    fn undefined_function_aborts() {
        assert_eq!(fault("print(g(1))"), Fault::UndefinedFunction("g".to_string()));
        assert_eq!(fault("g(1)"), Fault::UndefinedFunction("g".to_string()));
    }

    #[test]
    fn if_else() {
        assert_eq!(run("if (0) { print(1) } else { print(2) }"), vec!["2"]);
        assert_eq!(run("if (7) { print(1) } else { print(2) }"), vec!["1"]);
        assert_eq!(run("if (0) { print(1) } print(3)"), vec!["3"]);
        assert_eq!(run("if (1) { print(1) } print(3)"), vec!["1", "3"]);
    }

    #[test]
    fn nested_if_in_untaken_branch_is_skipped() {
        let output = run("if (0) { if (1) { print(1) } else { print(2) } } else { print(3) }");
        assert_eq!(output, vec!["3"]);
    }

    #[test]
    fn identifiers_starting_with_keywords_are_variables() {
        assert_eq!(run("iffy = 2 whilex = 3 print(iffy + whilex)"), vec!["5"]);
    }

    #[test]
    fn while_loop() {
        let output = run("i = 0 while (i < 3) { print(i) i = i + 1 }");
        assert_eq!(output, vec!["0", "1", "2"]);
    }

    #[test]
    fn while_false_runs_zero_times() {
        assert_eq!(run("while (0) { print(1) } print(2)"), vec!["2"]);
    }

    #[test]
    fn while_condition_is_reevaluated_each_iteration() {
        let output = run("fun check(n) { print(n) return n < 2 } i = 0 while (check(i)) { i = i + 1 }");
        assert_eq!(output, vec!["0", "1", "2"]);
    }

    #[test]
    fn nested_loops() {
        let output = run("i = 0 while (i < 2) { j = 0 while (j < 2) { print(i * 10 + j) j = j + 1 } i = i + 1 }");
        assert_eq!(output, vec!["0", "1", "10", "11"]);
    }

    #[test]
    fn functions() {
        let output = run("x = 5 fun add(a,b) { return a + b } print(add(x, 3))");
        assert_eq!(output, vec!["8"]);
    }

    #[test]
    fn early_return_inside_if() {
        let output = run("fun f(n) { if (n) { return 1 } return 0 } print(f(0)) print(f(7))");
        assert_eq!(output, vec!["0", "1"]);
    }

    #[test]
    fn return_inside_loop_stops_the_function() {
        let output = run("fun first(n) { i = 0 while (1) { if (i * i >= n) { return i } i = i + 1 } print(99) } print(first(10))");
        assert_eq!(output, vec!["4"]);
    }

    #[test]
    fn return_from_else_branch() {
        let output = run("fun f(n) { if (n) { x = 1 } else { return 5 } return 6 } print(f(0)) print(f(1))");
        assert_eq!(output, vec!["5", "6"]);
    }

    #[test]
    fn statements_after_return_do_not_run() {
        let output = run("fun f() { return 1 print(2) } print(f())");
        assert_eq!(output, vec!["1"]);
    }

    #[test]
    fn fall_through_returns_zero() {
        assert_eq!(run("fun f() { x = 3 } print(f())"), vec!["0"]);
        assert_eq!(run("fun f() { } print(f())"), vec!["0"]);
    }

    #[test]
    fn print_returns_zero() {
        assert_eq!(run("x = print(5) + 1 print(x)"), vec!["5", "1"]);
    }

    #[test]
    fn call_in_expression_with_parenthesized_argument() {
        assert_eq!(run("x = 1 + print((1 + 2) * 3)"), vec!["9"]);
    }

    #[test]
    fn recursion() {
        let output = run(
            "fun fib(n) { if (n < 2) { return n } return fib(n - 1) + fib(n - 2) }
             i = 0 while (i < 10) { print(fib(i)) i = i + 1 }",
        );
        assert_eq!(
            output,
            vec!["0", "1", "1", "2", "3", "5", "8", "13", "21", "34"]
        );
    }

    #[test]
    fn assignment_inside_function_without_binding_is_local() {
        let mut interp = Interpreter::capturing("fun f() { t = 7 print(t) } f() print(t)");
        interp.run().expect("run should succeed");
        assert_eq!(interp.output(), &["7", "0"]);
        assert_eq!(interp.global("t"), None);
    }

    #[test]
    fn assignment_inside_function_updates_existing_global() {
        let mut interp = Interpreter::capturing("g = 1 fun f() { g = g + 10 } f() print(g)");
        interp.run().expect("run should succeed");
        assert_eq!(interp.output(), &["11"]);
        assert_eq!(interp.global("g"), Some(11));
    }

    #[test]
    fn parameter_shadows_global() {
        let output = run("a = 1 fun f(a) { a = a + 100 return a } print(f(5)) print(a)");
        assert_eq!(output, vec!["105", "1"]);
    }

    #[test]
    fn locals_do_not_leak_between_calls() {
        let output = run("fun f(x) { if (x) { seen = 4 } return seen } print(f(1)) print(f(0))");
        assert_eq!(output, vec!["4", "0"]);
    }

    #[test]
    fn callee_does_not_see_caller_locals() {
        let output = run("fun inner() { return v } fun outer() { v = 3 return inner() } print(outer())");
        assert_eq!(output, vec!["0"]);
    }

    #[test]
    fn arguments_use_the_caller_scope() {
        let output = run("fun id(x) { return x } fun f(x) { return id(x + 1) } print(f(1))");
        assert_eq!(output, vec!["2"]);
    }

    #[test]
    fn redefinition_replaces_function() {
        let output = run("fun f() { return 1 } print(f()) fun f() { return 2 } print(f())");
        assert_eq!(output, vec!["1", "2"]);
    }

    #[test]
    fn uncalled_body_is_never_parsed() {
        assert_eq!(run("fun broken() { @@@ = } print(1)"), vec!["1"]);
    }

    #[test]
    fn comments() {
        let output = run("# leading comment\nx = 1 # trailing { brace\nprint(x)\n# last line");
        assert_eq!(output, vec!["1"]);
    }

    #[test]
    fn parameters_may_omit_commas() {
        assert_eq!(run("fun add(a b) { return a + b } print(add(1 2))"), vec!["3"]);
    }

    #[test]
    fn silent_run_suppresses_print_but_not_assignments() {
        let mut interp = Interpreter::capturing("x = 4 print(x) fun f() { y = 1 } x = x + 1");
        interp.run_silent().expect("run should succeed");
        assert!(interp.output().is_empty());
        assert_eq!(interp.global("x"), Some(5));
        assert!(interp.function("f").is_some());
    }

    #[test]
    fn print_writes_to_writer() {
        use std::cell::RefCell;
        use std::io;

        #[derive(Clone, Default)]
        struct Shared(Rc<RefCell<Vec<u8>>>);

        impl io::Write for Shared {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.borrow_mut().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let sink = Shared::default();
        let mut interp = Interpreter::with_writer("print(1) print(22)", sink.clone());
        interp.run().expect("run should succeed");
        assert_eq!(sink.0.borrow().as_slice(), b"1\n22\n");
    }

    #[rstest]
    #[case("fun f(a, b) { } f(1)", 1)]
    #[case("fun f(a) { } f(1, 2)", 2)]
    #[case("print()", 0)]
    #[case("print(1, 2)", 2)]
    fn arity_mismatch(#[case] source: &str, #[case] found: usize) {
        assert!(matches!(
            fault(source),
            Fault::ArityMismatch { found: f, .. } if f == found
        ));
    }

    #[rstest]
    #[case("else { }", Fault::DanglingElse)]
    #[case("fun f() { fun g() { } } f()", Fault::NestedFunction)]
    #[case("return 1", Fault::ReservedWord(Keyword::Return))]
    #[case("x", Fault::ExpectedAssignOrCall("x".to_string()))]
    #[case("x + 1", Fault::ExpectedAssignOrCall("x".to_string()))]
    #[case("x = ", Fault::ExpectedExpression)]
    #[case("if 1 { }", Fault::Expected("("))]
    #[case("if (1 { }", Fault::Expected(")"))]
    #[case("while (1) print(1)", Fault::Expected("{"))]
    #[case("fun (a) { }", Fault::ExpectedIdentifier)]
    #[case("fun f(1) { }", Fault::ExpectedIdentifier)]
    #[case("if (0) { print(1)", Fault::UnterminatedBlock)]
    #[case("if (1) { print(1)", Fault::ExpectedStatement)]
    #[case("x = 1 }", Fault::TrailingInput)]
    #[case("x = 1 42", Fault::TrailingInput)]
    fn syntax_faults(#[case] source: &str, #[case] expected: Fault) {
        assert_eq!(fault(source), expected);
    }

    #[test]
    fn fault_offset_points_at_unconsumed_text() {
        let source = "x = 1\ny = (2 + )";
        let err = run_err(source);
        assert_eq!(err.offset(), Some(15));
        assert_eq!(
            err.display_with_remaining(source),
            "failed at offset 15\n)"
        );
    }

    #[test]
    fn output_before_a_fault_is_kept() {
        let mut interp = Interpreter::capturing("print(1) print(2) nope(3)");
        assert!(interp.run().is_err());
        assert_eq!(interp.output(), &["1", "2"]);
    }
}
