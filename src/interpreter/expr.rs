//! Expression evaluation. Each precedence level parses its operators and
//! computes the result on the spot, so the value is ready as soon as the
//! text has been read.
//!
//! Levels, loosest first: `||`, `&&`, `== !=`, `< <= > >=`, `+ -`, `* / %`,
//! prefix `!`, then primaries. Shifts, bitwise operators, `?:`, compound
//! assignment and the comma operator are not part of the grammar.

use crate::error::{Fault, ScriptError};
use crate::interpreter::callable::{Callable, NativeFunction, PRINT_PARAM, UserFunction};
use crate::interpreter::table::SymbolTable;
use crate::interpreter::{Context, Interpreter};

fn truth(b: bool) -> u64 {
    u64::from(b)
}

impl<'src> Interpreter<'src> {
    pub(super) fn expression(&mut self, cx: Context) -> Result<u64, ScriptError> {
        self.logical_or(cx)
    }

    // Both operands are always evaluated.
    fn logical_or(&mut self, cx: Context) -> Result<u64, ScriptError> {
        let mut v = self.logical_and(cx)?;
        while self.cursor.try_consume("||") {
            let rhs = self.logical_and(cx)?;
            v = truth(rhs != 0 || v != 0);
        }
        Ok(v)
    }

    fn logical_and(&mut self, cx: Context) -> Result<u64, ScriptError> {
        let mut v = self.equality(cx)?;
        while self.cursor.try_consume("&&") {
            let rhs = self.equality(cx)?;
            v = truth(rhs != 0 && v != 0);
        }
        Ok(v)
    }

    fn equality(&mut self, cx: Context) -> Result<u64, ScriptError> {
        let mut v = self.relational(cx)?;
        loop {
            if self.cursor.try_consume("==") {
                let rhs = self.relational(cx)?;
                v = truth(v == rhs);
            } else if self.cursor.try_consume("!=") {
                let rhs = self.relational(cx)?;
                v = truth(v != rhs);
            } else {
                return Ok(v);
            }
        }
    }

    fn relational(&mut self, cx: Context) -> Result<u64, ScriptError> {
        let mut v = self.additive(cx)?;
        loop {
            // Two-character operators must be tried first.
            if self.cursor.try_consume("<=") {
                let rhs = self.additive(cx)?;
                v = truth(v <= rhs);
            } else if self.cursor.try_consume(">=") {
                let rhs = self.additive(cx)?;
                v = truth(v >= rhs);
            } else if self.cursor.try_consume("<") {
                let rhs = self.additive(cx)?;
                v = truth(v < rhs);
            } else if self.cursor.try_consume(">") {
                let rhs = self.additive(cx)?;
                v = truth(v > rhs);
            } else {
                return Ok(v);
            }
        }
    }

    fn additive(&mut self, cx: Context) -> Result<u64, ScriptError> {
        let mut v = self.multiplicative(cx)?;
        loop {
            if self.cursor.try_consume("+") {
                v = v.wrapping_add(self.multiplicative(cx)?);
            } else if self.cursor.try_consume("-") {
                v = v.wrapping_sub(self.multiplicative(cx)?);
            } else {
                return Ok(v);
            }
        }
    }

    fn multiplicative(&mut self, cx: Context) -> Result<u64, ScriptError> {
        let mut v = self.unary(cx)?;
        loop {
            if self.cursor.try_consume("*") {
                v = v.wrapping_mul(self.unary(cx)?);
            } else if self.cursor.try_consume("/") {
                let rhs = self.unary(cx)?;
                v = v.checked_div(rhs).unwrap_or(0);
            } else if self.cursor.try_consume("%") {
                let rhs = self.unary(cx)?;
                v = v.checked_rem(rhs).unwrap_or(0);
            } else {
                return Ok(v);
            }
        }
    }

    /// Any run of `!` normalizes the operand to 0 or 1; an odd count also
    /// inverts it.
    fn unary(&mut self, cx: Context) -> Result<u64, ScriptError> {
        let mut negate = false;
        let mut seen = false;
        while self.cursor.try_consume("!") {
            seen = true;
            negate = !negate;
        }
        let mut v = self.primary(cx)?;
        if negate {
            v = truth(v == 0);
        }
        if seen && v > 1 {
            v = 1;
        }
        Ok(v)
    }

    fn primary(&mut self, cx: Context) -> Result<u64, ScriptError> {
        if let Some(name) = self.cursor.try_consume_identifier() {
            if self.cursor.try_consume("(") {
                return self.call(name, cx);
            }
            return Ok(self.lookup(name, cx));
        }

        if let Some(v) = self.cursor.try_consume_integer_literal() {
            return Ok(v);
        }

        if self.cursor.try_consume("(") {
            let v = self.expression(cx)?;
            // A missing `)` is tolerated.
            self.cursor.try_consume(")");
            return Ok(v);
        }

        Err(self.cursor.fail(Fault::ExpectedExpression))
    }

    /// Locals win over globals inside a function. A name bound nowhere
    /// reads as 0.
    fn lookup(&self, name: &str, cx: Context) -> u64 {
        if cx.in_function {
            if let Some(v) = self.locals.get(name) {
                return *v;
            }
        }
        self.globals.get_or_default(name)
    }

    /// Call `name` with the cursor just past the `(` of the argument list.
    /// Afterwards the cursor sits just past the closing `)`.
    pub(super) fn call(&mut self, name: &'src str, cx: Context) -> Result<u64, ScriptError> {
        let callable = self
            .functions
            .get(name)
            .ok_or_else(|| self.cursor.fail(Fault::UndefinedFunction(name.to_string())))?;
        let params = callable.params();

        // Arguments are evaluated in the caller's scope and bound as they go.
        let mut frame = SymbolTable::new();
        let mut found = 0;
        while !self.cursor.try_consume(")") {
            let value = self.expression(cx)?;
            if let Some(param) = params.get(found) {
                frame.insert(*param, value);
            }
            found += 1;
            self.cursor.try_consume(",");
        }
        if found != params.len() {
            return Err(self.cursor.fail(Fault::ArityMismatch {
                name: name.to_string(),
                expected: params.len(),
                found,
            }));
        }

        let caller = std::mem::replace(&mut self.locals, frame);
        let result = match callable.as_ref() {
            Callable::Native(native) => self.call_native(*native, cx),
            Callable::User(function) => self.call_user(function, cx),
        };
        self.locals = caller;
        result
    }

    fn call_native(&mut self, native: NativeFunction, cx: Context) -> Result<u64, ScriptError> {
        match native {
            NativeFunction::Print => {
                let value = self.locals.get_or_default(PRINT_PARAM);
                if cx.effects {
                    self.emit(value)?;
                }
                Ok(0)
            }
        }
    }

    fn call_user(
        &mut self,
        function: &UserFunction<'src>,
        cx: Context,
    ) -> Result<u64, ScriptError> {
        tracing::trace!(
            function = function.name,
            body_offset = function.body_offset,
            "calling function"
        );
        let return_to = self.cursor.checkpoint();
        self.cursor.seek(function.body_offset);
        let result = self.function_body(cx.function_body());
        self.cursor.reset(return_to);
        result
    }

    fn function_body(&mut self, cx: Context) -> Result<u64, ScriptError> {
        self.cursor.consume_or_fail("{")?;
        while !self.cursor.try_consume("}") {
            if self.check_return(cx)? {
                break;
            }
            if !self.statement(cx)? {
                return Err(self.cursor.fail(Fault::ExpectedStatement));
            }
        }
        Ok(self.pending_return.take().unwrap_or(0))
    }
}
