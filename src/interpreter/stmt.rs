use crate::error::{Fault, ScriptError};
use crate::interpreter::callable::{Callable, UserFunction};
use crate::interpreter::{Context, Interpreter};
use crate::scanner::Keyword;

impl<'src> Interpreter<'src> {
    /// Execute one statement. Returns `false`, consuming nothing, when the
    /// next token cannot start a statement.
    pub(super) fn statement(&mut self, cx: Context) -> Result<bool, ScriptError> {
        if self.cursor.try_consume("#") {
            self.cursor.skip_line();
            return Ok(true);
        }

        if self.check_return(cx)? {
            return Ok(true);
        }

        let Some(name) = self.cursor.try_consume_identifier() else {
            return Ok(false);
        };

        match Keyword::from_identifier(name) {
            Some(Keyword::If) => self.if_statement(cx)?,
            Some(Keyword::While) => self.while_statement(cx)?,
            Some(Keyword::Fun) => self.fun_statement(cx)?,
            Some(Keyword::Else) => return Err(self.cursor.fail(Fault::DanglingElse)),
            Some(keyword @ Keyword::Return) => {
                return Err(self.cursor.fail(Fault::ReservedWord(keyword)));
            }
            None => self.assignment_or_call(name, cx)?,
        }
        Ok(true)
    }

    /// True when the current function is returning: either a `return` already
    /// ran further in, or one is next and has just been evaluated.
    pub(super) fn check_return(&mut self, cx: Context) -> Result<bool, ScriptError> {
        if !cx.in_function {
            return Ok(false);
        }
        if self.pending_return.is_some() {
            return Ok(true);
        }

        let start = self.cursor.checkpoint();
        let word = self.cursor.try_consume_identifier();
        if word.and_then(Keyword::from_identifier) == Some(Keyword::Return) {
            let value = self.expression(cx)?;
            tracing::trace!(value, "return");
            self.pending_return = Some(value);
            return Ok(true);
        }

        self.cursor.reset(start);
        Ok(false)
    }

    /// Run the statements of a block whose `{` was just consumed, through its
    /// closing `}`. Once the function is returning, whatever is left of the
    /// block is skipped without running.
    fn block(&mut self, cx: Context) -> Result<(), ScriptError> {
        while !self.cursor.try_consume("}") {
            if self.check_return(cx)? {
                return self.cursor.skip_balanced_block();
            }
            if !self.statement(cx)? {
                return Err(self.cursor.fail(Fault::ExpectedStatement));
            }
        }
        Ok(())
    }

    fn if_statement(&mut self, cx: Context) -> Result<(), ScriptError> {
        self.cursor.consume_or_fail("(")?;
        let condition = self.expression(cx)?;
        self.cursor.consume_or_fail(")")?;
        self.cursor.consume_or_fail("{")?;

        if condition == 0 {
            self.cursor.skip_balanced_block()?;
            if self.try_else()? {
                self.block(cx)?;
            }
        } else {
            self.block(cx)?;
            // A pending return leaves any `else` for the enclosing block to skip.
            if self.pending_return.is_some() {
                return Ok(());
            }
            if self.try_else()? {
                self.cursor.skip_balanced_block()?;
            }
        }
        Ok(())
    }

    /// Consume `else {` if it follows; otherwise leave the cursor untouched.
    fn try_else(&mut self) -> Result<bool, ScriptError> {
        let start = self.cursor.checkpoint();
        let word = self.cursor.try_consume_identifier();
        if word.and_then(Keyword::from_identifier) == Some(Keyword::Else) {
            self.cursor.consume_or_fail("{")?;
            return Ok(true);
        }
        self.cursor.reset(start);
        Ok(false)
    }

    /// The condition is re-read from the text before every iteration.
    fn while_statement(&mut self, cx: Context) -> Result<(), ScriptError> {
        let condition_start = self.cursor.checkpoint();
        loop {
            self.cursor.reset(condition_start);
            self.cursor.consume_or_fail("(")?;
            let condition = self.expression(cx)?;
            self.cursor.consume_or_fail(")")?;
            self.cursor.consume_or_fail("{")?;

            if condition == 0 {
                return self.cursor.skip_balanced_block();
            }

            self.block(cx)?;
            if self.pending_return.is_some() {
                return Ok(());
            }
        }
    }

    /// Record a function and skip its body. The body is only read when the
    /// function is called.
    fn fun_statement(&mut self, cx: Context) -> Result<(), ScriptError> {
        if cx.in_function {
            return Err(self.cursor.fail(Fault::NestedFunction));
        }

        let name = self
            .cursor
            .try_consume_identifier()
            .ok_or_else(|| self.cursor.fail(Fault::ExpectedIdentifier))?;

        self.cursor.try_consume("(");
        let params_start = self.cursor.checkpoint();

        // First pass validates the list and counts it, second pass collects.
        let mut count = 0;
        while !self.cursor.try_consume(")") {
            if self.cursor.try_consume_identifier().is_none() {
                return Err(self.cursor.fail(Fault::ExpectedIdentifier));
            }
            count += 1;
            self.cursor.try_consume(",");
        }

        self.cursor.reset(params_start);
        let mut params = Vec::with_capacity(count);
        while !self.cursor.try_consume(")") {
            params.extend(self.cursor.try_consume_identifier());
            self.cursor.try_consume(",");
        }

        let body_offset = self.cursor.offset();
        tracing::debug!(function = name, ?params, body_offset, "defined function");
        self.functions.define(Callable::User(UserFunction {
            name,
            params,
            body_offset,
        }));

        self.cursor.consume_or_fail("{")?;
        self.cursor.skip_balanced_block()
    }

    fn assignment_or_call(&mut self, name: &'src str, cx: Context) -> Result<(), ScriptError> {
        if self.cursor.try_consume("=") {
            let value = self.expression(cx)?;
            self.assign(name, value, cx);
            return Ok(());
        }

        if self.cursor.try_consume("(") {
            self.call(name, cx)?;
            return Ok(());
        }

        Err(self
            .cursor
            .fail(Fault::ExpectedAssignOrCall(name.to_string())))
    }

    /// At top level every write goes to the globals. Inside a function an
    /// existing local is updated first, then an existing global; otherwise a
    /// new local is created.
    fn assign(&mut self, name: &'src str, value: u64, cx: Context) {
        if !cx.in_function || (!self.locals.contains(name) && self.globals.contains(name)) {
            self.globals.insert(name, value);
        } else {
            self.locals.insert(name, value);
        }
    }
}
