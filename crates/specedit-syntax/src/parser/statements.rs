//! Line-level statements and conditionals.

use crate::error::ParseError;
use crate::grammar::{
    ELSE, ENDIF, GLOBAL_KEYWORDS, IF_OPENERS, StatementKind, is_definition_tag,
    is_reserved_directive,
};
use crate::lexer::Token;
use crate::statement::{Definition, ElseBranch, Eof, Expression, Global, IfBlock, MacroLine};

use super::{Context, MAX_NESTING, Parser};

impl Parser<'_> {
    pub(super) fn if_block(&mut self, ctx: &Context) -> Result<Option<IfBlock>, ParseError> {
        let entry = self.stream.pointer();
        let opener = self.stream.get()?;
        if !(opener.is_line_start() && IF_OPENERS.contains(&opener.text())) {
            return Ok(None);
        }
        if ctx.depth >= MAX_NESTING {
            return Err(ParseError::NestingTooDeep {
                line: opener.line(),
                limit: MAX_NESTING,
            });
        }

        let result = self.if_rest(opener, ctx);
        if result.is_err() {
            self.stream.set_pointer(entry);
        }
        result.map(Some)
    }

    fn if_rest(&mut self, opener: &Token, ctx: &Context) -> Result<IfBlock, ParseError> {
        let condition = self.condition(opener)?;
        let branch = ctx.nested(StatementKind::If);

        let true_branch = self.body(&branch)?;
        let else_branch = if self.stream.at_marker(&[ELSE]) {
            let else_token = self.stream.get()?.clone();
            let statements = self.body(&branch)?;
            Some(ElseBranch {
                else_token,
                statements,
            })
        } else {
            None
        };

        let endif = self.stream.get()?;
        if !(endif.is_line_start() && endif.text() == ENDIF) {
            let reason = if endif.is_eof() {
                format!("`{}` has no matching {ENDIF}", opener.text())
            } else {
                format!("found `{}` where {ENDIF} was expected", endif.text())
            };
            return Err(ParseError::MalformedConditional {
                line: opener.line(),
                reason,
            });
        }

        Ok(IfBlock {
            opener: opener.clone(),
            condition,
            true_branch,
            else_branch,
            endif: endif.clone(),
        })
    }

    /// The condition is the single token following the opener on its line.
    fn condition(&mut self, opener: &Token) -> Result<Expression, ParseError> {
        match self.stream.touch() {
            Some(token) if !token.is_eof() && !token.is_line_start() => {
                self.stream.get()?;
                Ok(Expression::new(vec![token.clone()]))
            }
            _ => Err(ParseError::MalformedConditional {
                line: opener.line(),
                reason: format!("`{}` without a condition", opener.text()),
            }),
        }
    }

    pub(super) fn global(&mut self) -> Result<Option<Global>, ParseError> {
        let keyword = self.stream.get()?;
        if !(keyword.is_line_start() && GLOBAL_KEYWORDS.contains(&keyword.text())) {
            return Ok(None);
        }

        let variable = self.stream.get()?;
        if variable.is_eof() || variable.is_line_start() || variable.is_directive() {
            return Err(ParseError::UnexpectedToken {
                found: variable.text().to_string(),
                line: variable.line(),
                expected: "macro name".to_string(),
            });
        }

        Ok(Some(Global {
            keyword: keyword.clone(),
            variable: variable.clone(),
            value: Expression::new(self.line_value()),
        }))
    }

    pub(super) fn definition(&mut self) -> Result<Option<Definition>, ParseError> {
        let name = self.stream.get()?;
        if !(name.is_line_start() && is_definition_tag(name.text())) {
            return Ok(None);
        }
        Ok(Some(Definition {
            name: name.clone(),
            value: Expression::new(self.line_value()),
        }))
    }

    pub(super) fn macro_line(&mut self) -> Result<Option<MacroLine>, ParseError> {
        let directive = self.stream.get()?;
        if !(directive.is_line_start()
            && directive.is_directive()
            && !is_reserved_directive(directive.text()))
        {
            return Ok(None);
        }
        Ok(Some(MacroLine {
            directive: directive.clone(),
            args: Expression::new(self.line_value()),
        }))
    }

    pub(super) fn eof(&mut self) -> Result<Option<Eof>, ParseError> {
        let token = self.stream.get()?;
        if !token.is_eof() {
            return Ok(None);
        }
        Ok(Some(Eof {
            token: token.clone(),
        }))
    }
}
