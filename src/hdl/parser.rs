//! Recursive-descent parser over [`Lexer`] tokens, producing [`ChipDef`]s
//! per the EBNF in spec.md §4.3. Grounded on `original_source/hdl/parser.go`
//! for the grammar shape (`parseInputDefinition`, `parseList`,
//! `parseStatementBlock`, `parseExpression`).

use super::ast::{ChipDef, Expression, Statement};
use super::lexer::{Lexer, Token, TokenKind};
use crate::error::HdlError;
use std::collections::HashMap;

pub struct Parser<'a> {
    lexer: Lexer<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            lexer: Lexer::new(source),
        }
    }

    /// Parses every `chip` statement in the unit, skipping `use` statements
    /// (already resolved transitively by the caller before parsing bodies).
    pub fn parse_unit(&mut self) -> Result<Vec<ChipDef>, HdlError> {
        let mut chips = Vec::new();
        loop {
            let tok = self.lexer.peek()?;
            match tok.kind {
                TokenKind::Eof => break,
                TokenKind::Use => {
                    self.parse_use()?;
                }
                TokenKind::Chip => chips.push(self.parse_chip()?),
                _ => return Err(HdlError::ParseError(tok.literal)),
            }
        }
        Ok(chips)
    }

    /// Returns the `use`d paths without consuming chip definitions. Used by
    /// the caller to resolve transitive file dependencies before a full
    /// parse.
    pub fn scan_uses(source: &str) -> Result<Vec<String>, HdlError> {
        let mut parser = Parser::new(source);
        let mut uses = Vec::new();
        loop {
            let tok = parser.lexer.peek()?;
            match tok.kind {
                TokenKind::Eof => break,
                TokenKind::Use => uses.push(parser.parse_use()?),
                TokenKind::Chip => {
                    parser.parse_chip()?;
                }
                _ => return Err(HdlError::ParseError(tok.literal)),
            }
        }
        Ok(uses)
    }

    fn parse_use(&mut self) -> Result<String, HdlError> {
        self.expect(TokenKind::Use)?;
        let path = self.expect(TokenKind::String)?;
        Ok(path.literal)
    }

    fn parse_chip(&mut self) -> Result<ChipDef, HdlError> {
        self.expect(TokenKind::Chip)?;
        let name = self.expect(TokenKind::Identifier)?.literal;
        let inputs = self.parse_input_list()?;
        self.expect(TokenKind::Arrow)?;
        let outputs = self.parse_output_list()?;
        let body = self.parse_block()?;
        Ok(ChipDef {
            name,
            inputs,
            outputs,
            body,
        })
    }

    fn parse_input_list(&mut self) -> Result<HashMap<String, u16>, HdlError> {
        let mut inputs = HashMap::new();
        self.parse_list(|p| {
            let name = p.expect(TokenKind::Identifier)?.literal;
            p.expect(TokenKind::Colon)?;
            let width = p.expect(TokenKind::Integer)?.literal;
            let width: u16 = width
                .parse()
                .map_err(|_| HdlError::ParseError(width.clone()))?;
            inputs.insert(name, width);
            Ok(())
        })?;
        Ok(inputs)
    }

    fn parse_output_list(&mut self) -> Result<Vec<u16>, HdlError> {
        let mut outputs = Vec::new();
        self.parse_list(|p| {
            let width = p.expect(TokenKind::Integer)?.literal;
            let width: u16 = width
                .parse()
                .map_err(|_| HdlError::ParseError(width.clone()))?;
            outputs.push(width);
            Ok(())
        })?;
        Ok(outputs)
    }

    /// Parses a parenthesized, comma-separated list using `item` to consume
    /// each element.
    fn parse_list(
        &mut self,
        mut item: impl FnMut(&mut Self) -> Result<(), HdlError>,
    ) -> Result<(), HdlError> {
        self.expect(TokenKind::LeftParen)?;
        let mut tok = self.lexer.peek()?;
        while tok.kind != TokenKind::RightParen {
            item(self)?;
            tok = self.lexer.peek()?;
            if tok.kind == TokenKind::Comma {
                self.lexer.next()?;
                tok = self.lexer.peek()?;
            }
        }
        self.expect(TokenKind::RightParen)?;
        Ok(())
    }

    fn parse_block(&mut self) -> Result<Vec<Statement>, HdlError> {
        self.expect(TokenKind::LeftCurly)?;
        let mut statements = Vec::new();
        let mut tok = self.lexer.peek()?;
        while tok.kind != TokenKind::RightCurly {
            statements.push(self.parse_statement()?);
            tok = self.lexer.peek()?;
        }
        self.expect(TokenKind::RightCurly)?;
        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<Statement, HdlError> {
        let tok = self.lexer.next()?;
        match tok.kind {
            TokenKind::Out => {
                let expr = self.parse_expression()?;
                Ok(Statement::Out(expr))
            }
            TokenKind::Set => {
                let mut names = vec![self.expect(TokenKind::Identifier)?.literal];
                loop {
                    let next = self.lexer.peek()?;
                    if next.kind != TokenKind::Comma {
                        break;
                    }
                    self.lexer.next()?;
                    names.push(self.expect(TokenKind::Identifier)?.literal);
                }
                self.expect(TokenKind::Equals)?;
                let expr = self.parse_expression()?;
                Ok(Statement::Set(names, expr))
            }
            TokenKind::Use => {
                let path = self.expect(TokenKind::String)?;
                Ok(Statement::Use(path.literal))
            }
            _ => Err(HdlError::ParseError(tok.literal)),
        }
    }

    fn parse_expression(&mut self) -> Result<Expression, HdlError> {
        let tok = self.lexer.next()?;
        match tok.kind {
            TokenKind::Integer => {
                let n: i64 = tok
                    .literal
                    .parse()
                    .map_err(|_| HdlError::ParseError(tok.literal.clone()))?;
                Ok(Expression::Integer(n))
            }
            TokenKind::LeftBracket => self.parse_array(),
            TokenKind::Identifier => {
                let next = self.lexer.peek()?;
                match next.kind {
                    TokenKind::Dot => self.parse_indexed(tok.literal),
                    TokenKind::LeftParen => self.parse_call(tok.literal),
                    _ => Ok(Expression::Identifier(tok.literal)),
                }
            }
            _ => Err(HdlError::ParseError(tok.literal)),
        }
    }

    fn parse_indexed(&mut self, ident: String) -> Result<Expression, HdlError> {
        self.expect(TokenKind::Dot)?;
        let idx = self.expect(TokenKind::Integer)?;
        let idx: usize = idx
            .literal
            .parse()
            .map_err(|_| HdlError::ParseError(idx.literal.clone()))?;
        Ok(Expression::Indexed(ident, idx))
    }

    fn parse_call(&mut self, name: String) -> Result<Expression, HdlError> {
        let mut args = Vec::new();
        self.parse_list(|p| {
            let arg_name = p.expect(TokenKind::Identifier)?.literal;
            p.expect(TokenKind::Colon)?;
            let expr = p.parse_expression()?;
            args.push((arg_name, expr));
            Ok(())
        })?;
        Ok(Expression::Call(name, args))
    }

    fn parse_array(&mut self) -> Result<Expression, HdlError> {
        let mut values = Vec::new();
        let mut tok = self.lexer.peek()?;
        while tok.kind != TokenKind::RightBracket {
            values.push(self.parse_expression()?);
            tok = self.lexer.peek()?;
            if tok.kind == TokenKind::Comma {
                self.lexer.next()?;
                tok = self.lexer.peek()?;
            }
        }
        self.expect(TokenKind::RightBracket)?;
        Ok(Expression::Array(values))
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, HdlError> {
        let tok = self.lexer.next()?;
        if tok.kind != kind {
            return Err(HdlError::ParseError(tok.literal));
        }
        Ok(tok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_chip() {
        let src = "chip and (in: 2) -> (1) { out nand(in: nand(in: in)) }";
        let chips = Parser::new(src).parse_unit().unwrap();
        assert_eq!(chips.len(), 1);
        let chip = &chips[0];
        assert_eq!(chip.name, "and");
        assert_eq!(chip.inputs.get("in"), Some(&2));
        assert_eq!(chip.outputs, vec![1]);
        assert_eq!(chip.body.len(), 1);
    }

    #[test]
    fn parses_mux_2_with_nested_calls() {
        let src = r#"
            chip mux_2 (s: 1, a: 16, b: 16) -> (16) {
              out or_16(a: and_16_to_1(a: a, b: not(in: s)),
                        b: and_16_to_1(a: b, b: s))
            }
        "#;
        let chips = Parser::new(src).parse_unit().unwrap();
        assert_eq!(chips[0].name, "mux_2");
        match &chips[0].body[0] {
            Statement::Out(Expression::Call(name, args)) => {
                assert_eq!(name, "or_16");
                assert_eq!(args.len(), 2);
            }
            other => panic!("unexpected statement: {other:?}"),
        }
    }

    #[test]
    fn parses_indexed_and_array_expressions() {
        let src = "chip pick (a: 4) -> (2) { out [a.0, a.1] }";
        let chips = Parser::new(src).parse_unit().unwrap();
        match &chips[0].body[0] {
            Statement::Out(Expression::Array(items)) => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[0], Expression::Indexed("a".to_string(), 0));
                assert_eq!(items[1], Expression::Indexed("a".to_string(), 1));
            }
            other => panic!("unexpected statement: {other:?}"),
        }
    }

    #[test]
    fn parses_set_statement_with_multiple_identifiers() {
        let src = "chip pair () -> () { set x, y = feedback() }";
        let chips = Parser::new(src).parse_unit().unwrap();
        match &chips[0].body[0] {
            Statement::Set(names, Expression::Call(name, _)) => {
                assert_eq!(names, &vec!["x".to_string(), "y".to_string()]);
                assert_eq!(name, "feedback");
            }
            other => panic!("unexpected statement: {other:?}"),
        }
    }

    #[test]
    fn rejects_unterminated_block() {
        let src = "chip broken (a: 1) -> (1) { out a";
        let err = Parser::new(src).parse_unit().unwrap_err();
        assert!(matches!(err, HdlError::ParseError(_)));
    }

    #[test]
    fn scan_uses_collects_use_paths_without_failing_on_bodies() {
        let src = r#"use "gates.hdl"
            chip and (in: 2) -> (1) { out nand(in: nand(in: in)) }"#;
        let uses = Parser::scan_uses(src).unwrap();
        assert_eq!(uses, vec!["gates.hdl".to_string()]);
    }
}
