//! Parser for the schematic text format.

use super::ast::*;
use super::lexer::{parse_value, Lexer, Token, TokenKind};
use crate::circuit::Pin;
use crate::error::{OhmlabError, Result};

/// Parser for schematic text.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    /// Create a new parser with the given lexer.
    pub fn new(mut lexer: Lexer<'a>) -> Result<Self> {
        let current = lexer.next_token()?;
        Ok(Self { lexer, current })
    }

    /// Parse the entire schematic description.
    pub fn parse(&mut self) -> Result<SchematicAst> {
        let mut ast = SchematicAst::new();

        while self.current.kind != TokenKind::Eof {
            match self.current.kind {
                TokenKind::Newline => {
                    self.advance()?;
                    continue;
                }
                TokenKind::Directive => self.parse_directive(&mut ast)?,
                TokenKind::Identifier if self.current.text.eq_ignore_ascii_case("wire") => {
                    let wire = self.parse_wire()?;
                    ast.wires.push(wire);
                }
                TokenKind::Identifier => {
                    let component = self.parse_component(&ast)?;
                    ast.components.push(component);
                }
                _ => {
                    return Err(OhmlabError::parse(
                        self.current.line,
                        format!("unexpected token: {:?}", self.current.text),
                    ));
                }
            }

            self.expect_line_end()?;
        }

        Ok(ast)
    }

    /// Parse a single `component[:pin]` reference and require end of input.
    pub fn parse_pin_ref_only(&mut self) -> Result<PinRef> {
        let pin_ref = self.parse_pin_ref()?;
        if self.current.kind != TokenKind::Eof {
            return Err(OhmlabError::parse(
                self.current.line,
                format!("unexpected trailing input: {:?}", self.current.text),
            ));
        }
        Ok(pin_ref)
    }

    fn advance(&mut self) -> Result<()> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.current.kind == kind {
            let tok = self.current.clone();
            self.advance()?;
            Ok(tok)
        } else {
            Err(OhmlabError::parse(
                self.current.line,
                format!("expected {:?}, got {:?}", kind, self.current.kind),
            ))
        }
    }

    fn expect_line_end(&mut self) -> Result<()> {
        match self.current.kind {
            TokenKind::Newline => self.advance(),
            TokenKind::Eof => Ok(()),
            _ => Err(OhmlabError::parse(
                self.current.line,
                format!("unexpected token at end of line: {:?}", self.current.text),
            )),
        }
    }

    fn at_line_end(&self) -> bool {
        matches!(self.current.kind, TokenKind::Newline | TokenKind::Eof)
    }

    fn parse_directive(&mut self, ast: &mut SchematicAst) -> Result<()> {
        let directive = self.current.text.clone();
        let line = self.current.line;
        self.advance()?;

        match directive.to_lowercase().as_str() {
            ".title" => {
                let mut words = Vec::new();
                while !self.at_line_end() {
                    words.push(self.current.text.clone());
                    self.advance()?;
                }
                ast.title = Some(words.join(" "));
            }
            ".end" => {
                while self.current.kind != TokenKind::Eof {
                    self.advance()?;
                }
            }
            _ => {
                return Err(OhmlabError::parse(
                    line,
                    format!("unknown directive: {}", directive),
                ));
            }
        }

        Ok(())
    }

    fn parse_component(&mut self, ast: &SchematicAst) -> Result<ComponentDef> {
        let keyword = self.current.text.clone();
        let line = self.current.line;
        self.advance()?;

        let component_type = ComponentType::from_keyword(&keyword).ok_or_else(|| {
            OhmlabError::UnknownComponentType {
                component_type: keyword.clone(),
                line,
            }
        })?;

        let name = if self.current.kind == TokenKind::Identifier {
            self.expect(TokenKind::Identifier)?.text
        } else if component_type == ComponentType::Ground && self.at_line_end() {
            // Grounds may be left unnamed
            let count = ast
                .components
                .iter()
                .filter(|c| c.component_type == ComponentType::Ground)
                .count();
            if count == 0 {
                "GND".to_string()
            } else {
                format!("GND{}", count + 1)
            }
        } else {
            return Err(OhmlabError::parse(
                line,
                format!("expected a name after '{}'", keyword),
            ));
        };

        let mut value = None;
        if self.current.kind == TokenKind::Number {
            let text = self.current.text.clone();
            self.advance()?;
            value = Some(parse_value(&text).ok_or_else(|| {
                OhmlabError::invalid_component(&name, line, format!("invalid number: {}", text))
            })?);
        }

        if value.is_none() && component_type.requires_value() {
            return Err(OhmlabError::invalid_component(
                &name,
                line,
                format!("a {} requires a value", keyword),
            ));
        }

        Ok(ComponentDef {
            component_type,
            name,
            value,
            line,
        })
    }

    fn parse_wire(&mut self) -> Result<WireDef> {
        let line = self.current.line;
        self.advance()?;
        let from = self.parse_pin_ref()?;
        let to = self.parse_pin_ref()?;
        Ok(WireDef { from, to, line })
    }

    fn parse_pin_ref(&mut self) -> Result<PinRef> {
        let component = self.expect(TokenKind::Identifier)?.text;
        if self.current.kind != TokenKind::Colon {
            return Ok(PinRef {
                component,
                pin: None,
            });
        }
        self.advance()?;

        let line = self.current.line;
        let text = match self.current.kind {
            TokenKind::Identifier | TokenKind::Number => self.current.text.clone(),
            _ => return Err(OhmlabError::parse(line, "expected a pin after ':'")),
        };
        self.advance()?;

        let pin = Pin::from_text(&text)
            .ok_or_else(|| OhmlabError::parse(line, format!("unknown pin '{}'", text)))?;
        Ok(PinRef {
            component,
            pin: Some(pin),
        })
    }
}
