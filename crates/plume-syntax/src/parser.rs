//! Recursive descent parser for type expressions and function descriptors.

use smol_str::SmolStr;

use crate::ast::{FunctionDescriptor, MultiplicityExpr, TypeExpr, TypeParameterExpr};
use crate::error::ParseError;
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

/// Parser over a single signature string.
pub struct Parser<'source> {
    lexer: Lexer<'source>,
    current: Token,
}

impl<'source> Parser<'source> {
    /// Create a new parser for the given text.
    pub fn new(source: &'source str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(source);
        let current = Self::next_token(&mut lexer)?;
        Ok(Self { lexer, current })
    }

    fn next_token(lexer: &mut Lexer<'source>) -> Result<Token, ParseError> {
        match lexer.next() {
            Some(token) => token,
            None => {
                let end = lexer.source().len();
                Ok(Token::new(TokenKind::Eof, end..end))
            }
        }
    }

    fn advance(&mut self) -> Result<Token, ParseError> {
        let next = Self::next_token(&mut self.lexer)?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    fn eat(&mut self, kind: &TokenKind) -> Result<bool, ParseError> {
        if self.check(kind) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, ParseError> {
        if self.check(&kind) {
            self.advance()
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found: self.current.kind.clone(),
            span: self.current.span.clone(),
        }
    }

    /// Require that all input has been consumed.
    pub fn finish(&mut self) -> Result<(), ParseError> {
        if self.check(&TokenKind::Eof) {
            Ok(())
        } else {
            Err(self.unexpected("end of input"))
        }
    }

    fn ident(&mut self) -> Result<SmolStr, ParseError> {
        match &self.current.kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance()?;
                Ok(name)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    /// `a::b::C`
    pub fn qualified_name(&mut self) -> Result<SmolStr, ParseError> {
        let mut path = self.ident()?.to_string();
        while self.eat(&TokenKind::ColonColon)? {
            path.push_str("::");
            path.push_str(&self.ident()?);
        }
        Ok(SmolStr::new(path))
    }

    /// A type expression, named or function-typed.
    pub fn type_expr(&mut self) -> Result<TypeExpr, ParseError> {
        if self.eat(&TokenKind::LBrace)? {
            return self.function_type_body();
        }

        let path = self.qualified_name()?;
        let mut type_arguments = Vec::new();
        let mut multiplicity_arguments = Vec::new();

        if self.eat(&TokenKind::Lt)? {
            if !self.check(&TokenKind::Pipe) {
                type_arguments.push(self.type_expr()?);
                while self.eat(&TokenKind::Comma)? {
                    type_arguments.push(self.type_expr()?);
                }
            }
            if self.eat(&TokenKind::Pipe)? {
                multiplicity_arguments.push(self.multiplicity_body()?);
                while self.eat(&TokenKind::Comma)? {
                    multiplicity_arguments.push(self.multiplicity_body()?);
                }
            }
            self.expect(TokenKind::Gt, "'>'")?;
        }

        Ok(TypeExpr::Named {
            path,
            type_arguments,
            multiplicity_arguments,
        })
    }

    fn function_type_body(&mut self) -> Result<TypeExpr, ParseError> {
        let mut parameters = Vec::new();
        if !self.check(&TokenKind::Arrow) {
            loop {
                let ty = self.type_expr()?;
                let mult = self.multiplicity()?;
                parameters.push((ty, mult));
                if !self.eat(&TokenKind::Comma)? {
                    break;
                }
            }
        }
        self.expect(TokenKind::Arrow, "'->'")?;
        let return_type = self.type_expr()?;
        let return_multiplicity = self.multiplicity()?;
        self.expect(TokenKind::RBrace, "'}'")?;

        Ok(TypeExpr::Function {
            parameters,
            return_type: Box::new(return_type),
            return_multiplicity,
        })
    }

    /// A bracketed multiplicity: `[1]`, `[0..1]`, `[*]`, `[2..*]`, `[m]`.
    pub fn multiplicity(&mut self) -> Result<MultiplicityExpr, ParseError> {
        self.expect(TokenKind::LBracket, "'['")?;
        let mult = self.multiplicity_body()?;
        self.expect(TokenKind::RBracket, "']'")?;
        Ok(mult)
    }

    fn multiplicity_body(&mut self) -> Result<MultiplicityExpr, ParseError> {
        let start = self.current.span.start;
        match self.current.kind.clone() {
            TokenKind::Star => {
                self.advance()?;
                Ok(MultiplicityExpr::Concrete {
                    lower: 0,
                    upper: None,
                })
            }
            TokenKind::Ident(name) => {
                self.advance()?;
                Ok(MultiplicityExpr::Parameter(name))
            }
            TokenKind::Int(lower) => {
                self.advance()?;
                if !self.eat(&TokenKind::DotDot)? {
                    return Ok(MultiplicityExpr::Concrete {
                        lower,
                        upper: Some(lower),
                    });
                }
                match self.current.kind.clone() {
                    TokenKind::Star => {
                        self.advance()?;
                        Ok(MultiplicityExpr::Concrete { lower, upper: None })
                    }
                    TokenKind::Int(upper) => {
                        let end = self.advance()?.span.end;
                        if lower > upper {
                            return Err(ParseError::InvalidMultiplicity {
                                lower,
                                upper,
                                span: start..end,
                            });
                        }
                        Ok(MultiplicityExpr::Concrete {
                            lower,
                            upper: Some(upper),
                        })
                    }
                    _ => Err(self.unexpected("upper bound")),
                }
            }
            _ => Err(self.unexpected("multiplicity")),
        }
    }

    /// `T` or `-T`
    pub fn type_parameter(&mut self) -> Result<TypeParameterExpr, ParseError> {
        let contravariant = self.eat(&TokenKind::Minus)?;
        let name = self.ident()?;
        Ok(TypeParameterExpr {
            name,
            contravariant,
        })
    }

    /// `pkg::func(Type[mult], ...):Type[mult]` with simple type names only.
    pub fn function_descriptor(&mut self) -> Result<FunctionDescriptor, ParseError> {
        let path = self.qualified_name()?;
        self.expect(TokenKind::LParen, "'('")?;

        let mut parameters = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                let ty = self.ident()?;
                let mult = self.multiplicity()?;
                parameters.push((ty, mult));
                if !self.eat(&TokenKind::Comma)? {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')'")?;
        self.expect(TokenKind::Colon, "':'")?;
        let return_type = self.ident()?;
        let return_multiplicity = self.multiplicity()?;

        Ok(FunctionDescriptor {
            path,
            parameters,
            return_type,
            return_multiplicity,
        })
    }
}

/// Parse a complete type expression.
pub fn parse_type(source: &str) -> Result<TypeExpr, ParseError> {
    let mut parser = Parser::new(source)?;
    let ty = parser.type_expr()?;
    parser.finish()?;
    Ok(ty)
}

/// Parse a type followed by its multiplicity, e.g. `String[1]`.
pub fn parse_typed_value(source: &str) -> Result<(TypeExpr, MultiplicityExpr), ParseError> {
    let mut parser = Parser::new(source)?;
    let ty = parser.type_expr()?;
    let mult = parser.multiplicity()?;
    parser.finish()?;
    Ok((ty, mult))
}

/// Parse a multiplicity, with or without its brackets.
pub fn parse_multiplicity(source: &str) -> Result<MultiplicityExpr, ParseError> {
    let mut parser = Parser::new(source)?;
    let mult = if parser.check(&TokenKind::LBracket) {
        parser.multiplicity()?
    } else {
        parser.multiplicity_body()?
    };
    parser.finish()?;
    Ok(mult)
}

/// Parse a type parameter declaration.
pub fn parse_type_parameter(source: &str) -> Result<TypeParameterExpr, ParseError> {
    let mut parser = Parser::new(source)?;
    let param = parser.type_parameter()?;
    parser.finish()?;
    Ok(param)
}

/// Parse a function descriptor such as `pkg::func(String[1]):Boolean[1]`.
pub fn parse_function_descriptor(source: &str) -> Result<FunctionDescriptor, ParseError> {
    let parse = || -> Result<FunctionDescriptor, ParseError> {
        let mut parser = Parser::new(source)?;
        let descriptor = parser.function_descriptor()?;
        parser.finish()?;
        Ok(descriptor)
    };
    parse().map_err(|cause| ParseError::InvalidFunctionDescriptor {
        descriptor: source.to_string(),
        cause: Box::new(cause),
    })
}

/// Check whether a string is a well-formed function descriptor.
pub fn is_valid_function_descriptor(source: &str) -> bool {
    parse_function_descriptor(source).is_ok()
}

/// Convert a function descriptor to the qualified id of the function it names.
pub fn descriptor_to_id(source: &str) -> Result<String, ParseError> {
    parse_function_descriptor(source).map(|descriptor| descriptor.qualified_id())
}
