use std::collections::HashMap;

use crate::{
    ast::{
        ast::{StructDecl, UntypedBlock, UntypedFunction, UntypedInstruction, UntypedValue},
        expressions::ValueKind,
        statements::InstructionKind,
    },
    errors::errors::Error,
    lexer::tokens::TokenKind,
    parser::{expr::parse_expr, lookups::BindingPower},
};

use super::{parser::Parser, types::parse_type};

pub fn parse_stmt(parser: &mut Parser) -> Result<UntypedInstruction, Error> {
    let kind = parser.current_token_kind();
    if let Some(handler) = parser.get_stmt_lookup().get(&kind).copied() {
        return handler(parser);
    }

    if kind == TokenKind::Identifier && is_declaration(parser) {
        return parse_decl_stmt(parser);
    }

    parse_assign_or_call_stmt(parser)
}

/// A statement starting with a type followed by a name is a declaration.
///
/// Looks past `[N]` and `&` suffixes without consuming anything.
fn is_declaration(parser: &Parser) -> bool {
    let mut offset = 1;

    loop {
        match parser.peek(offset).kind {
            TokenKind::OpenBracket
                if parser.peek(offset + 1).kind == TokenKind::Number
                    && parser.peek(offset + 2).kind == TokenKind::CloseBracket =>
            {
                offset += 3
            }
            TokenKind::Ampersand => offset += 1,
            kind => return kind == TokenKind::Identifier,
        }
    }
}

/// `Type a, b, c;`
pub fn parse_decl_stmt(parser: &mut Parser) -> Result<UntypedInstruction, Error> {
    let start = parser.get_position();
    let declared = parse_type(parser, BindingPower::Default)?;
    let ty = parser.types().as_lvalue(&declared);

    let mut variables = vec![];
    loop {
        let error = parser.unexpected("expected identifier during variable declaration");
        let token = parser.expect_error(TokenKind::Identifier, Some(error))?;

        variables.push(UntypedValue::new(
            ValueKind::Variable { name: token.value },
            Some(ty.clone()),
            token.span,
        ));

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        } else {
            break;
        }
    }

    parser.expect(TokenKind::Semicolon)?;

    Ok(UntypedInstruction::new(
        InstructionKind::Decl { variables },
        None,
        parser.span_from(start),
    ))
}

/// `lhs = expr;` or `name(args);`
pub fn parse_assign_or_call_stmt(parser: &mut Parser) -> Result<UntypedInstruction, Error> {
    let start = parser.get_position();
    let expr = parse_expr(parser, BindingPower::Default)?;

    let kind = if parser.current_token_kind() == TokenKind::Assignment {
        parser.advance();
        let src = parse_expr(parser, BindingPower::Default)?;
        InstructionKind::Assign { dst: expr, src }
    } else if expr.is_call() {
        InstructionKind::ExprStmt { call: expr }
    } else {
        return Err(parser.unexpected("expected an assignment or a function call"));
    };

    parser.expect(TokenKind::Semicolon)?;

    Ok(UntypedInstruction::new(kind, None, parser.span_from(start)))
}

pub fn parse_return_stmt(parser: &mut Parser) -> Result<UntypedInstruction, Error> {
    let start = parser.advance().span.start.clone();

    let value = if parser.current_token_kind() != TokenKind::Semicolon {
        Some(parse_expr(parser, BindingPower::Default)?)
    } else {
        None
    };

    parser.expect(TokenKind::Semicolon)?;

    Ok(UntypedInstruction::new(
        InstructionKind::Return { value },
        None,
        parser.span_from(start),
    ))
}

fn parse_condition(parser: &mut Parser) -> Result<UntypedValue, Error> {
    parser.expect(TokenKind::OpenParen)?;
    let condition = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseParen)?;
    Ok(condition)
}

pub fn parse_while_stmt(parser: &mut Parser) -> Result<UntypedInstruction, Error> {
    let start = parser.advance().span.start.clone();

    let condition = parse_condition(parser)?;
    let body = parse_block_stmt(parser)?;

    Ok(UntypedInstruction::new(
        InstructionKind::While {
            condition,
            body: Box::new(body),
        },
        None,
        parser.span_from(start),
    ))
}

pub fn parse_if_stmt(parser: &mut Parser) -> Result<UntypedInstruction, Error> {
    let start = parser.advance().span.start.clone();

    let condition = parse_condition(parser)?;
    let then_body = parse_block_stmt(parser)?;

    Ok(UntypedInstruction::new(
        InstructionKind::If {
            condition,
            then_body: Box::new(then_body),
        },
        None,
        parser.span_from(start),
    ))
}

pub fn parse_break_stmt(parser: &mut Parser) -> Result<UntypedInstruction, Error> {
    let start = parser.advance().span.start.clone();
    parser.expect(TokenKind::Semicolon)?;

    Ok(UntypedInstruction::new(
        InstructionKind::Break,
        None,
        parser.span_from(start),
    ))
}

pub fn parse_continue_stmt(parser: &mut Parser) -> Result<UntypedInstruction, Error> {
    let start = parser.advance().span.start.clone();
    parser.expect(TokenKind::Semicolon)?;

    Ok(UntypedInstruction::new(
        InstructionKind::Continue,
        None,
        parser.span_from(start),
    ))
}

fn parse_block(parser: &mut Parser) -> Result<UntypedBlock, Error> {
    let start = parser.expect(TokenKind::OpenCurly)?.span.start;

    let mut instructions = Vec::new();
    while parser.current_token_kind() != TokenKind::CloseCurly {
        if !parser.has_tokens() {
            return Err(parser.unexpected("expected `}` before end of file"));
        }
        instructions.push(parse_stmt(parser)?);
    }

    parser.expect(TokenKind::CloseCurly)?;

    Ok(UntypedBlock {
        instructions,
        span: parser.span_from(start),
    })
}

pub fn parse_block_stmt(parser: &mut Parser) -> Result<UntypedInstruction, Error> {
    let block = parse_block(parser)?;
    let span = block.span.clone();

    Ok(UntypedInstruction::new(InstructionKind::Block(block), None, span))
}

/// `Type name(Type a, Type b) { ... }`
pub fn parse_function_decl(parser: &mut Parser) -> Result<UntypedFunction, Error> {
    let start = parser.get_position();
    let return_type = parse_type(parser, BindingPower::Default)?;

    let error = parser.unexpected("expected function name");
    let name = parser.expect_error(TokenKind::Identifier, Some(error))?.value;

    parser.expect(TokenKind::OpenParen)?;

    let mut params = Vec::new();
    while parser.current_token_kind() != TokenKind::CloseParen {
        let ty = parse_type(parser, BindingPower::Default)?;
        let error = parser.unexpected("expected parameter name");
        let token = parser.expect_error(TokenKind::Identifier, Some(error))?;

        params.push(UntypedValue::new(
            ValueKind::Variable { name: token.value },
            Some(ty),
            token.span,
        ));

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        } else if parser.current_token_kind() != TokenKind::CloseParen {
            return Err(parser.unexpected("expected `,` or `)` in parameter list"));
        }
    }

    parser.expect(TokenKind::CloseParen)?;

    let body = parse_block(parser)?;

    Ok(UntypedFunction {
        name,
        params,
        body,
        return_type,
        span: parser.span_from(start),
    })
}

/// `struct Name { Type member; ... }` with an optional trailing `;`.
pub fn parse_struct_decl(parser: &mut Parser) -> Result<StructDecl, Error> {
    let start = parser.advance().span.start.clone();

    let name = parser.expect(TokenKind::Identifier)?.value;

    parser.expect(TokenKind::OpenCurly)?;

    let mut member_types = Vec::new();
    let mut member_names = Vec::new();
    let mut member_name_to_index = HashMap::new();

    while parser.current_token_kind() != TokenKind::CloseCurly {
        let ty = parse_type(parser, BindingPower::Default)?;
        let member = parser.expect(TokenKind::Identifier)?.value;
        parser.expect(TokenKind::Semicolon)?;

        member_name_to_index
            .entry(member.clone())
            .or_insert(member_names.len());
        member_types.push(ty);
        member_names.push(member);
    }

    parser.expect(TokenKind::CloseCurly)?;

    if parser.current_token_kind() == TokenKind::Semicolon {
        parser.advance();
    }

    Ok(StructDecl {
        name,
        member_types,
        member_names,
        member_name_to_index,
        span: parser.span_from(start),
    })
}
