use crate::{
    ast::{
        ast::{UntypedValue, UntypedValueKind},
        expressions::{BinaryOperator, ValueKind},
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
    Span,
};

use super::{lookups::BindingPower, parser::Parser};

pub fn parse_expr(parser: &mut Parser, bp: BindingPower) -> Result<UntypedValue, Error> {
    // First parse NUD
    let token_kind = parser.current_token_kind();
    let Some(nud) = parser.get_nud_lookup().get(&token_kind).copied() else {
        return Err(Error::new(
            ErrorImpl::UnexpectedToken {
                token: parser.current_token().value.clone(),
            },
            parser.get_position(),
        ));
    };

    let mut left = nud(parser)?;

    // While LED and current BP is less than BP of current token, continue parsing lhs
    loop {
        let token_kind = parser.current_token_kind();
        let next_bp = *parser
            .get_bp_lookup()
            .get(&token_kind)
            .unwrap_or(&BindingPower::Default);

        if next_bp <= bp {
            break;
        }

        let Some(led) = parser.get_led_lookup().get(&token_kind).copied() else {
            return Err(Error::new(
                ErrorImpl::UnexpectedToken {
                    token: parser.current_token().value.clone(),
                },
                parser.get_position(),
            ));
        };

        left = led(parser, left, next_bp)?;
    }

    Ok(left)
}

fn untyped(kind: UntypedValueKind, span: Span) -> UntypedValue {
    UntypedValue::new(kind, None, span)
}

pub fn parse_primary_expr(parser: &mut Parser) -> Result<UntypedValue, Error> {
    match parser.current_token_kind() {
        TokenKind::Number => {
            let Ok(value) = parser.current_token().value.parse::<i64>() else {
                return Err(Error::new(
                    ErrorImpl::NumberParseError {
                        token: parser.current_token().value.clone(),
                    },
                    parser.get_position(),
                ));
            };

            let literal_type = parser.types().literal_type();
            let span = parser.advance().span.clone();
            Ok(UntypedValue::new(
                ValueKind::IntegerLiteral { value },
                Some(literal_type),
                span,
            ))
        }
        TokenKind::Identifier => {
            let token = parser.advance().clone();
            Ok(untyped(ValueKind::Variable { name: token.value }, token.span))
        }
        _ => Err(Error::new(
            ErrorImpl::UnexpectedToken {
                token: parser.current_token().value.clone(),
            },
            parser.get_position(),
        )),
    }
}

pub fn parse_binary_expr(
    parser: &mut Parser,
    left: UntypedValue,
    bp: BindingPower,
) -> Result<UntypedValue, Error> {
    let operator_token = parser.advance().clone();
    let Some(operator) = BinaryOperator::from_token(operator_token.kind) else {
        return Err(Error::new(
            ErrorImpl::UnexpectedToken {
                token: operator_token.value,
            },
            operator_token.span.start,
        ));
    };

    let right = parse_expr(parser, bp)?;

    let span = Span {
        start: left.span.start.clone(),
        end: right.span.end.clone(),
    };

    Ok(untyped(
        ValueKind::BinaryOp {
            operator,
            lhs: Box::new(left),
            rhs: Box::new(right),
        },
        span,
    ))
}

pub fn parse_grouping_expr(parser: &mut Parser) -> Result<UntypedValue, Error> {
    parser.advance();
    let expr = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseParen)?;

    Ok(expr)
}

/// `[init; length]`
pub fn parse_array_alloc_expr(parser: &mut Parser) -> Result<UntypedValue, Error> {
    let start = parser.advance().span.start.clone();

    let init_value = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::Semicolon)?;
    let length = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseBracket)?;

    Ok(untyped(
        ValueKind::ArrayAlloc {
            length: Box::new(length),
            init_value: Box::new(init_value),
        },
        parser.span_from(start),
    ))
}

pub fn parse_call_expr(
    parser: &mut Parser,
    left: UntypedValue,
    _bp: BindingPower,
) -> Result<UntypedValue, Error> {
    let ValueKind::Variable { name } = left.kind else {
        return Err(parser.unexpected("only named functions can be called"));
    };

    parser.advance();

    let mut arguments = vec![];

    while parser.current_token_kind() != TokenKind::CloseParen {
        arguments.push(parse_expr(parser, BindingPower::Default)?);

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        } else if parser.current_token_kind() != TokenKind::CloseParen {
            return Err(parser.unexpected("expected `,` or `)` in argument list"));
        }
    }

    parser.expect(TokenKind::CloseParen)?;

    let callee = untyped(
        ValueKind::FunctionRef {
            name,
            declared_return_type: None,
        },
        left.span.clone(),
    );

    Ok(untyped(
        ValueKind::Call {
            callee: Box::new(callee),
            arguments,
            declared_arg_types: vec![],
        },
        parser.span_from(left.span.start),
    ))
}

/// `base[index]`. Chained brackets add indices to the same node.
pub fn parse_index_expr(
    parser: &mut Parser,
    left: UntypedValue,
    _bp: BindingPower,
) -> Result<UntypedValue, Error> {
    parser.advance();
    let index = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseBracket)?;

    let start = left.span.start.clone();
    let kind = match left.kind {
        ValueKind::Index { base, mut indices } => {
            indices.push(index);
            ValueKind::Index { base, indices }
        }
        kind => ValueKind::Index {
            base: Box::new(untyped(kind, left.span)),
            indices: vec![index],
        },
    };

    Ok(untyped(kind, parser.span_from(start)))
}

pub fn parse_member_expr(
    parser: &mut Parser,
    left: UntypedValue,
    _bp: BindingPower,
) -> Result<UntypedValue, Error> {
    parser.advance();
    let error = parser.unexpected("expected member name after `.`");
    let member = parser.expect_error(TokenKind::Identifier, Some(error))?.value;

    let start = left.span.start.clone();
    Ok(untyped(
        ValueKind::Member {
            base: Box::new(left),
            member,
        },
        parser.span_from(start),
    ))
}
