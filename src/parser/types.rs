//! Type parsing implementation.
//!
//! This module handles parsing of type annotations. It supports:
//!
//! - Named types (`int64`, `void`, struct names)
//! - Array suffixes (`int64[5]`)
//! - A trailing reference suffix (`int64&`, `int64[5]&`)
//!
//! Similar to expression parsing, it uses NUD/LED handlers with binding
//! powers. Each handler resolves its type against the parser's
//! [`TypeTable`](crate::types::type_table::TypeTable) right away.

use std::collections::HashMap;

use crate::{
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
    types::types::TypeRef,
};

use super::{lookups::BindingPower, parser::Parser};

/// Type alias for type null denotation handler functions.
pub type TypeNUDHandler = fn(&mut Parser) -> Result<TypeRef, Error>;

/// Type alias for type left denotation handler functions.
pub type TypeLEDHandler = fn(&mut Parser, TypeRef, BindingPower) -> Result<TypeRef, Error>;

/// Type alias for type NUD lookup table.
pub type TypeNUDLookup = HashMap<TokenKind, TypeNUDHandler>;

/// Type alias for type LED lookup table.
pub type TypeLEDLookup = HashMap<TokenKind, TypeLEDHandler>;

/// Type alias for type binding power lookup table.
pub type TypeBPLookup = HashMap<TokenKind, BindingPower>;

/// Initializes the type parsing lookup tables.
///
/// Registers NUD and LED handlers for parsing type expressions.
///
/// # Arguments
///
/// * `parser` - Mutable reference to the parser to initialize
pub fn create_token_type_lookups(parser: &mut Parser) {
    parser.type_nud(TokenKind::Identifier, parse_symbol_type);
    parser.type_led(TokenKind::OpenBracket, BindingPower::Call, parse_array_type);
    parser.type_led(TokenKind::Ampersand, BindingPower::Call, parse_reference_type);
}

pub fn parse_symbol_type(parser: &mut Parser) -> Result<TypeRef, Error> {
    let token = parser.expect(TokenKind::Identifier)?;
    Ok(parser.types().find_by_name(&token.value))
}

pub fn parse_array_type(
    parser: &mut Parser,
    left: TypeRef,
    _bp: BindingPower,
) -> Result<TypeRef, Error> {
    if left.is_reference() {
        return Err(parser.unexpected("arrays of references are not supported"));
    }

    let position = parser.get_position();
    parser.expect(TokenKind::OpenBracket)?;

    let error = parser.unexpected("expected an integer array size");
    let size = parser.expect_error(TokenKind::Number, Some(error))?;
    let Ok(count) = size.value.parse::<u64>() else {
        return Err(Error::new(
            ErrorImpl::NumberParseError { token: size.value },
            size.span.start,
        ));
    };

    parser.expect(TokenKind::CloseBracket)?;

    parser
        .types()
        .array_of(&left, count)
        .map_err(|error| error.with_position(&position))
}

pub fn parse_reference_type(
    parser: &mut Parser,
    left: TypeRef,
    _bp: BindingPower,
) -> Result<TypeRef, Error> {
    let position = parser.get_position();
    parser.expect(TokenKind::Ampersand)?;

    parser
        .types()
        .as_reference(&left)
        .map_err(|error| error.with_position(&position))
}

pub fn parse_type(parser: &mut Parser, bp: BindingPower) -> Result<TypeRef, Error> {
    // First parse NUD
    let token_kind = parser.current_token_kind();
    let Some(nud) = parser.get_type_nud_lookup().get(&token_kind).copied() else {
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
            .get_type_bp_lookup()
            .get(&token_kind)
            .unwrap_or(&BindingPower::Default);

        if next_bp <= bp {
            break;
        }

        let Some(led) = parser.get_type_led_lookup().get(&token_kind).copied() else {
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
