use std::collections::HashMap;

use crate::{
    ast::ast::{UntypedInstruction, UntypedValue},
    errors::errors::Error,
    lexer::tokens::TokenKind,
};

use super::{expr::*, parser::Parser, stmt::*};

/// Operator binding powers, weakest first.
///
/// Every binary operator shares `Binary`: expressions are a flat,
/// left-associative chain.
#[derive(PartialEq, PartialOrd, Clone, Copy, Debug)]
pub enum BindingPower {
    Default,
    Binary,
    Call,
    Member,
    Primary,
}

pub type StmtHandler = fn(&mut Parser) -> Result<UntypedInstruction, Error>;
pub type NUDHandler = fn(&mut Parser) -> Result<UntypedValue, Error>;
pub type LEDHandler = fn(&mut Parser, UntypedValue, BindingPower) -> Result<UntypedValue, Error>;

pub fn create_token_lookups(parser: &mut Parser) {
    for kind in [
        TokenKind::Plus,
        TokenKind::Dash,
        TokenKind::Star,
        TokenKind::Ampersand,
        TokenKind::ShiftLeft,
        TokenKind::ShiftRight,
        TokenKind::Less,
        TokenKind::Greater,
        TokenKind::LessEquals,
        TokenKind::GreaterEquals,
        TokenKind::Equals,
    ] {
        parser.led(kind, BindingPower::Binary, parse_binary_expr);
    }

    parser.led(TokenKind::OpenParen, BindingPower::Call, parse_call_expr);
    parser.led(TokenKind::OpenBracket, BindingPower::Call, parse_index_expr);

    // Member
    parser.led(TokenKind::Dot, BindingPower::Member, parse_member_expr);

    // Literals and symbols
    parser.nud(TokenKind::Number, parse_primary_expr);
    parser.nud(TokenKind::Identifier, parse_primary_expr);
    parser.nud(TokenKind::OpenParen, parse_grouping_expr);
    parser.nud(TokenKind::OpenBracket, parse_array_alloc_expr);

    // Statements
    parser.stmt(TokenKind::Return, parse_return_stmt);
    parser.stmt(TokenKind::While, parse_while_stmt);
    parser.stmt(TokenKind::If, parse_if_stmt);
    parser.stmt(TokenKind::Break, parse_break_stmt);
    parser.stmt(TokenKind::Continue, parse_continue_stmt);
    parser.stmt(TokenKind::OpenCurly, parse_block_stmt);
}

// Lookup tables inside parser struct, so it's easier
pub type StmtLookup = HashMap<TokenKind, StmtHandler>;
pub type NUDLookup = HashMap<TokenKind, NUDHandler>;
pub type LEDLookup = HashMap<TokenKind, LEDHandler>;
pub type BPLookup = HashMap<TokenKind, BindingPower>;
