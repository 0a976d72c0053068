use std::fmt::{Display, Formatter};

/// What the next unread byte announces
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub(super) enum Token {
    List,
    Dict,
    String,
    Int,
    End,
}

impl Token {
    pub(super) fn from_lead_byte(byte: u8) -> Option<Self> {
        match byte {
            b'l' => Some(Token::List),
            b'd' => Some(Token::Dict),
            b'i' => Some(Token::Int),
            b'e' => Some(Token::End),
            b'0'..=b'9' => Some(Token::String),
            _ => None,
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::List => write!(f, "List"),
            Token::Dict => write!(f, "Dict"),
            Token::String => write!(f, "String"),
            Token::Int => write!(f, "Int"),
            Token::End => write!(f, "End"),
        }
    }
}
