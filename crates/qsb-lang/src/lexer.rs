//! Lexer for Q# source text.

use logos::Logos;

/// Tokens for the Q# subset.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
pub enum Token {
    // Declarations
    #[token("namespace")]
    Namespace,

    #[token("open")]
    Open,

    #[token("import")]
    Import,

    #[token("export")]
    Export,

    #[token("operation")]
    Operation,

    #[token("function")]
    Function,

    #[token("is")]
    Is,

    #[token("body")]
    Body,

    #[token("adjoint")]
    AdjointSpec,

    #[token("controlled")]
    ControlledSpec,

    // Statements
    #[token("let")]
    Let,

    #[token("mutable")]
    Mutable,

    #[token("set")]
    Set,

    #[token("use")]
    Use,

    #[token("borrow")]
    Borrow,

    #[token("if")]
    If,

    #[token("elif")]
    Elif,

    #[token("else")]
    Else,

    #[token("for")]
    For,

    #[token("in")]
    In,

    #[token("while")]
    While,

    #[token("repeat")]
    Repeat,

    #[token("until")]
    Until,

    #[token("fixup")]
    Fixup,

    #[token("within")]
    Within,

    #[token("apply")]
    Apply,

    #[token("return")]
    Return,

    #[token("fail")]
    Fail,

    // Functors
    #[token("Adjoint")]
    Adjoint,

    #[token("Controlled")]
    Controlled,

    // Word operators
    #[token("not")]
    Not,

    #[token("and")]
    And,

    #[token("or")]
    Or,

    // Constants
    #[token("true")]
    True,

    #[token("false")]
    False,

    #[token("Zero")]
    Zero,

    #[token("One")]
    One,

    #[token("PauliI")]
    PauliI,

    #[token("PauliX")]
    PauliX,

    #[token("PauliY")]
    PauliY,

    #[token("PauliZ")]
    PauliZ,

    // Literals
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    DoubleLiteral(f64),

    #[regex(r"[0-9]+L?", |lex| lex.slice().trim_end_matches('L').parse::<i64>().ok())]
    #[regex(r"0x[0-9a-fA-F]+", |lex| i64::from_str_radix(&lex.slice()[2..], 16).ok())]
    IntLiteral(i64),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| unescape(&lex.slice()[1..lex.slice().len() - 1]))]
    StringLiteral(String),

    #[regex(r#"\$"([^"\\]|\\.)*""#, |lex| unescape(&lex.slice()[2..lex.slice().len() - 1]))]
    InterpolatedString(String),

    // Identifiers
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    // Operators and punctuation
    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("%")]
    Percent,

    #[token("^")]
    Caret,

    #[token("==")]
    EqEq,

    #[token("!=")]
    NotEq,

    #[token("<")]
    Lt,

    #[token("<=")]
    LtEq,

    #[token(">")]
    Gt,

    #[token(">=")]
    GtEq,

    #[token("!")]
    Bang,

    #[token("~~~")]
    BitNot,

    #[token("&&&")]
    BitAnd,

    #[token("|||")]
    BitOr,

    #[token("^^^")]
    BitXor,

    #[token("<<<")]
    LShift,

    #[token(">>>")]
    RShift,

    #[token("=")]
    Eq,

    #[token("+=")]
    PlusEq,

    #[token("-=")]
    MinusEq,

    #[token("*=")]
    StarEq,

    #[token("/=")]
    SlashEq,

    #[token("%=")]
    PercentEq,

    #[token("^=")]
    CaretEq,

    #[token("w/")]
    With,

    #[token("w/=")]
    WithEq,

    #[token("<-")]
    LArrow,

    #[token("->")]
    Arrow,

    #[token("=>")]
    FatArrow,

    #[token("?")]
    Question,

    #[token("|")]
    Pipe,

    #[token("@")]
    At,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token(";")]
    Semicolon,

    #[token(":")]
    Colon,

    #[token("::")]
    ColonColon,

    #[token(",")]
    Comma,

    #[token(".")]
    Dot,

    #[token("..")]
    DotDot,

    #[token("...")]
    Ellipsis,
}

fn unescape(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            other => out.push(other),
        }
    }
    Some(out)
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Namespace => write!(f, "namespace"),
            Token::Open => write!(f, "open"),
            Token::Import => write!(f, "import"),
            Token::Export => write!(f, "export"),
            Token::Operation => write!(f, "operation"),
            Token::Function => write!(f, "function"),
            Token::Is => write!(f, "is"),
            Token::Body => write!(f, "body"),
            Token::AdjointSpec => write!(f, "adjoint"),
            Token::ControlledSpec => write!(f, "controlled"),
            Token::Let => write!(f, "let"),
            Token::Mutable => write!(f, "mutable"),
            Token::Set => write!(f, "set"),
            Token::Use => write!(f, "use"),
            Token::Borrow => write!(f, "borrow"),
            Token::If => write!(f, "if"),
            Token::Elif => write!(f, "elif"),
            Token::Else => write!(f, "else"),
            Token::For => write!(f, "for"),
            Token::In => write!(f, "in"),
            Token::While => write!(f, "while"),
            Token::Repeat => write!(f, "repeat"),
            Token::Until => write!(f, "until"),
            Token::Fixup => write!(f, "fixup"),
            Token::Within => write!(f, "within"),
            Token::Apply => write!(f, "apply"),
            Token::Return => write!(f, "return"),
            Token::Fail => write!(f, "fail"),
            Token::Adjoint => write!(f, "Adjoint"),
            Token::Controlled => write!(f, "Controlled"),
            Token::Not => write!(f, "not"),
            Token::And => write!(f, "and"),
            Token::Or => write!(f, "or"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::Zero => write!(f, "Zero"),
            Token::One => write!(f, "One"),
            Token::PauliI => write!(f, "PauliI"),
            Token::PauliX => write!(f, "PauliX"),
            Token::PauliY => write!(f, "PauliY"),
            Token::PauliZ => write!(f, "PauliZ"),
            Token::DoubleLiteral(v) => write!(f, "{v}"),
            Token::IntLiteral(v) => write!(f, "{v}"),
            Token::StringLiteral(s) => write!(f, "\"{s}\""),
            Token::InterpolatedString(s) => write!(f, "$\"{s}\""),
            Token::Identifier(s) => write!(f, "{s}"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::Caret => write!(f, "^"),
            Token::EqEq => write!(f, "=="),
            Token::NotEq => write!(f, "!="),
            Token::Lt => write!(f, "<"),
            Token::LtEq => write!(f, "<="),
            Token::Gt => write!(f, ">"),
            Token::GtEq => write!(f, ">="),
            Token::Bang => write!(f, "!"),
            Token::BitNot => write!(f, "~~~"),
            Token::BitAnd => write!(f, "&&&"),
            Token::BitOr => write!(f, "|||"),
            Token::BitXor => write!(f, "^^^"),
            Token::LShift => write!(f, "<<<"),
            Token::RShift => write!(f, ">>>"),
            Token::Eq => write!(f, "="),
            Token::PlusEq => write!(f, "+="),
            Token::MinusEq => write!(f, "-="),
            Token::StarEq => write!(f, "*="),
            Token::SlashEq => write!(f, "/="),
            Token::PercentEq => write!(f, "%="),
            Token::CaretEq => write!(f, "^="),
            Token::With => write!(f, "w/"),
            Token::WithEq => write!(f, "w/="),
            Token::LArrow => write!(f, "<-"),
            Token::Arrow => write!(f, "->"),
            Token::FatArrow => write!(f, "=>"),
            Token::Question => write!(f, "?"),
            Token::Pipe => write!(f, "|"),
            Token::At => write!(f, "@"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Semicolon => write!(f, ";"),
            Token::Colon => write!(f, ":"),
            Token::ColonColon => write!(f, "::"),
            Token::Comma => write!(f, ","),
            Token::Dot => write!(f, "."),
            Token::DotDot => write!(f, ".."),
            Token::Ellipsis => write!(f, "..."),
        }
    }
}

/// A token with its span information.
#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub span: std::ops::Range<usize>,
}

/// Tokenize a Q# source string.
pub fn tokenize(source: &str) -> Vec<Result<SpannedToken, (std::ops::Range<usize>, String)>> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        if let Ok(token) = result {
            tokens.push(Ok(SpannedToken { token, span }));
        } else {
            let slice = &source[span.clone()];
            tokens.push(Err((span, format!("Invalid token: '{slice}'"))));
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        tokenize(source)
            .into_iter()
            .map(|t| t.unwrap().token)
            .collect()
    }

    #[test]
    fn test_operation_header() {
        let toks = tokens("operation Main() : Unit {}");
        assert_eq!(
            toks,
            vec![
                Token::Operation,
                Token::Identifier("Main".into()),
                Token::LParen,
                Token::RParen,
                Token::Colon,
                Token::Identifier("Unit".into()),
                Token::LBrace,
                Token::RBrace,
            ]
        );
    }

    #[test]
    fn test_range_is_not_a_double() {
        let toks = tokens("0..2..10");
        assert_eq!(
            toks,
            vec![
                Token::IntLiteral(0),
                Token::DotDot,
                Token::IntLiteral(2),
                Token::DotDot,
                Token::IntLiteral(10),
            ]
        );
    }

    #[test]
    fn test_literals() {
        let toks = tokens(r#"1.5 2e3 42 0xff 7L "a\"b" $"r = {r}""#);
        assert_eq!(toks[0], Token::DoubleLiteral(1.5));
        assert_eq!(toks[1], Token::DoubleLiteral(2000.0));
        assert_eq!(toks[2], Token::IntLiteral(42));
        assert_eq!(toks[3], Token::IntLiteral(255));
        assert_eq!(toks[4], Token::IntLiteral(7));
        assert_eq!(toks[5], Token::StringLiteral("a\"b".into()));
        assert_eq!(toks[6], Token::InterpolatedString("r = {r}".into()));
    }

    #[test]
    fn test_bitwise_operators() {
        let toks = tokens("a ||| b &&& ~~~c <<< 1 >>> 2 ^^^ d");
        assert!(toks.contains(&Token::BitOr));
        assert!(toks.contains(&Token::BitAnd));
        assert!(toks.contains(&Token::BitNot));
        assert!(toks.contains(&Token::LShift));
        assert!(toks.contains(&Token::RShift));
        assert!(toks.contains(&Token::BitXor));
    }

    #[test]
    fn test_keywords_and_comments() {
        let toks = tokens("// comment\nuse q = Qubit(); // trailing\nAdjoint S(q);");
        assert_eq!(toks[0], Token::Use);
        assert_eq!(toks[1], Token::Identifier("q".into()));
        assert!(toks.contains(&Token::Adjoint));
    }

    #[test]
    fn test_invalid_token() {
        let results = tokenize("let x = #;");
        assert!(results.iter().any(Result::is_err));
    }
}
