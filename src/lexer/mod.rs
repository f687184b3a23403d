use logos::Logos;

/// Tokens for toolpath command text such as `G1 X10 Y-2.5 F8.333`
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\f\r]+")] // Skip whitespace
#[logos(skip r";[^\n]*")] // Trailing remarks
#[logos(error = LexerError)]
pub enum Token {
    /// Letter followed by a number: `G1`, `X-2.5`, `M06`
    #[regex(r"[A-Za-z][+-]?(\d+\.?\d*|\.\d+)", word)]
    Word((char, Option<f64>)),

    /// Parenthesised comment; the whole text becomes the command name
    #[regex(r"\([^)\n]*\)", |lex| lex.slice().to_string())]
    Comment(String),

    #[token("\n")]
    Newline,
}

fn word(lex: &mut logos::Lexer<Token>) -> Option<(char, Option<f64>)> {
    let slice = lex.slice();
    let letter = slice.chars().next()?.to_ascii_uppercase();
    Some((letter, slice[1..].parse::<f64>().ok()))
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LexerError;

impl std::fmt::Display for LexerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unrecognised character")
    }
}

impl std::error::Error for LexerError {}

pub type Spanned = (Result<Token, LexerError>, logos::Span);

/// Lex command text into tokens, keeping lexer errors for the parser to report
pub fn lex(input: &str) -> Vec<Spanned> {
    Token::lexer(input).spanned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        lex(input).into_iter().filter_map(|(t, _)| t.ok()).collect()
    }

    #[test]
    fn test_motion_words() {
        assert_eq!(
            tokens("G1 X10 Y-2.5 F.5"),
            vec![
                Token::Word(('G', Some(1.0))),
                Token::Word(('X', Some(10.0))),
                Token::Word(('Y', Some(-2.5))),
                Token::Word(('F', Some(0.5))),
            ]
        );
    }

    #[test]
    fn test_lowercase_and_leading_zero() {
        assert_eq!(
            tokens("m06 t3"),
            vec![Token::Word(('M', Some(6.0))), Token::Word(('T', Some(3.0)))]
        );
    }

    #[test]
    fn test_comment_and_remark() {
        assert_eq!(
            tokens("(begin pocket) ; ignored\nG0"),
            vec![
                Token::Comment("(begin pocket)".to_string()),
                Token::Newline,
                Token::Word(('G', Some(0.0))),
            ]
        );
    }

    #[test]
    fn test_lexer_error_is_kept() {
        let lexed = lex("G1 X1 #");
        assert!(lexed.iter().any(|(t, _)| t.is_err()));
    }
}
