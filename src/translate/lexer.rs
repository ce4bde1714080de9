//! Tokenizer for the closed statement grammar.

/// A lexical token. Keywords are not distinguished from identifiers here;
/// the parser compares words case-insensitively.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    /// Bare word: keyword or identifier.
    Word(String),
    /// `"quoted"` identifier.
    QuotedIdent(String),
    /// `'text'` literal, `''` unescaped.
    Str(String),
    /// Numeric literal as written.
    Number(String),
    /// `?`
    Placeholder,
    Star,
    Comma,
    LParen,
    RParen,
    Semicolon,
    /// `=`, `==`, `!=`, `<>`, `<`, `<=`, `>`, `>=`
    Operator(&'static str),
    /// Anything else, including unterminated quotes.
    Unknown(char),
}

impl Token {
    pub(crate) fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Token::Word(w) if w.eq_ignore_ascii_case(keyword))
    }
}

/// Converts statement text into tokens.
pub(crate) struct Lexer<'a> {
    src: &'a [u8],
    text: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Self {
            src: text.as_bytes(),
            text,
            pos: 0,
        }
    }

    /// Tokenize the entire input.
    pub(crate) fn tokenize(text: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(text);
        let mut tokens = Vec::new();
        while let Some(token) = lexer.next_token() {
            tokens.push(token);
        }
        tokens
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    fn next_token(&mut self) -> Option<Token> {
        while self.peek_at(0).is_some_and(|c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
        let ch = self.peek_at(0)?;

        let token = match ch {
            b'\'' => self.lex_quoted(b'\'').map(Token::Str),
            b'"' => self.lex_quoted(b'"').map(Token::QuotedIdent),
            b'?' => self.single(Token::Placeholder),
            b'*' => self.single(Token::Star),
            b',' => self.single(Token::Comma),
            b'(' => self.single(Token::LParen),
            b')' => self.single(Token::RParen),
            b';' => self.single(Token::Semicolon),
            b'=' if self.peek_at(1) == Some(b'=') => self.operator("==", 2),
            b'=' => self.operator("=", 1),
            b'!' if self.peek_at(1) == Some(b'=') => self.operator("!=", 2),
            b'<' if self.peek_at(1) == Some(b'>') => self.operator("<>", 2),
            b'<' if self.peek_at(1) == Some(b'=') => self.operator("<=", 2),
            b'<' => self.operator("<", 1),
            b'>' if self.peek_at(1) == Some(b'=') => self.operator(">=", 2),
            b'>' => self.operator(">", 1),
            b'0'..=b'9' => Some(self.lex_number()),
            b'-' | b'.' if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => {
                Some(self.lex_number())
            }
            c if c.is_ascii_alphabetic() || c == b'_' => Some(self.lex_word()),
            _ => None,
        };

        Some(token.unwrap_or_else(|| {
            // Unknown byte or unterminated quote: swallow one char
            let c = self.text[self.pos..].chars().next().unwrap_or('\u{fffd}');
            self.pos += c.len_utf8().max(1);
            Token::Unknown(c)
        }))
    }

    fn single(&mut self, token: Token) -> Option<Token> {
        self.pos += 1;
        Some(token)
    }

    fn operator(&mut self, op: &'static str, len: usize) -> Option<Token> {
        self.pos += len;
        Some(Token::Operator(op))
    }

    fn lex_word(&mut self) -> Token {
        let start = self.pos;
        while self
            .peek_at(0)
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_')
        {
            self.pos += 1;
        }
        Token::Word(self.text[start..self.pos].to_string())
    }

    fn lex_number(&mut self) -> Token {
        let start = self.pos;
        if self.peek_at(0) == Some(b'-') {
            self.pos += 1;
        }
        let mut seen_dot = false;
        while let Some(c) = self.peek_at(0) {
            match c {
                b'0'..=b'9' => self.pos += 1,
                b'.' if !seen_dot => {
                    seen_dot = true;
                    self.pos += 1;
                }
                _ => break,
            }
        }
        Token::Number(self.text[start..self.pos].to_string())
    }

    /// Reads a quoted run; a doubled quote stands for one quote character.
    /// Returns `None` (without consuming) when the quote is never closed.
    fn lex_quoted(&mut self, quote: u8) -> Option<String> {
        let mut out = Vec::new();
        let mut i = self.pos + 1;
        while i < self.src.len() {
            if self.src[i] == quote {
                if self.src.get(i + 1) == Some(&quote) {
                    out.push(quote);
                    i += 2;
                    continue;
                }
                self.pos = i + 1;
                return Some(String::from_utf8_lossy(&out).into_owned());
            }
            out.push(self.src[i]);
            i += 1;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(w: &str) -> Token {
        Token::Word(w.to_string())
    }

    #[test]
    fn test_tokenize_insert() {
        let tokens = Lexer::tokenize("INSERT INTO t (a, b) VALUES (?, 'x''y');");
        assert_eq!(
            tokens,
            vec![
                word("INSERT"),
                word("INTO"),
                word("t"),
                Token::LParen,
                word("a"),
                Token::Comma,
                word("b"),
                Token::RParen,
                word("VALUES"),
                Token::LParen,
                Token::Placeholder,
                Token::Comma,
                Token::Str("x'y".to_string()),
                Token::RParen,
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn test_tokenize_operators_and_numbers() {
        let tokens = Lexer::tokenize("a<>-1.5 b>=2 c!=? d==.5");
        assert_eq!(
            tokens,
            vec![
                word("a"),
                Token::Operator("<>"),
                Token::Number("-1.5".to_string()),
                word("b"),
                Token::Operator(">="),
                Token::Number("2".to_string()),
                word("c"),
                Token::Operator("!="),
                Token::Placeholder,
                word("d"),
                Token::Operator("=="),
                Token::Number(".5".to_string()),
            ]
        );
    }

    #[test]
    fn test_unknown_and_unterminated() {
        let tokens = Lexer::tokenize("a.b 'open");
        assert_eq!(tokens[0], word("a"));
        assert_eq!(tokens[1], Token::Unknown('.'));
        assert_eq!(tokens[2], word("b"));
        assert_eq!(tokens[3], Token::Unknown('\''));
        assert_eq!(tokens[4], word("open"));
    }

    #[test]
    fn test_quoted_identifier_and_keyword_match() {
        let tokens = Lexer::tokenize("select \"Order\"");
        assert!(tokens[0].is_keyword("SELECT"));
        assert_eq!(tokens[1], Token::QuotedIdent("Order".to_string()));
    }
}
