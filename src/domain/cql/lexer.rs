//! Tokenizer for CQL query strings.

use super::TranslationError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    LParen,
    RParen,
    Slash,
    /// One of `=`, `==`, `<>`, `<`, `<=`, `>`, `>=`.
    Symbol(String),
    /// Unquoted word (index names, keywords, bare terms).
    Word(String),
    /// Content of a double-quoted string. `\"` is unescaped, every other
    /// backslash sequence is kept so the term layer can tell `\*` from `*`.
    Quoted(String),
}

impl Token {
    pub fn describe(&self) -> String {
        match self {
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::Slash => "'/'".to_string(),
            Token::Symbol(s) | Token::Word(s) => format!("'{}'", s),
            Token::Quoted(s) => format!("\"{}\"", s),
        }
    }
}

/// A token with the char offset it started at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    pub pos: usize,
}

fn is_word_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '(' | ')' | '=' | '<' | '>' | '/' | '"')
}

pub fn tokenize(input: &str) -> Result<Vec<Spanned>, TranslationError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        let pos = i;
        let token = match c {
            '(' => {
                i += 1;
                Token::LParen
            }
            ')' => {
                i += 1;
                Token::RParen
            }
            '/' => {
                i += 1;
                Token::Slash
            }
            '=' => {
                if chars.get(i + 1) == Some(&'=') {
                    i += 2;
                    Token::Symbol("==".to_string())
                } else {
                    i += 1;
                    Token::Symbol("=".to_string())
                }
            }
            '<' => match chars.get(i + 1) {
                Some('>') => {
                    i += 2;
                    Token::Symbol("<>".to_string())
                }
                Some('=') => {
                    i += 2;
                    Token::Symbol("<=".to_string())
                }
                _ => {
                    i += 1;
                    Token::Symbol("<".to_string())
                }
            },
            '>' => {
                if chars.get(i + 1) == Some(&'=') {
                    i += 2;
                    Token::Symbol(">=".to_string())
                } else {
                    i += 1;
                    Token::Symbol(">".to_string())
                }
            }
            '"' => {
                i += 1;
                let mut content = String::new();
                let mut closed = false;
                while i < chars.len() {
                    match chars[i] {
                        '"' => {
                            closed = true;
                            i += 1;
                            break;
                        }
                        '\\' if i + 1 < chars.len() => {
                            if chars[i + 1] == '"' {
                                content.push('"');
                            } else {
                                content.push('\\');
                                content.push(chars[i + 1]);
                            }
                            i += 2;
                        }
                        other => {
                            content.push(other);
                            i += 1;
                        }
                    }
                }
                if !closed {
                    return Err(TranslationError::Syntax(format!(
                        "unterminated quoted string starting at position {}",
                        pos
                    )));
                }
                Token::Quoted(content)
            }
            _ => {
                let start = i;
                while i < chars.len() && is_word_char(chars[i]) {
                    i += 1;
                }
                Token::Word(chars[start..i].iter().collect())
            }
        };
        tokens.push(Spanned { token, pos });
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token> {
        tokenize(input).unwrap().into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn test_relations_and_words() {
        assert_eq!(
            kinds("seen==true and x<>2"),
            vec![
                Token::Word("seen".into()),
                Token::Symbol("==".into()),
                Token::Word("true".into()),
                Token::Word("and".into()),
                Token::Word("x".into()),
                Token::Symbol("<>".into()),
                Token::Word("2".into()),
            ]
        );
    }

    #[test]
    fn test_quoted_keeps_wildcard_escapes() {
        assert_eq!(
            kinds(r#"text="say \"hi\" \*""#),
            vec![
                Token::Word("text".into()),
                Token::Symbol("=".into()),
                Token::Quoted(r#"say "hi" \*"#.into()),
            ]
        );
    }

    #[test]
    fn test_sort_modifier_and_parens() {
        assert_eq!(
            kinds("(a>=1) sortBy a/sort.descending"),
            vec![
                Token::LParen,
                Token::Word("a".into()),
                Token::Symbol(">=".into()),
                Token::Word("1".into()),
                Token::RParen,
                Token::Word("sortBy".into()),
                Token::Word("a".into()),
                Token::Slash,
                Token::Word("sort.descending".into()),
            ]
        );
    }

    #[test]
    fn test_unterminated_quote_is_syntax_error() {
        let err = tokenize("text=\"open").unwrap_err();
        assert!(matches!(err, TranslationError::Syntax(_)));
    }
}
