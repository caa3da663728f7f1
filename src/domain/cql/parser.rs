//! Recursive-descent parser for the supported CQL subset.
//!
//! ```text
//! query        := [ clauses ] [ "sortBy" sortKey+ ]
//! clauses      := searchClause ( boolean searchClause )*
//! searchClause := "(" clauses ")" | index relation term | term
//! boolean      := "and" | "or" | "not"
//! sortKey      := index ( "/" modifier )*
//! ```
//!
//! Booleans are left associative with equal precedence, as in CQL.

use super::lexer::{tokenize, Spanned, Token};
use super::TranslationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// `=` and `adj`: phrase match on words.
    Phrase,
    /// `==`: exact value.
    Exact,
    /// `<>`
    NotExact,
    Lt,
    Le,
    Gt,
    Ge,
    /// `all`: every word of the term.
    AllWords,
    /// `any`: at least one word of the term.
    AnyWord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
    /// CQL `not` is binary: `a not b` means `a and not b`.
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CqlNode {
    Clause {
        /// `None` for a bare term (server-choice index).
        index: Option<String>,
        relation: Relation,
        term: String,
    },
    Boolean {
        op: BoolOp,
        left: Box<CqlNode>,
        right: Box<CqlNode>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortSpec {
    pub index: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CqlQuery {
    /// `None` when the query text is empty.
    pub root: Option<CqlNode>,
    pub sort: Vec<SortSpec>,
}

/// Deepest parenthesis nesting accepted.
pub const MAX_NESTING: usize = 32;
/// Most search clauses accepted in one query.
pub const MAX_CLAUSES: usize = 256;

fn symbol_relation(symbol: &str) -> Option<Relation> {
    match symbol {
        "=" => Some(Relation::Phrase),
        "==" => Some(Relation::Exact),
        "<>" => Some(Relation::NotExact),
        "<" => Some(Relation::Lt),
        "<=" => Some(Relation::Le),
        ">" => Some(Relation::Gt),
        ">=" => Some(Relation::Ge),
        _ => None,
    }
}

fn word_relation(word: &str) -> Option<Relation> {
    match word.to_ascii_lowercase().as_str() {
        "adj" => Some(Relation::Phrase),
        "all" => Some(Relation::AllWords),
        "any" => Some(Relation::AnyWord),
        _ => None,
    }
}

fn bool_op(word: &str) -> Option<BoolOp> {
    match word.to_ascii_lowercase().as_str() {
        "and" => Some(BoolOp::And),
        "or" => Some(BoolOp::Or),
        "not" => Some(BoolOp::Not),
        _ => None,
    }
}

fn is_sort_by(token: &Token) -> bool {
    matches!(token, Token::Word(w) if w.eq_ignore_ascii_case("sortby"))
}

pub fn parse(input: &str) -> Result<CqlQuery, TranslationError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        clauses: 0,
    };

    let root = if parser.at_end() {
        None
    } else if parser.peek().map(is_sort_by).unwrap_or(false) {
        return Err(parser.error_here("sortBy requires a preceding query"));
    } else {
        Some(parser.clauses(0)?)
    };

    let sort = if parser.peek().map(is_sort_by).unwrap_or(false) {
        parser.advance();
        parser.sort_keys()?
    } else {
        Vec::new()
    };

    if let Some(tok) = parser.peek() {
        return Err(parser.error_at(format!("unexpected token {}", tok.describe())));
    }

    Ok(CqlQuery { root, sort })
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    /// Search clauses seen so far.
    clauses: usize,
}

impl Parser {
    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|s| &s.token)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).map(|s| s.token.clone());
        self.pos += 1;
        tok
    }

    fn current_pos(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|s| s.pos)
            .unwrap_or(0)
    }

    fn error_at(&self, message: String) -> TranslationError {
        TranslationError::Syntax(format!("{} at position {}", message, self.current_pos()))
    }

    fn error_here(&self, message: &str) -> TranslationError {
        self.error_at(message.to_string())
    }

    fn clauses(&mut self, depth: usize) -> Result<CqlNode, TranslationError> {
        let mut left = self.search_clause(depth)?;
        loop {
            let op = match self.peek() {
                Some(Token::Word(w)) => match bool_op(w) {
                    Some(op) => op,
                    None if w.eq_ignore_ascii_case("prox") => {
                        return Err(self.error_here("prox is not supported"));
                    }
                    None => break,
                },
                _ => break,
            };
            self.advance();
            if matches!(self.peek(), Some(Token::Slash)) {
                return Err(self.error_here("boolean modifiers are not supported"));
            }
            let right = self.search_clause(depth)?;
            left = CqlNode::Boolean {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn search_clause(&mut self, depth: usize) -> Result<CqlNode, TranslationError> {
        match self.peek().cloned() {
            None => Err(self.error_here("unexpected end of query")),
            Some(Token::LParen) => {
                if depth >= MAX_NESTING {
                    return Err(self.error_at(format!(
                        "query too complex: more than {} nested parentheses",
                        MAX_NESTING
                    )));
                }
                self.advance();
                let inner = self.clauses(depth + 1)?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    Some(other) => {
                        self.pos -= 1;
                        Err(self.error_at(format!("expected ')' but found {}", other.describe())))
                    }
                    None => Err(self.error_here("missing ')'")),
                }
            }
            Some(Token::Word(word)) => {
                self.count_clause()?;
                if bool_op(&word).is_some() || is_sort_by(&Token::Word(word.clone())) {
                    return Err(self.error_at(format!("expected a search term but found '{}'", word)));
                }
                if let Some(relation) = self.relation_after_index() {
                    self.advance();
                    self.advance();
                    if matches!(self.peek(), Some(Token::Slash)) {
                        return Err(self.error_here("relation modifiers are not supported"));
                    }
                    let term = self.term()?;
                    return Ok(CqlNode::Clause {
                        index: Some(word),
                        relation,
                        term,
                    });
                }
                self.advance();
                Ok(CqlNode::Clause {
                    index: None,
                    relation: Relation::Phrase,
                    term: word,
                })
            }
            Some(Token::Quoted(term)) => {
                self.count_clause()?;
                self.advance();
                if matches!(self.peek(), Some(Token::Symbol(_))) {
                    return Err(self.error_here("an index name can not be quoted"));
                }
                Ok(CqlNode::Clause {
                    index: None,
                    relation: Relation::Phrase,
                    term,
                })
            }
            Some(other) => Err(self.error_at(format!("unexpected token {}", other.describe()))),
        }
    }

    fn count_clause(&mut self) -> Result<(), TranslationError> {
        self.clauses += 1;
        if self.clauses > MAX_CLAUSES {
            return Err(self.error_at(format!(
                "query too complex: more than {} search clauses",
                MAX_CLAUSES
            )));
        }
        Ok(())
    }

    /// Looks at the token following the current index candidate.
    fn relation_after_index(&self) -> Option<Relation> {
        match self.peek_at(1)? {
            Token::Symbol(s) => symbol_relation(s),
            Token::Word(w) => {
                let relation = word_relation(w)?;
                // `title any` with nothing after it is two bare terms, not a clause.
                match self.peek_at(2) {
                    Some(Token::Word(_)) | Some(Token::Quoted(_)) => Some(relation),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn term(&mut self) -> Result<String, TranslationError> {
        match self.advance() {
            Some(Token::Word(w)) => Ok(w),
            Some(Token::Quoted(q)) => Ok(q),
            Some(other) => {
                self.pos -= 1;
                Err(self.error_at(format!("expected a search term but found {}", other.describe())))
            }
            None => Err(self.error_here("missing search term")),
        }
    }

    fn sort_keys(&mut self) -> Result<Vec<SortSpec>, TranslationError> {
        let mut keys = Vec::new();
        while let Some(Token::Word(index)) = self.peek().cloned() {
            self.advance();
            let mut direction = SortDirection::Ascending;
            while matches!(self.peek(), Some(Token::Slash)) {
                self.advance();
                match self.advance() {
                    Some(Token::Word(m)) => match m.to_ascii_lowercase().as_str() {
                        "sort.ascending" | "ascending" => direction = SortDirection::Ascending,
                        "sort.descending" | "descending" => direction = SortDirection::Descending,
                        _ => {
                            self.pos -= 1;
                            return Err(
                                self.error_at(format!("unsupported sort modifier '{}'", m))
                            );
                        }
                    },
                    _ => return Err(self.error_here("missing sort modifier")),
                }
            }
            keys.push(SortSpec { index, direction });
        }
        if keys.is_empty() {
            return Err(self.error_here("sortBy requires at least one index"));
        }
        Ok(keys)
    }
}
