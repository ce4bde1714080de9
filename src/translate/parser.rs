//! Recursive-descent recognizer for the closed statement grammar.
//!
//! ```text
//! insert := INSERT INTO t ( c {, c} ) VALUES ( v {, v} )
//! update := UPDATE t SET c = v {, c = v} WHERE pred
//! delete := DELETE FROM t WHERE pred
//! count  := SELECT COUNT ( * ) [[AS] alias] FROM t [WHERE ...]
//! select := SELECT * FROM t [WHERE pred] [ORDER BY c [ASC|DESC]] [LIMIT n]
//! pred   := c op v
//! v      := ? | number | 'text' | TRUE | FALSE | NULL | NOW()
//! ```
//!
//! Each statement may end with one `;`. Placeholders are numbered in the
//! order they appear.

use crate::clauses::{CompareOp, OrderBy};
use crate::config::is_identifier;
use crate::error::UnsupportedReason;
use crate::types::SqlValue;

use super::lexer::{Lexer, Token};
use super::{Operand, Predicate, SelectModifiers, StatementShape};

const RESERVED: [&str; 32] = [
    "SELECT", "INSERT", "UPDATE", "DELETE", "FROM", "WHERE", "AND", "OR", "NOT", "SET", "VALUES",
    "INTO", "ORDER", "BY", "LIMIT", "OFFSET", "GROUP", "HAVING", "JOIN", "INNER", "LEFT", "RIGHT",
    "ON", "UNION", "AS", "IN", "IS", "NULL", "LIKE", "TRUE", "FALSE", "DISTINCT",
];

/// Keywords that make a COUNT's WHERE tail more than a filter.
const COUNT_TAIL_BLOCKERS: [&str; 8] = [
    "SELECT", "JOIN", "GROUP", "HAVING", "UNION", "ORDER", "LIMIT", "OFFSET",
];

/// Why a statement did not parse into a supported shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParseMiss {
    Syntax,
    AmbiguousPredicate,
}

impl From<ParseMiss> for UnsupportedReason {
    fn from(miss: ParseMiss) -> Self {
        match miss {
            ParseMiss::Syntax => UnsupportedReason::ClassificationMiss,
            ParseMiss::AmbiguousPredicate => UnsupportedReason::AmbiguousPredicate,
        }
    }
}

/// The WHERE clause as recognized.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum WhereClause {
    None,
    Single(Predicate),
    /// A COUNT filter that is not a single predicate; only usable when ignored.
    /// Carries why it could not be applied.
    Opaque(ParseMiss),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParsedStatement {
    pub shape: StatementShape,
    /// INSERT values or UPDATE assignments, in column order.
    pub values: Vec<Operand>,
    pub filter: WhereClause,
    pub modifiers: SelectModifiers,
    pub count_alias: Option<String>,
    /// Number of `?` markers in the statement.
    pub placeholders: usize,
}

impl ParsedStatement {
    fn new(shape: StatementShape) -> Self {
        Self {
            shape,
            values: Vec::new(),
            filter: WhereClause::None,
            modifiers: SelectModifiers::default(),
            count_alias: None,
            placeholders: 0,
        }
    }
}

type ParseResult<T> = std::result::Result<T, ParseMiss>;

/// Parses normalized statement text.
pub(crate) fn parse(text: &str) -> ParseResult<ParsedStatement> {
    let mut parser = Parser {
        tokens: Lexer::tokenize(text),
        pos: 0,
        placeholders: 0,
    };
    let mut statement = parser.statement()?;
    statement.placeholders = parser.placeholders;
    Ok(statement)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    placeholders: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_is_keyword(&self, keyword: &str) -> bool {
        self.peek().is_some_and(|t| t.is_keyword(keyword))
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> ParseResult<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(ParseMiss::Syntax)
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_is_keyword(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> ParseResult<()> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(ParseMiss::Syntax)
        }
    }

    /// Optional `;`, then nothing.
    fn finish(&mut self) -> ParseResult<()> {
        self.eat(&Token::Semicolon);
        if self.peek().is_none() {
            Ok(())
        } else {
            Err(ParseMiss::Syntax)
        }
    }

    fn identifier(&mut self) -> ParseResult<String> {
        match self.advance() {
            Some(Token::Word(w)) if !RESERVED.iter().any(|r| r.eq_ignore_ascii_case(&w)) => Ok(w),
            Some(Token::QuotedIdent(w)) if is_identifier(&w) => Ok(w),
            _ => Err(ParseMiss::Syntax),
        }
    }

    fn operand(&mut self) -> ParseResult<Operand> {
        match self.advance() {
            Some(Token::Placeholder) => {
                let index = self.placeholders;
                self.placeholders += 1;
                Ok(Operand::Param(index))
            }
            Some(Token::Number(n)) => number_literal(&n).map(Operand::Literal),
            Some(Token::Str(s)) => Ok(Operand::Literal(SqlValue::Text(s))),
            Some(Token::Word(w)) if w.eq_ignore_ascii_case("TRUE") => {
                Ok(Operand::Literal(SqlValue::Bool(true)))
            }
            Some(Token::Word(w)) if w.eq_ignore_ascii_case("FALSE") => {
                Ok(Operand::Literal(SqlValue::Bool(false)))
            }
            Some(Token::Word(w)) if w.eq_ignore_ascii_case("NULL") => {
                Ok(Operand::Literal(SqlValue::Null))
            }
            Some(Token::Word(w)) if w.eq_ignore_ascii_case("NOW") => {
                self.expect(&Token::LParen)?;
                self.expect(&Token::RParen)?;
                Ok(Operand::Literal(SqlValue::Text("now()".to_string())))
            }
            _ => Err(ParseMiss::Syntax),
        }
    }

    /// `column op value`, rejecting a following AND / OR.
    fn predicate(&mut self) -> ParseResult<Predicate> {
        let column = self.identifier()?;
        let op = match self.advance() {
            Some(Token::Operator(symbol)) => {
                CompareOp::from_symbol(symbol).ok_or(ParseMiss::Syntax)?
            }
            _ => return Err(ParseMiss::Syntax),
        };
        let value = self.operand()?;
        if self.peek_is_keyword("AND") || self.peek_is_keyword("OR") {
            return Err(ParseMiss::AmbiguousPredicate);
        }
        Ok(Predicate { column, op, value })
    }

    fn statement(&mut self) -> ParseResult<ParsedStatement> {
        // Shape exclusivity: the leading keyword picks the only recognizer tried
        match self.advance() {
            Some(t) if t.is_keyword("SELECT") => self.select(),
            Some(t) if t.is_keyword("INSERT") => self.insert(),
            Some(t) if t.is_keyword("UPDATE") => self.update(),
            Some(t) if t.is_keyword("DELETE") => self.delete(),
            _ => Err(ParseMiss::Syntax),
        }
    }

    fn insert(&mut self) -> ParseResult<ParsedStatement> {
        self.expect_keyword("INTO")?;
        let table = self.identifier()?;

        self.expect(&Token::LParen)?;
        let mut columns = vec![self.identifier()?];
        while self.eat(&Token::Comma) {
            let column = self.identifier()?;
            if columns.contains(&column) {
                return Err(ParseMiss::Syntax);
            }
            columns.push(column);
        }
        self.expect(&Token::RParen)?;

        self.expect_keyword("VALUES")?;
        self.expect(&Token::LParen)?;
        let mut values = vec![self.operand()?];
        while self.eat(&Token::Comma) {
            values.push(self.operand()?);
        }
        self.expect(&Token::RParen)?;
        self.finish()?;

        let mut statement = ParsedStatement::new(StatementShape::Insert { table, columns });
        statement.values = values;
        Ok(statement)
    }

    fn update(&mut self) -> ParseResult<ParsedStatement> {
        let table = self.identifier()?;
        self.expect_keyword("SET")?;

        let mut set_columns = Vec::new();
        let mut values = Vec::new();
        loop {
            let column = self.identifier()?;
            if set_columns.contains(&column) {
                return Err(ParseMiss::Syntax);
            }
            self.expect(&Token::Operator("="))?;
            values.push(self.operand()?);
            set_columns.push(column);
            if !self.eat(&Token::Comma) {
                break;
            }
        }

        self.expect_keyword("WHERE")?;
        let predicate = self.predicate()?;
        self.finish()?;

        let mut statement = ParsedStatement::new(StatementShape::Update { table, set_columns });
        statement.values = values;
        statement.filter = WhereClause::Single(predicate);
        Ok(statement)
    }

    fn delete(&mut self) -> ParseResult<ParsedStatement> {
        self.expect_keyword("FROM")?;
        let table = self.identifier()?;
        // No WHERE, no delete
        self.expect_keyword("WHERE")?;
        let predicate = self.predicate()?;
        self.finish()?;

        let mut statement = ParsedStatement::new(StatementShape::Delete { table });
        statement.filter = WhereClause::Single(predicate);
        Ok(statement)
    }

    fn select(&mut self) -> ParseResult<ParsedStatement> {
        if self.peek_is_keyword("COUNT") && self.tokens.get(self.pos + 1) == Some(&Token::LParen) {
            self.pos += 1;
            return self.select_count();
        }

        self.expect(&Token::Star)?;
        self.expect_keyword("FROM")?;
        let table = self.identifier()?;
        let mut statement = ParsedStatement::new(StatementShape::SelectAll { table });

        if self.eat_keyword("WHERE") {
            statement.filter = WhereClause::Single(self.predicate()?);
        }
        if self.eat_keyword("ORDER") {
            self.expect_keyword("BY")?;
            let column = self.identifier()?;
            statement.modifiers.order = Some(if self.eat_keyword("DESC") {
                OrderBy::desc(column)
            } else {
                self.eat_keyword("ASC");
                OrderBy::asc(column)
            });
        }
        if self.eat_keyword("LIMIT") {
            statement.modifiers.limit = match self.advance() {
                Some(Token::Number(n)) => Some(n.parse::<u64>().map_err(|_| ParseMiss::Syntax)?),
                _ => return Err(ParseMiss::Syntax),
            };
        }
        self.finish()?;
        Ok(statement)
    }

    fn select_count(&mut self) -> ParseResult<ParsedStatement> {
        self.expect(&Token::LParen)?;
        self.expect(&Token::Star)?;
        self.expect(&Token::RParen)?;

        let alias = if self.eat_keyword("AS") {
            Some(self.identifier()?)
        } else if self.peek_is_keyword("FROM") {
            None
        } else {
            Some(self.identifier()?)
        };

        self.expect_keyword("FROM")?;
        let table = self.identifier()?;
        let mut statement = ParsedStatement::new(StatementShape::SelectCount { table });
        statement.count_alias = alias;

        if self.eat_keyword("WHERE") {
            statement.filter = self.count_filter()?;
        }
        self.finish()?;
        Ok(statement)
    }

    /// A single predicate if there is one, otherwise an opaque filter as long
    /// as the tail holds nothing but conditions.
    fn count_filter(&mut self) -> ParseResult<WhereClause> {
        let (start, placeholders) = (self.pos, self.placeholders);
        if let Ok(predicate) = self.predicate() {
            let at_end = matches!(self.peek(), None | Some(Token::Semicolon));
            if at_end {
                return Ok(WhereClause::Single(predicate));
            }
        }

        self.pos = start;
        self.placeholders = placeholders;
        let end = match self.tokens.last() {
            Some(Token::Semicolon) => self.tokens.len() - 1,
            _ => self.tokens.len(),
        };
        let tail = &self.tokens[start..end];
        let blocked = tail.is_empty()
            || tail.iter().any(|t| {
                matches!(t, Token::Semicolon | Token::Unknown(_))
                    || COUNT_TAIL_BLOCKERS.iter().any(|k| t.is_keyword(k))
            });
        if blocked {
            return Err(ParseMiss::Syntax);
        }
        self.placeholders += tail.iter().filter(|t| **t == Token::Placeholder).count();
        self.pos = end;
        let combined = tail.iter().any(|t| t.is_keyword("AND") || t.is_keyword("OR"));
        Ok(WhereClause::Opaque(if combined {
            ParseMiss::AmbiguousPredicate
        } else {
            ParseMiss::Syntax
        }))
    }
}

fn number_literal(text: &str) -> ParseResult<SqlValue> {
    if text.contains('.') {
        text.parse::<f64>()
            .map(SqlValue::Float)
            .map_err(|_| ParseMiss::Syntax)
    } else {
        text.parse::<i64>()
            .map(SqlValue::Int)
            .map_err(|_| ParseMiss::Syntax)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(sql: &str) -> Option<StatementShape> {
        parse(sql).ok().map(|p| p.shape)
    }

    #[test]
    fn test_parse_insert() {
        let parsed = parse("insert into produtos (nome, preco_venda, ativo) values (?, ?, true);").unwrap();
        assert_eq!(
            parsed.shape,
            StatementShape::Insert {
                table: "produtos".into(),
                columns: vec!["nome".into(), "preco_venda".into(), "ativo".into()],
            }
        );
        assert_eq!(
            parsed.values,
            vec![
                Operand::Param(0),
                Operand::Param(1),
                Operand::Literal(SqlValue::Bool(true))
            ]
        );
        assert_eq!(parsed.placeholders, 2);
    }

    #[test]
    fn test_parse_update_numbers_predicate_after_set() {
        let parsed = parse("UPDATE clientes SET nome=?, atualizado_em='now()' WHERE id=?").unwrap();
        assert_eq!(
            parsed.shape,
            StatementShape::Update {
                table: "clientes".into(),
                set_columns: vec!["nome".into(), "atualizado_em".into()],
            }
        );
        assert_eq!(
            parsed.filter,
            WhereClause::Single(Predicate {
                column: "id".into(),
                op: CompareOp::Eq,
                value: Operand::Param(1),
            })
        );
    }

    #[test]
    fn test_delete_requires_where() {
        assert_eq!(parse("DELETE FROM ordens"), Err(ParseMiss::Syntax));
        assert_eq!(
            shape("DELETE FROM ordens WHERE id = ?"),
            Some(StatementShape::Delete {
                table: "ordens".into()
            })
        );
    }

    #[test]
    fn test_select_with_modifiers() {
        let parsed = parse("SELECT * FROM vendas WHERE total >= ? ORDER BY criado_em DESC LIMIT 20").unwrap();
        assert_eq!(parsed.modifiers.order, Some(OrderBy::desc("criado_em")));
        assert_eq!(parsed.modifiers.limit, Some(20));
        assert!(matches!(
            parsed.filter,
            WhereClause::Single(Predicate { op: CompareOp::Gte, .. })
        ));
    }

    #[test]
    fn test_count_alias_and_filters() {
        let parsed = parse("SELECT COUNT(*) as n FROM clientes WHERE ativo = true").unwrap();
        assert_eq!(parsed.count_alias.as_deref(), Some("n"));
        assert!(matches!(parsed.filter, WhereClause::Single(_)));

        let parsed = parse("SELECT COUNT(*) FROM clientes WHERE a = ? AND b = ?").unwrap();
        assert_eq!(parsed.filter, WhereClause::Opaque(ParseMiss::AmbiguousPredicate));
        assert_eq!(parsed.placeholders, 2);
        assert_eq!(parsed.count_alias, None);

        let parsed = parse("SELECT COUNT(*) FROM clientes WHERE email IS NULL").unwrap();
        assert_eq!(parsed.filter, WhereClause::Opaque(ParseMiss::Syntax));

        assert_eq!(
            parse("SELECT COUNT(*) FROM clientes WHERE a = ? GROUP BY b"),
            Err(ParseMiss::Syntax)
        );
    }

    #[test]
    fn test_multiple_conditions_are_ambiguous() {
        assert_eq!(
            parse("SELECT * FROM t WHERE a = ? AND b = ?"),
            Err(ParseMiss::AmbiguousPredicate)
        );
        assert_eq!(
            parse("UPDATE t SET a = ? WHERE b = ? OR c = ?"),
            Err(ParseMiss::AmbiguousPredicate)
        );
    }

    #[test]
    fn test_out_of_grammar_statements() {
        for sql in [
            "",
            "SELECT id, nome FROM t",
            "SELECT * FROM a JOIN b ON a.id = b.a_id",
            "SELECT * FROM t GROUP BY x",
            "SELECT * FROM t WHERE id IN (SELECT id FROM u)",
            "SELECT * FROM t WHERE x IS NULL",
            "UPDATE t SET estoque = estoque - ? WHERE id = ?",
            "INSERT INTO t VALUES (?)",
            "INSERT INTO t (a, a) VALUES (?, ?)",
            "DROP TABLE t",
            "SELECT * FROM t; DELETE FROM t WHERE id = ?",
            "SELECT * FROM select",
        ] {
            assert!(parse(sql).is_err(), "unexpectedly parsed {:?}", sql);
        }
    }

    #[test]
    fn test_quoted_identifiers() {
        assert_eq!(
            shape("SELECT * FROM \"order\" WHERE \"id\" = ?"),
            Some(StatementShape::SelectAll {
                table: "order".into()
            })
        );
    }
}
