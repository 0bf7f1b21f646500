//! Text notation for process trees.
//!
//! Operators are written as a symbol followed by a parenthesized child list,
//! activities as quoted labels and silent steps as `tau`:
//!
//! ```text
//! ->( 'register', X( 'approve', 'reject' ), *( tau, 'remind' ) )
//! ```
//!
//! Reading also accepts bare labels (`->(A, B)`) and the operator words
//! `seq`, `xor`, `and`, `loop` and `or`.

use super::{NodeId, NodeKind, Operator, ProcessTree};
use crate::error::TreeParseError;
use std::fmt;
use std::str::FromStr;

pub(super) const TAU: &str = "tau";

/// Quote a label, escaping quotes and backslashes.
pub(super) fn quote(label: &str) -> String {
    let mut out = String::with_capacity(label.len() + 2);
    out.push('\'');
    for c in label.chars() {
        if c == '\'' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

impl fmt::Display for ProcessTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_node(tree: &ProcessTree, id: NodeId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match tree.kind(id) {
                NodeKind::Activity(label) => f.write_str(&quote(label)),
                NodeKind::Silent => f.write_str(TAU),
                NodeKind::Operator(op) => {
                    write!(f, "{}(", op.symbol())?;
                    for (i, &child) in tree.children(id).iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write_node(tree, child, f)?;
                    }
                    f.write_str(")")
                }
            }
        }
        write_node(self, self.root, f)
    }
}

impl FromStr for ProcessTree {
    type Err = TreeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = Parser { input: s, pos: 0 };
        let mut tree = ProcessTree {
            nodes: Vec::new(),
            root: NodeId(0),
            fitness: None,
        };
        let root = parser.node(&mut tree, None)?;
        parser.skip_whitespace();
        if parser.pos != s.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        tree.root = root;
        Ok(tree)
    }
}

fn operator_from_token(token: &str) -> Option<Operator> {
    match token.to_ascii_lowercase().as_str() {
        "->" | "seq" | "sequence" => Some(Operator::Sequence),
        "x" | "xor" => Some(Operator::Xor),
        "+" | "and" | "parallel" => Some(Operator::Parallel),
        "*" | "loop" => Some(Operator::Loop),
        "o" | "or" => Some(Operator::Or),
        _ => None,
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, message: &str) -> TreeParseError {
        TreeParseError {
            position: self.pos,
            message: message.to_owned(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), TreeParseError> {
        self.skip_whitespace();
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            Ok(())
        } else {
            Err(self.error(&format!("expected '{expected}'")))
        }
    }

    fn quoted(&mut self) -> Result<String, TreeParseError> {
        self.pos += 1;
        let mut label = String::new();
        let mut escaped = false;
        while let Some(c) = self.peek() {
            self.pos += c.len_utf8();
            if escaped {
                label.push(c);
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '\'' {
                return Ok(label);
            } else {
                label.push(c);
            }
        }
        Err(self.error("unterminated label"))
    }

    fn bare(&mut self) -> &str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace() || matches!(c, '(' | ')' | ',' | '\'') {
                break;
            }
            self.pos += c.len_utf8();
        }
        &self.input[start..self.pos]
    }

    fn node(
        &mut self,
        tree: &mut ProcessTree,
        parent: Option<NodeId>,
    ) -> Result<NodeId, TreeParseError> {
        self.skip_whitespace();
        if self.peek() == Some('\'') {
            let label = self.quoted()?;
            return Ok(tree.alloc(NodeKind::Activity(label), parent));
        }

        let token_start = self.pos;
        let token = self.bare().to_owned();
        if token.is_empty() {
            return Err(self.error("expected a label or an operator"));
        }
        self.skip_whitespace();
        if self.peek() != Some('(') {
            let kind = if token.eq_ignore_ascii_case(TAU) {
                NodeKind::Silent
            } else {
                NodeKind::Activity(token)
            };
            return Ok(tree.alloc(kind, parent));
        }

        let Some(op) = operator_from_token(&token) else {
            return Err(TreeParseError {
                position: token_start,
                message: format!("unknown operator '{token}'"),
            });
        };
        self.pos += 1;
        let id = tree.alloc(NodeKind::Operator(op), parent);
        self.skip_whitespace();
        if self.peek() == Some(')') {
            self.pos += 1;
            return Ok(id);
        }
        loop {
            self.node(tree, Some(id))?;
            self.skip_whitespace();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some(')') => break,
                _ => return Err(self.error("expected ',' or ')'")),
            }
        }
        self.expect(')')?;
        Ok(id)
    }
}
