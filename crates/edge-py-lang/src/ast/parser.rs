use std::iter::Peekable;
use std::sync::Arc;

use smol_str::SmolStr;

use crate::lexer::token::{Token, TokenKind};

use super::Program;
use super::error::ParseError;
use super::node::{
    BinaryOp, BoolOp, CompareOp, Comprehension, Expr, Index, LambdaDef, Literal, Node, UnaryOp,
};

static EOF: TokenKind = TokenKind::Eof;

/// Deepest syntax tree the parser builds. Bounds the recursion of the parser
/// itself and of everything that later walks the tree.
pub const MAX_NESTING_DEPTH: usize = 100;

pub struct Parser<'a> {
    tokens: Peekable<core::slice::Iter<'a, Token>>,
    last: Option<&'a Token>,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: core::slice::Iter<'a, Token>) -> Self {
        Self {
            tokens: tokens.peekable(),
            last: None,
            depth: 0,
        }
    }

    /// Parses a whole script. Only blank lines and comments may surround the expression.
    pub fn parse(&mut self) -> Result<Program, ParseError> {
        self.skip_newlines();

        if matches!(self.peek_kind(), TokenKind::Eof) {
            return Err(ParseError::UnexpectedEOFDetected(self.eof_token()));
        }

        let program = self.parse_expr_list()?;
        self.skip_newlines();

        match self.next_token()? {
            token if token.is_eof() => Ok(program),
            token => Err(ParseError::UnexpectedToken(token.clone())),
        }
    }

    fn peek_kind(&mut self) -> &TokenKind {
        self.tokens.peek().map(|token| &token.kind).unwrap_or(&EOF)
    }

    fn next_token(&mut self) -> Result<&'a Token, ParseError> {
        match self.tokens.next() {
            Some(token) => {
                self.last = Some(token);
                Ok(token)
            }
            None => Err(ParseError::UnexpectedEOFDetected(self.eof_token())),
        }
    }

    fn eof_token(&mut self) -> Token {
        match self.tokens.peek() {
            Some(token) => (*token).clone(),
            None => Token {
                range: self.last.map(|t| t.range).unwrap_or_default(),
                kind: TokenKind::Eof,
            },
        }
    }

    /// Counts one more level of nesting. Callers restore `depth` when the level is complete.
    fn descend(&mut self) -> Result<(), ParseError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParseError::NestingTooDeep(self.eof_token()));
        }
        self.depth += 1;
        Ok(())
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek_kind(), TokenKind::NewLine) {
            self.tokens.next();
        }
    }

    fn consume_if(&mut self, kind: &TokenKind) -> Option<&'a Token> {
        if self.peek_kind() == kind {
            self.next_token().ok()
        } else {
            None
        }
    }

    fn expect(
        &mut self,
        kind: &TokenKind,
        err: fn(Token) -> ParseError,
    ) -> Result<&'a Token, ParseError> {
        let token = self.next_token()?;
        if &token.kind == kind {
            Ok(token)
        } else if token.is_eof() && matches!(kind, TokenKind::Colon | TokenKind::Else | TokenKind::In) {
            Err(ParseError::UnexpectedEOFDetected(token.clone()))
        } else {
            Err(err(token.clone()))
        }
    }

    fn parse_expr_list(&mut self) -> Result<Node, ParseError> {
        let first = self.parse_test()?;

        if !matches!(self.peek_kind(), TokenKind::Comma) {
            return Ok(first);
        }

        let mut range = first.range;
        let mut items = vec![first];

        while self.consume_if(&TokenKind::Comma).is_some() {
            if matches!(self.peek_kind(), TokenKind::NewLine | TokenKind::Eof) {
                break;
            }
            let item = self.parse_test()?;
            range = range.merge(&item.range);
            items.push(item);
        }

        Ok(Node::new(Expr::Tuple(items), range))
    }

    fn parse_test(&mut self) -> Result<Node, ParseError> {
        let depth = self.depth;
        self.descend()?;
        let node = self.parse_conditional();
        self.depth = depth;
        node
    }

    fn parse_conditional(&mut self) -> Result<Node, ParseError> {
        if matches!(self.peek_kind(), TokenKind::Lambda) {
            return self.parse_lambda();
        }

        let then = self.parse_or()?;

        if self.consume_if(&TokenKind::If).is_none() {
            return Ok(then);
        }

        let cond = self.parse_or()?;
        self.expect(&TokenKind::Else, ParseError::UnexpectedToken)?;
        let otherwise = self.parse_test()?;
        let range = then.range.merge(&otherwise.range);

        Ok(Node::new(
            Expr::IfElse {
                cond: Box::new(cond),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            },
            range,
        ))
    }

    fn parse_lambda(&mut self) -> Result<Node, ParseError> {
        let lambda_token = self.next_token()?;
        let mut params: Vec<SmolStr> = Vec::new();

        if !matches!(self.peek_kind(), TokenKind::Colon) {
            loop {
                let token = self.next_token()?;
                match &token.kind {
                    TokenKind::Ident(name) if params.contains(name) => {
                        return Err(ParseError::DuplicateParameter(token.clone(), name.clone()));
                    }
                    TokenKind::Ident(name) => params.push(name.clone()),
                    TokenKind::Eof => return Err(ParseError::UnexpectedEOFDetected(token.clone())),
                    _ => return Err(ParseError::UnexpectedToken(token.clone())),
                }

                if self.consume_if(&TokenKind::Comma).is_none() {
                    break;
                }
            }
        }

        self.expect(&TokenKind::Colon, ParseError::UnexpectedToken)?;
        let body = self.parse_test()?;
        let range = lambda_token.range.merge(&body.range);

        Ok(Node::new(
            Expr::Lambda(Arc::new(LambdaDef {
                params,
                body,
                range,
            })),
            range,
        ))
    }

    fn parse_or(&mut self) -> Result<Node, ParseError> {
        let depth = self.depth;
        let mut lhs = self.parse_and()?;

        while self.consume_if(&TokenKind::Or).is_some() {
            self.descend()?;
            let rhs = self.parse_and()?;
            let range = lhs.range.merge(&rhs.range);
            lhs = Node::new(Expr::Bool(BoolOp::Or, Box::new(lhs), Box::new(rhs)), range);
        }

        self.depth = depth;
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Node, ParseError> {
        let depth = self.depth;
        let mut lhs = self.parse_not()?;

        while self.consume_if(&TokenKind::And).is_some() {
            self.descend()?;
            let rhs = self.parse_not()?;
            let range = lhs.range.merge(&rhs.range);
            lhs = Node::new(Expr::Bool(BoolOp::And, Box::new(lhs), Box::new(rhs)), range);
        }

        self.depth = depth;
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<Node, ParseError> {
        match self.consume_if(&TokenKind::Not) {
            Some(token) => {
                let depth = self.depth;
                self.descend()?;
                let operand = self.parse_not()?;
                self.depth = depth;
                let range = token.range.merge(&operand.range);
                Ok(Node::new(Expr::Unary(UnaryOp::Not, Box::new(operand)), range))
            }
            None => self.parse_comparison(),
        }
    }

    fn compare_op(&mut self) -> Result<Option<CompareOp>, ParseError> {
        let op = match self.peek_kind() {
            TokenKind::EqEq => CompareOp::Eq,
            TokenKind::NeEq => CompareOp::NotEq,
            TokenKind::Lt => CompareOp::Lt,
            TokenKind::Lte => CompareOp::Lte,
            TokenKind::Gt => CompareOp::Gt,
            TokenKind::Gte => CompareOp::Gte,
            TokenKind::In => CompareOp::In,
            TokenKind::Is => CompareOp::Is,
            TokenKind::Not => CompareOp::NotIn,
            _ => return Ok(None),
        };
        self.next_token()?;

        match op {
            CompareOp::Is if self.consume_if(&TokenKind::Not).is_some() => Ok(Some(CompareOp::IsNot)),
            CompareOp::NotIn => {
                self.expect(&TokenKind::In, ParseError::UnexpectedToken)?;
                Ok(Some(CompareOp::NotIn))
            }
            op => Ok(Some(op)),
        }
    }

    fn parse_comparison(&mut self) -> Result<Node, ParseError> {
        let lhs = self.parse_arith()?;
        let mut range = lhs.range;
        let mut comparisons = Vec::new();

        while let Some(op) = self.compare_op()? {
            let rhs = self.parse_arith()?;
            range = range.merge(&rhs.range);
            comparisons.push((op, rhs));
        }

        if comparisons.is_empty() {
            Ok(lhs)
        } else {
            Ok(Node::new(Expr::Compare(Box::new(lhs), comparisons), range))
        }
    }

    fn parse_arith(&mut self) -> Result<Node, ParseError> {
        let depth = self.depth;
        let mut lhs = self.parse_term()?;

        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.next_token()?;
            self.descend()?;
            let rhs = self.parse_term()?;
            let range = lhs.range.merge(&rhs.range);
            lhs = Node::new(Expr::Binary(op, Box::new(lhs), Box::new(rhs)), range);
        }

        self.depth = depth;
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Node, ParseError> {
        let depth = self.depth;
        let mut lhs = self.parse_factor()?;

        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::DoubleSlash => BinaryOp::FloorDiv,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.next_token()?;
            self.descend()?;
            let rhs = self.parse_factor()?;
            let range = lhs.range.merge(&rhs.range);
            lhs = Node::new(Expr::Binary(op, Box::new(lhs), Box::new(rhs)), range);
        }

        self.depth = depth;
        Ok(lhs)
    }

    fn parse_factor(&mut self) -> Result<Node, ParseError> {
        let op = match self.peek_kind() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Pos,
            _ => return self.parse_power(),
        };
        let token = self.next_token()?;
        let depth = self.depth;
        self.descend()?;
        let operand = self.parse_factor()?;
        self.depth = depth;
        let range = token.range.merge(&operand.range);

        Ok(Node::new(Expr::Unary(op, Box::new(operand)), range))
    }

    fn parse_power(&mut self) -> Result<Node, ParseError> {
        let base = self.parse_postfix()?;

        if self.consume_if(&TokenKind::DoubleStar).is_none() {
            return Ok(base);
        }

        // `**` binds tighter than a unary operator on its left, looser on its right.
        let depth = self.depth;
        self.descend()?;
        let exponent = self.parse_factor()?;
        self.depth = depth;
        let range = base.range.merge(&exponent.range);

        Ok(Node::new(
            Expr::Binary(BinaryOp::Pow, Box::new(base), Box::new(exponent)),
            range,
        ))
    }

    fn parse_postfix(&mut self) -> Result<Node, ParseError> {
        let depth = self.depth;
        let mut node = self.parse_atom()?;

        loop {
            if matches!(self.peek_kind(), TokenKind::LParen | TokenKind::LBracket | TokenKind::Dot) {
                self.descend()?;
            }
            match self.peek_kind() {
                TokenKind::LParen => {
                    self.next_token()?;
                    let mut args = Vec::new();
                    let close = loop {
                        if let Some(close) = self.consume_if(&TokenKind::RParen) {
                            break close;
                        }
                        args.push(self.parse_test()?);
                        if self.consume_if(&TokenKind::Comma).is_none() {
                            break self.expect(&TokenKind::RParen, ParseError::ExpectedClosingParen)?;
                        }
                    };
                    let range = node.range.merge(&close.range);
                    node = Node::new(Expr::Call(Box::new(node), args), range);
                }
                TokenKind::LBracket => {
                    self.next_token()?;
                    let index = self.parse_subscript()?;
                    let close = self.expect(&TokenKind::RBracket, ParseError::ExpectedClosingBracket)?;
                    let range = node.range.merge(&close.range);
                    node = Node::new(Expr::Subscript(Box::new(node), index), range);
                }
                TokenKind::Dot => {
                    self.next_token()?;
                    let token = self.next_token()?;
                    match &token.kind {
                        TokenKind::Ident(name) => {
                            let range = node.range.merge(&token.range);
                            node = Node::new(Expr::Attribute(Box::new(node), name.clone()), range);
                        }
                        TokenKind::Eof => return Err(ParseError::UnexpectedEOFDetected(token.clone())),
                        _ => return Err(ParseError::UnexpectedToken(token.clone())),
                    }
                }
                _ => break,
            }
        }

        self.depth = depth;
        Ok(node)
    }

    fn parse_subscript(&mut self) -> Result<Index, ParseError> {
        let lower = if matches!(self.peek_kind(), TokenKind::Colon) {
            None
        } else {
            Some(Box::new(self.parse_test()?))
        };

        if self.consume_if(&TokenKind::Colon).is_none() {
            return match lower {
                Some(lower) => Ok(Index::Single(lower)),
                None => Err(ParseError::UnexpectedToken(self.eof_token())),
            };
        }

        let upper = if matches!(self.peek_kind(), TokenKind::Colon | TokenKind::RBracket) {
            None
        } else {
            Some(Box::new(self.parse_test()?))
        };

        let step = if self.consume_if(&TokenKind::Colon).is_some()
            && !matches!(self.peek_kind(), TokenKind::RBracket)
        {
            Some(Box::new(self.parse_test()?))
        } else {
            None
        };

        Ok(Index::Slice { lower, upper, step })
    }

    fn parse_atom(&mut self) -> Result<Node, ParseError> {
        let token = self.next_token()?;

        match &token.kind {
            TokenKind::IntLiteral(n) => Ok(Node::new(Expr::Literal(Literal::Int(*n)), token.range)),
            TokenKind::FloatLiteral(n) => {
                Ok(Node::new(Expr::Literal(Literal::Float(*n)), token.range))
            }
            TokenKind::StringLiteral(s) => {
                let mut s = s.clone();
                let mut range = token.range;
                // Adjacent literals are concatenated at parse time.
                while let Some(next) = self
                    .tokens
                    .next_if(|t| matches!(t.kind, TokenKind::StringLiteral(_)))
                {
                    if let TokenKind::StringLiteral(next_s) = &next.kind {
                        s.push_str(next_s);
                    }
                    range = range.merge(&next.range);
                }
                Ok(Node::new(Expr::Literal(Literal::String(s)), range))
            }
            TokenKind::True => Ok(Node::new(Expr::Literal(Literal::Bool(true)), token.range)),
            TokenKind::False => Ok(Node::new(Expr::Literal(Literal::Bool(false)), token.range)),
            TokenKind::None => Ok(Node::new(Expr::Literal(Literal::None), token.range)),
            TokenKind::Ident(name) => Ok(Node::new(Expr::Name(name.clone()), token.range)),
            TokenKind::LParen => self.parse_paren(token),
            TokenKind::LBracket => self.parse_list(token),
            TokenKind::LBrace => self.parse_dict(token),
            TokenKind::Eof => Err(ParseError::UnexpectedEOFDetected(token.clone())),
            _ => Err(ParseError::UnexpectedToken(token.clone())),
        }
    }

    fn parse_paren(&mut self, open: &'a Token) -> Result<Node, ParseError> {
        if let Some(close) = self.consume_if(&TokenKind::RParen) {
            return Ok(Node::new(Expr::Tuple(Vec::new()), open.range.merge(&close.range)));
        }

        let first = self.parse_test()?;

        if self.consume_if(&TokenKind::Comma).is_none() {
            self.expect(&TokenKind::RParen, ParseError::ExpectedClosingParen)?;
            return Ok(first);
        }

        let mut items = vec![first];
        let close = loop {
            if let Some(close) = self.consume_if(&TokenKind::RParen) {
                break close;
            }
            items.push(self.parse_test()?);
            if self.consume_if(&TokenKind::Comma).is_none() {
                break self.expect(&TokenKind::RParen, ParseError::ExpectedClosingParen)?;
            }
        };

        Ok(Node::new(Expr::Tuple(items), open.range.merge(&close.range)))
    }

    fn parse_list(&mut self, open: &'a Token) -> Result<Node, ParseError> {
        if let Some(close) = self.consume_if(&TokenKind::RBracket) {
            return Ok(Node::new(Expr::List(Vec::new()), open.range.merge(&close.range)));
        }

        let first = self.parse_test()?;

        if matches!(self.peek_kind(), TokenKind::For) {
            let comprehension = self.parse_comprehension(first)?;
            let close = self.expect(&TokenKind::RBracket, ParseError::ExpectedClosingBracket)?;
            return Ok(Node::new(
                Expr::ListComp(comprehension),
                open.range.merge(&close.range),
            ));
        }

        let mut items = vec![first];
        let close = loop {
            if self.consume_if(&TokenKind::Comma).is_none() {
                break self.expect(&TokenKind::RBracket, ParseError::ExpectedClosingBracket)?;
            }
            if let Some(close) = self.consume_if(&TokenKind::RBracket) {
                break close;
            }
            items.push(self.parse_test()?);
        };

        Ok(Node::new(Expr::List(items), open.range.merge(&close.range)))
    }

    fn parse_comprehension(&mut self, element: Node) -> Result<Comprehension, ParseError> {
        self.next_token()?;

        let parenthesized = self.consume_if(&TokenKind::LParen).is_some();
        let mut targets = Vec::new();
        loop {
            let token = self.next_token()?;
            match &token.kind {
                TokenKind::Ident(name) => targets.push(name.clone()),
                TokenKind::Eof => return Err(ParseError::UnexpectedEOFDetected(token.clone())),
                _ => return Err(ParseError::UnexpectedToken(token.clone())),
            }
            if self.consume_if(&TokenKind::Comma).is_none() {
                break;
            }
        }
        if parenthesized {
            self.expect(&TokenKind::RParen, ParseError::ExpectedClosingParen)?;
        }

        self.expect(&TokenKind::In, ParseError::UnexpectedToken)?;
        let iter = self.parse_or()?;

        let mut conditions = Vec::new();
        while self.consume_if(&TokenKind::If).is_some() {
            conditions.push(self.parse_or()?);
        }

        Ok(Comprehension {
            element: Box::new(element),
            targets,
            iter: Box::new(iter),
            conditions,
        })
    }

    fn parse_dict(&mut self, open: &'a Token) -> Result<Node, ParseError> {
        let mut entries = Vec::new();

        let close = loop {
            if let Some(close) = self.consume_if(&TokenKind::RBrace) {
                break close;
            }
            let key = self.parse_test()?;
            self.expect(&TokenKind::Colon, ParseError::UnexpectedToken)?;
            let value = self.parse_test()?;
            entries.push((key, value));

            if self.consume_if(&TokenKind::Comma).is_none() {
                break self.expect(&TokenKind::RBrace, ParseError::ExpectedClosingBrace)?;
            }
        };

        Ok(Node::new(Expr::Dict(entries), open.range.merge(&close.range)))
    }
}

#[cfg(test)]
mod tests {
    use crate::lexer::{Lexer, Options};
    use crate::range::Position;

    use super::*;
    use rstest::rstest;

    fn parse(code: &str) -> Result<Program, ParseError> {
        let tokens = Lexer::new(Options::default()).tokenize(code).unwrap();
        Parser::new(tokens.iter()).parse()
    }

    fn strip(node: &Node) -> String {
        match &node.expr {
            Expr::Literal(Literal::Int(n)) => n.to_string(),
            Expr::Literal(Literal::Float(n)) => format!("{:?}", n),
            Expr::Literal(Literal::String(s)) => format!("{:?}", s),
            Expr::Literal(Literal::Bool(b)) => b.to_string(),
            Expr::Literal(Literal::None) => "None".to_string(),
            Expr::Name(name) => name.to_string(),
            Expr::List(items) => format!("[{}]", items.iter().map(strip).collect::<Vec<_>>().join(", ")),
            Expr::Tuple(items) => format!("({})", items.iter().map(strip).collect::<Vec<_>>().join(", ")),
            Expr::Dict(entries) => format!(
                "{{{}}}",
                entries
                    .iter()
                    .map(|(k, v)| format!("{}: {}", strip(k), strip(v)))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Expr::ListComp(comp) => format!(
                "[{} for {} in {}{}]",
                strip(&comp.element),
                comp.targets.join(", "),
                strip(&comp.iter),
                comp.conditions.iter().map(|c| format!(" if {}", strip(c))).collect::<String>()
            ),
            Expr::Unary(op, operand) => format!("({} {})", op, strip(operand)),
            Expr::Binary(op, lhs, rhs) => format!("({} {} {})", strip(lhs), op, strip(rhs)),
            Expr::Bool(BoolOp::And, lhs, rhs) => format!("({} and {})", strip(lhs), strip(rhs)),
            Expr::Bool(BoolOp::Or, lhs, rhs) => format!("({} or {})", strip(lhs), strip(rhs)),
            Expr::Compare(lhs, rest) => format!(
                "({}{})",
                strip(lhs),
                rest.iter().map(|(op, n)| format!(" {} {}", op, strip(n))).collect::<String>()
            ),
            Expr::IfElse { cond, then, otherwise } => {
                format!("({} if {} else {})", strip(then), strip(cond), strip(otherwise))
            }
            Expr::Lambda(def) => format!("(lambda {}: {})", def.params.join(", "), strip(&def.body)),
            Expr::Call(callee, args) => format!(
                "{}({})",
                strip(callee),
                args.iter().map(strip).collect::<Vec<_>>().join(", ")
            ),
            Expr::Attribute(value, name) => format!("{}.{}", strip(value), name),
            Expr::Subscript(value, Index::Single(index)) => format!("{}[{}]", strip(value), strip(index)),
            Expr::Subscript(value, Index::Slice { lower, upper, step }) => format!(
                "{}[{}:{}:{}]",
                strip(value),
                lower.as_deref().map(strip).unwrap_or_default(),
                upper.as_deref().map(strip).unwrap_or_default(),
                step.as_deref().map(strip).unwrap_or_default()
            ),
        }
    }

    #[rstest]
    #[case::lambda("lambda x: x + 1", "(lambda x: (x + 1))")]
    #[case::precedence("1 + 2 * 3 - 4", "((1 + (2 * 3)) - 4)")]
    #[case::power_right_assoc("2 ** 3 ** 2", "(2 ** or pow() (3 ** or pow() 2))")]
    #[case::unary_power("-2 ** 2", "(unary - (2 ** or pow() 2))")]
    #[case::power_unary_exponent("2 ** -1", "(2 ** or pow() (unary - 1))")]
    #[case::chained_compare("0 < x <= 10", "(0 < x <= 10)")]
    #[case::not_in("x not in y", "(x not in y)")]
    #[case::is_not("x is not None", "(x is not None)")]
    #[case::bool_ops("not a or b and c", "((not a) or (b and c))")]
    #[case::conditional("lambda x: 'neg' if x < 0 else 'pos'", "(lambda x: (\"neg\" if (x < 0) else \"pos\"))")]
    #[case::nested_lambda("lambda x: lambda y: x * y", "(lambda x: (lambda y: (x * y)))")]
    #[case::call_and_attr("lambda s: s.strip().upper()", "(lambda s: s.strip().upper())")]
    #[case::slice("x[1:-1:2]", "x[1:(unary - 1):2]")]
    #[case::open_slice("x[::-1]", "x[::(unary - 1)]")]
    #[case::index("x['a'][0]", "x[\"a\"][0]")]
    #[case::tuple("(1, 2,)", "(1, 2)")]
    #[case::single_tuple("(1,)", "(1)")]
    #[case::top_level_tuple("lambda x: x, 1", "((lambda x: x), 1)")]
    #[case::paren("(1 + 2) * 3", "((1 + 2) * 3)")]
    #[case::list("[1, 'a', None,]", "[1, \"a\", None]")]
    #[case::dict("{'a': 1, 'b': [2]}", "{\"a\": 1, \"b\": [2]}")]
    #[case::list_comp("[y * 2 for y in x if y > 1]", "[(y * 2) for y in x if (y > 1)]")]
    #[case::list_comp_unpack("[k for (k, v) in d.items()]", "[k for k, v in d.items()]")]
    #[case::string_concat("'a' 'b'", "\"ab\"")]
    #[case::surrounding_comments("# header\n\nlambda x: x\n# footer\n", "(lambda x: x)")]
    #[case::multiline_call("lambda x: max(\n  x,\n  0\n)", "(lambda x: max(x, 0))")]
    #[case::no_params("lambda: 1", "(lambda : 1)")]
    fn test_parse(#[case] code: &str, #[case] expected: &str) {
        assert_eq!(strip(&parse(code).unwrap()), expected);
    }

    #[rstest]
    #[case::empty("")]
    #[case::only_comments("# nothing here\n")]
    #[case::unclosed_call("f(1, 2")]
    #[case::missing_else("lambda x: 1 if x")]
    fn test_parse_eof(#[case] code: &str) {
        assert!(matches!(
            parse(code),
            Err(ParseError::UnexpectedEOFDetected(_)) | Err(ParseError::ExpectedClosingParen(_))
        ));
    }

    #[test]
    fn test_multiple_statements() {
        let err = parse("lambda x: x\nlambda y: y").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken(ref token) if token.kind == TokenKind::Lambda));
        assert_eq!(err.token().range.start, Position::new(2, 1));
    }

    #[test]
    fn test_duplicate_parameter() {
        assert!(matches!(
            parse("lambda x, x: x"),
            Err(ParseError::DuplicateParameter(_, name)) if name == "x"
        ));
    }

    #[test]
    fn test_unclosed_bracket() {
        assert!(matches!(parse("[1, 2"), Err(ParseError::ExpectedClosingBracket(_))));
        assert!(matches!(parse("{'a': 1"), Err(ParseError::ExpectedClosingBrace(_))));
    }

    #[rstest]
    #[case::parens(format!("lambda x: {}x{}", "(".repeat(50_000), ")".repeat(50_000)))]
    #[case::unary(format!("lambda x: {}x", "-".repeat(20_000)))]
    #[case::not(format!("{}True", "not ".repeat(1_000)))]
    #[case::power(vec!["2"; 1_000].join(" ** "))]
    #[case::sum(vec!["1"; 1_000].join(" + "))]
    #[case::calls(format!("f{}", "(1)".repeat(1_000)))]
    #[case::lists(format!("{}1{}", "[".repeat(1_000), "]".repeat(1_000)))]
    #[case::lambdas("lambda x: ".repeat(1_000) + "x")]
    fn test_nesting_too_deep(#[case] code: String) {
        assert!(matches!(parse(&code), Err(ParseError::NestingTooDeep(_))));
    }

    #[test]
    fn test_nesting_within_limit() {
        let depth = MAX_NESTING_DEPTH / 2;
        assert!(parse(&format!("{}x{}", "(".repeat(depth), ")".repeat(depth))).is_ok());
        assert!(parse(&format!("{}x", "-".repeat(depth))).is_ok());
        assert!(parse(&vec!["1"; depth].join(" + ")).is_ok());

        let wide = format!("[{}]", vec!["(1 + 2) * 3"; 1_000].join(", "));
        assert!(parse(&wide).is_ok());
    }

    #[test]
    fn test_nesting_error_points_at_token() {
        let code = format!("{}x", "(".repeat(MAX_NESTING_DEPTH + 10));
        let err = parse(&code).unwrap_err();
        assert!(matches!(err, ParseError::NestingTooDeep(_)));
        assert_eq!(err.token().range.start.line, 1);
    }

    #[test]
    fn test_lambda_range() {
        let program = parse("  lambda x: x / 0").unwrap();
        assert_eq!(program.range.start, Position::new(1, 3));
        assert_eq!(program.range.end, Position::new(1, 18));
    }
}
