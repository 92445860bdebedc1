//! 闭包谓词的语法分析器, 把闭包文本降低 (lower) 为 [`PredicateNode`] 树
//!
//! ## 解析流程图
//!
//! ```text
//! parse()
//!   ├─ 期望 '|' 参数名 '|'
//!   └─ parse_or_expression()
//!        ├─ parse_xor_expression()
//!        │    ├─ parse_and_expression()
//!        │    │    ├─ parse_unary_expression()
//!        │    │    │    ├─ "!" → 取反 (递归调用 parse_unary_expression)
//!        │    │    │    └─ parse_primary_expression()
//!        │    │    │         ├─ "(" → 分组表达式 (递归调用 parse_or_expression)
//!        │    │    │         ├─ true / false → 常量
//!        │    │    │         └─ p.Field → 比较运算 + 操作数, 或者单独的字段测试
//!        │    │    │
//!        │    │    └─ 遇到 && 时，继续解析右侧一元表达式
//!        │    │
//!        │    └─ 遇到 ^ 时，继续解析右侧 AND 表达式
//!        │
//!        └─ 遇到 || 时，继续解析右侧 XOR 表达式
//! ```
//!
//! ## 操作数
//!
//! - **字面值**: `"text"`, `6`, `-6`, `1.5`, `true`, `Uuid::nil()`, `uuid!("...")`
//! - **捕获变量**: `name` → 闭包环境上的成员
//! - **捕获变量的成员**: `user.Age` → 两级成员访问
//! - **类型转换**: `user.Age as i64`
//!
//! ## 解析示例
//!
//! ```text
//! |p| p.Name == "Some name" && (p.Description == "dsafsdfsdfs" || p.Age == 6 || p.Id == Uuid::nil())
//! |p| p.Name == user.Name && p.Age == user.Age || p.Description == user.Description
//! ```

use thiserror::Error;
use uuid::Uuid;

use crate::lexer::Lexer;
use crate::predicate::{CompareOp, ConstantRef, FieldRef, LogicalOp, PredicateNode, Value, ValueExpr};
use crate::token::{Span, Token, TokenKind};

/// 解析闭包文本; 自由变量绑定到闭包环境 `env` 上
pub fn lower(source: &str, env: &ConstantRef) -> Result<PredicateNode, ParseError> {
    let tokens: Vec<_> = Lexer::new(source).collect();
    Parser::new(&tokens, env.clone()).parse()
}

/// 分组 `(..)` 与取反 `!` 的最大嵌套层数
pub const MAX_NESTING_DEPTH: usize = 64;

pub struct Parser<'a> {
    tokens: &'a [Token<'a>],
    position: usize,
    /// 当前嵌套层数
    depth: usize,
    /// 闭包环境, 保存被捕获的变量
    env: ConstantRef,
    /// 闭包参数名, 在解析 `|p|` 之后确定
    parameter: &'a str,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}{}", format_span(.span))]
pub struct ParseError {
    pub message: String,
    pub span: Option<Span>,
}

impl ParseError {
    fn new(message: String, span: Option<Span>) -> Self {
        Self { message, span }
    }

    fn at_position(message: String, span: Span) -> Self {
        Self { message, span: Some(span) }
    }
}

fn format_span(span: &Option<Span>) -> String {
    match span {
        Some(span) => format!(" (位置 {}-{})", span.start, span.end),
        None => String::new(),
    }
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token<'a>], env: ConstantRef) -> Self {
        Self {
            tokens,
            position: 0,
            depth: 0,
            env,
            parameter: "",
        }
    }

    /// 返回当前 token，不推进位置
    fn peek(&self) -> Option<&'a Token<'a>> {
        self.tokens.get(self.position)
    }

    /// 返回下一个 token，不推进位置
    fn peek_next(&self) -> Option<&'a Token<'a>> {
        self.tokens.get(self.position + 1)
    }

    /// 返回当前 token 并推进位置
    fn advance(&mut self) -> Option<&'a Token<'a>> {
        let token = self.tokens.get(self.position)?;
        self.position += 1;
        Some(token)
    }

    /// 期望特定类型的 token 并推进，否则返回错误
    fn expect(&mut self, expected: TokenKind) -> Result<&'a Token<'a>, ParseError> {
        match self.peek() {
            Some(token) if std::mem::discriminant(&token.kind) == std::mem::discriminant(&expected) => {
                self.position += 1;
                Ok(token)
            }
            Some(token) => Err(ParseError::at_position(
                format!("Expected {:?}, found {:?}", expected, token.kind),
                token.span,
            )),
            None => Err(ParseError::new(
                format!("Expected {:?}, but reached end of input", expected),
                None,
            )),
        }
    }

    /// 期望一个标识符并返回它的文本
    fn expect_identifier(&mut self) -> Result<(&'a str, Span), ParseError> {
        let token = self.expect(TokenKind::Identifier(""))?;
        match token.kind {
            TokenKind::Identifier(name) => Ok((name, token.span)),
            _ => unreachable!("expect() checked the token kind"),
        }
    }

    /// 检查当前 token 是否匹配给定类型
    fn match_token(&self, kind: &TokenKind) -> bool {
        self.peek()
            .is_some_and(|token| std::mem::discriminant(&token.kind) == std::mem::discriminant(kind))
    }

    /// 当前 token 对应的比较运算符
    fn comparison_operator(&self) -> Option<CompareOp> {
        let op = match self.peek()?.kind {
            TokenKind::EqEq => CompareOp::Equal,
            TokenKind::NotEq => CompareOp::NotEqual,
            TokenKind::Gt => CompareOp::GreaterThan,
            TokenKind::Gte => CompareOp::GreaterOrEqual,
            TokenKind::Lt => CompareOp::LessThan,
            TokenKind::Lte => CompareOp::LessOrEqual,
            TokenKind::Percent => CompareOp::Modulo,
            _ => return None,
        };
        Some(op)
    }

    fn end_of_input_error(&self, what: &str) -> ParseError {
        ParseError::new(format!("Expected {}, but reached end of input", what), None)
    }

    pub fn parse(&mut self) -> Result<PredicateNode, ParseError> {
        self.expect(TokenKind::Pipe)?;
        let (parameter, _) = self.expect_identifier()?;
        self.parameter = parameter;
        self.expect(TokenKind::Pipe)?;

        let body = self.parse_or_expression()?;

        if let Some(token) = self.peek() {
            return Err(ParseError::at_position(
                format!("Unexpected token: {:?}", token.kind),
                token.span,
            ));
        }
        Ok(body)
    }

    /// 解析 OR 表达式 (最低优先级), 左结合
    fn parse_or_expression(&mut self) -> Result<PredicateNode, ParseError> {
        let mut left = self.parse_xor_expression()?;
        while self.match_token(&TokenKind::OrOr) {
            self.advance();
            let right = self.parse_xor_expression()?;
            left = PredicateNode::logical(LogicalOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_xor_expression(&mut self) -> Result<PredicateNode, ParseError> {
        let mut left = self.parse_and_expression()?;
        while self.match_token(&TokenKind::Caret) {
            self.advance();
            let right = self.parse_and_expression()?;
            left = PredicateNode::logical(LogicalOp::ExclusiveOr, left, right);
        }
        Ok(left)
    }

    fn parse_and_expression(&mut self) -> Result<PredicateNode, ParseError> {
        let mut left = self.parse_unary_expression()?;
        while self.match_token(&TokenKind::AndAnd) {
            self.advance();
            let right = self.parse_unary_expression()?;
            left = PredicateNode::logical(LogicalOp::And, left, right);
        }
        Ok(left)
    }

    /// 进入一层嵌套执行 `parse`, 超过 [`MAX_NESTING_DEPTH`] 时报错
    fn nested<T>(
        &mut self,
        span: Span,
        parse: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParseError::at_position(
                format!("Expression nested deeper than {} levels", MAX_NESTING_DEPTH),
                span,
            ));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn parse_unary_expression(&mut self) -> Result<PredicateNode, ParseError> {
        if let Some(token) = self.peek().filter(|t| t.kind == TokenKind::Bang) {
            self.advance();
            let inner = self.nested(token.span, Self::parse_unary_expression)?;
            return Ok(PredicateNode::Negation(Box::new(inner)));
        }
        self.parse_primary_expression()
    }

    fn parse_primary_expression(&mut self) -> Result<PredicateNode, ParseError> {
        let token = self.peek().ok_or_else(|| self.end_of_input_error("an expression"))?;

        match token.kind {
            TokenKind::LParen => {
                self.advance();
                let inner = self.nested(token.span, Self::parse_or_expression)?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::True => {
                self.advance();
                Ok(PredicateNode::Constant(true))
            }
            TokenKind::False => {
                self.advance();
                Ok(PredicateNode::Constant(false))
            }
            TokenKind::Identifier(_) => {
                let field = self.parse_field()?;
                match self.comparison_operator() {
                    Some(op) => {
                        self.advance();
                        let value = self.parse_operand()?;
                        Ok(PredicateNode::comparison(op, field, value))
                    }
                    None => Ok(PredicateNode::FieldTest(field)),
                }
            }
            _ => Err(ParseError::at_position(
                format!("Unexpected token: {:?}", token.kind),
                token.span,
            )),
        }
    }

    /// 解析 `p.Field`, 只允许一级字段
    fn parse_field(&mut self) -> Result<FieldRef, ParseError> {
        let (name, span) = self.expect_identifier()?;
        if name != self.parameter {
            return Err(ParseError::at_position(
                format!("Left operand must be a field of `{}`, found `{}`", self.parameter, name),
                span,
            ));
        }
        self.expect(TokenKind::Dot)?;
        let (field, _) = self.expect_identifier()?;

        if let Some(token) = self.peek().filter(|t| t.kind == TokenKind::Dot) {
            return Err(ParseError::at_position(
                format!("Nested field paths are not supported: {}.{}", name, field),
                token.span,
            ));
        }
        Ok(FieldRef::new(name, field))
    }

    /// 解析比较运算的右操作数, 后面可以跟任意个 `as T`
    fn parse_operand(&mut self) -> Result<ValueExpr, ParseError> {
        let mut value = self.parse_value()?;
        while self.match_token(&TokenKind::As) {
            self.advance();
            self.expect_identifier()?;
            value = ValueExpr::converted(value);
        }
        Ok(value)
    }

    fn parse_value(&mut self) -> Result<ValueExpr, ParseError> {
        let token = self.advance().ok_or_else(|| self.end_of_input_error("a value"))?;

        match token.kind {
            TokenKind::String(s) => Ok(ValueExpr::literal(s)),
            TokenKind::Integer(n) => Ok(ValueExpr::literal(n)),
            TokenKind::Float(x) => Ok(ValueExpr::literal(x)),
            TokenKind::True => Ok(ValueExpr::literal(true)),
            TokenKind::False => Ok(ValueExpr::literal(false)),
            TokenKind::Minus => self.parse_negative_number(token.span),
            TokenKind::Identifier("Uuid") if self.match_token(&TokenKind::ColonColon) => {
                self.parse_uuid_constructor()
            }
            TokenKind::Identifier("uuid") if self.match_token(&TokenKind::Bang) => {
                self.parse_uuid_macro()
            }
            TokenKind::Identifier(name) if name == self.parameter => Err(ParseError::at_position(
                format!("Comparing two fields of `{}` is not supported", self.parameter),
                token.span,
            )),
            TokenKind::Identifier(name) => self.parse_captured(name),
            _ => Err(ParseError::at_position(
                format!("Expected a value, found {:?}", token.kind),
                token.span,
            )),
        }
    }

    /// `-` 之后必须是数字
    fn parse_negative_number(&mut self, minus: Span) -> Result<ValueExpr, ParseError> {
        match self.advance().map(|t| &t.kind) {
            Some(TokenKind::Integer(n)) => Ok(ValueExpr::literal(-n)),
            Some(TokenKind::Float(x)) => Ok(ValueExpr::literal(-x)),
            _ => Err(ParseError::at_position("Expected a number after '-'".to_string(), minus)),
        }
    }

    /// `Uuid::nil()`
    fn parse_uuid_constructor(&mut self) -> Result<ValueExpr, ParseError> {
        self.expect(TokenKind::ColonColon)?;
        let (name, span) = self.expect_identifier()?;
        if name != "nil" {
            return Err(ParseError::at_position(
                format!("Unsupported Uuid constructor: {}", name),
                span,
            ));
        }
        self.expect(TokenKind::LParen)?;
        self.expect(TokenKind::RParen)?;
        Ok(ValueExpr::literal(Uuid::nil()))
    }

    /// `uuid!("f47ac10b-58cc-4372-a567-0e02b2c3d479")`
    fn parse_uuid_macro(&mut self) -> Result<ValueExpr, ParseError> {
        self.expect(TokenKind::Bang)?;
        self.expect(TokenKind::LParen)?;
        let token = self.expect(TokenKind::String(""))?;
        let TokenKind::String(text) = token.kind else {
            unreachable!("expect() checked the token kind")
        };
        let id = Uuid::parse_str(text).map_err(|e| {
            ParseError::at_position(format!("Invalid uuid literal {:?}: {}", text, e), token.span)
        })?;
        self.expect(TokenKind::RParen)?;
        Ok(ValueExpr::literal(Value::UniqueId(id)))
    }

    /// 捕获变量 `name` 或 `name.member`; 成员是否存在留到翻译时检查
    fn parse_captured(&mut self, name: &'a str) -> Result<ValueExpr, ParseError> {
        let is_member_access = self.match_token(&TokenKind::Dot)
            && matches!(self.peek_next().map(|t| &t.kind), Some(TokenKind::Identifier(_)));
        if !is_member_access {
            return Ok(ValueExpr::field_of(self.env.clone(), name));
        }

        self.advance(); // 消费 '.'
        let (member, _) = self.expect_identifier()?;

        if let Some(token) = self.peek().filter(|t| t.kind == TokenKind::Dot) {
            return Err(ParseError::at_position(
                format!("Member paths deeper than two levels are not supported: {}.{}", name, member),
                token.span,
            ));
        }
        Ok(ValueExpr::field_of_field(self.env.clone(), name, member))
    }
}
