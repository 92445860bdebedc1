//! 闭包谓词的词法分析器

use crate::token::{Span, Token, TokenKind};

pub struct Lexer<'a> {
    input: &'a str,
    /// 输入字符串中的当前位置（字节索引）
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer { input, position: 0 }
    }

    /// 返回当前位置的字符，不推进位置
    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    /// 返回下一个位置的字符，不推进位置
    fn peek_next(&self) -> Option<char> {
        self.input[self.position..].chars().nth(1)
    }

    /// 推进位置一个字符并返回该字符
    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if let Some(c) = c {
            self.position += c.len_utf8();
        }
        c
    }

    /// 跳过空白字符
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    /// 下一个字符是 `expected` 时消费它，生成 `double`，否则生成 `single`
    fn either(&mut self, start: usize, expected: char, double: TokenKind<'a>, single: TokenKind<'a>) -> Token<'a> {
        let kind = if self.peek() == Some(expected) {
            self.bump();
            double
        } else {
            single
        };
        Token { kind, span: Span::new(start, self.position) }
    }

    /// 读取数字字面量，`.` 后面跟数字时为浮点数
    fn read_number(&mut self, start: usize) -> Token<'a> {
        self.skip_digits();
        let mut is_float = false;
        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            self.bump(); // 消费 '.'
            self.skip_digits();
        }

        let literal = self.input[start..self.position].replace('_', "");
        let kind = if is_float {
            literal.parse::<f64>().map(TokenKind::Float).unwrap_or(TokenKind::Illegal)
        } else {
            // 超出 i64 范围时视为非法
            literal.parse::<i64>().map(TokenKind::Integer).unwrap_or(TokenKind::Illegal)
        };
        Token { kind, span: Span::new(start, self.position) }
    }

    fn skip_digits(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
    }

    /// 读取双引号包围的字符串字面量，不处理转义
    /// 注意：开始的引号已经被调用者消费
    fn read_string(&mut self, start: usize) -> Token<'a> {
        let content_start = self.position;
        while let Some(c) = self.peek() {
            if c == '"' {
                break;
            }
            self.bump();
        }
        let content_end = self.position;

        // 没有结束引号
        if self.bump().is_none() {
            return Token { kind: TokenKind::Illegal, span: Span::new(start, self.position) };
        }

        let content = &self.input[content_start..content_end];
        Token {
            kind: TokenKind::String(content),
            span: Span::new(start, self.position),
        }
    }

    /// 读取标识符或关键字
    fn read_identifier(&mut self, start: usize) -> Token<'a> {
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
        let literal = &self.input[start..self.position];
        Token { kind: match_keyword(literal), span: Span::new(start, self.position) }
    }
}

fn match_keyword(s: &str) -> TokenKind {
    match s {
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "as" => TokenKind::As,
        _ => TokenKind::Identifier(s),
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_whitespace();
        let start = self.position;

        let Some(c) = self.bump() else {
            return None; // 到达输入末尾
        };

        let token = match c {
            '(' => Token { kind: TokenKind::LParen, span: Span::new(start, self.position) },
            ')' => Token { kind: TokenKind::RParen, span: Span::new(start, self.position) },
            '.' => Token { kind: TokenKind::Dot, span: Span::new(start, self.position) },
            '-' => Token { kind: TokenKind::Minus, span: Span::new(start, self.position) },
            '^' => Token { kind: TokenKind::Caret, span: Span::new(start, self.position) },
            '%' => Token { kind: TokenKind::Percent, span: Span::new(start, self.position) },
            '|' => self.either(start, '|', TokenKind::OrOr, TokenKind::Pipe),
            '&' => self.either(start, '&', TokenKind::AndAnd, TokenKind::Illegal),
            ':' => self.either(start, ':', TokenKind::ColonColon, TokenKind::Illegal),
            '=' => self.either(start, '=', TokenKind::EqEq, TokenKind::Illegal),
            '!' => self.either(start, '=', TokenKind::NotEq, TokenKind::Bang),
            '<' => self.either(start, '=', TokenKind::Lte, TokenKind::Lt),
            '>' => self.either(start, '=', TokenKind::Gte, TokenKind::Gt),
            '"' => self.read_string(start),
            c if c.is_ascii_digit() => self.read_number(start),
            c if c.is_alphabetic() || c == '_' => self.read_identifier(start),
            _ => Token { kind: TokenKind::Illegal, span: Span::new(start, self.position) },
        };
        Some(token)
    }
}
