use crate::registry::{ToolContext, ToolDyn, ToolError};
use regex::Regex;
use serde_json::{json, Value};
use std::future::Future;
use std::pin::Pin;
use std::sync::LazyLock;

static ALLOWED_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9+\-*/().\s]+$").expect("valid regex")
});

/// Evaluates a four-function arithmetic expression. Inputs containing any
/// character outside `[0-9+\-*/().\s]` are rejected without evaluation.
pub struct CalculatorTool;

impl ToolDyn for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Evaluate a basic arithmetic expression using +, -, *, /, and parentheses."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "An arithmetic expression, e.g. \"(2 + 3) * 4\"."
                }
            },
            "required": ["expression"],
            "additionalProperties": false
        })
    }

    fn call(
        &self,
        args: Value,
        _ctx: ToolContext,
    ) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let expression = args
                .get("expression")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    ToolError::InvalidInput("missing required field: expression".into())
                })?
                .to_string();

            if !ALLOWED_CHARS.is_match(&expression) {
                return Err(ToolError::InvalidInput(format!(
                    "expression contains disallowed characters: {expression}"
                )));
            }

            let value = eval::evaluate(&expression)
                .map_err(|e| ToolError::InvalidInput(format!("could not evaluate: {e}")))?;

            Ok(json!({
                "expression": expression,
                "value": value,
            }))
        })
    }
}

/// A minimal recursive-descent evaluator for the `[0-9+\-*/().\s]` grammar.
/// No external crate carries exactly this grammar, so it is hand-rolled
/// rather than pulled in as a dependency for four operators.
mod eval {
    #[derive(Debug)]
    pub struct EvalError(String);

    impl std::fmt::Display for EvalError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    pub fn evaluate(expression: &str) -> Result<f64, EvalError> {
        let tokens = tokenize(expression)?;
        let mut parser = Parser { tokens, pos: 0 };
        let value = parser.parse_expr()?;
        if parser.pos != parser.tokens.len() {
            return Err(EvalError("unexpected trailing input".into()));
        }
        Ok(value)
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Token {
        Number(f64),
        Plus,
        Minus,
        Star,
        Slash,
        LParen,
        RParen,
    }

    fn tokenize(input: &str) -> Result<Vec<Token>, EvalError> {
        let mut tokens = Vec::new();
        let chars: Vec<char> = input.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            match c {
                ' ' | '\t' | '\n' | '\r' => i += 1,
                '+' => {
                    tokens.push(Token::Plus);
                    i += 1;
                }
                '-' => {
                    tokens.push(Token::Minus);
                    i += 1;
                }
                '*' => {
                    tokens.push(Token::Star);
                    i += 1;
                }
                '/' => {
                    tokens.push(Token::Slash);
                    i += 1;
                }
                '(' => {
                    tokens.push(Token::LParen);
                    i += 1;
                }
                ')' => {
                    tokens.push(Token::RParen);
                    i += 1;
                }
                '0'..='9' | '.' => {
                    let start = i;
                    while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                        i += 1;
                    }
                    let text: String = chars[start..i].iter().collect();
                    let value = text
                        .parse::<f64>()
                        .map_err(|_| EvalError(format!("invalid number: {text}")))?;
                    tokens.push(Token::Number(value));
                }
                other => return Err(EvalError(format!("unexpected character: {other}"))),
            }
        }
        Ok(tokens)
    }

    struct Parser {
        tokens: Vec<Token>,
        pos: usize,
    }

    impl Parser {
        fn peek(&self) -> Option<&Token> {
            self.tokens.get(self.pos)
        }

        fn advance(&mut self) -> Option<Token> {
            let t = self.tokens.get(self.pos).cloned();
            self.pos += 1;
            t
        }

        // expr := term (('+' | '-') term)*
        fn parse_expr(&mut self) -> Result<f64, EvalError> {
            let mut value = self.parse_term()?;
            loop {
                match self.peek() {
                    Some(Token::Plus) => {
                        self.advance();
                        value += self.parse_term()?;
                    }
                    Some(Token::Minus) => {
                        self.advance();
                        value -= self.parse_term()?;
                    }
                    _ => break,
                }
            }
            Ok(value)
        }

        // term := factor (('*' | '/') factor)*
        fn parse_term(&mut self) -> Result<f64, EvalError> {
            let mut value = self.parse_factor()?;
            loop {
                match self.peek() {
                    Some(Token::Star) => {
                        self.advance();
                        value *= self.parse_factor()?;
                    }
                    Some(Token::Slash) => {
                        self.advance();
                        let divisor = self.parse_factor()?;
                        if divisor == 0.0 {
                            return Err(EvalError("division by zero".into()));
                        }
                        value /= divisor;
                    }
                    _ => break,
                }
            }
            Ok(value)
        }

        // factor := ('-' | '+')? primary
        fn parse_factor(&mut self) -> Result<f64, EvalError> {
            match self.peek() {
                Some(Token::Minus) => {
                    self.advance();
                    Ok(-self.parse_factor()?)
                }
                Some(Token::Plus) => {
                    self.advance();
                    self.parse_factor()
                }
                _ => self.parse_primary(),
            }
        }

        // primary := NUMBER | '(' expr ')'
        fn parse_primary(&mut self) -> Result<f64, EvalError> {
            match self.advance() {
                Some(Token::Number(n)) => Ok(n),
                Some(Token::LParen) => {
                    let value = self.parse_expr()?;
                    match self.advance() {
                        Some(Token::RParen) => Ok(value),
                        _ => Err(EvalError("expected closing parenthesis".into())),
                    }
                }
                other => Err(EvalError(format!("unexpected token: {other:?}"))),
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn evaluates_precedence() {
            assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
        }

        #[test]
        fn evaluates_parentheses() {
            assert_eq!(evaluate("(2 + 3) * 4").unwrap(), 20.0);
        }

        #[test]
        fn evaluates_unary_minus() {
            assert_eq!(evaluate("-5 + 2").unwrap(), -3.0);
        }

        #[test]
        fn rejects_division_by_zero() {
            assert!(evaluate("1 / 0").is_err());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shepherd_types::Purpose;

    fn ctx() -> ToolContext {
        ToolContext {
            purpose: Purpose::Default,
        }
    }

    #[tokio::test]
    async fn evaluates_simple_expression() {
        let tool = CalculatorTool;
        let result = tool.call(json!({"expression": "2 + 2"}), ctx()).await.unwrap();
        assert_eq!(result["value"], 4.0);
    }

    #[tokio::test]
    async fn rejects_non_arithmetic_characters() {
        let tool = CalculatorTool;
        let err = tool
            .call(json!({"expression": "2 + system(\"ls\")"}), ctx())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }
}
