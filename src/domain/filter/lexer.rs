//! Tokenizer for filter-query expressions

use super::FilterParseError;

/// A single filter-query token
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Attribute or property reference, possibly with a `.type_value` suffix
    Ident(String),
    /// Single-quoted string literal
    String(String),
    /// Numeric literal
    Number(f64),
    /// Boolean literal
    Bool(bool),
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
    ILike,
    And,
    Or,
    LParen,
    RParen,
}

/// Split a filter query into tokens. Keywords are case-insensitive.
pub fn tokenize(input: &str) -> Result<Vec<Token>, FilterParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '=' => {
                chars.next();
                tokens.push(Token::Eq);
            }
            '!' => {
                chars.next();
                match chars.next() {
                    Some('=') => tokens.push(Token::Ne),
                    _ => return Err(FilterParseError::new("expected '=' after '!'")),
                }
            }
            '<' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Le);
                } else {
                    tokens.push(Token::Lt);
                }
            }
            '>' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Ge);
                } else {
                    tokens.push(Token::Gt);
                }
            }
            '\'' => {
                chars.next();
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some('\'') => {
                            // doubled quote escapes a literal quote
                            if chars.peek() == Some(&'\'') {
                                chars.next();
                                value.push('\'');
                            } else {
                                break;
                            }
                        }
                        Some(c) => value.push(c),
                        None => {
                            return Err(FilterParseError::new("unterminated string literal"));
                        }
                    }
                }
                tokens.push(Token::String(value));
            }
            c if c.is_ascii_digit() || c == '-' => {
                let mut literal = String::new();
                literal.push(c);
                chars.next();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' {
                        literal.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let number: f64 = literal
                    .parse()
                    .map_err(|_| FilterParseError::new(format!("invalid number '{}'", literal)))?;
                tokens.push(Token::Number(number));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                        word.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                match word.to_ascii_uppercase().as_str() {
                    "AND" => tokens.push(Token::And),
                    "OR" => tokens.push(Token::Or),
                    "LIKE" => tokens.push(Token::Like),
                    "ILIKE" => tokens.push(Token::ILike),
                    "TRUE" => tokens.push(Token::Bool(true)),
                    "FALSE" => tokens.push(Token::Bool(false)),
                    _ => tokens.push(Token::Ident(word)),
                }
            }
            other => {
                return Err(FilterParseError::new(format!(
                    "unexpected character '{}'",
                    other
                )));
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_comparison() {
        let tokens = tokenize("budget.double_value > 12000").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("budget.double_value".to_string()),
                Token::Gt,
                Token::Number(12000.0),
            ]
        );
    }

    #[test]
    fn test_tokenize_boolean_composition() {
        let tokens = tokenize("project = 'nlp' AND (archived = false OR owner != 'me')").unwrap();
        assert_eq!(tokens[0], Token::Ident("project".to_string()));
        assert_eq!(tokens[1], Token::Eq);
        assert_eq!(tokens[2], Token::String("nlp".to_string()));
        assert_eq!(tokens[3], Token::And);
        assert_eq!(tokens[4], Token::LParen);
        assert!(tokens.contains(&Token::Bool(false)));
        assert!(tokens.contains(&Token::Or));
        assert_eq!(tokens.last(), Some(&Token::RParen));
    }

    #[test]
    fn test_tokenize_like_keywords_case_insensitive() {
        let tokens = tokenize("name ilike '%EXPERIMENT%'").unwrap();
        assert_eq!(tokens[1], Token::ILike);

        let tokens = tokenize("name Like 'v%'").unwrap();
        assert_eq!(tokens[1], Token::Like);
    }

    #[test]
    fn test_tokenize_quoted_escape() {
        let tokens = tokenize("name = 'it''s'").unwrap();
        assert_eq!(tokens[2], Token::String("it's".to_string()));
    }

    #[test]
    fn test_tokenize_negative_number() {
        let tokens = tokenize("delta >= -1.5").unwrap();
        assert_eq!(tokens[2], Token::Number(-1.5));
    }

    #[test]
    fn test_tokenize_errors() {
        assert!(tokenize("name = 'open").is_err());
        assert!(tokenize("name ! 'x'").is_err());
        assert!(tokenize("name = #").is_err());
    }
}
