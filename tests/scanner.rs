#[cfg(test)]
mod scanner_tests {
    use pretty_assertions::assert_eq;
    use rox as lox;

    use lox::error::LoxError;
    use lox::expr::LiteralValue;
    use lox::scanner::*;
    use lox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source);
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_two_char_operators() {
        assert_token_sequence(
            "! != = == < <= > >= /",
            &[
                (TokenType::BANG, "!"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL, "="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS, "<"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER, ">"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::SLASH, "/"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_keywords_and_identifiers() {
        assert_token_sequence(
            "class classy fun _under var2 nil orchid or",
            &[
                (TokenType::CLASS, "class"),
                (TokenType::IDENTIFIER, "classy"),
                (TokenType::FUN, "fun"),
                (TokenType::IDENTIFIER, "_under"),
                (TokenType::IDENTIFIER, "var2"),
                (TokenType::NIL, "nil"),
                (TokenType::IDENTIFIER, "orchid"),
                (TokenType::OR, "or"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_numbers() {
        let (tokens, errors) = Scanner::new("12 3.25 7. .5").scan_all();
        assert!(errors.is_empty());

        let kinds: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
        assert_eq!(
            kinds,
            vec![
                "NUMBER 12 12.0",
                "NUMBER 3.25 3.25",
                // trailing dot is not part of the number
                "NUMBER 7 7.0",
                "DOT . null",
                "DOT . null",
                "NUMBER 5 5.0",
                "EOF  null",
            ]
        );
        assert_eq!(tokens[1].literal(), Some(LiteralValue::Number(3.25)));
    }

    #[test]
    fn test_scanner_05_strings_span_lines() {
        let (tokens, errors) = Scanner::new("\"one\ntwo\" x").scan_all();
        assert!(errors.is_empty());

        assert_eq!(tokens[0].token_type, TokenType::STRING(String::new()));
        assert_eq!(tokens[0].lexeme, "\"one\ntwo\"");
        assert_eq!(tokens[0].literal(), Some(LiteralValue::Str("one\ntwo".into())));
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn test_scanner_06_unterminated_string() {
        let (tokens, errors) = Scanner::new("print \"abc").scan_all();

        assert_eq!(tokens.len(), 2); // PRINT, EOF
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "[line 1] Error: Unterminated string.");
    }

    #[test]
    fn test_scanner_07_comments_and_lines() {
        let (tokens, errors) = Scanner::new("a // ignored ( ) \"\nb\n\n// tail").scan_all();
        assert!(errors.is_empty());

        let lines: Vec<(String, usize)> = tokens.iter().map(|t| (t.lexeme.clone(), t.line)).collect();
        assert_eq!(
            lines,
            vec![("a".into(), 1), ("b".into(), 2), ("".into(), 4)]
        );
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let source = ",.$(#";
        let scanner = Scanner::new(source);

        // Collect all results (both tokens and errors)
        let results: Vec<_> = scanner.collect();

        // 0: COMMA ','
        // 1: DOT '.'
        // 2: Error for '$'
        // 3: LEFT_PAREN '('
        // 4: Error for '#'
        // 5: EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 2, "Expected 2 error messages");

        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert_eq!(err.to_string(), "[line 1] Error: Unexpected character.");
        }

        fn assert_token_matches(
            result: &Result<Token, LoxError>,
            expected_type: TokenType,
            expected_lexeme: &str,
        ) {
            match result {
                Ok(token) => {
                    assert_eq!(token.token_type, expected_type);
                    assert_eq!(token.lexeme, expected_lexeme);
                }
                Err(e) => panic!("Expected token but got error: {}", e),
            }
        }
    }

    #[test]
    fn test_multibyte_character_is_one_error() {
        let (tokens, errors) = Scanner::new("a é b \"ünï\"").scan_all();

        assert_eq!(errors.len(), 1);
        let lexemes: Vec<&str> = tokens.iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(lexemes, vec!["a", "b", "\"ünï\"", ""]);
    }

    #[test]
    fn test_exactly_one_eof() {
        let mut scanner = Scanner::new("");
        assert!(matches!(scanner.next(), Some(Ok(t)) if t.token_type == TokenType::EOF));
        assert!(scanner.next().is_none());
        assert!(scanner.next().is_none());
    }
}
