mod common;

use proptest::prelude::*;

use rox::expr::ExprIds;
use rox::parser::Parser;
use rox::resolver::{Locals, Resolver};
use rox::scanner::Scanner;

use common::{references, run_ok};

/// One significant lexeme: identifier, keyword, number, string or operator.
fn lexeme() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z_][a-z0-9_]{0,6}",
        "[0-9]{1,4}(\\.[0-9]{1,3})?",
        "\"[a-z ]{0,5}\"",
        prop::sample::select(vec![
            "(", ")", "{", "}", ",", ".", "-", "+", ";", "*", "/", "!", "!=", "=", "==", "<",
            "<=", ">", ">=", "and", "class", "fun", "nil", "or", "while",
        ])
        .prop_map(str::to_owned),
    ]
}

/// Insignificant text between lexemes. Never empty, so neighbours cannot merge.
fn separator() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![" ", "\n", "\t", "  \r\n", " // note ( \" \n"])
}

proptest! {
    #[test]
    fn lexemes_reproduce_significant_text(
        pieces in prop::collection::vec((lexeme(), separator()), 0..40)
    ) {
        let mut source = String::new();
        let mut expected = String::new();
        for (piece, sep) in &pieces {
            source.push_str(piece);
            source.push_str(sep);
            expected.push_str(piece);
        }

        let (tokens, errors) = Scanner::new(&source).scan_all();
        prop_assert!(errors.is_empty());

        let joined: String = tokens.iter().map(|t| t.lexeme.as_str()).collect();
        prop_assert_eq!(joined, expected);
        prop_assert_eq!(tokens.len(), pieces.len() + 1);
    }

    #[test]
    fn nested_blocks_read_the_innermost_binding(
        shadows in prop::collection::vec(any::<bool>(), 1..10)
    ) {
        let depth = shadows.len();
        let assigned = owner(&shadows, depth);
        let value_at = |level: usize| {
            let o = owner(&shadows, level);
            if o == assigned { o + 100 } else { o }
        };

        let mut expected = vec![assigned.to_string(), (assigned + 100).to_string()];
        for level in (0..depth).rev() {
            expected.push(value_at(level).to_string());
        }

        prop_assert_eq!(run_ok(&nested_source(&shadows)), expected);
    }

    #[test]
    fn nested_block_distances_count_frames_to_the_owner(
        shadows in prop::collection::vec(any::<bool>(), 1..10)
    ) {
        let depth = shadows.len();
        let (tokens, _) = Scanner::new(&nested_source(&shadows)).scan_all();
        let mut ids = ExprIds::new();
        let statements = Parser::new(tokens, &mut ids).parse().unwrap();
        let locals: Locals = Resolver::new().resolve(&statements).unwrap();

        // Globals stay out of the table; a local is as many frames away as
        // levels separate the reference from its declaration.
        let distance = |level: usize| match owner(&shadows, level) {
            0 => None,
            o => Some(level - o),
        };

        // Innermost line: `print x`, the `x` read and the assignment, `print x`.
        let mut expected = vec![distance(depth); 4];
        for level in (0..depth).rev() {
            expected.push(distance(level));
        }

        let actual: Vec<Option<usize>> = references(&statements, "x")
            .iter()
            .map(|id| locals.get(id).copied())
            .collect();
        prop_assert_eq!(actual, expected);
    }
}

/// `var x = 0;` at level 0, then one block per entry, declaring its own `x`
/// when the entry is set. The innermost block prints, bumps and prints `x`;
/// every closing brace is followed by another `print x;`.
fn nested_source(shadows: &[bool]) -> String {
    let mut source = String::from("var x = 0;\n");
    for (i, &shadow) in shadows.iter().enumerate() {
        source.push('{');
        if shadow {
            source.push_str(&format!(" var x = {};", i + 1));
        }
        source.push('\n');
    }
    source.push_str("print x; x = x + 100; print x;\n");
    for _ in shadows {
        source.push_str("}\nprint x;\n");
    }
    source
}

/// Level whose `x` is visible at `level`: the nearest shadowing one, else 0.
fn owner(shadows: &[bool], level: usize) -> usize {
    (1..=level).rev().find(|&k| shadows[k - 1]).unwrap_or(0)
}
