//! Whitespace tokenizing for statement input.

/// Splits a line on whitespace into tokens. No quoting, no escaping — the
/// grammar this engine accepts (`insert <id> <username> <email>`, `select`)
/// never needs either.
pub fn tokenize(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_runs_of_whitespace() {
        assert_eq!(
            tokenize("insert  1\talice alice@example.com"),
            vec!["insert", "1", "alice", "alice@example.com"]
        );
    }
}
