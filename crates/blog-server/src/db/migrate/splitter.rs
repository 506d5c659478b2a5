//! SQL script splitting
//!
//! A migration file may hold many statements. The scanner below splits on
//! `;` only outside of quoted strings, quoted identifiers, dollar-quoted
//! bodies and comments. Comments are dropped from the output.
//!
//! Quotes are closed by the next matching quote character, so the SQL
//! standard doubled quote (`'it''s'`) works as expected. Backslash escapes
//! (`E'\''`) are not recognised.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State<'a> {
    Code,
    Quoted(char),
    LineComment,
    BlockComment(u32),
    DollarQuoted(&'a str),
}

/// Split a SQL script into trimmed, non-empty statements without their
/// terminating `;`.
pub fn split_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut state = State::Code;
    let mut rest = sql;

    while let Some(ch) = rest.chars().next() {
        let mut consumed = ch.len_utf8();

        match state {
            State::Code => {
                if rest.starts_with("--") {
                    state = State::LineComment;
                    consumed = 2;
                } else if rest.starts_with("/*") {
                    state = State::BlockComment(1);
                    current.push(' ');
                    consumed = 2;
                } else if ch == '\'' || ch == '"' {
                    state = State::Quoted(ch);
                    current.push(ch);
                } else if let Some(tag) =
                    dollar_tag(rest).filter(|_| !continues_identifier(&current))
                {
                    state = State::DollarQuoted(tag);
                    current.push_str(tag);
                    consumed = tag.len();
                } else if ch == ';' {
                    finish(&mut current, &mut statements);
                } else {
                    current.push(ch);
                }
            },
            State::Quoted(quote) => {
                current.push(ch);
                if ch == quote {
                    state = State::Code;
                }
            },
            State::LineComment => {
                if ch == '\n' {
                    current.push('\n');
                    state = State::Code;
                }
            },
            State::BlockComment(depth) => {
                if rest.starts_with("*/") {
                    state = if depth == 1 {
                        State::Code
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    consumed = 2;
                } else if rest.starts_with("/*") {
                    state = State::BlockComment(depth + 1);
                    consumed = 2;
                }
            },
            State::DollarQuoted(tag) => {
                if rest.starts_with(tag) {
                    current.push_str(tag);
                    state = State::Code;
                    consumed = tag.len();
                } else {
                    current.push(ch);
                }
            },
        }

        rest = &rest[consumed..];
    }

    finish(&mut current, &mut statements);
    statements
}

fn finish(current: &mut String, statements: &mut Vec<String>) {
    let statement = current.trim();
    if !statement.is_empty() {
        statements.push(statement.to_string());
    }
    current.clear();
}

/// `$` directly after an identifier character belongs to the identifier
/// (`t$x`), so it cannot open a dollar quote.
fn continues_identifier(current: &str) -> bool {
    current
        .chars()
        .next_back()
        .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Opening dollar-quote tag (`$$` or `$name$`) at the start of `input`.
/// Positional parameters such as `$1` are not tags.
fn dollar_tag(input: &str) -> Option<&str> {
    let body = input.strip_prefix('$')?;
    let end = body.find('$')?;
    let name = &body[..end];

    let valid = name.is_empty()
        || (!name.starts_with(|c: char| c.is_ascii_digit())
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));

    valid.then(|| &input[..end + 2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semicolon_inside_string() {
        let statements = split_statements("INSERT INTO t(x) VALUES ('a;b');");
        assert_eq!(statements, vec!["INSERT INTO t(x) VALUES ('a;b')"]);
    }

    #[test]
    fn test_multiple_statements() {
        let sql = "CREATE TABLE a (id INT);\n\nCREATE TABLE b (id INT);\n";
        assert_eq!(
            split_statements(sql),
            vec!["CREATE TABLE a (id INT)", "CREATE TABLE b (id INT)"]
        );
    }

    #[test]
    fn test_missing_final_semicolon() {
        assert_eq!(split_statements("SELECT 1; SELECT 2"), vec!["SELECT 1", "SELECT 2"]);
    }

    #[test]
    fn test_empty_statements_skipped() {
        assert!(split_statements(" ;; \n ; ").is_empty());
        assert!(split_statements("").is_empty());
    }

    #[test]
    fn test_doubled_quote_escape() {
        let statements = split_statements("SELECT 'it''s; fine'; SELECT 2;");
        assert_eq!(statements, vec!["SELECT 'it''s; fine'", "SELECT 2"]);
    }

    #[test]
    fn test_quoted_identifier() {
        let statements = split_statements(r#"CREATE TABLE "odd;name" (id INT);"#);
        assert_eq!(statements, vec![r#"CREATE TABLE "odd;name" (id INT)"#]);
    }

    #[test]
    fn test_line_comment_removed() {
        let sql = "-- create things; really\nCREATE TABLE a (id INT); -- trailing; note\n";
        assert_eq!(split_statements(sql), vec!["CREATE TABLE a (id INT)"]);
    }

    #[test]
    fn test_block_comment_removed() {
        let sql = "/* header; with semicolons */ SELECT 1; /* outer /* nested; */ still; */ SELECT 2;";
        assert_eq!(split_statements(sql), vec!["SELECT 1", "SELECT 2"]);
    }

    #[test]
    fn test_comment_markers_inside_string_kept() {
        let statements = split_statements("SELECT '--not a comment; /* nor this */';");
        assert_eq!(statements, vec!["SELECT '--not a comment; /* nor this */'"]);
    }

    #[test]
    fn test_dollar_quoted_function_body() {
        let sql = r#"
CREATE FUNCTION touch() RETURNS trigger AS $$
BEGIN
    NEW.updated_at = NOW();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TABLE a (id INT);
"#;
        let statements = split_statements(sql);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("CREATE FUNCTION touch()"));
        assert!(statements[0].ends_with("$$ LANGUAGE plpgsql"));
        assert!(statements[0].contains("RETURN NEW;"));
        assert_eq!(statements[1], "CREATE TABLE a (id INT)");
    }

    #[test]
    fn test_named_dollar_tag() {
        let sql = "DO $body$ BEGIN PERFORM 1; END $body$; SELECT 1;";
        assert_eq!(
            split_statements(sql),
            vec!["DO $body$ BEGIN PERFORM 1; END $body$", "SELECT 1"]
        );
    }

    #[test]
    fn test_positional_parameter_is_not_a_tag() {
        let sql = "PREPARE p AS SELECT $1; SELECT 2;";
        assert_eq!(split_statements(sql), vec!["PREPARE p AS SELECT $1", "SELECT 2"]);
    }

    #[test]
    fn test_dollar_inside_identifier_is_not_a_tag() {
        let sql = "CREATE TABLE t$x$ (id INT); CREATE TABLE b (id INT); SELECT 1 AS t$x$;";
        assert_eq!(
            split_statements(sql),
            vec![
                "CREATE TABLE t$x$ (id INT)",
                "CREATE TABLE b (id INT)",
                "SELECT 1 AS t$x$"
            ]
        );
    }

    #[test]
    fn test_dollar_quote_after_whitespace_or_operator() {
        let sql = "SELECT $a$x;y$a$||$$z$$; SELECT 2;";
        assert_eq!(
            split_statements(sql),
            vec!["SELECT $a$x;y$a$||$$z$$", "SELECT 2"]
        );
    }

    #[test]
    fn test_dollar_tag_detection() {
        assert_eq!(dollar_tag("$$ body"), Some("$$"));
        assert_eq!(dollar_tag("$fn$ body"), Some("$fn$"));
        assert_eq!(dollar_tag("$1, $2"), None);
        assert_eq!(dollar_tag("$ no close"), None);
        assert_eq!(dollar_tag("plain"), None);
    }

    #[test]
    fn test_non_ascii_text() {
        let statements = split_statements("INSERT INTO t VALUES ('привет; мир'); SELECT 'é';");
        assert_eq!(
            statements,
            vec!["INSERT INTO t VALUES ('привет; мир')", "SELECT 'é'"]
        );
    }
}
