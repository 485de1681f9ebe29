//! End-to-end REPL tests: spawn the built binary, pipe commands into its
//! stdin, and assert on the transcript printed to stdout. Each test gets its
//! own scratch database file so runs never interfere with each other.

use std::io::Write;
use std::process::{Command, Stdio};
use std::str;

fn spawn(db_path: &std::path::Path, input: &[String]) -> Vec<String> {
    let mut process = Command::new(env!("CARGO_BIN_EXE_mysqlite"))
        .arg(db_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to start mysqlite");

    let stdin = process.stdin.as_mut().expect("stdin not piped");
    for line in input {
        stdin
            .write_all(format!("{}\n", line).as_bytes())
            .unwrap_or_else(|_| panic!("unable to write command `{}`", line));
    }

    let output = process.wait_with_output().expect("process did not exit");
    str::from_utf8(&output.stdout)
        .expect("stdout was not utf8")
        .lines()
        .map(str::to_owned)
        .collect()
}

fn scratch_db(name: &str) -> std::path::PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("mysqlite-repl-test-{}-{}.db", name, std::process::id()));
    let _ = std::fs::remove_file(&path);
    path
}

#[test]
fn empty_select_prints_nothing() {
    let db = scratch_db("empty-select");
    let output = spawn(&db, &["select".to_string(), ".exit".to_string()]);
    assert_eq!(output, vec!["db > executed.".to_string(), "db > ".to_string()]);
    let _ = std::fs::remove_file(&db);
}

#[test]
fn insert_and_select_one_row() {
    let db = scratch_db("insert-select");
    let output = spawn(
        &db,
        &[
            "insert 1 alice alice@example.com".to_string(),
            "select".to_string(),
            ".exit".to_string(),
        ],
    );
    assert_eq!(
        output,
        vec![
            "db > executed.".to_string(),
            "db > (1, alice, alice@example.com)".to_string(),
            "executed.".to_string(),
            "db > ".to_string(),
        ]
    );
    let _ = std::fs::remove_file(&db);
}

#[test]
fn duplicate_key_is_rejected_and_select_is_unchanged() {
    let db = scratch_db("duplicate-key");
    let output = spawn(
        &db,
        &[
            "insert 1 alice alice@example.com".to_string(),
            "insert 1 bob bob@example.com".to_string(),
            "select".to_string(),
            ".exit".to_string(),
        ],
    );
    assert_eq!(
        output,
        vec![
            "db > executed.".to_string(),
            "db > error: duplicate key.".to_string(),
            "db > (1, alice, alice@example.com)".to_string(),
            "executed.".to_string(),
            "db > ".to_string(),
        ]
    );
    let _ = std::fs::remove_file(&db);
}

#[test]
fn overlong_username_is_rejected() {
    let db = scratch_db("overlong-username");
    let long_username = "a".repeat(33);
    let output = spawn(
        &db,
        &[
            format!("insert 1 {} x@x", long_username),
            "select".to_string(),
            ".exit".to_string(),
        ],
    );
    assert_eq!(
        output,
        vec![
            "db > string is too long".to_string(),
            "db > executed.".to_string(),
            "db > ".to_string(),
        ]
    );
    let _ = std::fs::remove_file(&db);
}

#[test]
fn negative_id_is_rejected() {
    let db = scratch_db("negative-id");
    let output = spawn(
        &db,
        &["insert -1 alice alice@example.com".to_string(), ".exit".to_string()],
    );
    assert_eq!(
        output,
        vec!["db > ID MUST BE POSITIVE".to_string(), "db > ".to_string()]
    );
    let _ = std::fs::remove_file(&db);
}

#[test]
fn unrecognized_meta_command_reports_and_continues() {
    let db = scratch_db("bad-meta");
    let output = spawn(&db, &[".frobnicate".to_string(), ".exit".to_string()]);
    assert_eq!(
        output,
        vec!["db > unrecognized command '.frobnicate'".to_string(), "db > ".to_string()]
    );
    let _ = std::fs::remove_file(&db);
}

#[test]
fn unrecognized_statement_reports_and_continues() {
    let db = scratch_db("bad-statement");
    let output = spawn(&db, &["delete 1".to_string(), ".exit".to_string()]);
    assert_eq!(
        output,
        vec![
            "db > unrecognized command at start of delete 1.".to_string(),
            "db > ".to_string(),
        ]
    );
    let _ = std::fs::remove_file(&db);
}

#[test]
fn leaf_split_rebalances_and_select_stays_in_order() {
    let db = scratch_db("leaf-split");
    // LEAF_NODE_MAX_CELLS is small (4096-byte pages, 295-byte cells, ~13
    // cells per leaf), so 400 rows forces many leaf splits and at least one
    // internal-node split without the test needing to hardcode the constant.
    let mut input: Vec<String> = (1..=400u32)
        .map(|id| format!("insert {id} user{id} user{id}@example.com"))
        .collect();
    input.push("select".to_string());
    input.push(".exit".to_string());

    let output = spawn(&db, &input);
    let selected: Vec<u32> = output
        .iter()
        .filter_map(|line| {
            line.strip_prefix("db > (")
                .or_else(|| line.strip_prefix('('))
                .and_then(|rest| rest.split(',').next())
                .and_then(|id| id.parse::<u32>().ok())
        })
        .collect();
    let expected: Vec<u32> = (1..=400u32).collect();
    assert_eq!(selected, expected);
    let _ = std::fs::remove_file(&db);
}

#[test]
fn data_persists_across_relaunch() {
    let db = scratch_db("persist");
    spawn(
        &db,
        &[
            "insert 1 alice alice@example.com".to_string(),
            "insert 2 bob bob@example.com".to_string(),
            ".exit".to_string(),
        ],
    );

    let output = spawn(&db, &["select".to_string(), ".exit".to_string()]);
    assert_eq!(
        output,
        vec![
            "db > (1, alice, alice@example.com)".to_string(),
            "(2, bob, bob@example.com)".to_string(),
            "executed.".to_string(),
            "db > ".to_string(),
        ]
    );
    let _ = std::fs::remove_file(&db);
}

#[test]
fn constants_prints_the_expected_labels() {
    let db = scratch_db("constants");
    let output = spawn(&db, &[".constants".to_string(), ".exit".to_string()]);
    assert!(output.iter().any(|l| l.contains("ROW_SIZE:")));
    assert!(output.iter().any(|l| l.contains("LEAF_NODE_MAX_CELLS:")));
    let _ = std::fs::remove_file(&db);
}

#[test]
fn btree_shows_one_split_as_an_internal_root_with_two_leaves() {
    let constants_db = scratch_db("btree-constants");
    let constants_output = spawn(&constants_db, &[".constants".to_string(), ".exit".to_string()]);
    let max_cells: u32 = constants_output
        .iter()
        .find_map(|l| l.strip_prefix("LEAF_NODE_MAX_CELLS: "))
        .expect("constants output includes LEAF_NODE_MAX_CELLS")
        .parse()
        .unwrap();
    let _ = std::fs::remove_file(&constants_db);

    let right_count = (max_cells + 2) / 2; // ceil((max_cells + 1) / 2)
    let left_count = (max_cells + 1) - right_count;

    let db = scratch_db("btree");
    let mut input: Vec<String> = (1..=max_cells + 1)
        .map(|id| format!("insert {id} user{id} user{id}@example.com"))
        .collect();
    input.push(".btree".to_string());
    input.push(".exit".to_string());

    let output = spawn(&db, &input);
    let btree_start = output
        .iter()
        .position(|l| l.ends_with("- internal (size 1)"))
        .expect("btree output includes the internal root");
    let btree: Vec<&str> = output[btree_start..].iter().map(String::as_str).collect();

    assert_eq!(btree[1], format!("  - leaf (size {})", left_count));
    for (i, key) in (1..=left_count).enumerate() {
        assert_eq!(btree[2 + i as usize], format!("    - {}", key));
    }
    let after_left = 2 + left_count as usize;
    assert_eq!(btree[after_left], format!("  - key {}", left_count));
    assert_eq!(
        btree[after_left + 1],
        format!("  - leaf (size {})", right_count)
    );
    for (i, key) in ((left_count + 1)..=(max_cells + 1)).enumerate() {
        assert_eq!(btree[after_left + 2 + i], format!("    - {}", key));
    }
    let _ = std::fs::remove_file(&db);
}
