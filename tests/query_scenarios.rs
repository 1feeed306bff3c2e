// SPDX-License-Identifier: PMPL-1.0-or-later

//! End-to-end query behaviour against sessions opened from disk

use casefile::prolog::{EngineOptions, UnknownPolicy};
use casefile::query::{ErrorKind, QueryLimits, Status, Value};
use casefile::Session;
use serde_json::json;
use std::io::Write;
use tempfile::NamedTempFile;

fn clause_file(source: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create clause file");
    file.write_all(source.as_bytes()).expect("write clause file");
    file
}

fn open(source: &str, options: EngineOptions) -> (NamedTempFile, Session) {
    let file = clause_file(source);
    let session = Session::open(file.path(), options).expect("clause file should load");
    (file, session)
}

#[test]
fn test_all_solutions_in_order() {
    let (_file, session) = open("scene(1). scene(2). scene(3).", EngineOptions::default());
    let envelope = session.execute("scene(ID).", &QueryLimits::default());
    assert_eq!(
        serde_json::to_value(&envelope).expect("serialize"),
        json!({"status": "ok", "results": [{"ID": 1}, {"ID": 2}, {"ID": 3}]})
    );
}

#[test]
fn test_clue_lookup_normalizes_values() {
    let (_file, session) = open("clue(7, 1, \"desc\", false).", EngineOptions::default());
    let envelope = session.execute("clue(7, SCENE, DESCRIPTION, FOUND).", &QueryLimits::default());
    assert_eq!(
        serde_json::to_value(&envelope).expect("serialize"),
        json!({"status": "ok", "results": [{"SCENE": 1, "DESCRIPTION": "desc", "FOUND": "false"}]})
    );
}

#[test]
fn test_unknown_predicate_fails_quietly_by_default() {
    let (_file, session) = open("scene(1).", EngineOptions::default());
    let envelope = session.execute("nonexistent(X).", &QueryLimits::default());
    assert_eq!(envelope.status, Status::Ok);
    assert!(envelope.results.is_empty());
}

#[test]
fn test_unknown_predicate_can_raise() {
    let options = EngineOptions {
        unknown: UnknownPolicy::Error,
        ..EngineOptions::default()
    };
    let (_file, session) = open("scene(1).", options);
    let envelope = session.execute("nonexistent(X).", &QueryLimits::default());
    assert_eq!(envelope.status, Status::Error);
    let error = envelope.error.expect("existence error");
    assert_eq!(error.kind(), ErrorKind::Error);
    assert!(error.detail().contains("existence_error"));
}

#[test]
fn test_malformed_goal() {
    let (_file, session) = open("scene(1).", EngineOptions::default());
    let envelope = session.execute("scene(ID", &QueryLimits::default());
    assert_eq!(envelope.status, Status::Error);
    assert!(envelope.results.is_empty());
    assert_eq!(
        envelope.error.as_ref().map(|e| e.kind()),
        Some(ErrorKind::SyntaxError)
    );

    // the session still answers afterwards
    let envelope = session.execute("scene(ID).", &QueryLimits::default());
    assert_eq!(envelope.results.len(), 1);
}

#[test]
fn test_runtime_fault_keeps_earlier_answers() {
    let source = "
        item(1). item(2). item(boom). item(3).
        double(X, Y) :- item(X), Y is X * 2.
    ";
    let (_file, session) = open(source, EngineOptions::default());
    let envelope = session.execute("double(X, Y).", &QueryLimits::default());
    assert_eq!(envelope.status, Status::Error);
    assert_eq!(envelope.results.len(), 2);
    assert_eq!(envelope.results[1]["Y"], Value::Int(4));
    let error = envelope.error.expect("type error");
    assert_eq!(error.kind(), ErrorKind::Error);
    assert!(!error.is_retryable());
}

#[test]
fn test_thrown_ball_is_reported() {
    let (_file, session) = open("alarm :- throw(intruder).", EngineOptions::default());
    let envelope = session.execute("alarm.", &QueryLimits::default());
    let error = envelope.error.expect("uncaught ball");
    assert_eq!(error.detail(), "intruder");
}

#[test]
fn test_limit_exceeded_is_retryable() {
    let options = EngineOptions {
        inference_limit: 500,
        ..EngineOptions::default()
    };
    let source = "
        nat(0).
        nat(N) :- nat(M), N is M + 1.
        spin :- spin.
    ";
    let (_file, session) = open(source, options);

    let envelope = session.execute("spin.", &QueryLimits::default());
    assert_eq!(envelope.status, Status::Error);
    let error = envelope.error.expect("limit error");
    assert_eq!(error.kind(), ErrorKind::LimitError);
    assert!(error.is_retryable());

    let envelope = session.execute("nat(N).", &QueryLimits { max_results: Some(5) });
    assert_eq!(envelope.status, Status::Ok);
    assert!(envelope.truncated);
    let values: Vec<Value> = envelope.results.iter().map(|s| s["N"].clone()).collect();
    assert_eq!(values, (0..5).map(Value::Int).collect::<Vec<_>>());
}

#[test]
fn test_compound_bindings_are_canonical_text() {
    let source = "
        seen(butler, at(library, 9)).
        route([hall, library, cellar]).
    ";
    let (_file, session) = open(source, EngineOptions::default());
    let envelope = session.execute("seen(WHO, WHERE), route(PATH).", &QueryLimits::default());
    let answer = &envelope.results[0];
    assert_eq!(answer["WHO"], Value::Atom("butler".into()));
    assert_eq!(answer["WHERE"], Value::Term("at(library,9)".into()));
    assert_eq!(answer["PATH"], Value::Term("[hall,library,cellar]".into()));
}

#[test]
fn test_underscore_variables_are_hidden() {
    let (_file, session) = open("clue(7, 1, \"desc\", false).", EngineOptions::default());
    let envelope = session.execute("clue(ID, _Scene, _, _).", &QueryLimits::default());
    assert_eq!(
        serde_json::to_value(&envelope.results).expect("serialize"),
        json!([{"ID": 7}])
    );
}

#[test]
fn test_cyclic_binding_is_an_error_envelope() {
    let (_file, session) = open("a.", EngineOptions::default());
    let envelope = session.execute("X = f(X).", &QueryLimits::default());
    assert_eq!(envelope.status, Status::Error);
    let error = envelope.error.expect("cyclic term error");
    assert_eq!(error.kind(), ErrorKind::Error);
    assert!(error.detail().contains("cyclic_term"), "{}", error.detail());

    // the session keeps serving
    assert!(session.execute("a.", &QueryLimits::default()).is_ok());
}

#[test]
fn test_long_list_answer() {
    let source = "
        mk(0, []).
        mk(N, [N|T]) :- N > 0, M is N - 1, mk(M, T).
    ";
    let (_file, session) = open(source, EngineOptions::default());
    let envelope = session.execute("mk(14000, L).", &QueryLimits::default());
    assert!(envelope.is_ok(), "{:?}", envelope.error);
    match &envelope.results[0]["L"] {
        Value::Term(text) => {
            assert!(text.starts_with("[14000,13999,13998,"));
            assert!(text.ends_with(",3,2,1]"));
        }
        other => panic!("expected list text, got {:?}", other),
    }
}

#[test]
fn test_deeply_nested_goal_is_a_syntax_error() {
    let (_file, session) = open("a.", EngineOptions::default());
    let depth = 10_000;
    let goal = format!("{}a{}.", "(".repeat(depth), ")".repeat(depth));
    let envelope = session.execute(&goal, &QueryLimits::default());
    assert_eq!(envelope.status, Status::Error);
    let error = envelope.error.expect("nesting error");
    assert_eq!(error.kind(), ErrorKind::SyntaxError);
    assert_eq!(error.detail(), "term nesting too deep");

    assert!(session.execute("a.", &QueryLimits::default()).is_ok());
}

#[test]
fn test_integers_beyond_64_bits_are_not_clamped() {
    let (_file, session) = open("a.", EngineOptions::default());
    let envelope = session.execute("X is 2^100, Y is truncate(1.0e30).", &QueryLimits::default());
    assert!(envelope.is_ok(), "{:?}", envelope.error);
    let answer = &envelope.results[0];
    assert_eq!(answer["X"], Value::Term("1267650600228229401496703205376".into()));
    match &answer["Y"] {
        Value::Term(text) => {
            assert_eq!(text.len(), 31);
            assert!(text.starts_with("1000000000000000"));
        }
        other => panic!("expected exact integer text, got {:?}", other),
    }
}

#[test]
fn test_broken_clause_file_aborts_open() {
    let file = clause_file("scene(1).\nscene(2\n");
    let err = match Session::open(file.path(), EngineOptions::default()) {
        Ok(_) => panic!("a syntax error must abort the load"),
        Err(err) => err,
    };
    assert!(format!("{:#}", err).contains("consulting clause file"));
}

#[test]
fn test_missing_clause_file() {
    let result = Session::open(
        std::path::Path::new("/nonexistent/casefile.pl"),
        EngineOptions::default(),
    );
    assert!(result.is_err());
}
