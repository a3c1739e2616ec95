use std::io::Write;
use std::sync::mpsc;
use std::time::Duration;

use edge_py::{
    CompileError, CompileRequest, Deferred, InvocationError, Status, compile_func, compile_func_from_value,
};
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn tracing_init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn script_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("edge-py-")
        .suffix(".py")
        .tempfile()
        .unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[rstest]
#[case::sync(true)]
#[case::not_sync(false)]
fn test_increment(#[from(tracing_init)] _tracing: (), #[case] sync: bool) {
    let wrapper = compile_func(CompileRequest::new("lambda x: x + 1").sync(sync)).unwrap();
    let deferred = wrapper.invoke(json!(41));

    if sync {
        assert_eq!(deferred.status(), Status::Resolved);
    }
    assert_eq!(deferred.wait(), Ok(json!(42)));
}

#[rstest]
#[case::sync(true)]
#[case::not_sync(false)]
fn test_invocation_error_is_per_call(#[from(tracing_init)] _tracing: (), #[case] sync: bool) {
    let wrapper = compile_func(CompileRequest::new("  lambda x: x / 0").sync(sync)).unwrap();

    match wrapper.invoke(json!(41)).wait() {
        Err(InvocationError::Script(err)) => {
            assert_eq!(err.message, "ZeroDivisionError: division by zero");
            assert_eq!(err.script_name, "<inline>");
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(wrapper.invoke(json!("a")).wait().is_err());
}

#[rstest]
#[case::sync(true)]
#[case::not_sync(false)]
fn test_failed_call_does_not_affect_later_calls(#[from(tracing_init)] _tracing: (), #[case] sync: bool) {
    let wrapper = compile_func(CompileRequest::new("lambda p: 100 // p['d']").sync(sync)).unwrap();

    let results = [json!({"d": 0}), json!({}), json!({"d": 4})]
        .into_iter()
        .map(|input| wrapper.invoke(input))
        .collect::<Vec<_>>();

    assert!(results[0].wait().is_err());
    assert!(results[1].wait().is_err());
    assert_eq!(results[2].wait(), Ok(json!(25)));
}

#[rstest]
#[case::number("42")]
#[case::string("'lambda x: x'")]
#[case::two_params("lambda x, y: x")]
fn test_invalid_shape(#[from(tracing_init)] _tracing: (), #[case] source: &str) {
    assert!(matches!(
        compile_func(CompileRequest::new(source)),
        Err(CompileError::InvalidShape { .. })
    ));
}

#[rstest]
fn test_file_source(#[from(tracing_init)] _tracing: ()) {
    let file = script_file("# doubles the input\nlambda x: x * 2\n");
    let path = file.path().to_str().unwrap();

    let wrapper = compile_func(CompileRequest::new(path).sync(true)).unwrap();
    assert_eq!(wrapper.script_name(), path);
    assert_eq!(wrapper.invoke(json!(21)).wait(), Ok(json!(42)));
}

#[rstest]
fn test_file_source_syntax_error_names_file(#[from(tracing_init)] _tracing: ()) {
    let file = script_file("lambda x: (x\n");

    match compile_func(CompileRequest::new(file.path().to_str().unwrap())) {
        Err(CompileError::ScriptEvaluation(err)) => {
            assert_eq!(err.script_name, file.path().to_str().unwrap());
            assert_eq!(err.source_code, "lambda x: (x\n");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[rstest]
#[case::parens_sync(format!("lambda x: {}x{}", "(".repeat(50_000), ")".repeat(50_000)), true)]
#[case::parens_not_sync(format!("lambda x: {}x{}", "(".repeat(50_000), ")".repeat(50_000)), false)]
#[case::unary_not_sync(format!("lambda x: {}x", "-".repeat(20_000)), false)]
fn test_deeply_nested_source_is_rejected(
    #[from(tracing_init)] _tracing: (),
    #[case] source: String,
    #[case] sync: bool,
) {
    match compile_func(CompileRequest::new(source).sync(sync)) {
        Err(CompileError::ScriptEvaluation(err)) => {
            assert_eq!(err.code.as_deref(), Some("ParseError::NestingTooDeep"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[rstest]
#[case::sync(true)]
#[case::not_sync(false)]
fn test_deep_recursion_fails_the_call(#[from(tracing_init)] _tracing: (), #[case] sync: bool) {
    let source = "lambda n: (lambda f: f(f, n))(lambda g, k: 0 if k == 0 else 1 + g(g, k - 1))";
    let wrapper = compile_func(CompileRequest::new(source).sync(sync)).unwrap();

    match wrapper.invoke(json!(100_000)).wait() {
        Err(InvocationError::Script(err)) => assert!(err.message.starts_with("RecursionError")),
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(wrapper.invoke(json!(5)).wait(), Ok(json!(5)));
}

#[rstest]
fn test_missing_file(#[from(tracing_init)] _tracing: ()) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.py");

    assert!(matches!(
        compile_func(CompileRequest::new(path.to_str().unwrap())),
        Err(CompileError::SourceRead { .. })
    ));
}

#[rstest]
fn test_indented_inline_source(#[from(tracing_init)] _tracing: ()) {
    let source = "
        # doubles positive numbers
        lambda x: (
            x * 2
            if x > 0
            else 0
        )
    ";
    let wrapper = compile_func(CompileRequest::new(source).sync(true)).unwrap();
    assert_eq!(wrapper.invoke(json!(5)).wait(), Ok(json!(10)));
    assert_eq!(wrapper.invoke(json!(-5)).wait(), Ok(json!(0)));
}

#[rstest]
fn test_partially_stripped_line(#[from(tracing_init)] _tracing: ()) {
    // The continuation line keeps its shorter indentation; inside brackets that is still valid.
    let source = "      lambda x: (x +\n   1)";
    assert_eq!(edge_py::normalize(source).unwrap(), "lambda x: (x +\n   1)");

    let wrapper = compile_func(CompileRequest::new(source).sync(true)).unwrap();
    assert_eq!(wrapper.invoke(json!(41)).wait(), Ok(json!(42)));
}

#[rstest]
#[case::missing_source(json!({"sync": true}))]
#[case::non_string_source(json!({"source": ["lambda x: x"]}))]
#[case::non_bool_sync(json!({"source": "lambda x: x", "sync": "true"}))]
#[case::not_a_record(json!(null))]
fn test_invalid_request(#[from(tracing_init)] _tracing: (), #[case] value: serde_json::Value) {
    assert!(matches!(
        compile_func_from_value(value),
        Err(CompileError::InvalidRequest(_))
    ));
}

#[rstest]
fn test_request_record(#[from(tracing_init)] _tracing: ()) {
    let wrapper = compile_func_from_value(json!({
        "source": "lambda p: {'greeting': 'Hello, ' + p['name'] + '!'}",
        "sync": true,
        "references": ["ignored"],
    }))
    .unwrap();

    assert!(wrapper.is_sync());
    assert_eq!(
        wrapper.invoke(json!({"name": "world"})).wait(),
        Ok(json!({"greeting": "Hello, world!"}))
    );
}

#[rstest]
fn test_async_results_arrive_in_order(#[from(tracing_init)] _tracing: ()) {
    let wrapper = compile_func(CompileRequest::new("lambda n: sum(range(n))")).unwrap();

    let deferreds = (0..100).map(|n| wrapper.invoke(json!(n))).collect::<Vec<Deferred>>();
    let results = deferreds.iter().map(Deferred::wait).collect::<Vec<_>>();

    let expected = (0..100i64).map(|n| Ok(json!(n * (n - 1) / 2))).collect::<Vec<_>>();
    assert_eq!(results, expected);
}

#[rstest]
fn test_async_await(#[from(tracing_init)] _tracing: ()) {
    let wrapper = compile_func(CompileRequest::new("lambda s: s[::-1]")).unwrap();

    let outputs = futures::executor::block_on(futures::future::join_all(
        ["abc", "xyz"].map(|s| wrapper.invoke(json!(s))),
    ));
    assert_eq!(outputs, vec![Ok(json!("cba")), Ok(json!("zyx"))]);
}

#[rstest]
fn test_async_on_complete(#[from(tracing_init)] _tracing: ()) {
    let wrapper = compile_func(CompileRequest::new("lambda x: [x] * 3")).unwrap();
    let (tx, rx) = mpsc::channel();

    wrapper.invoke(json!(1)).on_complete(move |outcome| {
        tx.send(outcome.clone()).unwrap();
    });

    assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), Ok(json!([1, 1, 1])));
}

#[rstest]
fn test_wrapper_shared_across_threads(#[from(tracing_init)] _tracing: ()) {
    let wrapper = compile_func(CompileRequest::new("lambda x: x * x").sync(true)).unwrap();

    std::thread::scope(|scope| {
        let handles = (0..4)
            .map(|n| {
                let wrapper = &wrapper;
                scope.spawn(move || wrapper.invoke(json!(n)).wait())
            })
            .collect::<Vec<_>>();

        for (n, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().unwrap(), Ok(json!(n * n)));
        }
    });
}
