//! Protected Call Tests
//!
//! End-to-end tests for calling wrapped host functions through `pcall`:
//! - Non-callable callees
//! - Arity and argument type checking
//! - Return values, single and multiple
//! - Error containment (raised errors, panics, reentrant calls)
//!
//! # Running Tests
//! ```bash
//! cargo test -p lunar-sdk --test pcall_tests
//! ```

use lunar_sdk::{get_top, pcall, pop, push, raw, wrap, EngineConfig, Nil, State};

fn pop_error(state: &mut State) -> String {
    let mut message = String::new();
    assert!(pop(state, &mut message), "expected an error string on top");
    message
}

fn two_ints(a: i32, b: i32) -> i32 {
    a + b
}

fn int_and_string(n: i32, s: String) -> String {
    format!("{}{}", s, n)
}

// ===== Callee Checks =====

#[test]
fn test_pcall_nil() {
    let mut state = State::new();
    push(&mut state, Nil);
    assert!(!pcall(&mut state, &mut (), ()));
    assert_eq!(get_top(&state), 1);
    assert_eq!(pop_error(&mut state), "attempt to call a nil value");
    assert_eq!(get_top(&state), 0);
}

#[test]
fn test_pcall_table() {
    let mut state = State::new();
    push(&mut state, vec![1, 2]);
    assert!(!pcall(&mut state, &mut (), (1, 2)));
    assert_eq!(get_top(&state), 1);
    assert_eq!(pop_error(&mut state), "attempt to call a table value");
}

// ===== Argument Checks =====

#[test]
fn test_insufficient_args_one() {
    let mut state = State::new();
    push(&mut state, wrap(two_ints));
    assert!(!pcall(&mut state, &mut (), 1));
    assert_eq!(get_top(&state), 1);
    assert_eq!(
        pop_error(&mut state),
        "insufficient args, expecting 2 but got 1"
    );
    assert_eq!(get_top(&state), 0);
}

#[test]
fn test_insufficient_args_none() {
    let mut state = State::new();
    push(&mut state, wrap(two_ints));
    assert!(!pcall(&mut state, &mut (), ()));
    assert_eq!(
        pop_error(&mut state),
        "insufficient args, expecting 2 but got 0"
    );
    assert_eq!(get_top(&state), 0);
}

#[test]
fn test_wrong_args() {
    let mut state = State::new();
    push(&mut state, wrap(int_and_string));
    assert!(!pcall(&mut state, &mut (), ("a", 1)));
    assert_eq!(
        pop_error(&mut state),
        "error converting arg at index 1 from string to integer"
    );
    assert_eq!(get_top(&state), 0);
}

#[test]
fn test_wrong_second_arg() {
    let mut state = State::new();
    push(&mut state, wrap(int_and_string));
    assert!(!pcall(&mut state, &mut (), (1, 2)));
    assert_eq!(
        pop_error(&mut state),
        "error converting arg at index 2 from number to string"
    );
}

#[test]
fn test_optional_trailing_arg() {
    let mut state = State::new();
    let greet = |name: String, punct: Option<String>| {
        format!("hi {}{}", name, punct.unwrap_or_default())
    };

    push(&mut state, wrap(greet));
    let mut out = String::new();
    assert!(pcall(&mut state, &mut out, ("ann", Nil)));
    assert_eq!(out, "hi ann");

    push(&mut state, wrap(greet));
    assert!(pcall(&mut state, &mut out, ("bo", "!")));
    assert_eq!(out, "hi bo!");
    assert_eq!(get_top(&state), 0);
}

// ===== Return Values =====

#[test]
fn test_no_return_value() {
    let mut state = State::new();
    push(&mut state, "below");
    push(&mut state, wrap(|_: i32| {}));
    assert!(pcall(&mut state, &mut (), 5));
    assert_eq!(get_top(&state), 1);
}

#[test]
fn test_return_value_int() {
    let mut state = State::new();
    push(&mut state, wrap(two_ints));
    let mut sum = 0i32;
    assert!(pcall(&mut state, &mut sum, (2, 3)));
    assert_eq!(sum, 5);
    assert_eq!(get_top(&state), 0);
}

#[test]
fn test_return_value_string() {
    let mut state = State::new();
    push(&mut state, wrap(int_and_string));
    let mut out = String::new();
    assert!(pcall(&mut state, &mut out, (7, "lucky ")));
    assert_eq!(out, "lucky 7");
    assert_eq!(get_top(&state), 0);
}

#[test]
fn test_multiple_returns() {
    let mut state = State::new();
    push(&mut state, wrap(|s: String, n: i64| (s.to_uppercase(), n * 2)));
    let mut out = (String::new(), 0i64);
    assert!(pcall(&mut state, &mut out, ("abc", 21)));
    assert_eq!(out, ("ABC".to_string(), 42));
    assert_eq!(get_top(&state), 0);
}

#[test]
fn test_discarded_returns() {
    let mut state = State::new();
    push(&mut state, wrap(|| (1, 2, 3)));
    assert!(pcall(&mut state, &mut (), ()));
    assert_eq!(get_top(&state), 0);
}

#[test]
fn test_return_type_mismatch() {
    let mut state = State::new();
    push(&mut state, wrap(|| "not a number"));
    let mut n = 0i64;
    assert!(!pcall(&mut state, &mut n, ()));
    assert_eq!(
        pop_error(&mut state),
        "error converting return value at index 1 from string to integer"
    );
    assert_eq!(get_top(&state), 0);
}

// ===== Containment =====

#[test]
fn test_result_error_is_contained() {
    let mut state = State::new();
    let parse = |s: String| s.parse::<i64>().map_err(|e| e.to_string());
    push(&mut state, wrap(parse));
    let mut n = 0i64;
    assert!(pcall(&mut state, &mut n, "12"));
    assert_eq!(n, 12);

    push(&mut state, wrap(parse));
    assert!(!pcall(&mut state, &mut n, "twelve"));
    assert_eq!(pop_error(&mut state), "invalid digit found in string");
    assert_eq!(get_top(&state), 0);
}

#[test]
fn test_panic_is_contained() {
    let mut state = State::new();
    push(&mut state, wrap(|| -> i64 { panic!("kaboom") }));
    let mut n = 0i64;
    assert!(!pcall(&mut state, &mut n, ()));
    assert_eq!(pop_error(&mut state), "native function panicked: kaboom");
    assert_eq!(get_top(&state), 0);
    assert_eq!(state.call_depth(), 0);

    // The state stays usable
    push(&mut state, wrap(two_ints));
    assert!(pcall(&mut state, &mut n, (1, 1)));
}

#[test]
fn test_reentrant_pcall() {
    let mut state = State::new();
    let outer = raw(|state| {
        let mut x = 0i64;
        if !pop(state, &mut x) {
            return Err("outer expects an integer".into());
        }
        push(state, wrap(|a: i64, b: i64| a * b));
        let mut product = 0i64;
        if !pcall(state, &mut product, (x, 10)) {
            return Err("inner call failed".into());
        }
        push(state, product + 1);
        Ok(1)
    });

    push(&mut state, outer);
    let mut out = 0i64;
    assert!(pcall(&mut state, &mut out, 4));
    assert_eq!(out, 41);
    assert_eq!(get_top(&state), 0);
}

#[test]
fn test_inner_failure_does_not_leak() {
    let mut state = State::new();
    let outer = raw(|state| {
        push(state, wrap(two_ints));
        let ok = pcall(state, &mut (), "x");
        let mut message = String::new();
        pop(state, &mut message);
        push(state, (ok, message));
        Ok(2)
    });

    push(&mut state, outer);
    let mut out = (true, String::new());
    assert!(pcall(&mut state, &mut out, ()));
    assert!(!out.0);
    assert_eq!(out.1, "insufficient args, expecting 2 but got 1");
    assert_eq!(get_top(&state), 0);
}

#[test]
fn test_stack_limit() {
    let config = EngineConfig::new().max_stack_size(3);
    let mut state = State::with_config(config);
    push(&mut state, wrap(|| (1, 2, 3, 4)));
    let mut out = 0i32;
    assert!(!pcall(&mut state, &mut out, ()));
    assert_eq!(get_top(&state), 1);
    assert_eq!(pop_error(&mut state), "stack overflow");
}
