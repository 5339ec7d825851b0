//! Integration tests for binder invariants: stack balance, value round-trips,
//! type-tag integrity, registration sealing and engine options.

use luabinder::mlua;
use luabinder::prelude::*;
use std::fs;
use tempdir::TempDir;

/// A binder exposing `echo`, which returns its arguments read back by kind.
fn echo_binder() -> Binder {
    let mut binder = Binder::new();
    binder
        .func("echo", |ctx| {
            for position in 1..=ctx.top() {
                let value = ctx.arg(position).any();
                match value {
                    Dynamic::Bool(b) => {
                        ctx.push().bool(b);
                    }
                    Dynamic::Number(n) => {
                        ctx.push().number(n);
                    }
                    Dynamic::String(s) => {
                        ctx.push().string(&s)?;
                    }
                    _ => {
                        ctx.push().nil();
                    }
                }
            }
            Ok(())
        })
        .unwrap();
    binder
}

// =============================================================================
// Stack balance
// =============================================================================

#[test]
fn test_stack_balance_after_close() {
    let binder = Binder::new();
    binder
        .do_string("function pair(x) return x, x * 2 end")
        .unwrap();

    for i in 0..50 {
        let before = binder.top();

        let mut ret = binder.do_string("return 1, 2, 3").unwrap();
        assert_eq!(binder.top(), before + 3);
        ret.close();
        assert_eq!(binder.top(), before);

        let mut caller = binder.call("pair").unwrap();
        caller.args().number(f64::from(i));
        let mut ret = caller.execute().unwrap();
        assert_eq!(ret.get(2).number().unwrap(), f64::from(i) * 2.0);
        ret.close();
        assert_eq!(binder.top(), before);
    }
}

#[test]
fn test_failures_leave_stack_balanced() {
    let binder = Binder::new();
    binder
        .do_string("function boom() error('boom') end")
        .unwrap();

    for _ in 0..10 {
        assert!(binder.do_string("error('x')").is_err());
        assert!(binder.do_string("this is not lua").is_err());
        assert!(binder.call("boom").unwrap().execute().is_err());
        assert!(binder.call("undefined").unwrap().execute().is_err());
    }
    assert_eq!(binder.top(), 0);

    // The binder is still usable after failures
    let ret = binder.do_string("return 'still alive'").unwrap();
    assert_eq!(ret.get(1).string().unwrap(), "still alive");
}

#[test]
fn test_nested_results_release_in_order() {
    let binder = Binder::new();

    let outer = binder.do_string("return 'outer'").unwrap();
    let inner = binder.do_string("return 'a', 'b'").unwrap();
    assert_eq!(binder.top(), 3);
    assert_eq!(outer.get(1).string().unwrap(), "outer");
    assert_eq!(inner.get(2).string().unwrap(), "b");

    drop(inner);
    assert_eq!(binder.top(), 1);
    drop(outer);
    assert_eq!(binder.top(), 0);
}

#[test]
fn test_unexecuted_caller_releases_slots() {
    let binder = Binder::new();
    binder.do_string("function f(...) end").unwrap();

    let mut caller = binder.call("f").unwrap();
    caller.args().number(1.0).bool(true);
    caller.args().string("three").unwrap();
    assert_eq!(binder.top(), 4);

    drop(caller);
    assert_eq!(binder.top(), 0);
}

#[test]
fn test_unbalanced_execute_releases_staged_values() {
    let binder = Binder::new();
    binder.do_string("function f(...) return ... end").unwrap();

    let mut caller = binder.call("f").unwrap();
    caller.args().number(1.0).number(2.0);
    let ret = binder.do_string("return 'in the way'").unwrap();
    assert_eq!(binder.top(), 4);

    let err = caller.execute().unwrap_err();
    assert!(matches!(
        err,
        BinderError::Unbalanced {
            expected: 3,
            actual: 4
        }
    ));
    assert_eq!(binder.top(), 1);

    drop(ret);
    assert_eq!(binder.top(), 0);

    // A fresh call on the same binder works
    let mut caller = binder.call("f").unwrap();
    caller.args().string("again").unwrap();
    let ret = caller.execute().unwrap();
    assert_eq!(ret.get(1).string().unwrap(), "again");
    drop(ret);
    assert_eq!(binder.top(), 0);
}

// =============================================================================
// Idempotent close
// =============================================================================

#[test]
fn test_close_twice_pops_once() {
    let binder = Binder::new();
    let keep = binder.do_string("return 'keep'").unwrap();

    let mut ret = binder.do_string("return 1, 2").unwrap();
    assert_eq!(binder.top(), 3);
    ret.close();
    assert_eq!(binder.top(), 1);
    ret.close();
    assert_eq!(binder.top(), 1);
    assert!(ret.is_closed());

    assert_eq!(keep.get(1).string().unwrap(), "keep");
}

#[test]
fn test_closed_results_read_as_no_value() {
    let binder = Binder::new();
    let mut ret = binder.do_string("return 42").unwrap();
    ret.close();

    let err = ret.get(1).number().unwrap_err();
    assert!(err.to_string().contains("no value"));
}

// =============================================================================
// Round-trip
// =============================================================================

#[test]
fn test_round_trip_through_script() {
    let binder = echo_binder();

    let ret = binder
        .do_string("return echo(true, false, 0.1 + 0.2, -7, 'héllo', '')")
        .unwrap();
    assert_eq!(ret.values(), 6);
    assert!(ret.get(1).bool().unwrap());
    assert!(!ret.get(2).bool().unwrap());
    assert_eq!(ret.get(3).number().unwrap(), 0.1 + 0.2);
    assert_eq!(ret.get(4).number().unwrap(), -7.0);
    assert_eq!(ret.get(5).string().unwrap(), "héllo");
    assert_eq!(ret.get(6).string().unwrap(), "");
}

#[test]
fn test_round_trip_through_caller() {
    let binder = Binder::new();
    binder
        .do_string("function identity(...) return ... end")
        .unwrap();

    let values = [0.0, -0.5, 1e300, f64::MIN_POSITIVE, 123456789.125];
    let mut caller = binder.call("identity").unwrap();
    for value in values {
        caller.args().number(value);
    }
    caller.args().bool(false);
    caller.args().string("tail").unwrap();

    let ret = caller.execute().unwrap();
    assert_eq!(ret.values(), values.len() + 2);
    for (i, value) in values.iter().enumerate() {
        assert_eq!(ret.get(i + 1).number().unwrap(), *value);
    }
    assert!(!ret.get(6).bool().unwrap());
    assert_eq!(ret.get(7).string().unwrap(), "tail");
}

#[test]
fn test_any_reports_kind() {
    let mut binder = Binder::new();
    binder
        .func("kind", |ctx| {
            let kind = ctx.arg(1).any().type_name();
            ctx.push().string(kind)?;
            Ok(())
        })
        .unwrap();

    let ret = binder
        .do_string("return kind(1), kind('s'), kind(true), kind(nil), kind({}), kind()")
        .unwrap();
    assert_eq!(ret.get(1).string().unwrap(), "number");
    assert_eq!(ret.get(2).string().unwrap(), "string");
    assert_eq!(ret.get(3).string().unwrap(), "boolean");
    assert_eq!(ret.get(4).string().unwrap(), "nil");
    assert_eq!(ret.get(5).string().unwrap(), "table");
    assert_eq!(ret.get(6).string().unwrap(), "nil");
}

#[test]
fn test_number_as_string_matches_tostring() {
    let mut binder = Binder::new();
    binder
        .func("text", |ctx| {
            let text = ctx.arg(1).string()?;
            ctx.push().string(&text)?;
            Ok(())
        })
        .unwrap();

    let ret = binder
        .do_string(
            r#"
            local mismatches = {}
            for _, x in ipairs({ 0.1 + 0.2, 1e14, 1e100, -0.0, 12.0, 7, 2^63, 1/3 }) do
                if text(x) ~= tostring(x) then
                    mismatches[#mismatches + 1] = text(x) .. " vs " .. tostring(x)
                end
            end
            return table.concat(mismatches, ", ")
            "#,
        )
        .unwrap();
    assert_eq!(ret.get(1).string().unwrap(), "");
}

// =============================================================================
// Type-tag integrity
// =============================================================================

#[derive(Debug)]
struct Person {
    name: String,
}

struct Robot;

fn typed_binder() -> Binder {
    let mut binder = Binder::new();
    binder
        .table("person")
        .unwrap()
        .static_fn("new", |ctx| {
            let name = ctx.arg(1).string()?;
            ctx.push().data(Person { name }, "person")?;
            Ok(())
        })
        .dynamic_fn("name", |ctx| {
            let person = ctx.arg(1).object::<Person>("person")?;
            let name = person.borrow().name.clone();
            ctx.push().string(&name)?;
            Ok(())
        });
    binder
        .table("robot")
        .unwrap()
        .static_fn("new", |ctx| {
            ctx.push().data(Robot, "robot")?;
            Ok(())
        })
        .dynamic_fn("beep", |ctx| {
            ctx.push().string("beep")?;
            Ok(())
        });
    binder
}

#[test]
fn test_dynamic_method_rejects_other_type() {
    let binder = typed_binder();

    let err = binder
        .do_string("local p = person.new('x'); local r = robot.new(); return p.name(r)")
        .unwrap_err();
    assert!(err.to_string().contains("wrong type, person expected, got robot"));
}

#[test]
fn test_dynamic_method_rejects_plain_values() {
    let binder = typed_binder();

    let err = binder
        .do_string("local p = person.new('x'); return p.name(42)")
        .unwrap_err();
    assert!(err.to_string().contains("wrong type, person expected, got number"));
}

#[test]
fn test_methods_are_per_type() {
    let binder = typed_binder();

    let ret = binder
        .do_string("local p = person.new('x'); local r = robot.new(); return p.beep == nil, r:beep()")
        .unwrap();
    assert!(ret.get(1).bool().unwrap());
    assert_eq!(ret.get(2).string().unwrap(), "beep");
}

#[test]
fn test_host_read_checks_tag_and_type() {
    let binder = typed_binder();

    let ret = binder.do_string("return robot.new()").unwrap();
    let err = ret.get(1).object::<Person>("person").unwrap_err();
    assert!(err.is_wrong_type());
    assert!(ret.get(1).data::<Person>().unwrap_err().is_wrong_type());
    assert!(ret.get(1).object::<Robot>("robot").is_ok());
}

// =============================================================================
// Arity and type errors
// =============================================================================

#[test]
fn test_arity_error_fails_script() {
    let mut binder = Binder::new();
    binder
        .func("sum", |ctx| {
            if ctx.top() != 2 {
                return Err(NativeError::other(format!(
                    "sum expects 2 arguments, got {}",
                    ctx.top()
                )));
            }
            let total = ctx.arg(1).number()? + ctx.arg(2).number()?;
            ctx.push().number(total);
            Ok(())
        })
        .unwrap();

    let err = binder.do_string("return sum(1)").unwrap_err();
    assert!(err.to_string().contains("sum expects 2 arguments, got 1"));

    let err = binder.do_string("return sum(1, 'x')").unwrap_err();
    assert!(err.to_string().contains("bad argument #2: number expected, got string"));
}

#[test]
fn test_missing_argument_reads_as_no_value() {
    let mut binder = Binder::new();
    binder
        .func("first", |ctx| {
            let s = ctx.arg(1).string()?;
            ctx.push().string(&s)?;
            Ok(())
        })
        .unwrap();

    let err = binder.do_string("return first()").unwrap_err();
    assert!(err.to_string().contains("got no value"));
}

// =============================================================================
// Registration
// =============================================================================

#[test]
fn test_registration_after_run_is_sealed() {
    let mut binder = Binder::new();
    binder.do_string("return nil").unwrap();

    assert!(matches!(
        binder.func("late", |_| Ok(())),
        Err(BinderError::Sealed)
    ));
}

#[test]
fn test_attached_loaders_compose() {
    let mut math = Loader::new();
    math.module("mathx").func("square", |ctx| {
        let n = ctx.arg(1).number()?;
        ctx.push().number(n * n);
        Ok(())
    });
    let mut text = Loader::new();
    text.func("shout", |ctx| {
        let s = ctx.arg(1).string()?;
        ctx.push().string(&s.to_uppercase())?;
        Ok(())
    });

    let mut binder = Binder::new();
    binder.load(math).load(text);

    let ret = binder
        .do_string("return require('mathx').square(9), shout('hi')")
        .unwrap();
    assert_eq!(ret.get(1).number().unwrap(), 81.0);
    assert_eq!(ret.get(2).string().unwrap(), "HI");
}

// =============================================================================
// Re-entrancy
// =============================================================================

#[test]
fn test_handler_reenters_script() {
    let mut binder = Binder::new();
    binder
        .func("twice", |ctx| {
            let n = ctx.arg(1).number()?;
            ctx.push().number(n * 2.0);
            Ok(())
        })
        .unwrap()
        .func("apply", |ctx| {
            let name = ctx.arg(1).string()?;
            let x = ctx.arg(2).number()?;
            let f: mlua::Function = ctx.lua().globals().get(name)?;
            let r: f64 = f.call(x)?;
            ctx.push().number(r + 1.0);
            Ok(())
        })
        .unwrap();

    binder
        .do_string("function double(x) return twice(x) end")
        .unwrap();
    let ret = binder.do_string("return apply('double', 4)").unwrap();
    assert_eq!(ret.get(1).number().unwrap(), 9.0);
}

// =============================================================================
// Files
// =============================================================================

#[test]
fn test_do_file_runs_text() {
    let dir = TempDir::new("luabinder").unwrap();
    let path = dir.path().join("ok.lua");
    fs::write(&path, "local a = 20\nreturn a + 1").unwrap();

    let binder = Binder::new();
    let ret = binder.do_file(&path).unwrap();
    assert_eq!(ret.get(1).number().unwrap(), 21.0);
}

#[test]
fn test_do_file_reports_line() {
    let dir = TempDir::new("luabinder").unwrap();
    let path = dir.path().join("broken.lua");
    fs::write(&path, "x = 1\nerror('broken here')\n").unwrap();

    let binder = Binder::new();
    let err = binder.do_file(&path).unwrap_err();
    assert_eq!(err.line(), Some(2));
    match err {
        BinderError::Script(script) => {
            assert_eq!(script.script().name(), path.display().to_string());
            assert!(script.message().contains("broken here"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_do_file_missing_is_io_error() {
    let dir = TempDir::new("luabinder").unwrap();
    let path = dir.path().join("missing.lua");

    let binder = Binder::new();
    let err = binder.do_file(&path).unwrap_err();
    assert!(matches!(err, BinderError::Io { .. }));
    assert!(err.to_string().contains("missing.lua"));
    assert!(!binder.is_sealed());
}

// =============================================================================
// Options
// =============================================================================

#[test]
fn test_skip_open_libs() {
    let mut binder = Binder::with_options(Options::new().with_skip_open_libs(true)).unwrap();
    binder.module("m").unwrap().string("name", "m");

    let ret = binder
        .do_string("return string == nil, math == nil, require('m').name, table.concat({'a', 'b'})")
        .unwrap();
    assert!(ret.get(1).bool().unwrap());
    assert!(ret.get(2).bool().unwrap());
    assert_eq!(ret.get(3).string().unwrap(), "m");
    assert_eq!(ret.get(4).string().unwrap(), "ab");
}

#[test]
fn test_call_stack_size_limits_recursion() {
    let binder = Binder::with_options(Options::new().with_call_stack_size(40)).unwrap();

    let ret = binder
        .do_string("local function f(n) if n == 0 then return 0 end return f(n - 1) + 1 end return f(5)")
        .unwrap();
    assert_eq!(ret.get(1).number().unwrap(), 5.0);
    drop(ret);

    let err = binder
        .do_string("local function f(n) return f(n + 1) + 1 end return f(0)")
        .unwrap_err();
    assert!(err.to_string().contains("stack overflow"));
    assert_eq!(binder.top(), 0);
}

#[test]
fn test_native_trace_extends_message() {
    let mut binder = Binder::with_options(Options::new().with_native_trace(true)).unwrap();
    binder
        .func("raiser", |_| Err("For honor!".into()))
        .unwrap();

    match binder.do_string("raiser()").unwrap_err() {
        BinderError::Script(script) => {
            assert!(script.message().starts_with("For honor!\n"));
        }
        other => panic!("unexpected error: {other}"),
    }
}
