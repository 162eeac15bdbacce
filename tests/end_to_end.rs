//! End-to-end scenarios exercising the full lex -> parse -> module graph ->
//! bytecode compile -> VM pipeline through the crate's public API, matching
//! the testable properties enumerated in the specification (hello-world,
//! arithmetic/promotion, call/return, arity mismatch, cyclic import,
//! hot-patch reload).

use std::io::Write;
use std::path::{Path, PathBuf};

use raec::ast::nodes::Program;
use raec::bytecode::{BytecodeCompiler, Registry, Vm, VmOutcome};
use raec::compiler::error::RaeError;
use raec::compiler::module_graph;
use raec::value::Value;

fn unique_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("rae_e2e_{label}_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    path
}

fn compile_entry(entry: &Path) -> Result<raec::bytecode::Chunk, RaeError> {
    let graph = module_graph::load(entry)?;
    let file = entry.to_string_lossy().into_owned();
    BytecodeCompiler::compile(&graph.merged, &file)
}

fn run_entry(entry: &Path) -> Result<VmOutcome, RaeError> {
    let chunk = compile_entry(entry)?;
    let mut registry = Registry::new();
    raec::bytecode::natives::register_builtins(&mut registry);
    let mut vm = Vm::new(&chunk, &mut registry);
    vm.run(None)
}

/// Runs `raec run <entry>` as a subprocess and returns its captured
/// stdout, so callers can assert on the literal text `log`/`logS`
/// produced rather than just the in-process `VmOutcome`.
fn run_entry_via_cli(entry: &Path) -> std::process::Output {
    std::process::Command::new(env!("CARGO_BIN_EXE_raec"))
        .arg("run")
        .arg(entry)
        .output()
        .expect("failed to run the raec binary")
}

#[test]
fn hello_world_logs_and_returns_none() {
    let dir = unique_dir("hello");
    let entry = write_file(&dir, "main.rae", r#"func main() { log("hi") }"#);

    match run_entry(&entry).unwrap() {
        VmOutcome::Ok(Value::None) => {}
        other => panic!("expected none result, got a different outcome: {}", matches!(other, VmOutcome::Ok(_))),
    }

    let output = run_entry_via_cli(&entry);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "hi\n");

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn arithmetic_and_promotion_matches_expected_results() {
    let dir = unique_dir("arith");
    let entry = write_file(
        &dir,
        "main.rae",
        "func main(): ret float { ret 7.0 / 2 }",
    );

    match run_entry(&entry).unwrap() {
        VmOutcome::Ok(Value::Float(x)) => assert!((x - 3.5).abs() < 1e-9),
        _ => panic!("expected a float result"),
    }

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn integer_division_truncates_towards_zero() {
    let dir = unique_dir("intdiv");
    let entry = write_file(&dir, "main.rae", "func main(): ret int { ret 7 / 2 }");

    match run_entry(&entry).unwrap() {
        VmOutcome::Ok(Value::Int(3)) => {}
        _ => panic!("expected Int(3)"),
    }

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn call_and_return_thread_a_value_across_functions() {
    let dir = unique_dir("call");
    let entry = write_file(
        &dir,
        "main.rae",
        "func double(n: int): ret int { ret n + n }\n\
         func main(): ret int { ret double(21) }",
    );

    match run_entry(&entry).unwrap() {
        VmOutcome::Ok(Value::Int(42)) => {}
        _ => panic!("expected Int(42)"),
    }

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn arity_mismatch_is_a_compile_time_error() {
    let dir = unique_dir("arity");
    let entry = write_file(
        &dir,
        "main.rae",
        "func add(a: int, b: int): ret int { ret a + b }\n\
         func main(): ret int { ret add(1) }",
    );

    let err = compile_entry(&entry).unwrap_err();
    assert!(matches!(err, RaeError::Compile { .. }));
    assert!(err.to_string().contains("expects 2 argument(s) but call has 1"));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn cyclic_import_across_two_files_is_detected() {
    let dir = unique_dir("cycle");
    write_file(&dir, "a.rae", "import \"b\"\nfunc main() { }");
    write_file(&dir, "b.rae", "import \"a\"\nfunc helper() { }");

    let err = module_graph::load(&dir.join("a.rae")).unwrap_err();
    assert!(matches!(err, RaeError::CyclicImport { .. }));
    let message = err.to_string();
    assert!(message.contains("cyclic import detected"));
    assert!(message.contains("a -> b -> a"));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn hot_patch_redirects_in_flight_function_to_new_body() {
    let dir = unique_dir("hotpatch");
    let entry = write_file(&dir, "main.rae", "func main(): ret int { ret 1 }");

    let mut live = compile_entry(&entry).unwrap();
    let before = {
        let mut registry = Registry::new();
        let mut vm = Vm::new(&live, &mut registry);
        match vm.run(None).unwrap() {
            VmOutcome::Ok(Value::Int(n)) => n,
            _ => panic!("expected an int result"),
        }
    };
    assert_eq!(before, 1);

    write_file(&dir, "main.rae", "func main(): ret int { ret 99 }");
    let patched = compile_entry(&entry).unwrap();
    let failures = raec::bytecode::hotpatch::hot_patch(&mut live, patched).unwrap();
    assert!(failures.is_empty());

    let after = {
        let mut registry = Registry::new();
        let mut vm = Vm::new(&live, &mut registry);
        match vm.run(None).unwrap() {
            VmOutcome::Ok(Value::Int(n)) => n,
            _ => panic!("expected an int result"),
        }
    };
    assert_eq!(after, 99);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn program_round_trips_through_the_pretty_printer() {
    let source = "func main(): ret int { ret 1 + 2 }";
    let program = raec::compiler::parse_program("t.rae", source).unwrap();
    let printed = raec::pretty::pretty_print(&Program { declarations: program.declarations });
    let reparsed = raec::compiler::parse_program("t.rae", &printed).unwrap();
    assert_eq!(reparsed.declarations.len(), 1);
}
