use mjc::bytecode::OpCode::{self, *};
use mjc::bytecode::disasm::{decode, disassemble};
use mjc::{Compilation, CompilerOptions, Image, Message, compile, compile_with};

fn compile_ok(source: &str) -> Compilation {
    let result = compile(source).expect("compiler error");
    assert!(
        result.is_valid(),
        "unexpected diagnostics: {:?}",
        result.diagnostics.iter().map(|d| d.to_string()).collect::<Vec<_>>()
    );
    result
}

fn messages(source: &str) -> Vec<Message> {
    compile(source)
        .expect("compiler error")
        .diagnostics
        .into_iter()
        .map(|d| d.message)
        .collect()
}

fn ops(ops: &[OpCode]) -> Vec<u8> {
    ops.iter().map(|op| op.code()).collect()
}

const SIEVE: &str = "
program Sieve
    final int MAX = 100;
    class Stats { int found; char last; }
    bool[] unused;
    int[] prime;
    Stats stats;
{
    /* mark composite numbers, /* nested */ comments are fine */
    void sieve(int n) int i, j; {
        prime = new int[n + 1];
        i = 2;
        while (i <= n) { prime[i] = 1; i++; }
        i = 2;
        while (i * i <= n) {
            if (prime[i] == 1) {
                j = i ** 2;
                while (j <= n) { prime[j] = 0; j += i; }
            }
            i++;
        }
    }

    int count(int n) int i, c; {
        c = 0;
        i = 2;
        while (i <= n) {
            if (prime[i] != 0 && i != 1 || i == 2) c++;
            i++;
        }
        return c;
    }

    void main() int n; {
        read(n);
        if (n > MAX || n < 0) n = MAX;
        sieve(n);
        stats = new Stats;
        stats.found = count(n);
        stats.last = chr(stats.found + ord('0'));
        print(stats.found, 5);
        print(stats.last);
        if (stats == null) return;
        print(len(prime));
    }
}
";

#[test]
fn scenario_store_and_print_global() {
    let result = compile_ok("program P int x; { void main() { x = 3; print(x); } }");
    assert_eq!(result.image.data_size, 1);
    assert_eq!(result.image.main_pc, 0);
    assert_eq!(
        result.image.code,
        vec![
            Enter.code(),
            0,
            0,
            Const3.code(),
            PutStatic.code(),
            0,
            0,
            GetStatic.code(),
            0,
            0,
            Const0.code(),
            Print.code(),
            Exit.code(),
            Return.code(),
        ]
    );
}

#[test]
fn entry_point_is_an_enter_instruction() {
    // `bool` is not a type, so drop that declaration for the valid run
    let source = SIEVE.replace("bool[] unused;", "");
    let result = compile_ok(&source);
    let instructions = decode(&result.image.code).expect("decodes");
    let main = instructions
        .iter()
        .find(|ins| ins.pc as i32 == result.image.main_pc)
        .expect("main_pc is an instruction boundary");
    assert_eq!(main.op, Enter);
    assert_eq!(result.image.data_size, 2);
    assert_eq!(result.debug_info.globals, vec!["prime", "stats"]);
    assert_eq!(
        result.debug_info.methods.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(),
        vec!["sieve", "count", "main"]
    );
}

#[test]
fn unknown_type_is_reported_once() {
    assert_eq!(messages(SIEVE), vec![Message::NotFound("bool".to_string())]);
}

#[test]
fn every_jump_and_call_stays_inside_the_code() {
    let source = SIEVE.replace("bool[] unused;", "");
    let result = compile_ok(&source);
    let size = result.image.code.len();
    for ins in decode(&result.image.code).expect("decodes") {
        if let Some(target) = ins.target() {
            assert!(target < size, "{:?} jumps outside the code", ins);
        }
    }
}

#[test]
fn image_survives_the_object_file_format() {
    let result = compile_ok("program P int a, b; { void main() { a = 1; b = a; } }");
    let bytes = result.image.to_bytes();
    assert_eq!(&bytes[..2], b"MJ");
    let back = Image::from_bytes(&bytes).expect("valid object file");
    assert_eq!(back, result.image);
    assert_eq!(back.data_size, 2);
}

#[test]
fn listing_names_methods_and_globals() {
    let result = compile_ok("program P int g; { void f() { g++; } void main() { f(); } }");
    let listing = disassemble(&result.image, Some(&result.debug_info)).expect("listing");
    assert!(listing.contains("f:"));
    assert!(listing.contains("main:"));
    assert!(listing.contains("getstatic   0 ; g"));
    assert!(listing.contains("call        -> 0000 ; f"));
}

#[test]
fn one_conditional_jump_per_comparison() {
    for (cond, comparisons) in [
        ("a < b", 1),
        ("a < b && b < c", 2),
        ("a < b || b < c", 2),
        ("a == 1 && b == 2 || c == 3 && a != c", 4),
    ] {
        let source = format!(
            "program P {{ void main() int a, b, c; {{ if ({}) a = 0; else a = 1; }} }}",
            cond
        );
        let result = compile_ok(&source);
        let conditional = decode(&result.image.code)
            .expect("decodes")
            .iter()
            .filter(|ins| ins.op.is_jump() && ins.op != Jmp)
            .count();
        assert_eq!(conditional, comparisons, "condition {}", cond);
    }
}

#[test]
fn short_circuit_targets() {
    // if (a == 1 || b == 2 && c == 3) a = 0;
    let result = compile_ok(
        "program P { void main() int a, b, c; { if (a == 1 || b == 2 && c == 3) a = 0; } }",
    );
    let ins = decode(&result.image.code).expect("decodes");
    let jumps: Vec<_> = ins.iter().filter(|i| i.op.is_jump()).collect();
    let store = ins.iter().find(|i| i.op == Store0).expect("store");
    let exit = ins.iter().find(|i| i.op == Exit).expect("exit");

    assert_eq!(jumps[0].op, Jeq);
    assert_eq!(jumps[0].target(), Some(store.pc - 1));
    assert_eq!(jumps[1].op, Jne);
    assert_eq!(jumps[1].target(), Some(exit.pc));
    assert_eq!(jumps[2].op, Jne);
    assert_eq!(jumps[2].target(), Some(exit.pc));
}

#[test]
fn duplicate_declaration_keeps_the_first() {
    let source = "program P int x; char x; { void main() { x = 3; } }";
    assert_eq!(messages(source), vec![Message::DeclName("x".to_string())]);

    // the second `x` still takes no global slot
    let result = compile(source).expect("compiler error");
    assert_eq!(result.image.data_size, 1);
}

#[test]
fn compound_assignment_on_element_evaluates_index_once() {
    let result = compile_ok("program P int[] x; { void main() int i; { x[i] += 1; } }");
    assert_eq!(
        &result.image.code[3..result.image.code.len() - 2],
        &[
            GetStatic.code(),
            0,
            0,
            Load0.code(),
            Dup2.code(),
            ALoad.code(),
            Const1.code(),
            Add.code(),
            AStore.code(),
        ]
    );
}

#[test]
fn compound_assignment_on_field() {
    let result = compile_ok(
        "program P class C { int v; } { void main() C c; { c = new C; c.v -= 2; } }",
    );
    let body = &result.image.code[3..result.image.code.len() - 2];
    assert_eq!(
        body,
        &[
            New.code(),
            0,
            1,
            Store0.code(),
            Load0.code(),
            Dup.code(),
            GetField.code(),
            0,
            0,
            Const2.code(),
            Sub.code(),
            PutField.code(),
            0,
            0,
        ]
    );
}

#[test]
fn missing_main_is_the_only_diagnostic() {
    assert_eq!(
        messages("program P int x; { void start() { x = 1; } }"),
        vec![Message::MethNotFound("main".to_string())]
    );
    let result = compile("program P { void start() { } }").expect("compiler error");
    assert_eq!(result.image.main_pc, -1);
    assert_eq!(
        result.diagnostics[0].to_string(),
        "-- line 1 col 31: method not found: main"
    );
}

#[test]
fn short_and_long_local_access() {
    let result = compile_ok(
        "program P { void main() int a, b, c, d, e; { e = d; a = e; } }",
    );
    assert_eq!(
        &result.image.code[3..result.image.code.len() - 2],
        &[Load3.code(), Store.code(), 4, Load.code(), 4, Store0.code()]
    );
}

#[test]
fn constant_loads() {
    let result = compile_ok(
        "program P final int BIG = 70000; { void main() int a; { a = 5; a = -1; a = BIG; a = -6; } }",
    );
    let body = &result.image.code[3..result.image.code.len() - 2];
    let mut expected = ops(&[Const5, Store0, ConstM1, Store0, Const]);
    expected.extend_from_slice(&70000i32.to_be_bytes());
    expected.push(Store0.code());
    expected.push(Const.code());
    expected.extend_from_slice(&(-6i32).to_be_bytes());
    expected.push(Store0.code());
    assert_eq!(body, expected.as_slice());
}

#[test]
fn lexical_errors_are_reported_without_throttling() {
    let source = "program P { void main() int a; char c; { a = 99999999999; c = '\\q'; } }";
    let found = messages(source);
    assert_eq!(
        found,
        vec![
            Message::BigNum("99999999999".to_string()),
            Message::UndefinedEscape('q'),
        ]
    );
}

#[test]
fn throttle_suppresses_cascading_errors() {
    let source = "program P { void main() { a = b + c; } }";
    assert_eq!(messages(source), vec![Message::NotFound("a".to_string())]);

    let every = compile_with(source, &CompilerOptions { min_error_distance: 0 })
        .expect("compiler error");
    let names: Vec<_> = every.diagnostics.into_iter().map(|d| d.message).collect();
    assert_eq!(
        names,
        vec![
            Message::NotFound("a".to_string()),
            Message::NotFound("b".to_string()),
            Message::NotFound("c".to_string()),
            Message::NoIntOperand,
        ]
    );
}

#[test]
fn missing_tokens_are_reported() {
    assert_eq!(
        messages("program P { void main() { print(1) } }"),
        vec![Message::TokenExpected(mjc::token::Kind::Semicolon)]
    );
    assert_eq!(
        messages("program P { void main() { } } extra"),
        vec![Message::TokenExpected(mjc::token::Kind::Eof)]
    );
}

#[test]
fn method_with_far_jumps_is_rejected() {
    // Each `a = 100000;` takes 6 bytes, so the loop spans about 36 KB.
    let body = "a = 100000; ".repeat(6000);
    let source = format!("program P {{ void main() int a; {{ while (a < 3) {{ {} }} }} }}", body);
    let result = compile(&source).expect("compiler error");
    let names: Vec<_> = result.diagnostics.iter().map(|d| d.message.clone()).collect();
    assert_eq!(names, vec![Message::MethodTooLarge]);
    assert!(!result.is_valid());

    let short = format!(
        "program P {{ void main() int a; {{ while (a < 3) {{ {} }} }} }}",
        "a = 100000; ".repeat(5000)
    );
    compile_ok(&short);
}
