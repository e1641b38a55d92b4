//! End-to-end tests: source text through the lexer, compiler and interpreter

use canvas_vm::{
    disassemble, scan, Call, Color, ErrorKind, KeyStrategy, Opcode, Outcome, RecordingRuntime,
    Stage, Value, VirtualMachine, VmConfig,
};
use proptest::prelude::*;

fn vm() -> VirtualMachine {
    VirtualMachine::new(VmConfig::default()).unwrap()
}

#[test]
fn fill_red() {
    let mut vm = vm();
    let mut canvas = RecordingRuntime::new(100, 100);
    let report = vm.run("fill(#ff0000);", &mut canvas);

    assert_eq!(report.bytecode, vec![0x11, 0xFF, 0x00, 0x00, 0xFF, 0x20]);
    assert_eq!(report.outcome, Some(Outcome::Completed));
    assert_eq!(canvas.drawing_calls(), vec![&Call::Fill(Color::rgb(255, 0, 0))]);
    assert_eq!(canvas.redraws(), 1);
}

#[test]
fn variable_feeds_set_pixel() {
    let mut vm = vm();
    let mut canvas = RecordingRuntime::new(100, 100);
    let report = vm.run("var x = 10; setpixel(x, x, #00ff00);", &mut canvas);

    #[rustfmt::skip]
    let expected = vec![
        0x10, 0, 0, 0, 0,         // key
        0x10, 10, 0, 0, 0,        // 10
        0x01,                     // WRITE
        0x10, 0, 0, 0, 0, 0x00,   // READ x
        0x10, 0, 0, 0, 0, 0x00,   // READ x
        0x11, 0x00, 0xFF, 0x00, 0xFF,
        0x21,
    ];
    assert_eq!(report.bytecode, expected);
    assert!(report.is_success());
    assert_eq!(
        canvas.drawing_calls(),
        vec![&Call::DrawPixel { x: 10, y: 10, color: Color::rgb(0, 255, 0) }]
    );
}

#[test]
fn get_width_leaves_one_value() {
    let mut vm = vm();
    let mut canvas = RecordingRuntime::new(321, 123);
    let report = vm.run("getwidth()", &mut canvas);

    assert_eq!(report.bytecode, vec![0x42]);
    assert_eq!(vm.interpreter().stack().as_slice(), &[Value::Integer(321)]);
    assert!(canvas.drawing_calls().is_empty());
}

#[test]
fn undefined_function_emits_nothing() {
    let mut vm = vm();
    let compilation = vm.compile("unknownfn()");

    assert!(compilation.bytecode.is_empty());
    let kinds = compilation.diagnostics.kinds();
    assert_eq!(kinds, vec![ErrorKind::UndefinedFunction]);
    assert_eq!(
        compilation.diagnostics.iter().next().unwrap().to_string(),
        "[line 1] Error: The function 'unknownfn' is not defined."
    );
    assert!(vm.had_error());
}

#[test]
fn rgb_compiles_but_is_unsupported() {
    let mut vm = vm();
    let mut canvas = RecordingRuntime::default();
    let report = vm.run("rgb(255,0,0)", &mut canvas);

    assert_eq!(report.bytecode.last(), Some(&0x30));
    assert_eq!(report.diagnostics.of_stage(Stage::Parse).count(), 0);
    assert_eq!(
        report.outcome,
        Some(Outcome::Unsupported { position: 15, opcode: Opcode::Rgb })
    );
    let runtime_errors: Vec<_> = report.diagnostics.of_stage(Stage::Runtime).collect();
    assert_eq!(runtime_errors.len(), 1);
    assert_eq!(runtime_errors[0].kind(), ErrorKind::NotImplemented);
    assert_eq!(canvas.redraws(), 1);
}

#[test]
fn nested_calls_and_text() {
    let mut vm = vm();
    let mut canvas = RecordingRuntime::new(200, 50);
    let source = r#"
        var bg = #123;
        fill(bg);
        setrect(0, 0, getwidth(), getheight(), #fff);
        write(4, 8, 12, "Hi", getpixel(0, 0));
    "#;
    let report = vm.run(source, &mut canvas);

    assert!(report.is_success(), "{:?}", report.diagnostics);
    assert_eq!(
        canvas.drawing_calls(),
        vec![
            &Call::Fill(Color::rgb(0x11, 0x22, 0x33)),
            &Call::DrawRect { x: 0, y: 0, w: 200, h: 50, color: Color::WHITE },
            &Call::WriteText {
                x: 4,
                y: 8,
                size: 12,
                text: "Hi".to_string(),
                color: Color::TRANSPARENT
            },
        ]
    );
}

#[test]
fn lex_errors_are_collected_per_line() {
    let (_, diagnostics) = scan("fill(@)\nfill(#12)\nwrite(\"oops");
    let lines: Vec<_> = diagnostics.iter().map(|d| d.line()).collect();
    assert_eq!(lines, vec![Some(1), Some(2), Some(3)]);
    assert_eq!(
        diagnostics.kinds(),
        vec![
            ErrorKind::UnexpectedCharacter,
            ErrorKind::InvalidColor,
            ErrorKind::UnterminatedString
        ]
    );
}

#[test]
fn runtime_abort_stops_remaining_statements() {
    let mut vm = vm();
    let mut canvas = RecordingRuntime::default();
    let report = vm.run("fill(1); fill(#fff)", &mut canvas);

    assert_eq!(
        report.outcome,
        Some(Outcome::Aborted { position: 5, byte: 0x20, kind: ErrorKind::TypeMismatch })
    );
    assert!(canvas.drawing_calls().is_empty());
    assert_eq!(canvas.redraws(), 1);
}

#[test]
fn bindings_survive_until_reset() {
    let mut vm = vm();
    let mut canvas = RecordingRuntime::default();
    vm.run("var c = #f00", &mut canvas);
    assert_eq!(vm.interpreter().variables().len(), 1);

    vm.reset();
    assert!(vm.interpreter().variables().is_empty());
    assert!(!vm.had_error());
}

#[test]
fn random_keys_still_round_trip() {
    let config = VmConfig {
        key_strategy: KeyStrategy::Random,
        ..VmConfig::default()
    };
    let mut vm = VirtualMachine::new(config).unwrap();
    let mut canvas = RecordingRuntime::default();
    let report = vm.run("var n = 42; setpixel(n, n, #000)", &mut canvas);

    assert!(report.is_success());
    assert_eq!(
        canvas.drawing_calls(),
        vec![&Call::DrawPixel { x: 42, y: 42, color: Color::BLACK }]
    );
}

#[test]
fn disassembly_lists_instructions() {
    let mut vm = vm();
    let compilation = vm.compile("var x = 3; fill(#0f0)");
    let listing = disassemble(&compilation.bytecode);
    let lines: Vec<_> = listing.lines().collect();
    assert_eq!(lines[0], "0000 INTEGER_LITERAL 0");
    assert_eq!(lines[1], "0005 INTEGER_LITERAL 3");
    assert_eq!(lines[2], "0010 WRITE");
    assert!(lines[3].starts_with("0011 COLOR_LITERAL"));
    assert_eq!(lines[4], "0016 FILL");
}

proptest! {
    #[test]
    fn hex_colours_compile_opaque(r: u8, g: u8, b: u8) {
        let mut vm = vm();
        let mut canvas = RecordingRuntime::default();
        let report = vm.run(&format!("fill(#{:02x}{:02x}{:02x})", r, g, b), &mut canvas);

        prop_assert!(report.is_success());
        let expected = Call::Fill(Color::rgb(r, g, b));
        prop_assert_eq!(canvas.drawing_calls(), vec![&expected]);
    }

    #[test]
    fn any_truncated_program_aborts_cleanly(cut in 1usize..29) {
        let mut vm = vm();
        let full = vm.compile("var x = 10; setpixel(x, x, #00ff00);").bytecode;
        let prefix = &full[..full.len() - cut];

        let mut canvas = RecordingRuntime::default();
        let mut diagnostics = canvas_vm::Diagnostics::new();
        let mut interpreter = canvas_vm::Interpreter::default();
        let outcome = interpreter.interpret(prefix, &mut canvas, &mut diagnostics);

        // cutting on an instruction boundary is still a valid program
        if !outcome.is_completed() {
            prop_assert!(matches!(
                outcome,
                Outcome::Aborted { kind: ErrorKind::TruncatedBytecode, .. }
                    | Outcome::Aborted { kind: ErrorKind::StackUnderflow, .. }
                    | Outcome::Aborted { kind: ErrorKind::UnknownVariable, .. }
            ), "unexpected outcome: {:?}", outcome);
        }
        prop_assert_eq!(canvas.redraws(), 1);
        prop_assert!(canvas.drawing_calls().is_empty());
    }
}
