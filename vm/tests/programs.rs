use pl0_parser::{CompilerSettings, compile_source};
use pm0_bytecode::{Program, codec};
use pm0_vm::{BufferedConsole, Machine, MachineSettings, Registers, TraceRecord, VmError};
use test_case::test_case;

fn compile(src: &str) -> Program {
    match compile_source(src, &CompilerSettings::default()) {
        Ok(compiled) => compiled.program,
        Err(err) => panic!("compile failed: {err}"),
    }
}

fn execute(src: &str, input: &[i32]) -> Result<Vec<i32>, VmError> {
    let program = compile(src);
    let mut machine = Machine::with_program(&MachineSettings::default(), &program)?;
    let mut console = BufferedConsole::new(input.iter().copied());
    machine.run(&mut console, |_| {})?;
    Ok(console.output().to_vec())
}

fn trace(src: &str, input: &[i32]) -> (Registers, Vec<TraceRecord>) {
    let mut machine = Machine::with_program(&MachineSettings::default(), &compile(src)).unwrap();
    let initial = machine.registers();
    let mut console = BufferedConsole::new(input.iter().copied());
    let mut records = Vec::new();
    machine
        .run(&mut console, |r| records.push(r.clone()))
        .unwrap();
    (initial, records)
}

// ── Scenarios ─────────────────────────────────────────────────

#[test]
fn constant_plus_one() {
    let out = execute("const m = 5; var x; begin x := m + 1; write x end.", &[]);
    assert_eq!(out.unwrap(), vec![6]);
}

#[test_case(-3, &[0, -3]; "negative input takes the branch")]
#[test_case(7, &[7]; "positive input skips it")]
fn conditional_write(input: i32, expected: &[i32]) {
    let src = "var x; begin read x; if x < 0 then write 0 fi; write x end.";
    assert_eq!(execute(src, &[input]).unwrap(), expected);
}

#[test]
fn counting_loop() {
    let src = "var x; x := 1; while x <= 3 do begin write x; x := x + 1 end.";
    assert_eq!(execute(src, &[]).unwrap(), vec![1, 2, 3]);
}

#[test_case(4, 1; "even")]
#[test_case(5, 2; "odd")]
fn if_else(input: i32, expected: i32) {
    let src = "var x; begin read x; if even x then write 1 else write 2 fi end.";
    assert_eq!(execute(src, &[input]).unwrap(), vec![expected]);
}

#[test_case(&[3, 1], 12; "inner if takes both arms")]
#[test_case(&[2, 0], 200; "outer else on every pass")]
#[test_case(&[0, 1], 0; "loop body never runs")]
fn nested_branches_inside_loop(input: &[i32], expected: i32) {
    let src = "
        var n, f, s;
        begin
          read n; read f; s := 0;
          while n > 0 do
          begin
            if f = 1 then
              if even n then s := s + 10 else s := s + 1 fi
            else
              s := s + 100;
            n := n - 1
          end;
          write s
        end.";
    assert_eq!(execute(src, input).unwrap(), vec![expected]);
}

// ── Procedures ────────────────────────────────────────────────

#[test]
fn nested_procedures_follow_static_links() {
    let src = "
        var x;
        procedure outer;
          var y;
          procedure inner;
            x := x + y;
          begin y := 10; call inner end;
        begin x := 1; call outer; write x end.";
    assert_eq!(execute(src, &[]).unwrap(), vec![11]);
}

#[test]
fn recursion_through_globals() {
    let src = "
        var n, f;
        procedure fact;
          if n > 1 then begin f := f * n; n := n - 1; call fact end;
        begin read n; f := 1; call fact; write f end.";
    assert_eq!(execute(src, &[5]).unwrap(), vec![120]);
}

#[test]
fn each_activation_has_its_own_locals() {
    // Every level writes its local after the recursive call returns, so
    // the values come out in reverse order.
    let src = "
        var n;
        procedure down;
          var mine;
          begin
            mine := n;
            if n > 0 then begin n := n - 1; call down end;
            write mine
          end;
        begin n := 3; call down end.";
    assert_eq!(execute(src, &[]).unwrap(), vec![0, 1, 2, 3]);
}

#[test]
fn nested_procedure_calls_its_parent() {
    let src = "
        var n;
        procedure p;
          procedure q;
            if n > 0 then begin n := n - 1; call p end;
          begin write n; call q end;
        begin n := 2; call p end.";
    assert_eq!(execute(src, &[]).unwrap(), vec![2, 1, 0]);
}

#[test]
fn call_and_return_restore_registers() {
    let src = "
        var a;
        procedure p;
          var b;
          procedure q;
            a := a + 1;
          begin b := 1; call q; call q end;
        begin a := 0; call p; write a end.";
    let (initial, records) = trace(src, &[]);
    let mut before = initial;
    let mut frames = Vec::new();
    for record in &records {
        match record.name {
            "CAL" => frames.push(before),
            "RTN" => {
                let caller = frames.pop().expect("RTN without CAL");
                assert_eq!(record.registers.sp, caller.sp);
                assert_eq!(record.registers.bp, caller.bp);
                assert_eq!(record.registers.pc, caller.pc - 3);
            }
            _ => {}
        }
        before = record.registers;
    }
    assert!(frames.is_empty());
    assert_eq!(records.iter().filter(|r| r.name == "CAL").count(), 3);
}

// ── Trace ─────────────────────────────────────────────────────

#[test]
fn trace_lines() {
    let (initial, records) = trace("const m = 5; var x; begin x := m + 1; write x end.", &[]);
    assert_eq!(initial.to_string(), "499 472 473");
    let lines: Vec<_> = records.iter().map(|r| r.to_string()).collect();
    assert_eq!(lines[0], "JMP       0         3   496   472   473 ");
    assert_eq!(
        lines[1],
        "INC       0         4   493   472   469  0  0  0  0 "
    );
    assert_eq!(
        lines[4],
        "ADD       0         1   484   472   468  0  0  0  0  6 "
    );
    assert_eq!(
        lines.last().unwrap(),
        "SYS       0         3   472   472   469  0  0  0  6 "
    );
    assert_eq!(records.len(), 9);
}

// ── Handoff and failures ──────────────────────────────────────

#[test]
fn text_handoff_matches_in_memory() {
    let src = "var x; x := 1; while x <= 3 do begin write x; x := x + 1 end.";
    let text = codec::to_text(&compile(src).to_raw());
    let mut machine = Machine::new(&MachineSettings::default()).unwrap();
    machine.load_text(&text).unwrap();
    let mut console = BufferedConsole::default();
    machine.run(&mut console, |_| {}).unwrap();
    assert_eq!(console.output(), execute(src, &[]).unwrap().as_slice());
}

#[test]
fn program_must_fit_in_memory() {
    let program = compile("var x; x := 1; while x <= 3 do begin write x; x := x + 1 end.");
    let settings = MachineSettings { memory_size: 30 };
    assert!(matches!(
        Machine::with_program(&settings, &program),
        Err(VmError::ProgramTooLarge {
            instructions: 16,
            ..
        })
    ));
}

#[test]
fn runaway_recursion_runs_out_of_memory() {
    let err = execute("procedure p; call p; call p.", &[]).unwrap_err();
    assert!(matches!(err, VmError::AddressOutOfBounds { .. }));
}

#[test]
fn division_by_zero() {
    let err = execute("var z; begin z := 0; write 1 / z end.", &[]).unwrap_err();
    assert!(matches!(err, VmError::DivisionByZero { .. }));
}

#[test]
fn missing_input() {
    let err = execute("var x; read x.", &[]).unwrap_err();
    assert!(matches!(err, VmError::InvalidInput(_)));
}
