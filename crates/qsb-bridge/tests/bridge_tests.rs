//! Integration tests for the public operations.

use proptest::prelude::*;
use qsb_bridge::{
    Bridge, BridgeConfig, ExecutionOptions, Noise, QasmGenerationOptions, QsError,
    ResetBehavior, circuit, qasm2, qasm2_expression, qir, qir_expression, quantikz,
    quantikz_operation, run_qs, run_qs_shots, run_qs_with_options,
};
use qsb_eval::{EvalError, MAX_CALL_DEPTH};
use qsb_ir::{InstructionKind, StandardGate};
use qsb_lang::{MAX_NESTING, ParseError};

const HELLO: &str = include_str!("assets/hello.qs");
const ENTANGLEMENT: &str = include_str!("assets/entanglement.qs");
const ENTANGLEMENT_NO_RESET: &str = include_str!("assets/entanglement_noreset.qs");
const TELEPORTATION: &str = include_str!("assets/teleportation.qs");
const COIN: &str = include_str!("assets/coin.qs");

const ZERO_WITHOUT_GATES: &str = r#"
    operation Main() : Result {
        use q = Qubit();
        MResetZ(q)
    }
"#;

// ============================================================================
// Running
// ============================================================================

#[test]
fn test_hello() {
    let result = run_qs(HELLO).unwrap();

    assert_eq!(result.messages, vec!["Hello"]);
    assert_eq!(result.qubit_count, 0);
    assert!(result.states.is_empty());
    assert_eq!(result.result.as_deref(), Some("()"));
}

#[test]
fn test_hello_shots() {
    let results = run_qs_shots(HELLO, 100).unwrap();

    assert_eq!(results.len(), 100);
    for res in &results {
        assert_eq!(res.messages, vec!["Hello"]);
        assert_eq!(res.qubit_count, 0);
        assert!(res.states.is_empty());
        assert_eq!(res.result.as_deref(), Some("()"));
    }
}

#[test]
fn test_entanglement() {
    let result = run_qs(ENTANGLEMENT).unwrap();

    assert!(result.messages.is_empty());
    assert_eq!(result.qubit_count, 2);
    assert_eq!(result.states.len(), 2);
    assert_eq!(result.states[0].id, "|00⟩");
    assert_eq!(result.states[1].id, "|11⟩");
    let half = std::f64::consts::FRAC_1_SQRT_2;
    for state in &result.states {
        assert!((state.amplitude_real - half).abs() < 1e-9);
        assert!(state.amplitude_imaginary.abs() < 1e-9);
    }

    let outcome = result.result.unwrap();
    assert!(
        outcome == "(One, One)" || outcome == "(Zero, Zero)",
        "Unexpected result: {outcome}"
    );
}

#[test]
fn test_entanglement_shots() {
    let results = run_qs_shots(ENTANGLEMENT, 100).unwrap();

    assert_eq!(results.len(), 100);
    for res in &results {
        assert!(res.messages.is_empty());
        assert_eq!(res.qubit_count, 2);
        assert_eq!(res.states.len(), 2);
        let outcome = res.result.as_deref().unwrap();
        assert!(outcome == "(One, One)" || outcome == "(Zero, Zero)");
    }
}

#[test]
fn test_teleportation() {
    let result = run_qs(TELEPORTATION).unwrap();

    assert_eq!(result.messages, vec!["Teleported: true"]);
    assert_eq!(result.qubit_count, 0);
    assert!(result.states.is_empty());
    assert_eq!(result.result.as_deref(), Some("true"));
}

#[test]
fn test_teleportation_shots() {
    let results = run_qs_shots(TELEPORTATION, 100).unwrap();

    assert_eq!(results.len(), 100);
    for res in &results {
        assert_eq!(res.messages, vec!["Teleported: true"]);
        assert_eq!(res.result.as_deref(), Some("true"));
    }
}

#[test]
fn test_coin_sees_both_outcomes() {
    let options = ExecutionOptions::from_shots(200).with_seed(42);
    let results = run_qs_with_options(COIN, &options).unwrap();

    let ones = results
        .iter()
        .filter(|r| r.result.as_deref() == Some("One"))
        .count();
    assert!(ones > 50 && ones < 150, "ones = {ones}");
}

#[test]
fn test_bit_flip_noise_flips_measurement() {
    let ideal = run_qs_with_options(ZERO_WITHOUT_GATES, &ExecutionOptions::from_shots(20)).unwrap();
    assert!(ideal.iter().all(|r| r.result.as_deref() == Some("Zero")));

    let noisy = ExecutionOptions::new(20, Noise::BitFlip { p: 1.0 });
    let flipped = run_qs_with_options(ZERO_WITHOUT_GATES, &noisy).unwrap();
    assert!(flipped.iter().all(|r| r.result.as_deref() == Some("One")));
}

#[test]
fn test_phase_flip_noise_leaves_z_basis_alone() {
    let noisy = ExecutionOptions::new(20, Noise::PhaseFlip { p: 1.0 });
    let results = run_qs_with_options(ZERO_WITHOUT_GATES, &noisy).unwrap();
    assert!(results.iter().all(|r| r.result.as_deref() == Some("Zero")));
}

#[test]
fn test_negative_noise_probability() {
    let noise = Noise::Depolarizing { p: -0.1 };
    let err = run_qs_with_options(COIN, &ExecutionOptions::from_noise(noise)).unwrap_err();
    assert!(matches!(err, QsError::InvalidNoise(_)));
}

#[test]
fn test_parse_error_is_reported() {
    let err = run_qs("operation Main() : Unit { H(q) ").unwrap_err();
    assert!(matches!(err, QsError::Eval(_)));
    assert!(!err.to_string().is_empty());
}

#[test]
fn test_runtime_error_is_reported() {
    let err = run_qs(r#"operation Main() : Unit { Fact(false, "boom"); }"#).unwrap_err();
    assert!(err.to_string().contains("boom"), "{err}");
}

// ============================================================================
// OpenQASM
// ============================================================================

#[test]
fn test_qasm_entanglement() {
    let qasm = qasm2(ENTANGLEMENT_NO_RESET, &QasmGenerationOptions::default()).unwrap();
    let expected = r#"OPENQASM 2.0;
include "qelib1.inc";
qreg q[2];
creg c[2];
h q[0];
cx q[0], q[1];
measure q[0] -> c[0];
measure q[1] -> c[1];
"#;
    assert_eq!(qasm, expected);
}

#[test]
fn test_qasm_without_qelib() {
    let options = QasmGenerationOptions::new(false, ResetBehavior::Supported);
    let qasm = qasm2(ENTANGLEMENT_NO_RESET, &options).unwrap();
    assert!(qasm.starts_with("OPENQASM 2.0;\nqreg q[2];\n"));
    assert!(!qasm.contains("include"));
}

#[test]
fn test_qasm_reset_behaviors() {
    let supported = qasm2(ENTANGLEMENT, &QasmGenerationOptions::default()).unwrap();
    assert_eq!(supported.matches("reset q[").count(), 2);

    let ignored = QasmGenerationOptions::new(true, ResetBehavior::Ignored);
    let text = qasm2(ENTANGLEMENT, &ignored).unwrap();
    assert!(!text.contains("reset"));
    assert_eq!(text.matches("measure").count(), 2);

    let error = QasmGenerationOptions::new(true, ResetBehavior::Error);
    assert!(matches!(
        qasm2(ENTANGLEMENT, &error),
        Err(QsError::Codegen(_))
    ));
}

#[test]
fn test_qasm_expression() {
    let qasm = qasm2_expression(
        "{ operation Foo() : Unit { use q = Qubit(); H(q); T(q); Reset(q); }; Foo() }",
        &QasmGenerationOptions::default(),
    )
    .unwrap();
    assert_eq!(
        qasm,
        "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[1];\nh q[0];\nt q[0];\nreset q[0];\n"
    );
}

#[test]
fn test_qasm_rejects_measurement_branching() {
    assert!(qasm2(TELEPORTATION, &QasmGenerationOptions::default()).is_err());
}

// ============================================================================
// QIR
// ============================================================================

#[test]
fn test_qir_entanglement() {
    let text = qir(ENTANGLEMENT_NO_RESET).unwrap();

    assert!(text.contains("define void @ENTRYPOINT__main() #0 {"));
    assert!(text.contains(
        "call void @__quantum__qis__h__body(%Qubit* inttoptr (i64 0 to %Qubit*))"
    ));
    assert!(text.contains(
        "call void @__quantum__qis__cx__body(%Qubit* inttoptr (i64 0 to %Qubit*), %Qubit* inttoptr (i64 1 to %Qubit*))"
    ));
    assert!(text.contains("call void @__quantum__rt__tuple_record_output(i64 2, i8* null)"));
    assert_eq!(text.matches("@__quantum__rt__result_record_output(").count(), 3);
    // Each measurement adds an auxiliary qubit.
    assert_eq!(text.matches("call void @__quantum__qis__m__body(").count(), 2);
    assert!(text.contains("\"required_num_qubits\"=\"4\" \"required_num_results\"=\"2\""));
}

#[test]
fn test_qir_expression_unit() {
    let text = qir_expression("{ operation Foo() : Unit { use q = Qubit(); X(q); Reset(q); }; Foo() }")
        .unwrap();
    assert!(text.contains("call void @__quantum__qis__x__body("));
    assert!(!text.contains("reset"));
    assert!(text.contains("call void @__quantum__rt__tuple_record_output(i64 0, i8* null)"));
}

// ============================================================================
// Circuits and diagrams
// ============================================================================

#[test]
fn test_circuit_empty() {
    let traced = circuit(HELLO).unwrap();
    assert_eq!(traced.num_qubits(), 0);
    assert!(traced.is_empty());
}

#[test]
fn test_circuit_entanglement() {
    let traced = circuit(ENTANGLEMENT).unwrap();
    assert_eq!(traced.num_qubits(), 2);

    let kinds: Vec<_> = traced.instructions().iter().map(|i| i.kind).collect();
    assert_eq!(
        kinds,
        vec![
            InstructionKind::Gate(StandardGate::H),
            InstructionKind::Gate(StandardGate::CX),
            InstructionKind::Measure,
            InstructionKind::Reset,
            InstructionKind::Measure,
            InstructionKind::Reset,
        ]
    );
}

#[test]
fn test_circuit_follows_taken_branches() {
    let traced = circuit(TELEPORTATION).unwrap();
    assert_eq!(traced.num_qubits(), 3);
    assert_eq!(
        traced
            .instructions()
            .iter()
            .filter(|i| i.kind == InstructionKind::Measure)
            .count(),
        3
    );
}

#[test]
fn test_quantikz_entanglement() {
    let latex = quantikz(ENTANGLEMENT_NO_RESET).unwrap();
    let expected = r"\begin{quantikz}
\lstick{$\ket{0}_{0}$} & \gate{H} & \ctrl{1} & \meter{} & \cw \\
\lstick{$\ket{0}_{1}$} & \qw & \targ{} & \meter{} & \cw \\
\end{quantikz}
";
    assert_eq!(latex, expected);
}

#[test]
fn test_quantikz_operation_one_gate() {
    let source = r"
        namespace Test {
            operation Main() : Unit {
                use q = Qubit();
                H(q);
                M(q);
            }
        }
    ";
    let expected = r"\begin{quantikz}
\lstick{$\ket{0}_{0}$} & \gate{H} & \meter{} & \cw \\
\end{quantikz}
";
    assert_eq!(quantikz_operation("Test.Main", source).unwrap(), expected);
    assert_eq!(quantikz_operation("Main", source).unwrap(), expected);
}

#[test]
fn test_quantikz_operation_toffoli() {
    let source = r"
        namespace Test {
            operation Main() : Unit {
                use q = Qubit[3];
                CCNOT(q[0], q[1], q[2]);
            }
        }
    ";
    let expected = r"\begin{quantikz}
\lstick{$\ket{0}_{0}$} & \ctrl{2} & \qw \\
\lstick{$\ket{0}_{1}$} & \ctrl{1} & \qw \\
\lstick{$\ket{0}_{2}$} & \targ{} & \qw \\
\end{quantikz}
";
    assert_eq!(quantikz_operation("Test.Main", source).unwrap(), expected);
}

#[test]
fn test_quantikz_operation_swap() {
    let source = r"
        namespace Test {
            operation Main() : Unit {
                use q = Qubit[2];
                SWAP(q[0], q[1]);
            }
        }
    ";
    let expected = r"\begin{quantikz}
\lstick{$\ket{0}_{0}$} & \swap{1} & \qw \\
\lstick{$\ket{0}_{1}$} & \targX{} & \qw \\
\end{quantikz}
";
    assert_eq!(quantikz_operation("Test.Main", source).unwrap(), expected);
}

#[test]
fn test_quantikz_operation_controlled_phases() {
    let source = r"
        namespace Test {
            operation Main() : Unit {
                use (q0, q1, q2) = (Qubit(), Qubit(), Qubit());
                H(q2);
                Controlled S([q1], q2);
                Controlled T([q0], q2);
                H(q1);
                Controlled S([q0], q1);
                H(q0);
                SWAP(q0, q2);
                let r0 = M(q0);
                let r1 = M(q1);
                let r2 = M(q2);
            }
        }
    ";
    // Controlled S and T expand to phase rotations around two CNOTs.
    let expected = r"\begin{quantikz}
\lstick{$\ket{0}_{0}$} & \gate{R_1(0.3927)} & \qw & \qw & \qw & \qw & \ctrl{2} & \qw & \ctrl{2} & \gate{R_1(0.7854)} & \ctrl{1} & \qw & \ctrl{1} & \gate{H} & \swap{2} & \meter{} & \cw \\
\lstick{$\ket{0}_{1}$} & \gate{R_1(0.7854)} & \ctrl{1} & \qw & \ctrl{1} & \qw & \qw & \qw & \qw & \gate{H} & \targ{} & \gate{R_1(-0.7854)} & \targ{} & \gate{R_1(0.7854)} & \qw & \meter{} & \cw \\
\lstick{$\ket{0}_{2}$} & \gate{H} & \targ{} & \gate{R_1(-0.7854)} & \targ{} & \gate{R_1(0.7854)} & \targ{} & \gate{R_1(-0.3927)} & \targ{} & \gate{R_1(0.3927)} & \qw & \qw & \qw & \qw & \targX{} & \meter{} & \cw \\
\end{quantikz}
";
    let latex = quantikz_operation("Test.Main", source).unwrap();
    assert_eq!(latex, expected);
    let entry = source.replace("operation Main", "@EntryPoint() operation Main");
    assert_eq!(quantikz(&entry).unwrap(), latex);
}

#[test]
fn test_quantikz_operation_rotation() {
    let source = r"
        namespace Test {
            open Microsoft.Quantum.Math;
            operation Main() : Unit {
                use (q0, q1) = (Qubit(), Qubit());
                X(q0);
                X(q1);
                H(q0);
                CNOT(q0, q1);
                Rz(2.0 * PI() / 3.0, q1);
                H(q0);
                H(q1);
                M(q0);
                M(q1);
            }
        }
    ";
    let expected = r"\begin{quantikz}
\lstick{$\ket{0}_{0}$} & \gate{X} & \gate{H} & \ctrl{1} & \gate{H} & \meter{} & \cw & \cw \\
\lstick{$\ket{0}_{1}$} & \gate{X} & \qw & \targ{} & \gate{R_z(2.0944)} & \gate{H} & \meter{} & \cw \\
\end{quantikz}
";
    assert_eq!(quantikz_operation("Test.Main", source).unwrap(), expected);
}

#[test]
fn test_quantikz_operation_cat_state() {
    let source = r"
        namespace Test {
            import Std.Measurement.*;
            operation Main() : Result[] {
                use qubits = Qubit[8];
                H(qubits[0]);
                for qubit in qubits[1..Length(qubits) - 1] {
                    CNOT(qubits[0], qubit);
                }
                MResetEachZ(qubits)
            }
        }
    ";
    let expected = r"\begin{quantikz}
\lstick{$\ket{0}_{0}$} & \gate{H} & \ctrl{1} & \ctrl{2} & \ctrl{3} & \ctrl{4} & \ctrl{5} & \ctrl{6} & \ctrl{7} & \meter{} & \gate{\ket{0}} & \qw \\
\lstick{$\ket{0}_{1}$} & \qw & \targ{} & \qw & \qw & \qw & \qw & \qw & \qw & \meter{} & \gate{\ket{0}} & \qw \\
\lstick{$\ket{0}_{2}$} & \qw & \qw & \targ{} & \qw & \qw & \qw & \qw & \qw & \meter{} & \gate{\ket{0}} & \qw \\
\lstick{$\ket{0}_{3}$} & \qw & \qw & \qw & \targ{} & \qw & \qw & \qw & \qw & \meter{} & \gate{\ket{0}} & \qw \\
\lstick{$\ket{0}_{4}$} & \qw & \qw & \qw & \qw & \targ{} & \qw & \qw & \qw & \meter{} & \gate{\ket{0}} & \qw \\
\lstick{$\ket{0}_{5}$} & \qw & \qw & \qw & \qw & \qw & \targ{} & \qw & \qw & \meter{} & \gate{\ket{0}} & \qw \\
\lstick{$\ket{0}_{6}$} & \qw & \qw & \qw & \qw & \qw & \qw & \targ{} & \qw & \meter{} & \gate{\ket{0}} & \qw \\
\lstick{$\ket{0}_{7}$} & \qw & \qw & \qw & \qw & \qw & \qw & \qw & \targ{} & \meter{} & \gate{\ket{0}} & \qw \\
\end{quantikz}
";
    assert_eq!(quantikz_operation("Test.Main", source).unwrap(), expected);
}

#[test]
fn test_quantikz_operation_errors() {
    let source = r"
        namespace Test {
            operation Apply(q : Qubit) : Unit { H(q); }
        }
    ";
    assert!(matches!(
        quantikz_operation("Test.Missing", source),
        Err(QsError::Eval(EvalError::UnknownIdentifier(_)))
    ));
    assert!(matches!(
        quantikz_operation("Test.Apply", source),
        Err(QsError::Eval(EvalError::EntryPointHasParameters(_)))
    ));
}

// ============================================================================
// Limits
// ============================================================================

const COUNTDOWN: &str = r"
    function Count(n : Int) : Int {
        if n == 0 {
            return 0;
        }
        1 + Count(n - 1)
    }
";

fn countdown(n: usize) -> String {
    format!("{COUNTDOWN} @EntryPoint() function Main() : Int {{ Count({n}) }}")
}

#[test]
fn test_recursion_up_to_call_depth() {
    // Main plus the calls to Count with n..=0.
    let n = MAX_CALL_DEPTH - 2;
    let state = run_qs(&countdown(n)).unwrap();
    assert_eq!(state.result, Some(n.to_string()));
}

#[test]
fn test_recursion_past_call_depth() {
    let err = run_qs(&countdown(MAX_CALL_DEPTH + 50)).unwrap_err();
    assert!(matches!(
        err,
        QsError::Eval(EvalError::CallDepthExceeded(MAX_CALL_DEPTH))
    ));
}

#[test]
fn test_deep_nesting_is_a_parse_error() {
    let parens = format!(
        "function Main() : Int {{ {}1{} }}",
        "(".repeat(5000),
        ")".repeat(5000)
    );
    let err = run_qs(&parens).unwrap_err();
    assert!(matches!(
        err,
        QsError::Eval(EvalError::Parse(ParseError::NestingTooDeep {
            limit: MAX_NESTING,
            ..
        }))
    ));
}

#[test]
fn test_oversized_array_is_an_error() {
    let source = "function Main() : Int { let a = [0, size = 4000000000000]; 1 }";
    let err = run_qs(source).unwrap_err();
    assert!(matches!(err, QsError::Eval(EvalError::ArrayTooLarge { .. })));
}

#[test]
fn test_noisy_release_after_round_trip() {
    let source = r"
        operation Main() : Unit {
            use q = Qubit();
            H(q);
            H(q);
        }
    ";
    let options = ExecutionOptions::new(200, Noise::BitFlip { p: 0.2 }).with_seed(1);
    let states = run_qs_with_options(source, &options).unwrap();
    assert_eq!(states.len(), 200);
    assert!(states.iter().all(|s| s.result.as_deref() == Some("()")));
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_bridge_uses_configured_qasm_defaults() {
    let mut config = BridgeConfig::default();
    config.qasm.include_qelib = false;
    let bridge = Bridge::new(config).unwrap();

    let options = bridge.config().qasm;
    let qasm = bridge.qasm2(ENTANGLEMENT_NO_RESET, &options).unwrap();
    assert!(!qasm.contains("qelib1.inc"));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_one_state_per_shot(shots in 0u32..40) {
        let results = run_qs_shots(COIN, shots).unwrap();
        prop_assert_eq!(results.len(), shots as usize);
    }

    #[test]
    fn prop_seeded_runs_repeat(seed in any::<u64>(), shots in 1u32..20) {
        let options = ExecutionOptions::from_shots(shots).with_seed(seed);
        let first = run_qs_with_options(ENTANGLEMENT, &options).unwrap();
        let second = run_qs_with_options(ENTANGLEMENT, &options).unwrap();
        prop_assert_eq!(first, second);
    }
}
