//! The engine behind the public operations.

use std::thread;

use tracing::{Span, debug, info, instrument};

use qsb_codegen::{
    CircuitTracer, OutputShape, QasmGenerationOptions, emit_qasm2, emit_qir, render_quantikz,
};
use qsb_eval::{Interpreter, NullReceiver, Value};
use qsb_ir::Circuit;
use qsb_sim::SimulatorBackend;

use crate::config::BridgeConfig;
use crate::error::{QsError, QsResult};
use crate::state::{ExecutionOptions, ExecutionState};

/// Stack for the thread that parses and evaluates a program. Parsing and
/// evaluation recurse per nesting level and per call, up to
/// the parser nesting limit and [`qsb_eval::MAX_CALL_DEPTH`].
const EVAL_STACK_SIZE: usize = 256 * 1024 * 1024;

/// Shots whose states are allocated up front.
const PREALLOCATED_SHOTS: u32 = 1024;

/// Runs and translates programs with a fixed configuration.
///
/// Every call builds its own interpreter and backend, so one `Bridge` can
/// serve any number of calls.
#[derive(Debug, Clone, Default)]
pub struct Bridge {
    config: BridgeConfig,
}

impl Bridge {
    /// Create a bridge, validating the configuration.
    pub fn new(config: BridgeConfig) -> QsResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The active configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Run the entry point once.
    pub fn run(&self, source: &str) -> QsResult<ExecutionState> {
        let mut states = self.run_with_options(source, &ExecutionOptions::default())?;
        Ok(states.pop().unwrap_or_default())
    }

    /// Run the entry point for `shots` noiseless shots.
    pub fn run_shots(&self, source: &str, shots: u32) -> QsResult<Vec<ExecutionState>> {
        self.run_with_options(source, &ExecutionOptions::from_shots(shots))
    }

    /// Run the entry point once per shot, in order.
    ///
    /// All shots share one simulator and one random stream; the register is
    /// cleared between shots. A fixed seed makes the whole sequence
    /// reproducible.
    #[instrument(skip_all, fields(shots = options.shots, noise = %options.noise))]
    pub fn run_with_options(
        &self,
        source: &str,
        options: &ExecutionOptions,
    ) -> QsResult<Vec<ExecutionState>> {
        let noise = options.noise.distribution().map_err(QsError::InvalidNoise)?;
        on_eval_stack(|| {
            let interp = Interpreter::new(source)?;
            let mut sim = self.simulator(options.seed).with_noise(noise);

            let mut states =
                Vec::with_capacity(options.shots.min(PREALLOCATED_SHOTS) as usize);
            for shot in 0..options.shots {
                sim.reset_state();
                let mut state = ExecutionState::default();
                let value = interp.eval_entry(&mut sim, &mut state)?;
                debug!(shot, result = %value, messages = state.messages.len(), "Shot finished");
                state.set_result(value.to_string());
                states.push(state);
            }
            info!(shots = states.len(), "Run finished");
            Ok(states)
        })
    }

    /// Translate a program to OpenQASM 2.0.
    #[instrument(skip_all)]
    pub fn qasm2(&self, source: &str, options: &QasmGenerationOptions) -> QsResult<String> {
        let (circuit, _) = on_eval_stack(|| trace(&Interpreter::new(source)?))?;
        Ok(emit_qasm2(&circuit, options)?)
    }

    /// Translate an expression to OpenQASM 2.0.
    #[instrument(skip_all)]
    pub fn qasm2_expression(
        &self,
        expression: &str,
        options: &QasmGenerationOptions,
    ) -> QsResult<String> {
        let (circuit, _) = on_eval_stack(|| trace(&Interpreter::from_expression(expression)?))?;
        Ok(emit_qasm2(&circuit, options)?)
    }

    /// Translate a program to base-profile QIR.
    #[instrument(skip_all)]
    pub fn qir(&self, source: &str) -> QsResult<String> {
        on_eval_stack(|| qir_for(&Interpreter::new(source)?))
    }

    /// Translate an expression to base-profile QIR.
    #[instrument(skip_all)]
    pub fn qir_expression(&self, expression: &str) -> QsResult<String> {
        on_eval_stack(|| qir_for(&Interpreter::from_expression(expression)?))
    }

    /// Run the program once on the simulator and record its circuit.
    ///
    /// Measurement outcomes are real, so programs that branch on them trace
    /// the branch that was taken.
    #[instrument(skip_all)]
    pub fn circuit(&self, source: &str) -> QsResult<Circuit> {
        on_eval_stack(|| self.simulate_circuit(&Interpreter::new(source)?))
    }

    /// Render the program's circuit as quantikz LaTeX.
    pub fn quantikz(&self, source: &str) -> QsResult<String> {
        Ok(render_quantikz(&self.circuit(source)?))
    }

    /// Render the circuit of the operation `name` as quantikz LaTeX.
    ///
    /// The operation needs no `@EntryPoint()` but must take no arguments.
    /// `name` may be namespace-qualified, as in `Test.Main`.
    #[instrument(skip(self, source))]
    pub fn quantikz_operation(&self, name: &str, source: &str) -> QsResult<String> {
        let circuit =
            on_eval_stack(|| self.simulate_circuit(&Interpreter::with_operation(source, name)?))?;
        Ok(render_quantikz(&circuit))
    }

    fn simulate_circuit(&self, interp: &Interpreter) -> QsResult<Circuit> {
        let mut sim = self.simulator(None);
        let mut tracer = CircuitTracer::wrapping(circuit_name(interp), &mut sim);
        interp.eval_entry(&mut tracer, &mut NullReceiver)?;
        let circuit = tracer.into_circuit();
        debug!(qubits = circuit.num_qubits(), instructions = circuit.len(), "Traced circuit");
        Ok(circuit)
    }

    fn simulator(&self, seed: Option<u64>) -> SimulatorBackend {
        let sim = SimulatorBackend::with_max_qubits(self.config.simulator.max_qubits);
        match seed.or(self.config.simulator.seed) {
            Some(seed) => sim.with_seed(seed),
            None => sim,
        }
    }
}

/// Run `f` on a thread with [`EVAL_STACK_SIZE`] bytes of stack, inside the
/// caller's tracing span.
fn on_eval_stack<T, F>(f: F) -> QsResult<T>
where
    T: Send,
    F: FnOnce() -> QsResult<T> + Send,
{
    let span = Span::current();
    thread::scope(|scope| {
        let handle = thread::Builder::new()
            .name("qsb-eval".into())
            .stack_size(EVAL_STACK_SIZE)
            .spawn_scoped(scope, move || span.in_scope(f))
            .map_err(QsError::Thread)?;
        handle
            .join()
            .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
    })
}

fn circuit_name(interp: &Interpreter) -> String {
    interp.entry_name().unwrap_or("expression").to_string()
}

fn trace(interp: &Interpreter) -> QsResult<(Circuit, Value)> {
    let mut tracer = CircuitTracer::new(circuit_name(interp));
    let value = interp.eval_entry(&mut tracer, &mut NullReceiver)?;
    let circuit = tracer.into_circuit();
    debug!(qubits = circuit.num_qubits(), instructions = circuit.len(), "Traced circuit");
    Ok((circuit, value))
}

fn qir_for(interp: &Interpreter) -> QsResult<String> {
    let (circuit, value) = trace(interp)?;
    let shape = OutputShape::from_value(&value)?;
    Ok(emit_qir(&circuit, &shape)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qsb_eval::{BackendError, EvalError};
    use qsb_ir::Noise;

    const COIN: &str = r#"
        operation Main() : Result {
            use q = Qubit();
            H(q);
            MResetZ(q)
        }
    "#;

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = BridgeConfig::default();
        config.simulator.max_qubits = 0;
        assert!(matches!(Bridge::new(config), Err(QsError::Config(_))));
    }

    #[test]
    fn test_config_seed_is_default_seed() {
        let mut config = BridgeConfig::default();
        config.simulator.seed = Some(11);
        let bridge = Bridge::new(config).unwrap();
        let a = bridge.run_shots(COIN, 20).unwrap();
        let b = bridge.run_shots(COIN, 20).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_max_qubits_enforced() {
        let mut config = BridgeConfig::default();
        config.simulator.max_qubits = 2;
        let bridge = Bridge::new(config).unwrap();
        let err = bridge
            .run("operation Main() : Unit { use qs = Qubit[3]; }")
            .unwrap_err();
        assert!(matches!(
            err,
            QsError::Eval(EvalError::Backend(BackendError::TooManyQubits { max: 2 }))
        ));
    }

    #[test]
    fn test_invalid_noise_rejected() {
        let options = ExecutionOptions::from_noise(Noise::BitFlip { p: 1.5 });
        let err = Bridge::default().run_with_options(COIN, &options).unwrap_err();
        assert!(matches!(err, QsError::InvalidNoise(_)));
    }

    #[test]
    fn test_zero_shots() {
        let states = Bridge::default().run_shots(COIN, 0).unwrap();
        assert!(states.is_empty());
    }
}
