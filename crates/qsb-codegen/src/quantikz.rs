//! LaTeX rendering with the `quantikz` package.

use qsb_ir::{Circuit, Instruction, InstructionKind, StandardGate};

const QUANTUM_WIRE: &str = "\\qw";
const CLASSICAL_WIRE: &str = "\\cw";

/// Render a circuit as a `quantikz` environment.
///
/// Each qubit gets one row. Instructions are placed greedily in the first
/// column where every row they span is free, so a multi-qubit gate never
/// crosses another gate's vertical line. A measurement switches the rest of
/// its wire to classical, and a reset switches it back.
pub fn render_quantikz(circuit: &Circuit) -> String {
    let rows = circuit.num_qubits();
    let placed = layer(circuit);
    let columns = placed.iter().map(|(col, _)| col + 1).max().unwrap_or(0);

    // One trailing wire column after the last instruction.
    let mut table = vec![vec![QUANTUM_WIRE.to_string(); columns + 1]; rows];
    for (col, inst) in placed {
        draw(&mut table, col, inst);
    }

    let mut out = String::from("\\begin{quantikz}\n");
    for (row, cells) in table.iter().enumerate() {
        out.push_str(&format!("\\lstick{{$\\ket{{0}}_{{{row}}}$}} & "));
        out.push_str(&cells.join(" & "));
        out.push_str(" \\\\\n");
    }
    out.push_str("\\end{quantikz}\n");
    out
}

fn layer(circuit: &Circuit) -> Vec<(usize, &Instruction)> {
    let mut next_free = vec![0usize; circuit.num_qubits()];
    let mut placed = Vec::with_capacity(circuit.len());
    for inst in circuit.instructions() {
        let Some((lo, hi)) = inst.qubit_span() else {
            continue;
        };
        let span = lo as usize..=hi as usize;
        let col = next_free[span.clone()].iter().copied().max().unwrap_or(0);
        for slot in &mut next_free[span] {
            *slot = col + 1;
        }
        placed.push((col, inst));
    }
    placed
}

fn draw(table: &mut [Vec<String>], col: usize, inst: &Instruction) {
    let rows: Vec<usize> = inst.qubits.iter().map(|q| q.index()).collect();
    match &inst.kind {
        InstructionKind::Measure => {
            for &r in &rows {
                table[r][col] = "\\meter{}".into();
                switch_wire(&mut table[r], col, CLASSICAL_WIRE);
            }
        }
        InstructionKind::Reset => {
            for &r in &rows {
                table[r][col] = "\\gate{\\ket{0}}".into();
                switch_wire(&mut table[r], col, QUANTUM_WIRE);
            }
        }
        InstructionKind::Gate(gate) => draw_gate(table, col, gate, &rows),
    }
}

fn switch_wire(row: &mut [String], col: usize, wire: &str) {
    for cell in &mut row[col + 1..] {
        *cell = wire.to_string();
    }
}

fn draw_gate(table: &mut [Vec<String>], col: usize, gate: &StandardGate, rows: &[usize]) {
    let controls = gate.num_controls();
    let (ctrl_rows, target_rows) = rows.split_at(controls.min(rows.len()));
    let Some(&anchor) = target_rows.first() else {
        return;
    };

    match gate {
        StandardGate::CX | StandardGate::CCX => {
            table[anchor][col] = "\\targ{}".into();
        }
        StandardGate::CZ => {
            table[anchor][col] = format!("\\ctrl{{{}}}", offset(anchor, ctrl_rows[0]));
        }
        StandardGate::Swap | StandardGate::CSwap => {
            let other = target_rows[1];
            let (top, bottom) = (anchor.min(other), anchor.max(other));
            table[top][col] = format!("\\swap{{{}}}", offset(top, bottom));
            table[bottom][col] = "\\targX{}".into();
        }
        StandardGate::CY => {
            table[anchor][col] = "\\gate{Y}".into();
        }
        _ if target_rows.len() > 1 => {
            let top = target_rows.iter().copied().min().unwrap_or(anchor);
            let bottom = target_rows.iter().copied().max().unwrap_or(anchor);
            table[top][col] = format!("\\gate[wires={}]{{{}}}", bottom - top + 1, label(gate));
        }
        _ => {
            table[anchor][col] = format!("\\gate{{{}}}", label(gate));
        }
    }

    for &ctrl in ctrl_rows {
        table[ctrl][col] = format!("\\ctrl{{{}}}", offset(ctrl, anchor));
    }
}

fn offset(from: usize, to: usize) -> isize {
    to as isize - from as isize
}

fn label(gate: &StandardGate) -> String {
    let base = match gate {
        StandardGate::I => "I",
        StandardGate::X | StandardGate::CX | StandardGate::CCX => "X",
        StandardGate::Y | StandardGate::CY => "Y",
        StandardGate::Z | StandardGate::CZ => "Z",
        StandardGate::H => "H",
        StandardGate::S => "S",
        StandardGate::Sdg => "S^\\dagger",
        StandardGate::T => "T",
        StandardGate::Tdg => "T^\\dagger",
        StandardGate::Rx(_) => "R_x",
        StandardGate::Ry(_) => "R_y",
        StandardGate::Rz(_) => "R_z",
        StandardGate::R1(_) => "R_1",
        StandardGate::Swap | StandardGate::CSwap => "SWAP",
        StandardGate::RXX(_) => "R_{xx}",
        StandardGate::RYY(_) => "R_{yy}",
        StandardGate::RZZ(_) => "R_{zz}",
    };
    match gate.angle() {
        Some(theta) => format!("{base}({theta:.4})"),
        None => base.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qsb_ir::{ClbitId, QubitId};
    use std::f64::consts::PI;

    #[test]
    fn test_h_and_measure() {
        let mut circuit = Circuit::with_size("c", 1, 1);
        circuit.gate(StandardGate::H, [QubitId(0)]).unwrap();
        circuit.measure(QubitId(0), ClbitId(0)).unwrap();
        assert_eq!(
            render_quantikz(&circuit),
            "\\begin{quantikz}\n\
             \\lstick{$\\ket{0}_{0}$} & \\gate{H} & \\meter{} & \\cw \\\\\n\
             \\end{quantikz}\n"
        );
    }

    #[test]
    fn test_toffoli() {
        let mut circuit = Circuit::with_size("c", 3, 0);
        circuit
            .gate(StandardGate::CCX, [QubitId(0), QubitId(1), QubitId(2)])
            .unwrap();
        let expected = r"\begin{quantikz}
\lstick{$\ket{0}_{0}$} & \ctrl{2} & \qw \\
\lstick{$\ket{0}_{1}$} & \ctrl{1} & \qw \\
\lstick{$\ket{0}_{2}$} & \targ{} & \qw \\
\end{quantikz}
";
        assert_eq!(render_quantikz(&circuit), expected);
    }

    #[test]
    fn test_swap() {
        let mut circuit = Circuit::with_size("c", 2, 0);
        circuit
            .gate(StandardGate::Swap, [QubitId(0), QubitId(1)])
            .unwrap();
        let expected = r"\begin{quantikz}
\lstick{$\ket{0}_{0}$} & \swap{1} & \qw \\
\lstick{$\ket{0}_{1}$} & \targX{} & \qw \\
\end{quantikz}
";
        assert_eq!(render_quantikz(&circuit), expected);
    }

    #[test]
    fn test_rotation_layering() {
        let (q0, q1) = (QubitId(0), QubitId(1));
        let mut circuit = Circuit::with_size("c", 2, 2);
        circuit
            .gate(StandardGate::X, [q0])
            .unwrap()
            .gate(StandardGate::X, [q1])
            .unwrap()
            .gate(StandardGate::H, [q0])
            .unwrap();
        circuit.gate(StandardGate::CX, [q0, q1]).unwrap();
        circuit.gate(StandardGate::Rz(2.0 * PI / 3.0), [q1]).unwrap();
        circuit
            .gate(StandardGate::H, [q0])
            .unwrap()
            .gate(StandardGate::H, [q1])
            .unwrap();
        circuit.measure(q0, ClbitId(0)).unwrap();
        circuit.measure(q1, ClbitId(1)).unwrap();

        let expected = r"\begin{quantikz}
\lstick{$\ket{0}_{0}$} & \gate{X} & \gate{H} & \ctrl{1} & \gate{H} & \meter{} & \cw & \cw \\
\lstick{$\ket{0}_{1}$} & \gate{X} & \qw & \targ{} & \gate{R_z(2.0944)} & \gate{H} & \meter{} & \cw \\
\end{quantikz}
";
        assert_eq!(render_quantikz(&circuit), expected);
    }

    #[test]
    fn test_reset_returns_to_quantum_wire() {
        let mut circuit = Circuit::with_size("c", 1, 1);
        circuit.measure(QubitId(0), ClbitId(0)).unwrap();
        circuit.reset(QubitId(0)).unwrap();
        let tex = render_quantikz(&circuit);
        assert!(tex.contains(r"\meter{} & \gate{\ket{0}} & \qw \\"));
    }

    #[test]
    fn test_controlled_z_and_adjoint_labels() {
        let mut circuit = Circuit::with_size("c", 2, 0);
        circuit
            .gate(StandardGate::CZ, [QubitId(1), QubitId(0)])
            .unwrap();
        circuit.gate(StandardGate::Tdg, [QubitId(0)]).unwrap();
        let tex = render_quantikz(&circuit);
        assert!(tex.contains(r"\lstick{$\ket{0}_{0}$} & \ctrl{1} & \gate{T^\dagger} & \qw \\"));
        assert!(tex.contains(r"\lstick{$\ket{0}_{1}$} & \ctrl{-1} & \qw & \qw \\"));
    }

    #[test]
    fn test_empty_circuit() {
        let circuit = Circuit::new("c");
        assert_eq!(render_quantikz(&circuit), "\\begin{quantikz}\n\\end{quantikz}\n");
    }
}
