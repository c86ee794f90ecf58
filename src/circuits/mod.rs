// src/circuits/mod.rs

//! Ordered gate sequences for the three-unit register.
//!
//! A spin always uses the same topology: one rotation per unit, followed by
//! two controlled flips (unit0→unit1, unit1→unit2) when entanglement is
//! requested. [`GateSequence::for_spin`] compiles that topology from the
//! request parameters; [`SequenceBuilder`] exists for tests and diagnostics
//! that need other orderings.

use crate::core::{NUM_UNITS, UnitId};
use crate::operations::Operation;
use std::fmt;

/// Represents an ordered, immutable list of operations on the register.
///
/// Analogy: Similar to `qiskit.QuantumCircuit` without the measurement step,
/// which happens later during sampling.
#[derive(Clone, PartialEq)] // PartialEq useful for testing sequences
pub struct GateSequence {
    /// The order is significant: gates are applied front to back.
    operations: Vec<Operation>,
}

impl GateSequence {
    /// Compiles the fixed spin topology for one request.
    ///
    /// # Arguments
    /// * `theta` - Rotation angle applied to every unit. Not validated here.
    /// * `entanglement` - Whether to append the two controlled flips.
    pub fn for_spin(theta: f64, entanglement: bool) -> Self {
        let mut builder = SequenceBuilder::new()
            .add_ops(UnitId::ALL.map(|unit| Operation::Rotate { unit, theta }));
        if entanglement {
            builder = builder
                .add_op(Operation::ControlledFlip { control: UnitId(0), target: UnitId(1) })
                .add_op(Operation::ControlledFlip { control: UnitId(1), target: UnitId(2) });
        }
        builder.build()
    }

    /// Returns a slice containing the ordered sequence of operations.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Returns the number of operations in the sequence.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns `true` if the sequence contains no operations.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Returns `true` if the sequence contains any controlled flip.
    pub fn is_entangling(&self) -> bool {
        self.operations.iter().any(|op| matches!(op, Operation::ControlledFlip { .. }))
    }
}

//-------------------------------------------------------------------------
// Sequence Builder
//-------------------------------------------------------------------------

/// Builds a [`GateSequence`] by method chaining.
#[derive(Default)]
pub struct SequenceBuilder {
    operations: Vec<Operation>,
}

impl SequenceBuilder {
    /// Creates a new, empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one operation.
    pub fn add_op(mut self, op: Operation) -> Self {
        self.operations.push(op);
        self
    }

    /// Appends every operation from an iterator.
    pub fn add_ops<I>(mut self, ops: I) -> Self
    where
        I: IntoIterator<Item = Operation>,
    {
        self.operations.extend(ops);
        self
    }

    /// Finalizes the construction process and returns the built sequence.
    pub fn build(self) -> GateSequence {
        GateSequence { operations: self.operations }
    }
}

impl fmt::Display for GateSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ops = &self.operations;
        let num_ops = ops.len();
        writeln!(f, "qspin::GateSequence[{} operations on {} units]", num_ops, NUM_UNITS)?;
        if ops.is_empty() {
            return Ok(());
        }

        const GATE_WIDTH: usize = 7; // e.g., "──RY───"
        const WIRE: &str = "───────";
        const V_WIRE: char = '│';
        const H_WIRE: char = '─';

        // op_grid[row][time] holds the gate/wire segment; v_connect[row][time]
        // the connector drawn below that row.
        let mut op_grid: Vec<Vec<String>> = vec![vec![WIRE.to_string(); num_ops]; NUM_UNITS];
        let mut v_connect: Vec<Vec<char>> = vec![vec![' '; num_ops]; NUM_UNITS];

        fn format_gate(symbol: &str) -> String {
            let slen = symbol.chars().count();
            if slen >= GATE_WIDTH {
                symbol.chars().take(GATE_WIDTH).collect()
            } else {
                let total_dashes = GATE_WIDTH - slen;
                let pre_dashes = total_dashes / 2;
                let post_dashes = total_dashes - pre_dashes;
                format!(
                    "{}{}{}",
                    H_WIRE.to_string().repeat(pre_dashes),
                    symbol,
                    H_WIRE.to_string().repeat(post_dashes)
                )
            }
        }

        for (t, op) in ops.iter().enumerate() {
            match op {
                Operation::Rotate { unit, .. } => {
                    if let Some(row) = op_grid.get_mut(unit.0) {
                        row[t] = format_gate(op.symbol());
                    }
                }
                Operation::ControlledFlip { control, target } => {
                    if control.0 < NUM_UNITS && target.0 < NUM_UNITS {
                        op_grid[control.0][t] = format_gate("@");
                        op_grid[target.0][t] = format_gate(op.symbol());
                        let r_min = control.0.min(target.0);
                        let r_max = control.0.max(target.0);
                        for row_vec in v_connect.iter_mut().take(r_max).skip(r_min) {
                            row_vec[t] = V_WIRE;
                        }
                    }
                }
            }
        }

        for (r, row) in op_grid.iter().enumerate() {
            writeln!(f, "{}: {}", UnitId(r), row.join(""))?;
            if r < NUM_UNITS - 1 {
                write!(f, "      ")?; // label width "U(0): "
                for t in 0..num_ops {
                    let padding_needed = GATE_WIDTH - 1;
                    let pre_pad = padding_needed / 2;
                    let post_pad = padding_needed - pre_pad;
                    write!(f, "{}{}{}", " ".repeat(pre_pad), v_connect[r][t], " ".repeat(post_pad))?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

// Keep the Debug impl delegating to Display
impl fmt::Debug for GateSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
