//! Circuit statistics for build logs and the `setup` command.

use plonky2::field::extension::Extendable;
use plonky2::hash::hash_types::RichField;
use plonky2::plonk::circuit_data::CommonCircuitData;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CircuitStats {
    /// Rows in the trace (a power of two).
    pub degree: usize,
    pub degree_bits: usize,
    pub total_constraints: usize,
    pub public_inputs: usize,
    pub constants: usize,
    pub gate_types: Vec<String>,
}

impl CircuitStats {
    pub fn from_common<F: RichField + Extendable<D>, const D: usize>(
        common: &CommonCircuitData<F, D>,
    ) -> Self {
        // Upper bound: every row is charged the constraints of every gate type.
        let total_constraints = common
            .gates
            .iter()
            .map(|gate| gate.0.num_constraints())
            .sum::<usize>()
            * common.degree();
        Self {
            degree: common.degree(),
            degree_bits: common.degree_bits(),
            total_constraints,
            public_inputs: common.num_public_inputs,
            constants: common.num_constants,
            gate_types: common.gates.iter().map(|gate| gate.0.id()).collect(),
        }
    }
}

/// Print circuit statistics: trace size, constraints, public inputs and gate types.
pub fn print_circuit_stats<F: RichField + Extendable<D>, const D: usize>(
    name: &str,
    common: &CommonCircuitData<F, D>,
) {
    let stats = CircuitStats::from_common(common);
    println!("{} circuit statistics:", name);
    println!("  Gates: {} (2^{})", stats.degree, stats.degree_bits);
    println!("  Total constraints: {}", stats.total_constraints);
    println!("  Public inputs: {}", stats.public_inputs);
    println!("  Constants: {}", stats.constants);
    println!("  Gate types: {}", stats.gate_types.len());
}
