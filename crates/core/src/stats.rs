//! Execution statistics.
//!
//! This module tracks what a run has executed. It provides:
//! 1. **Instruction Count:** Total basic instructions executed, net of step-backs.
//! 2. **Instruction Mix:** Counts per [`InstrClass`] (ALU, load, store, branch, jump, FP, syscall).
//! 3. **Reporting:** A plain-text summary for the console.

use std::collections::BTreeMap;
use std::time::Instant;

use crate::isa::instruction::InstrClass;

/// Instruction statistics of one run.
#[derive(Clone, Debug)]
pub struct InstructionStats {
    start_time: Instant,
    /// Basic instructions executed.
    pub total: u64,
    mix: BTreeMap<InstrClass, u64>,
}

impl Default for InstructionStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            total: 0,
            mix: BTreeMap::new(),
        }
    }
}

/// Report row labels, in display order.
const MIX_ROWS: [(InstrClass, &str); 8] = [
    (InstrClass::Alu, "op.alu"),
    (InstrClass::Load, "op.load"),
    (InstrClass::Store, "op.store"),
    (InstrClass::Branch, "op.branch"),
    (InstrClass::Jump, "op.jump"),
    (InstrClass::Float, "op.fp"),
    (InstrClass::Syscall, "op.syscall"),
    (InstrClass::Other, "op.other"),
];

impl InstructionStats {
    /// Counts one executed instruction.
    pub fn record(&mut self, class: InstrClass) {
        self.total += 1;
        *self.mix.entry(class).or_insert(0) += 1;
    }

    /// Uncounts an instruction undone by step-back.
    pub fn unrecord(&mut self, class: InstrClass) {
        self.total = self.total.saturating_sub(1);
        if let Some(n) = self.mix.get_mut(&class) {
            *n = n.saturating_sub(1);
        }
    }

    /// Instructions of `class` executed.
    pub fn count(&self, class: InstrClass) -> u64 {
        self.mix.get(&class).copied().unwrap_or(0)
    }

    /// Formats the summary and instruction mix.
    pub fn report(&self) -> String {
        let seconds = self.start_time.elapsed().as_secs_f64();
        let total = self.total.max(1) as f64;
        let mut out = String::new();
        out.push_str("==========================================================\n");
        out.push_str("EXECUTION STATISTICS\n");
        out.push_str("==========================================================\n");
        out.push_str(&format!("host_seconds             {seconds:.4} s\n"));
        out.push_str(&format!("sim_insts                {}\n", self.total));
        out.push_str("----------------------------------------------------------\n");
        out.push_str("INSTRUCTION MIX\n");
        for (class, name) in MIX_ROWS {
            let n = self.count(class);
            out.push_str(&format!(
                "  {name:<22} {n} ({:.2}%)\n",
                n as f64 / total * 100.0
            ));
        }
        out.push_str("==========================================================\n");
        out
    }
}
