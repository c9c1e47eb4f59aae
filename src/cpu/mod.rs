/*!
6502 CPU core.

Layout:
- `state.rs`: register file, flags, stack, reset/NMI entry.
- `table.rs`: static 256-entry (mnemonic, mode) dispatch table.
- `addressing.rs`: operand address resolution, including the hardware
  pointer-wrap quirks.
- `execute.rs`: instruction semantics and batch stepping.

Timing is an instruction budget (the driving loop runs a fixed number of
instructions per scanline), not per-opcode cycle counting.
*/

pub mod addressing;
pub mod execute;
pub mod state;
pub mod table;

pub use state::{
    BREAK, CARRY, Cpu, DECIMAL, IRQ_DISABLE, IRQ_VECTOR, NEGATIVE, NMI_VECTOR, OVERFLOW,
    RESET_VECTOR, UNUSED, ZERO,
};
pub use table::{Instruction, Mnemonic, Mode, OPCODES};
