/*!
Instruction semantics and batch stepping.

`step` fetches one opcode, dispatches through the static table and mutates
CPU/bus state; `run` executes a fixed instruction count (the timing model is
a per-scanline instruction budget, not per-opcode cycles).
*/

use crate::bus::Bus;
use crate::cpu::addressing::{
    addr_abs, addr_abs_x, addr_abs_y, addr_indirect, addr_indirect_x, addr_indirect_y, addr_zp,
    addr_zp_x, addr_zp_y,
};
use crate::cpu::state::{
    BREAK, CARRY, Cpu, DECIMAL, IRQ_DISABLE, NEGATIVE, OVERFLOW, UNUSED, ZERO,
};
use crate::cpu::table::{Mnemonic, Mode, OPCODES};

impl Cpu {
    /// Execute `instructions` sequential instructions.
    pub fn run(&mut self, bus: &mut Bus, instructions: u32) {
        for _ in 0..instructions {
            self.step(bus);
        }
    }

    /// Fetch, decode and execute a single instruction.
    ///
    /// Panics on undefined opcodes; programs are assumed to stay within the
    /// official instruction set.
    pub fn step(&mut self, bus: &mut Bus) {
        let at = self.pc;
        let opcode = self.fetch_u8(bus);
        let inst = OPCODES[opcode as usize];
        let mode = inst.mode;

        match inst.mnemonic {
            // Loads and stores.
            Mnemonic::Lda => {
                self.a = self.operand_value(bus, mode);
                let a = self.a;
                self.update_zn(a);
            }
            Mnemonic::Ldx => {
                self.x = self.operand_value(bus, mode);
                let x = self.x;
                self.update_zn(x);
            }
            Mnemonic::Ldy => {
                self.y = self.operand_value(bus, mode);
                let y = self.y;
                self.update_zn(y);
            }
            Mnemonic::Sta => {
                let addr = self.operand_addr(bus, mode);
                bus.write(addr, self.a);
            }
            Mnemonic::Stx => {
                let addr = self.operand_addr(bus, mode);
                bus.write(addr, self.x);
            }
            Mnemonic::Sty => {
                let addr = self.operand_addr(bus, mode);
                bus.write(addr, self.y);
            }

            // Arithmetic.
            Mnemonic::Adc => {
                let v = self.operand_value(bus, mode);
                self.adc(v);
            }
            Mnemonic::Sbc => {
                // Subtraction is addition of the complement; carry acts as
                // the inverted borrow.
                let v = self.operand_value(bus, mode);
                self.adc(v ^ 0xFF);
            }
            Mnemonic::Cmp => {
                let v = self.operand_value(bus, mode);
                let a = self.a;
                self.compare(a, v);
            }
            Mnemonic::Cpx => {
                let v = self.operand_value(bus, mode);
                let x = self.x;
                self.compare(x, v);
            }
            Mnemonic::Cpy => {
                let v = self.operand_value(bus, mode);
                let y = self.y;
                self.compare(y, v);
            }

            // Logic.
            Mnemonic::And => {
                self.a &= self.operand_value(bus, mode);
                let a = self.a;
                self.update_zn(a);
            }
            Mnemonic::Ora => {
                self.a |= self.operand_value(bus, mode);
                let a = self.a;
                self.update_zn(a);
            }
            Mnemonic::Eor => {
                self.a ^= self.operand_value(bus, mode);
                let a = self.a;
                self.update_zn(a);
            }
            Mnemonic::Bit => {
                let v = self.operand_value(bus, mode);
                self.assign_flag(ZERO, self.a & v == 0);
                self.assign_flag(NEGATIVE, v & NEGATIVE != 0);
                self.assign_flag(OVERFLOW, v & OVERFLOW != 0);
            }

            // Shifts and rotates (accumulator when the mode is implied).
            Mnemonic::Asl => self.read_modify_write(bus, mode, |cpu, v| {
                cpu.assign_flag(CARRY, v & 0x80 != 0);
                v << 1
            }),
            Mnemonic::Lsr => self.read_modify_write(bus, mode, |cpu, v| {
                cpu.assign_flag(CARRY, v & 0x01 != 0);
                v >> 1
            }),
            Mnemonic::Rol => self.read_modify_write(bus, mode, |cpu, v| {
                let carry_in = cpu.is_flag_set(CARRY) as u8;
                cpu.assign_flag(CARRY, v & 0x80 != 0);
                (v << 1) | carry_in
            }),
            Mnemonic::Ror => self.read_modify_write(bus, mode, |cpu, v| {
                let carry_in = (cpu.is_flag_set(CARRY) as u8) << 7;
                cpu.assign_flag(CARRY, v & 0x01 != 0);
                (v >> 1) | carry_in
            }),

            // Increments and decrements.
            Mnemonic::Inc => self.read_modify_write(bus, mode, |_, v| v.wrapping_add(1)),
            Mnemonic::Dec => self.read_modify_write(bus, mode, |_, v| v.wrapping_sub(1)),
            Mnemonic::Inx => {
                self.x = self.x.wrapping_add(1);
                let x = self.x;
                self.update_zn(x);
            }
            Mnemonic::Iny => {
                self.y = self.y.wrapping_add(1);
                let y = self.y;
                self.update_zn(y);
            }
            Mnemonic::Dex => {
                self.x = self.x.wrapping_sub(1);
                let x = self.x;
                self.update_zn(x);
            }
            Mnemonic::Dey => {
                self.y = self.y.wrapping_sub(1);
                let y = self.y;
                self.update_zn(y);
            }

            // Transfers.
            Mnemonic::Tax => {
                self.x = self.a;
                let x = self.x;
                self.update_zn(x);
            }
            Mnemonic::Tay => {
                self.y = self.a;
                let y = self.y;
                self.update_zn(y);
            }
            Mnemonic::Txa => {
                self.a = self.x;
                let a = self.a;
                self.update_zn(a);
            }
            Mnemonic::Tya => {
                self.a = self.y;
                let a = self.a;
                self.update_zn(a);
            }
            Mnemonic::Tsx => {
                self.x = self.sp;
                let x = self.x;
                self.update_zn(x);
            }
            // TXS updates no flags.
            Mnemonic::Txs => self.sp = self.x,

            // Stack.
            Mnemonic::Pha => {
                let a = self.a;
                self.push_u8(bus, a);
            }
            Mnemonic::Pla => {
                self.a = self.pop_u8(bus);
                let a = self.a;
                self.update_zn(a);
            }
            // PHP pushes with B set; the live register never keeps B.
            Mnemonic::Php => {
                let status = self.status | BREAK | UNUSED;
                self.push_u8(bus, status);
            }
            Mnemonic::Plp => {
                let status = self.pop_u8(bus);
                self.status = (status | UNUSED) & !BREAK;
            }

            // Jumps and subroutines.
            Mnemonic::Jmp => self.pc = self.operand_addr(bus, mode),
            Mnemonic::Jsr => {
                let target = addr_abs(self, bus);
                // Return address is the last byte of this instruction; RTS
                // adds one back.
                let ret = self.pc.wrapping_sub(1);
                self.push_u16(bus, ret);
                self.pc = target;
            }
            Mnemonic::Rts => self.pc = self.pop_u16(bus).wrapping_add(1),
            Mnemonic::Rti => {
                let status = self.pop_u8(bus);
                self.status = (status | UNUSED) & !BREAK;
                self.pc = self.pop_u16(bus);
            }

            // Branches.
            Mnemonic::Bcc => self.branch(bus, !self.is_flag_set(CARRY)),
            Mnemonic::Bcs => self.branch(bus, self.is_flag_set(CARRY)),
            Mnemonic::Bne => self.branch(bus, !self.is_flag_set(ZERO)),
            Mnemonic::Beq => self.branch(bus, self.is_flag_set(ZERO)),
            Mnemonic::Bpl => self.branch(bus, !self.is_flag_set(NEGATIVE)),
            Mnemonic::Bmi => self.branch(bus, self.is_flag_set(NEGATIVE)),
            Mnemonic::Bvc => self.branch(bus, !self.is_flag_set(OVERFLOW)),
            Mnemonic::Bvs => self.branch(bus, self.is_flag_set(OVERFLOW)),

            // Flag manipulation.
            Mnemonic::Clc => self.assign_flag(CARRY, false),
            Mnemonic::Sec => self.assign_flag(CARRY, true),
            Mnemonic::Cli => self.assign_flag(IRQ_DISABLE, false),
            Mnemonic::Sei => self.assign_flag(IRQ_DISABLE, true),
            Mnemonic::Cld => self.assign_flag(DECIMAL, false),
            Mnemonic::Sed => self.assign_flag(DECIMAL, true),
            Mnemonic::Clv => self.assign_flag(OVERFLOW, false),

            Mnemonic::Nop => {}

            // Software interrupts are not used by the supported ROM set.
            Mnemonic::Brk => {
                debug_assert!(false, "BRK executed at {at:#06X}");
            }

            Mnemonic::Illegal => {
                panic!("illegal opcode {opcode:#04X} at {at:#06X}");
            }
        }
    }

    // -----------------------------
    // Operand plumbing
    // -----------------------------

    /// Resolve the effective address for a memory addressing mode.
    fn operand_addr(&mut self, bus: &mut Bus, mode: Mode) -> u16 {
        match mode {
            Mode::Immediate => {
                let addr = self.pc;
                self.pc = self.pc.wrapping_add(1);
                addr
            }
            Mode::ZeroPage => addr_zp(self, bus),
            Mode::ZeroPageX => addr_zp_x(self, bus),
            Mode::ZeroPageY => addr_zp_y(self, bus),
            Mode::Absolute => addr_abs(self, bus),
            Mode::AbsoluteX => addr_abs_x(self, bus),
            Mode::AbsoluteY => addr_abs_y(self, bus),
            Mode::Indirect => addr_indirect(self, bus),
            Mode::IndirectX => addr_indirect_x(self, bus),
            Mode::IndirectY => addr_indirect_y(self, bus),
            Mode::Implied | Mode::Relative => {
                unreachable!("mode has no memory operand")
            }
        }
    }

    /// Fetch the operand value; implied means the accumulator.
    fn operand_value(&mut self, bus: &mut Bus, mode: Mode) -> u8 {
        match mode {
            Mode::Implied => self.a,
            _ => {
                let addr = self.operand_addr(bus, mode);
                bus.read(addr)
            }
        }
    }

    /// Shared path for shifts, rotates and memory inc/dec. Implied mode
    /// operates on the accumulator in place.
    fn read_modify_write<F>(&mut self, bus: &mut Bus, mode: Mode, f: F)
    where
        F: FnOnce(&mut Self, u8) -> u8,
    {
        if mode == Mode::Implied {
            let a = self.a;
            let result = f(self, a);
            self.a = result;
            self.update_zn(result);
        } else {
            let addr = self.operand_addr(bus, mode);
            let value = bus.read(addr);
            let result = f(self, value);
            bus.write(addr, result);
            self.update_zn(result);
        }
    }

    // -----------------------------
    // Shared arithmetic
    // -----------------------------

    /// A + v + C with carry out of bit 8 and signed overflow when both
    /// inputs share a sign the result does not.
    fn adc(&mut self, v: u8) {
        let carry_in = self.is_flag_set(CARRY) as u16;
        let sum = self.a as u16 + v as u16 + carry_in;
        let result = sum as u8;

        self.assign_flag(CARRY, sum > 0xFF);
        self.assign_flag(OVERFLOW, (!(self.a ^ v) & (self.a ^ result)) & 0x80 != 0);
        self.a = result;
        self.update_zn(result);
    }

    /// CMP/CPX/CPY: set C/Z/N from reg - v without storing the difference.
    fn compare(&mut self, reg: u8, v: u8) {
        self.assign_flag(CARRY, reg >= v);
        self.update_zn(reg.wrapping_sub(v));
    }

    /// Conditional relative branch; the offset is signed and applied to the
    /// PC after the operand fetch.
    fn branch(&mut self, bus: &mut Bus, taken: bool) {
        let offset = self.fetch_u8(bus) as i8;
        if taken {
            self.pc = self.pc.wrapping_add(offset as i16 as u16);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Bus;

    /// Load a program at $0200 in RAM and point the PC at it.
    fn setup(program: &[u8]) -> (Cpu, Bus) {
        let mut bus = Bus::new();
        for (i, b) in program.iter().enumerate() {
            bus.write(0x0200 + i as u16, *b);
        }
        let mut cpu = Cpu::new();
        cpu.pc = 0x0200;
        (cpu, bus)
    }

    #[test]
    fn lda_sets_zero_and_negative() {
        let (mut cpu, mut bus) = setup(&[0xA9, 0x00, 0xA9, 0x80, 0xA9, 0x01]);
        cpu.step(&mut bus);
        assert!(cpu.is_flag_set(ZERO));
        cpu.step(&mut bus);
        assert!(cpu.is_flag_set(NEGATIVE));
        assert!(!cpu.is_flag_set(ZERO));
        cpu.step(&mut bus);
        assert_eq!(cpu.status & (ZERO | NEGATIVE), 0);
    }

    #[test]
    fn adc_carry_and_overflow() {
        // 0x7F + 0x01: signed overflow, no carry.
        let (mut cpu, mut bus) = setup(&[0x69, 0x01]);
        cpu.a = 0x7F;
        cpu.step(&mut bus);
        assert_eq!(cpu.a, 0x80);
        assert!(cpu.is_flag_set(OVERFLOW));
        assert!(!cpu.is_flag_set(CARRY));
        assert!(cpu.is_flag_set(NEGATIVE));

        // 0xFF + 0x01: carry out, no signed overflow.
        let (mut cpu, mut bus) = setup(&[0x69, 0x01]);
        cpu.a = 0xFF;
        cpu.step(&mut bus);
        assert_eq!(cpu.a, 0x00);
        assert!(cpu.is_flag_set(CARRY));
        assert!(cpu.is_flag_set(ZERO));
        assert!(!cpu.is_flag_set(OVERFLOW));
    }

    #[test]
    fn adc_then_sbc_recovers_accumulator() {
        // With carry clear before ADC and set before SBC, SBC(ADC(a, b), b)
        // yields a for every 8-bit pair.
        for a in 0..=255u8 {
            for b in 0..=255u8 {
                let (mut cpu, mut bus) = setup(&[0x18, 0x69, b, 0x38, 0xE9, b]);
                cpu.a = a;
                cpu.run(&mut bus, 4);
                assert_eq!(cpu.a, a, "a={a:#04x} b={b:#04x}");
            }
        }
    }

    #[test]
    fn sbc_sets_borrow_flags() {
        // 5 - 3 with carry set: result 2, carry still set (no borrow).
        let (mut cpu, mut bus) = setup(&[0x38, 0xE9, 0x03]);
        cpu.a = 0x05;
        cpu.run(&mut bus, 2);
        assert_eq!(cpu.a, 0x02);
        assert!(cpu.is_flag_set(CARRY));

        // 3 - 5 borrows: carry cleared.
        let (mut cpu, mut bus) = setup(&[0x38, 0xE9, 0x05]);
        cpu.a = 0x03;
        cpu.run(&mut bus, 2);
        assert_eq!(cpu.a, 0xFE);
        assert!(!cpu.is_flag_set(CARRY));
    }

    #[test]
    fn compare_sets_carry_zero_negative() {
        let (mut cpu, mut bus) = setup(&[0xC9, 0x30, 0xC9, 0x40, 0xC9, 0x50]);
        cpu.a = 0x40;
        cpu.step(&mut bus);
        assert!(cpu.is_flag_set(CARRY));
        assert!(!cpu.is_flag_set(ZERO));
        cpu.step(&mut bus);
        assert!(cpu.is_flag_set(CARRY));
        assert!(cpu.is_flag_set(ZERO));
        cpu.step(&mut bus);
        assert!(!cpu.is_flag_set(CARRY));
        assert!(cpu.is_flag_set(NEGATIVE));
    }

    #[test]
    fn shifts_move_bits_through_carry() {
        // ASL A: 0b1000_0001 -> 0b0000_0010, carry set.
        let (mut cpu, mut bus) = setup(&[0x0A, 0x2A]);
        cpu.a = 0x81;
        cpu.step(&mut bus);
        assert_eq!(cpu.a, 0x02);
        assert!(cpu.is_flag_set(CARRY));
        // ROL A pulls the carry back in.
        cpu.step(&mut bus);
        assert_eq!(cpu.a, 0x05);
        assert!(!cpu.is_flag_set(CARRY));
    }

    #[test]
    fn ror_memory_operand() {
        let (mut cpu, mut bus) = setup(&[0x66, 0x10]);
        bus.write(0x0010, 0x03);
        cpu.step(&mut bus);
        assert_eq!(bus.read(0x0010), 0x01);
        assert!(cpu.is_flag_set(CARRY));
    }

    #[test]
    fn inc_dec_memory_wraps() {
        let (mut cpu, mut bus) = setup(&[0xE6, 0x10, 0xC6, 0x11]);
        bus.write(0x0010, 0xFF);
        bus.write(0x0011, 0x00);
        cpu.run(&mut bus, 2);
        assert_eq!(bus.read(0x0010), 0x00);
        assert_eq!(bus.read(0x0011), 0xFF);
    }

    #[test]
    fn bit_copies_operand_high_bits() {
        let (mut cpu, mut bus) = setup(&[0x24, 0x10]);
        bus.write(0x0010, 0xC0);
        cpu.a = 0x01;
        cpu.step(&mut bus);
        assert!(cpu.is_flag_set(ZERO)); // no bits in common
        assert!(cpu.is_flag_set(NEGATIVE));
        assert!(cpu.is_flag_set(OVERFLOW));
    }

    #[test]
    fn branch_taken_and_not_taken() {
        // BNE +2 with Z clear skips the next two bytes.
        let (mut cpu, mut bus) = setup(&[0xD0, 0x02, 0xA9, 0xFF, 0xA9, 0x01]);
        cpu.step(&mut bus);
        assert_eq!(cpu.pc, 0x0204);

        // Backward branch.
        let (mut cpu, mut bus) = setup(&[0xF0, 0xFE]);
        cpu.assign_flag(ZERO, true);
        cpu.step(&mut bus);
        assert_eq!(cpu.pc, 0x0200); // branch to self

        // Not taken just falls through.
        let (mut cpu, mut bus) = setup(&[0xF0, 0x10]);
        cpu.step(&mut bus);
        assert_eq!(cpu.pc, 0x0202);
    }

    #[test]
    fn jsr_rts_roundtrip() {
        let (mut cpu, mut bus) = setup(&[0x20, 0x10, 0x03]); // JSR $0310
        bus.write(0x0310, 0x60); // RTS
        cpu.step(&mut bus);
        assert_eq!(cpu.pc, 0x0310);
        cpu.step(&mut bus);
        assert_eq!(cpu.pc, 0x0203);
    }

    #[test]
    fn jmp_indirect_honors_page_wrap_bug() {
        let (mut cpu, mut bus) = setup(&[0x6C, 0xFF, 0x03]); // JMP ($03FF)
        bus.write(0x03FF, 0x34);
        bus.write(0x0400, 0x99); // next-page byte, must be ignored
        bus.write(0x0300, 0x12); // wrapped high byte read
        cpu.step(&mut bus);
        // High byte comes from $0300 (the wrapped address), low from $03FF.
        assert_eq!(cpu.pc, 0x1234);
    }

    #[test]
    fn php_plp_keeps_unused_set_and_break_clear() {
        let (mut cpu, mut bus) = setup(&[0x08, 0x28]);
        cpu.status = UNUSED | CARRY;
        cpu.step(&mut bus);
        // Pushed copy carries B.
        assert_ne!(bus.read(0x01FD) & BREAK, 0);
        cpu.status = UNUSED;
        cpu.step(&mut bus);
        assert!(cpu.is_flag_set(CARRY));
        assert!(cpu.is_flag_set(UNUSED));
        assert!(!cpu.is_flag_set(BREAK));
    }

    #[test]
    fn rti_restores_status_and_pc() {
        let (mut cpu, mut bus) = setup(&[0x40]);
        // Hand-build an interrupt frame: status, then return address.
        cpu.sp = 0xFA;
        bus.write(0x01FB, CARRY | BREAK); // B must not survive the pop
        bus.write(0x01FC, 0x34);
        bus.write(0x01FD, 0x12);
        cpu.step(&mut bus);
        assert_eq!(cpu.pc, 0x1234);
        assert!(cpu.is_flag_set(CARRY));
        assert!(cpu.is_flag_set(UNUSED));
        assert!(!cpu.is_flag_set(BREAK));
    }

    #[test]
    fn transfers_and_stack_pointer() {
        let (mut cpu, mut bus) = setup(&[0xAA, 0xA8, 0x9A, 0xBA]);
        cpu.a = 0x42;
        cpu.run(&mut bus, 2);
        assert_eq!(cpu.x, 0x42);
        assert_eq!(cpu.y, 0x42);
        cpu.x = 0x80;
        cpu.step(&mut bus); // TXS
        assert_eq!(cpu.sp, 0x80);
        cpu.step(&mut bus); // TSX sets N
        assert!(cpu.is_flag_set(NEGATIVE));
    }

    #[test]
    fn indexed_indirect_load_and_store() {
        // LDA ($20,X) ; STA ($30),Y
        let (mut cpu, mut bus) = setup(&[0xA1, 0x20, 0x91, 0x30]);
        cpu.x = 0x04;
        cpu.y = 0x02;
        bus.write(0x0024, 0x00);
        bus.write(0x0025, 0x03);
        bus.write(0x0300, 0x77);
        bus.write(0x0030, 0x10);
        bus.write(0x0031, 0x03);
        cpu.run(&mut bus, 2);
        assert_eq!(cpu.a, 0x77);
        assert_eq!(bus.read(0x0312), 0x77);
    }

    #[test]
    fn sbc_implied_alias_subtracts_accumulator() {
        // 0xEB with carry set: A - A = 0.
        let (mut cpu, mut bus) = setup(&[0x38, 0xEB]);
        cpu.a = 0x42;
        cpu.run(&mut bus, 2);
        assert_eq!(cpu.a, 0x00);
        assert!(cpu.is_flag_set(ZERO));
        assert!(cpu.is_flag_set(CARRY));
    }

    #[test]
    #[should_panic(expected = "illegal opcode")]
    fn illegal_opcode_panics() {
        let (mut cpu, mut bus) = setup(&[0x02]);
        cpu.step(&mut bus);
    }
}
