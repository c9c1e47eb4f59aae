/*!
Static 256-entry opcode dispatch table.

Every opcode maps to a (mnemonic, addressing mode) pair; the table is built
once in a const block and never mutated. Undefined opcodes carry the
`Illegal` sentinel, which the executor treats as a fatal contract violation.

The accumulator forms of ASL/LSR/ROL/ROR use `Mode::Implied`; the executor
reads and writes A for memory-less read-modify-write instructions. 0xEB is
the one non-standard entry kept: SBC with an implied (accumulator) operand.
*/

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    Implied,
    Immediate,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Relative,
    Indirect,
    IndirectX,
    IndirectY,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mnemonic {
    Adc,
    And,
    Asl,
    Bcc,
    Bcs,
    Beq,
    Bit,
    Bmi,
    Bne,
    Bpl,
    Brk,
    Bvc,
    Bvs,
    Clc,
    Cld,
    Cli,
    Clv,
    Cmp,
    Cpx,
    Cpy,
    Dec,
    Dex,
    Dey,
    Eor,
    Inc,
    Inx,
    Iny,
    Jmp,
    Jsr,
    Lda,
    Ldx,
    Ldy,
    Lsr,
    Nop,
    Ora,
    Pha,
    Php,
    Pla,
    Plp,
    Rol,
    Ror,
    Rti,
    Rts,
    Sbc,
    Sec,
    Sed,
    Sei,
    Sta,
    Stx,
    Sty,
    Tax,
    Tay,
    Tsx,
    Txa,
    Txs,
    Tya,
    /// Undefined opcode; executing one is a fatal contract violation.
    Illegal,
}

#[derive(Copy, Clone, Debug)]
pub struct Instruction {
    pub mnemonic: Mnemonic,
    pub mode: Mode,
}

const fn op(mnemonic: Mnemonic, mode: Mode) -> Instruction {
    Instruction { mnemonic, mode }
}

pub static OPCODES: [Instruction; 256] = {
    use Mnemonic::*;
    use Mode::*;

    let mut t = [op(Illegal, Implied); 256];

    t[0x00] = op(Brk, Implied);
    t[0x01] = op(Ora, IndirectX);
    t[0x05] = op(Ora, ZeroPage);
    t[0x06] = op(Asl, ZeroPage);
    t[0x08] = op(Php, Implied);
    t[0x09] = op(Ora, Immediate);
    t[0x0A] = op(Asl, Implied);
    t[0x0D] = op(Ora, Absolute);
    t[0x0E] = op(Asl, Absolute);

    t[0x10] = op(Bpl, Relative);
    t[0x11] = op(Ora, IndirectY);
    t[0x15] = op(Ora, ZeroPageX);
    t[0x16] = op(Asl, ZeroPageX);
    t[0x18] = op(Clc, Implied);
    t[0x19] = op(Ora, AbsoluteY);
    t[0x1D] = op(Ora, AbsoluteX);
    t[0x1E] = op(Asl, AbsoluteX);

    t[0x20] = op(Jsr, Absolute);
    t[0x21] = op(And, IndirectX);
    t[0x24] = op(Bit, ZeroPage);
    t[0x25] = op(And, ZeroPage);
    t[0x26] = op(Rol, ZeroPage);
    t[0x28] = op(Plp, Implied);
    t[0x29] = op(And, Immediate);
    t[0x2A] = op(Rol, Implied);
    t[0x2C] = op(Bit, Absolute);
    t[0x2D] = op(And, Absolute);
    t[0x2E] = op(Rol, Absolute);

    t[0x30] = op(Bmi, Relative);
    t[0x31] = op(And, IndirectY);
    t[0x35] = op(And, ZeroPageX);
    t[0x36] = op(Rol, ZeroPageX);
    t[0x38] = op(Sec, Implied);
    t[0x39] = op(And, AbsoluteY);
    t[0x3D] = op(And, AbsoluteX);
    t[0x3E] = op(Rol, AbsoluteX);

    t[0x40] = op(Rti, Implied);
    t[0x41] = op(Eor, IndirectX);
    t[0x45] = op(Eor, ZeroPage);
    t[0x46] = op(Lsr, ZeroPage);
    t[0x48] = op(Pha, Implied);
    t[0x49] = op(Eor, Immediate);
    t[0x4A] = op(Lsr, Implied);
    t[0x4C] = op(Jmp, Absolute);
    t[0x4D] = op(Eor, Absolute);
    t[0x4E] = op(Lsr, Absolute);

    t[0x50] = op(Bvc, Relative);
    t[0x51] = op(Eor, IndirectY);
    t[0x55] = op(Eor, ZeroPageX);
    t[0x56] = op(Lsr, ZeroPageX);
    t[0x58] = op(Cli, Implied);
    t[0x59] = op(Eor, AbsoluteY);
    t[0x5D] = op(Eor, AbsoluteX);
    t[0x5E] = op(Lsr, AbsoluteX);

    t[0x60] = op(Rts, Implied);
    t[0x61] = op(Adc, IndirectX);
    t[0x65] = op(Adc, ZeroPage);
    t[0x66] = op(Ror, ZeroPage);
    t[0x68] = op(Pla, Implied);
    t[0x69] = op(Adc, Immediate);
    t[0x6A] = op(Ror, Implied);
    t[0x6C] = op(Jmp, Indirect);
    t[0x6D] = op(Adc, Absolute);
    t[0x6E] = op(Ror, Absolute);

    t[0x70] = op(Bvs, Relative);
    t[0x71] = op(Adc, IndirectY);
    t[0x75] = op(Adc, ZeroPageX);
    t[0x76] = op(Ror, ZeroPageX);
    t[0x78] = op(Sei, Implied);
    t[0x79] = op(Adc, AbsoluteY);
    t[0x7D] = op(Adc, AbsoluteX);
    t[0x7E] = op(Ror, AbsoluteX);

    t[0x81] = op(Sta, IndirectX);
    t[0x84] = op(Sty, ZeroPage);
    t[0x85] = op(Sta, ZeroPage);
    t[0x86] = op(Stx, ZeroPage);
    t[0x88] = op(Dey, Implied);
    t[0x8A] = op(Txa, Implied);
    t[0x8C] = op(Sty, Absolute);
    t[0x8D] = op(Sta, Absolute);
    t[0x8E] = op(Stx, Absolute);

    t[0x90] = op(Bcc, Relative);
    t[0x91] = op(Sta, IndirectY);
    t[0x94] = op(Sty, ZeroPageX);
    t[0x95] = op(Sta, ZeroPageX);
    t[0x96] = op(Stx, ZeroPageY);
    t[0x98] = op(Tya, Implied);
    t[0x99] = op(Sta, AbsoluteY);
    t[0x9A] = op(Txs, Implied);
    t[0x9D] = op(Sta, AbsoluteX);

    t[0xA0] = op(Ldy, Immediate);
    t[0xA1] = op(Lda, IndirectX);
    t[0xA2] = op(Ldx, Immediate);
    t[0xA4] = op(Ldy, ZeroPage);
    t[0xA5] = op(Lda, ZeroPage);
    t[0xA6] = op(Ldx, ZeroPage);
    t[0xA8] = op(Tay, Implied);
    t[0xA9] = op(Lda, Immediate);
    t[0xAA] = op(Tax, Implied);
    t[0xAC] = op(Ldy, Absolute);
    t[0xAD] = op(Lda, Absolute);
    t[0xAE] = op(Ldx, Absolute);

    t[0xB0] = op(Bcs, Relative);
    t[0xB1] = op(Lda, IndirectY);
    t[0xB4] = op(Ldy, ZeroPageX);
    t[0xB5] = op(Lda, ZeroPageX);
    t[0xB6] = op(Ldx, ZeroPageY);
    t[0xB8] = op(Clv, Implied);
    t[0xB9] = op(Lda, AbsoluteY);
    t[0xBA] = op(Tsx, Implied);
    t[0xBC] = op(Ldy, AbsoluteX);
    t[0xBD] = op(Lda, AbsoluteX);
    t[0xBE] = op(Ldx, AbsoluteY);

    t[0xC0] = op(Cpy, Immediate);
    t[0xC1] = op(Cmp, IndirectX);
    t[0xC4] = op(Cpy, ZeroPage);
    t[0xC5] = op(Cmp, ZeroPage);
    t[0xC6] = op(Dec, ZeroPage);
    t[0xC8] = op(Iny, Implied);
    t[0xC9] = op(Cmp, Immediate);
    t[0xCA] = op(Dex, Implied);
    t[0xCC] = op(Cpy, Absolute);
    t[0xCD] = op(Cmp, Absolute);
    t[0xCE] = op(Dec, Absolute);

    t[0xD0] = op(Bne, Relative);
    t[0xD1] = op(Cmp, IndirectY);
    t[0xD5] = op(Cmp, ZeroPageX);
    t[0xD6] = op(Dec, ZeroPageX);
    t[0xD8] = op(Cld, Implied);
    t[0xD9] = op(Cmp, AbsoluteY);
    t[0xDD] = op(Cmp, AbsoluteX);
    t[0xDE] = op(Dec, AbsoluteX);

    t[0xE0] = op(Cpx, Immediate);
    t[0xE1] = op(Sbc, IndirectX);
    t[0xE4] = op(Cpx, ZeroPage);
    t[0xE5] = op(Sbc, ZeroPage);
    t[0xE6] = op(Inc, ZeroPage);
    t[0xE8] = op(Inx, Implied);
    t[0xE9] = op(Sbc, Immediate);
    t[0xEA] = op(Nop, Implied);
    t[0xEB] = op(Sbc, Implied);
    t[0xEC] = op(Cpx, Absolute);
    t[0xED] = op(Sbc, Absolute);
    t[0xEE] = op(Inc, Absolute);

    t[0xF0] = op(Beq, Relative);
    t[0xF1] = op(Sbc, IndirectY);
    t[0xF5] = op(Sbc, ZeroPageX);
    t[0xF6] = op(Inc, ZeroPageX);
    t[0xF8] = op(Sed, Implied);
    t[0xF9] = op(Sbc, AbsoluteY);
    t[0xFD] = op(Sbc, AbsoluteX);
    t[0xFE] = op(Inc, AbsoluteX);

    t
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defined_opcode_count_matches_official_set() {
        // 151 official opcodes plus the kept 0xEB alias.
        let defined = OPCODES
            .iter()
            .filter(|i| i.mnemonic != Mnemonic::Illegal)
            .count();
        assert_eq!(defined, 152);
    }

    #[test]
    fn spot_check_well_known_encodings() {
        assert_eq!(OPCODES[0xA9].mnemonic, Mnemonic::Lda);
        assert_eq!(OPCODES[0xA9].mode, Mode::Immediate);
        assert_eq!(OPCODES[0x8D].mnemonic, Mnemonic::Sta);
        assert_eq!(OPCODES[0x8D].mode, Mode::Absolute);
        assert_eq!(OPCODES[0x6C].mode, Mode::Indirect);
        assert_eq!(OPCODES[0x0A].mnemonic, Mnemonic::Asl);
        assert_eq!(OPCODES[0x0A].mode, Mode::Implied);
        assert_eq!(OPCODES[0xEA].mnemonic, Mnemonic::Nop);
        assert_eq!(OPCODES[0x02].mnemonic, Mnemonic::Illegal);
    }
}
