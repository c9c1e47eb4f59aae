/*!
CPU register file, flag manipulation, stack and fetch helpers, and the
reset/NMI entry sequences.
*/

use crate::bus::Bus;

// Status flag bits.
pub const CARRY: u8 = 0b0000_0001;
pub const ZERO: u8 = 0b0000_0010;
pub const IRQ_DISABLE: u8 = 0b0000_0100;
pub const DECIMAL: u8 = 0b0000_1000;
pub const BREAK: u8 = 0b0001_0000;
pub const UNUSED: u8 = 0b0010_0000;
pub const OVERFLOW: u8 = 0b0100_0000;
pub const NEGATIVE: u8 = 0b1000_0000;

/// Stack page base; SP is an 8-bit offset into it.
pub const STACK_BASE: u16 = 0x0100;

/// NMI, reset and IRQ/BRK vector addresses.
pub const NMI_VECTOR: u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;

#[derive(Clone, Debug)]
pub struct Cpu {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub pc: u16,
    pub status: u8,
}

impl Default for Cpu {
    fn default() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFD,
            pc: 0,
            status: IRQ_DISABLE | UNUSED,
        }
    }
}

impl Cpu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Power-on/reset: registers to their defaults, PC from the reset
    /// vector.
    pub fn reset(&mut self, bus: &mut Bus) {
        *self = Self::default();
        self.pc = bus.read_word(RESET_VECTOR);
    }

    /// Non-maskable interrupt entry: push the return address and status
    /// (with B clear, I and U set), then jump through the NMI vector.
    pub fn nmi(&mut self, bus: &mut Bus) {
        let pc = self.pc;
        self.push_u16(bus, pc);
        self.status = (self.status | IRQ_DISABLE | UNUSED) & !BREAK;
        let status = self.status;
        self.push_u8(bus, status);
        self.pc = bus.read_word(NMI_VECTOR);
    }

    // -----------------------------
    // Flags
    // -----------------------------

    #[inline]
    pub fn is_flag_set(&self, mask: u8) -> bool {
        self.status & mask != 0
    }

    #[inline]
    pub fn assign_flag(&mut self, mask: u8, value: bool) {
        if value {
            self.status |= mask;
        } else {
            self.status &= !mask;
        }
    }

    /// Set Z and N from an 8-bit result.
    #[inline]
    pub fn update_zn(&mut self, value: u8) {
        self.assign_flag(ZERO, value == 0);
        self.assign_flag(NEGATIVE, value & 0x80 != 0);
    }

    // -----------------------------
    // Instruction stream
    // -----------------------------

    #[inline]
    pub fn fetch_u8(&mut self, bus: &mut Bus) -> u8 {
        let value = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        value
    }

    #[inline]
    pub fn fetch_u16(&mut self, bus: &mut Bus) -> u16 {
        let lo = self.fetch_u8(bus) as u16;
        let hi = self.fetch_u8(bus) as u16;
        (hi << 8) | lo
    }

    // -----------------------------
    // Stack
    // -----------------------------

    #[inline]
    pub fn push_u8(&mut self, bus: &mut Bus, value: u8) {
        bus.write(STACK_BASE + self.sp as u16, value);
        self.sp = self.sp.wrapping_sub(1);
    }

    #[inline]
    pub fn pop_u8(&mut self, bus: &mut Bus) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        bus.read(STACK_BASE + self.sp as u16)
    }

    /// Push high byte first so the word pops back little-endian.
    #[inline]
    pub fn push_u16(&mut self, bus: &mut Bus, value: u16) {
        self.push_u8(bus, (value >> 8) as u8);
        self.push_u8(bus, (value & 0xFF) as u8);
    }

    #[inline]
    pub fn pop_u16(&mut self, bus: &mut Bus) -> u16 {
        let lo = self.pop_u8(bus) as u16;
        let hi = self.pop_u8(bus) as u16;
        (hi << 8) | lo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Bus;

    #[test]
    fn power_on_defaults() {
        let cpu = Cpu::new();
        assert_eq!(cpu.a, 0);
        assert_eq!(cpu.x, 0);
        assert_eq!(cpu.y, 0);
        assert_eq!(cpu.sp, 0xFD);
        assert_eq!(cpu.status, IRQ_DISABLE | UNUSED);
    }

    #[test]
    fn zn_law_exhaustive() {
        let mut cpu = Cpu::new();
        for v in 0..=255u8 {
            cpu.update_zn(v);
            assert_eq!(cpu.is_flag_set(ZERO), v == 0, "Z for {v:#04x}");
            assert_eq!(cpu.is_flag_set(NEGATIVE), v & 0x80 != 0, "N for {v:#04x}");
        }
    }

    #[test]
    fn stack_roundtrip_with_wrap() {
        let mut cpu = Cpu::new();
        let mut bus = Bus::new();

        cpu.sp = 0x01;
        cpu.push_u16(&mut bus, 0x1234); // wraps through 0x00
        assert_eq!(cpu.sp, 0xFF);
        assert_eq!(cpu.pop_u16(&mut bus), 0x1234);
        assert_eq!(cpu.sp, 0x01);
    }

    #[test]
    fn push_order_is_high_then_low() {
        let mut cpu = Cpu::new();
        let mut bus = Bus::new();

        cpu.sp = 0xFD;
        cpu.push_u16(&mut bus, 0xBEEF);
        assert_eq!(bus.read(0x01FD), 0xBE);
        assert_eq!(bus.read(0x01FC), 0xEF);
    }

    #[test]
    fn nmi_pushes_state_and_jumps_through_vector() {
        let mut cpu = Cpu::new();
        let mut bus = Bus::new();

        // No cartridge: the vector reads 0. The pushes are the interesting
        // part here.
        cpu.pc = 0xC123;
        cpu.status = UNUSED | CARRY | BREAK;
        cpu.nmi(&mut bus);

        assert_eq!(bus.read(0x01FD), 0xC1);
        assert_eq!(bus.read(0x01FC), 0x23);
        let pushed = bus.read(0x01FB);
        assert_eq!(pushed & BREAK, 0);
        assert_ne!(pushed & IRQ_DISABLE, 0);
        assert_ne!(pushed & UNUSED, 0);
        assert_ne!(pushed & CARRY, 0);
        assert!(cpu.is_flag_set(IRQ_DISABLE));
    }
}
