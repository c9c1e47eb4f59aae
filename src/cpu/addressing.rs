/*!
Operand address resolution for the memory addressing modes.

Hardware quirks honored here:
- zero-page indexed pointers wrap within page zero,
- the indirect (JMP) pointer high byte is fetched without carrying into the
  page, reproducing the 6502 page-boundary bug,
- indirect-indexed addition wraps in 16 bits.
*/

use crate::bus::Bus;
use crate::cpu::state::Cpu;

/// Little-endian word from two consecutive zero-page slots; the second
/// byte wraps within page zero.
#[inline]
pub fn read_word_zp(bus: &mut Bus, zp: u8) -> u16 {
    let lo = bus.read(zp as u16) as u16;
    let hi = bus.read(zp.wrapping_add(1) as u16) as u16;
    (hi << 8) | lo
}

/// Little-endian word where the second byte comes from the same page as
/// the first (JMP indirect page-wrap bug).
#[inline]
pub fn read_word_indirect_bug(bus: &mut Bus, addr: u16) -> u16 {
    let lo = bus.read(addr) as u16;
    let hi_addr = (addr & 0xFF00) | (addr.wrapping_add(1) & 0x00FF);
    let hi = bus.read(hi_addr) as u16;
    (hi << 8) | lo
}

#[inline]
pub fn addr_zp(cpu: &mut Cpu, bus: &mut Bus) -> u16 {
    cpu.fetch_u8(bus) as u16
}

#[inline]
pub fn addr_zp_x(cpu: &mut Cpu, bus: &mut Bus) -> u16 {
    let base = cpu.fetch_u8(bus);
    base.wrapping_add(cpu.x) as u16
}

#[inline]
pub fn addr_zp_y(cpu: &mut Cpu, bus: &mut Bus) -> u16 {
    let base = cpu.fetch_u8(bus);
    base.wrapping_add(cpu.y) as u16
}

#[inline]
pub fn addr_abs(cpu: &mut Cpu, bus: &mut Bus) -> u16 {
    cpu.fetch_u16(bus)
}

#[inline]
pub fn addr_abs_x(cpu: &mut Cpu, bus: &mut Bus) -> u16 {
    let base = cpu.fetch_u16(bus);
    base.wrapping_add(cpu.x as u16)
}

#[inline]
pub fn addr_abs_y(cpu: &mut Cpu, bus: &mut Bus) -> u16 {
    let base = cpu.fetch_u16(bus);
    base.wrapping_add(cpu.y as u16)
}

/// JMP ($xxxx): resolve through the buggy same-page word read.
#[inline]
pub fn addr_indirect(cpu: &mut Cpu, bus: &mut Bus) -> u16 {
    let ptr = cpu.fetch_u16(bus);
    read_word_indirect_bug(bus, ptr)
}

/// ($zp,X): the X offset is applied to the zero-page pointer location.
#[inline]
pub fn addr_indirect_x(cpu: &mut Cpu, bus: &mut Bus) -> u16 {
    let base = cpu.fetch_u8(bus);
    read_word_zp(bus, base.wrapping_add(cpu.x))
}

/// ($zp),Y: the Y offset is applied to the pointed-to address.
#[inline]
pub fn addr_indirect_y(cpu: &mut Cpu, bus: &mut Bus) -> u16 {
    let base = cpu.fetch_u8(bus);
    read_word_zp(bus, base).wrapping_add(cpu.y as u16)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Bus;
    use crate::cpu::state::Cpu;

    fn cpu_at(pc: u16) -> Cpu {
        let mut cpu = Cpu::new();
        cpu.pc = pc;
        cpu
    }

    #[test]
    fn zero_page_pointer_wraps() {
        let mut bus = Bus::new();
        bus.write(0x00FF, 0x34);
        bus.write(0x0000, 0x12);
        assert_eq!(read_word_zp(&mut bus, 0xFF), 0x1234);
    }

    #[test]
    fn indirect_read_does_not_cross_page() {
        let mut bus = Bus::new();
        bus.write(0x10FF, 0x34);
        bus.write(0x1000, 0x12); // fetched instead of $1100
        bus.write(0x1100, 0x99);
        assert_eq!(read_word_indirect_bug(&mut bus, 0x10FF), 0x1234);
    }

    #[test]
    fn indexed_zero_page_stays_in_page_zero() {
        let mut bus = Bus::new();
        let mut cpu = cpu_at(0x0200);
        bus.write(0x0200, 0xF0);
        cpu.x = 0x20; // 0xF0 + 0x20 wraps to 0x10
        assert_eq!(addr_zp_x(&mut cpu, &mut bus), 0x0010);
    }

    #[test]
    fn indexed_indirect_offsets_the_pointer() {
        let mut bus = Bus::new();
        let mut cpu = cpu_at(0x0200);
        bus.write(0x0200, 0x40);
        cpu.x = 0x04;
        bus.write(0x0044, 0x78);
        bus.write(0x0045, 0x56);
        assert_eq!(addr_indirect_x(&mut cpu, &mut bus), 0x5678);
    }

    #[test]
    fn indirect_indexed_offsets_the_target() {
        let mut bus = Bus::new();
        let mut cpu = cpu_at(0x0200);
        bus.write(0x0200, 0x40);
        bus.write(0x0040, 0x00);
        bus.write(0x0041, 0x02);
        cpu.y = 0x10;
        assert_eq!(addr_indirect_y(&mut cpu, &mut bus), 0x0210);
    }

    #[test]
    fn absolute_indexed_wraps_in_16_bits() {
        let mut bus = Bus::new();
        let mut cpu = cpu_at(0x0200);
        bus.write(0x0200, 0xFF);
        bus.write(0x0201, 0xFF);
        cpu.y = 0x02;
        assert_eq!(addr_abs_y(&mut cpu, &mut bus), 0x0001);
    }
}
