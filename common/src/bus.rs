/// Access surface of a bank-dispatched address space.
///
/// Every operation is total: unmapped or illegal addresses log and read back
/// as zero instead of faulting, matching the tolerant bus the guest firmware
/// expects when it probes address ranges speculatively. Receivers are shared
/// (`&self`) because two bus masters reach the same space; implementations
/// use interior mutability and document their aliasing rules.
pub trait Bus {
    fn read_u8(&self, addr: u32) -> u8;
    fn read_u16(&self, addr: u32) -> u16;
    fn read_u32(&self, addr: u32) -> u32;

    fn write_u8(&self, addr: u32, val: u8);
    fn write_u16(&self, addr: u32, val: u16);
    fn write_u32(&self, addr: u32, val: u32);

    /// Control-space byte fetch. Boot ROM reads bypass the divide-by-four
    /// address remap here; everywhere else this is an ordinary byte load.
    fn read_cs8(&self, addr: u32) -> u8 {
        self.read_u8(addr)
    }
}
