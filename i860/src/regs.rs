use derive_more::IsVariant;
use num_derive::{FromPrimitive, ToPrimitive};

/// Processor status register.
#[derive(Default, Debug, Clone, Copy)]
pub struct Psr(u32);

impl Psr {
    pub const BR: u32 = 1 << 0;
    pub const BW: u32 = 1 << 1;
    pub const CC: u32 = 1 << 2;
    pub const LCC: u32 = 1 << 3;
    pub const IM: u32 = 1 << 4;
    pub const PIM: u32 = 1 << 5;
    pub const U: u32 = 1 << 6;
    pub const PU: u32 = 1 << 7;
    pub const IT: u32 = 1 << 8;
    pub const IN: u32 = 1 << 9;
    pub const IAT: u32 = 1 << 10;
    pub const DAT: u32 = 1 << 11;
    pub const FT: u32 = 1 << 12;
    pub const DS: u32 = 1 << 13;
    pub const DIM: u32 = 1 << 14;
    pub const KNF: u32 = 1 << 15;

    const SC_SHIFT: u32 = 17;
    const SC_MASK: u32 = 0x1F;

    pub const TRAP_CAUSES: u32 = Self::IT | Self::IN | Self::IAT | Self::DAT | Self::FT;

    pub fn from_raw(raw: u32) -> Self {
        Psr(raw)
    }

    pub fn to_raw(self) -> u32 {
        self.0
    }

    pub fn get(self, bit: u32) -> bool {
        (self.0 & bit) != 0
    }

    pub fn set(&mut self, bit: u32, val: bool) {
        self.0 &= !bit;
        if val {
            self.0 |= bit;
        }
    }

    pub fn raise(&mut self, bits: u32) {
        self.0 |= bits;
    }

    pub fn clear(&mut self, bits: u32) {
        self.0 &= !bits;
    }

    pub fn get_sc(self) -> u32 {
        (self.0 >> Self::SC_SHIFT) & Self::SC_MASK
    }

    pub fn set_sc(&mut self, val: u32) {
        self.0 &= !(Self::SC_MASK << Self::SC_SHIFT);
        self.0 |= (val & Self::SC_MASK) << Self::SC_SHIFT;
    }
}

////////////////////////////////////////////////////////////////////////////////

/// Extended processor status register.
#[derive(Debug, Clone, Copy)]
pub struct Epsr(u32);

impl Epsr {
    const PROC_TYPE: u32 = 1; // XR
    const STEPPING: u32 = 5;

    pub const IL: u32 = 1 << 13;
    pub const WP: u32 = 1 << 14;
    pub const INT: u32 = 1 << 17;
    pub const PBM: u32 = 1 << 22;
    pub const BE: u32 = 1 << 23;
    pub const OF: u32 = 1 << 24;

    const FIXED_MASK: u32 = 0x1FFF; // type and stepping are hardwired

    pub fn new() -> Self {
        Epsr(Self::PROC_TYPE | (Self::STEPPING << 8))
    }

    pub fn to_raw(self) -> u32 {
        self.0
    }

    /// Stores `raw`, keeping the hardwired identification fields.
    pub fn write(&mut self, raw: u32) {
        self.0 = (raw & !Self::FIXED_MASK) | (self.0 & Self::FIXED_MASK);
    }

    pub fn get(self, bit: u32) -> bool {
        (self.0 & bit) != 0
    }

    pub fn set(&mut self, bit: u32, val: bool) {
        self.0 &= !bit;
        if val {
            self.0 |= bit;
        }
    }
}

impl Default for Epsr {
    fn default() -> Self {
        Self::new()
    }
}

////////////////////////////////////////////////////////////////////////////////

/// Directory base register: paging control and the boot fetch mode latch.
#[derive(Default, Debug, Clone, Copy)]
pub struct Dirbase(u32);

impl Dirbase {
    pub const ATE: u32 = 1 << 0;
    pub const ITI: u32 = 1 << 5;
    pub const LB: u32 = 1 << 6;
    pub const CS8: u32 = 1 << 7;

    const DTB_MASK: u32 = 0xFFFF_F000;

    pub fn at_reset() -> Self {
        // The core wakes up fetching byte-wide from the boot EEPROM.
        Dirbase(Self::CS8)
    }

    pub fn to_raw(self) -> u32 {
        // ITI is a command bit, it always reads back as zero.
        self.0 & !Self::ITI
    }

    /// Stores `raw`. CS8 can only be cleared, never set again; returns true
    /// when the write requested a TLB and instruction cache invalidation.
    pub fn write(&mut self, raw: u32) -> bool {
        let iti = (raw & Self::ITI) != 0;
        let cs8 = self.0 & raw & Self::CS8;
        self.0 = (raw & !(Self::ITI | Self::CS8)) | cs8;
        iti
    }

    pub fn ate(self) -> bool {
        (self.0 & Self::ATE) != 0
    }

    pub fn cs8(self) -> bool {
        (self.0 & Self::CS8) != 0
    }

    pub fn dtb(self) -> u32 {
        self.0 & Self::DTB_MASK
    }
}

////////////////////////////////////////////////////////////////////////////////

/// Floating-point status register.
#[derive(Default, Debug, Clone, Copy)]
pub struct Fsr(u32);

impl Fsr {
    pub const FZ: u32 = 1 << 0;
    pub const TI: u32 = 1 << 1;
    pub const FTE: u32 = 1 << 5;
    pub const SE: u32 = 1 << 8;

    pub fn from_raw(raw: u32) -> Self {
        Fsr(raw)
    }

    pub fn to_raw(self) -> u32 {
        self.0
    }

    pub fn get(self, bit: u32) -> bool {
        (self.0 & bit) != 0
    }

    pub fn set(&mut self, bit: u32, val: bool) {
        self.0 &= !bit;
        if val {
            self.0 |= bit;
        }
    }
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum CrIndex {
    Fir = 0,
    Psr = 1,
    Dirbase = 2,
    Db = 3,
    Fsr = 4,
    Epsr = 5,
}

/// Dual-instruction mode state, advanced once per 64-bit pair boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, IsVariant)]
pub enum Dim {
    #[default]
    Single,
    Temp,
    Full,
}

impl Dim {
    /// One step of the mode walk, driven by the dual-op bit of the
    /// instruction at the pair boundary.
    pub fn advance(self, dim_op: bool) -> Dim {
        match (self, dim_op) {
            (Dim::Single, true) => Dim::Temp,
            (Dim::Single, false) => Dim::Single,
            (Dim::Temp, true) => Dim::Full,
            (Dim::Temp, false) => Dim::Single,
            (Dim::Full, true) => Dim::Full,
            (Dim::Full, false) => Dim::Temp,
        }
    }

    pub fn dual(self) -> bool {
        !self.is_single()
    }
}

////////////////////////////////////////////////////////////////////////////////

/// Integer register file. Register 0 is hard-wired to zero.
#[derive(Debug)]
pub struct IRegs([u32; 32]);

impl IRegs {
    pub fn new() -> Self {
        IRegs([0; 32])
    }

    pub fn get(&self, i: u32) -> u32 {
        self.0[(i & 31) as usize]
    }

    pub fn set(&mut self, i: u32, val: u32) {
        let i = i & 31;
        if i != 0 {
            self.0[i as usize] = val;
        }
    }
}

impl Default for IRegs {
    fn default() -> Self {
        Self::new()
    }
}

/// Float register file, stored as 32 single-width words. Reads of f0/f1
/// return zero and writes to them are discarded; wider accesses pair and
/// quad up the underlying words, low word in the even register.
#[derive(Debug)]
pub struct FRegs([u32; 32]);

impl FRegs {
    pub fn new() -> Self {
        FRegs([0; 32])
    }

    pub fn get_s(&self, i: u32) -> u32 {
        self.0[(i & 31) as usize]
    }

    pub fn set_s(&mut self, i: u32, bits: u32) {
        let i = i & 31;
        if i >= 2 {
            self.0[i as usize] = bits;
        }
    }

    pub fn get_d(&self, i: u32) -> u64 {
        let i = (i & 30) as usize;
        (self.0[i] as u64) | ((self.0[i + 1] as u64) << 32)
    }

    pub fn set_d(&mut self, i: u32, bits: u64) {
        let i = i & 30;
        self.set_s(i, bits as u32);
        self.set_s(i + 1, (bits >> 32) as u32);
    }

    pub fn get_q(&self, i: u32) -> [u32; 4] {
        let i = (i & 28) as usize;
        [self.0[i], self.0[i + 1], self.0[i + 2], self.0[i + 3]]
    }

    pub fn set_q(&mut self, i: u32, words: [u32; 4]) {
        let i = i & 28;
        for (k, w) in words.iter().enumerate() {
            self.set_s(i + k as u32, *w);
        }
    }
}

impl Default for FRegs {
    fn default() -> Self {
        Self::new()
    }
}

////////////////////////////////////////////////////////////////////////////////

/// Execution counters, published to the board at drain time.
#[derive(Default, Debug, Clone, Copy)]
pub struct Stats {
    pub executed: u64,
    pub icache_hits: u64,
    pub icache_misses: u64,
    pub tlb_hits: u64,
    pub tlb_misses: u64,
    pub ints_taken: u64,
}
