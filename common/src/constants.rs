// Bank granularity of the board-local address space.
pub const BANK_SHIFT: u32 = 16;
pub const BANK_SIZE: u32 = 1 << BANK_SHIFT; // 64KB
pub const BANK_COUNT: usize = 1 << 16;

// Board-local address map.
pub const DRAM_BASE: u32 = 0x0800_0000;
pub const DRAM_BANK_SPAN: u32 = 0x0100_0000; // decode window per DIMM bank
pub const DRAM_BANKS: usize = 4;

pub const VRAM_BASE: u32 = 0x0E00_0000;
pub const VRAM_LEN: u32 = 0x0040_0000; // 4MB
pub const VRAM_MASK: u32 = VRAM_LEN - 1;

pub const DMEM_BASE: u32 = 0xFF00_0000;
pub const DMEM_SCRATCH_LEN: u32 = 0x200; // on-chip scratch, below the datapath registers

pub const RAMDAC_BASE: u32 = 0xFF20_0000;
pub const MC_BASE: u32 = 0xFF80_0000;

// The byte-wide EEPROM sits behind a divide-by-four address remap, so its
// 128KB occupy a 512KB decode window at the top of the space.
pub const ROM_BASE: u32 = 0xFFF8_0000;
pub const ROM_LEN: u32 = 0x0002_0000;

// Architecturally fixed; reset and all traps enter here.
pub const TRAP_VECTOR: u32 = 0xFFFF_FF00;
pub const RESET_VECTOR: u32 = TRAP_VECTOR;

// Host-visible views of one board. Board space strips the slot nibble and
// reaches internal memory only; slot space is folded under 0xFF00_0000 where
// the device windows and the boot ROM live.
pub const BOARD_LOCAL_MASK: u32 = 0x0FFF_FFFF;
pub const SLOT_LOCAL_MASK: u32 = 0x00FF_FFFF;
pub const SLOT_FOLD_BASE: u32 = 0xFF00_0000;

// Slot-space offsets at or above this hit the bus interface chip, not memory.
pub const NBIC_THRESHOLD: u32 = 0x00FF_FFD0;

// Auxiliary core reference clock.
pub const ND_CLOCK_HZ: u64 = 33_000_000;
pub const ND_CLOCK_MHZ: u64 = 33;

// Blanking toggle rates (each timer firing is one toggle, so the visible
// blank/unblank cycle runs at half these rates).
pub const DISPLAY_TOGGLE_HZ: u64 = 136;
pub const VIDEO_TOGGLE_HZ: u64 = 120;
