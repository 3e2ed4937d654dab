//! Board configuration, owned by the embedding host.

use std::path::PathBuf;

use thiserror::Error;

use common::constants::{DRAM_BANKS, ROM_LEN};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("rom image {path:?}: {source}")]
    RomRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("rom image {path:?} is {len} bytes, eeprom holds {limit}")]
    RomTooLarge {
        path: PathBuf,
        len: usize,
        limit: usize,
    },
    #[error("memory bank {bank} capacity {mb}MB is not one of 0/4/8/16")]
    BadBankSize { bank: usize, mb: u32 },
}

#[derive(Debug, Clone)]
pub struct NdConfig {
    /// Capacity of each memory bank in MB; 0 means the socket is empty.
    pub bank_mb: [u32; DRAM_BANKS],
    pub rom_path: Option<PathBuf>,
    /// Dedicated core thread, vs interleaving into the host CPU loop.
    pub threaded: bool,
    /// Host CPU clock, scales integrated-model cycle grants.
    pub host_mhz: u64,
    pub cs8_strap: bool,
    pub slot: u32,
}

impl Default for NdConfig {
    fn default() -> NdConfig {
        NdConfig {
            bank_mb: [4, 4, 4, 4],
            rom_path: None,
            threaded: true,
            host_mhz: 25,
            cs8_strap: true,
            slot: 2,
        }
    }
}

impl NdConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (bank, &mb) in self.bank_mb.iter().enumerate() {
            if !matches!(mb, 0 | 4 | 8 | 16) {
                return Err(ConfigError::BadBankSize { bank, mb });
            }
        }
        Ok(())
    }

    /// Reads the EEPROM image, padded to full size with erased-part ones.
    /// No configured path yields a blank part.
    pub fn load_rom(&self) -> Result<Vec<u8>, ConfigError> {
        let path = match &self.rom_path {
            Some(path) => path,
            None => return Ok(vec![0xFF; ROM_LEN as usize]),
        };
        let mut image = std::fs::read(path).map_err(|source| ConfigError::RomRead {
            path: path.clone(),
            source,
        })?;
        if image.len() > ROM_LEN as usize {
            return Err(ConfigError::RomTooLarge {
                path: path.clone(),
                len: image.len(),
                limit: ROM_LEN as usize,
            });
        }
        image.resize(ROM_LEN as usize, 0xFF);
        Ok(image)
    }
}
