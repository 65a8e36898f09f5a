use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};

use crate::error::{FlashError, FlashResult};
use crate::ledger::Address;
use crate::units::Amount;

const FLASH_SWAP_TAG: u8 = 1;
const FLASH_SWAP_LEN: usize = 36; // 20 + 16

/// Instructions carried in the flash loan callback data
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BorrowerInstruction {
    /// Flash Swap
    ///
    /// While the loan is live, draw `extraction` tokens from the liquidity
    /// source at `faucet` into the borrower account.
    ///
    /// Layout after the tag byte `1`:
    ///
    /// 0. `[20]` Liquidity source address
    /// 1. `[16]` Extraction amount, little endian
    FlashSwap {
        /// Liquidity source to draw from
        faucet: Address,
        /// Amount to draw
        extraction: Amount,
    },
}

impl BorrowerInstruction {
    /// Unpacks callback data into a BorrowerInstruction
    pub fn unpack(input: &[u8]) -> FlashResult<Self> {
        let (&tag, rest) = input
            .split_first()
            .ok_or_else(|| FlashError::InvalidCallbackData("empty callback data".to_string()))?;

        Ok(match tag {
            FLASH_SWAP_TAG => {
                if rest.len() != FLASH_SWAP_LEN {
                    return Err(FlashError::InvalidCallbackData(format!(
                        "flash swap data is {} bytes, expected {}",
                        rest.len(),
                        FLASH_SWAP_LEN
                    )));
                }
                let input = array_ref![rest, 0, FLASH_SWAP_LEN];
                let (faucet, extraction) = array_refs![input, 20, 16];
                Self::FlashSwap {
                    faucet: Address::new(*faucet),
                    extraction: Amount::from_le_bytes(*extraction),
                }
            }
            other => {
                return Err(FlashError::InvalidCallbackData(format!(
                    "unknown instruction tag {}",
                    other
                )))
            }
        })
    }

    /// Packs a BorrowerInstruction into a byte buffer
    pub fn pack(&self) -> Vec<u8> {
        match self {
            Self::FlashSwap { faucet, extraction } => {
                let mut buf = vec![0u8; 1 + FLASH_SWAP_LEN];
                buf[0] = FLASH_SWAP_TAG;
                let output = array_mut_ref![buf, 1, FLASH_SWAP_LEN];
                let (faucet_dst, extraction_dst) = mut_array_refs![output, 20, 16];
                faucet_dst.copy_from_slice(faucet.as_ref());
                *extraction_dst = extraction.to_le_bytes();
                buf
            }
        }
    }
}
