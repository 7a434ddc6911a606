//! Transaction id extraction from relay receipts.

use alloy::primitives::Address;

use crate::blockchain::contract::WalletEvent;
use crate::blockchain::types::RelayReceipt;
use crate::recovery::types::{RecoveryError, RecoveryResult};

/// Recover the wallet-assigned transaction id from a mined relay receipt.
///
/// Only logs emitted by `wallet` are considered. The first `Submission`
/// among them wins; later matches are ignored. A receipt without one is
/// `Unconfirmed`.
pub fn extract_transaction_id(receipt: &RelayReceipt, wallet: Address) -> RecoveryResult<String> {
    let found = receipt
        .logs
        .iter()
        .filter(|log| log.address == wallet)
        .map(WalletEvent::decode)
        .find_map(|event| match event {
            WalletEvent::Submission { transaction_id } => Some(transaction_id),
            WalletEvent::Unrecognized => None,
        });

    match found {
        Some(id) => Ok(id.to_string()),
        None => {
            tracing::error!(
                tx_hash = %receipt.tx_hash,
                %wallet,
                block_number = ?receipt.block_number,
                logs = receipt.logs.len(),
                "Relay receipt carries no Submission event"
            );
            Err(RecoveryError::Unconfirmed {
                tx_hash: receipt.tx_hash,
            })
        }
    }
}
