//! Multisig wallet contract surface.
//!
//! Only the functions and events the guardian needs are declared. The
//! contract itself is an external interface and is never modelled here.

use alloy::primitives::{Log, U256};
use alloy::sol;
use alloy::sol_types::SolEvent;

sol! {
    /// Two-member (guardian + client) multisig wallet with relayed submission.
    #[derive(Debug, PartialEq, Eq)]
    interface IKeyMultiSig {
        function getOwners() external view returns (address[] memory owners);
        function clients(address account) external view returns (bool isClient);
        function guardians(address account) external view returns (bool isGuardian);
        function nonces(address account) external view returns (uint256 nonce);

        function replaceClient(address client, address newClient) external;

        function prepareSubmitTransaction(
            address destination,
            uint256 value,
            bytes calldata data,
            uint256 nonce
        ) external view returns (bytes32 hash);

        function submitTransactionByRelay(
            address destination,
            uint256 value,
            bytes calldata data,
            bytes calldata signature,
            address executor
        ) external returns (uint256 transactionId);

        /// Emitted once per accepted relay submission.
        event Submission(uint256 indexed transactionId);
    }
}

/// A wallet log decoded against the contract's event schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    /// Relay submission accepted and assigned an identifier.
    Submission { transaction_id: U256 },
    /// Any log the wallet schema does not describe.
    Unrecognized,
}

impl WalletEvent {
    /// Decode a raw log. Logs with a foreign signature, or a matching
    /// signature but malformed payload, decode as `Unrecognized`.
    pub fn decode(log: &Log) -> Self {
        match log.topics().first() {
            Some(topic) if *topic == IKeyMultiSig::Submission::SIGNATURE_HASH => {
                match IKeyMultiSig::Submission::decode_log_data(&log.data) {
                    Ok(event) => WalletEvent::Submission {
                        transaction_id: event.transactionId,
                    },
                    Err(e) => {
                        tracing::warn!(error = %e, "Malformed Submission log");
                        WalletEvent::Unrecognized
                    }
                }
            }
            _ => WalletEvent::Unrecognized,
        }
    }
}
