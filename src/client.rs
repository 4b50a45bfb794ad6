use std::{fmt, future::Future};

use alloy::{
    network::EthereumWallet,
    primitives::{Address, TxHash, U256},
    providers::{Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    transports::http::{Client, Http},
};
use async_trait::async_trait;
use futures_util::{future::BoxFuture, FutureExt};

use crate::{
    bindings::{L2StandardBridge, T1Bridge},
    calls::{BridgeCall, TX_GAS_LIMIT},
    chain::Network,
    error::ChainError,
};

/// What the bot needs from a chain: balances and sending bridge calls.
#[async_trait]
pub trait ChainClient: Send + Sync + 'static {
    /// The wallet every call is signed by.
    fn address(&self) -> Address;

    async fn balance(&self, network: &Network) -> Result<U256, ChainError>;

    /// Signs and broadcasts `call` on `network`. Resolves once the tx is
    /// accepted by the node; the receipt is awaited via [`PendingBridge::confirm`].
    async fn submit(&self, network: &Network, call: &BridgeCall)
        -> Result<PendingBridge, ChainError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeReceipt {
    pub hash: TxHash,
    pub success: bool,
    pub gas_used: u128,
}

/// A broadcast transaction that has not been mined yet.
pub struct PendingBridge {
    pub hash: TxHash,
    confirmation: BoxFuture<'static, Result<BridgeReceipt, ChainError>>,
}

impl PendingBridge {
    pub fn new<F>(hash: TxHash, confirmation: F) -> Self
    where
        F: Future<Output = Result<BridgeReceipt, ChainError>> + Send + 'static,
    {
        Self {
            hash,
            confirmation: confirmation.boxed(),
        }
    }

    pub async fn confirm(self) -> Result<BridgeReceipt, ChainError> {
        self.confirmation.await
    }
}

impl fmt::Debug for PendingBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingBridge")
            .field("hash", &self.hash)
            .finish_non_exhaustive()
    }
}

/// [`ChainClient`] backed by alloy HTTP providers and a local key.
pub struct AlloyClient {
    signer: PrivateKeySigner,
    wallet: EthereumWallet,
}

impl AlloyClient {
    pub fn new(signer: PrivateKeySigner) -> Self {
        let wallet = EthereumWallet::from(signer.clone());
        Self { signer, wallet }
    }

    fn provider(&self, network: &Network) -> Result<impl Provider<Http<Client>>, ChainError> {
        let rpc_url = network
            .rpc_url
            .clone()
            .ok_or(ChainError::NoRpc(network.id))?;
        Ok(ProviderBuilder::new()
            .with_recommended_fillers()
            .wallet(self.wallet.clone())
            .on_http(rpc_url))
    }
}

#[async_trait]
impl ChainClient for AlloyClient {
    fn address(&self) -> Address {
        self.signer.address()
    }

    async fn balance(&self, network: &Network) -> Result<U256, ChainError> {
        let provider = self.provider(network)?;
        Ok(provider.get_balance(self.address()).await?)
    }

    async fn submit(
        &self,
        network: &Network,
        call: &BridgeCall,
    ) -> Result<PendingBridge, ChainError> {
        let provider = self.provider(network)?;
        let pending = match call {
            BridgeCall::SendMessage {
                contract,
                to,
                value,
                message,
                gas_limit,
                dest_chain_id,
                callback,
            } => {
                T1Bridge::new(*contract, &provider)
                    .sendMessage(
                        *to,
                        *value,
                        message.clone(),
                        *gas_limit,
                        *dest_chain_id,
                        *callback,
                    )
                    .value(*value)
                    .gas(TX_GAS_LIMIT)
                    .send()
                    .await?
            }
            BridgeCall::BridgeEth {
                contract,
                l1_gas,
                data,
                value,
            } => {
                L2StandardBridge::new(*contract, &provider)
                    .bridgeETH(*l1_gas, data.clone())
                    .value(*value)
                    .gas(TX_GAS_LIMIT)
                    .send()
                    .await?
            }
        };

        let hash = *pending.tx_hash();
        tracing::debug!(network = %network.id, %hash, "bridge tx broadcast");
        Ok(PendingBridge::new(hash, async move {
            let receipt = pending
                .get_receipt()
                .await
                .map_err(|err| ChainError::Confirmation(err.to_string()))?;
            Ok(BridgeReceipt {
                hash: receipt.transaction_hash,
                success: receipt.status(),
                gas_used: u128::from(receipt.gas_used),
            })
        }))
    }
}
