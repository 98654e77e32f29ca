//! Solana Ledger Source
//!
//! Implements [`LedgerSource`] against a Solana node:
//! - snapshot: `getProgramAccounts` on the token program, filtered to 82-byte accounts
//! - push: `programSubscribe` with the same filter, forwarded into an mpsc channel
//! - time: `getBlockTime`

use async_trait::async_trait;
use futures_util::StreamExt;
use solana_account_decoder::UiAccountEncoding;
use solana_client::{
    nonblocking::{pubsub_client::PubsubClient, rpc_client::RpcClient},
    rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig},
    rpc_filter::RpcFilterType,
    rpc_response::{Response, RpcKeyedAccount},
};
use solana_sdk::{account::Account, commitment_config::CommitmentConfig, pubkey::Pubkey};
use std::str::FromStr;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use super::layout::MINT_ACCOUNT_LEN;
use super::source::{AccountFeed, LedgerSource, SourceError};
use super::types::AccountRecord;
use crate::common::config::WatcherSettings;

/// SPL Token program ID
pub const TOKEN_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");

/// Buffered notifications between the pubsub socket and the listener
const FEED_BUFFER: usize = 1024;

/// JSON-RPC + pubsub backed ledger source
pub struct SolanaMintSource {
    rpc: RpcClient,
    ws_url: String,
    program_id: Pubkey,
    commitment: CommitmentConfig,
}

impl SolanaMintSource {
    /// Create a source with `confirmed` commitment
    pub fn new(rpc_url: &str, ws_url: &str, program_id: Pubkey) -> Self {
        let commitment = CommitmentConfig::confirmed();
        Self {
            rpc: RpcClient::new_with_commitment(rpc_url.to_string(), commitment),
            ws_url: ws_url.to_string(),
            program_id,
            commitment,
        }
    }

    pub fn from_settings(settings: &WatcherSettings) -> Self {
        Self::new(&settings.solana_rpc, &settings.solana_ws, settings.program_id)
    }

    pub fn program_id(&self) -> &Pubkey {
        &self.program_id
    }

    fn program_accounts_config(&self) -> RpcProgramAccountsConfig {
        RpcProgramAccountsConfig {
            filters: Some(vec![RpcFilterType::DataSize(MINT_ACCOUNT_LEN as u64)]),
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                commitment: Some(self.commitment),
                ..RpcAccountInfoConfig::default()
            },
            ..RpcProgramAccountsConfig::default()
        }
    }
}

#[async_trait]
impl LedgerSource for SolanaMintSource {
    async fn fetch_mint_accounts(&self) -> Result<Vec<AccountRecord>, SourceError> {
        let slot = self.rpc.get_slot().await.map_err(rpc_error)?;
        let accounts = self
            .rpc
            .get_program_accounts_with_config(&self.program_id, self.program_accounts_config())
            .await
            .map_err(rpc_error)?;

        debug!(slot, accounts = accounts.len(), "fetched mint snapshot");

        Ok(accounts
            .into_iter()
            .map(|(address, account)| AccountRecord::new(address, account.data, slot))
            .collect())
    }

    async fn subscribe_mint_accounts(&self) -> Result<AccountFeed, SourceError> {
        let client = PubsubClient::new(&self.ws_url)
            .await
            .map_err(|e| SourceError::Subscription(e.to_string()))?;

        let (tx, rx) = mpsc::channel(FEED_BUFFER);
        let (ready_tx, ready_rx) = oneshot::channel();
        let program_id = self.program_id;
        let config = self.program_accounts_config();

        tokio::spawn(async move {
            let (mut stream, unsubscribe) =
                match client.program_subscribe(&program_id, Some(config)).await {
                    Ok(subscription) => {
                        let _ = ready_tx.send(Ok(()));
                        subscription
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(SourceError::Subscription(e.to_string())));
                        return;
                    }
                };

            info!(%program_id, "program subscription open");

            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    item = stream.next() => match item {
                        Some(response) => {
                            if tx.send(keyed_account_to_record(response)).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    },
                }
            }

            drop(stream);
            unsubscribe().await;
            let _ = client.shutdown().await;
            info!(%program_id, "program subscription closed");
        });

        ready_rx
            .await
            .map_err(|_| SourceError::Subscription("subscription task exited".to_string()))??;

        Ok(rx)
    }

    async fn block_time(&self, slot: u64) -> Result<i64, SourceError> {
        self.rpc.get_block_time(slot).await.map_err(rpc_error)
    }
}

fn rpc_error(err: solana_client::client_error::ClientError) -> SourceError {
    SourceError::Rpc(err.to_string())
}

/// Convert a pubsub notification into an account record
fn keyed_account_to_record(
    response: Response<RpcKeyedAccount>,
) -> Result<AccountRecord, SourceError> {
    let address = Pubkey::from_str(&response.value.pubkey).map_err(|e| {
        SourceError::MalformedPayload(format!("bad pubkey {}: {}", response.value.pubkey, e))
    })?;

    let account: Account = response.value.account.decode().ok_or_else(|| {
        SourceError::MalformedPayload(format!("undecodable account data for {}", address))
    })?;

    Ok(AccountRecord::new(address, account.data, response.context.slot))
}
