//! Per-item mint submission.

use tracing::{debug, error};

use tonmint_ledger::types::{Coins, MessageOp, MintCommand, OutboundMessage, send_mode};
use tonmint_ledger::{Address, LedgerConnection, Wallet};

use crate::error::DeployError;

/// Builds and submits one mint transfer addressed to the collection.
///
/// Same contract as collection deployment: the submitted seqno is
/// returned immediately, a broadcast failure is logged rather than
/// swallowed, and the caller's confirmation wait decides what a
/// non-advancing seqno means. The query id is carried for external
/// correlation only; nothing here deduplicates on it.
pub async fn mint_item(
    wallet: &Wallet,
    ledger: &dyn LedgerConnection,
    collection: &Address,
    command: MintCommand,
    value: Coins,
) -> Result<u32, DeployError> {
    let index = command.item_index;
    let query_id = command.query_id;

    let seqno = ledger.account_seqno(wallet.address()).await?;

    let message = OutboundMessage {
        to: collection.clone(),
        value,
        send_mode: send_mode::DEFAULT_TRANSFER,
        op: MessageOp::MintItem(command),
    };
    let sealed = wallet.seal(seqno, &[message]).await?;

    if let Err(e) = ledger.send(&sealed).await {
        error!(item = index, seqno, error = %e, "mint broadcast failed");
    } else {
        debug!(item = index, query_id, seqno, "mint submitted");
    }

    Ok(seqno)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testutil::{MockLedger, MockSigner};
    use std::sync::Arc;

    fn command(index: u64, owner: &Address) -> MintCommand {
        MintCommand {
            query_id: 42,
            item_index: index,
            owner: owner.clone(),
            content: format!("{}.json", index + 1),
        }
    }

    #[tokio::test]
    async fn mint_addresses_the_collection() {
        let signer = Arc::new(MockSigner::new(Address::new(0, [1; 32])));
        let wallet = Wallet::new(signer.clone());
        let ledger = MockLedger::new(12);
        let collection = Address::new(0, [0xcc; 32]);

        let seqno = mint_item(
            &wallet,
            &ledger,
            &collection,
            command(5, wallet.address()),
            Coins::from_nano(50_000_000),
        )
        .await
        .unwrap();

        assert_eq!(seqno, 12);
        let sealed = signer.sealed();
        let (sealed_seqno, messages) = &sealed[0];
        assert_eq!(*sealed_seqno, 12);
        assert_eq!(messages[0].to, collection);
        match &messages[0].op {
            MessageOp::MintItem(cmd) => {
                assert_eq!(cmd.item_index, 5);
                assert_eq!(cmd.content, "6.json");
                assert_eq!(cmd.query_id, 42);
            }
            other => panic!("unexpected op: {other:?}"),
        }
    }

    #[tokio::test]
    async fn broadcast_failure_still_returns_seqno() {
        let signer = Arc::new(MockSigner::new(Address::new(0, [1; 32])));
        let wallet = Wallet::new(signer);
        let ledger = MockLedger::new(8).failing_sends();
        let collection = Address::new(0, [0xcc; 32]);

        let seqno = mint_item(
            &wallet,
            &ledger,
            &collection,
            command(0, wallet.address()),
            Coins::from_nano(1),
        )
        .await
        .unwrap();

        assert_eq!(seqno, 8, "seqno surfaces despite the failed broadcast");
        assert_eq!(ledger.current_seqno(), 8);
    }
}
