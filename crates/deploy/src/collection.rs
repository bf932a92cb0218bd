//! Collection deployment.

use tracing::{error, info};

use tonmint_ledger::types::{CollectionState, Coins, MessageOp, OutboundMessage, send_mode};
use tonmint_ledger::{LedgerConnection, Wallet};

use crate::error::DeployError;
use crate::types::PendingDeploy;

/// Builds and submits the collection-creation transfer.
///
/// Returns as soon as the transfer is handed to the ledger; waiting
/// for inclusion is the caller's job via the confirmation tracker. A
/// broadcast failure is logged and the submitted seqno still returned:
/// the confirmation wait will observe non-advancement and surface a
/// timeout, so a failed submission is never mistaken for success.
pub async fn deploy_collection(
    wallet: &Wallet,
    ledger: &dyn LedgerConnection,
    state: &CollectionState,
    value: Coins,
) -> Result<PendingDeploy, DeployError> {
    state.validate()?;

    let address = wallet.collection_address(state).await?;
    let seqno = ledger.account_seqno(wallet.address()).await?;

    let message = OutboundMessage {
        to: address.clone(),
        value,
        send_mode: send_mode::DEFAULT_TRANSFER,
        op: MessageOp::DeployCollection(state.clone()),
    };
    let sealed = wallet.seal(seqno, &[message]).await?;

    if let Err(e) = ledger.send(&sealed).await {
        error!(collection = %address, seqno, error = %e, "collection deploy broadcast failed");
    } else {
        info!(collection = %address, seqno, "collection deploy submitted");
    }

    Ok(PendingDeploy {
        address,
        submitted_seqno: seqno,
    })
}
