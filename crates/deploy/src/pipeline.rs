//! End-to-end mint pipeline.
//!
//! Composes the materializer, the content publisher, the ledger, and
//! the wallet into the two supported flows: the full pipeline and the
//! resume-mode partial mint. Progress is emitted as [`PipelineEvent`]s
//! over an mpsc channel and mirrored as structured log lines keyed by
//! stage and item index, so a failed run can be resumed manually with
//! `mint_range`.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task;
use tracing::{debug, info, warn};
use uuid::Uuid;

use tonmint_assets::{
    Materializer, NumberedFile, numbered_entries, remove_sentinel, restore_sentinel,
    rewrite_image_references,
};
use tonmint_ledger::types::{CollectionState, Coins, MintCommand};
use tonmint_ledger::{Address, LedgerConnection, Wallet};
use tonmint_publish::{ContentId, ContentPublisher};

use crate::collection::deploy_collection;
use crate::confirm::{ConfirmPolicy, Confirmation, ConfirmationTracker};
use crate::error::DeployError;
use crate::item::mint_item;
use crate::types::{DeployOutcome, MintRange, PipelineEvent, Stage, TimeoutPolicy};

/// Default value attached to deploy and mint transfers: 0.05 TON.
pub const DEFAULT_TRANSFER_VALUE: Coins = Coins::from_nano(50_000_000);

/// Orchestrates the full deployment flow for one collection.
pub struct MintPipeline {
    materializer: Materializer,
    publisher: Arc<dyn ContentPublisher>,
    ledger: Arc<dyn LedgerConnection>,
    wallet: Wallet,
    tracker: ConfirmationTracker,
    timeout_policy: TimeoutPolicy,
    royalty_percent: u8,
    transfer_value: Coins,
    events_tx: mpsc::Sender<PipelineEvent>,
    events_rx: Option<mpsc::Receiver<PipelineEvent>>,
}

impl MintPipeline {
    pub fn new(
        materializer: Materializer,
        publisher: Arc<dyn ContentPublisher>,
        ledger: Arc<dyn LedgerConnection>,
        wallet: Wallet,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(256);
        Self {
            materializer,
            publisher,
            ledger,
            wallet,
            tracker: ConfirmationTracker::default(),
            timeout_policy: TimeoutPolicy::default(),
            royalty_percent: 0,
            transfer_value: DEFAULT_TRANSFER_VALUE,
            events_tx,
            events_rx: Some(events_rx),
        }
    }

    pub fn with_confirm_policy(mut self, policy: ConfirmPolicy) -> Self {
        self.tracker = ConfirmationTracker::new(policy);
        self
    }

    pub fn with_timeout_policy(mut self, policy: TimeoutPolicy) -> Self {
        self.timeout_policy = policy;
        self
    }

    pub fn with_royalty_percent(mut self, percent: u8) -> Self {
        self.royalty_percent = percent;
        self
    }

    pub fn with_transfer_value(mut self, value: Coins) -> Self {
        self.transfer_value = value;
        self
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<PipelineEvent>> {
        self.events_rx.take()
    }

    /// Runs the full pipeline: materialize, publish, deploy, and
    /// (optionally) mint the contiguous range `0..count`.
    pub async fn run_full(&self, count: u32, mint_after: bool) -> Result<DeployOutcome, DeployError> {
        self.start_stage(Stage::Prepare);
        let materializer = self.materializer.clone();
        task::spawn_blocking(move || materializer.materialize(count)).await??;

        self.start_stage(Stage::PublishImages);
        let images_cid = self.publish_folder_without_sentinel(true).await?;
        info!(cid = %images_cid, "images published");

        self.start_stage(Stage::RewriteMetadata);
        let materializer = self.materializer.clone();
        let cid = images_cid.clone();
        task::spawn_blocking(move || rewrite_image_references(materializer.metadata_dir(), &cid))
            .await??;

        self.start_stage(Stage::PublishMetadata);
        let metadata_cid = self.publish_folder_without_sentinel(false).await?;
        info!(cid = %metadata_cid, "metadata published");

        self.start_stage(Stage::DeployCollection);
        let state = CollectionState {
            owner: self.wallet.address().clone(),
            royalty_percent: self.royalty_percent,
            royalty_recipient: self.wallet.address().clone(),
            next_item_index: 0,
            collection_content_uri: metadata_cid.uri(tonmint_assets::COLLECTION_FILE),
            common_content_uri: metadata_cid.base_uri(),
        };
        let pending =
            deploy_collection(&self.wallet, self.ledger.as_ref(), &state, self.transfer_value)
                .await?;
        self.emit(PipelineEvent::CollectionDeployed {
            address: pending.address.clone(),
            seqno: pending.submitted_seqno,
        });

        match self
            .tracker
            .wait_for_confirmation(
                self.ledger.as_ref(),
                self.wallet.address(),
                pending.submitted_seqno,
            )
            .await
        {
            Confirmation::Confirmed { polls } => {
                info!(collection = %pending.address, polls, "collection deployed");
                self.emit(PipelineEvent::CollectionConfirmed { polls });
            }
            // Nothing later can succeed without the collection.
            Confirmation::TimedOut { attempts } => {
                return Err(DeployError::DeployUnconfirmed { attempts });
            }
        }

        let minted = if mint_after {
            self.start_stage(Stage::Mint);
            let dir = self.materializer.metadata_dir().to_path_buf();
            let entries = task::spawn_blocking(move || numbered_entries(&dir)).await??;
            self.mint_entries(&pending.address, &entries, 0).await?
        } else {
            0
        };

        self.emit(PipelineEvent::Completed { minted });
        Ok(DeployOutcome {
            collection: pending.address,
            metadata_cid,
            minted,
        })
    }

    /// Resume mode: mints `[from, to)` over the existing numbered
    /// metadata files against an already-deployed collection.
    pub async fn mint_range(&self, range: MintRange) -> Result<u64, DeployError> {
        // Validate the local counter against on-chain truth where
        // feasible; a stale range start would mint under wrong indices.
        match self.ledger.collection_next_index(&range.collection).await {
            Ok(on_chain) if on_chain != range.from as u64 => {
                if range.allow_desync {
                    warn!(
                        local = range.from,
                        on_chain, "range start disagrees with on-chain next item index"
                    );
                } else {
                    return Err(DeployError::IndexDesync {
                        local: range.from as u64,
                        on_chain,
                    });
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "cannot read on-chain next item index, skipping range validation");
            }
        }

        let dir = self.materializer.metadata_dir().to_path_buf();
        let entries = task::spawn_blocking(move || numbered_entries(&dir)).await??;

        if range.from >= range.to || range.to > entries.len() {
            return Err(DeployError::RangeOutOfBounds {
                from: range.from,
                to: range.to,
                available: entries.len(),
            });
        }

        info!(
            collection = %range.collection,
            from = range.from,
            to = range.to,
            cid = %range.content_id,
            "resuming mint range"
        );

        self.start_stage(Stage::Mint);
        let window = &entries[range.from..range.to];
        let minted = self
            .mint_entries(&range.collection, window, range.from as u64)
            .await?;

        self.emit(PipelineEvent::Completed { minted });
        Ok(minted)
    }

    /// Mints one entry at a time, each submission gated on the
    /// confirmation of the previous one. The controlling wallet has a
    /// single seqno and never more than one outstanding transfer.
    async fn mint_entries(
        &self,
        collection: &Address,
        entries: &[NumberedFile],
        start_index: u64,
    ) -> Result<u64, DeployError> {
        let mut minted = 0u64;
        let mut index = start_index;

        for file in entries {
            info!(item = index, file = %file.file_name, "minting item");

            let command = MintCommand {
                query_id: Uuid::new_v4().as_u64_pair().0,
                item_index: index,
                owner: self.wallet.address().clone(),
                content: file.file_name.clone(),
            };
            let seqno = mint_item(
                &self.wallet,
                self.ledger.as_ref(),
                collection,
                command,
                self.transfer_value,
            )
            .await?;
            self.emit(PipelineEvent::ItemSubmitted { index, seqno });

            let outcome = self
                .tracker
                .wait_for_confirmation(self.ledger.as_ref(), self.wallet.address(), seqno)
                .await;

            match outcome {
                Confirmation::Confirmed { polls } => {
                    minted += 1;
                    self.emit(PipelineEvent::ItemConfirmed { index, polls });

                    // The item only materializes on-chain after
                    // confirmation; resolve its address for the record.
                    if let Ok(addr) = self.ledger.item_address(collection, index).await {
                        debug!(item = index, address = %addr, "item materialized");
                    }
                }
                Confirmation::TimedOut { attempts } => {
                    self.emit(PipelineEvent::ItemTimedOut { index, attempts });
                    match self.timeout_policy {
                        TimeoutPolicy::Abort => {
                            return Err(DeployError::MintUnconfirmed { index, attempts });
                        }
                        TimeoutPolicy::Skip => {
                            warn!(item = index, attempts, "abandoning unconfirmed item");
                        }
                    }
                }
            }

            index += 1;
        }

        Ok(minted)
    }

    /// Publishes one of the generated folders with its sentinel
    /// removed, restoring the sentinel whether or not the upload
    /// succeeded.
    async fn publish_folder_without_sentinel(
        &self,
        images: bool,
    ) -> Result<ContentId, DeployError> {
        let dir = if images {
            self.materializer.images_dir()
        } else {
            self.materializer.metadata_dir()
        };

        let removed = remove_sentinel(dir)?;
        let result = self.publisher.publish(dir).await;
        if removed {
            restore_sentinel(dir)?;
        }
        Ok(result?)
    }

    fn start_stage(&self, stage: Stage) {
        info!(%stage, "stage started");
        self.emit(PipelineEvent::Stage { stage });
    }

    fn emit(&self, event: PipelineEvent) {
        // Dropping events when nobody drains them is fine; the log
        // lines above carry the same information.
        let _ = self.events_tx.try_send(event);
    }
}
