//! Data types for the deploy flow.

use std::fmt;

use tonmint_ledger::Address;
use tonmint_publish::ContentId;

/// A submitted-but-unconfirmed collection deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDeploy {
    pub address: Address,
    pub submitted_seqno: u32,
}

/// What to do when an item's confirmation times out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeoutPolicy {
    /// Abort the remaining mint range.
    #[default]
    Abort,
    /// Abandon the unconfirmed item and continue; the local index still
    /// advances so later items keep their intended indices.
    Skip,
}

/// Parameters for a resume-mode partial mint.
#[derive(Debug, Clone)]
pub struct MintRange {
    /// Address of the already-deployed collection.
    pub collection: Address,
    /// CID of the previously published metadata folder.
    pub content_id: ContentId,
    /// Zero-based start of the slice over the numbered listing.
    pub from: usize,
    /// Zero-based exclusive end of the slice.
    pub to: usize,
    /// Proceed even when the on-chain next-item-index disagrees with
    /// `from`.
    pub allow_desync: bool,
}

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Prepare,
    PublishImages,
    RewriteMetadata,
    PublishMetadata,
    DeployCollection,
    Mint,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Prepare => "prepare",
            Stage::PublishImages => "publish-images",
            Stage::RewriteMetadata => "rewrite-metadata",
            Stage::PublishMetadata => "publish-metadata",
            Stage::DeployCollection => "deploy-collection",
            Stage::Mint => "mint",
        };
        f.write_str(name)
    }
}

/// Progress event emitted during a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// A stage started.
    Stage { stage: Stage },
    /// The collection deployment was submitted.
    CollectionDeployed { address: Address, seqno: u32 },
    /// The collection deployment confirmed.
    CollectionConfirmed { polls: u32 },
    /// A mint was submitted under the given seqno.
    ItemSubmitted { index: u64, seqno: u32 },
    /// A mint confirmed.
    ItemConfirmed { index: u64, polls: u32 },
    /// A mint did not confirm within the attempt ceiling.
    ItemTimedOut { index: u64, attempts: u32 },
    /// The run finished.
    Completed { minted: u64 },
}

/// Result of a full pipeline run.
#[derive(Debug, Clone)]
pub struct DeployOutcome {
    pub collection: Address,
    pub metadata_cid: ContentId,
    pub minted: u64,
}
