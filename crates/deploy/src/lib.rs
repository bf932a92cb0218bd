//! Collection deployment and minting flow.
//!
//! This crate implements the orchestration core: it sequences asset
//! preparation, publication, collection deployment, and per-item
//! minting against the single controlling wallet. The wallet has one
//! seqno, so there is never more than one outstanding transaction:
//! every submission is gated on the previous one confirming.
//!
//! # Pipeline
//!
//! 1. **Prepare**: expand templates into numbered variants
//! 2. **Publish images**: pin the image folder, learn its CID
//! 3. **Rewrite**: point metadata `image` fields at the image CID
//! 4. **Publish metadata**: pin the metadata folder
//! 5. **Deploy**: submit the collection contract, wait for its seqno
//! 6. **Mint**: one item at a time, each gated on confirmation
//!
//! Resume mode skips straight to step 6 over an already-deployed
//! collection and a previously published metadata CID.

pub mod collection;
pub mod confirm;
pub mod error;
pub mod item;
pub mod pipeline;
pub mod types;

pub use collection::deploy_collection;
pub use confirm::{ConfirmPolicy, Confirmation, ConfirmationTracker};
pub use error::DeployError;
pub use item::mint_item;
pub use pipeline::MintPipeline;
pub use types::{DeployOutcome, MintRange, PendingDeploy, PipelineEvent, Stage, TimeoutPolicy};
