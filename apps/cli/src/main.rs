//! tonmint CLI - deploy and mint NFT collections on TON.

mod config;
mod events;

use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing::info;

use config::AppConfig;
use tonmint_assets::Materializer;
use tonmint_deploy::{MintPipeline, MintRange, TimeoutPolicy};
use tonmint_ledger::{Address, SignerClient, TonCenterClient, Wallet};
use tonmint_publish::{ContentId, PinataPublisher};

#[derive(Parser)]
#[command(name = "tonmint")]
#[command(about = "Deploy and mint NFT collections on TON")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: prepare assets, publish to IPFS, deploy
    /// the collection
    Deploy {
        /// Number of items to generate
        #[arg(long, default_value_t = 100)]
        count: u32,

        /// Also mint items 0..count once the collection confirms
        #[arg(long)]
        mint: bool,

        /// Collection royalty percent (0-100)
        #[arg(long, default_value_t = 0)]
        royalty: u8,
    },

    /// Mint a sub-range of already-published items against an existing
    /// collection
    MintRange {
        /// Address of the deployed collection
        #[arg(long)]
        collection: String,

        /// CID of the published metadata folder
        #[arg(long)]
        content_id: String,

        /// Zero-based start of the range
        from: usize,

        /// Zero-based exclusive end of the range
        to: usize,

        /// Abandon items whose confirmation times out instead of
        /// aborting the range
        #[arg(long)]
        skip_timed_out: bool,

        /// Proceed even if the on-chain next-item-index disagrees with
        /// the range start
        #[arg(long)]
        allow_desync: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        tracing::error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    match cli.command {
        Commands::Deploy {
            count,
            mint,
            royalty,
        } => {
            let mut pipeline = build_pipeline(&config, TimeoutPolicy::Abort)
                .await?
                .with_royalty_percent(royalty);
            if let Some(rx) = pipeline.take_events() {
                tokio::spawn(events::render(rx));
            }

            let outcome = pipeline.run_full(count, mint).await?;
            info!(
                collection = %outcome.collection,
                metadata_cid = %outcome.metadata_cid,
                minted = outcome.minted,
                "deployment complete"
            );
        }
        Commands::MintRange {
            collection,
            content_id,
            from,
            to,
            skip_timed_out,
            allow_desync,
        } => {
            let collection: Address = collection
                .parse()
                .context("invalid collection address")?;
            let policy = if skip_timed_out {
                TimeoutPolicy::Skip
            } else {
                TimeoutPolicy::Abort
            };

            let mut pipeline = build_pipeline(&config, policy).await?;
            if let Some(rx) = pipeline.take_events() {
                tokio::spawn(events::render(rx));
            }

            let minted = pipeline
                .mint_range(MintRange {
                    collection,
                    content_id: ContentId::new(content_id),
                    from,
                    to,
                    allow_desync,
                })
                .await?;
            info!(minted, "mint range complete");
        }
    }

    Ok(())
}

/// Wires the pipeline against the production boundaries: the signer
/// daemon, toncenter, and Pinata.
async fn build_pipeline(
    config: &AppConfig,
    timeout_policy: TimeoutPolicy,
) -> anyhow::Result<MintPipeline> {
    let signer = SignerClient::connect(&config.signer_url, &config.secret_phrase, config.network)
        .await
        .context("failed to open wallet")?;
    let wallet = Wallet::new(Arc::new(signer));

    let ledger = Arc::new(TonCenterClient::new(
        config.network,
        config.toncenter_api_key.clone(),
    ));
    let publisher = Arc::new(PinataPublisher::new(
        &config.pinata_api_key,
        &config.pinata_api_secret,
    ));
    let materializer = Materializer::new(
        &config.layout.images_dir,
        &config.layout.metadata_dir,
        &config.layout.image_template,
        &config.layout.metadata_template,
        &config.layout.collection_template,
    );

    Ok(MintPipeline::new(materializer, publisher, ledger, wallet)
        .with_confirm_policy(config.confirm)
        .with_timeout_policy(timeout_policy))
}
