//! Renders pipeline progress events for the terminal.

use tokio::sync::mpsc::Receiver;

use tonmint_deploy::PipelineEvent;

/// Consumes pipeline events until the channel closes.
pub async fn render(mut events: Receiver<PipelineEvent>) {
    while let Some(event) = events.recv().await {
        println!("{}", line(&event));
    }
}

fn line(event: &PipelineEvent) -> String {
    match event {
        PipelineEvent::Stage { stage } => format!("==> {stage}"),
        PipelineEvent::CollectionDeployed { address, seqno } => {
            format!("collection deploy submitted at seqno {seqno}: {address}")
        }
        PipelineEvent::CollectionConfirmed { polls } => {
            format!("collection confirmed after {polls} poll(s)")
        }
        PipelineEvent::ItemSubmitted { index, seqno } => {
            format!("item {index}: submitted at seqno {seqno}")
        }
        PipelineEvent::ItemConfirmed { index, polls } => {
            format!("item {index}: confirmed after {polls} poll(s)")
        }
        PipelineEvent::ItemTimedOut { index, attempts } => {
            format!("item {index}: UNCONFIRMED after {attempts} poll(s)")
        }
        PipelineEvent::Completed { minted } => format!("done, {minted} item(s) minted"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonmint_deploy::Stage;

    #[test]
    fn lines_carry_stage_and_item_context() {
        assert_eq!(
            line(&PipelineEvent::Stage {
                stage: Stage::PublishImages
            }),
            "==> publish-images"
        );
        assert_eq!(
            line(&PipelineEvent::ItemSubmitted { index: 24, seqno: 7 }),
            "item 24: submitted at seqno 7"
        );
        assert_eq!(
            line(&PipelineEvent::ItemTimedOut {
                index: 3,
                attempts: 30
            }),
            "item 3: UNCONFIRMED after 30 poll(s)"
        );
        assert_eq!(
            line(&PipelineEvent::Completed { minted: 6 }),
            "done, 6 item(s) minted"
        );
    }
}
