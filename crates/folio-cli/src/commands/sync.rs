use std::path::Path;

use folio_core::auth::IdentityProvider;
use folio_core::sync::{SyncCoordinator, SyncOptions, SyncResult, SyncTransport};
use folio_core::{Article, Category, SyncRecord};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::cli::{Collection, SyncArgs};
use crate::commands::common::{
    merge_incoming, open_coordinator, read_records, replace_record, sync_conflict_to_item,
    write_records, SyncConflictItem,
};
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct SyncSummary {
    pub success: bool,
    pub synced_items: usize,
    pub incoming_added: usize,
    pub superseded: usize,
    pub conflicts: Vec<SyncConflictItem>,
    pub error: Option<String>,
}

pub async fn run_sync(args: SyncArgs, profile: Option<&str>) -> Result<(), CliError> {
    let coordinator = open_coordinator(profile)?;
    let options = sync_options(&args);
    let cancel_on_interrupt = options.cancellation.clone();

    if let Some(token) = cancel_on_interrupt.clone() {
        tokio::spawn(async move {
            tokio::select! {
                interrupted = tokio::signal::ctrl_c() => {
                    if interrupted.is_ok() {
                        tracing::warn!("Interrupt received, cancelling sync");
                        token.cancel();
                    }
                }
                () = token.cancelled() => {}
            }
        });
    }

    let summary = match args.collection {
        Collection::Articles => sync_file::<Article, _, _>(&coordinator, &args.input, options).await,
        Collection::Categories => sync_file::<Category, _, _>(&coordinator, &args.input, options).await,
    };
    if let Some(token) = cancel_on_interrupt {
        // releases the interrupt watcher
        token.cancel();
    }
    let summary = summary?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if summary.success {
        println!(
            "Sync completed: {} pushed, {} incoming added, {} replaced by remote",
            summary.synced_items, summary.incoming_added, summary.superseded
        );
    } else {
        println!(
            "Sync halted: {} conflict(s). Resolve with `folio resolve`, or rerun with --strategy remote.",
            summary.conflicts.len()
        );
        for conflict in &summary.conflicts {
            println!(
                "{}  local={} remote={} remote_device={}",
                conflict.id,
                conflict.local_updated_at,
                conflict.remote_updated_at,
                conflict.remote_device_id
            );
        }
    }
    Ok(())
}

pub fn sync_options(args: &SyncArgs) -> SyncOptions {
    let mut options = SyncOptions::default()
        .with_strategy(args.strategy.into())
        .with_cancellation(CancellationToken::new());
    if args.force {
        options = options.forced();
    }
    if let Some(device_id) = args.device_id.as_deref() {
        options = options.with_device_id(device_id);
    }
    options
}

/// Sync the records in `input` and write back incoming and superseded records.
pub async fn sync_file<R, T, I>(
    coordinator: &SyncCoordinator<T, I>,
    input: &Path,
    options: SyncOptions,
) -> Result<SyncSummary, CliError>
where
    R: SyncRecord,
    T: SyncTransport,
    I: IdentityProvider,
{
    let mut local = read_records::<R>(input)?;
    let result = coordinator.sync(&local, options).await?;
    if !result.success {
        return Ok(summarize(&result, 0));
    }

    for winner in result.superseded.iter().cloned() {
        replace_record(&mut local, winner.into_record());
    }
    let incoming_added = merge_incoming(&mut local, result.incoming.clone());
    if incoming_added > 0 || !result.superseded.is_empty() {
        write_records(input, &local)?;
    }

    Ok(summarize(&result, incoming_added))
}

pub fn summarize<R: SyncRecord>(result: &SyncResult<R>, incoming_added: usize) -> SyncSummary {
    SyncSummary {
        success: result.success,
        synced_items: result.synced_items,
        incoming_added,
        superseded: result.superseded.len(),
        conflicts: result.conflicts.iter().map(sync_conflict_to_item).collect(),
        error: result.error.clone(),
    }
}
