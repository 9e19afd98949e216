use std::path::Path;

use folio_core::auth::IdentityProvider;
use folio_core::sync::{SyncCoordinator, SyncTransport};
use folio_core::{Article, Category, ConflictSide, SyncRecord};

use crate::cli::{Collection, ResolveArgs};
use crate::commands::common::{
    format_sync_conflict_lines, open_coordinator, read_records, replace_record, write_records,
};
use crate::error::CliError;

pub async fn run_resolve(args: ResolveArgs, profile: Option<&str>) -> Result<(), CliError> {
    let coordinator = open_coordinator(profile)?;
    let id = args.id.trim();
    if id.is_empty() {
        return Err(CliError::ConflictNotFound(args.id.clone()));
    }

    let side = match args.collection {
        Collection::Articles => {
            resolve_in_file::<Article, _, _>(&coordinator, &args.input, id, args.side.use_local()).await?
        }
        Collection::Categories => {
            resolve_in_file::<Category, _, _>(&coordinator, &args.input, id, args.side.use_local())
                .await?
        }
    };

    let label = match side {
        ConflictSide::Local => "local",
        ConflictSide::Remote => "remote",
    };
    println!("Resolved {id} keeping the {label} version");
    Ok(())
}

/// Resolve the pending conflict for `id`; a remote win overwrites the record in `input`.
pub async fn resolve_in_file<R, T, I>(
    coordinator: &SyncCoordinator<T, I>,
    input: &Path,
    id: &str,
    use_local: bool,
) -> Result<ConflictSide, CliError>
where
    R: SyncRecord,
    T: SyncTransport,
    I: IdentityProvider,
{
    let mut local = read_records::<R>(input)?;
    let conflicts = coordinator.pending_conflicts(&local).await?;

    let Some(conflict) = conflicts.iter().find(|conflict| conflict.id() == id).cloned() else {
        for line in format_sync_conflict_lines(&conflicts) {
            eprintln!("pending: {line}");
        }
        return Err(CliError::ConflictNotFound(id.to_string()));
    };

    let resolved = coordinator.resolve_conflict(conflict, use_local).await?;
    let side = resolved.resolution.unwrap_or(ConflictSide::Local);

    if side == ConflictSide::Remote {
        replace_record(&mut local, resolved.remote_version.into_record());
        write_records(input, &local)?;
    }
    Ok(side)
}
