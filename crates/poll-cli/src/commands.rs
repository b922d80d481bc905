//! Command execution against a registry service.

use crate::config::{resolve_identity, Command};
use chrono::{DateTime, SecondsFormat};
use poll_registry::{CreatePollRequest, EventJournal, Identity, PollRegistryApi, Timestamp};
use serde_json::{json, Value};

/// RFC 3339 rendering of a UNIX timestamp (`None` if out of chrono's range).
pub fn rfc3339(timestamp: Timestamp) -> Option<String> {
    i64::try_from(timestamp)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Run one command and build its JSON output.
///
/// `caller` must be present for mutating commands; the caller of this
/// function resolves it before the ledger is opened.
pub fn execute<S: PollRegistryApi>(
    service: &S,
    journal: &EventJournal,
    command: &Command,
    caller: Option<Identity>,
) -> anyhow::Result<Value> {
    let acting = || caller.ok_or(crate::config::CliError::MissingCaller);

    let output = match command {
        Command::Create {
            title,
            description,
            duration,
            options,
        } => {
            let request =
                CreatePollRequest::new(title.clone(), description.clone(), *duration, options.clone());
            let poll_id = service.create_poll(acting()?, request)?;
            let info = service.get_poll_info(poll_id)?;
            json!({
                "poll_id": poll_id,
                "deadline": info.deadline,
                "deadline_rfc3339": rfc3339(info.deadline),
            })
        }

        Command::Vote {
            poll_id,
            option_index,
        } => {
            let voter = acting()?;
            service.vote(*poll_id, *option_index, voter)?;
            json!({
                "poll_id": poll_id,
                "option_index": option_index,
                "voter": voter,
            })
        }

        Command::Finalize { poll_id } => {
            let winning_option = service.finalize_poll(*poll_id, acting()?)?;
            let result = service.get_final_result(*poll_id)?;
            json!({
                "poll_id": poll_id,
                "winning_option": winning_option,
                "name": result.name,
                "vote_count": result.vote_count,
            })
        }

        Command::Info { poll_id } => {
            let info = service.get_poll_info(*poll_id)?;
            let options = service.get_options(*poll_id)?;
            let mut value = serde_json::to_value(&info)?;
            value["created_at_rfc3339"] = json!(rfc3339(info.created_at));
            value["deadline_rfc3339"] = json!(rfc3339(info.deadline));
            value["options"] = serde_json::to_value(options)?;
            value
        }

        Command::OptionInfo { poll_id, index } => {
            serde_json::to_value(service.get_option_info(*poll_id, *index)?)?
        }

        Command::FinalResult { poll_id } => {
            serde_json::to_value(service.get_final_result(*poll_id)?)?
        }

        Command::Voted { poll_id, identity } => {
            let identity = resolve_identity(identity)?;
            let voted = service.check_if_voted(*poll_id, &identity)?;
            json!({
                "poll_id": poll_id,
                "identity": identity,
                "voted": voted,
            })
        }

        Command::Total => json!({ "total_polls": service.get_total_polls() }),

        Command::Events { poll } => {
            let events: Vec<_> = journal
                .events()
                .into_iter()
                .filter(|e| poll.map_or(true, |id| e.event.poll_id() == id))
                .collect();
            serde_json::to_value(events)?
        }
    };

    Ok(output)
}
