use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::try_join_all;
use tessera_client::ClientError;
use tessera_protocol::{Command, ResponseEnvelope};
use tracing::trace;

/// A command that got a response, soft errors included.
pub(crate) struct Completed<'a> {
    pub index: usize,
    pub command: &'a Command,
    pub response: ResponseEnvelope,
}

/// Run `commands` on up to `concurrency` workers.
///
/// Workers claim the next unclaimed index from a shared atomic counter, so
/// each command is dispatched exactly once, in no particular order. Every
/// command is attempted even when some come back with soft errors; the
/// first hard error fails the whole run and drops the remaining workers.
///
/// Completed commands are returned sorted by their index.
pub(crate) async fn run_unordered<'a, F, Fut>(
    commands: &'a [Command],
    concurrency: usize,
    dispatch: F,
) -> Result<Vec<Completed<'a>>, ClientError>
where
    F: Fn(&'a Command) -> Fut,
    Fut: Future<Output = Result<ResponseEnvelope, ClientError>>,
{
    let next = AtomicUsize::new(0);
    let workers = concurrency.clamp(1, commands.len().max(1));

    let runs = (0..workers).map(|worker| {
        let next = &next;
        let dispatch = &dispatch;
        async move {
            let mut completed = Vec::new();
            loop {
                let index = next.fetch_add(1, Ordering::Relaxed);
                let Some(command) = commands.get(index) else {
                    break;
                };
                trace!(worker, index, command = command.name(), "claimed command");
                let response = dispatch(command).await?;
                completed.push(Completed {
                    index,
                    command,
                    response,
                });
            }
            Ok::<_, ClientError>(completed)
        }
    });

    let mut completed: Vec<Completed<'a>> = try_join_all(runs).await?.into_iter().flatten().collect();
    completed.sort_by_key(|c| c.index);
    Ok(completed)
}
