use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gpui::{App, AsyncApp, WeakEntity};
use gpui_dnd_grouped_core::{
    MoveSeq, MoveSink, SequencedMove, SequencedSnapshot, SyncClient, SyncQueue,
};

use crate::list::GroupedDndState;

type Edit = Box<dyn FnOnce(&SyncClient) + Send>;

enum SyncJob {
    Commit(SequencedMove),
    /// A structural change made outside a drag, ordered after every move submitted before it.
    Edit { after: MoveSeq, edit: Edit },
}

impl SyncJob {
    fn run(self, client: &SyncClient) -> SequencedSnapshot {
        match self {
            SyncJob::Commit(command) => client.commit_and_refresh(&command),
            SyncJob::Edit { after, edit } => {
                edit(client);
                SequencedSnapshot {
                    seq: after,
                    groups: client.snapshot(),
                }
            }
        }
    }
}

/// A [`MoveSink`] that commits on the background executor and feeds the refreshed snapshot back
/// into the list that produced the move.
///
/// Jobs go through one queue drained by a single foreground task, so the authority sees moves in
/// commit order and snapshots come back in the same order.
pub struct GpuiMoveSink {
    client: SyncClient,
    state: WeakEntity<GroupedDndState>,
    cx: AsyncApp,
    queue: Rc<RefCell<SyncQueue<SyncJob>>>,
    submitted: Cell<MoveSeq>,
}

impl GpuiMoveSink {
    pub fn new(client: SyncClient, state: WeakEntity<GroupedDndState>, cx: &App) -> Self {
        Self {
            client,
            state,
            cx: cx.to_async(),
            queue: Rc::new(RefCell::new(SyncQueue::new())),
            submitted: Cell::new(MoveSeq::default()),
        }
    }

    /// Run `edit` against the client behind every move submitted so far, then refresh the list.
    pub fn edit(&self, edit: impl FnOnce(&SyncClient) + Send + 'static) {
        self.enqueue(SyncJob::Edit {
            after: self.submitted.get(),
            edit: Box::new(edit),
        });
    }

    fn enqueue(&self, job: SyncJob) {
        if !self.queue.borrow_mut().push(job) {
            return;
        }

        let queue = self.queue.clone();
        let client = self.client.clone();
        let state = self.state.clone();
        let background = self.cx.background_executor().clone();

        self.cx
            .spawn(async move |cx| {
                loop {
                    let Some(job) = queue.borrow_mut().next_job() else {
                        break;
                    };
                    let client = client.clone();
                    let snapshot = background.spawn(async move { job.run(&client) }).await;

                    if state
                        .update(cx, |state, cx| state.apply_snapshot(snapshot, cx))
                        .is_err()
                    {
                        tracing::debug!("grouped list released before its snapshot arrived");
                    }
                }
            })
            .detach();
    }
}

impl MoveSink for GpuiMoveSink {
    fn submit(&self, command: SequencedMove) {
        self.submitted.set(command.seq);
        self.enqueue(SyncJob::Commit(command));
    }
}
