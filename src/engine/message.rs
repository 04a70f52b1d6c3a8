use crossbeam_channel::Sender;

use crate::error::{TermError, TermResult};

/// A request for the engine, paired with its one-shot reply channel.
#[derive(Debug)]
pub(crate) enum Message {
    /// Permanent output.
    Write {
        payload: Vec<u8>,
        reply: Sender<TermResult<usize>>,
    },
    /// Replacement for the status region.
    SetStatus {
        payload: Vec<u8>,
        reply: Sender<TermResult<()>>,
    },
}

impl Message {
    /// Answers the request with `err` without processing it.
    pub(crate) fn reject(self, err: TermError) {
        match self {
            Self::Write { reply, .. } => {
                let _ = reply.send(Err(err));
            }
            Self::SetStatus { reply, .. } => {
                let _ = reply.send(Err(err));
            }
        }
    }
}
