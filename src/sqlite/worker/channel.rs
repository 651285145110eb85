use std::sync::mpsc::Sender;

use crate::error::SqlAccessError;
use crate::results::Row;
use crate::sqlite::params::Params;

/// Transaction statements the worker runs on request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TxVerb {
    Begin,
    Commit,
    Rollback,
}

impl TxVerb {
    pub(crate) fn sql(self) -> &'static str {
        match self {
            TxVerb::Begin => "BEGIN",
            TxVerb::Commit => "COMMIT",
            TxVerb::Rollback => "ROLLBACK",
        }
    }
}

pub(super) enum Command {
    /// Prepare and bind a statement; replies with its column names. The statement
    /// stays live on the worker until the next non-fetch command.
    Execute {
        sql: String,
        params: Params,
        respond_to: Sender<Result<Vec<String>, SqlAccessError>>,
    },
    /// Step the live statement once.
    Fetch {
        respond_to: Sender<Result<Option<Row>, SqlAccessError>>,
    },
    /// Drop the live statement, if any.
    Finish { respond_to: Sender<()> },
    Transaction {
        verb: TxVerb,
        respond_to: Sender<Result<(), SqlAccessError>>,
    },
    /// Close the connection and stop the worker.
    Shutdown {
        respond_to: Sender<Result<(), SqlAccessError>>,
    },
}
