use epoh_02_ledger::{LedgerApi, LedgerError, LedgerStore, TimeSource};
use epoh_telemetry::{
    gather_metrics, metric_inc, metric_set, ACTIVE_SESSIONS, BLOCKS_MINTED, CHAIN_LENGTH,
    PERSISTENCE_FAILURES, SUBMISSIONS, SUBMIT_DURATION,
};
use shared_types::{ClientId, Frame};
use tracing::{error, warn};

use crate::container::NodeContainer;

/// Largest tail served in one frame.
pub const MAX_TAIL_BLOCKS: usize = 256;

fn ledger_error(err: &LedgerError) -> Frame {
    Frame::Error {
        kind: err.label().to_string(),
        message: err.to_string(),
    }
}

impl<S, C> NodeContainer<S, C>
where
    S: LedgerStore + 'static,
    C: TimeSource + 'static,
{
    /// Answer one non-handshake frame.
    pub async fn handle_request(&self, request: Frame) -> Frame {
        match request {
            Frame::Submit {
                client_id,
                payload,
                mac,
            } => self.submit(client_id, payload, mac).await,

            Frame::Tail { n } => Frame::TailResult {
                blocks: self.engine.get_chain_tail(n.min(MAX_TAIL_BLOCKS)),
            },

            Frame::AuthStatusQuery { client_id } => Frame::AuthStatusResult {
                status: self.engine.get_auth_status(&client_id),
                client_id,
            },

            Frame::Logout { client_id, mac } => match self.engine.logout(&client_id, &mac) {
                Ok(()) => {
                    metric_set!(ACTIVE_SESSIONS, self.engine.active_sessions());
                    Frame::LoggedOut { client_id }
                }
                Err(err) => {
                    warn!(%client_id, error = %err, "logout refused");
                    ledger_error(&err)
                }
            },

            Frame::Metrics => match gather_metrics() {
                Ok(text) => Frame::MetricsResult { text },
                Err(err) => Frame::Error {
                    kind: "metrics".to_string(),
                    message: err.to_string(),
                },
            },

            other => Frame::Error {
                kind: "protocol".to_string(),
                message: format!("unexpected {} frame", other.kind()),
            },
        }
    }

    async fn submit(&self, client_id: ClientId, payload: Vec<u8>, mac: Vec<u8>) -> Frame {
        let timer = SUBMIT_DURATION.start_timer();
        let result = self.engine.submit(&client_id, payload, &mac).await;
        timer.observe_duration();

        match result {
            Ok(block) => {
                metric_inc!(SUBMISSIONS, &["minted"]);
                metric_inc!(BLOCKS_MINTED);
                metric_set!(CHAIN_LENGTH, self.engine.chain_len());
                Frame::SubmitAck {
                    index: block.index,
                    block_hash: block.block_hash,
                }
            }
            Err(err) => {
                metric_inc!(SUBMISSIONS, &[err.label()]);
                if matches!(err, LedgerError::PersistenceFailure(_)) {
                    metric_inc!(PERSISTENCE_FAILURES);
                    error!(%client_id, error = %err, "ledger halted; operator action required");
                } else {
                    warn!(%client_id, error = %err, "submission refused");
                }
                ledger_error(&err)
            }
        }
    }
}
