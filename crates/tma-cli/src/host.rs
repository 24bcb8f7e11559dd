use std::sync::Arc;

use tma_core::reduce;
use tma_core::AnalysisError;
use tma_core::AnalysisRequest;
use tma_core::CredentialVerifier;
use tma_core::RuntimeAction;
use tma_core::SessionAction;
use tma_core::SessionEffect;
use tma_core::SessionState;
use tma_core::StaticCredentials;
use tma_exec::AnalysisInvoker;

use crate::settings::Settings;

/// Owns the session and performs the effects the reducer asks for. Login is
/// checked inline. Analyses are handed back to the caller, which decides
/// whether to run them on this thread or a worker.
pub struct Host {
    pub state: SessionState,
    credentials: StaticCredentials,
    invoker: Arc<AnalysisInvoker>,
}

#[derive(Debug, Default)]
pub struct Dispatched {
    pub redraw: bool,
    pub analyses: Vec<AnalysisRequest>,
}

impl Host {
    pub fn new(settings: &Settings, invoker: AnalysisInvoker) -> Self {
        let mut state = SessionState::new(invoker.is_configured());
        reduce(
            &mut state,
            SessionAction::Runtime(RuntimeAction::SetHistoryLimits {
                recent_limit: settings.config.history.recent_limit,
                preview_chars: settings.config.history.preview_chars,
            }),
        );
        Self {
            state,
            credentials: settings.config.credentials(),
            invoker: Arc::new(invoker),
        }
    }

    pub fn invoker(&self) -> Arc<AnalysisInvoker> {
        Arc::clone(&self.invoker)
    }

    pub fn dispatch(&mut self, action: SessionAction) -> Dispatched {
        let mut out = Dispatched::default();
        let mut pending = reduce(&mut self.state, action);
        while let Some(effect) = pending.pop() {
            match effect {
                SessionEffect::RequestFrame => out.redraw = true,
                SessionEffect::Authenticate { username, password } => {
                    let outcome = if self.credentials.verify(&username, &password) {
                        RuntimeAction::LoginSucceeded { username }
                    } else {
                        RuntimeAction::LoginRejected
                    };
                    pending.extend(reduce(&mut self.state, SessionAction::Runtime(outcome)));
                    out.redraw = true;
                }
                SessionEffect::RunAnalysis(request) => out.analyses.push(request),
            }
        }
        out
    }

    pub fn finish(&mut self, request: AnalysisRequest, outcome: Result<String, AnalysisError>) {
        reduce(
            &mut self.state,
            SessionAction::Runtime(RuntimeAction::finished_now(request, outcome)),
        );
    }

    /// Dispatches `action` and runs any resulting analysis on this thread.
    pub fn dispatch_blocking(&mut self, action: SessionAction) {
        for request in self.dispatch(action).analyses {
            let outcome = self.invoker.run(&request);
            self.finish(request, outcome);
        }
    }
}
