// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scripted host for tests and demos.
//
// Behaves like a real host but every outcome is chosen up front, including
// the misbehaviours a real rendering engine shows under stress (a failure
// followed by a stale success for the same surface). It records every print
// request together with the bytes the surface saw at load time.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use printbridge_core::error::{PrintBridgeError, Result};
use printbridge_core::types::{DocumentUrl, PrintRequest, SurfaceId};

use crate::traits::*;

/// How a scripted surface reacts to `load`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadScript {
    /// A single `LoadFinished`.
    Finish,
    /// A single `LoadFailed`.
    Fail { code: i32, description: String },
    /// `LoadFailed` immediately followed by a stale `LoadFinished`.
    FailThenStaleFinish { code: i32, description: String },
    /// `LoadFinished` followed by a spurious `LoadFailed`.
    FinishThenFail { code: i32, description: String },
}

impl LoadScript {
    fn signals(&self) -> Vec<SurfaceSignal> {
        let failed = |code: &i32, description: &String| SurfaceSignal::LoadFailed {
            code: *code,
            description: description.clone(),
        };
        match self {
            Self::Finish => vec![SurfaceSignal::LoadFinished],
            Self::Fail { code, description } => vec![failed(code, description)],
            Self::FailThenStaleFinish { code, description } => {
                vec![failed(code, description), SurfaceSignal::LoadFinished]
            }
            Self::FinishThenFail { code, description } => {
                vec![SurfaceSignal::LoadFinished, failed(code, description)]
            }
        }
    }
}

/// A print request as the scripted printing subsystem received it.
#[derive(Debug, Clone)]
pub struct RecordedPrint {
    pub surface: SurfaceId,
    pub request: PrintRequest,
    pub document: DocumentUrl,
    /// File bytes captured when the document was loaded.
    pub content: Vec<u8>,
}

struct ScriptState {
    printers: Mutex<Option<Vec<String>>>,
    load: Mutex<LoadScript>,
    print: Mutex<PrintOutcome>,
    signal_delay: Mutex<Duration>,
    print_delay: Mutex<Duration>,
    opened: AtomicUsize,
    closed: AtomicUsize,
    prints: Mutex<Vec<RecordedPrint>>,
}

/// Cheaply cloneable handle; clones share one script and one record.
#[derive(Clone)]
pub struct ScriptedHost {
    state: Arc<ScriptState>,
}

impl ScriptedHost {
    /// A healthy host: loads succeed, prints are accepted, no printers listed.
    pub fn new() -> Self {
        Self {
            state: Arc::new(ScriptState {
                printers: Mutex::new(Some(Vec::new())),
                load: Mutex::new(LoadScript::Finish),
                print: Mutex::new(PrintOutcome::Submitted),
                signal_delay: Mutex::new(Duration::ZERO),
                print_delay: Mutex::new(Duration::ZERO),
                opened: AtomicUsize::new(0),
                closed: AtomicUsize::new(0),
                prints: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn with_printers<I, S>(self, printers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.state.printers.lock().expect("script lock poisoned") =
            Some(printers.into_iter().map(Into::into).collect());
        self
    }

    /// Make the catalog behave as if the host were still initialising.
    pub fn with_catalog_unavailable(self) -> Self {
        *self.state.printers.lock().expect("script lock poisoned") = None;
        self
    }

    pub fn with_load(self, script: LoadScript) -> Self {
        self.set_load(script);
        self
    }

    pub fn with_print(self, outcome: PrintOutcome) -> Self {
        self.set_print(outcome);
        self
    }

    /// Delay between `load` and the first signal.
    pub fn with_signal_delay(self, delay: Duration) -> Self {
        *self.state.signal_delay.lock().expect("script lock poisoned") = delay;
        self
    }

    /// Time the printing subsystem takes to answer.
    pub fn with_print_delay(self, delay: Duration) -> Self {
        *self.state.print_delay.lock().expect("script lock poisoned") = delay;
        self
    }

    pub fn set_load(&self, script: LoadScript) {
        *self.state.load.lock().expect("script lock poisoned") = script;
    }

    pub fn set_print(&self, outcome: PrintOutcome) {
        *self.state.print.lock().expect("script lock poisoned") = outcome;
    }

    /// Surfaces handed out so far.
    pub fn opened(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    /// Surfaces closed so far (each counted once however often it is closed).
    pub fn closed(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }

    pub fn prints(&self) -> Vec<RecordedPrint> {
        self.state.prints.lock().expect("script lock poisoned").clone()
    }
}

impl Default for ScriptedHost {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderHost for ScriptedHost {
    fn host_name(&self) -> &str {
        "scripted"
    }

    fn open_surface(&self, id: SurfaceId) -> Result<Arc<dyn HostSurface>> {
        self.state.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(ScriptedSurface {
            id,
            state: Arc::clone(&self.state),
            loaded: Mutex::new(None),
            closed: AtomicBool::new(false),
        }))
    }
}

#[async_trait]
impl PrinterCatalog for ScriptedHost {
    async fn list_printers(&self) -> Result<Vec<String>> {
        self.state
            .printers
            .lock()
            .expect("script lock poisoned")
            .clone()
            .ok_or_else(|| {
                PrintBridgeError::CatalogUnavailable("host window not initialised".into())
            })
    }
}

struct ScriptedSurface {
    id: SurfaceId,
    state: Arc<ScriptState>,
    loaded: Mutex<Option<(DocumentUrl, Vec<u8>)>>,
    closed: AtomicBool,
}

#[async_trait]
impl HostSurface for ScriptedSurface {
    fn load(&self, document: &DocumentUrl, signals: SignalSender) {
        let content = std::fs::read(document.path()).unwrap_or_default();
        *self.loaded.lock().expect("surface lock poisoned") = Some((document.clone(), content));

        let script = self.state.load.lock().expect("script lock poisoned").clone();
        let delay = *self.state.signal_delay.lock().expect("script lock poisoned");
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            for signal in script.signals() {
                let _ = signals.send(signal);
            }
        });
    }

    async fn print(&self, request: &PrintRequest) -> PrintOutcome {
        let delay = *self.state.print_delay.lock().expect("script lock poisoned");
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let loaded = self.loaded.lock().expect("surface lock poisoned").clone();
        let Some((document, content)) = loaded else {
            return PrintOutcome::Failed(Some("no document loaded".into()));
        };
        self.state
            .prints
            .lock()
            .expect("script lock poisoned")
            .push(RecordedPrint {
                surface: self.id,
                request: request.clone(),
                document,
                content,
            });
        self.state.print.lock().expect("script lock poisoned").clone()
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.state.closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}
