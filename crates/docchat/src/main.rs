use std::rc::Rc;
use std::time::Duration;

use dioxus::logger::tracing::{Level, debug, info, warn};
use dioxus::core::Task;
use dioxus::prelude::*;
use docchat_intake::{
    BatchReport, CandidateId, DragSession, DropEffect, DropOutcome, DroppedFiles, Flash, IncomingFile, IntakeConfig,
    Notice, PreviewRegistry, RegistryCell, UploadError, UploadOrchestrator, Validator,
};
use docchat_io::{
    ActiveNotice, DocumentDragListeners, DragHandler, DragSignal, DropOverlay, FetchTransport, FilePicker,
    FilePreviewList, NoticeStack, SignalRegistry, TransportConfig,
};
use futures::StreamExt;
use gloo_timers::future::TimeoutFuture;
use web_sys::File;

fn main() {
    console_error_panic_hook::set_once();
    // Only fails if a subscriber is already installed.
    let _ = dioxus::logger::init(Level::DEBUG);
    dioxus::launch(app);
}

/// Upload endpoint configuration. `DOCCHAT_API_URL` overrides the
/// origin at build time.
fn transport_config() -> TransportConfig {
    let mut config = TransportConfig::default();
    if let Some(url) = option_env!("DOCCHAT_API_URL") {
        url.clone_into(&mut config.base_url);
    }
    config
}

fn millis(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}

/// Handles to the process-wide intake state.
///
/// Signals are `Copy`; the orchestrator and transport are reference
/// counted, so cloning this is cheap.
#[derive(Clone)]
struct Intake {
    config: Rc<IntakeConfig>,
    registry: SignalRegistry,
    session: Signal<DragSession>,
    orchestrator: UploadOrchestrator,
    transport: Rc<FetchTransport>,
    busy: Signal<bool>,
    notices: Signal<Vec<ActiveNotice>>,
    next_notice: Signal<u64>,
    document_id: Signal<Option<String>>,
    transcript: Signal<Vec<String>>,
}

impl Intake {
    fn validator(&self) -> Validator {
        Validator::from_config(&self.config)
    }

    // --- Notices ---

    fn notify(&self, notice: Notice) {
        let mut next_notice = self.next_notice;
        let id = *next_notice.peek();
        next_notice += 1;

        let wait = millis(notice.duration);
        let mut notices = self.notices;
        notices.write().push(ActiveNotice { id, notice });
        spawn(async move {
            TimeoutFuture::new(wait).await;
            notices.write().retain(|n| n.id != id);
        });
    }

    fn dismiss(&self, id: u64) {
        let mut notices = self.notices;
        notices.write().retain(|n| n.id != id);
    }

    // --- Drag and drop ---

    fn handle_drag(&self, signal: DragSignal) {
        let mut session = self.session;
        match signal {
            DragSignal::Enter { carries_files } => {
                session.write().enter(carries_files);
            }
            DragSignal::Leave => {
                session.write().leave();
            }
            DragSignal::Over { .. } => {}
            DragSignal::Drop(files) => {
                let busy = self.orchestrator.is_busy();
                let outcome = session
                    .write()
                    .drop(files, busy, &self.validator(), &self.config);
                self.schedule_flash_clear(outcome.flash());
                match outcome {
                    DropOutcome::Rejected { reason, .. } => debug!(%reason, "drop discarded"),
                    DropOutcome::Accepted { files, warning, .. } => {
                        if let Some(warning) = warning {
                            self.notify(warning);
                        }
                        self.register_and_submit(files);
                    }
                }
            }
        }
    }

    fn schedule_flash_clear(&self, flash: Flash) {
        let mut session = self.session;
        spawn(async move {
            TimeoutFuture::new(millis(flash.clear_after)).await;
            session.write().clear_flash(flash.token);
        });
    }

    /// Register dropped files and upload them straight away.
    ///
    /// A lone file goes to the single-file endpoint. Files that were
    /// already registered are not sent again.
    fn register_and_submit(&self, files: DroppedFiles<File>) {
        let single = matches!(files, DroppedFiles::SingleFile(_));
        let summary = self.registry.with_mut(|r| r.add(files.into_vec()));
        if summary.added.is_empty() {
            debug!(duplicates = summary.duplicates.len(), "dropped files already registered");
            return;
        }
        self.submit(&summary.added, single);
    }

    // --- Picker and buttons ---

    fn add_picked(&self, files: Vec<IncomingFile<File>>) {
        let summary = self.registry.with_mut(|r| r.add(files));
        info!(
            added = summary.added.len(),
            invalid = summary.invalid,
            duplicates = summary.duplicates.len(),
            "files selected"
        );
    }

    fn remove(&self, id: &CandidateId) {
        self.registry.with_mut(|r| r.remove(id));
    }

    fn clear(&self) {
        self.registry.with_mut(PreviewRegistry::clear);
    }

    fn upload_all(&self) {
        let ids = self.registry.signal().peek().submit_eligible_ids();
        if ids.is_empty() {
            self.notify(UploadError::NothingToUpload.notice(&self.config));
            return;
        }
        self.submit(&ids, false);
    }

    // --- Upload ---

    fn submit(&self, ids: &[CandidateId], single: bool) {
        // Begin before spawning: drops handled before the task first
        // runs must already see the guard.
        let started = self.registry.with_mut(|r| match ids {
            [id] if single => self.orchestrator.begin_single(r, id),
            _ => self.orchestrator.begin(r, ids),
        });
        let ticket = match started {
            Ok(ticket) => ticket,
            Err(err) => {
                warn!(error = %err, "upload not started");
                self.notify(err.notice(&self.config));
                return;
            }
        };

        let mut busy = self.busy;
        busy.set(true);
        let this = self.clone();
        spawn(async move {
            let progress = this.start_progress();
            let report = this
                .orchestrator
                .send(&this.registry, this.transport.as_ref(), ticket)
                .await;
            progress.cancel();
            busy.set(this.orchestrator.is_busy());
            this.settle(report);
        });
    }

    fn start_progress(&self) -> Task {
        let registry = self.registry;
        let orchestrator = self.orchestrator.clone();
        let tick = millis(self.config.progress_tick);
        spawn(async move {
            loop {
                TimeoutFuture::new(tick).await;
                registry.with_mut(|r| orchestrator.tick(r));
            }
        })
    }

    fn settle(&self, report: BatchReport) {
        let counts = report.counts();
        info!(
            total = counts.total,
            succeeded = counts.succeeded,
            failed = counts.failed,
            "upload settled"
        );
        for notice in report.notices() {
            self.notify(notice.clone());
        }
        if let Some(id) = report.first_document_id() {
            let mut document_id = self.document_id;
            document_id.set(Some(id.to_owned()));
        }
        let mut transcript = self.transcript;
        transcript.write().push(report.summary_line());

        let registry = self.registry;
        let orchestrator = self.orchestrator.clone();
        let wait = millis(self.config.settled_display);
        spawn(async move {
            TimeoutFuture::new(wait).await;
            registry.with_mut(|r| orchestrator.expire_settled(r, &report));
        });
    }
}

/// Root application component.
///
/// Owns the registry, drag session and orchestrator, listens for drags
/// anywhere in the window, and lays out the conversation next to the
/// intake panel.
#[allow(clippy::too_many_lines)]
fn app() -> Element {
    // --- Application state ---
    let config = use_hook(|| Rc::new(IntakeConfig::default()));
    let orchestrator = use_hook({
        let config = Rc::clone(&config);
        move || UploadOrchestrator::new((*config).clone())
    });
    let transport = use_hook(|| Rc::new(FetchTransport::new(transport_config())));
    let registry = use_signal({
        let config = Rc::clone(&config);
        move || PreviewRegistry::new(Validator::from_config(&config))
    });
    let session = use_signal(DragSession::new);
    let busy = use_signal(|| false);
    let notices = use_signal(Vec::<ActiveNotice>::new);
    let next_notice = use_signal(|| 0_u64);
    let document_id = use_signal(|| Option::<String>::None);
    let transcript = use_signal(Vec::<String>::new);

    let intake = Intake {
        config: Rc::clone(&config),
        registry: SignalRegistry::new(registry),
        session,
        orchestrator,
        transport,
        busy,
        notices,
        next_notice,
        document_id,
        transcript,
    };

    // --- Window-wide drag and drop ---
    // Document listeners run outside the Dioxus runtime, so they forward
    // events into a coroutine. `dragover` is answered synchronously.
    let drag_events = use_coroutine({
        let intake = intake.clone();
        move |mut rx: UnboundedReceiver<DragSignal>| {
            let intake = intake.clone();
            async move {
                while let Some(signal) = rx.next().await {
                    intake.handle_drag(signal);
                }
            }
        }
    });
    use_hook(move || {
        let handler: DragHandler = Rc::new(move |signal| match signal {
            DragSignal::Over { carries_files } => session.peek().over(carries_files),
            other => {
                drag_events.send(other);
                DropEffect::None
            }
        });
        match DocumentDragListeners::attach(handler) {
            Ok(listeners) => Some(Rc::new(listeners)),
            Err(e) => {
                warn!(error = %e, "window drag-and-drop unavailable");
                None
            }
        }
    });

    // --- Handlers ---
    let on_files = {
        let intake = intake.clone();
        move |files: Vec<IncomingFile<File>>| intake.add_picked(files)
    };
    let on_remove = {
        let intake = intake.clone();
        move |id: CandidateId| intake.remove(&id)
    };
    let on_clear = {
        let intake = intake.clone();
        move |()| intake.clear()
    };
    let on_upload = {
        let intake = intake.clone();
        move |()| intake.upload_all()
    };
    let on_dismiss = move |id: u64| intake.dismiss(id);

    let candidates = registry.read().snapshot();
    let phase = session.read().phase();
    let drop_error = session.read().last_error().map(str::to_owned);
    let lines = transcript.read().clone();

    // --- Layout ---
    rsx! {
        style { dangerous_inner_html: include_str!("../assets/main.css") }

        div { class: "app",
            header { class: "app-header",
                h1 { "docchat" }
                p { class: "muted", "Drop documents anywhere to add them to the conversation" }
            }

            main { class: "layout",
                section { class: "conversation",
                    if let Some(doc) = document_id() {
                        p { class: "active-document", "Active document: {doc}" }
                    }
                    if lines.is_empty() {
                        p { class: "muted", "Upload a PDF, TXT or DOCX file to start asking questions." }
                    }
                    ul { class: "messages",
                        for (i, line) in lines.iter().enumerate() {
                            li { key: "{i}", class: "message", "{line}" }
                        }
                    }
                }

                aside { class: "intake",
                    FilePicker {
                        on_files,
                        disabled: busy(),
                        max_file_size: config.max_file_size,
                    }
                    FilePreviewList {
                        candidates,
                        busy: busy(),
                        on_remove,
                        on_clear,
                        on_upload,
                    }
                }
            }

            DropOverlay {
                phase,
                error: drop_error,
                max_file_size: config.max_file_size,
            }
            NoticeStack { notices: notices(), on_dismiss }
        }
    }
}
