//! Session controller (component I).
//!
//! One instance owns a single multiplexer attachment end to end: the PTY
//! host, the control line parser, the layout tree, the pane registry, the
//! resize arbiter, and the set of attached client links. It runs as a
//! single `tokio::task` actor with an inbound mailbox (`ParserEvent |
//! ClientIntent | Tick`), so every piece of session state is mutated from
//! exactly one place — matching the "guarded by the controller actor"
//! resource model.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;

use crate::client::link::{parse_pane_id, ClientOutbound, ClientSender};
use crate::client::{CloseCode, ServerFrame};
use crate::command::{self, Intent};
use crate::constants::{Tuning, SHUTDOWN_KILL_GRACE};
use crate::control::{parse_layout, strip_checksum, ControlEvent, ControlParser, LayoutNode};
use crate::events::ControllerMessage;
use crate::pty::{client_identity, PtyHost, PtyLine};
use crate::registry::capture::{self, CaptureTrigger, ClearFlag};
use crate::registry::{PaneRegistry, PaneRegistryEvent, SubscriptionHandle};
use crate::resize::{PaneResizeDebouncer, ResizeArbiter, ResizeDecision, Size};

/// The session controller's place in the lifecycle table of spec §4.I.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// The PTY host has not yet reported its process spawned.
    Booting,
    /// Attached in control mode; waiting for the first `%layout-change`.
    Attaching,
    /// Steady state: serving clients.
    Ready,
    /// No clients attached; waiting out the idle timer before detaching.
    Draining,
    /// Terminal: the multiplexer exited or a structural protocol error
    /// occurred. The actor task is about to stop.
    Dead,
}

/// A handle to a running controller's mailbox, held by the registry
/// supervisor and by every attached client link.
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    pub(crate) session_id: String,
    pub(crate) tx: mpsc::UnboundedSender<ControllerMessage>,
}

impl ControllerHandle {
    /// Posts a message to the controller's mailbox. Silently drops it if
    /// the controller has already shut down; the registry supervisor is
    /// responsible for pruning dead handles.
    pub fn send(&self, message: ControllerMessage) {
        let _ = self.tx.send(message);
    }

    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// What a pending command reply, once it arrives, should be interpreted
/// as. Replies arrive in the same order commands were issued (tmux
/// control mode is synchronous per connection), so this is a FIFO queue
/// keyed by an opaque ticket used only to discard stale timeouts. Each
/// entry is additionally tagged with the controller's generation at
/// issue time; a reply arriving after a `%session-changed` rebind bumped
/// the generation is discarded rather than applied against the new
/// attach's state.
#[derive(Debug, Clone)]
enum PendingCommand {
    /// Reply to `list-clients`, used to sweep orphaned control clients.
    OrphanSweep,
    /// Reply to a `capture-pane` issued for initial content.
    Capture { pane_id: u32, trigger: CaptureTrigger, recipient: CaptureRecipient },
    /// Any other command whose reply carries no further action besides
    /// logging a failure.
    Generic,
}

/// Who should receive the framed `initial-content` once a capture's
/// reply arrives. A capture triggered by one client catching up on
/// already-live panes (`ClientAttach`, or an explicit refresh request)
/// must reach only that client — broadcasting it would push that
/// client's clear sequence into every other attached client's stream
/// and wipe their screens on an unrelated reconnect. A capture triggered
/// by a pane becoming visible to everyone (a freshly discovered pane, or
/// a zoom transition) is genuinely shared and goes to all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaptureRecipient {
    All,
    Client(u64),
}

struct ClientState {
    sender: ClientSender,
    overflowed: Arc<AtomicBool>,
    desired_size: Option<Size>,
    pane_subs: HashMap<u32, SubscriptionHandle>,
}

/// Parameters needed to spawn a multiplexer process for a logical
/// session. Mirrors the CLI args a real deployment would build from its
/// own session-naming convention; the core only needs the resulting
/// binary path, argv, and working directory.
#[derive(Debug, Clone)]
pub struct SpawnSpec {
    pub multiplexer_bin: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub session_name: String,
    pub tuning: Tuning,
}

/// Owns one (A)+(B)+(C)+(D)+(E)+(F)+(G)+(H) instance per logical session.
pub struct SessionController {
    session_id: String,
    session_name: String,
    client_identity: String,
    state: ControllerState,
    pty: PtyHost,
    pty_rx: mpsc::UnboundedReceiver<PtyLine>,
    parser: ControlParser,
    layout: Option<LayoutNode>,
    window_id: Option<String>,
    registry: PaneRegistry,
    resize: ResizeArbiter,
    pane_resize: PaneResizeDebouncer,
    clear_flag: ClearFlag,
    generation: u64,
    tuning: Tuning,
    clients: HashMap<u64, ClientState>,
    pending: VecDeque<(u64, u64, PendingCommand)>,
    next_ticket: u64,
    mailbox: mpsc::UnboundedReceiver<ControllerMessage>,
    self_tx: mpsc::UnboundedSender<ControllerMessage>,
}

impl SessionController {
    /// Spawns the multiplexer under a PTY (component C, forcing the
    /// `INITIAL_COLS`x`INITIAL_ROWS` boot geometry per component L) and
    /// returns a handle to the running actor task plus the task itself,
    /// so callers that want to await shutdown may do so.
    ///
    /// # Errors
    ///
    /// Returns an error if the PTY host fails to spawn the multiplexer
    /// process.
    pub fn spawn(
        session_id: String,
        spec: SpawnSpec,
    ) -> crate::error::CoreResult<(ControllerHandle, tokio::task::JoinHandle<()>)> {
        let (pty, pty_rx) = PtyHost::spawn(&spec.multiplexer_bin, &spec.args, &spec.cwd)?;
        let (tx, mailbox) = mpsc::unbounded_channel();
        let handle = ControllerHandle { session_id: session_id.clone(), tx: tx.clone() };
        let tuning = spec.tuning;

        let mut controller = Self {
            session_id,
            session_name: spec.session_name,
            client_identity: client_identity(),
            state: ControllerState::Attaching,
            pty,
            pty_rx,
            parser: ControlParser::new(),
            layout: None,
            window_id: None,
            registry: PaneRegistry::with_ring_capacity(tuning.pane_ring_buffer_capacity),
            resize: ResizeArbiter::with_tolerance(tuning.resize_tolerance_cells),
            pane_resize: PaneResizeDebouncer::new(),
            clear_flag: ClearFlag::default(),
            generation: 0,
            tuning,
            clients: HashMap::new(),
            pending: VecDeque::new(),
            next_ticket: 0,
            mailbox,
            self_tx: tx,
        };
        controller.begin_orphan_sweep();

        let task = tokio::spawn(async move {
            controller.run().await;
        });

        Ok((handle, task))
    }

    async fn run(mut self) {
        loop {
            tokio::select! {
                line = self.pty_rx.recv() => {
                    match line {
                        Some(PtyLine::Line(text)) => self.handle_pty_line(&text),
                        Some(PtyLine::Exit { message }) => {
                            self.die(&format!("pty exited: {message}"));
                        }
                        None => {
                            self.die("pty channel closed");
                        }
                    }
                }
                msg = self.mailbox.recv() => {
                    match msg {
                        Some(m) => {
                            if self.handle_message(m).await {
                                break;
                            }
                        }
                        None => break,
                    }
                }
            }
            if matches!(self.state, ControllerState::Dead) {
                break;
            }
        }
        self.shutdown().await;
    }

    // ------------------------------------------------------------------
    // Mailbox handling
    // ------------------------------------------------------------------

    async fn handle_message(&mut self, message: ControllerMessage) -> bool {
        match message {
            ControllerMessage::Parser(event) => {
                self.handle_control_event(event);
            }
            ControllerMessage::Client { client_id, intent } => {
                self.handle_intent(client_id, intent);
            }
            ControllerMessage::ClientResize { client_id, size } => {
                self.resize.set_client_size(client_id, size);
                if let Some(state) = self.clients.get_mut(&client_id) {
                    state.desired_size = Some(size);
                }
                self.schedule_resize_tick();
            }
            ControllerMessage::PaneResizeRequest { pane_id, size } => {
                self.pane_resize.propose(pane_id, size);
                self.schedule_pane_resize_tick();
            }
            ControllerMessage::ClientJoined { client_id, sender } => {
                self.register_client(client_id, sender);
            }
            ControllerMessage::ClientLeft { client_id } => {
                self.unregister_client(client_id);
            }
            ControllerMessage::ResizeTick => self.on_resize_tick(),
            ControllerMessage::PaneResizeTick => self.on_pane_resize_tick(),
            ControllerMessage::DrainTimeout => {
                if matches!(self.state, ControllerState::Draining) && self.clients.is_empty() {
                    self.send_raw("detach");
                    log::info!("session {} idle timeout elapsed, detaching", self.session_id);
                    self.die("idle timeout");
                    return true;
                }
            }
            ControllerMessage::ResizePendingTimeout => self.resize.clear_pending(),
            ControllerMessage::CommandTimeout { ticket } => self.handle_command_timeout(ticket),
        }
        matches!(self.state, ControllerState::Dead)
    }

    fn handle_pty_line(&mut self, line: &str) {
        match self.parser.feed_line(line) {
            Ok(Some(event)) => self.handle_control_event(event),
            Ok(None) => {}
            Err(crate::error::CoreError::MalformedEscape(detail)) => {
                log::warn!("session {}: malformed escape skipped: {detail}", self.session_id);
            }
            Err(err) => {
                log::error!("session {}: protocol error: {err}", self.session_id);
                self.die(&format!("protocol error: {err}"));
            }
        }
    }

    fn handle_control_event(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::Output { pane_id, bytes } => {
                if let Ok(id) = parse_pane_id(&pane_id) {
                    self.registry.broadcast(id, &bytes);
                    self.close_overflowed_clients();
                }
            }
            ControlEvent::Layout { window_id, layout_string, active, .. } => {
                self.handle_layout(window_id, layout_string, active);
            }
            ControlEvent::PaneChanged | ControlEvent::Topology => {
                log::debug!("session {}: topology notification", self.session_id);
            }
            ControlEvent::SessionChanged { session_id, session_name } => {
                self.generation += 1;
                log::info!(
                    "session {}: rebound to {session_id} ({session_name}), generation {}",
                    self.session_id,
                    self.generation
                );
            }
            ControlEvent::Exit => {
                self.die("received %exit");
            }
            ControlEvent::CommandReply { lines, is_error } => {
                self.handle_command_reply(lines, is_error);
            }
        }
    }

    fn handle_layout(&mut self, window_id: String, layout_string: String, _active: bool) {
        let tree = match parse_layout(strip_checksum(&layout_string)) {
            Ok(tree) => tree,
            Err(err) => {
                log::warn!("session {}: unparseable layout, ignored: {err}", self.session_id);
                return;
            }
        };

        self.window_id = Some(window_id.clone());
        self.resize.on_layout_change(Size::new(tree.w(), tree.h()));

        let becoming_ready = matches!(
            self.state,
            ControllerState::Booting | ControllerState::Attaching
        );

        let events = self.registry.observe(&tree);
        self.layout = Some(tree.clone());

        if becoming_ready {
            self.enter_ready();
        }

        for event in events {
            match event {
                PaneRegistryEvent::Added { pane_id, .. } => {
                    if matches!(self.state, ControllerState::Ready) {
                        self.subscribe_all_clients_to_pane(pane_id);
                        self.capture_initial(pane_id, CaptureTrigger::NewSubscriber, CaptureRecipient::All);
                    }
                }
                PaneRegistryEvent::Resized { .. } => {}
                PaneRegistryEvent::Removed { pane_id } => {
                    self.broadcast_all(ServerFrame::Error {
                        message: format!("pane %{pane_id} is gone"),
                    });
                }
            }
        }

        self.broadcast_all(ServerFrame::Layout {
            window_id,
            layout_string: tree.to_layout_string(),
        });
    }

    fn enter_ready(&mut self) {
        self.state = ControllerState::Ready;
        log::info!("session {} reached Ready", self.session_id);
        self.broadcast_all(ServerFrame::Ready);
    }

    // ------------------------------------------------------------------
    // Client lifecycle
    // ------------------------------------------------------------------

    fn register_client(&mut self, client_id: u64, sender: ClientSender) {
        log::info!("session {}: client {client_id} attached", self.session_id);
        self.clients.insert(
            client_id,
            ClientState {
                sender,
                overflowed: Arc::new(AtomicBool::new(false)),
                desired_size: None,
                pane_subs: HashMap::new(),
            },
        );

        if matches!(self.state, ControllerState::Draining) {
            self.state = ControllerState::Ready;
            log::info!("session {}: new client cancelled drain", self.session_id);
        }

        if matches!(self.state, ControllerState::Ready) {
            self.send_frame_to(client_id, ServerFrame::Ready);
            let pane_ids = self.registry.live_pane_ids();
            for pane_id in pane_ids {
                self.subscribe_client_to_pane(client_id, pane_id);
                self.capture_initial(pane_id, CaptureTrigger::ClientAttach, CaptureRecipient::Client(client_id));
            }
        }
    }

    fn unregister_client(&mut self, client_id: u64) {
        if let Some(state) = self.clients.remove(&client_id) {
            for (_, handle) in state.pane_subs {
                self.registry.unsubscribe(handle);
            }
        }
        self.resize.remove_client(client_id);
        log::info!("session {}: client {client_id} detached", self.session_id);

        if self.clients.is_empty() && matches!(self.state, ControllerState::Ready) {
            self.state = ControllerState::Draining;
            log::info!(
                "session {}: last client left, draining for {:?}",
                self.session_id,
                self.tuning.draining_idle_timeout
            );
            let tx = self.self_tx.clone();
            let idle_timeout = self.tuning.draining_idle_timeout;
            tokio::spawn(async move {
                sleep(idle_timeout).await;
                let _ = tx.send(ControllerMessage::DrainTimeout);
            });
        }
    }

    fn subscribe_all_clients_to_pane(&mut self, pane_id: u32) {
        let client_ids: Vec<u64> = self.clients.keys().copied().collect();
        for client_id in client_ids {
            self.subscribe_client_to_pane(client_id, pane_id);
        }
    }

    fn subscribe_client_to_pane(&mut self, client_id: u64, pane_id: u32) {
        let Some(state) = self.clients.get(&client_id) else { return };
        if state.pane_subs.contains_key(&pane_id) {
            return;
        }
        let sender = state.sender.clone();
        let overflowed = Arc::clone(&state.overflowed);
        let callback = Box::new(move |bytes: &[u8]| {
            let frame = ServerFrame::output(pane_id, bytes);
            if sender.try_send(ClientOutbound::Frame(frame)).is_err() {
                overflowed.store(true, Ordering::SeqCst);
            }
        });
        match self.registry.subscribe(pane_id, callback) {
            Ok(handle) => {
                if let Some(state) = self.clients.get_mut(&client_id) {
                    state.pane_subs.insert(pane_id, handle);
                }
            }
            Err(err) => {
                self.send_frame_to(client_id, ServerFrame::Error { message: err.to_string() });
            }
        }
    }

    fn close_overflowed_clients(&mut self) {
        let overflowed: Vec<u64> = self
            .clients
            .iter()
            .filter(|(_, state)| state.overflowed.load(Ordering::SeqCst))
            .map(|(id, _)| *id)
            .collect();
        for client_id in overflowed {
            log::warn!("session {}: client {client_id} is a slow consumer", self.session_id);
            self.close_client(client_id, CloseCode::InternalError);
        }
    }

    fn close_client(&mut self, client_id: u64, code: CloseCode) {
        if let Some(state) = self.clients.get(&client_id) {
            let _ = state.sender.try_send(ClientOutbound::Close(code));
        }
        self.unregister_client(client_id);
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    fn handle_intent(&mut self, client_id: u64, intent: Intent) {
        if !self.clients.contains_key(&client_id) {
            return;
        }
        match intent {
            Intent::RequestContent { pane_id } => {
                self.capture_initial(pane_id, CaptureTrigger::RequestContent, CaptureRecipient::Client(client_id));
            }
            Intent::ZoomToggle { pane_id } => {
                for cmd in command::dispatch(&Intent::ZoomToggle { pane_id }) {
                    self.send_command(cmd, PendingCommand::Generic);
                }
                self.capture_initial(pane_id, CaptureTrigger::ZoomTransition, CaptureRecipient::All);
            }
            other => {
                for cmd in command::dispatch(&other) {
                    self.send_command(cmd, PendingCommand::Generic);
                }
            }
        }
    }

    fn capture_initial(&mut self, pane_id: u32, trigger: CaptureTrigger, recipient: CaptureRecipient) {
        if trigger.is_explicit_by_default() {
            self.clear_flag.set_explicit();
        }
        self.send_command(
            capture::capture_command(pane_id),
            PendingCommand::Capture { pane_id, trigger, recipient },
        );
    }

    fn handle_command_reply(&mut self, lines: Vec<String>, is_error: bool) {
        let Some((_, generation, kind)) = self.pending.pop_front() else {
            log::warn!("session {}: unexpected command reply with no pending command", self.session_id);
            return;
        };
        if generation != self.generation {
            log::debug!(
                "session {}: discarding reply from generation {generation} (current {})",
                self.session_id,
                self.generation
            );
            return;
        }
        match kind {
            PendingCommand::OrphanSweep => {
                if is_error {
                    log::warn!("session {}: orphan sweep list-clients failed", self.session_id);
                    return;
                }
                for name in lines {
                    self.maybe_detach_orphan(name.trim());
                }
            }
            PendingCommand::Capture { pane_id, recipient, .. } => {
                if is_error {
                    log::warn!(
                        "session {}: capture-pane for %{pane_id} failed: {lines:?}",
                        self.session_id
                    );
                    return;
                }
                let explicit = self.clear_flag.consume();
                let bytes = capture::framed_initial_content(&lines, explicit);
                let frame = ServerFrame::initial_content(pane_id, &bytes, explicit);
                match recipient {
                    CaptureRecipient::All => self.broadcast_all(frame),
                    CaptureRecipient::Client(client_id) => self.send_frame_to(client_id, frame),
                }
            }
            PendingCommand::Generic => {
                if is_error {
                    log::warn!("session {}: command failed: {lines:?}", self.session_id);
                }
            }
        }
    }

    fn handle_command_timeout(&mut self, ticket: u64) {
        if self.pending.front().is_some_and(|(t, ..)| *t == ticket) {
            self.pending.pop_front();
            log::warn!(
                "session {}: command reply timed out after {:?} (ticket {ticket})",
                self.session_id,
                self.tuning.command_reply_timeout
            );
        }
    }

    /// Issues `list-clients -t {session} -F "#{client_name}"` to discover
    /// control clients left behind by a prior crash, so they can be
    /// detached before the first real attach.
    fn begin_orphan_sweep(&mut self) {
        let cmd = format!("list-clients -t {} -F \"#{{client_name}}\"", self.session_name);
        self.send_command(cmd, PendingCommand::OrphanSweep);
    }

    fn maybe_detach_orphan(&mut self, name: &str) {
        if name.is_empty() || name == self.client_identity {
            return;
        }
        if name.starts_with(crate::constants::CLIENT_NAME_PREFIX) {
            log::info!("session {}: detaching orphan control client {name}", self.session_id);
            self.send_command(format!("detach -a -t {name}"), PendingCommand::Generic);
        }
    }

    fn send_command(&mut self, cmd: String, kind: PendingCommand) {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.pending.push_back((ticket, self.generation, kind));
        self.send_raw(&cmd);

        let tx = self.self_tx.clone();
        let reply_timeout = self.tuning.command_reply_timeout;
        tokio::spawn(async move {
            sleep(reply_timeout).await;
            let _ = tx.send(ControllerMessage::CommandTimeout { ticket });
        });
    }

    fn send_raw(&mut self, cmd: &str) {
        let mut bytes = cmd.as_bytes().to_vec();
        bytes.push(b'\n');
        if let Err(err) = self.pty.write(&bytes) {
            log::error!("session {}: pty write failed: {err}", self.session_id);
            self.die(&format!("pty write failed: {err}"));
        }
    }

    // ------------------------------------------------------------------
    // Resize
    // ------------------------------------------------------------------

    fn schedule_resize_tick(&mut self) {
        let tx = self.self_tx.clone();
        let debounce = self.tuning.resize_debounce;
        tokio::spawn(async move {
            sleep(debounce).await;
            let _ = tx.send(ControllerMessage::ResizeTick);
        });
    }

    fn schedule_pane_resize_tick(&mut self) {
        let tx = self.self_tx.clone();
        let debounce = self.tuning.pane_resize_debounce;
        tokio::spawn(async move {
            sleep(debounce).await;
            let _ = tx.send(ControllerMessage::PaneResizeTick);
        });
    }

    fn on_resize_tick(&mut self) {
        match self.resize.propose() {
            ResizeDecision::Send(size) => {
                if let Err(err) = self.pty.resize(size.cols, size.rows) {
                    log::warn!("session {}: pty resize failed: {err}", self.session_id);
                }
                self.send_command(
                    format!("refresh-client -C {}x{}", size.cols, size.rows),
                    PendingCommand::Generic,
                );
                let tx = self.self_tx.clone();
                let pending_timeout = self.tuning.resize_pending_timeout;
                tokio::spawn(async move {
                    sleep(pending_timeout).await;
                    let _ = tx.send(ControllerMessage::ResizePendingTimeout);
                });
            }
            ResizeDecision::SkipPending
            | ResizeDecision::SkipTolerance
            | ResizeDecision::SkipNoClients => {}
        }
    }

    fn on_pane_resize_tick(&mut self) {
        for (pane_id, size) in self.pane_resize.drain() {
            self.send_command(
                format!("resize-pane -t %{pane_id} -x {} -y {}", size.cols, size.rows),
                PendingCommand::Generic,
            );
        }
    }

    // ------------------------------------------------------------------
    // Teardown
    // ------------------------------------------------------------------

    fn broadcast_all(&mut self, frame: ServerFrame) {
        let client_ids: Vec<u64> = self.clients.keys().copied().collect();
        for client_id in client_ids {
            self.send_frame_to(client_id, frame.clone());
        }
    }

    fn send_frame_to(&mut self, client_id: u64, frame: ServerFrame) {
        if let Some(state) = self.clients.get(&client_id) {
            if state.sender.try_send(ClientOutbound::Frame(frame)).is_err() {
                state.overflowed.store(true, Ordering::SeqCst);
            }
        }
    }

    fn die(&mut self, reason: &str) {
        if matches!(self.state, ControllerState::Dead) {
            return;
        }
        log::info!("session {} transitioning to Dead: {reason}", self.session_id);
        self.state = ControllerState::Dead;
        self.broadcast_all_close(CloseCode::InternalError);
    }

    fn broadcast_all_close(&mut self, code: CloseCode) {
        for state in self.clients.values() {
            let _ = state.sender.try_send(ClientOutbound::Close(code));
        }
    }

    /// Tears down the PTY host: `SIGTERM` (via `Child::kill`) then waits
    /// up to [`SHUTDOWN_KILL_GRACE`] for the child to exit before giving
    /// up, matching the cancellation policy in spec §5.
    async fn shutdown(mut self) {
        log::info!("session {} shutting down", self.session_id);
        self.broadcast_all_close(CloseCode::InternalError);
        if let Err(err) = self.pty.terminate() {
            log::warn!("session {}: terminate failed: {err}", self.session_id);
            return;
        }

        let session_id = self.session_id.clone();
        let mut pty = self.pty;
        let wait = tokio::time::timeout(
            SHUTDOWN_KILL_GRACE,
            tokio::task::spawn_blocking(move || pty.wait()),
        )
        .await;
        match wait {
            Ok(Ok(Ok(status))) => log::info!("session {session_id}: multiplexer exited: {status}"),
            Ok(Ok(Err(err))) => log::warn!("session {session_id}: wait failed: {err}"),
            Ok(Err(err)) => log::warn!("session {session_id}: wait task panicked: {err}"),
            Err(_) => log::warn!(
                "session {session_id}: multiplexer did not exit within {SHUTDOWN_KILL_GRACE:?} of shutdown"
            ),
        }
    }

    #[must_use]
    pub fn state(&self) -> ControllerState {
        self.state
    }
}
