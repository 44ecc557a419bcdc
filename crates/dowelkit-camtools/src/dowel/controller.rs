//! Dowel controller: the owner of the current settings and their plan.
//!
//! Every settings edit produces a new [`DowelSettings`] value; the controller
//! plans it and swaps the `(settings, plan)` pair in one write. Readers clone
//! the `Arc` they need and never see a half-updated pair. Emission always runs
//! against the snapshot that was current when it started.

use super::emitter::{CancellationToken, GcodeEmitter};
use super::planner::ToolpathPlanner;
use super::settings::DowelSettings;
use super::toolpath::ToolpathPlan;
use crate::error::{CamToolError, CamToolResult};
use dowelkit_core::event_bus::{
    AppEvent, ErrorEvent, EventBus, EventCategory, EventFilter, FileEvent, SettingsEvent,
    SubscriptionId,
};
use dowelkit_core::types::{thread_safe_rw, ThreadSafeRw};
use parking_lot::Mutex;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Settings and the plan computed from them, published together.
#[derive(Debug, Clone)]
pub struct PlanSnapshot {
    /// Incremented on every successful `apply_settings`; the initial plan is 0.
    pub revision: u64,
    pub settings: Arc<DowelSettings>,
    pub plan: Arc<ToolpathPlan>,
}

pub struct DowelController {
    planner: ToolpathPlanner,
    emitter: GcodeEmitter,
    current: ThreadSafeRw<Arc<PlanSnapshot>>,
    publish_lock: Mutex<()>,
    events: Arc<EventBus>,
}

impl DowelController {
    /// Controller with the default planner and its own event bus.
    pub fn new(settings: DowelSettings) -> CamToolResult<Self> {
        Self::with_planner(ToolpathPlanner::default(), settings)
    }

    pub fn with_planner(planner: ToolpathPlanner, settings: DowelSettings) -> CamToolResult<Self> {
        Self::with_event_bus(planner, settings, Arc::new(EventBus::new()))
    }

    /// Controller publishing change notifications on a shared bus.
    pub fn with_event_bus(
        planner: ToolpathPlanner,
        settings: DowelSettings,
        events: Arc<EventBus>,
    ) -> CamToolResult<Self> {
        let plan = planner.plan(&settings)?;
        let snapshot = PlanSnapshot {
            revision: 0,
            settings: Arc::new(settings),
            plan: Arc::new(plan),
        };
        Ok(Self {
            planner,
            emitter: GcodeEmitter::default(),
            current: thread_safe_rw(Arc::new(snapshot)),
            publish_lock: Mutex::new(()),
            events,
        })
    }

    /// Replace the emitter used by `write_program` and `install_program`.
    pub fn with_emitter(mut self, emitter: GcodeEmitter) -> Self {
        self.emitter = emitter;
        self
    }

    pub fn planner(&self) -> &ToolpathPlanner {
        &self.planner
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Plan `settings` and publish the result as the current snapshot.
    ///
    /// Planning happens before the lock is taken; on failure the previous
    /// snapshot stays current. Concurrent calls are serialised from the swap
    /// through notification, so subscribers see revisions in increasing
    /// order. Change handlers may read the controller but must not call
    /// `apply_settings` themselves.
    pub fn apply_settings(&self, settings: DowelSettings) -> CamToolResult<Arc<ToolpathPlan>> {
        let plan = match self.planner.plan(&settings) {
            Ok(plan) => Arc::new(plan),
            Err(err) => {
                tracing::warn!("Rejected dowel settings: {}", err);
                self.events
                    .publish(AppEvent::Error(ErrorEvent::InvalidSettings {
                        message: err.to_string(),
                    }));
                return Err(err);
            }
        };

        let _publishing = self.publish_lock.lock();
        let revision = {
            let mut current = self.current.write();
            let revision = current.revision + 1;
            *current = Arc::new(PlanSnapshot {
                revision,
                settings: Arc::new(settings),
                plan: Arc::clone(&plan),
            });
            revision
        };

        tracing::debug!("Published dowel plan r{} ({} segments)", revision, plan.len());
        self.events
            .publish(AppEvent::Settings(SettingsEvent::DowelSettingsChanged {
                revision,
                segments: plan.len(),
            }));

        Ok(plan)
    }

    /// The current `(settings, plan)` pair.
    pub fn snapshot(&self) -> Arc<PlanSnapshot> {
        self.current.read().clone()
    }

    pub fn current_plan(&self) -> Arc<ToolpathPlan> {
        Arc::clone(&self.current.read().plan)
    }

    pub fn current_settings(&self) -> Arc<DowelSettings> {
        Arc::clone(&self.current.read().settings)
    }

    pub fn revision(&self) -> u64 {
        self.current.read().revision
    }

    /// Emit the current plan to `sink`.
    pub fn write_program<W: Write>(&self, sink: &mut W) -> io::Result<()> {
        let plan = self.current_plan();
        self.emitter.emit(&plan, sink)
    }

    /// Write the current program to `target`, replacing it atomically.
    pub fn install_program(&self, target: &Path) -> CamToolResult<PathBuf> {
        self.install_program_cancellable(target, &CancellationToken::new())
    }

    /// Write the current program to a temporary file next to `target` and
    /// move it into place once complete.
    ///
    /// If emission fails or `token` is cancelled the temporary file is
    /// removed and whatever was at `target` is left untouched.
    pub fn install_program_cancellable(
        &self,
        target: &Path,
        token: &CancellationToken,
    ) -> CamToolResult<PathBuf> {
        let plan = self.current_plan();
        match self.write_and_persist(&plan, target, token) {
            Ok(lines) => {
                tracing::info!("Installed dowel program {} ({} lines)", target.display(), lines);
                self.events
                    .publish(AppEvent::File(FileEvent::ProgramInstalled {
                        path: target.to_path_buf(),
                        lines,
                    }));
                Ok(target.to_path_buf())
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted && token.is_cancelled() => {
                tracing::info!("Dowel program generation cancelled");
                self.events.publish(AppEvent::File(FileEvent::ProgramCancelled));
                Err(CamToolError::Cancelled)
            }
            Err(err) => {
                tracing::error!("Failed to write dowel program {}: {}", target.display(), err);
                self.events
                    .publish(AppEvent::Error(ErrorEvent::ProgramWriteFailed {
                        message: err.to_string(),
                    }));
                Err(CamToolError::IoError(err))
            }
        }
    }

    fn write_and_persist(
        &self,
        plan: &ToolpathPlan,
        target: &Path,
        token: &CancellationToken,
    ) -> io::Result<usize> {
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = tempfile::Builder::new()
            .prefix("dowel_program")
            .suffix(".gcode")
            .tempfile_in(dir)?;

        let lines = {
            let mut writer = BufWriter::new(&mut tmp);
            self.emitter.emit_cancellable(plan, &mut writer, token)?
        };
        tmp.as_file().sync_all()?;
        tmp.persist(target).map_err(|e| e.error)?;
        Ok(lines)
    }

    /// Call `callback` with the new revision whenever a plan is published.
    pub fn subscribe_changes<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(u64) + Send + Sync + 'static,
    {
        self.events.subscribe(
            EventFilter::Categories(vec![EventCategory::Settings]),
            move |event| {
                if let AppEvent::Settings(SettingsEvent::DowelSettingsChanged { revision, .. }) =
                    event
                {
                    callback(revision);
                }
            },
        )
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }
}

impl std::fmt::Debug for DowelController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DowelController")
            .field("planner", &self.planner)
            .field("revision", &self.revision())
            .finish()
    }
}
