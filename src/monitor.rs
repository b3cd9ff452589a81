//! The per-table polling loop: capture, extract, fuse, gate, dispatch.

use crate::change::ChangeDetector;
use crate::config::MonitorConfig;
use crate::trigger::{PendingTrigger, TriggerBoard};
use anyhow::{anyhow, Result};
use holdem_advisor::{
    BaseStateSource, ConsoleSink, ModePolicy, NoBaseState, OutputSink, PolicyGate, PolicyRequest,
    Recommendation, Recommender, SummaryRecommender, TriggerKind,
};
use holdem_capture::{BoundedCapture, FrameSource};
use holdem_state::{fuse, Fingerprint, TableState, Warning};
use holdem_vision::{Extraction, StateExtractor};
use image::RgbaImage;
use serde::Serialize;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// What happened to one table during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableOutcome {
    /// Advice was rendered.
    Emitted,
    /// Fingerprint matches the last emission.
    Unchanged,
    LowConfidence,
    /// New state, but strict mode and no pending trigger.
    Waiting,
    Denied,
    /// Fusion produced a structurally invalid state.
    Invalid,
    /// Capture, a collaborator or the extractor failed.
    Failed,
}

#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub outcomes: Vec<(String, TableOutcome)>,
}

impl TickReport {
    pub fn outcome(&self, table: &str) -> Option<TableOutcome> {
        self.outcomes
            .iter()
            .find(|(t, _)| t == table)
            .map(|(_, o)| *o)
    }
}

/// Diagnostics for one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableStatus {
    pub table: String,
    pub last_emitted: Option<String>,
    pub pending_trigger: TriggerKind,
    pub last_message: Option<String>,
}

struct TableRecord {
    last_emitted: Option<Fingerprint>,
    /// State for which the "waiting" notice was last shown.
    waiting_for: Option<Fingerprint>,
    last_message: Option<String>,
    trigger: Arc<PendingTrigger>,
    ui_change: ChangeDetector,
    post_action: ChangeDetector,
}

impl TableRecord {
    fn new(config: &MonitorConfig, trigger: Arc<PendingTrigger>) -> Self {
        Self {
            last_emitted: None,
            waiting_for: None,
            last_message: None,
            trigger,
            ui_change: ChangeDetector::new("ui", &config.ui_change),
            post_action: ChangeDetector::new("post-action", &config.post_action),
        }
    }

    /// Render `text` unless it is what this table last showed.
    fn show_once(&mut self, sink: &dyn OutputSink, text: String) -> Result<()> {
        if self.last_message.as_deref() == Some(text.as_str()) {
            return Ok(());
        }
        sink.render(&text)?;
        self.last_message = Some(text);
        Ok(())
    }
}

pub struct Monitor {
    config: MonitorConfig,
    capture: BoundedCapture,
    extractor: Arc<dyn StateExtractor>,
    base: Arc<dyn BaseStateSource>,
    policy: Arc<dyn PolicyGate>,
    recommender: Arc<dyn Recommender>,
    sink: Arc<dyn OutputSink>,
    triggers: Arc<TriggerBoard>,
    stop: Arc<AtomicBool>,
    records: HashMap<String, TableRecord>,
}

impl Monitor {
    /// Monitor with the stock collaborators: no base state, mode-based
    /// policy, summary recommender and console output.
    pub fn new(
        config: MonitorConfig,
        source: Arc<dyn FrameSource>,
        extractor: Arc<dyn StateExtractor>,
    ) -> Self {
        let capture = BoundedCapture::new(source, config.capture_timeout());
        Self {
            config,
            capture,
            extractor,
            base: Arc::new(NoBaseState),
            policy: Arc::new(ModePolicy),
            recommender: Arc::new(SummaryRecommender),
            sink: Arc::new(ConsoleSink),
            triggers: Arc::new(TriggerBoard::new()),
            stop: Arc::new(AtomicBool::new(false)),
            records: HashMap::new(),
        }
    }

    pub fn with_base_states(mut self, base: Arc<dyn BaseStateSource>) -> Self {
        self.base = base;
        self
    }

    pub fn with_policy(mut self, policy: Arc<dyn PolicyGate>) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_recommender(mut self, recommender: Arc<dyn Recommender>) -> Self {
        self.recommender = recommender;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn OutputSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Shared trigger flags, for hotkey listeners.
    pub fn triggers(&self) -> Arc<TriggerBoard> {
        self.triggers.clone()
    }

    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Poll every table at the configured cadence until stopped.
    pub async fn run(&mut self) {
        let interval = self.config.poll_interval();
        info!(
            "Monitor started: mode={}, interval={:?}, floor={}",
            self.config.mode, interval, self.config.emission_confidence_floor
        );

        while !self.stopped() {
            let tick_start = Instant::now();
            let report = self.tick().await;
            debug!("Tick: {:?} in {:?}", report.outcomes, tick_start.elapsed());

            let elapsed = tick_start.elapsed();
            if elapsed < interval && !self.stopped() {
                tokio::time::sleep(interval - elapsed).await;
            }
        }
        info!("Monitor stopped");
    }

    /// One pass over every visible table.
    pub async fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();
        if self.stopped() {
            return report;
        }

        let tables = match self.capture.source().tables() {
            Ok(tables) => tables,
            Err(e) => {
                warn!("Failed to list tables: {:#}", e);
                return report;
            }
        };
        self.sync_registry(&tables);

        for table in tables {
            if self.stopped() {
                break;
            }
            let outcome = self.tick_table(&table).await;
            report.outcomes.push((table, outcome));
        }
        report
    }

    /// Drop records of vanished tables and create records for new ones.
    fn sync_registry(&mut self, tables: &[String]) {
        self.records.retain(|table, _| {
            let keep = tables.contains(table);
            if !keep {
                info!(table = %table, "Table gone");
            }
            keep
        });
        self.triggers.retain(tables);

        for table in tables {
            if !self.records.contains_key(table) {
                info!(table = %table, "New table");
                let record = TableRecord::new(&self.config, self.triggers.handle(table));
                self.records.insert(table.clone(), record);
            }
        }
    }

    async fn tick_table(&mut self, table: &str) -> TableOutcome {
        let frame = match self.capture.capture(table).await {
            Ok(frame) => Arc::new(frame),
            Err(e) => {
                warn!(table = %table, "Capture failed: {:#}", e);
                return TableOutcome::Failed;
            }
        };

        let extractor = self.extractor.clone();
        let shared = frame.clone();
        let extraction = match tokio::task::spawn_blocking(move || extractor.extract(&shared)).await
        {
            Ok(extraction) => extraction,
            Err(e) => {
                warn!(table = %table, "Extraction failed: {}", e);
                return TableOutcome::Failed;
            }
        };

        match catch_unwind(AssertUnwindSafe(|| self.process_frame(table, &frame, extraction))) {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                warn!(table = %table, "Table processing failed: {:#}", e);
                TableOutcome::Failed
            }
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                warn!(table = %table, "Table processing panicked: {}", reason);
                TableOutcome::Failed
            }
        }
    }

    /// Fuse, update the change detectors and apply the emission gate. A
    /// rejected state returns before any part of the record is touched.
    fn process_frame(
        &mut self,
        table: &str,
        frame: &RgbaImage,
        extraction: Extraction,
    ) -> Result<TableOutcome> {
        let base = self.base.base_state(table);
        let fusion = match fuse(base.as_ref().map(|b| &b.state), &extraction.observed) {
            Ok(fusion) => fusion,
            Err(e) => {
                warn!(table = %table, "Fused state rejected: {}", e);
                return Ok(TableOutcome::Invalid);
            }
        };

        let record = self
            .records
            .get_mut(table)
            .ok_or_else(|| anyhow!("no record for table {}", table))?;

        if record.ui_change.observe(frame) {
            record.trigger.raise(TriggerKind::ChangeDetected);
        }
        if record.post_action.observe(frame) {
            record.trigger.raise(TriggerKind::ChangeDetected);
        }

        let mut warnings = extraction.warnings;
        warnings.extend(fusion.warnings.iter().cloned());
        for w in &warnings {
            debug!(table = %table, "{}", w);
        }

        let fingerprint = Fingerprint::of(&fusion.state);
        if fusion.confidence < self.config.emission_confidence_floor {
            debug!(
                table = %table,
                "Confidence {:.3} below floor {:.3}",
                fusion.confidence, self.config.emission_confidence_floor
            );
            record.trigger.clear_explicit();
            return Ok(TableOutcome::LowConfidence);
        }
        if record.last_emitted.as_ref() == Some(&fingerprint) {
            record.trigger.clear_explicit();
            return Ok(TableOutcome::Unchanged);
        }

        let trigger = record.trigger.peek();
        if self.config.mode.is_strict() && !trigger.is_pending() {
            if record.waiting_for.as_ref() != Some(&fingerprint) {
                let notice = format!(
                    "[{}] New hand state ({}). Waiting for a request.",
                    table, fusion.state.phase
                );
                record.show_once(self.sink.as_ref(), notice)?;
                record.waiting_for = Some(fingerprint);
            }
            return Ok(TableOutcome::Waiting);
        }

        let decision = self.policy.evaluate(&PolicyRequest {
            state: &fusion.state,
            trigger,
            mode: self.config.mode,
            confidence: fusion.confidence,
        })?;

        if !decision.allowed {
            info!(
                table = %table,
                reason = %decision.reason,
                tags = ?decision.audit_tags,
                "Advice denied"
            );
            let message = if decision.message.is_empty() {
                &decision.reason
            } else {
                &decision.message
            };
            record.show_once(self.sink.as_ref(), format!("[{}] {}", table, message))?;
            if self.config.deny_advances_state {
                record.last_emitted = Some(fingerprint);
                record.trigger.take();
            }
            return Ok(TableOutcome::Denied);
        }

        let recommendation = self.recommender.recommend(&fusion.state)?;
        let confidence = recommendation.confidence.min(fusion.confidence);
        let payload = render_advice(table, &fusion.state, &recommendation, confidence, &warnings);
        self.sink.render(&payload)?;

        info!(
            table = %table,
            fingerprint = %fingerprint.short(),
            trigger = %trigger,
            "Emitted {} at confidence {:.3}",
            recommendation.action,
            confidence
        );
        record.last_emitted = Some(fingerprint);
        record.waiting_for = None;
        record.last_message = Some(payload);
        record.trigger.take();
        Ok(TableOutcome::Emitted)
    }

    /// Snapshot of every tracked table, sorted by id.
    pub fn table_status(&self) -> Vec<TableStatus> {
        let mut status: Vec<TableStatus> = self
            .records
            .iter()
            .map(|(table, record)| TableStatus {
                table: table.clone(),
                last_emitted: record.last_emitted.as_ref().map(|f| f.as_str().to_string()),
                pending_trigger: record.trigger.peek(),
                last_message: record.last_message.clone(),
            })
            .collect();
        status.sort_by(|a, b| a.table.cmp(&b.table));
        status
    }
}

/// Text handed to the output sink for one emission.
pub fn render_advice(
    table: &str,
    state: &TableState,
    recommendation: &Recommendation,
    confidence: f64,
    warnings: &[Warning],
) -> String {
    let mut out = format!(
        "[{}] {} (confidence {:.2})\n  {}",
        table,
        recommendation.action,
        confidence,
        state.summary()
    );
    if let Some(sizing) = recommendation.sizing {
        out.push_str(&format!("\n  sizing: {}", sizing));
    }
    for fact in &recommendation.key_facts {
        out.push_str(&format!("\n  - {}", fact));
    }
    for w in warnings {
        out.push_str(&format!("\n  ! {}", w));
    }
    out
}
