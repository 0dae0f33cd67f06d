//! Resumable, strictly sequential batch lookup.
//!
//! Identifiers are normalized, anything already in the progress store is
//! skipped, and the rest is walked in fixed-size batches. Every attempt,
//! whatever its outcome, is written to the progress store before the next
//! request goes out, so an interrupted run picks up exactly where it stopped.

use anyhow::{Context, Result};
use std::{
    collections::{BTreeMap, BTreeSet, HashSet},
    time::Instant,
};
use tracing::debug;

use crate::{
    clock::Clock,
    config::Config,
    event_log::EventLog,
    fetch::{classify, Failure, Fetcher, Outcome, Record},
    history::ProgressStore,
    identifier::normalize_all,
};

/// What a run produced.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Successful payloads, in request order.
    pub records: Vec<Record>,
    pub batches: usize,
    pub attempted: usize,
    pub succeeded: usize,
    /// Failure count per `Failure::kind`.
    pub failures: BTreeMap<&'static str, usize>,
    /// Input rows that normalized to an empty string.
    pub skipped_empty: usize,
}

impl RunReport {
    pub fn failed(&self) -> usize {
        self.failures.values().sum()
    }
}

/// Identifiers still to be requested, in input order.
#[derive(Debug, PartialEq, Eq)]
pub struct Remaining {
    pub ids: Vec<String>,
    pub skipped_empty: usize,
}

/// Drop empties, anything already processed, and repeats of an identifier
/// seen earlier in the list.
pub fn remaining(normalized: &[String], processed: &BTreeSet<String>) -> Remaining {
    let mut seen = HashSet::new();
    let mut skipped_empty = 0;
    let mut ids = Vec::new();
    for id in normalized {
        if id.is_empty() {
            skipped_empty += 1;
            continue;
        }
        if processed.contains(id) || !seen.insert(id.as_str()) {
            continue;
        }
        ids.push(id.clone());
    }
    Remaining { ids, skipped_empty }
}

/// Consecutive chunks of `size`; the last one may be shorter.
pub fn partition<T>(items: &[T], size: usize) -> Vec<&[T]> {
    items.chunks(size.max(1)).collect()
}

pub struct BatchController<'a> {
    config: &'a Config,
    fetcher: &'a dyn Fetcher,
    clock: &'a dyn Clock,
    store: &'a ProgressStore,
    log: &'a EventLog,
}

impl<'a> BatchController<'a> {
    pub fn new(
        config: &'a Config,
        fetcher: &'a dyn Fetcher,
        clock: &'a dyn Clock,
        store: &'a ProgressStore,
        log: &'a EventLog,
    ) -> Self {
        Self {
            config,
            fetcher,
            clock,
            store,
            log,
        }
    }

    /// Walk every not-yet-attempted identifier. Only a failure to persist
    /// progress aborts the run; request failures are logged and skipped.
    pub fn run<S: AsRef<str>>(&self, raw_ids: &[S]) -> Result<RunReport> {
        let started = Instant::now();
        self.log.log("=== starting run ===");

        let normalized = normalize_all(raw_ids);
        let mut processed = self.store.load().context("loading progress")?;
        self.log
            .log(format!("CNPJs already processed: {}", processed.len()));

        let Remaining { ids, skipped_empty } = remaining(&normalized, &processed);
        if skipped_empty > 0 {
            self.log.warn(format!(
                "⚠️ skipping {} input rows with no digits",
                skipped_empty
            ));
        }
        self.log.log(format!("CNPJs remaining: {}", ids.len()));

        let batches = partition(&ids, self.config.batch_size);
        let mut report = RunReport {
            batches: batches.len(),
            skipped_empty,
            ..RunReport::default()
        };

        for (i, batch) in batches.iter().enumerate() {
            self.log.log(format!(
                "🚀 starting batch {} ({} CNPJs)",
                i + 1,
                batch.len()
            ));

            for cnpj in batch.iter() {
                self.attempt(cnpj, &mut report);

                processed.insert(cnpj.clone());
                self.store
                    .save(&processed)
                    .with_context(|| format!("saving progress after {}", cnpj))?;
                self.clock.sleep(self.config.request_pause());
            }

            if i + 1 < batches.len() {
                self.log.log(format!(
                    "⏸ pausing {}s before the next batch...",
                    self.config.batch_pause_secs
                ));
                self.clock.sleep(self.config.batch_pause());
            }
        }

        self.log.log(format!(
            "run finished: {} attempted, {} succeeded, {} failed in {:.1}s",
            report.attempted,
            report.succeeded,
            report.failed(),
            started.elapsed().as_secs_f64()
        ));
        Ok(report)
    }

    fn attempt(&self, cnpj: &str, report: &mut RunReport) {
        self.log.log(format!("🔍 querying CNPJ: {}", cnpj));
        report.attempted += 1;

        match classify(self.fetcher.fetch(cnpj)) {
            Outcome::Success(record) => {
                self.log.log(format!("✅ success: {}", cnpj));
                report.succeeded += 1;
                report.records.push(record);
            }
            Outcome::Failed(failure) => {
                debug!(cnpj, kind = failure.kind(), "lookup failed");
                let msg = match &failure {
                    Failure::Transport(e) => format!("⚠️ exception for {}: {}", cnpj, e),
                    Failure::Http { status } => format!("❌ HTTP {} for {}", status, cnpj),
                    Failure::Logical { message } => {
                        format!("⚠️ logical error ({}): {}", message, cnpj)
                    }
                    Failure::Malformed(e) => {
                        format!("⚠️ unreadable response for {}: {}", cnpj, e)
                    }
                };
                self.log.warn(msg);
                *report.failures.entry(failure.kind()).or_insert(0) += 1;
            }
        }
    }
}
