//! Job Table
//!
//! Registry of every process the shell has spawned. Active records live
//! in a map keyed by pid; once reaped a record moves to a retired list
//! capped by count, so the table never grows without bound.

use crate::models::{ProcessEvent, ProcessEventKind, ProcessRecord};
use nix::unistd::Pid;
use std::collections::{HashMap, VecDeque};

/// Process registry shared by the orchestrator and the reaper
#[derive(Debug)]
pub struct JobTable {
    /// Running or stopped processes
    live: HashMap<Pid, ProcessRecord>,
    /// Reaped processes, oldest first
    retired: VecDeque<ProcessRecord>,
    retired_capacity: usize,
    /// Last background job number handed out
    last_job_id: usize,
}

impl JobTable {
    pub fn new(retired_capacity: usize) -> Self {
        Self {
            live: HashMap::new(),
            retired: VecDeque::new(),
            retired_capacity,
            last_job_id: 0,
        }
    }

    /// Register a freshly spawned process
    pub fn insert(&mut self, record: ProcessRecord) {
        let pid = record.pid;
        debug!(pid = pid.as_raw(), pgid = record.pgid.as_raw(), "registering {}", record.display_name);
        if let Some(stale) = self.live.insert(pid, record) {
            // The kernel only reuses a pid after it was waited on, so a
            // stale entry means the wait happened outside the table.
            warn!(pid = pid.as_raw(), "replacing stale record for {}", stale.display_name);
            self.retire(stale);
        }
    }

    /// Hand out the next background job number, starting at 1
    pub fn next_job_id(&mut self) -> usize {
        self.last_job_id += 1;
        self.last_job_id
    }

    /// Apply a state change reported by `waitpid`.
    ///
    /// Returns the user-facing event, or `None` when no active record
    /// exists for `pid` or the change would move the record backwards.
    pub fn record_event(&mut self, pid: Pid, kind: ProcessEventKind) -> Option<ProcessEvent> {
        let record = self.live.get_mut(&pid)?;
        let name = record.display_name.clone();

        match kind {
            ProcessEventKind::Stopped(_) => {
                if !record.mark_stopped() {
                    return None;
                }
            }
            ProcessEventKind::Exited(_) | ProcessEventKind::Signaled(_) => {
                let event = ProcessEvent::new(pid, name.clone(), kind);
                let exit = event.exit()?;
                record.mark_reaped(exit);
                if let Some(done) = self.live.remove(&pid) {
                    self.retire(done);
                }
                return Some(event);
            }
        }

        Some(ProcessEvent::new(pid, name, kind))
    }

    fn retire(&mut self, record: ProcessRecord) {
        if self.retired_capacity == 0 {
            return;
        }
        while self.retired.len() >= self.retired_capacity {
            self.retired.pop_front();
        }
        self.retired.push_back(record);
    }

    /// Look up a record, live first, then the most recent retired one
    pub fn get(&self, pid: Pid) -> Option<&ProcessRecord> {
        self.live
            .get(&pid)
            .or_else(|| self.retired.iter().rev().find(|r| r.pid == pid))
    }

    /// Whether `pid` has a running or stopped record
    pub fn is_active(&self, pid: Pid) -> bool {
        self.live.contains_key(&pid)
    }

    /// Running and stopped records, ordered by pid
    pub fn active(&self) -> Vec<&ProcessRecord> {
        let mut records: Vec<&ProcessRecord> = self.live.values().collect();
        records.sort_by_key(|r| r.pid.as_raw());
        records
    }

    pub fn active_count(&self) -> usize {
        self.live.len()
    }

    /// Reaped records still kept for reporting, oldest first
    pub fn retired(&self) -> impl Iterator<Item = &ProcessRecord> {
        self.retired.iter()
    }

    /// Every known record belonging to process group `pgid`
    pub fn records_in_group(&self, pgid: Pid) -> Vec<&ProcessRecord> {
        let mut records: Vec<&ProcessRecord> = self
            .live
            .values()
            .chain(self.retired.iter())
            .filter(|r| r.pgid == pgid)
            .collect();
        records.sort_by_key(|r| r.pid.as_raw());
        records.dedup_by_key(|r| r.pid);
        records
    }
}

impl Default for JobTable {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_RETIRED_CAPACITY)
    }
}
