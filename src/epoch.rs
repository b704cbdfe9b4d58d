//! Grouping parsed records by training epoch.
//!
//! Navigation UIs list stages per epoch and jump back to the underlying
//! record, so each grouped stage keeps its zero-based index in the original
//! [`ParsedLog`]. Grouping is a pure single pass: groups are created on
//! first sight of an epoch number and listed in encounter order, never
//! sorted.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::record::{ParsedLog, StageRecord};

/// A stage together with its position in the original parsed log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedStage {
    /// Zero-based index into `ParsedLog::stages`.
    pub index: usize,
    /// The record itself.
    pub record: StageRecord,
}

/// All stages of one epoch, in original log order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochGroup {
    /// Epoch number.
    pub number: u32,
    /// Stages of this epoch, ordered as in the parsed log.
    pub stages: Vec<IndexedStage>,
}

/// Partition a parsed log into per-epoch groups.
///
/// Idempotent: grouping the same log twice yields structurally identical
/// output, and every `index` resolves back to the same record in the input.
pub fn group_by_epoch(log: &ParsedLog) -> Vec<EpochGroup> {
    let mut groups: Vec<EpochGroup> = Vec::new();
    let mut positions: HashMap<u32, usize> = HashMap::new();

    for (index, record) in log.iter().enumerate() {
        let slot = *positions.entry(record.epoch).or_insert_with(|| {
            groups.push(EpochGroup {
                number: record.epoch,
                stages: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].stages.push(IndexedStage {
            index,
            record: record.clone(),
        });
    }

    groups
}
