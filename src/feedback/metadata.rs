//! Metadata reconciliation
//!
//! Feedback submissions may carry fresh metadata, a partial overlay, or
//! nothing at all. The merge rule keeps previously recorded purchase
//! context alive: an empty payload never wipes stored keys, and on
//! collision the incoming value wins.

use crate::types::InteractionMetadata;

/// Shallow-merge incoming metadata over existing metadata
///
/// If incoming has at least one populated key, the result starts from
/// existing and overlays incoming key-by-key (incoming wins). If
/// incoming is empty, the result is existing, unchanged.
pub fn merge(existing: &InteractionMetadata, incoming: &InteractionMetadata) -> InteractionMetadata {
    if incoming.is_empty() {
        return existing.clone();
    }

    InteractionMetadata {
        purchase_context: incoming
            .purchase_context
            .clone()
            .or_else(|| existing.purchase_context.clone()),
        wizard_responses: incoming
            .wizard_responses
            .clone()
            .or_else(|| existing.wizard_responses.clone()),
        extra: {
            let mut merged = existing.extra.clone();
            for (key, value) in &incoming.extra {
                merged.insert(key.clone(), value.clone());
            }
            merged
        },
    }
}
