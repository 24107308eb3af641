//! Error types for pog-core.

use crate::address::Address;

/// Errors from alias normalization and grammar validation.
#[derive(Debug, thiserror::Error)]
pub enum AliasError {
    #[error("alias exceeds maximum length of {max} characters")]
    TooLong { max: usize },

    #[error("alias is empty after normalization")]
    Empty,

    #[error("alias fails grammar validation: {0}")]
    Grammar(String),

    #[error("alias is blacklisted")]
    Blacklisted,
}

/// Errors from referral graph construction and mutation.
#[derive(Debug, thiserror::Error)]
pub enum ReferralError {
    #[error("referral for {0:?} has no known parent in the store")]
    OrphanReferral(Address),

    #[error("alias already claimed by another address")]
    DuplicateAlias,

    #[error("referral address is null/genesis and cannot be re-inserted")]
    NullAddress,

    #[error("referral pubkey marker is invalid")]
    InvalidPubkey,

    #[error("referral signature is missing")]
    MissingSignature,

    #[error(transparent)]
    Alias(#[from] AliasError),
}

/// Errors surfaced while ordering a candidate block's referrals into a
/// parent-before-child sequence.
#[derive(Debug, thiserror::Error)]
pub enum OrderingError {
    #[error("referral set contains a cycle reachable from {0:?}")]
    Cycle(Address),

    #[error("referral for {0:?} references a parent absent from both the store and this batch")]
    UnresolvedParent(Address),
}

/// Errors from ANV propagation, the lottery reservoir, CGS, and sampling.
#[derive(Debug, thiserror::Error)]
pub enum InvariantError {
    #[error("ANV would go negative for {0:?}")]
    NegativeAnv(Address),

    #[error("undo stack is empty; nothing to disconnect")]
    EmptyUndoStack,

    #[error("lottery reservoir is empty; no entrant to draw")]
    EmptyReservoir,

    #[error("distribution is empty; cannot sample")]
    EmptyDistribution,

    #[error("invite pool sampling exhausted retries without a candidate")]
    PoolExhausted,

    #[error("confirmation index is inconsistent for {0:?}")]
    ConfirmationIndex(Address),

    #[error("referral graph cycle detected at or beyond {0:?}")]
    CycleDetected(Address),
}

/// Top-level error type for pog-core.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error(transparent)]
    Referral(#[from] ReferralError),

    #[error(transparent)]
    Alias(#[from] AliasError),

    #[error(transparent)]
    Ordering(#[from] OrderingError),

    #[error(transparent)]
    Invariant(#[from] InvariantError),

    #[error("block referrals are not validly ordered: {0}")]
    InvalidBlockOrdering(String),

    #[error("storage invariant violated: {0}")]
    StorageError(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
