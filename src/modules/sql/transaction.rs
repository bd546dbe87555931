//! Transaction state machine
//!
//! Tracks the transaction phase of one SQL module context and guards every
//! statement against the wrong phase. The flag transitions only after the
//! corresponding SQL round-trip succeeded.

use crate::error::{Error, Result};

/// Transaction state of a SQL module context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionState {
    /// No transaction open (initial state)
    #[default]
    Closed,
    /// A transaction is open
    Open,
}

impl TransactionState {
    /// Whether a transaction is currently open
    pub fn is_open(&self) -> bool {
        matches!(self, TransactionState::Open)
    }

    /// Guard: the given operation requires an open transaction
    pub fn ensure_open(&self, operation: &'static str) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(Error::NoTransaction(operation))
        }
    }

    /// Guard: opening a transaction requires none to be open
    pub fn ensure_closed(&self) -> Result<()> {
        if self.is_open() {
            Err(Error::TransactionAlreadyOpen)
        } else {
            Ok(())
        }
    }

    /// Record that `START TRANSACTION` succeeded
    pub fn open(&mut self) {
        *self = TransactionState::Open;
    }

    /// Record that `COMMIT` or `ROLLBACK` succeeded
    pub fn close(&mut self) {
        *self = TransactionState::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_closed() {
        let state = TransactionState::default();
        assert!(!state.is_open());
        assert!(state.ensure_closed().is_ok());
    }

    #[test]
    fn test_guards_outside_transaction() {
        let state = TransactionState::Closed;
        assert!(matches!(
            state.ensure_open("COMMIT"),
            Err(Error::NoTransaction("COMMIT"))
        ));
        assert!(matches!(
            state.ensure_open("UPDATE"),
            Err(Error::NoTransaction("UPDATE"))
        ));
    }

    #[test]
    fn test_guards_inside_transaction() {
        let mut state = TransactionState::default();
        state.open();
        assert!(state.is_open());
        assert!(state.ensure_open("ROLLBACK").is_ok());
        assert!(matches!(
            state.ensure_closed(),
            Err(Error::TransactionAlreadyOpen)
        ));
    }

    #[test]
    fn test_full_cycle() {
        let mut state = TransactionState::default();
        state.ensure_closed().unwrap();
        state.open();
        state.ensure_open("COMMIT").unwrap();
        state.close();
        assert!(state.ensure_closed().is_ok());
    }
}
