//! Savings and loans.
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::economy::loan_capacity;
use crate::empire::Empire;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "amount", rename_all = "snake_case")]
pub enum BankOp {
    Deposit(i64),
    Withdraw(i64),
    TakeLoan(i64),
    Repay(i64),
}

impl BankOp {
    #[must_use]
    pub const fn amount(self) -> i64 {
        match self {
            Self::Deposit(amount)
            | Self::Withdraw(amount)
            | Self::TakeLoan(amount)
            | Self::Repay(amount) => amount,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BankError {
    #[error("bank amounts must be positive (got {0})")]
    NonPositiveAmount(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankResult {
    pub op: BankOp,
    /// Amount actually moved; may be below the request
    pub applied: i64,
    pub gold: i64,
    pub bank: i64,
    pub loan: i64,
}

/// Apply one bank operation. Requests beyond what the empire can cover are
/// filled partially.
///
/// # Errors
///
/// Returns `BankError::NonPositiveAmount` for zero or negative amounts.
pub fn transact(empire: &mut Empire, op: BankOp) -> Result<BankResult, BankError> {
    let amount = op.amount();
    if amount <= 0 {
        return Err(BankError::NonPositiveAmount(amount));
    }
    let applied = match op {
        BankOp::Deposit(_) => {
            let moved = amount.min(empire.resources.gold.max(0));
            empire.resources.gold -= moved;
            empire.bank += moved;
            moved
        }
        BankOp::Withdraw(_) => {
            let moved = amount.min(empire.bank.max(0));
            empire.bank -= moved;
            empire.resources.gold += moved;
            moved
        }
        BankOp::TakeLoan(_) => {
            let headroom = (loan_capacity(empire) - empire.loan).max(0);
            let moved = amount.min(headroom);
            empire.loan += moved;
            empire.resources.gold += moved;
            moved
        }
        BankOp::Repay(_) => {
            let moved = amount.min(empire.loan).min(empire.resources.gold.max(0));
            empire.loan -= moved;
            empire.resources.gold -= moved;
            moved
        }
    };
    empire.recompute_networth();
    debug!("empire {} bank {:?}: applied {}", empire.id, op, applied);
    Ok(BankResult {
        op,
        applied,
        gold: empire.resources.gold,
        bank: empire.bank,
        loan: empire.loan,
    })
}
