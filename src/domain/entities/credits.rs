//! Credit account entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TransactionId;
use crate::domain::serde_utils::null_as_default;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditTransaction {
    pub id: TransactionId,
    /// Signed amount; negative values are spending.
    pub amount: i64,
    #[serde(default)]
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl CreditTransaction {
    #[must_use]
    pub const fn is_debit(&self) -> bool {
        self.amount < 0
    }

    #[must_use]
    pub fn signed_amount(&self) -> String {
        if self.amount > 0 {
            format!("+{}", self.amount)
        } else {
            self.amount.to_string()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditAccount {
    #[serde(default)]
    pub balance: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub transactions: Vec<CreditTransaction>,
}

impl CreditAccount {
    /// Transactions newest first.
    #[must_use]
    pub fn recent_transactions(&self) -> Vec<&CreditTransaction> {
        let mut sorted: Vec<_> = self.transactions.iter().collect();
        sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        sorted
    }

    #[must_use]
    pub fn total_spent(&self) -> i64 {
        self.transactions
            .iter()
            .filter(|t| t.is_debit())
            .map(|t| -t.amount)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_recent_transactions_ordering_and_totals() {
        let now = Utc::now();
        let account = CreditAccount {
            balance: 40,
            transactions: vec![
                CreditTransaction {
                    id: TransactionId(1),
                    amount: 50,
                    reason: "top-up".into(),
                    created_at: now - Duration::days(2),
                },
                CreditTransaction {
                    id: TransactionId(2),
                    amount: -10,
                    reason: "bump listing".into(),
                    created_at: now,
                },
            ],
        };

        let recent = account.recent_transactions();
        assert_eq!(recent[0].id, TransactionId(2));
        assert_eq!(recent[0].signed_amount(), "-10");
        assert_eq!(recent[1].signed_amount(), "+50");
        assert_eq!(account.total_spent(), 10);
    }
}
