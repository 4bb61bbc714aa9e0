use crate::account_gateway::InMemoryAccountGateway;
use crate::models::{Account, AccountId, AccountStatus};
use crate::transfer_engine::TransferEngine;
use anyhow::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    Account,
    Seed,
    Transfer,
}

impl OpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpKind::Account => "account",
            OpKind::Seed => "seed",
            OpKind::Transfer => "transfer",
        }
    }
}

/// One line of the command stream. `account` is the provisioned account
/// for `account` rows, the destination for `seed` rows and the sender for
/// `transfer` rows.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandRow {
    pub op: OpKind,
    pub account: AccountId,
    #[serde(default)]
    pub counterparty: Option<AccountId>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub status: Option<AccountStatus>,
}

impl CommandRow {
    /// Journal line form, the same shape the CSV reader accepts.
    pub fn to_line(&self) -> String {
        format!(
            "{},{},{},{},{},{}\n",
            self.op.as_str(),
            self.account,
            self.counterparty.map(|c| c.to_string()).unwrap_or_default(),
            self.amount.map(|a| a.to_string()).unwrap_or_default(),
            self.key.clone().unwrap_or_default(),
            self.status
                .map(|s| status_str(s).to_string())
                .unwrap_or_default(),
        )
    }

    pub fn parse_line(line: &str) -> Result<CommandRow> {
        let parts: Vec<&str> = line.split(',').map(|s| s.trim()).collect();

        if parts.len() < 2 {
            anyhow::bail!("invalid command line");
        }

        let op = match parts[0] {
            "account" => OpKind::Account,
            "seed" => OpKind::Seed,
            "transfer" => OpKind::Transfer,
            other => anyhow::bail!("unknown op: {}", other),
        };
        let account = parts[1].parse()?;
        let counterparty = match parts.get(2) {
            Some(s) if !s.is_empty() => Some(s.parse()?),
            _ => None,
        };
        let amount = match parts.get(3) {
            Some(s) if !s.is_empty() => Some(s.parse()?),
            _ => None,
        };
        let key = match parts.get(4) {
            Some(s) if !s.is_empty() => Some(s.to_string()),
            _ => None,
        };
        let status = match parts.get(5) {
            Some(&"active") => Some(AccountStatus::Active),
            Some(&"suspended") => Some(AccountStatus::Suspended),
            Some(&"closed") => Some(AccountStatus::Closed),
            _ => None,
        };

        Ok(CommandRow {
            op,
            account,
            counterparty,
            amount,
            key,
            status,
        })
    }
}

fn status_str(status: AccountStatus) -> &'static str {
    match status {
        AccountStatus::Active => "active",
        AccountStatus::Suspended => "suspended",
        AccountStatus::Closed => "closed",
    }
}

/// Balances of every gateway account except the system account, sorted by
/// account id.
pub async fn collect_balances(
    engine: &TransferEngine,
    gateway: &InMemoryAccountGateway,
) -> Vec<(AccountId, Decimal)> {
    let mut accounts = gateway.all().await;
    accounts.sort_by_key(|a| a.id);

    let mut balances = Vec::new();
    for account in accounts {
        if account.id == engine.system_account() {
            continue;
        }
        if let Ok(balance) = engine.balance(account.id).await {
            balances.push((account.id, balance));
        }
    }

    balances
}

/// Drive one command through the engine. Returns true when the command
/// took effect (account provisioned or transfer committed), which is what
/// the server journals; rejected and failed submissions leave nothing the
/// journal needs to remember.
pub async fn apply(
    engine: &TransferEngine,
    gateway: &InMemoryAccountGateway,
    row: CommandRow,
) -> Result<bool> {
    match row.op {
        OpKind::Account => {
            let status = row.status.unwrap_or(AccountStatus::Active);
            let mut account = Account::new(row.account, row.account);
            account.status = status;

            if !gateway.register(account).await {
                // Already known: treat the row as a status change.
                gateway.set_status(row.account, status).await?;
            }
            Ok(true)
        }
        OpKind::Seed => {
            let amount = row.amount.ok_or_else(|| anyhow::anyhow!("seed needs amount"))?;
            let key = row.key.ok_or_else(|| anyhow::anyhow!("seed needs key"))?;

            let outcome = engine
                .seed_initial_funds(engine.system_account(), row.account, amount, &key)
                .await;
            Ok(outcome.is_completed())
        }
        OpKind::Transfer => {
            let to = row
                .counterparty
                .ok_or_else(|| anyhow::anyhow!("transfer needs counterparty"))?;
            let amount = row
                .amount
                .ok_or_else(|| anyhow::anyhow!("transfer needs amount"))?;
            let key = row.key.ok_or_else(|| anyhow::anyhow!("transfer needs key"))?;

            let outcome = engine.submit(row.account, to, amount, &key).await;
            Ok(outcome.is_completed())
        }
    }
}
