use crate::errors::TransferError;
use crate::models::{Account, AccountId, AccountStatus};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Read-only account lookup. Account ownership and lifecycle are managed
/// outside the engine; the engine only asks whether an account exists and
/// what state it is in.
#[async_trait]
pub trait AccountGateway: Send + Sync {
    async fn lookup(&self, account: AccountId) -> Option<Account>;
}

/// In-memory gateway used by the CLI, the server and tests. Grows a small
/// provisioning surface on the concrete type so front-ends can stand
/// accounts up; the engine itself never sees anything beyond `lookup`.
pub struct InMemoryAccountGateway {
    accounts: RwLock<HashMap<AccountId, Account>>,
}

impl InMemoryAccountGateway {
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
        }
    }

    /// Register an account; returns false if the id was already taken.
    pub async fn register(&self, account: Account) -> bool {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&account.id) {
            return false;
        }
        accounts.insert(account.id, account);
        true
    }

    /// Change an account's status. Closed accounts are immutable.
    pub async fn set_status(
        &self,
        id: AccountId,
        status: AccountStatus,
    ) -> Result<(), TransferError> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(&id)
            .ok_or(TransferError::AccountNotFound(id))?;
        if account.status == AccountStatus::Closed {
            return Err(TransferError::AccountClosed(id));
        }
        account.status = status;
        Ok(())
    }

    pub async fn all(&self) -> Vec<Account> {
        self.accounts.read().await.values().cloned().collect()
    }
}

impl Default for InMemoryAccountGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountGateway for InMemoryAccountGateway {
    async fn lookup(&self, account: AccountId) -> Option<Account> {
        self.accounts.read().await.get(&account).cloned()
    }
}
