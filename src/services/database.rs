use std::future::Future;
use std::sync::Arc;
use bb8::Pool;
use bb8_tiberius::ConnectionManager;
use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive}
};
use serde::{de::DeserializeOwned, Serialize};
use serenity::prelude::TypeMapKey;
use tiberius::{AuthMethod, Config};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::Error;

/// Who a stored setting belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Global = 0,
    Guild = 1,
    User = 2
}

impl Scope {
    fn as_db(self) -> u8 {
        self as u8
    }
}

#[derive(Debug)]
pub struct Database {
    pub(crate) pool: Pool<ConnectionManager>
}

impl TypeMapKey for Database {
    type Value = Arc<Database>;
}

pub(crate) fn to_decimal(id: u64) -> Result<Decimal, Error> {
    Decimal::from_u64(id).ok_or_else(|| format!("Could not store id {id}").into())
}

/// Runs a read-modify-write of a settings row while holding `lock`.
/// Every writer of the same row must go through the same lock.
pub async fn locked<T, F>(lock: &Mutex<()>, update: F) -> T
where
    F: Future<Output = T>
{
    let _guard = lock.lock().await;
    update.await
}

impl Database {
    pub async fn new(ip: &str, port: u16, user: &str, pass: &str) -> Result<Self, Error> {
        let mut config = Config::new();

        config.host(ip);
        config.port(port);
        config.authentication(AuthMethod::sql_server(user, pass));
        config.trust_cert();

        let manager = ConnectionManager::new(config);
        let pool = Pool::builder().max_size(8).build(manager).await?;

        info!("Connected to SQL Server at {}:{}", ip, port);

        Ok(Database { pool })
    }

    /// Reads a setting, falling back to the type's default when nothing was stored yet.
    pub async fn get_setting<T: DeserializeOwned + Default>(&self, scope: Scope, owner: u64, name: &str) -> Result<T, Error> {
        let mut conn = self.pool.get().await?;
        let owner = to_decimal(owner)?;
        let res = conn.query(
            "SELECT value FROM [Config].[Setting] WHERE scope = @P1 AND owner_id = @P2 AND name = @P3;",
            &[&scope.as_db(), &owner, &name])
            .await?
            .into_row()
            .await?;

        let value: Option<&str> = res.as_ref().and_then(|row| row.get(0));

        match value {
            Some(json) => match serde_json::from_str(json) {
                Ok(parsed) => Ok(parsed),
                Err(ex) => {
                    warn!("Setting {} for {} is unreadable, using defaults: {}", name, owner, ex);
                    Ok(T::default())
                }
            },
            None => Ok(T::default())
        }
    }

    pub async fn set_setting<T: Serialize + Sync>(&self, scope: Scope, owner: u64, name: &str, value: &T) -> Result<(), Error> {
        let mut conn = self.pool.get().await?;
        let owner = to_decimal(owner)?;
        let json = serde_json::to_string(value)?;

        conn.execute(
            "UPDATE [Config].[Setting] SET value = @P4 WHERE scope = @P1 AND owner_id = @P2 AND name = @P3;
            IF @@ROWCOUNT = 0
                INSERT INTO [Config].[Setting] (scope, owner_id, name, value) VALUES (@P1, @P2, @P3, @P4);",
            &[&scope.as_db(), &owner, &name, &json.as_str()])
            .await?;

        Ok(())
    }

    /// Returns whether anything was removed.
    pub async fn clear_setting(&self, scope: Scope, owner: u64, name: &str) -> Result<bool, Error> {
        let mut conn = self.pool.get().await?;
        let owner = to_decimal(owner)?;
        let res = conn.execute(
            "DELETE FROM [Config].[Setting] WHERE scope = @P1 AND owner_id = @P2 AND name = @P3;",
            &[&scope.as_db(), &owner, &name])
            .await?;

        Ok(res.total() > 0)
    }

    /// Every owner in a scope that has a value stored under this name.
    pub async fn owners_with_setting(&self, scope: Scope, name: &str) -> Result<Vec<u64>, Error> {
        let mut conn = self.pool.get().await?;
        let rows = conn.query(
            "SELECT owner_id FROM [Config].[Setting] WHERE scope = @P1 AND name = @P2;",
            &[&scope.as_db(), &name])
            .await?
            .into_first_result()
            .await?;

        Ok(rows.iter()
            .filter_map(|row| row.get::<Decimal, _>(0))
            .filter_map(|id| id.to_u64())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Stands in for a settings row: read it, yield mid-update, write the whole thing back.
    async fn append(row: Arc<std::sync::Mutex<Vec<u64>>>, value: u64) {
        let mut copy = row.lock().unwrap().clone();
        tokio::time::sleep(Duration::from_millis(10)).await;
        copy.push(value);
        *row.lock().unwrap() = copy;
    }

    #[tokio::test]
    async fn locked_updates_do_not_lose_writes() {
        let lock = Arc::new(Mutex::new(()));
        let row = Arc::new(std::sync::Mutex::new(vec![1]));

        let tasks = (2..=5).map(|value| {
            let lock = lock.clone();
            let row = row.clone();
            tokio::spawn(async move { locked(&lock, append(row, value)).await })
        }).collect::<Vec<_>>();

        for task in tasks {
            task.await.unwrap();
        }

        let mut stored = row.lock().unwrap().clone();
        stored.sort();
        assert_eq!(stored, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn scopes_match_the_table() {
        assert_eq!(Scope::Global.as_db(), 0);
        assert_eq!(Scope::Guild.as_db(), 1);
        assert_eq!(Scope::User.as_db(), 2);
    }
}
