//! Expire command.

use anyhow::Result;
use time::{Duration, OffsetDateTime};
use towermap_store::Store;

/// Execute the expire command.
pub fn cmd_expire(store: &Store, older_than_secs: u64) -> Result<()> {
    let age = Duration::seconds(i64::try_from(older_than_secs).unwrap_or(i64::MAX));
    let cutoff = OffsetDateTime::now_utc()
        .checked_sub(age)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH);

    let expired = store.expire_staged(cutoff)?;
    println!("Expired {} staged locations", expired);
    Ok(())
}
