//! Orphan cleanup after a config upsert detaches provider methods
//!
//! Runs inside the caller's transaction. Detached provider methods take
//! their transaction configs and field rows with them; scoped config tables
//! (credentials, bank accounts, STP rules, restrictions, provider fields)
//! are purged of any row pinned to a country-authority no longer bound to
//! the provider. A country-authority that still has at least one other
//! bound method keeps its rows.

use crate::domain::CountryAuthority;
use crate::error::Result;
use crate::repository::ConfigTx;
use tracing::debug;
use uuid::Uuid;

pub struct ConfigUpsertCleaner;

impl ConfigUpsertCleaner {
    pub async fn clean(
        tx: &mut dyn ConfigTx,
        provider_id: Uuid,
        detached_provider_methods: &[Uuid],
        surviving: &[CountryAuthority],
    ) -> Result<()> {
        let transaction_configs = tx
            .delete_transaction_configs(detached_provider_methods)
            .await?;
        let method_fields = tx.delete_method_fields(detached_provider_methods).await?;
        let provider_methods = tx.delete_provider_methods(detached_provider_methods).await?;

        debug!(
            %provider_id,
            provider_methods,
            transaction_configs,
            method_fields,
            "Detached provider methods with owned rows"
        );

        let credentials = tx.delete_credentials_not_bound(provider_id, surviving).await?;
        let bank_accounts = tx
            .delete_bank_accounts_not_bound(provider_id, surviving)
            .await?;
        let stp_rules = tx.delete_stp_rules_not_bound(provider_id, surviving).await?;
        let restrictions = tx
            .delete_restrictions_not_bound(provider_id, surviving)
            .await?;
        let provider_fields = tx
            .delete_provider_fields_not_bound(provider_id, surviving)
            .await?;

        if credentials + bank_accounts + stp_rules + restrictions + provider_fields > 0 {
            debug!(
                %provider_id,
                credentials,
                bank_accounts,
                stp_rules,
                restrictions,
                provider_fields,
                "Removed config rows no longer bound to a country-authority"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockConfigTx;

    #[tokio::test]
    async fn test_clean_cascades_in_order() {
        let provider_id = Uuid::new_v4();
        let detached = vec![Uuid::new_v4(), Uuid::new_v4()];
        let surviving = vec![CountryAuthority::new("GM", Some("CY"))];

        let mut tx = MockConfigTx::new();
        tx.expect_delete_transaction_configs()
            .withf({
                let detached = detached.clone();
                move |ids| ids == detached
            })
            .returning(|_| Ok(3));
        tx.expect_delete_method_fields().returning(|_| Ok(5));
        tx.expect_delete_provider_methods().returning(|_| Ok(2));
        tx.expect_delete_credentials_not_bound()
            .withf({
                let surviving = surviving.clone();
                move |id, cas| *id == provider_id && cas == surviving
            })
            .returning(|_, _| Ok(1));
        tx.expect_delete_bank_accounts_not_bound()
            .returning(|_, _| Ok(0));
        tx.expect_delete_stp_rules_not_bound()
            .returning(|_, _| Ok(0));
        tx.expect_delete_restrictions_not_bound()
            .returning(|_, _| Ok(1));
        tx.expect_delete_provider_fields_not_bound()
            .returning(|_, _| Ok(0));

        ConfigUpsertCleaner::clean(&mut tx, provider_id, &detached, &surviving)
            .await
            .unwrap();
    }
}
