use super::DbClient;
use crate::db::models::{ProviderCallOutcome, ProviderLog};
use crate::Result;
use diesel::{expression_methods::ExpressionMethods, query_dsl::QueryDsl};
use diesel_async::RunQueryDsl;

impl DbClient {
    pub async fn insert_provider_log(
        &self,
        record: &str,
        endpoint_path: &str,
        call_outcome: ProviderCallOutcome,
        log_message: &str,
    ) -> Result<usize> {
        use crate::schema::provider_logs::dsl::*;

        let conn = &mut self.get_db_conn().await?;
        diesel::insert_into(provider_logs)
            .values(ProviderLog {
                id: uuid::Uuid::new_v4().to_string(),
                record_id: record.to_string(),
                endpoint: endpoint_path.to_string(),
                outcome: call_outcome.as_str().to_string(),
                message: log_message.to_string(),
                created_at: chrono::Utc::now().naive_utc(),
            })
            .execute(conn)
            .await
            .map_err(Into::into)
    }

    pub async fn get_logs_for_record(&self, record: &str) -> Result<Vec<ProviderLog>> {
        use crate::schema::provider_logs::dsl::*;

        let conn = &mut self.get_db_conn().await?;
        provider_logs
            .filter(record_id.eq(record))
            .order(created_at.desc())
            .load::<ProviderLog>(conn)
            .await
            .map_err(Into::into)
    }
}
