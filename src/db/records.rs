use super::DbClient;
use crate::db::models::{CountRow, KycRecord, RecordStatus};
use crate::Result;
use diesel::{
    expression_methods::ExpressionMethods,
    query_dsl::QueryDsl,
    sql_query,
    sql_types::{BigInt, Text},
};
use diesel_async::RunQueryDsl;
use tracing::error;

use super::batches::PER_PAGE;

/// DbClient helper functions for the kyc_records table
impl DbClient {
    pub async fn insert_records(&self, payload: &[KycRecord]) -> Result<usize> {
        use crate::schema::kyc_records::dsl::*;

        let conn = &mut self.get_db_conn().await?;
        diesel::insert_into(kyc_records)
            .values(payload)
            .execute(conn)
            .await
            .map_err(|e| {
                error!("Failed to insert records: {}", e);
                e.into()
            })
    }

    pub async fn insert_record(&self, payload: &KycRecord) -> Result<usize> {
        use crate::schema::kyc_records::dsl::*;

        let conn = &mut self.get_db_conn().await?;
        diesel::insert_into(kyc_records)
            .values(payload)
            .execute(conn)
            .await
            .map_err(Into::into)
    }

    pub async fn get_record(&self, record: &str) -> Result<KycRecord> {
        use crate::schema::kyc_records::dsl::*;

        let conn = &mut self.get_db_conn().await?;
        kyc_records
            .filter(id.eq(record))
            .first::<KycRecord>(conn)
            .await
            .map_err(Into::into)
    }

    /// Retrieves a page of a batch's records, optionally filtered by
    /// holder name, PAN or Aadhaar number
    pub async fn get_records_page(
        &self,
        batch: &str,
        page: i64,
        search: Option<&str>,
    ) -> Result<(Vec<KycRecord>, i64)> {
        let page = page.max(1);
        let offset = (page - 1) * PER_PAGE;

        let conn = &mut self.get_db_conn().await?;

        match search.map(str::trim).filter(|term| !term.is_empty()) {
            Some(term) => {
                let pattern = format!("%{term}%");
                let rows = sql_query(
                    r#"
                    SELECT * FROM kyc_records
                    WHERE batch_id = $1
                      AND (holder_name ILIKE $2 OR pan_number ILIKE $2 OR aadhaar_number ILIKE $2)
                    ORDER BY row_index ASC
                    LIMIT $3 OFFSET $4
                    "#,
                )
                .bind::<Text, _>(batch)
                .bind::<Text, _>(&pattern)
                .bind::<BigInt, _>(PER_PAGE)
                .bind::<BigInt, _>(offset)
                .load::<KycRecord>(conn)
                .await?;

                let total = sql_query(
                    r#"
                    SELECT COUNT(*) AS count FROM kyc_records
                    WHERE batch_id = $1
                      AND (holder_name ILIKE $2 OR pan_number ILIKE $2 OR aadhaar_number ILIKE $2)
                    "#,
                )
                .bind::<Text, _>(batch)
                .bind::<Text, _>(&pattern)
                .get_result::<CountRow>(conn)
                .await?
                .count;

                Ok((rows, total))
            }
            None => {
                use crate::schema::kyc_records::dsl::*;

                let rows = kyc_records
                    .filter(batch_id.eq(batch))
                    .order(row_index.asc())
                    .limit(PER_PAGE)
                    .offset(offset)
                    .load::<KycRecord>(conn)
                    .await?;

                let total = kyc_records
                    .filter(batch_id.eq(batch))
                    .count()
                    .get_result::<i64>(conn)
                    .await?;

                Ok((rows, total))
            }
        }
    }

    /// Atomically claims a batch's verifiable records for a verification run.
    ///
    /// Only `pending` and `failed` records are claimable; `verified` and
    /// `invalid` are terminal. Claimed records move to `processing` with
    /// their remarks cleared, and the previous rows are returned.
    pub async fn claim_records_for_verification(
        &self,
        batch: &str,
        record_ids: Option<Vec<String>>,
    ) -> Result<Vec<KycRecord>> {
        use crate::schema::kyc_records::dsl::*;

        let conn = &mut self.get_db_conn().await?;
        let claimable = vec![
            RecordStatus::Pending.as_str(),
            RecordStatus::Failed.as_str(),
        ];

        let claimed = match record_ids {
            Some(ids) => {
                diesel::update(
                    kyc_records
                        .filter(batch_id.eq(batch))
                        .filter(status.eq_any(claimable))
                        .filter(id.eq_any(ids)),
                )
                .set((
                    status.eq(RecordStatus::Processing.as_str()),
                    remarks.eq(None::<String>),
                ))
                .get_results::<KycRecord>(conn)
                .await?
            }
            None => {
                diesel::update(
                    kyc_records
                        .filter(batch_id.eq(batch))
                        .filter(status.eq_any(claimable)),
                )
                .set((
                    status.eq(RecordStatus::Processing.as_str()),
                    remarks.eq(None::<String>),
                ))
                .get_results::<KycRecord>(conn)
                .await?
            }
        };

        Ok(claimed)
    }

    /// Writes the outcome of one verification attempt
    pub async fn update_record_outcome(
        &self,
        record: &str,
        new_status: RecordStatus,
        remark: Option<String>,
    ) -> Result<usize> {
        use crate::schema::kyc_records::dsl::*;

        let conn = &mut self.get_db_conn().await?;
        diesel::update(kyc_records)
            .filter(id.eq(record))
            .set((
                status.eq(String::from(new_status)),
                remarks.eq(remark),
                verified_at.eq(Some(chrono::Utc::now().naive_utc())),
            ))
            .execute(conn)
            .await
            .map_err(|e| {
                error!("Failed to update record outcome: {}", e);
                e.into()
            })
    }
}
