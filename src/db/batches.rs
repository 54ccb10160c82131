use super::DbClient;
use crate::db::models::{Batch, BatchStatus, BatchStatusCount, CountRow};
use crate::Result;
use diesel::{
    expression_methods::ExpressionMethods,
    query_dsl::QueryDsl,
    sql_query,
    sql_types::{Array, BigInt, Text},
};
use diesel_async::RunQueryDsl;
use tracing::{error, info};

pub const PER_PAGE: i64 = 20;

/// DbClient helper functions for the batches table
impl DbClient {
    pub async fn insert_batch(&self, payload: &Batch) -> Result<usize> {
        use crate::schema::batches::dsl::*;

        let conn = &mut self.get_db_conn().await?;
        diesel::insert_into(batches)
            .values(payload)
            .execute(conn)
            .await
            .map_err(|e| {
                error!("Failed to insert batch: {}", e);
                e.into()
            })
    }

    pub async fn get_batch(&self, batch: &str) -> Result<Batch> {
        use crate::schema::batches::dsl::*;

        let conn = &mut self.get_db_conn().await?;
        batches
            .filter(id.eq(batch))
            .first::<Batch>(conn)
            .await
            .map_err(Into::into)
    }

    /// Retrieves a page of batches, newest first, optionally filtered by file name
    pub async fn get_batches_page(
        &self,
        page: i64,
        search: Option<&str>,
    ) -> Result<(Vec<Batch>, i64)> {
        let page = page.max(1);
        let offset = (page - 1) * PER_PAGE;

        let conn = &mut self.get_db_conn().await?;

        match search.map(str::trim).filter(|term| !term.is_empty()) {
            Some(term) => {
                let pattern = format!("%{term}%");
                let rows = sql_query(
                    r#"
                    SELECT * FROM batches
                    WHERE file_name ILIKE $1
                    ORDER BY created_at DESC
                    LIMIT $2 OFFSET $3
                    "#,
                )
                .bind::<Text, _>(&pattern)
                .bind::<BigInt, _>(PER_PAGE)
                .bind::<BigInt, _>(offset)
                .load::<Batch>(conn)
                .await?;

                let total = sql_query("SELECT COUNT(*) AS count FROM batches WHERE file_name ILIKE $1")
                    .bind::<Text, _>(&pattern)
                    .get_result::<CountRow>(conn)
                    .await?
                    .count;

                Ok((rows, total))
            }
            None => {
                use crate::schema::batches::dsl::*;

                let rows = batches
                    .order(created_at.desc())
                    .limit(PER_PAGE)
                    .offset(offset)
                    .load::<Batch>(conn)
                    .await?;

                let total = batches.count().get_result::<i64>(conn).await?;

                Ok((rows, total))
            }
        }
    }

    /// Per-status record counts for a set of batches in a single aggregation query
    pub async fn get_batch_status_counts(
        &self,
        batch_ids: &[String],
    ) -> Result<Vec<BatchStatusCount>> {
        if batch_ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = &mut self.get_db_conn().await?;
        sql_query(
            r#"
            SELECT batch_id, status, COUNT(*) AS count
            FROM kyc_records
            WHERE batch_id = ANY($1)
            GROUP BY batch_id, status
            "#,
        )
        .bind::<Array<Text>, _>(batch_ids)
        .load::<BatchStatusCount>(conn)
        .await
        .map_err(|e| {
            error!("Failed to aggregate batch status counts: {}", e);
            e.into()
        })
    }

    pub async fn update_batch_status(&self, batch: &str, new_status: BatchStatus) -> Result<usize> {
        use crate::schema::batches::dsl::*;

        let conn = &mut self.get_db_conn().await?;
        diesel::update(batches)
            .filter(id.eq(batch))
            .set(status.eq(String::from(new_status)))
            .execute(conn)
            .await
            .map_err(Into::into)
    }

    /// Recomputes one batch's aggregate status from its record counts
    pub async fn refresh_batch_status(&self, batch: &str) -> Result<usize> {
        let conn = &mut self.get_db_conn().await?;

        sql_query(
            r#"
            UPDATE batches
            SET status = CASE
                WHEN EXISTS (
                    SELECT 1 FROM kyc_records r
                    WHERE r.batch_id = batches.id
                      AND r.status IN ('pending', 'processing')
                ) THEN 'processing'
                ELSE 'completed'
            END
            WHERE id = $1
            "#,
        )
        .bind::<Text, _>(batch)
        .execute(conn)
        .await
        .map_err(|e| {
            error!("Failed to refresh batch status: {}", e);
            e.into()
        })
    }

    /// Recomputes the aggregate status of every batch whose derived status drifted
    pub async fn refresh_batch_statuses(&self) -> Result<usize> {
        let conn = &mut self.get_db_conn().await?;

        sql_query(
            r#"
            UPDATE batches b
            SET status = sub.next_status
            FROM (
                SELECT b2.id,
                       CASE WHEN EXISTS (
                           SELECT 1 FROM kyc_records r
                           WHERE r.batch_id = b2.id
                             AND r.status IN ('pending', 'processing')
                       ) THEN 'processing' ELSE 'completed' END AS next_status
                FROM batches b2
            ) sub
            WHERE sub.id = b.id AND b.status <> sub.next_status
            "#,
        )
        .execute(conn)
        .await
        .map_err(|e| {
            error!("Failed to refresh batch statuses: {}", e);
            e.into()
        })
    }

    /// Deletes a batch with its records and provider log trail
    pub async fn delete_batch(&self, batch: &str) -> Result<usize> {
        use crate::schema::{batches, kyc_records, provider_logs};

        let conn = &mut self.get_db_conn().await?;

        let record_ids = kyc_records::table
            .filter(kyc_records::batch_id.eq(batch))
            .select(kyc_records::id);

        diesel::delete(provider_logs::table.filter(provider_logs::record_id.eq_any(record_ids)))
            .execute(conn)
            .await?;

        let removed_records =
            diesel::delete(kyc_records::table.filter(kyc_records::batch_id.eq(batch)))
                .execute(conn)
                .await?;

        diesel::delete(batches::table.filter(batches::id.eq(batch)))
            .execute(conn)
            .await?;

        info!("Deleted batch {} with {} records", batch, removed_records);
        Ok(removed_records)
    }
}
