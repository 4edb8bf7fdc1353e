//! Work-request shadow: merge on `requestId`, never delete.

use sqlx::PgPool;
use tracing::debug;

use crate::fleet::wire::RequestDto;

/// Upsert a batch of requests. Non-key columns are overwritten; the raw
/// payload is retained verbatim.
pub async fn upsert_requests(pool: &PgPool, requests: &[RequestDto]) -> Result<(), sqlx::Error> {
    for request in requests {
        sqlx::query(
            r#"INSERT INTO dump_trucks.requests (request_id, number, status, payload)
               VALUES ($1, $2, $3, $4)
               ON CONFLICT (request_id) DO UPDATE SET
                 number = EXCLUDED.number,
                 status = EXCLUDED.status,
                 payload = EXCLUDED.payload,
                 updated_at = NOW()"#,
        )
        .bind(request.request_id)
        .bind(request.number)
        .bind(&request.status)
        .bind(&request.raw)
        .execute(pool)
        .await?;
    }
    debug!(count = requests.len(), "request shadow upserted");
    Ok(())
}
