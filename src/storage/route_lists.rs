//! Route-list shadow: merge on `plId`, never delete.

use sqlx::PgPool;
use tracing::debug;

use crate::pipeline::route_lists::ParsedRouteList;

/// Upsert a batch of parsed route lists. Non-key columns are overwritten.
pub async fn upsert_route_lists(
    pool: &PgPool,
    lists: &[ParsedRouteList],
) -> Result<(), sqlx::Error> {
    for list in lists {
        sqlx::query(
            r#"INSERT INTO dump_trucks.route_lists
                 (pl_id, ts_number, status, date_out, planned_start, planned_end)
               VALUES ($1, $2, $3, $4, $5, $6)
               ON CONFLICT (pl_id) DO UPDATE SET
                 ts_number = EXCLUDED.ts_number,
                 status = EXCLUDED.status,
                 date_out = EXCLUDED.date_out,
                 planned_start = EXCLUDED.planned_start,
                 planned_end = EXCLUDED.planned_end,
                 updated_at = NOW()"#,
        )
        .bind(list.pl_id)
        .bind(&list.ts_number)
        .bind(&list.status)
        .bind(list.date_out)
        .bind(list.planned_start)
        .bind(list.planned_end)
        .execute(pool)
        .await?;
    }
    debug!(count = lists.len(), "route-list shadow upserted");
    Ok(())
}
