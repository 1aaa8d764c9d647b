use bazaar_core::{DbConnection, MarketError, MarketResult};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Nullable};
use diesel_async::RunQueryDsl;
use serde::Serialize;

use crate::ad_view::{ad_view_columns, AdView, AdViewRow, AD_VIEW_SOURCE};

/// A move through a collection's ads, oldest first.
///
/// Positions are 1-based ranks over `(created_date, id)` and are recomputed on
/// every request, so they always reflect the live set of ads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseStep {
    First,
    /// The ad right after the given position.
    Next(i64),
    /// The ad right before the given position.
    Previous(i64),
}

impl BrowseStep {
    fn bound(&self) -> i64 {
        match self {
            BrowseStep::First => 0,
            BrowseStep::Next(position) | BrowseStep::Previous(position) => *position,
        }
    }

    fn comparison(&self) -> &'static str {
        match self {
            BrowseStep::First | BrowseStep::Next(_) => ">",
            BrowseStep::Previous(_) => "<",
        }
    }

    fn direction(&self) -> &'static str {
        match self {
            BrowseStep::First | BrowseStep::Next(_) => "ASC",
            BrowseStep::Previous(_) => "DESC",
        }
    }

    fn exhausted_message(&self) -> &'static str {
        match self {
            BrowseStep::First => "No Ads found in this collection",
            BrowseStep::Next(_) => "No next Ads found in this collection",
            BrowseStep::Previous(_) => "No previous Ads found in this collection",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrowsedAd {
    /// Rank of this ad inside its collection, fed back into next/previous.
    pub position: i64,
    #[serde(flatten)]
    pub view: AdView,
}

#[derive(Debug, QueryableByName)]
struct BrowsedAdRow {
    #[diesel(sql_type = BigInt, column_name = row_num)]
    position: i64,
    #[diesel(embed)]
    view: AdViewRow,
}

/// `$1` viewer, `$2` collection, `$3` the position bound.
pub(crate) fn browse_sql(step: BrowseStep) -> String {
    format!(
        "WITH ranked AS (
            SELECT ROW_NUMBER() OVER (ORDER BY a.created_date ASC, a.id ASC) AS row_num,
                {columns}
            {source}
            WHERE a.collection_id = $2
        )
        SELECT * FROM ranked
        WHERE row_num {cmp} $3
        ORDER BY row_num {dir}
        LIMIT 1",
        columns = ad_view_columns(),
        source = AD_VIEW_SOURCE,
        cmp = step.comparison(),
        dir = step.direction(),
    )
}

pub(crate) async fn browse(
    conn: &mut DbConnection,
    collection_id: i64,
    step: BrowseStep,
    viewer_id: Option<i64>,
) -> MarketResult<BrowsedAd> {
    if step.bound() < 0 {
        return Err(MarketError::validation("Position must not be negative"));
    }

    let row: Option<BrowsedAdRow> = diesel::sql_query(browse_sql(step))
        .bind::<Nullable<BigInt>, _>(viewer_id)
        .bind::<BigInt, _>(collection_id)
        .bind::<BigInt, _>(step.bound())
        .get_result(conn)
        .await
        .optional()?;

    match row {
        Some(row) => Ok(BrowsedAd {
            position: row.position,
            view: row.view.try_into()?,
        }),
        None => Err(MarketError::not_found(step.exhausted_message())),
    }
}
