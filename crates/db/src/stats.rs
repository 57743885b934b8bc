//! Dashboard statistics over a user's patent portfolio.
//!
//! Statistics are recomputed on every call.

use std::collections::BTreeMap;

use sea_orm::{
    sea_query::Expr, ActiveEnum, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    FromQueryResult, QueryFilter, QuerySelect,
};
use serde::Serialize;

use crate::patent::{self, Category, Status};

/// Portfolio summary.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_patents: i64,

    /// Patents waiting for a decision: either pending or under review.
    pub pending_reviews: i64,

    /// Patents whose hash was anchored on the ledger.
    pub blockchain_verified: i64,

    /// Sum of estimated patent values, with missing values counted as zero.
    ///
    /// Saturates at [`i64::MAX`].
    pub portfolio_value: i64,
}

/// Raw aggregate row, with the value sum computed in floating point so that
/// it can't overflow.
#[derive(FromQueryResult)]
struct StatsRow {
    total_patents: i64,
    pending_reviews: i64,
    blockchain_verified: i64,
    portfolio_value: f64,
}

/// Patent count of a single category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryStat {
    pub category: Category,
    pub count: i64,

    /// Share of the user's patents, in whole percents.
    pub percentage: i64,
}

/// Compute portfolio summary of the provided user using a single aggregate query.
pub async fn dashboard_stats<C: ConnectionTrait>(
    db: &C,
    user_id: i64,
) -> Result<DashboardStats, DbErr> {
    let pending_reviews = format!(
        "CAST(COALESCE(SUM(CASE WHEN status IN ({}, {}) THEN 1 ELSE 0 END), 0) AS BIGINT)",
        Status::Pending.to_value(),
        Status::UnderReview.to_value()
    );

    let stats = patent::Entity::find()
        .select_only()
        .column_as(Expr::cust("COUNT(*)"), "total_patents")
        .column_as(Expr::cust(&pending_reviews), "pending_reviews")
        .column_as(
            Expr::cust(
                "CAST(COALESCE(SUM(CASE WHEN ledger_topic_id IS NOT NULL THEN 1 ELSE 0 END), 0) AS BIGINT)",
            ),
            "blockchain_verified",
        )
        .column_as(
            Expr::cust("COALESCE(SUM(CAST(estimated_value AS DOUBLE PRECISION)), 0.0)"),
            "portfolio_value",
        )
        .filter(patent::Column::UserId.eq(user_id))
        .into_model::<StatsRow>()
        .one(db)
        .await?;

    Ok(stats
        .map(|row| DashboardStats {
            total_patents: row.total_patents,
            pending_reviews: row.pending_reviews,
            blockchain_verified: row.blockchain_verified,
            portfolio_value: row.portfolio_value.round() as i64,
        })
        .unwrap_or_default())
}

/// Compute per-category patent counts of the provided user.
pub async fn category_stats<C: ConnectionTrait>(
    db: &C,
    user_id: i64,
) -> Result<Vec<CategoryStat>, DbErr> {
    let counts = patent::Entity::find()
        .select_only()
        .column(patent::Column::Category)
        .column_as(Expr::cust("COUNT(*)"), "count")
        .filter(patent::Column::UserId.eq(user_id))
        .group_by(patent::Column::Category)
        .into_tuple::<(Option<Category>, i64)>()
        .all(db)
        .await?;

    Ok(category_breakdown(counts))
}

/// Turn raw per-category counts into a breakdown ordered by count.
///
/// Patents without a category are counted as [`Category::Other`].
/// Percentages are rounded to the nearest integer.
pub fn category_breakdown(counts: Vec<(Option<Category>, i64)>) -> Vec<CategoryStat> {
    let mut merged = BTreeMap::new();

    for (category, count) in counts {
        *merged.entry(category.unwrap_or(Category::Other)).or_insert(0) += count;
    }

    let total: i64 = merged.values().sum();

    let mut stats: Vec<_> = merged
        .into_iter()
        .map(|(category, count)| CategoryStat {
            category,
            count,
            percentage: if total > 0 {
                (count as f64 / total as f64 * 100.0).round() as i64
            } else {
                0
            },
        })
        .collect();

    // Stable sort keeps categories with equal counts in a fixed order.
    stats.sort_by(|a, b| b.count.cmp(&a.count));

    stats
}
