//! Main-branch rollups.

use futures::future::try_join_all;
use safety_map_analytics_models::{ChildReportCount, HierarchyRollup};
use safety_map_location_models::{LocationId, LocationLevel};
use safety_map_store::ReportStore;

use crate::{AnalyticsError, find_location};

/// Counts the full-history reports of a main branch and of each child.
///
/// Children keep the order the store lists them in and are split by
/// level. Counts ignore any date range.
///
/// # Errors
///
/// * [`AnalyticsError::NotFound`] if the location does not exist
/// * [`AnalyticsError::InvalidOperation`] if it is not a main branch, or
///   the store lists a main branch as one of its children
/// * [`AnalyticsError::StoreUnavailable`] if a store query fails
pub async fn compute_hierarchy(
    store: &dyn ReportStore,
    main_branch_id: &LocationId,
) -> Result<HierarchyRollup, AnalyticsError> {
    let parent = find_location(store, main_branch_id).await?;
    if !parent.level.owns_children() {
        return Err(AnalyticsError::InvalidOperation {
            message: format!(
                "{} is a {}, only main branches have a hierarchy",
                parent.id, parent.level
            ),
        });
    }

    let children = store.query_children(&parent.id).await?;
    let (parent_report_count, child_counts) = futures::try_join!(
        store.report_count(&parent.id, None),
        try_join_all(children.iter().map(|child| store.report_count(&child.id, None))),
    )?;

    let mut sub_branches = Vec::new();
    let mut units = Vec::new();
    for (location, report_count) in children.into_iter().zip(child_counts) {
        let entry = ChildReportCount {
            location,
            report_count,
        };
        match entry.location.level {
            LocationLevel::SubBranch => sub_branches.push(entry),
            LocationLevel::Unit => units.push(entry),
            LocationLevel::MainBranch => {
                return Err(AnalyticsError::InvalidOperation {
                    message: format!(
                        "store lists main branch {} as a child of {}",
                        entry.location.id, parent.id
                    ),
                });
            }
        }
    }

    let total_children = sub_branches.len() + units.len();
    let grand_total = parent_report_count
        + sub_branches
            .iter()
            .chain(&units)
            .map(|c| c.report_count)
            .sum::<u64>();

    log::debug!(
        "Hierarchy of {}: {total_children} child location(s), {grand_total} report(s)",
        parent.id
    );

    Ok(HierarchyRollup {
        parent,
        parent_report_count,
        grand_total,
        sub_branches,
        units,
        total_children,
        location_count: total_children + 1,
    })
}

/// Rollups of every main branch that can be placed on the map, in the
/// store's order. Branches without valid coordinates are skipped.
///
/// # Errors
///
/// Fails with the first error of [`compute_hierarchy`] or
/// [`AnalyticsError::StoreUnavailable`] if the branches cannot be listed.
pub async fn map_rollups(store: &dyn ReportStore) -> Result<Vec<HierarchyRollup>, AnalyticsError> {
    let branches = store.main_branches().await?;
    try_join_all(
        branches
            .iter()
            .filter(|branch| branch.is_mappable())
            .map(|branch| compute_hierarchy(store, &branch.id)),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{id, store};

    #[tokio::test]
    async fn splits_children_by_level() {
        let store = store();
        let rollup = compute_hierarchy(&store, &id("CGK")).await.unwrap();

        assert_eq!(rollup.parent.id, id("CGK"));
        assert_eq!(rollup.parent_report_count, 4);

        let subs: Vec<_> = rollup
            .sub_branches
            .iter()
            .map(|c| (c.location.id.as_str(), c.report_count))
            .collect();
        assert_eq!(subs, [("CGK-P1", 2)]);

        let units: Vec<_> = rollup
            .units
            .iter()
            .map(|c| (c.location.id.as_str(), c.report_count))
            .collect();
        assert_eq!(units, [("CGK-U1", 1), ("CGK-U2", 0)]);

        assert_eq!(rollup.total_children, 3);
        assert_eq!(rollup.location_count, 4);
        assert_eq!(rollup.grand_total, 7);
    }

    #[tokio::test]
    async fn every_child_is_listed_once() {
        let store = store();
        let rollup = compute_hierarchy(&store, &id("CGK")).await.unwrap();
        let children = store.query_children(&id("CGK")).await.unwrap();

        assert_eq!(rollup.total_children, rollup.sub_branches.len() + rollup.units.len());
        for child in &children {
            let listed = rollup
                .sub_branches
                .iter()
                .chain(&rollup.units)
                .filter(|c| c.location.id == child.id)
                .count();
            assert_eq!(listed, 1);
        }
    }

    #[tokio::test]
    async fn childless_main_branch() {
        let store = store();
        let rollup = compute_hierarchy(&store, &id("TKG")).await.unwrap();
        assert_eq!(rollup.total_children, 0);
        assert_eq!(rollup.location_count, 1);
        assert_eq!(rollup.grand_total, 2);
    }

    #[tokio::test]
    async fn map_lists_only_branches_with_coordinates() {
        let store = store();
        let rollups = map_rollups(&store).await.unwrap();

        let markers: Vec<_> = rollups
            .iter()
            .map(|r| (r.parent.id.as_str(), r.grand_total, r.total_children))
            .collect();
        assert_eq!(markers, [("CGK", 7, 3), ("DPS", 0, 0)]);
    }

    #[tokio::test]
    async fn rejects_non_main_branches() {
        let store = store();
        let err = compute_hierarchy(&store, &id("CGK-U1")).await.unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidOperation { .. }));

        let err = compute_hierarchy(&store, &id("XXX")).await.unwrap_err();
        assert!(matches!(err, AnalyticsError::NotFound { .. }));
    }
}
