//! calendar-query execution.
//!
//! Filters are split into a predicate on the indexed object columns and, when
//! that predicate cannot answer the query exactly, a post-filter that parses
//! every candidate and evaluates the full filter.

use kalends_core::types;
use kalends_db::db::enums::{CollectionType, ComponentType};
use kalends_db::db::store::{DavStore, IndexPredicate};
use kalends_rfc::error::RfcError;
use kalends_rfc::rfc::filter::CalendarFilter;
use kalends_rfc::rfc::ical::matcher::calendar_matches;
use kalends_rfc::rfc::ical::parse::parse_calendar;

use crate::dav::service::collection::require_collection;
use crate::error::{ServiceError, ServiceResult};

/// How a [`CalendarFilter`] is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryPlan {
    pub predicate: IndexPredicate,
    /// Candidates must be parsed and checked against the whole filter.
    pub requires_post_filter: bool,
    /// The filter names a component no object can have.
    pub matches_nothing: bool,
}

impl QueryPlan {
    fn exact(predicate: IndexPredicate) -> Self {
        Self {
            predicate,
            requires_post_filter: false,
            matches_nothing: false,
        }
    }

    fn post_filtered(predicate: IndexPredicate) -> Self {
        Self {
            predicate,
            requires_post_filter: true,
            matches_nothing: false,
        }
    }
}

/// ## Summary
/// Decides which part of `filter` is pushed down to the object index.
///
/// The first component filter contributes a component-type equality. A lone
/// VEVENT time range contributes `last_occurrence >= start` and
/// `first_occurrence <= end`; with a single bound that predicate is exact,
/// with both bounds candidates are re-checked. Anything else is post-filtered.
#[must_use]
pub fn plan_query(filter: &CalendarFilter) -> QueryPlan {
    if filter.is_empty() {
        return QueryPlan::exact(IndexPredicate::all());
    }

    let mut predicate = IndexPredicate::all();
    let first = filter.comp_filters.first();

    if let Some(comp) = first.filter(|comp| !comp.is_not_defined) {
        match comp.name.parse::<types::ComponentType>() {
            Ok(component) => predicate.component_type = Some(ComponentType(component)),
            Err(_) => {
                tracing::debug!(component = %comp.name, "Query names an unindexed component");
                return QueryPlan {
                    predicate,
                    requires_post_filter: false,
                    matches_nothing: true,
                };
            }
        }
    }

    let single = match (first, filter.comp_filters.len(), filter.prop_filters.is_empty()) {
        (Some(comp), 1, true) if !comp.is_not_defined && !comp.has_nested_filters() => comp,
        _ => return QueryPlan::post_filtered(predicate),
    };

    let Some(range) = &single.time_range else {
        return QueryPlan::exact(predicate);
    };

    if predicate.component_type != Some(ComponentType(types::ComponentType::VEvent)) {
        return QueryPlan::post_filtered(predicate);
    }

    predicate.occurs_after = range.start.map(|start| start.timestamp());
    predicate.occurs_before = range.end.map(|end| end.timestamp());

    match (range.start, range.end) {
        (Some(_), Some(_)) => QueryPlan::post_filtered(predicate),
        _ => QueryPlan::exact(predicate),
    }
}

/// ## Summary
/// Runs a calendar-query against a calendar and returns the matching URIs.
///
/// ## Errors
/// Returns [`ServiceError::UnknownCollection`] for a missing calendar and
/// [`ServiceError::ValidationError`] if the filter uses an unsupported
/// collation.
#[tracing::instrument(skip(store, filter))]
pub async fn calendar_query(
    store: &dyn DavStore,
    collection_id: uuid::Uuid,
    filter: &CalendarFilter,
) -> ServiceResult<Vec<String>> {
    require_collection(store, collection_id, CollectionType::Calendar).await?;

    let plan = plan_query(filter);
    if plan.matches_nothing {
        return Ok(Vec::new());
    }

    let candidates = store
        .query_objects(collection_id, &plan.predicate, plan.requires_post_filter)
        .await?;
    tracing::debug!(
        candidates = candidates.len(),
        post_filter = plan.requires_post_filter,
        "Index scan complete"
    );

    if !plan.requires_post_filter {
        return Ok(candidates.into_iter().map(|candidate| candidate.uri).collect());
    }

    let mut matched = Vec::new();
    for candidate in candidates {
        let Some(data) = candidate.data.as_deref() else {
            continue;
        };
        let calendar = match parse_calendar(data) {
            Ok(calendar) => calendar,
            Err(err) => {
                tracing::warn!(uri = %candidate.uri, error = %err, "Skipping unparseable stored object");
                continue;
            }
        };
        let keep = calendar_matches(&calendar, filter).map_err(|err| match err {
            RfcError::UnsupportedCollation(collation) => {
                ServiceError::ValidationError(format!("unsupported collation {collation}"))
            }
            other => ServiceError::from(other),
        })?;
        if keep {
            matched.push(candidate.uri);
        }
    }
    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use kalends_rfc::rfc::filter::{CompFilter, PropFilter, TextMatch, TimeRange};

    fn at(day: u32) -> chrono::DateTime<chrono::Utc> {
        chrono::Utc.with_ymd_and_hms(2025, 1, day, 0, 0, 0).unwrap()
    }

    fn vevent() -> Option<ComponentType> {
        Some(ComponentType(types::ComponentType::VEvent))
    }

    #[test_log::test]
    fn empty_filter_is_exact() {
        let plan = plan_query(&CalendarFilter::vcalendar());
        assert_eq!(plan.predicate, IndexPredicate::all());
        assert!(!plan.requires_post_filter);
        assert!(!plan.matches_nothing);
    }

    #[test_log::test]
    fn component_only_is_exact() {
        let plan = plan_query(&CalendarFilter::vcalendar().with_comp(CompFilter::new("VTODO")));
        assert_eq!(
            plan.predicate.component_type,
            Some(ComponentType(types::ComponentType::VTodo))
        );
        assert!(!plan.requires_post_filter);
    }

    #[test_log::test]
    fn single_bound_range_is_exact() {
        let start_only = plan_query(
            &CalendarFilter::vcalendar().with_comp(CompFilter::new("VEVENT").with_time_range(TimeRange::from(at(1)))),
        );
        assert_eq!(start_only.predicate.component_type, vevent());
        assert_eq!(start_only.predicate.occurs_after, Some(at(1).timestamp()));
        assert_eq!(start_only.predicate.occurs_before, None);
        assert!(!start_only.requires_post_filter);

        let end_only = plan_query(
            &CalendarFilter::vcalendar().with_comp(CompFilter::new("VEVENT").with_time_range(TimeRange::until(at(5)))),
        );
        assert_eq!(end_only.predicate.occurs_before, Some(at(5).timestamp()));
        assert!(!end_only.requires_post_filter);
    }

    #[test_log::test]
    fn bounded_range_is_pushed_down_and_rechecked() {
        let plan = plan_query(
            &CalendarFilter::vcalendar()
                .with_comp(CompFilter::new("VEVENT").with_time_range(TimeRange::new(at(1), at(5)))),
        );
        assert_eq!(plan.predicate.occurs_after, Some(at(1).timestamp()));
        assert_eq!(plan.predicate.occurs_before, Some(at(5).timestamp()));
        assert!(plan.requires_post_filter);
    }

    #[test_log::test]
    fn nested_filters_require_post_filter() {
        let with_prop = plan_query(&CalendarFilter::vcalendar().with_comp(
            CompFilter::new("VEVENT")
                .with_time_range(TimeRange::from(at(1)))
                .with_prop_filter(PropFilter::new("SUMMARY").with_text_match(TextMatch::contains("x"))),
        ));
        assert!(with_prop.requires_post_filter);
        assert_eq!(with_prop.predicate.occurs_after, None);
        assert_eq!(with_prop.predicate.component_type, vevent());

        let with_alarm = plan_query(
            &CalendarFilter::vcalendar().with_comp(CompFilter::new("VEVENT").with_comp_filter(CompFilter::new("VALARM"))),
        );
        assert!(with_alarm.requires_post_filter);

        let root_prop = plan_query(
            &CalendarFilter::vcalendar()
                .with_prop_filter(PropFilter::new("X-WR-CALNAME"))
                .with_comp(CompFilter::new("VEVENT")),
        );
        assert!(root_prop.requires_post_filter);
    }

    #[test_log::test]
    fn todo_range_and_multiple_components_post_filter() {
        let todo = plan_query(
            &CalendarFilter::vcalendar().with_comp(CompFilter::new("VTODO").with_time_range(TimeRange::from(at(1)))),
        );
        assert!(todo.requires_post_filter);
        assert_eq!(todo.predicate.occurs_after, None);

        let both = plan_query(
            &CalendarFilter::vcalendar()
                .with_comp(CompFilter::new("VEVENT"))
                .with_comp(CompFilter::new("VTODO")),
        );
        assert!(both.requires_post_filter);
        assert_eq!(both.predicate.component_type, vevent());
    }

    #[test_log::test]
    fn not_defined_is_not_pushed_down() {
        let plan = plan_query(&CalendarFilter::vcalendar().with_comp(CompFilter::new("VTODO").not_defined()));
        assert_eq!(plan.predicate.component_type, None);
        assert!(plan.requires_post_filter);
    }

    #[test_log::test]
    fn unknown_component_matches_nothing() {
        let plan = plan_query(&CalendarFilter::vcalendar().with_comp(CompFilter::new("VPOLL")));
        assert!(plan.matches_nothing);
    }
}
