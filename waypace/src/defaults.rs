//! Travel-mode-default resolution.
//!
//! The effective `{mode, traffic_aware}` for any edge falls back through a
//! three-level hierarchy: trip defaults, day defaults, then a per-edge
//! override. Traffic-awareness is only meaningful for driving; every
//! resolution path coerces it to `false` for other modes.

use std::borrow::Cow;
use std::collections::HashSet;

use crate::model::{build_edge_key, DayPlan, TravelMode, TravelOverride, TravelPrefs};

/// Resolved travel settings for a trip, day, or single edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveTravel {
    /// Effective travel mode.
    pub mode: TravelMode,
    /// Effective traffic-awareness; always `false` unless `mode` is driving.
    pub traffic_aware: bool,
}

impl EffectiveTravel {
    fn normalized(mode: TravelMode, traffic_aware: bool) -> Self {
        Self {
            mode,
            traffic_aware: mode == TravelMode::Drive && traffic_aware,
        }
    }
}

/// Resolve trip-level defaults from optional caller preferences.
///
/// Missing preferences default to walking with traffic-awareness off.
pub fn resolve_trip_defaults(prefs: Option<&TravelPrefs>) -> EffectiveTravel {
    let mode = prefs.and_then(|p| p.mode).unwrap_or(TravelMode::Walk);
    let traffic = prefs.and_then(|p| p.traffic_aware).unwrap_or(false);
    EffectiveTravel::normalized(mode, traffic)
}

/// Resolve a day's defaults against the trip's.
///
/// A day with no preference inherits the trip defaults unchanged. A day that
/// names a mode but no traffic preference falls back to the trip's traffic
/// flag, subject to the drive-only invariant.
pub fn resolve_day_defaults(day: &DayPlan, trip_defaults: &EffectiveTravel) -> EffectiveTravel {
    match day.travel {
        None => *trip_defaults,
        Some(prefs) => {
            let mode = prefs.mode.unwrap_or(trip_defaults.mode);
            let traffic = prefs
                .traffic_aware
                .unwrap_or(trip_defaults.traffic_aware);
            EffectiveTravel::normalized(mode, traffic)
        }
    }
}

/// Resolve the effective settings for the directed edge `from_id -> to_id`.
///
/// A stored override wins over the day defaults; an override that names a
/// mode but no traffic preference inherits the day default's traffic flag.
pub fn resolve_effective_for_edge(
    day: &DayPlan,
    from_id: &str,
    to_id: &str,
    trip_defaults: &EffectiveTravel,
) -> EffectiveTravel {
    let day_defaults = resolve_day_defaults(day, trip_defaults);

    match day.overrides.get(&build_edge_key(from_id, to_id)) {
        None => day_defaults,
        Some(ov) => {
            let traffic = ov.traffic_aware.unwrap_or(day_defaults.traffic_aware);
            EffectiveTravel::normalized(ov.mode, traffic)
        }
    }
}

/// Drop overrides whose edge no longer exists in the day's current
/// waypoint-adjacency (after reordering, or when an item lost its location).
///
/// Returns `Cow::Borrowed` when nothing was pruned, so upstream change
/// detection can compare references. Idempotent.
pub fn normalize_overrides(day: &DayPlan) -> Cow<'_, DayPlan> {
    let valid: HashSet<String> = located_edge_keys(day).collect();

    if day.overrides.keys().all(|k| valid.contains(k)) {
        return Cow::Borrowed(day);
    }

    let mut pruned = day.clone();
    pruned.overrides.retain(|k, _| valid.contains(k));
    Cow::Owned(pruned)
}

/// Set or clear the override for the directed edge `from_id -> to_id`,
/// returning a new day value (the input is never mutated).
///
/// `None` clears the edge back to auto. A stored drive override captures the
/// day default's traffic flag; any other mode stores traffic off.
pub fn set_override(
    day: &DayPlan,
    from_id: &str,
    to_id: &str,
    mode: Option<TravelMode>,
    trip_defaults: &EffectiveTravel,
) -> DayPlan {
    let mut updated = day.clone();
    let key = build_edge_key(from_id, to_id);

    match mode {
        None => {
            updated.overrides.remove(&key);
        }
        Some(mode) => {
            let day_defaults = resolve_day_defaults(day, trip_defaults);
            let traffic = mode == TravelMode::Drive && day_defaults.traffic_aware;
            updated.overrides.insert(
                key,
                TravelOverride {
                    mode,
                    traffic_aware: Some(traffic),
                },
            );
        }
    }

    updated
}

/// Iterate the edge keys of adjacent item pairs where both endpoints carry a
/// location.
pub(crate) fn located_edge_keys(day: &DayPlan) -> impl Iterator<Item = String> + '_ {
    day.items.windows(2).filter_map(|pair| {
        let (a, b) = (&pair[0], &pair[1]);
        if a.waypoint.is_some() && b.waypoint.is_some() {
            Some(build_edge_key(&a.id, &b.id))
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DayItem;

    fn three_stop_day() -> DayPlan {
        DayPlan {
            items: vec![
                DayItem::located("a", 48.8584, 2.2945),
                DayItem::located("b", 48.8606, 2.3376),
                DayItem::located("c", 48.8530, 2.3499),
            ],
            travel: None,
            overrides: Default::default(),
        }
    }

    #[test]
    fn test_trip_defaults_fall_back_to_walk() {
        let eff = resolve_trip_defaults(None);
        assert_eq!(eff.mode, TravelMode::Walk);
        assert!(!eff.traffic_aware);
    }

    #[test]
    fn test_trip_traffic_only_applies_to_drive() {
        let prefs = TravelPrefs {
            mode: Some(TravelMode::Walk),
            traffic_aware: Some(true),
        };
        assert!(!resolve_trip_defaults(Some(&prefs)).traffic_aware);

        let prefs = TravelPrefs {
            mode: Some(TravelMode::Drive),
            traffic_aware: Some(true),
        };
        assert!(resolve_trip_defaults(Some(&prefs)).traffic_aware);
    }

    #[test]
    fn test_day_without_prefs_inherits_trip() {
        let day = three_stop_day();
        let trip = resolve_trip_defaults(Some(&TravelPrefs {
            mode: Some(TravelMode::Drive),
            traffic_aware: Some(true),
        }));
        assert_eq!(resolve_day_defaults(&day, &trip), trip);
    }

    #[test]
    fn test_day_mode_without_traffic_falls_back_to_trip_traffic() {
        let mut day = three_stop_day();
        day.travel = Some(TravelPrefs {
            mode: Some(TravelMode::Drive),
            traffic_aware: None,
        });
        let trip = resolve_trip_defaults(Some(&TravelPrefs {
            mode: Some(TravelMode::Drive),
            traffic_aware: Some(true),
        }));

        let eff = resolve_day_defaults(&day, &trip);
        assert_eq!(eff.mode, TravelMode::Drive);
        assert!(eff.traffic_aware);
    }

    #[test]
    fn test_day_transit_coerces_traffic_off() {
        let mut day = three_stop_day();
        day.travel = Some(TravelPrefs {
            mode: Some(TravelMode::Transit),
            traffic_aware: Some(true),
        });
        let trip = resolve_trip_defaults(None);

        assert!(!resolve_day_defaults(&day, &trip).traffic_aware);
    }

    #[test]
    fn test_edge_override_wins_over_day_defaults() {
        let mut day = three_stop_day();
        day.overrides.insert(
            build_edge_key("a", "b"),
            TravelOverride {
                mode: TravelMode::Drive,
                traffic_aware: Some(true),
            },
        );
        let trip = resolve_trip_defaults(None);

        let eff = resolve_effective_for_edge(&day, "a", "b", &trip);
        assert_eq!(eff.mode, TravelMode::Drive);
        assert!(eff.traffic_aware);

        // The sibling edge stays on day defaults.
        let eff = resolve_effective_for_edge(&day, "b", "c", &trip);
        assert_eq!(eff.mode, TravelMode::Walk);
    }

    #[test]
    fn test_non_drive_override_never_traffic_aware() {
        let mut day = three_stop_day();
        day.overrides.insert(
            build_edge_key("a", "b"),
            TravelOverride {
                mode: TravelMode::Transit,
                traffic_aware: Some(true),
            },
        );
        let trip = resolve_trip_defaults(None);

        assert!(!resolve_effective_for_edge(&day, "a", "b", &trip).traffic_aware);
    }

    #[test]
    fn test_drive_override_inherits_day_traffic_when_unspecified() {
        let mut day = three_stop_day();
        day.travel = Some(TravelPrefs {
            mode: Some(TravelMode::Drive),
            traffic_aware: Some(true),
        });
        day.overrides.insert(
            build_edge_key("b", "c"),
            TravelOverride {
                mode: TravelMode::Drive,
                traffic_aware: None,
            },
        );
        let trip = resolve_trip_defaults(None);

        assert!(resolve_effective_for_edge(&day, "b", "c", &trip).traffic_aware);
    }

    #[test]
    fn test_normalize_keeps_reference_when_clean() {
        let mut day = three_stop_day();
        day.overrides.insert(
            build_edge_key("a", "b"),
            TravelOverride {
                mode: TravelMode::Drive,
                traffic_aware: Some(false),
            },
        );

        assert!(matches!(normalize_overrides(&day), Cow::Borrowed(_)));
    }

    #[test]
    fn test_normalize_prunes_stale_edges() {
        let mut day = three_stop_day();
        day.overrides.insert(
            build_edge_key("a", "c"),
            TravelOverride {
                mode: TravelMode::Drive,
                traffic_aware: Some(false),
            },
        );

        let normalized = normalize_overrides(&day);
        assert!(matches!(normalized, Cow::Owned(_)));
        assert!(normalized.overrides.is_empty());
    }

    #[test]
    fn test_normalize_drops_edge_when_location_lost() {
        let mut day = three_stop_day();
        day.items[1].waypoint = None;
        day.overrides.insert(
            build_edge_key("a", "b"),
            TravelOverride {
                mode: TravelMode::Drive,
                traffic_aware: Some(false),
            },
        );

        let normalized = normalize_overrides(&day);
        assert!(normalized.overrides.is_empty());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut day = three_stop_day();
        day.overrides.insert(
            build_edge_key("c", "a"),
            TravelOverride {
                mode: TravelMode::Walk,
                traffic_aware: None,
            },
        );

        let once = normalize_overrides(&day).into_owned();
        let twice = normalize_overrides(&once);
        assert!(matches!(twice, Cow::Borrowed(_)));
        assert_eq!(*twice, once);
    }

    #[test]
    fn test_set_override_returns_new_value() {
        let day = three_stop_day();
        let trip = resolve_trip_defaults(None);

        let updated = set_override(&day, "a", "b", Some(TravelMode::Drive), &trip);
        assert!(day.overrides.is_empty());
        assert_eq!(updated.overrides.len(), 1);
    }

    #[test]
    fn test_set_override_none_clears_to_auto() {
        let day = three_stop_day();
        let trip = resolve_trip_defaults(None);

        let updated = set_override(&day, "a", "b", Some(TravelMode::Transit), &trip);
        let cleared = set_override(&updated, "a", "b", None, &trip);
        assert!(cleared.overrides.is_empty());
    }

    #[test]
    fn test_set_override_drive_captures_day_traffic() {
        let mut day = three_stop_day();
        day.travel = Some(TravelPrefs {
            mode: Some(TravelMode::Drive),
            traffic_aware: Some(true),
        });
        let trip = resolve_trip_defaults(None);

        let updated = set_override(&day, "a", "b", Some(TravelMode::Drive), &trip);
        let ov = updated.overrides.get(&build_edge_key("a", "b")).unwrap();
        assert_eq!(ov.traffic_aware, Some(true));

        // A walking override stores traffic off regardless.
        let updated = set_override(&day, "a", "b", Some(TravelMode::Walk), &trip);
        let ov = updated.overrides.get(&build_edge_key("a", "b")).unwrap();
        assert_eq!(ov.traffic_aware, Some(false));
    }
}
