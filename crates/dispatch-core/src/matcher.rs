//! Capability and availability matching between drones and dispatches.

use crate::models::{Capability, Dispatch, Drone, DroneAvailability, Requirements, TimeWindow};
use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use std::collections::HashMap;

/// Tolerance for capacity and cost comparisons.
pub const EPSILON: f64 = 1e-12;

const TIME_FORMATS: [&str; 2] = ["%H:%M:%S", "%H:%M"];

/// Whether a drone's capability covers a dispatch's payload requirements.
pub fn fits(requirements: &Requirements, capability: &Capability) -> bool {
    if capability.capacity + EPSILON < requirements.capacity {
        return false;
    }
    if requirements.cooling && !capability.cooling {
        return false;
    }
    if requirements.heating && !capability.heating {
        return false;
    }
    true
}

fn is_digits(part: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&part.len()) && part.bytes().all(|b| b.is_ascii_digit())
}

/// Parse a time of day in `HH:mm`, `H:mm`, `HH:mm:ss` or `H:mm:ss` form.
///
/// Minutes and seconds must have two digits; chrono alone would accept `9:5`.
pub fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    let mut parts = value.split(':');
    let hour_ok = parts.next().is_some_and(|hour| is_digits(hour, 1, 2));
    let rest: Vec<&str> = parts.collect();
    if !hour_ok || !(1..=2).contains(&rest.len()) || !rest.iter().all(|p| is_digits(p, 2, 2)) {
        return None;
    }
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(value, format).ok())
}

/// Parse an ISO `yyyy-MM-dd` date, zero-padded month and day only.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let parts: Vec<&str> = value.split('-').collect();
    match parts.as_slice() {
        [year, month, day] if is_digits(year, 4, 4) && is_digits(month, 2, 2) && is_digits(day, 2, 2) => {
            NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
        }
        _ => None,
    }
}

/// Upper-case English weekday name, as used by availability windows.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MONDAY",
        Weekday::Tue => "TUESDAY",
        Weekday::Wed => "WEDNESDAY",
        Weekday::Thu => "THURSDAY",
        Weekday::Fri => "FRIDAY",
        Weekday::Sat => "SATURDAY",
        Weekday::Sun => "SUNDAY",
    }
}

/// Availability windows per drone id.
#[derive(Debug, Clone, Default)]
pub struct AvailabilityBook {
    windows: HashMap<String, Vec<TimeWindow>>,
}

impl AvailabilityBook {
    pub fn from_records(records: &[DroneAvailability]) -> Self {
        let mut windows: HashMap<String, Vec<TimeWindow>> = HashMap::new();
        for record in records.iter().filter(|r| !r.windows.is_empty()) {
            windows
                .entry(record.drone_id.clone())
                .or_default()
                .extend(record.windows.iter().cloned());
        }
        Self { windows }
    }

    pub fn windows_for(&self, drone_id: &str) -> Option<&[TimeWindow]> {
        self.windows.get(drone_id).map(Vec::as_slice)
    }

    /// Whether the drone is on duty at the dispatch's date and time.
    ///
    /// Missing data on either side means available, and so does a date or
    /// time that does not parse.
    pub fn is_available(&self, drone_id: &str, dispatch: &Dispatch) -> bool {
        let (Some(date), Some(time)) = (dispatch.date.as_deref(), dispatch.time.as_deref()) else {
            return true;
        };
        let Some(windows) = self.windows_for(drone_id).filter(|w| !w.is_empty()) else {
            return true;
        };

        let Some(date) = parse_date(date) else {
            tracing::warn!(
                "Could not parse dispatch date '{}' for dispatch {}, assuming available",
                date,
                dispatch.id
            );
            return true;
        };
        let Some(time) = parse_time_of_day(time) else {
            tracing::warn!(
                "Could not parse dispatch time '{}' for dispatch {}, assuming available",
                time,
                dispatch.id
            );
            return true;
        };

        let day = weekday_name(date.weekday());
        windows.iter().any(|window| window_contains(window, day, time))
    }
}

fn window_contains(window: &TimeWindow, day: &str, time: NaiveTime) -> bool {
    if !window.day_of_week.trim().eq_ignore_ascii_case(day) {
        return false;
    }
    let (Some(from), Some(until)) = (
        parse_time_of_day(&window.from),
        parse_time_of_day(&window.until),
    ) else {
        tracing::warn!(
            "Could not parse window times: from='{}', until='{}'",
            window.from,
            window.until
        );
        return false;
    };
    from <= time && time <= until
}

/// Whether one drone can serve every dispatch in the list on its own terms:
/// payload, thermal needs, availability and fixed-cost ceiling.
pub fn can_handle_all(drone: &Drone, dispatches: &[Dispatch], book: &AvailabilityBook) -> bool {
    let capability = &drone.capability;
    dispatches.iter().all(|dispatch| {
        let requirements = &dispatch.requirements;
        if !fits(requirements, capability) {
            tracing::trace!(
                "Drone {} does not fit dispatch {} ({} < {})",
                drone.id,
                dispatch.id,
                capability.capacity,
                requirements.capacity
            );
            return false;
        }
        if !book.is_available(&drone.id, dispatch) {
            tracing::trace!("Drone {} unavailable for dispatch {}", drone.id, dispatch.id);
            return false;
        }
        if let Some(max_cost) = requirements.max_cost {
            let fixed_cost = capability.cost_initial + capability.cost_final;
            if fixed_cost > max_cost + EPSILON {
                tracing::trace!(
                    "Drone {} too expensive for dispatch {} ({} > {})",
                    drone.id,
                    dispatch.id,
                    fixed_cost,
                    max_cost
                );
                return false;
            }
        }
        true
    })
}

/// Ids of the drones that can serve every dispatch, in fleet order.
pub fn query_available_drones(
    drones: &[Drone],
    dispatches: &[Dispatch],
    book: &AvailabilityBook,
) -> Vec<String> {
    if dispatches.is_empty() {
        tracing::debug!("No dispatches provided for availability query");
        return Vec::new();
    }
    let available: Vec<String> = drones
        .iter()
        .filter(|drone| can_handle_all(drone, dispatches, book))
        .map(|drone| drone.id.clone())
        .collect();
    tracing::info!(
        "Found {} of {} drones able to handle all {} dispatches",
        available.len(),
        drones.len(),
        dispatches.len()
    );
    available
}
