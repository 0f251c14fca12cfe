//! Attribute filters over the drone fleet.
//!
//! Attributes are looked up by name (case-insensitive) in a fixed registry
//! of typed accessors, so a filter can compare numbers numerically and text
//! or flags by equality.

use crate::models::Drone;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Value of one drone attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Number(f64),
    Text(String),
    Flag(bool),
}

type Accessor = fn(&Drone) -> AttributeValue;

fn id(drone: &Drone) -> AttributeValue {
    AttributeValue::Text(drone.id.clone())
}

fn name(drone: &Drone) -> AttributeValue {
    AttributeValue::Text(drone.name.clone())
}

fn capacity(drone: &Drone) -> AttributeValue {
    AttributeValue::Number(drone.capability.capacity)
}

fn max_moves(drone: &Drone) -> AttributeValue {
    AttributeValue::Number(f64::from(drone.capability.max_moves))
}

fn cost_per_move(drone: &Drone) -> AttributeValue {
    AttributeValue::Number(drone.capability.cost_per_move)
}

fn cost_initial(drone: &Drone) -> AttributeValue {
    AttributeValue::Number(drone.capability.cost_initial)
}

fn cost_final(drone: &Drone) -> AttributeValue {
    AttributeValue::Number(drone.capability.cost_final)
}

fn cooling(drone: &Drone) -> AttributeValue {
    AttributeValue::Flag(drone.capability.cooling)
}

fn heating(drone: &Drone) -> AttributeValue {
    AttributeValue::Flag(drone.capability.heating)
}

const ATTRIBUTES: &[(&str, Accessor)] = &[
    ("id", id),
    ("name", name),
    ("capacity", capacity),
    ("maxMoves", max_moves),
    ("costPerMove", cost_per_move),
    ("costInitial", cost_initial),
    ("costFinal", cost_final),
    ("cooling", cooling),
    ("heating", heating),
];

/// Look up an attribute of a drone by name.
pub fn attribute(drone: &Drone, name: &str) -> Option<AttributeValue> {
    ATTRIBUTES
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name.trim()))
        .map(|(_, accessor)| accessor(drone))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Gt,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operator '{0}'")]
pub struct UnknownOperator(pub String);

impl FromStr for Operator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "=" => Ok(Self::Eq),
            "!=" => Ok(Self::Ne),
            "<" => Ok(Self::Lt),
            ">" => Ok(Self::Gt),
            other => Err(UnknownOperator(other.to_string())),
        }
    }
}

/// One `attribute operator value` condition, as sent by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryFilter {
    pub attribute: String,
    pub operator: String,
    pub value: String,
}

impl QueryFilter {
    pub fn new(attribute: &str, operator: &str, value: &str) -> Self {
        Self {
            attribute: attribute.to_string(),
            operator: operator.to_string(),
            value: value.to_string(),
        }
    }

    /// Whether `drone` satisfies this condition. Unknown attributes, unknown
    /// operators and unparseable numbers never match.
    pub fn matches(&self, drone: &Drone) -> bool {
        let Some(actual) = attribute(drone, &self.attribute) else {
            return false;
        };
        let Ok(operator) = self.operator.parse::<Operator>() else {
            return false;
        };
        let expected = self.value.trim();

        match actual {
            AttributeValue::Number(actual) => {
                let Ok(expected) = expected.parse::<f64>() else {
                    return false;
                };
                match operator {
                    Operator::Eq => actual == expected,
                    Operator::Ne => actual != expected,
                    Operator::Lt => actual < expected,
                    Operator::Gt => actual > expected,
                }
            }
            AttributeValue::Text(actual) => {
                operator == Operator::Eq && actual.eq_ignore_ascii_case(expected)
            }
            AttributeValue::Flag(actual) => {
                operator == Operator::Eq && actual.to_string().eq_ignore_ascii_case(expected)
            }
        }
    }
}

/// Ids of drones matching every filter, in fleet order.
pub fn query(drones: &[Drone], filters: &[QueryFilter]) -> Vec<String> {
    drones
        .iter()
        .filter(|drone| filters.iter().all(|filter| filter.matches(drone)))
        .map(|drone| drone.id.clone())
        .collect()
}

/// Ids of drones whose attribute equals `value`.
pub fn query_as_path(drones: &[Drone], attribute: &str, value: &str) -> Vec<String> {
    query(drones, &[QueryFilter::new(attribute, "=", value)])
}

pub fn drones_with_cooling(drones: &[Drone], state: bool) -> Vec<String> {
    drones
        .iter()
        .filter(|drone| drone.capability.cooling == state)
        .map(|drone| drone.id.clone())
        .collect()
}
