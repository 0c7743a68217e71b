use crate::error::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One document of the remote `busStops` collection.
///
/// An empty time string means the stop explicitly has no run at that time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusStop {
    pub id: String,
    pub apt: String,
    pub stop: String,
    pub in_time: String,
    pub out_time: String,
    pub out_time2: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BusStop {
    pub fn times(&self) -> StopTimes {
        StopTimes {
            in_time: self.in_time.clone(),
            out_time: self.out_time.clone(),
            out_time2: self.out_time2.clone(),
        }
    }
}

/// The three time fields exactly as they are written to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopTimes {
    pub in_time: String,
    pub out_time: String,
    pub out_time2: String,
}

/// A validated stop ready to be added to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStop {
    pub apt: String,
    pub stop: String,
    pub times: StopTimes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimeSlot {
    In,
    Out,
    Out2,
}

impl TimeSlot {
    pub const ALL: [TimeSlot; 3] = [TimeSlot::In, TimeSlot::Out, TimeSlot::Out2];

    pub fn field(self) -> &'static str {
        match self {
            TimeSlot::In => "inTime",
            TimeSlot::Out => "outTime",
            TimeSlot::Out2 => "outTime2",
        }
    }

    /// Wire key of the "no time" checkbox paired with this slot.
    pub fn none_field(self) -> &'static str {
        match self {
            TimeSlot::In => "inNone",
            TimeSlot::Out => "outNone",
            TimeSlot::Out2 => "out2None",
        }
    }
}

impl FromStr for TimeSlot {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "in" | "inTime" => Ok(TimeSlot::In),
            "out" | "outTime" => Ok(TimeSlot::Out),
            "out2" | "outTime2" => Ok(TimeSlot::Out2),
            _ => Err(StoreError::InvalidText { field: "slot" }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_accepts_short_and_field_names() {
        assert_eq!("in".parse::<TimeSlot>().unwrap(), TimeSlot::In);
        assert_eq!("outTime2".parse::<TimeSlot>().unwrap(), TimeSlot::Out2);
        assert!("lunch".parse::<TimeSlot>().is_err());
    }

    #[test]
    fn every_slot_has_distinct_wire_keys() {
        let keys: Vec<_> = TimeSlot::ALL
            .iter()
            .flat_map(|s| [s.field(), s.none_field()])
            .collect();
        assert_eq!(
            keys,
            vec!["inTime", "inNone", "outTime", "outNone", "outTime2", "out2None"]
        );
        for slot in TimeSlot::ALL {
            assert_eq!(slot.field().parse::<TimeSlot>().unwrap(), slot);
        }
    }

    #[test]
    fn stop_serializes_with_collection_field_names() {
        let now = Utc::now();
        let stop = BusStop {
            id: "a".into(),
            apt: "검단신도시".into(),
            stop: "정문".into(),
            in_time: "08:00".into(),
            out_time: String::new(),
            out_time2: String::new(),
            created_at: now,
            updated_at: now,
        };
        let v = serde_json::to_value(&stop).unwrap();
        assert_eq!(v["inTime"], "08:00");
        assert_eq!(v["outTime2"], "");
        assert!(v.get("updatedAt").is_some());
    }
}
