//! Form state for creating stops and editing their times.
//!
//! A form is built completely and validated as a unit; nothing is read piecemeal at
//! submit time.

use super::model::{NewStop, StopTimes, TimeSlot};
use crate::error::StoreError;
use crate::text::{is_allowed_text, normalize};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

const TIME_FORMAT: &str = "%H:%M";

/// Checks a 24h `HH:MM` value and returns it in canonical form.
pub fn validate_time(field: &'static str, raw: &str) -> Result<String, StoreError> {
    let t = raw.trim();
    NaiveTime::parse_from_str(t, TIME_FORMAT)
        .map(|v| v.format(TIME_FORMAT).to_string())
        .map_err(|_| StoreError::InvalidTime {
            field,
            value: t.to_string(),
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeState<'a> {
    Set(&'a str),
    /// Explicitly no run at this time; stored as the empty string.
    None,
    /// Nothing entered yet and "none" not checked.
    Pending,
}

/// One time field plus its "none" checkbox.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeInput {
    pub value: String,
    pub none: bool,
}

impl TimeInput {
    pub fn at(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            none: false,
        }
    }

    pub fn none() -> Self {
        Self {
            value: String::new(),
            none: true,
        }
    }

    /// Seeds from a stored value, where empty means "none".
    pub fn from_stored(value: &str) -> Self {
        Self {
            value: value.to_string(),
            none: value.is_empty(),
        }
    }

    pub fn state(&self) -> TimeState<'_> {
        if self.none {
            TimeState::None
        } else if self.value.trim().is_empty() {
            TimeState::Pending
        } else {
            TimeState::Set(&self.value)
        }
    }

    /// Checking "none" discards whatever was typed.
    pub fn set_none(&mut self, none: bool) {
        self.none = none;
        if none {
            self.value.clear();
        }
    }

    /// The value to store: empty for "none", a canonical `HH:MM` otherwise.
    /// A pending field is an error only when `required`.
    pub fn resolve(&self, slot: TimeSlot, required: bool) -> Result<String, StoreError> {
        match self.state() {
            TimeState::None => Ok(String::new()),
            TimeState::Pending if required => Err(StoreError::TimeRequired { field: slot.field() }),
            TimeState::Pending => Ok(String::new()),
            TimeState::Set(v) => validate_time(slot.field(), v),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimesForm {
    pub in_time: TimeInput,
    pub out_time: TimeInput,
    pub out_time2: TimeInput,
}

impl TimesForm {
    pub fn from_stored(times: &StopTimes) -> Self {
        Self {
            in_time: TimeInput::from_stored(&times.in_time),
            out_time: TimeInput::from_stored(&times.out_time),
            out_time2: TimeInput::from_stored(&times.out_time2),
        }
    }

    pub fn slot_mut(&mut self, slot: TimeSlot) -> &mut TimeInput {
        match slot {
            TimeSlot::In => &mut self.in_time,
            TimeSlot::Out => &mut self.out_time,
            TimeSlot::Out2 => &mut self.out_time2,
        }
    }

    /// Times for an update. No slot is mandatory here.
    pub fn validate(&self) -> Result<StopTimes, StoreError> {
        Ok(StopTimes {
            in_time: self.in_time.resolve(TimeSlot::In, false)?,
            out_time: self.out_time.resolve(TimeSlot::Out, false)?,
            out_time2: self.out_time2.resolve(TimeSlot::Out2, false)?,
        })
    }
}

/// Everything the create form submits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StopForm {
    pub apt: String,
    pub stop: String,
    #[serde(flatten)]
    pub times: TimesForm,
}

impl StopForm {
    /// Morning pickup and first drop-off must each be a time or explicitly none;
    /// the second drop-off is optional.
    pub fn validate(&self) -> Result<NewStop, StoreError> {
        let apt = normalize(&self.apt);
        let stop = normalize(&self.stop);
        if apt.is_empty() {
            return Err(StoreError::Empty { field: "apt" });
        }
        if stop.is_empty() {
            return Err(StoreError::Empty { field: "stop" });
        }
        let in_time = self.times.in_time.resolve(TimeSlot::In, true)?;
        let out_time = self.times.out_time.resolve(TimeSlot::Out, true)?;
        let out_time2 = self.times.out_time2.resolve(TimeSlot::Out2, false)?;
        if !is_allowed_text(&apt) {
            return Err(StoreError::InvalidText { field: "apt" });
        }
        if !is_allowed_text(&stop) {
            return Err(StoreError::InvalidText { field: "stop" });
        }
        Ok(NewStop {
            apt,
            stop,
            times: StopTimes {
                in_time,
                out_time,
                out_time2,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(in_time: TimeInput, out_time: TimeInput) -> StopForm {
        StopForm {
            apt: " 검단신도시 ".into(),
            stop: "정문".into(),
            times: TimesForm {
                in_time,
                out_time,
                out_time2: TimeInput::default(),
            },
        }
    }

    #[test]
    fn time_states() {
        assert_eq!(TimeInput::default().state(), TimeState::Pending);
        assert_eq!(TimeInput::none().state(), TimeState::None);
        assert_eq!(TimeInput::at("08:00").state(), TimeState::Set("08:00"));
        assert_eq!(TimeInput::from_stored("").state(), TimeState::None);
    }

    #[test]
    fn set_none_clears_value() {
        let mut t = TimeInput::at("08:10");
        t.set_none(true);
        assert_eq!(t, TimeInput::none());
        t.set_none(false);
        assert_eq!(t.state(), TimeState::Pending);
    }

    #[test]
    fn validate_time_checks_range() {
        assert_eq!(validate_time("inTime", " 08:05 ").unwrap(), "08:05");
        assert_eq!(validate_time("inTime", "23:59").unwrap(), "23:59");
        assert!(matches!(
            validate_time("inTime", "24:00"),
            Err(StoreError::InvalidTime { field: "inTime", .. })
        ));
        assert!(validate_time("inTime", "noon").is_err());
    }

    #[test]
    fn pending_in_time_is_rejected_on_create() {
        let err = form(TimeInput::default(), TimeInput::none())
            .validate()
            .unwrap_err();
        assert!(matches!(err, StoreError::TimeRequired { field: "inTime" }));
    }

    #[test]
    fn none_in_time_is_stored_empty() {
        let stop = form(TimeInput::none(), TimeInput::at("15:30"))
            .validate()
            .unwrap();
        assert_eq!(stop.apt, "검단신도시");
        assert_eq!(stop.times.in_time, "");
        assert_eq!(stop.times.out_time, "15:30");
        assert_eq!(stop.times.out_time2, "");
    }

    #[test]
    fn checks_run_in_form_order() {
        let mut f = form(TimeInput::default(), TimeInput::default());
        f.apt = "  ".into();
        assert!(matches!(f.validate(), Err(StoreError::Empty { field: "apt" })));
        f.apt = "아파트!".into();
        f.stop = String::new();
        assert!(matches!(f.validate(), Err(StoreError::Empty { field: "stop" })));
        f.stop = "정문".into();
        assert!(matches!(f.validate(), Err(StoreError::TimeRequired { field: "inTime" })));
        f.times.in_time = TimeInput::at("08:00");
        assert!(matches!(f.validate(), Err(StoreError::TimeRequired { field: "outTime" })));
        f.times.out_time = TimeInput::none();
        assert!(matches!(f.validate(), Err(StoreError::InvalidText { field: "apt" })));
    }

    #[test]
    fn update_times_need_no_slot() {
        let times = TimesForm::default().validate().unwrap();
        assert_eq!(times, StopTimes::default());
    }

    #[test]
    fn form_deserializes_from_flat_params() {
        let f: StopForm = serde_json::from_value(serde_json::json!({
            "apt": "푸르지오",
            "stop": "후문",
            "inTime": { "value": "08:00" },
            "outTime": { "none": true }
        }))
        .unwrap();
        assert_eq!(f.times.in_time, TimeInput::at("08:00"));
        assert_eq!(f.times.out_time, TimeInput::none());
        assert_eq!(f.times.out_time2, TimeInput::default());
    }
}
