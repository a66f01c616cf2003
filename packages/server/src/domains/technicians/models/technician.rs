use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::geo::LatLng;

use super::van::Van;

/// A mobile technician with an optional assigned van, a home base, default
/// weekly working hours and date-keyed availability exceptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Technician {
    pub id: i64,
    pub user_id: Uuid,
    pub name: String,
    pub assigned_van: Option<Van>,
    pub home_location: Option<LatLng>,
    /// Live position overlaid from the device-location provider at the
    /// start of a run; falls back to the van's stored position.
    pub current_location: Option<LatLng>,
    pub default_hours: Vec<DefaultHours>,
    pub exceptions: Vec<AvailabilityException>,
}

impl Technician {
    /// The exception covering `date`, if one exists.
    pub fn exception_for(&self, date: NaiveDate) -> Option<&AvailabilityException> {
        self.exceptions.iter().find(|e| e.date == date)
    }

    /// Default-hours entries for a day of week (0 = Sunday .. 6 = Saturday)
    /// that are not explicitly marked unavailable.
    pub fn default_hours_for(&self, day_of_week: u32) -> impl Iterator<Item = &DefaultHours> {
        self.default_hours
            .iter()
            .filter(move |h| h.day_of_week == day_of_week as i32 && h.is_available)
    }
}

/// One weekly working-hours entry. Times are wall-clock strings in the
/// business timezone ("09:00:00").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultHours {
    /// 0 = Sunday .. 6 = Saturday.
    pub day_of_week: i32,
    pub start_time: String,
    pub end_time: String,
    pub is_available: bool,
}

/// A per-date override of the default hours.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityException {
    pub date: NaiveDate,
    pub kind: ExceptionKind,
    pub is_available: bool,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionKind {
    TimeOff,
    CustomHours,
}

impl ExceptionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExceptionKind::TimeOff => "time_off",
            ExceptionKind::CustomHours => "custom_hours",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "time_off" => Some(ExceptionKind::TimeOff),
            "custom_hours" => Some(ExceptionKind::CustomHours),
            _ => None,
        }
    }
}
