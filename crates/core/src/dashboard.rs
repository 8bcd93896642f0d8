//! Staff triage dashboard.
//!
//! The dashboard holds the fixture rows in display order and re-derives a view for each
//! filter/sort request. Views are computed from the structured rows, never from rendered text.

use crate::esi::EsiLevel;
use crate::intake::Sex;
use crate::reference::ReferenceCode;
use crate::{TriageError, TriageResult};
use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Format of arrival times on the dashboard.
pub const ARRIVAL_FORMAT: &str = "%H:%M";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "kebab-case")]
pub enum AttendanceStatus {
    Waiting,
    InProgress,
    Completed,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 3] = [
        AttendanceStatus::Waiting,
        AttendanceStatus::InProgress,
        AttendanceStatus::Completed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Waiting => "waiting",
            AttendanceStatus::InProgress => "in-progress",
            AttendanceStatus::Completed => "completed",
        }
    }

    /// Badge text shown in the status column.
    pub fn label(self) -> &'static str {
        match self {
            AttendanceStatus::Waiting => "En espera",
            AttendanceStatus::InProgress => "En atención",
            AttendanceStatus::Completed => "Atendido",
        }
    }
}

impl std::str::FromStr for AttendanceStatus {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AttendanceStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| TriageError::InvalidInput(format!("unknown status filter: {s:?}")))
    }
}

/// One patient in the triage table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatientRow {
    pub reference: ReferenceCode,
    pub esi: EsiLevel,
    pub name: String,
    pub age: u32,
    pub sex: Sex,
    pub arrival: NaiveTime,
    pub complaint: String,
    pub status: AttendanceStatus,
}

impl PatientRow {
    pub fn arrival_minutes(&self) -> u32 {
        self.arrival.hour() * 60 + self.arrival.minute()
    }

    /// The `72/M` text of the age/sex column.
    pub fn age_sex(&self) -> String {
        format!("{}/{}", self.age, self.sex.code())
    }
}

pub fn parse_arrival(input: &str) -> TriageResult<NaiveTime> {
    NaiveTime::parse_from_str(input.trim(), ARRIVAL_FORMAT)
        .map_err(|_| TriageError::InvalidTime(input.to_string()))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Keep display order.
    #[default]
    None,
    Esi,
    Name,
    Arrival,
}

impl std::str::FromStr for SortKey {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "none" => Ok(SortKey::None),
            "esi" => Ok(SortKey::Esi),
            "name" => Ok(SortKey::Name),
            "arrival" => Ok(SortKey::Arrival),
            other => Err(TriageError::InvalidInput(format!("unknown sort key: {other:?}"))),
        }
    }
}

/// Filter and sort selection. `None` filters mean "all".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DashboardFilter {
    pub esi: Option<EsiLevel>,
    pub status: Option<AttendanceStatus>,
    pub sort: SortKey,
}

impl DashboardFilter {
    /// Build a filter from the select-box values. Blank or `all` leaves a filter open.
    pub fn from_query(
        esi: Option<&str>,
        status: Option<&str>,
        sort: Option<&str>,
    ) -> TriageResult<Self> {
        let open = |v: Option<&str>| {
            v.map(str::trim)
                .filter(|v| !v.is_empty() && *v != "all")
                .map(str::to_string)
        };

        Ok(Self {
            esi: open(esi).map(|v| v.parse()).transpose()?,
            status: open(status).map(|v| v.parse()).transpose()?,
            sort: sort.map(str::parse::<SortKey>).transpose()?.unwrap_or_default(),
        })
    }

    pub fn matches(&self, row: &PatientRow) -> bool {
        self.esi.map_or(true, |esi| row.esi == esi)
            && self.status.map_or(true, |status| row.status == status)
    }
}

/// Collation key approximating Spanish locale ordering.
///
/// Case and accents are ignored; `ñ` sorts as its own letter between `n` and `o`.
pub fn spanish_collation_key(text: &str) -> String {
    let mut key = String::with_capacity(text.len());
    for ch in text.trim().chars().flat_map(char::to_lowercase) {
        match ch {
            'á' | 'à' | 'ä' | 'â' => key.push('a'),
            'é' | 'è' | 'ë' | 'ê' => key.push('e'),
            'í' | 'ì' | 'ï' | 'î' => key.push('i'),
            'ó' | 'ò' | 'ö' | 'ô' => key.push('o'),
            'ú' | 'ù' | 'ü' | 'û' => key.push('u'),
            'ñ' => key.push_str("n~"),
            other => key.push(other),
        }
    }
    key
}

fn compare_names(a: &str, b: &str) -> Ordering {
    spanish_collation_key(a)
        .cmp(&spanish_collation_key(b))
        .then_with(|| a.cmp(b))
}

/// A row as the dashboard renders it after a filter/sort pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RowView {
    pub reference: ReferenceCode,
    pub esi: EsiLevel,
    pub esi_label: &'static str,
    pub esi_colour: &'static str,
    pub name: String,
    pub age_sex: String,
    pub arrival: String,
    pub complaint: String,
    pub status: AttendanceStatus,
    pub status_label: &'static str,
    pub visible: bool,
    pub start_action_visible: bool,
}

impl RowView {
    fn new(row: &PatientRow, visible: bool) -> Self {
        Self {
            reference: row.reference,
            esi: row.esi,
            esi_label: row.esi.label(),
            esi_colour: row.esi.colour(),
            name: row.name.clone(),
            age_sex: row.age_sex(),
            arrival: row.arrival.format(ARRIVAL_FORMAT).to_string(),
            complaint: row.complaint.clone(),
            status: row.status,
            status_label: row.status.label(),
            visible,
            start_action_visible: row.status != AttendanceStatus::Completed,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LevelCount {
    pub esi: EsiLevel,
    pub label: &'static str,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DashboardStats {
    pub total: usize,
    pub by_level: Vec<LevelCount>,
    pub waiting: usize,
    pub in_progress: usize,
    pub completed: usize,
}

#[derive(Clone, Debug, Default)]
pub struct Dashboard {
    rows: Vec<PatientRow>,
}

impl Dashboard {
    pub fn new(rows: Vec<PatientRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[PatientRow] {
        &self.rows
    }

    pub fn row(&self, reference: ReferenceCode) -> TriageResult<&PatientRow> {
        self.rows
            .iter()
            .find(|row| row.reference == reference)
            .ok_or_else(|| TriageError::UnknownPatient(reference.to_string()))
    }

    /// Run one filter/sort pass over the rows in display order.
    ///
    /// Filtered-out rows stay in the result with `visible: false`. When a sort key is chosen
    /// they are pushed to the end, keeping their relative order. Completed rows never show
    /// the start-evaluation action.
    pub fn apply(&self, filter: &DashboardFilter) -> Vec<RowView> {
        if filter.sort == SortKey::None {
            return self
                .rows
                .iter()
                .map(|row| RowView::new(row, filter.matches(row)))
                .collect();
        }

        let (mut shown, hidden): (Vec<&PatientRow>, Vec<&PatientRow>) =
            self.rows.iter().partition(|row| filter.matches(row));

        match filter.sort {
            SortKey::None => {}
            SortKey::Esi => shown.sort_by_key(|row| row.esi),
            SortKey::Name => shown.sort_by(|a, b| compare_names(&a.name, &b.name)),
            SortKey::Arrival => shown.sort_by_key(|row| row.arrival_minutes()),
        }

        tracing::debug!(
            visible = shown.len(),
            hidden = hidden.len(),
            sort = ?filter.sort,
            "dashboard pass"
        );

        shown
            .into_iter()
            .map(|row| RowView::new(row, true))
            .chain(hidden.into_iter().map(|row| RowView::new(row, false)))
            .collect()
    }

    pub fn stats(&self) -> DashboardStats {
        let count_status =
            |status: AttendanceStatus| self.rows.iter().filter(|r| r.status == status).count();

        DashboardStats {
            total: self.rows.len(),
            by_level: EsiLevel::ALL
                .into_iter()
                .map(|esi| LevelCount {
                    esi,
                    label: esi.label(),
                    count: self.rows.iter().filter(|r| r.esi == esi).count(),
                })
                .collect(),
            waiting: count_status(AttendanceStatus::Waiting),
            in_progress: count_status(AttendanceStatus::InProgress),
            completed: count_status(AttendanceStatus::Completed),
        }
    }
}
